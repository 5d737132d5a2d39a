use std::collections::HashMap;
use crate::core::types::NodeKind;
use crate::index::names::NameStats;

/// One distinct root-to-node path position
#[derive(Debug, Clone)]
pub struct PathEntry {
    pub name: u16,
    pub kind: NodeKind,
    pub depth: u16,
    pub count: u64,
    pub stats: NameStats,
}

/// Summary of the distinct (name, kind, depth) paths in a database.
///
/// Append-only while a build is running; the query methods are meant for
/// the finished database.
#[derive(Debug, Clone, Default)]
pub struct PathSummary {
    entries: Vec<PathEntry>,
    lookup: HashMap<(u16, u8, u16), usize>,
}

impl PathSummary {
    pub fn new() -> Self {
        PathSummary::default()
    }

    /// Records one node occurrence at the given tree position.
    pub fn put(&mut self, name: u16, kind: NodeKind, depth: usize) {
        self.entry(name, kind, depth).count += 1;
    }

    /// Same as `put`, additionally accumulating value statistics for
    /// leaf kinds.
    pub fn put_value(&mut self, name: u16, kind: NodeKind, depth: usize, value: &[u8]) {
        let entry = self.entry(name, kind, depth);
        entry.count += 1;
        entry.stats.record(value);
    }

    /// Number of distinct paths
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter()
    }

    /// Node counts per depth, indexed by depth
    pub fn depth_histogram(&self) -> Vec<u64> {
        let max = self.entries.iter().map(|e| e.depth).max().unwrap_or(0);
        let mut hist = vec![0; max as usize + 1];
        for entry in &self.entries {
            hist[entry.depth as usize] += entry.count;
        }
        hist
    }

    fn entry(&mut self, name: u16, kind: NodeKind, depth: usize) -> &mut PathEntry {
        let key = (name, kind.code(), depth as u16);
        let idx = match self.lookup.get(&key) {
            Some(&idx) => idx,
            None => {
                self.entries.push(PathEntry {
                    name,
                    kind,
                    depth: depth as u16,
                    count: 0,
                    stats: NameStats::new(),
                });
                self.lookup.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_positions_collapse_into_one_entry() {
        let mut path = PathSummary::new();
        path.put(0, NodeKind::Doc, 0);
        path.put(1, NodeKind::Elem, 1);
        path.put(1, NodeKind::Elem, 1);
        path.put(1, NodeKind::Elem, 2);

        assert_eq!(path.len(), 3);
        let elem = path
            .entries()
            .find(|e| e.kind == NodeKind::Elem && e.depth == 1)
            .unwrap();
        assert_eq!(elem.count, 2);
    }

    #[test]
    fn leaf_values_accumulate_stats() {
        let mut path = PathSummary::new();
        path.put_value(2, NodeKind::Attr, 2, b"v");
        path.put_value(2, NodeKind::Attr, 2, b"value");

        let attr = path.entries().next().unwrap();
        assert_eq!(attr.count, 2);
        assert_eq!(attr.stats.values(), 2);
        assert_eq!(attr.stats.max_len, 5);
    }

    #[test]
    fn depth_histogram_counts_occurrences() {
        let mut path = PathSummary::new();
        path.put(0, NodeKind::Doc, 0);
        path.put(1, NodeKind::Elem, 1);
        path.put(2, NodeKind::Elem, 1);
        path.put(1, NodeKind::Elem, 1);

        assert_eq!(path.depth_histogram(), vec![1, 3]);
    }
}
