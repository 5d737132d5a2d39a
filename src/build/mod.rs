pub mod backend;
pub mod disk;
pub mod mem;
pub mod parser;
pub mod progress;

use tracing::info;

use crate::build::backend::Backend;
use crate::build::disk::{DiskBackend, DiskData};
use crate::build::mem::{MemBackend, MemData};
use crate::build::parser::{EventSink, Parser};
use crate::build::progress::Progress;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Limit, Result};
use crate::core::meta::Meta;
use crate::core::types::{NodeKind, MAX_ATTS};
use crate::index::names::Names;
use crate::index::namespaces::Namespaces;
use crate::index::path::PathSummary;

/// Builds a database on disk from the given parser's events.
pub fn build_disk<P: Parser>(name: &str, config: &Config, parser: &mut P) -> Result<DiskData> {
    let mut meta = Meta::new(name, config);
    let source = parser.source();
    let backend = DiskBackend::create(config, &mut meta, source.as_ref())?;
    Builder::new(meta, backend).build(parser)
}

/// Builds a database in memory from the given parser's events.
pub fn build_mem<P: Parser>(name: &str, config: &Config, parser: &mut P) -> Result<MemData> {
    let backend = MemBackend::new(config);
    Builder::new(Meta::new(name, config), backend).build(parser)
}

/// Event-driven database builder.
///
/// Consumes one parser's event stream, maintains the open-ancestor stacks,
/// feeds the name, namespace and path components, and emits rows through
/// the backend. A builder runs exactly once: it either returns the built
/// database or aborts and drops everything it wrote.
pub struct Builder<B: Backend> {
    meta: Meta,
    elem_names: Names,
    attr_names: Names,
    ns: Namespaces,
    path: PathSummary,
    pstack: Vec<u32>,  // pre value of the open ancestor per level
    tstack: Vec<u16>,  // element name id per level
    level: usize,
    backend: B,
    progress: Progress,
}

impl<B: Backend> Builder<B> {
    pub fn new(meta: Meta, backend: B) -> Self {
        Builder {
            meta,
            elem_names: Names::new(),
            attr_names: Names::new(),
            ns: Namespaces::new(),
            path: PathSummary::new(),
            pstack: Vec::new(),
            tstack: Vec::new(),
            level: 0,
            backend,
            progress: Progress::new(),
        }
    }

    /// Handle for watching or cancelling this build from another thread
    pub fn progress(&self) -> Progress {
        self.progress.clone()
    }

    /// Runs the parser to completion and returns the built database.
    pub fn build<P: Parser>(mut self, parser: &mut P) -> Result<B::Data> {
        parser.bind_progress(self.progress.clone());
        info!(db = %self.meta.name, "building database");

        let parsed = parser.parse(&mut self).and_then(|()| {
            if self.level != 0 {
                Err(Error::new(
                    ErrorKind::InvalidState,
                    format!("input ended with {} open node(s)", self.level),
                ))
            } else {
                Ok(())
            }
        });

        match parsed {
            Ok(()) => {
                self.meta.lastid = self.meta.size.saturating_sub(1);
                let Builder { meta, elem_names, attr_names, ns, path, backend, progress, .. } = self;
                let data = backend.finish(meta, elem_names, attr_names, ns, path, &progress)?;
                info!("database built");
                Ok(data)
            }
            Err(err) => {
                self.backend.abort();
                Err(err.with_detail(&parser.detail()))
            }
        }
    }

    /// Stores an element with its attributes and namespace declarations,
    /// leaving `level` untouched. Returns the element's pre value.
    fn add_elem_internal(
        &mut self,
        name: &[u8],
        atts: &[(Vec<u8>, Vec<u8>)],
        nsps: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<u32> {
        let n = self.elem_names.index(name, None, true);
        self.path.put(n, NodeKind::Elem, self.level);

        let pre = self.meta.size;
        set_level(&mut self.tstack, self.level, n);
        set_level(&mut self.pstack, self.level, pre);

        self.ns.prepare();
        for (prefix, uri) in nsps {
            self.ns.add(prefix, uri, pre);
        }

        let dist = if self.level == 0 {
            1
        } else {
            pre - self.pstack[self.level - 1]
        };
        let asize = (atts.len() as u32 + 1).min(MAX_ATTS);
        let uri = self.ns.uri(name, true);
        if uri == 0 {
            check_prefix(name)?;
        }
        self.backend.add_elem(pre, dist, n, asize, uri, !nsps.is_empty())?;
        self.meta.size += 1;

        for (a, (an, av)) in atts.iter().enumerate() {
            let n = self.attr_names.index(an, Some(av), true);
            let uri = self.ns.uri(an, false);
            if uri == 0 {
                check_prefix(an)?;
            }
            self.path.put_value(n, NodeKind::Attr, self.level + 1, av);
            let dist = (a as u32 + 1).min(MAX_ATTS);
            self.backend.add_attr(self.meta.size, n, av, dist, uri)?;
            self.meta.size += 1;
        }

        // the parent name has a non-text child now
        if self.level > 1 {
            let parent = self.tstack[self.level - 1];
            self.elem_names.stat_mut(parent).set_leaf(false);
        }

        self.check_limits()?;
        Ok(pre)
    }

    fn add_text_internal(&mut self, value: &[u8], kind: NodeKind) -> Result<()> {
        let level = self.level;
        if level == 0 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "node outside of a document".to_string(),
            ));
        }
        if level > 1 {
            let enclosing = self.tstack[level - 1];
            if kind == NodeKind::Text {
                self.elem_names.index_text(enclosing, value);
            } else {
                self.elem_names.stat_mut(enclosing).set_leaf(false);
            }
        }

        self.path.put_value(0, kind, level, value);
        let dist = self.meta.size - self.pstack[level - 1];
        self.backend.add_text(self.meta.size, value, dist, kind)?;
        self.meta.size += 1;
        Ok(())
    }

    fn check_limits(&self) -> Result<()> {
        if self.elem_names.len() >= Limit::Elems.max() as usize {
            return Err(Error::limit(Limit::Elems));
        }
        if self.attr_names.len() >= Limit::Attrs.max() as usize {
            return Err(Error::limit(Limit::Attrs));
        }
        if self.ns.len() >= Limit::Namespaces.max() as usize {
            return Err(Error::limit(Limit::Namespaces));
        }
        if self.meta.size > Limit::Range.max() as u32 {
            return Err(Error::limit(Limit::Range));
        }
        Ok(())
    }
}

impl<B: Backend> EventSink for Builder<B> {
    fn open_doc(&mut self, name: &[u8]) -> Result<()> {
        if self.level != 0 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "document inside an open node".to_string(),
            ));
        }
        self.path.put(0, NodeKind::Doc, self.level);
        let pre = self.meta.size;
        set_level(&mut self.pstack, self.level, pre);
        self.level += 1;
        self.backend.add_doc(pre, name)?;
        self.meta.size += 1;
        self.ns.prepare();
        Ok(())
    }

    fn close_doc(&mut self) -> Result<()> {
        if self.level != 1 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "document close without matching open".to_string(),
            ));
        }
        self.level -= 1;
        let pre = self.pstack[self.level];
        self.backend.set_size(pre, self.meta.size - pre)?;
        self.meta.ndocs += 1;
        self.ns.close(self.meta.size);
        Ok(())
    }

    fn open_elem(
        &mut self,
        name: &[u8],
        atts: &[(Vec<u8>, Vec<u8>)],
        nsps: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<()> {
        if self.level == 0 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "element outside of a document".to_string(),
            ));
        }
        self.add_elem_internal(name, atts, nsps)?;
        self.level += 1;
        Ok(())
    }

    fn empty_elem(
        &mut self,
        name: &[u8],
        atts: &[(Vec<u8>, Vec<u8>)],
        nsps: &[(Vec<u8>, Vec<u8>)],
    ) -> Result<()> {
        if self.level == 0 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "element outside of a document".to_string(),
            ));
        }
        let pre = self.add_elem_internal(name, atts, nsps)?;
        // the scope of an empty element ends before its next sibling
        self.ns.close(pre);
        // no close event will follow; the initial size is only wrong when
        // the attribute count overflowed its 5-bit field
        if atts.len() as u32 + 1 > MAX_ATTS {
            self.backend.set_size(pre, self.meta.size - pre)?;
        }
        Ok(())
    }

    fn close_elem(&mut self) -> Result<()> {
        if self.progress.stopped() {
            return Err(Error::cancelled());
        }
        if self.level < 2 {
            return Err(Error::new(
                ErrorKind::InvalidState,
                "element close without matching open".to_string(),
            ));
        }
        self.level -= 1;
        let pre = self.pstack[self.level];
        self.backend.set_size(pre, self.meta.size - pre)?;
        self.ns.close(pre);
        Ok(())
    }

    fn text(&mut self, value: &[u8]) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.add_text_internal(value, NodeKind::Text)
    }

    fn comment(&mut self, value: &[u8]) -> Result<()> {
        self.add_text_internal(value, NodeKind::Comm)
    }

    fn pi(&mut self, value: &[u8]) -> Result<()> {
        self.add_text_internal(value, NodeKind::Pi)
    }

    fn encoding(&mut self, encoding: &str) {
        let normed = encoding.trim().to_uppercase();
        self.meta.encoding = if normed == "UTF8" {
            "UTF-8".to_string()
        } else {
            normed
        };
    }
}

/// Writes a stack slot, growing the stack by at most one level.
fn set_level<T: Copy>(stack: &mut Vec<T>, level: usize, value: T) {
    if level == stack.len() {
        stack.push(value);
    } else {
        stack[level] = value;
    }
}

/// Fails when a name carries a prefix that resolved to no binding.
/// The reserved `xml` prefix is always allowed.
fn check_prefix(name: &[u8]) -> Result<()> {
    if let Some(i) = name.iter().position(|&b| b == b':') {
        let prefix = &name[..i];
        if prefix != b"xml" {
            return Err(Error::namespace(prefix));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::parser::{Event, EventParser};

    fn mem_builder() -> Builder<MemBackend> {
        let config = Config::default();
        Builder::new(Meta::new("test", &config), MemBackend::new(&config))
    }

    #[test]
    fn unbalanced_events_are_rejected() {
        let mut builder = mem_builder();
        assert_eq!(
            builder.close_elem().unwrap_err().kind,
            ErrorKind::InvalidState
        );
        assert_eq!(
            builder.close_doc().unwrap_err().kind,
            ErrorKind::InvalidState
        );
        assert_eq!(
            builder.open_elem(b"a", &[], &[]).unwrap_err().kind,
            ErrorKind::InvalidState
        );
        assert_eq!(builder.text(b"x").unwrap_err().kind, ErrorKind::InvalidState);
    }

    #[test]
    fn unclosed_input_fails_the_build() {
        let config = Config::default();
        let builder = Builder::new(Meta::new("test", &config), MemBackend::new(&config));
        let mut parser = EventParser::new(vec![
            Event::open_doc("d"),
            Event::open_elem("a"),
        ]);
        let err = builder.build(&mut parser).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        assert!(err.context.contains("event 2 of 2"));
    }

    #[test]
    fn pre_range_limit_is_enforced() {
        let mut builder = mem_builder();
        builder.meta.size = Limit::Range.max() as u32 + 1;
        let err = builder.check_limits().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Limit(Limit::Range));
    }

    #[test]
    fn cancellation_is_observed_at_element_close() {
        let config = Config::default();
        let builder = Builder::new(Meta::new("test", &config), MemBackend::new(&config));
        builder.progress().stop();
        let mut parser = EventParser::new(vec![
            Event::open_doc("d"),
            Event::open_elem("a"),
            Event::CloseElem,
            Event::CloseDoc,
        ]);
        let err = builder.build(&mut parser).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Cancelled);
    }

    #[test]
    fn encoding_is_normalized() {
        let mut builder = mem_builder();
        builder.encoding(" utf8 ");
        assert_eq!(builder.meta.encoding, "UTF-8");
        builder.encoding("iso-8859-1");
        assert_eq!(builder.meta.encoding, "ISO-8859-1");
    }
}
