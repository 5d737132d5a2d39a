use std::collections::HashMap;

/// One namespace scope, bound to the pre value of the element that
/// declared it. Scopes are retained after closing so queries on the built
/// database can resolve bindings for any node.
#[derive(Debug, Clone)]
pub struct Scope {
    pub pre: u32,
    pub bindings: Vec<(Vec<u8>, u32)>,  // prefix -> uri id
}

/// Namespace bindings scoped to pre values, plus the global uri dictionary.
///
/// Uri ids start at 1; 0 means "no namespace". The builder checks the
/// dictionary against its capacity limit after every element.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    uris: Vec<Vec<u8>>,
    uri_ids: HashMap<Vec<u8>, u32>,
    scopes: Vec<Scope>,
    open: Vec<usize>,   // indices into scopes, innermost last
    fresh: bool,
}

impl Namespaces {
    pub fn new() -> Self {
        Namespaces::default()
    }

    /// Announces that the next `add` belongs to a new element.
    pub fn prepare(&mut self) {
        self.fresh = true;
    }

    /// Binds a prefix on the scope of the element at `pre`, interning the
    /// uri. An empty prefix binds the default namespace. Returns the uri id.
    pub fn add(&mut self, prefix: &[u8], uri: &[u8], pre: u32) -> u32 {
        let id = match self.uri_ids.get(uri) {
            Some(&id) => id,
            None => {
                self.uris.push(uri.to_vec());
                let id = self.uris.len() as u32;
                self.uri_ids.insert(uri.to_vec(), id);
                id
            }
        };

        let scope = match self.open.last().copied() {
            Some(s) if !self.fresh && self.scopes[s].pre == pre => s,
            _ => {
                self.scopes.push(Scope {
                    pre,
                    bindings: Vec::new(),
                });
                self.open.push(self.scopes.len() - 1);
                self.fresh = false;
                self.scopes.len() - 1
            }
        };
        self.scopes[scope].bindings.push((prefix.to_vec(), id));
        id
    }

    /// Closes all scopes opened at or after the given pre value.
    pub fn close(&mut self, pre: u32) {
        while let Some(&s) = self.open.last() {
            if self.scopes[s].pre < pre {
                break;
            }
            self.open.pop();
        }
    }

    /// Resolves the prefix of a qualified name in the current scope.
    ///
    /// Unprefixed element names fall back to the default namespace;
    /// unprefixed attribute names never do. Returns 0 when no binding is
    /// in scope.
    pub fn uri(&self, name: &[u8], element: bool) -> u32 {
        let prefix = match name.iter().position(|&b| b == b':') {
            Some(i) => &name[..i],
            None if element => &[][..],
            None => return 0,
        };
        for &s in self.open.iter().rev() {
            for (p, id) in self.scopes[s].bindings.iter().rev() {
                if p == prefix {
                    return *id;
                }
            }
        }
        0
    }

    /// Number of distinct uris
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    pub fn uri_bytes(&self, id: u32) -> &[u8] {
        &self.uris[id as usize - 1]
    }

    /// Bindings declared by the element at the given pre value, if any.
    pub fn scope_at(&self, pre: u32) -> Option<&Scope> {
        self.scopes.iter().find(|s| s.pre == pre)
    }
}
