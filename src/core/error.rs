use std::fmt;

/// Hard structural limits of the storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Elems,       // element name dictionary entries
    Attrs,       // attribute name dictionary entries
    Namespaces,  // distinct namespace uris
    AttsPerElem, // attributes on a single element
    Range,       // pre values in one database
}

impl Limit {
    /// Maximum value admitted by the on-disk encoding
    pub fn max(self) -> u64 {
        match self {
            Limit::Elems => 0x8000,
            Limit::Attrs => 0x8000,
            Limit::Namespaces => 0x100,
            Limit::AttsPerElem => 0x1F,
            Limit::Range => i32::MAX as u64,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Limit::Elems => "element names",
            Limit::Attrs => "attribute names",
            Limit::Namespaces => "namespaces",
            Limit::AttsPerElem => "attributes per element",
            Limit::Range => "nodes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    Limit(Limit),
    Namespace,
    Cancelled,
    InvalidState,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn limit(limit: Limit) -> Self {
        Error {
            kind: ErrorKind::Limit(limit),
            context: format!("out of {} (max: {})", limit.label(), limit.max()),
        }
    }

    pub fn namespace(prefix: &[u8]) -> Self {
        Error {
            kind: ErrorKind::Namespace,
            context: format!(
                "no namespace declared for prefix '{}'",
                String::from_utf8_lossy(prefix)
            ),
        }
    }

    pub fn cancelled() -> Self {
        Error {
            kind: ErrorKind::Cancelled,
            context: "build was interrupted".to_string(),
        }
    }

    /// Attach the parser's current location to the error context.
    pub fn with_detail(mut self, detail: &str) -> Self {
        if !detail.is_empty() {
            self.context = format!("{} ({})", self.context, detail);
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_caps_match_storage_format() {
        assert_eq!(Limit::Elems.max(), 0x8000);
        assert_eq!(Limit::Attrs.max(), 0x8000);
        assert_eq!(Limit::Namespaces.max(), 0x100);
        assert_eq!(Limit::AttsPerElem.max(), 0x1F);
        assert_eq!(Limit::Range.max(), 2147483647);
    }

    #[test]
    fn detail_is_appended_once() {
        let err = Error::limit(Limit::Elems).with_detail("line 12");
        assert_eq!(err.kind, ErrorKind::Limit(Limit::Elems));
        assert!(err.context.contains("line 12"));

        let err = Error::cancelled().with_detail("");
        assert!(!err.context.contains('('));
    }
}
