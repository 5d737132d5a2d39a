use crate::build::progress::Progress;
use crate::core::error::Result;
use crate::core::meta::Meta;
use crate::core::types::NodeKind;
use crate::index::names::Names;
use crate::index::namespaces::Namespaces;
use crate::index::path::PathSummary;

/// Storage target of a build.
///
/// The front-end hands every row to exactly one backend; document and
/// element rows are revisited once through `set_size`. On success the
/// backend assembles the database handle from the shared components, on
/// failure `abort` releases whatever the backend created.
pub trait Backend {
    type Data;

    fn add_doc(&mut self, pre: u32, name: &[u8]) -> Result<()>;

    fn add_elem(
        &mut self,
        pre: u32,
        dist: u32,
        name: u16,
        asize: u32,
        uri: u32,
        ne: bool,
    ) -> Result<()>;

    fn add_attr(&mut self, pre: u32, name: u16, value: &[u8], dist: u32, uri: u32) -> Result<()>;

    fn add_text(&mut self, pre: u32, value: &[u8], dist: u32, kind: NodeKind) -> Result<()>;

    /// Replaces the preliminary size of the document or element at `pre`.
    fn set_size(&mut self, pre: u32, size: u32) -> Result<()>;

    fn finish(
        self,
        meta: Meta,
        elem_names: Names,
        attr_names: Names,
        ns: Namespaces,
        path: PathSummary,
        progress: &Progress,
    ) -> Result<Self::Data>;

    /// Discards the partial build. Never fails; problems are logged.
    fn abort(&mut self);
}
