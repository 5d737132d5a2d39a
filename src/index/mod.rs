pub mod names;
pub mod namespaces;
pub mod path;
