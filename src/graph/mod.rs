//! Graph storage.

pub mod compressed;

pub(crate) mod visited;
