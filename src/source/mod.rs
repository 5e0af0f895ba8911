//! Tabular data source.
//!
//! The collection sheet is read wholesale into an immutable [`Dataset`].
//! Cells are kept as trimmed text keyed by header; typing and validation
//! happen later, in normalization.

pub mod loader;

pub use loader::*;
