//! Input plumbing: path resolution and transparent decompression.

pub mod compression;
pub mod glob;

pub use compression::open_input;
pub use glob::resolve_inputs;
