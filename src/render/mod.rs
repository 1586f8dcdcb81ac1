//! Preview rendering: tile palette, compositing, caption, PNG output.

pub(crate) mod caption;
/// Procedural tile palette.
pub mod color;
pub(crate) mod composite;
/// Canvas compositor and PNG encoding.
pub mod compositor;
