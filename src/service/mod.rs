//! Thin adapter between an external frame protocol and the canvas core.

/// Verify, claim, and render for one interaction.
pub mod frame;
