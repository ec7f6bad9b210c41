//! Unified-diff parsing and review limits.
//!
//! Turns the raw diff of a pull request into [`ChangeChunk`](lookout_core::ChangeChunk)
//! records, one per hunk, and bounds how much of it gets reviewed.

pub mod filter;
pub mod parser;
