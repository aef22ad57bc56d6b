//! Diagram Renderer
//!
//! Pure functions from typed documents to Mermaid text. Output depends on the
//! input alone (no clock, no randomness, no hash-map iteration), so equal
//! input gives byte-identical diagrams.

pub mod erd;
pub mod flow;

pub use erd::render_erd;
pub use flow::{render_flow, sanitize_collisions, sanitize_id};
