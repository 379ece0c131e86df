//! Pure MIME content extraction: classify parts, walk the grammar, name attachments.
//!
//! Nothing in this module performs I/O.

pub mod classify;
pub mod namer;
pub mod walker;

pub use classify::{classify, Shape};
pub use walker::extract_content;
