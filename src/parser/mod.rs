//! Raw mail decoding: mbox splitting and MIME tree construction.

pub mod mbox;
pub mod mime;
