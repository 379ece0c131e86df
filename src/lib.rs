//! `mailsift`: retrieve mailbox messages and normalize their MIME structure.
//!
//! Each message is reduced to a plain-text body, an optional HTML body and a
//! list of attachment blobs with stable relative paths. The pipeline is:
//!
//! 1. [`mailbox`] opens a folder and yields raw messages.
//! 2. [`parser::mime`] decodes the raw bytes into a [`model::part::MimePart`] tree.
//! 3. [`extract`] walks the tree into [`model::content::ExtractedContent`].
//! 4. [`assemble`] adds envelope fields, producing a [`model::message::NormalizedMessage`].
//! 5. [`store`] writes attachments; [`receiver`] drives the whole batch.

pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod mailbox;
pub mod model;
pub mod parser;
pub mod receiver;
pub mod store;
