//! Core data model: MIME part trees, extracted content, and normalized messages.

pub mod address;
pub mod content;
pub mod message;
pub mod part;
