//! Mailbox session contract and the local mbox-backed store.
//!
//! A [`MailStore`] opens a [`MailboxSession`] for an account; the session
//! lists the messages of one folder at a time, records deletion marks, and
//! applies them when closed with `expunge = true`.

pub mod mbox;

pub use mbox::{MboxSession, MboxStore};

use crate::error::Result;

/// Default folder read when none is given.
pub const DEFAULT_FOLDER: &str = "INBOX";

/// Account credentials handed to [`MailStore::connect`].
#[derive(Clone)]
pub struct MailAccount {
    user: String,
    password: String,
}

impl MailAccount {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for MailAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailAccount")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// How a folder is opened. Deletion marks need `ReadWrite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// One message as retrieved from a folder, before any MIME decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    number: usize,
    bytes: Vec<u8>,
}

impl RawMessage {
    /// `number` is the 1-based position of the message in its folder.
    pub fn new(number: usize, bytes: Vec<u8>) -> Self {
        Self { number, bytes }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// What [`MailboxSession::close`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseSummary {
    /// Messages permanently removed from the folder.
    pub expunged: usize,
}

/// Opens sessions on a message store.
pub trait MailStore {
    type Session: MailboxSession;

    /// Open a session for `account`.
    fn connect(&self, account: &MailAccount) -> Result<Self::Session>;
}

/// An open connection to one account's mailbox.
pub trait MailboxSession {
    /// Open `folder` in `mode` and return all of its messages in order.
    ///
    /// Opening a folder discards any deletion marks on a previously open one.
    fn list_messages(&mut self, folder: &str, mode: OpenMode) -> Result<Vec<RawMessage>>;

    /// Mark a message of the open folder for deletion.
    fn mark_deleted(&mut self, message: &RawMessage) -> Result<()>;

    /// Close the session. With `expunge`, marked messages are removed from
    /// a folder opened `ReadWrite`; otherwise marks are discarded.
    fn close(self, expunge: bool) -> Result<CloseSummary>
    where
        Self: Sized;
}
