//! Batch driver: read a folder, normalize each message, hand it to a
//! processor, and optionally delete what was processed.

use tracing::{info, warn};

use crate::assemble::assemble;
use crate::error::{IngestError, Result};
use crate::mailbox::{CloseSummary, MailAccount, MailStore, MailboxSession, OpenMode};
use crate::model::message::NormalizedMessage;
use crate::store::{persist_attachments, AttachmentStore};

/// Callback run on every successfully normalized message.
///
/// Returning `true` means processing succeeded; in delete mode the source
/// message is then marked for deletion.
pub trait MessageProcessor {
    fn process(&mut self, message: &NormalizedMessage) -> bool;
}

impl<F> MessageProcessor for F
where
    F: FnMut(&NormalizedMessage) -> bool,
{
    fn process(&mut self, message: &NormalizedMessage) -> bool {
        self(message)
    }
}

/// A message that was skipped, and why.
#[derive(Debug)]
pub struct MessageFailure {
    /// 1-based position in the folder.
    pub number: usize,
    pub error: IngestError,
}

/// Outcome of one [`MailReceiver::read_messages`] run.
#[derive(Debug, Default)]
pub struct ReceiveReport {
    /// Normalized messages, in folder order.
    pub messages: Vec<NormalizedMessage>,
    /// Messages that could not be normalized or stored.
    pub failures: Vec<MessageFailure>,
    /// Messages marked for deletion.
    pub marked_deleted: usize,
    pub close: CloseSummary,
}

impl ReceiveReport {
    /// Total messages seen in the folder.
    pub fn total(&self) -> usize {
        self.messages.len() + self.failures.len()
    }
}

/// Reads folders from a [`MailStore`] and stores attachments through an
/// [`AttachmentStore`].
pub struct MailReceiver<S, A> {
    store: S,
    attachments: A,
}

impl<S, A> MailReceiver<S, A>
where
    S: MailStore,
    A: AttachmentStore,
{
    pub fn new(store: S, attachments: A) -> Self {
        Self { store, attachments }
    }

    /// Read every message of `folder`, running `processor` on each one.
    ///
    /// With `delete`, the folder is opened read-write, each message whose
    /// processing succeeded is marked deleted, and the folder is expunged on
    /// close. A message that fails extraction or storage is reported in
    /// [`ReceiveReport::failures`], left in the folder, and the batch goes on.
    ///
    /// `progress` receives `(done, total)` after each message.
    pub fn read_messages(
        &self,
        account: &MailAccount,
        folder: &str,
        delete: bool,
        processor: &mut dyn MessageProcessor,
        progress: &dyn Fn(usize, usize),
    ) -> Result<ReceiveReport> {
        let mut session = self.store.connect(account)?;
        let mode = if delete {
            OpenMode::ReadWrite
        } else {
            OpenMode::ReadOnly
        };
        let raw_messages = session.list_messages(folder, mode)?;
        let total = raw_messages.len();
        let mut report = ReceiveReport::default();

        for (done, raw) in raw_messages.iter().enumerate() {
            progress(done, total);

            let mut message = match assemble(raw).and_then(|mut message| {
                message.stored_attachments =
                    persist_attachments(&self.attachments, &message.content)?;
                Ok(message)
            }) {
                Ok(message) => message,
                Err(error) => {
                    warn!(number = raw.number(), %error, "Skipping message");
                    report.failures.push(MessageFailure {
                        number: raw.number(),
                        error,
                    });
                    continue;
                }
            };

            message.processing_ok = processor.process(&message);
            if delete && message.processing_ok {
                session.mark_deleted(raw)?;
                report.marked_deleted += 1;
            }
            report.messages.push(message);
        }
        progress(total, total);

        report.close = session.close(delete)?;
        info!(
            folder,
            total,
            ok = report.messages.len(),
            failed = report.failures.len(),
            expunged = report.close.expunged,
            "Folder processed"
        );
        Ok(report)
    }
}
