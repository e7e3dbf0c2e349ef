//! Removing an object's messages from the channel.

use std::sync::Arc;

use cordstore_shared::{ChannelId, MessageId};
use tracing::{error, info, warn};

use super::error::{StorageError, StorageResult};
use crate::channel::ChannelClient;

/// Outcome of a completed deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeletionSummary {
    /// Messages removed by this call.
    pub deleted: usize,
    /// Messages that were already gone.
    pub already_absent: usize,
}

/// Deletes objects from the channel, one message at a time.
pub struct Deleter<C: ChannelClient> {
    channel: Arc<C>,
    channel_id: ChannelId,
}

impl<C: ChannelClient> Deleter<C> {
    /// Create a new deleter.
    #[must_use]
    pub fn new(channel: Arc<C>, channel_id: ChannelId) -> Self {
        Self {
            channel,
            channel_id,
        }
    }

    /// Delete every message in `message_ids`, in order.
    ///
    /// Messages that are already gone are skipped, so repeating a deletion
    /// succeeds. The first other failure stops the deletion.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError::Deletion`] wrapping a not-found error for an
    /// empty list, or the failure that stopped the deletion. The error records
    /// whether any message had already been removed.
    pub async fn delete(&self, message_ids: &[MessageId]) -> StorageResult<DeletionSummary> {
        if message_ids.is_empty() {
            warn!("No message ids provided for deleting object");
            return Err(StorageError::deletion(
                StorageError::not_found("no message ids to delete"),
                false,
            ));
        }

        let mut summary = DeletionSummary::default();
        for &message_id in message_ids {
            match self
                .channel
                .delete_message(self.channel_id, message_id)
                .await
            {
                Ok(()) => summary.deleted += 1,
                Err(e) if e.is_not_found() => {
                    warn!(message_id = %message_id, "Message was already deleted");
                    summary.already_absent += 1;
                }
                Err(e) => {
                    let partially_deleted = summary.deleted > 0;
                    error!(
                        message_id = %message_id,
                        deleted = summary.deleted,
                        partially_deleted,
                        error = %e,
                        "Failed to delete message"
                    );
                    return Err(StorageError::deletion(
                        StorageError::internal_caused_by(
                            format!("failed to delete message {message_id}"),
                            e,
                        ),
                        partially_deleted,
                    ));
                }
            }
        }

        info!(
            deleted = summary.deleted,
            already_absent = summary.already_absent,
            "Object deleted"
        );
        Ok(summary)
    }
}
