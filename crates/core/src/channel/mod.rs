//! Contract of the remote channel used as the blob-storage backend.
//!
//! The channel stores opaque messages carrying file attachments. It is rate- and
//! size-limited: a message holds a bounded number of attachments and a bounded
//! number of bytes. The `cordstore-channel` crate implements this trait over the
//! REST API; tests use in-memory implementations.

mod error;

use std::future::Future;

use bytes::Bytes;
use cordstore_shared::{ChannelId, MessageId};

pub use error::ChannelError;

/// Attachment to be sent with a new message.
#[derive(Debug, Clone)]
pub struct OutgoingAttachment {
    /// File name shown in the channel.
    pub filename: String,
    /// Attachment bytes.
    pub content: Bytes,
}

/// Attachment as reported by the channel for an existing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAttachment {
    /// File name the attachment was uploaded under.
    pub filename: String,
    /// Ephemeral URL the attachment bytes can be fetched from.
    pub url: String,
    /// Size in bytes reported by the channel.
    pub size: u64,
}

/// A message fetched from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Attachments in the order they were sent.
    pub attachments: Vec<ChannelAttachment>,
}

/// Identity the client is authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelIdentity {
    /// Account name.
    pub username: String,
    /// Legacy discriminator, `"0"` for accounts without one.
    pub discriminator: String,
}

impl std::fmt::Display for ChannelIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.username, self.discriminator)
    }
}

/// Client for the remote channel.
///
/// Implementations must be safe to call concurrently; the storage engine fans out
/// many requests at once while processing a single task.
pub trait ChannelClient: Send + Sync {
    /// Send a message carrying `attachments` and return its identifier.
    fn send_message(
        &self,
        channel_id: ChannelId,
        attachments: Vec<OutgoingAttachment>,
    ) -> impl Future<Output = Result<MessageId, ChannelError>> + Send;

    /// Fetch a message by identifier.
    ///
    /// Fails with [`ChannelError::NotFound`] if the message no longer exists.
    fn get_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<ChannelMessage, ChannelError>> + Send;

    /// Delete a message by identifier.
    ///
    /// Fails with [`ChannelError::NotFound`] if the message no longer exists.
    fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Download attachment bytes from an attachment URL.
    fn download_attachment(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Bytes, ChannelError>> + Send;

    /// Return the identity the client is authenticated as.
    fn current_identity(&self)
    -> impl Future<Output = Result<ChannelIdentity, ChannelError>> + Send;
}
