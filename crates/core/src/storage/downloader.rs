//! Fetching an object's messages back from the channel and reassembling it.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use cordstore_shared::{ChannelId, MessageId};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::codec;
use super::error::{StorageError, StorageResult};
use super::types::{FilePart, StoredObject};
use crate::channel::{ChannelAttachment, ChannelClient};

/// Reads objects back from the channel.
///
/// Independent of the upload batching settings: a message may carry any
/// non-zero number of parts, so objects stay readable after those change.
pub struct Downloader<C: ChannelClient> {
    channel: Arc<C>,
    channel_id: ChannelId,
}

/// An attachment as downloaded, before its position is settled.
struct FetchedPart {
    named_index: Option<usize>,
    content: Bytes,
    raw_file_name: String,
}

impl<C: ChannelClient> Downloader<C> {
    /// Create a new downloader.
    #[must_use]
    pub fn new(channel: Arc<C>, channel_id: ChannelId) -> Self {
        Self {
            channel,
            channel_id,
        }
    }

    /// Fetch every message in `message_ids` and reassemble the object.
    ///
    /// All messages are fetched concurrently and all fetches run to completion
    /// before any failure is reported. If one or more fail, every failure is
    /// returned and no bytes are.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty list, an aggregate of every
    /// per-message failure, or an internal error if the parts do not form a
    /// complete object.
    pub async fn download(&self, message_ids: &[MessageId]) -> StorageResult<StoredObject> {
        info!(messages = message_ids.len(), "Reading object");

        if message_ids.is_empty() {
            warn!("No message ids provided for reading object");
            return Err(StorageError::validation("no message ids provided"));
        }
        let started = Instant::now();

        let total = message_ids.len();
        let results = join_all(
            message_ids
                .iter()
                .enumerate()
                .map(|(position, &message_id)| self.fetch_parts(message_id, position, total)),
        )
        .await;

        let mut fetched = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(message_parts) => fetched.extend(message_parts),
                Err(e) => failures.push(e),
            }
        }

        if !failures.is_empty() {
            let ids = message_ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let reasons = failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            error!(
                message_ids = %ids,
                errors = %reasons,
                "One or more file parts failed to download"
            );
            return Err(StorageError::aggregate(
                "failed to retrieve one or more file parts",
                failures,
            ));
        }

        // Unsuffixed names take their place in message order.
        let parts = fetched
            .into_iter()
            .enumerate()
            .map(|(ordinal, part)| FilePart {
                index: part.named_index.unwrap_or(ordinal),
                content: part.content,
                raw_file_name: part.raw_file_name,
            })
            .collect();

        let object = assemble(parts).inspect_err(|e| {
            error!(error = %e, "Failed to assemble object from parts");
        })?;

        info!(
            name = %object.name,
            size = object.content.len(),
            messages = total,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Object reconstructed"
        );
        Ok(object)
    }

    /// Fetch one message and download all of its attachments.
    async fn fetch_parts(
        &self,
        message_id: MessageId,
        position: usize,
        total: usize,
    ) -> StorageResult<Vec<FetchedPart>> {
        debug!(
            message_id = %message_id,
            part = position + 1,
            total,
            "Fetching message"
        );

        let message = self
            .channel
            .get_message(self.channel_id, message_id)
            .await
            .map_err(|e| {
                warn!(message_id = %message_id, error = %e, "Failed to fetch message");
                StorageError::internal_caused_by(
                    format!("failed to fetch message {message_id}"),
                    e,
                )
            })?;

        if message.attachments.is_empty() {
            warn!(message_id = %message_id, "Message contains no attachments");
            return Err(StorageError::internal(format!(
                "message {message_id} contains no attachments"
            )));
        }

        let results = join_all(
            message
                .attachments
                .iter()
                .map(|attachment| self.download_part(message_id, attachment)),
        )
        .await;

        let mut parts = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(part) => parts.push(part),
                Err(e) => failures.push(e),
            }
        }
        if !failures.is_empty() {
            return Err(StorageError::aggregate(
                format!("failed to download message {message_id}"),
                failures,
            ));
        }
        Ok(parts)
    }

    /// Download one attachment. The chunk index comes from its name when present.
    async fn download_part(
        &self,
        message_id: MessageId,
        attachment: &ChannelAttachment,
    ) -> StorageResult<FetchedPart> {
        debug!(filename = %attachment.filename, "Downloading attachment");

        let content = self
            .channel
            .download_attachment(&attachment.url)
            .await
            .map_err(|e| {
                warn!(
                    message_id = %message_id,
                    filename = %attachment.filename,
                    error = %e,
                    "Failed to download attachment"
                );
                StorageError::internal_caused_by(
                    format!(
                        "failed to download attachment {} of message {message_id}",
                        attachment.filename
                    ),
                    e,
                )
            })?;

        debug!(filename = %attachment.filename, bytes = content.len(), "Finished downloading part");
        Ok(FetchedPart {
            named_index: codec::part_index_from(&attachment.filename),
            content,
            raw_file_name: attachment.filename.clone(),
        })
    }
}

/// Check the parts cover indices `0..n` exactly once, then reassemble.
fn assemble(mut parts: Vec<FilePart>) -> StorageResult<StoredObject> {
    parts.sort_by_key(|part| part.index);

    for (expected, part) in parts.iter().enumerate() {
        if part.index != expected {
            return Err(StorageError::internal(format!(
                "failed to assemble object: expected part {}, found part {} ({})",
                expected + 1,
                part.index + 1,
                part.raw_file_name
            )));
        }
    }

    let first_name = parts
        .first()
        .map(|part| part.raw_file_name.clone())
        .ok_or_else(|| StorageError::internal("failed to assemble object: no parts"))?;
    let name = codec::original_name_from(&first_name);
    if name == first_name {
        warn!(
            filename = %first_name,
            "Could not extract original name from part, using attachment name"
        );
    }

    Ok(StoredObject {
        name,
        content: codec::reassemble(parts),
    })
}
