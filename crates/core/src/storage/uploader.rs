//! Storing an object as a sequence of channel messages.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use cordstore_shared::{ChannelId, MessageId, StorageConfig};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{error, info, warn};

use super::codec;
use super::error::{StorageError, StorageResult};
use super::types::Chunk;
use crate::channel::{ChannelClient, OutgoingAttachment};

/// Splits objects into chunks and sends them to the channel.
pub struct Uploader<C: ChannelClient> {
    channel: Arc<C>,
    channel_id: ChannelId,
    config: StorageConfig,
}

impl<C: ChannelClient> Uploader<C> {
    /// Create a new uploader.
    #[must_use]
    pub fn new(channel: Arc<C>, channel_id: ChannelId, config: StorageConfig) -> Self {
        Self {
            channel,
            channel_id,
            config,
        }
    }

    /// Store `content` under `base_name` and return one message id per sent message,
    /// in chunk order.
    ///
    /// Messages are sent concurrently. If any send fails the messages that did go
    /// through are deleted again and the whole upload fails.
    ///
    /// An empty object is stored as a single empty chunk so it can be read back.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, the limits are unusable, or any send fails.
    pub async fn upload(&self, content: Bytes, base_name: &str) -> StorageResult<Vec<MessageId>> {
        if base_name.is_empty() {
            return Err(StorageError::validation("object name must not be empty"));
        }
        self.config
            .validate()
            .map_err(|e| StorageError::validation(e.to_string()))?;

        info!(
            name = base_name,
            size = content.len(),
            "Uploading object"
        );
        let started = Instant::now();

        let mut chunks = codec::split(&content, base_name, self.config.max_chunk_size);
        if chunks.is_empty() {
            chunks.push(Chunk {
                index: 0,
                payload: Bytes::new(),
                source_name: codec::name_for(base_name, 0),
            });
        }
        // Chunks hold views into `content`; drop our handle so the buffer goes
        // away with the last in-flight send.
        drop(content);

        let chunk_count = chunks.len();
        let mut sends: FuturesUnordered<_> = chunks
            .chunks(self.config.batch_width())
            .map(|batch| {
                let first_index = batch[0].index;
                let attachments: Vec<OutgoingAttachment> = batch
                    .iter()
                    .map(|chunk| OutgoingAttachment {
                        filename: chunk.source_name.clone(),
                        content: chunk.payload.clone(),
                    })
                    .collect();
                async move {
                    let result = self
                        .channel
                        .send_message(self.channel_id, attachments)
                        .await;
                    (first_index, result)
                }
            })
            .collect();
        drop(chunks);

        let mut sent = Vec::new();
        let mut failures = Vec::new();
        while let Some((first_index, result)) = sends.next().await {
            match result {
                Ok(message_id) => sent.push((first_index, message_id)),
                Err(e) => {
                    error!(
                        name = base_name,
                        first_chunk = first_index,
                        error = %e,
                        "Failed to send chunk batch"
                    );
                    failures.push(StorageError::from_channel(
                        format!("failed to send chunks starting at part {}", first_index + 1),
                        e,
                    ));
                }
            }
        }

        // Completion order is arbitrary; chunk order is what reassembly needs.
        sent.sort_by_key(|(first_index, _)| *first_index);
        let message_ids: Vec<MessageId> = sent.into_iter().map(|(_, id)| id).collect();

        if !failures.is_empty() {
            self.discard(&message_ids).await;
            return Err(StorageError::aggregate(
                format!("failed to upload {base_name}"),
                failures,
            ));
        }

        info!(
            name = base_name,
            chunks = chunk_count,
            messages = message_ids.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Object uploaded"
        );
        Ok(message_ids)
    }

    /// Best-effort removal of messages sent by a failed upload.
    async fn discard(&self, message_ids: &[MessageId]) {
        for &message_id in message_ids {
            if let Err(e) = self
                .channel
                .delete_message(self.channel_id, message_id)
                .await
            {
                if !e.is_not_found() {
                    warn!(
                        message_id = %message_id,
                        error = %e,
                        "Failed to discard message of failed upload"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::MockChannel;

    const CHANNEL: ChannelId = ChannelId(1);

    fn uploader(channel: &Arc<MockChannel>, config: StorageConfig) -> Uploader<MockChannel> {
        Uploader::new(Arc::clone(channel), CHANNEL, config)
    }

    #[tokio::test]
    async fn test_upload_batches_chunks_into_messages() {
        let channel = Arc::new(MockChannel::new());
        let config = StorageConfig::default()
            .with_max_chunk_size(4)
            .with_max_attachments_per_message(2);

        let ids = uploader(&channel, config)
            .upload(Bytes::from_static(b"abcdefghij"), "notes.txt")
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(
            channel.attachment_names(ids[0]),
            vec!["notes.txt.part1", "notes.txt.part2"]
        );
        assert_eq!(channel.attachment_names(ids[1]), vec!["notes.txt.part3"]);
    }

    #[tokio::test]
    async fn test_upload_twenty_mib_in_three_messages() {
        const MIB: usize = 1024 * 1024;
        let channel = Arc::new(MockChannel::new());
        let config = StorageConfig::default()
            .with_max_chunk_size(8 * MIB)
            .with_max_attachments_per_message(1);

        let ids = uploader(&channel, config)
            .upload(Bytes::from(vec![3u8; 20 * MIB]), "disk.img")
            .await
            .unwrap();

        assert_eq!(ids.len(), 3);
        let sizes: Vec<usize> = ids
            .iter()
            .map(|id| channel.attachment_sizes(*id)[0])
            .collect();
        assert_eq!(sizes, vec![8 * MIB, 8 * MIB, 4 * MIB]);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(
                channel.attachment_names(*id),
                vec![format!("disk.img.part{}", i + 1)]
            );
        }
    }

    #[tokio::test]
    async fn test_upload_preserves_chunk_order_when_sends_finish_out_of_order() {
        let channel = Arc::new(MockChannel::new());
        // Earlier sends take longer, so they complete last.
        channel.delay_send_of("o.bin.part1", Duration::from_millis(60));
        channel.delay_send_of("o.bin.part2", Duration::from_millis(40));
        channel.delay_send_of("o.bin.part3", Duration::from_millis(20));
        let config = StorageConfig::default()
            .with_max_chunk_size(2)
            .with_max_attachments_per_message(1);

        let ids = uploader(&channel, config)
            .upload(Bytes::from_static(b"aabbccdd"), "o.bin")
            .await
            .unwrap();

        let names: Vec<Vec<String>> = ids.iter().map(|id| channel.attachment_names(*id)).collect();
        assert_eq!(
            names,
            vec![
                vec!["o.bin.part1"],
                vec!["o.bin.part2"],
                vec!["o.bin.part3"],
                vec!["o.bin.part4"]
            ]
        );
        let completions = channel.send_completion_order();
        assert_eq!(completions.first().map(String::as_str), Some("o.bin.part4"));
    }

    #[tokio::test]
    async fn test_upload_empty_object_sends_single_empty_chunk() {
        let channel = Arc::new(MockChannel::new());

        let ids = uploader(&channel, StorageConfig::default())
            .upload(Bytes::new(), "empty.txt")
            .await
            .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(channel.attachment_names(ids[0]), vec!["empty.txt.part1"]);
        assert_eq!(channel.attachment_sizes(ids[0]), vec![0]);
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_name() {
        let channel = Arc::new(MockChannel::new());
        let err = uploader(&channel, StorageConfig::default())
            .upload(Bytes::from_static(b"x"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert_eq!(channel.message_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_failure_discards_sent_messages() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_send_of("o.bin.part2");
        let config = StorageConfig::default()
            .with_max_chunk_size(2)
            .with_max_attachments_per_message(1);

        let err = uploader(&channel, config)
            .upload(Bytes::from_static(b"aabbcc"), "o.bin")
            .await
            .unwrap_err();

        assert_eq!(err.causes().len(), 1);
        assert!(err.causes()[0].to_string().contains("part 2"));
        assert_eq!(channel.message_count(), 0);
    }
}
