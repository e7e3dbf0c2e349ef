//! In-memory channel used by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use cordstore_shared::{ChannelId, MessageId};

use crate::channel::{
    ChannelAttachment, ChannelClient, ChannelError, ChannelIdentity, ChannelMessage,
    OutgoingAttachment,
};

const URL_PREFIX: &str = "mock://";

/// Channel double that keeps messages in memory.
///
/// Failures, panics and latency can be injected per attachment name or message id.
/// Every call, and every completed send, is appended to an event log so tests
/// can check ordering.
#[derive(Default)]
pub struct MockChannel {
    next_id: AtomicU64,
    messages: Mutex<HashMap<MessageId, Vec<(String, Bytes)>>>,
    send_delays: Mutex<HashMap<String, Duration>>,
    failing_sends: Mutex<HashSet<String>>,
    panicking_sends: Mutex<HashSet<String>>,
    failing_gets: Mutex<HashSet<MessageId>>,
    failing_deletes: Mutex<HashSet<MessageId>>,
    failing_downloads: Mutex<HashSet<String>>,
    completed_sends: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    /// Store a message directly, bypassing `send_message`.
    pub fn insert_message(&self, attachments: Vec<(&str, Bytes)>) -> MessageId {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let attachments = attachments
            .into_iter()
            .map(|(name, content)| (name.to_string(), content))
            .collect();
        self.messages.lock().unwrap().insert(id, attachments);
        id
    }

    pub fn remove_message(&self, id: MessageId) {
        self.messages.lock().unwrap().remove(&id);
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.lock().unwrap().contains_key(&id)
    }

    pub fn attachment_names(&self, id: MessageId) -> Vec<String> {
        self.messages.lock().unwrap()[&id]
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn attachment_sizes(&self, id: MessageId) -> Vec<usize> {
        self.messages.lock().unwrap()[&id]
            .iter()
            .map(|(_, content)| content.len())
            .collect()
    }

    /// Delay the send whose first attachment is `filename`.
    pub fn delay_send_of(&self, filename: &str, delay: Duration) {
        self.send_delays
            .lock()
            .unwrap()
            .insert(filename.to_string(), delay);
    }

    pub fn fail_send_of(&self, filename: &str) {
        self.failing_sends
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    pub fn panic_on_send_of(&self, filename: &str) {
        self.panicking_sends
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    pub fn fail_get_of(&self, id: MessageId) {
        self.failing_gets.lock().unwrap().insert(id);
    }

    pub fn fail_delete_of(&self, id: MessageId) {
        self.failing_deletes.lock().unwrap().insert(id);
    }

    pub fn fail_download_of(&self, filename: &str) {
        self.failing_downloads
            .lock()
            .unwrap()
            .insert(filename.to_string());
    }

    /// First attachment name of each successful send, in completion order.
    pub fn send_completion_order(&self) -> Vec<String> {
        self.completed_sends.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ChannelClient for MockChannel {
    async fn send_message(
        &self,
        _channel_id: ChannelId,
        attachments: Vec<OutgoingAttachment>,
    ) -> Result<MessageId, ChannelError> {
        let first = attachments
            .first()
            .map(|a| a.filename.clone())
            .unwrap_or_default();
        self.record(format!("send:{first}"));

        let delay = self.send_delays.lock().unwrap().get(&first).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking_sends.lock().unwrap().contains(&first) {
            panic!("send of {first} blew up");
        }
        if self.failing_sends.lock().unwrap().contains(&first) {
            return Err(ChannelError::transport(format!("send of {first} failed")));
        }

        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let stored = attachments
            .into_iter()
            .map(|a| (a.filename, a.content))
            .collect();
        self.messages.lock().unwrap().insert(id, stored);
        self.record(format!("sent:{first}"));
        self.completed_sends.lock().unwrap().push(first);
        Ok(id)
    }

    async fn get_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<ChannelMessage, ChannelError> {
        self.record(format!("get:{message_id}"));
        if self.failing_gets.lock().unwrap().contains(&message_id) {
            return Err(ChannelError::transport(format!(
                "connection reset while fetching {message_id}"
            )));
        }

        let messages = self.messages.lock().unwrap();
        let attachments = messages
            .get(&message_id)
            .ok_or_else(|| ChannelError::not_found(format!("message {message_id}")))?;
        Ok(ChannelMessage {
            id: message_id,
            attachments: attachments
                .iter()
                .map(|(name, content)| ChannelAttachment {
                    filename: name.clone(),
                    url: format!("{URL_PREFIX}{message_id}/{name}"),
                    size: content.len() as u64,
                })
                .collect(),
        })
    }

    async fn delete_message(
        &self,
        _channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        self.record(format!("delete:{message_id}"));
        if self.failing_deletes.lock().unwrap().contains(&message_id) {
            return Err(ChannelError::Status {
                status: 403,
                body: "missing permissions".to_string(),
            });
        }
        match self.messages.lock().unwrap().remove(&message_id) {
            Some(_) => Ok(()),
            None => Err(ChannelError::not_found(format!("message {message_id}"))),
        }
    }

    async fn download_attachment(&self, url: &str) -> Result<Bytes, ChannelError> {
        let (id, name) = url
            .strip_prefix(URL_PREFIX)
            .and_then(|rest| rest.split_once('/'))
            .ok_or_else(|| ChannelError::invalid_response(format!("bad url {url}")))?;
        self.record(format!("download:{name}"));
        if self.failing_downloads.lock().unwrap().contains(name) {
            return Err(ChannelError::Status {
                status: 500,
                body: format!("download of {name} failed"),
            });
        }

        let id: MessageId = id
            .parse()
            .map_err(|_| ChannelError::invalid_response(format!("bad url {url}")))?;
        let messages = self.messages.lock().unwrap();
        messages
            .get(&id)
            .and_then(|attachments| attachments.iter().find(|(n, _)| n == name))
            .map(|(_, content)| content.clone())
            .ok_or_else(|| ChannelError::not_found(format!("attachment {url}")))
    }

    async fn current_identity(&self) -> Result<ChannelIdentity, ChannelError> {
        Ok(ChannelIdentity {
            username: "mock".to_string(),
            discriminator: "0".to_string(),
        })
    }
}
