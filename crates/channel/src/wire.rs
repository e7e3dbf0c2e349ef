//! Request and response bodies of the channel REST API.

use std::time::Duration;

use cordstore_core::channel::{ChannelAttachment, ChannelIdentity, ChannelMessage};
use cordstore_shared::MessageId;
use serde::{Deserialize, Serialize};

/// JSON part of a multipart message upload.
#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub attachments: Vec<AttachmentSlot>,
}

/// Declares one `files[n]` part of the upload.
#[derive(Debug, Serialize)]
pub struct AttachmentSlot {
    pub id: usize,
    pub filename: String,
}

impl MessagePayload {
    pub fn for_files<'a>(filenames: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            attachments: filenames
                .into_iter()
                .enumerate()
                .map(|(id, filename)| AttachmentSlot {
                    id,
                    filename: filename.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub id: MessageId,
    #[serde(default)]
    pub attachments: Vec<AttachmentResponse>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentResponse {
    pub filename: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

impl From<MessageResponse> for ChannelMessage {
    fn from(message: MessageResponse) -> Self {
        Self {
            id: message.id,
            attachments: message
                .attachments
                .into_iter()
                .map(|a| ChannelAttachment {
                    filename: a.filename,
                    url: a.url,
                    size: a.size,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub username: String,
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl From<UserResponse> for ChannelIdentity {
    fn from(user: UserResponse) -> Self {
        Self {
            username: user.username,
            discriminator: user.discriminator,
        }
    }
}

/// Body of a 429 response.
#[derive(Debug, Deserialize)]
pub struct RateLimitResponse {
    /// Seconds to wait, fractional.
    pub retry_after: f64,
}

/// Longest delay honoured from a 429 response.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Delay advertised by a 429 response.
///
/// The JSON body wins over the `Retry-After` header; without either, or for a
/// negative or non-finite value, one second. Capped at [`MAX_RETRY_AFTER`].
pub fn retry_after(header: Option<&str>, body: &str) -> Duration {
    serde_json::from_str::<RateLimitResponse>(body)
        .ok()
        .map(|r| r.retry_after)
        .or_else(|| header.and_then(|h| h.trim().parse::<f64>().ok()))
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .map_or(Duration::from_secs(1), |seconds| {
            Duration::from_secs_f64(seconds.min(MAX_RETRY_AFTER.as_secs_f64()))
        })
}
