//! Channel client over the REST API.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use cordstore_core::channel::{
    ChannelClient, ChannelError, ChannelIdentity, ChannelMessage, OutgoingAttachment,
};
use cordstore_shared::{ChannelConfig, ChannelId, MessageId};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, RequestBuilder, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::wire::{self, MessagePayload, MessageResponse, UserResponse};

const USER_AGENT: &str = concat!("cordstore/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 512;

/// [`ChannelClient`] that talks to a Discord-compatible REST API.
///
/// Rate-limited requests are retried after the advertised delay, up to the
/// configured number of times. Every request gives up as soon as the
/// cancellation token fires.
#[derive(Debug, Clone)]
pub struct RestChannelClient {
    api: reqwest::Client,
    cdn: reqwest::Client,
    base_url: String,
    max_retries: u32,
    token: CancellationToken,
}

impl RestChannelClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the bot token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(config: &ChannelConfig, token: CancellationToken) -> Result<Self, ChannelError> {
        let mut auth = HeaderValue::from_str(&format!("Bot {}", config.bot_token))
            .map_err(|e| ChannelError::transport(format!("invalid bot token: {e}")))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let timeout = Duration::from_secs(config.request_timeout_secs);
        let api = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(ChannelError::transport)?;
        // Attachment URLs are plain CDN links and must not see the bot token.
        let cdn = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(ChannelError::transport)?;

        Ok(Self {
            api,
            cdn,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            token,
        })
    }

    fn messages_url(&self, channel_id: ChannelId) -> String {
        format!("{}/channels/{channel_id}/messages", self.base_url)
    }

    fn message_url(&self, channel_id: ChannelId, message_id: MessageId) -> String {
        format!("{}/channels/{channel_id}/messages/{message_id}", self.base_url)
    }

    fn current_user_url(&self) -> String {
        format!("{}/users/@me", self.base_url)
    }

    async fn cancellable<T>(&self, fut: impl Future<Output = T>) -> Result<T, ChannelError> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ChannelError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Send a request, retrying while rate limited, and map failure statuses.
    async fn execute<F>(&self, build: F) -> Result<Response, ChannelError>
    where
        F: Fn() -> RequestBuilder + Sync,
    {
        let mut attempt = 0;
        loop {
            let response = self
                .cancellable(build().send())
                .await?
                .map_err(ChannelError::transport)?;
            let status = response.status();
            debug!(url = %response.url(), status = status.as_u16(), "Channel response");

            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::NOT_FOUND {
                return Err(ChannelError::not_found(response.url().path().to_string()));
            }

            let retry_header = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = self.cancellable(response.text()).await?.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = wire::retry_after(retry_header.as_deref(), &body);
                if attempt >= self.max_retries {
                    return Err(ChannelError::RateLimited { retry_after: delay });
                }
                attempt += 1;
                warn!(
                    attempt,
                    max_retries = self.max_retries,
                    retry_after_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Rate limited by channel, retrying"
                );
                self.cancellable(tokio::time::sleep(delay)).await?;
                continue;
            }

            return Err(ChannelError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

impl ChannelClient for RestChannelClient {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        attachments: Vec<OutgoingAttachment>,
    ) -> Result<MessageId, ChannelError> {
        let payload = serde_json::to_string(&MessagePayload::for_files(
            attachments.iter().map(|a| a.filename.as_str()),
        ))
        .map_err(ChannelError::transport)?;
        let url = self.messages_url(channel_id);

        let response = self
            .execute(|| {
                let mut form = Form::new().text("payload_json", payload.clone());
                for (i, attachment) in attachments.iter().enumerate() {
                    let length = u64::try_from(attachment.content.len()).unwrap_or(u64::MAX);
                    let part = Part::stream_with_length(Body::from(attachment.content.clone()), length)
                        .file_name(attachment.filename.clone());
                    form = form.part(format!("files[{i}]"), part);
                }
                self.api.post(&url).multipart(form)
            })
            .await?;

        let message: MessageResponse = self
            .cancellable(response.json())
            .await?
            .map_err(|e| ChannelError::invalid_response(e.to_string()))?;
        debug!(message_id = %message.id, attachments = attachments.len(), "Message sent");
        Ok(message.id)
    }

    async fn get_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<ChannelMessage, ChannelError> {
        let url = self.message_url(channel_id, message_id);
        let response = self.execute(|| self.api.get(&url)).await?;
        let message: MessageResponse = self
            .cancellable(response.json())
            .await?
            .map_err(|e| ChannelError::invalid_response(e.to_string()))?;
        Ok(message.into())
    }

    async fn delete_message(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<(), ChannelError> {
        let url = self.message_url(channel_id, message_id);
        self.execute(|| self.api.delete(&url)).await?;
        Ok(())
    }

    async fn download_attachment(&self, url: &str) -> Result<Bytes, ChannelError> {
        let response = self.execute(|| self.cdn.get(url)).await?;
        self.cancellable(response.bytes())
            .await?
            .map_err(ChannelError::transport)
    }

    async fn current_identity(&self) -> Result<ChannelIdentity, ChannelError> {
        let url = self.current_user_url();
        let response = self.execute(|| self.api.get(&url)).await?;
        let user: UserResponse = self
            .cancellable(response.json())
            .await?
            .map_err(|e| ChannelError::invalid_response(e.to_string()))?;
        Ok(user.into())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
