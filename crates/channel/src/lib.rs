//! REST transport for the Cordstore channel contract.
//!
//! Messages are created with multipart uploads (`payload_json` plus one
//! `files[n]` part per chunk), read back as JSON and deleted by id. Attachment
//! bytes are fetched from their CDN URLs with a separate, unauthenticated client.

mod client;
mod wire;

pub use client::RestChannelClient;
