//! Chunked object storage on top of a [`ChannelClient`](crate::channel::ChannelClient).
//!
//! An object is split into bounded-size chunks, the chunks are packed into
//! messages and the messages are sent to a single channel. The ordered list of
//! message ids is the only record of where the object lives; the catalog keeps it.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  split / name_for         ┌──────────────┐
//! │  Uploader  │ ────────────────────────▶ │              │
//! └────────────┘                           │  ChunkCodec  │
//! ┌────────────┐  part_index / reassemble  │   (codec)    │
//! │ Downloader │ ────────────────────────▶ │              │
//! └────────────┘                           └──────────────┘
//! ┌────────────┐
//! │  Deleter   │   sequential, tracks partial deletion
//! └────────────┘
//!        │ send_message / get_message / delete_message / download_attachment
//!        ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                    ChannelClient                      │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod codec;
mod deleter;
mod downloader;
mod error;
mod types;
mod uploader;

pub use deleter::{Deleter, DeletionSummary};
pub use downloader::Downloader;
pub use error::{StorageError, StorageResult};
pub use types::{Chunk, FilePart, StoredObject};
pub use uploader::Uploader;
