//! Core storage engine for Cordstore.
//!
//! This crate contains the chunked blob storage engine with ZERO HTTP or
//! filesystem dependencies. The remote channel and the metadata catalog are
//! reached through traits; the `cordstore-channel` and `cordstore-catalog`
//! crates implement them.
//!
//! # Modules
//!
//! - `channel` - Contract of the remote messaging channel
//! - `storage` - Chunk codec, uploader, downloader and deleter
//! - `catalog` - Object record contract and in-memory catalog
//! - `queue` - Single-consumer task queue, processors and worker
//! - `service` - Caller-facing API on top of the queue

pub mod catalog;
pub mod channel;
pub mod queue;
pub mod service;
pub mod storage;

pub use service::StorageService;

#[cfg(test)]
mod testing;
