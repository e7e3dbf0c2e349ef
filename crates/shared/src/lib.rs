//! Shared types, errors, and configuration for Cordstore.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for objects, channel messages and channels
//! - The error taxonomy shared by every storage operation
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use crate::config::{AppConfig, CatalogConfig, ChannelConfig, ConfigError, StorageConfig};
pub use error::ErrorKind;
pub use types::{ChannelId, MessageId, ObjectId};
