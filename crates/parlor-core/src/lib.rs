// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parlor chat proxy.
//!
//! This crate provides the error taxonomy, the conversation and event types,
//! and the adapter traits that the provider and storage crates implement.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParlorError;
pub use types::{
    AdapterType, CallerIdentity, ChatEvent, ChatMessage, HealthStatus, Message, NewMessage, Role,
    Session, ToolAttachment, ToolOutcome,
};

pub use traits::{PluginAdapter, ProviderAdapter, ProviderStream, StorageAdapter};
