// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model gateway for the Parlor chat proxy.
//!
//! The [`ChatAgent`] is the central coordinator that:
//! - Streams provider responses as [`ChatEvent`](parlor_core::ChatEvent)s
//! - Runs the tools the model requests and feeds results back
//! - Stops the upstream call when the consumer goes away
//!
//! [`TurnTranscript`] assembles the assistant message to persist once a
//! turn completes.

pub mod chat;
pub mod gateway;
pub mod shutdown;
pub mod transcript;

pub use chat::ChatAgent;
pub use gateway::{EventStream, GenerateRequest, ModelGateway};
pub use transcript::TurnTranscript;
