// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and built-in tools for the Parlor chat proxy.
//!
//! The [`ToolRegistry`] validates model-supplied arguments against each
//! tool's JSON Schema, dispatches invocations, and generates Anthropic-format
//! tool definitions for the LLM.
//!
//! Built-in tools include:
//! - [`builtin::weather::WeatherTool`] -- Current weather for a location
//! - [`builtin::stock::StockTool`] -- Latest quote for a ticker symbol
//! - [`builtin::race::RaceTool`] -- The next Formula 1 race

pub mod builtin;
pub mod tool;

pub use builtin::register_builtins;
pub use tool::{Tool, ToolRegistry};
