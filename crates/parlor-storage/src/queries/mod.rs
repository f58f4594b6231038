// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for sessions and messages.
//!
//! Every function is scoped to an owner. A session that does not exist and a
//! session owned by someone else are indistinguishable here: both come back
//! as `None`, and the adapter turns that into `Unauthorized`.

pub mod messages;
pub mod sessions;
