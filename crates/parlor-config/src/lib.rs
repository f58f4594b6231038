// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Parlor chat proxy.
//!
//! Settings are layered with figment (compiled defaults, then system, user
//! and local `parlor.toml`, then `PARLOR_*` variables), deserialized into
//! [`ParlorConfig`] with unknown keys rejected, and then validated as a
//! whole. Every entry point returns all problems at once as
//! [`ConfigError`] diagnostics so `parlor config` can report them together.
//!
//! ```no_run
//! let config = match parlor_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         parlor_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, SourceFile, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ParlorConfig;

/// Loads from the standard search paths and environment, then validates.
pub fn load_and_validate() -> Result<ParlorConfig, Vec<ConfigError>> {
    checked(loader::load_config(), || {
        loader::search_paths()
            .iter()
            .filter_map(|path| SourceFile::read(path))
            .collect()
    })
}

/// Loads one explicit file (plus environment overrides), then validates.
pub fn load_and_validate_path(path: &Path) -> Result<ParlorConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        SourceFile::read(path).into_iter().collect()
    })
}

/// Loads TOML text with no file or environment layers, then validates.
pub fn load_and_validate_str(toml: &str) -> Result<ParlorConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml), || {
        vec![SourceFile::inline(toml)]
    })
}

/// Validates a loaded config, or converts the load failure into diagnostics.
/// Sources are only read back when there is an error to point into.
fn checked(
    loaded: Result<ParlorConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<SourceFile>,
) -> Result<ParlorConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::from_figment(err, &sources())),
    }
}
