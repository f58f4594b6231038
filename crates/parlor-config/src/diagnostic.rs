// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment extraction failures into miette diagnostics.
//!
//! Unknown keys get a "did you mean" hint (Jaro-Winkler via `strsim`) and,
//! when the offending file is known, a labelled span pointing at the key.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Sentinel name for TOML that did not come from a file.
pub const INLINE_SOURCE: &str = "<inline>";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}` in {}", section_label(section))]
    #[diagnostic(
        code(parlor::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Dotted section path; empty for the top level.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(parlor::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("expected {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}` in {}", section_label(section))]
    #[diagnostic(
        code(parlor::config::missing_key),
        help("add `{key} = <value>` under {}", section_label(section))
    )]
    MissingKey { key: String, section: String },

    /// A value that parsed but is not acceptable.
    #[error("validation error: {message}")]
    #[diagnostic(code(parlor::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(parlor::config::other))]
    Other(String),
}

fn section_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// TOML text that took part in a load, kept so errors can point into it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn inline(content: &str) -> Self {
        Self {
            name: INLINE_SOURCE.to_string(),
            content: content.to_string(),
        }
    }

    /// Reads a file, or `None` when it does not exist or is unreadable.
    pub fn read(path: &std::path::Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        Some(Self {
            name: path.display().to_string(),
            content,
        })
    }

    /// Byte offset of `key` inside the table `section`.
    ///
    /// Table headers are matched in both `[a.b]` and `[[a.b]]` form; array
    /// indices in the section path are ignored. The search stops at the
    /// next header so a key is never attributed to the wrong table.
    pub fn locate(&self, section: &[String], key: &str) -> Option<usize> {
        let table: Vec<&str> = section
            .iter()
            .map(String::as_str)
            .filter(|s| s.parse::<usize>().is_err())
            .collect();
        let table = table.join(".");

        let mut in_table = table.is_empty();
        let mut offset = 0;
        for line in self.content.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .trim_start_matches('[')
                    .split(']')
                    .next()
                    .unwrap_or_default()
                    .trim();
                in_table = name == table;
            } else if in_table
                && let Some(rest) = trimmed.strip_prefix(key)
                && rest.trim_start().starts_with('=')
            {
                return Some(offset + (line.len() - trimmed.len()));
            }
            offset += line.len();
        }
        None
    }
}

/// Best correction for `unknown` among `candidates`, if any is close enough.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|&key| (strsim::jaro_winkler(unknown, key), key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Converts every error inside a figment failure into a [`ConfigError`].
pub fn from_figment(err: figment::Error, sources: &[SourceFile]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| {
            let section = error.path.join(".");
            match &error.kind {
                Kind::UnknownField(key, expected) => {
                    let table = match error.path.split_last() {
                        Some((last, table)) if last == key => table,
                        _ => &error.path[..],
                    };
                    let (span, src) = pinpoint(&error, table, key, sources);
                    ConfigError::UnknownKey {
                        key: key.clone(),
                        section: table.join("."),
                        suggestion: suggest_key(key, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::MissingField(key) => ConfigError::MissingKey {
                    key: key.to_string(),
                    section,
                },
                Kind::InvalidType(found, expected) => {
                    let (table, key) = match error.path.split_last() {
                        Some((key, table)) => (table, key.as_str()),
                        None => (&[][..], ""),
                    };
                    let (span, src) = pinpoint(&error, table, key, sources);
                    ConfigError::InvalidType {
                        key: section,
                        found: found.to_string(),
                        expected: expected.clone(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

/// Span and source for `key`, preferring the file figment blamed.
fn pinpoint(
    error: &figment::Error,
    table: &[String],
    key: &str,
    sources: &[SourceFile],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    if key.is_empty() {
        return (None, None);
    }

    let blamed = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    let ordered = sources
        .iter()
        .filter(|s| Some(&s.name) == blamed.as_ref())
        .chain(sources.iter().filter(|s| Some(&s.name) != blamed.as_ref()));

    for source in ordered {
        if let Some(offset) = source.locate(table, key) {
            let span = SourceSpan::new(offset.into(), key.len());
            let named = NamedSource::new(&source.name, source.content.clone());
            return (Some(span), Some(named));
        }
    }
    (None, None)
}

/// Prints every error to stderr, preceded by a count.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let plural = if errors.len() == 1 { "" } else { "s" };
    eprintln!("parlor: {} configuration error{plural}", errors.len());

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        match handler.render_report(&mut buf, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{buf}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
