// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for store operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or truncated encoded payload.
    #[error("codec error: {0}")]
    Codec(String),

    /// Bad chunk-size or compression configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No chunk resolves for the given id or name.
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    /// A single remote document is absent from the catalog.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A chunk is missing, duplicated, or unorderable during reassembly.
    #[error("incomplete object {id}: {detail}")]
    IncompleteObject { id: String, detail: String },

    /// Cascading delete left survivors. Not retried automatically; the
    /// surviving chunk ids are reported so callers can decide to clean up.
    #[error("partial delete of {id}: {survivors:?} survived")]
    PartialDelete { id: String, survivors: Vec<String> },

    /// Network or service failure from the remote catalog, wrapped with the
    /// failing operation and document id. Never retried by the core.
    #[error("{op} failed for {id}: {source}")]
    Transport {
        op: &'static str,
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub fn transport<E>(op: &'static str, id: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            op,
            id: id.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;
