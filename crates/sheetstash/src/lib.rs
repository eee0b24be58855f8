// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Store arbitrary binary payloads in a remote tabular-document service.
//!
//! Payloads are split into bounded chunks, optionally gzip-compressed,
//! rendered as cell-safe basE91 text, and written as documents in a single
//! container folder. The remote service's own metadata (string properties
//! on each document) carries all bookkeeping, so the catalog listing is the
//! only index.
//!
//! [`store::SheetStore`] is the operational surface: upload, download,
//! delete, clone, list, with concurrent batch variants. It is generic over
//! [`catalog::RemoteCatalog`], and ships with an in-memory backend
//! ([`catalog::memory::MemoryCatalog`]) for tests and offline use.

pub mod catalog;
pub mod chunk;
pub mod codec;
mod error;
pub mod progress;
pub mod resolve;
pub mod store;

pub use catalog::{DocumentId, DocumentMeta, RemoteCatalog, TypeTag, UploadStrategy};
pub use codec::Compression;
pub use error::{Error, Result};
pub use progress::{Direction, ProgressEvent};
pub use store::{SheetStore, StoredObject, UploadOptions};
