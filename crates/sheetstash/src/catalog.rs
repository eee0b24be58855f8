// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Remote catalog client abstraction
//!
//! Wraps the remote document service's create/get/export/list/delete/copy
//! primitives behind a trait so the store can be driven against the real
//! service or the in-memory implementation. Listing is paginated with
//! opaque continuation tokens; [`list_documents`] drives pagination to
//! completion and re-checks type tags client-side, because the remote
//! query language only supports coarse server-side filters.

pub mod memory;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Identifier of a remote document.
pub type DocumentId = String;

/// Marker distinguishing the roles a remote document can play: the root
/// container, a generated chunk document, or an externally-created
/// document being cloned. Catalog queries filter by this tag so unrelated
/// remote documents are never treated as managed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Folder,
    Sheet,
    Document,
}

impl TypeTag {
    /// The mime-equivalent marker string sent to the remote service.
    pub fn marker(&self) -> &'static str {
        match self {
            TypeTag::Folder => "application/vnd.stash.folder",
            TypeTag::Sheet => "application/vnd.stash.sheet",
            TypeTag::Document => "application/vnd.stash.document",
        }
    }
}

/// Transfer mechanics for large uploads. Selects between a single request
/// and a resumable multipart transfer; the on-remote representation is
/// identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStrategy {
    SingleShot,
    #[default]
    Multipart,
}

/// Metadata record for one remote document. String-valued properties
/// attached to the document carry all chunk bookkeeping; the remote store
/// itself is the catalog.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub id: DocumentId,
    pub name: String,
    pub type_tag: TypeTag,
    pub parent: Option<DocumentId>,
    pub properties: HashMap<String, String>,
    pub owners: Vec<String>,
    pub modified: DateTime<Utc>,
}

impl DocumentMeta {
    /// Original byte length of the stored object; non-numeric reads as 0.
    pub fn size(&self) -> u64 {
        self.property_u64("size").unwrap_or(0)
    }

    /// Number of chunk documents backing the object; non-numeric reads as 0.
    pub fn sheet_count(&self) -> u32 {
        self.property_u64("sheets").unwrap_or(0) as u32
    }

    /// This chunk's position within the object, if recorded.
    pub fn chunk_index(&self) -> Option<u32> {
        self.property_u64("chunk").map(|v| v as u32)
    }

    /// Id of the object's head chunk, present on every non-head chunk.
    pub fn head(&self) -> Option<&str> {
        self.properties.get("head").map(String::as_str)
    }

    pub fn path(&self) -> &str {
        self.properties.get("path").map(String::as_str).unwrap_or("")
    }

    pub fn starred(&self) -> bool {
        self.properties.get("starred").is_some_and(|v| v == "true")
    }

    fn property_u64(&self, key: &str) -> Option<u64> {
        self.properties.get(key).and_then(|v| v.parse().ok())
    }
}

/// Extra query predicate, AND-combined with the type-tag filter.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Exact name match.
    NameEquals(String),
    /// Substring name match.
    NameContains(String),
    /// Equality on a string-valued document property.
    PropertyEquals(String, String),
}

impl Predicate {
    fn matches(&self, meta: &DocumentMeta) -> bool {
        match self {
            Predicate::NameEquals(name) => meta.name == *name,
            Predicate::NameContains(needle) => meta.name.contains(needle),
            Predicate::PropertyEquals(key, value) => {
                meta.properties.get(key) == Some(value)
            }
        }
    }
}

/// A paginated listing request.
///
/// The server-side predicate is the OR of the requested type tags (an empty
/// set applies no type predicate at all), AND-combined with `extra`.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub parent: Option<DocumentId>,
    pub type_tags: Vec<TypeTag>,
    pub extra: Option<Predicate>,
    pub page_size: usize,
}

impl ListQuery {
    pub const PAGE_SIZE_DEFAULT: usize = 50;

    #[must_use]
    pub fn new(parent: Option<DocumentId>, type_tags: Vec<TypeTag>) -> Self {
        Self {
            parent,
            type_tags,
            extra: None,
            page_size: Self::PAGE_SIZE_DEFAULT,
        }
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Predicate) -> Self {
        self.extra = Some(extra);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The server-side predicate, used by backends to evaluate a query.
    pub fn matches(&self, meta: &DocumentMeta) -> bool {
        if let Some(parent) = &self.parent {
            if meta.parent.as_deref() != Some(parent.as_str()) {
                return false;
            }
        }
        if !self.type_tags.is_empty() && !self.type_tags.contains(&meta.type_tag) {
            return false;
        }
        self.extra.as_ref().is_none_or(|extra| extra.matches(meta))
    }
}

/// One page of listing results plus the continuation token, if any.
#[derive(Debug, Clone)]
pub struct Page {
    pub documents: Vec<DocumentMeta>,
    pub next_token: Option<String>,
}

/// Request to create one remote document.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub parent: Option<DocumentId>,
    pub name: String,
    pub type_tag: TypeTag,
    pub properties: HashMap<String, String>,
    pub body: Vec<u8>,
    pub strategy: UploadStrategy,
}

/// Request for a server-side copy of an existing document. No payload
/// passes through this process.
#[derive(Debug, Clone)]
pub struct CloneDocument {
    pub parent: Option<DocumentId>,
    pub name: String,
    pub properties: HashMap<String, String>,
}

/// The remote primitives everything above this layer is built on.
///
/// Implementations surface network failures as [`Error::Transport`] wrapped
/// with the operation name and document id; the core never retries.
///
/// [`Error::Transport`]: crate::error::Error::Transport
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Upload a new document, returning its metadata.
    async fn create_document(&self, request: CreateDocument) -> Result<DocumentMeta>;

    /// Fetch a document's metadata. Fails with `NotFound` if absent.
    async fn get_document(&self, id: &str) -> Result<DocumentMeta>;

    /// Read back a document's stored body.
    async fn export_body(&self, id: &str) -> Result<Vec<u8>>;

    /// Fetch one page of a listing. `page_token` of `None` starts from the
    /// beginning; iteration stops when no further token is returned.
    async fn list_page(&self, query: &ListQuery, page_token: Option<String>) -> Result<Page>;

    /// Delete a document. Fails with `NotFound` if absent.
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Server-side copy of `id` under new metadata.
    async fn clone_document(&self, id: &str, request: CloneDocument) -> Result<DocumentMeta>;
}

/// Drive a paginated listing to completion.
///
/// Pages are fetched on demand; iteration stops when the store returns no
/// further token or an empty page. `limit` (`None` = unbounded) caps how
/// many matching records are returned, counted only after the client-side
/// type-tag re-check — server-side filtering is never trusted alone for
/// correctness-sensitive counts.
pub async fn list_documents<C>(
    catalog: &C,
    query: &ListQuery,
    limit: Option<usize>,
) -> Result<Vec<DocumentMeta>>
where
    C: RemoteCatalog + ?Sized,
{
    if limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let mut page_token = None;
    loop {
        let page = catalog.list_page(query, page_token).await?;
        if page.documents.is_empty() {
            break;
        }
        for meta in page.documents {
            if !query.type_tags.is_empty() && !query.type_tags.contains(&meta.type_tag) {
                continue;
            }
            found.push(meta);
            if limit.is_some_and(|limit| found.len() >= limit) {
                return Ok(found);
            }
        }
        match page.next_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }
    Ok(found)
}
