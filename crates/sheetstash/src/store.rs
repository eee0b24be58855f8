// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Object store orchestration
//!
//! Composes the chunk planner, the codec pipeline, and the remote catalog
//! into the upload/download/delete/clone surface. Every managed object is
//! one or more chunk documents inside a single root container; there is no
//! separate index, the catalog listing is the source of truth.

use crate::catalog::{
    CloneDocument, CreateDocument, DocumentId, DocumentMeta, ListQuery, Predicate, RemoteCatalog,
    TypeTag, UploadStrategy, list_documents,
};
use crate::chunk;
use crate::codec::{Codec, Compression};
use crate::error::{Error, Result};
use crate::progress::{self, Direction, ProgressSender};
use crate::resolve;
use chrono::{DateTime, Utc};
use futures::future::{join_all, try_join_all};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Name of the root container folder holding all managed objects.
pub const CONTAINER_NAME: &str = "sheetstash";

/// Part size used to report multipart transfer progress. 8 MB.
const MULTIPART_PART_BYTES: u64 = 8 * 1024 * 1024;

const PROP_SIZE: &str = "size";
const PROP_SHEETS: &str = "sheets";
const PROP_CHUNK: &str = "chunk";
const PROP_HEAD: &str = "head";
const PROP_PATH: &str = "path";
const PROP_COMPRESSION: &str = "compression";
const PROP_CHUNK_SIZE: &str = "chunksize";
const PROP_STARRED: &str = "starred";

/// The logical uploaded artifact as seen by a user, projected from the
/// head chunk's document properties.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub id: DocumentId,
    pub name: String,
    pub size: u64,
    pub chunk_count: u32,
    pub compression: Compression,
    pub path: String,
    pub starred: bool,
    pub owners: Vec<String>,
    pub modified: DateTime<Utc>,
}

impl StoredObject {
    /// Lenient projection for listings: non-numeric counters read as zero,
    /// absent tags as empty, unknown compression as none.
    fn from_meta(meta: &DocumentMeta) -> Self {
        let compression = meta
            .properties
            .get(PROP_COMPRESSION)
            .and_then(|v| Compression::from_property(v).ok())
            .unwrap_or_default();
        Self {
            id: meta.id.clone(),
            name: meta.name.clone(),
            size: meta.size(),
            chunk_count: meta.sheet_count(),
            compression,
            path: meta.path().to_string(),
            starred: meta.starred(),
            owners: meta.owners.clone(),
            modified: meta.modified,
        }
    }
}

/// Per-upload knobs. The defaults mirror the service's practical limits:
/// 10 MB chunks, no compression, multipart transfer.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub path: String,
    pub max_chunk_bytes: u64,
    pub compression: Compression,
    pub strategy: UploadStrategy,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_chunk_bytes: chunk::MAX_CHUNK_BYTES_DEFAULT,
            compression: Compression::None,
            strategy: UploadStrategy::Multipart,
        }
    }
}

impl UploadOptions {
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_max_chunk_bytes(mut self, max_chunk_bytes: u64) -> Self {
        self.max_chunk_bytes = max_chunk_bytes;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: UploadStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// The object store: a catalog handle plus the resolved container id.
///
/// The container is found or created once in [`SheetStore::open`] and the
/// id is held immutably for the life of the handle; all operations take
/// `&self` and may run concurrently.
pub struct SheetStore<C> {
    catalog: C,
    container: DocumentId,
    progress: Option<ProgressSender>,
}

impl<C: RemoteCatalog> SheetStore<C> {
    /// Open the store, finding or creating the root container.
    pub async fn open(catalog: C) -> Result<Self> {
        debug!("finding container folder {:?}", CONTAINER_NAME);
        let query = ListQuery::new(None, vec![TypeTag::Folder])
            .with_extra(Predicate::NameEquals(CONTAINER_NAME.to_string()));
        let existing = list_documents(&catalog, &query, Some(1)).await?;
        let container = match resolve::pick_latest(existing) {
            Some(folder) => folder.id,
            None => {
                info!("container {:?} not found, creating it", CONTAINER_NAME);
                catalog
                    .create_document(CreateDocument {
                        parent: None,
                        name: CONTAINER_NAME.to_string(),
                        type_tag: TypeTag::Folder,
                        properties: HashMap::new(),
                        body: Vec::new(),
                        strategy: UploadStrategy::SingleShot,
                    })
                    .await?
                    .id
            }
        };
        debug!("container id: {}", container);
        Ok(Self {
            catalog,
            container,
            progress: None,
        })
    }

    /// Attach a progress channel. Events are observability-only.
    #[must_use]
    pub fn with_progress(mut self, sender: ProgressSender) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container
    }

    /// Upload a payload as one or more chunk documents under the container.
    ///
    /// The head chunk (index 0) is created first and its id becomes the
    /// object id; the remaining chunks are created concurrently, each
    /// carrying an explicit `chunk` index property so reassembly never
    /// depends on listing order.
    pub async fn upload(
        &self,
        name: &str,
        data: &[u8],
        opts: &UploadOptions,
    ) -> Result<StoredObject> {
        let pieces: Vec<&[u8]> = chunk::split(data, opts.max_chunk_bytes)?.collect();
        let chunk_count = pieces.len();
        let codec = Codec::new(opts.compression);

        let mut base = HashMap::new();
        base.insert(PROP_SIZE.to_string(), data.len().to_string());
        base.insert(PROP_SHEETS.to_string(), chunk_count.to_string());
        base.insert(PROP_PATH.to_string(), opts.path.clone());
        base.insert(
            PROP_COMPRESSION.to_string(),
            opts.compression.as_property().to_string(),
        );
        base.insert(PROP_CHUNK_SIZE.to_string(), opts.max_chunk_bytes.to_string());
        base.insert(PROP_STARRED.to_string(), "false".to_string());

        debug!(
            "uploading {} ({} bytes) in {} chunk(s)",
            name,
            data.len(),
            chunk_count
        );

        let head_body = codec.encode(pieces[0])?.into_bytes();
        let head_len = head_body.len() as u64;
        let mut head_props = base.clone();
        head_props.insert(PROP_CHUNK.to_string(), "0".to_string());
        let head = self
            .catalog
            .create_document(CreateDocument {
                parent: Some(self.container.clone()),
                name: name.to_string(),
                type_tag: TypeTag::Sheet,
                properties: head_props,
                body: head_body,
                strategy: opts.strategy,
            })
            .await?;
        self.report_upload(name, head_len, opts.strategy);

        let mut requests = Vec::with_capacity(chunk_count.saturating_sub(1));
        for (index, piece) in pieces.iter().enumerate().skip(1) {
            let body = codec.encode(piece)?.into_bytes();
            let mut props = base.clone();
            props.insert(PROP_CHUNK.to_string(), index.to_string());
            props.insert(PROP_HEAD.to_string(), head.id.clone());
            requests.push(CreateDocument {
                parent: Some(self.container.clone()),
                name: name.to_string(),
                type_tag: TypeTag::Sheet,
                properties: props,
                body,
                strategy: opts.strategy,
            });
        }

        try_join_all(requests.into_iter().map(|request| {
            let body_len = request.body.len() as u64;
            async move {
                let meta = self.catalog.create_document(request).await?;
                self.report_upload(name, body_len, opts.strategy);
                Ok::<_, Error>(meta)
            }
        }))
        .await?;

        info!(
            "uploaded {} as {} ({} bytes, {} chunk(s))",
            name,
            head.id,
            data.len(),
            chunk_count
        );
        Ok(StoredObject::from_meta(&head))
    }

    /// Download an object by id or name and reassemble its bytes.
    pub async fn download(&self, token: &str) -> Result<Vec<u8>> {
        let head = self.resolve_object(token, true).await?;
        let compression = Compression::from_property(
            head.properties
                .get(PROP_COMPRESSION)
                .map(String::as_str)
                .unwrap_or("none"),
        )?;
        let codec = Codec::new(compression);
        let chunks = self.collect_chunks(&head).await?;
        let head_id = &head.id;

        let parts = try_join_all(chunks.iter().map(|meta| async move {
            let index = meta.chunk_index().ok_or_else(|| Error::IncompleteObject {
                id: head_id.clone(),
                detail: format!("chunk {} has no recorded index", meta.id),
            })?;
            let body = self
                .catalog
                .export_body(&meta.id)
                .await
                .map_err(|e| Error::IncompleteObject {
                    id: head_id.clone(),
                    detail: format!("chunk {} export failed: {}", meta.id, e),
                })?;
            progress::emit(
                self.progress.as_ref(),
                &meta.name,
                Direction::Download,
                body.len() as u64,
            );
            let text = String::from_utf8(body).map_err(|_| {
                Error::Codec(format!("chunk {} body is not valid text", meta.id))
            })?;
            Ok::<_, Error>((index, codec.decode(&text)?))
        }))
        .await?;

        let data = chunk::join(&head.id, parts)?;
        let expected = head.size();
        if data.len() as u64 != expected {
            return Err(Error::IncompleteObject {
                id: head.id.clone(),
                detail: format!("expected {} bytes, reassembled {}", expected, data.len()),
            });
        }
        debug!("downloaded {} ({} bytes)", head.id, data.len());
        Ok(data)
    }

    /// Download several objects concurrently. Failures are isolated per
    /// item; the batch always completes.
    pub async fn download_many(&self, tokens: &[&str]) -> Vec<(String, Result<Vec<u8>>)> {
        join_all(tokens.iter().map(|token| async move {
            let result = self.download(token).await;
            if let Err(e) = &result {
                warn!("download of {} failed: {}", token, e);
            }
            (token.to_string(), result)
        }))
        .await
    }

    /// Delete an object and every chunk belonging to it.
    ///
    /// Partial failure reports the surviving chunk ids and is not retried;
    /// chunks already absent count as removed.
    pub async fn delete(&self, token: &str) -> Result<()> {
        let head = self.resolve_object(token, true).await?;
        let mut ids = vec![head.id.clone()];
        let members = ListQuery::new(Some(self.container.clone()), vec![TypeTag::Sheet])
            .with_extra(Predicate::PropertyEquals(
                PROP_HEAD.to_string(),
                head.id.clone(),
            ));
        ids.extend(
            list_documents(&self.catalog, &members, None)
                .await?
                .into_iter()
                .map(|meta| meta.id),
        );

        let results = join_all(ids.into_iter().map(|id| async move {
            let result = self.catalog.delete_document(&id).await;
            (id, result)
        }))
        .await;

        let survivors: Vec<DocumentId> = results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(()) | Err(Error::NotFound(_)) => None,
                Err(e) => {
                    warn!("chunk {} survived delete: {}", id, e);
                    Some(id)
                }
            })
            .collect();

        if survivors.is_empty() {
            info!("deleted {}", head.id);
            Ok(())
        } else {
            Err(Error::PartialDelete {
                id: head.id,
                survivors,
            })
        }
    }

    /// Delete several objects concurrently, reporting per-item results.
    pub async fn delete_many(&self, tokens: &[&str]) -> Vec<(String, Result<()>)> {
        join_all(tokens.iter().map(|token| async move {
            let result = self.delete(token).await;
            if let Err(e) = &result {
                warn!("delete of {} failed: {}", token, e);
            }
            (token.to_string(), result)
        }))
        .await
    }

    /// Clone an object. A managed source whose chunk size and compression
    /// match `opts` is copied server-side, chunk by chunk, with no payload
    /// round-trip; anything else falls back to download + re-upload under
    /// the new policy.
    pub async fn clone_object(&self, token: &str, opts: &UploadOptions) -> Result<StoredObject> {
        let source = self.resolve_for_clone(token).await?;

        if source.type_tag == TypeTag::Sheet && source.sheet_count() > 0 {
            if self.clone_compatible(&source, opts) {
                return self.clone_server_side(&source).await;
            }
            let data = self.download(&source.id).await?;
            return self.upload(&source.name, &data, opts).await;
        }

        // Externally-created document: its body is the raw payload.
        let body = self.catalog.export_body(&source.id).await?;
        self.upload(&source.name, &body, opts).await
    }

    /// List every managed object in the container, one entry per head chunk.
    pub async fn list_uploads(&self) -> Result<Vec<StoredObject>> {
        let query = ListQuery::new(Some(self.container.clone()), vec![TypeTag::Sheet]);
        let documents = list_documents(&self.catalog, &query, None).await?;
        Ok(documents
            .into_iter()
            .filter(|meta| meta.head().is_none() && meta.chunk_index() == Some(0))
            .map(|meta| StoredObject::from_meta(&meta))
            .collect())
    }

    /// Map a human-supplied name to an object id by substring match within
    /// the container. Ties go to the most recently modified candidate.
    pub async fn get_id_of_name(
        &self,
        name: &str,
        require_sheet: bool,
    ) -> Result<Option<DocumentId>> {
        let tag = if require_sheet {
            TypeTag::Sheet
        } else {
            TypeTag::Document
        };
        let query = ListQuery::new(Some(self.container.clone()), vec![tag])
            .with_extra(Predicate::NameContains(name.to_string()));
        let mut candidates = list_documents(&self.catalog, &query, None).await?;
        // Member chunks share the object's name; only heads represent it.
        candidates.retain(|meta| meta.head().is_none());
        Ok(resolve::pick_latest(candidates).map(|meta| meta.id))
    }

    /// Resolve a token to the head chunk's metadata. Tokens shaped like
    /// ids are used verbatim; member-chunk ids are followed to their head.
    async fn resolve_object(&self, token: &str, require_sheet: bool) -> Result<DocumentMeta> {
        let id = if resolve::looks_like_id(token) {
            token.to_string()
        } else {
            self.get_id_of_name(token, require_sheet)
                .await?
                .ok_or_else(|| Error::ObjectNotFound(token.to_string()))?
        };
        let meta = self.get_or_not_found(&id, token).await?;
        match meta.head().map(str::to_string) {
            Some(head_id) => self.get_or_not_found(&head_id, token).await,
            None => Ok(meta),
        }
    }

    /// Clone accepts both managed objects and external documents, so a
    /// name token is looked up under both type tags.
    async fn resolve_for_clone(&self, token: &str) -> Result<DocumentMeta> {
        if resolve::looks_like_id(token) {
            let meta = self.get_or_not_found(token, token).await?;
            return match meta.head().map(str::to_string) {
                Some(head_id) => self.get_or_not_found(&head_id, token).await,
                None => Ok(meta),
            };
        }
        if let Some(id) = self.get_id_of_name(token, true).await? {
            return self.get_or_not_found(&id, token).await;
        }
        if let Some(id) = self.get_id_of_name(token, false).await? {
            return self.get_or_not_found(&id, token).await;
        }
        Err(Error::ObjectNotFound(token.to_string()))
    }

    async fn get_or_not_found(&self, id: &str, token: &str) -> Result<DocumentMeta> {
        self.catalog.get_document(id).await.map_err(|e| match e {
            Error::NotFound(_) => Error::ObjectNotFound(token.to_string()),
            other => other,
        })
    }

    /// Gather the head plus every member chunk, verifying the count against
    /// the recorded `sheets` property.
    async fn collect_chunks(&self, head: &DocumentMeta) -> Result<Vec<DocumentMeta>> {
        let expected = head.sheet_count().max(1) as usize;
        let mut chunks = vec![head.clone()];
        if expected > 1 {
            let query = ListQuery::new(Some(self.container.clone()), vec![TypeTag::Sheet])
                .with_extra(Predicate::PropertyEquals(
                    PROP_HEAD.to_string(),
                    head.id.clone(),
                ));
            chunks.extend(list_documents(&self.catalog, &query, None).await?);
        }
        if chunks.len() != expected {
            return Err(Error::IncompleteObject {
                id: head.id.clone(),
                detail: format!("expected {} chunk(s), found {}", expected, chunks.len()),
            });
        }
        Ok(chunks)
    }

    fn clone_compatible(&self, head: &DocumentMeta, opts: &UploadOptions) -> bool {
        let same_chunk_size = head
            .properties
            .get(PROP_CHUNK_SIZE)
            .and_then(|v| v.parse::<u64>().ok())
            == Some(opts.max_chunk_bytes);
        let same_compression = head
            .properties
            .get(PROP_COMPRESSION)
            .is_some_and(|v| v == opts.compression.as_property());
        same_chunk_size && same_compression
    }

    async fn clone_server_side(&self, head: &DocumentMeta) -> Result<StoredObject> {
        let chunks = self.collect_chunks(head).await?;

        let new_head = self
            .catalog
            .clone_document(
                &head.id,
                CloneDocument {
                    parent: Some(self.container.clone()),
                    name: head.name.clone(),
                    properties: head.properties.clone(),
                },
            )
            .await?;

        try_join_all(chunks.iter().filter(|meta| meta.id != head.id).map(|meta| {
            let mut properties = meta.properties.clone();
            properties.insert(PROP_HEAD.to_string(), new_head.id.clone());
            self.catalog.clone_document(
                &meta.id,
                CloneDocument {
                    parent: Some(self.container.clone()),
                    name: meta.name.clone(),
                    properties,
                },
            )
        }))
        .await?;

        info!(
            "cloned {} to {} server-side ({} chunk(s))",
            head.id,
            new_head.id,
            chunks.len()
        );
        Ok(StoredObject::from_meta(&new_head))
    }

    /// Upload progress deltas: one event per request under single-shot,
    /// one per part under multipart.
    fn report_upload(&self, object: &str, bytes: u64, strategy: UploadStrategy) {
        let Some(sender) = self.progress.as_ref() else {
            return;
        };
        match strategy {
            UploadStrategy::SingleShot => {
                progress::emit(Some(sender), object, Direction::Upload, bytes);
            }
            UploadStrategy::Multipart => {
                let mut remaining = bytes;
                loop {
                    let part = remaining.min(MULTIPART_PART_BYTES);
                    progress::emit(Some(sender), object, Direction::Upload, part);
                    remaining -= part;
                    if remaining == 0 {
                        break;
                    }
                }
            }
        }
    }
}
