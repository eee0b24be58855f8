// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory catalog for testing and offline use
//!
//! Implements [`RemoteCatalog`] over a HashMap with honest pagination and
//! injectable per-document faults, so partial-failure paths can be
//! exercised without a network.

use crate::catalog::{
    CloneDocument, CreateDocument, DocumentId, DocumentMeta, ListQuery, Page, RemoteCatalog,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredDocument {
    meta: DocumentMeta,
    body: Vec<u8>,
}

#[derive(Debug, Default)]
struct State {
    documents: HashMap<DocumentId, StoredDocument>,
    next_id: u64,
    // Monotonic tick so modified timestamps order creations even within
    // one clock granule.
    ticks: i64,
    fail_delete: HashSet<DocumentId>,
    fail_export: HashSet<DocumentId>,
}

/// In-memory implementation of [`RemoteCatalog`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<State>>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delete of `id` fail with a transport error.
    pub async fn inject_delete_fault(&self, id: &str) {
        self.state.lock().await.fail_delete.insert(id.to_string());
    }

    /// Make every export of `id` fail with a transport error.
    pub async fn inject_export_fault(&self, id: &str) {
        self.state.lock().await.fail_export.insert(id.to_string());
    }

    /// Whether a document with this id currently exists.
    pub async fn contains(&self, id: &str) -> bool {
        self.state.lock().await.documents.contains_key(id)
    }

    /// Total number of stored documents, across all types.
    pub async fn document_count(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    fn fault(op: &'static str, id: &str) -> Error {
        Error::transport(
            op,
            id,
            std::io::Error::other("injected transport fault"),
        )
    }
}

impl State {
    fn mint_id(&mut self) -> DocumentId {
        self.next_id += 1;
        format!("doc_{:08x}", self.next_id)
    }

    fn tick(&mut self) -> i64 {
        self.ticks += 1;
        self.ticks
    }
}

#[async_trait]
impl RemoteCatalog for MemoryCatalog {
    async fn create_document(&self, request: CreateDocument) -> Result<DocumentMeta> {
        let mut state = self.state.lock().await;
        if let Some(parent) = &request.parent {
            if !state.documents.contains_key(parent) {
                return Err(Error::NotFound(parent.clone()));
            }
        }
        let id = state.mint_id();
        let modified = Utc::now() + TimeDelta::milliseconds(state.tick());
        let meta = DocumentMeta {
            id: id.clone(),
            name: request.name,
            type_tag: request.type_tag,
            parent: request.parent,
            properties: request.properties,
            owners: vec!["memory".to_string()],
            modified,
        };
        state.documents.insert(
            id,
            StoredDocument {
                meta: meta.clone(),
                body: request.body,
            },
        );
        Ok(meta)
    }

    async fn get_document(&self, id: &str) -> Result<DocumentMeta> {
        let state = self.state.lock().await;
        state
            .documents
            .get(id)
            .map(|doc| doc.meta.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn export_body(&self, id: &str) -> Result<Vec<u8>> {
        let state = self.state.lock().await;
        if state.fail_export.contains(id) {
            return Err(Self::fault("export_body", id));
        }
        state
            .documents
            .get(id)
            .map(|doc| doc.body.clone())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn list_page(&self, query: &ListQuery, page_token: Option<String>) -> Result<Page> {
        let state = self.state.lock().await;
        let mut matching: Vec<&StoredDocument> = state
            .documents
            .values()
            .filter(|doc| query.matches(&doc.meta))
            .collect();
        // Server order: newest first, id as tie-break, stable across calls.
        matching.sort_by(|a, b| {
            (&b.meta.modified, &b.meta.id).cmp(&(&a.meta.modified, &a.meta.id))
        });

        let start = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|e| Error::transport("list_page", token.as_str(), e))?,
        };
        let end = (start + query.page_size).min(matching.len());
        let documents = matching[start.min(end)..end]
            .iter()
            .map(|doc| doc.meta.clone())
            .collect();
        let next_token = (end < matching.len()).then(|| end.to_string());
        Ok(Page {
            documents,
            next_token,
        })
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_delete.contains(id) {
            return Err(Self::fault("delete_document", id));
        }
        state
            .documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn clone_document(&self, id: &str, request: CloneDocument) -> Result<DocumentMeta> {
        let mut state = self.state.lock().await;
        let source = state
            .documents
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if let Some(parent) = &request.parent {
            if !state.documents.contains_key(parent) {
                return Err(Error::NotFound(parent.clone()));
            }
        }
        let new_id = state.mint_id();
        let modified = Utc::now() + TimeDelta::milliseconds(state.tick());
        let meta = DocumentMeta {
            id: new_id.clone(),
            name: request.name,
            type_tag: source.meta.type_tag,
            parent: request.parent,
            properties: request.properties,
            owners: source.meta.owners.clone(),
            modified,
        };
        state.documents.insert(
            new_id,
            StoredDocument {
                meta: meta.clone(),
                body: source.body,
            },
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Predicate, TypeTag, UploadStrategy, list_documents};

    fn create(name: &str, tag: TypeTag, parent: Option<String>) -> CreateDocument {
        CreateDocument {
            parent,
            name: name.to_string(),
            type_tag: tag,
            properties: HashMap::new(),
            body: name.as_bytes().to_vec(),
            strategy: UploadStrategy::SingleShot,
        }
    }

    #[tokio::test]
    async fn test_create_get_export_delete() {
        let catalog = MemoryCatalog::new();
        let meta = catalog
            .create_document(create("a.bin", TypeTag::Sheet, None))
            .await
            .unwrap();

        assert_eq!(catalog.get_document(&meta.id).await.unwrap().name, "a.bin");
        assert_eq!(catalog.export_body(&meta.id).await.unwrap(), b"a.bin");

        catalog.delete_document(&meta.id).await.unwrap();
        assert!(matches!(
            catalog.get_document(&meta.id).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_document(&meta.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_under_missing_parent_fails() {
        let catalog = MemoryCatalog::new();
        let result = catalog
            .create_document(create("x", TypeTag::Sheet, Some("doc_nope".to_string())))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_pagination_walks_all_pages() {
        let catalog = MemoryCatalog::new();
        for i in 0..17 {
            catalog
                .create_document(create(&format!("file-{i:02}"), TypeTag::Sheet, None))
                .await
                .unwrap();
        }

        let query = ListQuery::new(None, vec![TypeTag::Sheet]).with_page_size(5);
        let all = list_documents(&catalog, &query, None).await.unwrap();
        assert_eq!(all.len(), 17);

        // Newest first, per server order.
        assert_eq!(all[0].name, "file-16");
        assert_eq!(all[16].name, "file-00");

        let capped = list_documents(&catalog, &query, Some(7)).await.unwrap();
        assert_eq!(capped.len(), 7);
    }

    #[tokio::test]
    async fn test_query_combines_tags_and_predicate() {
        let catalog = MemoryCatalog::new();
        let folder = catalog
            .create_document(create("root", TypeTag::Folder, None))
            .await
            .unwrap();
        catalog
            .create_document(create("alpha.bin", TypeTag::Sheet, Some(folder.id.clone())))
            .await
            .unwrap();
        catalog
            .create_document(create("alpha.bin", TypeTag::Document, Some(folder.id.clone())))
            .await
            .unwrap();
        catalog
            .create_document(create("beta.bin", TypeTag::Sheet, Some(folder.id.clone())))
            .await
            .unwrap();

        let by_name = ListQuery::new(Some(folder.id.clone()), vec![TypeTag::Sheet])
            .with_extra(Predicate::NameContains("alpha".to_string()));
        assert_eq!(list_documents(&catalog, &by_name, None).await.unwrap().len(), 1);

        // OR across tags.
        let both_tags = ListQuery::new(
            Some(folder.id.clone()),
            vec![TypeTag::Sheet, TypeTag::Document],
        )
        .with_extra(Predicate::NameEquals("alpha.bin".to_string()));
        assert_eq!(list_documents(&catalog, &both_tags, None).await.unwrap().len(), 2);

        // Empty tag set matches any type.
        let any_type = ListQuery::new(Some(folder.id), vec![]);
        assert_eq!(list_documents(&catalog, &any_type, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let catalog = MemoryCatalog::new();
        let meta = catalog
            .create_document(create("f.bin", TypeTag::Sheet, None))
            .await
            .unwrap();

        catalog.inject_export_fault(&meta.id).await;
        assert!(matches!(
            catalog.export_body(&meta.id).await,
            Err(Error::Transport { op: "export_body", .. })
        ));

        catalog.inject_delete_fault(&meta.id).await;
        assert!(matches!(
            catalog.delete_document(&meta.id).await,
            Err(Error::Transport { op: "delete_document", .. })
        ));
        assert!(catalog.contains(&meta.id).await);
    }

    #[tokio::test]
    async fn test_clone_copies_body_server_side() {
        let catalog = MemoryCatalog::new();
        let source = catalog
            .create_document(create("orig.bin", TypeTag::Sheet, None))
            .await
            .unwrap();

        let copy = catalog
            .clone_document(
                &source.id,
                CloneDocument {
                    parent: None,
                    name: "copy.bin".to_string(),
                    properties: HashMap::new(),
                },
            )
            .await
            .unwrap();

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.type_tag, source.type_tag);
        assert_eq!(
            catalog.export_body(&copy.id).await.unwrap(),
            catalog.export_body(&source.id).await.unwrap()
        );
    }
}
