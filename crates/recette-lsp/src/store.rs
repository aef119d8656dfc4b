use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use recette_core::{Document, Vocabulary};
use recette_dsl::query::{self, RenameError};
use recette_dsl::{Analysis, Diagnostic, Grammar};
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{self, PrepareRenameResponse, Url, WorkspaceEdit};

use crate::convert;

/// One analysed version of a document. Never mutated once built.
#[derive(Debug)]
pub struct Snapshot {
    pub document: Document,
    pub grammar: Grammar,
    pub vocabulary: Arc<Vocabulary>,
    /// `None` for assembler sources, which only get diagnostics.
    pub analysis: Option<Analysis>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    pub fn build(document: Document, vocabulary: Arc<Vocabulary>) -> Self {
        let grammar = Grammar::from_extension(document.extension().as_deref());
        let (analysis, diagnostics) = match grammar {
            Grammar::Recette => {
                let analysis = recette_dsl::analyze(&document.text, &vocabulary);
                let diagnostics = analysis.diagnostics.clone();
                (Some(analysis), diagnostics)
            }
            Grammar::Asm => (None, recette_dsl::assemble(&document.text).diagnostics),
        };
        Self {
            document,
            grammar,
            vocabulary,
            analysis,
            diagnostics,
        }
    }

    pub fn version(&self) -> i32 {
        self.document.version
    }

    pub fn lsp_diagnostics(&self) -> Vec<lsp_types::Diagnostic> {
        self.diagnostics.iter().map(convert::to_diagnostic).collect()
    }

    fn position(&self, position: lsp_types::Position) -> recette_core::Position {
        convert::from_position(&self.document.line_index(), position)
    }

    pub fn completion(&self, position: lsp_types::Position) -> Option<Vec<lsp_types::CompletionItem>> {
        let analysis = self.analysis.as_ref()?;
        let items = query::complete(analysis, &self.vocabulary, self.position(position));
        Some(items.iter().map(convert::to_completion_item).collect())
    }

    pub fn prepare_rename(&self, position: lsp_types::Position) -> Option<PrepareRenameResponse> {
        let analysis = self.analysis.as_ref()?;
        let span = query::prepare_rename(analysis, &self.vocabulary, self.position(position))?;
        Some(PrepareRenameResponse::RangeWithPlaceholder {
            range: convert::to_range(span),
            placeholder: convert::slice(&self.document.text, span),
        })
    }

    pub fn rename(
        &self,
        uri: &Url,
        position: lsp_types::Position,
        new_name: &str,
    ) -> Result<Option<WorkspaceEdit>, RenameError> {
        let Some(analysis) = self.analysis.as_ref() else {
            return Ok(None);
        };
        let edits = query::rename(analysis, self.position(position), new_name)?;
        let edits = edits.iter().map(convert::to_text_edit).collect();
        Ok(Some(WorkspaceEdit {
            changes: Some(HashMap::from([(uri.clone(), edits)])),
            ..Default::default()
        }))
    }
}

#[derive(Debug)]
enum Entry {
    Open(Arc<Snapshot>),
    Closed,
}

/// What was last applied to a document, and under which ticket.
#[derive(Debug)]
struct Slot {
    ticket: u64,
    entry: Entry,
}

/// The latest snapshot of every open document.
///
/// Every open, change and close takes a ticket from [`DocumentStore::ticket`]
/// before its first await, so tickets follow arrival order. A write carrying
/// an older ticket than the one already applied is dropped, and a closed
/// document keeps its ticket so a late update cannot reopen it.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<Url, Slot>>,
    next_ticket: AtomicU64,
}

impl DocumentStore {
    pub fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::Relaxed)
    }

    /// Store `snapshot` unless something later was already applied. Returns
    /// whether it was stored.
    pub async fn update(&self, uri: Url, ticket: u64, snapshot: Arc<Snapshot>) -> bool {
        let mut documents = self.documents.write().await;
        let stale = documents.get(&uri).is_some_and(|slot| {
            slot.ticket > ticket
                || matches!(&slot.entry, Entry::Open(current) if !snapshot.document.supersedes(&current.document))
        });
        if stale {
            return false;
        }
        documents.insert(
            uri,
            Slot {
                ticket,
                entry: Entry::Open(snapshot),
            },
        );
        true
    }

    /// Forget the document unless a later write was already applied.
    pub async fn close(&self, uri: &Url, ticket: u64) -> bool {
        let mut documents = self.documents.write().await;
        if documents.get(uri).is_some_and(|slot| slot.ticket > ticket) {
            return false;
        }
        documents.insert(
            uri.clone(),
            Slot {
                ticket,
                entry: Entry::Closed,
            },
        );
        true
    }

    /// Run `publish` if the write made under `ticket` is still the latest one
    /// for `uri`. Writes wait until `publish` completes, so publications go
    /// out in store order.
    pub async fn publish_if_latest<F, Fut>(&self, uri: &Url, ticket: u64, publish: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let documents = self.documents.read().await;
        if documents.get(uri).is_none_or(|slot| slot.ticket != ticket) {
            return false;
        }
        publish().await;
        true
    }

    pub async fn get(&self, uri: &Url) -> Option<Arc<Snapshot>> {
        match &self.documents.read().await.get(uri)?.entry {
            Entry::Open(snapshot) => Some(Arc::clone(snapshot)),
            Entry::Closed => None,
        }
    }

    /// Number of open documents.
    pub async fn count(&self) -> usize {
        self.documents
            .read()
            .await
            .values()
            .filter(|slot| matches!(slot.entry, Entry::Open(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(uri: &Url, version: i32, text: &str) -> Arc<Snapshot> {
        let document = Document::new(uri.as_str(), version, text);
        Arc::new(Snapshot::build(document, Arc::new(Vocabulary::default())))
    }

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///tmp/{name}")).unwrap()
    }

    async fn store_version(store: &DocumentStore, uri: &Url, version: i32, text: &str) -> bool {
        let ticket = store.ticket();
        store.update(uri.clone(), ticket, snapshot(uri, version, text)).await
    }

    #[tokio::test]
    async fn newer_versions_replace_older_ones() {
        let store = DocumentStore::default();
        let uri = uri("tarte.rct");
        assert!(store_version(&store, &uri, 1, "# a").await);
        assert!(store_version(&store, &uri, 3, "# c").await);
        assert!(!store_version(&store, &uri, 2, "# b").await);
        let current = store.get(&uri).await.unwrap();
        assert_eq!(current.version(), 3);
        assert_eq!(current.document.text, "# c");
    }

    #[tokio::test]
    async fn concurrent_updates_keep_the_highest_version() {
        let store = Arc::new(DocumentStore::default());
        let uri = uri("gateau.rct");
        let mut handles = Vec::new();
        for version in 0..16 {
            let store = Arc::clone(&store);
            let uri = uri.clone();
            let ticket = store.ticket();
            handles.push(tokio::spawn(async move {
                let text = format!("# version {version}\n");
                store.update(uri.clone(), ticket, snapshot(&uri, version, &text)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get(&uri).await.unwrap().version(), 15);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn late_update_loses_to_an_earlier_ticket_already_applied() {
        let store = DocumentStore::default();
        let uri = uri("tarte.rct");
        let first = store.ticket();
        let second = store.ticket();
        assert!(store.update(uri.clone(), second, snapshot(&uri, 2, "# b")).await);
        assert!(!store.update(uri.clone(), first, snapshot(&uri, 2, "# a")).await);
        assert_eq!(store.get(&uri).await.unwrap().document.text, "# b");
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot_after_replacement() {
        let store = DocumentStore::default();
        let uri = uri("tarte.rct");
        store_version(&store, &uri, 1, "## orphan\n").await;
        let held = store.get(&uri).await.unwrap();
        store_version(&store, &uri, 2, "# fine\n").await;
        assert_eq!(held.diagnostics.len(), 1);
        assert!(store.get(&uri).await.unwrap().diagnostics.is_empty());
    }

    #[tokio::test]
    async fn close_forgets_the_document() {
        let store = DocumentStore::default();
        let uri = uri("tarte.rct");
        store_version(&store, &uri, 1, "# a").await;
        let ticket = store.ticket();
        assert!(store.close(&uri, ticket).await);
        assert!(store.get(&uri).await.is_none());
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn update_in_flight_during_close_does_not_reopen() {
        let store = DocumentStore::default();
        let uri = uri("tarte.rct");
        let open = store.ticket();
        let close = store.ticket();
        assert!(store.close(&uri, close).await);
        assert!(!store.update(uri.clone(), open, snapshot(&uri, 1, "# a")).await);
        assert!(store.get(&uri).await.is_none());

        // A real reopen comes later and wins.
        assert!(store_version(&store, &uri, 1, "# a").await);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn only_the_latest_write_publishes() {
        let store = DocumentStore::default();
        let uri = uri("tarte.rct");
        let first = store.ticket();
        assert!(store.update(uri.clone(), first, snapshot(&uri, 1, "# a")).await);
        let second = store.ticket();
        assert!(store.update(uri.clone(), second, snapshot(&uri, 2, "# b")).await);

        let published = std::sync::Mutex::new(Vec::new());
        let log = &published;
        assert!(store.publish_if_latest(&uri, second, move || async move { log.lock().unwrap().push(2) }).await);
        assert!(!store.publish_if_latest(&uri, first, move || async move { log.lock().unwrap().push(1) }).await);
        assert_eq!(*published.lock().unwrap(), vec![2]);

        let close = store.ticket();
        store.close(&uri, close).await;
        assert!(!store.publish_if_latest(&uri, second, move || async move { log.lock().unwrap().push(2) }).await);
        assert!(store.publish_if_latest(&uri, close, move || async move { log.lock().unwrap().push(0) }).await);
        assert_eq!(*published.lock().unwrap(), vec![2, 0]);
    }

    #[test]
    fn assembler_documents_only_get_diagnostics() {
        let uri = uri("gtlem.mac");
        let snapshot = snapshot(&uri, 1, "START: MOV #1, R0\nADD ,\n");
        assert_eq!(snapshot.grammar, Grammar::Asm);
        assert!(snapshot.analysis.is_none());
        assert_eq!(snapshot.lsp_diagnostics().len(), 1);
        assert!(snapshot.completion(lsp_types::Position::new(0, 0)).is_none());
    }

    #[test]
    fn prepare_rename_gives_range_and_placeholder() {
        let uri = uri("tarte.rct");
        let snapshot = snapshot(&uri, 1, "# t\n## ingrédients\nlait\n## étapes\nverser lait\n");
        match snapshot.prepare_rename(lsp_types::Position::new(4, 9)) {
            Some(PrepareRenameResponse::RangeWithPlaceholder { range, placeholder }) => {
                assert_eq!(placeholder, "lait");
                assert_eq!(range.start, lsp_types::Position::new(4, 7));
                assert_eq!(range.end, lsp_types::Position::new(4, 11));
            }
            other => panic!("expected a range with placeholder, got {other:?}"),
        }
        assert!(snapshot.prepare_rename(lsp_types::Position::new(4, 1)).is_none());
    }

    #[test]
    fn rename_builds_a_workspace_edit() {
        let uri = uri("tarte.rct");
        let snapshot = snapshot(&uri, 1, "# t\n## ingrédients\nlait\n## étapes\nverser lait\n");
        let edit = snapshot
            .rename(&uri, lsp_types::Position::new(2, 1), "crème")
            .unwrap()
            .unwrap();
        let changes = edit.changes.unwrap();
        assert_eq!(changes[&uri].len(), 2);
        assert!(changes[&uri].iter().all(|e| e.new_text == "crème"));
        assert!(snapshot.rename(&uri, lsp_types::Position::new(2, 1), "  ").is_err());
    }
}
