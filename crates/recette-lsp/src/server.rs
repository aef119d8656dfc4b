use std::sync::Arc;

use recette_core::{Document, RecetteResult, Vocabulary};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::store::{DocumentStore, Snapshot};

pub struct RecetteLanguageServer {
    client: Client,
    store: DocumentStore,
    vocabulary: RwLock<Arc<Vocabulary>>,
}

impl RecetteLanguageServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            store: DocumentStore::default(),
            vocabulary: RwLock::new(Arc::new(Vocabulary::default())),
        }
    }

    /// Analyse a new version and store it. Returns the snapshot when nothing
    /// later was stored first.
    async fn update(&self, uri: Url, ticket: u64, version: i32, text: String) -> Option<Arc<Snapshot>> {
        let vocabulary = Arc::clone(&*self.vocabulary.read().await);
        let snapshot = Arc::new(Snapshot::build(Document::new(uri.as_str(), version, text), vocabulary));
        tracing::debug!(
            %uri,
            version,
            grammar = ?snapshot.grammar,
            diagnostics = snapshot.diagnostics.len(),
            "analysed document"
        );
        if !self.store.update(uri.clone(), ticket, Arc::clone(&snapshot)).await {
            tracing::debug!(%uri, version, "dropping stale version");
            return None;
        }
        Some(snapshot)
    }

    /// Analyse, store and publish diagnostics.
    async fn refresh(&self, uri: Url, ticket: u64, version: i32, text: String) {
        let Some(snapshot) = self.update(uri.clone(), ticket, version, text).await else {
            return;
        };
        let publish = || {
            self.client
                .publish_diagnostics(uri.clone(), snapshot.lsp_diagnostics(), Some(snapshot.version()))
        };
        if !self.store.publish_if_latest(&uri, ticket, publish).await {
            tracing::debug!(%uri, version, "superseded before publishing");
        }
    }
}

/// Read `vocabulary` from the initialization options, if present.
fn vocabulary_from_options(options: Option<&serde_json::Value>) -> RecetteResult<Option<Vocabulary>> {
    let Some(value) = options.and_then(|o| o.get("vocabulary")) else {
        return Ok(None);
    };
    let vocabulary: Vocabulary = serde_json::from_value(value.clone())?;
    vocabulary.validate().map(Some)
}

fn capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![" ".into()]),
            ..Default::default()
        }),
        rename_provider: Some(OneOf::Right(RenameOptions {
            prepare_provider: Some(true),
            work_done_progress_options: Default::default(),
        })),
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for RecetteLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        match vocabulary_from_options(params.initialization_options.as_ref()) {
            Ok(Some(vocabulary)) => {
                tracing::info!(verbs = vocabulary.verbs.len(), "using client vocabulary");
                *self.vocabulary.write().await = Arc::new(vocabulary);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("ignoring vocabulary option: {e}"),
        }

        Ok(InitializeResult {
            capabilities: capabilities(),
            server_info: Some(ServerInfo {
                name: "recette-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("initialized");
        self.client
            .log_message(MessageType::INFO, "Recette LSP initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let ticket = self.store.ticket();
        let document = params.text_document;
        self.refresh(document.uri, ticket, document.version, document.text).await;
        let open = self.store.count().await;
        tracing::debug!(open, "document opened");
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let ticket = self.store.ticket();
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        if let Some(change) = params.content_changes.into_iter().last() {
            self.refresh(uri, ticket, version, change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let ticket = self.store.ticket();
        let uri = params.text_document.uri;
        if !self.store.close(&uri, ticket).await {
            return;
        }
        let clear = || self.client.publish_diagnostics(uri.clone(), Vec::new(), None);
        self.store.publish_if_latest(&uri, ticket, clear).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        tracing::debug!(uri = %position.text_document.uri, ?position.position, "completion");

        let Some(snapshot) = self.store.get(&position.text_document.uri).await else {
            return Ok(None);
        };
        Ok(snapshot.completion(position.position).map(|items| {
            CompletionResponse::List(CompletionList {
                is_incomplete: false,
                items,
            })
        }))
    }

    async fn prepare_rename(&self, params: TextDocumentPositionParams) -> Result<Option<PrepareRenameResponse>> {
        tracing::debug!(uri = %params.text_document.uri, ?params.position, "prepare rename");

        let Some(snapshot) = self.store.get(&params.text_document.uri).await else {
            return Ok(None);
        };
        Ok(snapshot.prepare_rename(params.position))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let position = params.text_document_position;
        tracing::debug!(uri = %position.text_document.uri, new_name = %params.new_name, "rename");

        let Some(snapshot) = self.store.get(&position.text_document.uri).await else {
            return Ok(None);
        };
        snapshot
            .rename(&position.text_document.uri, position.position, &params.new_name)
            .map_err(|e| Error::invalid_params(e.to_string()))
    }
}
