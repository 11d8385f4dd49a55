use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use parking_lot::RwLock as SyncRwLock;
use serde_json::Value;
use tokio::sync::RwLock;

use tower_lsp::{Client, LanguageServer, jsonrpc};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionOptions, CompletionParams,
    CompletionResponse, ConfigurationItem, Diagnostic,
    DidChangeConfigurationParams, DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams, DidChangeWorkspaceFoldersParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, Documentation, Hover, HoverContents,
    HoverParams, HoverProviderCapability, InitializedParams, InitializeParams,
    InitializeResult, MarkupContent, MarkupKind, OneOf, Registration,
    ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
    WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};

use tracing::{debug, error, info, warn};

use crate::diagnostics::{self, ValidationSettings};
use crate::document::LspDocument;
use crate::lexicon::LEXICON;
use crate::symbols::{self, CompletionKind};

/// Configuration section the server reads from the client.
pub const CONFIGURATION_SECTION: &str = "danaLanguageServer";

/// Maps a lexicon completion kind onto the LSP item kind.
pub fn completion_item_kind(kind: CompletionKind) -> CompletionItemKind {
    match kind {
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Type => CompletionItemKind::TYPE_PARAMETER,
        CompletionKind::Operator => CompletionItemKind::OPERATOR,
        CompletionKind::Boolean => CompletionItemKind::CONSTANT,
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Text => CompletionItemKind::TEXT,
    }
}

/// Parses a configuration value from the client. `null` and malformed
/// payloads fall back to the defaults.
fn settings_from_value(value: Value) -> ValidationSettings {
    if value.is_null() {
        return ValidationSettings::default();
    }
    match serde_json::from_value(value) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Malformed {} configuration ({}), using defaults", CONFIGURATION_SECTION, e);
            ValidationSettings::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct DanaBackend {
    client: Client,
    documents_by_uri: Arc<RwLock<HashMap<Url, Arc<LspDocument>>>>,
    serial_document_id: Arc<AtomicU32>,
    client_process_id: Arc<Mutex<Option<u32>>>,
    has_configuration_capability: Arc<AtomicBool>,
    has_workspace_folder_capability: Arc<AtomicBool>,
    global_settings: Arc<SyncRwLock<ValidationSettings>>,
    document_settings: Arc<DashMap<Url, ValidationSettings>>,
}

impl DanaBackend {
    pub fn new(client: Client, client_process_id: Option<u32>) -> Self {
        DanaBackend {
            client,
            documents_by_uri: Arc::new(RwLock::new(HashMap::new())),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            client_process_id: Arc::new(Mutex::new(client_process_id)),
            has_configuration_capability: Arc::new(AtomicBool::new(false)),
            has_workspace_folder_capability: Arc::new(AtomicBool::new(false)),
            global_settings: Arc::new(SyncRwLock::new(ValidationSettings::default())),
            document_settings: Arc::new(DashMap::new()),
        }
    }

    fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Resolves the settings that apply to `uri`. Without client-side
    /// configuration support this is the global snapshot; otherwise the
    /// per-document cache, falling back to a `workspace/configuration`
    /// round-trip whose result is cached until the client reports a change.
    async fn settings_for(&self, uri: &Url) -> Result<ValidationSettings, String> {
        if !self.has_configuration_capability.load(Ordering::SeqCst) {
            return Ok(*self.global_settings.read());
        }
        if let Some(settings) = self.document_settings.get(uri) {
            return Ok(*settings);
        }
        let items = vec![ConfigurationItem {
            scope_uri: Some(uri.clone()),
            section: Some(CONFIGURATION_SECTION.to_string()),
        }];
        let mut values = self
            .client
            .configuration(items)
            .await
            .map_err(|e| format!("workspace/configuration request failed: {}", e))?;
        let value = if values.is_empty() {
            Value::Null
        } else {
            values.remove(0)
        };
        let settings = settings_from_value(value);
        self.document_settings.insert(uri.clone(), settings);
        Ok(settings)
    }

    async fn validate(
        &self,
        document: Arc<LspDocument>,
        text: &str,
        version: i32,
    ) -> Result<Vec<Diagnostic>, String> {
        let (uri, current_version) = {
            let state = document.state.read().await;
            (state.uri.clone(), state.version)
        };
        if current_version != version {
            debug!(
                "Skipping validation for outdated version {} (current: {})",
                version, current_version
            );
            return Ok(Vec::new());
        }

        let settings = self
            .settings_for(&uri)
            .await
            .map_err(|e| format!("failed to load settings for URI={}: {}", uri, e))?;
        let diagnostics = diagnostics::validate(text, &settings, &LEXICON);
        info!(
            "Validated URI={} (version={}): {} diagnostic(s)",
            uri,
            version,
            diagnostics.len()
        );
        Ok(diagnostics)
    }

    /// Validates `text` and publishes the result, or an empty set when the
    /// settings could not be loaded. Publishes are dropped when the document
    /// has moved past `version` in the meantime.
    async fn validate_and_publish(&self, document: Arc<LspDocument>, text: &str, version: i32) {
        let uri = document.uri().await;
        match self.validate(Arc::clone(&document), text, version).await {
            Ok(diagnostics) => {
                if document.version().await == version {
                    self.client
                        .publish_diagnostics(uri, diagnostics, Some(version))
                        .await;
                }
            }
            Err(e) => {
                error!("Validation failed for URI={}: {}", uri, e);
                if document.version().await == version {
                    self.client
                        .publish_diagnostics(uri, Vec::new(), Some(version))
                        .await;
                }
            }
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for DanaBackend {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize: {:?}", params);

        // Update client process ID if provided
        if let Some(client_pid) = params.process_id {
            let mut locked_pid = self.client_process_id.lock().unwrap();
            if let Some(cmdline_pid) = *locked_pid {
                if cmdline_pid != client_pid {
                    warn!(
                        "Client process ID from command line ({}) differs from LSP initialize process ID ({})",
                        cmdline_pid, client_pid
                    );
                }
            }
            *locked_pid = Some(client_pid);
        }

        let workspace = params.capabilities.workspace.as_ref();
        let has_configuration = workspace
            .and_then(|w| w.configuration)
            .unwrap_or(false);
        let has_workspace_folders = workspace
            .and_then(|w| w.workspace_folders)
            .unwrap_or(false);
        self.has_configuration_capability
            .store(has_configuration, Ordering::SeqCst);
        self.has_workspace_folder_capability
            .store(has_workspace_folders, Ordering::SeqCst);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(true),
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        ":".to_string(),
                        "(".to_string(),
                    ]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                workspace: has_workspace_folders.then(|| WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, params: InitializedParams) {
        info!("initialized: {:?}", params);
        if self.has_configuration_capability.load(Ordering::SeqCst) {
            let registration = Registration {
                id: "workspace/didChangeConfiguration".to_string(),
                method: "workspace/didChangeConfiguration".to_string(),
                register_options: None,
            };
            if let Err(e) = self.client.register_capability(vec![registration]).await {
                warn!("Failed to register for configuration changes: {}", e);
            }
        }
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!(
            "Opening document: URI={}, version={}",
            params.text_document.uri, params.text_document.version
        );
        let uri = params.text_document.uri.clone();
        let text = params.text_document.text;
        let version = params.text_document.version;
        let document_id = self.next_document_id();
        let document = Arc::new(LspDocument::new(document_id, uri.clone(), &text, version));
        self.documents_by_uri
            .write()
            .await
            .insert(uri.clone(), Arc::clone(&document));
        info!(
            "Opened document: URI={}, id={}, version={}",
            uri, document_id, version
        );

        self.validate_and_publish(document, &text, version).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        info!("textDocument/didChange: {:?}", params);
        let uri = params.text_document.uri.clone();
        let version = params.text_document.version;
        let document = self
            .documents_by_uri
            .read()
            .await
            .get(&uri)
            .map(Arc::clone);
        if let Some(document) = document {
            if let Some(text) = document.apply(params.content_changes, version).await {
                self.validate_and_publish(document, &text, version).await;
            } else {
                warn!("Failed to apply changes to document with URI={}", uri);
            }
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        info!("textDocument/didSave: {:?}", params);
        // Already validated on open and on every change; nothing left to do.
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        info!("textDocument/didClose: {:?}", params);
        let uri = params.text_document.uri;
        self.document_settings.remove(&uri);
        if let Some(document) = self.documents_by_uri.write().await.remove(&uri) {
            info!("Closed document: {}, id: {}", uri, document.id);
        } else {
            warn!("Failed to find document with URI={}", uri);
        }
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        info!("workspace/didChangeConfiguration: {:?}", params);
        if self.has_configuration_capability.load(Ordering::SeqCst) {
            // Settings are fetched lazily per document; drop the cache and
            // let the next validation pull fresh values.
            self.document_settings.clear();
        } else {
            let settings = params
                .settings
                .get(CONFIGURATION_SECTION)
                .cloned()
                .map(settings_from_value)
                .unwrap_or_default();
            *self.global_settings.write() = settings;
        }

        let documents: Vec<Arc<LspDocument>> = self
            .documents_by_uri
            .read()
            .await
            .values()
            .map(Arc::clone)
            .collect();
        for document in documents {
            let (text, version) = {
                let state = document.state.read().await;
                (state.text.to_string(), state.version)
            };
            self.validate_and_publish(document, &text, version).await;
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        info!("workspace/didChangeWatchedFiles: {:?}", params);
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        info!("Workspace folder change event received: {:?}", params);
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> jsonrpc::Result<Option<CompletionResponse>> {
        debug!(
            "textDocument/completion: URI={}",
            params.text_document_position.text_document.uri
        );
        let items = symbols::all_completion_items(&LEXICON)
            .into_iter()
            .map(|entry| CompletionItem {
                label: entry.name.to_string(),
                kind: Some(completion_item_kind(entry.kind)),
                detail: Some(entry.detail),
                documentation: Some(Documentation::String(entry.documentation)),
                data: Some(Value::String(entry.name.to_string())),
                ..Default::default()
            })
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn completion_resolve(&self, item: CompletionItem) -> jsonrpc::Result<CompletionItem> {
        // Detail and documentation are filled in eagerly by `completion`.
        Ok(item)
    }

    async fn hover(&self, params: HoverParams) -> jsonrpc::Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("textDocument/hover: URI={}, position={:?}", uri, position);

        let document = self
            .documents_by_uri
            .read()
            .await
            .get(&uri)
            .map(Arc::clone);
        let Some(document) = document else {
            warn!("Failed to find document with URI={}", uri);
            return Ok(None);
        };
        let Some((text, offset)) = document.text_with_offset(position).await else {
            return Ok(None);
        };
        let Some(word) = symbols::word_at_offset(&text, offset) else {
            return Ok(None);
        };
        let Some(info) = symbols::hover_info(&LEXICON, &word) else {
            return Ok(None);
        };

        let kind = if info.is_markdown {
            MarkupKind::Markdown
        } else {
            MarkupKind::PlainText
        };
        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind,
                value: info.content,
            }),
            range: None,
        }))
    }
}
