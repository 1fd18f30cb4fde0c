// protols - Protocol Buffers Language Server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! LSP backend implementation.
//!
//! Lifecycle notifications go straight to the [`DocumentStore`]; every
//! query builds a resolver over the same store. Query failures are logged
//! and answered with an empty result.

use crate::completion::get_completions;
use crate::constants::{COMPLETION_DEADLINE_MS, PROTO_SUFFIX, TRIGGER_CHARACTERS};
use crate::deadline::Deadline;
use crate::definition::goto_definition;
use crate::diagnostics::diagnostics_for;
use crate::document_store::{CacheStatistics, DocumentStore};
use crate::error::{LspError, LspResult};
use crate::formatting::format_document;
use crate::hover::get_hover;
use crate::import_resolver::{uri_to_path, ImportResolver};
use crate::references::ReferenceFinder;
use crate::settings::Settings;
use crate::symbols::{get_document_symbols, get_workspace_symbols};
use dashmap::DashMap;
use parking_lot::RwLock;
use protols_core::ParseError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

/// Protocol Buffers language server backend.
pub struct ProtoLanguageServer {
    /// LSP client connection.
    client: Client,
    store: Arc<DocumentStore>,
    settings: RwLock<Settings>,
    /// Search roots given on the command line; they precede configured ones.
    cli_proto_dirs: Vec<PathBuf>,
    workspace_root: RwLock<Option<PathBuf>>,
    /// Number of diagnostics currently published per document.
    published: DashMap<Url, usize>,
}

impl ProtoLanguageServer {
    pub fn new(client: Client) -> Self {
        Self::with_proto_dirs(client, Vec::new())
    }

    /// Server whose import search starts with `proto_dirs`.
    pub fn with_proto_dirs(client: Client, proto_dirs: Vec<PathBuf>) -> Self {
        let resolver = Arc::new(ImportResolver::new(proto_dirs.clone()));
        Self {
            client,
            store: Arc::new(DocumentStore::new(resolver)),
            settings: RwLock::new(Settings::default()),
            cli_proto_dirs: proto_dirs,
            workspace_root: RwLock::new(None),
            published: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.store.statistics()
    }

    /// Replaces the settings and recomputes the import search roots.
    ///
    /// Invalid settings are logged and the previous ones kept.
    fn apply_settings(&self, value: serde_json::Value) {
        let settings = match Settings::from_value(value) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Ignoring settings update: {}", err);
                return;
            }
        };
        let root = self.workspace_root.read().clone();
        let mut roots = self.cli_proto_dirs.clone();
        roots.extend(settings.proto_dirs(root.as_deref()));
        info!("Settings applied: {:?}", settings);
        self.store.resolver().set_roots(roots);
        *self.settings.write() = settings;
    }

    async fn publish(&self, uri: &Url, error: Option<&ParseError>) {
        if !uri.path().ends_with(PROTO_SUFFIX) {
            return;
        }
        let diagnostics = diagnostics_for(error);
        let previous = self.published.insert(uri.clone(), diagnostics.len()).unwrap_or(0);
        if diagnostics.is_empty() && previous == 0 {
            return;
        }
        debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, None)
            .await;
    }

    async fn format(&self, uri: &Url, lines: Option<(u32, u32)>) -> LspResult<Vec<TextEdit>> {
        let doc = self.store.get(uri)?;
        let path = uri_to_path(uri)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| LspError::InvalidUri(uri.to_string()))?;
        let formatter = self.settings.read().formatter.clone();
        format_document(
            &formatter,
            &file_name,
            &doc.text(),
            doc.line_count() as u32,
            lines,
        )
        .await
    }
}

/// Logs a failed query at a level matching its kind.
fn log_failure(request: &str, uri: &Url, err: &LspError) {
    if err.is_not_found() {
        debug!("{} for {}: {}", request, uri, err);
    } else {
        warn!("{} for {} failed: {}", request, uri, err);
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ProtoLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Protocol Buffers Language Server initializing");

        #[allow(deprecated)]
        let root = params
            .root_uri
            .as_ref()
            .or_else(|| {
                params
                    .workspace_folders
                    .as_ref()
                    .and_then(|folders| folders.first())
                    .map(|folder| &folder.uri)
            })
            .and_then(|uri| uri.to_file_path().ok());
        debug!("Workspace root: {:?}", root);
        *self.workspace_root.write() = root;

        if let Some(options) = params.initialization_options {
            self.apply_settings(options);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        will_save: None,
                        will_save_wait_until: None,
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(
                        TRIGGER_CHARACTERS.iter().map(|c| c.to_string()).collect(),
                    ),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                document_formatting_provider: Some(OneOf::Left(true)),
                document_range_formatting_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "protols".to_string(),
                version: Some(crate::VERSION.to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("Protocol Buffers Language Server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Protocol Buffers Language Server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = &params.text_document.uri;
        info!(
            "Document opened: {} ({} bytes, {} lines)",
            uri,
            params.text_document.text.len(),
            params.text_document.text.lines().count()
        );
        let error = self.store.open(uri, &params.text_document.text);
        self.publish(uri, error.as_ref()).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = &params.text_document.uri;
        match params.content_changes.into_iter().last() {
            Some(change) => {
                debug!("Document changed: {} ({} bytes)", uri, change.text.len());
                let error = self.store.set_content(uri, Some(&change.text));
                self.publish(uri, error.as_ref()).await;
            }
            None => warn!("Document change event for {} had no content changes", uri),
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Document saved: {}", params.text_document.uri);
        self.store.save(&params.text_document.uri);
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.store.close(&uri);
        if self.published.remove(&uri).map_or(false, |(_, count)| count > 0) {
            self.client.publish_diagnostics(uri, vec![], None).await;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.apply_settings(params.settings);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let trigger_kind = params.context.map(|context| context.trigger_kind);
        debug!(
            "Completion request for {} at {}:{} ({:?})",
            uri, position.line, position.character, trigger_kind
        );

        let deadline = Deadline::after(Duration::from_millis(COMPLETION_DEADLINE_MS));
        let items = get_completions(&self.store, uri, position, trigger_kind, deadline);
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        match get_hover(&self.store, uri, position) {
            Ok(hover) => Ok(Some(hover)),
            Err(err) => {
                log_failure("Hover", uri, &err);
                Ok(None)
            }
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let generated_dirs = self.settings.read().generated_dirs.clone();

        match goto_definition(&self.store, uri, position, &generated_dirs) {
            Ok(locations) if !locations.is_empty() => {
                Ok(Some(GotoDefinitionResponse::Array(locations)))
            }
            Ok(_) => Ok(None),
            Err(err) => {
                log_failure("Definition", uri, &err);
                Ok(None)
            }
        }
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        match ReferenceFinder::new(&self.store).find_at(
            uri,
            position,
            params.context.include_declaration,
        ) {
            Ok(locations) => Ok(Some(locations)),
            Err(err) => {
                log_failure("References", uri, &err);
                Ok(None)
            }
        }
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let uri = &params.text_document.uri;

        match self.store.get(uri) {
            Ok(doc) => Ok(doc
                .schema()
                .map(|schema| DocumentSymbolResponse::Nested(get_document_symbols(schema)))),
            Err(err) => {
                log_failure("Document symbols", uri, &err);
                Ok(None)
            }
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        Ok(Some(get_workspace_symbols(&self.store, &params.query)))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = &params.text_document.uri;
        debug!("Document formatting request for: {}", uri);

        match self.format(uri, None).await {
            Ok(edits) => Ok(Some(edits)),
            Err(err) => {
                log_failure("Formatting", uri, &err);
                Ok(None)
            }
        }
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let uri = &params.text_document.uri;
        let lines = (params.range.start.line + 1, params.range.end.line + 1);
        debug!("Range formatting request for {} (lines {}:{})", uri, lines.0, lines.1);

        match self.format(uri, Some(lines)).await {
            Ok(edits) => Ok(Some(edits)),
            Err(err) => {
                log_failure("Range formatting", uri, &err);
                Ok(None)
            }
        }
    }
}
