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

//! Protocol Buffers Language Server Protocol (LSP) Implementation
//!
//! This crate provides IDE integration for `.proto` schema files through the
//! Language Server Protocol. Every query is answered from the last schema
//! that parsed, so a document mid-edit keeps its navigation features.
//!
//! # Features
//!
//! - **Diagnostics**: The first parse error of each open schema
//! - **Autocomplete**: Keywords, packages, scoped types and qualified names after `.`
//! - **Hover**: The rendered declaration with its comments
//! - **Go to Definition**: Types across imports, import paths, and generated `.pb.h` headers
//! - **Find References**: Whole-word uses across the import graph
//! - **Document Symbols**: Outline of packages, imports, enums, messages and services
//! - **Workspace Symbols**: Search over every cached document
//! - **Document Formatting**: Whole-document and range formatting through `clang-format`
//!
//! # Import Resolution
//!
//! Import paths are looked up under the configured search roots first,
//! then in the importing file's directory and each of its ancestors. The
//! first existing file wins. Imported files are read from disk on first
//! use and cached until they change.
//!
//! # Usage
//!
//! ## Running the Server
//!
//! ```bash
//! # Run the language server (stdio transport), logging to ~/.protols.log
//! protols
//!
//! # Log to stderr with debug output
//! RUST_LOG=debug protols --logs ""
//!
//! # Extra import search roots
//! protols --proto-dir third_party/googleapis --proto-dir vendor/protos
//! ```
//!
//! ## Programmatic Usage
//!
//! ```no_run
//! use protols_lsp::ProtoLanguageServer;
//! use tower_lsp::{LspService, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stdin = tokio::io::stdin();
//!     let stdout = tokio::io::stdout();
//!
//!     let (service, socket) = LspService::new(ProtoLanguageServer::new);
//!
//!     Server::new(stdin, stdout, socket).serve(service).await;
//! }
//! ```
//!
//! # Architecture
//!
//! - `backend`: LSP server implementation wiring notifications and requests
//! - [`document_store`]: Cache of parsed documents, loaded lazily from disk
//! - [`import_resolver`]: Import path to file mapping
//! - [`resolver`]: Name resolution across nested scopes and imports
//! - [`references`]: Reference search over the import graph
//! - [`completion`], [`hover`], [`definition`], [`symbols`]: Query providers
//! - [`formatting`]: External formatter bridge
//! - [`settings`]: Client configuration
//! - [`utils`]: Word scanning and position helpers

mod backend;
pub mod completion;
pub mod constants;
pub mod deadline;
pub mod definition;
pub mod diagnostics;
pub mod document_store;
pub mod error;
pub mod formatting;
pub mod hover;
pub mod import_resolver;
pub mod logging;
pub mod references;
pub mod resolver;
pub mod settings;
pub mod symbols;
pub mod utils;

pub use backend::ProtoLanguageServer;
pub use document_store::{CacheStatistics, Document, DocumentStore};
pub use error::{LspError, LspResult};

/// LSP server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
