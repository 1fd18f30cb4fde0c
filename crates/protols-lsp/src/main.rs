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

//! Protocol Buffers Language Server binary.
//!
//! # Usage
//!
//! ```bash
//! # Run the language server (stdio transport)
//! protols
//!
//! # Write logs somewhere else, or to stderr with an empty path
//! protols --logs /tmp/protols.log
//! protols --logs ""
//!
//! # Add import search roots ahead of the configured ones
//! protols --proto-dir /usr/include --proto-dir third_party
//! ```
//!
//! # Editor Integration
//!
//! ## Neovim (nvim-lspconfig)
//!
//! ```lua
//! require('lspconfig.configs').protols = {
//!   default_config = {
//!     cmd = { 'protols' },
//!     filetypes = { 'proto', 'cpp' },
//!     root_dir = function() return vim.fn.getcwd() end,
//!     settings = {
//!       protols = { ['additional-proto-dirs'] = { 'third_party' } },
//!     },
//!   },
//! }
//! require('lspconfig').protols.setup {}
//! ```

use clap::Parser;
use protols_lsp::logging::{self, LogTarget};
use protols_lsp::ProtoLanguageServer;
use std::path::PathBuf;
use tower_lsp::{LspService, Server};

/// protols - Protocol Buffers language server
///
/// Speaks LSP over stdin/stdout.
#[derive(Parser)]
#[command(name = "protols")]
#[command(author, version, about = "Protocol Buffers language server", long_about = None)]
struct Args {
    /// Log file path; an empty value logs to stderr [default: ~/.protols.log]
    #[arg(long, value_name = "PATH")]
    logs: Option<PathBuf>,

    /// Additional import search root (repeatable)
    #[arg(long = "proto-dir", value_name = "DIR")]
    proto_dirs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let home = std::env::var_os("HOME").map(PathBuf::from);
    let target = LogTarget::from_arg(args.logs.as_deref(), home.as_deref());
    if let Err(err) = logging::init(&target) {
        tracing::warn!("Cannot open log file {:?}, logging to stderr: {}", target, err);
    }

    tracing::info!("Starting protols v{}", protols_lsp::VERSION);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let proto_dirs = args.proto_dirs;
    let (service, socket) =
        LspService::new(move |client| ProtoLanguageServer::with_proto_dirs(client, proto_dirs));

    Server::new(stdin, stdout, socket).serve(service).await;
}
