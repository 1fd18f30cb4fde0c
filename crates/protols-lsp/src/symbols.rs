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

//! Document symbols for schema files.
//!
//! This module provides symbol extraction for LSP features like:
//! - Document outline view
//! - Workspace-wide symbol search
//! - Breadcrumb navigation
//!
//! # Error Handling
//!
//! Symbols come from the last schema that parsed. A document that never
//! parsed has no symbols.

use crate::document_store::DocumentStore;
use crate::utils::{name_range, to_lsp_position};
use protols_core::{Enum, EnumId, Field, MessageId, Schema, Service, SourcePos, Span};
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Get document symbols for outline view.
#[allow(deprecated)]
pub fn get_document_symbols(schema: &Schema) -> Vec<DocumentSymbol> {
    let mut symbols = Vec::new();

    if let Some(package) = schema.package() {
        let range = name_range(package.pos, package.name.len());
        symbols.push(leaf(&package.name, None, SymbolKind::PACKAGE, range));
    }

    for import in schema.imports() {
        // The position is that of the opening quote.
        let range = name_range(import.pos, import.path.len() + 2);
        let detail = import.kind.is_public().then(|| "public".to_string());
        symbols.push(leaf(&import.path, detail, SymbolKind::FILE, range));
    }

    for (id, _) in schema.top_level_enums() {
        symbols.push(enum_symbol(schema, id));
    }
    for (id, _) in schema.top_level_messages() {
        symbols.push(message_symbol(schema, id));
    }
    for service in schema.services() {
        symbols.push(service_symbol(service));
    }

    debug!(
        "Document symbols extraction complete: {} top-level symbols",
        symbols.len()
    );
    symbols
}

/// Get workspace symbols matching a query.
///
/// Case-insensitive substring match over the top-level messages, enums and
/// services of every cached document, ordered by document then position.
#[allow(deprecated)]
pub fn get_workspace_symbols(store: &DocumentStore, query: &str) -> Vec<SymbolInformation> {
    let query_lower = query.to_lowercase();
    let mut documents = store.documents();
    documents.sort_by(|a, b| a.uri().as_str().cmp(b.uri().as_str()));

    let mut symbols = Vec::new();
    for doc in documents {
        let Some(schema) = doc.schema() else {
            continue;
        };
        let container = Some(schema.package_name().to_string()).filter(|p| !p.is_empty());

        let mut found: Vec<(SourcePos, &str, SymbolKind)> = Vec::new();
        found.extend(
            schema
                .top_level_messages()
                .map(|(_, m)| (m.pos, m.name.as_str(), SymbolKind::CLASS)),
        );
        found.extend(
            schema
                .top_level_enums()
                .map(|(_, e)| (e.pos, e.name.as_str(), SymbolKind::ENUM)),
        );
        found.extend(
            schema
                .services()
                .iter()
                .map(|s| (s.pos, s.name.as_str(), SymbolKind::INTERFACE)),
        );
        found.retain(|(_, name, _)| name.to_lowercase().contains(&query_lower));
        found.sort_by_key(|(pos, _, _)| *pos);

        for (pos, name, kind) in found {
            symbols.push(SymbolInformation {
                name: name.to_string(),
                kind,
                tags: None,
                deprecated: None,
                location: Location::new(doc.uri().clone(), name_range(pos, name.len())),
                container_name: container.clone(),
            });
        }
    }

    debug!(
        "Workspace symbol search for '{}' found {} matches",
        query,
        symbols.len()
    );
    symbols
}

#[allow(deprecated)]
fn leaf(name: &str, detail: Option<String>, kind: SymbolKind, range: Range) -> DocumentSymbol {
    DocumentSymbol {
        name: name.to_string(),
        detail,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range: range,
        children: None,
    }
}

#[allow(deprecated)]
fn container(
    name: &str,
    kind: SymbolKind,
    pos: SourcePos,
    span: Span,
    children: Vec<DocumentSymbol>,
) -> DocumentSymbol {
    let end = to_lsp_position(span.end);
    DocumentSymbol {
        name: name.to_string(),
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range: Range::new(
            to_lsp_position(span.start),
            Position::new(end.line, end.character + 1),
        ),
        selection_range: name_range(pos, name.len()),
        children: Some(children),
    }
}

fn enum_symbol(schema: &Schema, id: EnumId) -> DocumentSymbol {
    let enumeration: &Enum = schema.enumeration(id);
    let values = enumeration
        .values
        .iter()
        .map(|value| {
            leaf(
                &value.name,
                Some(value.number.to_string()),
                SymbolKind::ENUM_MEMBER,
                name_range(value.pos, value.name.len()),
            )
        })
        .collect();
    container(
        &enumeration.name,
        SymbolKind::ENUM,
        enumeration.pos,
        enumeration.span,
        values,
    )
}

fn message_symbol(schema: &Schema, id: MessageId) -> DocumentSymbol {
    let message = schema.message(id);
    let mut children: Vec<DocumentSymbol> = Vec::new();
    children.extend(message.nested_enums.iter().map(|&e| enum_symbol(schema, e)));
    children.extend(message.nested_messages.iter().map(|&m| message_symbol(schema, m)));
    children.extend(message.all_fields().map(field_symbol));
    children.extend(message.map_fields.iter().map(|map| {
        leaf(
            &map.name,
            Some(format!("map<{}, {}>", map.key_type, map.value_type)),
            SymbolKind::FIELD,
            name_range(map.pos, map.name.len()),
        )
    }));
    children.sort_by_key(|child| child.selection_range.start);
    container(
        &message.name,
        SymbolKind::CLASS,
        message.pos,
        message.span,
        children,
    )
}

fn field_symbol(field: &Field) -> DocumentSymbol {
    leaf(
        &field.name,
        Some(field.type_name.clone()),
        SymbolKind::FIELD,
        name_range(field.pos, field.name.len()),
    )
}

fn service_symbol(service: &Service) -> DocumentSymbol {
    let rpcs = service
        .rpcs
        .iter()
        .map(|rpc| {
            leaf(
                &rpc.name,
                Some(format!("({}) returns ({})", rpc.request, rpc.response)),
                SymbolKind::METHOD,
                name_range(rpc.pos, rpc.name.len()),
            )
        })
        .collect();
    container(
        &service.name,
        SymbolKind::INTERFACE,
        service.pos,
        service.span,
        rpcs,
    )
}
