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

//! Hover information for message and enum references.
//!
//! The first declaration the cursor word resolves to is rendered back as
//! schema source in a fenced `proto` block.
//!
//! # Examples
//!
//! Hovering over `Status` in `Status status = 2;` shows:
//!
//! ```text
//! // Account state.
//! enum Status {
//!     ACTIVE = 0;
//!     DISABLED = 1; // no logins
//! }
//! ```

use crate::document_store::DocumentStore;
use crate::error::LspResult;
use crate::resolver::{cursor_token, SymbolResolver};
use protols_core::{Entity, EnumId, Field, MessageId, Schema};
use std::fmt::Write;
use tower_lsp::lsp_types::*;

/// Get hover information for a position.
///
/// # Returns
///
/// Markdown for the first resolved declaration, with the range of the word
/// under the cursor.
pub fn get_hover(store: &DocumentStore, uri: &Url, position: Position) -> LspResult<Hover> {
    let doc = store.get(uri)?;
    let token = cursor_token(&doc, position, true)?;
    let symbols = SymbolResolver::new(store).resolve(uri, position.line, position.character, true)?;
    let symbol = &symbols[0];

    Ok(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: render_markdown(&symbol.schema, symbol.entity),
        }),
        range: Some(token.range),
    })
}

/// `render_entity` wrapped in a fenced `proto` block.
pub fn render_markdown(schema: &Schema, entity: Entity) -> String {
    format!("```proto\n{}```", render_entity(schema, entity))
}

/// Declaration source of `entity`, preceded by its leading comments.
pub fn render_entity(schema: &Schema, entity: Entity) -> String {
    let mut out = String::new();
    match entity {
        Entity::Message(id) => render_message(schema, id, 0, &mut out),
        Entity::Enum(id) => render_enum(schema, id, 0, &mut out),
    }
    out
}

fn render_comments(comments: &[String], depth: usize, out: &mut String) {
    for line in comments {
        let _ = writeln!(out, "{}//{}", indent(depth), line);
    }
}

fn render_message(schema: &Schema, id: MessageId, depth: usize, out: &mut String) {
    let message = schema.message(id);
    render_comments(&message.comments, depth, out);
    let _ = writeln!(out, "{}message {} {{", indent(depth), message.name);

    for &nested in &message.nested_enums {
        render_enum(schema, nested, depth + 1, out);
    }
    for &nested in &message.nested_messages {
        render_message(schema, nested, depth + 1, out);
    }
    for field in &message.fields {
        render_field(field, depth + 1, out);
    }
    for map in &message.map_fields {
        render_comments(&map.comments, depth + 1, out);
        let _ = write!(
            out,
            "{}map<{}, {}> {} = {};",
            indent(depth + 1),
            map.key_type,
            map.value_type,
            map.name,
            map.number
        );
        finish_line(map.inline_comment.as_deref(), out);
    }
    for oneof in &message.oneofs {
        render_comments(&oneof.comments, depth + 1, out);
        let _ = writeln!(out, "{}oneof {} {{", indent(depth + 1), oneof.name);
        for field in &oneof.fields {
            render_field(field, depth + 2, out);
        }
        let _ = writeln!(out, "{}}}", indent(depth + 1));
    }

    let _ = writeln!(out, "{}}}", indent(depth));
}

fn render_field(field: &Field, depth: usize, out: &mut String) {
    render_comments(&field.comments, depth, out);
    let label = field
        .label
        .map(|label| format!("{} ", label.as_str()))
        .unwrap_or_default();
    let _ = write!(
        out,
        "{}{}{} {} = {};",
        indent(depth),
        label,
        field.type_name,
        field.name,
        field.number
    );
    finish_line(field.inline_comment.as_deref(), out);
}

fn render_enum(schema: &Schema, id: EnumId, depth: usize, out: &mut String) {
    let enumeration = schema.enumeration(id);
    render_comments(&enumeration.comments, depth, out);
    let _ = writeln!(out, "{}enum {} {{", indent(depth), enumeration.name);
    for value in &enumeration.values {
        render_comments(&value.comments, depth + 1, out);
        let _ = write!(out, "{}{} = {};", indent(depth + 1), value.name, value.number);
        finish_line(value.inline_comment.as_deref(), out);
    }
    let _ = writeln!(out, "{}}}", indent(depth));
}

fn finish_line(inline_comment: Option<&str>, out: &mut String) {
    if let Some(comment) = inline_comment {
        let _ = write!(out, " //{}", comment);
    }
    out.push('\n');
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}
