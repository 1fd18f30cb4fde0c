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

//! Autocompletion for schema files.
//!
//! # Completion Contexts
//!
//! - **Invoked**: imported package names matching the typed word, the
//!   keyword table, types nested in the enclosing messages, then the
//!   document's top-level enums and messages.
//! - **Trigger character** (`.`): the word before the dot is a qualifier.
//!   Types of every imported document whose package it references are
//!   offered, plus the nested types of a message it names.
//!
//! # Examples
//!
//! ```text
//! com|              → Suggests the `common` package
//! common.|          → Suggests types declared in package common
//! Outer.|           → Suggests types nested in Outer
//! ```

use crate::constants::KEYWORDS;
use crate::deadline::Deadline;
use crate::document_store::DocumentStore;
use crate::hover::render_markdown;
use crate::resolver::{Symbol, SymbolResolver};
use crate::utils::{is_identifier_char, safe_slice_to};
use protols_core::{Entity, Schema};
use std::collections::HashSet;
use std::sync::Arc;
use tower_lsp::lsp_types::*;
use tracing::debug;

/// Get completions for a position in the document.
///
/// An unreadable document or a position past its end yields no items.
/// Imports are walked until `deadline` expires; items gathered up to that
/// point are returned.
pub fn get_completions(
    store: &DocumentStore,
    uri: &Url,
    position: Position,
    trigger_kind: Option<CompletionTriggerKind>,
    deadline: Deadline,
) -> Vec<CompletionItem> {
    let doc = match store.get(uri) {
        Ok(doc) => doc,
        Err(err) => {
            debug!("No completions for {}: {}", uri, err);
            return Vec::new();
        }
    };
    let Some(line) = doc.line(position.line as usize) else {
        return Vec::new();
    };
    let word = typed_word(&line, position.character as usize);
    let mut items = Vec::new();

    let Some(schema) = doc.schema().cloned() else {
        if trigger_kind != Some(CompletionTriggerKind::TRIGGER_CHARACTER) {
            items.extend(keyword_completions());
        }
        return items;
    };

    items.extend(package_completions(store, uri, &schema, word, deadline));

    if trigger_kind == Some(CompletionTriggerKind::TRIGGER_CHARACTER) {
        let qualifier = word.strip_suffix('.').unwrap_or(word);
        items.extend(qualified_completions(
            store,
            uri,
            &schema,
            qualifier,
            position.line + 1,
            deadline,
        ));
    } else {
        items.extend(keyword_completions());
        items.extend(scope_completions(&schema, position.line + 1));
        items.extend(top_level_completions(&schema));
    }

    debug!(
        "{} completion item(s) for {:?} at {}:{}",
        items.len(),
        word,
        position.line,
        position.character
    );
    items
}

/// The run of identifier characters and dots ending at `character`.
fn typed_word(line: &str, character: usize) -> &str {
    let before = safe_slice_to(line, character);
    let start = before
        .bytes()
        .rposition(|b| !(is_identifier_char(b) || b == b'.'))
        .map_or(0, |i| i + 1);
    &before[start..]
}

/// Package names of direct imports starting with `word`, deduplicated.
fn package_completions(
    store: &DocumentStore,
    uri: &Url,
    schema: &Schema,
    word: &str,
    deadline: Deadline,
) -> Vec<CompletionItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    for import in schema.imports() {
        if deadline.expired() {
            debug!("Completion deadline expired while listing packages");
            break;
        }
        let Ok(doc) = store.import(uri, &import.path) else {
            continue;
        };
        let Some(package) = doc.schema().map(|s| s.package_name().to_string()) else {
            continue;
        };
        if package.is_empty() || !package.starts_with(word) || !seen.insert(package.clone()) {
            continue;
        }
        items.push(CompletionItem {
            label: package,
            kind: Some(CompletionItemKind::MODULE),
            ..Default::default()
        });
    }
    items
}

fn keyword_completions() -> impl Iterator<Item = CompletionItem> {
    KEYWORDS.iter().map(|keyword| CompletionItem {
        label: keyword.to_string(),
        kind: Some(CompletionItemKind::KEYWORD),
        ..Default::default()
    })
}

/// Types nested in the messages enclosing `line`, innermost first.
fn scope_completions(schema: &Schema, line: u32) -> Vec<CompletionItem> {
    schema
        .scope_chain(line)
        .into_iter()
        .flat_map(|scope| nested_entities(schema, scope))
        .map(|entity| entity_completion(schema, entity))
        .collect()
}

fn top_level_completions(schema: &Schema) -> Vec<CompletionItem> {
    let enums = schema.top_level_enums().map(|(id, _)| Entity::Enum(id));
    let messages = schema.top_level_messages().map(|(id, _)| Entity::Message(id));
    enums
        .chain(messages)
        .map(|entity| entity_completion(schema, entity))
        .collect()
}

/// Completions after `qualifier.`.
fn qualified_completions(
    store: &DocumentStore,
    uri: &Url,
    schema: &Arc<Schema>,
    qualifier: &str,
    line: u32,
    deadline: Deadline,
) -> Vec<CompletionItem> {
    let resolver = SymbolResolver::new(store).with_deadline(deadline);

    let mut symbols: Vec<Symbol> = resolver.collect(uri, schema, qualifier, |s| {
        s.top_level_enums()
            .map(|(id, _)| Entity::Enum(id))
            .chain(s.top_level_messages().map(|(id, _)| Entity::Message(id)))
            .collect()
    });
    // A qualifier naming a message offers its nested types.
    for owner in resolver.resolve_name(uri, schema, Some(line), qualifier) {
        if let Entity::Message(id) = owner.entity {
            symbols.extend(
                nested_entities(&owner.schema, id)
                    .map(|entity| Symbol::new(owner.uri.clone(), Arc::clone(&owner.schema), entity)),
            );
        }
    }

    symbols
        .iter()
        .map(|symbol| entity_completion(&symbol.schema, symbol.entity))
        .collect()
}

fn nested_entities(
    schema: &Schema,
    id: protols_core::MessageId,
) -> impl Iterator<Item = Entity> + '_ {
    let message = schema.message(id);
    message
        .nested_enums
        .iter()
        .map(|&e| Entity::Enum(e))
        .chain(message.nested_messages.iter().map(|&m| Entity::Message(m)))
}

fn entity_completion(schema: &Schema, entity: Entity) -> CompletionItem {
    let kind = match entity {
        Entity::Message(_) => CompletionItemKind::CLASS,
        Entity::Enum(_) => CompletionItemKind::ENUM,
    };
    CompletionItem {
        label: schema.entity_name(entity).to_string(),
        kind: Some(kind),
        detail: Some(schema.type_path(entity)),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: render_markdown(schema, entity),
        })),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"syntax = "proto3";
package demo;

enum Color {
  RED = 0;
}

message Outer {
  message Inner {}
  enum Mode { A = 0; }

}

message Other {
  Outer.
}
"#;

    // The edited text does not parse; completion runs on the last good schema.
    fn setup() -> (DocumentStore, Url) {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/complete.proto").unwrap();
        store.open(&uri, &SOURCE.replace("  Outer.\n", "  Outer.Inner inner = 1;\n"));
        assert!(store.set_content(&uri, Some(SOURCE)).is_some());
        (store, uri)
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_typed_word() {
        assert_eq!(typed_word("  common.Fo", 11), "common.Fo");
        assert_eq!(typed_word("  common.", 9), "common.");
        assert_eq!(typed_word("  Foo bar", 5), "Foo");
        assert_eq!(typed_word("", 0), "");
        assert_eq!(typed_word("  Foo", 50), "Foo");
    }

    #[test]
    fn test_invoked_completion_order() {
        let (store, uri) = setup();
        // Blank line inside Outer.
        let items = get_completions(&store, &uri, Position::new(10, 0), None, Deadline::none());
        let labels = labels(&items);
        assert_eq!(labels[0], KEYWORDS[0]);
        let tail = &labels[KEYWORDS.len()..];
        assert_eq!(tail, &["Mode", "Inner", "Color", "Outer", "Other"]);
        assert_eq!(items[KEYWORDS.len()].kind, Some(CompletionItemKind::ENUM));
        assert_eq!(items[KEYWORDS.len() + 1].kind, Some(CompletionItemKind::CLASS));
        assert_eq!(items[KEYWORDS.len() + 1].detail.as_deref(), Some("Outer.Inner"));
    }

    #[test]
    fn test_documentation_is_rendered() {
        let (store, uri) = setup();
        let items = get_completions(&store, &uri, Position::new(0, 0), None, Deadline::none());
        let color = items.iter().find(|i| i.label == "Color").unwrap();
        let Some(Documentation::MarkupContent(doc)) = &color.documentation else {
            panic!("expected markdown documentation");
        };
        assert!(doc.value.starts_with("```proto\nenum Color {"));
    }

    #[test]
    fn test_trigger_on_message_name() {
        let (store, uri) = setup();
        let items = get_completions(
            &store,
            &uri,
            Position::new(14, 8),
            Some(CompletionTriggerKind::TRIGGER_CHARACTER),
            Deadline::none(),
        );
        assert_eq!(labels(&items), vec!["Mode", "Inner"]);
    }

    #[test]
    fn test_trigger_on_own_package() {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/pkg.proto").unwrap();
        store.open(&uri, "package demo;\nmessage A {}\nmessage B {\n  demo.A a = 1;\n}\n");
        store.set_content(&uri, Some("package demo;\nmessage A {}\nmessage B {\n  demo.\n}\n"));
        let items = get_completions(
            &store,
            &uri,
            Position::new(3, 7),
            Some(CompletionTriggerKind::TRIGGER_CHARACTER),
            Deadline::none(),
        );
        assert_eq!(labels(&items), vec!["A", "B"]);
    }

    #[test]
    fn test_position_past_end() {
        let (store, uri) = setup();
        let items = get_completions(&store, &uri, Position::new(400, 0), None, Deadline::none());
        assert!(items.is_empty());
    }
}
