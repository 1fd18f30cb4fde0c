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

//! Identifier resolution.
//!
//! Turns the word under the cursor into the message or enum declarations
//! it names, across package and import boundaries.
//!
//! # Lookup Order
//!
//! 1. Nested scope: the innermost enclosing message, its ancestors, then
//!    the top level. The first level with a match wins, so inner
//!    declarations shadow outer ones. Only for unqualified names.
//! 2. Own package: top-level declarations of the current document when the
//!    qualifier is empty or equals its package.
//! 3. Imports: when the current document has no match, every import whose
//!    package the qualifier references (see [`references_package`])
//!    contributes its top-level matches.
//! 4. Public re-exports: an import that contributes nothing is searched
//!    through its own `import public` declarations, recursively.
//! 5. Nested type paths: a dotted word that found nothing is split into a
//!    package part and a `Outer.Inner` path of at least two segments.
//!
//! Every walk over the import graph carries a visited set and checks the
//! [`Deadline`] before each import.

use crate::deadline::Deadline;
use crate::document_store::{Document, DocumentStore};
use crate::error::{LspError, LspResult};
use crate::utils::{name_range, word_at};
use protols_core::{Entity, Schema};
use std::collections::HashSet;
use std::sync::Arc;
use tower_lsp::lsp_types::{Location, Position, Range, Url};
use tracing::debug;

/// A resolved declaration.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Document declaring the symbol.
    pub uri: Url,
    /// Schema the declaration was found in.
    pub schema: Arc<Schema>,
    pub entity: Entity,
    /// Range of the declared name.
    pub range: Range,
}

impl Symbol {
    pub fn new(uri: Url, schema: Arc<Schema>, entity: Entity) -> Self {
        let range = name_range(schema.entity_pos(entity), schema.entity_name(entity).len());
        Self {
            uri,
            schema,
            entity,
            range,
        }
    }

    pub fn name(&self) -> &str {
        self.schema.entity_name(self.entity)
    }

    pub fn location(&self) -> Location {
        Location::new(self.uri.clone(), self.range)
    }

    fn same_declaration(&self, other: &Symbol) -> bool {
        self.uri == other.uri && self.entity == other.entity
    }
}

/// The word under the cursor and its range on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorToken {
    pub text: String,
    pub range: Range,
}

/// Extracts the word at `position` in `doc`.
///
/// # Error Handling
///
/// - line missing or character past the end of the line:
///   `LspError::PositionOutOfRange`
/// - no identifier there: `LspError::SymbolNotFound`
pub fn cursor_token(doc: &Document, position: Position, include_dot: bool) -> LspResult<CursorToken> {
    let out_of_range = || LspError::PositionOutOfRange {
        line: position.line,
        character: position.character,
    };
    let line = doc.line(position.line as usize).ok_or_else(out_of_range)?;
    if position.character as usize > line.len() {
        return Err(out_of_range());
    }
    let (word, start, end) = word_at(&line, position.character as usize, include_dot)
        .ok_or_else(|| LspError::SymbolNotFound(format!("no identifier at {}:{}", position.line, position.character)))?;
    Ok(CursorToken {
        text: word.to_string(),
        range: Range::new(
            Position::new(position.line, start as u32),
            Position::new(position.line, end as u32),
        ),
    })
}

/// True when `line` is an import declaration.
pub fn is_import_line(line: &str) -> bool {
    line.trim_start().starts_with("import")
}

/// Whether `qualifier`, written in a document of package `own`, refers to
/// the package `candidate`.
///
/// Either the two are equal, or `candidate` ends with `.qualifier` and the
/// part before it is `own` or a dotted ancestor of `own`. From package
/// `common.user`, the qualifier `some.dependency` references
/// `common.some.dependency`.
pub fn references_package(qualifier: &str, own: &str, candidate: &str) -> bool {
    if candidate == qualifier {
        return true;
    }
    let prefix = candidate
        .strip_suffix(qualifier)
        .and_then(|rest| rest.strip_suffix('.'));
    match prefix {
        Some(prefix) => prefix == own || is_dotted_ancestor(prefix, own),
        None => false,
    }
}

fn is_dotted_ancestor(ancestor: &str, package: &str) -> bool {
    !ancestor.is_empty()
        && package
            .strip_prefix(ancestor)
            .map_or(false, |rest| rest.starts_with('.'))
}

/// Resolves identifiers against a [`DocumentStore`].
pub struct SymbolResolver<'a> {
    store: &'a DocumentStore,
    deadline: Deadline,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self {
            store,
            deadline: Deadline::none(),
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolves the word at (`line`, `character`) of `uri`.
    ///
    /// # Arguments
    ///
    /// * `line`, `character` - 0-based cursor position
    /// * `include_qualifier` - treat `.` as part of the word
    ///
    /// # Returns
    ///
    /// Every matching declaration. Duplicate names are legal, so more than
    /// one symbol may come back.
    ///
    /// # Error Handling
    ///
    /// `SymbolNotFound` when nothing matches or the cursor is on an import
    /// line; `PositionOutOfRange` when the cursor is past the line.
    pub fn resolve(
        &self,
        uri: &Url,
        line: u32,
        character: u32,
        include_qualifier: bool,
    ) -> LspResult<Vec<Symbol>> {
        let doc = self.store.get(uri)?;
        let token = cursor_token(&doc, Position::new(line, character), include_qualifier)?;
        if doc.line(line as usize).map_or(false, |text| is_import_line(&text)) {
            return Err(LspError::SymbolNotFound(format!(
                "{} is on an import line",
                token.text
            )));
        }
        let schema = doc
            .schema()
            .cloned()
            .ok_or_else(|| LspError::SymbolNotFound(token.text.clone()))?;

        let symbols = self.resolve_name(uri, &schema, Some(line + 1), &token.text);
        debug!(
            "Resolved {:?} at {}:{}:{} to {} symbol(s)",
            token.text,
            uri,
            line,
            character,
            symbols.len()
        );
        if symbols.is_empty() {
            Err(LspError::SymbolNotFound(token.text))
        } else {
            Ok(symbols)
        }
    }

    /// Resolves `word` as written in `uri`.
    ///
    /// `scope_line` (1-based) enables the nested-scope step; without it the
    /// lookup starts at the top level.
    pub fn resolve_name(
        &self,
        uri: &Url,
        schema: &Arc<Schema>,
        scope_line: Option<u32>,
        word: &str,
    ) -> Vec<Symbol> {
        let word = word.trim_start_matches('.');
        let (qualifier, leaf) = word.rsplit_once('.').unwrap_or(("", word));
        if leaf.is_empty() {
            return Vec::new();
        }

        if qualifier.is_empty() {
            if let Some(line) = scope_line {
                for scope in schema.scope_chain(line) {
                    let nested = schema.message(scope).nested_named(leaf);
                    if !nested.is_empty() {
                        debug!("{:?} found in nested scope {}", leaf, schema.message(scope).name);
                        return nested
                            .iter()
                            .map(|&e| Symbol::new(uri.clone(), Arc::clone(schema), e))
                            .collect();
                    }
                }
            }
        }

        let found = self.find(uri, schema, qualifier, |s| s.top_level_named(leaf));
        if !found.is_empty() || qualifier.is_empty() {
            return found;
        }
        self.resolve_type_path(uri, schema, scope_line, word)
    }

    /// Splits a dotted word into `package . Type.Path` in every possible way.
    fn resolve_type_path(
        &self,
        uri: &Url,
        schema: &Arc<Schema>,
        scope_line: Option<u32>,
        word: &str,
    ) -> Vec<Symbol> {
        let segments: Vec<&str> = word.split('.').collect();
        let mut found: Vec<Symbol> = Vec::new();

        for split in 0..segments.len().saturating_sub(1) {
            let (package, path) = segments.split_at(split);
            let candidates = if package.is_empty() {
                let scoped = scope_line
                    .into_iter()
                    .flat_map(|line| schema.scope_chain(line))
                    .map(|scope| schema.find_type_path_in(scope, path))
                    .find(|entities| !entities.is_empty());
                match scoped {
                    Some(entities) => entities
                        .into_iter()
                        .map(|e| Symbol::new(uri.clone(), Arc::clone(schema), e))
                        .collect(),
                    None => self.find(uri, schema, "", |s| s.find_type_path(path)),
                }
            } else {
                self.find(uri, schema, &package.join("."), |s| s.find_type_path(path))
            };
            for symbol in candidates {
                if !found.iter().any(|f| f.same_declaration(&symbol)) {
                    found.push(symbol);
                }
            }
        }
        found
    }

    /// Runs `lookup` on the current document (when the qualifier names its
    /// own package) and on every imported document whose package the
    /// qualifier references.
    pub fn collect<F>(&self, uri: &Url, schema: &Arc<Schema>, qualifier: &str, lookup: F) -> Vec<Symbol>
    where
        F: Fn(&Schema) -> Vec<Entity>,
    {
        let found = self.own_matches(uri, schema, qualifier, &lookup);
        self.import_matches(uri, schema, qualifier, &lookup, found)
    }

    /// Like [`collect`](Self::collect), but imports are searched only when
    /// the current document has no match.
    pub fn find<F>(&self, uri: &Url, schema: &Arc<Schema>, qualifier: &str, lookup: F) -> Vec<Symbol>
    where
        F: Fn(&Schema) -> Vec<Entity>,
    {
        let found = self.own_matches(uri, schema, qualifier, &lookup);
        if !found.is_empty() {
            return found;
        }
        self.import_matches(uri, schema, qualifier, &lookup, found)
    }

    fn own_matches<F>(&self, uri: &Url, schema: &Arc<Schema>, qualifier: &str, lookup: &F) -> Vec<Symbol>
    where
        F: Fn(&Schema) -> Vec<Entity>,
    {
        if !qualifier.is_empty() && qualifier != schema.package_name() {
            return Vec::new();
        }
        lookup(schema)
            .into_iter()
            .map(|e| Symbol::new(uri.clone(), Arc::clone(schema), e))
            .collect()
    }

    fn import_matches<F>(
        &self,
        uri: &Url,
        schema: &Arc<Schema>,
        qualifier: &str,
        lookup: &F,
        mut found: Vec<Symbol>,
    ) -> Vec<Symbol>
    where
        F: Fn(&Schema) -> Vec<Entity>,
    {
        let own = schema.package_name();
        let effective = if qualifier.is_empty() { own } else { qualifier };
        let mut visited = HashSet::from([uri.clone()]);
        self.walk_imports(uri, schema, false, effective, own, lookup, &mut visited, &mut found);
        found
    }

    /// Visits the imports of `schema` (only public ones when `public_only`).
    /// An import that contributes nothing is searched through its public
    /// imports.
    #[allow(clippy::too_many_arguments)]
    fn walk_imports<F>(
        &self,
        uri: &Url,
        schema: &Schema,
        public_only: bool,
        qualifier: &str,
        own: &str,
        lookup: &F,
        visited: &mut HashSet<Url>,
        found: &mut Vec<Symbol>,
    ) where
        F: Fn(&Schema) -> Vec<Entity>,
    {
        for import in schema.imports() {
            if public_only && !import.kind.is_public() {
                continue;
            }
            if self.deadline.expired() {
                debug!("Deadline expired before import {:?} of {}", import.path, uri);
                return;
            }
            let doc = match self.store.import(uri, &import.path) {
                Ok(doc) => doc,
                Err(err) => {
                    debug!("Skipping import {:?} of {}: {}", import.path, uri, err);
                    continue;
                }
            };
            if !visited.insert(doc.uri().clone()) {
                continue;
            }
            let Some(target) = doc.schema().cloned() else {
                continue;
            };

            let before = found.len();
            if references_package(qualifier, own, target.package_name()) {
                found.extend(
                    lookup(&target)
                        .into_iter()
                        .map(|e| Symbol::new(doc.uri().clone(), Arc::clone(&target), e)),
                );
            }
            if found.len() == before {
                self.walk_imports(doc.uri(), &target, true, qualifier, own, lookup, visited, found);
            }
        }
    }
}
