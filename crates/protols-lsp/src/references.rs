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

//! Textual reference search over the import closure.
//!
//! # Search Universe
//!
//! The requesting document plus every document reachable from it through
//! imports, visited depth-first in declaration order.
//!
//! # Line Filtering
//!
//! Blank lines, `import` lines and lines starting a comment are skipped.
//! Occurrences must be whole words. When the declarations are requested
//! they are reported first and their own lines are skipped; otherwise the
//! declaration lines are scanned like any other.

use crate::deadline::Deadline;
use crate::document_store::DocumentStore;
use crate::error::{LspError, LspResult};
use crate::resolver::{cursor_token, is_import_line, Symbol, SymbolResolver};
use crate::utils::find_whole_word;
use std::collections::HashSet;
use tower_lsp::lsp_types::{Location, Position, Range, Url};
use tracing::debug;

pub struct ReferenceFinder<'a> {
    store: &'a DocumentStore,
    deadline: Deadline,
}

impl<'a> ReferenceFinder<'a> {
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

    /// Resolves the word at `position` and finds its references.
    ///
    /// A word that resolves to no declaration (a field name, say) is still
    /// searched for textually, without declarations.
    pub fn find_at(
        &self,
        uri: &Url,
        position: Position,
        include_declaration: bool,
    ) -> LspResult<Vec<Location>> {
        let resolved = SymbolResolver::new(self.store)
            .with_deadline(self.deadline)
            .resolve(uri, position.line, position.character, true);
        match resolved {
            Ok(symbols) => {
                let name = symbols[0].name().to_string();
                Ok(self.find_references(&name, uri, &symbols, include_declaration))
            }
            Err(LspError::SymbolNotFound(reason)) => {
                let doc = self.store.get(uri)?;
                let word = cursor_token(&doc, position, false)?.text;
                debug!("No declaration for {:?} ({}), searching text only", word, reason);
                Ok(self.find_references(&word, uri, &[], include_declaration))
            }
            Err(err) => Err(err),
        }
    }

    /// Every whole-word occurrence of `name` in `origin` and its import
    /// closure.
    ///
    /// # Returns
    ///
    /// Declarations first (when `include_declaration`), then the origin
    /// document top to bottom, then imported documents depth-first.
    pub fn find_references(
        &self,
        name: &str,
        origin: &Url,
        declarations: &[Symbol],
        include_declaration: bool,
    ) -> Vec<Location> {
        let mut locations: Vec<Location> = if include_declaration {
            declarations.iter().map(Symbol::location).collect()
        } else {
            Vec::new()
        };
        // Declaration lines are skipped only when the declarations are
        // reported above.
        let declaration_lines: HashSet<(Url, u32)> = if include_declaration {
            declarations
                .iter()
                .map(|symbol| (symbol.uri.clone(), symbol.range.start.line))
                .collect()
        } else {
            HashSet::new()
        };

        let mut visited = HashSet::new();
        self.scan(origin, name, &declaration_lines, &mut visited, &mut locations);
        debug!(
            "Found {} location(s) for {:?} across {} document(s)",
            locations.len(),
            name,
            visited.len()
        );
        locations
    }

    fn scan(
        &self,
        uri: &Url,
        name: &str,
        declaration_lines: &HashSet<(Url, u32)>,
        visited: &mut HashSet<Url>,
        locations: &mut Vec<Location>,
    ) {
        if !visited.insert(uri.clone()) {
            return;
        }
        let doc = match self.store.get(uri) {
            Ok(doc) => doc,
            Err(err) => {
                debug!("Skipping {} in reference search: {}", uri, err);
                return;
            }
        };

        for (index, line) in doc.lines().enumerate() {
            let index = index as u32;
            if skip_line(&line) || declaration_lines.contains(&(uri.clone(), index)) {
                continue;
            }
            for start in find_whole_word(&line, name) {
                let range = Range::new(
                    Position::new(index, start as u32),
                    Position::new(index, (start + name.len()) as u32),
                );
                locations.push(Location::new(uri.clone(), range));
            }
        }

        let Some(schema) = doc.schema().cloned() else {
            return;
        };
        for import in schema.imports() {
            if self.deadline.expired() {
                debug!("Deadline expired in reference search at {}", uri);
                return;
            }
            match self.store.resolver().resolve(uri, &import.path) {
                Ok(target) => self.scan(&target, name, declaration_lines, visited, locations),
                Err(err) => debug!("Skipping import {:?} of {}: {}", import.path, uri, err),
            }
        }
    }
}

fn skip_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || is_import_line(trimmed)
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"syntax = "proto3";
// Foo is documented here
message Foo {
  Foo next = 1;
}

message Bar {
  Foo foo = 1;
  FooBar other = 2;
  repeated Foo many = 3; // trailing Foo
}
"#;

    fn setup() -> (DocumentStore, Url) {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/refs.proto").unwrap();
        store.open(&uri, SOURCE);
        (store, uri)
    }

    #[test]
    fn test_skip_line() {
        assert!(skip_line("   "));
        assert!(skip_line("  import \"Foo.proto\";"));
        assert!(skip_line("  // Foo"));
        assert!(skip_line(" /* Foo */"));
        assert!(!skip_line("  Foo foo = 1;"));
    }

    #[test]
    fn test_references_with_declaration() {
        let (store, uri) = setup();
        let finder = ReferenceFinder::new(&store);
        let locations = finder.find_at(&uri, Position::new(7, 3), true).unwrap();
        let starts: Vec<(u32, u32)> = locations
            .iter()
            .map(|l| (l.range.start.line, l.range.start.character))
            .collect();
        // Declaration first; the declaration line and the comment line are skipped.
        assert_eq!(
            starts,
            vec![(2, 8), (3, 2), (7, 2), (9, 11), (9, 37)]
        );
    }

    #[test]
    fn test_references_without_declaration() {
        let (store, uri) = setup();
        let finder = ReferenceFinder::new(&store);
        let locations = finder.find_at(&uri, Position::new(3, 2), false).unwrap();
        let starts: Vec<(u32, u32)> = locations
            .iter()
            .map(|l| (l.range.start.line, l.range.start.character))
            .collect();
        // The declaration line is scanned like any other.
        assert_eq!(
            starts,
            vec![(2, 8), (3, 2), (7, 2), (9, 11), (9, 37)]
        );
    }

    #[test]
    fn test_use_on_declaration_line() {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/inline.proto").unwrap();
        store.open(&uri, "message Foo { Foo next = 1; }\nmessage Bar { Foo f = 1; }\n");
        let finder = ReferenceFinder::new(&store);

        let starts = |locations: Vec<Location>| -> Vec<(u32, u32)> {
            locations
                .iter()
                .map(|l| (l.range.start.line, l.range.start.character))
                .collect()
        };
        assert_eq!(
            starts(finder.find_at(&uri, Position::new(1, 15), false).unwrap()),
            vec![(0, 8), (0, 14), (1, 14)]
        );
        assert_eq!(
            starts(finder.find_at(&uri, Position::new(1, 15), true).unwrap()),
            vec![(0, 8), (1, 14)]
        );
    }

    #[test]
    fn test_unresolved_word_is_searched_as_text() {
        let (store, uri) = setup();
        let finder = ReferenceFinder::new(&store);
        // `foo` is a field name, not a type.
        let locations = finder.find_at(&uri, Position::new(7, 7), true).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(
            locations[0].range,
            Range::new(Position::new(7, 6), Position::new(7, 9))
        );
    }

    #[test]
    fn test_position_past_line_is_an_error() {
        let (store, uri) = setup();
        let finder = ReferenceFinder::new(&store);
        let err = finder.find_at(&uri, Position::new(3, 80), false).unwrap_err();
        assert!(matches!(err, LspError::PositionOutOfRange { .. }));
    }
}
