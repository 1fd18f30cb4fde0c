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

//! Cross-file resolution tests for protols-lsp
//!
//! Every test lays out real files in a temporary directory so that import
//! paths go through the same ancestor walk the server uses.

use protols_lsp::deadline::Deadline;
use protols_lsp::document_store::DocumentStore;
use protols_lsp::error::LspError;
use protols_lsp::import_resolver::{path_to_uri, ImportResolver};
use protols_lsp::resolver::SymbolResolver;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower_lsp::lsp_types::*;

// ============================================================================
// TEST HELPERS
// ============================================================================

struct Workspace {
    dir: TempDir,
    store: DocumentStore,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            store: DocumentStore::default(),
        }
    }

    fn with_roots(roots: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let roots = roots.iter().map(|r| dir.path().join(r)).collect();
        Self {
            dir,
            store: DocumentStore::new(Arc::new(ImportResolver::new(roots))),
        }
    }

    /// Writes `text` to `relative` and returns its uri without caching it.
    fn write(&self, relative: &str, text: &str) -> Url {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path_to_uri(&path).unwrap()
    }

    /// Writes `text` to `relative` and opens it in the store.
    fn open(&self, relative: &str, text: &str) -> Url {
        let uri = self.write(relative, text);
        assert!(self.store.open(&uri, text).is_none(), "{} should parse", relative);
        uri
    }

    fn resolve(&self, uri: &Url, line: u32, character: u32) -> Result<Vec<Location>, LspError> {
        SymbolResolver::new(&self.store)
            .resolve(uri, line, character, true)
            .map(|symbols| symbols.iter().map(|s| s.location()).collect())
    }
}

fn range(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

// ============================================================================
// SAME DOCUMENT
// ============================================================================

#[test]
fn test_top_level_declarations_resolve_to_their_name() {
    let ws = Workspace::new();
    let uri = ws.open(
        "shop.proto",
        r#"syntax = "proto3";
package shop;

message Order {}
enum State { STATE_UNSPECIFIED = 0; }
message Cart {
  Order order = 1;
  State state = 2;
}
"#,
    );

    let order = ws.resolve(&uri, 6, 3).unwrap();
    assert_eq!(order, vec![Location::new(uri.clone(), range(3, 8, 13))]);

    let state = ws.resolve(&uri, 7, 2).unwrap();
    assert_eq!(state, vec![Location::new(uri.clone(), range(4, 5, 10))]);
}

#[test]
fn test_nested_declaration_shadows_top_level() {
    let ws = Workspace::new();
    let uri = ws.open(
        "nested.proto",
        r#"syntax = "proto3";
message Item {}
message Box {
  message Item {}
  Item item = 1;
}
message Crate {
  Item item = 1;
}
"#,
    );

    // Inside Box the nested Item wins.
    assert_eq!(
        ws.resolve(&uri, 4, 2).unwrap(),
        vec![Location::new(uri.clone(), range(3, 10, 14))]
    );
    // Outside it, the top-level one.
    assert_eq!(
        ws.resolve(&uri, 7, 2).unwrap(),
        vec![Location::new(uri.clone(), range(1, 8, 12))]
    );
}

#[test]
fn test_duplicate_names_are_all_returned() {
    let ws = Workspace::new();
    let uri = ws.open(
        "dup.proto",
        "syntax = \"proto3\";\nmessage A {}\nmessage A {}\nmessage B {\n  A a = 1;\n}\n",
    );
    assert_eq!(ws.resolve(&uri, 4, 2).unwrap().len(), 2);
}

// ============================================================================
// ACROSS IMPORTS
// ============================================================================

#[test]
fn test_qualified_name_from_parent_package() {
    let ws = Workspace::new();
    let a = ws.write("a.proto", "syntax = \"proto3\";\npackage a;\nmessage Foo {}\n");
    let b = ws.open(
        "b.proto",
        r#"syntax = "proto3";
package a.b;
import "a.proto";
message Bar {
  a.Foo foo = 1;
}
"#,
    );

    assert_eq!(
        ws.resolve(&b, 4, 4).unwrap(),
        vec![Location::new(a, range(2, 8, 11))]
    );
}

#[test]
fn test_unimported_document_is_not_searched() {
    let ws = Workspace::new();
    ws.open("other.proto", "syntax = \"proto3\";\npackage x;\nmessage Foo {}\n");
    let c = ws.open(
        "c.proto",
        "syntax = \"proto3\";\npackage x;\nmessage Bar {\n  Foo foo = 1;\n}\n",
    );

    let err = ws.resolve(&c, 3, 2).unwrap_err();
    assert!(matches!(err, LspError::SymbolNotFound(_)));
    assert!(err.is_not_found());
}

#[test]
fn test_relative_qualifier() {
    let ws = Workspace::new();
    let dependency = ws.write(
        "common/some/dependency.proto",
        "syntax = \"proto3\";\npackage common.some.dependency;\nmessage Item {}\n",
    );
    let user = ws.open(
        "common/user.proto",
        r#"syntax = "proto3";
package common.user;
import "common/some/dependency.proto";
message User {
  some.dependency.Item item = 1;
}
"#,
    );

    assert_eq!(
        ws.resolve(&user, 4, 10).unwrap(),
        vec![Location::new(dependency, range(2, 8, 12))]
    );
}

#[test]
fn test_public_import_is_transitive() {
    let ws = Workspace::new();
    let b = ws.write("b.proto", "syntax = \"proto3\";\npackage b;\nmessage Type {}\n");
    ws.write(
        "a.proto",
        "syntax = \"proto3\";\npackage a;\nimport public \"b.proto\";\n",
    );
    let c = ws.open(
        "c.proto",
        r#"syntax = "proto3";
package c;
import "a.proto";
message User {
  b.Type kind = 1;
}
"#,
    );

    assert_eq!(
        ws.resolve(&c, 4, 5).unwrap(),
        vec![Location::new(b, range(2, 8, 12))]
    );
}

#[test]
fn test_plain_import_is_not_transitive() {
    let ws = Workspace::new();
    ws.write("b.proto", "syntax = \"proto3\";\npackage b;\nmessage Type {}\n");
    ws.write("a.proto", "syntax = \"proto3\";\npackage a;\nimport \"b.proto\";\n");
    let c = ws.open(
        "c.proto",
        "syntax = \"proto3\";\npackage c;\nimport \"a.proto\";\nmessage User {\n  b.Type kind = 1;\n}\n",
    );

    assert!(ws.resolve(&c, 4, 5).is_err());
}

#[test]
fn test_cyclic_public_imports_terminate() {
    let ws = Workspace::new();
    ws.write(
        "x.proto",
        "syntax = \"proto3\";\npackage x;\nimport public \"y.proto\";\n",
    );
    ws.write(
        "y.proto",
        "syntax = \"proto3\";\npackage y;\nimport public \"x.proto\";\n",
    );
    let z = ws.open(
        "z.proto",
        "syntax = \"proto3\";\npackage z;\nimport \"x.proto\";\nmessage M {\n  q.Missing m = 1;\n}\n",
    );

    assert!(matches!(
        ws.resolve(&z, 4, 4),
        Err(LspError::SymbolNotFound(_))
    ));
}

#[test]
fn test_nested_type_path_across_import() {
    let ws = Workspace::new();
    let outer = ws.write(
        "outer.proto",
        "syntax = \"proto3\";\npackage pkg;\nmessage Outer {\n  message Inner {}\n}\n",
    );
    let user = ws.open(
        "user.proto",
        "syntax = \"proto3\";\npackage app;\nimport \"outer.proto\";\nmessage M {\n  pkg.Outer.Inner inner = 1;\n}\n",
    );

    assert_eq!(
        ws.resolve(&user, 4, 14).unwrap(),
        vec![Location::new(outer, range(3, 10, 15))]
    );
}

#[test]
fn test_configured_root_wins_over_sibling() {
    let ws = Workspace::with_roots(&["vendor"]);
    let vendored = ws.write(
        "vendor/dep.proto",
        "syntax = \"proto3\";\npackage dep;\nmessage D {}\n",
    );
    ws.write(
        "src/dep.proto",
        "syntax = \"proto3\";\npackage dep;\nmessage D {}\n",
    );
    let main = ws.open(
        "src/main.proto",
        "syntax = \"proto3\";\npackage app;\nimport \"dep.proto\";\nmessage M {\n  dep.D d = 1;\n}\n",
    );

    assert_eq!(
        ws.resolve(&main, 4, 6).unwrap(),
        vec![Location::new(vendored, range(2, 8, 9))]
    );
}

#[test]
fn test_own_declaration_hides_same_package_import() {
    let ws = Workspace::new();
    let b = ws.write("b.proto", "syntax = \"proto3\";\npackage p;\nmessage Foo {}\n");
    let a = ws.open(
        "a.proto",
        "syntax = \"proto3\";\npackage p;\nimport \"b.proto\";\nmessage Foo {}\nmessage Bar {\n  Foo foo = 1;\n}\n",
    );

    assert_eq!(
        ws.resolve(&a, 5, 2).unwrap(),
        vec![Location::new(a.clone(), range(3, 8, 11))]
    );

    // Without a local declaration the import supplies it.
    let c = ws.open(
        "c.proto",
        "syntax = \"proto3\";\npackage p;\nimport \"b.proto\";\nmessage Bar {\n  Foo foo = 1;\n}\n",
    );
    assert_eq!(
        ws.resolve(&c, 4, 2).unwrap(),
        vec![Location::new(b, range(2, 8, 11))]
    );
}

#[test]
fn test_expired_deadline_skips_imports() {
    let ws = Workspace::new();
    let a = ws.write("a.proto", "syntax = \"proto3\";\npackage a;\nmessage Foo {}\n");
    let b = ws.open(
        "b.proto",
        "syntax = \"proto3\";\npackage a;\nimport \"a.proto\";\nmessage Local {}\nmessage Bar {\n  Foo foo = 1;\n  Local local = 2;\n}\n",
    );

    let expired = || SymbolResolver::new(&ws.store).with_deadline(Deadline::after(Duration::ZERO));
    assert!(matches!(
        expired().resolve(&b, 5, 2, true),
        Err(LspError::SymbolNotFound(_))
    ));
    // Local declarations need no import walk.
    assert_eq!(expired().resolve(&b, 6, 2, true).unwrap()[0].uri, b);

    let symbols = SymbolResolver::new(&ws.store).resolve(&b, 5, 2, true).unwrap();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].uri, a);
}

#[test]
fn test_import_line_is_not_resolved() {
    let ws = Workspace::new();
    ws.write("a.proto", "syntax = \"proto3\";\npackage a;\n");
    let b = ws.open("b.proto", "syntax = \"proto3\";\nimport \"a.proto\";\n");
    assert!(ws.resolve(&b, 1, 9).is_err());
}

#[test]
fn test_cursor_past_line_end() {
    let ws = Workspace::new();
    let uri = ws.open("short.proto", "syntax = \"proto3\";\nmessage A {}\n");
    assert!(matches!(
        ws.resolve(&uri, 1, 40),
        Err(LspError::PositionOutOfRange { .. })
    ));
    assert!(matches!(
        ws.resolve(&uri, 30, 0),
        Err(LspError::PositionOutOfRange { .. })
    ));
}
