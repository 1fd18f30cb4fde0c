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

//! Go-to-definition.
//!
//! # Sources
//!
//! - **Import lines**: the imported document itself.
//! - **Schema files**: the declarations the word under the cursor resolves
//!   to, qualifier included.
//! - **Generated headers** (`.pb.h`): the header is mapped back to its
//!   schema file and the bare word under the cursor is looked up there.

use crate::constants::{PB_HEADER_SUFFIX, POSITION_ZERO, PROTO_SUFFIX};
use crate::document_store::DocumentStore;
use crate::error::{LspError, LspResult};
use crate::import_resolver::{path_to_uri, uri_to_path};
use crate::resolver::{cursor_token, is_import_line, Symbol, SymbolResolver};
use std::path::PathBuf;
use tower_lsp::lsp_types::{Location, Position, Range, Url};
use tracing::debug;

/// Definition locations for the word at `position`.
///
/// # Arguments
///
/// * `generated_dirs` - output prefixes stripped when mapping a generated
///   header to its schema file
///
/// # Error Handling
///
/// Any `LspError` means "no definition"; the caller answers with an empty
/// result.
pub fn goto_definition(
    store: &DocumentStore,
    uri: &Url,
    position: Position,
    generated_dirs: &[String],
) -> LspResult<Vec<Location>> {
    if uri.path().ends_with(PB_HEADER_SUFFIX) {
        return header_definition(store, uri, position, generated_dirs);
    }

    let doc = store.get(uri)?;
    let line = doc
        .line(position.line as usize)
        .ok_or(LspError::PositionOutOfRange {
            line: position.line,
            character: position.character,
        })?;

    if is_import_line(&line) {
        let path = quoted_path(&line)
            .ok_or_else(|| LspError::SymbolNotFound(line.trim().to_string()))?;
        let target = store.resolver().resolve(uri, path)?;
        let start = Position::new(POSITION_ZERO, POSITION_ZERO);
        return Ok(vec![Location::new(target, Range::new(start, start))]);
    }

    let symbols = SymbolResolver::new(store).resolve(uri, position.line, position.character, true)?;
    Ok(symbols.iter().map(Symbol::location).collect())
}

/// The string literal of an import line.
fn quoted_path(line: &str) -> Option<&str> {
    let quote = line.find(['"', '\''])?;
    let delimiter = line[quote..].chars().next()?;
    let rest = &line[quote + 1..];
    rest.find(delimiter).map(|end| &rest[..end])
}

/// Schema file generated into `header`.
///
/// The first generated-output prefix found in the path is removed, then the
/// header suffix is swapped for `.proto`.
pub fn header_to_proto(header: &Url, generated_dirs: &[String]) -> LspResult<Url> {
    let path = uri_to_path(header)?;
    let mut text = path.to_string_lossy().into_owned();
    if let Some(prefix) = generated_dirs
        .iter()
        .find(|prefix| !prefix.is_empty() && text.contains(prefix.as_str()))
    {
        text = text.replacen(prefix.as_str(), "", 1);
    }
    let stem = text
        .strip_suffix(PB_HEADER_SUFFIX)
        .ok_or_else(|| LspError::InvalidUri(header.to_string()))?;
    path_to_uri(&PathBuf::from(format!("{}{}", stem, PROTO_SUFFIX)))
}

fn header_definition(
    store: &DocumentStore,
    uri: &Url,
    position: Position,
    generated_dirs: &[String],
) -> LspResult<Vec<Location>> {
    let header = store.get(uri)?;
    let word = cursor_token(&header, position, false)?.text;
    let proto = header_to_proto(uri, generated_dirs)?;
    debug!("Mapped {} to {} for {:?}", uri, proto, word);

    let schema = store
        .get(&proto)?
        .schema()
        .cloned()
        .ok_or_else(|| LspError::SymbolNotFound(word.clone()))?;
    let resolver = SymbolResolver::new(store);

    let mut symbols = resolver.resolve_name(&proto, &schema, None, &word);
    if symbols.is_empty() && word.contains('_') {
        // Nested types are generated as `Outer_Inner`.
        symbols = resolver.resolve_name(&proto, &schema, None, &word.replace('_', "."));
        if symbols.is_empty() {
            let first = word.split('_').next().unwrap_or_default();
            symbols = resolver.resolve_name(&proto, &schema, None, first);
        }
    }
    if symbols.is_empty() {
        return Err(LspError::SymbolNotFound(word));
    }
    Ok(symbols.iter().map(Symbol::location).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_path() {
        assert_eq!(quoted_path("import \"a/b.proto\";"), Some("a/b.proto"));
        assert_eq!(quoted_path("import public 'c.proto';"), Some("c.proto"));
        assert_eq!(quoted_path("import "), None);
    }

    #[test]
    fn test_header_to_proto_strips_prefix() {
        let header = Url::parse(
            "file:///ws/bazel-out/local_linux-fastbuild/genfiles/shop/order.pb.h",
        )
        .unwrap();
        let dirs = vec!["bazel-out/local_linux-fastbuild/genfiles/".to_string()];
        assert_eq!(
            header_to_proto(&header, &dirs).unwrap().as_str(),
            "file:///ws/shop/order.proto"
        );
    }

    #[test]
    fn test_header_to_proto_sibling() {
        let header = Url::parse("file:///ws/shop/order.pb.h").unwrap();
        assert_eq!(
            header_to_proto(&header, &[]).unwrap().as_str(),
            "file:///ws/shop/order.proto"
        );
    }

    #[test]
    fn test_definition_in_same_file() {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/def.proto").unwrap();
        store.open(&uri, "message A {}\nmessage B {\n  A a = 1;\n}\n");
        let locations = goto_definition(&store, &uri, Position::new(2, 2), &[]).unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].uri, uri);
        assert_eq!(
            locations[0].range,
            Range::new(Position::new(0, 8), Position::new(0, 9))
        );
    }

    #[test]
    fn test_unresolved_import_line() {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/def.proto").unwrap();
        store.open(&uri, "import \"missing_5f1e.proto\";\n");
        let err = goto_definition(&store, &uri, Position::new(0, 10), &[]).unwrap_err();
        assert!(matches!(err, LspError::ImportNotFound { .. }));
    }
}
