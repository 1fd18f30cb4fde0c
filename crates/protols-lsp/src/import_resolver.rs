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

//! Maps an import string to the document it names.
//!
//! # Search Order
//!
//! 1. Every configured search root, in configuration order.
//! 2. The directory of the importing document, then each of its ancestors
//!    up to and including the filesystem root.
//!
//! The first candidate that exists on disk wins. Candidates are normalized
//! lexically, so `a/../b.proto` and `b.proto` map to the same URI.

use crate::error::{LspError, LspResult};
use crate::utils::normalize_path;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tower_lsp::lsp_types::Url;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ImportResolver {
    roots: RwLock<Vec<PathBuf>>,
}

impl ImportResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots: RwLock::new(roots),
        }
    }

    /// Replaces the configured search roots.
    pub fn set_roots(&self, roots: Vec<PathBuf>) {
        debug!("Import search roots: {:?}", roots);
        *self.roots.write() = roots;
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.read().clone()
    }

    /// Resolves `import_path` as written in the document `from`.
    ///
    /// # Error Handling
    ///
    /// - `from` is not a `file:` URI: `LspError::InvalidUri`
    /// - no candidate exists: `LspError::ImportNotFound`
    pub fn resolve(&self, from: &Url, import_path: &str) -> LspResult<Url> {
        let from_path = uri_to_path(from)?;
        let candidate = self
            .candidates(&from_path, import_path)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| LspError::ImportNotFound {
                path: import_path.to_string(),
                from: from.clone(),
            })?;
        debug!("Resolved import {:?} from {} to {}", import_path, from, candidate.display());
        path_to_uri(&candidate)
    }

    /// Every candidate path in search order, normalized.
    pub fn candidates(&self, from: &Path, import_path: &str) -> Vec<PathBuf> {
        let roots = self.roots.read();
        let ancestors = from.parent().into_iter().flat_map(Path::ancestors);
        roots
            .iter()
            .map(PathBuf::as_path)
            .chain(ancestors)
            .map(|dir| normalize_path(&dir.join(import_path)))
            .collect()
    }
}

/// Converts a `file:` URI into a local path.
pub fn uri_to_path(uri: &Url) -> LspResult<PathBuf> {
    uri.to_file_path()
        .map_err(|_| LspError::InvalidUri(uri.to_string()))
}

/// Converts a normalized local path into a `file:` URI.
pub fn path_to_uri(path: &Path) -> LspResult<Url> {
    Url::from_file_path(normalize_path(path))
        .map_err(|_| LspError::InvalidUri(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "syntax = \"proto3\";\n").unwrap();
        path
    }

    #[test]
    fn test_candidates_order() {
        let resolver = ImportResolver::new(vec![PathBuf::from("/r1"), PathBuf::from("/r2")]);
        let got = resolver.candidates(Path::new("/ws/a/b.proto"), "x/y.proto");
        assert_eq!(
            got,
            vec![
                PathBuf::from("/r1/x/y.proto"),
                PathBuf::from("/r2/x/y.proto"),
                PathBuf::from("/ws/a/x/y.proto"),
                PathBuf::from("/ws/x/y.proto"),
                PathBuf::from("/x/y.proto"),
            ]
        );
    }

    #[test]
    fn test_resolves_sibling() {
        let tmp = TempDir::new().unwrap();
        let from = touch(tmp.path(), "pkg/a.proto");
        let target = touch(tmp.path(), "pkg/b.proto");
        let resolver = ImportResolver::default();
        let uri = resolver
            .resolve(&path_to_uri(&from).unwrap(), "b.proto")
            .unwrap();
        assert_eq!(uri, path_to_uri(&target).unwrap());
    }

    #[test]
    fn test_resolves_through_ancestor() {
        let tmp = TempDir::new().unwrap();
        let from = touch(tmp.path(), "common/user/user.proto");
        let target = touch(tmp.path(), "common/some/dependency.proto");
        let resolver = ImportResolver::default();
        let uri = resolver
            .resolve(&path_to_uri(&from).unwrap(), "common/some/dependency.proto")
            .unwrap();
        assert_eq!(uri, path_to_uri(&target).unwrap());
    }

    #[test]
    fn test_configured_root_wins_over_ancestor() {
        let tmp = TempDir::new().unwrap();
        let from = touch(tmp.path(), "ws/a.proto");
        touch(tmp.path(), "ws/b.proto");
        let preferred = touch(tmp.path(), "third_party/b.proto");
        let resolver = ImportResolver::new(vec![tmp.path().join("third_party")]);
        let uri = resolver
            .resolve(&path_to_uri(&from).unwrap(), "b.proto")
            .unwrap();
        assert_eq!(uri, path_to_uri(&preferred).unwrap());
    }

    #[test]
    fn test_dot_segments_normalized() {
        let tmp = TempDir::new().unwrap();
        let from = touch(tmp.path(), "a/x.proto");
        let target = touch(tmp.path(), "b/y.proto");
        let resolver = ImportResolver::default();
        let uri = resolver
            .resolve(&path_to_uri(&from).unwrap(), "../b/./y.proto")
            .unwrap();
        assert_eq!(uri, path_to_uri(&target).unwrap());
    }

    #[test]
    fn test_missing_import() {
        let tmp = TempDir::new().unwrap();
        let from = touch(tmp.path(), "a.proto");
        let resolver = ImportResolver::default();
        let err = resolver
            .resolve(&path_to_uri(&from).unwrap(), "does/not/exist_4c1d.proto")
            .unwrap_err();
        assert!(matches!(err, LspError::ImportNotFound { .. }));
    }

    #[test]
    fn test_non_file_uri() {
        let resolver = ImportResolver::default();
        let uri = Url::parse("untitled:Untitled-1").unwrap();
        assert!(matches!(
            resolver.resolve(&uri, "a.proto"),
            Err(LspError::InvalidUri(_))
        ));
    }
}
