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

//! Document cache and lifecycle.
//!
//! The store owns every parsed document, whether opened by the editor or
//! loaded from disk because some lookup needed it.
//!
//! # Responsibilities
//!
//! - Parsing on open and on every edit, keeping the last good schema when
//!   an edit does not parse
//! - Lazy loading of unopened files on first lookup
//! - Prefetching the direct imports of opened documents
//! - Evicting a document on close so later lookups see disk content
//!
//! # Design
//!
//! Entries are `Arc<Document>` values that are never mutated. Every edit
//! builds a new `Document` and swaps it into the map, so a caller holding
//! an older `Arc` keeps a consistent view until it drops it.
//!
//! - **Map lock**: a `parking_lot::RwLock` around the map. Readers hold it
//!   only for the lookup; writers only for the swap.
//! - **Edit lock**: a `parking_lot::Mutex` serializing writers so edits land
//!   in receipt order. Readers never take it.

use crate::error::{LspError, LspResult};
use crate::import_resolver::{uri_to_path, ImportResolver};
use crate::utils::decode_text;
use parking_lot::{Mutex, RwLock};
use protols_core::{ParseError, Schema};
use ropey::Rope;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, warn};

/// One cached document.
#[derive(Debug, Clone)]
pub struct Document {
    uri: Url,
    rope: Rope,
    content_hash: u64,
    /// Last schema that parsed; `None` if no parse has succeeded yet.
    schema: Option<Arc<Schema>>,
    /// Error of the most recent parse, if it failed.
    parse_error: Option<ParseError>,
    open: bool,
    saved: bool,
}

impl Document {
    fn build(uri: Url, text: &str, previous: Option<&Document>) -> Self {
        let started = Instant::now();
        let (schema, parse_error) = match protols_core::parse(text) {
            Ok(schema) => (Some(Arc::new(schema)), None),
            Err(err) => {
                let kept = previous.and_then(|doc| doc.schema.clone());
                warn!(
                    "Parse failed for {}: {} (keeping {} schema)",
                    uri,
                    err,
                    if kept.is_some() { "previous" } else { "no" }
                );
                (kept, Some(err))
            }
        };
        debug!(
            "Parsed {} ({} bytes) in {:?}",
            uri,
            text.len(),
            started.elapsed()
        );
        Self {
            uri,
            rope: Rope::from_str(text),
            content_hash: hash_content(text),
            schema,
            parse_error,
            open: previous.map_or(false, |doc| doc.open),
            saved: false,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    pub fn schema(&self) -> Option<&Arc<Schema>> {
        self.schema.as_ref()
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        self.parse_error.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line `index` (0-based) without its line terminator.
    pub fn line(&self, index: usize) -> Option<String> {
        if index >= self.rope.len_lines() {
            return None;
        }
        let mut line = self.rope.line(index).to_string();
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// All lines without terminators.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.rope.len_lines()).filter_map(move |i| self.line(i))
    }
}

/// Cache hit/miss counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub disk_loads: u64,
    pub evictions: u64,
    pub current_size: usize,
}

/// The identity-to-document cache.
pub struct DocumentStore {
    documents: RwLock<HashMap<Url, Arc<Document>>>,
    edit_lock: Mutex<()>,
    stats: Mutex<CacheStatistics>,
    resolver: Arc<ImportResolver>,
}

impl DocumentStore {
    pub fn new(resolver: Arc<ImportResolver>) -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            edit_lock: Mutex::new(()),
            stats: Mutex::new(CacheStatistics::default()),
            resolver,
        }
    }

    pub fn resolver(&self) -> &Arc<ImportResolver> {
        &self.resolver
    }

    pub fn statistics(&self) -> CacheStatistics {
        let mut stats = self.stats.lock().clone();
        stats.current_size = self.documents.read().len();
        stats
    }

    /// The cached document, loading and parsing it from disk on a miss.
    ///
    /// Bytes that are not valid UTF-8 are widened to code points. A file
    /// that does not parse is still cached, without a schema.
    ///
    /// # Error Handling
    ///
    /// Returns `LspError::DocumentNotFound` if the file cannot be read.
    pub fn get(&self, uri: &Url) -> LspResult<Arc<Document>> {
        if let Some(doc) = self.cached(uri) {
            self.stats.lock().hits += 1;
            return Ok(doc);
        }
        self.stats.lock().misses += 1;

        let path = uri_to_path(uri).map_err(|err| LspError::DocumentNotFound {
            uri: uri.clone(),
            reason: err.to_string(),
        })?;
        let bytes = std::fs::read(&path).map_err(|err| LspError::DocumentNotFound {
            uri: uri.clone(),
            reason: err.to_string(),
        })?;
        let text = decode_text(bytes);
        let doc = Arc::new(Document::build(uri.clone(), &text, None));
        debug!("Loaded {} from disk ({} bytes)", uri, text.len());

        let mut documents = self.documents.write();
        self.stats.lock().disk_loads += 1;
        // An open or edit that raced with the load wins.
        Ok(Arc::clone(
            documents.entry(uri.clone()).or_insert_with(|| doc),
        ))
    }

    /// The cached document without touching the disk.
    pub fn cached(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.read().get(uri).cloned()
    }

    /// The schema of `uri`, loading it if needed. `None` if the document
    /// cannot be read or has never parsed.
    pub fn schema(&self, uri: &Url) -> Option<Arc<Schema>> {
        match self.get(uri) {
            Ok(doc) => doc.schema().cloned(),
            Err(err) => {
                debug!("No schema for {}: {}", uri, err);
                None
            }
        }
    }

    /// Replaces the content of `uri`, or evicts it when `content` is `None`.
    ///
    /// # Returns
    ///
    /// The parse error of the new content, if it failed to parse. In that
    /// case the previous schema is kept.
    pub fn set_content(&self, uri: &Url, content: Option<&str>) -> Option<ParseError> {
        let _edit = self.edit_lock.lock();
        match content {
            Some(text) => self.replace(uri, text, None),
            None => {
                if self.documents.write().remove(uri).is_some() {
                    self.stats.lock().evictions += 1;
                    debug!("Evicted {}", uri);
                }
                None
            }
        }
    }

    /// Editor open: marks the document open, parses it, then loads its
    /// direct imports that are not cached yet.
    pub fn open(&self, uri: &Url, text: &str) -> Option<ParseError> {
        info!("Opened {}", uri);
        let error = {
            let _edit = self.edit_lock.lock();
            self.replace(uri, text, Some(true))
        };
        self.prefetch_imports(uri);
        error
    }

    /// Editor close: evicts the document, discarding unsaved edits.
    pub fn close(&self, uri: &Url) {
        info!("Closed {}", uri);
        self.set_content(uri, None);
    }

    /// Editor save: flags the cached document as saved.
    pub fn save(&self, uri: &Url) {
        let _edit = self.edit_lock.lock();
        let mut documents = self.documents.write();
        if let Some(doc) = documents.get_mut(uri) {
            let mut saved = Document::clone(doc);
            saved.saved = true;
            *doc = Arc::new(saved);
            debug!("Saved {}", uri);
        }
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.cached(uri).map_or(false, |doc| doc.is_open())
    }

    /// Snapshot of every cached document.
    pub fn documents(&self) -> Vec<Arc<Document>> {
        self.documents.read().values().cloned().collect()
    }

    /// Resolves `import_path` from `from` and fetches the target.
    pub fn import(&self, from: &Url, import_path: &str) -> LspResult<Arc<Document>> {
        let target = self.resolver.resolve(from, import_path)?;
        self.get(&target)
    }

    /// Parses outside the map lock, then swaps. Caller holds the edit lock.
    fn replace(&self, uri: &Url, text: &str, open: Option<bool>) -> Option<ParseError> {
        let previous = self.cached(uri);
        let hash = hash_content(text);

        let mut doc = match &previous {
            Some(prev) if prev.content_hash == hash => {
                debug!("Content unchanged for {} (hash: {:#x})", uri, hash);
                Document::clone(prev)
            }
            prev => Document::build(uri.clone(), text, prev.as_deref()),
        };
        if let Some(open) = open {
            doc.open = open;
        }
        let error = doc.parse_error.clone();
        self.documents.write().insert(uri.clone(), Arc::new(doc));
        error
    }

    fn prefetch_imports(&self, uri: &Url) {
        let Some(schema) = self.cached(uri).and_then(|doc| doc.schema().cloned()) else {
            return;
        };
        for import in schema.imports() {
            match self.import(uri, &import.path) {
                Ok(doc) => debug!("Prefetched {} for {}", doc.uri(), uri),
                Err(err) => debug!("Prefetch of {:?} for {} skipped: {}", import.path, uri, err),
            }
        }
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new(Arc::new(ImportResolver::default()))
    }
}

/// Compute a simple hash for change detection.
fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
