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

//! Concurrency tests for protols-lsp
//!
//! Readers resolve names while writers replace the same documents. A
//! reader must always see either the old or the new schema, never a
//! missing one, and no combination of operations may deadlock.

use protols_lsp::document_store::DocumentStore;
use protols_lsp::resolver::SymbolResolver;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tower_lsp::lsp_types::*;

fn sample_document(variant: usize) -> String {
    format!(
        "syntax = \"proto3\";\npackage load.v{};\nmessage Target {{}}\nmessage User{} {{\n  Target t = 1;\n}}\n",
        variant, variant
    )
}

fn test_uri(id: usize) -> Url {
    Url::parse(&format!("file:///protols-test/concurrent{}.proto", id)).unwrap()
}

#[test]
fn test_concurrent_opens_of_distinct_documents() {
    let store = Arc::new(DocumentStore::default());
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                assert!(store.open(&test_uri(i), &sample_document(i)).is_none());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.documents().len(), 10);
}

#[test]
fn test_readers_never_observe_missing_schema() {
    let store = Arc::new(DocumentStore::default());
    let uri = test_uri(0);
    store.open(&uri, &sample_document(0));

    let stop = Arc::new(AtomicBool::new(false));
    let resolved = Arc::new(AtomicUsize::new(0));

    let writer = {
        let store = Arc::clone(&store);
        let uri = uri.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut variant = 0;
            while !stop.load(Ordering::Relaxed) {
                variant += 1;
                store.set_content(&uri, Some(&sample_document(variant)));
                if variant % 7 == 0 {
                    // Unterminated message: the previous schema is kept.
                    let broken = sample_document(variant);
                    store.set_content(&uri, Some(broken.trim_end().trim_end_matches('}')));
                }
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let uri = uri.clone();
            let resolved = Arc::clone(&resolved);
            thread::spawn(move || {
                for _ in 0..200 {
                    let symbols = SymbolResolver::new(&store)
                        .resolve(&uri, 4, 2, true)
                        .unwrap();
                    assert_eq!(symbols.len(), 1);
                    assert_eq!(symbols[0].name(), "Target");
                    resolved.fetch_add(1, Ordering::Relaxed);
                }
            })
        })
        .collect();

    for reader in readers {
        reader.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
    assert_eq!(resolved.load(Ordering::Relaxed), 800);
}

#[test]
fn test_open_close_churn_does_not_deadlock() {
    let store = Arc::new(DocumentStore::default());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let uri = test_uri(i % 2);
                for round in 0..100 {
                    store.open(&uri, &sample_document(round));
                    store.save(&uri);
                    let _ = store.documents();
                    store.close(&uri);
                }
            })
        })
        .collect();

    let (tx, rx) = std::sync::mpsc::channel();
    thread::spawn(move || {
        for handle in handles {
            handle.join().unwrap();
        }
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(30))
        .expect("open/close churn deadlocked");
}
