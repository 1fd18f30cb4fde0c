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

//! Property-based tests for protols-lsp text scanning and query entry points.
//!
//! # Property Categories
//!
//! 1. **Crash Resistance**: no panics on any line or cursor position
//! 2. **Whole-Word Matching**: every reported match is a bounded occurrence

use protols_lsp::completion::get_completions;
use protols_lsp::deadline::Deadline;
use protols_lsp::document_store::DocumentStore;
use protols_lsp::hover::get_hover;
use protols_lsp::utils::{find_whole_word, is_identifier_char, word_at};
use proptest::prelude::*;
use tower_lsp::lsp_types::*;

proptest! {
    #[test]
    fn prop_word_at_never_panics(line in ".*", index in 0usize..200, include_dot in any::<bool>()) {
        if let Some((word, start, end)) = word_at(&line, index, include_dot) {
            prop_assert!(start <= end);
            prop_assert_eq!(&line[start..end], word);
        }
    }

    #[test]
    fn prop_find_whole_word_matches_are_bounded(line in ".*", word in "[A-Za-z_][A-Za-z0-9_]{0,6}") {
        let bytes = line.as_bytes();
        for start in find_whole_word(&line, &word) {
            let end = start + word.len();
            prop_assert_eq!(&line[start..end], word.as_str());
            prop_assert!(start == 0 || !is_identifier_char(bytes[start - 1]));
            prop_assert!(end == bytes.len() || !is_identifier_char(bytes[end]));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_queries_never_panic(
        content in "(syntax = \"proto3\";\n)?(message [A-Z][a-z]{0,5} \\{\n)?.{0,40}\n?\\}?",
        line in 0u32..6,
        character in 0u32..60
    ) {
        let store = DocumentStore::default();
        let uri = Url::parse("file:///protols-test/prop.proto").unwrap();
        store.open(&uri, &content);
        let position = Position::new(line, character);
        let _ = get_hover(&store, &uri, position);
        let _ = get_completions(&store, &uri, position, None, Deadline::none());
    }
}
