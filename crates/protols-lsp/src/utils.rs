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

//! Text, path and position helpers shared by the query modules.

use crate::constants::LINE_NUMBER_OFFSET;
use protols_core::SourcePos;
use std::path::{Component, Path, PathBuf};
use tower_lsp::lsp_types::{Position, Range};

/// Safely get a string slice up to a byte position, rounding down to a
/// UTF-8 character boundary.
///
/// # Example
///
/// ```
/// use protols_lsp::utils::safe_slice_to;
///
/// let s = "Hello 世界";
/// assert_eq!(safe_slice_to(s, 7), "Hello ");
/// ```
pub fn safe_slice_to(s: &str, byte_pos: usize) -> &str {
    if byte_pos >= s.len() {
        return s;
    }
    let mut pos = byte_pos;
    while pos > 0 && !s.is_char_boundary(pos) {
        pos -= 1;
    }
    &s[..pos]
}

/// Identifier characters: `[A-Za-z0-9_]`.
#[inline]
pub fn is_identifier_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// The maximal run of identifier characters (plus `.` when `include_dot`)
/// around byte `index` of `line`.
///
/// `index` is clamped into the line. When it lands just past a word, the
/// word to its left is used. Returns the word and its byte range.
pub fn word_at(line: &str, index: usize, include_dot: bool) -> Option<(&str, usize, usize)> {
    let bytes = line.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let is_word = |b: u8| is_identifier_char(b) || (include_dot && b == b'.');

    let mut idx = index.min(bytes.len() - 1);
    if !is_word(bytes[idx]) {
        if idx > 0 && is_word(bytes[idx - 1]) {
            idx -= 1;
        } else {
            return None;
        }
    }

    let mut start = idx;
    while start > 0 && is_word(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = idx;
    while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
    }
    Some((&line[start..end], start, end))
}

/// Byte offsets of every whole-word occurrence of `word` in `line`.
///
/// An occurrence counts only if the bytes on both sides are not
/// identifier characters.
pub fn find_whole_word(line: &str, word: &str) -> Vec<usize> {
    let mut found = Vec::new();
    if word.is_empty() {
        return found;
    }
    let bytes = line.as_bytes();
    let mut from = 0;
    while let Some(offset) = line[from..].find(word) {
        let start = from + offset;
        let end = start + word.len();
        let clear_before = start == 0 || !is_identifier_char(bytes[start - 1]);
        let clear_after = end >= bytes.len() || !is_identifier_char(bytes[end]);
        if clear_before && clear_after {
            found.push(start);
        }
        // Step one character, not one byte, so the next slice stays on a boundary.
        from = start + line[start..].chars().next().map_or(1, char::len_utf8);
        if from >= line.len() {
            break;
        }
    }
    found
}

/// Removes `.` and resolves `..` without touching the filesystem.
///
/// `..` above the root is dropped.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Widens every byte to the code point of the same value (Latin-1 decoding).
pub fn widen_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes file content, widening bytes when it is not valid UTF-8.
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => widen_bytes(err.as_bytes()),
    }
}

/// Converts a 1-based parser position into a 0-based LSP position.
pub fn to_lsp_position(pos: SourcePos) -> Position {
    Position {
        line: pos.line().saturating_sub(LINE_NUMBER_OFFSET),
        character: pos.column().saturating_sub(1),
    }
}

/// Single-line range starting at `pos` and spanning `len` bytes.
pub fn name_range(pos: SourcePos, len: usize) -> Range {
    let start = to_lsp_position(pos);
    Range {
        start,
        end: Position {
            line: start.line,
            character: start.character + len as u32,
        },
    }
}
