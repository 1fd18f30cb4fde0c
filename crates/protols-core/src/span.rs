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

//! Source position and span tracking.
//!
//! Positions are 1-based in both line and column, matching the way parse
//! errors are reported. Columns count bytes within the line, which is what
//! the editor-facing layer uses for its character offsets.
//!
//! # Examples
//!
//! ```
//! use protols_core::{LineIndex, SourcePos};
//!
//! let index = LineIndex::new("syntax = \"proto3\";\nmessage Foo {}\n");
//! assert_eq!(index.position(20), SourcePos::new(2, 2));
//! ```

use std::fmt;

/// A position in source code (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourcePos {
    line: u32,
    column: u32,
}

impl SourcePos {
    /// Creates a new source position.
    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Returns the line number (1-based).
    #[inline]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the column number (1-based, in bytes).
    #[inline]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based line, as used by the editor protocol.
    #[inline]
    pub const fn line0(&self) -> u32 {
        self.line.saturating_sub(1)
    }

    /// Zero-based column, as used by the editor protocol.
    #[inline]
    pub const fn column0(&self) -> u32 {
        self.column.saturating_sub(1)
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A range of source code from `start` to `end` (both inclusive positions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: SourcePos,
    pub end: SourcePos,
}

impl Span {
    #[inline]
    pub const fn new(start: SourcePos, end: SourcePos) -> Self {
        Self { start, end }
    }

    /// Returns true if the 1-based `line` falls within this span.
    #[inline]
    pub fn contains_line(&self, line: u32) -> bool {
        self.start.line() <= line && line <= self.end.line()
    }

    #[inline]
    pub fn is_single_line(&self) -> bool {
        self.start.line() == self.end.line()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Byte offset to line/column conversion table.
///
/// Built once per parse with a single `memchr` pass over the source.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; always begins with 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = Vec::with_capacity(source.len() / 32 + 1);
        line_starts.push(0);
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1));
        Self { line_starts }
    }

    /// Number of lines, counting a trailing empty line after a final newline.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a 1-based position.
    pub fn position(&self, offset: usize) -> SourcePos {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = offset - self.line_starts[line];
        SourcePos::new(line as u32 + 1, column as u32 + 1)
    }
}
