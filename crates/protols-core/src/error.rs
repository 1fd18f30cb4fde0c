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

//! Error types for proto parsing.

use crate::span::SourcePos;
use std::fmt;
use thiserror::Error;

/// The kind of error that occurred during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Unexpected token or structural violation.
    Syntax,
    /// Input ended inside a declaration.
    UnexpectedEof,
    /// Character sequence the lexer does not recognize.
    InvalidToken,
    /// Integer literal out of range or malformed.
    InvalidNumber,
    /// Declaration that may appear only once (package, syntax).
    Duplicate,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "SyntaxError"),
            Self::UnexpectedEof => write!(f, "UnexpectedEof"),
            Self::InvalidToken => write!(f, "InvalidToken"),
            Self::InvalidNumber => write!(f, "InvalidNumber"),
            Self::Duplicate => write!(f, "DuplicateDeclaration"),
        }
    }
}

/// An error that occurred while parsing a proto file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {line}:{column}: {message}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub column: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            kind,
            message: message.into(),
            line: pos.line(),
            column: pos.column(),
        }
    }

    pub fn syntax(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(ParseErrorKind::Syntax, message, pos)
    }

    pub fn eof(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, message, pos)
    }

    pub fn invalid_token(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(ParseErrorKind::InvalidToken, message, pos)
    }

    pub fn invalid_number(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(ParseErrorKind::InvalidNumber, message, pos)
    }

    pub fn duplicate(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(ParseErrorKind::Duplicate, message, pos)
    }

    /// Position the error points at.
    pub fn pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.column)
    }
}

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::syntax("expected ';'", SourcePos::new(4, 12));
        assert_eq!(err.to_string(), "SyntaxError at 4:12: expected ';'");
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ParseErrorKind::UnexpectedEof.to_string(), "UnexpectedEof");
        assert_eq!(ParseErrorKind::Duplicate.to_string(), "DuplicateDeclaration");
    }

    #[test]
    fn test_error_pos_roundtrip() {
        let err = ParseError::eof("unterminated message", SourcePos::new(9, 1));
        assert_eq!(err.pos(), SourcePos::new(9, 1));
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }
}
