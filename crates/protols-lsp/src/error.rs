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

//! Server-side error type.
//!
//! Every query handler converts these into an empty response; none of them
//! is surfaced to the editor as a protocol error.

use protols_core::ParseError;
use thiserror::Error;
use tower_lsp::lsp_types::Url;

#[derive(Debug, Error)]
pub enum LspError {
    #[error("document not found: {uri}: {reason}")]
    DocumentNotFound { uri: Url, reason: String },

    #[error("import {path:?} not found from {from}")]
    ImportNotFound { path: String, from: Url },

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("position {line}:{character} is outside the document")]
    PositionOutOfRange { line: u32, character: u32 },

    #[error("not a file uri: {0}")]
    InvalidUri(String),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("formatter failed: {0}")]
    Formatter(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl LspError {
    /// The recoverable "nothing there" family: callers answer with an empty
    /// result and log at debug level.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LspError::DocumentNotFound { .. }
                | LspError::ImportNotFound { .. }
                | LspError::SymbolNotFound(_)
                | LspError::PositionOutOfRange { .. }
        )
    }
}

pub type LspResult<T> = Result<T, LspError>;

#[cfg(test)]
mod tests {
    use super::*;
    use protols_core::SourcePos;

    #[test]
    fn test_not_found_classification() {
        assert!(LspError::SymbolNotFound("Foo".into()).is_not_found());
        assert!(LspError::PositionOutOfRange { line: 1, character: 99 }.is_not_found());
        assert!(!LspError::Settings("bad".into()).is_not_found());
        assert!(!LspError::Formatter("exit 1".into()).is_not_found());
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: LspError = ParseError::syntax("expected ';'", SourcePos::new(3, 4)).into();
        assert_eq!(err.to_string(), "SyntaxError at 3:4: expected ';'");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_import_display() {
        let from = Url::parse("file:///ws/a.proto").unwrap();
        let err = LspError::ImportNotFound {
            path: "b.proto".into(),
            from,
        };
        assert_eq!(err.to_string(), "import \"b.proto\" not found from file:///ws/a.proto");
    }
}
