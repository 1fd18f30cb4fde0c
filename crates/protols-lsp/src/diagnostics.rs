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

//! Parse errors as LSP diagnostics.

use crate::utils::to_lsp_position;
use protols_core::ParseError;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};

pub const SOURCE: &str = "protols";

/// One error diagnostic spanning the character at the error position.
pub fn parse_error_diagnostic(error: &ParseError) -> Diagnostic {
    let start = to_lsp_position(error.pos());
    Diagnostic {
        range: Range::new(start, Position::new(start.line, start.character + 1)),
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String(error.kind.to_string())),
        source: Some(SOURCE.to_string()),
        message: error.message.clone(),
        ..Default::default()
    }
}

/// Diagnostics for the outcome of a parse: empty when it succeeded.
pub fn diagnostics_for(error: Option<&ParseError>) -> Vec<Diagnostic> {
    error.map(parse_error_diagnostic).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use protols_core::SourcePos;

    #[test]
    fn test_position_is_zero_based() {
        let error = ParseError::syntax("expected ';'", SourcePos::new(4, 1));
        let diagnostic = parse_error_diagnostic(&error);
        assert_eq!(diagnostic.range.start, Position::new(3, 0));
        assert_eq!(diagnostic.range.end, Position::new(3, 1));
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diagnostic.message, "expected ';'");
        assert_eq!(
            diagnostic.code,
            Some(NumberOrString::String("SyntaxError".into()))
        );
    }

    #[test]
    fn test_diagnostics_for() {
        assert!(diagnostics_for(None).is_empty());
        let error = ParseError::duplicate("duplicate package declaration", SourcePos::new(2, 1));
        assert_eq!(diagnostics_for(Some(&error)).len(), 1);
    }
}
