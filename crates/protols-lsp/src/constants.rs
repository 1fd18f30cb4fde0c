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

//! Fixed tables and magic numbers used across the server.
//!
//! # Organization
//!
//! - **Timing**: request deadlines
//! - **File Identity**: suffixes and generated-output prefixes
//! - **Completion**: the static keyword table
//! - **Position Conversion**: 1-based parser positions vs 0-based LSP positions

// ============================================================================
// Timing
// ============================================================================

/// Deadline for one completion request (in milliseconds).
///
/// Completion walks every import of the current file, loading unopened files
/// from disk. Past this budget the items gathered so far are returned.
pub const COMPLETION_DEADLINE_MS: u64 = 500;

// ============================================================================
// File Identity
// ============================================================================

/// Suffix of schema source files.
pub const PROTO_SUFFIX: &str = ".proto";

/// Suffix of generated C++ headers that map back to a schema file.
pub const PB_HEADER_SUFFIX: &str = ".pb.h";

/// Generated-output prefix stripped from header paths when no
/// `generated-dirs` setting is supplied.
pub const DEFAULT_GENERATED_DIR: &str = "bazel-out/local_linux-fastbuild/genfiles/";

/// External formatter invoked for formatting requests.
pub const DEFAULT_FORMATTER: &str = "clang-format";

/// Log file name under the home directory when `--logs` is not given.
pub const DEFAULT_LOG_FILE: &str = ".protols.log";

// ============================================================================
// Completion
// ============================================================================

/// Scalar types and language keywords offered on invoked completion.
pub static KEYWORDS: &[&str] = &[
    "string", "bytes", "double", "float", "int32", "int64", "uint32", "uint64", "sint32",
    "sint64", "fixed32", "fixed64", "sfixed32", "sfixed64", "bool", "message", "enum", "service",
    "rpc", "optional", "repeated", "required", "option", "default", "syntax", "package", "import",
    "extend", "oneof", "map", "reserved",
];

/// Characters that trigger completion without an explicit request.
pub static TRIGGER_CHARACTERS: &[&str] = &["."];

// ============================================================================
// Position Conversion
// ============================================================================

/// Offset between parser lines (1-based) and LSP lines (0-based).
///
/// **Usage**: `lsp_line = parser_line - LINE_NUMBER_OFFSET`
pub const LINE_NUMBER_OFFSET: u32 = 1;

/// Zero-based position start index.
pub const POSITION_ZERO: u32 = 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_table_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for keyword in KEYWORDS {
            assert!(seen.insert(keyword), "duplicate keyword {}", keyword);
        }
        assert!(KEYWORDS.contains(&"int32"));
        assert!(KEYWORDS.contains(&"message"));
    }

    #[test]
    fn test_reasonable_deadline() {
        assert!(COMPLETION_DEADLINE_MS >= 100, "deadline too short to load imports");
        assert!(COMPLETION_DEADLINE_MS <= 2000, "deadline too long, will feel laggy");
    }

    #[test]
    fn test_suffixes() {
        assert!(PROTO_SUFFIX.starts_with('.'));
        assert!(PB_HEADER_SUFFIX.ends_with(".h"));
        assert!(DEFAULT_GENERATED_DIR.ends_with('/'));
    }

    #[test]
    fn test_position_constants() {
        assert_eq!(LINE_NUMBER_OFFSET, 1, "LSP uses 0-based, parser uses 1-based");
        assert_eq!(POSITION_ZERO, 0, "LSP positions are 0-indexed");
    }
}
