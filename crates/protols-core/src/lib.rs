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

//! Core parser and schema model for Protocol Buffers files.
//!
//! This crate turns the text of one `.proto` file into an immutable,
//! indexed [`Schema`]. It knows nothing about other files: import
//! resolution and cross-file lookups live in `protols-lsp`.
//!
//! # Pipeline
//!
//! - [`lexer`]: logos tokenizer with a comment side table
//! - [`parse_file`]: recursive descent into the [`ast`] declaration tree
//! - [`Schema`]: arenas plus name and line indexes built from the tree
//!
//! Errors carry 1-based line and column positions (see [`ParseError`]).

pub mod ast;
mod error;
pub mod lexer;
mod parser;
pub mod schema;
mod span;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use parser::{parse, parse_file};
pub use schema::{
    Entity, Enum, EnumId, EnumValue, Extend, Field, FieldLabel, Import, ImportKind, MapField,
    Message, MessageId, Oneof, OptionDecl, Package, Rpc, RpcType, Schema, Service,
};
pub use span::{LineIndex, SourcePos, Span};
