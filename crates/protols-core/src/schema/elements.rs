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

//! Leaf declarations shared by the parser output and the schema model.
//!
//! Every `pos` field is the position of the declared *name*, not of the
//! leading keyword, so editors can highlight exactly the identifier.

use crate::span::SourcePos;
use std::fmt;

/// `package foo.bar;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub pos: SourcePos,
}

/// Visibility of an import declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ImportKind {
    #[default]
    Normal,
    /// Re-exported to the importers of the importing file.
    Public,
    /// Accepted for compatibility; resolved like a normal import.
    Weak,
}

impl ImportKind {
    pub fn is_public(self) -> bool {
        self == ImportKind::Public
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Public => write!(f, "public"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

/// `import public "path/to/file.proto";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Import path with the quotes removed.
    pub path: String,
    pub kind: ImportKind,
    /// Position of the path string literal.
    pub pos: SourcePos,
}

/// `option name = value;` or one entry of a `[name = value]` list.
///
/// Values are kept as written; aggregate values keep their braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    pub name: String,
    pub value: String,
    pub pos: SourcePos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLabel {
    Optional,
    Repeated,
    Required,
}

impl FieldLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldLabel::Optional => "optional",
            FieldLabel::Repeated => "repeated",
            FieldLabel::Required => "required",
        }
    }
}

/// A normal (non-map) field, inside a message, oneof or extend block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: Option<FieldLabel>,
    /// Type as written, possibly dotted or with a leading dot.
    pub type_name: String,
    pub type_pos: SourcePos,
    pub name: String,
    pub number: i64,
    pub pos: SourcePos,
    pub options: Vec<OptionDecl>,
    pub comments: Vec<String>,
    pub inline_comment: Option<String>,
}

impl Field {
    pub fn is_repeated(&self) -> bool {
        self.label == Some(FieldLabel::Repeated)
    }

    pub fn is_optional(&self) -> bool {
        self.label == Some(FieldLabel::Optional)
    }
}

/// `map<KeyType, ValueType> name = N;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapField {
    pub key_type: String,
    pub value_type: String,
    pub value_type_pos: SourcePos,
    pub name: String,
    pub number: i64,
    pub pos: SourcePos,
    pub options: Vec<OptionDecl>,
    pub comments: Vec<String>,
    pub inline_comment: Option<String>,
}

/// `oneof name { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oneof {
    pub name: String,
    pub pos: SourcePos,
    pub fields: Vec<Field>,
    pub options: Vec<OptionDecl>,
    pub comments: Vec<String>,
}

/// `NAME = N [options];` inside an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub number: i64,
    pub pos: SourcePos,
    pub options: Vec<OptionDecl>,
    pub comments: Vec<String>,
    pub inline_comment: Option<String>,
}

/// Request or response type of an RPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcType {
    pub name: String,
    pub streaming: bool,
    pub pos: SourcePos,
}

impl fmt::Display for RpcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.streaming {
            write!(f, "stream {}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// `rpc Name (Request) returns (Response);`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpc {
    pub name: String,
    pub pos: SourcePos,
    pub request: RpcType,
    pub response: RpcType,
    pub options: Vec<OptionDecl>,
    pub comments: Vec<String>,
}

/// `extend Extendee { fields }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extend {
    pub extendee: String,
    pub pos: SourcePos,
    pub fields: Vec<Field>,
}
