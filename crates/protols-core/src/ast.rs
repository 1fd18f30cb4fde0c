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

//! Declaration tree produced by the parser.
//!
//! The tree owns its children directly. [`crate::Schema`] flattens it into
//! arenas and indexes by matching over the closed element enums below.

use crate::schema::{EnumValue, Extend, Field, Import, MapField, Oneof, OptionDecl, Package, Rpc};
use crate::span::{SourcePos, Span};

/// A whole parsed file, items in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub items: Vec<Item>,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Syntax(String),
    Edition(String),
    Package(Package),
    Import(Import),
    Option(OptionDecl),
    Message(MessageDecl),
    Enum(EnumDecl),
    Service(ServiceDecl),
    Extend(Extend),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDecl {
    pub name: String,
    pub pos: SourcePos,
    /// From the `message` keyword to the closing brace.
    pub span: Span,
    pub comments: Vec<String>,
    pub elements: Vec<MessageElement>,
}

/// A statement inside a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageElement {
    Field(Field),
    Map(MapField),
    Oneof(Oneof),
    Message(MessageDecl),
    Enum(EnumDecl),
    /// proto2 group: a field plus the nested message it declares.
    Group(Field, MessageDecl),
    Option(OptionDecl),
    Extend(Extend),
    Reserved(SourcePos),
    Extensions(SourcePos),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: String,
    pub pos: SourcePos,
    pub span: Span,
    pub comments: Vec<String>,
    pub values: Vec<EnumValue>,
    pub options: Vec<OptionDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDecl {
    pub name: String,
    pub pos: SourcePos,
    pub span: Span,
    pub comments: Vec<String>,
    pub elements: Vec<ServiceElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceElement {
    Rpc(Rpc),
    Option(OptionDecl),
}
