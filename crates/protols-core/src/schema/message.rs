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

//! Message entities.

use super::elements::{Extend, Field, MapField, Oneof, OptionDecl};
use super::{EnumId, Entity};
use crate::span::{SourcePos, Span};
use std::collections::HashMap;
use std::fmt;

/// Index of a [`Message`] in its owning [`super::Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) usize);

impl MessageId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "message#{}", self.0)
    }
}

/// A message declaration, top-level or nested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub name: String,
    /// Position of the message name.
    pub pos: SourcePos,
    pub span: Span,
    pub comments: Vec<String>,
    pub fields: Vec<Field>,
    pub map_fields: Vec<MapField>,
    pub oneofs: Vec<Oneof>,
    pub nested_messages: Vec<MessageId>,
    pub nested_enums: Vec<EnumId>,
    pub options: Vec<OptionDecl>,
    pub extends: Vec<Extend>,
    /// Enclosing message, `None` at the top level.
    pub parent: Option<MessageId>,
    pub(crate) nested_names: HashMap<String, Vec<Entity>>,
}

impl Message {
    /// Nested messages and enums declared directly in this message under `name`,
    /// messages first.
    pub fn nested_named(&self, name: &str) -> &[Entity] {
        self.nested_names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }

    /// Every field including the ones inside oneof groups, in declaration order
    /// of the groups.
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .chain(self.oneofs.iter().flat_map(|o| o.fields.iter()))
    }
}
