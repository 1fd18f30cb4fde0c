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

//! Immutable, indexed model of one parsed proto file.
//!
//! # Layout
//!
//! Messages and enums at every nesting depth live in two arenas and are
//! addressed by [`MessageId`] / [`EnumId`]. A nested entity points at its
//! enclosing message through `parent`, which makes scope walks a simple
//! chain of index lookups.
//!
//! # Indexes
//!
//! - top-level name → ids (duplicates allowed, declaration order kept)
//! - start line → ids, ordered, for "innermost message containing line N"
//! - per message: nested name → ids
//!
//! A `Schema` is never mutated after [`Schema::from`] returns.

mod elements;
mod enumeration;
mod message;
mod service;

pub use elements::{
    EnumValue, Extend, Field, FieldLabel, Import, ImportKind, MapField, Oneof, OptionDecl,
    Package, Rpc, RpcType,
};
pub use enumeration::{Enum, EnumId};
pub use message::{Message, MessageId};
pub use service::Service;

use crate::ast::{self, EnumDecl, Item, MessageDecl, MessageElement, ServiceDecl, ServiceElement};
use crate::span::SourcePos;
use std::collections::{BTreeMap, HashMap};

/// A message or enum: the two kinds of named types a field can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Message(MessageId),
    Enum(EnumId),
}

impl Entity {
    pub fn as_message(self) -> Option<MessageId> {
        match self {
            Entity::Message(id) => Some(id),
            Entity::Enum(_) => None,
        }
    }

    pub fn as_enum(self) -> Option<EnumId> {
        match self {
            Entity::Enum(id) => Some(id),
            Entity::Message(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    syntax: Option<String>,
    edition: Option<String>,
    package: Option<Package>,
    imports: Vec<Import>,
    options: Vec<OptionDecl>,
    extends: Vec<Extend>,

    messages: Vec<Message>,
    enums: Vec<Enum>,
    services: Vec<Service>,

    top_level_messages: Vec<MessageId>,
    top_level_enums: Vec<EnumId>,

    message_names: HashMap<String, Vec<MessageId>>,
    enum_names: HashMap<String, Vec<EnumId>>,
    service_names: HashMap<String, Vec<usize>>,

    message_lines: BTreeMap<u32, Vec<MessageId>>,
    enum_lines: HashMap<u32, Vec<EnumId>>,
    service_lines: HashMap<u32, usize>,
}

impl Schema {
    // ------------------------------------------------------------------
    // File-level declarations
    // ------------------------------------------------------------------

    pub fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }

    pub fn edition(&self) -> Option<&str> {
        self.edition.as_deref()
    }

    pub fn package(&self) -> Option<&Package> {
        self.package.as_ref()
    }

    /// Declared package name, or `""` when the file has none.
    pub fn package_name(&self) -> &str {
        self.package.as_ref().map(|p| p.name.as_str()).unwrap_or("")
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn options(&self) -> &[OptionDecl] {
        &self.options
    }

    pub fn extends(&self) -> &[Extend] {
        &self.extends
    }

    // ------------------------------------------------------------------
    // Arena access
    // ------------------------------------------------------------------

    /// # Panics
    ///
    /// Panics if `id` was produced by a different schema.
    pub fn message(&self, id: MessageId) -> &Message {
        &self.messages[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was produced by a different schema.
    pub fn enumeration(&self, id: EnumId) -> &Enum {
        &self.enums[id.0]
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Top-level messages in declaration order.
    pub fn top_level_messages(&self) -> impl Iterator<Item = (MessageId, &Message)> {
        self.top_level_messages
            .iter()
            .map(move |&id| (id, self.message(id)))
    }

    /// Top-level enums in declaration order.
    pub fn top_level_enums(&self) -> impl Iterator<Item = (EnumId, &Enum)> {
        self.top_level_enums
            .iter()
            .map(move |&id| (id, self.enumeration(id)))
    }

    /// Messages at every depth, in arena order.
    pub fn all_messages(&self) -> impl Iterator<Item = (MessageId, &Message)> {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, m)| (MessageId(i), m))
    }

    /// Enums at every depth, in arena order.
    pub fn all_enums(&self) -> impl Iterator<Item = (EnumId, &Enum)> {
        self.enums.iter().enumerate().map(|(i, e)| (EnumId(i), e))
    }

    // ------------------------------------------------------------------
    // Name lookups
    // ------------------------------------------------------------------

    pub fn messages_named(&self, name: &str) -> &[MessageId] {
        self.message_names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn enums_named(&self, name: &str) -> &[EnumId] {
        self.enum_names.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn services_named(&self, name: &str) -> impl Iterator<Item = &Service> {
        self.service_names
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&i| &self.services[i])
    }

    /// Top-level messages then top-level enums named `name`.
    pub fn top_level_named(&self, name: &str) -> Vec<Entity> {
        self.messages_named(name)
            .iter()
            .map(|&id| Entity::Message(id))
            .chain(self.enums_named(name).iter().map(|&id| Entity::Enum(id)))
            .collect()
    }

    pub fn entity_name(&self, entity: Entity) -> &str {
        match entity {
            Entity::Message(id) => &self.message(id).name,
            Entity::Enum(id) => &self.enumeration(id).name,
        }
    }

    pub fn entity_pos(&self, entity: Entity) -> SourcePos {
        match entity {
            Entity::Message(id) => self.message(id).pos,
            Entity::Enum(id) => self.enumeration(id).pos,
        }
    }

    pub fn entity_comments(&self, entity: Entity) -> &[String] {
        match entity {
            Entity::Message(id) => &self.message(id).comments,
            Entity::Enum(id) => &self.enumeration(id).comments,
        }
    }

    fn entity_parent(&self, entity: Entity) -> Option<MessageId> {
        match entity {
            Entity::Message(id) => self.message(id).parent,
            Entity::Enum(id) => self.enumeration(id).parent,
        }
    }

    /// Dotted path from the top level, e.g. `Outer.Inner`.
    pub fn type_path(&self, entity: Entity) -> String {
        let mut parts: Vec<&str> = self
            .entity_parent(entity)
            .into_iter()
            .flat_map(|p| std::iter::once(p).chain(self.ancestors(p)))
            .map(|id| self.message(id).name.as_str())
            .collect();
        parts.reverse();
        parts.push(self.entity_name(entity));
        parts.join(".")
    }

    // ------------------------------------------------------------------
    // Line lookups
    // ------------------------------------------------------------------

    /// Innermost message whose declaration starts on `line`.
    pub fn message_at_line(&self, line: u32) -> Option<MessageId> {
        self.message_lines
            .get(&line)
            .and_then(|ids| ids.last().copied())
    }

    pub fn enum_at_line(&self, line: u32) -> Option<EnumId> {
        self.enum_lines.get(&line).and_then(|ids| ids.last().copied())
    }

    pub fn service_at_line(&self, line: u32) -> Option<&Service> {
        self.service_lines.get(&line).map(|&i| &self.services[i])
    }

    /// Innermost message whose body contains `line` (1-based).
    pub fn enclosing_message(&self, line: u32) -> Option<MessageId> {
        self.message_lines
            .range(..=line)
            .rev()
            .flat_map(|(_, ids)| ids.iter().rev())
            .copied()
            .find(|&id| self.message(id).span.contains_line(line))
    }

    /// Enclosing messages of `id`, innermost first, excluding `id` itself.
    pub fn ancestors(&self, id: MessageId) -> impl Iterator<Item = MessageId> + '_ {
        std::iter::successors(self.message(id).parent, move |&p| self.message(p).parent)
    }

    /// The message containing `line` followed by its ancestors.
    pub fn scope_chain(&self, line: u32) -> Vec<MessageId> {
        match self.enclosing_message(line) {
            Some(id) => std::iter::once(id).chain(self.ancestors(id)).collect(),
            None => Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Type paths
    // ------------------------------------------------------------------

    /// Resolves `Outer.Inner.Leaf` starting at the top level.
    pub fn find_type_path(&self, path: &[&str]) -> Vec<Entity> {
        match path.split_first() {
            Some((first, rest)) => self.descend(self.top_level_named(first), rest),
            None => Vec::new(),
        }
    }

    /// Resolves a type path relative to the nested scope of `scope`.
    pub fn find_type_path_in(&self, scope: MessageId, path: &[&str]) -> Vec<Entity> {
        match path.split_first() {
            Some((first, rest)) => {
                let roots = self.message(scope).nested_named(first).to_vec();
                self.descend(roots, rest)
            }
            None => Vec::new(),
        }
    }

    fn descend(&self, mut current: Vec<Entity>, rest: &[&str]) -> Vec<Entity> {
        for segment in rest {
            current = current
                .into_iter()
                .filter_map(Entity::as_message)
                .flat_map(|id| self.message(id).nested_named(segment).iter().copied())
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

impl From<ast::File> for Schema {
    fn from(file: ast::File) -> Self {
        let mut schema = Schema::default();
        for item in file.items {
            match item {
                Item::Syntax(s) => schema.syntax = Some(s),
                Item::Edition(e) => schema.edition = Some(e),
                Item::Package(p) => schema.package = Some(p),
                Item::Import(i) => schema.imports.push(i),
                Item::Option(o) => schema.options.push(o),
                Item::Extend(e) => schema.extends.push(e),
                Item::Message(decl) => {
                    let id = schema.add_message(decl, None);
                    schema.top_level_messages.push(id);
                    schema
                        .message_names
                        .entry(schema.messages[id.0].name.clone())
                        .or_default()
                        .push(id);
                }
                Item::Enum(decl) => {
                    let id = schema.add_enum(decl, None);
                    schema.top_level_enums.push(id);
                    schema
                        .enum_names
                        .entry(schema.enums[id.0].name.clone())
                        .or_default()
                        .push(id);
                }
                Item::Service(decl) => schema.add_service(decl),
            }
        }
        schema
    }
}

impl Schema {
    fn add_message(&mut self, decl: MessageDecl, parent: Option<MessageId>) -> MessageId {
        let id = MessageId(self.messages.len());
        self.message_lines
            .entry(decl.span.start.line())
            .or_default()
            .push(id);
        self.messages.push(Message {
            name: decl.name,
            pos: decl.pos,
            span: decl.span,
            comments: decl.comments,
            fields: Vec::new(),
            map_fields: Vec::new(),
            oneofs: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
            options: Vec::new(),
            extends: Vec::new(),
            parent,
            nested_names: HashMap::new(),
        });

        let mut fields = Vec::new();
        let mut map_fields = Vec::new();
        let mut oneofs = Vec::new();
        let mut nested_messages = Vec::new();
        let mut nested_enums = Vec::new();
        let mut options = Vec::new();
        let mut extends = Vec::new();
        let mut nested_names: HashMap<String, Vec<Entity>> = HashMap::new();

        for element in decl.elements {
            match element {
                MessageElement::Field(field) => fields.push(field),
                MessageElement::Map(map) => map_fields.push(map),
                MessageElement::Oneof(oneof) => oneofs.push(oneof),
                MessageElement::Message(child) => {
                    let name = child.name.clone();
                    let child = self.add_message(child, Some(id));
                    nested_messages.push(child);
                    nested_names
                        .entry(name)
                        .or_default()
                        .push(Entity::Message(child));
                }
                MessageElement::Group(field, body) => {
                    let name = body.name.clone();
                    let child = self.add_message(body, Some(id));
                    nested_messages.push(child);
                    nested_names
                        .entry(name)
                        .or_default()
                        .push(Entity::Message(child));
                    fields.push(field);
                }
                MessageElement::Enum(child) => {
                    let name = child.name.clone();
                    let child = self.add_enum(child, Some(id));
                    nested_enums.push(child);
                    nested_names
                        .entry(name)
                        .or_default()
                        .push(Entity::Enum(child));
                }
                MessageElement::Option(option) => options.push(option),
                MessageElement::Extend(extend) => extends.push(extend),
                MessageElement::Reserved(_) | MessageElement::Extensions(_) => {}
            }
        }

        // Stable: messages ahead of enums, declaration order otherwise.
        for entities in nested_names.values_mut() {
            entities.sort_by_key(|e| matches!(e, Entity::Enum(_)));
        }

        let message = &mut self.messages[id.0];
        message.fields = fields;
        message.map_fields = map_fields;
        message.oneofs = oneofs;
        message.nested_messages = nested_messages;
        message.nested_enums = nested_enums;
        message.options = options;
        message.extends = extends;
        message.nested_names = nested_names;
        id
    }

    fn add_enum(&mut self, decl: EnumDecl, parent: Option<MessageId>) -> EnumId {
        let id = EnumId(self.enums.len());
        self.enum_lines
            .entry(decl.span.start.line())
            .or_default()
            .push(id);
        self.enums.push(Enum {
            name: decl.name,
            pos: decl.pos,
            span: decl.span,
            comments: decl.comments,
            values: decl.values,
            options: decl.options,
            parent,
        });
        id
    }

    fn add_service(&mut self, decl: ServiceDecl) {
        let index = self.services.len();
        let mut rpcs = Vec::new();
        let mut options = Vec::new();
        for element in decl.elements {
            match element {
                ServiceElement::Rpc(rpc) => rpcs.push(rpc),
                ServiceElement::Option(option) => options.push(option),
            }
        }
        self.service_lines.insert(decl.span.start.line(), index);
        self.service_names
            .entry(decl.name.clone())
            .or_default()
            .push(index);
        self.services.push(Service {
            name: decl.name,
            pos: decl.pos,
            span: decl.span,
            comments: decl.comments,
            rpcs,
            options,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;

    const NESTED: &str = r#"syntax = "proto3";
package demo;

message Outer {
  message Inner {
    enum Kind {
      KIND_UNSPECIFIED = 0;
    }
    Kind kind = 1;
  }
  Inner inner = 1;
}

enum Outer {
  OUTER_UNSPECIFIED = 0;
}
"#;

    #[test]
    fn test_duplicate_top_level_names_are_kept() {
        let schema = parse(NESTED).unwrap();
        let found = schema.top_level_named("Outer");
        assert_eq!(found.len(), 2);
        assert!(found[0].as_message().is_some());
        assert!(found[1].as_enum().is_some());
    }

    #[test]
    fn test_enclosing_message_is_innermost() {
        let schema = parse(NESTED).unwrap();
        let inner = schema.enclosing_message(9).unwrap();
        assert_eq!(schema.message(inner).name, "Inner");
        let outer = schema.enclosing_message(11).unwrap();
        assert_eq!(schema.message(outer).name, "Outer");
        assert!(schema.enclosing_message(2).is_none());
    }

    #[test]
    fn test_scope_chain_walks_parents() {
        let schema = parse(NESTED).unwrap();
        let names: Vec<&str> = schema
            .scope_chain(7)
            .into_iter()
            .map(|id| schema.message(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["Inner", "Outer"]);
    }

    #[test]
    fn test_find_type_path() {
        let schema = parse(NESTED).unwrap();
        let found = schema.find_type_path(&["Outer", "Inner", "Kind"]);
        assert_eq!(found.len(), 1);
        let kind = found[0];
        assert_eq!(schema.entity_name(kind), "Kind");
        assert_eq!(schema.type_path(kind), "Outer.Inner.Kind");
        assert!(schema.find_type_path(&["Outer", "Missing"]).is_empty());
    }

    #[test]
    fn test_line_indexes() {
        let schema = parse(NESTED).unwrap();
        let id = schema.message_at_line(5).unwrap();
        assert_eq!(schema.message(id).name, "Inner");
        let id = schema.enum_at_line(14).unwrap();
        assert_eq!(schema.enumeration(id).name, "Outer");
        assert!(schema.service_at_line(1).is_none());
    }
}
