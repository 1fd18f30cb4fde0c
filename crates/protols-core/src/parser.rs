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

//! Recursive-descent parser for proto2, proto3 and editions files.
//!
//! The parser stops at the first error. It accepts the full declaration
//! grammar but does no semantic validation: field numbers, duplicate names
//! and type references are taken as written.
//!
//! # Comment attachment
//!
//! - Leading: the contiguous run of comments that ends on the line just
//!   before a declaration and starts after the previous token's line.
//! - Inline: the first comment starting on the same line as a field's or
//!   enum value's terminating `;`.

use crate::ast::{
    self, EnumDecl, Item, MessageDecl, MessageElement, ServiceDecl, ServiceElement,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Comment, Token, TokenKind};
use crate::schema::{
    EnumValue, Extend, Field, FieldLabel, Import, ImportKind, MapField, Oneof, OptionDecl,
    Package, Rpc, RpcType, Schema,
};
use crate::span::{LineIndex, SourcePos, Span};

/// Parse a proto file into an indexed [`Schema`].
///
/// # Examples
///
/// ```
/// let schema = protols_core::parse("package demo;\nmessage Ping { string id = 1; }").unwrap();
/// assert_eq!(schema.package_name(), "demo");
/// assert_eq!(schema.messages_named("Ping").len(), 1);
/// ```
pub fn parse(source: &str) -> ParseResult<Schema> {
    parse_file(source).map(Schema::from)
}

/// Parse a proto file into its declaration tree.
pub fn parse_file(source: &str) -> ParseResult<ast::File> {
    let lines = LineIndex::new(source);
    let lexed = tokenize(source, &lines)?;
    let mut parser = Parser {
        source,
        lines,
        tokens: lexed.tokens,
        comments: lexed.comments,
        cursor: 0,
    };
    parser.file()
}

/// A field statement, or a proto2 group that is both a field and a message.
enum FieldDecl {
    Field(Field),
    Group(Field, MessageDecl),
}

struct Parser<'a> {
    source: &'a str,
    lines: LineIndex,
    tokens: Vec<Token<'a>>,
    comments: Vec<Comment<'a>>,
    cursor: usize,
}

impl<'a> Parser<'a> {
    // ==================================================================
    // Token navigation
    // ==================================================================

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind_at(&self, ahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.cursor + ahead).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind_at(0) == Some(kind)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(t) if t.kind == TokenKind::Ident && t.text == keyword)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self, expected: &str) -> ParseResult<Token<'a>> {
        match self.tokens.get(self.cursor) {
            Some(token) => {
                self.cursor += 1;
                Ok(token.clone())
            }
            None => Err(ParseError::eof(
                format!("expected {}, found end of file", expected),
                self.end_pos(),
            )),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'a>> {
        let token = self.bump(kind.describe())?;
        if token.kind != kind {
            return Err(ParseError::syntax(
                format!("expected {}, found {:?}", kind.describe(), token.text),
                self.pos(&token),
            ));
        }
        Ok(token)
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Token<'a>> {
        let token = self.bump(keyword)?;
        if token.kind != TokenKind::Ident || token.text != keyword {
            return Err(ParseError::syntax(
                format!("expected '{}', found {:?}", keyword, token.text),
                self.pos(&token),
            ));
        }
        Ok(token)
    }

    /// Consumes `keyword`, returning it with the comments that lead it.
    fn keyword(&mut self, keyword: &str) -> ParseResult<(Token<'a>, Vec<String>)> {
        let comments = match self.peek() {
            Some(token) => self.leading_comments(token.span.start),
            None => Vec::new(),
        };
        let token = self.expect_keyword(keyword)?;
        Ok((token, comments))
    }

    fn ident(&mut self, what: &str) -> ParseResult<(String, SourcePos)> {
        let token = self.bump(what)?;
        if token.kind != TokenKind::Ident {
            return Err(ParseError::syntax(
                format!("expected {}, found {:?}", what, token.text),
                self.pos(&token),
            ));
        }
        Ok((token.text.to_string(), self.pos(&token)))
    }

    /// `.`? ident (`.` ident)*
    fn type_name(&mut self) -> ParseResult<(String, SourcePos)> {
        let mut name = String::new();
        let mut pos = None;
        if let Some(dot) = self.peek().filter(|t| t.kind == TokenKind::Dot) {
            pos = Some(self.lines.position(dot.span.start));
            name.push('.');
            self.cursor += 1;
        }
        let (first, first_pos) = self.ident("type name")?;
        name.push_str(&first);
        while self.at(TokenKind::Dot) && self.peek_kind_at(1) == Some(TokenKind::Ident) {
            self.cursor += 1;
            let (segment, _) = self.ident("type name")?;
            name.push('.');
            name.push_str(&segment);
        }
        Ok((name, pos.unwrap_or(first_pos)))
    }

    fn pos(&self, token: &Token<'_>) -> SourcePos {
        self.lines.position(token.span.start)
    }

    fn end_pos(&self) -> SourcePos {
        self.lines.position(self.source.len())
    }

    /// Skips to and past the next `;`, returning the position of the first token.
    fn skip_statement(&mut self) -> ParseResult<SourcePos> {
        let first = self.bump("statement")?;
        let pos = self.pos(&first);
        while self.bump("';'")?.kind != TokenKind::Semi {}
        Ok(pos)
    }

    /// True when the statement at the cursor is `keyword Name {` rather than a
    /// field whose type happens to be spelled like a keyword.
    fn is_declaration(&self) -> bool {
        self.peek_kind_at(2) != Some(TokenKind::Eq)
    }

    // ==================================================================
    // Comments
    // ==================================================================

    fn leading_comments(&self, start: usize) -> Vec<String> {
        let (floor, floor_line) = match self.cursor.checked_sub(1).map(|i| &self.tokens[i]) {
            Some(prev) => (
                prev.span.end,
                Some(self.lines.position(prev.span.end.saturating_sub(1)).line()),
            ),
            None => (0, None),
        };
        let lo = self.comments.partition_point(|c| c.span.start < floor);
        let hi = self.comments.partition_point(|c| c.span.start < start);
        let decl_line = self.lines.position(start).line();

        let mut expected = decl_line;
        let mut block: Vec<&Comment<'_>> = Vec::new();
        for comment in self.comments[lo..hi].iter().rev() {
            let start_line = self.lines.position(comment.span.start).line();
            let end_line = self
                .lines
                .position(comment.span.end.saturating_sub(1))
                .line();
            let adjacent = end_line + 1 == expected || (block.is_empty() && end_line == decl_line);
            if !adjacent || Some(start_line) == floor_line {
                break;
            }
            expected = start_line;
            block.push(comment);
        }
        block.iter().rev().flat_map(|c| c.lines()).collect()
    }

    /// Comment trailing the token that ended at byte `after`.
    fn inline_comment(&self, after: usize) -> Option<String> {
        let line = self.lines.position(after.saturating_sub(1)).line();
        let next_token = self.peek().map(|t| t.span.start).unwrap_or(usize::MAX);
        let index = self.comments.partition_point(|c| c.span.start < after);
        let comment = self.comments.get(index)?;
        if comment.span.start < next_token
            && self.lines.position(comment.span.start).line() == line
        {
            Some(comment.lines().join("\n"))
        } else {
            None
        }
    }

    // ==================================================================
    // Literals
    // ==================================================================

    fn string(&mut self) -> ParseResult<(String, SourcePos)> {
        let first = self.expect(TokenKind::StrLit)?;
        let mut value = unquote(first.text);
        while self.at(TokenKind::StrLit) {
            let next = self.bump("string")?;
            value.push_str(&unquote(next.text));
        }
        Ok((value, self.pos(&first)))
    }

    fn integer(&mut self) -> ParseResult<i64> {
        let negative = self.eat(TokenKind::Minus);
        if !negative {
            self.eat(TokenKind::Plus);
        }
        let token = self.expect(TokenKind::IntLit)?;
        let value = parse_int(token.text).ok_or_else(|| {
            ParseError::invalid_number(
                format!("invalid integer literal {:?}", token.text),
                self.pos(&token),
            )
        })?;
        Ok(if negative { -value } else { value })
    }

    /// Option value as written. Aggregates are skipped with brace balancing.
    fn constant(&mut self) -> ParseResult<String> {
        let token = self.bump("constant")?;
        match token.kind {
            TokenKind::StrLit => {
                let mut raw = token.text.to_string();
                while self.at(TokenKind::StrLit) {
                    raw.push(' ');
                    raw.push_str(self.bump("string")?.text);
                }
                Ok(raw)
            }
            TokenKind::IntLit | TokenKind::FloatLit => Ok(token.text.to_string()),
            TokenKind::Ident => {
                let mut raw = token.text.to_string();
                while self.at(TokenKind::Dot) && self.peek_kind_at(1) == Some(TokenKind::Ident) {
                    self.cursor += 1;
                    raw.push('.');
                    raw.push_str(self.bump("identifier")?.text);
                }
                Ok(raw)
            }
            TokenKind::Minus | TokenKind::Plus => {
                let number = self.bump("number")?;
                match number.kind {
                    TokenKind::IntLit | TokenKind::FloatLit | TokenKind::Ident => {
                        Ok(format!("{}{}", token.text, number.text))
                    }
                    _ => Err(ParseError::syntax(
                        format!("expected number after '{}'", token.text),
                        self.pos(&number),
                    )),
                }
            }
            TokenKind::LBrace => {
                let mut depth = 1usize;
                loop {
                    let inner = self.bump("'}'")?;
                    match inner.kind {
                        TokenKind::LBrace => depth += 1,
                        TokenKind::RBrace => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(self.source[token.span.start..inner.span.end].to_string());
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => Err(ParseError::syntax(
                format!("expected constant, found {:?}", token.text),
                self.pos(&token),
            )),
        }
    }

    // ==================================================================
    // Options
    // ==================================================================

    fn option_name(&mut self) -> ParseResult<(String, SourcePos)> {
        let pos = match self.peek() {
            Some(token) => self.pos(token),
            None => self.end_pos(),
        };
        let mut name = String::new();
        loop {
            if self.eat(TokenKind::LParen) {
                let (extension, _) = self.type_name()?;
                self.expect(TokenKind::RParen)?;
                name.push('(');
                name.push_str(&extension);
                name.push(')');
            } else {
                let (segment, _) = self.ident("option name")?;
                name.push_str(&segment);
            }
            if !self.eat(TokenKind::Dot) {
                break;
            }
            name.push('.');
        }
        Ok((name, pos))
    }

    fn option_statement(&mut self) -> ParseResult<OptionDecl> {
        self.expect_keyword("option")?;
        let (name, pos) = self.option_name()?;
        self.expect(TokenKind::Eq)?;
        let value = self.constant()?;
        self.expect(TokenKind::Semi)?;
        Ok(OptionDecl { name, value, pos })
    }

    /// `[name = value, ...]` after a field or enum value, if present.
    fn field_options(&mut self) -> ParseResult<Vec<OptionDecl>> {
        let mut options = Vec::new();
        if !self.eat(TokenKind::LBracket) {
            return Ok(options);
        }
        loop {
            let (name, pos) = self.option_name()?;
            self.expect(TokenKind::Eq)?;
            let value = self.constant()?;
            options.push(OptionDecl { name, value, pos });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket)?;
        Ok(options)
    }

    // ==================================================================
    // File level
    // ==================================================================

    fn file(&mut self) -> ParseResult<ast::File> {
        let mut file = ast::File::default();
        let mut seen_syntax = false;
        let mut seen_package = false;

        while let Some(token) = self.peek().cloned() {
            match (token.kind, token.text) {
                (TokenKind::Semi, _) => self.cursor += 1,
                (TokenKind::Ident, "syntax") | (TokenKind::Ident, "edition") => {
                    if seen_syntax {
                        return Err(ParseError::duplicate(
                            format!("duplicate {} declaration", token.text),
                            self.pos(&token),
                        ));
                    }
                    seen_syntax = true;
                    self.cursor += 1;
                    self.expect(TokenKind::Eq)?;
                    let (value, _) = self.string()?;
                    self.expect(TokenKind::Semi)?;
                    file.items.push(if token.text == "syntax" {
                        Item::Syntax(value)
                    } else {
                        Item::Edition(value)
                    });
                }
                (TokenKind::Ident, "package") => {
                    if seen_package {
                        return Err(ParseError::duplicate(
                            "duplicate package declaration",
                            self.pos(&token),
                        ));
                    }
                    seen_package = true;
                    self.cursor += 1;
                    let (name, pos) = self.type_name()?;
                    self.expect(TokenKind::Semi)?;
                    file.items.push(Item::Package(Package { name, pos }));
                }
                (TokenKind::Ident, "import") => file.items.push(Item::Import(self.import()?)),
                (TokenKind::Ident, "option") => {
                    file.items.push(Item::Option(self.option_statement()?))
                }
                (TokenKind::Ident, "message") => file.items.push(Item::Message(self.message()?)),
                (TokenKind::Ident, "enum") => file.items.push(Item::Enum(self.enumeration()?)),
                (TokenKind::Ident, "service") => file.items.push(Item::Service(self.service()?)),
                (TokenKind::Ident, "extend") => file.items.push(Item::Extend(self.extend()?)),
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {:?} at top level", token.text),
                        self.pos(&token),
                    ))
                }
            }
        }
        Ok(file)
    }

    fn import(&mut self) -> ParseResult<Import> {
        self.expect_keyword("import")?;
        let kind = if self.at_keyword("public") {
            ImportKind::Public
        } else if self.at_keyword("weak") {
            ImportKind::Weak
        } else {
            ImportKind::Normal
        };
        if kind != ImportKind::Normal {
            self.cursor += 1;
        }
        let (path, pos) = self.string()?;
        self.expect(TokenKind::Semi)?;
        Ok(Import { path, kind, pos })
    }

    // ==================================================================
    // Messages
    // ==================================================================

    fn message(&mut self) -> ParseResult<MessageDecl> {
        let (keyword, comments) = self.keyword("message")?;
        let (name, pos) = self.ident("message name")?;
        self.expect(TokenKind::LBrace)?;
        let elements = self.message_body()?;
        let close = self.expect(TokenKind::RBrace)?;
        Ok(MessageDecl {
            name,
            pos,
            span: Span::new(self.pos(&keyword), self.pos(&close)),
            comments,
            elements,
        })
    }

    /// Statements up to (not including) the closing brace.
    fn message_body(&mut self) -> ParseResult<Vec<MessageElement>> {
        let mut elements = Vec::new();
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(ParseError::eof("expected '}'", self.end_pos()));
            };
            match token.kind {
                TokenKind::RBrace => return Ok(elements),
                TokenKind::Semi => self.cursor += 1,
                TokenKind::Ident | TokenKind::Dot => {
                    let keyword = if token.kind == TokenKind::Ident { token.text } else { "" };
                    match keyword {
                        "option" => elements.push(MessageElement::Option(self.option_statement()?)),
                        "reserved" => elements.push(MessageElement::Reserved(self.skip_statement()?)),
                        "extensions" => {
                            elements.push(MessageElement::Extensions(self.skip_statement()?))
                        }
                        "message" if self.is_declaration() => {
                            elements.push(MessageElement::Message(self.message()?))
                        }
                        "enum" if self.is_declaration() => {
                            elements.push(MessageElement::Enum(self.enumeration()?))
                        }
                        "extend" if self.is_declaration() => {
                            elements.push(MessageElement::Extend(self.extend()?))
                        }
                        "oneof" if self.is_declaration() => {
                            let (oneof, groups) = self.oneof()?;
                            elements.push(MessageElement::Oneof(oneof));
                            elements.extend(groups.into_iter().map(MessageElement::Message));
                        }
                        "map" if self.peek_kind_at(1) == Some(TokenKind::LAngle) => {
                            elements.push(MessageElement::Map(self.map_field()?))
                        }
                        _ => elements.push(match self.field()? {
                            FieldDecl::Field(field) => MessageElement::Field(field),
                            FieldDecl::Group(field, body) => MessageElement::Group(field, body),
                        }),
                    }
                }
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {:?} in message body", token.text),
                        self.pos(&token),
                    ))
                }
            }
        }
    }

    fn label(&self) -> Option<FieldLabel> {
        let token = self.peek()?;
        let label = match token.text {
            "optional" => FieldLabel::Optional,
            "repeated" => FieldLabel::Repeated,
            "required" => FieldLabel::Required,
            _ => return None,
        };
        let type_follows = matches!(
            self.peek_kind_at(1),
            Some(TokenKind::Ident) | Some(TokenKind::Dot)
        );
        (type_follows && self.is_declaration()).then_some(label)
    }

    /// `label? Type name = N [options];` or `label? group Name = N { ... }`.
    fn field(&mut self) -> ParseResult<FieldDecl> {
        let start = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(ParseError::eof("expected field", self.end_pos())),
        };
        let comments = self.leading_comments(start.span.start);
        let label = self.label();
        if label.is_some() {
            self.cursor += 1;
        }
        let (type_name, type_pos) = self.type_name()?;
        let (name, pos) = self.ident("field name")?;
        self.expect(TokenKind::Eq)?;
        let number = self.integer()?;
        let options = self.field_options()?;

        if type_name == "group" && self.eat(TokenKind::LBrace) {
            let elements = self.message_body()?;
            let close = self.expect(TokenKind::RBrace)?;
            let field = Field {
                label,
                type_name: name.clone(),
                type_pos: pos,
                name: name.to_lowercase(),
                number,
                pos,
                options,
                comments: comments.clone(),
                inline_comment: None,
            };
            let body = MessageDecl {
                name,
                pos,
                span: Span::new(self.pos(&start), self.pos(&close)),
                comments,
                elements,
            };
            return Ok(FieldDecl::Group(field, body));
        }

        let semi = self.expect(TokenKind::Semi)?;
        Ok(FieldDecl::Field(Field {
            label,
            type_name,
            type_pos,
            name,
            number,
            pos,
            options,
            comments,
            inline_comment: self.inline_comment(semi.span.end),
        }))
    }

    fn map_field(&mut self) -> ParseResult<MapField> {
        let (_, comments) = self.keyword("map")?;
        self.expect(TokenKind::LAngle)?;
        let (key_type, _) = self.type_name()?;
        self.expect(TokenKind::Comma)?;
        let (value_type, value_type_pos) = self.type_name()?;
        self.expect(TokenKind::RAngle)?;
        let (name, pos) = self.ident("field name")?;
        self.expect(TokenKind::Eq)?;
        let number = self.integer()?;
        let options = self.field_options()?;
        let semi = self.expect(TokenKind::Semi)?;
        Ok(MapField {
            key_type,
            value_type,
            value_type_pos,
            name,
            number,
            pos,
            options,
            comments,
            inline_comment: self.inline_comment(semi.span.end),
        })
    }

    /// A oneof and the bodies of any groups declared inside it.
    fn oneof(&mut self) -> ParseResult<(Oneof, Vec<MessageDecl>)> {
        let (_, comments) = self.keyword("oneof")?;
        let (name, pos) = self.ident("oneof name")?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut options = Vec::new();
        let mut groups = Vec::new();
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(ParseError::eof("expected '}'", self.end_pos()));
            };
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Semi => self.cursor += 1,
                TokenKind::Ident if token.text == "option" => {
                    options.push(self.option_statement()?)
                }
                TokenKind::Ident | TokenKind::Dot => match self.field()? {
                    FieldDecl::Field(field) => fields.push(field),
                    FieldDecl::Group(field, body) => {
                        fields.push(field);
                        groups.push(body);
                    }
                },
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {:?} in oneof", token.text),
                        self.pos(&token),
                    ))
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        let oneof = Oneof {
            name,
            pos,
            fields,
            options,
            comments,
        };
        Ok((oneof, groups))
    }

    fn extend(&mut self) -> ParseResult<Extend> {
        self.expect_keyword("extend")?;
        let (extendee, pos) = self.type_name()?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(ParseError::eof("expected '}'", self.end_pos()));
            };
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Semi => self.cursor += 1,
                TokenKind::Ident | TokenKind::Dot => match self.field()? {
                    FieldDecl::Field(field) | FieldDecl::Group(field, _) => fields.push(field),
                },
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {:?} in extend", token.text),
                        self.pos(&token),
                    ))
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Extend {
            extendee,
            pos,
            fields,
        })
    }

    // ==================================================================
    // Enums
    // ==================================================================

    fn enumeration(&mut self) -> ParseResult<EnumDecl> {
        let (keyword, comments) = self.keyword("enum")?;
        let (name, pos) = self.ident("enum name")?;
        self.expect(TokenKind::LBrace)?;
        let mut values = Vec::new();
        let mut options = Vec::new();
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(ParseError::eof("expected '}'", self.end_pos()));
            };
            let names_value = self.peek_kind_at(1) == Some(TokenKind::Eq);
            match token.kind {
                TokenKind::RBrace => break,
                TokenKind::Semi => self.cursor += 1,
                TokenKind::Ident if token.text == "option" && !names_value => {
                    options.push(self.option_statement()?)
                }
                TokenKind::Ident if token.text == "reserved" && !names_value => {
                    self.skip_statement()?;
                }
                TokenKind::Ident => values.push(self.enum_value()?),
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {:?} in enum body", token.text),
                        self.pos(&token),
                    ))
                }
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(EnumDecl {
            name,
            pos,
            span: Span::new(self.pos(&keyword), self.pos(&close)),
            comments,
            values,
            options,
        })
    }

    fn enum_value(&mut self) -> ParseResult<EnumValue> {
        let comments = match self.peek() {
            Some(token) => self.leading_comments(token.span.start),
            None => Vec::new(),
        };
        let (name, pos) = self.ident("enum value name")?;
        self.expect(TokenKind::Eq)?;
        let number = self.integer()?;
        let options = self.field_options()?;
        let semi = self.expect(TokenKind::Semi)?;
        Ok(EnumValue {
            name,
            number,
            pos,
            options,
            comments,
            inline_comment: self.inline_comment(semi.span.end),
        })
    }

    // ==================================================================
    // Services
    // ==================================================================

    fn service(&mut self) -> ParseResult<ServiceDecl> {
        let (keyword, comments) = self.keyword("service")?;
        let (name, pos) = self.ident("service name")?;
        self.expect(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        loop {
            let Some(token) = self.peek().cloned() else {
                return Err(ParseError::eof("expected '}'", self.end_pos()));
            };
            match (token.kind, token.text) {
                (TokenKind::RBrace, _) => break,
                (TokenKind::Semi, _) => self.cursor += 1,
                (TokenKind::Ident, "option") => {
                    elements.push(ServiceElement::Option(self.option_statement()?))
                }
                (TokenKind::Ident, "rpc") => elements.push(ServiceElement::Rpc(self.rpc()?)),
                _ => {
                    return Err(ParseError::syntax(
                        format!("unexpected {:?} in service body", token.text),
                        self.pos(&token),
                    ))
                }
            }
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(ServiceDecl {
            name,
            pos,
            span: Span::new(self.pos(&keyword), self.pos(&close)),
            comments,
            elements,
        })
    }

    fn rpc(&mut self) -> ParseResult<Rpc> {
        let (_, comments) = self.keyword("rpc")?;
        let (name, pos) = self.ident("rpc name")?;
        let request = self.rpc_type()?;
        self.expect_keyword("returns")?;
        let response = self.rpc_type()?;

        let mut options = Vec::new();
        if self.eat(TokenKind::LBrace) {
            loop {
                let token = self.bump("'}'")?;
                match (token.kind, token.text) {
                    (TokenKind::RBrace, _) => break,
                    (TokenKind::Semi, _) => {}
                    (TokenKind::Ident, "option") => {
                        self.cursor -= 1;
                        options.push(self.option_statement()?);
                    }
                    _ => {
                        return Err(ParseError::syntax(
                            format!("unexpected {:?} in rpc body", token.text),
                            self.pos(&token),
                        ))
                    }
                }
            }
        } else {
            self.expect(TokenKind::Semi)?;
        }

        Ok(Rpc {
            name,
            pos,
            request,
            response,
            options,
            comments,
        })
    }

    /// `( stream? Type )`
    fn rpc_type(&mut self) -> ParseResult<RpcType> {
        self.expect(TokenKind::LParen)?;
        let streaming = self.at_keyword("stream")
            && matches!(
                self.peek_kind_at(1),
                Some(TokenKind::Ident) | Some(TokenKind::Dot)
            );
        if streaming {
            self.cursor += 1;
        }
        let (name, pos) = self.type_name()?;
        self.expect(TokenKind::RParen)?;
        Ok(RpcType {
            name,
            streaming,
            pos,
        })
    }
}

/// Decimal, hex (`0x`) or octal (leading `0`) integer literal.
fn parse_int(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        i64::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

/// Strips the quotes of a string literal and resolves simple escapes.
fn unquote(text: &str) -> String {
    let inner = if text.len() >= 2 { &text[1..text.len() - 1] } else { "" };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other @ ('"' | '\'' | '\\')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn test_parse_int_bases() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("017"), Some(15));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("09"), None);
    }

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a/b.proto""#), "a/b.proto");
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(unquote("'x'"), "x");
    }

    #[test]
    fn test_leading_comment_block() {
        let schema = parse("// first\n// second\nmessage Foo {}\n").unwrap();
        let (_, foo) = schema.top_level_messages().next().unwrap();
        assert_eq!(foo.comments, vec![" first".to_string(), " second".to_string()]);
    }

    #[test]
    fn test_detached_comment_is_not_leading() {
        let schema = parse("// detached\n\nmessage Foo {}\n").unwrap();
        let (_, foo) = schema.top_level_messages().next().unwrap();
        assert!(foo.comments.is_empty());
    }

    #[test]
    fn test_inline_comment_not_reused_as_leading() {
        let source = "message Foo {\n  int32 a = 1; // about a\n  int32 b = 2;\n}\n";
        let schema = parse(source).unwrap();
        let (_, foo) = schema.top_level_messages().next().unwrap();
        assert_eq!(foo.fields[0].inline_comment.as_deref(), Some(" about a"));
        assert!(foo.fields[1].comments.is_empty());
        assert!(foo.fields[1].inline_comment.is_none());
    }

    #[test]
    fn test_label_keyword_as_type_name() {
        let schema = parse("message Foo { optional x = 1; }").unwrap();
        let (_, foo) = schema.top_level_messages().next().unwrap();
        assert_eq!(foo.fields[0].label, None);
        assert_eq!(foo.fields[0].type_name, "optional");
    }

    #[test]
    fn test_unterminated_message_is_eof() {
        let err = parse("message Foo {\n  int32 a = 1;\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_invalid_field_number() {
        let err = parse("message Foo { int32 a = 99999999999999999999; }").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNumber);
        assert_eq!(err.line, 1);
    }
}
