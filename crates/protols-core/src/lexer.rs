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

//! Logos-based lexer for proto files.
//!
//! Whitespace is skipped. Comments are split off into a side table so the
//! parser only sees significant tokens but can still attach documentation
//! to the declarations that follow (or trail) them.

use crate::error::{ParseError, ParseResult};
use crate::span::LineIndex;
use logos::Logos;
use std::ops::Range;

/// Token kinds produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f\v]+")]
pub enum TokenKind {
    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r"0[xX][0-9A-Fa-f]+")]
    #[regex(r"[0-9]+")]
    IntLit,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    FloatLit,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    StrLit,

    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Eq,
    #[token(":")]
    Colon,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("/")]
    Slash,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// Human-readable description used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LineComment | TokenKind::BlockComment => "comment",
            TokenKind::Ident => "identifier",
            TokenKind::IntLit => "integer",
            TokenKind::FloatLit => "float",
            TokenKind::StrLit => "string",
            TokenKind::Semi => "';'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Eq => "'='",
            TokenKind::Colon => "':'",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LAngle => "'<'",
            TokenKind::RAngle => "'>'",
            TokenKind::Slash => "'/'",
        }
    }
}

/// A significant token with its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub span: Range<usize>,
}

/// A comment with its byte range in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
}

impl Comment<'_> {
    /// Comment body split into lines, with the comment markers removed.
    ///
    /// `// text` yields `[" text"]`; block comments yield one entry per
    /// source line between `/*` and `*/`.
    pub fn lines(&self) -> Vec<String> {
        if let Some(body) = self.text.strip_prefix("//") {
            return vec![body.trim_end_matches('\r').to_string()];
        }
        let body = self
            .text
            .strip_prefix("/*")
            .and_then(|s| s.strip_suffix("*/"))
            .unwrap_or(self.text);
        body.lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect()
    }
}

/// Output of [`tokenize`]: significant tokens and comments, both in source order.
#[derive(Debug, Clone, Default)]
pub struct Lexed<'a> {
    pub tokens: Vec<Token<'a>>,
    pub comments: Vec<Comment<'a>>,
}

/// Tokenize a whole source file.
///
/// Fails on the first character sequence that matches no token, including
/// unterminated strings and block comments.
pub fn tokenize<'a>(source: &'a str, lines: &LineIndex) -> ParseResult<Lexed<'a>> {
    let mut lexed = Lexed::default();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        match result {
            Ok(kind) if kind.is_comment() => lexed.comments.push(Comment { text, span }),
            Ok(kind) => lexed.tokens.push(Token { kind, text, span }),
            Err(()) => {
                let message = if text.starts_with("/*") {
                    "unterminated block comment".to_string()
                } else if text.starts_with('"') || text.starts_with('\'') {
                    "unterminated string literal".to_string()
                } else {
                    format!("unexpected character {:?}", text)
                };
                return Err(ParseError::invalid_token(message, lines.position(span.start)));
            }
        }
    }

    Ok(lexed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let lines = LineIndex::new(source);
        tokenize(source, &lines)
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_field_declaration() {
        assert_eq!(
            kinds("repeated string name = 1;"),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::IntLit,
                TokenKind::Semi
            ]
        );
    }

    #[test]
    fn test_qualified_type_is_split_on_dots() {
        assert_eq!(
            kinds(".google.protobuf.Any"),
            vec![
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::Dot,
                TokenKind::Ident
            ]
        );
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(kinds("0x1F"), vec![TokenKind::IntLit]);
        assert_eq!(kinds("017"), vec![TokenKind::IntLit]);
        assert_eq!(kinds("1.5e3"), vec![TokenKind::FloatLit]);
        assert_eq!(kinds(".5"), vec![TokenKind::FloatLit]);
    }

    #[test]
    fn test_strings_with_escapes() {
        assert_eq!(kinds(r#""a\"b""#), vec![TokenKind::StrLit]);
        assert_eq!(kinds("'single'"), vec![TokenKind::StrLit]);
    }

    #[test]
    fn test_comments_go_to_side_table() {
        let source = "// leading\nmessage Foo {} /* trailing */";
        let lines = LineIndex::new(source);
        let lexed = tokenize(source, &lines).unwrap();
        assert_eq!(lexed.tokens.len(), 4);
        assert_eq!(lexed.comments.len(), 2);
        assert_eq!(lexed.comments[0].lines(), vec![" leading".to_string()]);
        assert_eq!(lexed.comments[1].lines(), vec![" trailing ".to_string()]);
    }

    #[test]
    fn test_block_comment_lines() {
        let comment = Comment {
            text: "/* first\n second */",
            span: 0..19,
        };
        assert_eq!(
            comment.lines(),
            vec![" first".to_string(), " second ".to_string()]
        );
    }

    #[test]
    fn test_unterminated_string_reports_position() {
        let source = "syntax = \"proto3;\n";
        let lines = LineIndex::new(source);
        let err = tokenize(source, &lines).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 10);
    }

    #[test]
    fn test_unknown_character() {
        let source = "message Foo { # }";
        let lines = LineIndex::new(source);
        let err = tokenize(source, &lines).unwrap_err();
        assert!(err.message.contains("unexpected character"));
    }
}
