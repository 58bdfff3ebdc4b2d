use std::fmt;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Span};
use crate::literal::decode_int_literal;
use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Ident,
    /// `$name`
    Label,
    Number,
    Comment,
    Imp,
    Enum,
    Fn,
    Fdecl,
    Fdefi,
    Pub,
    Struct,
    Arrow,
    ColonColon,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Colon,
    Comma,
    Eq,
    At,
    Invalid,
    Eof,
}

impl TokenKind {
    pub fn is_item_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Imp | TokenKind::Enum | TokenKind::Fn | TokenKind::Fdecl | TokenKind::Fdefi
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Ident => "identifier",
            TokenKind::Label => "block label",
            TokenKind::Number => "integer literal",
            TokenKind::Comment => "comment",
            TokenKind::Imp => "`imp`",
            TokenKind::Enum => "`enum`",
            TokenKind::Fn => "`fn`",
            TokenKind::Fdecl => "`fdecl`",
            TokenKind::Fdefi => "`fdefi`",
            TokenKind::Pub => "`pub`",
            TokenKind::Struct => "`struct`",
            TokenKind::Arrow => "`->`",
            TokenKind::ColonColon => "`::`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Eq => "`=`",
            TokenKind::At => "`@`",
            TokenKind::Invalid => "invalid token",
            TokenKind::Eof => "end of input",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

/// Tokenizes `content`. Comments are kept as tokens (see [`filter_tokens`]);
/// the stream always ends with a single `Eof` token.
pub fn lex(content: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut tokens = Vec::new();
    let bytes = content.as_bytes();
    let mut index = 0usize;

    while index < bytes.len() {
        let ch = bytes[index];

        if ch.is_ascii_whitespace() {
            index += 1;
            continue;
        }

        if ch == b';' {
            let start = index;
            while index < bytes.len() && bytes[index] != b'\n' {
                index += 1;
            }
            tokens.push(token(TokenKind::Comment, content, start, index));
            continue;
        }

        if is_ident_start(ch) {
            let start = index;
            index = scan_ident(bytes, index);
            let text = &content[start..index];
            let kind = syntax::keyword(text).unwrap_or(TokenKind::Ident);
            tokens.push(token(kind, content, start, index));
            continue;
        }

        if ch == b'$' {
            let start = index;
            index += 1;
            if index < bytes.len() && is_ident_start(bytes[index]) {
                index = scan_ident(bytes, index);
                tokens.push(token(TokenKind::Label, content, start, index));
            } else {
                tokens.push(token(TokenKind::Invalid, content, start, index));
            }
            continue;
        }

        if ch.is_ascii_digit() {
            let start = index;
            // Consume the whole alphanumeric run so malformed literals stay one token.
            while index < bytes.len() && (bytes[index].is_ascii_alphanumeric() || bytes[index] == b'_')
            {
                index += 1;
            }
            tokens.push(token(TokenKind::Number, content, start, index));
            continue;
        }

        if let Some((kind, len)) = match_symbol(bytes, index) {
            tokens.push(token(kind, content, index, index + len));
            index += len;
            continue;
        }

        // Step over the whole UTF-8 sequence so spans stay on char boundaries.
        let len = content[index..].chars().next().map_or(1, char::len_utf8);
        tokens.push(token(TokenKind::Invalid, content, index, index + len));
        index += len;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        span: Span::empty(content.len()),
    });
    let diagnostics = token_diagnostics(&tokens);
    (tokens, diagnostics)
}

/// Lexical diagnostics carried by a token stream: invalid characters and
/// malformed integer literals, in stream order.
pub fn token_diagnostics(tokens: &[Token]) -> Vec<Diagnostic> {
    tokens.iter().filter_map(token_diagnostic).collect()
}

fn token_diagnostic(token: &Token) -> Option<Diagnostic> {
    match token.kind {
        TokenKind::Invalid => {
            let message = if token.text == "$" {
                "expected a label name after '$'".to_string()
            } else {
                format!("unexpected character '{}'", token.text)
            };
            Some(Diagnostic::error(
                "E1000",
                DiagnosticKind::LexError,
                message,
                token.span,
            ))
        }
        TokenKind::Number => decode_int_literal(&token.text, token.span)
            .err()
            .map(|err| {
                Diagnostic::error(err.code(), DiagnosticKind::LexError, err.to_string(), token.span)
            }),
        _ => None,
    }
}

fn token(kind: TokenKind, content: &str, start: usize, end: usize) -> Token {
    Token {
        kind,
        text: content[start..end].to_string(),
        span: Span::new(start, end),
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn scan_ident(bytes: &[u8], mut index: usize) -> usize {
    while index < bytes.len() && is_ident_continue(bytes[index]) {
        index += 1;
    }
    index
}

fn match_symbol(bytes: &[u8], index: usize) -> Option<(TokenKind, usize)> {
    if index + 1 < bytes.len() {
        for (needle, kind) in syntax::SYMBOLS_2 {
            if bytes[index] == needle[0] as u8 && bytes[index + 1] == needle[1] as u8 {
                return Some((*kind, 2));
            }
        }
    }

    let ch = bytes[index];
    syntax::SYMBOLS_1
        .iter()
        .find(|(symbol, _)| *symbol as u8 == ch)
        .map(|(_, kind)| (*kind, 1))
}

/// Drops comment tokens, leaving the stream the parser consumes.
pub fn filter_tokens(tokens: &[Token]) -> Vec<Token> {
    tokens
        .iter()
        .filter(|token| token.kind != TokenKind::Comment)
        .cloned()
        .collect()
}
