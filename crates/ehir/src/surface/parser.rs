mod instructions;
mod items;
mod types;

use crate::config::ParseOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Span};
use crate::lexer::{filter_tokens, lex, token_diagnostics, Token, TokenKind};

use super::ast::*;

/// Parses one EHIR module. Always yields a module; problems are reported as
/// diagnostics and malformed items become [`Item::Error`] nodes.
pub fn parse(source: &str) -> (Module, Vec<Diagnostic>) {
    parse_with_options(source, &ParseOptions::default())
}

pub fn parse_with_options(source: &str, options: &ParseOptions) -> (Module, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = lex(source);
    let (module, mut parse_diags) = parse_token_stream(&tokens, source.len(), options);
    diagnostics.append(&mut parse_diags);
    (module, diagnostics)
}

/// Parses an already-lexed token stream (comments are dropped here). Lexical
/// problems carried by the tokens are reported ahead of syntax diagnostics,
/// exactly as [`parse_with_options`] reports them.
pub fn parse_tokens(
    tokens: &[Token],
    source_len: usize,
    options: &ParseOptions,
) -> (Module, Vec<Diagnostic>) {
    let mut diagnostics = token_diagnostics(tokens);
    let (module, mut parse_diags) = parse_token_stream(tokens, source_len, options);
    diagnostics.append(&mut parse_diags);
    (module, diagnostics)
}

fn parse_token_stream(
    tokens: &[Token],
    source_len: usize,
    options: &ParseOptions,
) -> (Module, Vec<Diagnostic>) {
    let mut tokens = filter_tokens(tokens);
    if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            span: Span::empty(source_len),
        });
    }
    let mut parser = Parser::new(tokens, options);
    let module = parser.parse_module(source_len);
    (module, parser.diagnostics)
}

/// Parses independent sources on scoped worker threads. Results keep input order.
pub fn parse_many<S>(sources: &[S], options: &ParseOptions) -> Vec<(Module, Vec<Diagnostic>)>
where
    S: AsRef<str> + Sync,
{
    if sources.is_empty() {
        return Vec::new();
    }
    let workers = std::thread::available_parallelism()
        .map_or(1, usize::from)
        .min(sources.len());
    let chunk_size = sources.len().div_ceil(workers);
    std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|source| parse_with_options(source.as_ref(), options))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

struct Parser<'a> {
    /// Comment-free stream; the last token is always `Eof`.
    tokens: Vec<Token>,
    pos: usize,
    arena: AstArena,
    diagnostics: Vec<Diagnostic>,
    options: &'a ParseOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token>, options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            arena: AstArena::default(),
            diagnostics: Vec::new(),
            options,
            depth: 0,
        }
    }

    fn parse_module(&mut self, source_len: usize) -> Module {
        let mut items = Vec::new();
        while !self.at(TokenKind::Eof) {
            let start = self.pos;
            let start_span = self.peek_span();
            let item = match self.parse_item() {
                Some(item) => item,
                None => {
                    self.recover_to_item(start);
                    Item::Error {
                        span: start_span.merge(self.previous_span()),
                    }
                }
            };
            items.push(self.arena.items.alloc(item));
        }
        Module {
            items,
            arena: std::mem::take(&mut self.arena),
            span: Span::new(0, source_len),
        }
    }

    // Token cursor

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn nth_kind(&self, n: usize) -> TokenKind {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        self.tokens[index].kind
    }

    fn peek_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            return Span::empty(self.peek_span().start);
        }
        self.tokens[self.pos - 1].span
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_ident(&self, text: &str) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Ident && token.text == text
    }

    fn at_item_start(&self) -> bool {
        let kind = self.peek_kind();
        kind.is_item_keyword() || matches!(kind, TokenKind::At | TokenKind::Pub | TokenKind::Struct)
    }

    /// Advances one token; never moves past `Eof`.
    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn consume(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            return Some(self.bump());
        }
        None
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if let Some(token) = self.consume(kind) {
            return Some(token);
        }
        self.error_expected(message, vec![kind]);
        None
    }

    fn expect_name(&mut self, message: &str) -> Option<SpannedName> {
        let token = self.expect(TokenKind::Ident, message)?;
        Some(SpannedName {
            name: token.text,
            span: token.span,
        })
    }

    fn expect_label(&mut self, message: &str) -> Option<SpannedName> {
        let token = self.expect(TokenKind::Label, message)?;
        Some(label_name(&token))
    }

    /// Parses `item (, item)* ,? close` after the opening delimiter was consumed.
    fn parse_comma_list<T>(
        &mut self,
        close: TokenKind,
        open_span: Span,
        what: &str,
        mut parse_element: impl FnMut(&mut Self) -> Option<T>,
    ) -> Option<(Vec<T>, Span)> {
        let mut elements = Vec::new();
        loop {
            if let Some(token) = self.consume(close) {
                return Some((elements, open_span.merge(token.span)));
            }
            // A list still open at the next item never got its closer.
            if self.at(TokenKind::Eof) || self.at_item_start() {
                self.unterminated(what, close, open_span);
                return None;
            }
            elements.push(parse_element(self)?);
            if self.consume(TokenKind::Comma).is_some() || self.at(close) {
                continue;
            }
            if self.at(TokenKind::Eof) || self.at_item_start() {
                self.unterminated(what, close, open_span);
                return None;
            }
            self.error_expected(
                &format!("expected `,` or {close} in {what}"),
                vec![TokenKind::Comma, close],
            );
            return None;
        }
    }

    fn enter_nesting(&mut self) -> Option<()> {
        if self.depth >= self.options.max_nesting {
            let span = self.peek_span();
            self.emit(
                "E1509",
                format!("nesting exceeds the limit of {}", self.options.max_nesting),
                span,
            );
            return None;
        }
        self.depth += 1;
        Some(())
    }

    fn leave_nesting(&mut self) {
        self.depth -= 1;
    }

    // Diagnostics

    fn emit(&mut self, code: &str, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(
            code,
            DiagnosticKind::SyntaxError,
            message,
            span,
        ));
    }

    fn error_expected(&mut self, message: &str, expected: Vec<TokenKind>) {
        // The lexer already reported invalid tokens.
        if self.at(TokenKind::Invalid) {
            return;
        }
        let found = self.peek();
        let message = if found.kind == TokenKind::Eof {
            format!("{message}, found end of input")
        } else {
            format!("{message}, found `{}`", found.text)
        };
        let code = if expected.len() == 1 { "E1501" } else { "E1500" };
        self.diagnostics.push(
            Diagnostic::error(code, DiagnosticKind::SyntaxError, message, found.span)
                .with_expected(expected),
        );
    }

    fn unterminated(&mut self, what: &str, close: TokenKind, open_span: Span) {
        let span = self.peek_span();
        self.diagnostics.push(
            Diagnostic::error(
                "E1502",
                DiagnosticKind::SyntaxError,
                format!("unterminated {what}"),
                span,
            )
            .with_expected(vec![close])
            .with_label("opened here", open_span),
        );
    }

    // Recovery

    /// Skips to the next plausible item start. A bracket group that opens and
    /// closes while skipping ends recovery right after its closing `}`.
    fn recover_to_item(&mut self, start: usize) {
        if self.pos == start && !self.at(TokenKind::Eof) {
            self.bump();
        }
        let mut depth = 0usize;
        while !self.at(TokenKind::Eof) && !self.at_item_start() {
            let token = self.bump();
            match token.kind {
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    if depth <= 1 && token.kind == TokenKind::RBrace {
                        break;
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
        }
    }

    /// Skips to the next block label or the `}` closing the function body.
    fn recover_in_body(&mut self, start: usize) {
        if self.pos == start && !self.at(TokenKind::Eof) && !self.at(TokenKind::RBrace) {
            self.bump();
        }
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                _ if self.at_item_start() => break,
                TokenKind::Label if depth == 0 => break,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => depth -= 1,
                TokenKind::LBrace => depth += 1,
                _ => {}
            }
            self.bump();
        }
    }
}

fn label_name(token: &Token) -> SpannedName {
    SpannedName {
        name: token.text.trim_start_matches('$').to_string(),
        span: token.span,
    }
}
