use crate::diagnostics::Span;
use crate::lexer::TokenKind;
use crate::literal::{decode_int_literal, IntLiteral};
use crate::surface::ast::*;

use super::Parser;

impl Parser<'_> {
    /// `Type := ident ('<' Type '>')? ('[' Type (',' Type)* ']')?`
    pub(super) fn parse_type(&mut self) -> Option<TypeId> {
        self.enter_nesting()?;
        let ty = self.parse_type_inner();
        self.leave_nesting();
        ty
    }

    fn parse_type_inner(&mut self) -> Option<TypeId> {
        let name = self.expect_name("expected a type")?;
        let pointee = match self.consume(TokenKind::Lt) {
            Some(open) => {
                let inner = self.parse_type()?;
                if self.consume(TokenKind::Gt).is_none() {
                    if self.at(TokenKind::Eof) {
                        self.unterminated("pointer type", TokenKind::Gt, open.span);
                    } else {
                        self.error_expected(
                            "expected `>` to close the pointer type",
                            vec![TokenKind::Gt],
                        );
                    }
                    return None;
                }
                Some(inner)
            }
            None => None,
        };
        let generic_args = match self.consume(TokenKind::LBracket) {
            Some(open) => self.parse_generic_args(open.span)?,
            None => Vec::new(),
        };
        let span = name.span.merge(self.previous_span());
        Some(self.arena.types.alloc(Type {
            name,
            pointee,
            generic_args,
            span,
        }))
    }

    /// Parses `Type (, Type)* ]` after the opening `[`.
    pub(super) fn parse_generic_args(&mut self, open: Span) -> Option<Vec<TypeId>> {
        let (args, span) =
            self.parse_comma_list(TokenKind::RBracket, open, "generic argument list", |p| {
                p.parse_type()
            })?;
        if args.is_empty() {
            self.emit("E1501", "generic argument list cannot be empty", span);
            return None;
        }
        Some(args)
    }

    /// `Variable := ident (':' Type)?`
    pub(super) fn parse_variable(&mut self) -> Option<Variable> {
        let name = self.expect_name("expected a variable")?;
        if self.consume(TokenKind::Colon).is_none() {
            return Some(Variable::Untyped { name });
        }
        let ty = self.parse_type()?;
        let span = name.span.merge(self.arena.types[ty].span);
        Some(Variable::Typed { name, ty, span })
    }

    pub(super) fn parse_variable_list(&mut self, what: &str) -> Option<Vec<Variable>> {
        let open = self.expect(TokenKind::LParen, &format!("expected `(` to start {what}"))?;
        let (vars, _) =
            self.parse_comma_list(TokenKind::RParen, open.span, what, |p| p.parse_variable())?;
        Some(vars)
    }

    pub(super) fn parse_int_literal(&mut self, message: &str) -> Option<IntLiteral> {
        let token = self.expect(TokenKind::Number, message)?;
        // Malformed literals were already reported by the lexer.
        decode_int_literal(&token.text, token.span).ok()
    }
}
