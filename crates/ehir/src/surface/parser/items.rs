use crate::diagnostics::{Diagnostic, DiagnosticKind, Span};
use crate::lexer::TokenKind;
use crate::surface::ast::*;

use super::Parser;

const ITEM_START: &[TokenKind] = &[
    TokenKind::Imp,
    TokenKind::Enum,
    TokenKind::Fn,
    TokenKind::Fdecl,
    TokenKind::Fdefi,
    TokenKind::Ident,
    TokenKind::At,
];

impl Parser<'_> {
    pub(super) fn parse_item(&mut self) -> Option<Item> {
        let start = self.peek_span();
        let mut public = self.consume(TokenKind::At).is_some();

        match self.peek_kind() {
            TokenKind::Pub => {
                let span = self.bump().span;
                self.diagnostics.push(Diagnostic::error(
                    "E1600",
                    DiagnosticKind::UnsupportedConstruct,
                    "`pub` is not an EHIR visibility modifier; prefix public items with `@`",
                    span,
                ));
                public = true;
            }
            TokenKind::Struct => {
                let span = self.bump().span;
                self.diagnostics.push(Diagnostic::error(
                    "E1600",
                    DiagnosticKind::UnsupportedConstruct,
                    "`struct` is not an EHIR item keyword; declare structs as `Name { ... }`",
                    span,
                ));
            }
            _ => {}
        }

        match self.peek_kind() {
            TokenKind::Imp => self.parse_import(public, start).map(Item::Import),
            TokenKind::Enum => self.parse_enum(public, start).map(Item::EnumDecl),
            TokenKind::Fn => self.parse_fn(public, start).map(Item::FnDecl),
            TokenKind::Fdecl => self.parse_fdecl(public, start).map(Item::ForeignFnDecl),
            TokenKind::Fdefi => {
                if public {
                    self.emit(
                        "E1500",
                        "foreign definitions cannot be marked public with `@`",
                        start,
                    );
                }
                self.parse_fdefi(start).map(Item::ForeignFnDefn)
            }
            // Tuple-struct field lists are only parsed here, at item level; `(`
            // after a `fn`/`fdecl` name is always a parameter list.
            TokenKind::Ident => self.parse_struct(public, start).map(Item::StructDecl),
            _ => {
                self.error_expected("expected an item", ITEM_START.to_vec());
                None
            }
        }
    }

    fn parse_import(&mut self, public: bool, start: Span) -> Option<Import> {
        self.bump();
        let mut segments = vec![self.expect_name("expected a module path after `imp`")?];
        while self.consume(TokenKind::ColonColon).is_some() {
            segments.push(self.expect_name("expected a path segment after `::`")?);
        }
        if segments.len() < 2 {
            self.error_expected(
                "expected `::` followed by the imported symbol",
                vec![TokenKind::ColonColon],
            );
            return None;
        }
        let symbol = segments.pop()?;
        let source = SpannedName {
            name: segments
                .iter()
                .map(|segment| segment.name.as_str())
                .collect::<Vec<_>>()
                .join("::"),
            span: segments[0].span.merge(segments[segments.len() - 1].span),
        };
        Some(Import {
            source,
            symbol,
            public,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_struct(&mut self, public: bool, start: Span) -> Option<StructDecl> {
        let name = self.expect_name("expected a struct name")?;
        let generics = self.parse_generic_params()?;
        let variant = match self.peek_kind() {
            TokenKind::LBrace => self.parse_field_list()?,
            TokenKind::LParen => self.parse_tuple_fields()?,
            _ => Variant {
                kind: VariantKind::UnitLike,
                span: name.span,
            },
        };
        Some(StructDecl {
            name,
            generics,
            public,
            variant,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_enum(&mut self, public: bool, start: Span) -> Option<EnumDecl> {
        self.bump();
        let name = self.expect_name("expected an enum name")?;
        let generics = self.parse_generic_params()?;
        let open = self.expect(TokenKind::LBrace, "expected `{` to start enum variants")?;
        let (variants, _) =
            self.parse_comma_list(TokenKind::RBrace, open.span, "enum variant list", |p| {
                p.parse_enum_variant()
            })?;
        Some(EnumDecl {
            name,
            generics,
            public,
            variants,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_enum_variant(&mut self) -> Option<Variant> {
        match self.peek_kind() {
            TokenKind::LBrace => self.parse_field_list(),
            TokenKind::LParen => {
                let mut variant = self.parse_tuple_fields()?;
                if matches!(&variant.kind, VariantKind::TupleLike { types } if types.is_empty()) {
                    variant.kind = VariantKind::UnitLike;
                }
                Some(variant)
            }
            _ => {
                self.error_expected(
                    "expected an enum variant",
                    vec![TokenKind::LBrace, TokenKind::LParen],
                );
                None
            }
        }
    }

    fn parse_field_list(&mut self) -> Option<Variant> {
        let open = self.bump();
        let (fields, span) =
            self.parse_comma_list(TokenKind::RBrace, open.span, "field list", |p| {
                let name = p.expect_name("expected a field name")?;
                p.expect(TokenKind::Colon, "expected `:` after field name")?;
                let ty = p.parse_type()?;
                Some(Field { name, ty })
            })?;
        Some(Variant {
            kind: VariantKind::CLike { fields },
            span,
        })
    }

    fn parse_tuple_fields(&mut self) -> Option<Variant> {
        let open = self.bump();
        let (types, span) =
            self.parse_comma_list(TokenKind::RParen, open.span, "tuple field list", |p| {
                p.parse_type()
            })?;
        Some(Variant {
            kind: VariantKind::TupleLike { types },
            span,
        })
    }

    fn parse_generic_params(&mut self) -> Option<Vec<SpannedName>> {
        let Some(open) = self.consume(TokenKind::LBracket) else {
            return Some(Vec::new());
        };
        let (params, span) =
            self.parse_comma_list(TokenKind::RBracket, open.span, "generic parameter list", |p| {
                p.expect_name("expected a generic parameter name")
            })?;
        if params.is_empty() {
            self.emit("E1501", "generic parameter list cannot be empty", span);
            return None;
        }
        Some(params)
    }

    fn parse_fn(&mut self, public: bool, start: Span) -> Option<FnDecl> {
        self.bump();
        let name = self.expect_name("expected a function name after `fn`")?;
        let generics = self.parse_generic_params()?;
        let params = self.parse_params()?;
        let ret_type = self.parse_ret_type()?;
        let body = self.parse_body()?;
        Some(FnDecl {
            name,
            generics,
            public,
            params,
            ret_type,
            body,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_fdecl(&mut self, public: bool, start: Span) -> Option<ForeignFnDecl> {
        self.bump();
        let name = self.expect_name("expected a function name after `fdecl`")?;
        let params = self.parse_params()?;
        let ret_type = self.parse_ret_type()?;
        Some(ForeignFnDecl {
            name,
            public,
            params,
            ret_type,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_fdefi(&mut self, start: Span) -> Option<ForeignFnDefn> {
        self.bump();
        let name = self.expect_name("expected a function name after `fdefi`")?;
        let body = self.parse_body()?;
        Some(ForeignFnDefn {
            name,
            body,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let open = self.expect(TokenKind::LParen, "expected `(` to start the parameter list")?;
        let (params, _) =
            self.parse_comma_list(TokenKind::RParen, open.span, "parameter list", |p| {
                let name = p.expect_name("expected a parameter name")?;
                p.expect(TokenKind::Colon, "expected `:` and a type after the parameter name")?;
                let ty = p.parse_type()?;
                Some(Param { name, ty })
            })?;
        Some(params)
    }

    fn parse_ret_type(&mut self) -> Option<Option<TypeId>> {
        if self.consume(TokenKind::Arrow).is_none() {
            return Some(None);
        }
        self.parse_type().map(Some)
    }
}
