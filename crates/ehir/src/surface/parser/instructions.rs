use std::collections::{HashMap, HashSet};

use crate::diagnostics::{Diagnostic, DiagnosticKind, Span};
use crate::lexer::TokenKind;
use crate::literal::IntLiteral;
use crate::surface::ast::*;
use crate::syntax::{self, DEFAULT_ARM};

use super::{label_name, Parser};

impl Parser<'_> {
    /// `{ Block* }`. A missing `}` is reported but the blocks parsed so far are kept.
    pub(super) fn parse_body(&mut self) -> Option<Vec<BlockId>> {
        let open = self.expect(TokenKind::LBrace, "expected `{` to start the function body")?;
        let mut blocks = Vec::new();
        let mut labels: HashMap<String, Span> = HashMap::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.unterminated("function body", TokenKind::RBrace, open.span);
                    break;
                }
                _ if self.at_item_start() => {
                    self.unterminated("function body", TokenKind::RBrace, open.span);
                    break;
                }
                TokenKind::Label => {
                    let block = self.parse_block(&mut labels);
                    blocks.push(self.arena.blocks.alloc(block));
                }
                _ => {
                    let start = self.pos;
                    self.error_expected(
                        "expected a block label",
                        vec![TokenKind::Label, TokenKind::RBrace],
                    );
                    self.recover_in_body(start);
                }
            }
        }
        Some(blocks)
    }

    fn parse_block(&mut self, labels: &mut HashMap<String, Span>) -> Block {
        let label = label_name(&self.bump());
        if let Some(first) = labels.get(&label.name) {
            self.diagnostics.push(
                Diagnostic::error(
                    "E1505",
                    DiagnosticKind::SyntaxError,
                    format!("duplicate block label `${}`", label.name),
                    label.span,
                )
                .with_label("first defined here", *first),
            );
        } else {
            labels.insert(label.name.clone(), label.span);
        }
        self.expect(TokenKind::Colon, "expected `:` after block label");

        let mut defined: HashSet<String> = HashSet::new();
        let mut instructions = Vec::new();
        while !matches!(
            self.peek_kind(),
            TokenKind::Label | TokenKind::RBrace | TokenKind::Eof
        ) && !self.at_item_start()
        {
            let inst = self.parse_instruction();
            self.check_target_convention(&inst, &mut defined);
            instructions.push(self.arena.insts.alloc(inst));
        }
        Block {
            span: label.span.merge(self.previous_span()),
            label,
            instructions,
        }
    }

    /// Warns when the first definition of a target in a block carries no type.
    fn check_target_convention(&mut self, inst: &Instruction, defined: &mut HashSet<String>) {
        let Some(target) = &inst.target else {
            return;
        };
        let first = defined.insert(target.name().name.clone());
        if let Variable::Untyped { name } = target {
            if first && self.options.warn_untyped_targets {
                self.diagnostics.push(Diagnostic::warning(
                    "W0001",
                    DiagnosticKind::SyntaxError,
                    format!(
                        "`{}` is defined without a type; annotate its first definition in a block",
                        name.name
                    ),
                    name.span,
                ));
            }
        }
    }

    fn parse_instruction(&mut self) -> Instruction {
        let start = self.pos;
        let start_span = self.peek_span();
        match self.parse_instruction_inner() {
            Some((target, kind)) => Instruction {
                target,
                kind,
                span: start_span.merge(self.previous_span()),
            },
            None => {
                self.recover_in_body(start);
                Instruction {
                    target: None,
                    kind: InstKind::Error,
                    span: start_span.merge(self.previous_span()),
                }
            }
        }
    }

    fn parse_instruction_inner(&mut self) -> Option<(Option<Variable>, InstKind)> {
        if !self.at(TokenKind::Ident) {
            self.error_expected(
                "expected an instruction",
                vec![TokenKind::Ident, TokenKind::Label, TokenKind::RBrace],
            );
            return None;
        }
        let head = self.peek().clone();
        let has_target = matches!(self.nth_kind(1), TokenKind::Colon | TokenKind::Eq);

        if !has_target {
            if syntax::is_targetless_opcode(&head.text) {
                self.bump();
                return Some((None, self.parse_targetless_op(&head.text)?));
            }
            if syntax::is_value_opcode(&head.text) {
                self.bump();
                self.parse_value_op(&head.text, head.span)?;
                self.emit(
                    "E1506",
                    format!(
                        "`{}` produces a value and needs an assignment target",
                        head.text
                    ),
                    head.span,
                );
                return Some((None, InstKind::Error));
            }
            self.bump();
            self.emit("E1500", format!("unknown opcode `{}`", head.text), head.span);
            return None;
        }

        let target = self.parse_variable()?;
        self.expect(TokenKind::Eq, "expected `=` after the assignment target")?;
        let op = self.expect(TokenKind::Ident, "expected an opcode after `=`")?;
        if syntax::is_targetless_opcode(&op.text) {
            self.parse_targetless_op(&op.text)?;
            self.emit(
                "E1507",
                format!("`{}` does not produce a value and cannot be assigned", op.text),
                op.span,
            );
            return Some((None, InstKind::Error));
        }
        let kind = self.parse_value_op(&op.text, op.span)?;
        Some((Some(target), kind))
    }

    fn parse_value_op(&mut self, op: &str, op_span: Span) -> Option<InstKind> {
        if let Some(op) = BinaryOp::from_keyword(op) {
            let lhs = self.parse_variable()?;
            self.expect(TokenKind::Comma, "expected `,` between operands")?;
            let rhs = self.parse_variable()?;
            return Some(InstKind::Binary { op, lhs, rhs });
        }
        let kind = match op {
            "not" => InstKind::Not {
                operand: self.parse_variable()?,
            },
            "getptr" => InstKind::GetPtr {
                operand: self.parse_variable()?,
            },
            "load" => InstKind::Load {
                src: self.parse_variable()?,
            },
            "getfieldptr" => {
                let base = self.parse_variable()?;
                self.expect(TokenKind::Comma, "expected `,` and a field path after the base")?;
                let mut path = vec![self.parse_field_sel()?];
                while self.consume(TokenKind::Comma).is_some() {
                    path.push(self.parse_field_sel()?);
                }
                InstKind::GetFieldPtr { base, path }
            }
            "call" => {
                let func = self.expect_name("expected a function name after `call`")?;
                let args = self.parse_variable_list("call arguments")?;
                InstKind::Call { func, args }
            }
            "capa" => {
                let literal = self.parse_int_literal("expected a sized integer literal")?;
                match literal {
                    IntLiteral::Sized(literal) => InstKind::Capa { literal },
                    IntLiteral::Unsized(literal) => {
                        self.emit(
                            "E1508",
                            "`capa` needs a sized literal such as `1_i32` or `0xFF_u8`",
                            literal.span,
                        );
                        InstKind::Error
                    }
                }
            }
            "caps" => {
                let ty = self.parse_type()?;
                let args = self.parse_variable_list("struct fields")?;
                InstKind::Caps { ty, args }
            }
            "cape" => self.parse_cape()?,
            "capsh" => InstKind::Capsh {
                name: self.expect_name("expected a struct name after `capsh`")?,
            },
            "capeh" => InstKind::Capeh {
                name: self.expect_name("expected an enum name after `capeh`")?,
            },
            "cast" => {
                let operand = self.parse_variable()?;
                self.expect(TokenKind::Arrow, "expected `->` and the target type")?;
                let to = self.parse_type()?;
                InstKind::Cast { operand, to }
            }
            _ => {
                self.emit("E1500", format!("unknown opcode `{op}`"), op_span);
                return None;
            }
        };
        Some(kind)
    }

    /// `cape Enum ([Type, ...])? :: variant ((args))?`
    fn parse_cape(&mut self) -> Option<InstKind> {
        let enum_name = self.expect_name("expected an enum name after `cape`")?;
        let generic_args = match self.consume(TokenKind::LBracket) {
            Some(open) => self.parse_generic_args(open.span)?,
            None => Vec::new(),
        };
        self.expect(TokenKind::ColonColon, "expected `::` and a variant")?;
        let variant = self.parse_variant_selector()?;
        let args = if self.at(TokenKind::LParen) {
            self.parse_variable_list("variant fields")?
        } else {
            Vec::new()
        };
        Some(InstKind::Cape {
            enum_name,
            generic_args,
            variant,
            args,
        })
    }

    fn parse_field_sel(&mut self) -> Option<FieldSel> {
        match self.peek_kind() {
            TokenKind::Ident => {
                let token = self.bump();
                Some(FieldSel::Name(SpannedName {
                    name: token.text,
                    span: token.span,
                }))
            }
            TokenKind::Number => {
                let span = self.peek_span();
                let literal = self.parse_int_literal("expected a field index")?;
                match literal {
                    IntLiteral::Unsized(lit) if lit.value <= u128::from(u32::MAX) => {
                        Some(FieldSel::Index(lit.value as u32, span))
                    }
                    _ => {
                        self.emit(
                            "E1500",
                            "field index must be an unsuffixed integer that fits in 32 bits",
                            span,
                        );
                        None
                    }
                }
            }
            _ => {
                self.error_expected(
                    "expected a field name or index",
                    vec![TokenKind::Ident, TokenKind::Number],
                );
                None
            }
        }
    }

    /// Enum variants are anonymous, so a variant is named by an identifier or
    /// its position; the text is kept as written.
    fn parse_variant_selector(&mut self) -> Option<SpannedName> {
        if matches!(self.peek_kind(), TokenKind::Ident | TokenKind::Number) {
            let token = self.bump();
            return Some(SpannedName {
                name: token.text,
                span: token.span,
            });
        }
        self.error_expected(
            "expected a variant name or index",
            vec![TokenKind::Ident, TokenKind::Number],
        );
        None
    }

    fn parse_targetless_op(&mut self, op: &str) -> Option<InstKind> {
        let kind = match op {
            "store" => {
                let dest = self.parse_variable()?;
                self.expect(TokenKind::Comma, "expected `,` between destination and value")?;
                let value = self.parse_variable()?;
                InstKind::Store { dest, value }
            }
            "br" => InstKind::Br {
                label: self.expect_label("expected a block label after `br`")?,
            },
            "cbr" => {
                let cond = self.parse_variable()?;
                self.expect(TokenKind::Comma, "expected `,` after the condition")?;
                let then_label = self.expect_label("expected the label taken when true")?;
                self.expect(TokenKind::Comma, "expected `,` between branch labels")?;
                let else_label = self.expect_label("expected the label taken when false")?;
                InstKind::Cbr {
                    cond,
                    then_label,
                    else_label,
                }
            }
            "ret" => InstKind::Ret {
                value: self.parse_variable()?,
            },
            "switch" => self.parse_switch()?,
            "match" => self.parse_match()?,
            _ => return None,
        };
        Some(kind)
    }

    fn parse_switch(&mut self) -> Option<InstKind> {
        let start = self.previous_span();
        let scrutinee = self.parse_variable()?;
        let open = self.expect(TokenKind::LBrace, "expected `{` to start switch arms")?;
        let mut default = None;
        let parsed = self.parse_comma_list(TokenKind::RBrace, open.span, "switch arms", |p| {
            if p.at_ident(DEFAULT_ARM) {
                p.parse_default_arm(&mut default)?;
                return Some(None);
            }
            let value = p.parse_int_literal("expected a case value or `default`")?;
            p.expect(TokenKind::Arrow, "expected `->` after the case value")?;
            let label = p.expect_label("expected a block label")?;
            Some(Some(SwitchArm {
                span: value.span().merge(label.span),
                value,
                label,
            }))
        });
        let Some((arms, _)) = parsed else {
            self.skip_arm_list();
            return None;
        };
        let arms = arms.into_iter().flatten().collect();
        let Some(default) = default else {
            self.missing_default("switch", start);
            return Some(InstKind::Error);
        };
        Some(InstKind::Switch {
            scrutinee,
            default,
            arms,
        })
    }

    fn parse_match(&mut self) -> Option<InstKind> {
        let start = self.previous_span();
        let scrutinee = self.parse_variable()?;
        let open = self.expect(TokenKind::LBrace, "expected `{` to start match arms")?;
        let mut default = None;
        let parsed = self.parse_comma_list(TokenKind::RBrace, open.span, "match arms", |p| {
            if p.at_ident(DEFAULT_ARM) {
                p.parse_default_arm(&mut default)?;
                return Some(None);
            }
            let variant = p.parse_variant_selector()?;
            let bindings = if p.at(TokenKind::LParen) {
                p.parse_variable_list("pattern bindings")?
            } else {
                Vec::new()
            };
            p.expect(TokenKind::Arrow, "expected `->` after the pattern")?;
            let label = p.expect_label("expected a block label")?;
            Some(Some(MatchArm {
                span: variant.span.merge(label.span),
                variant,
                bindings,
                label,
            }))
        });
        let Some((arms, _)) = parsed else {
            self.skip_arm_list();
            return None;
        };
        let arms = arms.into_iter().flatten().collect();
        let Some(default) = default else {
            self.missing_default("match", start);
            return Some(InstKind::Error);
        };
        Some(InstKind::Match {
            scrutinee,
            default,
            arms,
        })
    }

    /// `default -> $label`; a second default arm is reported and ignored.
    fn parse_default_arm(&mut self, default: &mut Option<SpannedName>) -> Option<()> {
        let keyword = self.bump();
        self.expect(TokenKind::Arrow, "expected `->` after `default`")?;
        let label = self.expect_label("expected a block label")?;
        match default {
            Some(first) => {
                let first = first.span;
                self.diagnostics.push(
                    Diagnostic::error(
                        "E1504",
                        DiagnosticKind::SyntaxError,
                        "only one `default` arm is allowed",
                        keyword.span.merge(label.span),
                    )
                    .with_label("first `default` arm here", first),
                );
            }
            None => *default = Some(label),
        }
        Some(())
    }

    fn missing_default(&mut self, what: &str, span: Span) {
        let span = span.merge(self.previous_span());
        self.emit(
            "E1503",
            format!("`{what}` needs exactly one `default` arm"),
            span,
        );
    }

    /// Skips past the `}` closing a broken arm list, so recovery does not
    /// mistake it for the end of the function body.
    fn skip_arm_list(&mut self) {
        let mut depth = 0usize;
        while !self.at(TokenKind::Eof) && !self.at_item_start() {
            match self.bump().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }
    }
}
