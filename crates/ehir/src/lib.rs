//! Front end for EHIR, a textual intermediate representation of structs,
//! enums and functions made of labelled basic blocks.
//!
//! [`parse`] turns source text into a [`Module`] plus [`Diagnostic`]s. It
//! never fails: malformed items and instructions become error nodes and the
//! parser carries on with the rest of the input.

pub mod config;
mod diagnostics;
mod formatter;
mod lexer;
mod literal;
pub mod surface;
mod syntax;

pub use config::ParseOptions;
pub use diagnostics::{
    diagnostics_have_errors, diagnostics_to_json, render_diagnostic, render_diagnostics,
    Diagnostic, DiagnosticKind, DiagnosticLabel, DiagnosticSeverity, LineIndex, Position, Span,
};
pub use formatter::{format_instruction, format_module, format_type};
pub use lexer::{filter_tokens, lex, token_diagnostics, Token, TokenKind};
pub use literal::{decode_int_literal, Base, IntLiteral, LiteralError, SizedInt, UnsizedInt};
pub use surface::{
    parse, parse_many, parse_tokens, parse_with_options, AstArena, BinaryOp, Block, BlockId,
    EnumDecl, Field, FieldSel, FnDecl, ForeignFnDecl, ForeignFnDefn, Import, InstId, InstKind,
    Instruction, Item, ItemId, MatchArm, Module, Opcode, Param, SpannedName, StructDecl,
    SwitchArm, Type, TypeId, Variable, Variant, VariantKind,
};

#[derive(Debug, thiserror::Error)]
pub enum EhirError {
    #[error("invalid parser configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to serialize diagnostics: {0}")]
    Json(#[from] serde_json::Error),
}
