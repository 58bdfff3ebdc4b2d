use std::ops::Index;

use la_arena::{Arena, Idx};

use crate::diagnostics::Span;
use crate::literal::{IntLiteral, SizedInt};

pub type ItemId = Idx<Item>;
pub type TypeId = Idx<Type>;
pub type BlockId = Idx<Block>;
pub type InstId = Idx<Instruction>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpannedName {
    pub name: String,
    pub span: Span,
}

/// Owns every node of one parsed module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AstArena {
    pub items: Arena<Item>,
    pub types: Arena<Type>,
    pub blocks: Arena<Block>,
    pub insts: Arena<Instruction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    pub items: Vec<ItemId>,
    pub arena: AstArena,
    pub span: Span,
}

impl Module {
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter().map(|id| &self.arena.items[*id])
    }

    pub fn has_error_nodes(&self) -> bool {
        self.items().any(|item| match item {
            Item::Error { .. } => true,
            Item::FnDecl(FnDecl { body, .. }) | Item::ForeignFnDefn(ForeignFnDefn { body, .. }) => {
                body.iter().any(|block| {
                    self.arena.blocks[*block]
                        .instructions
                        .iter()
                        .any(|inst| matches!(self.arena.insts[*inst].kind, InstKind::Error))
                })
            }
            _ => false,
        })
    }
}

impl Index<ItemId> for Module {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Item {
        &self.arena.items[id]
    }
}

impl Index<TypeId> for Module {
    type Output = Type;

    fn index(&self, id: TypeId) -> &Type {
        &self.arena.types[id]
    }
}

impl Index<BlockId> for Module {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.arena.blocks[id]
    }
}

impl Index<InstId> for Module {
    type Output = Instruction;

    fn index(&self, id: InstId) -> &Instruction {
        &self.arena.insts[id]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Import(Import),
    StructDecl(StructDecl),
    EnumDecl(EnumDecl),
    FnDecl(FnDecl),
    ForeignFnDecl(ForeignFnDecl),
    ForeignFnDefn(ForeignFnDefn),
    /// An item that failed to parse; its tokens were skipped.
    Error { span: Span },
}

impl Item {
    pub fn span(&self) -> Span {
        match self {
            Item::Import(item) => item.span,
            Item::StructDecl(item) => item.span,
            Item::EnumDecl(item) => item.span,
            Item::FnDecl(item) => item.span,
            Item::ForeignFnDecl(item) => item.span,
            Item::ForeignFnDefn(item) => item.span,
            Item::Error { span } => *span,
        }
    }

    pub fn name(&self) -> Option<&SpannedName> {
        match self {
            Item::Import(item) => Some(&item.symbol),
            Item::StructDecl(item) => Some(&item.name),
            Item::EnumDecl(item) => Some(&item.name),
            Item::FnDecl(item) => Some(&item.name),
            Item::ForeignFnDecl(item) => Some(&item.name),
            Item::ForeignFnDefn(item) => Some(&item.name),
            Item::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Module path, segments joined with `::`.
    pub source: SpannedName,
    pub symbol: SpannedName,
    pub public: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    pub name: SpannedName,
    pub generics: Vec<SpannedName>,
    pub public: bool,
    pub variant: Variant,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: SpannedName,
    pub generics: Vec<SpannedName>,
    pub public: bool,
    pub variants: Vec<Variant>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnDecl {
    pub name: SpannedName,
    pub generics: Vec<SpannedName>,
    pub public: bool,
    pub params: Vec<Param>,
    pub ret_type: Option<TypeId>,
    pub body: Vec<BlockId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignFnDecl {
    pub name: SpannedName,
    pub public: bool,
    pub params: Vec<Param>,
    pub ret_type: Option<TypeId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignFnDefn {
    pub name: SpannedName,
    pub body: Vec<BlockId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantKind {
    CLike { fields: Vec<Field> },
    TupleLike { types: Vec<TypeId> },
    UnitLike,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub kind: VariantKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: SpannedName,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: SpannedName,
    pub ty: TypeId,
}

/// `name<pointee>[args]`: `pointee` is one level of indirection, `args` are
/// generic arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub name: SpannedName,
    pub pointee: Option<TypeId>,
    pub generic_args: Vec<TypeId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub label: SpannedName,
    pub instructions: Vec<InstId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    Typed { name: SpannedName, ty: TypeId, span: Span },
    Untyped { name: SpannedName },
}

impl Variable {
    pub fn name(&self) -> &SpannedName {
        match self {
            Variable::Typed { name, .. } | Variable::Untyped { name } => name,
        }
    }

    pub fn ty(&self) -> Option<TypeId> {
        match self {
            Variable::Typed { ty, .. } => Some(*ty),
            Variable::Untyped { .. } => None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Variable::Typed { span, .. } => *span,
            Variable::Untyped { name } => name.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Grt,
    Geq,
    Les,
    Leq,
    Neq,
    Ieq,
    Or,
    And,
    Lsh,
    Rsh,
    Xor,
}

impl BinaryOp {
    pub fn from_keyword(text: &str) -> Option<Self> {
        let op = match text {
            "add" => BinaryOp::Add,
            "sub" => BinaryOp::Sub,
            "mul" => BinaryOp::Mul,
            "div" => BinaryOp::Div,
            "rem" => BinaryOp::Rem,
            "grt" => BinaryOp::Grt,
            "geq" => BinaryOp::Geq,
            "les" => BinaryOp::Les,
            "leq" => BinaryOp::Leq,
            "neq" => BinaryOp::Neq,
            "ieq" => BinaryOp::Ieq,
            "or" => BinaryOp::Or,
            "and" => BinaryOp::And,
            "lsh" => BinaryOp::Lsh,
            "rsh" => BinaryOp::Rsh,
            "xor" => BinaryOp::Xor,
            _ => return None,
        };
        Some(op)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::Grt => "grt",
            BinaryOp::Geq => "geq",
            BinaryOp::Les => "les",
            BinaryOp::Leq => "leq",
            BinaryOp::Neq => "neq",
            BinaryOp::Ieq => "ieq",
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Lsh => "lsh",
            BinaryOp::Rsh => "rsh",
            BinaryOp::Xor => "xor",
        }
    }
}

/// Flat opcode view over [`InstKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Binary(BinaryOp),
    Not,
    GetPtr,
    GetFieldPtr,
    Call,
    Capa,
    Caps,
    Cape,
    Capsh,
    Capeh,
    Store,
    Load,
    Cast,
    Br,
    Cbr,
    Ret,
    Switch,
    Match,
    Error,
}

impl Opcode {
    pub fn keyword(self) -> &'static str {
        match self {
            Opcode::Binary(op) => op.keyword(),
            Opcode::Not => "not",
            Opcode::GetPtr => "getptr",
            Opcode::GetFieldPtr => "getfieldptr",
            Opcode::Call => "call",
            Opcode::Capa => "capa",
            Opcode::Caps => "caps",
            Opcode::Cape => "cape",
            Opcode::Capsh => "capsh",
            Opcode::Capeh => "capeh",
            Opcode::Store => "store",
            Opcode::Load => "load",
            Opcode::Cast => "cast",
            Opcode::Br => "br",
            Opcode::Cbr => "cbr",
            Opcode::Ret => "ret",
            Opcode::Switch => "switch",
            Opcode::Match => "match",
            Opcode::Error => "<error>",
        }
    }

    pub fn has_target(self) -> bool {
        !matches!(
            self,
            Opcode::Store
                | Opcode::Br
                | Opcode::Cbr
                | Opcode::Ret
                | Opcode::Switch
                | Opcode::Match
                | Opcode::Error
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSel {
    Name(SpannedName),
    Index(u32, Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchArm {
    pub value: IntLiteral,
    pub label: SpannedName,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchArm {
    /// Anonymous enum variants are selected by name or position, kept as written.
    pub variant: SpannedName,
    pub bindings: Vec<Variable>,
    pub label: SpannedName,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    Binary {
        op: BinaryOp,
        lhs: Variable,
        rhs: Variable,
    },
    Not {
        operand: Variable,
    },
    GetPtr {
        operand: Variable,
    },
    GetFieldPtr {
        base: Variable,
        path: Vec<FieldSel>,
    },
    Call {
        func: SpannedName,
        args: Vec<Variable>,
    },
    Capa {
        literal: SizedInt,
    },
    Caps {
        ty: TypeId,
        args: Vec<Variable>,
    },
    Cape {
        enum_name: SpannedName,
        generic_args: Vec<TypeId>,
        variant: SpannedName,
        args: Vec<Variable>,
    },
    Capsh {
        name: SpannedName,
    },
    Capeh {
        name: SpannedName,
    },
    Store {
        dest: Variable,
        value: Variable,
    },
    Load {
        src: Variable,
    },
    Cast {
        operand: Variable,
        to: TypeId,
    },
    Br {
        label: SpannedName,
    },
    Cbr {
        cond: Variable,
        then_label: SpannedName,
        else_label: SpannedName,
    },
    Ret {
        value: Variable,
    },
    Switch {
        scrutinee: Variable,
        default: SpannedName,
        arms: Vec<SwitchArm>,
    },
    Match {
        scrutinee: Variable,
        default: SpannedName,
        arms: Vec<MatchArm>,
    },
    /// A malformed instruction; tokens up to the next block boundary were skipped.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub target: Option<Variable>,
    pub kind: InstKind,
    pub span: Span,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match &self.kind {
            InstKind::Binary { op, .. } => Opcode::Binary(*op),
            InstKind::Not { .. } => Opcode::Not,
            InstKind::GetPtr { .. } => Opcode::GetPtr,
            InstKind::GetFieldPtr { .. } => Opcode::GetFieldPtr,
            InstKind::Call { .. } => Opcode::Call,
            InstKind::Capa { .. } => Opcode::Capa,
            InstKind::Caps { .. } => Opcode::Caps,
            InstKind::Cape { .. } => Opcode::Cape,
            InstKind::Capsh { .. } => Opcode::Capsh,
            InstKind::Capeh { .. } => Opcode::Capeh,
            InstKind::Store { .. } => Opcode::Store,
            InstKind::Load { .. } => Opcode::Load,
            InstKind::Cast { .. } => Opcode::Cast,
            InstKind::Br { .. } => Opcode::Br,
            InstKind::Cbr { .. } => Opcode::Cbr,
            InstKind::Ret { .. } => Opcode::Ret,
            InstKind::Switch { .. } => Opcode::Switch,
            InstKind::Match { .. } => Opcode::Match,
            InstKind::Error => Opcode::Error,
        }
    }
}
