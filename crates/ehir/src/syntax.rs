use crate::lexer::TokenKind;

pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("imp", TokenKind::Imp),
    ("enum", TokenKind::Enum),
    ("fn", TokenKind::Fn),
    ("fdecl", TokenKind::Fdecl),
    ("fdefi", TokenKind::Fdefi),
    // Reserved by earlier surface versions; recognized so they can be reported.
    ("pub", TokenKind::Pub),
    ("struct", TokenKind::Struct),
];

pub const BINARY_OPCODES: &[&str] = &[
    "add", "sub", "mul", "div", "rem", "grt", "geq", "les", "leq", "neq", "ieq", "or", "and",
    "lsh", "rsh", "xor",
];

pub const VALUE_OPCODES: &[&str] = &[
    "not",
    "getptr",
    "getfieldptr",
    "call",
    "capa",
    "caps",
    "cape",
    "capsh",
    "capeh",
    "load",
    "cast",
];

pub const TARGETLESS_OPCODES: &[&str] = &["store", "br", "cbr", "ret", "switch", "match"];

pub const DEFAULT_ARM: &str = "default";

pub const SYMBOLS_2: &[([char; 2], TokenKind)] = &[
    (['-', '>'], TokenKind::Arrow),
    ([':', ':'], TokenKind::ColonColon),
];

pub const SYMBOLS_1: &[(char, TokenKind)] = &[
    ('{', TokenKind::LBrace),
    ('}', TokenKind::RBrace),
    ('(', TokenKind::LParen),
    (')', TokenKind::RParen),
    ('[', TokenKind::LBracket),
    (']', TokenKind::RBracket),
    ('<', TokenKind::Lt),
    ('>', TokenKind::Gt),
    (':', TokenKind::Colon),
    (',', TokenKind::Comma),
    ('=', TokenKind::Eq),
    ('@', TokenKind::At),
];

pub fn keyword(text: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(word, _)| *word == text)
        .map(|(_, kind)| *kind)
}

pub fn is_value_opcode(text: &str) -> bool {
    BINARY_OPCODES.contains(&text) || VALUE_OPCODES.contains(&text)
}

pub fn is_targetless_opcode(text: &str) -> bool {
    TARGETLESS_OPCODES.contains(&text)
}
