//! Decoding of EHIR integer literals.
//!
//! A literal is an optional base prefix (`0x`, `0o`, `0b`), digits that may be
//! grouped with `_`, and an optional sized suffix `_i<width>` or `_u<width>`.

use std::fmt;

use crate::diagnostics::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Base {
    Hex,
    Oct,
    Bin,
    Dec,
}

impl Base {
    pub fn radix(self) -> u32 {
        match self {
            Base::Hex => 16,
            Base::Oct => 8,
            Base::Bin => 2,
            Base::Dec => 10,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            Base::Hex => "0x",
            Base::Oct => "0o",
            Base::Bin => "0b",
            Base::Dec => "",
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Base::Hex => "hexadecimal",
            Base::Oct => "octal",
            Base::Bin => "binary",
            Base::Dec => "decimal",
        };
        f.write_str(name)
    }
}

/// An integer literal carrying its signedness and bit width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SizedInt {
    pub base: Base,
    /// Digits without prefix, separators, or suffix.
    pub digits: String,
    pub value: u128,
    pub signed: bool,
    pub width: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnsizedInt {
    pub base: Base,
    pub digits: String,
    pub value: u128,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntLiteral {
    Sized(SizedInt),
    Unsized(UnsizedInt),
}

impl IntLiteral {
    pub fn value(&self) -> u128 {
        match self {
            IntLiteral::Sized(lit) => lit.value,
            IntLiteral::Unsized(lit) => lit.value,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            IntLiteral::Sized(lit) => lit.span,
            IntLiteral::Unsized(lit) => lit.span,
        }
    }

    pub fn into_sized(self) -> Option<SizedInt> {
        match self {
            IntLiteral::Sized(lit) => Some(lit),
            IntLiteral::Unsized(_) => None,
        }
    }
}

impl fmt::Display for SizedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.signed { 'i' } else { 'u' };
        write!(
            f,
            "{}{}_{}{}",
            self.base.prefix(),
            self.digits,
            sign,
            self.width
        )
    }
}

impl fmt::Display for IntLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntLiteral::Sized(lit) => lit.fmt(f),
            IntLiteral::Unsized(lit) => write!(f, "{}{}", lit.base.prefix(), lit.digits),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("{base} literal has no digits")]
    MissingDigits { base: Base },
    #[error("invalid digit '{digit}' in {base} literal")]
    InvalidDigit { digit: char, base: Base },
    #[error("malformed literal suffix `{suffix}`; expected `_i<width>` or `_u<width>`")]
    MalformedSuffix { suffix: String },
    #[error("literal does not fit in 128 bits")]
    Overflow,
}

impl LiteralError {
    pub fn code(&self) -> &'static str {
        match self {
            LiteralError::MalformedSuffix { .. } => "E1001",
            LiteralError::MissingDigits { .. } | LiteralError::InvalidDigit { .. } => "E1002",
            LiteralError::Overflow => "E1003",
        }
    }
}

pub fn decode_int_literal(text: &str, span: Span) -> Result<IntLiteral, LiteralError> {
    let (base, rest) = split_base(text);
    let (digits_part, suffix) = split_suffix(rest);

    let digits: String = digits_part.chars().filter(|ch| *ch != '_').collect();
    if digits.is_empty() {
        return Err(LiteralError::MissingDigits { base });
    }
    let mut value: u128 = 0;
    for ch in digits.chars() {
        let Some(digit) = ch.to_digit(base.radix()) else {
            return Err(LiteralError::InvalidDigit { digit: ch, base });
        };
        value = value
            .checked_mul(u128::from(base.radix()))
            .and_then(|v| v.checked_add(u128::from(digit)))
            .ok_or(LiteralError::Overflow)?;
    }

    let Some(suffix) = suffix else {
        return Ok(IntLiteral::Unsized(UnsizedInt {
            base,
            digits,
            value,
            span,
        }));
    };
    let (signed, width) = parse_suffix(suffix)?;
    Ok(IntLiteral::Sized(SizedInt {
        base,
        digits,
        value,
        signed,
        width,
        span,
    }))
}

fn split_base(text: &str) -> (Base, &str) {
    if let Some(rest) = text.strip_prefix("0x") {
        (Base::Hex, rest)
    } else if let Some(rest) = text.strip_prefix("0o") {
        (Base::Oct, rest)
    } else if let Some(rest) = text.strip_prefix("0b") {
        (Base::Bin, rest)
    } else {
        (Base::Dec, text)
    }
}

// The suffix starts at the first `_` directly followed by `i` or `u`; neither
// letter is a digit in any base, so separators never collide with it.
fn split_suffix(text: &str) -> (&str, Option<&str>) {
    let bytes = text.as_bytes();
    for index in 0..bytes.len() {
        if bytes[index] == b'_' && matches!(bytes.get(index + 1), Some(b'i') | Some(b'u')) {
            return (&text[..index], Some(&text[index + 1..]));
        }
    }
    (text, None)
}

fn parse_suffix(suffix: &str) -> Result<(bool, u32), LiteralError> {
    let malformed = || LiteralError::MalformedSuffix {
        suffix: format!("_{suffix}"),
    };
    let (signed, width) = match suffix.split_at(1) {
        ("i", width) => (true, width),
        ("u", width) => (false, width),
        _ => return Err(malformed()),
    };
    if width.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    match width.parse::<u32>() {
        Ok(0) | Err(_) => Err(malformed()),
        Ok(width) => Ok((signed, width)),
    }
}
