mod ast;
mod parser;

pub use ast::*;
pub use parser::{parse, parse_many, parse_tokens, parse_with_options};

#[cfg(test)]
mod tests;
