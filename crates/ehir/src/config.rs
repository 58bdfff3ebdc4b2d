use serde::Deserialize;

use crate::EhirError;

/// Knobs for a parse. Every field has a default, so an empty TOML document
/// yields [`ParseOptions::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Maximum nesting of type expressions before the parser bails out.
    pub max_nesting: usize,
    /// Emit `W0001` for untyped first definitions of assignment targets.
    pub warn_untyped_targets: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting: 64,
            warn_untyped_targets: true,
        }
    }
}

impl ParseOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, EhirError> {
        Ok(toml::from_str(text)?)
    }
}
