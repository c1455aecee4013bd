use serde::{Deserialize, Serialize};

/// Either a bare selector string, or a primary selector with an ordered
/// fallback chain.
///
/// `serde(untagged)` lets both YAML shapes deserialize without a
/// discriminator key, matching the canonical file shape in the spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorDef {
    Bare(String),
    WithFallback {
        primary: String,
        #[serde(default)]
        fallback: Vec<String>,
    },
}

impl SelectorDef {
    /// The selector tried first.
    pub fn primary(&self) -> &str {
        match self {
            Self::Bare(s) => s,
            Self::WithFallback { primary, .. } => primary,
        }
    }

    /// Selectors tried, in order, after the primary fails.
    pub fn fallback(&self) -> &[String] {
        match self {
            Self::Bare(_) => &[],
            Self::WithFallback { fallback, .. } => fallback,
        }
    }

    /// Every candidate, primary first, in resolution order.
    pub fn chain(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary()).chain(self.fallback().iter().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_string_deserializes_as_bare() {
        let def: SelectorDef = serde_yaml::from_str("\"css:#submit\"").unwrap();
        assert_eq!(def, SelectorDef::Bare("css:#submit".into()));
        assert_eq!(def.primary(), "css:#submit");
        assert!(def.fallback().is_empty());
    }

    #[test]
    fn record_with_fallback_deserializes() {
        let yaml = r#"
primary: "[data-v3='btn']"
fallback: [".btn", "text:Submit"]
"#;
        let def: SelectorDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.primary(), "[data-v3='btn']");
        assert_eq!(def.fallback(), &[".btn".to_string(), "text:Submit".to_string()]);
        let chain: Vec<&str> = def.chain().collect();
        assert_eq!(chain, vec!["[data-v3='btn']", ".btn", "text:Submit"]);
    }
}
