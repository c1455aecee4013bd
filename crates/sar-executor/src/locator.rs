//! Selector-string prefix handling (spec §4.5): a selector reference is
//! either a bare CSS selector or carries one of the five explicit prefixes.
//! Parsing a prefixed string into a [`Locator`] is the boundary between a
//! selector *string* and the concrete thing the browser adapter locates.

use std::fmt;

/// The concrete locator handed to a [`crate::adapter::BrowserAdapter`] call,
/// after prefix parsing. `role:` carries an optional accessible-name
/// suffix (`role:button[name='Submit']`); every other kind is just the
/// text after its prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    Xpath(String),
    Role { role: String, name: Option<String> },
    Text(String),
    TestId(String),
}

impl Locator {
    /// Parse one selector string. No prefix defaults to `css:`.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("css:") {
            Self::Css(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("xpath:") {
            Self::Xpath(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("role:") {
            Self::parse_role(rest)
        } else if let Some(rest) = raw.strip_prefix("text:") {
            Self::Text(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("testid:") {
            Self::TestId(rest.to_string())
        } else {
            Self::Css(raw.to_string())
        }
    }

    fn parse_role(rest: &str) -> Self {
        let Some(bracket) = rest.find('[') else {
            return Self::Role {
                role: rest.to_string(),
                name: None,
            };
        };
        let role = rest[..bracket].to_string();
        let suffix = &rest[bracket..];
        let name = suffix
            .strip_prefix("[name='")
            .and_then(|s| s.strip_suffix("']"))
            .map(str::to_string);
        Self::Role { role, name }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::Xpath(s) => write!(f, "xpath:{s}"),
            Self::Role { role, name: None } => write!(f, "role:{role}"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role:{role}[name='{name}']"),
            Self::Text(s) => write!(f, "text:{s}"),
            Self::TestId(s) => write!(f, "testid:{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_string_defaults_to_css() {
        assert_eq!(Locator::parse("#submit"), Locator::Css("#submit".to_string()));
    }

    #[test]
    fn explicit_prefixes_parse() {
        assert_eq!(Locator::parse("xpath://button"), Locator::Xpath("//button".to_string()));
        assert_eq!(Locator::parse("text:Submit"), Locator::Text("Submit".to_string()));
        assert_eq!(Locator::parse("testid:submit-btn"), Locator::TestId("submit-btn".to_string()));
    }

    #[test]
    fn role_without_name_suffix() {
        assert_eq!(
            Locator::parse("role:button"),
            Locator::Role {
                role: "button".to_string(),
                name: None
            }
        );
    }

    #[test]
    fn role_with_accessible_name_suffix() {
        assert_eq!(
            Locator::parse("role:button[name='Submit']"),
            Locator::Role {
                role: "button".to_string(),
                name: Some("Submit".to_string())
            }
        );
    }

    #[test]
    fn display_round_trips_prefix() {
        let l = Locator::parse("role:button[name='Submit']");
        assert_eq!(l.to_string(), "role:button[name='Submit']");
        assert_eq!(Locator::parse("css:.btn").to_string(), "css:.btn");
    }
}
