use indexmap::IndexMap;
use sar_types::{CompatibilityBlock, SelectorDef, VersionDetectionStrategy};
use semver::{Version, VersionReq};
use tracing::debug;

use crate::detector::{parse_lenient, strip_metadata, VersionDetector};
use crate::error::VersionError;

/// Stateless coordinator for version detection and selector-override
/// resolution (spec §4.4). Holds no data of its own — every method takes
/// the `CompatibilityBlock` it operates against explicitly, so one
/// instance is shared across every action invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionManager;

impl VersionManager {
    pub fn new() -> Self {
        Self
    }

    /// Try each declared detection strategy in order; the first one that
    /// both returns a value and parses as a version wins. Detection
    /// failures at any strategy fall through to the next rather than
    /// aborting — per spec §4.4, "failures fall through".
    pub async fn detect<D: VersionDetector>(
        &self,
        compat: &CompatibilityBlock,
        detector: &D,
    ) -> Option<Version> {
        for strategy in &compat.detect {
            let raw = match strategy {
                VersionDetectionStrategy::GlobalVar { name } => {
                    detector.detect_global_var(name).await
                }
                VersionDetectionStrategy::MetaTag { name } => {
                    detector.detect_meta_tag(name).await
                }
                VersionDetectionStrategy::Expression { expression } => {
                    detector.detect_expression(expression).await
                }
            };
            if let Some(raw) = raw {
                if let Some(version) = parse_lenient(&raw) {
                    debug!(?strategy, %version, "detected version");
                    return Some(version);
                }
            }
        }
        None
    }

    /// Check `detected` against the block's `minVersion`/`maxVersion`,
    /// comparing numeric triples only (prerelease/build metadata ignored
    /// on both sides).
    pub fn check_range(
        &self,
        detected: &Version,
        compat: &CompatibilityBlock,
    ) -> Result<(), VersionError> {
        let stripped = strip_metadata(detected);
        if let Some(min) = &compat.min_version {
            let min_version = parse_lenient(min).ok_or_else(|| VersionError::InvalidVersion(min.clone()))?;
            if stripped < strip_metadata(&min_version) {
                return Err(VersionError::Incompatible {
                    detected: detected.to_string(),
                    range: format!(">= {min}"),
                });
            }
        }
        if let Some(max) = &compat.max_version {
            let max_version = parse_lenient(max).ok_or_else(|| VersionError::InvalidVersion(max.clone()))?;
            if stripped > strip_metadata(&max_version) {
                return Err(VersionError::Incompatible {
                    detected: detected.to_string(),
                    range: format!("<= {max}"),
                });
            }
        }
        Ok(())
    }

    /// Merge every `versionOverrides` entry whose semver range matches
    /// `detected`, later entries (in declaration order) winning on key
    /// collision.
    pub fn resolve_overrides(
        &self,
        detected: &Version,
        compat: &CompatibilityBlock,
    ) -> Result<IndexMap<String, SelectorDef>, VersionError> {
        let stripped = strip_metadata(detected);
        let mut merged = IndexMap::new();
        for (range, over) in &compat.version_overrides {
            let req = VersionReq::parse(range).map_err(|_| VersionError::InvalidRange(range.clone()))?;
            if req.matches(&stripped) {
                for (name, def) in &over.selectors {
                    merged.insert(name.clone(), def.clone());
                }
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use sar_types::VersionOverride;

    struct FakeDetector {
        global_var: Option<String>,
        meta_tag: Option<String>,
    }

    #[async_trait]
    impl VersionDetector for FakeDetector {
        async fn detect_global_var(&self, _name: &str) -> Option<String> {
            self.global_var.clone()
        }
        async fn detect_meta_tag(&self, _name: &str) -> Option<String> {
            self.meta_tag.clone()
        }
        async fn detect_expression(&self, _expression: &str) -> Option<String> {
            None
        }
    }

    fn compat_with_detect() -> CompatibilityBlock {
        CompatibilityBlock {
            min_version: Some("2.0.0".to_string()),
            max_version: Some("4.0.0".to_string()),
            version_overrides: IndexMap::new(),
            detect: vec![
                VersionDetectionStrategy::GlobalVar {
                    name: "__V__".to_string(),
                },
                VersionDetectionStrategy::MetaTag {
                    name: "widget-version".to_string(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn detect_uses_first_successful_strategy() {
        let detector = FakeDetector {
            global_var: Some("3.1.0".to_string()),
            meta_tag: Some("9.9.9".to_string()),
        };
        let v = VersionManager::new().detect(&compat_with_detect(), &detector).await;
        assert_eq!(v, Some(Version::new(3, 1, 0)));
    }

    #[tokio::test]
    async fn detect_falls_through_on_empty_first_strategy() {
        let detector = FakeDetector {
            global_var: None,
            meta_tag: Some("3.0.0".to_string()),
        };
        let v = VersionManager::new().detect(&compat_with_detect(), &detector).await;
        assert_eq!(v, Some(Version::new(3, 0, 0)));
    }

    #[tokio::test]
    async fn detect_returns_none_when_every_strategy_fails() {
        let detector = FakeDetector {
            global_var: None,
            meta_tag: None,
        };
        let v = VersionManager::new().detect(&compat_with_detect(), &detector).await;
        assert_eq!(v, None);
    }

    #[test]
    fn check_range_accepts_version_within_bounds() {
        let mgr = VersionManager::new();
        assert!(mgr.check_range(&Version::new(3, 0, 0), &compat_with_detect()).is_ok());
    }

    #[test]
    fn check_range_rejects_below_min() {
        let mgr = VersionManager::new();
        let err = mgr.check_range(&Version::new(1, 0, 0), &compat_with_detect()).unwrap_err();
        assert!(matches!(err, VersionError::Incompatible { .. }));
    }

    #[test]
    fn check_range_rejects_above_max() {
        let mgr = VersionManager::new();
        let err = mgr.check_range(&Version::new(5, 0, 0), &compat_with_detect()).unwrap_err();
        assert!(matches!(err, VersionError::Incompatible { .. }));
    }

    #[test]
    fn check_range_ignores_prerelease_tag() {
        let mgr = VersionManager::new();
        let detected = semver::Version::parse("3.0.0-beta.1").unwrap();
        assert!(mgr.check_range(&detected, &compat_with_detect()).is_ok());
    }

    #[test]
    fn resolve_overrides_merges_matching_ranges_with_later_wins() {
        let mut overrides = IndexMap::new();
        let mut first_selectors = IndexMap::new();
        first_selectors.insert(
            "submit".to_string(),
            SelectorDef::Bare(".v3-submit".to_string()),
        );
        overrides.insert(
            "^3.0".to_string(),
            VersionOverride {
                selectors: first_selectors,
            },
        );
        let mut second_selectors = IndexMap::new();
        second_selectors.insert(
            "submit".to_string(),
            SelectorDef::Bare(".v3-2-submit".to_string()),
        );
        overrides.insert(
            ">=3.2".to_string(),
            VersionOverride {
                selectors: second_selectors,
            },
        );
        let compat = CompatibilityBlock {
            min_version: None,
            max_version: None,
            version_overrides: overrides,
            detect: vec![],
        };
        let merged = VersionManager::new()
            .resolve_overrides(&Version::new(3, 2, 0), &compat)
            .unwrap();
        assert_eq!(merged.get("submit").unwrap().primary(), ".v3-2-submit");
    }

    #[test]
    fn resolve_overrides_skips_non_matching_ranges() {
        let mut overrides = IndexMap::new();
        let mut selectors = IndexMap::new();
        selectors.insert("submit".to_string(), SelectorDef::Bare(".old".to_string()));
        overrides.insert(
            "^2.0".to_string(),
            VersionOverride { selectors },
        );
        let compat = CompatibilityBlock {
            min_version: None,
            max_version: None,
            version_overrides: overrides,
            detect: vec![],
        };
        let merged = VersionManager::new()
            .resolve_overrides(&Version::new(3, 0, 0), &compat)
            .unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn resolve_overrides_rejects_invalid_range_syntax() {
        let mut overrides = IndexMap::new();
        overrides.insert(
            "not a range".to_string(),
            VersionOverride {
                selectors: IndexMap::new(),
            },
        );
        let compat = CompatibilityBlock {
            min_version: None,
            max_version: None,
            version_overrides: overrides,
            detect: vec![],
        };
        let err = VersionManager::new()
            .resolve_overrides(&Version::new(3, 0, 0), &compat)
            .unwrap_err();
        assert!(matches!(err, VersionError::InvalidRange(_)));
    }
}
