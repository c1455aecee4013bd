//! The read-only surface a host's browser adapter must implement so the
//! version manager can try each detection strategy in declared order
//! (spec §4.4). Implemented by `sar-executor`'s `BrowserAdapter`.

use async_trait::async_trait;

/// One read-only probe per [`sar_types::VersionDetectionStrategy`] variant.
/// Any method returning `None` means "this strategy found nothing"; the
/// manager falls through to the next declared strategy rather than
/// treating it as an error.
#[async_trait]
pub trait VersionDetector: Send + Sync {
    async fn detect_global_var(&self, name: &str) -> Option<String>;
    async fn detect_meta_tag(&self, name: &str) -> Option<String>;
    async fn detect_expression(&self, expression: &str) -> Option<String>;
}

/// Parse a version string leniently: pages commonly expose just `"3"` or
/// `"3.2"` rather than a full `major.minor.patch` triple. Missing segments
/// default to `0`.
pub fn parse_lenient(raw: &str) -> Option<semver::Version> {
    let raw = raw.trim();
    if let Ok(v) = semver::Version::parse(raw) {
        return Some(v);
    }
    let segments: Vec<&str> = raw.split('.').collect();
    if segments.is_empty() || segments.len() > 3 {
        return None;
    }
    if !segments.iter().all(|s| s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty()) {
        return None;
    }
    let mut parts = [0u64; 3];
    for (i, s) in segments.iter().enumerate() {
        parts[i] = s.parse().ok()?;
    }
    Some(semver::Version::new(parts[0], parts[1], parts[2]))
}

/// Drop prerelease and build metadata, per the implementation note in
/// spec §4.4: range comparisons operate on the numeric triple only.
pub fn strip_metadata(v: &semver::Version) -> semver::Version {
    semver::Version::new(v.major, v.minor, v.patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_semver() {
        assert_eq!(parse_lenient("3.2.1").unwrap(), semver::Version::new(3, 2, 1));
    }

    #[test]
    fn parses_major_only() {
        assert_eq!(parse_lenient("3").unwrap(), semver::Version::new(3, 0, 0));
    }

    #[test]
    fn parses_major_minor() {
        assert_eq!(parse_lenient("3.2").unwrap(), semver::Version::new(3, 2, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_lenient("not-a-version").is_none());
    }

    #[test]
    fn strips_prerelease_and_build() {
        let v = semver::Version::parse("3.0.0-beta.1+build.5").unwrap();
        assert_eq!(strip_metadata(&v), semver::Version::new(3, 0, 0));
    }
}
