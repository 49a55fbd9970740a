//! Semantic version validation.
//!
//! Iteration versions are `MAJOR.MINOR.PATCH` with optional `-pre.release`
//! and `+build` suffixes, parsed by the `semver` crate. A validated version
//! contains only `[0-9A-Za-z.+-]`, so it is safe to use as a directory name.

pub use semver::Version;

use crate::error::PlanError;

/// Validate `text` as a semantic version.
pub fn validate(text: &str) -> Result<Version, PlanError> {
    Version::parse(text).map_err(|e| PlanError::InvalidVersion {
        version: text.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    fn v(s: &str) -> Version {
        validate(s).expect("valid version")
    }

    #[test]
    fn accepts_core_pre_and_build_forms() {
        for ok in ["0.0.0", "1.2.3", "10.20.30", "1.0.0-alpha", "1.0.0-alpha.1", "1.0.0+build.7", "1.0.0-rc.1+sha.5114f85"] {
            assert!(validate(ok).is_ok(), "{ok} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "1", "1.2", "1.2.3.4", "v1.2.3", "01.2.3", "1.2.x", "1.2.3-", "1.2.3-01", "1.2.3+", "1.2.3-a..b", "1.0.0/..", "1.0.0/../../evil", " 1.0.0"] {
            let err = validate(bad).expect_err(bad);
            assert_eq!(err.kind(), "InvalidVersion");
        }
    }

    #[test]
    fn display_round_trips_the_input() {
        assert_eq!(v("1.0.0-rc.1+sha.5114f85").to_string(), "1.0.0-rc.1+sha.5114f85");
    }

    #[test]
    fn precedence_follows_semver() {
        let ordered = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
            "1.0.1",
            "1.10.0",
            "2.0.0",
        ];
        for pair in ordered.windows(2) {
            assert_eq!(v(pair[0]).cmp_precedence(&v(pair[1])), Ordering::Less, "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn build_metadata_does_not_affect_precedence() {
        assert_eq!(v("1.0.0+a").cmp_precedence(&v("1.0.0+b")), Ordering::Equal);
    }
}
