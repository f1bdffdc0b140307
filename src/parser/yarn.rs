//! `yarn.lock` (classic) parser.
//!
//! Entries are blocks whose header names one or more specifiers and whose
//! first field is the resolved version:
//!
//! ```text
//! "test-package@^1.0.0", "test-package@^1.0.1":
//!   version "1.0.0"
//!   resolved "https://registry.yarnpkg.com/..."
//! ```
//!
//! A block without a readable `version` line is skipped.

use std::sync::LazyLock;

use regex::Regex;

use super::{check, LockfileParser};
use crate::database::VulnerabilityDatabase;
use crate::error::ParseError;
use crate::model::{InfectedPackage, LockfileKind};

/// Header line followed by its `version` field.
static BLOCK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^['"]?(@?[^@"\s']+)@.+?['"]?:\s*(?:\r?\n|\r)\s*version(?:\s+|:\s+)["']?([^"\s']+)["']?"#,
    )
    .expect("yarn block pattern is valid")
});

pub struct YarnParser;

impl LockfileParser for YarnParser {
    fn name(&self) -> &'static str {
        "Yarn classic"
    }

    fn kind(&self) -> LockfileKind {
        LockfileKind::Yarn
    }

    fn parse_str(
        &self,
        content: &str,
        db: &VulnerabilityDatabase,
    ) -> Result<Vec<InfectedPackage>, ParseError> {
        let infected = BLOCK_PATTERN
            .captures_iter(content)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str();
                let version = caps.get(2)?.as_str();
                check(db, name, version)
            })
            .collect();

        Ok(infected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCKFILE: &str = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@scope/pkg@^2.0.0":
  version "2.0.0"
  resolved "https://registry.yarnpkg.com/@scope/pkg/-/pkg-2.0.0.tgz"

lodash@^4.17.21:
  version "4.17.21"

"test-package@^1.0.0", "test-package@~1.0.0":
  version "1.0.0"
  resolved "https://registry.yarnpkg.com/test-package/-/test-package-1.0.0.tgz"
  dependencies:
    lodash "^4.17.21"
"#;

    fn db() -> VulnerabilityDatabase {
        "test-package:1.0.0\n@scope/pkg:2.0.0\n".parse().unwrap()
    }

    #[test]
    fn test_finds_quoted_and_scoped_entries() {
        let infected = YarnParser.parse_str(LOCKFILE, &db()).unwrap();

        assert_eq!(
            infected,
            vec![
                InfectedPackage::new("@scope/pkg", "2.0.0"),
                InfectedPackage::new("test-package", "1.0.0"),
            ]
        );
    }

    #[test]
    fn test_unquoted_header_and_colon_version() {
        let content = "test-package@npm:^1.0.0:\n  version: 1.0.0\n  resolution: \"test-package@npm:1.0.0\"\n";
        let infected = YarnParser.parse_str(content, &db()).unwrap();
        assert_eq!(infected, vec![InfectedPackage::new("test-package", "1.0.0")]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "test-package@^1.0.0:\r\n  version \"1.0.0\"\r\n";
        let infected = YarnParser.parse_str(content, &db()).unwrap();
        assert_eq!(infected.len(), 1);
    }

    #[test]
    fn test_block_without_version_is_skipped() {
        let content = "test-package@^1.0.0:\n  resolved \"https://example.invalid\"\n  version \"1.0.0\"\n";
        assert!(YarnParser.parse_str(content, &db()).unwrap().is_empty());
    }

    #[test]
    fn test_clean_lockfile() {
        let db: VulnerabilityDatabase = "other:9.9.9".parse().unwrap();
        assert!(YarnParser.parse_str(LOCKFILE, &db).unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_not_an_error() {
        assert!(YarnParser.parse_str("{{{ not yarn", &db()).unwrap().is_empty());
        assert!(YarnParser.parse_str("", &db()).unwrap().is_empty());
    }
}
