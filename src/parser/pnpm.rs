//! `pnpm-lock.yaml` parser.
//!
//! The file is read line by line rather than as YAML. Every indented `key:`
//! line is a candidate; structural keys are ignored and the remaining ones are
//! split into a package name and version. All of these key shapes resolve to
//! `test-package` / `1.0.0`:
//!
//! ```text
//!   /test-package/1.0.0:
//!   /test-package@1.0.0:
//!   test-package@1.0.0:
//!   test-package@1.0.0(react@18.2.0):
//!   /test-package/1.0.0_peer:
//! ```
//!
//! The `_` suffix is dropped from versions to fold peer-qualified duplicates.
//! A version that legitimately contains `_` is truncated the same way.
//!
//! The split happens on the last `/` or `@`, before the `_` suffix is looked
//! at. A v5 key whose peer suffix itself holds an `@`, such as
//! `/test-package/1.0.0_react@18.2.0`, therefore splits inside the suffix and
//! does not resolve to `test-package` / `1.0.0`.

use std::sync::LazyLock;

use regex::Regex;

use super::{check, LockfileParser};
use crate::database::VulnerabilityDatabase;
use crate::error::ParseError;
use crate::model::{InfectedPackage, LockfileKind};

/// Keys that describe lockfile structure or package metadata, never a package.
const IGNORED_KEYS: &[&str] = &[
    "resolution",
    "engines",
    "os",
    "cpu",
    "peerDependencies",
    "dependencies",
    "optionalDependencies",
    "devDependencies",
    "transitivePeerDependencies",
    "dev",
    "hasBin",
    "requiresBuild",
    "name",
    "version",
    "lockfileVersion",
    "settings",
    "importers",
    "packages",
    "specifiers",
    "patchedDependencies",
];

/// An indented, optionally quoted `key:` with the leading `/` removed.
static KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s+['"]?/?([^:'"\s]+)['"]?:"#).expect("pnpm key pattern is valid")
});

pub struct PnpmParser;

impl LockfileParser for PnpmParser {
    fn name(&self) -> &'static str {
        "pnpm"
    }

    fn kind(&self) -> LockfileKind {
        LockfileKind::Pnpm
    }

    fn parse_str(
        &self,
        content: &str,
        db: &VulnerabilityDatabase,
    ) -> Result<Vec<InfectedPackage>, ParseError> {
        let mut infected = Vec::new();

        for line in content.lines() {
            let Some(key) = KEY_PATTERN
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
            else {
                continue;
            };

            if IGNORED_KEYS.contains(&key) {
                continue;
            }

            let Some((name, version)) = parse_key(key) else {
                continue;
            };

            infected.extend(check(db, name, version));
        }

        Ok(infected)
    }
}

/// Splits a package key into `(name, version)`.
fn parse_key(key: &str) -> Option<(&str, &str)> {
    let key = match key.find('(') {
        Some(idx) => &key[..idx],
        None => key,
    };

    let sep = key.rfind(['/', '@'])?;
    if sep == 0 || sep + 1 >= key.len() {
        return None;
    }

    let name = &key[..sep];
    let version = &key[sep + 1..];
    let version = match version.find('_') {
        Some(idx) => &version[..idx],
        None => version,
    };

    if name.is_empty() || version.is_empty() {
        return None;
    }

    Some((name, version))
}
