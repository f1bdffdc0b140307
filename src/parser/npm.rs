//! `package-lock.json` parser.
//!
//! Both lockfile generations are read from the same document:
//!
//! ```json
//! {
//!   "lockfileVersion": 2,
//!   "dependencies": { "lodash": { "version": "4.17.21" } },
//!   "packages": {
//!     "": { "name": "my-app", "version": "1.0.0" },
//!     "node_modules/lodash": { "version": "4.17.21" },
//!     "node_modules/a/node_modules/@scope/b": { "version": "2.0.0" }
//!   }
//! }
//! ```
//!
//! `dependencies` is the v1 flat mapping, `packages` the v2/v3 install-path
//! mapping. Both are scanned when present, so a package listed in both shows
//! up twice here.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{check, LockfileParser};
use crate::database::VulnerabilityDatabase;
use crate::error::ParseError;
use crate::model::{InfectedPackage, LockfileKind};

pub struct NpmParser;

#[derive(Deserialize)]
struct NpmLockfile {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, NpmEntry>>,
    #[serde(default)]
    packages: Option<BTreeMap<String, NpmEntry>>,
}

#[derive(Deserialize)]
struct NpmEntry {
    #[serde(default)]
    version: Option<String>,
}

impl LockfileParser for NpmParser {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn kind(&self) -> LockfileKind {
        LockfileKind::Npm
    }

    fn parse_str(
        &self,
        content: &str,
        db: &VulnerabilityDatabase,
    ) -> Result<Vec<InfectedPackage>, ParseError> {
        let lockfile: NpmLockfile = serde_json::from_str(content)?;
        let mut infected = Vec::new();

        // v1
        for (name, entry) in lockfile.dependencies.iter().flatten() {
            let version = entry.version.as_deref().unwrap_or_default();
            infected.extend(check(db, name, version));
        }

        // v2/v3
        for (install_path, entry) in lockfile.packages.iter().flatten() {
            if install_path.is_empty() {
                continue;
            }

            let name = package_name(install_path);
            let version = entry.version.as_deref().unwrap_or_default();
            infected.extend(check(db, &name, version));
        }

        Ok(infected)
    }

    fn parse(
        &self,
        path: &Path,
        db: &VulnerabilityDatabase,
    ) -> Result<Vec<InfectedPackage>, ParseError> {
        let content = fs::read_to_string(path)?;
        self.parse_str(&content, db)
    }
}

/// Package name from an install path: whatever follows the last `node_modules/`.
fn package_name(install_path: &str) -> String {
    const NODE_MODULES: &str = "node_modules/";

    let path = install_path.replace('\\', "/");
    match path.rfind(NODE_MODULES) {
        Some(pos) => path[pos + NODE_MODULES.len()..].to_string(),
        None => path,
    }
}
