//! Per-project aggregation of lockfile findings.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use super::pool::TaskFinding;
use crate::model::{InfectedPackage, ScanResult};

#[derive(Default)]
struct ProjectEntry {
    lockfiles: Vec<String>,
    packages: Vec<InfectedPackage>,
}

/// Groups findings by directory into one [`ScanResult`] per project.
///
/// Projects appear in the order their first finding does. Every lockfile
/// name is listed once, whether or not it produced findings. Packages are
/// deduplicated by `(name, version)`, keeping the first occurrence.
pub fn aggregate(findings: Vec<TaskFinding>) -> Vec<ScanResult> {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut projects: HashMap<PathBuf, ProjectEntry> = HashMap::new();

    for finding in findings {
        let entry = projects.entry(finding.dir.clone()).or_insert_with(|| {
            order.push(finding.dir.clone());
            ProjectEntry::default()
        });

        if !entry.lockfiles.contains(&finding.lockfile) {
            entry.lockfiles.push(finding.lockfile);
        }
        entry.packages.extend(finding.packages);
    }

    order
        .into_iter()
        .filter_map(|dir| {
            let entry = projects.remove(&dir)?;
            Some(ScanResult::new(
                dir.to_string_lossy(),
                entry.lockfiles,
                dedup_packages(entry.packages),
            ))
        })
        .collect()
}

fn dedup_packages(packages: Vec<InfectedPackage>) -> Vec<InfectedPackage> {
    let mut seen = HashSet::with_capacity(packages.len());
    packages
        .into_iter()
        .filter(|pkg| seen.insert((pkg.name.clone(), pkg.version.clone())))
        .collect()
}
