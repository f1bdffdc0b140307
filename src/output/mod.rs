mod cli;
mod json;

pub use cli::{print_text, write_text, ReportStyle};
pub use json::{print_json, write_json};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ScanResult;
use crate::scanner::ScanConfig;
use anyhow::Result;

/// Output format for scan reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored report
    Text,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "cli" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'text' or 'json'", s)),
        }
    }
}

/// Scan options echoed back in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportConfiguration {
    pub paths: Vec<String>,
    pub database: String,
    pub recursive: bool,
    pub include_git: bool,
    pub include_node_modules: bool,
    pub exclude_regex: String,
    pub full_report: bool,
}

impl ReportConfiguration {
    pub fn new(config: &ScanConfig, full_report: bool) -> Self {
        Self {
            paths: config.targets().into_iter().map(str::to_string).collect(),
            database: config
                .database_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "Default".to_string()),
            recursive: config.recursive,
            include_git: config.include_git,
            include_node_modules: config.include_node_modules,
            exclude_regex: config
                .exclude
                .as_ref()
                .map(|r| r.as_str().to_string())
                .unwrap_or_default(),
            full_report,
        }
    }
}

/// Totals over every project found, displayed or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_projects: usize,
    pub infected_projects: usize,
    pub total_infected_packages: usize,
}

impl Summary {
    pub fn clean_projects(&self) -> usize {
        self.total_projects - self.infected_projects
    }
}

/// A rendered-ready view of one scan.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub configuration: ReportConfiguration,
    pub results: Vec<&'a ScanResult>,
    pub summary: Summary,
    /// Shown in the text report only; JSON output stays identical across runs.
    #[serde(skip)]
    pub scanned_at: DateTime<Utc>,
}

impl<'a> Report<'a> {
    pub fn new(results: &'a [ScanResult], config: &ScanConfig, full_report: bool) -> Self {
        let (results, summary) = summarize(results, full_report);
        Self {
            configuration: ReportConfiguration::new(config, full_report),
            results,
            summary,
            scanned_at: Utc::now(),
        }
    }
}

/// Computes totals and selects the results to display.
///
/// Only infected projects are displayed unless `full_report` is set. Infected
/// projects come first, then projects sort by path, ignoring case.
pub fn summarize(results: &[ScanResult], full_report: bool) -> (Vec<&ScanResult>, Summary) {
    let mut summary = Summary {
        total_projects: results.len(),
        ..Summary::default()
    };

    let mut displayed = Vec::with_capacity(results.len());
    for result in results {
        let count = result.infected_count();
        if count > 0 {
            summary.infected_projects += 1;
        }
        summary.total_infected_packages += count;

        if full_report || count > 0 {
            displayed.push(result);
        }
    }

    displayed.sort_by(|a, b| {
        b.is_infected()
            .cmp(&a.is_infected())
            .then_with(|| a.project.to_lowercase().cmp(&b.project.to_lowercase()))
    });

    (displayed, summary)
}

pub fn print_result(report: &Report<'_>, format: OutputFormat, style: ReportStyle) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report, style),
        OutputFormat::Json => print_json(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InfectedPackage;
    use regex::Regex;
    use std::path::PathBuf;

    fn result(project: &str, infected: usize) -> ScanResult {
        ScanResult::new(
            project,
            vec!["package-lock.json".to_string()],
            (0..infected)
                .map(|i| InfectedPackage::new(format!("pkg{}", i), "1.0.0"))
                .collect(),
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_summarize_counts_and_filters() {
        let results = vec![result("/b", 0), result("/a", 2), result("/c", 1)];

        let (displayed, summary) = summarize(&results, false);
        assert_eq!(
            summary,
            Summary {
                total_projects: 3,
                infected_projects: 2,
                total_infected_packages: 3,
            }
        );
        assert_eq!(summary.clean_projects(), 1);
        let paths: Vec<_> = displayed.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/c"]);
    }

    #[test]
    fn test_summarize_full_report_orders_infected_first() {
        let results = vec![
            result("/b", 0),
            result("/Z", 1),
            result("/a", 0),
            result("/y", 1),
        ];

        let (displayed, _) = summarize(&results, true);
        let paths: Vec<_> = displayed.iter().map(|r| r.project.as_str()).collect();
        assert_eq!(paths, vec!["/y", "/Z", "/a", "/b"]);
    }

    #[test]
    fn test_report_configuration() {
        let config = ScanConfig::new(vec![])
            .recursive(true)
            .exclude(Some(Regex::new("vendor").unwrap()));

        let cfg = ReportConfiguration::new(&config, true);
        assert_eq!(cfg.paths, vec!["."]);
        assert_eq!(cfg.database, "Default");
        assert_eq!(cfg.exclude_regex, "vendor");
        assert!(cfg.recursive);
        assert!(cfg.full_report);

        let config = config.database_path(Some(PathBuf::from("/opt/db.txt")));
        assert_eq!(ReportConfiguration::new(&config, false).database, "/opt/db.txt");
    }
}
