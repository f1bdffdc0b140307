use super::Report;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

/// Presentation switches for the text report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportStyle {
    pub emoji: bool,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self { emoji: true }
    }
}

impl ReportStyle {
    /// Prefixes `text` with `icon` when emoji are enabled.
    pub fn icon(&self, icon: &str, text: &str) -> String {
        if self.emoji {
            format!("{} {}", icon, text)
        } else {
            text.to_string()
        }
    }
}

#[derive(Tabled)]
struct InfectedRow {
    #[tabled(rename = "Package")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
}

pub fn write_text(w: &mut dyn Write, report: &Report<'_>, style: ReportStyle) -> Result<()> {
    let cfg = &report.configuration;

    writeln!(w)?;
    writeln!(w, "{}", style.icon("🔍", "Scan Configuration").blue())?;
    writeln!(w, "{}", "─────────────────────".blue())?;
    writeln!(w, "{:<22}: {}", "Paths", list_or_dash(&cfg.paths))?;
    writeln!(w, "{:<22}: {}", "Database", or_dash(&cfg.database))?;
    writeln!(w, "{:<22}: {}", "Recursive", yes_no(cfg.recursive))?;
    writeln!(w, "{:<22}: {}", "Include .git", yes_no(cfg.include_git))?;
    writeln!(w, "{:<22}: {}", "Include node_modules", yes_no(cfg.include_node_modules))?;
    writeln!(w, "{:<22}: {}", "Exclude Regex", or_dash(&cfg.exclude_regex))?;
    writeln!(w)?;

    writeln!(w, "{}", style.icon("🚀", "Project Reports").blue())?;
    writeln!(w, "{}", "──────────────────".blue())?;

    for result in &report.results {
        writeln!(w)?;
        if result.is_infected() {
            writeln!(
                w,
                "{}",
                style
                    .icon("🚫", &format!("[INFECTED] {}", result.project))
                    .red()
            )?;
            writeln!(
                w,
                "   {} {}",
                style.icon("📄", "Lockfiles:"),
                result.lockfiles.join(", ")
            )?;
            writeln!(
                w,
                "   {} {}",
                style.icon("🦠", "Infected Packages:"),
                result.infected_count()
            )?;

            let rows: Vec<InfectedRow> = result
                .infected_packages
                .iter()
                .map(|p| InfectedRow {
                    name: p.name.clone(),
                    version: p.version.clone(),
                })
                .collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            for line in table.lines() {
                writeln!(w, "      {}", line)?;
            }
        } else {
            writeln!(
                w,
                "{}",
                style
                    .icon("✅", &format!("[CLEAN]    {}", result.project))
                    .blue()
            )?;
        }
    }

    writeln!(w)?;

    let summary = &report.summary;
    writeln!(w, "{}", style.icon("📊", "Global Summary").blue())?;
    writeln!(w, "{}", "─────────────────".blue())?;
    writeln!(
        w,
        "Scan completed at: {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(w, "Total Projects: {}", summary.total_projects)?;
    writeln!(w, "Infected:       {}", summary.infected_projects)?;
    writeln!(w, "Clean:          {}", summary.clean_projects())?;
    writeln!(w, "Total Issues:   {}", summary.total_infected_packages)?;
    writeln!(w)?;

    if summary.total_projects == 0 {
        writeln!(w, "{}", style.icon("⚠️", "No lockfile found").yellow())?;
    } else if summary.infected_projects == 0 {
        writeln!(
            w,
            "{}",
            style.icon("🎉", "No project infected. You are safe!").green()
        )?;
    } else {
        writeln!(
            w,
            "{}",
            style
                .icon(
                    "❌",
                    &format!("Found {} infected projects!", summary.infected_projects)
                )
                .red()
        )?;
    }

    Ok(())
}

pub fn print_text(report: &Report<'_>, style: ReportStyle) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_text(&mut handle, report, style)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn list_or_dash(list: &[String]) -> String {
    if list.is_empty() {
        "-".to_string()
    } else {
        list.join(", ")
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InfectedPackage, ScanResult};
    use crate::scanner::ScanConfig;

    fn render(results: &[ScanResult], full_report: bool, style: ReportStyle) -> String {
        let config = ScanConfig::new(vec!["/work".to_string()]).recursive(true);
        let report = Report::new(results, &config, full_report);
        let mut buf = Vec::new();
        write_text(&mut buf, &report, style).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_icon() {
        assert_eq!(ReportStyle { emoji: true }.icon("✅", "ok"), "✅ ok");
        assert_eq!(ReportStyle { emoji: false }.icon("✅", "ok"), "ok");
    }

    #[test]
    fn test_infected_report() {
        let results = vec![ScanResult::new(
            "/work/app",
            vec!["package-lock.json".to_string(), "yarn.lock".to_string()],
            vec![InfectedPackage::new("test-package", "1.0.0")],
        )];

        let text = render(&results, false, ReportStyle { emoji: false });
        assert!(text.contains("[INFECTED] /work/app"));
        assert!(text.contains("Lockfiles: package-lock.json, yarn.lock"));
        assert!(text.contains("test-package"));
        assert!(text.contains("Recursive"));
        assert!(text.contains("Found 1 infected projects!"));
        assert!(!text.contains("🚫"));
    }

    #[test]
    fn test_clean_projects_hidden_without_full_report() {
        let results = vec![ScanResult::new("/work/clean", vec!["yarn.lock".to_string()], vec![])];

        let text = render(&results, false, ReportStyle::default());
        assert!(!text.contains("[CLEAN]"));
        assert!(text.contains("No project infected. You are safe!"));

        let text = render(&results, true, ReportStyle::default());
        assert!(text.contains("[CLEAN]    /work/clean"));
    }

    #[test]
    fn test_no_lockfile_report() {
        let text = render(&[], false, ReportStyle::default());
        assert!(text.contains("Total Projects: 0"));
        assert!(text.contains("No lockfile found"));
    }
}
