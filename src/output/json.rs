use super::Report;
use anyhow::Result;
use std::io::Write;

pub fn write_json(w: &mut dyn Write, report: &Report<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, report)?;
    writeln!(w)?;
    Ok(())
}

pub fn print_json(report: &Report<'_>) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InfectedPackage, ScanResult};
    use crate::scanner::ScanConfig;

    #[test]
    fn test_json_report_shape() {
        let results = vec![
            ScanResult::new(
                "/work/app",
                vec!["package-lock.json".to_string()],
                vec![InfectedPackage::new("test-package", "1.0.0")],
            ),
            ScanResult::new("/work/clean", vec!["yarn.lock".to_string()], vec![]),
        ];
        let config = ScanConfig::new(vec!["/work".to_string()]);
        let report = Report::new(&results, &config, false);

        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["configuration"]["paths"][0], "/work");
        assert_eq!(value["configuration"]["database"], "Default");
        assert_eq!(value["configuration"]["exclude_regex"], "");
        assert_eq!(value["results"].as_array().unwrap().len(), 1);
        assert_eq!(value["results"][0]["project"], "/work/app");
        assert_eq!(value["results"][0]["infected_count"], 1);
        assert_eq!(value["summary"]["total_projects"], 2);
        assert_eq!(value["summary"]["infected_projects"], 1);
        assert_eq!(value["summary"]["total_infected_packages"], 1);
    }

    #[test]
    fn test_json_report_top_level_keys() {
        let config = ScanConfig::new(vec!["/work".to_string()]);
        let report = Report::new(&[], &config, true);

        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["configuration", "results", "summary"]);
    }
}
