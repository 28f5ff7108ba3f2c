pub mod layout;
pub mod metrics;
pub mod pdf;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use layout::{badge_color, render_report, Element, ReportDocument, ReportOptions, Rgb};
pub use pdf::to_pdf;

use crate::risk::CustomerRiskRecord;

/// `RiskReport_<id>.pdf`, with characters unsafe in file names replaced
pub fn report_file_name(customer_id: &str) -> String {
    let sanitized: String = customer_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');
    if sanitized.is_empty() {
        "RiskReport_unknown.pdf".to_string()
    } else {
        format!("RiskReport_{}.pdf", sanitized)
    }
}

/// Render the report for `record` and write it into `dir`, returning the path.
pub fn write_report(
    dir: &Path,
    record: &CustomerRiskRecord,
    options: &ReportOptions,
) -> Result<PathBuf> {
    let document = render_report(record, options);
    let bytes = to_pdf(&document);

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    let path = dir.join(report_file_name(&record.customer_id));

    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(&bytes).context("Failed to write report")?;
    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        pages = document.page_count(),
        "report written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::risk::fixtures::record;
    use crate::risk::RiskLevel;
    use chrono::Local;

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("C001"), "RiskReport_C001.pdf");
        assert_eq!(report_file_name("CUST 12/7"), "RiskReport_CUST_12_7.pdf");
        assert_eq!(report_file_name("../etc"), "RiskReport__etc.pdf");
        assert_eq!(report_file_name("  "), "RiskReport_unknown.pdf");
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions::from_config(&Config::default(), Local::now());
        let path = write_report(dir.path(), &record("C001", RiskLevel::Medium, false), &options)
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "RiskReport_C001.pdf");
        assert!(std::fs::read(path).unwrap().starts_with(b"%PDF-"));
    }
}
