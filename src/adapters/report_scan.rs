//! Instrument code extraction from a previously generated report.
//!
//! The monitor bootstraps its instrument list from the last markdown
//! report: any six-digit code appearing in a table row or a heading is
//! a candidate. First appearance wins, capped to a maximum count.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::domain::error::FundwatchError;

/// Scan a markdown file for instrument codes. A missing file yields an
/// empty list so a first run starts cleanly.
pub fn scan_report_file(
    path: &Path,
    max_codes: usize,
) -> Result<Vec<String>, FundwatchError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(scan_report(&content, max_codes))
}

/// Extract six-digit codes from table rows (`| 012345 | ...`) and
/// headings (`### Fund 012345`), deduplicated in order of appearance.
pub fn scan_report(content: &str, max_codes: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut codes = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim_start();
        let candidates: Vec<&str> = if trimmed.starts_with('|') {
            trimmed.split('|').map(str::trim).collect()
        } else if trimmed.starts_with('#') {
            trimmed.split_whitespace().collect()
        } else {
            continue;
        };

        for token in candidates {
            if is_code(token) && seen.insert(token.to_string()) {
                codes.push(token.to_string());
                if codes.len() >= max_codes {
                    return codes;
                }
            }
        }
    }
    codes
}

fn is_code(token: &str) -> bool {
    token.len() == 6 && token.bytes().all(|b| b.is_ascii_digit())
}
