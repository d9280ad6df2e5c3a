//! Eastmoney fund valuation feed.
//!
//! The endpoint answers with a JavaScript literal, not JSON:
//!
//! ```text
//! var apidata={ content:"<table>...</table>",records:2102,pages:106,curpage:1};
//! ```
//!
//! `content` holds an HTML table of daily valuations, newest first.
//! Extraction is done with plain substring scanning; rows whose date
//! or value fails to coerce are dropped, while a payload missing the
//! `content` or `pages` fields entirely is treated as transient.

use crate::domain::error::FundwatchError;
use crate::domain::series::ValuationRecord;
use crate::ports::quote_source::{QuotePage, QuoteSource};
use chrono::NaiveDate;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://fund.eastmoney.com/f10/F10DataApi.aspx";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub struct EastmoneyClient {
    client: reqwest::blocking::Client,
    base_url: String,
    page_size: usize,
}

impl EastmoneyClient {
    pub fn new(page_size: usize, timeout: Duration) -> Result<Self, FundwatchError> {
        Self::with_base_url(DEFAULT_BASE_URL, page_size, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        page_size: usize,
        timeout: Duration,
    ) -> Result<Self, FundwatchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FundwatchError::Http {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.to_string(),
            page_size,
        })
    }

    fn transient(code: &str, reason: impl Into<String>) -> FundwatchError {
        FundwatchError::TransientFetch {
            code: code.to_string(),
            reason: reason.into(),
        }
    }
}

impl QuoteSource for EastmoneyClient {
    fn fetch_page(&self, code: &str, page: usize) -> Result<QuotePage, FundwatchError> {
        let url = format!(
            "{}?type=lsjz&code={}&page={}&per={}",
            self.base_url, code, page, self.page_size
        );

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Self::transient(code, format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Self::transient(
                code,
                format!("HTTP {}", response.status()),
            ));
        }
        let body = response
            .text()
            .map_err(|e| Self::transient(code, format!("body read failed: {e}")))?;

        parse_page(code, &body)
    }
}

/// Parse the JS-literal payload into records plus the declared page
/// count.
pub fn parse_page(code: &str, body: &str) -> Result<QuotePage, FundwatchError> {
    let content = extract_quoted_field(body, "content:").ok_or_else(|| {
        EastmoneyClient::transient(code, "payload missing content field")
    })?;
    let pages = extract_numeric_field(body, "pages:").ok_or_else(|| {
        EastmoneyClient::transient(code, "payload missing pages field")
    })?;

    Ok(QuotePage {
        records: parse_table(content),
        total_pages: pages,
    })
}

/// Value of `key:"..."`, not unescaped (the feed never escapes quotes).
fn extract_quoted_field<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let start = body.find(key)? + key.len();
    let rest = &body[start..];
    let open = rest.find('"')? + 1;
    let close = rest[open..].find('"')? + open;
    Some(&rest[open..close])
}

/// Value of `key:123`.
fn extract_numeric_field(body: &str, key: &str) -> Option<usize> {
    let start = body.find(key)? + key.len();
    let digits: String = body[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Walk `<tr>` rows, pulling the date and unit-value cells. The header
/// row has no `<td>` cells and falls out naturally.
fn parse_table(html: &str) -> Vec<ValuationRecord> {
    let mut records = Vec::new();
    for row in html.split("<tr").skip(1) {
        let row = match row.find("</tr>") {
            Some(end) => &row[..end],
            None => row,
        };
        let cells = extract_cells(row);
        if cells.len() < 2 {
            continue;
        }
        let date = match NaiveDate::parse_from_str(cells[0].trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => continue,
        };
        let value: f64 = match cells[1].trim().parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        if value.is_finite() && value > 0.0 {
            records.push(ValuationRecord { date, value });
        }
    }
    records
}

fn extract_cells(row: &str) -> Vec<&str> {
    let mut cells = Vec::new();
    for chunk in row.split("<td").skip(1) {
        let Some(open) = chunk.find('>') else { continue };
        let body = &chunk[open + 1..];
        let end = body.find("</td>").unwrap_or(body.len());
        cells.push(strip_tags(&body[..end]));
    }
    cells
}

/// The value cells occasionally wrap their text in a span.
fn strip_tags(cell: &str) -> &str {
    let cell = cell.trim();
    match (cell.find('>'), cell.starts_with('<')) {
        (Some(open), true) => {
            let inner = &cell[open + 1..];
            match inner.find('<') {
                Some(close) => &inner[..close],
                None => inner,
            }
        }
        _ => match cell.find('<') {
            Some(close) => &cell[..close],
            None => cell,
        },
    }
}
