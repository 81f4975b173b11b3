//! Small utility helpers used across modules.

use chrono::{DateTime, NaiveDate};

/// Formats accepted for syllabus due dates, tried in order.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Normalize a due date to `YYYY-MM-DD`; anything unparseable becomes empty.
pub fn normalize_date(raw: &str) -> String {
  let s = raw.trim();
  if s.is_empty() {
    return String::new();
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return dt.date_naive().format("%Y-%m-%d").to_string();
  }
  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    .map(|d| d.format("%Y-%m-%d").to_string())
    .unwrap_or_default()
}

/// Log-safe truncation for large strings.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}
