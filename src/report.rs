use std::fmt::Write;

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Group, Record};

const COURSE_WIDTH: usize = 24;
const CODE_WIDTH: usize = 8;
const RATIO_WIDTH: usize = 9;
const PERCENT_WIDTH: usize = 7;

const PLACEHOLDER_NAME: &str = "name";
const PLACEHOLDER_ATTENDANCE: &str = "attendance";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterPolicy {
    All,
    Below(f64),
}

impl FilterPolicy {
    fn selects(&self, percent: f64) -> bool {
        match self {
            FilterPolicy::All => true,
            FilterPolicy::Below(threshold) => percent < *threshold,
        }
    }
}

pub fn parse_percent(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let value = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    value
        .parse::<f64>()
        .map_err(|_| Error::Parse(raw.to_string()))
}

fn qualifying_rows<'a>(group: &'a Group, policy: FilterPolicy) -> Vec<(&'a Record, f64)> {
    let mut rows = Vec::new();

    for record in &group.records {
        match parse_percent(&record.average) {
            Ok(percent) => {
                if policy.selects(percent) {
                    rows.push((record, percent));
                }
            }
            Err(_) => warn!(
                student = %group.key,
                course = %record.course,
                value = %record.average,
                "skipping row with non-numeric attendance value"
            ),
        }
    }

    rows
}

/// Renders the group's qualifying rows as a fixed-width table, or `None`
/// when nothing qualifies and no message should go out.
pub fn format_report(group: &Group, policy: FilterPolicy) -> Option<String> {
    let rows = qualifying_rows(group, policy);
    if rows.is_empty() {
        return None;
    }
    Some(render_table(&rows))
}

fn render_table(rows: &[(&Record, f64)]) -> String {
    let mut table = String::new();

    let _ = writeln!(
        table,
        "{} {} {} {}",
        clip("Course", COURSE_WIDTH),
        clip("Code", CODE_WIDTH),
        pad_left("Attended", RATIO_WIDTH),
        pad_left("Average", PERCENT_WIDTH),
    );
    let _ = writeln!(
        table,
        "{} {} {} {}",
        "-".repeat(COURSE_WIDTH),
        "-".repeat(CODE_WIDTH),
        "-".repeat(RATIO_WIDTH),
        "-".repeat(PERCENT_WIDTH),
    );

    for (record, percent) in rows {
        let ratio = format!("{}/{}", record.present.trim(), record.total.trim());
        let _ = writeln!(
            table,
            "{} {} {} {}",
            clip(record.course.trim(), COURSE_WIDTH),
            clip(record.code.trim(), CODE_WIDTH),
            pad_left(&ratio, RATIO_WIDTH),
            pad_left(&format!("{percent:.2}%"), PERCENT_WIDTH),
        );
    }

    table
}

fn clip(value: &str, width: usize) -> String {
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:<width$}")
}

fn pad_left(value: &str, width: usize) -> String {
    let truncated: String = value.chars().take(width).collect();
    format!("{truncated:>width$}")
}

pub fn validate_template(template: &str) -> Result<()> {
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let tail = &rest[start + 1..];
        let Some(end) = tail.find('}') else {
            return Err(Error::Template("unclosed '{' in template".to_string()));
        };
        let placeholder = &tail[..end];
        if placeholder != PLACEHOLDER_NAME && placeholder != PLACEHOLDER_ATTENDANCE {
            return Err(Error::Template(format!(
                "unknown placeholder {{{placeholder}}}"
            )));
        }
        rest = &tail[end + 1..];
    }

    Ok(())
}

// Single left-to-right pass; substituted values are never rescanned, so
// braces inside student data cannot expand again.
pub fn render_template(template: &str, name: &str, attendance: &str) -> String {
    let mut output = String::with_capacity(template.len() + name.len() + attendance.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let Some(end) = tail.find('}') else {
            rest = &rest[start..];
            break;
        };
        match &tail[..end] {
            PLACEHOLDER_NAME => output.push_str(name),
            PLACEHOLDER_ATTENDANCE => output.push_str(attendance),
            other => {
                output.push('{');
                output.push_str(other);
                output.push('}');
            }
        }
        rest = &tail[end + 1..];
    }

    output.push_str(rest);
    output
}
