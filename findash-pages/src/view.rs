//! Rendered page content, independent of any front-end.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;

use findash_core::chart::{ChartOutcome, ChartSpec};
use findash_core::data::DataError;
use findash_core::domain::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A headline number with an optional change annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            delta: None,
        }
    }

    pub fn with_delta(mut self, delta: impl Into<String>) -> Self {
        self.delta = Some(delta.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum SectionBody {
    Table(Table),
    Chart(ChartSpec),
    Metrics(Vec<Metric>),
    Notice(Notice),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub body: SectionBody,
}

/// Everything one page render produced, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub title: String,
    pub sections: Vec<Section>,
}

impl PageView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }

    fn push(&mut self, heading: impl Into<String>, body: SectionBody) {
        self.sections.push(Section {
            heading: heading.into(),
            body,
        });
    }

    pub fn table(&mut self, heading: impl Into<String>, table: Table) {
        self.push(heading, SectionBody::Table(table));
    }

    pub fn metrics(&mut self, heading: impl Into<String>, metrics: Vec<Metric>) {
        self.push(heading, SectionBody::Metrics(metrics));
    }

    /// A renderable chart, or an Info notice carrying the shape problem.
    pub fn chart(&mut self, heading: impl Into<String>, outcome: ChartOutcome) {
        match outcome {
            ChartOutcome::Renderable(spec) => self.push(heading, SectionBody::Chart(spec)),
            ChartOutcome::NotRenderable { reason } => {
                self.notice(heading, NoticeLevel::Info, format!("Chart not available: {reason}"))
            }
        }
    }

    pub fn notice(&mut self, heading: impl Into<String>, level: NoticeLevel, message: impl Into<String>) {
        self.push(
            heading,
            SectionBody::Notice(Notice {
                level,
                message: message.into(),
            }),
        );
    }

    pub fn error(&mut self, heading: impl Into<String>, err: &DataError) {
        self.notice(heading, NoticeLevel::Error, err.to_string());
    }

    pub fn warning(&mut self, heading: impl Into<String>, message: impl Into<String>) {
        self.notice(heading, NoticeLevel::Warning, message);
    }

    pub fn info(&mut self, heading: impl Into<String>, message: impl Into<String>) {
        self.notice(heading, NoticeLevel::Info, message);
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Notice(n) => Some(n),
            _ => None,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.notices().any(|n| n.level == NoticeLevel::Error)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Table(t) => Some((s.heading.as_str(), t)),
            _ => None,
        })
    }

    pub fn charts(&self) -> impl Iterator<Item = (&str, &ChartSpec)> {
        self.sections.iter().filter_map(|s| match &s.body {
            SectionBody::Chart(c) => Some((s.heading.as_str(), c)),
            _ => None,
        })
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }

    /// Write the first table section as CSV. Returns false when the page has none.
    pub fn write_first_table_csv<W: Write>(&self, writer: W) -> Result<bool, csv::Error> {
        match self.tables().next() {
            Some((_, table)) => {
                table.write_csv(writer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Plain-text rendering: tables are capped at `max_rows` rows.
    pub fn to_text(&self, max_rows: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.title);
        for section in &self.sections {
            let _ = writeln!(out, "\n## {}", section.heading);
            match &section.body {
                SectionBody::Table(t) => write_table(&mut out, t, max_rows),
                SectionBody::Chart(c) => {
                    let _ = writeln!(
                        out,
                        "[chart] {} ({} panes): {}",
                        c.title,
                        c.panes.len(),
                        c.trace_names().join(", ")
                    );
                }
                SectionBody::Metrics(metrics) => {
                    for m in metrics {
                        match &m.delta {
                            Some(d) => {
                                let _ = writeln!(out, "{}: {} ({d})", m.label, m.value);
                            }
                            None => {
                                let _ = writeln!(out, "{}: {}", m.label, m.value);
                            }
                        }
                    }
                }
                SectionBody::Notice(n) => {
                    let tag = match n.level {
                        NoticeLevel::Error => "ERROR",
                        NoticeLevel::Warning => "WARNING",
                        NoticeLevel::Info => "INFO",
                    };
                    let _ = writeln!(out, "{tag}: {}", n.message);
                }
            }
        }
        out
    }
}

fn write_table(out: &mut String, table: &Table, max_rows: usize) {
    let names = table.column_names();
    let shown = table.height().min(max_rows);
    let cells: Vec<Vec<String>> = (0..shown)
        .map(|row| {
            names
                .iter()
                .map(|n| table.cell_text(n, row).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(n.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let _ = writeln!(out, "{}", line(names.clone()));
    for row in &cells {
        let _ = writeln!(out, "{}", line(row.iter().map(String::as_str).collect()));
    }
    if table.height() > shown {
        let _ = writeln!(out, "... {} more rows", table.height() - shown);
    }
}
