//! Report output: console tables and saved files.

use anstream::println;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use serde_json::Value;

pub(crate) mod files;

pub(crate) use files::OutputError;

/// A header and rows of cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Table {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new(header: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    pub(crate) fn push(&mut self, row: impl IntoIterator<Item = impl Into<String>>) {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();

        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(idx) {
                    Some(width) => *width = (*width).max(len),
                    None => widths.push(len),
                }
            }
        }

        widths
    }

    /// Lay this table out as aligned lines: the header, a `-` separator,
    /// then one line per row.
    pub(crate) fn lines(&self) -> Vec<String> {
        let widths = self.widths();

        let layout = |cells: &[String]| {
            widths
                .iter()
                .enumerate()
                .map(|(idx, width)| {
                    let cell = cells.get(idx).map(String::as_str).unwrap_or_default();
                    format!("{cell:<width$}")
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let separator = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-|-");

        std::iter::once(layout(&self.header))
            .chain(std::iter::once(separator))
            .chain(self.rows.iter().map(|row| layout(row)))
            .collect()
    }

    fn print(&self) {
        let mut lines = self.lines().into_iter();

        if let Some(header) = lines.next() {
            println!("{}", header.bold());
        }
        for line in lines {
            println!("{line}");
        }
    }
}

/// Where to save a report, besides the console.
#[derive(Clone, Debug, Default)]
pub(crate) struct OutputTargets {
    pub(crate) csv: Option<Utf8PathBuf>,
    pub(crate) json: Option<Utf8PathBuf>,
    pub(crate) markdown: Option<Utf8PathBuf>,
}

/// Everything a report produces.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ReportOutput {
    /// Shown above the main table, e.g. license totals.
    pub(crate) summary: Option<Table>,
    /// The main table. This is what CSV and Markdown files contain.
    pub(crate) table: Table,
    /// The full report, for JSON files.
    pub(crate) json: Value,
}

impl ReportOutput {
    /// Show the report on the console (unless `silent`), then save it
    /// to every requested file.
    pub(crate) fn emit(&self, silent: bool, targets: &OutputTargets) -> Result<(), OutputError> {
        if !silent {
            if let Some(summary) = &self.summary {
                summary.print();
                println!();
            }
            self.table.print();
        }

        if let Some(path) = &targets.csv {
            files::save_csv(path, &self.table)?;
            saved("CSV", path);
        }

        if let Some(path) = &targets.markdown {
            files::save_markdown(path, &self.table)?;
            saved("Markdown", path);
        }

        if let Some(path) = &targets.json {
            files::save_json(path, &self.json)?;
            saved("JSON", path);
        }

        Ok(())
    }
}

fn saved(kind: &str, path: &Utf8PathBuf) {
    tracing::info!("{saved} {kind} report to {path}", saved = "saved".green());
}
