//! CSV, Markdown and JSON report files.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use thiserror::Error;

use super::Table;

/// Errors while saving a report file. All of them are fatal.
#[derive(Debug, Error)]
pub(crate) enum OutputError {
    #[error("couldn't write {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't write CSV report to {path}")]
    Csv {
        path: Utf8PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("couldn't write JSON report to {path}")]
    Json {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn create(path: &Utf8Path) -> Result<BufWriter<File>, OutputError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| OutputError::Io {
            path: path.into(),
            source,
        })
}

pub(crate) fn write_csv<W: Write>(writer: W, table: &Table) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

fn escape_markdown(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

pub(crate) fn write_markdown<W: Write>(mut writer: W, table: &Table) -> io::Result<()> {
    let line = |cells: &[String]| {
        format!(
            "| {} |",
            cells
                .iter()
                .map(|cell| escape_markdown(cell))
                .collect::<Vec<_>>()
                .join(" | ")
        )
    };

    writeln!(writer, "{}", line(&table.header))?;
    writeln!(
        writer,
        "|{}|",
        vec![" --- "; table.header.len()].join("|")
    )?;
    for row in &table.rows {
        writeln!(writer, "{}", line(row))?;
    }

    writer.flush()
}

pub(crate) fn save_csv(path: &Utf8Path, table: &Table) -> Result<(), OutputError> {
    write_csv(create(path)?, table).map_err(|source| OutputError::Csv {
        path: path.into(),
        source,
    })
}

pub(crate) fn save_markdown(path: &Utf8Path, table: &Table) -> Result<(), OutputError> {
    write_markdown(create(path)?, table).map_err(|source| OutputError::Io {
        path: path.into(),
        source,
    })
}

pub(crate) fn save_json(path: &Utf8Path, json: &Value) -> Result<(), OutputError> {
    let mut writer = create(path)?;

    serde_json::to_writer_pretty(&mut writer, json).map_err(|source| OutputError::Json {
        path: path.into(),
        source,
    })?;

    writeln!(writer)
        .and_then(|()| writer.flush())
        .map_err(|source| OutputError::Io {
            path: path.into(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::{OutputError, save_csv, write_csv, write_markdown};
    use crate::output::Table;

    fn table() -> Table {
        let mut table = Table::new(["owner", "repo", "workflow_path", "uses", "permissions"]);
        table.push([
            "octo-org",
            "hello",
            ".github/workflows/ci.yml",
            "actions/checkout (v4), some-org/some-action (v1.2.3)",
            "contents: read",
        ]);
        table.push([
            "octo-org",
            "pipes",
            ".github/workflows/odd.yml",
            "weird|name ()",
            "",
        ]);
        table
    }

    #[test]
    fn test_write_csv() {
        let mut out = vec![];
        write_csv(&mut out, &table()).unwrap();

        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r#"
        owner,repo,workflow_path,uses,permissions
        octo-org,hello,.github/workflows/ci.yml,"actions/checkout (v4), some-org/some-action (v1.2.3)",contents: read
        octo-org,pipes,.github/workflows/odd.yml,weird|name (),
        "#);
    }

    #[test]
    fn test_write_markdown() {
        let mut out = vec![];
        write_markdown(&mut out, &table()).unwrap();

        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        | owner | repo | workflow_path | uses | permissions |
        | --- | --- | --- | --- | --- |
        | octo-org | hello | .github/workflows/ci.yml | actions/checkout (v4), some-org/some-action (v1.2.3) | contents: read |
        | octo-org | pipes | .github/workflows/odd.yml | weird\|name () |  |
        ");
    }

    #[test]
    fn test_save_to_missing_directory() {
        let path = Utf8PathBuf::from("this/directory/does/not/exist/report.csv");

        let err = save_csv(&path, &table()).unwrap_err();
        assert!(matches!(err, OutputError::Io { .. }));
        assert_eq!(
            err.to_string(),
            "couldn't write this/directory/does/not/exist/report.csv"
        );
    }
}
