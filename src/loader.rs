use std::path::Path;

use csv::StringRecord;

use crate::error::{Error, Result};
use crate::models::Record;

const REQUIRED_COLUMNS: [&str; 6] = [
    "Name",
    "Course Name",
    "Course Code",
    "Present",
    "Total Sessions",
    "Average",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Delimited(u8),
    Workbook,
}

fn detect_format(path: &Path) -> Result<TableFormat> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(TableFormat::Delimited(b',')),
        "tsv" => Ok(TableFormat::Delimited(b'\t')),
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(TableFormat::Workbook),
        other => Err(Error::Format(format!("unsupported file extension {other:?}"))),
    }
}

pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    match detect_format(path)? {
        TableFormat::Delimited(delimiter) => load_delimited(path, delimiter),
        TableFormat::Workbook => load_workbook(path),
    }
}

fn check_headers(headers: &StringRecord) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|header| header.trim() == **required))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema(missing.join(", ")))
    }
}

fn from_csv(err: csv::Error) -> Error {
    let detail = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => Error::Io(io),
        _ => Error::Format(detail),
    }
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(from_csv)?;

    let headers = reader.headers().map_err(from_csv)?.clone();
    check_headers(&headers)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        records.push(row.map_err(from_csv)?);
    }

    Ok(records)
}

fn load_workbook(path: &Path) -> Result<Vec<Record>> {
    use calamine::Reader;

    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|err| Error::Format(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Format("workbook has no worksheets".to_string()))?
        .map_err(|err| Error::Format(err.to_string()))?;

    let mut rows = range.rows();
    let headers: StringRecord = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect()
        })
        .ok_or_else(|| Error::Format("workbook sheet is empty".to_string()))?;
    check_headers(&headers)?;

    let mut records = Vec::new();
    for row in rows {
        let fields: StringRecord = row.iter().map(|cell| cell.to_string()).collect();
        if fields.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        records.push(fields.deserialize(Some(&headers)).map_err(from_csv)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const ROSTER: &str = "\
Name,Roll Number,Course Name,Course Code,Present,Total Sessions,Average
Amit,R1,Mathematics,MA101,18,20,90%
Amit,R1,Physics,PH102,10,20,50%
Nisha,R2,Mathematics,MA101,20,20,100%
";

    fn write_fixture(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_csv_rows_in_order() {
        let (_dir, path) = write_fixture("roster.csv", ROSTER);
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].course, "Mathematics");
        assert_eq!(records[1].course, "Physics");
        assert_eq!(records[2].name, "Nisha");
        assert_eq!(records[0].roll.as_deref(), Some("R1"));
    }

    #[test]
    fn email_column_is_optional() {
        let (_dir, path) = write_fixture("roster.csv", ROSTER);
        let records = load_records(&path).unwrap();
        assert!(records.iter().all(|record| record.email.is_none()));
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let tsv = ROSTER.replace(',', "\t");
        let (_dir, path) = write_fixture("roster.tsv", &tsv);
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].code, "PH102");
    }

    #[test]
    fn unknown_extension_is_a_format_error() {
        let (_dir, path) = write_fixture("roster.pdf", ROSTER);
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, Error::Format(_)), "got {err:?}");
    }

    #[test]
    fn missing_identity_column_is_a_schema_error() {
        let headless = "\
Student,Course Name,Course Code,Present,Total Sessions,Average
Amit,Mathematics,MA101,18,20,90%
";
        let (_dir, path) = write_fixture("roster.csv", headless);
        let err = load_records(&path).unwrap_err();
        match err {
            Error::Schema(missing) => assert_eq!(missing, "Name"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn roll_no_header_is_accepted_as_alias() {
        let aliased = ROSTER.replace("Roll Number", "Roll No");
        let (_dir, path) = write_fixture("roster.csv", &aliased);
        let records = load_records(&path).unwrap();
        assert_eq!(records[0].roll.as_deref(), Some("R1"));
    }
}
