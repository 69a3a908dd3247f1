// src/process/mod.rs
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, Trim};

use std::{fs::File, io::BufReader, io::Read, path::Path};
use tracing::{debug, info};

pub mod date_parser;
pub mod derive;
pub mod filters;
pub mod pipeline;
pub mod purpose;
mod raw_table;
pub mod resources;
pub mod utils;
pub mod wallclock;

pub use raw_table::RawTable;

/// Open a delimited accounting export and read it into a [`RawTable`].
/// The first record is the header row; every later record is one job.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open accounting export: {:?}", path.as_ref()))?;
    let table = read_csv(BufReader::new(file))
        .with_context(|| format!("Failed to read accounting export: {:?}", path.as_ref()))?;
    info!(rows = table.len(), columns = table.headers.len(), "loaded");
    Ok(table)
}

/// Read CSV text from any reader. Records may be ragged; short rows read as
/// empty cells later on.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = rdr.records();
    let headers: Vec<String> = match records.next() {
        Some(header) => header
            .context("CSV parse error in header row")?
            .iter()
            .map(utils::clean_str)
            .collect(),
        None => bail!("input has no header row"),
    };

    let mut table = RawTable::new(headers);
    for (idx, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;
        if record.iter().all(str::is_empty) {
            debug!(record = idx + 1, "skipping blank record");
            continue;
        }
        table.push_row(record.iter().map(str::to_string).collect());
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "JobID,JobIDRaw,State,Timelimit,NNodes,Submit,Start,End,NodeList,Reservation
1001,1001,COMPLETED,01:00:00,2,2023-01-01T00:00:00,2023-01-01T00:05:00,2023-01-01T00:25:00,fg[001-002],
1002,1002,CANCELLED by 1002,01:00:00,1,2023-01-01T00:00:00,2023-01-01T00:10:00,2023-01-01T00:20:00,fg003,DST
";

    #[test]
    fn test_read_csv_from_memory() -> Result<()> {
        let table = read_csv(Cursor::new(SAMPLE))?;
        assert_eq!(table.headers.len(), 10);
        assert_eq!(table.headers[1], "JobIDRaw");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][2], "CANCELLED by 1002");
        assert_eq!(table.rows[0][9], "");
        Ok(())
    }

    #[test]
    fn test_load_csv_from_disk() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(SAMPLE.as_bytes())?;
        tmp.write_all(b"\n")?;

        let table = load_csv(tmp.path())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][8], "fg[001-002]");
        Ok(())
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(read_csv(Cursor::new("")).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_csv("/nonexistent/sacct.csv").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to open"));
    }
}
