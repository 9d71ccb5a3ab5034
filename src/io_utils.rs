//! Delimited-text readers and writers used for archives and the ledger.
//!
//! Output always quotes every field so archived descriptions containing
//! commas or line breaks survive a reload unchanged.

use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

pub fn open_csv_reader<R>(reader: R, delimiter: u8, has_headers: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(has_headers)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(
    path: &Path,
    has_headers: bool,
) -> Result<csv::Reader<BufReader<File>>> {
    let reader =
        BufReader::new(File::open(path).with_context(|| format!("Opening input file {path:?}"))?);
    Ok(open_csv_reader(reader, DEFAULT_CSV_DELIMITER, has_headers))
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(DEFAULT_CSV_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .has_headers(false)
        .flexible(true);
    builder.from_writer(writer)
}

pub fn open_csv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    let file = File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
    Ok(csv_writer(BufWriter::new(file)))
}

/// Opens `path` for appending; the flag reports whether the file was empty.
pub fn open_csv_appender(path: &Path) -> Result<(csv::Writer<File>, bool)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Opening {path:?} for append"))?;
    let is_new = file
        .metadata()
        .with_context(|| format!("Inspecting {path:?}"))?
        .len()
        == 0;
    Ok((csv_writer(file), is_new))
}
