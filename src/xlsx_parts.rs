//! Reads the parts of an xlsx package that `calamine` does not expose.
//!
//! Key workbooks arrive with drop-downs already wired by their authors. Cell
//! values come through `calamine`; this module pulls the list validations out
//! of each worksheet part so a saved key keeps them. Features that cannot be
//! carried over (other validation kinds, formulas, merged cells) are counted
//! so the loader can warn about them.

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use log::debug;
use quick_xml::{
    Reader,
    encoding::Decoder,
    events::{BytesStart, Event},
};
use zip::ZipArchive;

use crate::{error::WorkbookError, locator::column_index, workbook::CellRange};

/// What a worksheet part holds beyond its cell values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetExtras {
    /// List validations as (target range, `formula1` text without a leading `=`).
    pub lists: Vec<(CellRange, String)>,
    /// Validations of any other kind, or lists with no formula.
    pub skipped_validations: usize,
    pub formulas: usize,
    pub merged_cells: usize,
}

/// Extras of every worksheet in the package at `path`, keyed by tab name.
///
/// Files that are not xlsx packages yield an empty map.
pub fn read_sheet_extras(path: &Path) -> Result<HashMap<String, SheetExtras>, WorkbookError> {
    let is_package = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"));
    if !is_package {
        debug!("{path:?} is not an xlsx package; no validations to carry over");
        return Ok(HashMap::new());
    }

    let parts_error = |message: String| WorkbookError::Parts {
        path: path.to_path_buf(),
        message,
    };
    let file = File::open(path).map_err(|err| parts_error(err.to_string()))?;
    let mut zip = ZipArchive::new(file).map_err(|err| parts_error(err.to_string()))?;
    let mut read_part = |name: &str| -> Result<String, WorkbookError> {
        let mut entry = zip
            .by_name(name)
            .map_err(|err| parts_error(format!("{name}: {err}")))?;
        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|err| parts_error(format!("{name}: {err}")))?;
        Ok(xml)
    };

    let sheets = parse_sheet_ids(&read_part("xl/workbook.xml")?).map_err(&parts_error)?;
    let targets =
        parse_relationships(&read_part("xl/_rels/workbook.xml.rels")?).map_err(&parts_error)?;

    let mut extras = HashMap::new();
    for (name, rel_id) in sheets {
        let Some(target) = targets.get(&rel_id) else {
            debug!("Tab '{name}' has no worksheet relationship '{rel_id}'");
            continue;
        };
        let part = resolve_target(target);
        let sheet = parse_sheet_extras(&read_part(&part)?)
            .map_err(|message| parts_error(format!("{part}: {message}")))?;
        debug!(
            "Tab '{name}' ({part}): {} list validation(s)",
            sheet.lists.len()
        );
        extras.insert(name, sheet);
    }
    Ok(extras)
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

fn attributes(e: &BytesStart<'_>, decoder: Decoder) -> Result<Vec<(Vec<u8>, String)>, String> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|err| err.to_string())?;
            let value = attr
                .decode_and_unescape_value(decoder)
                .map_err(|err| err.to_string())?;
            Ok((attr.key.as_ref().to_vec(), value.into_owned()))
        })
        .collect()
}

fn attribute<'a>(attrs: &'a [(Vec<u8>, String)], key: &[u8]) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k.as_slice() == key)
        .map(|(_, v)| v.as_str())
}

/// (tab name, relationship id) in workbook order.
fn parse_sheet_ids(xml: &str) -> Result<Vec<(String, String)>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|err| err.to_string())? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let attrs = attributes(&e, reader.decoder())?;
                let name = attribute(&attrs, b"name");
                // The id attribute lives in the relationships namespace; its prefix varies.
                let rel_id = attrs
                    .iter()
                    .find(|(k, _)| k.as_slice() == b"id" || k.ends_with(b":id"))
                    .map(|(_, v)| v.clone());
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    sheets.push((name.to_string(), rel_id));
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(|err| err.to_string())? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let attrs = attributes(&e, reader.decoder())?;
                if let (Some(id), Some(target)) =
                    (attribute(&attrs, b"Id"), attribute(&attrs, b"Target"))
                {
                    targets.insert(id.to_string(), target.to_string());
                }
            }
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

pub(crate) fn parse_sheet_extras(xml: &str) -> Result<SheetExtras, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut extras = SheetExtras::default();

    // (sqref, is a list) of the open <dataValidation>.
    let mut current: Option<(String, bool)> = None;
    let mut formula1: Option<String> = None;
    let mut in_formula1 = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|err| err.to_string())? {
            Event::Eof => break,
            Event::Start(e) => match e.local_name().as_ref() {
                b"dataValidation" => {
                    let attrs = attributes(&e, reader.decoder())?;
                    let is_list = attribute(&attrs, b"type") == Some("list");
                    let sqref = attribute(&attrs, b"sqref").unwrap_or_default().to_string();
                    current = Some((sqref, is_list));
                    formula1 = None;
                }
                b"formula1" if current.is_some() => in_formula1 = true,
                b"f" if current.is_none() => extras.formulas += 1,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"dataValidation" => extras.skipped_validations += 1,
                b"f" if current.is_none() => extras.formulas += 1,
                b"mergeCell" => extras.merged_cells += 1,
                _ => {}
            },
            Event::Text(t) if in_formula1 => {
                let text = t.unescape().map_err(|err| err.to_string())?;
                formula1.get_or_insert_with(String::new).push_str(&text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"formula1" => in_formula1 = false,
                b"dataValidation" => {
                    if let Some((sqref, is_list)) = current.take() {
                        match formula1.take() {
                            Some(formula) if is_list => {
                                let formula = formula.trim();
                                let formula = formula.strip_prefix('=').unwrap_or(formula);
                                let ranges = parse_sqref(&sqref)?;
                                if ranges.is_empty() {
                                    extras.skipped_validations += 1;
                                }
                                for range in ranges {
                                    extras.lists.push((range, formula.to_string()));
                                }
                            }
                            _ => extras.skipped_validations += 1,
                        }
                    }
                }
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }
    Ok(extras)
}

/// Space-separated A1 references (`B2:B11 D4`) as zero-based ranges.
pub(crate) fn parse_sqref(sqref: &str) -> Result<Vec<CellRange>, String> {
    sqref
        .split_whitespace()
        .map(|part| {
            let (start, end) = part.split_once(':').unwrap_or((part, part));
            let (first_row, first_col) = parse_cell(start)?;
            let (last_row, last_col) = parse_cell(end)?;
            Ok(CellRange::new(first_row, first_col, last_row, last_col))
        })
        .collect()
}

fn parse_cell(reference: &str) -> Result<(usize, usize), String> {
    let cleaned = reference.replace('$', "");
    let split = cleaned
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| format!("invalid cell reference '{reference}'"))?;
    let (letters, digits) = cleaned.split_at(split);
    let col = column_index(letters).ok_or_else(|| format!("invalid column in '{reference}'"))?;
    let row: usize = digits
        .parse()
        .map_err(|_| format!("invalid row in '{reference}'"))?;
    if row == 0 {
        return Err(format!("invalid row in '{reference}'"));
    }
    Ok((row - 1, col))
}
