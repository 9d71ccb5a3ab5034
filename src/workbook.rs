//! In-memory workbook model with xlsx load and save.
//!
//! A [`Tab`] is a grid whose first row holds the headers. Every accessor reads
//! the current grid, so extents observed after a write always include it.
//! Reading goes through `calamine`, with list validations already in the file
//! picked up from the package parts; saving rebuilds the file with
//! `rust_xlsxwriter`, attaching the list validations and style regions that
//! were recorded on each tab.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, warn};
use rust_xlsxwriter::{DataValidation, Format, Formula, Workbook as XlsxWorkbook, Worksheet};

use crate::{
    data::{Scalar, date_to_serial, datetime_to_serial, serial_to_date, serial_to_datetime},
    error::WorkbookError,
    locator::column_letter,
    xlsx_parts::{SheetExtras, read_sheet_extras},
};

pub const VALUE: &str = "Value";
pub const UNIT: &str = "Unit";
pub const VAR_LONG: &str = "Var_long";
pub const VAR: &str = "var";
pub const LEVEL: &str = "Level";

const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

static EMPTY: Scalar = Scalar::Empty;

/// Inclusive rectangle in zero-based grid coordinates (row 0 is the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl CellRange {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn column(col: usize, first_row: usize, last_row: usize) -> Self {
        Self::new(first_row, col, last_row, col)
    }

    pub fn is_degenerate(&self) -> bool {
        self.first_row > self.last_row || self.first_col > self.last_col
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// True when `other` lies entirely inside this range.
    pub fn covers(&self, other: &CellRange) -> bool {
        self.contains(other.first_row, other.first_col)
            && self.contains(other.last_row, other.last_col)
    }

    /// A1 notation such as `A5:A9`.
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_letter(self.first_col),
            self.first_row + 1,
            column_letter(self.last_col),
            self.last_row + 1
        )
    }
}

/// Drop-down constraint whose allowed values come from a sheet range formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValidation {
    pub range: CellRange,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub font_name: String,
    pub font_size: f64,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleRegion {
    pub range: CellRange,
    pub style: CellStyle,
}

/// One data row viewed through the tab's header names.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    tab: &'a Tab,
    index: usize,
}

impl<'a> Record<'a> {
    /// Zero-based data row index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Spreadsheet row number of this record.
    pub fn sheet_row(&self) -> usize {
        Tab::sheet_row(self.index)
    }

    pub fn get(&self, field: &str) -> &'a Scalar {
        self.tab.value(self.index, field).unwrap_or(&EMPTY)
    }

    pub fn text(&self, field: &str) -> String {
        self.get(field).as_display()
    }

    pub fn is_blank(&self) -> bool {
        self.tab
            .grid
            .get(self.index + 1)
            .is_none_or(|row| row.iter().all(Scalar::is_empty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    name: String,
    grid: Vec<Vec<Scalar>>,
    validations: Vec<ListValidation>,
    styles: Vec<StyleRegion>,
}

impl Tab {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Result<Self, WorkbookError> {
        let header_row = headers.iter().map(|h| Scalar::from(*h)).collect();
        Self::from_grid(name, vec![header_row])
    }

    pub fn from_grid(
        name: impl Into<String>,
        grid: Vec<Vec<Scalar>>,
    ) -> Result<Self, WorkbookError> {
        let tab = Self {
            name: name.into(),
            grid,
            validations: Vec::new(),
            styles: Vec::new(),
        };
        tab.ensure_unique_headers()?;
        Ok(tab)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spreadsheet row number for zero-based data row `index`.
    pub fn sheet_row(index: usize) -> usize {
        index + 2
    }

    pub fn headers(&self) -> Vec<String> {
        let width = self.column_count();
        (0..width).map(|col| self.cell(0, col).as_display()).collect()
    }

    /// Data rows up to and including the last non-empty one.
    pub fn row_count(&self) -> usize {
        self.grid
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, row)| row.iter().any(|cell| !cell.is_empty()))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Columns up to and including the right-most non-empty cell in any row.
    pub fn column_count(&self) -> usize {
        self.grid
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
            .map(|pos| pos + 1)
            .max()
            .unwrap_or(0)
    }

    /// Cell at zero-based grid coordinates.
    pub fn cell(&self, row: usize, col: usize) -> &Scalar {
        self.grid
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.headers().iter().position(|h| h == field)
    }

    pub fn value(&self, index: usize, field: &str) -> Option<&Scalar> {
        let col = self.field_index(field)?;
        Some(self.cell(index + 1, col))
    }

    pub fn set_value(
        &mut self,
        index: usize,
        field: &str,
        value: Scalar,
    ) -> Result<(), WorkbookError> {
        let col = self
            .field_index(field)
            .ok_or_else(|| WorkbookError::UnknownField {
                tab: self.name.clone(),
                field: field.to_string(),
            })?;
        self.write_block(index + 1, col, &[vec![value]])
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.row_count()).map(move |index| Record { tab: self, index })
    }

    /// Indices of the data rows for which `predicate` holds, in sheet order.
    pub fn find_rows<F>(&self, predicate: F) -> Vec<usize>
    where
        F: Fn(&Record<'_>) -> bool,
    {
        self.records()
            .filter(|record| predicate(record))
            .map(|record| record.index())
            .collect()
    }

    /// Values of column `col` across the data rows.
    pub fn column_values(&self, col: usize) -> Vec<&Scalar> {
        (1..=self.row_count()).map(|row| self.cell(row, col)).collect()
    }

    /// Writes `block` with its top-left cell at grid `(first_row, first_col)`.
    ///
    /// Row 0 is the header row; a block touching it must keep headers unique.
    pub fn write_block(
        &mut self,
        first_row: usize,
        first_col: usize,
        block: &[Vec<Scalar>],
    ) -> Result<(), WorkbookError> {
        let height = block.len();
        let width = block.iter().map(Vec::len).max().unwrap_or(0);
        if first_row + height > MAX_ROWS || first_col + width > MAX_COLS {
            return Err(WorkbookError::OutOfBounds {
                tab: self.name.clone(),
                row: first_row + height,
                col: first_col + width,
            });
        }
        if self.grid.len() < first_row + height {
            self.grid.resize_with(first_row + height, Vec::new);
        }
        for (offset, values) in block.iter().enumerate() {
            let row = &mut self.grid[first_row + offset];
            if row.len() < first_col + values.len() {
                row.resize(first_col + values.len(), Scalar::Empty);
            }
            for (col_offset, value) in values.iter().enumerate() {
                row[first_col + col_offset] = value.clone();
            }
        }
        if first_row == 0 && height > 0 {
            self.ensure_unique_headers()?;
        }
        Ok(())
    }

    /// Empties column `col` from grid row `from_row` downwards.
    pub fn clear_column_from(&mut self, col: usize, from_row: usize) {
        for row in self.grid.iter_mut().skip(from_row) {
            if let Some(cell) = row.get_mut(col) {
                *cell = Scalar::Empty;
            }
        }
    }

    pub fn add_list_validation(
        &mut self,
        range: CellRange,
        source: impl Into<String>,
    ) -> Result<(), WorkbookError> {
        if range.is_degenerate() {
            return Err(WorkbookError::DegenerateRange {
                tab: self.name.clone(),
                kind: "validation",
                range: format!(
                    "rows {}..{} columns {}..{}",
                    range.first_row + 1,
                    range.last_row + 1,
                    range.first_col + 1,
                    range.last_col + 1
                ),
            });
        }
        let source = source.into();
        let before = self.validations.len();
        self.validations.retain(|existing| !range.covers(&existing.range));
        if self.validations.len() < before {
            debug!(
                "Tab '{}': {} replaces {} earlier validation(s)",
                self.name,
                range.to_a1(),
                before - self.validations.len()
            );
        }
        debug!(
            "Tab '{}': list validation {} -> {source}",
            self.name,
            range.to_a1()
        );
        self.validations.push(ListValidation { range, source });
        Ok(())
    }

    pub fn validations(&self) -> &[ListValidation] {
        &self.validations
    }

    pub fn apply_style(&mut self, range: CellRange, style: CellStyle) -> Result<(), WorkbookError> {
        if range.is_degenerate() {
            return Err(WorkbookError::DegenerateRange {
                tab: self.name.clone(),
                kind: "style",
                range: range.to_a1(),
            });
        }
        self.styles.push(StyleRegion { range, style });
        Ok(())
    }

    /// Style of the last region covering `(row, col)`.
    pub fn style_at(&self, row: usize, col: usize) -> Option<&CellStyle> {
        self.styles
            .iter()
            .rev()
            .find(|region| region.range.contains(row, col))
            .map(|region| &region.style)
    }

    /// Headers followed by data rows, every cell in display form.
    pub fn display_rows(&self) -> (Vec<String>, Vec<Vec<String>>) {
        let width = self.column_count();
        let rows = (1..=self.row_count())
            .map(|row| (0..width).map(|col| self.cell(row, col).as_display()).collect())
            .collect();
        (self.headers(), rows)
    }

    fn ensure_unique_headers(&self) -> Result<(), WorkbookError> {
        let mut seen = std::collections::HashSet::new();
        for header in self.headers() {
            if header.trim().is_empty() {
                continue;
            }
            if !seen.insert(header.clone()) {
                return Err(WorkbookError::DuplicateHeader {
                    tab: self.name.clone(),
                    header,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    tabs: Vec<Tab>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, WorkbookError> {
        let mut sheets = open_workbook_auto(path).map_err(|source| WorkbookError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut extras = read_sheet_extras(path)?;
        let mut workbook = Workbook::new();
        for name in sheets.sheet_names() {
            let range = sheets
                .worksheet_range(&name)
                .map_err(|source| WorkbookError::ReadTab {
                    tab: name.clone(),
                    source,
                })?;
            let mut grid: Vec<Vec<Scalar>> = Vec::new();
            if let Some((start_row, start_col)) = range.start() {
                for (rel_row, rel_col, data) in range.used_cells() {
                    let row = start_row as usize + rel_row;
                    let col = start_col as usize + rel_col;
                    if grid.len() <= row {
                        grid.resize_with(row + 1, Vec::new);
                    }
                    let cells = &mut grid[row];
                    if cells.len() <= col {
                        cells.resize(col + 1, Scalar::Empty);
                    }
                    cells[col] = scalar_from_data(data);
                }
            }
            debug!("Loaded tab '{name}' with {} grid row(s)", grid.len());
            let mut tab = Tab::from_grid(name.clone(), grid)?;
            if let Some(sheet) = extras.remove(&name) {
                carry_extras(&mut tab, sheet);
            }
            workbook.add_tab(tab)?;
        }
        Ok(workbook)
    }

    pub fn save(&self, path: &Path) -> Result<(), WorkbookError> {
        let mut output = XlsxWorkbook::new();
        for tab in &self.tabs {
            let worksheet = output.add_worksheet();
            worksheet.set_name(tab.name())?;
            write_tab(worksheet, tab)?;
        }
        output.save(path)?;
        Ok(())
    }

    pub fn add_tab(&mut self, tab: Tab) -> Result<(), WorkbookError> {
        if self.tab(tab.name()).is_some() {
            return Err(WorkbookError::DuplicateTab(tab.name().to_string()));
        }
        self.tabs.push(tab);
        Ok(())
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab_names(&self) -> Vec<String> {
        self.tabs.iter().map(|tab| tab.name().to_string()).collect()
    }

    pub fn tab(&self, name: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.name() == name)
    }

    pub fn tab_mut(&mut self, name: &str) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.name() == name)
    }

    pub fn require_tab(&self, name: &str) -> Result<&Tab, WorkbookError> {
        self.tab(name)
            .ok_or_else(|| WorkbookError::MissingTab(name.to_string()))
    }

    pub fn require_tab_mut(&mut self, name: &str) -> Result<&mut Tab, WorkbookError> {
        self.tab_mut(name)
            .ok_or_else(|| WorkbookError::MissingTab(name.to_string()))
    }
}

/// Keeps the list validations a loaded tab already had and reports what is lost.
fn carry_extras(tab: &mut Tab, extras: SheetExtras) {
    let kept = extras.lists.len();
    tab.validations.extend(
        extras
            .lists
            .into_iter()
            .map(|(range, source)| ListValidation { range, source }),
    );
    if kept > 0 {
        debug!("Tab '{}': kept {kept} existing list validation(s)", tab.name);
    }
    if extras.skipped_validations > 0 {
        warn!(
            "Tab '{}': {} non-list validation(s) will not be saved",
            tab.name, extras.skipped_validations
        );
    }
    if extras.formulas > 0 {
        warn!(
            "Tab '{}': {} formula cell(s) will be saved as their cached values",
            tab.name, extras.formulas
        );
    }
    if extras.merged_cells > 0 {
        warn!(
            "Tab '{}': {} merged range(s) will be saved unmerged",
            tab.name, extras.merged_cells
        );
    }
}

fn scalar_from_data(data: &Data) -> Scalar {
    match data {
        Data::Empty => Scalar::Empty,
        Data::String(s) if s.is_empty() => Scalar::Empty,
        Data::String(s) => Scalar::Text(s.clone()),
        Data::Float(f) => Scalar::Number(*f),
        Data::Int(i) => Scalar::Number(*i as f64),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            if dt.is_duration() {
                Scalar::Number(serial)
            } else if serial.fract() == 0.0 {
                serial_to_date(serial)
                    .map(Scalar::Date)
                    .unwrap_or(Scalar::Number(serial))
            } else {
                serial_to_datetime(serial)
                    .map(Scalar::DateTime)
                    .unwrap_or(Scalar::Number(serial))
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Scalar::Text(s.clone()),
        Data::Error(e) => Scalar::Text(e.to_string()),
    }
}

fn cell_format(style: Option<&CellStyle>) -> Format {
    match style {
        Some(style) => {
            let format = Format::new()
                .set_font_name(style.font_name.as_str())
                .set_font_size(style.font_size);
            if style.bold { format.set_bold() } else { format }
        }
        None => Format::new(),
    }
}

fn write_tab(worksheet: &mut Worksheet, tab: &Tab) -> Result<(), WorkbookError> {
    let rows = tab.row_count() + 1;
    let cols = tab.column_count();
    for row in 0..rows {
        for col in 0..cols {
            let style = tab.style_at(row, col);
            let format = cell_format(style);
            let (r, c) = (row as u32, col as u16);
            match tab.cell(row, col) {
                Scalar::Empty => {
                    if style.is_some() {
                        worksheet.write_blank(r, c, &format)?;
                    }
                }
                Scalar::Text(s) => {
                    worksheet.write_string_with_format(r, c, s, &format)?;
                }
                Scalar::Number(n) => {
                    worksheet.write_number_with_format(r, c, *n, &format)?;
                }
                Scalar::Bool(b) => {
                    worksheet.write_boolean_with_format(r, c, *b, &format)?;
                }
                Scalar::Date(d) => {
                    let format = format.set_num_format("yyyy-mm-dd");
                    worksheet.write_number_with_format(r, c, date_to_serial(*d), &format)?;
                }
                Scalar::DateTime(dt) => {
                    let format = format.set_num_format("yyyy-mm-dd hh:mm:ss");
                    worksheet.write_number_with_format(r, c, datetime_to_serial(*dt), &format)?;
                }
            }
        }
    }
    for validation in tab.validations() {
        let rule =
            DataValidation::new().allow_list_formula(Formula::new(validation.source.as_str()));
        worksheet.add_data_validation(
            validation.range.first_row as u32,
            validation.range.first_col as u16,
            validation.range.last_row as u32,
            validation.range.last_col as u16,
            &rule,
        )?;
    }
    Ok(())
}
