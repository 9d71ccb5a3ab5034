//! Column listing for one tab of a workbook.
//!
//! Prints each header with its position and spreadsheet letter, the same
//! letters used in validation sources.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ColumnsArgs, locator::column_letter, table, workbook::Workbook};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let workbook = Workbook::load(&args.input)
        .with_context(|| format!("Loading workbook {:?}", args.input))?;
    let tab = workbook.require_tab(&args.tab)?;
    let headers = tab.headers();

    if headers.is_empty() {
        info!("Tab '{}' in {:?} has no columns", args.tab, args.input);
        return Ok(());
    }

    let rows = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| vec![(idx + 1).to_string(), column_letter(idx), header.clone()])
        .collect::<Vec<_>>();
    table::print_table(
        &["#".to_string(), "letter".to_string(), "header".to_string()],
        &rows,
    );
    info!(
        "Listed {} column(s) of tab '{}' in {:?}",
        headers.len(),
        args.tab,
        args.input
    );
    Ok(())
}
