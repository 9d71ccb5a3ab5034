use anyhow::{Context, Result};
use log::info;

use crate::{cli::PreviewArgs, table, workbook::Workbook};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let workbook = Workbook::load(&args.input)
        .with_context(|| format!("Loading workbook {:?}", args.input))?;
    let tab = workbook.require_tab(&args.tab)?;
    let (headers, rows) = table::numbered_rows(tab, args.rows);
    table::print_table(&headers, &rows);
    info!(
        "Displayed {} of {} row(s) from tab '{}'",
        rows.len(),
        tab.row_count(),
        args.tab
    );
    Ok(())
}
