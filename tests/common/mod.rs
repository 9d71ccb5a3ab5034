#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use somkey::data::Scalar;
use somkey::workbook::{LEVEL, Tab, UNIT, VALUE, VAR, VAR_LONG, Workbook};
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Saves `workbook` as xlsx under the workspace and returns the path.
    pub fn write_workbook(&self, name: &str, workbook: &Workbook) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        workbook.save(&path).expect("save fixture workbook");
        path
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

/// `(Value, Unit, Var_long, var, Level)` rows in the long key layout.
pub type KeyRow<'a> = (Scalar, &'a str, &'a str, &'a str, &'a str);

pub fn long_tab(name: &str, rows: &[KeyRow<'_>]) -> Tab {
    let mut tab = Tab::new(name, &[VALUE, UNIT, VAR_LONG, VAR, LEVEL]).expect("headers");
    let block = rows
        .iter()
        .map(|(value, unit, long, var, level)| {
            vec![
                value.clone(),
                Scalar::from(*unit),
                Scalar::from(*long),
                Scalar::from(*var),
                Scalar::from(*level),
            ]
        })
        .collect::<Vec<_>>();
    tab.write_block(1, 0, &block).expect("rows");
    tab
}

/// Five location rows; `modification_date` is on data row 3 (sheet row 5).
pub fn location_tab(modification_date: Scalar) -> Tab {
    long_tab(
        "Location",
        &[
            (Scalar::text("KNZ"), "", "Site name", "site_code", "location"),
            (Scalar::Number(39.1), "dec. deg", "Latitude", "lat", "location"),
            (Scalar::Number(-96.6), "dec. deg", "Longitude", "long", "location"),
            (modification_date, "", "Modification date", "modification_date", "location"),
            (Scalar::text("J. Doe"), "", "Data curator", "curator_name", "location"),
        ],
    )
}

/// Profile rows; `Treatment_` rows occupy sheet rows 5 through 9.
///
/// With `duplicate_soc`, two distinct descriptions share the `soc` var.
pub fn profile_tab(duplicate_soc: bool) -> Tab {
    let mut rows: Vec<KeyRow<'_>> = vec![
        (Scalar::Empty, "percent", "Total carbon concentration", "c_tot", "layer"),
        (Scalar::Empty, "percent", "Organic carbon concentration", "oc", "layer"),
        (Scalar::Empty, "g/cm3", "Bulk density", "bd", "layer"),
        (Scalar::text("control"), "", "Treatment_1", "tx_L1", "layer"),
        (Scalar::text("N"), "", "Treatment_2", "tx_L2", "layer"),
        (Scalar::text("CO2"), "", "Treatment_3", "tx_L3", "layer"),
        (Scalar::Empty, "", "Treatment_4", "tx_L4", "layer"),
        (Scalar::Empty, "", "Treatment_5", "tx_L5", "layer"),
        (Scalar::Empty, "g/kg", "Total Soil Carbon Stock", "soc_stock", "profile"),
    ];
    if duplicate_soc {
        rows.push((Scalar::Empty, "g/kg", "Total Soil Carbon", "soc", "layer"));
        rows.push((Scalar::Empty, "g/kg", "Total Soil Carbon Stock", "soc", "layer"));
    } else {
        rows.push((Scalar::Empty, "g/kg", "Total Soil Carbon", "soc", "layer"));
    }
    long_tab("Profile", &rows)
}

/// Vocabulary tab with `tx_options` in column E and `soilCN_options` in F.
pub fn units_tab() -> Tab {
    let headers = [
        "unit_options",
        "depth_options",
        "lab_options",
        "method_options",
        "tx_options",
        "soilCN_options",
    ];
    let mut tab = Tab::new("Units", &headers).expect("headers");
    let values = [
        ["percent", "cm", "lab_a", "dry_combustion", "t", "CHN"],
        ["g/kg", "m", "lab_b", "walkley_black", "c", "NIRS"],
        ["g/cm3", "", "", "", "", "other"],
    ];
    let block = values
        .iter()
        .map(|row| row.iter().map(|v| Scalar::from(*v)).collect())
        .collect::<Vec<_>>();
    tab.write_block(1, 0, &block).expect("vocabulary");
    tab
}

pub fn key_workbook(duplicate_soc: bool) -> Workbook {
    key_workbook_with_date(duplicate_soc, Scalar::Number(44197.0))
}

pub fn key_workbook_with_date(duplicate_soc: bool, modification_date: Scalar) -> Workbook {
    let mut workbook = Workbook::new();
    workbook
        .add_tab(location_tab(modification_date))
        .expect("location");
    workbook
        .add_tab(profile_tab(duplicate_soc))
        .expect("profile");
    workbook.add_tab(units_tab()).expect("units");
    workbook
}

/// Built-in plan plus a profile rename for the duplicated `soc` name.
pub fn rename_plan() -> somkey::plan::MigrationPlan {
    let mut plan = somkey::plan::MigrationPlan::builtin().expect("builtin plan");
    plan.renames.profile.push(somkey::duplicates::RenameEntry {
        var_long: "Total Soil Carbon".to_string(),
        level: Some("layer".to_string()),
        var: "soc_tot".to_string(),
    });
    plan
}
