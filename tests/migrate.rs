mod common;

use std::fs;

use common::{TestWorkspace, key_workbook, key_workbook_with_date, rename_plan};
use somkey::archive::{CsvArchive, NoArchive, TabRole, read_tab};
use somkey::data::Scalar;
use somkey::duplicates::find_duplicate_vars;
use somkey::error::MigrationError;
use somkey::migrate::Migrator;
use somkey::plan::MigrationPlan;
use somkey::workbook::{CellRange, LEVEL, VALUE, VAR, VAR_LONG, Workbook};

fn builtin() -> MigrationPlan {
    MigrationPlan::builtin().expect("builtin plan")
}

#[test]
fn new_fields_land_three_rows_below_the_data() {
    let plan = builtin();
    let mut workbook = key_workbook(false);
    let units_before = workbook.tab("Units").unwrap().headers();

    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .expect("migration succeeds");

    // 5 data rows, so the first new field sits on spreadsheet row 8.
    let inserted = report.inserted.expect("rows inserted");
    assert_eq!(inserted.first_sheet_row, 5 + 3);
    let location = workbook.tab("Location").unwrap();
    assert_eq!(location.row_count(), 5 + 1 + 6);
    assert!(location.records().nth(5).unwrap().is_blank());
    for (offset, field) in plan.new_fields.iter().enumerate() {
        let index = 6 + offset;
        assert_eq!(somkey::workbook::Tab::sheet_row(index), 8 + offset);
        assert_eq!(location.value(index, VAR), Some(&Scalar::text(field.var.as_str())));
        assert_eq!(
            location.value(index, VAR_LONG),
            Some(&Scalar::text(field.var_long.as_str()))
        );
        assert_eq!(
            location.value(index, VALUE),
            Some(&field.value.clone().unwrap_or_default())
        );
    }

    let units_after = workbook.tab("Units").unwrap().headers();
    assert_eq!(units_after.len(), units_before.len() + 1);
    assert_eq!(units_after.last().map(String::as_str), Some("logical"));
    assert_eq!(units_after[4], "tx_options");
}

#[test]
fn treatment_rows_are_bound_to_the_treatment_vocabulary() {
    let plan = builtin();
    let mut workbook = key_workbook(false);
    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();

    let profile = &report.validations[0];
    assert_eq!(profile.tab, "Profile");
    assert_eq!(profile.range, "A5:A9");
    assert_eq!(profile.source, "'Units'!$E$2:$E$13");

    let logical = report
        .validations
        .iter()
        .filter(|v| v.source == "'Units'!$G$2:$G$3")
        .map(|v| v.range.as_str())
        .collect::<Vec<_>>();
    assert_eq!(logical, vec!["A9:A9", "A10:A10", "A11:A11", "A12:A12"]);

    let lit_lig = report.validations.last().unwrap();
    assert_eq!(lit_lig.range, "A13:A13");
    assert_eq!(lit_lig.source, "'Units'!$F$2:$F$4");

    let recorded = workbook.tab("Location").unwrap().validations().len();
    assert_eq!(recorded, 5);
}

#[test]
fn migrated_keys_are_refused_without_side_effects() {
    let plan = builtin();
    let workspace = TestWorkspace::new();
    let mut workbook = key_workbook(false);
    Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    let migrated = workbook.clone();

    let archive_dir = workspace.dir("archive");
    fs::create_dir_all(&archive_dir).unwrap();
    let archive = CsvArchive::new(&archive_dir, "konza");
    let err = Migrator::new(&plan)
        .migrate(&mut workbook, &archive)
        .unwrap_err();

    match err {
        MigrationError::AlreadyMigrated { version, fields, .. } => {
            assert_eq!(version, "2");
            assert_eq!(fields.len(), 6);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(workbook, migrated);
    assert_eq!(fs::read_dir(&archive_dir).unwrap().count(), 0);
}

#[test]
fn renames_resolve_colliding_profile_names() {
    let plan = rename_plan();
    let mut workbook = key_workbook(true);
    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .expect("rename resolves the duplicate");

    assert_eq!(report.renames.len(), 1);
    assert_eq!(report.renames[0].previous, "soc");
    assert_eq!(report.renames[0].sheet_row, 11);

    let profile = workbook.tab("Profile").unwrap();
    let renamed = profile.find_rows(|r| r.get(VAR).matches_text("soc_tot"));
    assert_eq!(renamed.len(), 1);
    let stale = profile.find_rows(|r| {
        r.get(VAR_LONG).matches_text("Total Soil Carbon")
            && r.get(LEVEL).matches_text("layer")
            && r.get(VAR).matches_text("soc")
    });
    assert!(stale.is_empty());
    assert!(find_duplicate_vars(profile).is_empty());
}

#[test]
fn unresolved_duplicates_abort_the_migration() {
    let plan = builtin();
    let mut workbook = key_workbook(true);
    let err = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap_err();
    match err {
        MigrationError::DuplicateVar { duplicates } => {
            assert_eq!(duplicates.len(), 1);
            assert_eq!(duplicates[0].tab, "Profile");
            assert_eq!(duplicates[0].var, "soc");
            assert_eq!(duplicates[0].rows, vec![11, 12]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ambiguous_rename_targets_are_reported() {
    let mut plan = builtin();
    plan.renames.location.push(somkey::duplicates::RenameEntry {
        var_long: "itude".to_string(),
        level: None,
        var: "coordinate".to_string(),
    });
    let err = Migrator::new(&plan)
        .migrate(&mut key_workbook(false), &NoArchive)
        .unwrap_err();
    match err {
        MigrationError::AmbiguousRenameTarget {
            tab,
            pattern_matches,
            exact_matches,
            ..
        } => {
            assert_eq!(tab, "Location");
            assert_eq!(pattern_matches, 2);
            assert_eq!(exact_matches, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_modification_date_is_kept() {
    let plan = builtin();
    let mut workbook = key_workbook_with_date(false, Scalar::text("spring 2020"));
    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .expect("date failures are not fatal");

    assert_eq!(report.dates.len(), 1);
    assert!(report.dates[0].after.is_none());
    assert!(report.dates[0].warning.is_some());
    assert_eq!(
        workbook.tab("Location").unwrap().value(3, VALUE),
        Some(&Scalar::text("spring 2020"))
    );
}

#[test]
fn serial_modification_date_is_normalized() {
    let plan = builtin();
    let mut workbook = key_workbook(false);
    Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    assert_eq!(
        workbook.tab("Location").unwrap().value(3, VALUE),
        Some(&Scalar::text("2021-01-01"))
    );
}

#[test]
fn legacy_carbon_labels_are_corrected() {
    let plan = builtin();
    let mut workbook = key_workbook(false);
    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    assert_eq!(report.labels.len(), 2);
    let profile = workbook.tab("Profile").unwrap();
    assert_eq!(
        profile.value(0, VAR_LONG),
        Some(&Scalar::text(
            "Total carbon concentration (not acid treated; includes inorganic C)"
        ))
    );
    assert_eq!(
        profile.value(1, VAR_LONG),
        Some(&Scalar::text(
            "Organic carbon concentration (acid treated or inorganic C removed)"
        ))
    );
}

#[test]
fn qualified_carbon_labels_keep_their_meaning() {
    let plan = builtin();
    let mut workbook = key_workbook(false);
    workbook
        .tab_mut("Profile")
        .unwrap()
        .set_value(0, VAR_LONG, Scalar::text("Total carbon concentration (acid treated)"))
        .unwrap();
    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    assert_eq!(report.labels.len(), 1);
    assert_eq!(report.labels[0].sheet_row, 3);
    assert_eq!(
        workbook.tab("Profile").unwrap().value(0, VAR_LONG),
        Some(&Scalar::text("Total carbon concentration (acid treated)"))
    );
}

#[test]
fn archives_match_the_pre_migration_tabs() {
    let plan = builtin();
    let workspace = TestWorkspace::new();
    let mut workbook = key_workbook(false);
    let original = workbook.clone();
    let archive = CsvArchive::new(workspace.path(), "konza");

    let report = Migrator::new(&plan)
        .migrate(&mut workbook, &archive)
        .unwrap();
    assert_eq!(report.archived.len(), 2);

    for (role, name) in [(TabRole::Location, "Location"), (TabRole::Profile, "Profile")] {
        let reloaded = read_tab(&archive.path_for(role), name).unwrap();
        assert_eq!(
            reloaded.display_rows(),
            original.tab(name).unwrap().display_rows()
        );
    }
}

#[test]
fn saved_workbooks_reload_with_their_values() {
    let plan = builtin();
    let workspace = TestWorkspace::new();
    let mut workbook = key_workbook(false);
    Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    let path = workspace.write_workbook("konza_KEY_V2.xlsx", &workbook);

    let reloaded = Workbook::load(&path).unwrap();
    assert_eq!(reloaded.tab_names(), vec!["Location", "Profile", "Units"]);
    for tab in workbook.tabs() {
        assert_eq!(
            reloaded.tab(tab.name()).unwrap().display_rows(),
            tab.display_rows(),
            "tab {}",
            tab.name()
        );
    }
    Migrator::new(&plan)
        .check_version(&reloaded)
        .expect_err("reloaded key is already migrated");
}

#[test]
fn datetime_cells_keep_their_time_of_day() {
    let plan = builtin();
    let workspace = TestWorkspace::new();
    let sampled = chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap();
    let mut source = key_workbook(false);
    source
        .tab_mut("Profile")
        .unwrap()
        .set_value(2, VALUE, Scalar::DateTime(sampled))
        .unwrap();
    let source_path = workspace.write_workbook("konza.xlsx", &source);

    let mut workbook = Workbook::load(&source_path).unwrap();
    assert_eq!(
        workbook.tab("Profile").unwrap().value(2, VALUE),
        Some(&Scalar::DateTime(sampled))
    );
    Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    let path = workspace.write_workbook("konza_KEY_V2.xlsx", &workbook);

    let reloaded = Workbook::load(&path).unwrap();
    assert_eq!(
        reloaded.tab("Profile").unwrap().value(2, VALUE),
        Some(&Scalar::DateTime(sampled))
    );
}

#[test]
fn existing_drop_downs_survive_a_migration() {
    let plan = builtin();
    let workspace = TestWorkspace::new();
    let mut source = key_workbook(false);
    let unit_list = CellRange::column(1, 1, 10);
    source
        .tab_mut("Profile")
        .unwrap()
        .add_list_validation(unit_list, "'Units'!$A$2:$A$4")
        .unwrap();
    let source_path = workspace.write_workbook("konza.xlsx", &source);

    let mut workbook = Workbook::load(&source_path).unwrap();
    let kept = workbook.tab("Profile").unwrap().validations().to_vec();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].range, unit_list);
    assert_eq!(kept[0].source, "'Units'!$A$2:$A$4");

    Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap();
    let path = workspace.write_workbook("konza_KEY_V2.xlsx", &workbook);
    let reloaded = Workbook::load(&path).unwrap();

    let profile = reloaded.tab("Profile").unwrap().validations();
    let ranges = profile.iter().map(|v| v.range.to_a1()).collect::<Vec<_>>();
    assert!(ranges.contains(&"B2:B11".to_string()), "{ranges:?}");
    assert!(ranges.contains(&"A5:A9".to_string()), "{ranges:?}");
    let location = reloaded.tab("Location").unwrap().validations();
    assert_eq!(location.len(), 5);
}

#[test]
fn missing_level_column_is_reported_by_name() {
    let mut plan = rename_plan();
    plan.tabs.profile = "Layers".to_string();
    let mut workbook = key_workbook(true);
    let mut layers = somkey::workbook::Tab::new("Layers", &[VALUE, "Unit", VAR_LONG, VAR]).unwrap();
    layers
        .write_block(
            1,
            0,
            &[vec![
                Scalar::Empty,
                Scalar::Empty,
                Scalar::text("Total Soil Carbon"),
                Scalar::text("soc"),
            ]],
        )
        .unwrap();
    workbook.add_tab(layers).unwrap();

    let err = Migrator::new(&plan)
        .migrate(&mut workbook, &NoArchive)
        .unwrap_err();
    match err {
        MigrationError::ColumnNotFound { tab, pattern } => {
            assert_eq!(tab, "Layers");
            assert_eq!(pattern, "^Level$");
        }
        other => panic!("unexpected error: {other}"),
    }
}
