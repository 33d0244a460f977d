mod common;

use std::fs;

use common::{boot_regs_entry, timing_test_entry, Fixtures};
use gb_rom_harness::{CatalogEntry, Category, ConfigurationError, TestCatalog};

#[test]
fn builtin_catalog_keeps_declaration_order() {
    let fixtures = Fixtures::builtin();

    let catalog = TestCatalog::builtin(fixtures.root()).unwrap();

    assert_eq!(catalog.len(), 13);
    let first = &catalog.cases()[0];
    assert_eq!(first.name, "blargg_timing_test");
    assert_eq!(first.category, Category::Timing);
    assert_eq!(first.instruction_budget, 300_000);
    assert_eq!(first.expected_hash, "806d2b02697");
    assert_eq!(
        first.rom_path,
        fixtures.root().join("timing").join("timing_test.gb")
    );
    let last = catalog.cases().last().unwrap();
    assert_eq!(last.qualified_name(), "boot/boot_regs");
    assert_eq!(last.expected_hash, "8b5d0c766cb");
}

#[test]
fn missing_rom_fails_at_build_time() {
    let fixtures = Fixtures::new();

    let result = TestCatalog::build(fixtures.root(), [timing_test_entry()]);

    match result {
        Err(ConfigurationError::MissingRom { name, path }) => {
            assert_eq!(name, "blargg_timing_test");
            assert!(path.ends_with("timing/timing_test.gb"));
        }
        other => panic!("expected MissingRom, got {other:?}"),
    }
}

#[test]
fn empty_rom_path_is_rejected() {
    let fixtures = Fixtures::new();
    let mut entry = timing_test_entry();
    entry.rom = String::new();

    let result = TestCatalog::build(fixtures.root(), [entry]);

    assert!(matches!(
        result,
        Err(ConfigurationError::EmptyRomPath { .. })
    ));
}

#[test]
fn zero_budget_is_rejected() {
    let entry = CatalogEntry::new(
        "div_write",
        Category::Timing,
        "div_write.gb",
        0,
        "7dce967813f",
    );
    let fixtures = Fixtures::with_entries(std::slice::from_ref(&entry));

    let result = TestCatalog::build(fixtures.root(), [entry]);

    assert!(matches!(result, Err(ConfigurationError::ZeroBudget { .. })));
}

#[test]
fn empty_or_split_hash_is_rejected() {
    let fixtures = Fixtures::with_entries(&[timing_test_entry()]);

    let mut empty = timing_test_entry();
    empty.expected = String::new();
    assert!(matches!(
        TestCatalog::build(fixtures.root(), [empty]),
        Err(ConfigurationError::EmptyHash { .. })
    ));

    let mut split = timing_test_entry();
    split.expected = "806d2b 02697".to_owned();
    assert!(matches!(
        TestCatalog::build(fixtures.root(), [split]),
        Err(ConfigurationError::InvalidHash { .. })
    ));
}

#[test]
fn empty_name_is_rejected() {
    let fixtures = Fixtures::with_entries(&[timing_test_entry()]);
    let mut entry = timing_test_entry();
    entry.name = "  ".to_owned();

    let result = TestCatalog::build(fixtures.root(), [entry]);

    assert!(matches!(
        result,
        Err(ConfigurationError::EmptyName { index: 0 })
    ));
}

#[test]
fn duplicate_names_are_rejected() {
    let fixtures = Fixtures::with_entries(&[timing_test_entry()]);

    let result = TestCatalog::build(fixtures.root(), [timing_test_entry(), timing_test_entry()]);

    assert!(matches!(
        result,
        Err(ConfigurationError::DuplicateName { name }) if name == "blargg_timing_test"
    ));
}

#[test]
fn filter_selects_by_name_category_and_qualified_name() {
    let fixtures = Fixtures::builtin();
    let catalog = TestCatalog::builtin(fixtures.root()).unwrap();

    let boot = catalog.filter(&["boot".to_owned()]).unwrap();
    let names: Vec<_> = boot.cases().iter().map(|case| case.name.as_str()).collect();
    assert_eq!(names, ["boot_hwio", "boot_regs"]);

    let mixed = catalog
        .filter(&["boot/boot_regs".to_owned(), "div_write".to_owned()])
        .unwrap();
    let names: Vec<_> = mixed
        .cases()
        .iter()
        .map(|case| case.name.as_str())
        .collect();
    assert_eq!(names, ["div_write", "boot_regs"]);

    assert_eq!(catalog.filter(&[]).unwrap().len(), catalog.len());
}

#[test]
fn filter_without_match_is_a_configuration_error() {
    let fixtures = Fixtures::builtin();
    let catalog = TestCatalog::builtin(fixtures.root()).unwrap();

    let result = catalog.filter(&["boot".to_owned(), "sound".to_owned()]);

    assert!(matches!(result, Err(ConfigurationError::UnknownFilter(filter)) if filter == "sound"));
}

#[test]
fn manifest_replaces_builtin_catalog() {
    let fixtures = Fixtures::with_entries(&[boot_regs_entry()]);
    let manifest = fixtures.root().join("catalog.toml");
    fs::write(
        &manifest,
        r#"
[[case]]
name = "boot_regs"
category = "boot"
rom = "boot_regs.gb"
instructions = 1000000
expected = "8b5d0c766cb"
"#,
    )
    .unwrap();

    let catalog = TestCatalog::from_manifest(&manifest, fixtures.root()).unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.cases()[0].qualified_name(), "boot/boot_regs");
    assert_eq!(catalog.cases()[0].instruction_budget, 1_000_000);
}

#[test]
fn manifest_with_negative_budget_is_rejected() {
    let fixtures = Fixtures::with_entries(&[boot_regs_entry()]);
    let manifest = fixtures.root().join("catalog.toml");
    fs::write(
        &manifest,
        r#"
[[case]]
name = "boot_regs"
category = "boot"
rom = "boot_regs.gb"
instructions = -5
expected = "8b5d0c766cb"
"#,
    )
    .unwrap();

    let result = TestCatalog::from_manifest(&manifest, fixtures.root());

    assert!(matches!(
        result,
        Err(ConfigurationError::ManifestParse { .. })
    ));
}

#[test]
fn misspelled_case_table_is_rejected() {
    let fixtures = Fixtures::with_entries(&[boot_regs_entry()]);
    let manifest = fixtures.root().join("catalog.toml");
    fs::write(
        &manifest,
        r#"
[[cases]]
name = "boot_regs"
category = "boot"
rom = "boot_regs.gb"
instructions = 1000000
expected = "8b5d0c766cb"
"#,
    )
    .unwrap();

    let result = TestCatalog::from_manifest(&manifest, fixtures.root());

    assert!(matches!(
        result,
        Err(ConfigurationError::ManifestParse { .. })
    ));
}

#[test]
fn misspelled_entry_field_is_rejected() {
    let fixtures = Fixtures::with_entries(&[boot_regs_entry()]);
    let manifest = fixtures.root().join("catalog.toml");
    fs::write(
        &manifest,
        r#"
[[case]]
name = "boot_regs"
category = "boot"
rom = "boot_regs.gb"
instructions = 1000000
expected = "8b5d0c766cb"
expected_hash = "8b5d0c766cb"
"#,
    )
    .unwrap();

    let result = TestCatalog::from_manifest(&manifest, fixtures.root());

    assert!(matches!(
        result,
        Err(ConfigurationError::ManifestParse { .. })
    ));
}

#[test]
fn manifest_without_cases_is_rejected() {
    let fixtures = Fixtures::new();
    let manifest = fixtures.root().join("catalog.toml");
    fs::write(&manifest, "# nothing declared yet\n").unwrap();

    let result = TestCatalog::from_manifest(&manifest, fixtures.root());

    assert!(matches!(result, Err(ConfigurationError::EmptyManifest(path)) if path == manifest));
}
