//! Registry of conformance cases.
//!
//! A catalog is declared as a list of [`CatalogEntry`] values (built in, or loaded from a TOML
//! manifest) and turned into validated [`TestCase`]s by [`TestCatalog::build`]. ROM files live
//! under `<fixture_root>/<category>/`.
//!
//! ```toml
//! [[case]]
//! name = "div_write"
//! category = "timing"
//! rom = "div_write.gb"
//! instructions = 500000
//! expected = "7dce967813f"
//! ```

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::harness::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Boot,
    Cpu,
    Timing,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Self::Boot => "boot",
            Self::Cpu => "cpu",
            Self::Timing => "timing",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An unvalidated catalog declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub name: String,
    pub category: Category,
    pub rom: String,
    pub instructions: u64,
    pub expected: String,
}

impl CatalogEntry {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        rom: impl Into<String>,
        instructions: u64,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            rom: rom.into(),
            instructions,
            expected: expected.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default, rename = "case")]
    cases: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub category: Category,
    pub rom_path: PathBuf,
    pub instruction_budget: u64,
    pub expected_hash: String,
}

impl TestCase {
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestCatalog {
    cases: Vec<TestCase>,
}

impl TestCatalog {
    pub fn build(
        fixture_root: &Path,
        entries: impl IntoIterator<Item = CatalogEntry>,
    ) -> Result<Self, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut cases = Vec::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let case = validate_entry(fixture_root, index, entry)?;
            if !seen.insert(case.name.clone()) {
                return Err(ConfigurationError::DuplicateName { name: case.name });
            }
            cases.push(case);
        }

        log::debug!(
            "built catalog with {} cases from {}",
            cases.len(),
            fixture_root.display()
        );
        Ok(Self { cases })
    }

    pub fn builtin(fixture_root: &Path) -> Result<Self, ConfigurationError> {
        Self::build(fixture_root, builtin_entries())
    }

    pub fn from_manifest(path: &Path, fixture_root: &Path) -> Result<Self, ConfigurationError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            toml::from_str(&text).map_err(|source| ConfigurationError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        if manifest.cases.is_empty() {
            return Err(ConfigurationError::EmptyManifest(path.to_path_buf()));
        }
        Self::build(fixture_root, manifest.cases)
    }

    /// Keeps the cases selected by any of `selectors`, in catalog order. A selector matches a
    /// case name, a qualified `category/name`, or a whole category.
    pub fn filter(&self, selectors: &[String]) -> Result<Self, ConfigurationError> {
        if selectors.is_empty() {
            return Ok(self.clone());
        }

        if let Some(unmatched) = selectors
            .iter()
            .find(|selector| !self.cases.iter().any(|case| selects(selector, case)))
        {
            return Err(ConfigurationError::UnknownFilter(unmatched.clone()));
        }

        let cases = self
            .cases
            .iter()
            .filter(|case| selectors.iter().any(|selector| selects(selector, case)))
            .cloned()
            .collect();
        Ok(Self { cases })
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

fn selects(selector: &str, case: &TestCase) -> bool {
    selector == case.name || selector == case.category.label() || selector == case.qualified_name()
}

fn validate_entry(
    fixture_root: &Path,
    index: usize,
    entry: CatalogEntry,
) -> Result<TestCase, ConfigurationError> {
    let name = entry.name.trim().to_owned();
    if name.is_empty() {
        return Err(ConfigurationError::EmptyName { index });
    }
    if entry.rom.trim().is_empty() {
        return Err(ConfigurationError::EmptyRomPath { name });
    }
    if entry.instructions == 0 {
        return Err(ConfigurationError::ZeroBudget { name });
    }
    if entry.expected.is_empty() {
        return Err(ConfigurationError::EmptyHash { name });
    }
    if entry.expected.chars().any(char::is_whitespace) {
        return Err(ConfigurationError::InvalidHash {
            name,
            hash: entry.expected,
        });
    }

    let rom_path = fixture_root
        .join(entry.category.label())
        .join(entry.rom.trim());
    if !rom_path.is_file() {
        return Err(ConfigurationError::MissingRom {
            name,
            path: rom_path,
        });
    }

    Ok(TestCase {
        name,
        category: entry.category,
        rom_path,
        instruction_budget: entry.instructions,
        expected_hash: entry.expected,
    })
}

/// The reference ROM suite with its recorded golden hashes.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    use Category::{Boot, Cpu, Timing};

    vec![
        CatalogEntry::new(
            "blargg_timing_test",
            Timing,
            "timing_test.gb",
            300_000,
            "806d2b02697",
        ),
        CatalogEntry::new("div_write", Timing, "div_write.gb", 500_000, "7dce967813f"),
        CatalogEntry::new(
            "tima_increment_1",
            Timing,
            "tima_increment_1.gb",
            500_000,
            "7ad768a3131",
        ),
        CatalogEntry::new(
            "tima_div_trigger_1",
            Timing,
            "tima_div_trigger_1.gb",
            500_000,
            "7ad768a3131",
        ),
        CatalogEntry::new(
            "tima_increment_2",
            Timing,
            "tima_increment_2.gb",
            500_000,
            "6af2d613bc4",
        ),
        CatalogEntry::new(
            "tima_increment_3",
            Timing,
            "tima_increment_3.gb",
            500_000,
            "7ad768a3131",
        ),
        CatalogEntry::new(
            "tima_increment_4",
            Timing,
            "tima_increment_4.gb",
            500_000,
            "7ad768a3131",
        ),
        CatalogEntry::new(
            "tima_reload",
            Timing,
            "tima_reload.gb",
            500_000,
            "8d02c9a80ac",
        ),
        CatalogEntry::new(
            "tima_write_reload",
            Timing,
            "tima_write_reload.gb",
            500_000,
            "6f5f240884e",
        ),
        CatalogEntry::new(
            "tma_write_reload",
            Timing,
            "tma_write_reload.gb",
            500_000,
            "6750a7f4a48",
        ),
        CatalogEntry::new(
            "blargg_cpu_test",
            Cpu,
            "instructions_test.gb",
            25_000_000,
            "717209ded53",
        ),
        CatalogEntry::new("boot_hwio", Boot, "boot_hwio.gb", 1_000_000, "7dce967813f"),
        CatalogEntry::new("boot_regs", Boot, "boot_regs.gb", 1_000_000, "8b5d0c766cb"),
    ]
}
