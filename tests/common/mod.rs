#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use gb_rom_harness::{builtin_entries, CatalogEntry, Category};
use tempfile::TempDir;

/// A fixture root whose ROM "images" contain the hash a correct emulator would print for them.
pub struct Fixtures {
    pub dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn with_entries(entries: &[CatalogEntry]) -> Self {
        let fixtures = Self::new();
        for entry in entries {
            fixtures.add_rom(entry.category, &entry.rom, &entry.expected);
        }
        fixtures
    }

    pub fn builtin() -> Self {
        Self::with_entries(&builtin_entries())
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_rom(&self, category: Category, rom: &str, contents: &str) -> PathBuf {
        let dir = self.root().join(category.label());
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(rom);
        fs::write(&path, format!("{contents}\n")).unwrap();
        path
    }

    /// Writes an executable shell script next to the fixtures and returns its path.
    #[cfg(unix)]
    pub fn emulator(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.root().join("bin");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Prints the ROM contents, which the fixtures set to the golden hash.
    #[cfg(unix)]
    pub fn correct_emulator(&self) -> PathBuf {
        self.emulator("correct-emulator", "cat \"$1\"")
    }
}

pub fn timing_test_entry() -> CatalogEntry {
    CatalogEntry::new(
        "blargg_timing_test",
        Category::Timing,
        "timing_test.gb",
        300_000,
        "806d2b02697",
    )
}

pub fn boot_regs_entry() -> CatalogEntry {
    CatalogEntry::new(
        "boot_regs",
        Category::Boot,
        "boot_regs.gb",
        1_000_000,
        "8b5d0c766cb",
    )
}
