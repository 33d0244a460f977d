use std::path::PathBuf;
use std::time::Duration;

use crate::harness::catalog::TestCatalog;
use crate::harness::driver::SuiteDriver;
use crate::harness::error::ConfigurationError;
use crate::harness::invoker::EmulatorInvoker;

pub const DEFAULT_EMULATOR: &str = "build/bin/tests/IntegrationTest";
pub const DEFAULT_FIXTURE_ROOT: &str = "test/integration/test_roms";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub emulator: PathBuf,
    pub fixture_root: PathBuf,
    /// TOML manifest replacing the built-in catalog.
    pub manifest: Option<PathBuf>,
    pub timeout: Duration,
    pub jobs: usize,
    pub filters: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            emulator: PathBuf::from(DEFAULT_EMULATOR),
            fixture_root: PathBuf::from(DEFAULT_FIXTURE_ROOT),
            manifest: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            jobs: 1,
            filters: Vec::new(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.timeout.is_zero() {
            return Err(ConfigurationError::InvalidArgument("timeout must be > 0"));
        }
        if self.jobs == 0 {
            return Err(ConfigurationError::InvalidArgument("jobs must be > 0"));
        }
        if !self.fixture_root.is_dir() {
            return Err(ConfigurationError::MissingFixtureRoot(
                self.fixture_root.clone(),
            ));
        }
        if !self.emulator.is_file() {
            return Err(ConfigurationError::MissingEmulator(self.emulator.clone()));
        }
        Ok(())
    }

    pub fn load_catalog(&self) -> Result<TestCatalog, ConfigurationError> {
        let catalog = match &self.manifest {
            Some(path) => TestCatalog::from_manifest(path, &self.fixture_root)?,
            None => TestCatalog::builtin(&self.fixture_root)?,
        };
        catalog.filter(&self.filters)
    }

    pub fn driver(&self) -> Result<SuiteDriver, ConfigurationError> {
        let invoker = EmulatorInvoker::new(&self.emulator, self.timeout);
        SuiteDriver::new(invoker, self.jobs)
    }
}
