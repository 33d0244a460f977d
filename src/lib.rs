pub mod harness;

pub use harness::catalog::{builtin_entries, CatalogEntry, Category, TestCase, TestCatalog};
pub use harness::config::{
    HarnessConfig, DEFAULT_EMULATOR, DEFAULT_FIXTURE_ROOT, DEFAULT_TIMEOUT_SECS,
};
pub use harness::driver::{Failure, SuiteDriver, SuiteReport, Summary, TestOutcome, Verdict};
pub use harness::error::ConfigurationError;
pub use harness::invoker::{EmulatorInvoker, InvocationResult, InvokeError};
pub use harness::oracle::{HashOracle, HashVerdict, MalformedOutput};
