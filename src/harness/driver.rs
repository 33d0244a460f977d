use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::harness::catalog::{Category, TestCase, TestCatalog};
use crate::harness::error::ConfigurationError;
use crate::harness::invoker::{EmulatorInvoker, InvokeError};
use crate::harness::oracle::{HashOracle, MalformedOutput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    HashMismatch { expected: String, observed: String },
    Timeout { limit: Duration },
    Crash { code: Option<i32>, detail: String },
    Malformed { reason: String },
}

impl Failure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HashMismatch { .. } => "mismatch",
            Self::Timeout { .. } => "timeout",
            Self::Crash { .. } => "crash",
            Self::Malformed { .. } => "malformed",
        }
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HashMismatch { expected, observed } => {
                write!(f, "expected {expected}, observed {observed}")
            }
            Self::Timeout { limit } => write!(f, "no exit within {}ms", limit.as_millis()),
            Self::Crash { code, detail } => {
                match code {
                    Some(code) => write!(f, "exit status {code}")?,
                    None => write!(f, "no exit status")?,
                }
                if !detail.is_empty() {
                    write!(f, ": {detail}")?;
                }
                Ok(())
            }
            Self::Malformed { reason } => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(Failure),
}

#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub category: Category,
    pub verdict: Verdict,
    pub observed: Option<String>,
    pub elapsed: Duration,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

impl Display for TestOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let millis = self.elapsed.as_millis();
        match &self.verdict {
            Verdict::Passed => write!(
                f,
                "PASS  {}  {}  ({millis}ms)",
                self.qualified_name(),
                self.observed.as_deref().unwrap_or_default()
            ),
            Verdict::Failed(failure) => write!(
                f,
                "FAIL  {}  {}: {failure}  ({millis}ms)",
                self.qualified_name(),
                failure.kind()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub mismatched: usize,
    pub timed_out: usize,
    pub crashed: usize,
    pub malformed: usize,
}

impl Summary {
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<TestOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(TestOutcome::passed)
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.outcomes.len(),
            ..Summary::default()
        };
        for outcome in &self.outcomes {
            match &outcome.verdict {
                Verdict::Passed => summary.passed += 1,
                Verdict::Failed(Failure::HashMismatch { .. }) => summary.mismatched += 1,
                Verdict::Failed(Failure::Timeout { .. }) => summary.timed_out += 1,
                Verdict::Failed(Failure::Crash { .. }) => summary.crashed += 1,
                Verdict::Failed(Failure::Malformed { .. }) => summary.malformed += 1,
            }
        }
        summary
    }

    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|outcome| outcome.name == name)
    }
}

impl Display for SuiteReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        let summary = self.summary();
        writeln!(
            f,
            "{} cases: {} passed, {} failed ({} mismatch, {} timeout, {} crash, {} malformed)",
            summary.total,
            summary.passed,
            summary.failed(),
            summary.mismatched,
            summary.timed_out,
            summary.crashed,
            summary.malformed
        )
    }
}

/// Runs every case of a catalog exactly once and collects the outcomes in catalog order.
pub struct SuiteDriver {
    invoker: EmulatorInvoker,
    jobs: usize,
}

impl SuiteDriver {
    pub fn new(invoker: EmulatorInvoker, jobs: usize) -> Result<Self, ConfigurationError> {
        if jobs == 0 {
            return Err(ConfigurationError::InvalidArgument("jobs must be > 0"));
        }
        Ok(Self { invoker, jobs })
    }

    pub async fn run(&self, catalog: &TestCatalog) -> SuiteReport {
        log::info!(
            "running {} cases against {} (jobs={}, timeout={}ms)",
            catalog.len(),
            self.invoker.binary().display(),
            self.jobs,
            self.invoker.timeout().as_millis()
        );

        let outcomes = if self.jobs == 1 {
            let mut outcomes = Vec::with_capacity(catalog.len());
            for case in catalog.cases() {
                outcomes.push(run_case(&self.invoker, case).await);
            }
            outcomes
        } else {
            self.run_parallel(catalog).await
        };

        SuiteReport { outcomes }
    }

    async fn run_parallel(&self, catalog: &TestCatalog) -> Vec<TestOutcome> {
        let permits = Arc::new(Semaphore::new(self.jobs));
        let mut tasks = JoinSet::new();

        for (index, case) in catalog.cases().iter().cloned().enumerate() {
            let permits = Arc::clone(&permits);
            let invoker = self.invoker.clone();
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                (index, run_case(&invoker, &case).await)
            });
        }

        let mut finished = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    finished.insert(index, outcome);
                }
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => log::error!("case task cancelled: {err}"),
            }
        }

        finished.into_values().collect()
    }
}

async fn run_case(invoker: &EmulatorInvoker, case: &TestCase) -> TestOutcome {
    log::debug!(
        "running {} ({} instructions)",
        case.qualified_name(),
        case.instruction_budget
    );

    let (verdict, observed, elapsed) = match invoker
        .invoke(&case.rom_path, case.instruction_budget)
        .await
    {
        Ok(result) => match HashOracle::check(&result.stdout, &case.expected_hash) {
            Ok(check) if check.matched => (Verdict::Passed, Some(check.observed), result.elapsed),
            Ok(check) => (
                Verdict::Failed(Failure::HashMismatch {
                    expected: case.expected_hash.clone(),
                    observed: check.observed.clone(),
                }),
                Some(check.observed),
                result.elapsed,
            ),
            Err(err) => (Verdict::Failed(malformed(err)), None, result.elapsed),
        },
        Err(err) => {
            let elapsed = err.elapsed();
            (Verdict::Failed(failure_from(err)), None, elapsed)
        }
    };

    let outcome = TestOutcome {
        name: case.name.clone(),
        category: case.category,
        verdict,
        observed,
        elapsed,
    };
    match &outcome.verdict {
        Verdict::Passed => log::info!("{outcome}"),
        Verdict::Failed(_) => log::warn!("{outcome}"),
    }
    outcome
}

fn malformed(err: MalformedOutput) -> Failure {
    Failure::Malformed {
        reason: err.to_string(),
    }
}

fn failure_from(err: InvokeError) -> Failure {
    match err {
        InvokeError::Timeout { limit, .. } => Failure::Timeout { limit },
        InvokeError::Crash { code, stderr, .. } => Failure::Crash {
            code,
            detail: stderr,
        },
        err @ (InvokeError::Launch { .. } | InvokeError::Io(_)) => Failure::Crash {
            code: None,
            detail: err.to_string(),
        },
    }
}
