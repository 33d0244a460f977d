use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use gb_rom_harness::{
    ConfigurationError, HarnessConfig, SuiteReport, TestCatalog, DEFAULT_EMULATOR,
    DEFAULT_FIXTURE_ROOT, DEFAULT_TIMEOUT_SECS,
};

const EXIT_FAILED: u8 = 1;
const EXIT_CONFIGURATION: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "gb-rom-harness")]
#[command(about = "Run the ROM conformance suite against an emulator binary")]
struct Args {
    /// Only run cases matching these names, `category/name` pairs, or categories.
    filters: Vec<String>,

    #[arg(long, env = "GB_HARNESS_EMULATOR", default_value = DEFAULT_EMULATOR)]
    emulator: PathBuf,

    #[arg(long, env = "GB_HARNESS_FIXTURES", default_value = DEFAULT_FIXTURE_ROOT)]
    fixtures: PathBuf,

    /// TOML manifest to use instead of the built-in catalog.
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, env = "GB_HARNESS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Print the selected cases and exit without running them.
    #[arg(long)]
    list: bool,
}

impl Args {
    fn into_config(self) -> HarnessConfig {
        HarnessConfig {
            emulator: self.emulator,
            fixture_root: self.fixtures,
            manifest: self.catalog,
            timeout: Duration::from_secs(self.timeout_secs),
            jobs: self.jobs,
            filters: self.filters,
        }
    }
}

enum Run {
    Listed(TestCatalog),
    Finished(SuiteReport),
}

async fn run(args: Args) -> Result<Run, ConfigurationError> {
    let list = args.list;
    let config = args.into_config();

    if list {
        return Ok(Run::Listed(config.load_catalog()?));
    }

    config.validate()?;
    let catalog = config.load_catalog()?;
    let driver = config.driver()?;
    Ok(Run::Finished(driver.run(&catalog).await))
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Args::parse()).await {
        Ok(Run::Listed(catalog)) => {
            for case in catalog.cases() {
                println!(
                    "{}  {}  {}  {}",
                    case.qualified_name(),
                    case.rom_path.display(),
                    case.instruction_budget,
                    case.expected_hash
                );
            }
            ExitCode::SUCCESS
        }
        Ok(Run::Finished(report)) => {
            print!("{report}");
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_FAILED)
            }
        }
        Err(error) => {
            eprintln!("configuration error: {error}");
            ExitCode::from(EXIT_CONFIGURATION)
        }
    }
}
