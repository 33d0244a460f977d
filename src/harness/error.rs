use std::path::PathBuf;

use thiserror::Error;

/// A problem with the harness setup itself. Detected before any emulator process is spawned and
/// always fatal for the whole run.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("catalog entry #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("duplicate test case name '{name}'")]
    DuplicateName { name: String },
    #[error("test case '{name}' has an empty ROM path")]
    EmptyRomPath { name: String },
    #[error("test case '{name}' has a zero instruction budget")]
    ZeroBudget { name: String },
    #[error("test case '{name}' has an empty expected hash")]
    EmptyHash { name: String },
    #[error("test case '{name}' has an expected hash containing whitespace: {hash:?}")]
    InvalidHash { name: String, hash: String },
    #[error("test case '{name}' references a missing ROM: {}", path.display())]
    MissingRom { name: String, path: PathBuf },
    #[error("filter '{0}' does not match any test case")]
    UnknownFilter(String),
    #[error("failed to read catalog manifest {}: {source}", path.display())]
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid catalog manifest {}: {source}", path.display())]
    ManifestParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("catalog manifest {} declares no [[case]] entries", .0.display())]
    EmptyManifest(PathBuf),
    #[error("emulator binary not found: {}", .0.display())]
    MissingEmulator(PathBuf),
    #[error("fixture root is not a directory: {}", .0.display())]
    MissingFixtureRoot(PathBuf),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}
