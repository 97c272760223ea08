//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! command-line flags.

use crate::executor::strategy::{AtomicCopy, StreamCopy};
use crate::types::{check_copy_limit, CloneError, CloneRequest, DEFAULT_MAX_CONCURRENT_COPIES};
use clap::{ArgAction, Parser};
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "treeclone", version, about = "Clone a file or directory tree into a destination root")]
pub struct Cli {
    /// File or directory to clone
    pub source: PathBuf,

    /// Existing directory that receives the clone
    pub destination_root: PathBuf,

    /// Name of the new entry (defaults to the source's final path segment)
    #[arg(short, long)]
    pub name: Option<OsString>,

    /// Write each file to a temporary `.part` file and rename it into place
    #[arg(long)]
    pub atomic: bool,

    /// Stop a directory level on its first failure instead of letting siblings finish
    #[arg(long)]
    pub fail_fast: bool,

    /// Maximum number of files copied at the same time
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Number of runtime worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// TOML file with default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Defaults loaded from a TOML file
///
/// ```toml
/// atomic = true
/// fail_fast = false
/// max_concurrent_copies = 32
/// worker_threads = 4
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileDefaults {
    pub atomic: Option<bool>,
    pub fail_fast: Option<bool>,
    pub max_concurrent_copies: Option<usize>,
    pub worker_threads: Option<usize>,
}

impl FileDefaults {
    pub fn load(path: &Path) -> Result<Self, CloneError> {
        let content = fs::read_to_string(path).map_err(|e| CloneError::io(path, e))?;
        Self::parse(&content).map_err(|e| {
            CloneError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Global configuration for a clone run
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file or directory
    pub source: PathBuf,

    /// Destination root (must exist)
    pub destination_root: PathBuf,

    /// Entry name override
    pub entry_name: Option<OsString>,

    /// Use write-then-rename per file
    pub atomic: bool,

    /// Cancel remaining siblings on first failure
    pub fail_fast: bool,

    /// Concurrent leaf copies
    pub max_concurrent_copies: usize,

    /// Runtime worker threads
    pub worker_threads: usize,

    /// 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination_root: PathBuf::new(),
            entry_name: None,
            atomic: false,
            fail_fast: false,
            max_concurrent_copies: DEFAULT_MAX_CONCURRENT_COPIES,
            worker_threads: 4,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), CloneError> {
        check_copy_limit(self.max_concurrent_copies)?;
        if self.worker_threads == 0 {
            return Err(CloneError::Config(
                "Worker threads must be at least 1".to_string(),
            ));
        }
        if !self.source.exists() {
            return Err(CloneError::Config(format!(
                "Source path does not exist: {}",
                self.source.display()
            )));
        }
        if !self.destination_root.is_dir() {
            return Err(CloneError::Config(format!(
                "Destination root is not an existing directory: {}",
                self.destination_root.display()
            )));
        }
        Ok(())
    }

    /// Overwrite fields set in the defaults file
    pub fn merge_defaults(mut self, defaults: &FileDefaults) -> Self {
        if let Some(atomic) = defaults.atomic {
            self.atomic = atomic;
        }
        if let Some(fail_fast) = defaults.fail_fast {
            self.fail_fast = fail_fast;
        }
        if let Some(limit) = defaults.max_concurrent_copies {
            self.max_concurrent_copies = limit;
        }
        if let Some(threads) = defaults.worker_threads {
            self.worker_threads = threads;
        }
        self
    }

    /// Build the library request this configuration describes
    pub fn to_request(&self) -> CloneRequest {
        let mut request = CloneRequest::new(&self.source, &self.destination_root)
            .fail_fast(self.fail_fast)
            .max_concurrent_copies(self.max_concurrent_copies);
        if let Some(name) = &self.entry_name {
            request = request.entry_name(name.clone());
        }
        if self.atomic {
            request.strategy(AtomicCopy)
        } else {
            request.strategy(StreamCopy)
        }
    }
}

impl TryFrom<Cli> for Config {
    type Error = CloneError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let defaults = match &cli.config {
            Some(path) => FileDefaults::load(path)?,
            None => FileDefaults::default(),
        };

        let mut config = Config {
            source: cli.source,
            destination_root: cli.destination_root,
            entry_name: cli.name,
            verbosity: cli.verbose,
            ..Config::default()
        }
        .merge_defaults(&defaults);

        // Flags given on the command line win over the file
        if cli.atomic {
            config.atomic = true;
        }
        if cli.fail_fast {
            config.fail_fast = true;
        }
        if let Some(jobs) = cli.jobs {
            config.max_concurrent_copies = jobs;
        }
        if let Some(threads) = cli.threads {
            config.worker_threads = threads;
        }

        config.validate()?;
        Ok(config)
    }
}
