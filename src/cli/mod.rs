//! CLI module: Clap argument parser, shared command context, prompts,
//! and the command implementations.

pub mod commands;
pub mod output;

use std::io::ErrorKind;
use std::path::PathBuf;

use clap::Parser;
use dialoguer::{Confirm, Password};
use zeroize::Zeroizing;

use crate::cache::CacheManager;
use crate::config::{self, ConfigStore, Settings, StoredCredential};
use crate::epic::EpicClient;
use crate::errors::{EimgError, Result};
use crate::vault::CredentialVault;

/// Minimum passphrase length for a newly stored key.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Environment variable that supplies the passphrase non-interactively.
pub const PASSPHRASE_ENV: &str = "EIMG_PASSPHRASE";

/// eimg: download Earth images from NASA's EPIC API.
#[derive(Parser)]
#[command(
    name = "eimg",
    about = "Download Earth images from NASA's EPIC API",
    version,
    after_help = "Get a free API key at https://api.nasa.gov/"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output directory for downloads
    #[arg(short, long, default_value = ".", global = true)]
    pub output: PathBuf,

    /// Output filename (default: earth_<timestamp>.png)
    #[arg(short, long, global = true)]
    pub filename: Option<String>,

    /// Don't save downloads to the cache
    #[arg(long, global = true)]
    pub no_cache: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store the NASA API key (encrypted): eimg set API=<key>
    Set {
        /// Assignment of the form API=<key>
        assignment: String,

        /// Store the key unencrypted (not recommended)
        #[arg(long)]
        insecure_plaintext: bool,
    },

    /// Check the stored API key against the API
    Validate,

    /// Download the latest Earth image
    Download,

    /// Download the Earth image for a date (YYYY-MM-DD)
    DownloadDate {
        /// Date in YYYY-MM-DD format
        date: String,
    },

    /// List dates with available imagery
    Dates,

    /// Show image metadata (latest, or for a date)
    Metadata {
        /// Date in YYYY-MM-DD format
        date: Option<String>,
    },

    /// Show configuration and security status
    Config,

    /// Securely delete the stored configuration
    Wipe {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show cache statistics
    CacheInfo,

    /// Clear the cache: all, images, metadata or thumbnails
    CacheClear {
        #[arg(default_value = "all")]
        kind: String,
    },

    /// Show log files
    LogsInfo,

    /// Clear all log files
    LogsClear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Open the cache directory in the file manager
    OpenCache,

    /// Open the logs directory in the file manager
    OpenLogs,

    /// Open the config directory in the file manager
    OpenConfig,

    /// Run self-diagnostics
    Test,

    /// Show version and build features
    Version,
}

// ---------------------------------------------------------------------------
// Shared state for one invocation
// ---------------------------------------------------------------------------

/// Everything a command needs, built once in `main`.
pub struct Context {
    pub home: PathBuf,
    pub settings: Settings,
    pub store: ConfigStore,
    pub vault: CredentialVault,
}

impl Context {
    pub fn load() -> Result<Self> {
        let home = config::home_dir()?;
        let settings = Settings::load(&home)?;
        Ok(Self::with_settings(home, settings))
    }

    pub fn with_settings(home: PathBuf, settings: Settings) -> Self {
        let vault = CredentialVault::new(settings.encryption_scheme, settings.argon2_params());
        Self {
            store: ConfigStore::new(&home),
            home,
            settings,
            vault,
        }
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.settings.cache_dir(&self.home)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.settings.logs_dir(&self.home)
    }

    pub fn cache(&self) -> Result<CacheManager> {
        CacheManager::new(&self.cache_dir())
    }

    /// Load and decrypt the stored API key.
    ///
    /// The passphrase is asked at most once per invocation.
    pub fn api_key(&mut self) -> Result<Zeroizing<String>> {
        let record = match self.store.load()?.credential()? {
            StoredCredential::Encrypted(record) => record,
            StoredCredential::Plaintext(key) => {
                output::warning("API key is stored unencrypted. Re-run `eimg set API=<key>` to encrypt it.");
                return Ok(key);
            }
            StoredCredential::Missing => return Err(EimgError::NoCredential),
        };

        let passphrase = match self.vault.session_passphrase() {
            Some(p) => Zeroizing::new(p.to_string()),
            None => prompt_passphrase()?,
        };

        let key = self.vault.decrypt(&record, &passphrase)?;
        self.vault.remember_passphrase(passphrase);
        Ok(key)
    }

    /// An EPIC client authenticated with the stored key.
    pub fn client(&mut self) -> Result<EpicClient> {
        let key = self.api_key()?;
        Ok(EpicClient::new(&self.settings, key))
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Get the passphrase that unlocks the stored key.
///
/// `EIMG_PASSPHRASE` wins over the interactive prompt.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env() {
        return Ok(pw);
    }

    let pw = Password::new()
        .with_prompt("Master password")
        .interact()
        .map_err(|e| prompt_error(e, "password"))?;
    Ok(Zeroizing::new(pw))
}

/// Ask for a new passphrase twice.
///
/// `EIMG_PASSPHRASE` is accepted too, subject to the same length rule.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env() {
        check_new_passphrase(&pw, &pw)?;
        return Ok(pw);
    }

    output::info("Set a master password for API key encryption.");
    let first = Zeroizing::new(
        Password::new()
            .with_prompt("Enter master password")
            .interact()
            .map_err(|e| prompt_error(e, "password"))?,
    );
    let second = Zeroizing::new(
        Password::new()
            .with_prompt("Confirm master password")
            .interact()
            .map_err(|e| prompt_error(e, "password"))?,
    );

    check_new_passphrase(&first, &second)?;
    Ok(first)
}

/// Reject a mismatched confirmation or a passphrase under 8 characters.
pub fn check_new_passphrase(first: &str, second: &str) -> Result<()> {
    if first != second {
        return Err(EimgError::PasswordMismatch);
    }
    if first.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(EimgError::InvalidInput(format!(
            "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
        )));
    }
    Ok(())
}

fn passphrase_from_env() -> Option<Zeroizing<String>> {
    std::env::var(PASSPHRASE_ENV)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

/// Yes/no confirmation defaulting to no. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| prompt_error(e, "confirm"))
}

/// Ctrl-C at a prompt surfaces as an interrupted read.
fn prompt_error(err: dialoguer::Error, what: &str) -> EimgError {
    match err {
        dialoguer::Error::IO(io) if io.kind() == ErrorKind::Interrupted => EimgError::UserCancelled,
        other => EimgError::CommandFailed(format!("{what} prompt: {other}")),
    }
}

/// Split `API=<key>` into the key. The name is case-insensitive.
pub fn parse_assignment(assignment: &str) -> Result<&str> {
    match assignment.split_once('=') {
        Some((name, value)) if name.trim().eq_ignore_ascii_case("api") => Ok(value.trim()),
        _ => Err(EimgError::InvalidInput(
            "use `eimg set API=<your_key>`".into(),
        )),
    }
}
