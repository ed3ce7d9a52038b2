//! Configuration file lookup for the CLI.
//!
//! Settings usually belong to a diagram collection rather than to a user, so
//! a `plantbatch.toml` beside the input file wins over the per-user file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::debug;
use thiserror::Error;

use plantbatch::{PlantbatchError, config::AppConfig};

/// File name looked up beside the input file.
const PROJECT_FILE: &str = "plantbatch.toml";

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Cannot read configuration file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for PlantbatchError {
    fn from(err: ConfigError) -> Self {
        PlantbatchError::Config(err.to_string())
    }
}

/// Load the configuration for a run over `input`.
///
/// An explicit path must exist. Otherwise the first existing file among
/// [`candidates`] is used, and built-in defaults when there is none.
///
/// # Errors
///
/// Returns [`PlantbatchError::Config`] if the explicit file is missing, or if
/// the selected file cannot be read or parsed.
pub fn load_config(
    explicit_path: Option<impl AsRef<Path>>,
    input: &Path,
) -> Result<AppConfig, PlantbatchError> {
    let found = match explicit_path {
        Some(path) => Some(path.as_ref().to_path_buf()),
        None => candidates(input).into_iter().find(|path| path.is_file()),
    };

    match found {
        Some(path) => {
            debug!(path = path.display().to_string(); "Reading configuration");
            load_config_file(&path)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Files that may hold settings for `input`, most specific first:
/// `plantbatch.toml` in the input's directory, then `config.toml` in the
/// per-user configuration directory.
fn candidates(input: &Path) -> Vec<PathBuf> {
    let project_dir = match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut paths = vec![project_dir.join(PROJECT_FILE)];
    paths.extend(
        ProjectDirs::from("com", "plantbatch", "plantbatch")
            .map(|dirs| dirs.config_dir().join("config.toml")),
    );
    paths
}

fn load_config_file(path: &Path) -> Result<AppConfig, PlantbatchError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = toml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(config)
}
