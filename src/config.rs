use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use env_logger::{Env, Target};

use crate::geocode::{
    NominatimGeocoder, OfflineGeocoder, ReverseGeocoder, DEFAULT_NOMINATIM_URL,
};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".favorite-places";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "FavoritePlaces.db";
/// Log file written next to the database while the TUI owns the terminal.
const LOG_FILE_NAME: &str = "favorite-places.log";

/// Which reverse geocoder to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocoderConfig {
    Offline,
    Nominatim { base_url: String },
}

impl GeocoderConfig {
    pub fn build(&self) -> Result<Box<dyn ReverseGeocoder>> {
        match self {
            GeocoderConfig::Offline => Ok(Box::new(OfflineGeocoder)),
            GeocoderConfig::Nominatim { base_url } => {
                Ok(Box::new(NominatimGeocoder::new(base_url.clone())?))
            }
        }
    }
}

/// Runtime settings resolved from flags, environment and platform defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub geocoder: GeocoderConfig,
}

impl Config {
    /// Combine explicit overrides with the defaults. `db_path` and
    /// `nominatim_url` already carry any environment override applied by clap.
    pub fn resolve(
        db_path: Option<PathBuf>,
        offline: bool,
        nominatim_url: Option<String>,
    ) -> Result<Self> {
        let db_path = match db_path {
            Some(path) => path,
            None => default_db_path()?,
        };

        let geocoder = if offline {
            GeocoderConfig::Offline
        } else {
            GeocoderConfig::Nominatim {
                base_url: nominatim_url.unwrap_or_else(|| DEFAULT_NOMINATIM_URL.to_string()),
            }
        };

        Ok(Self { db_path, geocoder })
    }

    /// Log file path: beside the database, or the working directory when the
    /// database path has no parent.
    pub fn log_path(&self) -> PathBuf {
        match self.db_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(LOG_FILE_NAME),
            _ => PathBuf::from(LOG_FILE_NAME),
        }
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

/// Send log output to stderr. Level comes from `RUST_LOG`, default `info`.
pub fn init_stderr_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .try_init();
}

/// Send log output to a file so it does not paint over the alternate screen.
pub fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_and_offline() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/x/places.db")), true, None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x/places.db"));
        assert_eq!(config.geocoder, GeocoderConfig::Offline);
        assert_eq!(config.log_path(), PathBuf::from("/tmp/x/favorite-places.log"));
    }

    #[test]
    fn nominatim_defaults_to_public_instance() {
        let config = Config::resolve(Some(PathBuf::from("p.db")), false, None).unwrap();
        assert_eq!(
            config.geocoder,
            GeocoderConfig::Nominatim {
                base_url: DEFAULT_NOMINATIM_URL.to_string()
            }
        );
        assert_eq!(config.log_path(), PathBuf::from(LOG_FILE_NAME));
    }

    #[test]
    fn nominatim_url_override() {
        let config = Config::resolve(
            Some(PathBuf::from("p.db")),
            false,
            Some("http://localhost:7070".into()),
        )
        .unwrap();
        assert_eq!(
            config.geocoder,
            GeocoderConfig::Nominatim {
                base_url: "http://localhost:7070".into()
            }
        );
    }
}
