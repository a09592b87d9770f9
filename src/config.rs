//! Configuration management for spotetl.
//!
//! Configuration is resolved once at startup into an immutable [`Settings`]
//! value that is handed to the pipeline. Every key is looked up in two layers:
//!
//! 1. The variable store, a flat TOML file of scalar values
//!    (`<data dir>/spotetl/variables.toml` unless overridden)
//! 2. The process environment, including anything loaded from `.env` files
//!
//! The environment is only consulted when a key is absent from the store. A
//! key that is present in the store with an empty value stays empty.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::{
    error::EtlError,
    types::ClientCredentials,
};

pub const APP_DIR: &str = "spotetl";
pub const VARIABLES_FILE: &str = "variables.toml";

pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1/";
pub const DEFAULT_ARTIST_NAME: &str = "Ed Sheeran";
pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_RECENT_LIMIT: i64 = 50;
pub const DEFAULT_DATABASE_LOCATION: &str = "sqlite:///my_played_tracks.sqlite";
pub const DEFAULT_TOP_TRACKS_FILE: &str = "songs.csv";
pub const DEFAULT_RECENT_FILE: &str = "recently_played_tracks.csv";
pub const HTTP_TIMEOUT_SECS: u64 = 30;

const CLIENT_CREDENTIALS_HINT: &str =
    "Get your credentials from: https://developer.spotify.com/dashboard/applications";
const USER_TOKEN_HINT: &str =
    "Get your token from: https://developer.spotify.com/console/get-recently-played/";

/// Returns the platform data directory used by spotetl.
///
/// - Linux: `~/.local/share/spotetl`
/// - macOS: `~/Library/Application Support/spotetl`
/// - Windows: `%LOCALAPPDATA%/spotetl`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

pub fn default_variables_path() -> PathBuf {
    data_dir().join(VARIABLES_FILE)
}

/// Loads environment variables from `.env` files.
///
/// The file in the local data directory is read first, then a `.env` in the
/// working directory. Variables that are already set are never overwritten,
/// and missing files are not an error.
///
/// # Errors
///
/// Returns an error string if the data directory cannot be created.
pub fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }

    dotenv::from_path(&path).ok();
    dotenv::dotenv().ok();
    Ok(())
}

/// Flat key/value store backing the first configuration layer.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a TOML document of top-level scalars.
    ///
    /// Strings are kept as-is, numbers, booleans and datetimes are stored in
    /// their TOML text form. Arrays and tables are rejected.
    pub fn from_toml_str(content: &str) -> Result<Self, EtlError> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| EtlError::Config(format!("invalid variable store: {e}")))?;

        let mut values = BTreeMap::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(d) => d.to_string(),
                toml::Value::Array(_) | toml::Value::Table(_) => {
                    return Err(EtlError::Config(format!(
                        "variable {key} must be a scalar value"
                    )));
                }
            };
            values.insert(key, text);
        }

        Ok(Self { values })
    }

    /// Reads the store from disk. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no variable store found");
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

/// Immutable run configuration, resolved once from all layers.
#[derive(Clone)]
pub struct Settings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub user_token: Option<String>,
    pub artist_name: String,
    pub output_bucket: Option<String>,
    pub output_path: Option<String>,
    pub market: String,
    pub recent_limit: i64,
    pub display_results: bool,
    pub database_location: String,
    pub token_url: Url,
    pub api_base: Url,
    pub http_timeout: Duration,
}

impl Settings {
    /// Resolves every configuration key from the store, falling back to `env`
    /// for keys the store does not contain.
    ///
    /// `env` is usually `|k| std::env::var(k).ok()`; tests pass a map lookup
    /// instead of touching the process environment.
    pub fn from_layers<E>(store: &VariableStore, env: E) -> Result<Self, EtlError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| -> Option<String> {
            match store.get(key) {
                Some(value) => Some(value.to_string()),
                None => env(key),
            }
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let recent_limit = match non_empty("SPOTIFY_RECENT_LIMIT") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                EtlError::Config(format!("SPOTIFY_RECENT_LIMIT is not an integer: {raw}"))
            })?,
            None => DEFAULT_RECENT_LIMIT,
        };

        let display_results = non_empty("SPOTIFY_DISPLAY_RESULTS")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        let token_url = parse_url(
            "SPOTIFY_TOKEN_URL",
            &non_empty("SPOTIFY_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        )?;
        let mut api_base = parse_url(
            "SPOTIFY_API_BASE",
            &non_empty("SPOTIFY_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        )?;

        // relative joins drop the last segment without a trailing slash
        if !api_base.path().ends_with('/') {
            let mut path = api_base.path().to_string();
            path.push('/');
            api_base.set_path(&path);
        }

        Ok(Self {
            client_id: lookup("SPOTIFY_CLIENT_ID"),
            client_secret: lookup("SPOTIFY_CLIENT_SECRET"),
            user_token: lookup("SPOTIFY_USER_TOKEN"),
            artist_name: non_empty("SPOTIFY_ARTIST_NAME")
                .unwrap_or_else(|| DEFAULT_ARTIST_NAME.to_string()),
            output_bucket: non_empty("SPOTIFY_OUTPUT_BUCKET"),
            output_path: non_empty("SPOTIFY_OUTPUT_PATH"),
            market: non_empty("SPOTIFY_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            recent_limit,
            display_results,
            database_location: non_empty("DATABASE_LOCATION")
                .unwrap_or_else(|| DEFAULT_DATABASE_LOCATION.to_string()),
            token_url,
            api_base,
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        })
    }

    /// Loads the variable store (explicit path, `SPOTETL_VARIABLES`, or the
    /// default location) and layers the process environment under it.
    pub fn load(variables_path: Option<&Path>) -> Result<Self, EtlError> {
        let path = match variables_path {
            Some(p) => p.to_path_buf(),
            None => std::env::var("SPOTETL_VARIABLES")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_variables_path()),
        };

        let store = VariableStore::load(&path)?;
        Self::from_layers(&store, |key| std::env::var(key).ok())
    }

    /// CSV destination: `<bucket>/<path>`, where the path defaults to
    /// `default_file` and the bucket is an optional local directory prefix.
    pub fn csv_location(&self, default_file: &str) -> PathBuf {
        let file = self
            .output_path
            .clone()
            .unwrap_or_else(|| default_file.to_string());
        match &self.output_bucket {
            Some(bucket) => PathBuf::from(bucket).join(file),
            None => PathBuf::from(file),
        }
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, EtlError> {
    Url::parse(raw).map_err(|e| EtlError::Config(format!("{key} invalid: {e}")))
}

/// A blank value counts as missing; anything else is passed on untouched.
fn required(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

/// Resolves the client-id/secret pair used for the client-credentials grant.
///
/// Both values are required; the error names whichever keys are missing.
pub fn resolve_client_credentials(settings: &Settings) -> Result<ClientCredentials, EtlError> {
    let client_id = required(&settings.client_id);
    let client_secret = required(&settings.client_secret);

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
            client_id,
            client_secret,
        }),
        (id, secret) => {
            let mut missing = Vec::new();
            if id.is_none() {
                missing.push("SPOTIFY_CLIENT_ID");
            }
            if secret.is_none() {
                missing.push("SPOTIFY_CLIENT_SECRET");
            }
            Err(EtlError::MissingCredentials {
                missing: missing.join(", "),
                hint: CLIENT_CREDENTIALS_HINT,
            })
        }
    }
}

/// Resolves the pre-provisioned user token required by history endpoints.
pub fn resolve_user_token(settings: &Settings) -> Result<String, EtlError> {
    required(&settings.user_token).ok_or(EtlError::MissingCredentials {
        missing: "SPOTIFY_USER_TOKEN".to_string(),
        hint: USER_TOKEN_HINT,
    })
}
