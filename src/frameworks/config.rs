use serde::Deserialize;
use std::{env, fmt, fs, path::PathBuf, time::Duration};
use url::Url;

use crate::interface_adapters::clients::sheets::DEFAULT_SHEETS_API_URL;
use crate::use_cases::directory::DEFAULT_RANGE;

// Runtime settings. Environment variables win over the optional TOML file
// named by INVITATION_CONFIG; both fall back to the defaults below.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SITE_ROOT: &str = "https://icc-sedd.github.io/MaraAndSedd/";
pub const DEFAULT_SHEETS_TIMEOUT: Duration = Duration::from_millis(5000);

// Value shipped in the sample .env; never a real key.
const API_KEY_PLACEHOLDER: &str = "your_google_api_key_here";

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    // Canonical published address; also where failed lookups redirect.
    pub site_root: Url,
    pub sheets: SheetsSettings,
}

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub spreadsheet_id: Option<String>,
    pub api_key: Option<String>,
    pub oauth_token: Option<String>,
    pub range: String,
    pub has_header_row: bool,
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub site_root_url: Option<String>,
    pub sheets: SheetsFileConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetsFileConfig {
    pub spreadsheet_id: Option<String>,
    pub api_key: Option<String>,
    pub oauth_token: Option<String>,
    pub range: Option<String>,
    pub has_header_row: Option<bool>,
    pub api_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "invalid {key} {value:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Settings {
    /// Reads the process environment and the optional config file.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("INVITATION_CONFIG") {
            Ok(path) => read_file(PathBuf::from(path))?,
            Err(_) => FileConfig::default(),
        };
        Self::from_sources(|key| env::var(key).ok(), file)
    }

    pub fn from_sources(
        env: impl Fn(&str) -> Option<String>,
        file: FileConfig,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let port = match var("INVITATION_PORT") {
            Some(raw) => parse_number("INVITATION_PORT", &raw)?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        };

        let site_root_raw = var("SITE_ROOT_URL")
            .or(file.site_root_url)
            .unwrap_or_else(|| DEFAULT_SITE_ROOT.to_string());
        let site_root = Url::parse(&site_root_raw).map_err(|err| ConfigError::Invalid {
            key: "SITE_ROOT_URL",
            value: site_root_raw.clone(),
            reason: err.to_string(),
        })?;

        let sheets = file.sheets;
        let has_header_row = match var("SHEET_HAS_HEADER") {
            Some(raw) => parse_bool("SHEET_HAS_HEADER", &raw)?,
            None => sheets.has_header_row.unwrap_or(true),
        };
        let timeout = match var("SHEETS_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number("SHEETS_TIMEOUT_MS", &raw)?),
            None => sheets
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_SHEETS_TIMEOUT),
        };

        Ok(Self {
            port,
            site_root,
            sheets: SheetsSettings {
                spreadsheet_id: var("GOOGLE_SHEET_ID").or(sheets.spreadsheet_id),
                api_key: var("GOOGLE_API_KEY")
                    .or(sheets.api_key)
                    .filter(|key| key != API_KEY_PLACEHOLDER),
                oauth_token: var("GOOGLE_OAUTH_TOKEN").or(sheets.oauth_token),
                range: var("GOOGLE_SHEET_RANGE")
                    .or(sheets.range)
                    .unwrap_or_else(|| DEFAULT_RANGE.to_string()),
                has_header_row,
                api_url: var("SHEETS_API_URL")
                    .or(sheets.api_url)
                    .unwrap_or_else(|| DEFAULT_SHEETS_API_URL.to_string()),
                timeout,
            },
        })
    }
}

fn read_file(path: PathBuf) -> Result<FileConfig, ConfigError> {
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
