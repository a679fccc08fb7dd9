use crate::adapters::{openai, sheets, telegram};
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_range, validate_secret, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub openai: OpenAiConfig,
    pub sheet: SheetConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub url: Option<String>,
    /// Service-account key as a JSON string; without it the public CSV export is used.
    pub credentials_json: Option<String>,
    pub range: String,
    pub refresh_minutes: Option<u64>,
    pub sheets_api_base: String,
    pub docs_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: telegram::DEFAULT_API_BASE.to_string(),
            poll_timeout_secs: 30,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: openai::DEFAULT_API_BASE.to_string(),
            model: openai::DEFAULT_MODEL.to_string(),
            timeout_secs: 20,
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            url: None,
            credentials_json: None,
            range: sheets::DEFAULT_RANGE.to_string(),
            refresh_minutes: None,
            sheets_api_base: sheets::DEFAULT_SHEETS_API_BASE.to_string(),
            docs_base: sheets::DEFAULT_DOCS_BASE.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Loads the optional TOML file, then lets the deployment environment
    /// variables override it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_lookup(&|name: &str| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        config.apply_lookup(&lookup)?;
        Ok(config)
    }

    fn apply_lookup(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = non_empty(lookup("TELEGRAM_BOT_TOKEN")) {
            self.telegram.token = Some(token);
        }
        if let Some(key) = non_empty(lookup("OPENAI_API_KEY")) {
            self.openai.api_key = Some(key);
        }
        if let Some(creds) = non_empty(lookup("GOOGLE_CREDENTIALS_JSON")) {
            self.sheet.credentials_json = Some(creds);
        }
        if let Some(url) = non_empty(lookup("GOOGLE_SHEET_URL")) {
            self.sheet.url = Some(url);
        }
        if let Some(port) = non_empty(lookup("PORT")) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| BotError::InvalidConfigValueError {
                    field: "PORT".to_string(),
                    value: port.clone(),
                    reason: "must be a TCP port number".to_string(),
                })?;
        }
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| BotError::InvalidConfigValueError {
            field: "config".to_string(),
            value: "<toml>".to_string(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` from the environment; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn sheet_url(&self) -> Result<&str> {
        self.sheet
            .url
            .as_deref()
            .ok_or_else(|| BotError::MissingConfigError {
                field: "GOOGLE_SHEET_URL".to_string(),
            })
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_secret("TELEGRAM_BOT_TOKEN", &self.telegram.token)?;
        validate_secret("OPENAI_API_KEY", &self.openai.api_key)?;
        validate_url("GOOGLE_SHEET_URL", self.sheet_url()?)?;

        validate_url("telegram.api_base", &self.telegram.api_base)?;
        validate_url("openai.api_base", &self.openai.api_base)?;
        validate_url("sheet.sheets_api_base", &self.sheet.sheets_api_base)?;
        validate_url("sheet.docs_base", &self.sheet.docs_base)?;

        validate_range("telegram.poll_timeout_secs", self.telegram.poll_timeout_secs, 0, 50)?;
        validate_range("openai.timeout_secs", self.openai.timeout_secs, 1, 300)?;
        validate_range("server.port", self.server.port, 1, u16::MAX)?;
        if let Some(minutes) = self.sheet.refresh_minutes {
            validate_range("sheet.refresh_minutes", minutes, 1, 24 * 60)?;
        }
        Ok(())
    }
}
