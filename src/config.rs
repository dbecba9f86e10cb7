use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::coordinate::PathStyle;
use crate::defaults::DefaultCatalog;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5000);

/// Runtime settings, read from `DOCPORTAL_*` environment variables.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api_base_url: Url,
    pub path_style: PathStyle,
    pub fetch_timeout: Duration,
    pub admin_emails: Vec<String>,
    /// Voice chat turns itself off when this is unset.
    pub voice_agent_id: Option<String>,
    pub defaults_file: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default api url is valid"),
            path_style: PathStyle::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            admin_emails: Vec::new(),
            voice_agent_id: None,
            defaults_file: None,
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(raw) = var("DOCPORTAL_API_BASE_URL") {
            config.api_base_url =
                Url::parse(&raw).with_context(|| format!("parse DOCPORTAL_API_BASE_URL: {raw}"))?;
        }
        if let Some(raw) = var("DOCPORTAL_PATH_STYLE") {
            config.path_style = match raw.as_str() {
                "dashed" => PathStyle::Dashed,
                "nested" => PathStyle::Nested,
                other => anyhow::bail!("DOCPORTAL_PATH_STYLE must be dashed or nested: {other}"),
            };
        }
        if let Some(raw) = var("DOCPORTAL_FETCH_TIMEOUT_MS") {
            let ms = raw
                .parse::<u64>()
                .with_context(|| format!("parse DOCPORTAL_FETCH_TIMEOUT_MS: {raw}"))?;
            if ms == 0 {
                anyhow::bail!("DOCPORTAL_FETCH_TIMEOUT_MS must be > 0");
            }
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = var("DOCPORTAL_ADMIN_EMAILS") {
            config.admin_emails = raw
                .split(',')
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
        config.voice_agent_id = var("DOCPORTAL_VOICE_AGENT_ID");
        config.defaults_file = var("DOCPORTAL_DEFAULTS_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn voice_chat_enabled(&self) -> bool {
        self.voice_agent_id.is_some()
    }

    pub fn load_catalog(&self) -> anyhow::Result<DefaultCatalog> {
        match &self.defaults_file {
            Some(path) => DefaultCatalog::from_yaml_file(path),
            None => Ok(DefaultCatalog::builtin().clone()),
        }
    }
}
