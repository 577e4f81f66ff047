use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context};
use serde::Deserialize;

use crate::auth::{ChainedTokenSource, EnvTokenSource, FileTokenSource, TokenSource};

pub const DEFAULT_SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub priorities_endpoint: String,
    pub assign_priority_endpoint: String,
    pub update_priority_endpoint: String,
    pub token_env: String,
    pub token_file: Option<PathBuf>,
    pub default_page_size: usize,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            priorities_endpoint: "/api/admin/priorities".into(),
            assign_priority_endpoint: "/api/deals/priority".into(),
            update_priority_endpoint: "/api/deals/priority".into(),
            token_env: "DASHBOARD_TOKEN".into(),
            token_file: None,
            default_page_size: list_view::DEFAULT_PAGE_SIZE,
            poll_interval_ms: 5_000,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Environment variable first, then the token file if configured.
    pub fn token_source(&self) -> Arc<dyn TokenSource> {
        let mut sources: Vec<Arc<dyn TokenSource>> =
            vec![Arc::new(EnvTokenSource::new(self.token_env.clone()))];
        if let Some(path) = &self.token_file {
            sources.push(Arc::new(FileTokenSource::new(path.clone())));
        }
        Arc::new(ChainedTokenSource::new(sources))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    api_base_url: Option<String>,
    priorities_endpoint: Option<String>,
    assign_priority_endpoint: Option<String>,
    update_priority_endpoint: Option<String>,
    token_env: Option<String>,
    token_file: Option<PathBuf>,
    default_page_size: Option<usize>,
    poll_interval_ms: Option<u64>,
}

/// Defaults, then the TOML file, then `APP__*` environment overrides.
///
/// A missing default file is ignored; a missing explicit file is an error.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with_env(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with_env(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    apply_env(&mut settings, &env)?;

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    if settings.default_page_size == 0 {
        bail!("default_page_size must be positive");
    }
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.priorities_endpoint {
        settings.priorities_endpoint = v;
    }
    if let Some(v) = file_cfg.assign_priority_endpoint {
        settings.assign_priority_endpoint = v;
    }
    if let Some(v) = file_cfg.update_priority_endpoint {
        settings.update_priority_endpoint = v;
    }
    if let Some(v) = file_cfg.token_env {
        settings.token_env = v;
    }
    if let Some(v) = file_cfg.token_file {
        settings.token_file = Some(v);
    }
    if let Some(v) = file_cfg.default_page_size {
        settings.default_page_size = v;
    }
    if let Some(v) = file_cfg.poll_interval_ms {
        settings.poll_interval_ms = v;
    }
}

fn apply_env(
    settings: &mut Settings,
    env: &impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__PRIORITIES_ENDPOINT") {
        settings.priorities_endpoint = v;
    }
    if let Some(v) = env("APP__ASSIGN_PRIORITY_ENDPOINT") {
        settings.assign_priority_endpoint = v;
    }
    if let Some(v) = env("APP__UPDATE_PRIORITY_ENDPOINT") {
        settings.update_priority_endpoint = v;
    }
    if let Some(v) = env("APP__TOKEN_ENV") {
        settings.token_env = v;
    }
    if let Some(v) = env("APP__TOKEN_FILE") {
        settings.token_file = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__DEFAULT_PAGE_SIZE") {
        settings.default_page_size = v
            .trim()
            .parse()
            .with_context(|| format!("APP__DEFAULT_PAGE_SIZE is not a number: '{v}'"))?;
    }
    if let Some(v) = env("APP__POLL_INTERVAL_MS") {
        settings.poll_interval_ms = v
            .trim()
            .parse()
            .with_context(|| format!("APP__POLL_INTERVAL_MS is not a number: '{v}'"))?;
    }
    Ok(())
}

pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(Settings::default().api_base_url);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(anyhow!(
            "api_base_url must start with http:// or https://, got '{trimmed}'"
        ));
    }
    url::Url::parse(trimmed).with_context(|| format!("invalid api_base_url '{trimmed}'"))?;
    Ok(trimmed.to_string())
}
