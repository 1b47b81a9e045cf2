use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Accept self-signed certificates, e.g. against a localhost instance.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    pub asset_grid_assignment_ids: Vec<String>,
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    #[serde(default = "default_step_minutes")]
    pub step_minutes: i64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_reading_value")]
    pub reading_value: f64,
}

fn default_window_hours() -> i64 {
    1
}

fn default_step_minutes() -> i64 {
    1
}

fn default_page_size() -> usize {
    100
}

fn default_reading_value() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub demo: DemoConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("SAMPLE_CONFIG").unwrap_or_else(|_| "sample-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }
}
