use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Application {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "type")]
pub enum RepositoryKind {
    Mem,
}

impl Default for RepositoryKind {
    fn default() -> Self {
        RepositoryKind::Mem
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Configuration {
    pub app: Application,
    pub repository: Option<RepositoryKind>,
    pub compression: Option<bool>,
}

impl Configuration {
    pub fn new(filename: &str) -> Result<Self, ConfigError> {
        let mut s = Config::default();
        s.merge(File::with_name(filename))?;
        s.merge(Environment::with_prefix("app").separator("__"))?;
        s.try_into()
    }
}

/// Installs the global subscriber. Later calls keep the first one.
pub fn setup_tracing() {
    use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

    let fmt_subscriber = fmt::layer();

    let env_subscriber =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let collector = Registry::default()
        .with(fmt_subscriber)
        .with(env_subscriber);

    let _ = tracing_log::LogTracer::init();
    let _ = tracing::subscriber::set_global_default(collector);
}
