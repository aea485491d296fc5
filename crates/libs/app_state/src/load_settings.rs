use crate::{AppSettings, RawSettings};
use color_eyre::eyre::Result;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use std::path::Path;
use tracing::info;

/// Loads `config/settings.yaml`, with `APP__*` environment overrides on top.
pub fn load_app_settings() -> Result<AppSettings> {
    // Need to load from dotenv to get it to overwrite the db url from env.
    dotenv::from_path(".env").ok();
    let config_path = Path::new("config/settings.yaml").canonicalize()?;
    info!("Loading settings from {}", config_path.display());

    let builder = with_env_overrides(Config::builder().add_source(File::from(config_path)));
    build_settings(builder)
}

/// Parses settings from an in-memory YAML document, still honouring env overrides.
pub fn load_app_settings_from_str(yaml: &str) -> Result<AppSettings> {
    let builder = with_env_overrides(
        Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)),
    );
    build_settings(builder)
}

fn with_env_overrides(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    )
}

fn build_settings(builder: ConfigBuilder<DefaultState>) -> Result<AppSettings> {
    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    Ok(raw_settings.into())
}
