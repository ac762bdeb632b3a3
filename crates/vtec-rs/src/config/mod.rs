//! Config loading and persistence.

mod load;
mod merge;
mod schema;

pub use load::{
    config_path, load, load_layer, load_user_config, site_config_path,
    write_config,
};
pub use merge::{apply_env_overrides, apply_env_overrides_from, merge_layers};
pub use schema::{
    Config, ConfigLayer, DefaultsConfig, EngineConfig, EngineConfigOverride, FileLoggingConfig,
    FileLoggingConfigOverride, LogFormat, LogRotation, LoggingConfig, LoggingConfigOverride,
    TableConfig, WindowsOverride,
};
