use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{ClassifyOptions, Office, PhenSig, ProductClass, Windows};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub engine: EngineConfig,
    pub table: TableConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Classification options for an ordinary (non-correction, non-routine) issuance.
    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            product_class: self.defaults.product_class.unwrap_or_default(),
            windows: self.engine.windows.clone(),
            hazard_filter: self.engine.hazard_filter.clone(),
            ..ClassifyOptions::default()
        }
    }

    /// Active-table file, falling back to the data directory.
    pub fn table_path(&self) -> PathBuf {
        self.table
            .path
            .clone()
            .unwrap_or_else(crate::paths::default_table_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DefaultsConfig {
    pub office: Option<Office>,
    pub product_class: Option<ProductClass>,
}

impl DefaultsConfig {
    pub fn apply_to(&self, target: &mut DefaultsConfig) {
        if self.office.is_some() {
            target.office = self.office.clone();
        }
        if self.product_class.is_some() {
            target.product_class = self.product_class;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub windows: Windows,
    /// Phen/sigs this site is responsible for closing; unset means all.
    pub hazard_filter: Option<BTreeSet<PhenSig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfigOverride {
    pub windows: Option<WindowsOverride>,
    pub hazard_filter: Option<BTreeSet<PhenSig>>,
}

impl EngineConfigOverride {
    pub fn apply_to(&self, target: &mut EngineConfig) {
        if let Some(windows) = self.windows.as_ref() {
            windows.apply_to(&mut target.windows);
        }
        if let Some(filter) = self.hazard_filter.as_ref() {
            target.hazard_filter = Some(filter.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WindowsOverride {
    pub expiration_ms: Option<i64>,
    pub purge_ms: Option<i64>,
    pub pending_ms: Option<i64>,
}

impl WindowsOverride {
    pub fn apply_to(&self, target: &mut Windows) {
        if let Some(ms) = self.expiration_ms {
            target.expiration_ms = ms;
        }
        if let Some(ms) = self.purge_ms {
            target.purge_ms = ms;
        }
        if let Some(ms) = self.pending_ms {
            target.pending_ms = ms;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TableConfig {
    pub path: Option<PathBuf>,
}

impl TableConfig {
    pub fn apply_to(&self, target: &mut TableConfig) {
        if let Some(path) = self.path.as_ref() {
            target.path = Some(path.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Tree,
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Tree,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_age_days: Some(7),
            retention_max_files: Some(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
    pub retention_max_age_days: Option<u64>,
    pub retention_max_files: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
        if let Some(days) = self.retention_max_age_days {
            target.retention_max_age_days = Some(days);
        }
        if let Some(files) = self.retention_max_files {
            target.retention_max_files = Some(files);
        }
    }
}

/// One config file. Every field is optional so a layer only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub defaults: DefaultsConfig,
    pub engine: EngineConfigOverride,
    pub table: TableConfig,
    pub logging: LoggingConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, target: &mut Config) {
        self.defaults.apply_to(&mut target.defaults);
        self.engine.apply_to(&mut target.engine);
        self.table.apply_to(&mut target.table);
        self.logging.apply_to(&mut target.logging);
    }
}
