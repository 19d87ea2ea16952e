use crate::operator::{DEFAULT_VIEWER_PATH, SequencingConfig, SequencingMode};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TargetType {
    #[default]
    LocalViewer,
    Printer,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct LocalViewerSettings {
    #[serde(default = "default_viewer_path")]
    pub path: PathBuf,
    #[serde(default = "default_tmpfile_ext")]
    pub tmpfile_ext: String,
}

impl Default for LocalViewerSettings {
    fn default() -> Self {
        Self {
            path: default_viewer_path(),
            tmpfile_ext: default_tmpfile_ext(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct PrinterSettings {
    pub ip: String,
    #[serde(default)]
    pub printer_name: Option<String>,
    #[serde(default = "default_tmpfile_ext")]
    pub tmpfile_ext: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub local_settings: Option<LocalViewerSettings>,
    #[serde(default)]
    pub printer_settings: Option<PrinterSettings>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSetting {
    #[default]
    SinglePhase,
    TwoPhase,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct OperatorSettings {
    #[serde(default = "default_init")]
    pub init: u32,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default)]
    pub mode: ModeSetting,
    #[serde(default = "default_viewer_path")]
    pub path: PathBuf,
    #[serde(default = "default_change_throttle_ms")]
    pub change_throttle_ms: u64,
}

fn default_init() -> u32 {
    1
}
fn default_max_steps() -> u32 {
    20
}
fn default_viewer_path() -> PathBuf {
    PathBuf::from(DEFAULT_VIEWER_PATH)
}
fn default_tmpfile_ext() -> String {
    ".jpg".to_string()
}
fn default_change_throttle_ms() -> u64 {
    1000
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            init: default_init(),
            max_steps: default_max_steps(),
            mode: ModeSetting::default(),
            path: default_viewer_path(),
            change_throttle_ms: default_change_throttle_ms(),
        }
    }
}

impl OperatorSettings {
    pub fn to_sequencing_config(&self) -> SequencingConfig {
        SequencingConfig {
            init: self.init,
            max_steps: self.max_steps,
            mode: match self.mode {
                ModeSetting::SinglePhase => SequencingMode::SinglePhase,
                ModeSetting::TwoPhase => SequencingMode::TwoPhase,
            },
            path: self.path.clone(),
            change_throttle: Duration::from_millis(self.change_throttle_ms),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ExportSettings {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_tmpfile_ext")]
    pub extension: String,
}

pub fn default_export_dir() -> PathBuf {
    PathBuf::from("./.conductor_findings")
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            extension: default_tmpfile_ext(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ConductorConfig {
    #[serde(default)]
    pub operator: Option<OperatorSettings>,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub export: Option<ExportSettings>,
}

impl ConductorConfig {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config: ConductorConfig = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            operator: Some(OperatorSettings::default()),
            target: TargetConfig::default(),
            export: Some(ExportSettings::default()),
        }
    }
}
