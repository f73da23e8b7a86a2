use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Multipliers applied to a child's max width when splitting its parent's span,
/// chosen by the child's upstream status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexScale {
    pub branch: f32,
    pub head: f32,
    pub none: f32,
}

impl Default for FlexScale {
    fn default() -> Self {
        Self {
            branch: 1.0,
            head: 1.0,
            none: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualsConfig {
    pub primary_branch: String,
    pub node_radius: f32,
    pub default_speed_ms: u64,
    pub explode_tick_ms: u64,
    pub resize_debounce_ms: u64,
    pub min_depth_layers: u32,
    pub depth_warning_layers: u32,
    pub label_spacing: f32,
    pub edge_curve: f32,
    pub head_fill: String,
    pub detached_fill: String,
    pub flex_scale: FlexScale,
}

impl Default for VisualsConfig {
    fn default() -> Self {
        Self {
            primary_branch: "main".to_string(),
            node_radius: 17.5,
            default_speed_ms: 600,
            explode_tick_ms: 25,
            resize_debounce_ms: 200,
            min_depth_layers: 7,
            depth_warning_layers: 15,
            label_spacing: 28.0,
            edge_curve: 0.5,
            head_fill: "hsb(0.5,0.2,1)".to_string(),
            detached_fill: "#888888".to_string(),
            flex_scale: FlexScale::default(),
        }
    }
}

impl VisualsConfig {
    pub fn default_speed(&self) -> Duration {
        Duration::from_millis(self.default_speed_ms)
    }

    pub fn explode_tick(&self) -> Duration {
        Duration::from_millis(self.explode_tick_ms.max(1))
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Distance kept between the canvas walls and node centers.
    pub fn screen_padding(&self) -> f32 {
        self.node_radius * 1.5
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gitviz")?;
    Some(proj.config_dir().join("visuals.toml"))
}

pub fn load_or_default() -> VisualsConfig {
    let Some(path) = config_file_path() else {
        return VisualsConfig::default();
    };
    load_or_default_from_path(&path)
}

pub fn load_or_default_from_path(path: &Path) -> VisualsConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return VisualsConfig::default();
    };
    match toml::from_str(&contents) {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring malformed visuals config");
            VisualsConfig::default()
        }
    }
}

pub fn save(cfg: &VisualsConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

pub fn save_to_path(cfg: &VisualsConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize visuals config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write visuals config {}", path.display()))?;
    Ok(())
}
