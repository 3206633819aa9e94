//! Scene description files.
//!
//! A scene is either a JSON object or a plain `key = value` text file:
//!
//! ```text
//! # fire scene
//! volumeFolder = data/fire
//! lightPos = 0.0 10.0 0.0
//! lightLe = 50 50 50
//! albedo = 0.3 0.3 0.3
//! ```
//!
//! Values in the text form are numbers, whitespace-separated number triples
//! or bare strings. Both forms go through the same serde model, so key names
//! and defaults are identical. Keys that only matter to renderers (camera,
//! mesh, slices) are accepted and ignored.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, VolumeError};
use crate::kernel::DEFAULT_SIGMA;
use crate::layout::{GridLayout, DEFAULT_INNER_TEX_SIZE, DEFAULT_TEX_MARGIN};
use crate::medium::{MediumParams, MediumType, PointLight};
use crate::transform::VolumeTransform;

/// Parameters of one probe scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneConfig {
    /// Directory holding the `.vol` frames. Required.
    pub volume_folder: PathBuf,
    pub density_filter: String,
    /// Substring selecting emission frames; `None` means no emission.
    pub emission_filter: Option<String>,
    pub light_pos: Vec3,
    pub light_le: Vec3,
    pub albedo: Vec3,
    pub emission: Vec3,
    pub density_scale: f32,
    pub medium_type: MediumType,
    pub inner_tex_size: u32,
    pub tex_margin: u32,
    pub sigma: f32,
    pub volume_scale: f32,
    pub volume_translate: Vec3,
    pub volume_rotate_deg: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let medium = MediumParams::default();
        let transform = VolumeTransform::default();
        Self {
            volume_folder: PathBuf::new(),
            density_filter: "density".to_string(),
            emission_filter: None,
            light_pos: Vec3::ZERO,
            light_le: Vec3::ZERO,
            albedo: medium.albedo,
            emission: medium.emission_color,
            density_scale: medium.density_scale,
            medium_type: medium.medium_type,
            inner_tex_size: DEFAULT_INNER_TEX_SIZE,
            tex_margin: DEFAULT_TEX_MARGIN,
            sigma: DEFAULT_SIGMA,
            volume_scale: transform.scale.x,
            volume_translate: transform.translation,
            volume_rotate_deg: Vec3::ZERO,
        }
    }
}

impl SceneConfig {
    /// Reads a scene file. `.json` files are parsed as JSON, anything else
    /// as `key = value` text. Relative paths are resolved against the
    /// directory containing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VolumeError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let mut config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_key_value_str(&text)?
        };

        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        log::info!("Loaded scene config {}", path.display());
        log::debug!("{config:#?}");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.finish()
    }

    pub fn from_key_value_str(text: &str) -> Result<Self> {
        let value = parse_key_values(text)?;
        let config: Self = serde_json::from_value(value)?;
        config.finish()
    }

    fn finish(mut self) -> Result<Self> {
        // An empty filter would match every file in the folder.
        if self.emission_filter.as_deref().is_some_and(|f| f.trim().is_empty()) {
            self.emission_filter = None;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.volume_folder.as_os_str().is_empty() {
            return Err(VolumeError::Config(
                "No parameter \"volumeFolder\" found!".to_string(),
            ));
        }
        if self.inner_tex_size == 0 {
            return Err(VolumeError::Config("innerTexSize must be positive".to_string()));
        }
        if self.sigma <= 0.0 {
            return Err(VolumeError::Config(format!(
                "sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }

    /// Joins relative paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.volume_folder.is_relative() {
            self.volume_folder = base.join(&self.volume_folder);
        }
    }

    #[must_use]
    pub fn layout(&self) -> GridLayout {
        GridLayout::uniform(self.inner_tex_size, self.tex_margin)
    }

    #[must_use]
    pub fn transform(&self) -> VolumeTransform {
        VolumeTransform::new(
            Vec3::splat(self.volume_scale),
            glam::Quat::IDENTITY,
            self.volume_translate,
        )
        .with_euler_degrees(self.volume_rotate_deg)
    }

    #[must_use]
    pub fn medium(&self) -> MediumParams {
        MediumParams {
            albedo: self.albedo,
            emission_color: self.emission,
            density_scale: self.density_scale,
            medium_type: self.medium_type,
        }
    }

    #[must_use]
    pub fn light(&self) -> PointLight {
        PointLight::new(self.light_pos, self.light_le)
    }
}

/// Converts `key = value` lines into a JSON object.
fn parse_key_values(text: &str) -> Result<Value> {
    let mut map = Map::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            return Err(VolumeError::Config(format!(
                "line {}: expected `name = value`, got \"{line}\"",
                lineno + 1
            )));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(VolumeError::Config(format!("line {}: empty name", lineno + 1)));
        }
        map.insert(name.to_string(), parse_value(value.trim()));
    }
    Ok(Value::Object(map))
}

fn parse_value(value: &str) -> Value {
    let numbers: Option<Vec<Value>> = value.split_whitespace().map(parse_number).collect();
    match numbers {
        Some(mut numbers) if numbers.len() == 1 => numbers.remove(0),
        Some(numbers) if !numbers.is_empty() => Value::Array(numbers),
        _ => Value::String(value.to_string()),
    }
}

fn parse_number(token: &str) -> Option<Value> {
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::from(i));
    }
    token
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::from)
}
