use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use seedfill_fill::FillConfig;
use seedfill_runtime::RuntimeParams;

/// Whole demo configuration: scene, runtime and the fill sections.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scene: SceneParams,
    #[serde(default)]
    pub runtime: RuntimeParams,
    #[serde(flatten)]
    pub fill: FillConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SphereParams {
    pub center: [f64; 3],
    pub radius: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SceneParams {
    #[serde(default = "default_dims")]
    pub dims: [usize; 3],
    #[serde(default = "default_spheres")]
    pub spheres: Vec<SphereParams>,
    /// Cap on the per-voxel ball radius.
    #[serde(default = "default_max_radius")]
    pub max_radius: f32,
    /// Number of star rays per voxel.
    #[serde(default = "default_rays")]
    pub rays: usize,
    /// Export block edge length.
    #[serde(default = "default_block")]
    pub block: usize,
}
fn default_dims() -> [usize; 3] {
    [64, 64, 32]
}
fn default_spheres() -> Vec<SphereParams> {
    vec![
        SphereParams {
            center: [22.0, 32.0, 16.0],
            radius: 14.0,
        },
        SphereParams {
            center: [42.0, 32.0, 16.0],
            radius: 12.0,
        },
    ]
}
fn default_max_radius() -> f32 {
    3.0
}
fn default_rays() -> usize {
    32
}
fn default_block() -> usize {
    32
}
impl Default for SceneParams {
    fn default() -> Self {
        Self {
            dims: default_dims(),
            spheres: default_spheres(),
            max_radius: default_max_radius(),
            rays: default_rays(),
            block: default_block(),
        }
    }
}

impl SceneParams {
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.dims.iter().any(|&d| d == 0) {
            return Err(format!("scene.dims must be positive, got {:?}", self.dims).into());
        }
        if self.rays < 4 {
            return Err(format!("scene.rays must be at least 4, got {}", self.rays).into());
        }
        if self.block == 0 {
            return Err("scene.block must be positive".into());
        }
        if let Some(s) = self.spheres.iter().find(|s| !(s.radius.is_finite() && s.radius > 0.0)) {
            return Err(format!("sphere radius must be positive, got {}", s.radius).into());
        }
        Ok(())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<AppConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&s)?;
    cfg.scene.validate()?;
    cfg.fill.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_parse_together() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [scene]
            dims = [16, 16, 8]
            spheres = [{ center = [8.0, 8.0, 4.0], radius = 5.0 }]
            rays = 12

            [runtime]
            workers = 2

            [ball]
            min_overlap = 0.4

            [star]
            ray_score = "intersection_over_union"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scene.dims, [16, 16, 8]);
        assert_eq!(cfg.scene.spheres.len(), 1);
        assert_eq!(cfg.scene.block, 32);
        assert_eq!(cfg.runtime.workers, 2);
        assert_eq!(cfg.fill.ball.min_overlap, 0.4);
        assert_eq!(cfg.fill.star.min_consensus, 0.75);
        cfg.scene.validate().unwrap();
        cfg.fill.validate().unwrap();
    }

    #[test]
    fn empty_file_gives_default_scene() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.scene.spheres.len(), 2);
        assert_eq!(cfg.fill.worklist.cleanup_threshold, 100_000);
        cfg.scene.validate().unwrap();
    }

    #[test]
    fn bad_scene_is_rejected() {
        let mut scene = SceneParams::default();
        scene.rays = 2;
        assert!(scene.validate().is_err());
        scene.rays = 8;
        scene.spheres[0].radius = -1.0;
        assert!(scene.validate().is_err());
    }
}
