//! Synthetic demo volumes: a union of spheres, described either as a ball
//! radius per voxel or as star ray lengths per voxel.

use seedfill_geom::{Coord, Interval, RaySet, VecN};
use seedfill_volume::{DenseGrid, RayGrid};

use crate::config::{SceneParams, SphereParams};

pub fn scene_bounds(scene: &SceneParams) -> Interval<3> {
    Interval::from_dims(scene.dims)
}

#[inline]
fn offset_from(s: &SphereParams, p: &Coord<3>) -> VecN<3> {
    VecN::from_coord(p) - VecN::new(s.center)
}

/// Distance to the nearest sphere surface, capped at `max_radius`; 0 outside.
pub fn radius_field(scene: &SceneParams) -> DenseGrid<f32, 3> {
    let cap = scene.max_radius;
    DenseGrid::from_fn(scene_bounds(scene), 0.0, |p| {
        scene
            .spheres
            .iter()
            .map(|s| (s.radius - offset_from(s, p).length()) as f32)
            .filter(|depth| *depth > 0.0)
            .fold(0.0f32, f32::max)
            .min(cap)
    })
}

/// Exit distance from `p` along unit `dir` through sphere `s`, if `p` is
/// inside it.
fn exit_distance(s: &SphereParams, p: &Coord<3>, dir: VecN<3>) -> Option<f64> {
    let o = offset_from(s, p);
    let c = o.length_sq() - s.radius * s.radius;
    if c >= 0.0 {
        return None;
    }
    let b = dir.dot(o);
    Some(-b + (b * b - c).sqrt())
}

/// Per voxel, the distance along each ray to the surface of the sphere that
/// reaches furthest; all zeros outside the spheres.
pub fn ray_field(scene: &SceneParams, rays: &RaySet<3>) -> RayGrid<3> {
    RayGrid::from_fn(scene_bounds(scene), rays.len(), |p, out| {
        for (i, len) in out.iter_mut().enumerate() {
            let dir = rays.dir(i).normalized();
            *len = scene
                .spheres
                .iter()
                .filter_map(|s| exit_distance(s, p, dir))
                .fold(0.0f64, f64::max) as f32;
        }
    })
}

/// Rounded center of the first sphere, or the volume center.
pub fn default_seed(scene: &SceneParams) -> Coord<3> {
    match scene.spheres.first() {
        Some(s) => VecN::new(s.center).round(),
        None => {
            let mut c = [0i64; 3];
            for d in 0..3 {
                c[d] = (scene.dims[d] / 2) as i64;
            }
            c
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedfill_volume::{RayField, VoxelField};

    fn one_sphere() -> SceneParams {
        SceneParams {
            dims: [16, 16, 16],
            spheres: vec![SphereParams {
                center: [8.0, 8.0, 8.0],
                radius: 5.0,
            }],
            max_radius: 3.0,
            rays: 6,
            block: 8,
        }
    }

    #[test]
    fn radius_is_capped_depth() {
        let scene = one_sphere();
        let grid = radius_field(&scene);
        assert_eq!(grid.get(&[8, 8, 8]).unwrap(), 3.0);
        assert_eq!(grid.get(&[12, 8, 8]).unwrap(), 1.0);
        assert_eq!(grid.get(&[13, 8, 8]).unwrap(), 0.0);
        assert_eq!(grid.get(&[0, 0, 0]).unwrap(), 0.0);
        assert_eq!(grid.get(&[-1, 8, 8]).unwrap(), 0.0);
    }

    #[test]
    fn axis_rays_hit_the_surface() {
        let scene = one_sphere();
        let rays = RaySet::<3>::axes();
        let grid = ray_field(&scene, &rays);
        let mut out = vec![0.0f32; 6];
        grid.read_lengths(&[8, 8, 8], &mut out).unwrap();
        assert!(out.iter().all(|l| (*l - 5.0).abs() < 1e-5));
        grid.read_lengths(&[10, 8, 8], &mut out).unwrap();
        assert!((out[0] - 3.0).abs() < 1e-5);
        assert!((out[3] - 7.0).abs() < 1e-5);
        grid.read_lengths(&[1, 1, 1], &mut out).unwrap();
        assert!(out.iter().all(|l| *l == 0.0));
    }

    #[test]
    fn default_seed_is_first_center() {
        assert_eq!(default_seed(&one_sphere()), [8, 8, 8]);
        let mut empty = one_sphere();
        empty.spheres.clear();
        assert_eq!(default_seed(&empty), [8, 8, 8]);
    }
}
