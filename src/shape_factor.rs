//! Radiative coupling between ordered pairs of faces.
//!
//! The shape factor of face `j` as seen from face `i` is approximated from
//! the centroids and orientations of both faces:
//!
//! ```text
//! F_ij ~ cos(theta_i) cos(theta_j) A_j / (pi r^2)
//! ```
//!
//! where `theta_j` is the angle between the normal of `j` and the vector from
//! the centroid of `i` to the centroid of `j`. Pairs blocked by any triangle
//! of the scene couple with zero. Only `theta_j` is culled against `pi/2`, so
//! `F_ij` may come out negative when face `i` looks away from `j`; the
//! system builder takes the absolute value.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::scene::Scene;
use crate::visibility::is_occluded;

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    use crate::geom::{Triangle, Vertex};

    fn triangle(points: [[f64; 3]; 3]) -> Triangle {
        Triangle::new(points.map(|p| {
            Vertex::new(Point3::from(p), Vector3::new(0.5, 0.5, 0.5), 0)
        }))
    }

    fn scene_of(triangles: Vec<[[f64; 3]; 3]>) -> Scene {
        let mut scene = Scene::new();
        for points in triangles {
            scene.add_triangle(triangle(points), false);
        }
        scene
    }

    #[test]
    fn facing_pair_at_unit_distance() {
        let scene = scene_of(vec![
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
        ]);
        let expected = 0.5 / PI;
        let forward = shape_factor(&scene, 0, 1);
        let backward = shape_factor(&scene, 1, 0);
        assert!((forward - expected).abs() < 1e-12, "forward: {}", forward);
        assert!((backward - expected).abs() < 1e-12, "backward: {}", backward);
        assert!((forward - 0.159155).abs() < 1e-6);
    }

    #[test]
    fn self_coupling_is_zero() {
        let scene = scene_of(vec![[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        assert_eq!(shape_factor(&scene, 0, 0), 0.0);
    }

    #[test]
    fn occluded_pair_is_zero() {
        let third = 1.0 / 3.0;
        let scene = scene_of(vec![
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
            [[third, -1.0, -1.0], [third, 2.0, -1.0], [third, -1.0, 2.0]],
        ]);
        assert_eq!(shape_factor(&scene, 0, 1), 0.0);
        assert_eq!(shape_factor(&scene, 1, 0), 0.0);
    }

    #[test]
    fn perpendicular_receiver_is_culled() {
        // the receiver normal is +y and the centroid offset has no y component
        let scene = scene_of(vec![
            [[-1.0, -1.0, 0.0], [2.0, -1.0, 0.0], [-1.0, 2.0, 0.0]],
            [[0.0, 0.0, 1.0], [0.0, 0.0, 2.0], [1.0, 0.0, 1.0]],
        ]);
        assert_eq!(angle_between(&scene, 0, 1), FRAC_PI_2);
        assert_eq!(shape_factor(&scene, 0, 1), 0.0);
    }

    #[test]
    fn only_the_receiver_angle_is_culled() {
        // both faces look the same way (+z): j faces away from i, but i is
        // not culled when it is the receiver
        let scene = scene_of(vec![
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
        ]);
        assert_eq!(angle_between(&scene, 0, 1), 0.0);
        assert_eq!(shape_factor(&scene, 0, 1), 0.0);

        let reverse = shape_factor(&scene, 1, 0);
        assert!((reverse + 0.5 / PI).abs() < 1e-12, "reverse: {}", reverse);
    }

    #[test]
    fn coupling_grows_as_faces_approach() {
        let factor = |d: f64| {
            let scene = scene_of(vec![
                [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                [[0.0, 0.0, d], [0.0, 1.0, d], [1.0, 0.0, d]],
            ]);
            shape_factor(&scene, 0, 1)
        };
        let (far, mid, near) = (factor(2.0), factor(1.0), factor(0.5));
        assert!(far < mid && mid < near);
        assert!((mid / far - 4.0).abs() < 1e-9);
    }
}

/// Angle in radians between the normal of face `j` and the vector from the
/// centroid of `i` to the centroid of `j`.
pub fn angle_between(scene: &Scene, i: usize, j: usize) -> f64 {
    let normal = &scene.triangles[j].normal;
    let r = scene.triangles[j].centroid - scene.triangles[i].centroid;

    let cos_theta = normal.dot(&r) / (normal.norm() * r.norm());
    cos_theta.clamp(-1.0, 1.0).acos()
}

/// Shape factor from face `i` to face `j`.
pub fn shape_factor(scene: &Scene, i: usize, j: usize) -> f64 {
    if i == j || is_occluded(scene, i, j) {
        return 0.0;
    }

    let theta_j = angle_between(scene, i, j);
    let theta_i = angle_between(scene, j, i);
    if theta_j <= FRAC_PI_2 {
        return 0.0;
    }

    let r_squared = (scene.triangles[j].centroid - scene.triangles[i].centroid).norm_squared();
    theta_i.cos() * theta_j.cos() * scene.triangles[j].area / (PI * r_squared)
}
