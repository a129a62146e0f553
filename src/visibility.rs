//! Line-of-sight queries between face centroids.
//!
//! For a pair of faces `(i, j)` every triangle of the scene is tested as a
//! potential blocker, the source and destination faces included. Each test
//! solves a 3x3 system whose rows are the centroid separation and the two
//! edges of the candidate triangle:
//!
//! ```text
//! | c_j - c_i |   | t |
//! | p1 - p0   | . | u | = -c_j - p0
//! | p2 - p0   |   | v |
//! ```
//!
//! A candidate blocks the pair if `0 < t < 1`, `0 < u < 1`, `0 < v < 1` and
//! `u + v <= 1`. A singular system is always reported as blocking.

use nalgebra::{Matrix3, Vector3};

use crate::geom::Triangle;
use crate::scene::Scene;

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    use crate::geom::Vertex;

    fn triangle(points: [[f64; 3]; 3]) -> Triangle {
        Triangle::new(points.map(|p| {
            Vertex::new(Point3::from(p), Vector3::new(0.5, 0.5, 0.5), 0)
        }))
    }

    fn facing_pair() -> Scene {
        let mut scene = Scene::new();
        scene.add_triangle(
            triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            true,
        );
        scene.add_triangle(
            triangle([[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
            false,
        );
        scene
    }

    #[test]
    fn facing_pair_is_visible() {
        let scene = facing_pair();
        assert!(!is_occluded(&scene, 0, 1));
        assert!(!is_occluded(&scene, 1, 0));
    }

    #[test]
    fn occluder_containing_the_segment_blocks_both_ways() {
        let mut scene = facing_pair();
        // the plane x = 1/3 holds the segment between both centroids
        let third = 1.0 / 3.0;
        scene.add_triangle(
            triangle([[third, -1.0, -1.0], [third, 2.0, -1.0], [third, -1.0, 2.0]]),
            false,
        );
        assert!(is_occluded(&scene, 0, 1));
        assert!(is_occluded(&scene, 1, 0));
    }

    #[test]
    fn singular_candidate_is_conservatively_blocking() {
        let scene = facing_pair();
        let candidate = triangle([[5.0, 5.0, 5.0], [5.0, 6.0, 5.0], [5.0, 5.0, 6.0]]);
        // parallel to the segment and far away from it
        assert!(blocks(
            &scene.triangles[0],
            &scene.triangles[1],
            &candidate
        ));
    }

    #[test]
    fn intersection_parameters_match_reference_values() {
        let scene = facing_pair();
        let (c_i, c_j) = (scene.triangles[0].centroid, scene.triangles[1].centroid);

        let tuv = intersection_parameters(
            &(c_j - c_i),
            &c_j.coords,
            &scene.triangles[0],
        )
        .unwrap();
        assert!((tuv - Vector3::new(-1.0 / 3.0, -1.0, -1.0 / 3.0)).norm() < 1e-12);

        let tuv = intersection_parameters(
            &(c_j - c_i),
            &c_j.coords,
            &scene.triangles[1],
        )
        .unwrap();
        assert!((tuv - Vector3::new(-2.0, -1.0 / 3.0, -1.0 / 3.0)).norm() < 1e-12);
    }
}

/// Returns true if any triangle of the scene blocks the segment between the
/// centroids of faces `i` and `j`.
pub fn is_occluded(scene: &Scene, i: usize, j: usize) -> bool {
    let from = &scene.triangles[i];
    let to = &scene.triangles[j];

    scene
        .triangles
        .iter()
        .any(|candidate| blocks(from, to, candidate))
}

/// Tests a single candidate triangle against the segment `from -> to`.
fn blocks(from: &Triangle, to: &Triangle, candidate: &Triangle) -> bool {
    let separation = to.centroid - from.centroid;
    match intersection_parameters(&separation, &to.centroid.coords, candidate) {
        Some(tuv) => {
            let (t, u, v) = (tuv.x, tuv.y, tuv.z);
            0.0 < t && t < 1.0 && 0.0 < u && u < 1.0 && 0.0 < v && v < 1.0 && u + v <= 1.0
        }
        None => true,
    }
}

/// Solves for `(t, u, v)`, or `None` if the system is singular.
fn intersection_parameters(
    separation: &Vector3<f64>,
    target: &Vector3<f64>,
    candidate: &Triangle,
) -> Option<Vector3<f64>> {
    let p0 = &candidate.vertices[0].position;
    let p1 = &candidate.vertices[1].position;
    let p2 = &candidate.vertices[2].position;

    let system = Matrix3::from_rows(&[
        separation.transpose(),
        (p1 - p0).transpose(),
        (p2 - p0).transpose(),
    ]);
    if system.determinant() == 0.0 {
        return None;
    }

    let rhs = -(target + p0.coords);
    system.lu().solve(&rhs)
}
