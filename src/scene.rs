//! Ordered collection of the faces taking part in light exchange.
//!
//! The position of a triangle in the scene is its identity: it is the row
//! and column index of that face in every matrix of the radiosity system.
//! Triangles are appended once, in load order, and never reordered.
//!
//! Luminous faces are recorded as a set of indices into the same ordering,
//! so membership is decided by identity rather than by geometric equality.

use std::collections::BTreeSet;

use log::warn;

use crate::geom::{Object3D, Triangle};

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    use crate::geom::Vertex;

    fn triangle(points: [[f64; 3]; 3]) -> Triangle {
        Triangle::new(points.map(|p| {
            Vertex::new(Point3::from(p), Vector3::new(0.5, 0.5, 0.5), 0)
        }))
    }

    #[test]
    fn degenerate_triangles_never_get_an_index() {
        let mut scene = Scene::new();
        let first = scene.add_triangle(
            triangle([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            false,
        );
        let degenerate = scene.add_triangle(
            triangle([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]),
            true,
        );
        let second = scene.add_triangle(
            triangle([[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]]),
            true,
        );

        assert_eq!(first, Some(0));
        assert_eq!(degenerate, None);
        assert_eq!(second, Some(1));
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.num_luminous(), 1);
        assert!(!scene.is_luminous(0));
        assert!(scene.is_luminous(1));
    }

    #[test]
    fn identical_geometry_is_not_shared_membership() {
        let mut scene = Scene::new();
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        scene.add_triangle(triangle(points), true);
        scene.add_triangle(triangle(points), false);

        assert!(scene.is_luminous(0));
        assert!(!scene.is_luminous(1));
    }

    #[test]
    fn lamps_are_selected_by_object_name() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let colors = vec![Vector3::new(1.0, 1.0, 1.0); 4];
        let faces = vec![[0, 1, 2], [1, 3, 2]];
        let floor = Object3D::new("Floor", positions.clone(), colors.clone(), faces.clone());
        let lamp = Object3D::new("Lamp", positions, colors, faces);

        let scene = Scene::from_objects(&[floor, lamp], &["Lamp".to_string()]);
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.luminous_indices().collect::<Vec<_>>(), vec![2, 3]);
    }
}

/// Valid triangles in index order plus the luminous subset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub triangles: Vec<Triangle>,
    luminous: BTreeSet<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the triangles of every object in order, marking the triangles
    /// of objects named in `lamp_names` as luminous.
    pub fn from_objects(objects: &[Object3D], lamp_names: &[String]) -> Self {
        let mut scene = Scene::new();

        for name in lamp_names {
            if !objects.iter().any(|o| &o.name == name) {
                warn!("no object named '{}' in the scene, it emits nothing", name);
            }
        }

        for object in objects {
            let luminous = lamp_names.iter().any(|name| name == &object.name);
            for triangle in &object.triangles {
                scene.add_triangle(triangle.clone(), luminous);
            }
        }

        if scene.num_luminous() == 0 {
            warn!("scene has no luminous faces, every face will solve to black");
        }

        scene
    }

    /// Adds a triangle and returns its index, or `None` if it is degenerate.
    pub fn add_triangle(&mut self, triangle: Triangle, luminous: bool) -> Option<usize> {
        if !triangle.is_valid() {
            return None;
        }
        let index = self.triangles.len();
        self.triangles.push(triangle);
        if luminous {
            self.luminous.insert(index);
        }
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn is_luminous(&self, index: usize) -> bool {
        self.luminous.contains(&index)
    }

    pub fn num_luminous(&self) -> usize {
        self.luminous.len()
    }

    /// Luminous indices in ascending order.
    pub fn luminous_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.luminous.iter().copied()
    }
}
