use anyhow::{Context, Result};
use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use crate::config::DEFAULT_VERTEX_COLOR;

#[cfg(test)]
mod tests {

    use super::*;

    fn vertex(x: f64, y: f64, z: f64) -> Vertex {
        Vertex::new(Point3::new(x, y, z), Vector3::new(0.3, 0.6, 0.9), 0)
    }

    #[test]
    fn unit_right_triangle() {
        let triangle = Triangle::new([
            vertex(0.0, 0.0, 0.0),
            vertex(1.0, 0.0, 0.0),
            vertex(0.0, 1.0, 0.0),
        ]);
        assert!(triangle.is_valid());
        assert_eq!(triangle.normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(triangle.area, 0.5);
        assert!((triangle.centroid - Point3::new(1.0 / 3.0, 1.0 / 3.0, 0.0)).norm() < 1e-15);
    }

    #[test]
    fn winding_flips_normal() {
        let triangle = Triangle::new([
            vertex(0.0, 0.0, 1.0),
            vertex(0.0, 1.0, 1.0),
            vertex(1.0, 0.0, 1.0),
        ]);
        assert_eq!(triangle.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(triangle.area, 0.5);
    }

    #[test]
    fn collinear_triangle_is_invalid() {
        let triangle = Triangle::new([
            vertex(0.0, 0.0, 0.0),
            vertex(1.0, 1.0, 1.0),
            vertex(2.0, 2.0, 2.0),
        ]);
        assert!(!triangle.is_valid());
        assert_eq!(triangle.area, 0.0);
        assert_eq!(triangle.normal, Vector3::zeros());
    }

    #[test]
    fn color_is_vertex_mean() {
        let triangle = Triangle::new([
            Vertex::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 0.0), 0),
            Vertex::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.3, 0.0, 0.6), 1),
            Vertex::new(Point3::new(0.0, 1.0, 0.0), Vector3::new(0.6, 0.3, 0.0), 2),
        ]);
        assert!((triangle.color - Vector3::new(0.3, 0.1, 0.2)).norm() < 1e-15);

        let mut triangle = triangle;
        triangle.set_color(Vector3::new(1.0, 0.5, 0.25));
        assert_eq!(triangle.color, Vector3::new(1.0, 0.5, 0.25));
        // geometry is untouched by a color update
        assert_eq!(triangle.area, 0.5);
    }

    #[test]
    fn load_room() {
        let geom = Geom::from_file("./tests/test_data/room.obj").unwrap();
        assert_eq!(geom.objects.len(), 3);
        assert_eq!(geom.objects[0].name, "Floor");
        assert_eq!(geom.objects[2].name, "Lamp");
        // the floor carries one degenerate face which is kept for writing only
        assert_eq!(geom.objects[0].faces.len(), 3);
        assert_eq!(geom.objects[0].triangles.len(), 2);
        assert_eq!(geom.num_triangles(), 6);
    }
}

/// A mesh vertex in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub color: Vector3<f64>,
    /// Index into the source color table. Only used to write results back.
    pub color_index: usize,
}

impl Vertex {
    pub fn new(position: Point3<f64>, color: Vector3<f64>, color_index: usize) -> Self {
        Self {
            position,
            color,
            color_index,
        }
    }
}

/// A triangular face and its derived attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub normal: Vector3<f64>,  // unit normal, zero if degenerate
    pub area: f64,             // half the raw normal length
    pub centroid: Point3<f64>, // mean of the vertex positions
    pub color: Vector3<f64>,   // mean of the vertex colors, later the solved color
    valid: bool,
}

impl Triangle {
    pub fn new(vertices: [Vertex; 3]) -> Self {
        let r1 = &vertices[0].position;
        let r2 = &vertices[1].position;
        let r3 = &vertices[2].position;

        let raw_normal = (r2 - r1).cross(&(r3 - r1));
        let magnitude = raw_normal.norm();
        let valid = magnitude != 0.0;

        let normal = if valid {
            raw_normal / magnitude
        } else {
            Vector3::zeros()
        };
        let centroid = Point3::from((r1.coords + r2.coords + r3.coords) / 3.0);
        let color = (vertices[0].color + vertices[1].color + vertices[2].color) / 3.0;

        Self {
            vertices,
            normal,
            area: magnitude / 2.0,
            centroid,
            color,
            valid,
        }
    }

    /// A triangle is valid if its raw normal has nonzero length.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Replaces the face color with its solved value.
    pub fn set_color(&mut self, color: Vector3<f64>) {
        self.color = color;
    }
}

/// A named group of faces, as loaded from one model of a scene file.
#[derive(Debug, Clone, PartialEq)]
pub struct Object3D {
    pub name: String,
    pub positions: Vec<Point3<f64>>, // vertex table of the model
    pub colors: Vec<Vector3<f64>>,   // color table, indexed like positions
    pub faces: Vec<[usize; 3]>,      // every face in the file, degenerate ones included
    pub triangles: Vec<Triangle>,    // valid faces only, in file order
}

impl Object3D {
    pub fn new(
        name: &str,
        positions: Vec<Point3<f64>>,
        colors: Vec<Vector3<f64>>,
        faces: Vec<[usize; 3]>,
    ) -> Self {
        let triangles = faces
            .iter()
            .map(|face| {
                Triangle::new(face.map(|i| Vertex::new(positions[i], colors[i], i)))
            })
            .filter(Triangle::is_valid)
            .collect::<Vec<_>>();

        if triangles.len() < faces.len() {
            debug!(
                "object '{}': dropped {} degenerate faces",
                name,
                faces.len() - triangles.len()
            );
        }

        Self {
            name: name.to_string(),
            positions,
            colors,
            faces,
            triangles,
        }
    }

    fn from_model(model: &tobj::Model, materials: &[tobj::Material]) -> Self {
        let mesh = &model.mesh;

        let positions: Vec<Point3<f64>> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect();

        // per-vertex colors take precedence over the material diffuse color
        let colors = if !mesh.vertex_color.is_empty()
            && mesh.vertex_color.len() == mesh.positions.len()
        {
            mesh.vertex_color
                .chunks_exact(3)
                .map(|c| Vector3::new(c[0] as f64, c[1] as f64, c[2] as f64))
                .collect()
        } else {
            let diffuse = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .and_then(|material| material.diffuse)
                .map(|d| Vector3::new(d[0] as f64, d[1] as f64, d[2] as f64))
                .unwrap_or_else(|| Vector3::from(DEFAULT_VERTEX_COLOR));
            vec![diffuse; positions.len()]
        };

        let faces = mesh
            .indices
            .chunks_exact(3)
            .map(|f| [f[0] as usize, f[1] as usize, f[2] as usize])
            .collect();

        Self::new(&model.name, positions, colors, faces)
    }
}

/// All objects of a scene file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Geom {
    pub objects: Vec<Object3D>,
}

impl Geom {
    pub fn from_file(filename: &str) -> Result<Geom> {
        let options = tobj::LoadOptions {
            triangulate: true,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(filename, &options)
            .with_context(|| format!("Failed to load OBJ file '{}'", filename))?;

        let materials = materials.unwrap_or_else(|err| {
            warn!("no materials loaded for '{}': {}", filename, err);
            Vec::new()
        });

        let objects: Vec<Object3D> = models
            .iter()
            .map(|model| Object3D::from_model(model, &materials))
            .collect();

        debug!(
            "loaded {} objects with {} valid triangles from '{}'",
            objects.len(),
            objects.iter().map(|o| o.triangles.len()).sum::<usize>(),
            filename
        );

        Ok(Geom { objects })
    }

    /// Total number of valid triangles across all objects.
    pub fn num_triangles(&self) -> usize {
        self.objects.iter().map(|o| o.triangles.len()).sum()
    }
}
