use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use log::info;

use crate::geom::Object3D;
use crate::result::Results;
use crate::scene::Scene;


/// Writes the objects back as an OBJ file with per-vertex colors taken from
/// the solved scene.
///
/// The scene must have been built from `objects` with
/// [`Scene::from_objects`], so that its triangles follow the objects'
/// triangles in order. Each vertex takes the color of the last triangle
/// that references it; vertices only used by degenerate faces keep their
/// loaded color.
pub fn write_obj<P: AsRef<Path>>(path: P, objects: &[Object3D], scene: &Scene) -> Result<()> {
    let expected: usize = objects.iter().map(|o| o.triangles.len()).sum();
    if expected != scene.len() {
        return Err(anyhow!(
            "Scene has {} triangles but the objects hold {}",
            scene.len(),
            expected
        ));
    }

    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# radiosity solution")?;

    let mut next_triangle = 0;
    let mut vertex_offset = 0;
    for object in objects {
        let solved = &scene.triangles[next_triangle..next_triangle + object.triangles.len()];
        next_triangle += object.triangles.len();

        let mut colors = object.colors.clone();
        for triangle in solved {
            for vertex in &triangle.vertices {
                colors[vertex.color_index] = triangle.color;
            }
        }

        writeln!(writer, "o {}", object.name)?;
        for (position, color) in object.positions.iter().zip(colors.iter()) {
            writeln!(
                writer,
                "v {} {} {} {} {} {}",
                position.x, position.y, position.z, color.x, color.y, color.z
            )?;
        }
        for face in &object.faces {
            writeln!(
                writer,
                "f {}",
                face.iter().map(|i| i + vertex_offset + 1).join(" ")
            )?;
        }

        vertex_offset += object.positions.len();
    }

    writer.flush()?;
    info!("Wrote solved scene to {:?}", path);
    Ok(())
}

/// Writes the run summary as pretty-printed JSON.
pub fn write_result<P: AsRef<Path>>(path: P, results: &Results) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(BufWriter::new(file), results)
        .with_context(|| format!("Failed to write results to {:?}", path))?;
    info!("Wrote results to {:?}", path);
    Ok(())
}
