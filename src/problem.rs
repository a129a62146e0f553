use std::time::Instant;

use anyhow::{anyhow, bail, Result};
use log::{info, warn};
use nalgebra::Vector3;
use ndarray::Array2;

use crate::{
    cache::{SceneKey, SystemCache},
    corrections::{apply_gamma, saturate_color},
    result::Results,
    scene::Scene,
    solver,
    system::LinearSystem,
};


/// A radiosity problem over a single scene.
#[derive(Debug, Clone)]
pub struct Problem {
    pub scene: Scene,                      // faces to solve, in index order
    pub result: Results,                   // results of the problem
    cache: Option<SystemCache>,            // persisted systems, never consulted if None
    system: Option<LinearSystem>,          // A and E, once built or loaded
    cached_radiosity: Option<Array2<f64>>, // B loaded with the system, if it was solved before
}

impl Problem {
    /// Creates a new `Problem` from a scene and an optional system cache.
    pub fn new(scene: Scene, cache: Option<SystemCache>) -> Self {
        let result = Results::new_empty(scene.len(), scene.num_luminous());
        Self {
            scene,
            result,
            cache,
            system: None,
            cached_radiosity: None,
        }
    }

    /// The coefficient tensor and emission matrix, if built.
    pub fn system(&self) -> Option<&LinearSystem> {
        self.system.as_ref()
    }

    /// Builds `A` and `E`, or loads them from the cache when the scene has
    /// been solved before. A freshly built system is persisted on its own;
    /// use [`Problem::solve`] to persist it together with its radiosity.
    pub fn build_system(&mut self) -> Result<()> {
        if self.load_or_build_system() {
            if let Some(system) = &self.system {
                self.persist(system, None);
            }
        }
        Ok(())
    }

    /// Loads the system from the cache, or builds it. Returns true if it
    /// was built by this call.
    fn load_or_build_system(&mut self) -> bool {
        if self.system.is_some() {
            return false;
        }

        let start = Instant::now();
        if let Some(cache) = &self.cache {
            let key = SceneKey::from_scene(&self.scene);
            match cache.load(&key) {
                Ok(Some(entry)) => {
                    info!(
                        "Loaded radiosity system for {} faces from {:?}",
                        key.num_faces,
                        cache.dir()
                    );
                    self.result.cache_hit = true;
                    self.cached_radiosity = entry.radiosity;
                    self.system = Some(entry.system);
                    self.result.build_time = start.elapsed();
                    return false;
                }
                Ok(None) => {}
                Err(err) => warn!("Ignoring unreadable system cache: {:#}", err),
            }
        }

        self.system = Some(LinearSystem::build(&self.scene));
        self.result.build_time = start.elapsed();
        true
    }

    /// Writes the system to the cache, if any. The cache is only a speed-up,
    /// so a failed write is reported and otherwise ignored.
    fn persist(&self, system: &LinearSystem, radiosity: Option<&Array2<f64>>) {
        if let Some(cache) = &self.cache {
            let key = SceneKey::from_scene(&self.scene);
            if let Err(err) = cache.store(&key, system, radiosity) {
                warn!("Failed to store radiosity system in cache: {:#}", err);
            }
        }
    }

    /// Solves the system for the radiosity of every face.
    pub fn solve(&mut self) -> Result<()> {
        if self.scene.is_empty() {
            bail!("Scene has no valid faces to solve for");
        }
        self.load_or_build_system();

        let system = self
            .system
            .as_ref()
            .ok_or_else(|| anyhow!("radiosity system was not built"))?;

        let start = Instant::now();
        let radiosity = match self.cached_radiosity.take() {
            Some(radiosity) => {
                info!("Reusing cached radiosity");
                radiosity
            }
            None => {
                let radiosity = solver::solve(system)?;
                self.persist(system, Some(&radiosity));
                radiosity
            }
        };

        self.result.solve_time = start.elapsed();
        self.result.radiosity = radiosity;
        info!("Solved radiosity in {:.2?}", self.result.solve_time);
        Ok(())
    }

    /// Writes the solved radiosity back into the face colors, saturated to
    /// [0, 1] and raised to `gamma`.
    pub fn apply_colors(&mut self, gamma: f64) {
        for (triangle, row) in self
            .scene
            .triangles
            .iter_mut()
            .zip(self.result.radiosity.outer_iter())
        {
            let radiosity = Vector3::new(row[0], row[1], row[2]);
            triangle.set_color(apply_gamma(&saturate_color(&radiosity), gamma));
        }
    }
}
