//! Assembly of the radiosity linear system `A . B = E`.
//!
//! For a scene of `n` faces the system is stored as a coefficient tensor `A`
//! of shape `(n, n, 3)` and an emission matrix `E` of shape `(n, 3)`, one
//! independent `n x n` system per color channel:
//!
//! ```text
//! A[i, j, c] = delta_ij - |rho_i[c] F_ij|
//! E[i, c]    = 1 if face i is luminous, else 0
//! ```
//!
//! where `rho_i` is the color of face `i` and `F_ij` its shape factor to `j`.
//!
//! Building `A` takes `n^2` shape factors, each of which scans all `n` faces
//! for occluders, so the cost grows as `n^3`. Rows are independent and are
//! computed in parallel; scenes beyond a few thousand faces remain
//! impractical.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use ndarray::{Array2, Array3};
use rayon::prelude::*;

use crate::config::PROGRESS_TEMPLATE;
use crate::scene::Scene;
use crate::shape_factor::shape_factor;

/// Number of color channels solved independently.
pub const NUM_CHANNELS: usize = 3;


/// Coefficient tensor and emission matrix of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    pub a: Array3<f64>, // (n, n, channels)
    pub e: Array2<f64>, // (n, channels)
}

impl LinearSystem {
    /// Assembles `A` and `E` for every ordered pair of faces in the scene.
    pub fn build(scene: &Scene) -> Self {
        let start = Instant::now();
        let n = scene.len();
        info!("Building radiosity system for {} faces...", n);

        let pb = ProgressBar::new(n as u64);
        pb.set_style(
            ProgressStyle::with_template(PROGRESS_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▇▆▅▄▃▂▁"),
        );
        pb.set_message("rows".to_string());

        // each task owns one row of A, flattened as (j, c)
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                let row = Self::coefficient_row(scene, i);
                pb.inc(1);
                row
            })
            .collect();
        pb.finish_and_clear();

        let a = Array3::from_shape_fn((n, n, NUM_CHANNELS), |(i, j, c)| {
            rows[i][j * NUM_CHANNELS + c]
        });
        let e = Self::emission(scene);

        info!("System built in {:.2?}", start.elapsed());

        Self { a, e }
    }

    /// Row `i` of `A`: `delta_ij - |rho_i[c] F_ij|` for every `j` and channel.
    fn coefficient_row(scene: &Scene, i: usize) -> Vec<f64> {
        let color = &scene.triangles[i].color;
        let mut row = Vec::with_capacity(scene.len() * NUM_CHANNELS);

        for j in 0..scene.len() {
            let factor = shape_factor(scene, i, j);
            let diagonal = if i == j { 1.0 } else { 0.0 };
            for c in 0..NUM_CHANNELS {
                row.push(diagonal - (color[c] * factor).abs());
            }
        }

        row
    }

    /// Unit emission in every channel for luminous faces.
    fn emission(scene: &Scene) -> Array2<f64> {
        let mut e = Array2::<f64>::zeros((scene.len(), NUM_CHANNELS));
        for i in scene.luminous_indices() {
            e.row_mut(i).fill(1.0);
        }
        e
    }

    /// Number of faces in the system.
    pub fn num_faces(&self) -> usize {
        self.e.nrows()
    }
}
