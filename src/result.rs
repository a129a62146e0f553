use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use ndarray::Array2;
use serde::Serialize;

use crate::system::NUM_CHANNELS;

/// Outcome of a radiosity run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Results {
    pub num_faces: usize,
    pub num_luminous: usize,
    pub radiosity: Array2<f64>, // (n, channels), one row per face in scene order
    pub cache_hit: bool,
    pub build_time: Duration,
    pub solve_time: Duration,
    pub created: DateTime<Local>,
}

impl Results {
    /// Creates empty results for a scene of `num_faces` faces.
    pub fn new_empty(num_faces: usize, num_luminous: usize) -> Self {
        Self {
            num_faces,
            num_luminous,
            radiosity: Array2::zeros((num_faces, NUM_CHANNELS)),
            cache_hit: false,
            build_time: Duration::ZERO,
            solve_time: Duration::ZERO,
            created: Local::now(),
        }
    }

    /// Mean radiosity per channel over all faces.
    pub fn mean_radiosity(&self) -> [f64; NUM_CHANNELS] {
        let mut mean = [0.0; NUM_CHANNELS];
        if self.num_faces == 0 {
            return mean;
        }
        for (c, value) in mean.iter_mut().enumerate() {
            *value = self.radiosity.column(c).sum() / self.num_faces as f64;
        }
        mean
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mean = self.mean_radiosity();
        write!(
            f,
            "Results:
  - Faces: {}
  - Luminous Faces: {}
  - Mean Radiosity: [{:.6}, {:.6}, {:.6}]
  - Cache Hit: {}
  - Build Time: {:.2?}
  - Solve Time: {:.2?}
  ",
            self.num_faces,
            self.num_luminous,
            mean[0],
            mean[1],
            mean[2],
            self.cache_hit,
            self.build_time,
            self.solve_time,
        )
    }
}
