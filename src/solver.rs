//! Dense solve of the radiosity system, one color channel at a time.
//!
//! Each channel `c` is the independent system `A[:, :, c] . B[:, c] = E[:, c]`
//! and is solved with an LU decomposition. The three channels run as
//! separate rayon tasks. A singular or non-finite channel aborts the whole
//! solve; no partial radiosity is ever returned.

use anyhow::{anyhow, Result};
use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::Array2;
use rayon::prelude::*;

use crate::system::{LinearSystem, NUM_CHANNELS};


/// Solves every channel of the system, returning the `(n, 3)` radiosity matrix.
pub fn solve(system: &LinearSystem) -> Result<Array2<f64>> {
    let n = system.num_faces();

    let channels = (0..NUM_CHANNELS)
        .into_par_iter()
        .map(|c| solve_channel(system, c))
        .collect::<Result<Vec<_>>>()?;

    let mut b = Array2::<f64>::zeros((n, NUM_CHANNELS));
    for (c, x) in channels.iter().enumerate() {
        for (i, value) in x.iter().enumerate() {
            b[[i, c]] = *value;
        }
    }

    Ok(b)
}

fn solve_channel(system: &LinearSystem, c: usize) -> Result<DVector<f64>> {
    let n = system.num_faces();
    let a = DMatrix::from_fn(n, n, |i, j| system.a[[i, j, c]]);
    let e = DVector::from_fn(n, |i, _| system.e[[i, c]]);

    let x = a
        .lu()
        .solve(&e)
        .ok_or_else(|| anyhow!("radiosity system is singular in channel {}", c))?;

    if x.iter().any(|value| !value.is_finite()) {
        return Err(anyhow!(
            "radiosity system is numerically unstable in channel {}",
            c
        ));
    }

    debug!("channel {} solved for {} faces", c, n);
    Ok(x)
}
