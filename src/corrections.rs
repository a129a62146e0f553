use nalgebra::Vector3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate_clamps_each_channel() {
        let color = saturate_color(&Vector3::new(-0.2, 0.4, 1.7));
        assert_eq!(color, Vector3::new(0.0, 0.4, 1.0));
    }

    #[test]
    fn gamma_is_elementwise_power() {
        let color = apply_gamma(&Vector3::new(0.25, 1.0, 0.0), 0.5);
        assert_eq!(color, Vector3::new(0.5, 1.0, 0.0));

        let unchanged = apply_gamma(&Vector3::new(0.3, 0.6, 0.9), 1.0);
        assert_eq!(unchanged, Vector3::new(0.3, 0.6, 0.9));
    }
}

/// Clamps every channel of a color into [0, 1].
pub fn saturate_color(color: &Vector3<f64>) -> Vector3<f64> {
    color.map(|c| c.clamp(0.0, 1.0))
}

/// Raises every channel to the power `gamma`.
pub fn apply_gamma(color: &Vector3<f64>, gamma: f64) -> Vector3<f64> {
    color.map(|c| c.powf(gamma))
}
