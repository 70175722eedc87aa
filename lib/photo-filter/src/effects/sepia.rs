use crate::{
    Effect,
    graph::{ColorMatrix, Node},
};
use derivative::Derivative;
use derive_setters::Setters;

/// Color white is mapped to at full strength.
pub const SEPIA_TONE: [f32; 3] = [1.0, 0.89, 0.71];

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SepiaConfig {
    #[derivative(Default(value = "1.0"))]
    intensity: f32,
}

impl SepiaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matrix(&self) -> ColorMatrix {
        ColorMatrix::identity().lerp(&ColorMatrix::tinted_luminance(SEPIA_TONE), self.intensity)
    }
}

impl Effect for SepiaConfig {
    fn build(&self, input: Node) -> Node {
        input.color_matrix(self.matrix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sepia_on_white() {
        let mut pixel = [1.0, 1.0, 1.0, 1.0];
        SepiaConfig::new().matrix().apply(&mut pixel);

        assert!((pixel[0] - SEPIA_TONE[0]).abs() < 1e-5);
        assert!((pixel[1] - SEPIA_TONE[1]).abs() < 1e-5);
        assert!((pixel[2] - SEPIA_TONE[2]).abs() < 1e-5);
        assert_eq!(pixel[3], 1.0);
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let mut pixel = [0.3, 0.6, 0.9, 0.5];
        SepiaConfig::new().with_intensity(0.0).matrix().apply(&mut pixel);
        assert_eq!(pixel, [0.3, 0.6, 0.9, 0.5]);
    }
}
