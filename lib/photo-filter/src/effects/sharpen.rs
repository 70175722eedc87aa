use crate::{Effect, graph::Node};
use derivative::Derivative;
use derive_setters::Setters;

/// Luminance-only sharpening (unsharp mask on luma).
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SharpenConfig {
    #[derivative(Default(value = "0.4"))]
    sharpness: f32,

    #[derivative(Default(value = "1.69"))]
    radius: f32,
}

impl SharpenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `sharpness = 2 * intensity`, radius stays at its default.
    pub fn from_intensity(intensity: f32) -> Self {
        Self::new().with_sharpness(2.0 * intensity)
    }
}

impl Effect for SharpenConfig {
    fn build(&self, input: Node) -> Node {
        input.sharpen_luminance(self.radius, self.sharpness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpness_is_doubled() {
        let config = SharpenConfig::from_intensity(0.35);
        assert!((config.sharpness - 0.7).abs() < 1e-6);
        assert_eq!(config.radius, 1.69);
    }
}
