use crate::{Effect, graph::Node};
use derivative::Derivative;
use derive_setters::Setters;

/// Soft glow around bright areas.
///
/// `radius` is the sigma of the glow blur, `intensity` the screen-blend weight.
#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct BloomConfig {
    #[derivative(Default(value = "0.5"))]
    intensity: f32,

    #[derivative(Default(value = "10.0"))]
    radius: f32,
}

impl BloomConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Radius widens with intensity: `radius = 10 * intensity`.
    pub fn from_intensity(intensity: f32) -> Self {
        Self::new()
            .with_intensity(intensity)
            .with_radius(10.0 * intensity)
    }
}

impl Effect for BloomConfig {
    fn build(&self, input: Node) -> Node {
        input.bloom(self.radius, self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_follows_intensity() {
        let config = BloomConfig::from_intensity(0.3);
        assert!((config.radius - 3.0).abs() < 1e-6);
        assert_eq!(config.intensity, 0.3);
    }
}
