use crate::{
    Effect,
    graph::{ColorMatrix, Node, ToneCurve},
};
use derivative::Derivative;
use derive_setters::Setters;

/// Fixed film-style looks. None of them take a strength parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoEffect {
    Noir,
    Chrome,
    Fade,
    Instant,
    Process,
    Transfer,
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct PhotoEffectConfig {
    #[derivative(Default(value = "PhotoEffect::Noir"))]
    effect: PhotoEffect,
}

impl PhotoEffectConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Effect for PhotoEffectConfig {
    fn build(&self, input: Node) -> Node {
        let (matrix, curve) = match self.effect {
            PhotoEffect::Noir => noir(),
            PhotoEffect::Chrome => chrome(),
            PhotoEffect::Fade => fade(),
            PhotoEffect::Instant => instant(),
            PhotoEffect::Process => process(),
            PhotoEffect::Transfer => transfer(),
        };

        input.color_matrix(matrix).tone_curve(curve)
    }
}

// High contrast black and white
fn noir() -> (ColorMatrix, ToneCurve) {
    (
        ColorMatrix::luminance(),
        ToneCurve::new(vec![
            (0.0, 0.0),
            (0.25, 0.14),
            (0.5, 0.5),
            (0.75, 0.86),
            (1.0, 1.0),
        ]),
    )
}

// Punchy saturated color
fn chrome() -> (ColorMatrix, ToneCurve) {
    (
        ColorMatrix::saturation(1.3),
        ToneCurve::new(vec![(0.0, 0.0), (0.25, 0.21), (0.75, 0.79), (1.0, 1.0)]),
    )
}

// Washed out: lifted blacks, dimmed whites
fn fade() -> (ColorMatrix, ToneCurve) {
    (
        ColorMatrix::saturation(0.7),
        ToneCurve::new(vec![(0.0, 0.12), (1.0, 0.94)]),
    )
}

// Warm, slightly faded print
fn instant() -> (ColorMatrix, ToneCurve) {
    (
        ColorMatrix::saturation(0.85).then(&ColorMatrix::channel_gains(1.06, 1.0, 0.88)),
        ToneCurve::new(vec![(0.0, 0.06), (0.5, 0.52), (1.0, 0.97)]),
    )
}

// Cool, teal-leaning shadows
fn process() -> (ColorMatrix, ToneCurve) {
    (
        ColorMatrix::channel_gains(0.92, 1.02, 1.08).with_bias(0.0, 0.01, 0.03),
        ToneCurve::new(vec![(0.0, 0.04), (0.5, 0.48), (1.0, 1.0)]),
    )
}

// Warm vintage film
fn transfer() -> (ColorMatrix, ToneCurve) {
    (
        ColorMatrix::saturation(0.75).then(&ColorMatrix::channel_gains(1.08, 1.0, 0.86)),
        ToneCurve::new(vec![(0.0, 0.08), (0.5, 0.52), (1.0, 0.95)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(effect: PhotoEffect, pixel: [f32; 4]) -> [f32; 4] {
        let (matrix, curve) = match effect {
            PhotoEffect::Noir => noir(),
            PhotoEffect::Chrome => chrome(),
            PhotoEffect::Fade => fade(),
            PhotoEffect::Instant => instant(),
            PhotoEffect::Process => process(),
            PhotoEffect::Transfer => transfer(),
        };

        let mut pixel = pixel;
        matrix.apply(&mut pixel);
        curve.apply(&mut pixel);
        pixel
    }

    #[test]
    fn test_noir_is_gray() {
        let pixel = run(PhotoEffect::Noir, [0.8, 0.2, 0.4, 1.0]);
        assert!((pixel[0] - pixel[1]).abs() < 1e-6);
        assert!((pixel[1] - pixel[2]).abs() < 1e-6);
    }

    #[test]
    fn test_fade_lifts_black() {
        let pixel = run(PhotoEffect::Fade, [0.0, 0.0, 0.0, 1.0]);
        assert!(pixel[0] > 0.1 && pixel[1] > 0.1 && pixel[2] > 0.1);
    }

    #[test]
    fn test_warm_effects_favor_red() {
        for effect in [PhotoEffect::Instant, PhotoEffect::Transfer] {
            let pixel = run(effect, [0.5, 0.5, 0.5, 1.0]);
            assert!(pixel[0] > pixel[2], "{effect:?} should be warm");
        }

        let pixel = run(PhotoEffect::Process, [0.5, 0.5, 0.5, 1.0]);
        assert!(pixel[2] > pixel[0]);
    }

    #[test]
    fn test_alpha_untouched() {
        for effect in [
            PhotoEffect::Noir,
            PhotoEffect::Chrome,
            PhotoEffect::Fade,
            PhotoEffect::Instant,
            PhotoEffect::Process,
            PhotoEffect::Transfer,
        ] {
            assert_eq!(run(effect, [0.3, 0.6, 0.2, 0.7])[3], 0.7);
        }
    }
}
