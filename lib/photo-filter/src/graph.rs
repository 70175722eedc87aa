//! Lazy pixel graph.
//!
//! A [`Node`] only describes a transform. Building one never reads or writes
//! pixels; [`crate::RenderContext::render`] evaluates the graph into a buffer.
//! Inputs are reference counted, so a sub-graph (typically the source) can
//! feed several nodes.

use crate::{FilterError, FilterResult};
use image::{DynamicImage, Rgba32FImage};
use std::sync::Arc;

/// Rec.709 luma weights.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Source(Arc<Rgba32FImage>),
    ColorMatrix {
        input: Arc<Node>,
        matrix: ColorMatrix,
    },
    ToneCurve {
        input: Arc<Node>,
        curve: ToneCurve,
    },
    Bloom {
        input: Arc<Node>,
        radius: f32,
        intensity: f32,
    },
    SharpenLuminance {
        input: Arc<Node>,
        radius: f32,
        sharpness: f32,
    },
    /// Replaces alpha with a constant, RGB passes through.
    ConstantAlpha {
        input: Arc<Node>,
        alpha: f32,
    },
    /// Straight-alpha source-over compositing.
    SourceOver {
        foreground: Arc<Node>,
        background: Arc<Node>,
    },
}

impl Node {
    pub fn source(image: Rgba32FImage) -> Self {
        Node::Source(Arc::new(image))
    }

    /// Turns a decoded image into a graph source.
    pub fn decode(image: &DynamicImage) -> FilterResult<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(FilterError::Decode(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let buffer = match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_) => image.to_rgba32f(),
            other => {
                return Err(FilterError::Decode(format!(
                    "unsupported pixel layout {:?}",
                    other.color()
                )));
            }
        };

        if buffer.iter().any(|sample| !sample.is_finite()) {
            return Err(FilterError::Decode(
                "image contains non-finite samples".to_string(),
            ));
        }

        Ok(Node::source(buffer))
    }

    pub fn color_matrix(self, matrix: ColorMatrix) -> Self {
        Node::ColorMatrix {
            input: Arc::new(self),
            matrix,
        }
    }

    pub fn tone_curve(self, curve: ToneCurve) -> Self {
        Node::ToneCurve {
            input: Arc::new(self),
            curve,
        }
    }

    pub fn bloom(self, radius: f32, intensity: f32) -> Self {
        Node::Bloom {
            input: Arc::new(self),
            radius,
            intensity,
        }
    }

    pub fn sharpen_luminance(self, radius: f32, sharpness: f32) -> Self {
        Node::SharpenLuminance {
            input: Arc::new(self),
            radius,
            sharpness,
        }
    }

    pub fn constant_alpha(self, alpha: f32) -> Self {
        Node::ConstantAlpha {
            input: Arc::new(self),
            alpha,
        }
    }

    /// Composites `self` over `background`.
    ///
    /// Returns `None` when the two extents differ.
    pub fn source_over(self, background: Node) -> Option<Self> {
        if self.extent() != background.extent() {
            return None;
        }

        Some(Node::SourceOver {
            foreground: Arc::new(self),
            background: Arc::new(background),
        })
    }

    pub fn extent(&self) -> Extent {
        match self {
            Node::Source(image) => Extent::new(image.width(), image.height()),
            Node::SourceOver { foreground, .. } => foreground.extent(),
            Node::ColorMatrix { input, .. }
            | Node::ToneCurve { input, .. }
            | Node::Bloom { input, .. }
            | Node::SharpenLuminance { input, .. }
            | Node::ConstantAlpha { input, .. } => input.extent(),
        }
    }

    pub fn inputs(&self) -> Vec<&Node> {
        match self {
            Node::Source(_) => vec![],
            Node::SourceOver {
                foreground,
                background,
            } => vec![foreground.as_ref(), background.as_ref()],
            Node::ColorMatrix { input, .. }
            | Node::ToneCurve { input, .. }
            | Node::Bloom { input, .. }
            | Node::SharpenLuminance { input, .. }
            | Node::ConstantAlpha { input, .. } => vec![input.as_ref()],
        }
    }

    /// True if this node or any node feeding it matches `predicate`.
    pub fn any(&self, predicate: &dyn Fn(&Node) -> bool) -> bool {
        predicate(self) || self.inputs().into_iter().any(|input| input.any(predicate))
    }

    /// True if the graph performs alpha-rewrite compositing.
    pub fn is_blended(&self) -> bool {
        self.any(&|node: &Node| matches!(node, Node::ConstantAlpha { .. } | Node::SourceOver { .. }))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Node::Source(_) => "source",
            Node::ColorMatrix { .. } => "color-matrix",
            Node::ToneCurve { .. } => "tone-curve",
            Node::Bloom { .. } => "bloom",
            Node::SharpenLuminance { .. } => "sharpen-luminance",
            Node::ConstantAlpha { .. } => "constant-alpha",
            Node::SourceOver { .. } => "source-over",
        }
    }
}

/// Affine RGBA transform: each output channel is a weighted sum of the four
/// input channels plus a bias (last column).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    rows: [[f32; 5]; 4],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    pub const fn new(rows: [[f32; 5]; 4]) -> Self {
        Self { rows }
    }

    pub const fn identity() -> Self {
        Self::new([
            [1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// 0.0 is fully desaturated, 1.0 is identity.
    pub fn saturation(amount: f32) -> Self {
        let mut rows = Self::identity().rows;
        for (channel, row) in rows.iter_mut().take(3).enumerate() {
            for (index, weight) in LUMA_WEIGHTS.iter().enumerate() {
                let keep = if index == channel { amount } else { 0.0 };
                row[index] = (1.0 - amount) * weight + keep;
            }
        }
        Self::new(rows)
    }

    pub fn luminance() -> Self {
        Self::saturation(0.0)
    }

    /// Maps luminance onto a tint, `tone` is the color white turns into.
    pub fn tinted_luminance(tone: [f32; 3]) -> Self {
        let mut rows = Self::identity().rows;
        for (channel, row) in rows.iter_mut().take(3).enumerate() {
            for (index, weight) in LUMA_WEIGHTS.iter().enumerate() {
                row[index] = tone[channel] * weight;
            }
        }
        Self::new(rows)
    }

    pub fn channel_gains(r: f32, g: f32, b: f32) -> Self {
        let mut rows = Self::identity().rows;
        rows[0][0] = r;
        rows[1][1] = g;
        rows[2][2] = b;
        Self::new(rows)
    }

    pub fn with_bias(mut self, r: f32, g: f32, b: f32) -> Self {
        self.rows[0][4] += r;
        self.rows[1][4] += g;
        self.rows[2][4] += b;
        self
    }

    /// Linear interpolation between two matrices, `t = 0` gives `self`.
    pub fn lerp(&self, other: &ColorMatrix, t: f32) -> Self {
        let mut rows = self.rows;
        for (row, other_row) in rows.iter_mut().zip(other.rows.iter()) {
            for (value, target) in row.iter_mut().zip(other_row.iter()) {
                *value += (target - *value) * t;
            }
        }
        Self::new(rows)
    }

    /// Matrix equivalent to applying `self` and then `next`.
    pub fn then(&self, next: &ColorMatrix) -> Self {
        let mut rows = [[0.0; 5]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            for k in 0..5 {
                let mut sum: f32 = (0..4).map(|j| next.rows[i][j] * self.rows[j][k]).sum();
                if k == 4 {
                    sum += next.rows[i][4];
                }
                row[k] = sum;
            }
        }
        Self::new(rows)
    }

    pub fn apply(&self, pixel: &mut [f32]) {
        let input = [pixel[0], pixel[1], pixel[2], pixel[3]];
        for (out, row) in pixel.iter_mut().zip(self.rows.iter()) {
            *out = row[0] * input[0] + row[1] * input[1] + row[2] * input[2] + row[3] * input[3]
                + row[4];
        }
    }
}

/// Piecewise-linear curve applied to the RGB channels.
///
/// Inputs outside the first/last control point take the end values.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneCurve {
    points: Vec<(f32, f32)>,
}

impl Default for ToneCurve {
    fn default() -> Self {
        Self::new(vec![(0.0, 0.0), (1.0, 1.0)])
    }
}

impl ToneCurve {
    pub fn new(mut points: Vec<(f32, f32)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    pub fn eval(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return x;
        };

        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        for pair in self.points.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            if x <= x1 {
                let span = x1 - x0;
                if span <= f32::EPSILON {
                    return y1;
                }
                return y0 + (y1 - y0) * (x - x0) / span;
            }
        }

        last.1
    }

    pub fn apply(&self, pixel: &mut [f32]) {
        for value in pixel.iter_mut().take(3) {
            *value = self.eval(*value);
        }
    }
}
