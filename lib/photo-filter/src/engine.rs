use crate::{
    FilterResult,
    catalog::{FilterClass, FilterKind},
    context::{CancelToken, RenderContext},
    dispatch,
    graph::Node,
    photo::Photo,
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{DynamicImage, Rgba32FImage};
use std::sync::Arc;

/// What to do with intensities outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntensityPolicy {
    /// Pass the value through; native parameters and the blend alpha
    /// extrapolate. Final samples are still clamped when rendered.
    #[default]
    Extrapolate,
    /// Clamp to [0, 1] before building the graph.
    Clamp,
}

impl IntensityPolicy {
    pub fn resolve(&self, intensity: f32) -> f32 {
        match self {
            IntensityPolicy::Extrapolate => intensity,
            IntensityPolicy::Clamp => intensity.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct EngineConfig {
    #[derivative(Default(value = "IntensityPolicy::Extrapolate"))]
    pub intensity_policy: IntensityPolicy,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Applies a [`FilterKind`] at an intensity to a [`Photo`].
///
/// The engine is stateless; the shared [`RenderContext`] is the only resource
/// it touches, so one engine (or clones of it) can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    context: Arc<RenderContext>,
    config: EngineConfig,
}

impl FilterEngine {
    pub fn new(context: Arc<RenderContext>) -> Self {
        Self {
            context,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn context(&self) -> &Arc<RenderContext> {
        &self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a new photo, or the input itself for [`FilterKind::None`].
    ///
    /// Orientation and scale always match the input. On error no image is
    /// produced and the caller keeps whatever it was showing.
    pub fn apply(&self, photo: &Photo, kind: FilterKind, intensity: f32) -> FilterResult<Photo> {
        self.apply_with_cancel(photo, kind, intensity, &CancelToken::new())
    }

    pub fn apply_with_cancel(
        &self,
        photo: &Photo,
        kind: FilterKind,
        intensity: f32,
        cancel: &CancelToken,
    ) -> FilterResult<Photo> {
        if kind == FilterKind::None {
            return Ok(photo.clone());
        }

        let source = Node::decode(photo.image())?;
        let graph = self.build_graph(source, kind, intensity);
        let rendered = self.context.render(&graph, cancel)?;

        Ok(Photo::new(output_image(rendered, photo.image())).with_metadata_of(photo))
    }

    /// Builds the unrendered graph for `kind` on top of `source`.
    pub fn build_graph(&self, source: Node, kind: FilterKind, intensity: f32) -> Node {
        let intensity = self.config.intensity_policy.resolve(intensity);
        let entry = dispatch::lookup(kind);
        let filtered = entry.build(source.clone(), intensity);

        log::debug!(
            "building {} graph ({:?}) at intensity {intensity}",
            kind.id(),
            entry.class
        );

        // parametric kinds already carry intensity in their node
        if entry.class != FilterClass::Binary || intensity >= 1.0 || intensity.is_nan() {
            return filtered;
        }

        match filtered.clone().constant_alpha(intensity).source_over(source) {
            Some(blended) => blended,
            None => {
                log::warn!("cannot blend {} with its source, using full effect", kind.id());
                filtered
            }
        }
    }
}

/// Wraps the rendered buffer in the same channel depth family as `like`.
fn output_image(rendered: Rgba32FImage, like: &DynamicImage) -> DynamicImage {
    let rendered = DynamicImage::ImageRgba32F(rendered);

    match like {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => rendered,
        DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => DynamicImage::ImageRgba16(rendered.into_rgba16()),
        _ => DynamicImage::ImageRgba8(rendered.into_rgba8()),
    }
}
