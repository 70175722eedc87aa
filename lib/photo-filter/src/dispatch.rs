//! `FilterKind -> (FilterClass, node constructor)` table.
//!
//! [`entry`] matches exhaustively, so a new kind does not compile until it has
//! a constructor here.

use crate::{
    Effect,
    catalog::{FilterClass, FilterKind},
    effects::{BloomConfig, PhotoEffect, PhotoEffectConfig, SepiaConfig, SharpenConfig},
    graph::Node,
};

pub type BuildFn = fn(Node, f32) -> Node;

#[derive(Clone, Copy)]
pub struct FilterEntry {
    pub kind: FilterKind,
    pub class: FilterClass,
    build: BuildFn,
}

impl FilterEntry {
    /// Builds the filter node for `input`. Binary kinds ignore `intensity`.
    pub fn build(&self, input: Node, intensity: f32) -> Node {
        (self.build)(input, intensity)
    }
}

impl std::fmt::Debug for FilterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEntry")
            .field("kind", &self.kind)
            .field("class", &self.class)
            .finish()
    }
}

const fn entry(kind: FilterKind) -> FilterEntry {
    let build: BuildFn = match kind {
        FilterKind::None => build_identity,
        FilterKind::Sepia => build_sepia,
        FilterKind::Bloom => build_bloom,
        FilterKind::Sharpen => build_sharpen,
        FilterKind::Noir => build_noir,
        FilterKind::Chrome => build_chrome,
        FilterKind::Fade => build_fade,
        FilterKind::Instant => build_instant,
        FilterKind::Process => build_process,
        // vintage shares the transfer look
        FilterKind::Vintage | FilterKind::Transfer => build_transfer,
    };

    FilterEntry {
        kind,
        class: kind.class(),
        build,
    }
}

/// Indexed by the kind's numeric id.
pub static DISPATCH_TABLE: [FilterEntry; FilterKind::COUNT] = [
    entry(FilterKind::None),
    entry(FilterKind::Sepia),
    entry(FilterKind::Noir),
    entry(FilterKind::Vintage),
    entry(FilterKind::Chrome),
    entry(FilterKind::Fade),
    entry(FilterKind::Instant),
    entry(FilterKind::Process),
    entry(FilterKind::Transfer),
    entry(FilterKind::Bloom),
    entry(FilterKind::Sharpen),
];

pub fn lookup(kind: FilterKind) -> &'static FilterEntry {
    &DISPATCH_TABLE[u8::from(kind) as usize]
}

fn build_identity(input: Node, _intensity: f32) -> Node {
    input
}

fn build_sepia(input: Node, intensity: f32) -> Node {
    SepiaConfig::new().with_intensity(intensity).build(input)
}

fn build_bloom(input: Node, intensity: f32) -> Node {
    BloomConfig::from_intensity(intensity).build(input)
}

fn build_sharpen(input: Node, intensity: f32) -> Node {
    SharpenConfig::from_intensity(intensity).build(input)
}

fn build_photo_effect(input: Node, effect: PhotoEffect) -> Node {
    PhotoEffectConfig::new().with_effect(effect).build(input)
}

fn build_noir(input: Node, _intensity: f32) -> Node {
    build_photo_effect(input, PhotoEffect::Noir)
}

fn build_chrome(input: Node, _intensity: f32) -> Node {
    build_photo_effect(input, PhotoEffect::Chrome)
}

fn build_fade(input: Node, _intensity: f32) -> Node {
    build_photo_effect(input, PhotoEffect::Fade)
}

fn build_instant(input: Node, _intensity: f32) -> Node {
    build_photo_effect(input, PhotoEffect::Instant)
}

fn build_process(input: Node, _intensity: f32) -> Node {
    build_photo_effect(input, PhotoEffect::Process)
}

fn build_transfer(input: Node, _intensity: f32) -> Node {
    build_photo_effect(input, PhotoEffect::Transfer)
}
