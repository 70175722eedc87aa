pub mod bloom;
pub mod photo_effect;
pub mod sepia;
pub mod sharpen;

pub use bloom::BloomConfig;
pub use photo_effect::{PhotoEffect, PhotoEffectConfig};
pub use sepia::SepiaConfig;
pub use sharpen::SharpenConfig;
