use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    TryFromPrimitive,
    IntoPrimitive,
    Serialize,
    Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    #[default]
    None = 0,
    Sepia,
    Noir,
    Vintage,
    Chrome,
    Fade,
    Instant,
    Process,
    Transfer,
    Bloom,
    Sharpen,
}

/// How a filter kind realizes intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterClass {
    /// Always returns the input unchanged.
    Identity,
    /// Intensity is a native control of the effect.
    Parametric,
    /// One fixed effect, intensity is realized by blending with the original.
    Binary,
}

impl FilterKind {
    pub const COUNT: usize = 11;

    /// Stable lowercase identifier.
    pub fn id(&self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Sepia => "sepia",
            FilterKind::Noir => "noir",
            FilterKind::Vintage => "vintage",
            FilterKind::Chrome => "chrome",
            FilterKind::Fade => "fade",
            FilterKind::Instant => "instant",
            FilterKind::Process => "process",
            FilterKind::Transfer => "transfer",
            FilterKind::Bloom => "bloom",
            FilterKind::Sharpen => "sharpen",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::None => "None",
            FilterKind::Sepia => "Sepia",
            FilterKind::Noir => "Noir",
            FilterKind::Vintage => "Vintage",
            FilterKind::Chrome => "Chrome",
            FilterKind::Fade => "Fade",
            FilterKind::Instant => "Instant",
            FilterKind::Process => "Process",
            FilterKind::Transfer => "Transfer",
            FilterKind::Bloom => "Bloom",
            FilterKind::Sharpen => "Sharpen",
        }
    }

    pub const fn class(&self) -> FilterClass {
        match self {
            FilterKind::None => FilterClass::Identity,
            FilterKind::Sepia | FilterKind::Bloom | FilterKind::Sharpen => FilterClass::Parametric,
            FilterKind::Noir
            | FilterKind::Vintage
            | FilterKind::Chrome
            | FilterKind::Fade
            | FilterKind::Instant
            | FilterKind::Process
            | FilterKind::Transfer => FilterClass::Binary,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        FilterCatalog::all_kinds()
            .iter()
            .copied()
            .find(|kind| kind.id() == normalized)
            .ok_or_else(|| format!("unknown filter kind '{value}'"))
    }
}

/// Ordered list of selectable filters and their labels.
pub struct FilterCatalog;

impl FilterCatalog {
    pub fn all_kinds() -> &'static [FilterKind] {
        &[
            FilterKind::None,
            FilterKind::Sepia,
            FilterKind::Noir,
            FilterKind::Vintage,
            FilterKind::Chrome,
            FilterKind::Fade,
            FilterKind::Instant,
            FilterKind::Process,
            FilterKind::Transfer,
            FilterKind::Bloom,
            FilterKind::Sharpen,
        ]
    }

    pub fn display_name(kind: FilterKind) -> &'static str {
        kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_ids() {
        let kinds = FilterCatalog::all_kinds();
        assert_eq!(kinds.len(), FilterKind::COUNT);

        for (index, kind) in kinds.iter().enumerate() {
            assert_eq!(u8::from(*kind) as usize, index);
            assert_eq!(FilterKind::try_from(index as u8).unwrap(), *kind);
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FilterCatalog::display_name(FilterKind::None), "None");
        assert_eq!(FilterCatalog::display_name(FilterKind::Sepia), "Sepia");
        assert_eq!(FilterCatalog::display_name(FilterKind::Transfer), "Transfer");
        assert_eq!(FilterKind::Sharpen.to_string(), "Sharpen");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("bloom".parse::<FilterKind>().unwrap(), FilterKind::Bloom);
        assert_eq!(" Noir ".parse::<FilterKind>().unwrap(), FilterKind::Noir);
        assert!("polaroid".parse::<FilterKind>().is_err());
    }

    #[test]
    fn test_classes() {
        let parametric: Vec<_> = FilterCatalog::all_kinds()
            .iter()
            .filter(|kind| kind.class() == FilterClass::Parametric)
            .copied()
            .collect();
        assert_eq!(
            parametric,
            vec![FilterKind::Sepia, FilterKind::Bloom, FilterKind::Sharpen]
        );

        assert_eq!(FilterKind::None.class(), FilterClass::Identity);
        assert_eq!(FilterKind::Vintage.class(), FilterClass::Binary);
        assert!(FilterKind::try_from(11u8).is_err());
    }
}
