//! Editing state around one photo: the selected filter, its intensity and
//! the last good result.

use crate::{FilterResult, catalog::FilterKind, engine::FilterEngine, photo::Photo};

#[derive(Debug, Clone)]
pub struct EditSession {
    engine: FilterEngine,
    source: Option<Photo>,
    filtered: Option<Photo>,
    kind: FilterKind,
    intensity: f32,
}

impl EditSession {
    pub fn new(engine: FilterEngine) -> Self {
        Self {
            engine,
            source: None,
            filtered: None,
            kind: FilterKind::None,
            intensity: 1.0,
        }
    }

    /// Starts over with a new photo: no filter, full intensity.
    pub fn load(&mut self, photo: Photo) {
        log::debug!("loaded {}x{} photo", photo.width(), photo.height());

        self.source = Some(photo);
        self.filtered = None;
        self.kind = FilterKind::None;
        self.intensity = 1.0;
    }

    pub fn select_filter(&mut self, kind: FilterKind) -> FilterResult<()> {
        self.kind = kind;
        self.refresh()
    }

    pub fn set_intensity(&mut self, intensity: f32) -> FilterResult<()> {
        self.intensity = intensity;
        self.refresh()
    }

    /// Re-renders with the current selection.
    ///
    /// A failed render keeps the previous result on display.
    pub fn refresh(&mut self) -> FilterResult<()> {
        let Some(source) = &self.source else {
            return Ok(());
        };

        if self.kind == FilterKind::None {
            self.filtered = None;
            return Ok(());
        }

        match self.engine.apply(source, self.kind, self.intensity) {
            Ok(photo) => {
                self.filtered = Some(photo);
                Ok(())
            }
            Err(e) => {
                log::warn!(
                    "{} at {:.2} failed, keeping previous image: {e}",
                    self.kind.id(),
                    self.intensity
                );
                Err(e)
            }
        }
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn source(&self) -> Option<&Photo> {
        self.source.as_ref()
    }

    /// The filtered photo if there is one, otherwise the source.
    pub fn display(&self) -> Option<&Photo> {
        self.filtered.as_ref().or(self.source.as_ref())
    }

    /// Only a filtered result can be exported.
    pub fn exportable(&self) -> Option<&Photo> {
        self.filtered.as_ref()
    }

    pub fn shows_intensity_control(&self) -> bool {
        self.source.is_some() && self.kind != FilterKind::None
    }

    pub fn intensity_label(&self) -> String {
        format!("Filter Intensity: {}%", (self.intensity * 100.0) as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextConfig, RenderContext};
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    fn session() -> EditSession {
        let context = RenderContext::new(ContextConfig::new().with_worker_threads(1)).unwrap();
        EditSession::new(FilterEngine::new(Arc::new(context)))
    }

    fn photo() -> Photo {
        Photo::from_rgba(RgbaImage::from_pixel(4, 4, Rgba([200, 120, 40, 255])))
    }

    #[test]
    fn test_empty_session() {
        let mut session = session();
        assert!(session.display().is_none());
        assert!(!session.shows_intensity_control());
        assert!(session.select_filter(FilterKind::Noir).is_ok());
        assert!(session.exportable().is_none());
    }

    #[test]
    fn test_filter_then_none_clears_result() {
        let mut session = session();
        let source = photo();
        session.load(source.clone());

        session.select_filter(FilterKind::Noir).unwrap();
        assert!(session.exportable().is_some());
        assert!(!session.display().unwrap().shares_pixels_with(&source));
        assert!(session.shows_intensity_control());

        session.select_filter(FilterKind::None).unwrap();
        assert!(session.exportable().is_none());
        assert!(session.display().unwrap().shares_pixels_with(&source));
        assert!(!session.shows_intensity_control());
    }

    #[test]
    fn test_load_resets_selection() {
        let mut session = session();
        session.load(photo());
        session.select_filter(FilterKind::Sepia).unwrap();
        session.set_intensity(0.4).unwrap();

        session.load(photo());
        assert_eq!(session.kind(), FilterKind::None);
        assert_eq!(session.intensity(), 1.0);
        assert!(session.exportable().is_none());
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let mut session = session();
        session.load(photo());
        session.select_filter(FilterKind::Sepia).unwrap();
        let previous = session.exportable().cloned().unwrap();

        // NaN flows into the sepia matrix and the render is rejected
        assert!(session.set_intensity(f32::NAN).is_err());
        assert!(session.exportable().unwrap().shares_pixels_with(&previous));
    }

    #[test]
    fn test_intensity_label() {
        let mut session = session();
        assert_eq!(session.intensity_label(), "Filter Intensity: 100%");

        session.set_intensity(0.756).unwrap();
        assert_eq!(session.intensity_label(), "Filter Intensity: 75%");
    }
}
