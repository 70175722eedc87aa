//! Latest-wins rendering for interactive previews.
//!
//! Dragging an intensity slider issues renders faster than they finish. Each
//! new render cancels the one before it, so only the most recent request ever
//! produces an image.

use crate::{
    FilterError, FilterResult, catalog::FilterKind, context::CancelToken, engine::FilterEngine,
    photo::Photo,
};
use std::sync::Mutex;

#[derive(Debug)]
pub struct PreviewRenderer {
    engine: FilterEngine,
    current: Mutex<CancelToken>,
}

impl PreviewRenderer {
    pub fn new(engine: FilterEngine) -> Self {
        Self {
            engine,
            current: Mutex::new(CancelToken::new()),
        }
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    /// Renders `kind` at `intensity`, superseding any render still in flight.
    ///
    /// Returns [`FilterError::Cancelled`] if a newer render or [`Self::cancel`]
    /// arrived before this one finished.
    pub fn render(&self, photo: &Photo, kind: FilterKind, intensity: f32) -> FilterResult<Photo> {
        let token = self.supersede();
        let result = self.engine.apply_with_cancel(photo, kind, intensity, &token);

        if token.is_cancelled() {
            log::trace!("dropping superseded {} preview at {intensity:.2}", kind.id());
            return Err(FilterError::Cancelled);
        }

        result
    }

    /// Cancels the render in flight, if any.
    pub fn cancel(&self) {
        self.lock().cancel();
    }

    fn supersede(&self) -> CancelToken {
        let mut current = self.lock();
        current.cancel();
        *current = CancelToken::new();
        current.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CancelToken> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
