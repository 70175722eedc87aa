pub mod catalog;
pub mod context;
pub mod dispatch;
pub mod effects;
pub mod engine;
pub mod graph;
pub mod photo;
pub mod preview;
pub mod session;

pub use catalog::{FilterCatalog, FilterClass, FilterKind};
pub use context::{CancelToken, ContextConfig, RenderContext};
pub use engine::{EngineConfig, FilterEngine, IntensityPolicy};
pub use graph::{Extent, Node};
pub use photo::{Orientation, Photo};
pub use preview::PreviewRenderer;
pub use session::EditSession;

pub type FilterResult<T> = Result<T, FilterError>;

#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Render cancelled")]
    Cancelled,

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Builds a pixel graph node from an input node.
///
/// Implementations only describe the transform; pixels are touched when a
/// [`RenderContext`] evaluates the resulting graph.
pub trait Effect {
    fn build(&self, input: Node) -> Node;
}
