//! Year-recap video generation.
//!
//! The pipeline splits into a pure half and an effectful half. Scene
//! construction is deterministic: the same entries and year always produce
//! the same card list. Execution supervises an external ffmpeg process (or a
//! simulated stand-in) with progress reporting and immediate cancellation,
//! while the job tracker ties running renders to their request ids.

mod ffmpeg;
mod job;
mod pipeline;
mod scene;

pub use job::JobTracker;
pub use pipeline::{RenderOutcome, RenderPipeline, RendererKind, artifact_name};
pub use scene::{SECS_PER_CARD, SceneSpec, TextCard};
