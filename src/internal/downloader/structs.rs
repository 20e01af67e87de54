pub mod chunk_plan;
pub mod download_hooks_container;
pub mod download_progress;
pub mod fetched_chunk;
pub(crate) mod hook_adapters;
pub mod pipeline_outcome;

pub use chunk_plan::{ChunkPlan, ChunkWindow};
pub use download_hooks_container::DownloadHooksContainer;
pub use download_progress::DownloadProgress;
pub use fetched_chunk::{ArtifactSlot, ChunkFailure, FetchedChunk};
pub use pipeline_outcome::{DownloadReport, PipelineOutcome};
