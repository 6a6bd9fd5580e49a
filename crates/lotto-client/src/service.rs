pub mod chunk;
pub mod sync;

pub use chunk::{MAX_DRAWS_PER_REQUEST, chunk_ranges};
pub use sync::{SyncMode, SyncOrchestrator, SyncReport, merge_by_draw_no};
