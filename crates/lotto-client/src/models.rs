pub mod draw_row;
pub mod schema;
pub mod sync_meta;

pub use draw_row::DrawRow;
pub use sync_meta::{MetaEntry, SyncState};
