//! Tickscope Cache Layer
//!
//! - **DataCache**: file id → loaded ticks, index, summary and distributions
//! - **TickStore**: async loader front end with one load per file in flight
//!
//! # Architecture
//!
//! ```text
//! TickStore::query(file, [7s, 16s])
//!        ↓
//! DataCache hit? ──no──→ TickLoader::load → FileCacheEntry::build → put
//!        ↓ yes
//! TimeBucketIndex::query_range → Vec<TickRecord>
//! ```

mod data_cache;
mod store;

pub use data_cache::{DataCache, FileCacheEntry};
pub use store::TickStore;
