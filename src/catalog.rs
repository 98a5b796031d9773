//! Catalog data model, the joined side-table snapshot, and the read-only
//! collaborators that supply them.

pub mod item;
pub mod memory;
pub mod snapshot;
pub mod source;

pub use self::item::*;
pub use self::memory::MemoryCatalog;
pub use self::snapshot::CatalogSnapshot;
pub use self::source::*;
