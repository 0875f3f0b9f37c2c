//! Durable contact registry for the SMS consent gateway.
//!
//! Contacts are keyed by canonical phone number, carry a consent state and
//! an optional display name, and every mutation is paired with an
//! append-only audit entry and a synchronous refresh of the export
//! artifacts consumed by the bulk-send tool.

mod error;
mod export;
mod persist;
mod registry;
mod store;
mod types;

pub use error::StoreError;
pub use export::{csv_field, ExportSink};
pub use persist::{FileStore, MemoryStore, Persistence};
pub use registry::ContactRegistry;
pub use store::ContactStore;
pub use types::*;
