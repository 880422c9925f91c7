//! Persistence for saved places, split into connection/schema handling and
//! the row-level operations on the `places` table.

mod connection;
mod places;

pub use connection::{PlaceStore, SCHEMA_VERSION};
