//! Core library surface for the favorite places application: the SQLite place
//! store, reverse geocoding, configuration, and the two front-ends (command
//! line and TUI) that drive them.
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod geocode;
pub mod models;
pub mod ui;

/// Persistence layer entry points.
pub use db::{PlaceStore, SCHEMA_VERSION};
pub use error::{StoreError, StoreResult};

/// Domain types that other layers manipulate.
pub use models::{Coordinate, NewPlace, Place, PlaceId};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
