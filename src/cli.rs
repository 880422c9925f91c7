//! Command-line surface. Without a subcommand the binary starts the TUI; each
//! subcommand is one request against the store followed by a printed answer.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::info;

use crate::db::PlaceStore;
use crate::geocode::{suggest_name, ReverseGeocoder};
use crate::models::{Coordinate, NewPlace, Place, PlaceId};

#[derive(Parser, Debug)]
#[command(name = "favorite-places")]
#[command(version)]
#[command(about = "Save, browse and delete favorite places", long_about = None)]
pub struct Args {
    /// SQLite database file (defaults to ~/.favorite-places/FavoritePlaces.db)
    #[arg(long, env = "FAVORITE_PLACES_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Never contact the reverse geocoding service
    #[arg(long, global = true)]
    pub offline: bool,

    /// Base URL of the Nominatim instance used for reverse geocoding
    #[arg(long, env = "FAVORITE_PLACES_NOMINATIM_URL", global = true)]
    pub nominatim_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List saved places, newest first
    List {
        /// Print a JSON array instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one place
    Show { id: PlaceId },

    /// Save a new place at the given coordinate
    #[command(allow_negative_numbers = true)]
    Add {
        latitude: f64,
        longitude: f64,
        /// Name of the place (defaults to the reverse geocoded address)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Rename an existing place
    Rename { id: PlaceId, name: String },

    /// Delete a place (no error when it does not exist)
    Delete { id: PlaceId },

    /// Delete every saved place
    Clear,

    /// Print how many places are saved
    Count,
}

fn describe(place: &Place) -> String {
    format!("{:>4}  {}  ({})", place.id, place.name, place.coordinate())
}

fn require(store: &PlaceStore, id: PlaceId) -> Result<Place> {
    store
        .get_by_id(id)
        .context("failed to look up place")?
        .ok_or_else(|| anyhow!("place {id} not found"))
}

/// Execute one subcommand and write its answer to `out`.
pub fn run_command(
    command: &Command,
    store: &PlaceStore,
    geocoder: &dyn ReverseGeocoder,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::List { json } => {
            let places = store.get_all().context("failed to load places")?;
            if *json {
                serde_json::to_writer_pretty(&mut *out, &places)
                    .context("failed to encode places")?;
                writeln!(out)?;
            } else if places.is_empty() {
                writeln!(out, "No places saved yet.")?;
            } else {
                for place in &places {
                    writeln!(out, "{}", describe(place))?;
                }
            }
        }
        Command::Show { id } => {
            let place = require(store, *id)?;
            writeln!(out, "{}", describe(&place))?;
            writeln!(out, "      {}", place.coordinate().osm_url())?;
        }
        Command::Add {
            latitude,
            longitude,
            name,
        } => {
            let coordinate = Coordinate::new(*latitude, *longitude);
            let name = match name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => suggest_name(geocoder, coordinate, &Local::now()),
            };
            let id = store
                .add(&NewPlace::at(name.clone(), coordinate))
                .context("failed to save place")?;
            info!("saved place {id} from command line");
            writeln!(out, "Place added: {name} (id {id})")?;
        }
        Command::Rename { id, name } => {
            let mut place = require(store, *id)?;
            place.name = name.trim().to_string();
            let updated = store.update(&place).context("failed to rename place")?;
            if updated == 0 {
                return Err(anyhow!("place {id} not found"));
            }
            writeln!(out, "Renamed place {id} to {}", place.name)?;
        }
        Command::Delete { id } => {
            store.delete_by_id(*id).context("failed to delete place")?;
            writeln!(out, "Place deleted")?;
        }
        Command::Clear => {
            let removed = store.delete_all().context("failed to delete places")?;
            writeln!(out, "Deleted {removed} place(s)")?;
        }
        Command::Count => {
            let count = store.count().context("failed to count places")?;
            writeln!(out, "{count}")?;
        }
    }

    Ok(())
}
