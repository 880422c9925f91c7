//! Binary entry point: parse arguments, set up logging, open the place store
//! once, then either answer a single subcommand or run the TUI.
use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use favorite_places::cli::{run_command, Args};
use favorite_places::config::{init_file_logging, init_stderr_logging, Config};
use favorite_places::{run_app, App, PlaceStore};

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(args.db, args.offline, args.nominatim_url)?;

    match &args.command {
        Some(_) => init_stderr_logging(),
        None => init_file_logging(&config.log_path())?,
    }

    let store = PlaceStore::open(&config.db_path).with_context(|| {
        format!(
            "failed to open place database {}",
            config.db_path.display()
        )
    })?;
    info!("using place database {}", config.db_path.display());
    let geocoder = config.geocoder.build()?;

    match args.command {
        Some(command) => {
            let stdout = io::stdout();
            run_command(&command, &store, geocoder.as_ref(), &mut stdout.lock())
        }
        None => {
            let mut app = App::new(store, geocoder)?;
            run_app(&mut app)
        }
    }
}
