//! Print the RTOFS sound speed profile at a position.
//!
//! ```text
//! rtofs_query --lat 43.0 --lon -70.0 --date 2024-05-10
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=rtofs_atlas=debug`.

use std::path::PathBuf;

use clap::Parser;
use metfor::Quantity;
use rtofs_atlas::{parse_query_date, AtlasConfig, Result, Rtofs, TracingProgress};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rtofs_query")]
#[command(about = "Synthetic sound speed profile from the Global Real-Time Ocean Forecast System")]
struct Args {
    /// Latitude in degrees, north positive
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees, east positive
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Date of the forecast run, YYYY-MM-DD or YYYYMMDD (default: today, UTC)
    #[arg(long)]
    date: Option<String>,

    /// TOML configuration file
    #[arg(long, env = "RTOFS_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match args.config {
        Some(ref path) => AtlasConfig::from_file(path)?,
        None => AtlasConfig::default(),
    };
    info!("search window: {} nodes", config.search_window);

    let mut rtofs = Rtofs::new(config)?.with_progress(TracingProgress::default());

    let profiles = match args.date {
        Some(ref date) => rtofs.query(args.lat, args.lon, parse_query_date(date)?)?,
        None => rtofs.query_now(args.lat, args.lon)?,
    };

    let profiles = match profiles {
        Some(profiles) => profiles,
        None => {
            println!("no data");
            return Ok(());
        }
    };

    for profile in profiles.iter() {
        let meta = profile.meta();
        println!(
            "{} {} {}",
            meta.original_path().unwrap_or("-"),
            meta.sensor_type(),
            meta.probe_type()
        );
        if let Some((lat, lon)) = meta.location() {
            println!("position: {:.4} {:.4}", lat, lon);
        }
        println!("{:>10} {:>10} {:>10} {:>10}", "depth", "temp", "sal", "speed");

        for row in profile.top_down() {
            println!(
                "{:>10} {:>10} {:>10} {:>10}",
                fmt_value(row.depth.into_option().map(|v| v.unpack())),
                fmt_value(row.temperature.into_option().map(|v| v.unpack())),
                fmt_value(row.salinity.into_option()),
                fmt_value(row.speed.into_option().map(|v| v.unpack())),
            );
        }
    }

    Ok(())
}

fn fmt_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "-".to_owned())
}
