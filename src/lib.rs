#![warn(missing_docs)]
//! Synthetic sound speed profiles from the Global Real-Time Ocean Forecast System (RTOFS).
//!
//! RTOFS publishes a daily global grid of potential temperature and salinity. This crate loads
//! the run of a given day, finds for a position the nearest grid node holding data at each depth
//! level, converts the samples to in-situ temperature and computes the speed of sound through
//! the water column.
//!
//! ```rust,no_run
//! use rtofs_atlas::{parse_query_date, AtlasConfig, Rtofs};
//!
//! let mut rtofs = Rtofs::new(AtlasConfig::default())?;
//! let date = parse_query_date("2024-05-10")?;
//!
//! if let Some(profiles) = rtofs.query(43.0, -70.0, date)? {
//!     for row in profiles.iter().flat_map(|p| p.top_down()) {
//!         println!("{:?}", row);
//!     }
//! }
//! # Ok::<(), rtofs_atlas::AtlasError>(())
//! ```
//!
//! The grid can also be served from memory, see [`MemoryProvider`].

//
// API
//
pub use crate::{
    atlas::{parse_query_date, Rtofs, DESCRIPTION, NAME},
    config::AtlasConfig,
    error::{AtlasError, Result},
    grid::{
        Availability, Cube, GridField, GridPair, GridProvider, GridVariable, MemoryProvider,
        MemoryVariable, OpendapProvider, OpendapVariable, WindowRead,
    },
    locator::{LevelScan, Located, NodeSample},
    oceanography::Decibars,
    progress::{NoProgress, ProgressEvent, ProgressReporter, RecordingProgress, TracingProgress},
    session::{GridCache, GridGeometry, GridSession},
    ssp::{DataRow, ProbeType, ProfileList, ProfileMeta, SensorType, SoundSpeedProfile},
    window::LonSpans,
};

#[doc(hidden)]
pub use crate::ssp::doctest;

pub mod geodesy;
pub mod grid;
pub mod locator;
pub mod oceanography;
pub mod profile;
pub mod utility;
pub mod window;

//
// Internal use only
//
mod atlas;
mod config;
mod error;
mod progress;
mod session;
mod ssp;
