//! Find, level by level, the grid node nearest to a position that has data.
//!
//! The search is confined to a square window of nodes around the nearest grid index. Within the
//! window every node is a candidate at every depth level, unless its temperature or salinity is
//! missing at that level. Scanning goes from the surface down:
//!
//!   - a level with at least one valid node contributes the nearest one,
//!   - a level present in the data but fully masked inside the window is skipped,
//!   - a level absent from the data marks the bottom of valid data and ends the scan.
use crate::{
    error::{AtlasError, Result},
    geodesy,
    grid::{Cube, GridVariable},
    progress::ProgressReporter,
    session::GridSession,
    window::{lat_span, lon_spans, LonSpans},
};
use metfor::{Celsius, Meters, Quantity};
use std::ops::Range;
use tracing::{debug, info};

/// The nearest valid node at one depth level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSample {
    /// Index of the depth level in the grid.
    pub level: usize,
    /// Depth of the level.
    pub depth: Meters,
    /// Potential temperature at the node.
    pub potential_temperature: Celsius,
    /// Salinity at the node, PSU.
    pub salinity: f64,
    /// Latitude of the node.
    pub latitude: f64,
    /// Longitude of the node, in the grid's convention (east of the grid origin).
    pub longitude: f64,
    /// Distance from the query position to the node.
    pub distance: Meters,
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// One sample per level with data, shallow to deep.
    pub samples: Vec<NodeSample>,
    /// Latitude of the node representing the profile position.
    pub latitude: f64,
    /// Longitude of the node representing the profile position, grid convention.
    pub longitude: f64,
}

/// Outcome of scanning a single depth level of the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelScan {
    /// The nearest valid cell, as a row-major index into the window.
    Nearest {
        /// Row-major cell index.
        cell: usize,
        /// Distance to the query in meters.
        distance: f64,
    },
    /// The level is in the data but no cell of the window holds a value.
    AllMissing,
    /// The data has no cells at all for this level.
    Absent,
}

/// Temperature and salinity around the nearest grid index, with the node coordinates.
#[derive(Debug, Clone)]
pub struct SearchWindow {
    /// Grid rows covered by the window.
    pub rows: Range<usize>,
    /// Grid columns covered by the window.
    pub cols: LonSpans,
    /// Latitude of each window row.
    pub latitudes: Vec<f64>,
    /// Longitude of each window column, west to east.
    pub longitudes: Vec<f64>,
    /// Potential temperature, `[level, row, col]`.
    pub temperature: Cube,
    /// Salinity, `[level, row, col]`.
    pub salinity: Cube,
}

impl SearchWindow {
    /// Number of cells per level.
    #[inline]
    pub fn cells(&self) -> usize {
        self.latitudes.len() * self.longitudes.len()
    }

    /// `(latitude, longitude)` of a row-major cell index.
    #[inline]
    pub fn position(&self, cell: usize) -> (f64, f64) {
        let ncols = self.longitudes.len();
        (self.latitudes[cell / ncols], self.longitudes[cell % ncols])
    }
}

/// Read the window of `2 * half + 1` nodes centered on `(lat_idx, lon_idx)`.
///
/// When the window crosses the end of the longitude axis each variable is read in two pieces
/// that are joined west to east.
pub fn read_search_window<V: GridVariable>(
    session: &GridSession<V>,
    lat_idx: isize,
    lon_idx: isize,
    half: usize,
) -> Result<Option<SearchWindow>> {
    let geometry = session.geometry();

    let rows = match lat_span(lat_idx, half, geometry.n_lat) {
        Some(rows) => rows,
        None => return Ok(None),
    };
    let cols = lon_spans(lon_idx, half, geometry.n_lon).ok_or_else(|| {
        AtlasError::Config(format!(
            "search window of {} nodes is wider than the grid ({} columns)",
            2 * half + 1,
            geometry.n_lon
        ))
    })?;
    if cols.is_split() {
        info!("split case: {:?}", cols);
    }

    let day = session.day_index();
    let temperature = read_variable(session.temperature(), day, &rows, &cols)?;
    let salinity = read_variable(session.salinity(), day, &rows, &cols)?;

    let latitudes = session.latitudes()[rows.clone()].to_vec();
    let longitudes: Vec<f64> = cols.indexes().map(|i| session.longitudes()[i]).collect();

    for cube in &[&temperature, &salinity] {
        if cube.rows() != latitudes.len() || cube.cols() != longitudes.len() {
            return Err(AtlasError::DataAccess(format!(
                "window read returned {}x{} nodes, expected {}x{}",
                cube.rows(),
                cube.cols(),
                latitudes.len(),
                longitudes.len()
            )));
        }
    }

    Ok(Some(SearchWindow {
        rows,
        cols,
        latitudes,
        longitudes,
        temperature,
        salinity,
    }))
}

fn read_variable<V: GridVariable>(
    var: &V,
    day: usize,
    rows: &Range<usize>,
    cols: &LonSpans,
) -> Result<Cube> {
    match cols {
        LonSpans::Contiguous(cols) => var.read_window(day, rows.clone(), cols.clone()),
        LonSpans::Split { left, right } => {
            let left = var.read_window(day, rows.clone(), left.clone())?;
            let right = var.read_window(day, rows.clone(), right.clone())?;
            Cube::concat_columns(&left, &right)
        }
    }
}

/// Distance in meters from `(lat, lon)` to every node of the window, row-major. The same
/// distances hold at every level.
pub fn node_distances(window: &SearchWindow, lat: f64, lon: f64) -> Vec<f64> {
    (0..window.cells())
        .map(|cell| {
            let (node_lat, node_lon) = window.position(cell);
            geodesy::distance(node_lon, node_lat, lon, lat).unpack()
        })
        .collect()
}

/// Find the nearest cell of `level` where both temperature and salinity hold a value.
pub fn scan_level(window: &SearchWindow, distances: &[f64], level: usize) -> LevelScan {
    let temperature = window.temperature.level(level);
    let salinity = window.salinity.level(level);

    if temperature.is_empty() || salinity.is_empty() {
        return LevelScan::Absent;
    }

    temperature
        .iter()
        .zip(salinity)
        .zip(distances)
        .enumerate()
        .filter(|(_, ((t, s), d))| t.is_some() && s.is_some() && d.is_finite())
        .map(|(cell, (_, &d))| (cell, d))
        // min_by keeps the first of equal candidates
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(cell, distance)| LevelScan::Nearest { cell, distance })
        .unwrap_or(LevelScan::AllMissing)
}

/// Search the session around `(lat, lon)` for the nearest valid node at each level.
///
/// Fails with `NoDataAtLocation` when no level yields a sample.
pub fn nearest_nodes<V: GridVariable>(
    session: &GridSession<V>,
    lat: f64,
    lon: f64,
    half: usize,
    progress: &mut dyn ProgressReporter,
) -> Result<Located> {
    let geometry = session.geometry();
    let (lat_idx, lon_idx) = geometry.locate(lat, lon);
    debug!("idx > lat: {}, lon: {}", lat_idx, lon_idx);

    let no_data = || AtlasError::NoDataAtLocation { lat, lon };

    let window = read_search_window(session, lat_idx, lon_idx, half)?.ok_or_else(no_data)?;
    progress.update(40);

    let distances = node_distances(&window, lat, geometry.grid_longitude(lon));
    progress.update(70);

    let depths = session.depth_levels();
    let mut samples: Vec<NodeSample> = Vec::with_capacity(depths.len());
    let mut surface_cell = None;

    for (level, &depth) in depths.iter().enumerate() {
        let (cell, distance) = match scan_level(&window, &distances, level) {
            LevelScan::Nearest { cell, distance } => (cell, distance),
            LevelScan::AllMissing => {
                debug!("{}: all-missing level", level);
                continue;
            }
            LevelScan::Absent => {
                info!("{}: bottom of valid data", level);
                break;
            }
        };

        if level == 0 {
            surface_cell = Some(cell);
        }

        let row = cell / window.longitudes.len();
        let col = cell % window.longitudes.len();
        let (latitude, longitude) = window.position(cell);

        samples.push(NodeSample {
            level,
            depth: Meters(depth),
            potential_temperature: Celsius(window.temperature.get(level, row, col).unpack()),
            salinity: window.salinity.get(level, row, col).unpack(),
            latitude,
            longitude,
            distance: Meters(distance),
        });
    }

    let first = match samples.first() {
        Some(first) => *first,
        None => {
            info!("no data from lookup!");
            return Err(no_data());
        }
    };

    let (latitude, longitude) = surface_cell
        .map(|cell| window.position(cell))
        .unwrap_or((first.latitude, first.longitude));

    Ok(Located {
        samples,
        latitude,
        longitude,
    })
}
