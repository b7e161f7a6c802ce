//! Remote RTOFS grids on the NOMADS server.
//!
//! Availability of a run is checked with `HEAD` requests on the run's NetCDF files. The cubes
//! themselves are read through the server's OPeNDAP interface in its ASCII form:
//!
//!   - `<dataset>.dds` gives the shape of the variable,
//!   - `<dataset>.das` gives its attributes, among them the missing value,
//!   - `<dataset>.ascii?<var>[t][l0:l1][y0:y1][x0:x1]` returns a hyperslab as text.
//!
//! Only the search window is ever transferred, a few kilobytes per query.

use super::{Availability, Cube, GridField, GridProvider, GridVariable};
use crate::{
    config::AtlasConfig,
    error::{AtlasError, Result},
};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use std::ops::Range;
use tracing::{debug, info, warn};

/// Name of the depth coordinate in the RTOFS datasets.
const DEPTH_COORD: &str = "lev";
/// Name of the latitude coordinate.
const LAT_COORD: &str = "lat";
/// Name of the longitude coordinate.
const LON_COORD: &str = "lon";

/// Provider for the NOMADS RTOFS server.
#[derive(Debug, Clone)]
pub struct OpendapProvider {
    client: Client,
    config: AtlasConfig,
}

impl OpendapProvider {
    /// Create a provider with an HTTP client using the configured timeout.
    pub fn new(config: &AtlasConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|err| AtlasError::Config(format!("building HTTP client: {}", err)))?;

        Ok(OpendapProvider {
            client,
            config: config.clone(),
        })
    }

    fn check_url(&self, url: &str) -> Availability {
        match self.client.head(url).send() {
            Ok(response) => {
                let status = response.status();
                debug!(url, status = status.as_u16(), "checked url");
                if status.as_u16() < 400 {
                    Availability::Available
                } else {
                    Availability::Missing
                }
            }
            Err(err) => {
                warn!("while checking {}, {}", url, err);
                Availability::Unreachable(err.to_string())
            }
        }
    }
}

impl GridProvider for OpendapProvider {
    type Variable = OpendapVariable;

    fn probe_available(&self, date: NaiveDate) -> Availability {
        let (url_temp, url_sal) = self.config.check_urls(date);

        match self.check_url(&url_temp) {
            Availability::Available => self.check_url(&url_sal),
            other => other,
        }
    }

    fn open(&self, date: NaiveDate, field: GridField) -> Result<OpendapVariable> {
        let (url_temp, url_sal) = self.config.opendap_urls(date);

        let (url, name) = match field {
            GridField::Temperature => (url_temp, &self.config.temperature_var),
            GridField::Salinity => (url_sal, &self.config.salinity_var),
        };
        debug!("opening {} at {}", field, url);

        OpendapVariable::open(&self.client, url, name)
    }
}

/// One variable of an OPeNDAP dataset.
#[derive(Debug, Clone)]
pub struct OpendapVariable {
    client: Client,
    url: String,
    name: String,
    shape: Vec<usize>,
    missing_value: Option<f64>,
}

impl OpendapVariable {
    /// Open a variable, reading its shape and missing value from the dataset descriptors.
    pub fn open(client: &Client, url: String, name: &str) -> Result<Self> {
        let dds = fetch_text(client, &format!("{}.dds", url))?;
        let shape = parse_dds_shape(&dds, name)?;
        if shape.len() != 4 {
            return Err(AtlasError::DataAccess(format!(
                "{} in {} has {} dimensions, expected 4",
                name,
                url,
                shape.len()
            )));
        }

        let das = fetch_text(client, &format!("{}.das", url))?;
        let missing_value = parse_das_missing_value(&das, name);

        info!(url = url.as_str(), variable = name, ?shape, "opened dataset");

        Ok(OpendapVariable {
            client: client.clone(),
            url,
            name: name.to_owned(),
            shape,
            missing_value,
        })
    }

    fn read_coordinate(&self, coord: &str) -> Result<Vec<f64>> {
        let body = fetch_text(&self.client, &format!("{}.ascii?{}", self.url, coord))?;
        let (_, values) = parse_ascii_array(&body, coord)?;
        Ok(values)
    }
}

impl GridVariable for OpendapVariable {
    fn depths(&self) -> Result<Vec<f64>> {
        self.read_coordinate(DEPTH_COORD)
    }

    fn latitudes(&self) -> Result<Vec<f64>> {
        self.read_coordinate(LAT_COORD)
    }

    fn longitudes(&self) -> Result<Vec<f64>> {
        self.read_coordinate(LON_COORD)
    }

    fn read_window(&self, day: usize, lats: Range<usize>, lons: Range<usize>) -> Result<Cube> {
        let (n_time, n_lev, n_lat, n_lon) = (self.shape[0], self.shape[1], self.shape[2], self.shape[3]);

        if day >= n_time
            || n_lev == 0
            || lats.start >= lats.end
            || lons.start >= lons.end
            || lats.end > n_lat
            || lons.end > n_lon
        {
            return Err(AtlasError::DataAccess(format!(
                "window t={} lat={:?} lon={:?} outside of {} {:?}",
                day, lats, lons, self.name, self.shape
            )));
        }

        let url = format!(
            "{}.ascii?{}[{}][0:{}][{}:{}][{}:{}]",
            self.url,
            self.name,
            day,
            n_lev - 1,
            lats.start,
            lats.end - 1,
            lons.start,
            lons.end - 1
        );
        let body = fetch_text(&self.client, &url)?;
        let (shape, values) = parse_ascii_array(&body, &self.name)?;

        if shape.len() != 4 || shape[0] != 1 {
            return Err(AtlasError::DataAccess(format!(
                "unexpected shape {:?} for {}",
                shape, self.name
            )));
        }

        Cube::from_raw(shape[1], shape[2], shape[3], &values, self.missing_value)
    }
}

fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send()?;

    if !response.status().is_success() {
        return Err(AtlasError::DataAccess(format!(
            "HTTP error {} for {}",
            response.status(),
            url
        )));
    }

    Ok(response.text()?)
}

/// Dimension sizes of `name` from a `.dds` document.
///
/// Matches declarations like `Float32 temperature[time = 3][lev = 40][lat = 3298][lon = 4500];`.
pub fn parse_dds_shape(dds: &str, name: &str) -> Result<Vec<usize>> {
    let prefix = format!("{}[", name);

    dds.lines()
        .map(str::trim)
        .filter_map(|line| {
            let mut tokens = line.splitn(2, char::is_whitespace);
            let _type_name = tokens.next()?;
            let decl = tokens.next()?.trim();
            if decl.starts_with(&prefix) {
                Some(decl)
            } else {
                None
            }
        })
        .next()
        .ok_or_else(|| AtlasError::DataAccess(format!("no {} in dataset descriptor", name)))
        .and_then(|decl| {
            decl.split('[')
                .skip(1)
                .map(|dim| {
                    let inner = dim.split(']').next().unwrap_or("");
                    let size = inner.rsplit('=').next().unwrap_or("").trim();
                    size.parse::<usize>().map_err(|_| {
                        AtlasError::DataAccess(format!("bad dimension '{}' for {}", inner, name))
                    })
                })
                .collect()
        })
}

/// The missing value of `name` from a `.das` document: `missing_value` if present, otherwise
/// `_FillValue`.
pub fn parse_das_missing_value(das: &str, name: &str) -> Option<f64> {
    let header = format!("{} {{", name);
    let mut in_block = false;
    let mut fill_value = None;

    for line in das.lines().map(str::trim) {
        if !in_block {
            in_block = line == header;
            continue;
        }
        if line == "}" {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        let value = tokens[2].trim_end_matches(';').parse::<f64>().ok();
        match tokens[1] {
            "missing_value" => return value,
            "_FillValue" => fill_value = value,
            _ => {}
        }
    }

    fill_value
}

/// Parse the first array named `name` from an OPeNDAP ASCII response.
///
/// The array starts with a header such as `temperature, [1][40][5][5]` (grid arrays may be
/// prefixed, `temperature.temperature, [...]`). Data lines may carry an index prefix like
/// `[0][3][1], ` before the comma separated values. Returns the shape and the values in
/// row-major order.
pub fn parse_ascii_array(body: &str, name: &str) -> Result<(Vec<usize>, Vec<f64>)> {
    let dotted = format!(".{}", name);
    let mut lines = body.lines().map(str::trim);

    let shape: Vec<usize> = lines
        .by_ref()
        .find_map(|line| {
            let mut parts = line.splitn(2, ',');
            let label = parts.next()?.trim();
            let dims = parts.next()?.trim();
            if (label == name || label.ends_with(&dotted)) && dims.starts_with('[') {
                Some(dims)
            } else {
                None
            }
        })
        .ok_or_else(|| AtlasError::DataAccess(format!("no {} array in response", name)))
        .and_then(|dims| {
            dims.split(|c| c == '[' || c == ']')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<usize>().map_err(|_| {
                        AtlasError::DataAccess(format!("bad shape '{}' for {}", dims, name))
                    })
                })
                .collect()
        })?;

    let expected: usize = shape.iter().product();
    let mut values = Vec::with_capacity(expected);

    for line in lines {
        if values.len() >= expected || line.is_empty() {
            break;
        }

        // Strip the "[i][j], " index prefix
        let data = if line.starts_with('[') {
            line.splitn(2, ',').nth(1).unwrap_or("")
        } else {
            line
        };

        for token in data.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let val = token.parse::<f64>().map_err(|_| {
                AtlasError::DataAccess(format!("bad value '{}' in {} response", token, name))
            })?;
            values.push(val);
        }
    }

    if values.len() != expected {
        return Err(AtlasError::DataAccess(format!(
            "{} response has {} values, shape {:?} needs {}",
            name,
            values.len(),
            shape,
            expected
        )));
    }

    Ok((shape, values))
}
