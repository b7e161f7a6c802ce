//! Grids held in memory.
//!
//! Every read goes through the same window arithmetic as a remote grid and is logged, so callers
//! can check how a window was assembled.

use super::{Availability, Cube, GridField, GridPair, GridProvider, GridVariable};
use crate::error::{AtlasError, Result};
use chrono::NaiveDate;
use optional::Optioned;
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    ops::Range,
    rc::Rc,
};

/// A windowed read request, as logged by a [`MemoryVariable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRead {
    /// Time step.
    pub day: usize,
    /// Latitude rows.
    pub lats: Range<usize>,
    /// Longitude columns.
    pub lons: Range<usize>,
}

#[derive(Debug)]
struct MemoryGrid {
    depths: Vec<f64>,
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    days: usize,
    // [level][lat][lon], the same for every day
    values: Cube,
}

/// A variable whose cube lives in memory. Clones share the grid and the read log.
#[derive(Debug, Clone)]
pub struct MemoryVariable {
    grid: Rc<MemoryGrid>,
    reads: Rc<RefCell<Vec<WindowRead>>>,
}

impl MemoryVariable {
    /// Build a variable from its coordinates and a function of `(level, lat_idx, lon_idx)`.
    /// Every one of the `days` time steps holds the same values.
    pub fn from_fn<F>(
        depths: Vec<f64>,
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        days: usize,
        f: F,
    ) -> Self
    where
        F: FnMut(usize, usize, usize) -> Optioned<f64>,
    {
        let values = Cube::from_fn(depths.len(), latitudes.len(), longitudes.len(), f);

        MemoryVariable {
            grid: Rc::new(MemoryGrid {
                depths,
                latitudes,
                longitudes,
                days,
                values,
            }),
            reads: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// All reads made through this variable or its clones, oldest first.
    pub fn reads(&self) -> Vec<WindowRead> {
        self.reads.borrow().clone()
    }
}

impl GridVariable for MemoryVariable {
    fn depths(&self) -> Result<Vec<f64>> {
        Ok(self.grid.depths.clone())
    }

    fn latitudes(&self) -> Result<Vec<f64>> {
        Ok(self.grid.latitudes.clone())
    }

    fn longitudes(&self) -> Result<Vec<f64>> {
        Ok(self.grid.longitudes.clone())
    }

    fn read_window(&self, day: usize, lats: Range<usize>, lons: Range<usize>) -> Result<Cube> {
        let grid = &self.grid;
        if day >= grid.days
            || lats.start >= lats.end
            || lons.start >= lons.end
            || lats.end > grid.latitudes.len()
            || lons.end > grid.longitudes.len()
        {
            return Err(AtlasError::DataAccess(format!(
                "window t={} lat={:?} lon={:?} outside of the grid",
                day, lats, lons
            )));
        }

        self.reads.borrow_mut().push(WindowRead {
            day,
            lats: lats.clone(),
            lons: lons.clone(),
        });

        Ok(Cube::from_fn(
            grid.values.levels(),
            lats.len(),
            lons.len(),
            |l, r, c| grid.values.get(l, lats.start + r, lons.start + c),
        ))
    }
}

/// A provider serving one in-memory grid pair for a set of dates.
#[derive(Debug)]
pub struct MemoryProvider {
    grids: GridPair<MemoryVariable>,
    available: HashSet<NaiveDate>,
    broken: HashSet<NaiveDate>,
    unreachable: bool,
    unreachable_dates: HashSet<NaiveDate>,
    probes: RefCell<Vec<NaiveDate>>,
    opens: Cell<usize>,
}

impl MemoryProvider {
    /// Create a provider with no available dates.
    pub fn new(temperature: MemoryVariable, salinity: MemoryVariable) -> Self {
        MemoryProvider {
            grids: GridPair {
                temperature,
                salinity,
            },
            available: HashSet::new(),
            broken: HashSet::new(),
            unreachable: false,
            unreachable_dates: HashSet::new(),
            probes: RefCell::new(Vec::new()),
            opens: Cell::new(0),
        }
    }

    /// Builder method marking a date as available.
    pub fn with_available(mut self, date: NaiveDate) -> Self {
        self.available.insert(date);
        self
    }

    /// Builder method for a date that probes as available but fails to open.
    pub fn with_broken(mut self, date: NaiveDate) -> Self {
        self.available.insert(date);
        self.broken.insert(date);
        self
    }

    /// Builder method simulating a server that cannot be reached.
    pub fn with_unreachable(mut self, unreachable: bool) -> Self {
        self.unreachable = unreachable;
        self
    }

    /// Builder method for a date whose probe fails on the transport.
    pub fn with_unreachable_date(mut self, date: NaiveDate) -> Self {
        self.unreachable_dates.insert(date);
        self
    }

    /// Every date probed so far, oldest first.
    pub fn probed_dates(&self) -> Vec<NaiveDate> {
        self.probes.borrow().clone()
    }

    /// Number of `open` calls so far, successful or not, one per variable.
    pub fn open_count(&self) -> usize {
        self.opens.get()
    }

    /// The temperature variable, to inspect its read log.
    pub fn temperature(&self) -> &MemoryVariable {
        &self.grids.temperature
    }

    /// The salinity variable, to inspect its read log.
    pub fn salinity(&self) -> &MemoryVariable {
        &self.grids.salinity
    }
}

impl GridProvider for MemoryProvider {
    type Variable = MemoryVariable;

    fn probe_available(&self, date: NaiveDate) -> Availability {
        self.probes.borrow_mut().push(date);

        if self.unreachable || self.unreachable_dates.contains(&date) {
            Availability::Unreachable("connection refused".to_owned())
        } else if self.available.contains(&date) {
            Availability::Available
        } else {
            Availability::Missing
        }
    }

    fn open(&self, date: NaiveDate, field: GridField) -> Result<MemoryVariable> {
        self.opens.set(self.opens.get() + 1);

        if !self.available.contains(&date) || self.broken.contains(&date) {
            return Err(AtlasError::DataAccess(format!(
                "unable to access {}: {}",
                field,
                date.format("%Y%m%d")
            )));
        }

        Ok(self.grids.field(field).clone())
    }
}
