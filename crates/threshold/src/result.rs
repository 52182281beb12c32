//! Fixed-shape grid of per-cell fit results.

use ndarray::Array3;
use ustar_changepoint::{ChangePointResult, ModelKind, StatField};

/// Both model fits for one (season, stratum, replicate) cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Cell {
    pub(crate) two: ChangePointResult,
    pub(crate) three: ChangePointResult,
    /// The partitioner produced this stratum and a fit was tried.
    pub(crate) attempted: bool,
}

impl Cell {
    pub(crate) fn model(&self, kind: ModelKind) -> &ChangePointResult {
        match kind {
            ModelKind::TwoParameter => &self.two,
            ModelKind::ThreeParameter => &self.three,
        }
    }
}

/// Results of a run indexed by (season, stratum, bootstrap replicate).
///
/// The grid is allocated in full before any fitting and its shape never
/// changes; cells that were skipped, failed or never reached hold
/// [`ChangePointResult::sentinel`]. Storage is replicate-major so each
/// replicate owns one contiguous block.
#[derive(Debug, Clone)]
pub struct ResultCollection {
    n_seasons: usize,
    n_strata: usize,
    n_boot: usize,
    cells: Vec<Cell>,
    completed: Vec<bool>,
}

impl ResultCollection {
    /// Sentinel-filled grid of the given shape.
    pub(crate) fn new(n_seasons: usize, n_strata: usize, n_boot: usize) -> Self {
        Self {
            n_seasons,
            n_strata,
            n_boot,
            cells: vec![Cell::default(); n_seasons * n_strata * n_boot],
            completed: vec![false; n_boot],
        }
    }

    /// Cells per replicate block.
    pub(crate) fn block_len(&self) -> usize {
        self.n_seasons * self.n_strata
    }

    pub(crate) fn blocks_mut(&mut self) -> (&mut [Cell], &mut [bool]) {
        (&mut self.cells, &mut self.completed)
    }

    fn index(&self, season: usize, stratum: usize, replicate: usize) -> Option<usize> {
        (season < self.n_seasons && stratum < self.n_strata && replicate < self.n_boot)
            .then(|| (replicate * self.n_seasons + season) * self.n_strata + stratum)
    }

    pub(crate) fn cell(&self, season: usize, stratum: usize, replicate: usize) -> Option<&Cell> {
        self.index(season, stratum, replicate).map(|i| &self.cells[i])
    }

    /// `(n_seasons, n_strata_max, n_boot)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_seasons, self.n_strata, self.n_boot)
    }

    /// Fit of `kind` in one cell, `None` outside the grid.
    pub fn get(
        &self,
        kind: ModelKind,
        season: usize,
        stratum: usize,
        replicate: usize,
    ) -> Option<&ChangePointResult> {
        self.cell(season, stratum, replicate).map(|c| c.model(kind))
    }

    /// Whether a fit was tried in this cell.
    pub fn is_attempted(&self, season: usize, stratum: usize, replicate: usize) -> bool {
        self.cell(season, stratum, replicate)
            .is_some_and(|c| c.attempted)
    }

    /// One statistic across the whole grid, shaped like [`shape`](Self::shape).
    pub fn field(&self, kind: ModelKind, field: StatField) -> Array3<f64> {
        Array3::from_shape_fn(self.shape(), |(s, j, b)| {
            self.cell(s, j, b)
                .map_or(f64::NAN, |c| c.model(kind).get(field))
        })
    }

    /// Per-replicate completion flags; `false` for replicates cut off by a
    /// deadline.
    pub fn completed(&self) -> &[bool] {
        &self.completed
    }

    pub fn n_completed(&self) -> usize {
        self.completed.iter().filter(|c| **c).count()
    }

    /// Cells of one season across all strata of completed replicates.
    pub(crate) fn season_cells(&self, season: usize) -> impl Iterator<Item = &Cell> + '_ {
        (0..self.n_boot)
            .filter(move |&b| self.completed[b])
            .flat_map(move |b| (0..self.n_strata).filter_map(move |j| self.cell(season, j, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preallocated_sentinel_grid() {
        let rc = ResultCollection::new(4, 8, 3);
        assert_eq!(rc.shape(), (4, 8, 3));
        assert_eq!(rc.block_len(), 32);
        assert_eq!(rc.completed(), &[false, false, false]);
        assert!(!rc.is_attempted(0, 0, 0));
        let cp = rc.field(ModelKind::TwoParameter, StatField::Cp);
        assert_eq!(cp.shape(), &[4, 8, 3]);
        assert!(cp.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn out_of_range_is_none() {
        let rc = ResultCollection::new(2, 3, 4);
        assert!(rc.get(ModelKind::TwoParameter, 1, 2, 3).is_some());
        assert!(rc.get(ModelKind::TwoParameter, 2, 0, 0).is_none());
        assert!(rc.get(ModelKind::ThreeParameter, 0, 3, 0).is_none());
        assert!(rc.get(ModelKind::ThreeParameter, 0, 0, 4).is_none());
    }

    #[test]
    fn replicate_major_layout() {
        let mut rc = ResultCollection::new(2, 3, 2);
        let block = rc.block_len();
        let (cells, done) = rc.blocks_mut();
        // season 1, stratum 2 of replicate 1
        cells[block + 3 + 2].attempted = true;
        done[1] = true;
        assert!(rc.is_attempted(1, 2, 1));
        assert!(!rc.is_attempted(1, 2, 0));
        assert_eq!(rc.n_completed(), 1);
        assert_eq!(rc.season_cells(1).count(), 3);
        assert_eq!(rc.season_cells(1).filter(|c| c.attempted).count(), 1);
    }
}
