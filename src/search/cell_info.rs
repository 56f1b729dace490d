use crate::grid::{CellPos, GridBounds};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellStatus {
    Unvisited,
    Open,
    Closed,
}

/// Per-cell search state for one query.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CellInfo {
    pub cost_so_far: i32,
    pub estimated_total: i32,
    pub previous: CellPos,
    pub status: CellStatus,
}

impl CellInfo {
    /// A cell no search has reached; its predecessor is itself.
    pub const fn unvisited(cell: CellPos) -> Self {
        Self { cost_so_far: i32::MAX, estimated_total: i32::MAX, previous: cell, status: CellStatus::Unvisited }
    }
}

/// Dense grid-sized array of [`CellInfo`].
///
/// Writes remember which indices they touched so [`CellLayer::reset`] only visits those.
#[derive(Debug)]
pub struct CellLayer {
    bounds: GridBounds,
    infos: Vec<CellInfo>,
    touched: Vec<usize>,
}

impl CellLayer {
    pub fn new(bounds: GridBounds) -> Self {
        let infos = (0..bounds.len()).map(|i| CellInfo::unvisited(bounds.cell_at(i))).collect();
        Self { bounds, infos, touched: Vec::new() }
    }

    /// Zero-sized placeholder left behind when a pooled layer is handed back.
    pub(crate) fn empty() -> Self {
        Self { bounds: GridBounds::new(0, 0), infos: Vec::new(), touched: Vec::new() }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn get(&self, cell: CellPos) -> CellInfo {
        if self.bounds.contains(cell) {
            self.infos[self.bounds.index(cell)]
        } else {
            CellInfo::unvisited(cell)
        }
    }

    /// Out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellPos, info: CellInfo) {
        if !self.bounds.contains(cell) {
            return;
        }
        let idx = self.bounds.index(cell);
        if self.infos[idx].status == CellStatus::Unvisited && self.infos[idx].previous == cell {
            self.touched.push(idx);
        }
        self.infos[idx] = info;
    }

    pub fn touched(&self) -> usize {
        self.touched.len()
    }

    pub fn reset(&mut self) {
        for idx in self.touched.drain(..) {
            self.infos[idx] = CellInfo::unvisited(self.bounds.cell_at(idx));
        }
    }

    /// Cells with a non-default entry, with their current state.
    pub fn visited(&self) -> impl Iterator<Item = (CellPos, CellInfo)> + '_ {
        self.touched.iter().map(move |&i| (self.bounds.cell_at(i), self.infos[i]))
    }
}
