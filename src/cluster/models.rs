use serde::Serialize;
use std::collections::BTreeSet;

use crate::grid::CellPos;

/// Row-major index of a cluster within its level.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct ClusterId(pub u32);

/// Component identifier, unique within one level and never reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct ComponentId(pub u32);

/// Inclusive rectangle of cells.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Boundaries {
    pub top: i32,
    pub left: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Boundaries {
    pub fn contains(&self, cell: CellPos) -> bool {
        cell.x >= self.left && cell.x <= self.right && cell.y >= self.top && cell.y <= self.bottom
    }

    pub fn contains_bounds(&self, other: &Boundaries) -> bool {
        other.left >= self.left && other.right <= self.right && other.top >= self.top && other.bottom <= self.bottom
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        (self.top..=self.bottom).flat_map(move |y| (self.left..=self.right).map(move |x| CellPos::new(x, y)))
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub level: usize,
    pub bounds: Boundaries,
    pub components: Vec<ComponentId>,
    pub entrances: BTreeSet<CellPos>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Component {
    pub id: ComponentId,
    pub cluster: ClusterId,
    pub cells: Vec<CellPos>,
    pub entrances: BTreeSet<CellPos>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum EdgeKind {
    Intra,
    Inter,
}

/// Directed edge between two entrance nodes.
///
/// Intra edges carry the concrete cells from the owning node to `to`, both ends included.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Edge {
    pub to: CellPos,
    pub cost: i32,
    pub kind: EdgeKind,
    pub path: Vec<CellPos>,
}

impl Edge {
    pub fn inter(to: CellPos, cost: i32) -> Self {
        Self { to, cost, kind: EdgeKind::Inter, path: Vec::new() }
    }

    pub fn intra(to: CellPos, cost: i32, path: Vec<CellPos>) -> Self {
        Self { to, cost, kind: EdgeKind::Intra, path }
    }
}

/// Which of the four neighbours a border pair faces.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum BorderSide {
    /// `b` lies directly right of `a`.
    East,
    /// `b` lies directly below `a`.
    South,
}

/// Two adjacent clusters, `a` always left of or above `b`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BorderPair {
    pub a: ClusterId,
    pub b: ClusterId,
    pub side: BorderSide,
}
