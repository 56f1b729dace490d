//! Grid primitives and the passability oracle the clustering and searches consult.
//!
//! The oracle is an external collaborator: anything that can answer "may class C enter
//! cell X" and "what does entering X cost" can be clustered. [`TileGrid`] is the reference
//! implementation used by the CLI and the tests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cluster::neighbor_policy::CELL_COST;
use crate::error::{PathError, Result};

/// Integer coordinate of one grid cell.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// True for the eight surrounding cells.
    pub fn is_adjacent(self, other: CellPos) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for CellPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Width and height of a map; cells are `0..width` × `0..height`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn contains(&self, cell: CellPos) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Row-major index. Callers must check [`GridBounds::contains`] first.
    #[inline]
    pub fn index(&self, cell: CellPos) -> usize {
        (cell.y as usize) * (self.width as usize) + (cell.x as usize)
    }

    #[inline]
    pub fn cell_at(&self, index: usize) -> CellPos {
        let w = self.width as usize;
        CellPos::new((index % w) as i32, (index / w) as i32)
    }

    pub fn len(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn check(&self, cell: CellPos) -> Result<()> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(PathError::out_of_bounds(cell))
        }
    }
}

/// Typed movement capability identifier passed into every oracle call.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct MovementClass(pub u8);

impl MovementClass {
    pub const FOOT: MovementClass = MovementClass(0);
    pub const WHEELED: MovementClass = MovementClass(1);
    pub const NAVAL: MovementClass = MovementClass(2);

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "foot" => Some(Self::FOOT),
            "wheeled" => Some(Self::WHEELED),
            "naval" => Some(Self::NAVAL),
            other => other.parse::<u8>().ok().map(MovementClass),
        }
    }
}

impl fmt::Display for MovementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::FOOT => f.write_str("foot"),
            Self::WHEELED => f.write_str("wheeled"),
            Self::NAVAL => f.write_str("naval"),
            MovementClass(n) => write!(f, "class#{n}"),
        }
    }
}

/// Answers passability and cost questions for one map.
pub trait PassabilityOracle {
    fn bounds(&self) -> GridBounds;

    /// Every movement class this oracle can answer for.
    fn movement_classes(&self) -> Vec<MovementClass>;

    fn has_movement_class(&self, class: MovementClass) -> bool {
        self.movement_classes().contains(&class)
    }

    /// Whether an agent of `class` may stand in `cell`. Out-of-bounds cells are never enterable.
    fn can_enter_cell(&self, cell: CellPos, class: MovementClass) -> bool;

    /// Cost of stepping straight into `cell`, on the [`CELL_COST`] scale.
    fn movement_cost(&self, cell: CellPos, class: MovementClass) -> i32;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupancyChange {
    Entered,
    Left,
}

/// One agent entering or leaving one cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    pub cell: CellPos,
    pub change: OccupancyChange,
}

impl OccupancyEvent {
    pub fn entered(cell: CellPos) -> Self {
        Self { cell, change: OccupancyChange::Entered }
    }

    pub fn left(cell: CellPos) -> Self {
        Self { cell, change: OccupancyChange::Left }
    }
}

/// Oracles whose passability follows agent occupancy.
pub trait OccupancySink {
    fn apply_occupancy(&mut self, event: &OccupancyEvent);
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Clear,
    Rough,
    Road,
    Water,
    Rock,
}

impl Terrain {
    pub const ALL: [Terrain; 5] = [Terrain::Clear, Terrain::Rough, Terrain::Road, Terrain::Water, Terrain::Rock];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Terrain::Clear),
            ',' => Some(Terrain::Rough),
            '=' => Some(Terrain::Road),
            '~' => Some(Terrain::Water),
            '#' => Some(Terrain::Rock),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Terrain::Clear => '.',
            Terrain::Rough => ',',
            Terrain::Road => '=',
            Terrain::Water => '~',
            Terrain::Rock => '#',
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Per-class terrain costs; `None` marks terrain the class cannot enter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocomotorProfile {
    pub class: MovementClass,
    pub costs: [Option<i32>; 5],
}

impl LocomotorProfile {
    pub fn new(class: MovementClass, entries: &[(Terrain, i32)]) -> Self {
        let mut costs = [None; 5];
        for &(terrain, cost) in entries {
            costs[terrain.slot()] = Some(cost);
        }
        Self { class, costs }
    }

    pub fn cost(&self, terrain: Terrain) -> Option<i32> {
        self.costs[terrain.slot()]
    }

    pub fn defaults() -> Vec<LocomotorProfile> {
        vec![
            LocomotorProfile::new(
                MovementClass::FOOT,
                &[(Terrain::Clear, CELL_COST), (Terrain::Road, CELL_COST), (Terrain::Rough, 150)],
            ),
            LocomotorProfile::new(
                MovementClass::WHEELED,
                &[(Terrain::Clear, CELL_COST), (Terrain::Road, CELL_COST), (Terrain::Rough, 200)],
            ),
            LocomotorProfile::new(MovementClass::NAVAL, &[(Terrain::Water, CELL_COST)]),
        ]
    }
}

/// Terrain map with agent occupancy; occupied cells are impassable for every class.
#[derive(Clone, Debug)]
pub struct TileGrid {
    bounds: GridBounds,
    terrain: Vec<Terrain>,
    occupancy: Vec<u16>,
    profiles: Vec<LocomotorProfile>,
}

impl TileGrid {
    pub fn new(width: i32, height: i32) -> Self {
        let bounds = GridBounds::new(width.max(0), height.max(0));
        Self {
            bounds,
            terrain: vec![Terrain::Clear; bounds.len()],
            occupancy: vec![0; bounds.len()],
            profiles: LocomotorProfile::defaults(),
        }
    }

    /// Parse one string per row using the characters of [`Terrain::from_char`].
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(PathError::InvalidMap("map has no cells".into()));
        }
        let mut grid = TileGrid::new(width as i32, height as i32);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(PathError::InvalidMap(format!(
                    "row {} has {} cells, expected {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }
            for (x, c) in row.chars().enumerate() {
                let terrain = Terrain::from_char(c).ok_or_else(|| {
                    PathError::InvalidMap(format!("unknown terrain '{}' at ({}, {})", c, x, y))
                })?;
                let idx = grid.bounds.index(CellPos::new(x as i32, y as i32));
                grid.terrain[idx] = terrain;
            }
        }
        Ok(grid)
    }

    pub fn with_profiles(mut self, profiles: Vec<LocomotorProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn terrain(&self, cell: CellPos) -> Option<Terrain> {
        self.bounds.contains(cell).then(|| self.terrain[self.bounds.index(cell)])
    }

    /// Returns `false` if out of bounds.
    pub fn set_terrain(&mut self, cell: CellPos, terrain: Terrain) -> bool {
        if !self.bounds.contains(cell) {
            return false;
        }
        let idx = self.bounds.index(cell);
        self.terrain[idx] = terrain;
        true
    }

    pub fn is_occupied(&self, cell: CellPos) -> bool {
        self.bounds.contains(cell) && self.occupancy[self.bounds.index(cell)] > 0
    }

    pub fn occupy(&mut self, cell: CellPos) -> bool {
        if !self.bounds.contains(cell) {
            return false;
        }
        let idx = self.bounds.index(cell);
        self.occupancy[idx] = self.occupancy[idx].saturating_add(1);
        true
    }

    pub fn vacate(&mut self, cell: CellPos) -> bool {
        if !self.bounds.contains(cell) {
            return false;
        }
        let idx = self.bounds.index(cell);
        self.occupancy[idx] = self.occupancy[idx].saturating_sub(1);
        true
    }

    fn profile(&self, class: MovementClass) -> Option<&LocomotorProfile> {
        self.profiles.iter().find(|p| p.class == class)
    }

    /// Render the terrain back into rows; occupied cells print as `@`.
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.bounds.height)
            .map(|y| {
                (0..self.bounds.width)
                    .map(|x| {
                        let cell = CellPos::new(x, y);
                        if self.is_occupied(cell) {
                            '@'
                        } else {
                            self.terrain[self.bounds.index(cell)].to_char()
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

impl PassabilityOracle for TileGrid {
    fn bounds(&self) -> GridBounds {
        self.bounds
    }

    fn movement_classes(&self) -> Vec<MovementClass> {
        self.profiles.iter().map(|p| p.class).collect()
    }

    fn can_enter_cell(&self, cell: CellPos, class: MovementClass) -> bool {
        if !self.bounds.contains(cell) {
            return false;
        }
        let idx = self.bounds.index(cell);
        if self.occupancy[idx] > 0 {
            return false;
        }
        self.profile(class).and_then(|p| p.cost(self.terrain[idx])).is_some()
    }

    fn movement_cost(&self, cell: CellPos, class: MovementClass) -> i32 {
        if !self.bounds.contains(cell) {
            return CELL_COST;
        }
        let terrain = self.terrain[self.bounds.index(cell)];
        self.profile(class).and_then(|p| p.cost(terrain)).unwrap_or(CELL_COST)
    }
}

impl OccupancySink for TileGrid {
    fn apply_occupancy(&mut self, event: &OccupancyEvent) {
        match event.change {
            OccupancyChange::Entered => self.occupy(event.cell),
            OccupancyChange::Left => self.vacate(event.cell),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rows_and_query_oracle() -> Result<()> {
        let grid = TileGrid::from_rows(&["..#", ",~="])?;
        assert_eq!(grid.bounds(), GridBounds::new(3, 2));
        assert!(grid.can_enter_cell(CellPos::new(0, 0), MovementClass::FOOT));
        assert!(!grid.can_enter_cell(CellPos::new(2, 0), MovementClass::FOOT));
        assert!(!grid.can_enter_cell(CellPos::new(1, 1), MovementClass::FOOT));
        assert!(grid.can_enter_cell(CellPos::new(1, 1), MovementClass::NAVAL));
        assert_eq!(grid.movement_cost(CellPos::new(0, 1), MovementClass::FOOT), 150);
        assert_eq!(grid.movement_cost(CellPos::new(0, 1), MovementClass::WHEELED), 200);
        assert!(!grid.can_enter_cell(CellPos::new(-1, 0), MovementClass::FOOT));
        Ok(())
    }

    #[test]
    fn ragged_or_unknown_rows_are_rejected() {
        assert!(matches!(TileGrid::from_rows(&["..", "."]), Err(PathError::InvalidMap(_))));
        assert!(matches!(TileGrid::from_rows(&[".x"]), Err(PathError::InvalidMap(_))));
        assert!(matches!(TileGrid::from_rows::<&str>(&[]), Err(PathError::InvalidMap(_))));
    }

    #[test]
    fn occupancy_blocks_every_class_until_vacated() {
        let mut grid = TileGrid::new(4, 4);
        let cell = CellPos::new(2, 2);
        grid.apply_occupancy(&OccupancyEvent::entered(cell));
        grid.apply_occupancy(&OccupancyEvent::entered(cell));
        assert!(!grid.can_enter_cell(cell, MovementClass::FOOT));
        grid.apply_occupancy(&OccupancyEvent::left(cell));
        assert!(!grid.can_enter_cell(cell, MovementClass::FOOT));
        grid.apply_occupancy(&OccupancyEvent::left(cell));
        assert!(grid.can_enter_cell(cell, MovementClass::FOOT));
        assert_eq!(grid.to_rows()[2], "....");
    }

    #[test]
    fn movement_class_names_round_trip() {
        for class in [MovementClass::FOOT, MovementClass::WHEELED, MovementClass::NAVAL] {
            assert_eq!(MovementClass::from_name(&class.to_string()), Some(class));
        }
        assert_eq!(MovementClass::from_name("7"), Some(MovementClass(7)));
        assert_eq!(MovementClass::from_name("hover"), None);
    }

    #[test]
    fn bounds_index_round_trip() {
        let b = GridBounds::new(7, 3);
        for i in 0..b.len() {
            assert_eq!(b.index(b.cell_at(i)), i);
        }
        assert!(b.check(CellPos::new(7, 0)).is_err());
    }
}
