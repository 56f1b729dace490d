use log::debug;

use super::inter_connector::register_entrance_pair;
use super::models::{BorderPair, EdgeKind};
use super::ClusterLevel;
use crate::error::Result;
use crate::grid::{CellPos, MovementClass, PassabilityOracle};

#[derive(Clone, Debug, Default)]
pub struct EntrancesStats {
    pub borders_scanned: usize,
    pub runs_found: usize,
    pub entrances_created: usize,
    pub edges_promoted: usize,
}

impl EntrancesStats {
    fn absorb(&mut self, other: EntrancesStats) {
        self.borders_scanned += other.borders_scanned;
        self.runs_found += other.runs_found;
        self.entrances_created += other.entrances_created;
        self.edges_promoted += other.edges_promoted;
    }
}

/// Maximal spans (inclusive indices) where both facing cells are enterable.
pub fn border_runs<G: PassabilityOracle + ?Sized>(
    grid: &G,
    class: MovementClass,
    facing: &[(CellPos, CellPos)],
) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &(a, b)) in facing.iter().enumerate() {
        let open = grid.can_enter_cell(a, class) && grid.can_enter_cell(b, class);
        match (open, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, facing.len() - 1));
    }
    runs
}

/// Midpoint for short runs, both ends for runs longer than `max_width`.
pub fn entrance_indices(run: (usize, usize), max_width: i32) -> Vec<usize> {
    let (start, end) = run;
    let len = end - start + 1;
    if len as i64 <= i64::from(max_width) {
        vec![(start + end) / 2]
    } else {
        vec![start, end]
    }
}

/// Scan one level-0 border and register an entrance pair per run representative.
pub fn detect_border<G: PassabilityOracle + ?Sized>(
    grid: &G,
    class: MovementClass,
    level: &mut ClusterLevel,
    pair: BorderPair,
    max_width: i32,
) -> Result<EntrancesStats> {
    let facing = level.border_cells(pair);
    let runs = border_runs(grid, class, &facing);
    let mut stats = EntrancesStats { borders_scanned: 1, runs_found: runs.len(), ..Default::default() };
    for run in runs {
        for i in entrance_indices(run, max_width) {
            let (a, b) = facing[i];
            register_entrance_pair(level, a, b)?;
            stats.entrances_created += 1;
        }
    }
    debug!(
        "level {} border {}->{} ({:?}): {} runs, {} entrances",
        level.level, pair.a.0, pair.b.0, pair.side, stats.runs_found, stats.entrances_created
    );
    Ok(stats)
}

/// Lift the child level's Inter edges that cross this parent border.
pub fn promote_border(child: &ClusterLevel, level: &mut ClusterLevel, pair: BorderPair) -> Result<EntrancesStats> {
    let mut stats = EntrancesStats { borders_scanned: 1, ..Default::default() };
    for (a, b) in level.border_cells(pair) {
        if child.graph.edge(a, b, EdgeKind::Inter).is_some() {
            register_entrance_pair(level, a, b)?;
            stats.edges_promoted += 1;
        }
    }
    debug!(
        "level {} border {}->{} ({:?}): promoted {} inter edges",
        level.level, pair.a.0, pair.b.0, pair.side, stats.edges_promoted
    );
    Ok(stats)
}

/// Entrances for every border of `levels[index]`: geometric scan at level 0, promotion above.
pub fn discover_entrances<G: PassabilityOracle + ?Sized>(
    grid: &G,
    class: MovementClass,
    levels: &mut [ClusterLevel],
    index: usize,
    max_width: i32,
) -> Result<EntrancesStats> {
    let mut stats = EntrancesStats::default();
    let (lower, upper) = levels.split_at_mut(index);
    let Some(level) = upper.first_mut() else {
        return Ok(stats);
    };
    for pair in level.border_pairs() {
        let found = match lower.last() {
            Some(child) => promote_border(child, level, pair)?,
            None => detect_border(grid, class, level, pair, max_width)?,
        };
        stats.absorb(found);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::cluster_builder::build_clusters;
    use crate::cluster::models::ClusterId;
    use crate::grid::TileGrid;

    #[test]
    fn runs_split_on_blocked_cells() -> Result<()> {
        let grid = TileGrid::from_rows(&["..#....#"])?;
        let facing: Vec<_> = (0..8).map(|x| (CellPos::new(x, 0), CellPos::new(x, 0))).collect();
        assert_eq!(border_runs(&grid, MovementClass::FOOT, &facing), vec![(0, 1), (3, 6)]);
        Ok(())
    }

    #[test]
    fn short_runs_get_midpoint_long_runs_get_ends() {
        assert_eq!(entrance_indices((0, 9), 6), vec![0, 9]);
        assert_eq!(entrance_indices((0, 5), 6), vec![2]);
        assert_eq!(entrance_indices((3, 3), 6), vec![3]);
        assert_eq!(entrance_indices((2, 8), 6), vec![2, 8]);
    }

    #[test]
    fn open_border_of_ten_cells_yields_two_entrances() -> Result<()> {
        let grid = TileGrid::new(20, 10);
        let mut levels = vec![ClusterLevel::new(0, 10, grid.bounds())];
        build_clusters(&grid, MovementClass::FOOT, &mut levels[0])?;
        let stats = discover_entrances(&grid, MovementClass::FOOT, &mut levels, 0, 6)?;
        assert_eq!(stats.entrances_created, 2);
        let level = &levels[0];
        assert!(level.graph.edge(CellPos::new(9, 0), CellPos::new(10, 0), EdgeKind::Inter).is_some());
        assert!(level.graph.edge(CellPos::new(10, 9), CellPos::new(9, 9), EdgeKind::Inter).is_some());
        let left = level.cluster(ClusterId(0)).map(|c| c.entrances.len());
        assert_eq!(left, Some(2));
        Ok(())
    }

    #[test]
    fn wide_entrance_setting_keeps_single_midpoint() -> Result<()> {
        let grid = TileGrid::new(20, 10);
        let mut levels = vec![ClusterLevel::new(0, 10, grid.bounds())];
        build_clusters(&grid, MovementClass::FOOT, &mut levels[0])?;
        discover_entrances(&grid, MovementClass::FOOT, &mut levels, 0, 10)?;
        let nodes: Vec<_> = levels[0].graph.nodes().collect();
        assert_eq!(nodes, vec![CellPos::new(9, 4), CellPos::new(10, 4)]);
        Ok(())
    }
}
