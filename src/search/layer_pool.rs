use log::trace;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;

use super::cell_info::CellLayer;
use crate::grid::GridBounds;

pub const DEFAULT_POOL_CAPACITY: usize = 4;

/// Bounded pool of reusable [`CellLayer`]s for one grid.
///
/// Checking out never blocks: an empty pool hands out a freshly allocated layer, and layers
/// returned to a full pool are dropped.
#[derive(Debug)]
pub struct CellInfoLayerPool {
    bounds: GridBounds,
    capacity: usize,
    layers: Mutex<Vec<CellLayer>>,
}

impl CellInfoLayerPool {
    pub fn new(bounds: GridBounds, capacity: usize) -> Self {
        Self { bounds, capacity, layers: Mutex::new(Vec::with_capacity(capacity)) }
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Layers currently parked in the pool.
    pub fn available(&self) -> usize {
        self.layers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn get(&self) -> PooledCellLayer<'_> {
        let parked = self.layers.lock().unwrap_or_else(|e| e.into_inner()).pop();
        let layer = match parked {
            Some(layer) => layer,
            None => {
                trace!("layer pool empty, allocating {}x{}", self.bounds.width, self.bounds.height);
                CellLayer::new(self.bounds)
            }
        };
        PooledCellLayer { pool: self, layer }
    }

    fn give_back(&self, mut layer: CellLayer) {
        layer.reset();
        let mut layers = self.layers.lock().unwrap_or_else(|e| e.into_inner());
        if layers.len() < self.capacity {
            layers.push(layer);
        }
    }
}

/// Checked-out layer; returns itself to the pool when dropped.
#[derive(Debug)]
pub struct PooledCellLayer<'a> {
    pool: &'a CellInfoLayerPool,
    layer: CellLayer,
}

impl Deref for PooledCellLayer<'_> {
    type Target = CellLayer;

    fn deref(&self) -> &CellLayer {
        &self.layer
    }
}

impl DerefMut for PooledCellLayer<'_> {
    fn deref_mut(&mut self) -> &mut CellLayer {
        &mut self.layer
    }
}

impl Drop for PooledCellLayer<'_> {
    fn drop(&mut self) {
        let layer = std::mem::replace(&mut self.layer, CellLayer::empty());
        self.pool.give_back(layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellPos;
    use crate::search::cell_info::{CellInfo, CellStatus};

    #[test]
    fn layers_return_clean_on_drop() {
        let pool = CellInfoLayerPool::new(GridBounds::new(8, 8), 2);
        let cell = CellPos::new(3, 3);
        {
            let mut layer = pool.get();
            layer.set(cell, CellInfo { cost_so_far: 5, estimated_total: 5, previous: cell, status: CellStatus::Closed });
        }
        assert_eq!(pool.available(), 1);
        let layer = pool.get();
        assert_eq!(layer.get(cell), CellInfo::unvisited(cell));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn exhaustion_allocates_and_overflow_is_dropped() {
        let pool = CellInfoLayerPool::new(GridBounds::new(4, 4), 2);
        let held: Vec<_> = (0..5).map(|_| pool.get()).collect();
        assert!(held.iter().all(|l| l.bounds() == GridBounds::new(4, 4)));
        drop(held);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn concurrent_checkout_from_rayon_workers() {
        use rayon::prelude::*;
        let pool = CellInfoLayerPool::new(GridBounds::new(16, 16), 4);
        let touched: usize = (0..64)
            .into_par_iter()
            .map(|i| {
                let mut layer = pool.get();
                let cell = CellPos::new(i % 16, i / 16);
                assert_eq!(layer.touched(), 0);
                layer.set(cell, CellInfo { cost_so_far: i, estimated_total: i, previous: cell, status: CellStatus::Open });
                layer.touched()
            })
            .sum();
        assert_eq!(touched, 64);
        assert!(pool.available() <= 4);
    }

    #[test]
    fn layer_goes_back_when_a_search_bails_out_early() {
        fn failing(pool: &CellInfoLayerPool) -> crate::error::Result<()> {
            let _layer = pool.get();
            Err(crate::error::PathError::EmptyQueue)
        }
        let pool = CellInfoLayerPool::new(GridBounds::new(4, 4), 4);
        assert!(failing(&pool).is_err());
        assert_eq!(pool.available(), 1);
    }
}
