//! Binary min-heap of `(cost, value)` pairs.
//!
//! Backing storage only ever grows (doubling) and [`PriorityQueue::clear`] just drops the
//! length, so one queue can be reused across many Dijkstra runs without reallocating.
//! Equal costs come out in no particular order.

use crate::error::{PathError, Result};

#[derive(Clone, Debug)]
pub struct PriorityQueue<T> {
    items: Vec<(i32, T)>,
    len: usize,
}

impl<T: Copy> PriorityQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity.max(1)), len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn add(&mut self, cost: i32, value: T) {
        if self.len < self.items.len() {
            self.items[self.len] = (cost, value);
        } else {
            if self.items.len() == self.items.capacity() {
                self.items.reserve_exact(self.items.capacity().max(1));
            }
            self.items.push((cost, value));
        }
        self.len += 1;
        self.sift_up(self.len - 1);
    }

    pub fn peek(&self) -> Result<(i32, T)> {
        if self.len == 0 {
            return Err(PathError::EmptyQueue);
        }
        Ok(self.items[0])
    }

    pub fn pop(&mut self) -> Result<(i32, T)> {
        if self.len == 0 {
            return Err(PathError::EmptyQueue);
        }
        let top = self.items[0];
        self.len -= 1;
        if self.len > 0 {
            self.items[0] = self.items[self.len];
            self.sift_down(0);
        }
        Ok(top)
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.items[i].0 >= self.items[parent].0 {
                break;
            }
            self.items.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            if left >= self.len {
                break;
            }
            let right = left + 1;
            let smaller = if right < self.len && self.items[right].0 < self.items[left].0 { right } else { left };
            if self.items[i].0 <= self.items[smaller].0 {
                break;
            }
            self.items.swap(i, smaller);
            i = smaller;
        }
    }
}
