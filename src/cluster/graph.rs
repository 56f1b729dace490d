use std::collections::{BTreeMap, HashMap};

use super::models::{Edge, EdgeKind};
use super::neighbor_policy::INTER_EDGE_COST;
use crate::grid::CellPos;
use crate::search::priority_queue::PriorityQueue;

/// Entrance node -> outgoing edges. Every edge is stored together with its mirror.
#[derive(Clone, Debug, Default)]
pub struct AbstractGraph {
    edges: BTreeMap<CellPos, Vec<Edge>>,
}

impl AbstractGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, node: CellPos) -> bool {
        self.edges.contains_key(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = CellPos> + '_ {
        self.edges.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn edges(&self, node: CellPos) -> &[Edge] {
        self.edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge(&self, from: CellPos, to: CellPos, kind: EdgeKind) -> Option<&Edge> {
        self.edges(from).iter().find(|e| e.to == to && e.kind == kind)
    }

    /// Insert or replace the edge with the same target and kind.
    pub fn add_edge(&mut self, from: CellPos, edge: Edge) {
        let list = self.edges.entry(from).or_default();
        match list.iter_mut().find(|e| e.to == edge.to && e.kind == edge.kind) {
            Some(existing) => *existing = edge,
            None => list.push(edge),
        }
    }

    pub fn connect_inter(&mut self, a: CellPos, b: CellPos) {
        self.add_edge(a, Edge::inter(b, INTER_EDGE_COST));
        self.add_edge(b, Edge::inter(a, INTER_EDGE_COST));
    }

    /// `path` runs from `a` to `b`; the mirror edge gets it reversed at the same cost.
    pub fn connect_intra(&mut self, a: CellPos, b: CellPos, cost: i32, path: Vec<CellPos>) {
        let mut reversed = path.clone();
        reversed.reverse();
        self.add_edge(a, Edge::intra(b, cost, path));
        self.add_edge(b, Edge::intra(a, cost, reversed));
    }

    /// Drop the `from -> to` edge of `kind` and its mirror.
    pub fn disconnect(&mut self, a: CellPos, b: CellPos, kind: EdgeKind) -> usize {
        self.remove_edges(a, |e| e.to == b && e.kind == kind) + self.remove_edges(b, |e| e.to == a && e.kind == kind)
    }

    /// Remove outgoing edges of `from` matching `doomed`. The node stays even if it ends up bare.
    pub fn remove_edges(&mut self, from: CellPos, doomed: impl Fn(&Edge) -> bool) -> usize {
        match self.edges.get_mut(&from) {
            Some(list) => {
                let before = list.len();
                list.retain(|e| !doomed(e));
                before - list.len()
            }
            None => 0,
        }
    }

    /// Remove `node`, its edges and every mirror pointing back at it.
    pub fn remove_node(&mut self, node: CellPos) -> bool {
        let Some(list) = self.edges.remove(&node) else {
            return false;
        };
        for edge in list {
            if let Some(back) = self.edges.get_mut(&edge.to) {
                back.retain(|e| e.to != node);
            }
        }
        true
    }

    /// Cheapest node sequence from `from` to `to` over abstract edge costs.
    pub fn route(&self, from: CellPos, to: CellPos) -> Option<(i32, Vec<CellPos>)> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        let mut dist: HashMap<CellPos, i32> = HashMap::new();
        let mut prev: HashMap<CellPos, CellPos> = HashMap::new();
        let mut queue = PriorityQueue::with_capacity(self.edges.len());
        dist.insert(from, 0);
        queue.add(0, from);

        while let Ok((cost, node)) = queue.pop() {
            if dist.get(&node).map_or(false, |&d| d < cost) {
                continue;
            }
            if node == to {
                let mut nodes = vec![to];
                let mut current = to;
                while let Some(&p) = prev.get(&current) {
                    nodes.push(p);
                    current = p;
                }
                nodes.reverse();
                return Some((cost, nodes));
            }
            for edge in self.edges(node) {
                let next = cost.saturating_add(edge.cost);
                if dist.get(&edge.to).map_or(true, |&d| next < d) {
                    dist.insert(edge.to, next);
                    prev.insert(edge.to, node);
                    queue.add(next, edge.to);
                }
            }
        }
        None
    }

    /// Refine an abstract route into concrete cells using the cached intra paths.
    pub fn splice(&self, route: &[CellPos]) -> Option<Vec<CellPos>> {
        let mut cells = vec![*route.first()?];
        for pair in route.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if let Some(edge) = self.edge(a, b, EdgeKind::Intra) {
                cells.extend(edge.path.iter().skip(1).copied());
            } else if self.edge(a, b, EdgeKind::Inter).is_some() {
                cells.push(b);
            } else {
                return None;
            }
        }
        Some(cells)
    }
}
