use fixedbitset::FixedBitSet;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Marks a node with no predecessor (a source, or unreached).
pub const NO_PREDECESSOR: usize = usize::MAX;

/// Distances and predecessors from a multi-source search. Unreached nodes
/// have an infinite distance.
#[derive(Clone, Debug)]
pub struct DijkstraResult {
    pub distances: Vec<f64>,
    pub predecessors: Vec<usize>,
}

impl DijkstraResult {
    #[inline]
    pub fn distance(&self, node: usize) -> Option<f64> {
        let d = self.distances[node];
        d.is_finite().then_some(d)
    }

    /// Nodes from the originating source to `node`, inclusive.
    pub fn path_to(&self, node: usize) -> Option<Vec<usize>> {
        self.distance(node)?;
        let mut path = vec![node];
        let mut current = node;
        while self.predecessors[current] != NO_PREDECESSOR {
            current = self.predecessors[current];
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

/// Min-heap entry; equal costs pop in push order.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    cost: f64,
    sequence: u64,
    node: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.sequence.cmp(&other.sequence))
    }
}

/// Shortest distances from several weighted sources at once.
///
/// # Algorithm
/// Every `(node, initial_cost)` source is seeded into one heap, which makes
/// the result identical to a search from a virtual root joined to each source
/// by its initial cost. If `destinations` is given the search stops as soon as
/// every destination has been settled; distances of nodes not yet settled at
/// that point are upper bounds only.
///
/// Predecessors change only on strict improvement, so among equal-cost routes
/// the one relaxed first wins.
///
/// `neighbors` is called once per settled node and must yield non-negative
/// edge costs.
pub fn multi_source_dijkstra<F, I>(
    node_count: usize,
    sources: &[(usize, f64)],
    destinations: Option<&FixedBitSet>,
    mut neighbors: F,
) -> DijkstraResult
where
    F: FnMut(usize) -> I,
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut distances = vec![f64::INFINITY; node_count];
    let mut predecessors = vec![NO_PREDECESSOR; node_count];
    let mut settled = FixedBitSet::with_capacity(node_count);
    let mut remaining = destinations.map_or(usize::MAX, |d| d.count_ones(..));
    let mut heap: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
    let mut sequence = 0u64;

    for &(node, cost) in sources {
        if cost < distances[node] {
            distances[node] = cost;
            heap.push(Reverse(OpenEntry { cost, sequence, node }));
            sequence += 1;
        }
    }

    if remaining == 0 {
        heap.clear();
    }

    while let Some(Reverse(OpenEntry { cost, node, .. })) = heap.pop() {
        if settled.contains(node) || cost > distances[node] {
            continue;
        }
        settled.insert(node);

        if let Some(targets) = destinations {
            if targets.contains(node) {
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
        }

        for (next, edge_cost) in neighbors(node) {
            let new_cost = cost + edge_cost;
            if new_cost < distances[next] {
                distances[next] = new_cost;
                predecessors[next] = node;
                heap.push(Reverse(OpenEntry {
                    cost: new_cost,
                    sequence,
                    node: next,
                }));
                sequence += 1;
            }
        }
    }

    DijkstraResult {
        distances,
        predecessors,
    }
}
