//! Visibility graphs over punched land and multi-source shortest paths.

mod dijkstra;
mod visibility_graph;


pub use dijkstra::{multi_source_dijkstra, DijkstraResult, NO_PREDECESSOR};
pub use visibility_graph::VisibilityGraph;
