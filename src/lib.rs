//! slgraph, an embeddable, file-backed directed/undirected graph engine.
//!
//! A graph is a single memory-mapped file: a packed header, a contiguous
//! node table, and a heap of edge records threaded into per-node
//! adjacency lists via file-relative offsets. There is no page cache or
//! query planner here: `slgraph` is a storage primitive, not a database.
//!
//! # Example
//!
//! ```no_run
//! use slgraph::{Graph, GraphOptions};
//!
//! # fn main() -> slgraph::Result<()> {
//! let mut g = Graph::create("graph.slgraph", slgraph::VERSION_2, &GraphOptions::default())?;
//! let a = g.add_node()?;
//! let b = g.add_node()?;
//! g.add_directed_edge(a, b)?;
//! assert_eq!(g.out_degree(a), 1);
//! g.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design Philosophy
//!
//! `slgraph` does not aim to be a graph database, a query engine, or a
//! distributed system. Traversal algorithms (BFS/DFS, connectivity,
//! shortest paths) and file converters are external clients built on top
//! of the handful of operations this crate exposes.

mod codec;
mod compact;
mod config;
mod edge;
mod error;
mod graph;
mod header;
mod node_table;
mod storage;

pub use config::GraphOptions;
pub use error::{GraphError, Result};
pub use graph::{Graph, INVALID_EDGE, INVALID_NODE};
pub use header::{VERSION_1, VERSION_2};

/// Rebuilds `src` into a fresh, densely packed graph at `dst_path`.
///
/// # Errors
///
/// Returns an error if `dst_path` cannot be created or the rebuild fails
/// partway through.
pub fn copy<P: AsRef<std::path::Path>>(
    dst_path: P,
    src: &Graph,
    opts: &GraphOptions,
) -> Result<Graph> {
    compact::copy(dst_path, src, opts)
}
