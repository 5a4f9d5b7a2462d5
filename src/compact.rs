//! Compact-copy: rebuilds a graph into a densely packed destination file.
//!
//! Implemented purely in terms of the public `Graph` API (walk `src`,
//! `add_node`/`add_edge`/`add_directed_edge` into `dst`) rather than raw
//! byte copies, since the whole point is to drop the wasted heap gaps left
//! by capacity-doubling growth in `src`.

use crate::config::GraphOptions;
use crate::error::Result;
use crate::graph::Graph;
use crate::header::VERSION_1;
use std::path::Path;
use tracing::{info, instrument};

/// Rebuilds `src` into a fresh graph at `dst_path`, preserving node ids and
/// the full edge set.
#[instrument(skip(dst_path, src, opts), fields(src_nodes = src.nodes(), src_edges = src.edges()))]
pub fn copy<P: AsRef<Path>>(dst_path: P, src: &Graph, opts: &GraphOptions) -> Result<Graph> {
    let mut dst = Graph::create(dst_path, src.version(), opts)?;
    let n = src.nodes();
    dst.nodelist_expand(n)?;
    for _ in 0..n {
        dst.add_node()?;
    }

    if src.version() == VERSION_1 {
        copy_undirected(&mut dst, src, n)?;
    } else {
        copy_directed(&mut dst, src, n)?;
    }

    info!(
        dst_nodes = dst.nodes(),
        dst_edges = dst.edges(),
        "compacted graph"
    );
    Ok(dst)
}

/// v1 edges are threaded into both endpoints' lists, so a plain walk would
/// add each edge twice. The `i < j` rule (from the design notes' source-bug
/// fix) dedups ordinary edges; self-loops need a second, separate dedup
/// since the same edge record occupies two list positions within a single
/// node's own list (see the degree-counting convention in `edge.rs`).
fn copy_undirected(dst: &mut Graph, src: &Graph, n: u64) -> Result<()> {
    for i in 0..n {
        let degree = src.degree(i);
        let mut last_self_loop_edge = None;
        for k in 0..degree {
            let j = src.neighbour(i, k);
            if i < j {
                dst.add_edge(i, j)?;
            } else if i == j {
                let edge_id = src.incident(i, k);
                if last_self_loop_edge != Some(edge_id) {
                    dst.add_edge(i, j)?;
                    last_self_loop_edge = Some(edge_id);
                }
            }
        }
    }
    Ok(())
}

fn copy_directed(dst: &mut Graph, src: &Graph, n: u64) -> Result<()> {
    for i in 0..n {
        let out_degree = src.out_degree(i);
        for k in 0..out_degree {
            let j = src.out_neighbour(i, k);
            dst.add_directed_edge(i, j)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::VERSION_2;

    fn opts() -> GraphOptions {
        GraphOptions::default()
    }

    /// S5: copy compaction, built on S4 (v1 LIFO).
    #[test]
    fn s5_copy_compaction_v1() {
        let mut src = Graph::new(VERSION_1, &opts()).unwrap();
        src.add_node().unwrap();
        src.add_node().unwrap();
        src.add_node().unwrap();
        src.add_edge(0, 1).unwrap();
        src.add_edge(0, 2).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dst_path = dir.path().join("dst.slgraph");
        let dst = copy(&dst_path, &src, &opts()).unwrap();

        assert_eq!(dst.nodes(), src.nodes());
        assert_eq!(dst.edges(), src.edges());
        for n in 0..src.nodes() {
            assert_eq!(dst.degree(n), src.degree(n));
        }
    }

    #[test]
    fn copy_preserves_directed_self_loop() {
        let mut src = Graph::new(VERSION_2, &opts()).unwrap();
        src.add_node().unwrap();
        src.add_directed_edge(0, 0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dst_path = dir.path().join("dst.slgraph");
        let dst = copy(&dst_path, &src, &opts()).unwrap();

        assert_eq!(dst.out_degree(0), 1);
        assert_eq!(dst.in_degree(0), 1);
        assert_eq!(dst.edges(), 1);
    }

    #[test]
    fn copy_preserves_undirected_self_loop_exactly_once() {
        let mut src = Graph::new(VERSION_1, &opts()).unwrap();
        src.add_node().unwrap();
        src.add_edge(0, 0).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dst_path = dir.path().join("dst.slgraph");
        let dst = copy(&dst_path, &src, &opts()).unwrap();

        assert_eq!(dst.edges(), 1);
        assert_eq!(dst.degree(0), src.degree(0));
    }

    #[test]
    fn destination_file_is_no_larger_than_source() {
        let dir = tempfile::tempdir().unwrap();
        let src_path = dir.path().join("src.slgraph");
        let mut src = Graph::create(&src_path, VERSION_1, &opts()).unwrap();
        for _ in 0..3 {
            src.add_node().unwrap();
        }
        src.add_edge(0, 1).unwrap();
        src.add_edge(0, 2).unwrap();
        // Force a capacity-doubling event to leave wasted heap gaps.
        src.nodelist_expand(64).unwrap();
        let src_len = std::fs::metadata(&src_path).unwrap().len();

        let dst_path = dir.path().join("dst.slgraph");
        let dst = copy(&dst_path, &src, &opts()).unwrap();
        drop(dst);
        let dst_len = std::fs::metadata(&dst_path).unwrap().len();

        assert!(dst_len <= src_len);
    }
}
