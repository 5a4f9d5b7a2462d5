//! Public graph handle: version dispatch over the node-table and
//! adjacency-list primitives.
//!
//! Mutations (`add_node`, `add_edge`, `add_directed_edge`,
//! `nodelist_expand`) return `Result<_, GraphError>` so allocation and I/O
//! failures are reported through the typed error boundary. Queries
//! (`degree`, `neighbour`, `incident`, `edge_ends`, ...) keep the sentinel
//! contract from the original API: "no such neighbour" is a normal outcome,
//! not a failure.

use crate::codec::{NONE48, NONE64};
use crate::config::GraphOptions;
use crate::edge;
use crate::error::{GraphError, Result};
use crate::header::{self, VERSION_1, VERSION_2};
use crate::node_table;
use crate::storage::Storage;
use std::path::Path;
use tracing::instrument;

/// Sentinel returned by node-valued queries when there is no such node.
pub const INVALID_NODE: u64 = NONE48;
/// Sentinel returned by edge-valued queries when there is no such edge.
pub const INVALID_EDGE: u64 = NONE64;

/// A graph backed by a single memory-mapped file.
#[derive(Debug)]
pub struct Graph {
    storage: Storage,
    version: u8,
}

impl Graph {
    /// Creates a new, empty, anonymous (unnamed) graph of the given version.
    ///
    /// # Errors
    ///
    /// Returns an error if the anonymous backing file cannot be created or
    /// mapped.
    #[instrument(skip(opts))]
    pub fn new(version: u8, opts: &GraphOptions) -> Result<Self> {
        let storage = Storage::create_temp(version, opts)?;
        Ok(Self { storage, version })
    }

    /// Creates a new, empty graph backed by a named file.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be created, another writer already
    /// holds the exclusive lock, or the file cannot be mapped.
    #[instrument(skip(opts), fields(path = %path.as_ref().display()))]
    pub fn create<P: AsRef<Path>>(path: P, version: u8, opts: &GraphOptions) -> Result<Self> {
        let storage = Storage::create(path, version, opts)?;
        Ok(Self { storage, version })
    }

    /// Opens a graph at `path`. If the file is missing or empty and
    /// `readonly` is false, it is initialized as a fresh v2 graph.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is missing or empty and `readonly` is
    /// true, if a writable open cannot acquire the exclusive lock, or if
    /// the file fails the header/magic validation.
    #[instrument(skip(opts), fields(path = %path.as_ref().display(), readonly))]
    pub fn open<P: AsRef<Path>>(path: P, readonly: bool, opts: &GraphOptions) -> Result<Self> {
        let path = path.as_ref();
        let needs_init = std::fs::metadata(path).map_or(true, |m| m.len() == 0);
        if needs_init {
            if readonly {
                return Err(GraphError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "cannot initialize a read-only graph handle",
                )));
            }
            return Self::create(path, VERSION_2, opts);
        }
        let storage = Storage::open(path, readonly, opts)?;
        let version = header::version(storage.bytes());
        Ok(Self { storage, version })
    }

    /// Flushes and releases the backing file. Best-effort: errors during
    /// the final flush are reported, but the handle is consumed either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or sync fails.
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }

    /// The file format version: `VERSION_1` (undirected) or `VERSION_2`
    /// (directed).
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Number of nodes currently in the graph.
    #[must_use]
    pub fn nodes(&self) -> u64 {
        header::node_count(self.storage.bytes())
    }

    /// Number of edges currently in the graph.
    #[must_use]
    pub fn edges(&self) -> u64 {
        header::edge_count(self.storage.bytes())
    }

    fn node_in_range(&self, n: u64) -> bool {
        n < self.nodes()
    }

    fn check_node(&self, n: u64) -> Result<()> {
        if self.node_in_range(n) {
            Ok(())
        } else {
            Err(GraphError::OutOfRange { what: "node", id: n })
        }
    }

    /// Grows the node table to hold at least `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is read-only or the backing file
    /// cannot grow.
    pub fn nodelist_expand(&mut self, capacity: u64) -> Result<()> {
        node_table::nodelist_expand(&mut self.storage, capacity)
    }

    /// Appends a node and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is read-only or the node table
    /// cannot grow to make room for it.
    pub fn add_node(&mut self) -> Result<u64> {
        node_table::add_node(&mut self.storage)
    }

    /// Undirected edge insertion. On a v2 graph this is defined as two
    /// `add_directed_edge` calls (n0→n1, n1→n0); callers on v2 files that
    /// want true undirected semantics must rely on this, not call
    /// `add_directed_edge` twice themselves with different edge ids in mind.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is out of range or the handle
    /// is read-only.
    pub fn add_edge(&mut self, n0: u64, n1: u64) -> Result<u64> {
        self.check_node(n0)?;
        self.check_node(n1)?;
        if self.version == VERSION_1 {
            edge::add_edge_v1(&mut self.storage, n0, n1)
        } else {
            edge::add_directed_edge_v2(&mut self.storage, n0, n1)?;
            edge::add_directed_edge_v2(&mut self.storage, n1, n0)
        }
    }

    /// Directed edge insertion. Fails with `WrongVersion` on a v1 graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph is not v2, either endpoint is out of
    /// range, or the handle is read-only.
    pub fn add_directed_edge(&mut self, src: u64, dst: u64) -> Result<u64> {
        if self.version != VERSION_2 {
            return Err(GraphError::WrongVersion {
                expected: VERSION_2,
                found: self.version,
            });
        }
        self.check_node(src)?;
        self.check_node(dst)?;
        edge::add_directed_edge_v2(&mut self.storage, src, dst)
    }

    /// v1 degree of `n`. Returns `INVALID_NODE` if `n` is out of range or
    /// the graph is not v1.
    #[must_use]
    pub fn degree(&self, n: u64) -> u64 {
        if self.version != VERSION_1 || !self.node_in_range(n) {
            return INVALID_NODE;
        }
        edge::v1_degree(&self.storage, n)
    }

    /// v1 `i`-th neighbour of `n`, most-recently-inserted first.
    #[must_use]
    pub fn neighbour(&self, n: u64, i: u64) -> u64 {
        if self.version != VERSION_1 || !self.node_in_range(n) {
            return INVALID_NODE;
        }
        edge::v1_neighbour(&self.storage, n, i).unwrap_or(INVALID_NODE)
    }

    /// v1 `i`-th incident edge id of `n`.
    #[must_use]
    pub fn incident(&self, n: u64, i: u64) -> u64 {
        if self.version != VERSION_1 || !self.node_in_range(n) {
            return INVALID_EDGE;
        }
        edge::v1_incident(&self.storage, n, i).unwrap_or(INVALID_EDGE)
    }

    /// v2 out-degree of `n`, derived by walking the out-list.
    #[must_use]
    pub fn out_degree(&self, n: u64) -> u64 {
        if self.version != VERSION_2 || !self.node_in_range(n) {
            return INVALID_NODE;
        }
        edge::v2_out_degree(&self.storage, n)
    }

    /// v2 in-degree of `n`, derived by walking the in-list.
    #[must_use]
    pub fn in_degree(&self, n: u64) -> u64 {
        if self.version != VERSION_2 || !self.node_in_range(n) {
            return INVALID_NODE;
        }
        edge::v2_in_degree(&self.storage, n)
    }

    /// v2 `i`-th out-neighbour of `n`.
    #[must_use]
    pub fn out_neighbour(&self, n: u64, i: u64) -> u64 {
        if self.version != VERSION_2 || !self.node_in_range(n) {
            return INVALID_NODE;
        }
        edge::v2_out_neighbour(&self.storage, n, i).unwrap_or(INVALID_NODE)
    }

    /// v2 `i`-th in-neighbour of `n`.
    #[must_use]
    pub fn in_neighbour(&self, n: u64, i: u64) -> u64 {
        if self.version != VERSION_2 || !self.node_in_range(n) {
            return INVALID_NODE;
        }
        edge::v2_in_neighbour(&self.storage, n, i).unwrap_or(INVALID_NODE)
    }

    /// v2 `i`-th out-incident edge id of `n`.
    #[must_use]
    pub fn out_incident(&self, n: u64, i: u64) -> u64 {
        if self.version != VERSION_2 || !self.node_in_range(n) {
            return INVALID_EDGE;
        }
        edge::v2_out_incident(&self.storage, n, i).unwrap_or(INVALID_EDGE)
    }

    /// v2 `i`-th in-incident edge id of `n`.
    #[must_use]
    pub fn in_incident(&self, n: u64, i: u64) -> u64 {
        if self.version != VERSION_2 || !self.node_in_range(n) {
            return INVALID_EDGE;
        }
        edge::v2_in_incident(&self.storage, n, i).unwrap_or(INVALID_EDGE)
    }

    /// Decodes the two endpoints of `edge_id`: (A, B) for v1, (src, dst)
    /// for v2. Returns `(INVALID_NODE, INVALID_NODE)` if `edge_id` doesn't
    /// leave room for a full edge record below the free watermark.
    ///
    /// The node table can relocate above already-written edge records
    /// (`nodelist_expand` grows it at the current watermark), so its
    /// current position is not a valid lower bound for the heap; only the
    /// watermark is checked here.
    #[must_use]
    pub fn edge_ends(&self, edge_id: u64) -> (u64, u64) {
        let watermark = header::free_watermark(self.storage.bytes());
        let edge_record_size = header::EDGE_RECORD_SIZE as u64;
        if edge_id.checked_add(edge_record_size).is_none_or(|end| end > watermark) {
            return (INVALID_NODE, INVALID_NODE);
        }
        match self.version {
            VERSION_1 => edge::v1_edge_ends(&self.storage, edge_id),
            _ => edge::v2_edge_ends(&self.storage, edge_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> GraphOptions {
        GraphOptions::default()
    }

    /// S1: v2 tiny graph.
    #[test]
    fn s1_v2_tiny() {
        let mut g = Graph::new(VERSION_2, &opts()).unwrap();
        let n0 = g.add_node().unwrap();
        let n1 = g.add_node().unwrap();
        let n2 = g.add_node().unwrap();
        assert_eq!((n0, n1, n2), (0, 1, 2));

        g.add_directed_edge(0, 1).unwrap();
        g.add_directed_edge(1, 2).unwrap();
        let e0 = g.out_incident(0, 0);
        let e1 = g.out_incident(1, 0);

        assert_eq!(g.out_degree(0), 1);
        assert_eq!(g.out_degree(1), 1);
        assert_eq!(g.out_degree(2), 0);
        assert_eq!(g.in_degree(0), 0);
        assert_eq!(g.in_degree(1), 1);
        assert_eq!(g.in_degree(2), 1);
        assert_eq!(g.out_neighbour(0, 0), 1);
        assert_eq!(g.in_neighbour(2, 0), 1);
        assert_ne!(e0, INVALID_EDGE);
        assert_ne!(e1, INVALID_EDGE);
    }

    /// S2: closing and reopening a v2 graph read-only preserves its
    /// degrees and neighbours.
    #[test]
    fn s2_v2_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s2.slgraph");

        let mut g = Graph::create(&path, VERSION_2, &opts()).unwrap();
        g.add_node().unwrap();
        g.add_node().unwrap();
        g.add_node().unwrap();
        g.add_directed_edge(0, 1).unwrap();
        g.add_directed_edge(1, 2).unwrap();
        g.close().unwrap();

        let g = Graph::open(&path, true, &opts()).unwrap();
        assert_eq!(g.version(), VERSION_2);
        assert_eq!(g.nodes(), 3);
        assert_eq!(g.edges(), 2);
        assert_eq!(g.out_degree(0), 1);
        assert_eq!(g.in_degree(1), 1);
        assert_eq!(g.out_neighbour(0, 0), 1);
        assert_eq!(g.out_neighbour(1, 0), 2);
        assert_eq!(g.in_neighbour(2, 0), 1);
    }

    /// S3: capacity growth.
    #[test]
    fn s3_capacity_growth() {
        let mut g = Graph::new(VERSION_2, &opts()).unwrap();
        g.nodelist_expand(4).unwrap();
        let mut ids = vec![];
        for _ in 0..5 {
            ids.push(g.add_node().unwrap());
        }
        assert_eq!(g.nodes(), 5);
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        for id in ids {
            assert_eq!(g.out_degree(id), 0);
        }
    }

    /// S4: v1 LIFO ordering.
    #[test]
    fn s4_v1_lifo() {
        let mut g = Graph::new(VERSION_1, &opts()).unwrap();
        g.add_node().unwrap();
        g.add_node().unwrap();
        g.add_node().unwrap();
        g.add_edge(0, 1).unwrap();
        g.add_edge(0, 2).unwrap();
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.neighbour(0, 0), 2);
        assert_eq!(g.neighbour(0, 1), 1);
    }

    /// S6: v2 self-loop.
    #[test]
    fn s6_v2_self_loop() {
        let mut g = Graph::new(VERSION_2, &opts()).unwrap();
        g.add_node().unwrap();
        g.add_directed_edge(0, 0).unwrap();
        assert_eq!(g.out_degree(0), 1);
        assert_eq!(g.in_degree(0), 1);
        assert_eq!(g.out_neighbour(0, 0), 0);
        assert_eq!(g.in_neighbour(0, 0), 0);
        assert_eq!(g.edges(), 1);
    }

    #[test]
    fn add_directed_edge_fails_on_v1() {
        let mut g = Graph::new(VERSION_1, &opts()).unwrap();
        g.add_node().unwrap();
        g.add_node().unwrap();
        let err = g.add_directed_edge(0, 1).unwrap_err();
        assert!(matches!(err, GraphError::WrongVersion { .. }));
    }

    #[test]
    fn out_of_range_node_is_an_error_for_mutation() {
        let mut g = Graph::new(VERSION_2, &opts()).unwrap();
        let err = g.add_directed_edge(0, 1).unwrap_err();
        assert!(matches!(err, GraphError::OutOfRange { what: "node", .. }));
    }

    #[test]
    fn out_of_range_node_is_a_sentinel_for_query() {
        let g = Graph::new(VERSION_2, &opts()).unwrap();
        assert_eq!(g.out_degree(0), INVALID_NODE);
        assert_eq!(g.out_neighbour(0, 0), INVALID_NODE);
    }

    /// `edge_ends` must keep decoding edges allocated before a node-table
    /// relocation: `nodelist_expand` moves the table to the current
    /// watermark, which sits above every edge record already on the heap.
    #[test]
    fn edge_ends_survives_a_nodelist_relocation() {
        let mut g = Graph::new(VERSION_2, &opts()).unwrap();
        g.add_node().unwrap();
        g.add_node().unwrap();
        g.add_directed_edge(0, 1).unwrap();
        let edge_id = g.out_incident(0, 0);
        assert_ne!(edge_id, INVALID_EDGE);

        g.nodelist_expand(64).unwrap();

        assert_eq!(g.edge_ends(edge_id), (0, 1));
    }
}
