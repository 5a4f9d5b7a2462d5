//! Options fixed at graph-creation time.
//!
//! Mirrors the teacher's parameter-struct-at-open-time pattern: these
//! values are baked into the header when a file is created with `new` and
//! are re-derived from the header on every subsequent `open`; they are
//! never renegotiated for an existing file.

/// Tunables for `Graph::new`.
#[derive(Debug, Clone, Copy)]
pub struct GraphOptions {
    /// Node-table slots reserved up front, before the first `nodelist_expand`.
    pub initial_node_capacity: u64,
    /// Page-alignment granularity used when the backing file must grow.
    pub growth_page_size: usize,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            initial_node_capacity: 16,
            growth_page_size: 4096,
        }
    }
}
