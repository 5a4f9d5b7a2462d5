//! File header layout and accessors.
//!
//! The header is not a `repr(C)` struct overlay: its fields are packed at
//! mixed widths (4, 1, 6, 6, 6, 8, 8 bytes) with no padding, so every field
//! is read and written through the byte codec at its fixed offset instead.

use crate::codec::{read_u48_le, read_u64_le, write_u48_le, write_u64_le};

/// Magic number identifying an slgraph file.
pub const MAGIC: [u8; 4] = *b"SLGR";

/// Version byte: undirected graph, 48-bit adjacency-head fields.
pub const VERSION_1: u8 = 1;
/// Version byte: directed graph, 64-bit adjacency-head fields.
pub const VERSION_2: u8 = 2;

/// Byte offsets of each header field.
pub mod offset {
    pub const MAGIC: usize = 0;
    pub const VERSION: usize = 4;
    pub const NODE_COUNT: usize = 5;
    pub const EDGE_COUNT: usize = 11;
    pub const NODE_TABLE_CAPACITY: usize = 17;
    pub const FREE_WATERMARK: usize = 23;
    pub const NODE_TABLE_START: usize = 31;
}

/// Total size of the fixed header prefix.
pub const HEADER_SIZE: usize = 39;

/// Size in bytes of a node-table slot for a given version.
#[must_use]
pub fn node_stride(version: u8) -> usize {
    match version {
        VERSION_1 => 12,
        _ => 22,
    }
}

/// Size in bytes of an edge record (same for both versions).
pub const EDGE_RECORD_SIZE: usize = 24;

/// Writes a freshly initialized header into `buf` for the given version.
///
/// `nodes = 0`, `edges = 0`, node-table capacity as given, free watermark and
/// node-table start both set just past the header.
pub fn init(buf: &mut [u8], version: u8, node_table_capacity: u64) {
    buf[..4].copy_from_slice(&MAGIC);
    buf[offset::VERSION] = version;
    write_u48_le(&mut buf[offset::NODE_COUNT..], 0);
    write_u48_le(&mut buf[offset::EDGE_COUNT..], 0);
    write_u48_le(&mut buf[offset::NODE_TABLE_CAPACITY..], node_table_capacity);
    let node_table_start = HEADER_SIZE as u64;
    let stride = node_stride(version) as u64;
    write_u64_le(
        &mut buf[offset::FREE_WATERMARK..],
        node_table_start + node_table_capacity * stride,
    );
    write_u64_le(&mut buf[offset::NODE_TABLE_START..], node_table_start);
}

/// Checks the magic number at the start of `buf`.
#[must_use]
pub fn has_valid_magic(buf: &[u8]) -> bool {
    buf.len() >= 4 && buf[offset::MAGIC..4] == MAGIC
}

#[must_use]
pub fn version(buf: &[u8]) -> u8 {
    buf[offset::VERSION]
}

#[must_use]
pub fn node_count(buf: &[u8]) -> u64 {
    read_u48_le(&buf[offset::NODE_COUNT..])
}

pub fn set_node_count(buf: &mut [u8], value: u64) {
    write_u48_le(&mut buf[offset::NODE_COUNT..], value);
}

#[must_use]
pub fn edge_count(buf: &[u8]) -> u64 {
    read_u48_le(&buf[offset::EDGE_COUNT..])
}

pub fn set_edge_count(buf: &mut [u8], value: u64) {
    write_u48_le(&mut buf[offset::EDGE_COUNT..], value);
}

#[must_use]
pub fn node_table_capacity(buf: &[u8]) -> u64 {
    read_u48_le(&buf[offset::NODE_TABLE_CAPACITY..])
}

pub fn set_node_table_capacity(buf: &mut [u8], value: u64) {
    write_u48_le(&mut buf[offset::NODE_TABLE_CAPACITY..], value);
}

#[must_use]
pub fn free_watermark(buf: &[u8]) -> u64 {
    read_u64_le(&buf[offset::FREE_WATERMARK..])
}

pub fn set_free_watermark(buf: &mut [u8], value: u64) {
    write_u64_le(&mut buf[offset::FREE_WATERMARK..], value);
}

#[must_use]
pub fn node_table_start(buf: &[u8]) -> u64 {
    read_u64_le(&buf[offset::NODE_TABLE_START..])
}

pub fn set_node_table_start(buf: &mut [u8], value: u64) {
    write_u64_le(&mut buf[offset::NODE_TABLE_START..], value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_sets_empty_counts_and_valid_magic() {
        let mut buf = [0u8; HEADER_SIZE];
        init(&mut buf, VERSION_2, 16);
        assert!(has_valid_magic(&buf));
        assert_eq!(version(&buf), VERSION_2);
        assert_eq!(node_count(&buf), 0);
        assert_eq!(edge_count(&buf), 0);
        assert_eq!(node_table_capacity(&buf), 16);
        assert_eq!(node_table_start(&buf), HEADER_SIZE as u64);
        assert_eq!(
            free_watermark(&buf),
            HEADER_SIZE as u64 + 16 * node_stride(VERSION_2) as u64
        );
    }

    #[test]
    fn field_roundtrip() {
        let mut buf = [0u8; HEADER_SIZE];
        init(&mut buf, VERSION_1, 4);
        set_node_count(&mut buf, 3);
        set_edge_count(&mut buf, 7);
        set_free_watermark(&mut buf, 1234);
        set_node_table_start(&mut buf, 39);
        assert_eq!(node_count(&buf), 3);
        assert_eq!(edge_count(&buf), 7);
        assert_eq!(free_watermark(&buf), 1234);
        assert_eq!(node_table_start(&buf), 39);
    }

    #[test]
    fn node_stride_depends_on_version() {
        assert_eq!(node_stride(VERSION_1), 12);
        assert_eq!(node_stride(VERSION_2), 22);
    }
}
