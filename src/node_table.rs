//! Node table: a contiguous, fixed-stride array of node entries.
//!
//! Lookups are O(1): `node_entry_offset(id) = node_table_start + id * stride`.
//! Growing the table (`nodelist_expand`) is O(nodes) and relocates every
//! existing entry, which is why it goes through the allocator rather than
//! being grown in place.

use crate::codec::{read_u48_le, read_u64_le, write_u48_le, write_u64_le, NONE48, NONE64};
use crate::error::{GraphError, Result};
use crate::header::{self, VERSION_1};
use crate::storage::Storage;
use tracing::{debug, instrument};

/// Byte offset of node entry `id` within the mapping.
#[must_use]
pub fn node_entry_offset(node_table_start: u64, stride: u64, id: u64) -> u64 {
    node_table_start + id * stride
}

/// Grows the node table to hold at least `capacity` slots, relocating the
/// existing entries. No-op if the current capacity already suffices.
#[instrument(skip(storage))]
pub fn nodelist_expand(storage: &mut Storage, capacity: u64) -> Result<()> {
    let version = header::version(storage.bytes());
    let old_capacity = header::node_table_capacity(storage.bytes());
    if old_capacity >= capacity {
        return Ok(());
    }
    let stride = header::node_stride(version) as u64;
    let nodes = header::node_count(storage.bytes());
    let old_start = header::node_table_start(storage.bytes());

    let new_region_len = capacity * stride;
    let new_start = storage.allocate(new_region_len)?;

    let live_len = (nodes * stride) as usize;
    let buf = storage.bytes_mut()?;
    buf.copy_within(
        old_start as usize..old_start as usize + live_len,
        new_start as usize,
    );
    // Zero the newly available slots beyond the relocated live entries.
    let zero_start = new_start as usize + live_len;
    let zero_end = new_start as usize + new_region_len as usize;
    buf[zero_start..zero_end].fill(0);

    header::set_node_table_start(buf, new_start);
    header::set_node_table_capacity(buf, capacity);
    debug!(old_capacity, capacity, "expanded node table");
    Ok(())
}

/// Appends a fresh, zero-initialized node entry and returns its id.
///
/// Doubles capacity first if the table is full (minimum capacity 1).
pub fn add_node(storage: &mut Storage) -> Result<u64> {
    if storage.readonly() {
        return Err(GraphError::ReadOnly);
    }
    let version = header::version(storage.bytes());
    let nodes = header::node_count(storage.bytes());
    let capacity = header::node_table_capacity(storage.bytes());
    if nodes == capacity {
        nodelist_expand(storage, (capacity * 2).max(1))?;
    }

    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(version) as u64;
    let entry_off = node_entry_offset(node_table_start, stride, nodes) as usize;

    let buf = storage.bytes_mut()?;
    if version == VERSION_1 {
        write_u48_le(&mut buf[entry_off..], NONE48);
        write_u48_le(&mut buf[entry_off + 6..], 0);
    } else {
        write_u64_le(&mut buf[entry_off..], NONE64);
        write_u64_le(&mut buf[entry_off + 8..], NONE64);
        buf[entry_off + 16..entry_off + 22].fill(0);
    }
    header::set_node_count(buf, nodes + 1);
    Ok(nodes)
}

/// Reads the v1 list-head offset and degree counter for node `id`.
#[must_use]
pub fn v1_head_and_degree(storage: &Storage, id: u64) -> (u64, u64) {
    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(VERSION_1) as u64;
    let off = node_entry_offset(node_table_start, stride, id) as usize;
    let buf = storage.bytes();
    (read_u48_le(&buf[off..]), read_u48_le(&buf[off + 6..]))
}

/// Sets the v1 list-head offset for node `id`.
pub fn v1_set_head(storage: &mut Storage, id: u64, head: u64) -> Result<()> {
    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(VERSION_1) as u64;
    let off = node_entry_offset(node_table_start, stride, id) as usize;
    write_u48_le(&mut storage.bytes_mut()?[off..], head);
    Ok(())
}

/// Sets the v1 degree counter for node `id`.
pub fn v1_set_degree(storage: &mut Storage, id: u64, degree: u64) -> Result<()> {
    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(VERSION_1) as u64;
    let off = node_entry_offset(node_table_start, stride, id) as usize;
    write_u48_le(&mut storage.bytes_mut()?[off + 6..], degree);
    Ok(())
}

/// Reads the v2 out-list and in-list head offsets for node `id`.
#[must_use]
pub fn v2_heads(storage: &Storage, id: u64) -> (u64, u64) {
    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(header::VERSION_2) as u64;
    let off = node_entry_offset(node_table_start, stride, id) as usize;
    let buf = storage.bytes();
    (read_u64_le(&buf[off..]), read_u64_le(&buf[off + 8..]))
}

/// Sets the v2 out-list head offset for node `id`.
pub fn v2_set_out_head(storage: &mut Storage, id: u64, head: u64) -> Result<()> {
    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(header::VERSION_2) as u64;
    let off = node_entry_offset(node_table_start, stride, id) as usize;
    write_u64_le(&mut storage.bytes_mut()?[off..], head);
    Ok(())
}

/// Sets the v2 in-list head offset for node `id`.
pub fn v2_set_in_head(storage: &mut Storage, id: u64, head: u64) -> Result<()> {
    let node_table_start = header::node_table_start(storage.bytes());
    let stride = header::node_stride(header::VERSION_2) as u64;
    let off = node_entry_offset(node_table_start, stride, id) as usize;
    write_u64_le(&mut storage.bytes_mut()?[off + 8..], head);
    Ok(())
}
