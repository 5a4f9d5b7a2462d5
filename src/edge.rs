//! Edge records and intrusive adjacency-list traversal.
//!
//! Every edge is a 24-byte record on the heap, threaded into its
//! endpoints' lists via next-link fields rather than stored in a separate
//! index. Traversal walks these links directly from the mapping; there is
//! no auxiliary structure to keep in sync.

use crate::codec::{read_u48_le, write_u48_le, NONE48, NONE64};
use crate::error::Result;
use crate::header::{self, EDGE_RECORD_SIZE};
use crate::node_table::{v1_head_and_degree, v1_set_degree, v1_set_head, v2_heads, v2_set_in_head, v2_set_out_head};
use crate::storage::Storage;

fn read_v1(storage: &Storage, offset: u64) -> (u64, u64, u64, u64) {
    let buf = &storage.bytes()[offset as usize..];
    (
        read_u48_le(buf),
        read_u48_le(&buf[6..]),
        read_u48_le(&buf[12..]),
        read_u48_le(&buf[18..]),
    )
}

fn read_v2(storage: &Storage, offset: u64) -> (u64, u64, u64, u64) {
    // Same physical layout as v1; kept as a separate reader for clarity at
    // call sites (src/dst/next-out/next-in rather than endpoint A/B).
    read_v1(storage, offset)
}

/// Appends an undirected edge between `n0` and `n1`, prepending it to both
/// endpoints' adjacency lists (a single list for self-loops).
pub fn add_edge_v1(storage: &mut Storage, n0: u64, n1: u64) -> Result<u64> {
    let (head0, _) = v1_head_and_degree(storage, n0);
    let (head1, _) = v1_head_and_degree(storage, n1);

    let offset = storage.allocate(EDGE_RECORD_SIZE as u64)?;
    let buf = storage.bytes_mut()?;
    let rec = &mut buf[offset as usize..offset as usize + EDGE_RECORD_SIZE];
    write_u48_le(rec, n0);
    write_u48_le(&mut rec[6..], n1);
    write_u48_le(&mut rec[12..], head0);
    write_u48_le(&mut rec[18..], head1);

    v1_set_head(storage, n0, offset)?;
    v1_set_head(storage, n1, offset)?;
    let (_, deg0) = v1_head_and_degree(storage, n0);
    v1_set_degree(storage, n0, deg0 + 1)?;
    let (_, deg1) = v1_head_and_degree(storage, n1);
    v1_set_degree(storage, n1, deg1 + 1)?;

    let buf = storage.bytes_mut()?;
    let edges = header::edge_count(buf) + 1;
    header::set_edge_count(buf, edges);
    Ok(offset)
}

/// Appends a directed edge from `src` to `dst`, prepending it to `src`'s
/// out-list and `dst`'s in-list independently.
pub fn add_directed_edge_v2(storage: &mut Storage, src: u64, dst: u64) -> Result<u64> {
    let (out_head, _) = v2_heads(storage, src);
    let (_, in_head) = v2_heads(storage, dst);

    let offset = storage.allocate(EDGE_RECORD_SIZE as u64)?;
    let buf = storage.bytes_mut()?;
    let rec = &mut buf[offset as usize..offset as usize + EDGE_RECORD_SIZE];
    write_u48_le(rec, src);
    write_u48_le(&mut rec[6..], dst);
    write_u48_le(&mut rec[12..], out_head);
    write_u48_le(&mut rec[18..], in_head);

    v2_set_out_head(storage, src, offset)?;
    v2_set_in_head(storage, dst, offset)?;

    let buf = storage.bytes_mut()?;
    let edges = header::edge_count(buf) + 1;
    header::set_edge_count(buf, edges);
    Ok(offset)
}

/// Reads the recorded v1 degree counter for node `n`.
#[must_use]
pub fn v1_degree(storage: &Storage, n: u64) -> u64 {
    v1_head_and_degree(storage, n).1
}

/// Finds the `i`-th entry in `n`'s v1 adjacency list.
///
/// A self-loop (both endpoints equal `n`) occupies two list positions, since
/// it was counted twice in the degree counter when inserted; every other
/// edge occupies exactly one.
fn v1_nth(storage: &Storage, n: u64, i: u64) -> Option<(u64, bool)> {
    let mut offset = v1_head_and_degree(storage, n).0;
    let mut remaining = i;
    loop {
        if offset == NONE48 {
            return None;
        }
        let (a, b, next_a, next_b) = read_v1(storage, offset);
        let self_loop = a == n && b == n;
        if self_loop {
            if remaining < 2 {
                return Some((offset, true));
            }
            remaining -= 2;
            offset = next_a;
        } else {
            if remaining == 0 {
                return Some((offset, a == n));
            }
            remaining -= 1;
            offset = if a == n { next_a } else { next_b };
        }
    }
}

/// The `i`-th neighbour of `n` in a v1 graph, most-recently-inserted first.
#[must_use]
pub fn v1_neighbour(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    let (offset, matched_a) = v1_nth(storage, n, i)?;
    let (a, b, _, _) = read_v1(storage, offset);
    Some(if matched_a { b } else { a })
}

/// The edge id of the `i`-th entry in `n`'s v1 adjacency list.
#[must_use]
pub fn v1_incident(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    v1_nth(storage, n, i).map(|(offset, _)| offset)
}

/// Decodes the two endpoints of a v1 edge record.
#[must_use]
pub fn v1_edge_ends(storage: &Storage, edge_id: u64) -> (u64, u64) {
    let (a, b, _, _) = read_v1(storage, edge_id);
    (a, b)
}

/// Counts `n`'s out-list by walking it; v2 does not cache degree.
#[must_use]
pub fn v2_out_degree(storage: &Storage, n: u64) -> u64 {
    let head = v2_heads(storage, n).0;
    if head == NONE64 {
        return 0;
    }
    let mut offset = head;
    let mut count = 1;
    loop {
        let next = read_v2(storage, offset).2;
        if next == NONE48 {
            return count;
        }
        count += 1;
        offset = next;
    }
}

/// Counts `n`'s in-list by walking it; v2 does not cache degree.
#[must_use]
pub fn v2_in_degree(storage: &Storage, n: u64) -> u64 {
    let head = v2_heads(storage, n).1;
    if head == NONE64 {
        return 0;
    }
    let mut offset = head;
    let mut count = 1;
    loop {
        let next = read_v2(storage, offset).3;
        if next == NONE48 {
            return count;
        }
        count += 1;
        offset = next;
    }
}

fn v2_out_nth(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    let head = v2_heads(storage, n).0;
    if head == NONE64 {
        return None;
    }
    let mut offset = head;
    let mut remaining = i;
    loop {
        if remaining == 0 {
            return Some(offset);
        }
        remaining -= 1;
        offset = read_v2(storage, offset).2;
        if offset == NONE48 {
            return None;
        }
    }
}

fn v2_in_nth(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    let head = v2_heads(storage, n).1;
    if head == NONE64 {
        return None;
    }
    let mut offset = head;
    let mut remaining = i;
    loop {
        if remaining == 0 {
            return Some(offset);
        }
        remaining -= 1;
        offset = read_v2(storage, offset).3;
        if offset == NONE48 {
            return None;
        }
    }
}

/// The `i`-th out-neighbour of `n` (the dst of the `i`-th out-list entry).
#[must_use]
pub fn v2_out_neighbour(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    v2_out_nth(storage, n, i).map(|offset| read_v2(storage, offset).1)
}

/// The `i`-th in-neighbour of `n` (the src of the `i`-th in-list entry).
#[must_use]
pub fn v2_in_neighbour(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    v2_in_nth(storage, n, i).map(|offset| read_v2(storage, offset).0)
}

/// Edge id of the `i`-th entry in `n`'s out-list.
#[must_use]
pub fn v2_out_incident(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    v2_out_nth(storage, n, i)
}

/// Edge id of the `i`-th entry in `n`'s in-list.
#[must_use]
pub fn v2_in_incident(storage: &Storage, n: u64, i: u64) -> Option<u64> {
    v2_in_nth(storage, n, i)
}

/// Decodes the src and dst of a v2 edge record.
#[must_use]
pub fn v2_edge_ends(storage: &Storage, edge_id: u64) -> (u64, u64) {
    let (src, dst, _, _) = read_v2(storage, edge_id);
    (src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphOptions;
    use crate::header::{VERSION_1, VERSION_2};
    use crate::node_table::add_node;

    fn v1_storage(n: u64) -> Storage {
        let opts = GraphOptions::default();
        let mut storage = Storage::create_temp(VERSION_1, &opts).unwrap();
        for _ in 0..n {
            add_node(&mut storage).unwrap();
        }
        storage
    }

    fn v2_storage(n: u64) -> Storage {
        let opts = GraphOptions::default();
        let mut storage = Storage::create_temp(VERSION_2, &opts).unwrap();
        for _ in 0..n {
            add_node(&mut storage).unwrap();
        }
        storage
    }

    #[test]
    fn v1_ordinary_edge_appears_once_in_each_endpoints_list() {
        let mut storage = v1_storage(2);
        let e = add_edge_v1(&mut storage, 0, 1).unwrap();
        assert_eq!(v1_degree(&storage, 0), 1);
        assert_eq!(v1_degree(&storage, 1), 1);
        assert_eq!(v1_neighbour(&storage, 0, 0), Some(1));
        assert_eq!(v1_neighbour(&storage, 1, 0), Some(0));
        assert_eq!(v1_incident(&storage, 0, 0), Some(e));
        assert_eq!(v1_incident(&storage, 1, 0), Some(e));
        assert_eq!(v1_edge_ends(&storage, e), (0, 1));
    }

    /// A v1 self-loop is one physical record but counts as two list
    /// positions within the single node's own list.
    #[test]
    fn v1_self_loop_counts_twice_but_is_one_record() {
        let mut storage = v1_storage(1);
        let e = add_edge_v1(&mut storage, 0, 0).unwrap();
        assert_eq!(v1_degree(&storage, 0), 2);
        assert_eq!(v1_neighbour(&storage, 0, 0), Some(0));
        assert_eq!(v1_neighbour(&storage, 0, 1), Some(0));
        assert_eq!(v1_neighbour(&storage, 0, 2), None);
        assert_eq!(v1_incident(&storage, 0, 0), Some(e));
        assert_eq!(v1_incident(&storage, 0, 1), Some(e));
    }

    #[test]
    fn v1_list_is_most_recently_inserted_first() {
        let mut storage = v1_storage(3);
        add_edge_v1(&mut storage, 0, 1).unwrap();
        add_edge_v1(&mut storage, 0, 2).unwrap();
        assert_eq!(v1_neighbour(&storage, 0, 0), Some(2));
        assert_eq!(v1_neighbour(&storage, 0, 1), Some(1));
    }

    #[test]
    fn v2_out_and_in_lists_are_independent() {
        let mut storage = v2_storage(2);
        let e = add_directed_edge_v2(&mut storage, 0, 1).unwrap();
        assert_eq!(v2_out_degree(&storage, 0), 1);
        assert_eq!(v2_in_degree(&storage, 0), 0);
        assert_eq!(v2_out_degree(&storage, 1), 0);
        assert_eq!(v2_in_degree(&storage, 1), 1);
        assert_eq!(v2_out_neighbour(&storage, 0, 0), Some(1));
        assert_eq!(v2_in_neighbour(&storage, 1, 0), Some(0));
        assert_eq!(v2_out_incident(&storage, 0, 0), Some(e));
        assert_eq!(v2_in_incident(&storage, 1, 0), Some(e));
        assert_eq!(v2_edge_ends(&storage, e), (0, 1));
    }

    /// A v2 self-loop is unambiguous: one entry in the out-list, one in
    /// the in-list, counted once each.
    #[test]
    fn v2_self_loop_counts_once_in_each_list() {
        let mut storage = v2_storage(1);
        add_directed_edge_v2(&mut storage, 0, 0).unwrap();
        assert_eq!(v2_out_degree(&storage, 0), 1);
        assert_eq!(v2_in_degree(&storage, 0), 1);
        assert_eq!(v2_out_neighbour(&storage, 0, 0), Some(0));
        assert_eq!(v2_in_neighbour(&storage, 0, 0), Some(0));
    }

    #[test]
    fn missing_list_entry_is_none() {
        let storage = v2_storage(1);
        assert_eq!(v2_out_neighbour(&storage, 0, 0), None);
        assert_eq!(v2_in_incident(&storage, 0, 0), None);
    }
}
