//! File/mapping manager: owns the backing file and its memory map.
//!
//! All byte access to the graph (header, node table, edge heap) goes
//! through `Storage::bytes`/`bytes_mut`. Nothing else in the crate touches
//! `File` or `MmapMut` directly, so remap invalidation stays centralized
//! here the way the design notes require.

use crate::config::GraphOptions;
use crate::error::{GraphError, Result};
use crate::header::{self, HEADER_SIZE};
use fs2::FileExt;
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::{debug, instrument};

/// Owns a backing file and its current memory mapping.
#[derive(Debug)]
pub struct Storage {
    file: File,
    mmap: MmapMut,
    readonly: bool,
    locked: bool,
    page_size: usize,
}

impl Storage {
    /// Creates a fresh file at `path` sized for an empty graph of the given
    /// version and initial node-table capacity, and writes its header.
    #[instrument(skip(opts), fields(path = %path.as_ref().display(), version))]
    pub fn create<P: AsRef<Path>>(path: P, version: u8, opts: &GraphOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.try_lock_exclusive().map_err(GraphError::Io)?;

        let stride = header::node_stride(version) as u64;
        let size = HEADER_SIZE as u64 + opts.initial_node_capacity * stride;
        let size = page_align(size, opts.growth_page_size);
        file.set_len(size)?;

        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        header::init(&mut mmap, version, opts.initial_node_capacity);
        mmap.flush()?;
        debug!(size, "created graph file");

        Ok(Self {
            file,
            mmap,
            readonly: false,
            locked: true,
            page_size: opts.growth_page_size,
        })
    }

    /// Creates an anonymous backing file for a transient, in-process graph.
    #[instrument(skip(opts), fields(version))]
    pub fn create_temp(version: u8, opts: &GraphOptions) -> Result<Self> {
        let file = tempfile::tempfile()?;

        let stride = header::node_stride(version) as u64;
        let size = HEADER_SIZE as u64 + opts.initial_node_capacity * stride;
        let size = page_align(size, opts.growth_page_size);
        file.set_len(size)?;

        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        header::init(&mut mmap, version, opts.initial_node_capacity);
        mmap.flush()?;

        Ok(Self {
            file,
            mmap,
            readonly: false,
            locked: false,
            page_size: opts.growth_page_size,
        })
    }

    /// Opens an existing file. Writable handles take an exclusive advisory
    /// lock; read-only handles do not, since multiple readers must remain
    /// possible while no writer is active.
    ///
    /// The file descriptor itself is always opened read-write: `MmapMut`
    /// needs a writable mapping regardless, and a read-only `Storage`
    /// enforces its own contract (no lock, `bytes_mut`/`allocate` refuse)
    /// one layer up rather than at the OS level.
    #[instrument(skip(opts), fields(path = %path.as_ref().display(), readonly))]
    pub fn open<P: AsRef<Path>>(path: P, readonly: bool, opts: &GraphOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(false)
            .open(path)?;

        let mut locked = false;
        if !readonly {
            file.try_lock_exclusive().map_err(GraphError::Io)?;
            locked = true;
        }

        let mmap = unsafe { MmapMut::map_mut(&file)? };

        if !header::has_valid_magic(&mmap) {
            return Err(GraphError::Format {
                reason: "bad magic".into(),
            });
        }
        let watermark = header::free_watermark(&mmap);
        if watermark > mmap.len() as u64 {
            return Err(GraphError::Format {
                reason: format!(
                    "free watermark {watermark} exceeds file size {}",
                    mmap.len()
                ),
            });
        }

        Ok(Self {
            file,
            mmap,
            readonly,
            locked,
            page_size: opts.growth_page_size,
        })
    }

    #[must_use]
    pub fn readonly(&self) -> bool {
        self.readonly
    }

    /// Read-only view of the whole mapping.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Mutable view of the whole mapping.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::ReadOnly` if this handle was opened read-only.
    pub fn bytes_mut(&mut self) -> Result<&mut [u8]> {
        if self.readonly {
            return Err(GraphError::ReadOnly);
        }
        Ok(&mut self.mmap)
    }

    /// Grows the backing file to at least `min_size`, rounding up to the
    /// next page boundary, and remaps it.
    ///
    /// All previously computed byte offsets into the mapping remain valid
    /// (offsets are never pointers), but any raw slice/reference borrowed
    /// from a prior `bytes`/`bytes_mut` call must not be held across this
    /// call.
    #[instrument(skip(self), fields(old_size = self.mmap.len()))]
    pub fn extend(&mut self, min_size: u64) -> Result<()> {
        if self.readonly {
            return Err(GraphError::ReadOnly);
        }
        let old_size = self.mmap.len() as u64;
        if min_size <= old_size {
            return Ok(());
        }
        let mut new_size = old_size.max(1);
        while new_size < min_size {
            new_size *= 2;
        }
        let new_size = page_align(new_size, self.page_size);

        self.file
            .set_len(new_size)
            .map_err(|_| GraphError::AllocationFailure { requested: min_size })?;
        self.mmap = unsafe { MmapMut::map_mut(&self.file)? };
        debug!(new_size, "extended backing file");
        Ok(())
    }

    /// Reserves `len` bytes at the current free watermark, growing the file
    /// first if necessary, and advances the watermark. Returns the offset
    /// of the reserved region.
    pub fn allocate(&mut self, len: u64) -> Result<u64> {
        if self.readonly {
            return Err(GraphError::ReadOnly);
        }
        let watermark = header::free_watermark(&self.mmap);
        let end = watermark
            .checked_add(len)
            .ok_or(GraphError::AllocationFailure { requested: len })?;
        self.extend(end)?;
        header::set_free_watermark(&mut self.mmap, end);
        Ok(watermark)
    }

    /// Flushes the mapping and forces a durable write of data and metadata.
    pub fn commit(&mut self) -> Result<()> {
        self.mmap.flush()?;
        self.file.sync_data()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Flushes and drops the mapping. Idempotent: a second call is a no-op
    /// beyond whatever `Drop` already does.
    pub fn close(mut self) -> Result<()> {
        self.commit()?;
        Ok(())
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        let _ = self.mmap.flush();
        if self.locked {
            let _ = self.file.unlock();
        }
    }
}

fn page_align(size: u64, page_size: usize) -> u64 {
    let page_size = page_size as u64;
    size.div_ceil(page_size) * page_size
}
