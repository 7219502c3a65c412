//! ByteSource (§4.1): a random-access, read-only view over the file bytes.
//!
//! Two implementations share one trait: `SliceSource` wraps a caller-owned
//! buffer (`load_from_bytes`), `MmapSource` memory-maps a path
//! (`load_from_path`). Both are `Bytes`-backed so cloning a view is cheap
//! and a `PDFStream`'s raw payload can borrow from the source without a
//! copy, mirroring the teacher's `PdfBytes` enum.

use std::fs::File;
use std::path::Path;

use bytes::Bytes;

use crate::error::{PdfError, Result};

/// Random-access, bounded, read-safe-for-concurrent-reads view over the
/// document's bytes (§5: "ByteSource must be read-safe for concurrent
/// reads; write paths do not exist").
pub trait ByteSource: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads past EOF yield the available prefix rather than erroring.
    fn read(&self, offset: usize, n: usize) -> &[u8];

    fn read_byte(&self, offset: usize) -> Option<u8> {
        self.read(offset, 1).first().copied()
    }

    /// The full backing slice, for callers (the tokenizer, the xref loader)
    /// that need unrestricted random access rather than a bounded window.
    fn as_slice(&self) -> &[u8];
}

/// In-memory, `Bytes`-backed source — zero-copy over a caller-owned buffer.
#[derive(Debug, Clone)]
pub struct SliceSource {
    data: Bytes,
}

impl SliceSource {
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }
}

impl ByteSource for SliceSource {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&self, offset: usize, n: usize) -> &[u8] {
        bounded_slice(&self.data, offset, n)
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// File-backed source via `memmap2`. The mapping is kept alive for the
/// source's lifetime; `Bytes::from_owner` lets the returned slices outlive
/// any particular borrow of `self` without copying the mapped pages.
pub struct MmapSource {
    data: Bytes,
}

impl MmapSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the file is not modified for the lifetime of the mapping;
        // this crate only ever opens PDFs for read access.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Ok(Self { data: Bytes::from_owner(mmap) })
    }

    /// Hands back the mapped bytes directly, for callers (`Document::load_from_path`)
    /// that want one `Bytes` handle rather than a boxed trait object.
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl ByteSource for MmapSource {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read(&self, offset: usize, n: usize) -> &[u8] {
        bounded_slice(&self.data, offset, n)
    }

    fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

fn bounded_slice(data: &[u8], offset: usize, n: usize) -> &[u8] {
    if offset >= data.len() {
        return &[];
    }
    let end = (offset + n).min(data.len());
    &data[offset..end]
}

/// Reads a source's full contents as `Bytes`; `Document::load_from_path`
/// and the recovery scan both want the whole file as a contiguous slice
/// rather than a `ByteSource` trait object.
pub fn read_path_to_bytes(path: impl AsRef<Path>) -> Result<Bytes> {
    let data = std::fs::read(path).map_err(PdfError::Io)?;
    Ok(Bytes::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_source_short_reads_past_eof() {
        let src = SliceSource::new(Bytes::from_static(b"hello"));
        assert_eq!(src.read(3, 10), b"lo");
        assert_eq!(src.read(10, 5), b"");
    }

    #[test]
    fn slice_source_read_byte() {
        let src = SliceSource::new(Bytes::from_static(b"hello"));
        assert_eq!(src.read_byte(0), Some(b'h'));
        assert_eq!(src.read_byte(100), None);
    }
}
