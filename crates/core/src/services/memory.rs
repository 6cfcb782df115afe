use std::path::Path;

use anyhow::{Context, Result};

/// Read access to the analyzed program's memory.
///
/// This is the only thing the matchers need from the loader: "give me N
/// bytes at address A".
pub trait ByteSource {
    /// Read exactly `len` bytes at `addr`, or `None` if any of them is unmapped.
    fn read_at(&self, addr: u64, len: usize) -> Option<Vec<u8>>;
}

/// Contiguous mapped region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub addr: u64,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn end(&self) -> u64 {
        self.addr.saturating_add(self.data.len() as u64)
    }
}

/// Simple in-memory image made of non-overlapping segments.
#[derive(Debug, Clone, Default)]
pub struct MemoryImage {
    segments: Vec<Segment>,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image holding `data` mapped at `base`.
    pub fn flat(base: u64, data: Vec<u8>) -> Self {
        Self::new().with_segment(base, data)
    }

    /// Map a whole file at `base`.
    pub fn from_file(path: &Path, base: u64) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read binary at {}", path.display()))?;
        Ok(Self::flat(base, data))
    }

    /// Add a segment, keeping segments sorted by address.
    pub fn with_segment(mut self, addr: u64, data: Vec<u8>) -> Self {
        let at = self.segments.partition_point(|s| s.addr < addr);
        self.segments.insert(at, Segment { addr, data });
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Split every segment into `(address, bytes)` chunks of at most `size` bytes.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = (u64, &[u8])> {
        let size = size.max(1);
        self.segments.iter().flat_map(move |seg| {
            seg.data
                .chunks(size)
                .enumerate()
                .map(move |(i, chunk)| (seg.addr + (i * size) as u64, chunk))
        })
    }
}

impl ByteSource for MemoryImage {
    fn read_at(&self, addr: u64, len: usize) -> Option<Vec<u8>> {
        let seg = self.segments.iter().rev().find(|s| s.addr <= addr)?;
        let start = usize::try_from(addr - seg.addr).ok()?;
        let end = start.checked_add(len)?;
        seg.data.get(start..end).map(<[u8]>::to_vec)
    }
}
