// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Chunk planning: splitting payloads under the per-document capacity
//! limit and reassembling them in index order
//!
//! Pure byte-range arithmetic, no I/O. The store records each chunk's
//! index as an explicit document property, so reassembly sorts by that
//! index instead of trusting listing order.

use crate::error::{Error, Result};
use std::ops::Range;

/// Maximum pre-encoding bytes per chunk document, matching the remote
/// service's practical per-document capacity. 10 MB.
pub const MAX_CHUNK_BYTES_DEFAULT: u64 = 10_000_000;

/// Plan the byte ranges for a payload of `total_size` bytes.
///
/// Zero-length input yields exactly one empty range so an empty file still
/// produces one addressable remote document.
pub fn plan(total_size: u64, max_chunk_bytes: u64) -> Result<Vec<Range<u64>>> {
    if max_chunk_bytes == 0 {
        return Err(Error::InvalidConfiguration(
            "max chunk size must be greater than zero".to_string(),
        ));
    }
    if total_size == 0 {
        return Ok(vec![0..0]);
    }
    let mut ranges = Vec::with_capacity(total_size.div_ceil(max_chunk_bytes) as usize);
    let mut offset = 0;
    while offset < total_size {
        let end = (offset + max_chunk_bytes).min(total_size);
        ranges.push(offset..end);
        offset = end;
    }
    Ok(ranges)
}

/// Split a payload into ordered slices, each at most `max_chunk_bytes`.
/// Concatenating the slices reproduces the input.
pub fn split(data: &[u8], max_chunk_bytes: u64) -> Result<impl Iterator<Item = &[u8]>> {
    let ranges = plan(data.len() as u64, max_chunk_bytes)?;
    Ok(ranges
        .into_iter()
        .map(|r| &data[r.start as usize..r.end as usize]))
}

/// Reassemble chunks by their recorded indexes.
///
/// `object_id` is used only for error context. Fails if any index is
/// missing or duplicated; chunks may arrive in any order.
pub fn join(object_id: &str, mut chunks: Vec<(u32, Vec<u8>)>) -> Result<Vec<u8>> {
    chunks.sort_by_key(|(index, _)| *index);
    for (expected, (index, _)) in chunks.iter().enumerate() {
        if *index as usize != expected {
            return Err(Error::IncompleteObject {
                id: object_id.to_string(),
                detail: format!("expected chunk {}, found chunk {}", expected, index),
            });
        }
    }
    let mut out = Vec::with_capacity(chunks.iter().map(|(_, b)| b.len()).sum());
    for (_, buffer) in chunks {
        out.extend_from_slice(&buffer);
    }
    Ok(out)
}
