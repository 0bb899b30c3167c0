// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use rescue_dispatch_domain::TranscriptChunk;

/// Inserts a chunk after every existing chunk whose offset is less than or
/// equal to its own.
///
/// Chunks with equal offsets keep arrival order. Nothing is dropped or
/// deduplicated.
///
/// # Returns
///
/// The total chunk count after insertion.
///
/// # Errors
///
/// Returns an error if the chunk offset is negative or not finite.
pub fn insert_chunk(
    chunks: &mut Vec<TranscriptChunk>,
    chunk: TranscriptChunk,
) -> Result<usize, CoreError> {
    chunk.validate()?;
    let position: usize = chunks.partition_point(|existing| existing.offset <= chunk.offset);
    chunks.insert(position, chunk);
    Ok(chunks.len())
}

/// Validates and stably sorts a full chunk list by offset.
///
/// # Errors
///
/// Returns an error if any chunk offset is negative or not finite.
pub fn sort_chunks(mut chunks: Vec<TranscriptChunk>) -> Result<Vec<TranscriptChunk>, CoreError> {
    for chunk in &chunks {
        chunk.validate()?;
    }
    chunks.sort_by(|a, b| a.offset.total_cmp(&b.offset));
    Ok(chunks)
}

/// The denormalized transcript text: chunk texts joined by single spaces.
#[must_use]
pub fn full_text(chunks: &[TranscriptChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
}
