use common::error::AppError;

/// Splits text into a sliding window of character chunks.
///
/// Chunk `i` starts `size - overlap` characters after chunk `i - 1`, so
/// adjacent chunks share exactly `overlap` characters; the final chunk may be
/// shorter than `size`. Counts are Unicode scalar values, not bytes. The
/// configuration must satisfy `0 < overlap < size`.
pub fn split(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, AppError> {
    if size == 0 {
        return Err(AppError::ChunkConfig("chunk size must be positive".into()));
    }
    if overlap == 0 || overlap >= size {
        return Err(AppError::ChunkConfig(format!(
            "overlap must satisfy 0 < overlap < size, got overlap {overlap} with size {size}"
        )));
    }

    let byte_offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    if byte_offsets.is_empty() {
        return Ok(Vec::new());
    }

    let step = size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while let Some(&start_byte) = byte_offsets.get(start) {
        let end_byte = byte_offsets
            .get(start + size)
            .copied()
            .unwrap_or(text.len());
        chunks.push(
            text.get(start_byte..end_byte)
                .unwrap_or_default()
                .to_owned(),
        );
        start += step;
    }

    Ok(chunks)
}
