use anyhow::{Context, Result};

/// Extract the text of every page, in page order.
///
/// pdf_extract is CPU-bound and can panic on unusual files, so it runs on the
/// blocking pool and a panic comes back as an ordinary error.
pub async fn extract_text(pdf_bytes: &[u8]) -> Result<String> {
    let bytes = pdf_bytes.to_vec();
    tracing::info!("extract_text: starting PDF extraction ({} bytes)", bytes.len());

    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .context("Failed to extract text from PDF")
    })
    .await
    .context("PDF extraction task panicked")??;

    // Image-only pages come back empty and contribute nothing.
    let text = pages.concat();
    tracing::info!(
        "extract_text: {} pages, {} chars extracted",
        pages.len(),
        text.chars().count()
    );
    Ok(text)
}

/// Split text into fixed windows of `chunk_size` characters, each starting
/// `overlap` characters before the previous one ended.
///
/// Sizes count chars, so a multi-byte code point is never split.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 || overlap >= chunk_size {
        return Vec::new();
    }

    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size - overlap;

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());

        if end >= char_count {
            break;
        }

        start += step;
    }

    chunks
}
