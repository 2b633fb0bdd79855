use crate::error::IngestError;
use crate::models::{DocumentChunk, DocumentFingerprint};
use sha2::{Digest, Sha256};

/// Chunk sizing used across ingestion. One canonical configuration; the
/// splitter and the query path never diverge on these values.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_chars {} must be smaller than max_chars {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

/// Greedy splitter: consume up to `max_chars`, break after the last
/// whitespace in the window when that still makes forward progress past the
/// overlap, then start the next chunk exactly `overlap_chars` before the
/// previous end. Consecutive chunks therefore share an exact
/// `overlap_chars`-character suffix/prefix.
pub fn split_with_overlap(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + config.max_chars).min(chars.len());
        let mut end = hard_end;

        if hard_end < chars.len() {
            if let Some(offset) = chars[start..hard_end].iter().rposition(|c| c.is_whitespace()) {
                let candidate = start + offset + 1;
                if candidate > start + config.overlap_chars {
                    end = candidate;
                }
            }
        }

        chunks.push(chars[start..end].iter().collect());

        if end == chars.len() {
            break;
        }
        start = end - config.overlap_chars;
    }

    Ok(chunks)
}

/// Turns one page of extracted text into provenance-carrying chunks,
/// continuing the document-wide chunk index from `global_index`.
pub fn build_chunks(
    document: &DocumentFingerprint,
    page: u32,
    page_text: &str,
    config: ChunkingConfig,
    global_index: u64,
) -> Result<(Vec<DocumentChunk>, u64), IngestError> {
    let normalized = normalize_whitespace(page_text);

    let mut chunks = Vec::new();
    let mut cursor = global_index;

    for piece in split_with_overlap(&normalized, config)? {
        if piece.trim().is_empty() {
            continue;
        }

        let chunk_id = make_chunk_id(&document.document_id, page, cursor, &piece);

        chunks.push(DocumentChunk {
            chunk_id,
            document_id: document.document_id.clone(),
            source_path: document.source_path.clone(),
            title: document.document_title.clone(),
            page,
            chunk_index: cursor,
            text: piece,
        });

        cursor = cursor.saturating_add(1);
    }

    Ok((chunks, cursor))
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
