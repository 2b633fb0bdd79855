use crate::chunking::{build_chunks, ChunkingConfig};
use crate::error::IngestError;
use crate::extractor::extract_page_texts;
use crate::models::{DocumentChunk, DocumentFingerprint};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Reads every PDF under `folder` and produces the chunk list to be
/// embedded and persisted. Fails without side effects when the folder has
/// no PDFs or when extraction produced no text at all.
pub fn ingest_folder_chunks(
    folder: &Path,
    config: ChunkingConfig,
) -> Result<Vec<DocumentChunk>, IngestError> {
    config.validate()?;

    let files = discover_pdf_files(folder);
    if files.is_empty() {
        return Err(IngestError::NoPdfsFound(folder.display().to_string()));
    }

    info!(folder = %folder.display(), pdf_count = files.len(), "discovered pdf files");

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for path in files {
        let fingerprint = build_document_fingerprint(&path)?;
        let pages = extract_page_texts(&path)?;
        info!(path = %path.display(), page_count = pages.len(), "extracted pdf");

        for page in pages {
            let (page_chunks, next_cursor) =
                build_chunks(&fingerprint, page.number, &page.text, config, cursor)?;
            cursor = next_cursor;
            chunks.extend(page_chunks);
        }
    }

    if chunks.is_empty() {
        return Err(IngestError::EmptyExtraction(folder.display().to_string()));
    }

    Ok(chunks)
}

fn build_document_fingerprint(path: &Path) -> Result<DocumentFingerprint, IngestError> {
    let checksum = digest_file(path)?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    Ok(DocumentFingerprint {
        document_id: generate_document_id(path),
        document_title: name.to_string(),
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}

fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}
