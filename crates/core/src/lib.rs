pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod query_engine;
pub mod retriever;
pub mod store;

pub use chunking::{build_chunks, normalize_whitespace, split_with_overlap, ChunkingConfig};
pub use config::{RagConfig, GEMINI_API_KEY_VAR};
pub use embeddings::{Embedder, GeminiEmbedder, HashedNgramEmbedder};
pub use error::{IngestError, QaError};
pub use extractor::{extract_page_texts, PageText, PdfExtractor};
pub use generation::{GeminiGenerator, TextGenerator};
pub use ingest::{digest_file, discover_pdf_files, ingest_folder_chunks};
pub use models::{Answer, DocumentChunk, DocumentFingerprint, ScoredChunk};
pub use query_engine::QueryEngine;
pub use retriever::Retriever;
pub use store::VectorStore;
