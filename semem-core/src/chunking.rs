//! Splits ingested document content into dense, ordered text chunks.

use crate::constants::defaults;

/// Split `content` into chunks of at most [`defaults::DOCUMENT_CHUNK_CHARS`]
/// characters each. Chunks are emitted in order and cover `content` exactly
/// once each (no overlap) — ordinal assignment is the caller's
/// responsibility (dense, zero-based, in emission order).
#[must_use]
pub fn split_document(content: &str) -> Vec<String> {
    split_document_with_size(content, defaults::DOCUMENT_CHUNK_CHARS)
}

/// Like [`split_document`] but with a caller-supplied chunk size.
#[must_use]
pub fn split_document_with_size(content: &str, chunk_chars: usize) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    let chunk_chars = chunk_chars.max(1);
    let chars: Vec<char> = content.chars().collect();
    chars.chunks(chunk_chars).map(|slice| slice.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_produces_no_chunks() {
        assert!(split_document("").is_empty());
    }

    #[test]
    fn short_content_produces_a_single_chunk() {
        let chunks = split_document_with_size("hello", 1000);
        assert_eq!(chunks, vec!["hello".to_string()]);
    }

    #[test]
    fn long_content_splits_into_dense_ordered_chunks_with_no_overlap() {
        let content = "a".repeat(25);
        let chunks = split_document_with_size(&content, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[1].len(), 10);
        assert_eq!(chunks[2].len(), 5);
        assert_eq!(chunks.concat(), content);
    }
}
