//! Separator-driven recursive splitting.

use super::merging::merge_pieces;
use unicode_segmentation::UnicodeSegmentation;

/// Separators from coarsest to finest. The empty separator means grapheme clusters.
pub const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// Split `text` with the coarsest applicable separator, recursing into
/// pieces that are still longer than `chunk_size`.
///
/// Separators stay attached to the end of the piece they terminate, so the
/// concatenation of all pieces is the original text.
pub(crate) fn split_recursive(
    text: &str,
    separators: &[&str],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let position = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let finer = separators.get(position + 1..).unwrap_or(&[]);

    let pieces: Vec<&str> = if separator.is_empty() {
        text.graphemes(true).collect()
    } else {
        text.split_inclusive(separator).collect()
    };

    let mut chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    for piece in pieces {
        if piece.chars().count() <= chunk_size {
            fitting.push(piece);
            continue;
        }

        if !fitting.is_empty() {
            chunks.extend(merge_pieces(&fitting, chunk_size, chunk_overlap));
            fitting.clear();
        }

        if finer.is_empty() {
            // A single grapheme wider than the chunk size
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, finer, chunk_size, chunk_overlap));
        }
    }

    if !fitting.is_empty() {
        chunks.extend(merge_pieces(&fitting, chunk_size, chunk_overlap));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pieces_reassemble_to_original() {
        let text = "One. Two!\nThree? Four\n\nFive six seven";
        let chunks = split_recursive(text, SEPARATORS, 12, 0);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_separator_stays_with_preceding_piece() {
        let chunks = split_recursive("aaaa. bbbb. cccc", SEPARATORS, 6, 0);
        assert_eq!(chunks, vec!["aaaa. ", "bbbb. ", "cccc"]);
    }

    #[test]
    fn test_falls_through_to_finer_separator() {
        // No paragraph break, so lines are used
        let chunks = split_recursive("line one\nline two\nline three", SEPARATORS, 10, 0);
        assert_eq!(chunks, vec!["line one\n", "line two\n", "line three"]);
    }

    #[test]
    fn test_grapheme_fallback_keeps_clusters_intact() {
        let text = "e\u{301}e\u{301}e\u{301}e\u{301}";
        let chunks = split_recursive(text, &[""], 2, 0);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c == "e\u{301}"));
    }
}
