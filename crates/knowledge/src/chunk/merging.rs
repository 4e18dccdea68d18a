//! Greedy merging of split pieces into overlapping chunks.

use std::collections::VecDeque;

/// Merge consecutive pieces into chunks of at most `chunk_size` chars.
///
/// Every piece must already fit within `chunk_size`. When a chunk is emitted,
/// leading pieces are dropped until the remainder is at most `chunk_overlap`
/// chars (and leaves room for the next piece); what is left starts the next
/// chunk.
pub(crate) fn merge_pieces(pieces: &[&str], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let len = piece.chars().count();

        if total + len > chunk_size && !window.is_empty() {
            chunks.push(join(&window));

            while let Some(&(_, front_len)) = window.front() {
                if total <= chunk_overlap && total + len <= chunk_size {
                    break;
                }
                total -= front_len;
                window.pop_front();
            }
        }

        window.push_back((piece, len));
        total += len;
    }

    if !window.is_empty() {
        chunks.push(join(&window));
    }

    chunks
}

fn join(window: &VecDeque<(&str, usize)>) -> String {
    window.iter().map(|(piece, _)| *piece).collect()
}
