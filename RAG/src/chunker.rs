use crate::config::RagConfig;
use crate::models::TextChunk;
use std::collections::VecDeque;

/// Splits text into overlapping chunks no longer than `chunk_size` characters.
///
/// Text is cut at the separator first and the pieces are packed greedily into
/// chunks. When a chunk is emitted, the trailing pieces that fit inside
/// `chunk_overlap` are carried into the next one. A piece that is longer than
/// `chunk_size` on its own is cut at raw character boundaries, with
/// consecutive windows sharing exactly `chunk_overlap` characters.
///
/// All lengths are counted in `char`s.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separator: String,
}

impl TextChunker {
    /// Expects `chunk_overlap < chunk_size` and a non-empty separator, which
    /// [`RagConfig::builder`] enforces.
    pub fn new(chunk_size: usize, chunk_overlap: usize, separator: impl Into<String>) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separator: separator.into(),
        }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.separator.clone())
    }

    pub fn split_text(&self, text: &str) -> Vec<TextChunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        for piece in text.split(self.separator.as_str()).filter(|p| !p.is_empty()) {
            let len = piece.chars().count();
            if len > self.chunk_size {
                pieces.extend(self.split_oversized(piece));
            } else {
                pieces.push(Piece {
                    text: piece.to_string(),
                    len,
                    raw: false,
                });
            }
        }

        let chunks: Vec<TextChunk> = self
            .merge_pieces(pieces)
            .into_iter()
            .enumerate()
            .map(|(index, content)| TextChunk { index, content })
            .collect();

        log::info!("Created {} chunks", chunks.len());
        chunks
    }

    fn split_oversized(&self, piece: &str) -> Vec<Piece> {
        let chars: Vec<char> = piece.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut windows = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            windows.push(Piece {
                text: chars[start..end].iter().collect(),
                len: end - start,
                raw: true,
            });
            if end == chars.len() {
                break;
            }
            start += step;
        }

        windows
    }

    fn merge_pieces(&self, pieces: Vec<Piece>) -> Vec<String> {
        let sep_len = self.separator.chars().count();
        let joiner = |current: &VecDeque<Piece>| if current.is_empty() { 0 } else { sep_len };

        let mut chunks = Vec::new();
        let mut current: VecDeque<Piece> = VecDeque::new();
        let mut total = 0;

        for piece in pieces {
            let len = piece.len;
            if total + len + joiner(&current) > self.chunk_size && !current.is_empty() {
                self.emit(&current, &mut chunks);

                while total > self.chunk_overlap
                    || (total > 0 && total + len + joiner(&current) > self.chunk_size)
                {
                    match current.pop_front() {
                        Some(front) => total -= front.len + joiner(&current),
                        None => break,
                    }
                }
            }

            total += len + joiner(&current);
            current.push_back(piece);
        }

        if !current.is_empty() {
            self.emit(&current, &mut chunks);
        }

        chunks
    }

    /// Joins the pieces and trims whitespace at ends that came from separator
    /// splits. Raw window ends are kept intact so window overlap stays exact.
    fn emit(&self, current: &VecDeque<Piece>, chunks: &mut Vec<String>) {
        let joined = current
            .iter()
            .map(|piece| piece.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator);
        if joined.trim().is_empty() {
            return;
        }

        let mut content = joined.as_str();
        if current.front().map_or(false, |piece| !piece.raw) {
            content = content.trim_start();
        }
        if current.back().map_or(false, |piece| !piece.raw) {
            content = content.trim_end();
        }
        chunks.push(content.to_string());
    }
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    /// Length in chars.
    len: usize,
    /// Cut at a raw character boundary rather than at the separator.
    raw: bool,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn contents(chunks: &[TextChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.content.as_str()).collect()
    }

    fn alphabet(len: usize) -> String {
        (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(TextChunker::default().split_text("").is_empty());
    }

    #[test]
    fn whitespace_only_text_yields_no_chunks() {
        assert!(TextChunker::default().split_text("  \n \n\t\n").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = TextChunker::default().split_text("Refunds are issued within 30 days.\nContact support.");
        assert_eq!(contents(&chunks), vec!["Refunds are issued within 30 days.\nContact support."]);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn splits_at_newlines_and_carries_overlap() {
        let chunker = TextChunker::new(20, 8, "\n");
        let chunks = chunker.split_text("aaaaa\nbbbbb\nccccc\nddddd\neeeee");
        assert_eq!(contents(&chunks), vec!["aaaaa\nbbbbb\nccccc", "ccccc\nddddd\neeeee"]);
    }

    #[test]
    fn long_run_without_separator_is_cut_at_raw_boundaries() {
        let text = alphabet(2500);
        let chunks = TextChunker::default().split_text(&text);

        let lengths: Vec<usize> = chunks.iter().map(|c| c.content.chars().count()).collect();
        assert_eq!(lengths, vec![1000, 1000, 900]);

        let first: Vec<char> = chunks[0].content.chars().collect();
        let second: Vec<char> = chunks[1].content.chars().collect();
        assert_eq!(first[800..], second[..200]);
        assert_eq!(chunks[2].content, text.chars().skip(1600).collect::<String>());
    }

    #[test]
    fn raw_windows_keep_exact_overlap_across_spaces() {
        let chunker = TextChunker::new(10, 4, "\n");
        let chunks = chunker.split_text("abc def ghi jkl mno pqr");
        assert_eq!(contents(&chunks), vec!["abc def gh", "f ghi jkl ", "jkl mno pq", "o pqr"]);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let next: Vec<char> = pair[1].content.chars().collect();
            assert_eq!(prev[prev.len() - 4..], next[..4]);
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let chunker = TextChunker::new(4, 1, "\n");
        let chunks = chunker.split_text("ééééé");
        assert_eq!(contents(&chunks), vec!["éééé", "éé"]);
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let text = (0..100).map(|i| format!("line number {i}")).collect::<Vec<_>>().join("\n");
        let chunks = TextChunker::new(120, 30, "\n").split_text(&text);
        assert!(chunks.len() > 1);
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, expected);
        }
    }

    /// Glues chunks back together by dropping, from each chunk, the leading
    /// lines it shares with the tail of the previous one.
    fn reconstruct(chunks: &[TextChunk]) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for chunk in chunks {
            let next: Vec<&str> = chunk.content.split('\n').collect();
            let max_shared = lines.len().min(next.len());
            let shared = (0..=max_shared)
                .rev()
                .find(|&k| lines[lines.len() - k..].iter().map(String::as_str).eq(next[..k].iter().copied()))
                .unwrap_or(0);
            lines.extend(next[shared..].iter().map(|s| s.to_string()));
        }
        lines
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn chunks_never_exceed_chunk_size(
            text in "[a-z \n]{0,3000}",
            size in 20usize..400,
            overlap_ratio in 0.0f64..0.9,
        ) {
            let overlap = ((size as f64) * overlap_ratio) as usize;
            let chunks = TextChunker::new(size, overlap, "\n").split_text(&text);
            for chunk in &chunks {
                prop_assert!(chunk.content.chars().count() <= size);
                prop_assert!(!chunk.content.trim().is_empty());
            }
        }

        #[test]
        fn chunks_reconstruct_the_original_lines(
            words in proptest::collection::vec("[a-z]{1,30}", 0..120),
        ) {
            let lines: Vec<String> = words.iter().enumerate().map(|(i, w)| format!("{i}-{w}")).collect();
            let text = lines.join("\n");
            let chunks = TextChunker::new(100, 20, "\n").split_text(&text);
            prop_assert_eq!(reconstruct(&chunks), lines);
        }

        #[test]
        fn consecutive_chunks_share_at_most_the_overlap(
            words in proptest::collection::vec("[a-z]{1,30}", 1..120),
        ) {
            let lines: Vec<String> = words.iter().enumerate().map(|(i, w)| format!("{i}-{w}")).collect();
            let chunks = TextChunker::new(100, 20, "\n").split_text(&lines.join("\n"));
            for pair in chunks.windows(2) {
                let prev: Vec<&str> = pair[0].content.split('\n').collect();
                let next: Vec<&str> = pair[1].content.split('\n').collect();
                let shared: Vec<&str> = next.iter().copied().take_while(|line| prev.contains(line)).collect();
                prop_assert!(shared.join("\n").chars().count() <= 20);
            }
        }
    }
}
