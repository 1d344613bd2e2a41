//! Text chunking with overlap for independent embedding.
//!
//! All sizes are measured in characters, never bytes, so chunk boundaries
//! always fall on valid UTF-8 boundaries.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::ChunkError;
use crate::models::{Chunk, ChunkingConfig, Document, ShortDocumentPolicy, SplitStrategy};
use crate::utils::normalize;

static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Sentences carried into the next chunk by the sentence strategy.
const SEED_SENTENCES: usize = 2;

/// Average characters per word used to turn an overlap into a word count.
const CHARS_PER_WORD: usize = 6;

/// What the accumulating strategies carry over from a flushed chunk.
#[derive(Debug, Clone, Copy)]
enum OverlapSeed {
    Sentences(usize),
    Words(usize),
}

/// Splits documents into ordered, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    /// Create a chunker, rejecting configurations that cannot make progress.
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Run the configured HTML stripping and whitespace cleaning.
    pub fn normalize(&self, text: &str) -> String {
        normalize(text, &self.config)
    }

    /// Normalize and split a document.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let processed = self.normalize(&document.content);
        self.chunk_normalized(document, &processed)
    }

    /// Split already-normalized text taken from `document`.
    ///
    /// Every chunk is buffered so `total_chunks` is known when the chunks are built.
    pub fn chunk_normalized(&self, document: &Document, text: &str) -> Vec<Chunk> {
        let pieces = self.split(text);
        let total_chunks = pieces.len();

        tracing::debug!(
            document_id = %document.id,
            chars = text.chars().count(),
            chunks = total_chunks,
            "chunked document"
        );

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                index,
                char_count: text.chars().count(),
                text,
                total_chunks,
                source_document_id: document.id.clone(),
            })
            .collect()
    }

    /// Split text into chunks according to the configured strategy.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let candidates = match self.config.split_strategy {
            Some(SplitStrategy::Characters) => self.split_characters(&chars),
            Some(SplitStrategy::Sentences) => self.accumulate(
                split_sentences(text),
                " ",
                OverlapSeed::Sentences(SEED_SENTENCES),
            ),
            Some(SplitStrategy::Paragraphs) => self.accumulate(
                split_paragraphs(text),
                "\n\n",
                OverlapSeed::Words(self.config.chunk_overlap / CHARS_PER_WORD),
            ),
            None => self.split_on_boundaries(&chars),
        };

        let min = self.config.min_chunk_size;
        let chunks: Vec<String> = candidates
            .into_iter()
            .filter(|c| {
                let trimmed = c.trim();
                !trimmed.is_empty() && trimmed.chars().count() >= min
            })
            .collect();

        if chunks.is_empty() && self.config.short_document == ShortDocumentPolicy::Keep {
            let trimmed = text.trim();
            if !trimmed.is_empty() && trimmed.chars().count() < min {
                return vec![trimmed.to_string()];
            }
        }

        chunks
    }

    /// Fixed windows of `chunk_size`, advancing by `chunk_size - chunk_overlap`.
    ///
    /// Windows are kept verbatim so that zero-overlap chunks concatenate back
    /// to the input.
    fn split_characters(&self, chars: &[char]) -> Vec<String> {
        let total = chars.len();
        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.config.chunk_size).min(total);
            chunks.push(chars[start..end].iter().collect());
            if end >= total {
                break;
            }
            start += step;
        }

        chunks
    }

    /// Raw windows whose end snaps back to the last `.` or newline, when one
    /// lies past `start + min_chunk_size`.
    fn split_on_boundaries(&self, chars: &[char]) -> Vec<String> {
        let total = chars.len();
        let size = self.config.chunk_size;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + size).min(total);

            if end < total
                && let Some(pos) = chars[start..end]
                    .iter()
                    .rposition(|c| *c == '.' || *c == '\n')
                    .map(|p| start + p)
                && pos > start + self.config.min_chunk_size
            {
                end = pos + 1;
            }

            let chunk: String = chars[start..end].iter().collect();
            chunks.push(chunk.trim().to_string());

            // Never step backwards, even if the snapped end is short.
            start = (start + size - self.config.chunk_overlap).max(end);
        }

        chunks
    }

    /// Greedily join pieces while the chunk stays within `chunk_size`,
    /// seeding each new chunk with the tail of the previous one.
    fn accumulate(&self, pieces: Vec<String>, separator: &str, seed: OverlapSeed) -> Vec<String> {
        let size = self.config.chunk_size;
        let sep_len = separator.chars().count();
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0;

        for piece in pieces.into_iter().flat_map(|p| hard_split(&p, size)) {
            let piece_len = piece.chars().count();

            if !current.is_empty() && current_len + sep_len + piece_len > size {
                let flushed = current.join(separator);
                let carried = if self.config.chunk_overlap == 0 {
                    Vec::new()
                } else {
                    seed_units(&current, &flushed, seed)
                };
                chunks.push(flushed);

                let joiner = match seed {
                    OverlapSeed::Sentences(_) => separator,
                    OverlapSeed::Words(_) => " ",
                };
                let units = fit_seed(carried, joiner, size.saturating_sub(sep_len + piece_len));

                current.clear();
                current_len = 0;
                if !units.is_empty() {
                    current_len = units.join(joiner).chars().count();
                    match seed {
                        OverlapSeed::Sentences(_) => current.extend(units),
                        OverlapSeed::Words(_) => current.push(units.join(joiner)),
                    }
                }
            }

            current_len = if current.is_empty() {
                piece_len
            } else {
                current_len + sep_len + piece_len
            };
            current.push(piece);
        }

        if !current.is_empty() {
            chunks.push(current.join(separator));
        }

        chunks
    }
}

/// Split after `.`, `!` or `?` followed by whitespace, keeping the terminator.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last = 0;

    for m in SENTENCE_END_RE.find_iter(text) {
        // Terminators are ASCII, so `start + 1` is a char boundary.
        sentences.push(text[last..m.start() + 1].trim().to_string());
        last = m.end();
    }
    sentences.push(text[last..].trim().to_string());

    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Split on blank lines.
fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Break a piece longer than `size` characters into `size`-character windows.
///
/// Windows are kept verbatim so they concatenate back to the piece; only
/// whitespace-only windows are dropped.
fn hard_split(piece: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = piece.chars().collect();
    if chars.len() <= size {
        return vec![piece.to_string()];
    }
    chars
        .chunks(size)
        .map(|w| w.iter().collect::<String>())
        .filter(|w| !w.trim().is_empty())
        .collect()
}

fn seed_units(current: &[String], flushed: &str, seed: OverlapSeed) -> Vec<String> {
    match seed {
        OverlapSeed::Sentences(n) => {
            let skip = current.len().saturating_sub(n);
            current[skip..].to_vec()
        }
        OverlapSeed::Words(n) => {
            let words: Vec<&str> = flushed.split_whitespace().collect();
            let skip = words.len().saturating_sub(n);
            words[skip..].iter().map(|w| w.to_string()).collect()
        }
    }
}

/// Drop leading seed units until the joined seed fits in `budget` characters.
fn fit_seed(mut units: Vec<String>, joiner: &str, budget: usize) -> Vec<String> {
    while !units.is_empty() && units.join(joiner).chars().count() > budget {
        units.remove(0);
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldNames, SequentialIdGenerator};
    use serde_json::json;

    fn chunker(
        chunk_size: usize,
        chunk_overlap: usize,
        min_chunk_size: usize,
        split_strategy: Option<SplitStrategy>,
    ) -> TextChunker {
        TextChunker::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
            split_strategy,
            ..Default::default()
        })
        .unwrap()
    }

    fn document(content: &str) -> Document {
        let item = json!({"id": "doc-1", "content": content});
        Document::from_item(
            item.as_object().unwrap(),
            0,
            &FieldNames::default(),
            &SequentialIdGenerator::new("doc"),
        )
        .unwrap()
    }

    #[test]
    fn test_characters_1500_into_two_chunks() {
        let text: String = ('a'..='z').cycle().take(1500).collect();
        let chunks = chunker(1000, 200, 50, Some(SplitStrategy::Characters)).split(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], text[0..1000]);
        assert_eq!(chunks[1], text[800..1500]);
        assert_eq!(chunks[1].chars().count(), 700);
    }

    #[test]
    fn test_characters_zero_overlap_round_trip() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let chunks = chunker(128, 0, 1, Some(SplitStrategy::Characters)).split(&text);

        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_characters_step_bound() {
        let text = "x".repeat(2345);
        for (size, overlap) in [(100, 0), (100, 99), (300, 150), (1000, 200)] {
            let chunks = chunker(size, overlap, 0, Some(SplitStrategy::Characters)).split(&text);
            let bound = text.len().div_ceil(size - overlap);
            assert!(chunks.len() <= bound, "size={size} overlap={overlap}");
            assert!(chunks.iter().all(|c| c.chars().count() <= size));
        }
    }

    #[test]
    fn test_characters_are_utf8_safe() {
        let text = "héllo wörld 👋 ".repeat(30);
        let chunks = chunker(37, 5, 1, Some(SplitStrategy::Characters)).split(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 37));
    }

    #[test]
    fn test_short_document_is_dropped_by_default() {
        let chunks = chunker(1000, 200, 50, None).split("Tiny text.");
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_document_kept_when_configured() {
        let chunker = TextChunker::new(ChunkingConfig {
            short_document: ShortDocumentPolicy::Keep,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(chunker.split("  Tiny text. "), vec!["Tiny text."]);
        assert!(chunker.split("   ").is_empty());
    }

    #[test]
    fn test_boundary_snaps_to_sentence_end() {
        let text = format!("{}. {}", "a".repeat(70), "b".repeat(80));
        let chunks = chunker(100, 10, 20, None).split(&text);

        assert_eq!(chunks[0], format!("{}.", "a".repeat(70)));
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn test_boundary_ignores_early_break() {
        // The only period sits before start + min_chunk_size, so the raw cut is kept.
        let text = format!("ab. {}", "c".repeat(200));
        let chunks = chunker(100, 0, 20, None).split(&text);

        assert_eq!(chunks[0].chars().count(), 100);
    }

    #[test]
    fn test_boundary_snaps_to_newline() {
        let text = format!("{}\n{}", "a".repeat(60), "b".repeat(100));
        let chunks = chunker(100, 0, 10, None).split(&text);

        assert_eq!(chunks[0], "a".repeat(60));
        // The next window starts at start + chunk_size - overlap, past the snapped end.
        assert_eq!(chunks[1], "b".repeat(61));
    }

    #[test]
    fn test_boundary_makes_progress_with_large_overlap() {
        let text = "Sentence number one. ".repeat(200);
        let chunks = chunker(120, 119, 10, None).split(&text);
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= text.len());
    }

    #[test]
    fn test_boundary_chunks_stay_within_size_bounds() {
        let text = (1..=60)
            .map(|i| match i % 4 {
                0 => format!("Line {i} ends here\n"),
                1 => format!("Sentence {i} is a bit longer than the others. "),
                2 => format!("short{i}. "),
                _ => format!("{} ", "word".repeat(i % 7 + 1)),
            })
            .collect::<String>();

        for (size, overlap, min) in [(80, 0, 10), (120, 40, 30), (200, 150, 50), (64, 63, 1), (500, 100, 5)] {
            for clean in [true, false] {
                let chunker = TextChunker::new(ChunkingConfig {
                    chunk_size: size,
                    chunk_overlap: overlap,
                    min_chunk_size: min,
                    clean_text: clean,
                    ..Default::default()
                })
                .unwrap();
                let chunks = chunker.split(&chunker.normalize(&text));

                assert!(!chunks.is_empty(), "size={size} overlap={overlap} min={min}");
                for c in &chunks {
                    let len = c.trim().chars().count();
                    assert!(
                        (min..=size).contains(&len),
                        "size={size} overlap={overlap} min={min} len={len}: {c:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_sentences_respect_chunk_size() {
        let text = (1..=40)
            .map(|i| format!("This is sentence number {i} of the test."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunker(200, 80, 10, Some(SplitStrategy::Sentences)).split(&text);

        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.chars().count() <= 200, "{c}");
            assert!(c.chars().count() >= 10);
        }
    }

    #[test]
    fn test_sentences_carry_last_two_sentences() {
        let text = "One one one. Two two two! Three three three? Four four four. Five five five.";
        let chunks = chunker(50, 20, 1, Some(SplitStrategy::Sentences)).split(text);

        assert_eq!(
            chunks,
            vec![
                "One one one. Two two two! Three three three?",
                "Two two two! Three three three? Four four four.",
                "Three three three? Four four four. Five five five.",
            ]
        );
    }

    #[test]
    fn test_sentences_without_overlap_do_not_repeat() {
        let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu.";
        let chunks = chunker(40, 0, 1, Some(SplitStrategy::Sentences)).split(text);

        assert_eq!(
            chunks,
            vec![
                "Alpha beta gamma. Delta epsilon zeta.",
                "Eta theta iota. Kappa lambda mu.",
            ]
        );
    }

    #[test]
    fn test_sentences_hard_split_oversized_sentence() {
        let text = format!("{} end.", "w".repeat(250));
        let chunks = chunker(100, 0, 1, Some(SplitStrategy::Sentences)).split(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_hard_split_keeps_window_edges() {
        let piece = format!("{} {}", "a".repeat(4), "b".repeat(5));
        assert_eq!(hard_split(&piece, 5), vec!["aaaa ", "bbbbb"]);
        assert_eq!(hard_split("ab", 5), vec!["ab"]);
        assert_eq!(hard_split("abc     ", 3), vec!["abc"]);
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\n\nThird paragraph here.";
        let chunks = chunker(50, 0, 1, Some(SplitStrategy::Paragraphs)).split(text);

        assert_eq!(
            chunks,
            vec![
                "First paragraph here.\n\nSecond paragraph here.",
                "Third paragraph here.",
            ]
        );
    }

    #[test]
    fn test_paragraphs_carry_overlap_words() {
        let text = "alpha beta gamma delta epsilon\n\nzeta eta theta iota kappa";
        // overlap 12 / 6 = 2 words carried
        let chunks = chunker(40, 12, 1, Some(SplitStrategy::Paragraphs)).split(text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1], "delta epsilon\n\nzeta eta theta iota kappa");
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
    }

    #[test]
    fn test_paragraphs_survive_default_cleaning() {
        let chunker = chunker(60, 0, 1, Some(SplitStrategy::Paragraphs));
        assert!(chunker.config().clean_text);

        let chunks = chunker.chunk(&document(
            "First paragraph about cats.\n\nSecond paragraph about dogs.\n\nThird paragraph about fish here.",
        ));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        assert_eq!(
            texts,
            vec![
                "First paragraph about cats.\n\nSecond paragraph about dogs.",
                "Third paragraph about fish here.",
            ]
        );
    }

    #[test]
    fn test_paragraphs_clean_inside_each_paragraph() {
        let chunker = chunker(200, 0, 1, Some(SplitStrategy::Paragraphs));
        let chunks = chunker.chunk(&document(
            "<p>Line one\nwraps   here.</p>\n \n\n<p>Second &amp; last.</p>",
        ));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Line one wraps here.\n\nSecond last.");
    }

    #[test]
    fn test_min_chunk_size_drops_small_chunks() {
        let text = format!("{}\n\nshort", "p".repeat(80));
        let chunks = chunker(85, 0, 20, Some(SplitStrategy::Paragraphs)).split(&text);
        assert_eq!(chunks, vec!["p".repeat(80)]);
    }

    #[test]
    fn test_chunk_attaches_positions() {
        let text = "word ".repeat(500);
        let chunker = chunker(300, 50, 20, None);
        let chunks = chunker.chunk(&document(&text));

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total_chunks, chunks.len());
            assert_eq!(chunk.char_count, chunk.text.chars().count());
            assert_eq!(chunk.source_document_id, "doc-1");
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(TextChunker::with_defaults().split("").is_empty());
    }

    #[test]
    fn test_new_rejects_overlap_at_chunk_size() {
        let result = TextChunker::new(ChunkingConfig {
            chunk_size: 200,
            chunk_overlap: 200,
            ..Default::default()
        });
        assert!(matches!(result, Err(ChunkError::Configuration(_))));
    }
}
