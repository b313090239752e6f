//! Recursive separator-based text chunking with overlap.

use std::collections::VecDeque;
use std::ops::Range;

use crate::error::ConfigError;
use crate::models::{Chunk, Metadata, PipelineConfig, validate_chunking};

/// Separators tried in order: paragraph break, line break, space, then single characters.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Text chunker that splits on the highest-priority separator that keeps
/// chunks within `chunk_size` characters.
///
/// Separators stay attached to the end of the piece they terminate, so the
/// chunks are contiguous spans of the input: stitching them back together
/// with the overlaps removed yields the original text.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk length in characters (Unicode scalar values)
    chunk_size: usize,
    /// Maximum characters shared by consecutive chunks
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Replace the separator list.
    ///
    /// Without a trailing `""` the last separator defines the indivisible unit;
    /// a unit longer than `chunk_size` is then kept whole.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks that all carry `metadata`.
    ///
    /// Spans holding only whitespace are not returned as chunks.
    pub fn split(&self, text: &str, metadata: &Metadata) -> Vec<Chunk> {
        self.split_spans(text)
            .into_iter()
            .filter(|span| !text[span.clone()].trim().is_empty())
            .map(|span| Chunk::new(&text[span], metadata.clone()))
            .collect()
    }

    /// Byte ranges of the merged chunks, in order. Together they tile `text`.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.collect_pieces(text, 0..text.len(), &self.separators, &mut pieces);
        self.merge(&pieces)
    }

    /// Break `range` into pieces of at most `chunk_size` characters, descending
    /// through the separators only for pieces that are too long. Pieces from
    /// every level land in one list so that short leftovers merge with their
    /// neighbours.
    fn collect_pieces(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[String],
        out: &mut Vec<(Range<usize>, usize)>,
    ) {
        let slice = &text[range.clone()];

        let Some(idx) = separators
            .iter()
            .position(|sep| sep.is_empty() || slice.contains(sep.as_str()))
        else {
            // No separator applies: the whole range is one indivisible unit.
            out.push((range.clone(), char_len(slice)));
            return;
        };
        let separator = separators[idx].as_str();
        let remaining = &separators[idx + 1..];

        for piece in split_keeping_separator(slice, separator) {
            let piece = (piece.start + range.start)..(piece.end + range.start);
            let len = char_len(&text[piece.clone()]);

            if len <= self.chunk_size || remaining.is_empty() {
                out.push((piece, len));
            } else {
                self.collect_pieces(text, piece, remaining, out);
            }
        }
    }

    /// Greedily pack contiguous pieces into chunks, carrying up to
    /// `chunk_overlap` characters of trailing pieces into the next chunk.
    fn merge(&self, pieces: &[(Range<usize>, usize)]) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
        let mut total = 0usize;

        for (piece, len) in pieces {
            if total + len > self.chunk_size && !window.is_empty() {
                spans.push(window_span(&window));

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    total -= dropped;
                }
            }

            window.push_back((piece.clone(), *len));
            total += len;
        }

        if !window.is_empty() {
            spans.push(window_span(&window));
        }

        spans
    }
}

fn window_span(window: &VecDeque<(Range<usize>, usize)>) -> Range<usize> {
    match (window.front(), window.back()) {
        (Some((first, _)), Some((last, _))) => first.start..last.end,
        _ => 0..0,
    }
}

/// Split into pieces that tile `text`, each ending with its separator.
/// An empty separator yields one piece per character.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<Range<usize>> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| i..i + c.len_utf8())
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        let end = idx + separator.len();
        pieces.push(start..end);
        start = end;
    }
    if start < text.len() {
        pieces.push(start..text.len());
    }
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Rebuild the source text from ordered, possibly overlapping spans.
pub fn stitch_spans(text: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut covered = 0;
    for span in spans {
        if span.end > covered {
            out.push_str(&text[span.start.max(covered)..span.end]);
            covered = span.end;
        }
    }
    out
}
