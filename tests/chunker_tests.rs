use proptest::prelude::*;

use ragent::models::{Metadata, metadata_from};
use ragent::services::{TextChunker, stitch_spans};

fn size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
    (1usize..80).prop_flat_map(|size| (Just(size), 0..size))
}

fn document() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,12}( [a-z]{1,12}){0,40}",
        "([A-Za-z ,.]{0,60}\n{1,3}){0,12}",
        "[a-zé漢ñ \n]{0,300}",
    ]
}

proptest! {
    #[test]
    fn spans_rebuild_the_original_text(text in document(), (size, overlap) in size_and_overlap()) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let spans = chunker.split_spans(&text);
        prop_assert_eq!(stitch_spans(&text, &spans), text);
    }

    #[test]
    fn chunks_never_exceed_chunk_size(text in document(), (size, overlap) in size_and_overlap()) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        for chunk in chunker.split(&text, &Metadata::new()) {
            prop_assert!(chunk.char_len() <= size);
            prop_assert!(!chunk.content().is_empty());
        }
    }

    #[test]
    fn neighbours_overlap_at_most_chunk_overlap(text in document(), (size, overlap) in size_and_overlap()) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let spans = chunker.split_spans(&text);
        for pair in spans.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
            prop_assert!(pair[1].start <= pair[0].end);
            if pair[1].start < pair[0].end {
                let shared = text[pair[1].start..pair[0].end].chars().count();
                prop_assert!(shared <= overlap);
            }
        }
    }

    #[test]
    fn chunks_always_carry_text(text in document(), (size, overlap) in size_and_overlap()) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let chunks = chunker.split(&text, &Metadata::new());
        if text.trim().is_empty() {
            prop_assert!(chunks.is_empty());
        } else {
            prop_assert!(!chunks.is_empty());
        }
        for chunk in &chunks {
            prop_assert!(!chunk.content().trim().is_empty());
        }
    }

    #[test]
    fn metadata_is_shared_by_all_chunks(text in "[a-z ]{1,200}", (size, overlap) in size_and_overlap()) {
        let chunker = TextChunker::new(size, overlap).unwrap();
        let metadata = metadata_from([("source", "notes.md"), ("page", "3")]);
        for chunk in chunker.split(&text, &metadata) {
            prop_assert_eq!(chunk.metadata(), &metadata);
        }
    }
}

#[test]
fn test_oversized_paragraph_leaves_no_blank_chunk() {
    let first = vec!["word"; 30].join(" ");
    let text = format!("{first}\n\nShort second paragraph.");
    let chunks = TextChunker::new(100, 20)
        .unwrap()
        .split(&text, &Metadata::new());

    let blank = chunks
        .iter()
        .filter(|c| c.content().trim().is_empty())
        .count();
    assert_eq!(blank, 0);
    assert_eq!(chunks.len(), 2);
    assert!(chunks[1].content().ends_with("Short second paragraph."));
}

#[test]
fn test_chunk_size_is_measured_in_characters() {
    let text = "漢字漢字漢字漢字漢字";
    let chunker = TextChunker::new(4, 0).unwrap();
    let chunks = chunker.split(text, &Metadata::new());

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].content(), "漢字漢字");
    assert_eq!(chunks[2].content(), "漢字");
}

#[test]
fn test_typical_document_defaults() {
    let paragraph = "Retrieval augmented generation grounds answers in stored text. ";
    let text = paragraph.repeat(60);
    let chunker = TextChunker::new(1000, 200).unwrap();
    let spans = chunker.split_spans(&text);

    assert!(spans.len() >= 4);
    for span in &spans {
        assert!(text[span.clone()].chars().count() <= 1000);
    }
    assert_eq!(stitch_spans(&text, &spans), text);
    assert!(spans.windows(2).all(|pair| pair[1].start < pair[0].end));
}
