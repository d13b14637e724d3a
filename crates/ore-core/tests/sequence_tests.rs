//! Layered sequence and BIO codec integration tests

use ore_core::{AnnotatedSentence, Interval, LayeredSequence, OreError};
use proptest::prelude::*;

fn tags(s: &str) -> Vec<&str> {
    s.split_whitespace().collect()
}

// =============================================================================
// Span codec
// =============================================================================

#[test]
fn test_ranges_round_trip_through_tags() {
    let mut seq = LayeredSequence::new(5);
    seq.add_span_layer_ranges("layer", "X", &[Interval::new(1, 2), Interval::new(3, 1)])
        .unwrap();

    assert_eq!(seq.layer("layer").unwrap(), tags("O B-X I-X B-X O").as_slice());
    assert_eq!(
        seq.spans_of_type("layer", "X"),
        vec![Interval::new(1, 2), Interval::new(3, 1)]
    );
}

#[test]
fn test_orphaned_inside_tags_yield_no_spans() {
    let mut seq = LayeredSequence::new(5);
    seq.add_span_layer("layer", tags("O I-X I-X O O")).unwrap();
    assert!(seq.spans("layer").unwrap().is_empty());
}

#[test]
fn test_boundary_preserving_slice() {
    let mut seq = LayeredSequence::new(7);
    seq.add_span_layer("layer", tags("B-X I-X O B-Y I-Y O B-Z"))
        .unwrap();
    seq.add_layer("tok", tags("a b c d e f g")).unwrap();

    let sub = seq.sub_sequence(1, 2).unwrap();
    assert_eq!(sub.len(), 2);
    assert_eq!(sub.layer("layer").unwrap(), tags("B-X O").as_slice());
    assert_eq!(sub.layer("tok").unwrap(), tags("b c").as_slice());

    let spans = sub.spans("layer").unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].span_type, "X");
    assert_eq!(spans[0].interval, Interval::new(0, 1));
}

#[test]
fn test_overlapping_ranges_rejected() {
    let mut seq = LayeredSequence::new(5);
    let err = seq
        .add_span_layer_ranges("layer", "X", &[Interval::new(0, 3), Interval::new(2, 2)])
        .unwrap_err();
    assert!(matches!(err, OreError::Bounds(_)));
    assert!(!seq.has_layer("layer"));
}

#[test]
fn test_range_past_end_rejected() {
    let mut seq = LayeredSequence::new(3);
    let err = seq
        .add_span_layer_ranges("layer", "X", &[Interval::new(2, 2)])
        .unwrap_err();
    assert!(matches!(err, OreError::Bounds(_)));
}

// =============================================================================
// Annotated sentences
// =============================================================================

#[test]
fn test_sentence_slice_keeps_canonical_layers() {
    let sentence = AnnotatedSentence::from_lines(
        "Mike is the mayor of Seattle .",
        "NNP VBZ DT NN IN NNP .",
        "B-NP O B-NP I-NP O B-NP O",
    )
    .unwrap();

    let sub = sentence.sequence().sub_sequence(3, 3).unwrap();
    let sliced = AnnotatedSentence::from_sequence(sub).unwrap();
    assert_eq!(sliced.text(), "mayor of Seattle");
    assert_eq!(sliced.chunk_tags(), tags("B-NP O B-NP").as_slice());
    assert_eq!(
        sliced.noun_phrases(),
        vec![Interval::new(0, 1), Interval::new(2, 1)]
    );
}

// =============================================================================
// Properties
// =============================================================================

fn disjoint_ranges() -> impl Strategy<Value = (usize, Vec<Interval>)> {
    // Alternating gaps and span lengths laid out left to right.
    prop::collection::vec((0usize..3, 1usize..4), 0..6).prop_map(|parts| {
        let mut cursor = 0;
        let mut ranges = Vec::new();
        for (gap, len) in parts {
            cursor += gap;
            ranges.push(Interval::new(cursor, len));
            cursor += len;
        }
        (cursor, ranges)
    })
}

proptest! {
    #[test]
    fn prop_sorted_disjoint_ranges_are_disjoint((_, ranges) in disjoint_ranges()) {
        prop_assert!(Interval::is_disjoint(&ranges));
    }

    #[test]
    fn prop_any_overlap_breaks_disjointness(
        (_, ranges) in disjoint_ranges(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!ranges.is_empty());
        let victim = ranges[pick.index(ranges.len())];
        let mut with_overlap = ranges.clone();
        with_overlap.push(Interval::new(victim.start(), 1));
        prop_assert!(!Interval::is_disjoint(&with_overlap));
    }

    #[test]
    fn prop_encode_then_decode_recovers_ranges((length, ranges) in disjoint_ranges()) {
        let mut seq = LayeredSequence::new(length);
        seq.add_span_layer_ranges("layer", "T", &ranges).unwrap();
        prop_assert_eq!(seq.spans_of_type("layer", "T"), ranges);
    }
}
