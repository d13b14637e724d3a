//! Pattern engine integration tests

use ore_core::{AnnotatedSentence, Interval, LayeredSequence, OreError};
use ore_pattern::Pattern;
use proptest::prelude::*;

fn ranges(pattern: &Pattern, seq: &LayeredSequence) -> Vec<Interval> {
    pattern
        .matcher(seq)
        .unwrap()
        .map(|m| m.range())
        .collect()
}

// =============================================================================
// Matching over annotated sentences
// =============================================================================

#[test]
fn test_relation_phrase_over_pos_and_chunk_layers() {
    let sentence = AnnotatedSentence::from_lines(
        "Mike is the mayor of Seattle .",
        "NNP VBZ DT NN IN NNP .",
        "B-NP O B-NP I-NP O B-NP O",
    )
    .unwrap();

    let pattern = Pattern::compile("VBZ_pos (B-NP_chunk I-NP_chunk*) IN_pos").unwrap();
    let found = pattern.find_all(sentence.sequence()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].range(), Interval::new(1, 4));
    assert_eq!(found[0].group(1), Some(Interval::new(2, 2)));
    assert_eq!(sentence.text_of(found[0].range()), "is the mayor of");
}

#[test]
fn test_token_literals_match_surface_forms() {
    let sentence =
        AnnotatedSentence::from_lines("Mike is the mayor", "NNP VBZ DT NN", "B-NP O B-NP I-NP")
            .unwrap();
    let pattern = Pattern::compile("is_tok the_norm").unwrap();
    assert_eq!(
        ranges(&pattern, sentence.sequence()),
        vec![Interval::new(1, 2)]
    );
}

#[test]
fn test_compiled_pattern_is_reusable_across_sequences() {
    let pattern = Pattern::compile("B-NP_n I-NP_n*").unwrap();

    let mut first = LayeredSequence::new(7);
    first
        .add_layer("n", ["O", "O", "B-NP", "I-NP", "O", "B-NP", "O"])
        .unwrap();
    let mut second = LayeredSequence::new(3);
    second.add_layer("n", ["B-NP", "I-NP", "I-NP"]).unwrap();

    assert_eq!(
        ranges(&pattern, &first),
        vec![Interval::new(2, 2), Interval::new(5, 1)]
    );
    assert_eq!(ranges(&pattern, &second), vec![Interval::new(0, 3)]);
}

#[test]
fn test_syntax_errors_surface_at_compile_time() {
    for bad in ["(NN_pos", "[^ NN_pos", "[NN_pos ^]", "mayor", "NN_pos )"] {
        let err = Pattern::compile(bad).unwrap_err();
        assert!(
            matches!(err, OreError::PatternSyntax { .. }),
            "{bad:?} gave {err:?}"
        );
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_matches_are_ordered_disjoint_and_in_bounds(
        tags in prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 0..20),
        pattern in prop::sample::select(vec![
            "A_x", "A_x B_x*", "[^A_x]+", "B_x*", "A_x? B_x", ". C_x", "(A_x B_x)+ C_x?",
        ]),
    ) {
        let mut seq = LayeredSequence::new(tags.len());
        seq.add_layer("x", tags.iter().copied()).unwrap();
        let pattern = Pattern::compile(pattern).unwrap();

        let found = ranges(&pattern, &seq);
        for pair in found.windows(2) {
            prop_assert!(pair[0].end() <= pair[1].start());
            prop_assert!(pair[0].start() < pair[1].start());
        }
        for m in &found {
            prop_assert!(m.end() <= tags.len());
        }
    }
}
