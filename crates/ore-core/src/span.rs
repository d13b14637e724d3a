//! BIO span codec
//!
//! Converts between per-token boundary tags (`O`, `B-<type>`, `I-<type>`)
//! and typed spans. Decoding is lenient: an `I-<type>` tag that does not
//! continue an open span of the same type is dropped rather than rejected.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Interval, OreError, Result};

/// Tag marking a token outside any span
pub const OUTSIDE: &str = "O";

static BIO_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:O|([BI])-([A-Za-z0-9]+))$").expect("BIO tag regex is valid")
});

/// A parsed boundary tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioTag<'a> {
    Outside,
    Begin(&'a str),
    Inside(&'a str),
}

impl<'a> BioTag<'a> {
    /// Parse a boundary tag, returning `None` if it is outside the alphabet
    pub fn parse(tag: &'a str) -> Option<Self> {
        let caps = BIO_TAG.captures(tag)?;
        match (caps.get(1), caps.get(2)) {
            (None, _) => Some(BioTag::Outside),
            (Some(prefix), Some(span_type)) if prefix.as_str() == "B" => {
                Some(BioTag::Begin(span_type.as_str()))
            }
            (Some(_), Some(span_type)) => Some(BioTag::Inside(span_type.as_str())),
            _ => None,
        }
    }

    pub fn span_type(&self) -> Option<&'a str> {
        match self {
            BioTag::Outside => None,
            BioTag::Begin(t) | BioTag::Inside(t) => Some(t),
        }
    }
}

/// A typed, contiguous span over a sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedSpan {
    pub span_type: String,
    pub interval: Interval,
}

impl TypedSpan {
    pub fn new(span_type: impl Into<String>, interval: Interval) -> Self {
        Self {
            span_type: span_type.into(),
            interval,
        }
    }
}

/// Decode BIO tags into typed spans sorted by start
pub fn decode_bio<S: AsRef<str>>(layer: &str, tags: &[S]) -> Result<Vec<TypedSpan>> {
    let mut spans = Vec::new();
    let mut open: Option<(&str, usize)> = None;

    for (i, tag) in tags.iter().enumerate() {
        let tag = tag.as_ref();
        let parsed = BioTag::parse(tag).ok_or_else(|| OreError::MalformedTag {
            layer: layer.to_string(),
            tag: tag.to_string(),
        })?;

        match parsed {
            BioTag::Inside(t) if matches!(open, Some((open_type, _)) if open_type == t) => {}
            BioTag::Begin(t) => {
                if let Some((open_type, start)) = open.take() {
                    spans.push(TypedSpan::new(open_type, Interval::new(start, i - start)));
                }
                open = Some((t, i));
            }
            BioTag::Outside | BioTag::Inside(_) => {
                if let Some((open_type, start)) = open.take() {
                    spans.push(TypedSpan::new(open_type, Interval::new(start, i - start)));
                }
            }
        }
    }

    if let Some((open_type, start)) = open {
        spans.push(TypedSpan::new(open_type, Interval::new(start, tags.len() - start)));
    }

    Ok(spans)
}

/// Encode disjoint intervals of one type as BIO tags over `length` tokens
pub fn encode_bio(length: usize, span_type: &str, ranges: &[Interval]) -> Result<Vec<String>> {
    if BioTag::parse(&format!("B-{span_type}")).is_none() {
        return Err(OreError::MalformedTag {
            layer: span_type.to_string(),
            tag: format!("B-{span_type}"),
        });
    }

    let mut sorted = ranges.to_vec();
    sorted.sort();

    if let Some((a, b)) = Interval::first_overlap(&sorted) {
        return Err(OreError::Bounds(format!("overlapping ranges {a} and {b}")));
    }

    let mut tags = vec![OUTSIDE.to_string(); length];
    for range in &sorted {
        if !range.fits_within(length) {
            return Err(OreError::Bounds(format!(
                "range {range} exceeds sequence length {length}"
            )));
        }
        if range.is_empty() {
            return Err(OreError::Bounds(format!(
                "cannot encode empty range {range}"
            )));
        }
        tags[range.start()] = format!("B-{span_type}");
        for tag in &mut tags[range.start() + 1..range.end()] {
            *tag = format!("I-{span_type}");
        }
    }

    Ok(tags)
}

/// Copy `tags[start..start + length]`, rewriting a leading `I-<type>` to
/// `B-<type>` so the slice never opens on a dangling interior tag
pub fn slice_bio<S: AsRef<str>>(tags: &[S], start: usize, length: usize) -> Result<Vec<String>> {
    let end = match start.checked_add(length) {
        Some(end) if end <= tags.len() => end,
        _ => {
            return Err(OreError::Bounds(format!(
                "slice of {length} at {start} exceeds sequence length {}",
                tags.len()
            )))
        }
    };

    let mut sliced: Vec<String> = tags[start..end]
        .iter()
        .map(|t| t.as_ref().to_string())
        .collect();

    if let Some(first) = sliced.first_mut() {
        if let Some(BioTag::Inside(t)) = BioTag::parse(first) {
            *first = format!("B-{t}");
        }
    }

    Ok(sliced)
}

// ============================================================================
// Span Layer
// ============================================================================

/// Decoded spans of one BIO layer with a per-type index
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpanLayer {
    spans: Vec<TypedSpan>,
    by_type: BTreeMap<String, Vec<usize>>,
}

impl SpanLayer {
    /// Decode a span layer from its tags
    pub fn decode<S: AsRef<str>>(layer: &str, tags: &[S]) -> Result<Self> {
        let spans = decode_bio(layer, tags)?;
        let mut by_type: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, span) in spans.iter().enumerate() {
            by_type.entry(span.span_type.clone()).or_default().push(idx);
        }
        Ok(Self { spans, by_type })
    }

    /// All spans sorted by start
    pub fn spans(&self) -> &[TypedSpan] {
        &self.spans
    }

    /// Spans of a given type, in start order
    pub fn spans_of_type<'a>(&'a self, span_type: &str) -> impl Iterator<Item = &'a TypedSpan> + 'a {
        self.by_type
            .get(span_type)
            .map(|idxs| idxs.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.spans[i])
    }

    /// Distinct span types present in the layer
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tags(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(BioTag::parse("O"), Some(BioTag::Outside));
        assert_eq!(BioTag::parse("B-NP"), Some(BioTag::Begin("NP")));
        assert_eq!(BioTag::parse("I-VP"), Some(BioTag::Inside("VP")));
        assert_eq!(BioTag::parse("NP"), None);
        assert_eq!(BioTag::parse("B-"), None);
        assert_eq!(BioTag::parse("E-NP"), None);
    }

    #[test]
    fn test_encode_round_trip() {
        let ranges = vec![Interval::new(1, 2), Interval::new(3, 1)];
        let encoded = encode_bio(5, "X", &ranges).unwrap();
        assert_eq!(encoded, tags("O B-X I-X B-X O"));

        let decoded = decode_bio("layer", &encoded).unwrap();
        assert_eq!(
            decoded,
            vec![
                TypedSpan::new("X", Interval::new(1, 2)),
                TypedSpan::new("X", Interval::new(3, 1)),
            ]
        );
    }

    #[test]
    fn test_orphan_inside_tags_are_dropped() {
        let decoded = decode_bio("layer", &tags("O I-X I-X O O")).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_type_switch_closes_span() {
        let decoded = decode_bio("layer", &tags("B-X I-Y I-Y B-Z")).unwrap();
        assert_eq!(
            decoded,
            vec![
                TypedSpan::new("X", Interval::new(0, 1)),
                TypedSpan::new("Z", Interval::new(3, 1)),
            ]
        );
    }

    #[test]
    fn test_malformed_tag_rejected() {
        let err = decode_bio("chunk", &tags("O NP O")).unwrap_err();
        assert!(matches!(err, OreError::MalformedTag { .. }));
    }

    #[test]
    fn test_encode_rejects_overlap_and_overflow() {
        let overlapping = vec![Interval::new(0, 3), Interval::new(2, 2)];
        assert!(matches!(
            encode_bio(5, "X", &overlapping),
            Err(OreError::Bounds(_))
        ));

        let too_long = vec![Interval::new(3, 3)];
        assert!(matches!(
            encode_bio(5, "X", &too_long),
            Err(OreError::Bounds(_))
        ));
    }

    #[test]
    fn test_slice_rewrites_leading_inside() {
        let source = tags("B-X I-X O B-Y I-Y O B-Z");
        let sliced = slice_bio(&source, 1, 2).unwrap();
        assert_eq!(sliced, tags("B-X O"));

        let layer = SpanLayer::decode("layer", &sliced).unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.spans()[0], TypedSpan::new("X", Interval::new(0, 1)));
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let source = tags("O O O");
        assert!(slice_bio(&source, 2, 2).is_err());
        assert!(matches!(
            slice_bio(&source, 1, usize::MAX),
            Err(OreError::Bounds(_))
        ));
        assert!(matches!(
            encode_bio(3, "X", &[Interval::new(usize::MAX, 1)]),
            Err(OreError::Bounds(_))
        ));
    }

    #[test]
    fn test_span_layer_type_index() {
        let layer = SpanLayer::decode("chunk", &tags("B-NP I-NP B-VP B-NP O")).unwrap();
        let nps: Vec<Interval> = layer.spans_of_type("NP").map(|s| s.interval).collect();
        assert_eq!(nps, vec![Interval::new(0, 2), Interval::new(3, 1)]);
        assert_eq!(layer.spans_of_type("PP").count(), 0);
        assert_eq!(layer.types().collect::<Vec<_>>(), vec!["NP", "VP"]);
    }

    proptest! {
        #[test]
        fn test_encode_decode_preserves_ranges(parts in prop::collection::vec((0usize..3, 1usize..4), 0..8)) {
            let mut cursor = 0;
            let mut ranges = Vec::new();
            for (gap, len) in parts {
                cursor += gap;
                ranges.push(Interval::new(cursor, len));
                cursor += len;
            }
            let encoded = encode_bio(cursor + 1, "T", &ranges).unwrap();
            let decoded: Vec<Interval> = decode_bio("layer", &encoded)
                .unwrap()
                .into_iter()
                .map(|s| s.interval)
                .collect();
            prop_assert_eq!(decoded, ranges);
        }
    }
}
