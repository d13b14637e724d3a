//! Layered sequences
//!
//! A [`LayeredSequence`] is a fixed-length token sequence carrying any number
//! of named parallel tag layers. Each layer is written exactly once; span
//! layers additionally keep their decoded BIO spans.

use std::collections::BTreeMap;

use crate::span::{self, SpanLayer, TypedSpan};
use crate::{Interval, OreError, Result};

/// Fixed-length sequence of named, parallel tag layers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayeredSequence {
    length: usize,
    layers: BTreeMap<String, Vec<String>>,
    span_layers: BTreeMap<String, SpanLayer>,
}

impl LayeredSequence {
    /// Create an empty sequence of `length` positions with no layers
    pub fn new(length: usize) -> Self {
        Self {
            length,
            layers: BTreeMap::new(),
            span_layers: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Add a plain tag layer
    pub fn add_layer<I, S>(&mut self, name: &str, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.check_new_layer(name, tags.len())?;
        self.layers.insert(name.to_string(), tags);
        Ok(())
    }

    /// Add a BIO-tagged layer and decode its spans
    pub fn add_span_layer<I, S>(&mut self, name: &str, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.check_new_layer(name, tags.len())?;
        let decoded = SpanLayer::decode(name, &tags)?;
        self.layers.insert(name.to_string(), tags);
        self.span_layers.insert(name.to_string(), decoded);
        Ok(())
    }

    /// Add a span layer from disjoint intervals of a single type
    pub fn add_span_layer_ranges(
        &mut self,
        name: &str,
        span_type: &str,
        ranges: &[Interval],
    ) -> Result<()> {
        let tags = span::encode_bio(self.length, span_type, ranges)?;
        self.add_span_layer(name, tags)
    }

    fn check_new_layer(&self, name: &str, actual: usize) -> Result<()> {
        if self.layers.contains_key(name) {
            return Err(OreError::DuplicateLayer(name.to_string()));
        }
        if actual != self.length {
            return Err(OreError::LengthMismatch {
                layer: name.to_string(),
                expected: self.length,
                actual,
            });
        }
        Ok(())
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn is_span_layer(&self, name: &str) -> bool {
        self.span_layers.contains_key(name)
    }

    /// Layer names in sorted order
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// All tags of a layer
    pub fn layer(&self, name: &str) -> Option<&[String]> {
        self.layers.get(name).map(Vec::as_slice)
    }

    /// Tag of layer `name` at position `i`
    pub fn tag(&self, name: &str, i: usize) -> Option<&str> {
        self.layers
            .get(name)
            .and_then(|tags| tags.get(i))
            .map(String::as_str)
    }

    /// Tags of layer `name` covered by `interval`
    pub fn tags_in(&self, name: &str, interval: Interval) -> Option<&[String]> {
        let tags = self.layers.get(name)?;
        tags.get(interval.as_range())
    }

    pub fn span_layer(&self, name: &str) -> Option<&SpanLayer> {
        self.span_layers.get(name)
    }

    /// Decoded spans of a span layer, sorted by start
    pub fn spans(&self, name: &str) -> Option<&[TypedSpan]> {
        self.span_layers.get(name).map(SpanLayer::spans)
    }

    /// Intervals of spans of `span_type` on layer `name`
    pub fn spans_of_type(&self, name: &str, span_type: &str) -> Vec<Interval> {
        self.span_layers
            .get(name)
            .map(|layer| layer.spans_of_type(span_type).map(|s| s.interval).collect())
            .unwrap_or_default()
    }

    /// Slice one layer; span layers get a boundary-preserving slice
    pub fn sub_layer(&self, name: &str, start: usize, length: usize) -> Result<Vec<String>> {
        let tags = self
            .layers
            .get(name)
            .ok_or_else(|| OreError::UndeclaredLayer {
                layer: name.to_string(),
            })?;

        if self.span_layers.contains_key(name) {
            return span::slice_bio(tags, start, length);
        }

        start
            .checked_add(length)
            .and_then(|end| tags.get(start..end))
            .map(<[String]>::to_vec)
            .ok_or_else(|| {
                OreError::Bounds(format!(
                    "slice of {length} at {start} exceeds sequence length {}",
                    self.length
                ))
            })
    }

    /// Slice every layer into a new sequence of `length` positions
    pub fn sub_sequence(&self, start: usize, length: usize) -> Result<LayeredSequence> {
        if !Interval::new(start, length).fits_within(self.length) {
            return Err(OreError::Bounds(format!(
                "sub-sequence of {length} at {start} exceeds sequence length {}",
                self.length
            )));
        }

        let mut sub = LayeredSequence::new(length);
        for name in self.layers.keys() {
            let tags = self.sub_layer(name, start, length)?;
            if self.span_layers.contains_key(name) {
                sub.add_span_layer(name, tags)?;
            } else {
                sub.add_layer(name, tags)?;
            }
        }
        Ok(sub)
    }
}

// ============================================================================
// Tests
// ============================================================================
