//! Per-sequence tag alphabets
//!
//! When a matcher is bound to a sequence, each layer the pattern reads is
//! compacted into integer symbols: the `a` distinct tags observed on the
//! layer get ids `0..a`, and id `a` stands for any tag not observed. The
//! matcher reads symbols per layer; [`Alphabet::table_size`] only reports
//! how many tag combinations `(a_1 + 1) * ... * (a_L + 1)` the layers span.

use std::collections::HashMap;

use ore_core::{LayeredSequence, OreError, Result};

#[derive(Debug, Clone)]
struct LayerAlphabet {
    symbols: HashMap<String, u32>,
    encoded: Vec<u32>,
}

impl LayerAlphabet {
    fn size(&self) -> usize {
        self.symbols.len()
    }

    fn unknown(&self) -> u32 {
        self.symbols.len() as u32
    }
}

/// Integer encoding of the layers a pattern reads from one sequence
#[derive(Debug, Clone)]
pub struct Alphabet {
    layers: Vec<LayerAlphabet>,
    len: usize,
}

impl Alphabet {
    /// Encode `layer_names` of `sequence`; fails on the first missing layer
    pub fn build(sequence: &LayeredSequence, layer_names: &[String]) -> Result<Self> {
        let mut layers = Vec::with_capacity(layer_names.len());

        for name in layer_names {
            let tags = sequence
                .layer(name)
                .ok_or_else(|| OreError::UndeclaredLayer {
                    layer: name.clone(),
                })?;

            let mut distinct: Vec<&str> = tags.iter().map(String::as_str).collect();
            distinct.sort_unstable();
            distinct.dedup();

            let symbols: HashMap<String, u32> = distinct
                .into_iter()
                .enumerate()
                .map(|(id, tag)| (tag.to_string(), id as u32))
                .collect();
            let encoded = tags.iter().map(|t| symbols[t.as_str()]).collect();

            layers.push(LayerAlphabet { symbols, encoded });
        }

        Ok(Self {
            layers,
            len: sequence.len(),
        })
    }

    /// Symbol id of `tag` on layer `slot`; unobserved tags share one id
    pub fn symbol(&self, slot: usize, tag: &str) -> u32 {
        let layer = &self.layers[slot];
        layer
            .symbols
            .get(tag)
            .copied()
            .unwrap_or_else(|| layer.unknown())
    }

    /// Symbol on layer `slot` at `position`
    pub fn symbol_at(&self, slot: usize, position: usize) -> u32 {
        self.layers[slot].encoded[position]
    }

    /// Distinct observed tags per layer
    pub fn alphabet_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(LayerAlphabet::size).collect()
    }

    /// Number of distinct tag combinations across layers, `None` on overflow
    pub fn table_size(&self) -> Option<u64> {
        self.layers
            .iter()
            .try_fold(1u64, |acc, layer| acc.checked_mul(layer.size() as u64 + 1))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
