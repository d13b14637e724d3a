//! ORE Pattern - Regular expressions over layered token sequences
//!
//! A pattern is a regular expression whose atoms test the tag of a named
//! layer at one position:
//! - `value_layer` matches where `layer` carries the tag `value`
//! - `.` matches any position
//! - `[a_x b_y]` and `[^a_x b_y]` are (negated) one-position classes
//! - `( ... )` captures, `* + ?` repeat greedily, `^ $` anchor
//!
//! ```ignore
//! let pattern = Pattern::compile("B-NP_chunk I-NP_chunk*")?;
//! for m in pattern.matcher(&sequence)? {
//!     println!("{}", m.range());
//! }
//! ```

pub mod alphabet;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod program;

pub use alphabet::Alphabet;
pub use matcher::{Matcher, PatternMatch};

use std::fmt;

use ore_core::{LayeredSequence, Result};

use program::Program;

/// A compiled pattern. Immutable and shareable across threads; each
/// [`Matcher`] carries its own search state.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    program: Program,
}

impl Pattern {
    /// Parse and compile a pattern string
    pub fn compile(source: &str) -> Result<Self> {
        let ast = parser::parse(source)?;
        let program = program::compile(&ast.root, ast.group_count);
        tracing::debug!(
            pattern = source,
            instructions = program.insts.len(),
            groups = program.group_count,
            "compiled pattern"
        );
        Ok(Self {
            source: source.to_string(),
            program,
        })
    }

    /// Bind a matcher to `sequence`. Fails if the sequence lacks a layer the
    /// pattern reads.
    pub fn matcher(&self, sequence: &LayeredSequence) -> Result<Matcher<'_>> {
        Matcher::bind(self, sequence)
    }

    /// All non-overlapping matches, leftmost first
    pub fn find_all(&self, sequence: &LayeredSequence) -> Result<Vec<PatternMatch>> {
        Ok(self.matcher(sequence)?.collect())
    }

    /// Whether the pattern matches anywhere in `sequence`
    pub fn is_match(&self, sequence: &LayeredSequence) -> Result<bool> {
        Ok(self.matcher(sequence)?.find())
    }

    /// Layers the pattern reads, sorted
    pub fn layers(&self) -> &[String] {
        &self.program.layers
    }

    /// Number of capture groups, excluding the whole match
    pub fn group_count(&self) -> usize {
        self.program.group_count
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Pattern {
    type Err = ore_core::OreError;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::compile(s)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ore_core::{Interval, OreError};

    fn chunks() -> LayeredSequence {
        let mut seq = LayeredSequence::new(7);
        seq.add_layer("n", ["O", "O", "B-NP", "I-NP", "O", "B-NP", "O"])
            .unwrap();
        seq
    }

    #[test]
    fn test_pattern_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pattern>();
    }

    #[test]
    fn test_noun_phrase_chunks() {
        let pattern = Pattern::compile("B-NP_n I-NP_n*").unwrap();
        let seq = chunks();
        let mut m = pattern.matcher(&seq).unwrap();

        assert!(m.find());
        assert_eq!((m.start(), m.end()), (Some(2), Some(4)));
        assert!(m.find());
        assert_eq!((m.start(), m.end()), (Some(5), Some(6)));
        assert!(!m.find());
        assert!(!m.find());
        assert_eq!(m.start(), None);
    }

    #[test]
    fn test_wildcards_advance_past_match() {
        let mut seq = LayeredSequence::new(6);
        seq.add_layer("tok", ["a", "b", "c", "d", "e", "f"]).unwrap();
        let pattern = Pattern::compile("...").unwrap();
        let ranges: Vec<Interval> = pattern
            .find_all(&seq)
            .unwrap()
            .iter()
            .map(PatternMatch::range)
            .collect();
        assert_eq!(ranges, vec![Interval::new(0, 3), Interval::new(3, 3)]);
    }

    #[test]
    fn test_undeclared_layer_at_bind() {
        let pattern = Pattern::compile("NN_pos").unwrap();
        let Err(err) = pattern.matcher(&chunks()) else {
            panic!("binding to a sequence without `pos` should fail");
        };
        assert!(matches!(err, OreError::UndeclaredLayer { layer } if layer == "pos"));
    }

    #[test]
    fn test_display_and_accessors() {
        let pattern: Pattern = "(B-NP_n) I-NP_n* O_n".parse().unwrap();
        assert_eq!(pattern.to_string(), "(B-NP_n) I-NP_n* O_n");
        assert_eq!(pattern.layers(), ["n".to_string()]);
        assert_eq!(pattern.group_count(), 1);
        assert!(pattern.is_match(&chunks()).unwrap());
    }
}
