//! Backtracking matcher
//!
//! A [`Matcher`] is bound to one sequence. Binding evaluates every predicate
//! at every position once, against the integer alphabet, so matching itself
//! only reads a bit table. The search is a bounded backtracker: a
//! `(instruction, position)` state that was already explored cannot lead to
//! a match, so it is never revisited. This keeps matching linear in
//! `instructions * positions` per `find` and cuts empty loops.

use ore_core::{Interval, LayeredSequence, Result};

use crate::alphabet::Alphabet;
use crate::program::{Inst, Predicate, Program};
use crate::Pattern;

/// One match: overall bounds plus capture groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    slots: Vec<Option<usize>>,
}

impl PatternMatch {
    /// Bounds of the whole match
    pub fn range(&self) -> Interval {
        self.group(0).unwrap_or_default()
    }

    pub fn start(&self) -> usize {
        self.range().start()
    }

    pub fn end(&self) -> usize {
        self.range().end()
    }

    /// Bounds of capture group `index` (0 is the whole match), or `None` if
    /// the group did not participate
    pub fn group(&self, index: usize) -> Option<Interval> {
        let start = (*self.slots.get(index * 2)?)?;
        let end = (*self.slots.get(index * 2 + 1)?)?;
        Interval::from_bounds(start, end).ok()
    }

    pub fn group_count(&self) -> usize {
        self.slots.len() / 2 - 1
    }
}

enum Job {
    Step { pc: usize, pos: usize },
    Restore { slot: usize, value: Option<usize> },
}

/// Stateful iterator over the non-overlapping matches in one sequence
pub struct Matcher<'p> {
    program: &'p Program,
    len: usize,
    /// `truth[pred * len + pos]`
    truth: Vec<bool>,
    alphabet: Alphabet,
    cursor: usize,
    exhausted: bool,
    current: Option<PatternMatch>,
    visited: Vec<bool>,
    stack: Vec<Job>,
}

impl<'p> Matcher<'p> {
    pub(crate) fn bind(pattern: &'p Pattern, sequence: &LayeredSequence) -> Result<Self> {
        let program = pattern.program();
        let alphabet = Alphabet::build(sequence, &program.layers)?;
        let len = sequence.len();
        tracing::trace!(
            sizes = ?alphabet.alphabet_sizes(),
            table = ?alphabet.table_size(),
            "bound pattern"
        );

        let mut truth = vec![false; program.predicates.len() * len];
        for (id, predicate) in program.predicates.iter().enumerate() {
            let resolved = resolve(predicate, &alphabet);
            for pos in 0..len {
                truth[id * len + pos] = resolved.holds(&alphabet, pos);
            }
        }

        Ok(Self {
            program,
            len,
            truth,
            alphabet,
            cursor: 0,
            exhausted: false,
            current: None,
            visited: vec![false; program.insts.len() * (len + 1)],
            stack: Vec::new(),
        })
    }

    /// Advance to the next match at or after the end of the previous one.
    /// Returns `false` once no further match exists.
    pub fn find(&mut self) -> bool {
        self.current = None;
        if self.exhausted {
            return false;
        }

        self.visited.iter_mut().for_each(|v| *v = false);
        for start in self.cursor..=self.len {
            if let Some(slots) = self.search_at(start) {
                let found = PatternMatch { slots };
                let range = found.range();
                self.cursor = if range.is_empty() {
                    range.end() + 1
                } else {
                    range.end()
                };
                if self.cursor > self.len {
                    self.exhausted = true;
                }
                tracing::trace!(start = range.start(), end = range.end(), "pattern match");
                self.current = Some(found);
                return true;
            }
        }

        self.exhausted = true;
        false
    }

    /// The most recent match, if the last `find` succeeded
    pub fn current(&self) -> Option<&PatternMatch> {
        self.current.as_ref()
    }

    /// Start of the most recent match
    pub fn start(&self) -> Option<usize> {
        self.current.as_ref().map(PatternMatch::start)
    }

    /// End of the most recent match
    pub fn end(&self) -> Option<usize> {
        self.current.as_ref().map(PatternMatch::end)
    }

    /// Start of group `index` in the most recent match
    pub fn start_of(&self, index: usize) -> Option<usize> {
        self.current
            .as_ref()
            .and_then(|m| m.group(index))
            .map(|g| g.start())
    }

    /// End of group `index` in the most recent match
    pub fn end_of(&self, index: usize) -> Option<usize> {
        self.current
            .as_ref()
            .and_then(|m| m.group(index))
            .map(|g| g.end())
    }

    pub fn group(&self, index: usize) -> Option<Interval> {
        self.current.as_ref().and_then(|m| m.group(index))
    }

    pub fn group_count(&self) -> usize {
        self.program.group_count
    }

    /// Integer alphabet built for the bound sequence
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn holds(&self, predicate: usize, pos: usize) -> bool {
        pos < self.len && self.truth[predicate * self.len + pos]
    }

    fn search_at(&mut self, start: usize) -> Option<Vec<Option<usize>>> {
        let width = self.len + 1;
        let mut slots: Vec<Option<usize>> = vec![None; self.program.slot_count()];
        self.stack.clear();
        self.stack.push(Job::Step { pc: 0, pos: start });

        while let Some(job) = self.stack.pop() {
            let (mut pc, mut pos) = match job {
                Job::Restore { slot, value } => {
                    slots[slot] = value;
                    continue;
                }
                Job::Step { pc, pos } => (pc, pos),
            };

            loop {
                let key = pc * width + pos;
                if self.visited[key] {
                    break;
                }
                self.visited[key] = true;

                match self.program.insts[pc] {
                    Inst::Test(predicate) => {
                        if !self.holds(predicate, pos) {
                            break;
                        }
                        pc += 1;
                        pos += 1;
                    }
                    Inst::Split(first, second) => {
                        self.stack.push(Job::Step { pc: second, pos });
                        pc = first;
                    }
                    Inst::Jmp(target) => pc = target,
                    Inst::Save(slot) => {
                        self.stack.push(Job::Restore {
                            slot,
                            value: slots[slot],
                        });
                        slots[slot] = Some(pos);
                        pc += 1;
                    }
                    Inst::AssertStart => {
                        if pos != 0 {
                            break;
                        }
                        pc += 1;
                    }
                    Inst::AssertEnd => {
                        if pos != self.len {
                            break;
                        }
                        pc += 1;
                    }
                    Inst::Match => return Some(slots),
                }
            }
        }

        None
    }
}

impl Iterator for Matcher<'_> {
    type Item = PatternMatch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.find() {
            self.current.clone()
        } else {
            None
        }
    }
}

/// Predicate with literals replaced by alphabet symbols
enum Resolved {
    Any,
    Symbol { slot: usize, symbol: u32 },
    Class { negated: bool, members: Vec<Resolved> },
}

fn resolve(predicate: &Predicate, alphabet: &Alphabet) -> Resolved {
    match predicate {
        Predicate::Any => Resolved::Any,
        Predicate::Literal { layer, value } => Resolved::Symbol {
            slot: *layer,
            symbol: alphabet.symbol(*layer, value),
        },
        Predicate::Class { negated, members } => Resolved::Class {
            negated: *negated,
            members: members.iter().map(|m| resolve(m, alphabet)).collect(),
        },
    }
}

impl Resolved {
    fn holds(&self, alphabet: &Alphabet, pos: usize) -> bool {
        match self {
            Resolved::Any => true,
            Resolved::Symbol { slot, symbol } => alphabet.symbol_at(*slot, pos) == *symbol,
            Resolved::Class { negated, members } => {
                let any = members.iter().any(|m| m.holds(alphabet, pos));
                any != *negated
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
