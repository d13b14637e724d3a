//! Compiled pattern program
//!
//! The syntax tree is lowered to a small instruction set executed by the
//! backtracking matcher. `Split(a, b)` tries `a` before `b`, which gives
//! greedy quantifiers and leftmost-first alternation priority.

use crate::parser::{Atom, Node, Quantifier};

/// Index into [`Program::predicates`]
pub type PredicateId = usize;

/// Position test compiled from an atom or class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Any,
    /// Layer index into [`Program::layers`] and the expected tag
    Literal { layer: usize, value: String },
    Class { negated: bool, members: Vec<Predicate> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inst {
    /// Consume one position if the predicate holds there
    Test(PredicateId),
    /// Try the first branch, fall back to the second
    Split(usize, usize),
    Jmp(usize),
    /// Record the current position in a capture slot
    Save(usize),
    AssertStart,
    AssertEnd,
    Match,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub insts: Vec<Inst>,
    pub predicates: Vec<Predicate>,
    /// Distinct layer names referenced by the pattern, sorted
    pub layers: Vec<String>,
    /// Capture groups, excluding the implicit whole-match group 0
    pub group_count: usize,
}

impl Program {
    /// Two slots (start, end) per group, including group 0
    pub fn slot_count(&self) -> usize {
        (self.group_count + 1) * 2
    }
}

/// Lower a syntax tree to a program
pub fn compile(root: &Node, group_count: usize) -> Program {
    let mut layers = Vec::new();
    collect_layers(root, &mut layers);
    layers.sort();
    layers.dedup();

    let mut compiler = Compiler {
        insts: Vec::new(),
        predicates: Vec::new(),
        layers: &layers,
    };
    compiler.emit(Inst::Save(0));
    compiler.node(root);
    compiler.emit(Inst::Save(1));
    compiler.emit(Inst::Match);

    let Compiler {
        insts, predicates, ..
    } = compiler;
    Program {
        insts,
        predicates,
        layers,
        group_count,
    }
}

fn collect_layers(node: &Node, layers: &mut Vec<String>) {
    match node {
        Node::Atom(Atom::Literal { layer, .. }) => layers.push(layer.clone()),
        Node::Class { atoms, .. } => {
            for atom in atoms {
                if let Atom::Literal { layer, .. } = atom {
                    layers.push(layer.clone());
                }
            }
        }
        Node::Group { inner, .. } | Node::Repeat { inner, .. } => collect_layers(inner, layers),
        Node::Concat(nodes) => {
            for n in nodes {
                collect_layers(n, layers);
            }
        }
        Node::Atom(Atom::Wildcard) | Node::Start | Node::End => {}
    }
}

struct Compiler<'a> {
    insts: Vec<Inst>,
    predicates: Vec<Predicate>,
    layers: &'a [String],
}

impl Compiler<'_> {
    fn emit(&mut self, inst: Inst) -> usize {
        self.insts.push(inst);
        self.insts.len() - 1
    }

    fn patch(&mut self, at: usize, inst: Inst) {
        self.insts[at] = inst;
    }

    fn pc(&self) -> usize {
        self.insts.len()
    }

    fn predicate(&mut self, predicate: Predicate) -> PredicateId {
        if let Some(existing) = self.predicates.iter().position(|p| *p == predicate) {
            return existing;
        }
        self.predicates.push(predicate);
        self.predicates.len() - 1
    }

    fn atom(&self, atom: &Atom) -> Predicate {
        match atom {
            Atom::Wildcard => Predicate::Any,
            Atom::Literal { layer, value } => Predicate::Literal {
                // Every literal layer was collected before compiling.
                layer: self.layers.binary_search(layer).unwrap_or_default(),
                value: value.clone(),
            },
        }
    }

    fn node(&mut self, node: &Node) {
        match node {
            Node::Atom(atom) => {
                let predicate = self.atom(atom);
                let id = self.predicate(predicate);
                self.emit(Inst::Test(id));
            }
            Node::Class { negated, atoms } => {
                let members = atoms.iter().map(|a| self.atom(a)).collect();
                let id = self.predicate(Predicate::Class {
                    negated: *negated,
                    members,
                });
                self.emit(Inst::Test(id));
            }
            Node::Group { index, inner } => {
                self.emit(Inst::Save(index * 2));
                self.node(inner);
                self.emit(Inst::Save(index * 2 + 1));
            }
            Node::Concat(nodes) => {
                for n in nodes {
                    self.node(n);
                }
            }
            Node::Start => {
                self.emit(Inst::AssertStart);
            }
            Node::End => {
                self.emit(Inst::AssertEnd);
            }
            Node::Repeat { inner, quantifier } => match quantifier {
                Quantifier::ZeroOrMore => {
                    let split = self.emit(Inst::Split(0, 0));
                    self.node(inner);
                    self.emit(Inst::Jmp(split));
                    let after = self.pc();
                    self.patch(split, Inst::Split(split + 1, after));
                }
                Quantifier::OneOrMore => {
                    let body = self.pc();
                    self.node(inner);
                    let after = self.pc() + 1;
                    self.emit(Inst::Split(body, after));
                }
                Quantifier::ZeroOrOne => {
                    let split = self.emit(Inst::Split(0, 0));
                    self.node(inner);
                    let after = self.pc();
                    self.patch(split, Inst::Split(split + 1, after));
                }
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
