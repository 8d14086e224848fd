//! Solver dispatch: a common result type and a tagged-variant sum type over
//! the four synthesis back-ends, replacing original_source's virtual
//! `Synthesizer<Spec>` base class per REDESIGN FLAGS §9.

pub mod buchi;
pub mod emerson_lei;
pub mod manna_pnueli;
pub mod weak;

use cudd::Bdd;

use crate::automaton::SymbolicDfa;
use crate::color::ColorFormula;
use crate::error::{Result, SynthesisError};

/// The outcome of a synthesis run: whether the specification is realizable,
/// and the winning region it was decided against.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub realizability: bool,
    pub winning_states: Bdd,
}

impl SynthesisResult {
    fn new(arena: &SymbolicDfa, winning_states: Bdd) -> Self {
        let initial = arena.initial_state_bdd();
        let realizability = (&initial & &winning_states) == initial;
        Self { realizability, winning_states }
    }
}

/// Which solver back-end decides a game, selected per spec.md §2's control
/// flow from the outer formula's quantifier mix.
///
/// A sum type with a dispatch shell rather than a trait object hierarchy:
/// every variant shares the same `run` entry point, but each owns exactly
/// the inputs its algorithm needs.
pub enum Solver {
    EmersonLei(emerson_lei::EmersonLei),
    MannaPnueli(manna_pnueli::MannaPnueli),
    Buchi(buchi::BuchiSolver),
    Weak(weak::WeakGameSolver),
}

impl Solver {
    /// Runs the selected solver to completion.
    pub fn run(&self) -> Result<SynthesisResult> {
        match self {
            Solver::EmersonLei(solver) => solver.run(),
            Solver::MannaPnueli(solver) => solver.run(),
            Solver::Buchi(solver) => solver.run(),
            Solver::Weak(solver) => solver.run(),
        }
    }
}

/// Returns whether a color formula's quantifier assignment stays within the
/// obligation fragment (only `Forall`/`Exists`, no `ForallExists`/
/// `ExistsForall`), as required before dispatching to the weak-game or
/// Büchi-classic solvers.
///
/// `quantifiers` maps each color id mentioned in `formula` to its quantifier
/// kind, mirroring the front end's "color-id → (quantifier-kind, leaf
/// subformula)" map (spec.md §6).
pub fn require_obligation_fragment(formula: &ColorFormula, quantifiers: &[QuantifierKind]) -> Result<()> {
    for color in formula.colors() {
        match quantifiers.get(color) {
            Some(QuantifierKind::Forall) | Some(QuantifierKind::Exists) => {}
            Some(other) => {
                return Err(SynthesisError::FragmentMismatch(format!(
                    "color {} has quantifier {:?}, expected Forall or Exists",
                    color, other
                )))
            }
            None => {
                return Err(SynthesisError::Malformed(format!("color {} has no recorded quantifier", color)))
            }
        }
    }
    Ok(())
}

/// The quantifier kind attached to a color, per spec.md §3's "Player enum"
/// and §6's outer-formula quantifier map.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QuantifierKind {
    Forall,
    Exists,
    ForallExists,
    ExistsForall,
}
