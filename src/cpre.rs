//! The controllable-predecessor kernel: for a target set of states, the
//! states from which the protagonist can force a next state in the target.
//!
//! Grounded in original_source's `BuchiSolver::CPre_agent`/`CPre_env`: both
//! reduce to the same three steps (`VectorCompose`, quantify away the
//! "independent" player's move, quantify away the remaining move, restrict to
//! the state space) driven by a pair of quantifier objects
//! (`quantify_independent_variables_`, `quantify_non_state_variables_`)
//! chosen once in the constructor from `(starting_player_, protagonist_player_)`.
//! Per REDESIGN FLAGS §9 that choice is precomputed here as a
//! [`QuantifierPlan`] rather than re-branched on every call.

use cudd::Bdd;

use crate::bdd::SharedVarMgr;
use crate::player::Player;

/// One step of a [`QuantifierPlan`]: existentially or universally abstract a
/// cube of variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    Exists,
    Forall,
}

/// The fixed sequence of quantifier steps `cpre` applies, chosen once from
/// `(starting_player, protagonist_player)` per spec.md §4.C's table.
///
/// Split into the same two phases original_source's `BuchiSolver` keeps as
/// separate quantifier objects — `quantify_independent_variables_` (step 1,
/// sometimes the identity) and `quantify_non_state_variables_` (step 2,
/// occasionally a combined forall-then-exists) — rather than a single flat
/// step list, because the Emerson-Lei solver needs to stop after step 1 to
/// accumulate a moves-level (state ∧ input ∧ output) winning-moves BDD before
/// projecting the rest of the way down to a state-only predecessor set.
#[derive(Debug, Clone)]
pub struct QuantifierPlan {
    independent: Option<(Quantifier, Bdd)>,
    remaining: Vec<(Quantifier, Bdd)>,
}

impl QuantifierPlan {
    /// Builds the plan for the given starting and protagonist players.
    ///
    /// | starting | protagonist | step 1 (independent) | step 2 (remaining) |
    /// |---|---|---|---|
    /// | Agent | Agent | ∀ input | ∃ output |
    /// | Agent | Environment | — | ∀ output, ∃ input |
    /// | Environment | Agent | — | ∀ input, ∃ output |
    /// | Environment | Environment | ∀ output | ∃ input |
    pub fn new(var_mgr: &SharedVarMgr, starting_player: Player, protagonist_player: Player) -> Self {
        let manager = var_mgr.borrow();
        let input_cube = manager.input_cube().clone();
        let output_cube = manager.output_cube().clone();

        let (independent, remaining) = match (starting_player, protagonist_player) {
            (Player::Agent, Player::Agent) => (
                Some((Quantifier::Forall, input_cube)),
                vec![(Quantifier::Exists, output_cube)],
            ),
            (Player::Agent, Player::Environment) => {
                (None, vec![(Quantifier::Forall, output_cube), (Quantifier::Exists, input_cube)])
            }
            (Player::Environment, Player::Agent) => {
                (None, vec![(Quantifier::Forall, input_cube), (Quantifier::Exists, output_cube)])
            }
            (Player::Environment, Player::Environment) => (
                Some((Quantifier::Forall, output_cube)),
                vec![(Quantifier::Exists, input_cube)],
            ),
        };
        Self { independent, remaining }
    }

    /// Applies step 1: quantifies away the variables the starting player
    /// alone controls at this turn. The identity when step 1 is "no
    /// quantification" (the starting and protagonist players are not moving
    /// independently this turn).
    pub fn quantify_independent(&self, bdd: Bdd) -> Bdd {
        match &self.independent {
            Some((quantifier, cube)) => apply_quantifier(*quantifier, bdd, cube),
            None => bdd,
        }
    }

    /// Applies step 2: quantifies away every variable not yet eliminated by
    /// [`Self::quantify_independent`], leaving a predecessor set over state
    /// bits only.
    pub fn quantify_remaining(&self, mut bdd: Bdd) -> Bdd {
        for (quantifier, cube) in &self.remaining {
            bdd = apply_quantifier(*quantifier, bdd, cube);
        }
        bdd
    }
}

fn apply_quantifier(quantifier: Quantifier, bdd: Bdd, cube: &Bdd) -> Bdd {
    match quantifier {
        Quantifier::Exists => bdd.exist_abstract(cube),
        Quantifier::Forall => bdd.univ_abstract(cube),
    }
}

/// Computes `CPre(target)`: the states from which the protagonist can force
/// the next state into `target`, restricted to `state_space`.
///
/// `compose_vector` is the arena's transition compose vector, as built by
/// [`crate::bdd::VariableManager::make_compose_vector`] — callers are
/// expected to build it once per arena and reuse it across every `cpre` call,
/// since `target.vector_compose(compose_vector)` is the only step here that
/// scales with the transition function's size.
pub fn cpre(target: &Bdd, compose_vector: &[Bdd], plan: &QuantifierPlan, state_space: &Bdd) -> Bdd {
    let transitions_into_target = target.vector_compose(compose_vector);
    let moves = plan.quantify_independent(transitions_into_target);
    let predecessor = plan.quantify_remaining(moves);
    &predecessor & state_space
}

/// As [`cpre`], but also returns the moves-level (state ∧ input ∧ output)
/// BDD after only step 1 — the representation strategy extraction needs to
/// pick a concrete output assignment, and the one the Emerson-Lei solver
/// accumulates into a Zielonka node's winning-moves slot.
pub fn cpre_with_moves(target: &Bdd, compose_vector: &[Bdd], plan: &QuantifierPlan, state_space: &Bdd) -> (Bdd, Bdd) {
    let transitions_into_target = target.vector_compose(compose_vector);
    let moves = plan.quantify_independent(transitions_into_target) & state_space;
    let predecessor = plan.quantify_remaining(moves.clone());
    (predecessor, moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::VariableManager;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn agent_protagonist_reaches_predecessor_of_self_loop_state() {
        let mut var_mgr = VariableManager::new(&names("i", 1), &names("o", 1));
        let automaton_id = var_mgr.create_state_variables(1);
        let var_mgr = std::rc::Rc::new(std::cell::RefCell::new(var_mgr));

        let state_var = var_mgr.borrow().state_variables(automaton_id)[0].clone();
        // a one-bit automaton whose single state unconditionally self-loops.
        let compose_vector = var_mgr.borrow().make_compose_vector(automaton_id, &[state_var.clone()]);

        let plan = QuantifierPlan::new(&var_mgr, Player::Agent, Player::Agent);
        let state_space = var_mgr.borrow().engine().bdd_one();
        let target = state_var;

        let predecessor = cpre(&target, &compose_vector, &plan, &state_space);
        assert_eq!(predecessor, target);
    }

    #[test]
    fn independent_step_is_identity_exactly_when_players_differ() {
        let var_mgr = VariableManager::new_shared(&names("i", 1), &names("o", 1));
        let same_player = QuantifierPlan::new(&var_mgr, Player::Agent, Player::Agent);
        assert!(same_player.independent.is_some());
        let different_players = QuantifierPlan::new(&var_mgr, Player::Agent, Player::Environment);
        assert!(different_players.independent.is_none());
        assert_eq!(different_players.remaining.len(), 2);
    }
}
