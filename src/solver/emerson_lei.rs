//! The Emerson-Lei solver: a nested μ/ν fixpoint traversing a Zielonka tree.
//!
//! Grounded in original_source's `EmersonLei` class: `run_EL`,
//! `EmersonLeiSolve` and `cpre` are direct counterparts, re-expressed over
//! the arena-owned [`QuantifierPlan`] and the [`ZielonkaTree`] arena instead
//! of raw `ZielonkaNode*` back-edges.

use cudd::Bdd;

use crate::automaton::SymbolicDfa;
use crate::bdd::SharedVarMgr;
use crate::color::ColorFormula;
use crate::cpre::{cpre_with_moves, QuantifierPlan};
use crate::error::Result;
use crate::player::Player;
use crate::solver::SynthesisResult;
use crate::zielonka::{NodeId, ZielonkaTree};

/// A single-strategy synthesizer for an Emerson-Lei game over a symbolic
/// arena.
pub struct EmersonLei {
    arena: SymbolicDfa,
    var_mgr: SharedVarMgr,
    compose_vector: Vec<Bdd>,
    plan: QuantifierPlan,
    state_space: Bdd,
    instant_winning: Bdd,
    instant_losing: Bdd,
    adv_mp: bool,
    tree: std::cell::RefCell<ZielonkaTree>,
}

impl EmersonLei {
    /// Builds an Emerson-Lei solver for `arena` under `color_formula`,
    /// constructing its Zielonka tree from `color_final_states` (length
    /// `2 * num_colors`, see [`ZielonkaTree::build`]).
    ///
    /// `instant_winning`/`instant_losing` let a Manna-Pnueli caller seed
    /// states already decided by a lower DAG node; pass the all-zero BDD for
    /// a standalone Emerson-Lei run. `adv_mp` suppresses the instant-losing
    /// mask in favor of an instant-winning union, per spec.md §9's Open
    /// Questions resolution for the Manna-Pnueli-adversarial variant.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arena: SymbolicDfa,
        color_formula: &ColorFormula,
        num_colors: usize,
        starting_player: Player,
        protagonist_player: Player,
        color_final_states: &[Bdd],
        state_space: Bdd,
        instant_winning: Bdd,
        instant_losing: Bdd,
        adv_mp: bool,
    ) -> Self {
        let var_mgr = arena.var_mgr().clone();
        let compose_vector = var_mgr.borrow().make_compose_vector(arena.automaton_id(), arena.transition_function());
        let plan = QuantifierPlan::new(&var_mgr, starting_player, protagonist_player);
        let postfix = color_formula.to_postfix();
        let tree = ZielonkaTree::build(var_mgr.borrow().engine(), &postfix, color_final_states, num_colors);

        Self {
            arena,
            var_mgr,
            compose_vector,
            plan,
            state_space,
            instant_winning,
            instant_losing,
            adv_mp,
            tree: std::cell::RefCell::new(tree),
        }
    }

    /// Runs the solver and checks the initial state against the winning
    /// region.
    pub fn run(&self) -> Result<SynthesisResult> {
        let el_result = self.run_el();
        Ok(SynthesisResult::new(&self.arena, el_result))
    }

    /// Solves the game, returning the winning-states BDD. Equivalent to
    /// original_source's `run_EL` without the embedded-Büchi shortcut (the
    /// dedicated [`crate::solver::buchi::BuchiSolver`] covers that path).
    pub fn run_el(&self) -> Bdd {
        self.solve(ZielonkaTree::ROOT, self.instant_winning.clone())
    }

    /// The Zielonka tree this solver built, available after [`Self::run_el`]
    /// for strategy extraction: every node's `winning_moves` has been
    /// accumulated by then.
    pub fn tree(&self) -> std::cell::Ref<'_, ZielonkaTree> {
        self.tree.borrow()
    }

    fn combine_with_instant(&self, x: &Bdd) -> Bdd {
        if self.adv_mp {
            x | &self.instant_winning
        } else {
            x & &!&self.instant_losing
        }
    }

    /// `EmersonLeiSolve(t, term)`: the nested fixpoint over node `t`,
    /// starting `X` at 1 (greatest fixpoint) if `t` is winning or at 0
    /// (least fixpoint) otherwise, iterating until `X` stabilizes.
    fn solve(&self, node_id: NodeId, term: Bdd) -> Bdd {
        let winning = self.tree.borrow().node(node_id).winning;
        let mut x = if winning { self.var_mgr.borrow().engine().bdd_one() } else { self.var_mgr.borrow().engine().bdd_zero() };

        loop {
            let masked = self.combine_with_instant(&x);
            let next = if self.tree.borrow().node(node_id).is_leaf() {
                self.solve_leaf(node_id, &term, masked)
            } else {
                self.solve_branch(node_id, &term, masked, winning)
            };
            if next == x {
                return next;
            }
            x = next;
        }
    }

    fn solve_leaf(&self, node_id: NodeId, term: &Bdd, masked: Bdd) -> Bdd {
        let safe_nodes = self.tree.borrow().node(node_id).safe_nodes.clone();
        let cpre_result = self.cpre_and_accumulate(node_id, 0, masked);
        term | &(&safe_nodes & &cpre_result)
    }

    fn solve_branch(&self, node_id: NodeId, term: &Bdd, masked: Bdd, winning: bool) -> Bdd {
        let children = self.tree.borrow().node(node_id).children.clone();
        let mut accumulator =
            if winning { self.var_mgr.borrow().engine().bdd_one() } else { self.var_mgr.borrow().engine().bdd_zero() };

        for (child_index, &child_id) in children.iter().enumerate() {
            let target_nodes = self.tree.borrow().node(child_id).target_nodes.clone();
            let cpre_result = self.cpre_and_accumulate(node_id, child_index, masked.clone());
            let child_term = term | &(&target_nodes & &cpre_result);
            let child_result = self.solve(child_id, child_term);
            accumulator = if winning { &accumulator & &child_result } else { &accumulator | &child_result };
        }
        accumulator
    }

    /// `cpre(t, i, target)`: the CPre kernel restricted to `t.safe_nodes`,
    /// which also accumulates into `t.winning_moves[i]` the moves-level BDD
    /// newly admitted this iteration — intersected in when `t` is winning
    /// (narrowing towards the true winning-moves set), unioned in when
    /// losing (widening towards it).
    fn cpre_and_accumulate(&self, node_id: NodeId, child_index: usize, target: Bdd) -> Bdd {
        let (predecessor, moves) = cpre_with_moves(&target, &self.compose_vector, &self.plan, &self.state_space);
        let masked_moves = if self.adv_mp { moves } else { &moves & &!&self.instant_losing };

        let mut tree = self.tree.borrow_mut();
        let node = tree.node_mut(node_id);
        if node.winning {
            node.winning_moves[child_index] &= &masked_moves;
        } else {
            node.winning_moves[child_index] |= &masked_moves;
        }
        predecessor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{ExplicitDfaTable, SymbolicDfa};
    use crate::bdd::VariableManager;

    fn reachability_table() -> ExplicitDfaTable {
        // state 0 (initial, non-accepting) moves to state 1 on `a`, state 1
        // (accepting) self-loops unconditionally.
        ExplicitDfaTable {
            state_count: 2,
            alphabet: vec!["a".to_string()],
            transitions: vec![vec![("0".to_string(), 0), ("1".to_string(), 1)], vec![("-".to_string(), 1)]],
            accepting_states: vec![1],
            initial_state: 0,
        }
    }

    #[test]
    fn agent_wins_a_pure_exists_reachability_game() {
        let var_mgr = VariableManager::new_shared(&[], &["a".to_string()]);
        let arena = SymbolicDfa::from_explicit(&var_mgr, &reachability_table()).unwrap();
        let final_states = arena.final_states().clone();
        let not_final = !final_states.clone();
        let color_final_states = vec![final_states, not_final];

        let engine = color_final_states[0].manager();
        let formula: ColorFormula = "0".parse().unwrap();
        let solver = EmersonLei::new(
            arena,
            &formula,
            1,
            Player::Agent,
            Player::Agent,
            &color_final_states,
            engine.bdd_one(),
            engine.bdd_zero(),
            engine.bdd_zero(),
            false,
        );

        let result = solver.run().unwrap();
        assert!(result.realizability);
    }

    #[test]
    fn environment_can_force_loss_of_an_unreachable_goal() {
        let var_mgr = VariableManager::new_shared(&["a".to_string()], &[]);
        // state 0 initial non-accepting, self-loops forever: `a` never leads
        // anywhere accepting, so the agent (with no outputs) cannot win a
        // "see color 0" goal.
        let table = ExplicitDfaTable {
            state_count: 1,
            alphabet: vec!["a".to_string()],
            transitions: vec![vec![("-".to_string(), 0)]],
            accepting_states: vec![],
            initial_state: 0,
        };
        let arena = SymbolicDfa::from_explicit(&var_mgr, &table).unwrap();
        let final_states = arena.final_states().clone();
        let not_final = !final_states.clone();
        let color_final_states = vec![final_states, not_final];

        let engine = color_final_states[0].manager();
        let formula: ColorFormula = "0".parse().unwrap();
        let solver = EmersonLei::new(
            arena,
            &formula,
            1,
            Player::Agent,
            Player::Agent,
            &color_final_states,
            engine.bdd_one(),
            engine.bdd_zero(),
            engine.bdd_zero(),
            false,
        );

        let result = solver.run().unwrap();
        assert!(!result.realizability);
    }
}
