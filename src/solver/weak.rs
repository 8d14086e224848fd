//! The weak-game solver: SCC-decompose the reachable arena into layers and
//! solve each layer bottom-up with a reachability/safety alternative,
//! avoiding the general fixpoint machinery entirely.
//!
//! Grounded in original_source's `WeakGameSolver` (the layer loop) and
//! `SCCDecomposer`/`ChainSCCDecomposer`/`NaiveSCCDecomposer` (the two
//! interchangeable peeling strategies), re-expressed per REDESIGN FLAGS §9
//! as a [`SccDecomposer`] trait rather than an abstract base class, and
//! built on the crate's existing [`crate::cpre`] kernel instead of a
//! solver-private CPre copy.

use cudd::Bdd;

use crate::automaton::SymbolicDfa;
use crate::bdd::SharedVarMgr;
use crate::cpre::{cpre, QuantifierPlan};
use crate::error::Result;
use crate::player::Player;
use crate::solver::SynthesisResult;

/// Decomposes a set of states into layers: unions of terminal SCCs with no
/// outgoing transition to a state outside the layer, peeled one layer at a
/// time from a shrinking vertex set.
///
/// Two implementations are provided, matching original_source's two
/// `SCCDecomposer` subclasses; either can be swapped into
/// [`WeakGameSolver::new`] without changing anything else, since both only
/// promise that repeatedly peeling layers from `states` eventually empties
/// it and that every peeled layer has no transition leaving `states`.
pub trait SccDecomposer {
    /// Returns one layer: a non-empty subset of `states` (when `states` is
    /// non-empty) that is a union of SCCs with no transition out of
    /// `states`.
    fn peel_layer(&self, states: &Bdd) -> Bdd;
}

/// Builds the one-step relation `R(s, s')` of an arena over a primed copy of
/// its state bits, abstracting away input and output — the underlying game
/// graph's connectivity, ignoring who controls which move.
struct Relation {
    var_mgr: SharedVarMgr,
    /// `R(s, s')`, over the automaton's state bits and the primed copy's.
    relation: Bdd,
    unprimed_vars: Vec<Bdd>,
    state_cube: Bdd,
    primed_cube: Bdd,
    /// Renames unprimed state bits to primed ones.
    to_primed: Vec<Bdd>,
    /// Renames primed state bits back to unprimed ones.
    to_unprimed: Vec<Bdd>,
    /// Swaps unprimed and primed state bits simultaneously — used to reverse
    /// a two-pool relation's direction.
    swap_pools: Vec<Bdd>,
    /// Shifts a relation one hop further: unprimed bits to primed, primed
    /// bits to a third, transient pool, so that two copies of a relation can
    /// be conjoined on their shared middle state without aliasing it with
    /// either endpoint.
    shift_one_hop: Vec<Bdd>,
    /// Renames the third, transient pool back down to the primed one.
    fold_shift: Vec<Bdd>,
}

impl Relation {
    fn build(arena: &SymbolicDfa) -> Self {
        let var_mgr = arena.var_mgr().clone();
        let automaton_id = arena.automaton_id();
        let (primed_id, swap) = var_mgr.borrow_mut().copy_state_space(automaton_id);
        let (_third_id, swap2) = var_mgr.borrow_mut().copy_state_space(primed_id);
        let to_primed = var_mgr.borrow().swap_compose_vector(&swap);
        let to_unprimed = var_mgr.borrow().swap_compose_vector(&swap.reversed());
        let primed_to_third = var_mgr.borrow().swap_compose_vector(&swap2);
        let fold_shift = var_mgr.borrow().swap_compose_vector(&swap2.reversed());

        let manager = var_mgr.borrow();
        let unprimed_vars = manager.state_variables(automaton_id).to_vec();
        let primed_vars = manager.state_variables(primed_id).to_vec();
        let mut relation = manager.engine().bdd_one();
        for (primed_var, transition) in primed_vars.iter().zip(arena.transition_function()) {
            relation = &relation & &primed_var.xnor(transition);
        }
        let io_cube = manager.input_cube() & manager.output_cube();
        let relation = relation.exist_abstract(&io_cube);
        let state_cube = manager.state_variables_cube(automaton_id).clone();
        let primed_cube = manager.state_variables_cube(primed_id).clone();

        // merges two compose vectors with disjoint override domains: at
        // each index, the one that differs from the identity wins.
        let merge = |a: &[Bdd], b: &[Bdd]| -> Vec<Bdd> {
            (0..manager.total_variable_count())
                .map(|i| if a[i] != manager.var_at(i) { a[i].clone() } else { b[i].clone() })
                .collect()
        };
        let swap_pools = merge(&to_primed, &to_unprimed);
        let shift_one_hop = merge(&to_primed, &primed_to_third);
        drop(manager);

        Self {
            var_mgr,
            relation,
            unprimed_vars,
            state_cube,
            primed_cube,
            to_primed,
            to_unprimed,
            swap_pools,
            shift_one_hop,
            fold_shift,
        }
    }

    /// The one-step forward image of `x` (a set over unprimed state bits).
    fn post(&self, x: &Bdd) -> Bdd {
        let joined = &self.relation & x;
        let in_primed_space = joined.exist_abstract(&self.state_cube);
        in_primed_space.vector_compose(&self.to_unprimed)
    }

    /// The one-step backward image (predecessors) of `x`.
    fn pre(&self, x: &Bdd) -> Bdd {
        let x_primed = x.vector_compose(&self.to_primed);
        let joined = &self.relation & &x_primed;
        joined.exist_abstract(&self.primed_cube)
    }

    fn zero(&self) -> Bdd {
        self.var_mgr.borrow().engine().bdd_zero()
    }

    /// `R(s, s')` restricted to `s, s' ∈ states`.
    fn restricted_step(&self, states: &Bdd) -> Bdd {
        let states_primed = states.vector_compose(&self.to_primed);
        &self.relation & &(states & &states_primed)
    }

    /// The identity relation `s = s'`, seeding a reflexive transitive
    /// closure.
    fn identity(&self) -> Bdd {
        let mut identity = self.var_mgr.borrow().engine().bdd_one();
        for var in &self.unprimed_vars {
            let primed = var.vector_compose(&self.to_primed);
            identity = &identity & &var.xnor(&primed);
        }
        identity
    }
}

/// A pivot-driven SCC peeler: repeatedly picks an arbitrary state from the
/// remaining vertex set, grows its SCC by intersecting forward and backward
/// reachability within that set, and collects every terminal SCC found this
/// way into one layer.
///
/// A simplified re-derivation of original_source's `ChainSCCDecomposer`: the
/// original's pivot-reuse heuristic across recursive calls is dropped in
/// favor of always picking a fresh pivot, trading some recomputation for a
/// decomposer that is straightforward to state as correct.
pub struct ChainSccDecomposer {
    relation: Relation,
}

impl ChainSccDecomposer {
    pub fn new(arena: &SymbolicDfa) -> Self {
        Self { relation: Relation::build(arena) }
    }

    fn forward_within(&self, pivot: &Bdd, vertices: &Bdd) -> Bdd {
        let mut set = pivot.clone();
        loop {
            let next = &set | &(&self.relation.post(&set) & vertices);
            if next == set {
                return set;
            }
            set = next;
        }
    }

    fn backward_within(&self, pivot: &Bdd, vertices: &Bdd) -> Bdd {
        let mut set = pivot.clone();
        loop {
            let next = &set | &(&self.relation.pre(&set) & vertices);
            if next == set {
                return set;
            }
            set = next;
        }
    }
}

impl SccDecomposer for ChainSccDecomposer {
    fn peel_layer(&self, states: &Bdd) -> Bdd {
        let mut result = self.relation.zero();
        let mut stack = vec![states.clone()];

        while let Some(vertices) = stack.pop() {
            if vertices.is_zero() {
                continue;
            }
            let pivot = vertices.pick_one_minterm(&self.relation.unprimed_vars);
            let forward = self.forward_within(&pivot, &vertices);
            let backward = self.backward_within(&pivot, &vertices);
            let scc = &forward & &backward;

            let outgoing = &self.relation.post(&scc) & &vertices & &!&scc;
            if outgoing.is_zero() {
                result = &result | &scc;
            }

            let remainder = &vertices & &!&scc;
            if !remainder.is_zero() {
                let still_reachable_forward = &forward & &remainder;
                let rest = &remainder & &!&still_reachable_forward;
                if !still_reachable_forward.is_zero() {
                    stack.push(still_reachable_forward);
                }
                if !rest.is_zero() {
                    stack.push(rest);
                }
            }
        }
        result
    }
}

/// Computes terminal SCCs from a transitive closure of the one-step
/// relation restricted to `states`, as original_source's
/// `NaiveSCCDecomposer` does: `s` belongs to the peeled layer exactly when
/// every state reachable from `s` within `states` can also reach `s` back
/// — i.e. `s`'s SCC has no edge leaving `states`.
pub struct NaiveSccDecomposer {
    relation: Relation,
}

impl NaiveSccDecomposer {
    pub fn new(arena: &SymbolicDfa) -> Self {
        Self { relation: Relation::build(arena) }
    }

    /// The reflexive path relation within `states`, as a least fixpoint over
    /// one-hop extensions of the restricted one-step relation. `step(s, s')`
    /// and its copy shifted one pool further, `step'(s', s'')`, are conjoined
    /// on the shared middle state and the middle projected out, so each
    /// round doubles the longest path `closure` already covers.
    fn restricted_path_relation(&self, states: &Bdd) -> Bdd {
        let step = self.relation.restricted_step(states);
        let mut closure = &step | &self.relation.identity();
        loop {
            let shifted = closure.vector_compose(&self.relation.shift_one_hop);
            let joined = &closure & &shifted;
            let extended = joined.exist_abstract(&self.relation.primed_cube).vector_compose(&self.relation.fold_shift);
            let next = &closure | &extended;
            if next == closure {
                return closure;
            }
            closure = next;
        }
    }
}

impl SccDecomposer for NaiveSccDecomposer {
    fn peel_layer(&self, states: &Bdd) -> Bdd {
        if states.is_zero() {
            return self.relation.zero();
        }
        let path = self.restricted_path_relation(states);
        // reverse `path` (swap the unprimed/primed roles) to get `s' reaches
        // s` out of `path(s, s')`, then test whether it also holds forward.
        let reversed = path.vector_compose(&self.relation.swap_pools);
        let no_return = &path & &!&reversed;
        let bad = no_return.exist_abstract(&self.relation.primed_cube);
        states & &!&bad
    }
}

/// The layer-by-layer weak-game solver.
///
/// Grounded in original_source's `WeakGameSolver::solve`: the reachable part
/// of the arena is decomposed into layers bottom-up, and each layer is
/// classified by a reachability fixpoint (for states the protagonist can
/// already force progress toward) or a safety fixpoint (for states that
/// only need to avoid the losing region), chosen per layer by whether its
/// states are accepting.
pub struct WeakGameSolver {
    arena: SymbolicDfa,
    var_mgr: SharedVarMgr,
    compose_vector: Vec<Bdd>,
    plan: QuantifierPlan,
    state_space: Bdd,
    decomposer: Box<dyn SccDecomposer>,
}

impl WeakGameSolver {
    pub fn new(
        arena: SymbolicDfa,
        starting_player: Player,
        protagonist_player: Player,
        state_space: Bdd,
        decomposer: Box<dyn SccDecomposer>,
    ) -> Self {
        let var_mgr = arena.var_mgr().clone();
        let compose_vector = var_mgr.borrow().make_compose_vector(arena.automaton_id(), arena.transition_function());
        let plan = QuantifierPlan::new(&var_mgr, starting_player, protagonist_player);
        Self { arena, var_mgr, compose_vector, plan, state_space, decomposer }
    }

    pub fn run(&self) -> Result<SynthesisResult> {
        let winning = self.solve();
        Ok(SynthesisResult::new(&self.arena, winning))
    }

    fn cpre(&self, target: &Bdd) -> Bdd {
        cpre(target, &self.compose_vector, &self.plan, &self.state_space)
    }

    fn solve(&self) -> Bdd {
        let engine = self.var_mgr.borrow().engine().clone();
        let mut remaining = self.state_space.clone();
        let mut layers = Vec::new();
        while !remaining.is_zero() {
            let layer = self.decomposer.peel_layer(&remaining);
            if layer.is_zero() {
                // no terminal SCC found (cannot happen on a finite arena);
                // fold whatever is left into one last layer so the loop
                // still terminates.
                layers.push(remaining.clone());
                break;
            }
            layers.push(layer.clone());
            remaining = &remaining & &!&layer;
        }

        let mut processed = engine.bdd_zero();
        let mut good = engine.bdd_zero();
        let mut bad = engine.bdd_zero();
        let accepting = self.arena.final_states().clone();

        for layer in &layers {
            processed = &processed | layer;

            let mut reach_good = engine.bdd_zero();
            loop {
                let next = &processed & &(&good | &self.cpre(&reach_good));
                if next == reach_good {
                    break;
                }
                reach_good = next;
            }

            let not_bad = !bad.clone();
            let mut avoid_bad = processed.clone();
            loop {
                let next = &processed & &not_bad & &self.cpre(&avoid_bad);
                if next == avoid_bad {
                    break;
                }
                avoid_bad = next;
            }

            let newly_good = layer & &((&!&accepting & &reach_good) | &(&accepting & &avoid_bad));
            good = &good | &newly_good;
            bad = &bad | &(layer & &!&good);
        }

        good
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::ExplicitDfaTable;
    use crate::bdd::VariableManager;

    #[test]
    fn naive_decomposer_peels_a_sink_self_loop_first() {
        // state 0 -> state 1 (sink, self-loops). The sink is the only
        // terminal SCC of the full graph.
        let var_mgr = VariableManager::new_shared(&[], &["a".to_string()]);
        let table = ExplicitDfaTable {
            state_count: 2,
            alphabet: vec!["a".to_string()],
            transitions: vec![vec![("0".to_string(), 0), ("1".to_string(), 1)], vec![("-".to_string(), 1)]],
            accepting_states: vec![1],
            initial_state: 0,
        };
        let arena = SymbolicDfa::from_explicit(&var_mgr, &table).unwrap();
        let decomposer = NaiveSccDecomposer::new(&arena);
        let engine = var_mgr.borrow().engine().clone();
        let layer = decomposer.peel_layer(&engine.bdd_one());
        // the sink state (state 1, bit = true) is the only terminal SCC;
        // state 0 has an outgoing edge to it that isn't reciprocated.
        let state_var = var_mgr.borrow().state_variables(arena.automaton_id())[0].clone();
        assert_eq!(layer, state_var);
    }

    #[test]
    fn weak_solver_realizes_a_reachable_accepting_sink() {
        let var_mgr = VariableManager::new_shared(&[], &["a".to_string()]);
        let table = ExplicitDfaTable {
            state_count: 2,
            alphabet: vec!["a".to_string()],
            transitions: vec![vec![("1".to_string(), 1), ("0".to_string(), 0)], vec![("-".to_string(), 1)]],
            accepting_states: vec![1],
            initial_state: 0,
        };
        let arena = SymbolicDfa::from_explicit(&var_mgr, &table).unwrap();
        let state_space = var_mgr.borrow().engine().bdd_one();
        let decomposer = Box::new(NaiveSccDecomposer::new(&arena));
        let solver = WeakGameSolver::new(arena, Player::Agent, Player::Agent, state_space, decomposer);
        let result = solver.run().unwrap();
        assert!(result.realizability);
    }
}
