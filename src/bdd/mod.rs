//! The process-wide variable manager: names, partitions and automaton state
//! spaces over a single [`cudd::Cudd`] BDD engine.
//!
//! Grounded in the teacher's `controller::bdd::BddController`, which holds a
//! `Cudd` manager alongside named input/output/state variables, and in
//! original_source's `VarMgr`, which is the class this module generalizes:
//! a single authority over variable index allocation with precomputed cubes
//! and compose vectors per automaton.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use cudd::Cudd;

pub use cudd::Bdd;

/// The index of a BDD variable known to the manager.
pub type VarIndex = usize;

/// A variable manager shared by every symbolic DFA and solver built against
/// it, per the engine's single-instance, non-singleton lifecycle (the engine
/// is created once at startup and handed around as a reference, never
/// reached through a hidden global).
pub type SharedVarMgr = Rc<RefCell<VariableManager>>;

/// The id of an automaton state space, as returned by
/// [`VariableManager::create_state_variables`].
pub type AutomatonId = usize;

/// A class of variable known to the manager.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VarClass {
    /// An environment-controlled input variable.
    Input,
    /// An agent-controlled output variable.
    Output,
    /// A state bit of some automaton.
    State(AutomatonId),
}

/// A block of contiguous state-bit variables belonging to one automaton.
#[derive(Debug, Clone)]
struct StateSpace {
    /// The BDD variables for this automaton's state bits, in bit order.
    vars: Vec<Bdd>,
    /// Display names for the state bits, e.g. `s0_0`, `s0_1`, ...
    names: Vec<String>,
    /// The conjunction of all variables in `vars`.
    cube: Bdd,
}

/// A substitution produced by [`VariableManager::copy_state_space`], mapping
/// each state-bit variable of the original automaton to the corresponding
/// variable of the fresh clone.
///
/// Pass it to [`VariableManager::swap_compose_vector`] to get a compose
/// vector that renames every occurrence of the old state bits to the new
/// ones via [`Bdd::vector_compose`], leaving every other variable untouched.
#[derive(Debug, Clone)]
pub struct VariableSwap {
    old: Vec<Bdd>,
    new: Vec<Bdd>,
}

impl VariableSwap {
    /// Swaps the direction of the substitution: a compose vector built from
    /// `self.reversed()` renames the fresh state bits back to the original
    /// ones. Used by the weak-game solver's relational-product construction
    /// to project a primed-space image back into the unprimed automaton.
    pub fn reversed(&self) -> VariableSwap {
        VariableSwap { old: self.new.clone(), new: self.old.clone() }
    }
}

/// The process-wide registry of named Boolean variables, automaton state
/// spaces, cubes and compose vectors.
///
/// Variables are created in a fixed order: all inputs, then all outputs,
/// then state bits allocated after IO on demand. This keeps the input and
/// output cubes contiguous prefixes of the variable index space, which is an
/// invariant the controllable-predecessor kernel and the weak-game solver's
/// relational-product construction both rely on.
pub struct VariableManager {
    cudd: Cudd,
    index_to_name: Vec<String>,
    index_to_class: Vec<VarClass>,
    name_to_index: HashMap<String, VarIndex>,
    input_vars: Vec<Bdd>,
    output_vars: Vec<Bdd>,
    input_cube: Bdd,
    output_cube: Bdd,
    state_spaces: HashMap<AutomatonId, StateSpace>,
    next_automaton_id: AutomatonId,
}

impl VariableManager {
    /// Creates a new variable manager with the given input and output
    /// atomic proposition names.
    ///
    /// The input and output variables are created immediately, in the given
    /// order, so that [`Self::input_cube`] and [`Self::output_cube`] are
    /// contiguous prefixes of the variable index space.
    pub fn new(inputs: &[String], outputs: &[String]) -> Self {
        let cudd = Cudd::with_vars(inputs.len() + outputs.len()).expect("failed to init BDD engine");
        let one = cudd.bdd_one();
        let mut manager = Self {
            cudd,
            index_to_name: Vec::new(),
            index_to_class: Vec::new(),
            name_to_index: HashMap::new(),
            input_vars: Vec::with_capacity(inputs.len()),
            output_vars: Vec::with_capacity(outputs.len()),
            input_cube: one.clone(),
            output_cube: one,
            state_spaces: HashMap::new(),
            next_automaton_id: 0,
        };

        for name in inputs {
            let var = manager.declare_variable(name, VarClass::Input);
            manager.input_vars.push(var);
        }
        for name in outputs {
            let var = manager.declare_variable(name, VarClass::Output);
            manager.output_vars.push(var);
        }
        manager.input_cube = cube_of(&manager.cudd, &manager.input_vars);
        manager.output_cube = cube_of(&manager.cudd, &manager.output_vars);
        manager
    }

    /// Creates a new variable manager and wraps it for shared ownership, as
    /// consumed by [`crate::automaton::SymbolicDfa`] and the solver modules.
    pub fn new_shared(inputs: &[String], outputs: &[String]) -> SharedVarMgr {
        Rc::new(RefCell::new(Self::new(inputs, outputs)))
    }

    fn declare_variable(&mut self, name: &str, class: VarClass) -> Bdd {
        let var = self.cudd.bdd_new_var();
        let index = self.index_to_name.len();
        self.index_to_name.push(name.to_string());
        self.index_to_class.push(class);
        self.name_to_index.insert(name.to_string(), index);
        var
    }

    /// Returns the underlying BDD engine handle.
    pub fn engine(&self) -> &Cudd {
        &self.cudd
    }

    /// Returns the input atomic proposition names, in declaration order.
    pub fn input_names(&self) -> &[String] {
        &self.index_to_name[..self.input_vars.len()]
    }

    /// Returns the output atomic proposition names, in declaration order.
    pub fn output_names(&self) -> &[String] {
        &self.index_to_name[self.input_vars.len()..self.input_vars.len() + self.output_vars.len()]
    }

    /// Returns the BDD variable for the given index.
    pub fn var_at(&self, index: VarIndex) -> Bdd {
        self.cudd.bdd_var(index)
    }

    /// Looks up the BDD variable with the given name.
    ///
    /// # Panics
    ///
    /// Panics if no variable with that name was declared.
    pub fn name_to_variable(&self, name: &str) -> Bdd {
        let index = *self
            .name_to_index
            .get(name)
            .unwrap_or_else(|| panic!("unknown variable name: {}", name));
        self.var_at(index)
    }

    /// Returns whether a variable with the given name has been declared.
    pub fn has_variable(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Returns the declared name of a variable index, if any state/IO
    /// variable was declared with it.
    pub fn index_to_name(&self, index: VarIndex) -> Option<&str> {
        self.index_to_name.get(index).map(String::as_str)
    }

    /// Returns the conjunction of all input variables.
    pub fn input_cube(&self) -> &Bdd {
        &self.input_cube
    }

    /// Returns the conjunction of all output variables.
    pub fn output_cube(&self) -> &Bdd {
        &self.output_cube
    }

    /// Returns the conjunction of the state-bit variables of the given
    /// automaton.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a known automaton id.
    pub fn state_variables_cube(&self, id: AutomatonId) -> &Bdd {
        &self
            .state_spaces
            .get(&id)
            .unwrap_or_else(|| panic!("unknown automaton id: {}", id))
            .cube
    }

    /// Returns the state-bit variables of the given automaton, in bit order.
    pub fn state_variables(&self, id: AutomatonId) -> &[Bdd] {
        &self
            .state_spaces
            .get(&id)
            .unwrap_or_else(|| panic!("unknown automaton id: {}", id))
            .vars
    }

    /// Returns display names for the state bits of the given automaton,
    /// used only for diagnostic dumps.
    pub fn state_variable_labels(&self, id: AutomatonId) -> &[String] {
        &self
            .state_spaces
            .get(&id)
            .unwrap_or_else(|| panic!("unknown automaton id: {}", id))
            .names
    }

    /// Allocates `bit_count` fresh state-bit variables and registers a new
    /// automaton state space for them, returning its id.
    ///
    /// The new variables have strictly higher indices than any existing
    /// variable (the manager's freshness invariant).
    pub fn create_state_variables(&mut self, bit_count: usize) -> AutomatonId {
        let id = self.next_automaton_id;
        self.next_automaton_id += 1;
        let mut vars = Vec::with_capacity(bit_count);
        let mut names = Vec::with_capacity(bit_count);
        for bit in 0..bit_count {
            let name = format!("s{}_{}", id, bit);
            let var = self.declare_variable(&name, VarClass::State(id));
            names.push(name);
            vars.push(var);
        }
        let cube = cube_of(&self.cudd, &vars);
        self.state_spaces.insert(id, StateSpace { vars, names, cube });
        id
    }

    /// Allocates a fresh state space with the same number of bits as
    /// `existing`, together with the substitution that maps the old state
    /// bits to the new ones.
    ///
    /// Used whenever a color appears more than once in the color formula and
    /// its automaton must be cloned to a disjoint state-bit block before the
    /// product arena is built, so that the two occurrences do not alias the
    /// same state bits.
    pub fn copy_state_space(&mut self, existing: AutomatonId) -> (AutomatonId, VariableSwap) {
        let bit_count = self.state_variables(existing).len();
        let old = self.state_variables(existing).to_vec();
        let fresh_id = self.create_state_variables(bit_count);
        let new = self.state_variables(fresh_id).to_vec();
        (fresh_id, VariableSwap { old, new })
    }

    /// Registers an aggregated state space that is the concatenation of the
    /// given automata's state-bit blocks, without allocating new variables.
    ///
    /// Used after a product-AND/OR construction to look up the cube of the
    /// combined arena's state bits under a single id.
    pub fn create_product_state_space(&mut self, ids: &[AutomatonId]) -> AutomatonId {
        let id = self.next_automaton_id;
        self.next_automaton_id += 1;
        let mut vars = Vec::new();
        let mut names = Vec::new();
        for &factor in ids {
            vars.extend(self.state_variables(factor).iter().cloned());
            names.extend(self.state_variable_labels(factor).iter().cloned());
        }
        let cube = cube_of(&self.cudd, &vars);
        self.state_spaces.insert(id, StateSpace { vars, names, cube });
        id
    }

    /// Builds the compose vector for the given automaton: an array indexed by
    /// variable index that maps each of this automaton's state-bit variables
    /// to its transition BDD in `transition_fns` (in bit order), and every
    /// other variable to itself (the identity substitution).
    ///
    /// Passing this vector to [`Bdd::vector_compose`] on a BDD over this
    /// automaton's state bits computes its one-step image under the
    /// transition function in a single pass.
    ///
    /// # Panics
    ///
    /// Panics if `transition_fns` has a different length than the
    /// automaton's state-bit count.
    pub fn make_compose_vector(&self, id: AutomatonId, transition_fns: &[Bdd]) -> Vec<Bdd> {
        let space = self
            .state_spaces
            .get(&id)
            .unwrap_or_else(|| panic!("unknown automaton id: {}", id));
        assert_eq!(
            space.vars.len(),
            transition_fns.len(),
            "compose vector length mismatch for automaton {}",
            id
        );
        let mut vector: Vec<Bdd> = (0..self.total_variable_count())
            .map(|i| self.cudd.bdd_var(i))
            .collect();
        for (var, transition) in space.vars.iter().zip(transition_fns) {
            let index = var_index(var, self);
            vector[index] = transition.clone();
        }
        vector
    }

    /// Returns the substitution vector realizing a [`VariableSwap`]: the
    /// identity everywhere except the swapped state bits.
    pub fn swap_compose_vector(&self, swap: &VariableSwap) -> Vec<Bdd> {
        let mut vector: Vec<Bdd> = (0..self.total_variable_count())
            .map(|i| self.cudd.bdd_var(i))
            .collect();
        for (old_var, new_var) in swap.old.iter().zip(swap.new.iter()) {
            let index = var_index(old_var, self);
            vector[index] = new_var.clone();
        }
        vector
    }

    /// Returns the total number of variables known to the manager.
    pub fn total_variable_count(&self) -> usize {
        self.index_to_name.len()
    }

    /// Dumps the given BDDs as GraphViz DOT, using the declared names where
    /// available and numeric indices otherwise.
    pub fn dump_dot(&self, bdds: &[Bdd], out_names: &[String]) -> String {
        self.cudd.dump_dot(bdds, &self.index_to_name, out_names)
    }
}

/// Conjoins a slice of BDD variables into a single cube.
fn cube_of(cudd: &Cudd, vars: &[Bdd]) -> Bdd {
    vars.iter()
        .fold(cudd.bdd_one(), |acc, var| &acc & var)
}

/// Recovers the variable index of a single-variable BDD by its `NodeReadIndex`
/// equivalent exposed through [`Bdd::view`].
fn var_index(var: &Bdd, manager: &VariableManager) -> VarIndex {
    match var.view() {
        cudd::BddView::InnerNode { var, .. } => var,
        cudd::BddView::Constant => {
            panic!("expected a variable BDD, found a constant (manager has {} vars)", manager.total_variable_count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn input_output_cubes_are_contiguous_prefixes() {
        let manager = VariableManager::new(&names("i", 2), &names("o", 3));
        assert_eq!(manager.total_variable_count(), 5);
        assert_eq!(manager.input_names().len(), 2);
        assert_eq!(manager.output_names().len(), 3);
    }

    #[test]
    fn state_variables_are_fresh_and_disjoint() {
        let mut manager = VariableManager::new(&names("i", 1), &names("o", 1));
        let before = manager.total_variable_count();
        let a = manager.create_state_variables(3);
        let b = manager.create_state_variables(2);
        assert_eq!(manager.total_variable_count(), before + 5);
        let a_vars = manager.state_variables(a).to_vec();
        let b_vars = manager.state_variables(b).to_vec();
        for va in &a_vars {
            for vb in &b_vars {
                assert_ne!(va, vb);
            }
        }
    }

    #[test]
    fn copy_state_space_is_disjoint_from_original() {
        let mut manager = VariableManager::new(&names("i", 1), &names("o", 1));
        let a = manager.create_state_variables(2);
        let (b, swap) = manager.copy_state_space(a);
        assert_ne!(a, b);
        assert_eq!(manager.state_variables(a).len(), manager.state_variables(b).len());
        assert_eq!(swap.old.len(), 2);
        assert_eq!(swap.new.len(), 2);
    }

    #[test]
    fn make_compose_vector_is_identity_outside_automaton() {
        let mut manager = VariableManager::new(&names("i", 1), &names("o", 1));
        let a = manager.create_state_variables(1);
        let target = manager.engine().bdd_one();
        let vector = manager.make_compose_vector(a, &[target]);
        assert_eq!(vector.len(), manager.total_variable_count());
        // the input/output slots must still be the identity projection.
        assert_eq!(vector[0], manager.var_at(0));
    }
}
