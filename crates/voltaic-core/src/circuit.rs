//! The circuit: element arena, lead mesh and lifecycle.

use indexmap::IndexMap;

use crate::element::CircuitElement;
use crate::error::Error;
use crate::mna::MnaSystem;
use crate::node::{Lead, NodeId};
use crate::scope::ScopeFrame;
use crate::solver::Solver;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fixed tick length in seconds.
    pub time_step: f64,
    /// Newton sub-iteration budget per tick.
    pub max_sub_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_step: 5e-6,
            max_sub_iterations: 5000,
        }
    }
}

/// A circuit under simulation.
///
/// Elements are registered with [`add`](Circuit::add) and wired with
/// [`connect`](Circuit::connect); every edit marks the circuit dirty and the
/// next [`update`](Circuit::update) re-analyzes before stepping. Fatal
/// conditions park the engine until an edit (or
/// [`need_analyze`](Circuit::need_analyze)) retriggers analysis.
#[derive(Debug)]
pub struct Circuit {
    pub(crate) elements: Vec<Box<dyn CircuitElement>>,
    /// Per element, per terminal: the mesh id the terminal is connected to.
    pub(crate) mesh: Vec<Vec<NodeId>>,
    pub(crate) solver: Solver,
    pub(crate) max_sub_iterations: usize,
    pub(crate) analyze_needed: bool,
    pub(crate) watches: IndexMap<usize, Vec<ScopeFrame>>,
    next_node_id: i64,
}

impl Circuit {
    /// Create an empty circuit with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an empty circuit with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Circuit {
            elements: Vec::new(),
            mesh: Vec::new(),
            solver: Solver {
                time_step: config.time_step,
                ..Default::default()
            },
            max_sub_iterations: config.max_sub_iterations,
            analyze_needed: false,
            watches: IndexMap::new(),
            next_node_id: 1,
        }
    }

    /// Register an element, returning its id (the insertion index).
    pub fn add(&mut self, element: impl CircuitElement + 'static) -> usize {
        self.add_boxed(Box::new(element))
    }

    /// Register an already-boxed element.
    pub fn add_boxed(&mut self, element: Box<dyn CircuitElement>) -> usize {
        self.mesh.push(vec![NodeId::UNASSIGNED; element.lead_count()]);
        self.elements.push(element);
        self.analyze_needed = true;
        self.elements.len() - 1
    }

    /// Connect two leads into one electrical node.
    ///
    /// When both leads already carry distinct ids, the right lead adopts
    /// the left's id; terminals that adopted the right id earlier keep it.
    /// Connect in a consistent left-to-right order to avoid splitting a
    /// node unintentionally.
    ///
    /// # Panics
    ///
    /// Panics if either lead names an unknown element or terminal.
    pub fn connect(&mut self, left: Lead, right: Lead) {
        let a = self.mesh[left.element][left.lead];
        let b = self.mesh[right.element][right.lead];

        match (a.is_unassigned(), b.is_unassigned()) {
            (true, true) => {
                let id = self.alloc_node_id();
                self.mesh[left.element][left.lead] = id;
                self.mesh[right.element][right.lead] = id;
            }
            (false, true) => self.mesh[right.element][right.lead] = a,
            (true, false) => self.mesh[left.element][left.lead] = b,
            (false, false) => self.mesh[right.element][right.lead] = a,
        }
        self.analyze_needed = true;
    }

    /// Begin (or continue) observing an element, returning the samples
    /// collected so far. One frame is appended per tick.
    pub fn watch(&mut self, element: usize) -> &[ScopeFrame] {
        self.watches.entry(element).or_default().as_slice()
    }

    /// Samples collected for a watched element.
    pub fn scope(&self, element: usize) -> Option<&[ScopeFrame]> {
        self.watches.get(&element).map(Vec::as_slice)
    }

    /// Force re-analysis on the next update.
    pub fn need_analyze(&mut self) {
        self.analyze_needed = true;
    }

    /// Rewind the simulation clock to zero.
    pub fn reset_time(&mut self) {
        self.solver.time = 0.0;
    }

    /// The element registered under `id`.
    pub fn element(&self, id: usize) -> Option<&dyn CircuitElement> {
        self.elements.get(id).map(Box::as_ref)
    }

    /// Number of registered elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Mesh id of resolved node `index` (0 is ground).
    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        self.solver.nodes.get(index).map(|n| n.id)
    }

    /// Number of resolved nodes including ground.
    pub fn node_count(&self) -> usize {
        self.solver.nodes.len()
    }

    /// Simulation time (s).
    pub fn time(&self) -> f64 {
        self.solver.time
    }

    /// Fixed tick length (s).
    pub fn time_step(&self) -> f64 {
        self.solver.time_step
    }

    /// Change the tick length. Companion models depend on it, so the
    /// circuit is re-analyzed before the next step.
    pub fn set_time_step(&mut self, time_step: f64) {
        self.solver.time_step = time_step;
        self.analyze_needed = true;
    }

    /// The recorded fatal condition, if the engine is parked.
    pub fn error(&self) -> Option<&Error> {
        self.solver.error.as_ref()
    }

    /// Display form of the recorded fatal condition.
    pub fn error_message(&self) -> Option<String> {
        self.solver.error.as_ref().map(Error::to_string)
    }

    /// Element the fatal condition was attributed to.
    pub fn error_element(&self) -> Option<usize> {
        self.solver.error_element
    }

    /// The assembled system, for diagnostics; `None` before analysis or
    /// while parked on an error.
    pub fn system(&self) -> Option<&MnaSystem> {
        self.solver.mna.as_ref()
    }

    pub(crate) fn alloc_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}
