//! Stamp kernel and simulation state shared with elements.
//!
//! All stamp primitives take 1-based node indices: 0 is ground (entries
//! touching it are discarded), `1..nodes` address node rows and
//! `nodes..` address voltage-source rows. After simplification the kernel
//! translates indices through the row map, folding writes against constant
//! columns into the right side.

use crate::error::Error;
use crate::mna::{MnaSystem, RowType};
use crate::node::CircuitNode;

/// The engine surface elements stamp into.
///
/// Owned by [`Circuit`](crate::Circuit); elements receive `&mut Solver` in
/// `stamp`, `begin_step` and `step` and must touch the matrices only through
/// the stamp primitives.
#[derive(Debug, Default)]
pub struct Solver {
    /// Resolved node list; position 0 is ground.
    pub(crate) nodes: Vec<CircuitNode>,
    /// Element arena index owning each global voltage source.
    pub(crate) voltage_sources: Vec<usize>,
    /// The assembled system; `None` before analysis and after a fatal stop.
    pub(crate) mna: Option<MnaSystem>,
    /// Any element reported `nonlinear()`.
    pub(crate) nonlinear: bool,
    /// Cleared by elements whose local Newton residual is out of tolerance.
    pub(crate) converged: bool,
    /// Current Newton sub-iteration within the tick.
    pub(crate) sub_iter: usize,
    pub(crate) time: f64,
    pub(crate) time_step: f64,
    pub(crate) error: Option<Error>,
    pub(crate) error_element: Option<usize>,
}

impl Solver {
    /// Simulation time (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Fixed tick length (s).
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Newton sub-iteration index within the current tick.
    pub fn sub_iterations(&self) -> usize {
        self.sub_iter
    }

    /// Convergence signal for the current sub-iteration. Elements clear it
    /// from `step` when their operating point moved too far.
    pub fn set_converged(&mut self, converged: bool) {
        self.converged = converged;
    }

    /// Current value of the convergence signal.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub(crate) fn stop(&mut self, error: Error, element: Option<usize>) {
        log::warn!("analysis stopped: {error}");
        self.error = Some(error);
        self.error_element = element;
        self.mna = None;
    }

    /// Matrix row for global voltage source `vs`, as a 1-based node index.
    fn voltage_source_row(&self, vs: usize) -> usize {
        self.nodes.len() + vs
    }

    /// Add `x` at row `i`, column `j` of the system.
    pub fn stamp_matrix(&mut self, i: usize, j: usize, x: f64) {
        if i == 0 || j == 0 {
            return;
        }
        let Some(mna) = self.mna.as_mut() else { return };
        if mna.needs_map {
            let row = mna.row_info[i - 1].map_row;
            let info = &mna.row_info[j - 1];
            if info.row_type == RowType::Const {
                // The variable is known; its contribution moves to the
                // right side.
                mna.right_side[row] -= x * info.value;
                return;
            }
            if let Some(col) = info.map_col {
                mna.matrix[(row, col)] += x;
            }
        } else {
            mna.matrix[(i - 1, j - 1)] += x;
        }
    }

    /// Add `x` to the right side of row `i`.
    pub fn stamp_right_side(&mut self, i: usize, x: f64) {
        if i == 0 {
            return;
        }
        let Some(mna) = self.mna.as_mut() else { return };
        let row = if mna.needs_map {
            mna.row_info[i - 1].map_row
        } else {
            i - 1
        };
        mna.right_side[row] += x;
    }

    /// Declare that row `i`'s right side is updated every sub-iteration
    /// (through [`update_voltage_source`](Self::update_voltage_source) or a
    /// fresh current-source stamp). Keeps the simplifier off the row.
    pub fn mark_right_side_changes(&mut self, i: usize) {
        if i == 0 {
            return;
        }
        if let Some(mna) = self.mna.as_mut() {
            mna.row_info[i - 1].rs_changes = true;
        }
    }

    /// Declare that row `i`'s matrix entries are re-stamped every
    /// sub-iteration. Keeps the simplifier off the row.
    pub fn stamp_nonlinear(&mut self, i: usize) {
        if i == 0 {
            return;
        }
        if let Some(mna) = self.mna.as_mut() {
            mna.row_info[i - 1].ls_changes = true;
        }
    }

    /// Symmetric conductance stamp for a resistance in ohms.
    pub fn stamp_resistor(&mut self, n1: usize, n2: usize, resistance: f64) {
        self.stamp_conductance(n1, n2, 1.0 / resistance);
    }

    /// Symmetric conductance stamp.
    pub fn stamp_conductance(&mut self, n1: usize, n2: usize, g: f64) {
        self.stamp_matrix(n1, n1, g);
        self.stamp_matrix(n2, n2, g);
        self.stamp_matrix(n1, n2, -g);
        self.stamp_matrix(n2, n1, -g);
    }

    /// Stamp voltage source `vs` holding `V(n2) − V(n1) = v`, constant over
    /// the whole simulation.
    pub fn stamp_voltage_source(&mut self, n1: usize, n2: usize, vs: usize, v: f64) {
        let vn = self.voltage_source_row(vs);
        self.stamp_matrix(vn, n1, -1.0);
        self.stamp_matrix(vn, n2, 1.0);
        self.stamp_right_side(vn, v);
        self.stamp_matrix(n1, vn, 1.0);
        self.stamp_matrix(n2, vn, -1.0);
    }

    /// Stamp the couplings of voltage source `vs` and mark its right side
    /// mutable, for sources updated each sub-iteration.
    pub fn stamp_voltage_source_varying(&mut self, n1: usize, n2: usize, vs: usize) {
        let vn = self.voltage_source_row(vs);
        self.stamp_matrix(vn, n1, -1.0);
        self.stamp_matrix(vn, n2, 1.0);
        self.mark_right_side_changes(vn);
        self.stamp_matrix(n1, vn, 1.0);
        self.stamp_matrix(n2, vn, -1.0);
    }

    /// Set the right side of voltage source `vs` to `v`. Valid from `step`
    /// for sources stamped with
    /// [`stamp_voltage_source_varying`](Self::stamp_voltage_source_varying);
    /// the right side is rebuilt from the pristine copy each sub-iteration,
    /// so the add amounts to an assignment.
    pub fn update_voltage_source(&mut self, _n1: usize, _n2: usize, vs: usize, v: f64) {
        let vn = self.voltage_source_row(vs);
        self.stamp_right_side(vn, v);
    }

    /// Voltage-controlled voltage source: constrains source `vs` so that
    /// `V(n2) − V(n1)` scales the controlling pair already coupled on `vs`'s
    /// columns.
    pub fn stamp_vcvs(&mut self, n1: usize, n2: usize, coef: f64, vs: usize) {
        let vn = self.voltage_source_row(vs);
        self.stamp_matrix(vn, n1, coef);
        self.stamp_matrix(vn, n2, -coef);
    }

    /// Voltage-controlled current source: current `g · (V(cn1) − V(cn2))`
    /// injected from `vn1` to `vn2`.
    pub fn stamp_vccs(&mut self, cn1: usize, cn2: usize, vn1: usize, vn2: usize, g: f64) {
        self.stamp_matrix(vn1, cn1, g);
        self.stamp_matrix(vn2, cn2, g);
        self.stamp_matrix(vn1, cn2, -g);
        self.stamp_matrix(vn2, cn1, -g);
    }

    /// Current-controlled current source: `gain` times the current through
    /// voltage source `vs`, injected from `n1` to `n2`.
    pub fn stamp_cccs(&mut self, n1: usize, n2: usize, vs: usize, gain: f64) {
        let vn = self.voltage_source_row(vs);
        self.stamp_matrix(n1, vn, gain);
        self.stamp_matrix(n2, vn, -gain);
    }

    /// Independent current source of `i` amperes flowing from `n1` to `n2`.
    pub fn stamp_current_source(&mut self, n1: usize, n2: usize, i: f64) {
        self.stamp_right_side(n1, -i);
        self.stamp_right_side(n2, i);
    }
}
