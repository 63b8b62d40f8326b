//! Digital elements: logic-level inputs and combinational chips.
//!
//! Chip output pins are driven as voltage sources referenced to ground;
//! input pins are read against a logic threshold. When a recomputed output
//! differs from what was last driven, the chip clears the convergence flag
//! so the new levels propagate within the same tick.

use std::cell::Cell;
use std::rc::Rc;

use voltaic_core::{CircuitElement, ElementKind, Solver};

/// Input threshold separating logic low from high.
pub const HIGH_THRESHOLD: f64 = 2.5;

/// Output voltage for a logic high.
pub const HIGH_VOLTAGE: f64 = 5.0;

/// Shared control handle for a [`LogicInput`]. Clones refer to the same
/// level, so a front end can flip inputs it no longer owns.
#[derive(Debug, Clone, Default)]
pub struct LogicLevel(Rc<Cell<bool>>);

impl LogicLevel {
    pub fn new(high: bool) -> Self {
        LogicLevel(Rc::new(Cell::new(high)))
    }

    pub fn set(&self, high: bool) {
        self.0.set(high);
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }
}

/// A settable logic-level source. Toggling its [`LogicLevel`] between
/// ticks does not require re-analysis.
#[derive(Debug, Clone, Default)]
pub struct LogicInput {
    level: LogicLevel,
    node: usize,
    volt: f64,
    current: f64,
    vs: usize,
}

impl LogicInput {
    pub fn new(high: bool) -> Self {
        Self {
            level: LogicLevel::new(high),
            ..Default::default()
        }
    }

    /// A handle that controls this input's level.
    pub fn level(&self) -> LogicLevel {
        self.level.clone()
    }

    pub fn is_high(&self) -> bool {
        self.level.get()
    }
}

impl CircuitElement for LogicInput {
    fn lead_count(&self) -> usize {
        1
    }

    fn voltage_source_count(&self) -> usize {
        1
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Rail
    }

    fn lead_is_ground(&self, _lead: usize) -> bool {
        true
    }

    fn set_lead_node(&mut self, _lead: usize, node: usize) {
        self.node = node;
    }

    fn lead_node(&self, _lead: usize) -> usize {
        self.node
    }

    fn set_lead_voltage(&mut self, _lead: usize, voltage: f64) {
        self.volt = voltage;
    }

    fn lead_voltage(&self, _lead: usize) -> f64 {
        self.volt
    }

    fn set_voltage_source(&mut self, _ordinal: usize, index: usize) {
        self.vs = index;
    }

    fn set_current(&mut self, _source: usize, current: f64) {
        self.current = current;
    }

    fn current(&self) -> f64 {
        self.current
    }

    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_voltage_source_varying(0, self.node, self.vs);
    }

    fn step(&mut self, solver: &mut Solver) {
        let v = if self.level.get() { HIGH_VOLTAGE } else { 0.0 };
        solver.update_voltage_source(0, self.node, self.vs, v);
    }

    fn reset(&mut self) {
        self.volt = 0.0;
        self.current = 0.0;
    }
}

/// A half adder. Leads: 0 = A, 1 = B, 2 = sum, 3 = carry.
#[derive(Debug, Clone, Default)]
pub struct HalfAdder {
    nodes: [usize; 4],
    volts: [f64; 4],
    /// Global source indices for the sum and carry drivers.
    vs: [usize; 2],
    currents: [f64; 2],
    last_outputs: Option<(bool, bool)>,
}

impl HalfAdder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last driven sum and carry levels.
    pub fn outputs(&self) -> Option<(bool, bool)> {
        self.last_outputs
    }
}

impl CircuitElement for HalfAdder {
    fn lead_count(&self) -> usize {
        4
    }

    fn voltage_source_count(&self) -> usize {
        2
    }

    fn nonlinear(&self) -> bool {
        // Output changes need extra sub-iterations to settle.
        true
    }

    fn lead_is_ground(&self, lead: usize) -> bool {
        // Output drivers return through ground.
        lead >= 2
    }

    fn leads_are_connected(&self, _a: usize, _b: usize) -> bool {
        false
    }

    fn set_lead_node(&mut self, lead: usize, node: usize) {
        self.nodes[lead] = node;
    }

    fn lead_node(&self, lead: usize) -> usize {
        self.nodes[lead]
    }

    fn set_lead_voltage(&mut self, lead: usize, voltage: f64) {
        self.volts[lead] = voltage;
    }

    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }

    fn set_voltage_source(&mut self, ordinal: usize, index: usize) {
        self.vs[ordinal] = index;
    }

    fn set_current(&mut self, source: usize, current: f64) {
        if source == self.vs[0] {
            self.currents[0] = current;
        } else if source == self.vs[1] {
            self.currents[1] = current;
        }
    }

    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_voltage_source_varying(0, self.nodes[2], self.vs[0]);
        solver.stamp_voltage_source_varying(0, self.nodes[3], self.vs[1]);
    }

    fn step(&mut self, solver: &mut Solver) {
        let a = self.volts[0] > HIGH_THRESHOLD;
        let b = self.volts[1] > HIGH_THRESHOLD;
        let sum = a ^ b;
        let carry = a && b;

        if self.last_outputs != Some((sum, carry)) {
            solver.set_converged(false);
            self.last_outputs = Some((sum, carry));
        }

        let level = |on: bool| if on { HIGH_VOLTAGE } else { 0.0 };
        solver.update_voltage_source(0, self.nodes[2], self.vs[0], level(sum));
        solver.update_voltage_source(0, self.nodes[3], self.vs[1], level(carry));
    }

    fn reset(&mut self) {
        self.volts = [0.0; 4];
        self.currents = [0.0; 2];
        self.last_outputs = None;
    }
}
