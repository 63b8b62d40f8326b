//! Zero-resistance connective elements.
//!
//! Both are modeled as zero-volt voltage sources, which keeps their current
//! observable; the row simplifier folds the resulting trivial rows away
//! before factorization.

use voltaic_core::{CircuitElement, ElementKind, Solver};

/// An ideal wire.
#[derive(Debug, Clone, Default)]
pub struct Wire {
    nodes: [usize; 2],
    volts: [f64; 2],
    current: f64,
    vs: usize,
}

impl Wire {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CircuitElement for Wire {
    fn lead_count(&self) -> usize {
        2
    }

    fn voltage_source_count(&self) -> usize {
        1
    }

    fn is_wire(&self) -> bool {
        true
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
        solver.stamp_voltage_source(self.nodes[0], self.nodes[1], self.vs, 0.0);
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
        self.current = 0.0;
    }
}

/// An explicit tie to the reference node.
#[derive(Debug, Clone, Default)]
pub struct Ground {
    node: usize,
    current: f64,
    vs: usize,
}

impl Ground {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CircuitElement for Ground {
    fn lead_count(&self) -> usize {
        1
    }

    fn voltage_source_count(&self) -> usize {
        1
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Ground
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

    fn set_lead_voltage(&mut self, _lead: usize, _voltage: f64) {}

    fn lead_voltage(&self, _lead: usize) -> f64 {
        0.0
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
        solver.stamp_voltage_source(0, self.node, self.vs, 0.0);
    }

    fn reset(&mut self) {
        self.current = 0.0;
    }
}
