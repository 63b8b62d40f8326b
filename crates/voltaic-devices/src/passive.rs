//! Passive elements: Resistor, Capacitor, Inductor.
//!
//! The reactive elements use trapezoidal companion models: a fixed
//! conductance stamped at analysis time plus a history current source
//! recomputed in `begin_step` and stamped in `step`.

use voltaic_core::{CircuitElement, ElementKind, Solver};

/// An ohmic resistor.
#[derive(Debug, Clone)]
pub struct Resistor {
    /// Resistance in ohms.
    pub resistance: f64,
    nodes: [usize; 2],
    volts: [f64; 2],
    current: f64,
}

impl Resistor {
    pub fn new(resistance: f64) -> Self {
        Self {
            resistance,
            nodes: [0; 2],
            volts: [0.0; 2],
            current: 0.0,
        }
    }
}

impl CircuitElement for Resistor {
    fn lead_count(&self) -> usize {
        2
    }

    fn set_lead_node(&mut self, lead: usize, node: usize) {
        self.nodes[lead] = node;
    }

    fn lead_node(&self, lead: usize) -> usize {
        self.nodes[lead]
    }

    fn set_lead_voltage(&mut self, lead: usize, voltage: f64) {
        self.volts[lead] = voltage;
        self.current = (self.volts[0] - self.volts[1]) / self.resistance;
    }

    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }

    fn current(&self) -> f64 {
        self.current
    }

    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_resistor(self.nodes[0], self.nodes[1], self.resistance);
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
        self.current = 0.0;
    }
}

/// A capacitor, integrated with the trapezoidal rule.
#[derive(Debug, Clone)]
pub struct Capacitor {
    /// Capacitance in farads.
    pub capacitance: f64,
    nodes: [usize; 2],
    volts: [f64; 2],
    volt_diff: f64,
    current: f64,
    cur_source_value: f64,
    comp_resistance: f64,
}

impl Capacitor {
    pub fn new(capacitance: f64) -> Self {
        Self {
            capacitance,
            nodes: [0; 2],
            volts: [0.0; 2],
            volt_diff: 0.0,
            current: 0.0,
            cur_source_value: 0.0,
            comp_resistance: 0.0,
        }
    }

    /// Voltage across the capacitor (lead 0 minus lead 1).
    pub fn voltage(&self) -> f64 {
        self.volt_diff
    }
}

impl CircuitElement for Capacitor {
    fn lead_count(&self) -> usize {
        2
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Capacitor
    }

    fn set_lead_node(&mut self, lead: usize, node: usize) {
        self.nodes[lead] = node;
    }

    fn lead_node(&self, lead: usize) -> usize {
        self.nodes[lead]
    }

    fn set_lead_voltage(&mut self, lead: usize, voltage: f64) {
        self.volts[lead] = voltage;
        self.volt_diff = self.volts[0] - self.volts[1];
        if self.comp_resistance > 0.0 {
            self.current = self.volt_diff / self.comp_resistance + self.cur_source_value;
        }
    }

    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }

    fn current(&self) -> f64 {
        self.current
    }

    fn stamp(&mut self, solver: &mut Solver) {
        // Norton companion: a resistance in parallel with a history
        // current source whose value changes every tick.
        self.comp_resistance = solver.time_step() / (2.0 * self.capacitance);
        solver.stamp_resistor(self.nodes[0], self.nodes[1], self.comp_resistance);
        solver.mark_right_side_changes(self.nodes[0]);
        solver.mark_right_side_changes(self.nodes[1]);
    }

    fn begin_step(&mut self, _solver: &mut Solver) {
        self.cur_source_value = -self.volt_diff / self.comp_resistance - self.current;
    }

    fn step(&mut self, solver: &mut Solver) {
        solver.stamp_current_source(self.nodes[0], self.nodes[1], self.cur_source_value);
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
        self.volt_diff = 0.0;
        self.current = 0.0;
        self.cur_source_value = 0.0;
    }
}

/// An inductor, integrated with the trapezoidal rule.
#[derive(Debug, Clone)]
pub struct Inductor {
    /// Inductance in henries.
    pub inductance: f64,
    nodes: [usize; 2],
    volts: [f64; 2],
    volt_diff: f64,
    current: f64,
    cur_source_value: f64,
    comp_resistance: f64,
}

impl Inductor {
    pub fn new(inductance: f64) -> Self {
        Self {
            inductance,
            nodes: [0; 2],
            volts: [0.0; 2],
            volt_diff: 0.0,
            current: 0.0,
            cur_source_value: 0.0,
            comp_resistance: 0.0,
        }
    }
}

impl CircuitElement for Inductor {
    fn lead_count(&self) -> usize {
        2
    }

    fn kind(&self) -> ElementKind {
        ElementKind::Inductor
    }

    fn set_lead_node(&mut self, lead: usize, node: usize) {
        self.nodes[lead] = node;
    }

    fn lead_node(&self, lead: usize) -> usize {
        self.nodes[lead]
    }

    fn set_lead_voltage(&mut self, lead: usize, voltage: f64) {
        self.volts[lead] = voltage;
        self.volt_diff = self.volts[0] - self.volts[1];
        if self.comp_resistance > 0.0 {
            self.current = self.volt_diff / self.comp_resistance + self.cur_source_value;
        }
    }

    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }

    fn current(&self) -> f64 {
        self.current
    }

    fn stamp(&mut self, solver: &mut Solver) {
        self.comp_resistance = 2.0 * self.inductance / solver.time_step();
        solver.stamp_resistor(self.nodes[0], self.nodes[1], self.comp_resistance);
        solver.mark_right_side_changes(self.nodes[0]);
        solver.mark_right_side_changes(self.nodes[1]);
    }

    fn begin_step(&mut self, _solver: &mut Solver) {
        self.cur_source_value = self.volt_diff / self.comp_resistance + self.current;
    }

    fn step(&mut self, solver: &mut Solver) {
        solver.stamp_current_source(self.nodes[0], self.nodes[1], self.cur_source_value);
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
        self.volt_diff = 0.0;
        self.current = 0.0;
        self.cur_source_value = 0.0;
    }
}
