//! Independent sources: two-terminal voltage sources, rails and current
//! sources.

use voltaic_core::{CircuitElement, ElementKind, Solver};

use crate::waveforms::Waveform;

/// A two-terminal independent voltage source; lead 1 is the positive
/// terminal.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    /// Output waveform.
    pub waveform: Waveform,
    nodes: [usize; 2],
    volts: [f64; 2],
    current: f64,
    vs: usize,
}

impl VoltageSource {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            nodes: [0; 2],
            volts: [0.0; 2],
            current: 0.0,
            vs: 0,
        }
    }

    /// A DC source (battery).
    pub fn dc(voltage: f64) -> Self {
        Self::new(Waveform::dc(voltage))
    }

    /// A sinusoidal source.
    pub fn sine(offset: f64, amplitude: f64, frequency: f64) -> Self {
        Self::new(Waveform::sin(offset, amplitude, frequency))
    }
}

impl CircuitElement for VoltageSource {
    fn lead_count(&self) -> usize {
        2
    }

    fn voltage_source_count(&self) -> usize {
        1
    }

    fn kind(&self) -> ElementKind {
        ElementKind::VoltageSource
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
        if let Waveform::Dc(v) = &self.waveform {
            solver.stamp_voltage_source(self.nodes[0], self.nodes[1], self.vs, *v);
        } else {
            solver.stamp_voltage_source_varying(self.nodes[0], self.nodes[1], self.vs);
        }
    }

    fn step(&mut self, solver: &mut Solver) {
        if !self.waveform.is_dc() {
            let v = self.waveform.value_at(solver.time());
            solver.update_voltage_source(self.nodes[0], self.nodes[1], self.vs, v);
        }
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
        self.current = 0.0;
    }
}

/// A one-terminal voltage source with an implicit return through ground.
#[derive(Debug, Clone)]
pub struct Rail {
    /// Output waveform.
    pub waveform: Waveform,
    node: usize,
    volt: f64,
    current: f64,
    vs: usize,
}

impl Rail {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            node: 0,
            volt: 0.0,
            current: 0.0,
            vs: 0,
        }
    }

    /// A fixed supply rail.
    pub fn dc(voltage: f64) -> Self {
        Self::new(Waveform::dc(voltage))
    }
}

impl CircuitElement for Rail {
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
        if let Waveform::Dc(v) = &self.waveform {
            solver.stamp_voltage_source(0, self.node, self.vs, *v);
        } else {
            solver.stamp_voltage_source_varying(0, self.node, self.vs);
        }
    }

    fn step(&mut self, solver: &mut Solver) {
        if !self.waveform.is_dc() {
            let v = self.waveform.value_at(solver.time());
            solver.update_voltage_source(0, self.node, self.vs, v);
        }
    }

    fn reset(&mut self) {
        self.volt = 0.0;
        self.current = 0.0;
    }
}

/// An independent current source driving current from lead 0 to lead 1.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    /// Source current in amperes.
    pub amps: f64,
    nodes: [usize; 2],
    volts: [f64; 2],
}

impl CurrentSource {
    pub fn new(amps: f64) -> Self {
        Self {
            amps,
            nodes: [0; 2],
            volts: [0.0; 2],
        }
    }
}

impl CircuitElement for CurrentSource {
    fn lead_count(&self) -> usize {
        2
    }

    fn kind(&self) -> ElementKind {
        ElementKind::CurrentSource
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

    fn current(&self) -> f64 {
        self.amps
    }

    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_current_source(self.nodes[0], self.nodes[1], self.amps);
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
    }
}
