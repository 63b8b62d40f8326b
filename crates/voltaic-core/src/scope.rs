//! Observation samples captured per watched element per tick.

/// One sample of an element's terminal state at a simulation instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFrame {
    /// Simulation time the sample was taken at (s).
    pub time: f64,
    /// Voltage at each external lead (V).
    pub voltages: Vec<f64>,
    /// Current through the element (A).
    pub current: f64,
}

impl ScopeFrame {
    /// Voltage difference across the first two leads, the usual quantity
    /// plotted for two-terminal elements.
    pub fn voltage_drop(&self) -> f64 {
        match self.voltages.as_slice() {
            [a, b, ..] => a - b,
            [a] => *a,
            [] => 0.0,
        }
    }
}
