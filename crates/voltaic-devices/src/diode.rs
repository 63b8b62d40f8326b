//! Exponential-junction diode.
//!
//! Linearized around the present operating point each Newton sub-iteration
//! as a conductance plus an equivalent current source. Large steps toward
//! the exponential region are compressed through the critical voltage so
//! `exp` stays bounded, and any meaningful movement of the operating point
//! clears the engine's convergence flag.

use voltaic_core::{CircuitElement, Solver};

/// Junction parameters.
#[derive(Debug, Clone)]
pub struct DiodeParams {
    /// Saturation (leakage) current in amperes.
    pub leakage: f64,
    /// Thermal voltage in volts.
    pub vt: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self {
            leakage: 1e-14,
            vt: 0.025,
        }
    }
}

/// A diode; lead 0 is the anode.
#[derive(Debug, Clone)]
pub struct Diode {
    params: DiodeParams,
    /// 1 / vt, the exponent coefficient.
    vd_coef: f64,
    /// Voltage where the junction current starts to explode.
    v_crit: f64,
    nodes: [usize; 2],
    volts: [f64; 2],
    current: f64,
    last_voltage: f64,
}

impl Diode {
    pub fn new() -> Self {
        Self::with_params(DiodeParams::default())
    }

    pub fn with_params(params: DiodeParams) -> Self {
        let vd_coef = 1.0 / params.vt;
        let v_crit = params.vt * (params.vt / (std::f64::consts::SQRT_2 * params.leakage)).ln();
        Self {
            params,
            vd_coef,
            v_crit,
            nodes: [0; 2],
            volts: [0.0; 2],
            current: 0.0,
            last_voltage: 0.0,
        }
    }

    /// Junction current at a given voltage.
    pub fn evaluate(&self, voltage: f64) -> f64 {
        self.params.leakage * ((voltage * self.vd_coef).exp() - 1.0)
    }

    /// Compress a Newton step that overshoots into the exponential region.
    fn limit_step(&self, vnew: f64, vold: f64, solver: &mut Solver) -> f64 {
        let vt = self.params.vt;
        if vnew > self.v_crit && (vnew - vold).abs() > 2.0 * vt {
            let limited = if vold > 0.0 {
                let arg = 1.0 + (vnew - vold) / vt;
                if arg > 0.0 {
                    vold + vt * arg.ln()
                } else {
                    self.v_crit
                }
            } else {
                vt * (vnew / vt).ln()
            };
            solver.set_converged(false);
            limited
        } else {
            vnew
        }
    }
}

impl Default for Diode {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitElement for Diode {
    fn lead_count(&self) -> usize {
        2
    }

    fn nonlinear(&self) -> bool {
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
        self.current = self.evaluate(self.volts[0] - self.volts[1]);
    }

    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }

    fn current(&self) -> f64 {
        self.current
    }

    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_nonlinear(self.nodes[0]);
        solver.stamp_nonlinear(self.nodes[1]);
    }

    fn step(&mut self, solver: &mut Solver) {
        let volt_diff = self.volts[0] - self.volts[1];
        if (volt_diff - self.last_voltage).abs() > 0.01 {
            solver.set_converged(false);
        }
        let volt_diff = self.limit_step(volt_diff, self.last_voltage, solver);
        self.last_voltage = volt_diff;

        let exp = (volt_diff * self.vd_coef).exp();
        let geq = self.vd_coef * self.params.leakage * exp;
        let ieq = (exp - 1.0) * self.params.leakage - geq * volt_diff;
        solver.stamp_conductance(self.nodes[0], self.nodes[1], geq);
        solver.stamp_current_source(self.nodes[0], self.nodes[1], ieq);
    }

    fn reset(&mut self) {
        self.volts = [0.0; 2];
        self.current = 0.0;
        self.last_voltage = 0.0;
    }
}
