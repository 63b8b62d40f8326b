//! End-to-end simulation scenarios driving the engine through the element
//! library.

use voltaic_core::{Circuit, CircuitElement, Error, Lead, Solver};
use voltaic_devices::{
    Capacitor, CurrentSource, Diode, Ground, HalfAdder, Inductor, LogicInput, Resistor,
    VoltageSource, Wire,
};

const DT: f64 = 5e-6;

fn lead_voltage(circuit: &Circuit, element: usize, lead: usize) -> f64 {
    circuit.element(element).unwrap().lead_voltage(lead)
}

fn element_current(circuit: &Circuit, element: usize) -> f64 {
    circuit.element(element).unwrap().current()
}

#[test]
fn test_voltage_divider_splits_evenly() {
    let mut circuit = Circuit::new();
    let batt = circuit.add(VoltageSource::dc(10.0));
    let r1 = circuit.add(Resistor::new(10_000.0));
    let r2 = circuit.add(Resistor::new(10_000.0));
    circuit.connect(Lead::new(batt, 1), Lead::new(r1, 0));
    circuit.connect(Lead::new(r1, 1), Lead::new(r2, 0));
    circuit.connect(Lead::new(r2, 1), Lead::new(batt, 0));

    circuit.update(DT).unwrap();

    let mid = lead_voltage(&circuit, r2, 0);
    assert!((mid - 5.0).abs() < 1e-9, "mid = {mid}");
    assert!((lead_voltage(&circuit, r1, 0) - 10.0).abs() < 1e-9);
}

#[test]
fn test_divider_currents_balance() {
    let mut circuit = Circuit::new();
    let batt = circuit.add(VoltageSource::dc(10.0));
    let r1 = circuit.add(Resistor::new(10_000.0));
    let r2 = circuit.add(Resistor::new(10_000.0));
    circuit.connect(Lead::new(batt, 1), Lead::new(r1, 0));
    circuit.connect(Lead::new(r1, 1), Lead::new(r2, 0));
    circuit.connect(Lead::new(r2, 1), Lead::new(batt, 0));

    circuit.update(DT).unwrap();

    let i1 = element_current(&circuit, r1);
    let i2 = element_current(&circuit, r2);
    let imbalance = (i1 - i2).abs() / i1.abs().max(1e-12);
    assert!(imbalance < 1e-6, "i1 = {i1}, i2 = {i2}");
    assert!((element_current(&circuit, batt).abs() - 5e-4).abs() < 1e-9);
}

#[test]
fn test_rc_charge_reaches_one_tau() {
    // V = 5, R = 1k, C = 1uF: tau = 1 ms = 200 ticks.
    let mut circuit = Circuit::new();
    let batt = circuit.add(VoltageSource::dc(5.0));
    let r = circuit.add(Resistor::new(1_000.0));
    let c = circuit.add(Capacitor::new(1e-6));
    let gnd = circuit.add(Ground::new());
    circuit.connect(Lead::new(batt, 1), Lead::new(r, 0));
    circuit.connect(Lead::new(r, 1), Lead::new(c, 0));
    circuit.connect(Lead::new(c, 1), Lead::new(batt, 0));
    circuit.connect(Lead::new(gnd, 0), Lead::new(batt, 0));

    circuit.watch(c);
    for _ in 0..200 {
        circuit.update(DT).unwrap();
    }

    let expected = 5.0 * (1.0 - (-1.0_f64).exp());
    let v_cap = lead_voltage(&circuit, c, 0) - lead_voltage(&circuit, c, 1);
    let error = (v_cap - expected).abs() / expected;
    assert!(error < 0.01, "V(cap) = {v_cap} (expected {expected})");
    assert!(v_cap.is_finite() && element_current(&circuit, c).is_finite());

    // One scope frame per tick, clock exactly on the grid.
    assert_eq!(circuit.scope(c).unwrap().len(), 200);
    assert_eq!(circuit.time(), 1e-3);
}

#[test]
fn test_rl_current_settles() {
    // V = 5, R = 1k, L = 10 mH: tau = 10 us, settled after 250 us.
    let mut circuit = Circuit::new();
    let batt = circuit.add(VoltageSource::dc(5.0));
    let r = circuit.add(Resistor::new(1_000.0));
    let l = circuit.add(Inductor::new(10e-3));
    circuit.connect(Lead::new(batt, 1), Lead::new(r, 0));
    circuit.connect(Lead::new(r, 1), Lead::new(l, 0));
    circuit.connect(Lead::new(l, 1), Lead::new(batt, 0));

    for _ in 0..50 {
        circuit.update(DT).unwrap();
    }

    let i_l = element_current(&circuit, l);
    assert!((i_l - 5e-3).abs() / 5e-3 < 0.01, "I(L) = {i_l}");
}

#[test]
fn test_shorted_capacitor_is_reset_not_fatal() {
    let mut circuit = Circuit::new();
    let c = circuit.add(Capacitor::new(1e-6));
    let w = circuit.add(Wire::new());
    circuit.connect(Lead::new(c, 0), Lead::new(w, 0));
    circuit.connect(Lead::new(c, 1), Lead::new(w, 1));

    for _ in 0..3 {
        circuit.update(DT).unwrap();
    }

    assert!(circuit.error().is_none());
    let v_cap = lead_voltage(&circuit, c, 0) - lead_voltage(&circuit, c, 1);
    assert!(v_cap.abs() < 1e-9, "V(cap) = {v_cap}");
}

#[test]
fn test_parallel_batteries_report_loop() {
    let mut circuit = Circuit::new();
    let b1 = circuit.add(VoltageSource::dc(5.0));
    let b2 = circuit.add(VoltageSource::dc(5.0));
    circuit.connect(Lead::new(b1, 1), Lead::new(b2, 1));
    circuit.connect(Lead::new(b1, 0), Lead::new(b2, 0));

    let result = circuit.update(DT);
    assert_eq!(result, Err(Error::VoltageSourceLoop));
    assert_eq!(
        circuit.error_message().as_deref(),
        Some("Voltage source/wire loop with no resistance!")
    );
    assert!(circuit.error_element().is_some());
    assert!(circuit.system().is_none());

    // Parked until an edit; the same error keeps coming back untouched.
    assert_eq!(circuit.update(DT), Err(Error::VoltageSourceLoop));
    assert_eq!(circuit.time(), 0.0);
}

#[test]
fn test_half_adder_settles_in_one_tick() {
    let mut circuit = Circuit::new();
    let a = circuit.add(LogicInput::new(true));
    let b = circuit.add(LogicInput::new(true));
    let adder = circuit.add(HalfAdder::new());
    circuit.connect(Lead::new(a, 0), Lead::new(adder, 0));
    circuit.connect(Lead::new(b, 0), Lead::new(adder, 1));

    circuit.update(DT).unwrap();

    let sum = lead_voltage(&circuit, adder, 2);
    let carry = lead_voltage(&circuit, adder, 3);
    assert!(sum.abs() < 1e-9, "sum = {sum}");
    assert!((carry - 5.0).abs() < 1e-9, "carry = {carry}");
}

#[test]
fn test_half_adder_follows_input_edges() {
    let mut circuit = Circuit::new();
    let a = circuit.add(LogicInput::new(true));
    let b_input = LogicInput::new(false);
    let b_level = b_input.level();
    let b = circuit.add(b_input);
    let adder = circuit.add(HalfAdder::new());
    circuit.connect(Lead::new(a, 0), Lead::new(adder, 0));
    circuit.connect(Lead::new(b, 0), Lead::new(adder, 1));

    circuit.update(DT).unwrap();
    assert!((lead_voltage(&circuit, adder, 2) - 5.0).abs() < 1e-9);
    assert!(lead_voltage(&circuit, adder, 3).abs() < 1e-9);

    // Drive B high between ticks; no re-analysis is needed.
    b_level.set(true);
    circuit.update(DT).unwrap();
    assert!(lead_voltage(&circuit, adder, 2).abs() < 1e-9);
    assert!((lead_voltage(&circuit, adder, 3) - 5.0).abs() < 1e-9);
}

#[test]
fn test_diode_rectifier_half_wave() {
    // 5 V, 1 kHz sine through a diode into 1k: one period is 200 ticks.
    let mut circuit = Circuit::new();
    let src = circuit.add(VoltageSource::sine(0.0, 5.0, 1_000.0));
    let d = circuit.add(Diode::new());
    let r = circuit.add(Resistor::new(1_000.0));
    let gnd = circuit.add(Ground::new());
    circuit.connect(Lead::new(src, 1), Lead::new(d, 0));
    circuit.connect(Lead::new(d, 1), Lead::new(r, 0));
    circuit.connect(Lead::new(r, 1), Lead::new(src, 0));
    circuit.connect(Lead::new(gnd, 0), Lead::new(src, 0));

    let mut simulated = 0.0;
    let mut reference = 0.0;
    for tick in 0..200 {
        circuit.update(DT).unwrap();
        let v_out = lead_voltage(&circuit, r, 0);
        assert!(v_out.is_finite());
        simulated += v_out.max(0.0) * DT;

        // The source is sampled at the tick's start time.
        let v_in = 5.0 * (2.0 * std::f64::consts::PI * 1_000.0 * (tick as f64) * DT).sin();
        reference += rectifier_output(v_in).max(0.0) * DT;
    }

    let error = (simulated - reference).abs() / reference;
    assert!(
        error < 0.02,
        "integral = {simulated}, reference = {reference}"
    );
}

/// Solve the scalar diode + resistor equation for the output voltage with
/// the same junction model the library uses (Is = 1e-14, Vt = 25 mV).
fn rectifier_output(v_in: f64) -> f64 {
    if v_in <= 0.0 {
        return 0.0;
    }
    let is = 1e-14;
    let vt = 0.025;
    let r = 1_000.0;
    // Newton on f(v) = Is*(exp((v_in - v)/vt) - 1) - v/r.
    let mut v = (v_in - 0.6).max(0.0);
    for _ in 0..200 {
        let e = ((v_in - v) / vt).exp();
        let f = is * (e - 1.0) - v / r;
        let df = -is * e / vt - 1.0 / r;
        let step = f / df;
        v -= step;
        if step.abs() < 1e-12 {
            break;
        }
    }
    v
}

#[test]
fn test_floating_wire_is_patched_to_ground() {
    let mut circuit = Circuit::new();
    let w = circuit.add(Wire::new());

    circuit.update(DT).unwrap();

    assert!(circuit.error().is_none());
    assert!(lead_voltage(&circuit, w, 0).abs() < 1e-9);
    assert!(lead_voltage(&circuit, w, 1).abs() < 1e-9);
}

#[test]
fn test_empty_circuit_update_is_noop() {
    let mut circuit = Circuit::new();
    circuit.update(DT).unwrap();
    assert_eq!(circuit.time(), 0.0);
    assert_eq!(circuit.node_count(), 0);
}

#[test]
fn test_time_stays_on_grid() {
    let mut circuit = Circuit::new();
    let batt = circuit.add(VoltageSource::dc(1.0));
    let r = circuit.add(Resistor::new(100.0));
    circuit.connect(Lead::new(batt, 1), Lead::new(r, 0));
    circuit.connect(Lead::new(r, 1), Lead::new(batt, 0));

    for k in 1..=1000 {
        circuit.update(DT).unwrap();
        let expected = (k as f64 * DT * 1e12).round() / 1e12;
        assert_eq!(circuit.time(), expected, "tick {k}");
    }

    circuit.reset_time();
    assert_eq!(circuit.time(), 0.0);
}

/// An element whose operating point never settles.
#[derive(Debug)]
struct NeverSettles {
    nodes: [usize; 2],
    volts: [f64; 2],
}

impl CircuitElement for NeverSettles {
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
    }
    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }
    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_nonlinear(self.nodes[0]);
        solver.stamp_nonlinear(self.nodes[1]);
    }
    fn step(&mut self, solver: &mut Solver) {
        solver.stamp_conductance(self.nodes[0], self.nodes[1], 1e-3);
        solver.set_converged(false);
    }
}

#[test]
fn test_convergence_failure_reports_after_budget() {
    let mut circuit = Circuit::new();
    circuit.add(NeverSettles {
        nodes: [0; 2],
        volts: [0.0; 2],
    });

    let result = circuit.update(DT);
    assert_eq!(result, Err(Error::ConvergenceFailed));
    assert_eq!(circuit.error_message().as_deref(), Some("Convergence failed!"));
    // The tick never completed, so the clock did not advance.
    assert_eq!(circuit.time(), 0.0);
}

/// An element that stamps garbage during Newton iteration.
#[derive(Debug)]
struct NanStamper {
    nodes: [usize; 2],
    volts: [f64; 2],
}

impl CircuitElement for NanStamper {
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
    }
    fn lead_voltage(&self, lead: usize) -> f64 {
        self.volts[lead]
    }
    fn stamp(&mut self, solver: &mut Solver) {
        solver.stamp_nonlinear(self.nodes[0]);
    }
    fn step(&mut self, solver: &mut Solver) {
        solver.stamp_conductance(self.nodes[0], self.nodes[1], f64::NAN);
    }
}

#[test]
fn test_nan_stamp_is_fatal() {
    let mut circuit = Circuit::new();
    circuit.add(NanStamper {
        nodes: [0; 2],
        volts: [0.0; 2],
    });

    let result = circuit.update(DT);
    assert_eq!(result, Err(Error::NonFiniteMatrix));
    assert_eq!(
        circuit.error_message().as_deref(),
        Some("NaN/Infinite matrix!")
    );
}

#[test]
fn test_error_clears_after_edit() {
    // A current source with nothing attached has no return path.
    let mut circuit = Circuit::new();
    let cs = circuit.add(CurrentSource::new(1e-3));
    assert_eq!(circuit.update(DT), Err(Error::NoCurrentSourcePath));
    assert_eq!(circuit.update(DT), Err(Error::NoCurrentSourcePath));

    // Closing the loop through a resistor clears the condition on the
    // next analysis.
    let r = circuit.add(Resistor::new(1_000.0));
    circuit.connect(Lead::new(cs, 0), Lead::new(r, 0));
    circuit.connect(Lead::new(cs, 1), Lead::new(r, 1));

    assert!(circuit.update(DT).is_ok());
    assert!(circuit.error().is_none());
    assert!(circuit.time() > 0.0);
    let v_r = lead_voltage(&circuit, r, 0) - lead_voltage(&circuit, r, 1);
    assert!((v_r.abs() - 1.0).abs() < 1e-6, "V(r) = {v_r}");
}
