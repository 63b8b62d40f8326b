//! The element capability trait the engine drives.

use std::fmt;

use crate::scope::ScopeFrame;
use crate::solver::Solver;

/// Coarse classification the validator uses to decide which elements a path
/// search may traverse. Elements that are none of these return [`ElementKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Two-terminal independent voltage source.
    VoltageSource,
    /// One-terminal voltage source with an implicit ground return.
    Rail,
    /// Independent current source.
    CurrentSource,
    Capacitor,
    Inductor,
    /// Explicit ground tie.
    Ground,
    Other,
}

/// A circuit element as seen by the engine.
///
/// Elements are pure stamp producers: the engine resolves their leads to
/// node indices, then calls [`stamp`](CircuitElement::stamp) once per
/// analysis, [`begin_step`](CircuitElement::begin_step) once per tick and
/// [`step`](CircuitElement::step) once per Newton sub-iteration. Solved node
/// voltages and source currents flow back through
/// [`set_lead_voltage`](CircuitElement::set_lead_voltage) and
/// [`set_current`](CircuitElement::set_current).
pub trait CircuitElement: fmt::Debug {
    /// Number of external terminals.
    fn lead_count(&self) -> usize;

    /// Number of internal degrees of freedom that need their own node.
    fn internal_lead_count(&self) -> usize {
        0
    }

    /// Number of independent voltage sources this element contributes.
    fn voltage_source_count(&self) -> usize {
        0
    }

    /// True when the element must be re-linearized each Newton iteration.
    fn nonlinear(&self) -> bool {
        false
    }

    /// True for zero-resistance connective elements.
    fn is_wire(&self) -> bool {
        false
    }

    /// Classification used by path validation.
    fn kind(&self) -> ElementKind {
        ElementKind::Other
    }

    /// True when the given lead is tied to ground internally, without the
    /// tie being modeled as a lead pair.
    fn lead_is_ground(&self, _lead: usize) -> bool {
        false
    }

    /// True when current can flow between the two leads inside the element.
    /// Multi-section elements (chips) override this to isolate their pins.
    fn leads_are_connected(&self, _a: usize, _b: usize) -> bool {
        true
    }

    /// Bind a lead to its resolved node index. Called before `stamp`.
    fn set_lead_node(&mut self, lead: usize, node: usize);

    /// Node index a lead was bound to.
    fn lead_node(&self, lead: usize) -> usize;

    /// Receive the solved voltage at a lead.
    fn set_lead_voltage(&mut self, lead: usize, voltage: f64);

    /// Last distributed voltage at a lead.
    fn lead_voltage(&self, lead: usize) -> f64;

    /// Bind voltage source `ordinal` (element-local) to its global index.
    /// Called before `stamp`.
    fn set_voltage_source(&mut self, _ordinal: usize, _index: usize) {}

    /// Receive the solved current through voltage source `source` (global
    /// index, as bound by `set_voltage_source`).
    fn set_current(&mut self, _source: usize, _current: f64) {}

    /// Current through the element (A).
    fn current(&self) -> f64 {
        0.0
    }

    /// Contribute the element's time-invariant entries to the matrix.
    fn stamp(&mut self, solver: &mut Solver);

    /// Per-tick precomputation, e.g. companion-model history sources.
    fn begin_step(&mut self, _solver: &mut Solver) {}

    /// Per-sub-iteration contribution: nonlinear elements re-stamp their
    /// linearization, time-varying sources update their right side.
    fn step(&mut self, _solver: &mut Solver) {}

    /// Discard accumulated state (history currents, last voltages).
    fn reset(&mut self) {}

    /// Capture an observation sample at the given time.
    fn scope_frame(&self, time: f64) -> ScopeFrame {
        ScopeFrame {
            time,
            voltages: (0..self.lead_count()).map(|i| self.lead_voltage(i)).collect(),
            current: self.current(),
        }
    }
}
