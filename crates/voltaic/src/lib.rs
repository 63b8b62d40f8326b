//! # Voltaic
//!
//! An interactive transient circuit simulator built on Modified Nodal
//! Analysis. Elements are created, wired lead to lead, and stepped forward
//! in fixed ticks; nonlinear devices converge through Newton-Raphson
//! inside each tick.
//!
//! ## Quick start
//!
//! ```rust
//! use voltaic::prelude::*;
//!
//! // 10 V battery driving a 10k/10k divider.
//! let mut circuit = Circuit::new();
//! let batt = circuit.add(VoltageSource::dc(10.0));
//! let r1 = circuit.add(Resistor::new(10_000.0));
//! let r2 = circuit.add(Resistor::new(10_000.0));
//! circuit.connect(Lead::new(batt, 1), Lead::new(r1, 0));
//! circuit.connect(Lead::new(r1, 1), Lead::new(r2, 0));
//! circuit.connect(Lead::new(r2, 1), Lead::new(batt, 0));
//!
//! circuit.update(5e-6).unwrap();
//! let mid = circuit.element(r2).unwrap().lead_voltage(0);
//! assert!((mid - 5.0).abs() < 1e-9);
//! ```
//!
//! ## Observation
//!
//! ```rust
//! use voltaic::prelude::*;
//!
//! let mut circuit = Circuit::new();
//! let batt = circuit.add(VoltageSource::dc(5.0));
//! let r = circuit.add(Resistor::new(1_000.0));
//! circuit.connect(Lead::new(batt, 1), Lead::new(r, 0));
//! circuit.connect(Lead::new(r, 1), Lead::new(batt, 0));
//!
//! circuit.watch(r);
//! for _ in 0..10 {
//!     circuit.update(5e-6).unwrap();
//! }
//! let frames = circuit.scope(r).unwrap();
//! assert_eq!(frames.len(), 10);
//! assert!((frames[0].voltage_drop() - 5.0).abs() < 1e-9);
//! ```

// Re-export the member crates.
pub use voltaic_core as core;
pub use voltaic_devices as devices;

// Engine surface.
pub use voltaic_core::{
    Circuit, CircuitElement, Config, ElementKind, Error, Lead, NodeId, Result, ScopeFrame, Solver,
};

// Element library.
pub use voltaic_devices::{
    Capacitor, CurrentSource, Diode, DiodeParams, Ground, HalfAdder, Inductor, LogicInput,
    LogicLevel, Rail, Resistor, VoltageSource, Waveform, Wire,
};

/// Re-export of nalgebra's dynamic matrix and vector types.
pub use nalgebra::{DMatrix, DVector};

/// Commonly used types and traits.
///
/// ```rust
/// use voltaic::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Capacitor, Circuit, CircuitElement, Config, CurrentSource, Diode, Error, Ground, Inductor,
        Lead, Rail, Resistor, ScopeFrame, VoltageSource, Waveform, Wire,
    };
}
