//! Core MNA engine for the Voltaic circuit simulator.
//!
//! The engine assembles a linear system from a netlist of elements using
//! Modified Nodal Analysis, simplifies it, factors it and iterates it
//! forward in time, with Newton-Raphson handling nonlinear devices.
//!
//! # Overview
//!
//! - [`Circuit`] - element arena, lead mesh and the `update` lifecycle
//! - [`CircuitElement`] - the capability trait elements implement
//! - [`Solver`] - the stamp kernel elements write through
//! - [`MnaSystem`](mna::MnaSystem) - matrix storage and row bookkeeping
//! - [`linear`] - dense LU factor/solve primitives
//!
//! A tick goes through `begin_step` on every element, then one or more
//! Newton sub-iterations of `step`, factor, solve and distribute, then
//! advances the clock by the fixed time step. Linear circuits are factored
//! once at analysis time and take a single solve per tick.
//!
//! # Example
//!
//! ```rust,ignore
//! use voltaic_core::{Circuit, Lead};
//! use voltaic_devices::{Resistor, VoltageSource};
//!
//! let mut circuit = Circuit::new();
//! let batt = circuit.add(VoltageSource::dc(10.0));
//! let r1 = circuit.add(Resistor::new(10_000.0));
//! let r2 = circuit.add(Resistor::new(10_000.0));
//! circuit.connect(Lead::new(batt, 1), Lead::new(r1, 0));
//! circuit.connect(Lead::new(r1, 1), Lead::new(r2, 0));
//! circuit.connect(Lead::new(r2, 1), Lead::new(batt, 0));
//!
//! circuit.update(5e-6)?;
//! let mid = circuit.element(r2).unwrap().lead_voltage(0); // 5 V
//! ```

mod analyze;
pub mod circuit;
pub mod element;
pub mod error;
pub mod linear;
pub mod mna;
pub mod node;
pub mod scope;
mod simplify;
pub mod solver;
mod transient;
mod validate;

pub use circuit::{Circuit, Config};
pub use element::{CircuitElement, ElementKind};
pub use error::{Error, Result};
pub use node::{Lead, NodeId};
pub use scope::ScopeFrame;
pub use solver::Solver;
