//! Element library for the Voltaic circuit simulator.
//!
//! Every element implements [`voltaic_core::CircuitElement`] and interacts
//! with the engine only through the stamp kernel:
//!
//! - Passive elements: [`Resistor`], [`Capacitor`], [`Inductor`]
//! - Sources: [`VoltageSource`], [`Rail`], [`CurrentSource`] with
//!   time-varying [`Waveform`]s
//! - Connectivity: [`Wire`], [`Ground`]
//! - Nonlinear: [`Diode`]
//! - Digital: [`LogicInput`], [`HalfAdder`]

pub mod digital;
pub mod diode;
pub mod passive;
pub mod sources;
pub mod waveforms;
pub mod wire;

pub use digital::{HalfAdder, LogicInput, LogicLevel, HIGH_THRESHOLD, HIGH_VOLTAGE};
pub use diode::{Diode, DiodeParams};
pub use passive::{Capacitor, Inductor, Resistor};
pub use sources::{CurrentSource, Rail, VoltageSource};
pub use waveforms::Waveform;
pub use wire::{Ground, Wire};
