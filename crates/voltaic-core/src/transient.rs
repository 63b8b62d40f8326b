//! Time stepping and Newton iteration.

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::linear::{lu_factor, lu_solve};

/// Round to 12 decimals so the clock stays an exact multiple of the step.
fn round_time(t: f64) -> f64 {
    (t * 1e12).round() / 1e12
}

impl Circuit {
    /// Advance the simulation by one tick of [`time_step`](Circuit::time_step)
    /// seconds, re-analyzing first when the circuit is dirty.
    ///
    /// `_delta_time` is the caller's wall-clock budget and does not affect
    /// the step size; exactly one tick runs per call. On a fatal condition
    /// the error is recorded and returned, and subsequent calls return it
    /// unchanged until an edit retriggers analysis.
    pub fn update(&mut self, _delta_time: f64) -> Result<()> {
        if self.elements.is_empty() {
            return Ok(());
        }
        if self.analyze_needed {
            self.analyze_needed = false;
            self.analyze()?;
        }
        if let Some(error) = self.solver.error.clone() {
            return Err(error);
        }
        if self.solver.mna.is_none() {
            return Ok(());
        }
        self.run_tick()
    }

    fn run_tick(&mut self) -> Result<()> {
        for e in 0..self.elements.len() {
            self.elements[e].begin_step(&mut self.solver);
        }

        let nonlinear = self.solver.nonlinear;
        let budget = self.max_sub_iterations;
        let mut completed = false;
        let mut subiter = 0;

        while subiter < budget {
            self.solver.converged = true;
            self.solver.sub_iter = subiter;
            if let Some(mna) = self.solver.mna.as_mut() {
                mna.refresh(nonlinear);
            }

            for e in 0..self.elements.len() {
                self.elements[e].step(&mut self.solver);
            }

            let non_finite = self
                .solver
                .mna
                .as_ref()
                .is_some_and(|mna| mna.has_non_finite());
            if non_finite {
                self.solver.stop(Error::NonFiniteMatrix, None);
                return Err(Error::NonFiniteMatrix);
            }

            if nonlinear {
                // A full pass with nothing objecting means the previous
                // solution stands.
                if self.solver.converged && subiter > 0 {
                    completed = true;
                    break;
                }
                let factored = match self.solver.mna.as_mut() {
                    Some(mna) => lu_factor(&mut mna.matrix, &mut mna.permute),
                    None => false,
                };
                if !factored {
                    self.solver.stop(Error::SingularMatrix, None);
                    return Err(Error::SingularMatrix);
                }
            }

            if let Some(mna) = self.solver.mna.as_mut() {
                lu_solve(&mna.matrix, &mna.permute, &mut mna.right_side);
            }

            self.distribute();

            if !nonlinear {
                completed = true;
                break;
            }
            subiter += 1;
        }

        if !completed {
            self.solver.stop(Error::ConvergenceFailed, None);
            return Err(Error::ConvergenceFailed);
        }
        if subiter > 5 {
            log::debug!("converged after {subiter} sub-iterations");
        }

        self.solver.time = round_time(self.solver.time + self.solver.time_step);
        self.capture_frames();
        Ok(())
    }

    /// Push the solved values back out: node rows broadcast their voltage
    /// to every bound lead, voltage-source rows carry the source current.
    /// Columns folded by the simplifier read their stored constant.
    fn distribute(&mut self) {
        let Some(mna) = self.solver.mna.as_ref() else {
            return;
        };
        let num_nodes = self.solver.nodes.len();
        let mut nan_seen = false;

        for j in 0..mna.full_size {
            let info = &mna.row_info[j];
            let res = match info.map_col {
                Some(col) => mna.right_side[col],
                None => info.value,
            };
            if res.is_nan() {
                nan_seen = true;
                break;
            }
            if j < num_nodes - 1 {
                for link in &self.solver.nodes[j + 1].links {
                    self.elements[link.element].set_lead_voltage(link.lead, res);
                }
            } else {
                let source = j - (num_nodes - 1);
                let owner = self.solver.voltage_sources[source];
                self.elements[owner].set_current(source, res);
            }
        }

        if nan_seen {
            self.solver.converged = false;
        }
    }

    fn capture_frames(&mut self) {
        let time = self.solver.time;
        for (element, frames) in self.watches.iter_mut() {
            if let Some(elm) = self.elements.get(*element) {
                frames.push(elm.scope_frame(time));
            }
        }
    }
}
