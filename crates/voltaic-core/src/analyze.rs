//! Circuit analysis: topology resolution, stamping, validation,
//! simplification and factorization.

use crate::circuit::Circuit;
use crate::element::ElementKind;
use crate::error::{Error, Result};
use crate::linear::lu_factor;
use crate::mna::MnaSystem;
use crate::node::{CircuitNode, NodeLink};
use crate::validate::validate;

impl Circuit {
    /// Rebuild the node list, matrices and factorization from the current
    /// topology. Called implicitly by [`update`](Circuit::update) when the
    /// circuit is dirty.
    pub fn analyze(&mut self) -> Result<()> {
        self.solver.error = None;
        self.solver.error_element = None;
        self.solver.mna = None;
        self.solver.nodes.clear();
        self.solver.voltage_sources.clear();
        self.solver.nonlinear = false;

        if self.elements.is_empty() {
            return Ok(());
        }

        self.resolve_topology();
        self.connect_unreached_nodes();

        if let Err((error, element)) = validate(&mut self.elements, self.solver.nodes.len()) {
            self.solver.stop(error.clone(), Some(element));
            return Err(error);
        }

        if let Some(mna) = self.solver.mna.as_mut() {
            if let Err(error) = mna.simplify() {
                self.solver.stop(error.clone(), None);
                return Err(error);
            }
        }

        // Linear circuits keep one factorization for the whole run.
        if !self.solver.nonlinear {
            let factored = match self.solver.mna.as_mut() {
                Some(mna) => lu_factor(&mut mna.matrix, &mut mna.permute),
                None => false,
            };
            if !factored {
                self.solver.stop(Error::SingularMatrix, None);
                return Err(Error::SingularMatrix);
            }
        }

        Ok(())
    }

    /// Build the ordered node list from the lead mesh, bind element leads,
    /// register voltage sources, allocate the system and stamp every
    /// element.
    fn resolve_topology(&mut self) {
        let mut got_ground = false;
        let mut got_rail = false;
        let mut volt = None;
        for (i, elm) in self.elements.iter().enumerate() {
            match elm.kind() {
                ElementKind::Ground => got_ground = true,
                ElementKind::Rail => got_rail = true,
                ElementKind::VoltageSource if volt.is_none() => volt = Some(i),
                _ => {}
            }
            if elm.nonlinear() {
                self.solver.nonlinear = true;
            }
        }

        // Drop internal ids from a previous analysis.
        for (i, elm) in self.elements.iter().enumerate() {
            self.mesh[i].truncate(elm.lead_count());
        }

        // Node 0. With an explicit ground or a rail the reference is its
        // own fresh node; failing that, a two-terminal voltage source
        // grounds its first terminal; failing that, any fresh id works.
        let ground_id = match volt {
            Some(v) if !got_ground && !got_rail => {
                if self.mesh[v][0].is_unassigned() {
                    let id = self.alloc_node_id();
                    self.mesh[v][0] = id;
                }
                self.mesh[v][0]
            }
            _ => self.alloc_node_id(),
        };
        self.solver.nodes.push(CircuitNode::new(ground_id, false));

        let mut vs_count = 0;
        for e in 0..self.elements.len() {
            let leads = self.elements[e].lead_count();
            for j in 0..leads {
                let mut id = self.mesh[e][j];
                if id.is_unassigned() {
                    // An untouched lead becomes its own node; the closure
                    // pass ties it to ground through a large resistance.
                    id = self.alloc_node_id();
                    self.mesh[e][j] = id;
                }
                let index = match self.solver.nodes.iter().position(|n| n.id == id) {
                    Some(index) => index,
                    None => {
                        self.solver.nodes.push(CircuitNode::new(id, false));
                        self.solver.nodes.len() - 1
                    }
                };
                if index == 0 {
                    self.elements[e].set_lead_voltage(j, 0.0);
                }
                self.elements[e].set_lead_node(j, index);
                self.solver.nodes[index].links.push(NodeLink { element: e, lead: j });
            }

            for j in 0..self.elements[e].internal_lead_count() {
                let id = self.alloc_node_id();
                self.mesh[e].push(id);
                self.solver.nodes.push(CircuitNode::new(id, true));
                let index = self.solver.nodes.len() - 1;
                self.elements[e].set_lead_node(leads + j, index);
                self.solver.nodes[index]
                    .links
                    .push(NodeLink { element: e, lead: leads + j });
            }

            vs_count += self.elements[e].voltage_source_count();
        }

        for e in 0..self.elements.len() {
            for ordinal in 0..self.elements[e].voltage_source_count() {
                let index = self.solver.voltage_sources.len();
                self.solver.voltage_sources.push(e);
                self.elements[e].set_voltage_source(ordinal, index);
            }
        }
        debug_assert_eq!(self.solver.voltage_sources.len(), vs_count);

        let size = self.solver.nodes.len() - 1 + vs_count;
        self.solver.mna = Some(MnaSystem::new(size));

        for e in 0..self.elements.len() {
            self.elements[e].stamp(&mut self.solver);
        }
    }

    /// Propagate reachability from ground through lead connectivity and
    /// ground ties; any node left outside the closure is tied to ground
    /// through 1e8 ohms so the matrix stays solvable. Internal nodes are
    /// the element's own business and are never patched.
    fn connect_unreached_nodes(&mut self) {
        let count = self.solver.nodes.len();
        let mut closure = vec![false; count];
        closure[0] = true;

        let mut changed = true;
        while changed {
            changed = false;
            for elm in &self.elements {
                let leads = elm.lead_count();
                for j in 0..leads {
                    let nj = elm.lead_node(j);
                    if !closure[nj] {
                        if elm.lead_is_ground(j) {
                            closure[nj] = true;
                            changed = true;
                        }
                        continue;
                    }
                    for k in 0..leads {
                        if j == k {
                            continue;
                        }
                        let nk = elm.lead_node(k);
                        if elm.leads_are_connected(j, k) && !closure[nk] {
                            closure[nk] = true;
                            changed = true;
                        }
                    }
                }
            }
            if changed {
                continue;
            }

            for i in 0..count {
                if !closure[i] && !self.solver.nodes[i].internal {
                    log::debug!("node {i} unconnected, tying to ground");
                    self.solver.stamp_resistor(0, i, 1e8);
                    closure[i] = true;
                    changed = true;
                    break;
                }
            }
        }
    }
}
