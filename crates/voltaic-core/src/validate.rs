//! Pre-simulation topology validation.
//!
//! Runs on the post-resolver graph, before simplification. Each check is a
//! depth-first search over element leads restricted to a class of
//! traversable elements: inductors and current sources need a return path,
//! voltage sources must not sit in a zero-resistance loop, capacitors are
//! reset when shorted and rejected when in a source loop with no resistance.

use crate::element::{CircuitElement, ElementKind};
use crate::error::Error;

/// Which elements a path search may pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PathType {
    /// Anything except current sources; used for inductor and
    /// current-source return paths.
    Induct,
    /// Wires and voltage sources only.
    Voltage,
    /// Wires only.
    Short,
    /// Wires, capacitors and voltage sources.
    CapV,
}

pub(crate) struct PathContext<'a> {
    path_type: PathType,
    elements: &'a [Box<dyn CircuitElement>],
    /// The element under test; never traversed.
    first: usize,
    dest: usize,
}

impl<'a> PathContext<'a> {
    pub(crate) fn new(
        path_type: PathType,
        elements: &'a [Box<dyn CircuitElement>],
        first: usize,
        dest: usize,
    ) -> Self {
        Self {
            path_type,
            elements,
            first,
            dest,
        }
    }

    fn admits(&self, elm: &dyn CircuitElement) -> bool {
        match self.path_type {
            PathType::Induct => elm.kind() != ElementKind::CurrentSource,
            PathType::Voltage => {
                elm.is_wire()
                    || matches!(elm.kind(), ElementKind::VoltageSource | ElementKind::Rail)
            }
            PathType::Short => elm.is_wire(),
            PathType::CapV => {
                elm.is_wire()
                    || matches!(
                        elm.kind(),
                        ElementKind::VoltageSource | ElementKind::Rail | ElementKind::Capacitor
                    )
            }
        }
    }
}

/// DFS from `n1` toward `ctx.dest`. A negative `depth` is unbounded.
/// `used` must hold one flag per node; flags are cleared while unwinding a
/// successful path and persist across dead ends.
pub(crate) fn find_path(ctx: &PathContext<'_>, used: &mut [bool], n1: usize, depth: i64) -> bool {
    if n1 == ctx.dest {
        return true;
    }
    if depth == 0 {
        return false;
    }
    let depth = depth - 1;
    if used[n1] {
        return false;
    }
    used[n1] = true;

    for idx in 0..ctx.elements.len() {
        if idx == ctx.first {
            continue;
        }
        let elm = &ctx.elements[idx];
        if !ctx.admits(elm.as_ref()) {
            continue;
        }

        if n1 == 0 {
            // On the ground bus the search may hop through any grounded
            // lead without an explicit edge.
            for z in 0..elm.lead_count() {
                if elm.lead_is_ground(z) && find_path(ctx, used, elm.lead_node(z), depth) {
                    used[n1] = false;
                    return true;
                }
            }
        }

        let Some(j) = (0..elm.lead_count()).find(|&j| elm.lead_node(j) == n1) else {
            continue;
        };

        if elm.lead_is_ground(j) && find_path(ctx, used, 0, depth) {
            used[n1] = false;
            return true;
        }

        if ctx.path_type == PathType::Induct && elm.kind() == ElementKind::Inductor {
            let mut c = elm.current();
            if j == 0 {
                c = -c;
            }
            // Only follow an inductor that carries the test element's
            // current; this separates parallel inductor branches.
            if (c - ctx.elements[ctx.first].current()).abs() > 1e-10 {
                continue;
            }
        }

        for k in 0..elm.lead_count() {
            if j == k {
                continue;
            }
            if elm.leads_are_connected(j, k) && find_path(ctx, used, elm.lead_node(k), depth) {
                used[n1] = false;
                return true;
            }
        }
    }

    false
}

/// Run every per-element check. Recoverable conditions reset the element;
/// fatal ones return the error and the offending element's index.
pub(crate) fn validate(
    elements: &mut [Box<dyn CircuitElement>],
    node_count: usize,
) -> std::result::Result<(), (Error, usize)> {
    for i in 0..elements.len() {
        let kind = elements[i].kind();
        let two_leads = elements[i].lead_count() == 2;

        if kind == ElementKind::Inductor {
            let start = elements[i].lead_node(0);
            let dest = elements[i].lead_node(1);
            let found = {
                let ctx = PathContext::new(PathType::Induct, elements, i, dest);
                let mut used = vec![false; node_count];
                // Bounded first to keep large meshes cheap.
                if find_path(&ctx, &mut used, start, 5) {
                    true
                } else {
                    used.fill(false);
                    find_path(&ctx, &mut used, start, -1)
                }
            };
            if !found {
                log::debug!("inductor {i} has no current path, resetting");
                elements[i].reset();
            }
        }

        if kind == ElementKind::CurrentSource {
            let start = elements[i].lead_node(0);
            let dest = elements[i].lead_node(1);
            let ctx = PathContext::new(PathType::Induct, elements, i, dest);
            let mut used = vec![false; node_count];
            if !find_path(&ctx, &mut used, start, -1) {
                return Err((Error::NoCurrentSourcePath, i));
            }
        }

        if (kind == ElementKind::VoltageSource && two_leads) || elements[i].is_wire() {
            let start = elements[i].lead_node(0);
            let dest = elements[i].lead_node(1);
            let ctx = PathContext::new(PathType::Voltage, elements, i, dest);
            let mut used = vec![false; node_count];
            if find_path(&ctx, &mut used, start, -1) {
                return Err((Error::VoltageSourceLoop, i));
            }
        }

        if kind == ElementKind::Capacitor {
            let start = elements[i].lead_node(0);
            let dest = elements[i].lead_node(1);
            let shorted = {
                let ctx = PathContext::new(PathType::Short, elements, i, dest);
                let mut used = vec![false; node_count];
                find_path(&ctx, &mut used, start, -1)
            };
            if shorted {
                log::debug!("capacitor {i} shorted, resetting");
                elements[i].reset();
            } else {
                let ctx = PathContext::new(PathType::CapV, elements, i, dest);
                let mut used = vec![false; node_count];
                if find_path(&ctx, &mut used, start, -1) {
                    return Err((Error::CapacitorLoop, i));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::solver::Solver;

    /// Configurable stand-in for library elements. `reset_seen` is shared
    /// so tests can observe resets after handing the element over.
    #[derive(Debug)]
    struct TestElm {
        kind: ElementKind,
        wire: bool,
        nodes: Vec<usize>,
        ground_leads: Vec<bool>,
        current: f64,
        reset_seen: Rc<Cell<bool>>,
    }

    impl TestElm {
        fn new(kind: ElementKind, nodes: &[usize]) -> Self {
            Self {
                kind,
                wire: false,
                nodes: nodes.to_vec(),
                ground_leads: vec![false; nodes.len()],
                current: 0.0,
                reset_seen: Rc::new(Cell::new(false)),
            }
        }

        fn wire(nodes: &[usize]) -> Self {
            let mut elm = Self::new(ElementKind::Other, nodes);
            elm.wire = true;
            elm
        }

        fn grounded(mut self, lead: usize) -> Self {
            self.ground_leads[lead] = true;
            self
        }

        fn reset_probe(&self) -> Rc<Cell<bool>> {
            Rc::clone(&self.reset_seen)
        }
    }

    impl CircuitElement for TestElm {
        fn lead_count(&self) -> usize {
            self.nodes.len()
        }
        fn kind(&self) -> ElementKind {
            self.kind
        }
        fn is_wire(&self) -> bool {
            self.wire
        }
        fn lead_is_ground(&self, lead: usize) -> bool {
            self.ground_leads[lead]
        }
        fn set_lead_node(&mut self, lead: usize, node: usize) {
            self.nodes[lead] = node;
        }
        fn lead_node(&self, lead: usize) -> usize {
            self.nodes[lead]
        }
        fn set_lead_voltage(&mut self, _lead: usize, _voltage: f64) {}
        fn lead_voltage(&self, _lead: usize) -> f64 {
            0.0
        }
        fn current(&self) -> f64 {
            self.current
        }
        fn stamp(&mut self, _solver: &mut Solver) {}
        fn reset(&mut self) {
            self.reset_seen.set(true);
        }
    }

    fn boxed(elms: Vec<TestElm>) -> Vec<Box<dyn CircuitElement>> {
        elms.into_iter()
            .map(|e| Box::new(e) as Box<dyn CircuitElement>)
            .collect()
    }

    #[test]
    fn test_parallel_batteries_are_fatal() {
        let mut elms = boxed(vec![
            TestElm::new(ElementKind::VoltageSource, &[1, 2]),
            TestElm::new(ElementKind::VoltageSource, &[1, 2]),
        ]);
        let result = validate(&mut elms, 3);
        assert_eq!(result, Err((Error::VoltageSourceLoop, 0)));
    }

    #[test]
    fn test_battery_with_resistor_is_fine() {
        let mut elms = boxed(vec![
            TestElm::new(ElementKind::VoltageSource, &[1, 2]),
            TestElm::new(ElementKind::Other, &[1, 2]),
        ]);
        assert!(validate(&mut elms, 3).is_ok());
    }

    #[test]
    fn test_wire_between_rails_loops_through_ground_bus() {
        // Two rails with implicit ground returns, shorted by a wire. The
        // loop closes across the ground bus, which the search may enter
        // through one rail's grounded lead and leave through the other's.
        let mut elms = boxed(vec![
            TestElm::wire(&[1, 2]),
            TestElm::new(ElementKind::Rail, &[1]).grounded(0),
            TestElm::new(ElementKind::Rail, &[2]).grounded(0),
        ]);
        let result = validate(&mut elms, 3);
        assert_eq!(result, Err((Error::VoltageSourceLoop, 0)));
    }

    #[test]
    fn test_shorted_capacitor_resets() {
        let elms = vec![
            TestElm::new(ElementKind::Capacitor, &[1, 2]),
            TestElm::wire(&[1, 2]),
        ];
        let probe = elms[0].reset_probe();
        let mut elms = boxed(elms);
        assert!(validate(&mut elms, 3).is_ok());
        assert!(probe.get());
    }

    #[test]
    fn test_capacitor_battery_loop_is_fatal() {
        let mut elms = boxed(vec![
            TestElm::new(ElementKind::Capacitor, &[1, 2]),
            TestElm::new(ElementKind::VoltageSource, &[1, 2]),
        ]);
        let result = validate(&mut elms, 3);
        assert_eq!(result, Err((Error::CapacitorLoop, 0)));
    }

    #[test]
    fn test_capacitor_battery_resistor_is_fine() {
        let elms = vec![
            TestElm::new(ElementKind::Capacitor, &[1, 2]),
            TestElm::new(ElementKind::VoltageSource, &[1, 3]),
            TestElm::new(ElementKind::Other, &[3, 2]),
        ];
        let probe = elms[0].reset_probe();
        let mut elms = boxed(elms);
        assert!(validate(&mut elms, 4).is_ok());
        assert!(!probe.get());
    }

    #[test]
    fn test_open_current_source_is_fatal() {
        let mut elms = boxed(vec![TestElm::new(ElementKind::CurrentSource, &[1, 2])]);
        let result = validate(&mut elms, 3);
        assert_eq!(result, Err((Error::NoCurrentSourcePath, 0)));
    }

    #[test]
    fn test_current_source_with_return_path() {
        let mut elms = boxed(vec![
            TestElm::new(ElementKind::CurrentSource, &[1, 2]),
            TestElm::new(ElementKind::Other, &[2, 1]),
        ]);
        assert!(validate(&mut elms, 3).is_ok());
    }

    #[test]
    fn test_floating_inductor_resets() {
        let elms = vec![TestElm::new(ElementKind::Inductor, &[1, 2])];
        let probe = elms[0].reset_probe();
        let mut elms = boxed(elms);
        assert!(validate(&mut elms, 3).is_ok());
        assert!(probe.get());
    }

    #[test]
    fn test_inductor_with_loop_keeps_state() {
        let elms = vec![
            TestElm::new(ElementKind::Inductor, &[1, 2]),
            TestElm::new(ElementKind::Other, &[2, 1]),
        ];
        let probe = elms[0].reset_probe();
        let mut elms = boxed(elms);
        assert!(validate(&mut elms, 3).is_ok());
        assert!(!probe.get());
    }

    #[test]
    fn test_parallel_inductor_current_mismatch_blocks_path() {
        // The only return path for inductor 0 runs through inductor 1,
        // whose remembered current differs; the path is rejected.
        let elms = vec![TestElm::new(ElementKind::Inductor, &[1, 2]), {
            let mut other = TestElm::new(ElementKind::Inductor, &[1, 2]);
            other.current = 1.0;
            other
        }];
        let probe = elms[0].reset_probe();
        let mut elms = boxed(elms);
        assert!(validate(&mut elms, 3).is_ok());
        assert!(probe.get());
    }
}
