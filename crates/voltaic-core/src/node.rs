//! Node identity and the resolved node list.

use std::fmt;

/// Opaque 64-bit identifier for an electrical node in the lead mesh.
///
/// Ids are unique and only compared for equality; any 64-bit unique source
/// (a counter, a snowflake generator) produces valid ids. The engine
/// allocates them when leads are connected or when analysis discovers an
/// unbound lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) i64);

impl NodeId {
    /// Sentinel for a lead that has not been connected to anything yet.
    pub const UNASSIGNED: NodeId = NodeId(-1);

    /// Create a NodeId from a raw value.
    pub fn new(id: i64) -> Self {
        NodeId(id)
    }

    /// Get the raw id value.
    pub fn as_i64(self) -> i64 {
        self.0
    }

    /// Check whether this id is the unassigned sentinel.
    pub fn is_unassigned(self) -> bool {
        self.0 == -1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unassigned() {
            write!(f, "unassigned")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A terminal of an element: the element's arena index plus the terminal
/// ordinal. Leads are what users connect; the resolver turns groups of
/// connected leads into node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lead {
    /// Index of the element in insertion order.
    pub element: usize,
    /// Terminal ordinal on that element.
    pub lead: usize,
}

impl Lead {
    /// Create a lead reference.
    pub fn new(element: usize, lead: usize) -> Self {
        Self { element, lead }
    }
}

/// Back-reference from a resolved node to one element terminal bound to it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NodeLink {
    pub element: usize,
    pub lead: usize,
}

/// An entry in the resolved node list. Position in the list is the node
/// index used by the stamp kernel; position 0 is ground.
#[derive(Debug, Clone)]
pub(crate) struct CircuitNode {
    /// Mesh id this node was resolved from.
    pub id: NodeId,
    /// True when the node was injected by an element for an internal degree
    /// of freedom. Internal nodes are exempt from unconnected-node repair.
    pub internal: bool,
    /// Terminals bound to this node, used to distribute solved voltages.
    pub links: Vec<NodeLink>,
}

impl CircuitNode {
    pub fn new(id: NodeId, internal: bool) -> Self {
        Self {
            id,
            internal,
            links: Vec::new(),
        }
    }
}
