//! MNA matrix storage and per-row bookkeeping.
//!
//! The system is assembled at full size (nodes − 1 + voltage sources), then
//! compacted by the row simplifier. Two copies are kept: the pristine
//! `orig_*` pair holding the linear contributions, and the working
//! `circuit_*` pair that Newton iteration re-stamps and the LU factors in
//! place.

use nalgebra::{DMatrix, DVector};

/// How a row of the full system participates in the compacted matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowType {
    /// Lives in the compacted matrix.
    #[default]
    Normal,
    /// The variable has a known constant value, folded into right sides.
    Const,
    /// The variable equals another row's variable.
    Equal,
}

/// Bookkeeping for one row/column of the full (pre-simplification) system.
#[derive(Debug, Clone, Default)]
pub struct RowInfo {
    pub row_type: RowType,
    /// For `Equal`: index of the row this one equals.
    pub node_eq: usize,
    /// For `Const`: the folded value.
    pub value: f64,
    /// Row was eliminated and does not appear in the compacted matrix.
    pub drop_row: bool,
    /// Left side varies each Newton iteration (nonlinear row).
    pub ls_changes: bool,
    /// Right side varies each iteration (time-varying source row).
    pub rs_changes: bool,
    /// Compacted row this full row was summed into.
    pub map_row: usize,
    /// Compacted column for this variable; `None` once folded as constant.
    pub map_col: Option<usize>,
}

/// The assembled MNA system.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    /// Working matrix, mutated by nonlinear stamps and by LU.
    pub(crate) matrix: DMatrix<f64>,
    /// Working right side, rebuilt every sub-iteration.
    pub(crate) right_side: DVector<f64>,
    /// Pristine matrix holding the linear stamps.
    pub(crate) orig_matrix: DMatrix<f64>,
    /// Pristine right side.
    pub(crate) orig_right_side: DVector<f64>,
    /// Per full-system row bookkeeping; length stays `full_size`.
    pub(crate) row_info: Vec<RowInfo>,
    /// LU row interchanges.
    pub(crate) permute: Vec<usize>,
    /// Current working size (compacted after simplification).
    pub(crate) size: usize,
    /// Size before simplification, used when distributing results.
    pub(crate) full_size: usize,
    /// Set after simplification: stamp coordinates must be remapped.
    pub(crate) needs_map: bool,
}

impl MnaSystem {
    /// Allocate a zeroed system of the given full size.
    pub fn new(size: usize) -> Self {
        Self {
            matrix: DMatrix::zeros(size, size),
            right_side: DVector::zeros(size),
            orig_matrix: DMatrix::zeros(size, size),
            orig_right_side: DVector::zeros(size),
            row_info: vec![RowInfo::default(); size],
            permute: vec![0; size],
            size,
            full_size: size,
            needs_map: false,
        }
    }

    /// Current working size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Size before simplification.
    pub fn full_size(&self) -> usize {
        self.full_size
    }

    /// The working matrix. Factored in place once analysis finishes on a
    /// linear circuit.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// The working right side.
    pub fn right_side(&self) -> &DVector<f64> {
        &self.right_side
    }

    /// Snapshot the working pair into the pristine pair. Called once after
    /// simplification, when only linear contributions have been stamped.
    pub(crate) fn store_orig(&mut self) {
        self.orig_matrix = self.matrix.clone();
        self.orig_right_side = self.right_side.clone();
    }

    /// Restore the working right side (and, for nonlinear systems, the
    /// working matrix) from the pristine copies.
    pub(crate) fn refresh(&mut self, nonlinear: bool) {
        self.right_side.copy_from(&self.orig_right_side);
        if nonlinear {
            self.matrix.copy_from(&self.orig_matrix);
        }
    }

    /// True when any working matrix entry is NaN or infinite.
    pub(crate) fn has_non_finite(&self) -> bool {
        self.matrix.iter().any(|x| !x.is_finite())
    }
}
