//! Matrix row simplification.
//!
//! Ideal wires, sources tied to rails and equal-node couplings produce rows
//! that are trivially eliminable: a row with a single unknown pins that
//! unknown to a constant, and a row with two opposite entries and a zero
//! right side makes its two unknowns equal. Removing them before
//! factorization shrinks the system, which LU repays cubically.
//!
//! Rows whose left or right side changes between Newton sub-iterations are
//! never simplified; their values are not final at analysis time.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::mna::{MnaSystem, RowType};

/// What a single scan of one row found.
enum RowShape {
    /// More than two live entries, or a shape we do not reduce.
    Keep,
    /// One live entry: column `qp` with coefficient `qv`, plus `rsadd`
    /// accumulated from already-folded constant columns.
    Single { qp: usize, qv: f64, rsadd: f64 },
    /// Two opposite entries at `qp` and `qm`.
    Pair { qp: usize, qm: usize, rsadd: f64 },
    /// No live entries at all.
    Empty,
}

impl MnaSystem {
    fn scan_row(&self, i: usize) -> RowShape {
        let mut qp = None;
        let mut qm = None;
        let mut qv = 0.0;
        let mut rsadd = 0.0;

        for j in 0..self.full_size {
            let q = self.matrix[(i, j)];
            if self.row_info[j].row_type == RowType::Const {
                // Already-known value, keep a running total.
                rsadd -= self.row_info[j].value * q;
                continue;
            }
            if q == 0.0 {
                continue;
            }
            if qp.is_none() {
                qp = Some(j);
                qv = q;
                continue;
            }
            if qm.is_none() && q == -qv {
                qm = Some(j);
                continue;
            }
            return RowShape::Keep;
        }

        match (qp, qm) {
            (None, _) => RowShape::Empty,
            (Some(qp), None) => RowShape::Single { qp, qv, rsadd },
            (Some(qp), Some(qm)) => RowShape::Pair { qp, qm, rsadd },
        }
    }

    /// Tag constant and equal rows, resolve equality chains and compact the
    /// matrix. Afterwards `size` is the compacted size, `needs_map` is set
    /// and the pristine copies match the working pair.
    pub(crate) fn simplify(&mut self) -> Result<()> {
        let size = self.full_size;

        let mut i = 0;
        while i < size {
            let info = &self.row_info[i];
            if info.ls_changes || info.rs_changes || info.drop_row {
                i += 1;
                continue;
            }

            match self.scan_row(i) {
                RowShape::Keep => {}
                RowShape::Empty => return Err(Error::MatrixError),
                RowShape::Single { mut qp, qv, rsadd } => {
                    // follow the chain
                    let mut hops = 0;
                    while self.row_info[qp].row_type == RowType::Equal && hops < 100 {
                        qp = self.row_info[qp].node_eq;
                        hops += 1;
                    }
                    if self.row_info[qp].row_type == RowType::Equal {
                        // break equality cycles
                        self.row_info[qp].row_type = RowType::Normal;
                        i += 1;
                        continue;
                    }
                    if self.row_info[qp].row_type != RowType::Normal {
                        i += 1;
                        continue;
                    }
                    self.row_info[qp].row_type = RowType::Const;
                    self.row_info[qp].value = (self.right_side[i] + rsadd) / qv;
                    self.row_info[i].drop_row = true;
                    // A new constant can unlock earlier rows.
                    i = 0;
                    continue;
                }
                RowShape::Pair { mut qp, mut qm, rsadd } => {
                    if self.right_side[i] + rsadd == 0.0 {
                        if self.row_info[qp].row_type != RowType::Normal {
                            std::mem::swap(&mut qp, &mut qm);
                            if self.row_info[qp].row_type != RowType::Normal {
                                i += 1;
                                continue;
                            }
                        }
                        self.row_info[qp].row_type = RowType::Equal;
                        self.row_info[qp].node_eq = qm;
                        self.row_info[i].drop_row = true;
                    }
                }
            }
            i += 1;
        }

        self.assign_maps();
        self.compact();
        Ok(())
    }

    /// Assign compacted columns to surviving rows and resolve equality
    /// chains, inheriting constants along the way.
    fn assign_maps(&mut self) {
        let size = self.full_size;
        let mut next_col = 0;

        for i in 0..size {
            match self.row_info[i].row_type {
                RowType::Normal => {
                    self.row_info[i].map_col = Some(next_col);
                    next_col += 1;
                }
                RowType::Equal => {
                    // Shorten the chain; 100 steps caps pathological loops.
                    for _ in 0..100 {
                        let target = self.row_info[i].node_eq;
                        if self.row_info[target].row_type != RowType::Equal {
                            break;
                        }
                        if self.row_info[target].node_eq == i {
                            break;
                        }
                        self.row_info[i].node_eq = self.row_info[target].node_eq;
                    }
                }
                RowType::Const => {
                    self.row_info[i].map_col = None;
                }
            }
        }

        for i in 0..size {
            if self.row_info[i].row_type == RowType::Equal {
                let target = self.row_info[i].node_eq;
                if self.row_info[target].row_type == RowType::Const {
                    // Equal to a constant is a constant.
                    self.row_info[i].row_type = RowType::Const;
                    self.row_info[i].value = self.row_info[target].value;
                    self.row_info[i].map_col = None;
                } else {
                    self.row_info[i].map_col = self.row_info[target].map_col;
                }
            }
        }
    }

    /// Build the compacted matrix: live rows are renumbered densely,
    /// surviving columns are summed by map, constant columns fold into the
    /// right side.
    fn compact(&mut self) {
        let size = self.full_size;
        let new_size = self
            .row_info
            .iter()
            .filter(|info| info.row_type == RowType::Normal)
            .count();

        let mut new_matrix = DMatrix::zeros(new_size, new_size);
        let mut new_rs = DVector::zeros(new_size);

        let mut out = 0;
        for i in 0..size {
            if self.row_info[i].drop_row {
                continue;
            }
            new_rs[out] = self.right_side[i];
            self.row_info[i].map_row = out;
            for j in 0..size {
                let info = &self.row_info[j];
                if info.row_type == RowType::Const {
                    new_rs[out] -= info.value * self.matrix[(i, j)];
                } else if let Some(col) = info.map_col {
                    new_matrix[(out, col)] += self.matrix[(i, j)];
                }
            }
            out += 1;
        }

        self.matrix = new_matrix;
        self.right_side = new_rs;
        self.size = new_size;
        self.permute = vec![0; new_size];
        self.store_orig();
        self.needs_map = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_rows_collapse_completely() {
        // 2*x0 = 10; x0 + x1 = 3. Both rows reduce to constants.
        let mut mna = MnaSystem::new(2);
        mna.matrix[(0, 0)] = 2.0;
        mna.matrix[(1, 0)] = 1.0;
        mna.matrix[(1, 1)] = 1.0;
        mna.right_side[0] = 10.0;
        mna.right_side[1] = 3.0;

        mna.simplify().unwrap();

        assert_eq!(mna.size(), 0);
        assert_eq!(mna.row_info[0].row_type, RowType::Const);
        assert_eq!(mna.row_info[0].value, 5.0);
        assert_eq!(mna.row_info[1].row_type, RowType::Const);
        assert_eq!(mna.row_info[1].value, -2.0);
        assert!(mna.needs_map);
    }

    #[test]
    fn test_equal_rows_merge_columns() {
        // x0 - x1 = 0; x0 + x1 = 4. Columns 0 and 1 merge into one unknown.
        let mut mna = MnaSystem::new(2);
        mna.matrix[(0, 0)] = 1.0;
        mna.matrix[(0, 1)] = -1.0;
        mna.matrix[(1, 0)] = 1.0;
        mna.matrix[(1, 1)] = 1.0;
        mna.right_side[1] = 4.0;

        mna.simplify().unwrap();

        assert_eq!(mna.size(), 1);
        assert_eq!(mna.row_info[0].row_type, RowType::Equal);
        assert_eq!(mna.row_info[0].node_eq, 1);
        assert_eq!(mna.row_info[0].map_col, mna.row_info[1].map_col);
        assert!(mna.row_info[0].drop_row);
        // Merged coefficient and untouched right side.
        assert_eq!(mna.matrix[(0, 0)], 2.0);
        assert_eq!(mna.right_side[0], 4.0);
    }

    #[test]
    fn test_equal_chain_inherits_constant() {
        // x0 = x1; 2*x1 = 6; x0 + x2 = 10.
        let mut mna = MnaSystem::new(3);
        mna.matrix[(0, 0)] = 1.0;
        mna.matrix[(0, 1)] = -1.0;
        mna.matrix[(1, 1)] = 2.0;
        mna.right_side[1] = 6.0;
        mna.matrix[(2, 0)] = 1.0;
        mna.matrix[(2, 2)] = 1.0;
        mna.right_side[2] = 10.0;

        mna.simplify().unwrap();

        // x0 picks up the constant through the equality.
        assert_eq!(mna.row_info[0].row_type, RowType::Const);
        assert_eq!(mna.row_info[0].value, 3.0);
        assert_eq!(mna.row_info[1].row_type, RowType::Const);
        // Row 2 survives with the constant folded into its right side.
        assert_eq!(mna.size(), 1);
        assert_eq!(mna.matrix[(0, 0)], 1.0);
        assert_eq!(mna.right_side[0], 7.0);
    }

    #[test]
    fn test_changing_rows_are_left_alone() {
        let mut mna = MnaSystem::new(2);
        mna.matrix[(0, 0)] = 1.0;
        mna.right_side[0] = 2.0;
        mna.matrix[(1, 0)] = 1.0;
        mna.matrix[(1, 1)] = 1.0;
        mna.row_info[0].rs_changes = true;

        mna.simplify().unwrap();

        // Row 0 would be a constant row, but its right side varies.
        assert_eq!(mna.row_info[0].row_type, RowType::Normal);
        assert_eq!(mna.size(), 2);
    }

    #[test]
    fn test_empty_row_is_an_error() {
        let mut mna = MnaSystem::new(2);
        mna.matrix[(1, 1)] = 1.0;
        assert_eq!(mna.simplify(), Err(Error::MatrixError));
    }
}
