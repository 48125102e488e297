//! Modified Nodal Analysis (MNA) matrix structures.
//!
//! Unknowns are ordered node voltages first (net 1 at index 0), then one
//! branch current per voltage-defined element. Ground never appears.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use num_traits::{One, Zero};

/// Real MNA system: Ax = b.
#[derive(Debug, Clone)]
pub struct MnaSystem {
    /// The coefficient matrix (G matrix extended with B, C, D blocks).
    pub matrix: DMatrix<f64>,
    /// The right-hand side vector.
    pub rhs: DVector<f64>,
    /// Number of nodes (excluding ground).
    pub num_nodes: usize,
    /// Number of branch current unknowns.
    pub num_branches: usize,
}

impl MnaSystem {
    /// Create a zeroed system for `num_nodes` non-ground nets and
    /// `num_branches` branch currents.
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::zeros(size, size),
            rhs: DVector::zeros(size),
            num_nodes,
            num_branches,
        }
    }

    /// Get the total size of the system (nodes + branch currents).
    pub fn size(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    /// Clear the matrix and RHS to zeros.
    pub fn clear(&mut self) {
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
    }

    /// Stamp a conductance between two nodes.
    ///
    /// For a conductance G between nodes i and j:
    /// - A[i,i] += G
    /// - A[j,j] += G
    /// - A[i,j] -= G
    /// - A[j,i] -= G
    ///
    /// Node indices are 0-based (ground is `None`).
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += g;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += g;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= g;
            self.matrix[(j, i)] -= g;
        }
    }

    /// Stamp a current source driving `current` from node i to node j
    /// through the source (it leaves node i and enters node j).
    pub fn stamp_current_source(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        current: f64,
    ) {
        if let Some(i) = node_i {
            self.rhs[i] -= current;
        }
        if let Some(j) = node_j {
            self.rhs[j] += current;
        }
    }

    /// Stamp a voltage constraint V(pos) - V(neg) = voltage on branch
    /// `branch_idx` (0-based, offset from `num_nodes`).
    pub fn stamp_voltage_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch_idx: usize,
        voltage: f64,
    ) {
        let row = self.num_nodes + branch_idx;

        if let Some(i) = node_pos {
            self.matrix[(i, row)] += 1.0;
            self.matrix[(row, i)] += 1.0;
        }
        if let Some(j) = node_neg {
            self.matrix[(j, row)] -= 1.0;
            self.matrix[(row, j)] -= 1.0;
        }

        self.rhs[row] = voltage;
    }

    /// Row index of a branch current unknown.
    pub fn branch_row(&self, branch_idx: usize) -> usize {
        self.num_nodes + branch_idx
    }

    /// Get a reference to the coefficient matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Get a mutable reference to the coefficient matrix.
    pub fn matrix_mut(&mut self) -> &mut DMatrix<f64> {
        &mut self.matrix
    }

    /// Get a reference to the RHS vector.
    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Get a mutable reference to the RHS vector.
    pub fn rhs_mut(&mut self) -> &mut DVector<f64> {
        &mut self.rhs
    }
}

/// Complex MNA system for AC analysis.
///
/// Same layout as [`MnaSystem`], with complex admittances and phasors.
#[derive(Debug, Clone)]
pub struct ComplexMna {
    pub matrix: DMatrix<Complex<f64>>,
    pub rhs: DVector<Complex<f64>>,
    pub num_nodes: usize,
    pub num_branches: usize,
}

impl ComplexMna {
    pub fn new(num_nodes: usize, num_branches: usize) -> Self {
        let size = num_nodes + num_branches;
        Self {
            matrix: DMatrix::from_element(size, size, Complex::zero()),
            rhs: DVector::from_element(size, Complex::zero()),
            num_nodes,
            num_branches,
        }
    }

    pub fn size(&self) -> usize {
        self.num_nodes + self.num_branches
    }

    /// Stamp a complex admittance between two nodes.
    pub fn stamp_admittance(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        y: Complex<f64>,
    ) {
        if let Some(i) = node_i {
            self.matrix[(i, i)] += y;
        }
        if let Some(j) = node_j {
            self.matrix[(j, j)] += y;
        }
        if let (Some(i), Some(j)) = (node_i, node_j) {
            self.matrix[(i, j)] -= y;
            self.matrix[(j, i)] -= y;
        }
    }

    /// Stamp a real conductance between two nodes.
    pub fn stamp_conductance(&mut self, node_i: Option<usize>, node_j: Option<usize>, g: f64) {
        self.stamp_admittance(node_i, node_j, Complex::new(g, 0.0));
    }

    /// Stamp a phasor current source, flowing from node i to node j through
    /// the source.
    pub fn stamp_current_source(
        &mut self,
        node_i: Option<usize>,
        node_j: Option<usize>,
        current: Complex<f64>,
    ) {
        if let Some(i) = node_i {
            self.rhs[i] -= current;
        }
        if let Some(j) = node_j {
            self.rhs[j] += current;
        }
    }

    /// Stamp a phasor voltage constraint V(pos) - V(neg) = voltage.
    pub fn stamp_voltage_source(
        &mut self,
        node_pos: Option<usize>,
        node_neg: Option<usize>,
        branch_idx: usize,
        voltage: Complex<f64>,
    ) {
        let row = self.num_nodes + branch_idx;
        let one = Complex::one();

        if let Some(p) = node_pos {
            self.matrix[(p, row)] += one;
            self.matrix[(row, p)] += one;
        }
        if let Some(n) = node_neg {
            self.matrix[(n, row)] -= one;
            self.matrix[(row, n)] -= one;
        }
        self.rhs[row] = voltage;
    }

    pub fn matrix(&self) -> &DMatrix<Complex<f64>> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<Complex<f64>> {
        &self.rhs
    }
}
