//! Padded-grid index arithmetic and the 12-node stencil offset table.
//!
//! The engine keeps one flat `Vec<f32>` for the whole run; at each stride
//! the active sub-grid is addressed with a smaller row pitch (`mx`) into
//! the same backing storage (spec.md §3, §9 "Index arithmetic vs. ownership").
//! Nodes are never modeled as objects — only offsets into the buffer.

/// Ghost padding (rows/cols) on every edge, used to hold boundary values.
pub const PAD: i64 = 2;

/// Compass positions of the 12-node stencil, in the order spec.md §4.6 lists
/// them. North is the negative-row direction (row 0 is the grid's north
/// edge, per the output contract in spec.md §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compass {
    N2,
    NW,
    N1,
    NE,
    W2,
    W1,
    E1,
    E2,
    SW,
    S1,
    SE,
    S2,
}

impl Compass {
    pub const ALL: [Compass; 12] = [
        Compass::N2,
        Compass::NW,
        Compass::N1,
        Compass::NE,
        Compass::W2,
        Compass::W1,
        Compass::E1,
        Compass::E2,
        Compass::SW,
        Compass::S1,
        Compass::SE,
        Compass::S2,
    ];

    /// (row_delta, col_delta) in node units.
    #[inline]
    pub fn delta(self) -> (i64, i64) {
        match self {
            Compass::N2 => (-2, 0),
            Compass::NW => (-1, -1),
            Compass::N1 => (-1, 0),
            Compass::NE => (-1, 1),
            Compass::W2 => (0, -2),
            Compass::W1 => (0, -1),
            Compass::E1 => (0, 1),
            Compass::E2 => (0, 2),
            Compass::SW => (1, -1),
            Compass::S1 => (1, 0),
            Compass::SE => (1, 1),
            Compass::S2 => (2, 0),
        }
    }

    /// Linear offset into a buffer with row pitch `mx`.
    #[inline]
    pub fn offset(self, mx: i64) -> i64 {
        let (dr, dc) = self.delta();
        dr * mx + dc
    }
}

/// Precomputed linear offsets for all 12 stencil positions at a given `mx`.
/// Must be recomputed whenever `mx` (the active stride's row pitch) changes.
#[derive(Clone, Copy, Debug)]
pub struct StencilOffsets {
    pub offsets: [i64; 12],
}

impl StencilOffsets {
    pub fn new(mx: i64) -> Self {
        let mut offsets = [0i64; 12];
        for (i, c) in Compass::ALL.iter().enumerate() {
            offsets[i] = c.offset(mx);
        }
        StencilOffsets { offsets }
    }

    #[inline]
    pub fn get(&self, c: Compass) -> i64 {
        self.offsets[c as usize]
    }
}

/// Geometry of the active sub-grid at the current multigrid stride.
///
/// `nx`/`ny` are the interior (unpadded) node counts; `mx`/`my` are the
/// padded dimensions used for linear indexing into the shared backing
/// buffer (`nx + 4`, `ny + 4`).
#[derive(Clone, Copy, Debug)]
pub struct StrideGeometry {
    pub stride: u32,
    pub nx: usize,
    pub ny: usize,
    pub mx: usize,
    pub my: usize,
    /// Finest-resolution spacing (the user's requested increment).
    pub dx: f64,
    pub dy: f64,
    pub x0: f64,
    /// South edge, used as the row-from-south origin for fractional coords.
    pub y0: f64,
}

impl StrideGeometry {
    pub fn new(stride: u32, n_columns: usize, n_rows: usize, dx: f64, dy: f64, x0: f64, y0: f64) -> Self {
        let nx = (n_columns - 1) / stride as usize + 1;
        let ny = (n_rows - 1) / stride as usize + 1;
        StrideGeometry {
            stride,
            nx,
            ny,
            mx: nx + 4,
            my: ny + 4,
            dx,
            dy,
            x0,
            y0,
        }
    }

    /// Linear index of an interior node at (row, col), both in `0..ny`/`0..nx`
    /// unpadded coordinates. `row` 0 is the north edge.
    #[inline]
    pub fn node_index(&self, row: i64, col: i64) -> usize {
        let r = row + PAD;
        let c = col + PAD;
        (r as usize) * self.mx + c as usize
    }

    /// Inverse of [`node_index`]: recovers unpadded (row, col) from a linear
    /// index into this stride's addressing.
    #[inline]
    pub fn row_col_of(&self, index: usize) -> (i64, i64) {
        let r = (index / self.mx) as i64 - PAD;
        let c = (index % self.mx) as i64 - PAD;
        (r, c)
    }

    /// Effective spacing of this stride's nodes.
    #[inline]
    pub fn step_x(&self) -> f64 {
        self.dx * self.stride as f64
    }
    #[inline]
    pub fn step_y(&self) -> f64 {
        self.dy * self.stride as f64
    }

    /// Fractional (col, row_from_north) node coordinates of a data point,
    /// per spec.md §4.3's `floor(... + 0.5)` binning convention (but without
    /// the floor/rounding — callers round or take the remainder as needed).
    pub fn fractional_node(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x - self.x0) / self.step_x();
        let row_from_south = (y - self.y0) / self.step_y();
        let row = (self.ny - 1) as f64 - row_from_south;
        (col, row)
    }

    /// Nearest integer (row, col) bin for a data point, or `None` if it
    /// falls outside `[0, ny) x [0, nx)`.
    pub fn bin_of(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (col_f, row_f) = self.fractional_node(x, y);
        let col = (col_f + 0.5).floor() as i64;
        let row = (row_f + 0.5).floor() as i64;
        if row < 0 || row >= self.ny as i64 || col < 0 || col >= self.nx as i64 {
            None
        } else {
            Some((row, col))
        }
    }

    #[inline]
    pub fn bin_index(&self, row: i64, col: i64) -> usize {
        row as usize * self.nx + col as usize
    }
}
