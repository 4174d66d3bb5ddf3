use kinetica_core::{Body, CELL_SIZE_FACTOR, MIN_CELL_SIZE};

/// Forward half of the 8-neighbor stencil. Scanning each cell against only
/// these offsets (plus its own intra-cell pairs) visits every unordered cell
/// pair exactly once, which is what makes pair ownership unique without any
/// "already checked" bookkeeping.
pub const FORWARD_NEIGHBORS: [(i32, i32); 4] = [(1, 0), (-1, 1), (0, 1), (1, 1)];

/// Uniform spatial index over the arena.
///
/// Rebuilt from scratch every substep and never persisted across substeps;
/// the struct itself is owned scratch so cell storage is reused between
/// rebuilds and only reallocated when the grid dimensions change. The caller
/// must pick `cell_size ≥ 2 × max(radius)` (see [`SpatialGrid::cell_size_for`])
/// so any two overlapping bodies land in the same or a directly adjacent
/// cell.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    cells: Vec<Vec<u32>>,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell-size policy: twice the largest radius, floored at
    /// [`MIN_CELL_SIZE`]. Derived from the true maximum so the adjacency
    /// invariant holds even under very skewed radius distributions.
    pub fn cell_size_for(max_radius: f32) -> f32 {
        (CELL_SIZE_FACTOR * max_radius).max(MIN_CELL_SIZE)
    }

    /// Re-index `bodies` by cell. Bodies whose center falls outside the
    /// arena are clamped into the nearest valid cell; they still take part
    /// in pair checks, and the separate boundary pass pulls them back in.
    pub fn rebuild(&mut self, bodies: &[Body], width: f32, height: f32, cell_size: f32) {
        debug_assert!(width > 0.0 && height > 0.0 && cell_size > 0.0);

        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (height / cell_size).ceil().max(1.0) as usize;

        if cols != self.cols || rows != self.rows {
            self.cells = vec![Vec::new(); cols * rows];
            self.cols = cols;
            self.rows = rows;
        } else {
            for cell in &mut self.cells {
                cell.clear();
            }
        }
        self.cell_size = cell_size;

        for (index, body) in bodies.iter().enumerate() {
            let (col, row) = self.cell_coords(body.x, body.y);
            self.cells[row * cols + col].push(index as u32);
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }

    /// Clamped cell coordinate for a world position.
    pub fn cell_coords(&self, x: f32, y: f32) -> (usize, usize) {
        let col = ((x / self.cell_size).floor() as i64).clamp(0, self.cols as i64 - 1);
        let row = ((y / self.cell_size).floor() as i64).clamp(0, self.rows as i64 - 1);
        (col as usize, row as usize)
    }

    /// Body indices whose centers fall in the cell at `(col, row)`.
    pub fn cell(&self, col: usize, row: usize) -> &[u32] {
        &self.cells[row * self.cols + col]
    }

    /// In-bounds forward neighbors of `(col, row)`, in stencil order.
    pub fn forward_neighbors(&self, col: usize, row: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        FORWARD_NEIGHBORS.iter().filter_map(move |&(dc, dr)| {
            let ncol = col as i32 + dc;
            let nrow = row as i32 + dr;
            (ncol >= 0 && (ncol as usize) < self.cols && (nrow as usize) < self.rows)
                .then(|| (ncol as usize, nrow as usize))
        })
    }
}
