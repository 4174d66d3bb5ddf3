// Simulation-wide tuning constants.
// Spawn ranges keep every radius inside [5, 15], which in turn bounds the
// grid cell size the backends derive.

/// Substeps per rendered frame. Collisions are resolved once per substep,
/// bounding penetration depth for fast bodies.
pub const SUBSTEPS: u32 = 4;

/// Coefficient of restitution used by the default configuration.
pub const DEFAULT_RESTITUTION: f32 = 0.9;

/// Lower bound for the spatial grid cell size. Below this the per-cell
/// bookkeeping costs more than the pair pruning saves.
pub const MIN_CELL_SIZE: f32 = 20.0;

/// Cell size must be at least this multiple of the largest radius so that
/// any overlapping pair is co-located or directly adjacent in the grid.
pub const CELL_SIZE_FACTOR: f32 = 2.0;

/// Smallest spawn mass.
pub const MASS_MIN: f32 = 1.0;

/// Width of the spawn mass range (masses land in [MASS_MIN, MASS_MIN + MASS_SPAN]).
pub const MASS_SPAN: f32 = 4.0;

/// Radius of a body of minimal mass.
pub const RADIUS_BASE: f32 = 5.0;

/// Radius gained per unit of mass above minimal.
pub const RADIUS_PER_MASS: f32 = 2.5;

/// Spawn velocity span: each component is uniform in ±SPAWN_SPEED/2.
pub const SPAWN_SPEED: f32 = 100.0;

/// Workgroup size for GPU compute shaders.
pub const WORKGROUP_SIZE: u32 = 256;

/// Body indices a single grid cell can hold on the GPU. Overflowing bodies
/// drop out of the index for that substep rather than writing out of bounds.
pub const GRID_CELL_CAPACITY: u32 = 64;
