pub mod collision;
pub mod grid;
pub mod integrate;
pub mod spawn;

pub use collision::{resolve_boundary, resolve_pair, resolve_pair_in_place};
pub use grid::{SpatialGrid, FORWARD_NEIGHBORS};
pub use integrate::integrate;
pub use spawn::generate_bodies;
