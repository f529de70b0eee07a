pub mod ros2;

pub use ros2::{load_grid_map, load_reference_map};
