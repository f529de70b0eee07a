pub mod cells;
pub mod gridmap;
pub mod pyramid;

pub use cells::filter_out_of_bounds;
pub use gridmap::GridMap;
