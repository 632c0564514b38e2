pub mod model;
pub mod predict;
pub mod test;
pub mod train;
