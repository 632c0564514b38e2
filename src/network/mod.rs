pub mod model_file;
pub mod network;
pub mod params;

pub use network::{check_shape, Network};
pub use params::NetworkParameters;
