pub mod data_url;
pub mod optimizer;

pub use data_url::{parse_data_url, to_data_url};
pub use optimizer::{optimize, OptimizeError, OptimizeOptions, OptimizedImage};
