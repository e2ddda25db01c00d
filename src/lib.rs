pub mod activenodes;
pub mod data;
pub mod errors;
pub mod exactsplitter;
pub mod gradientbooster;
pub mod metric;
pub mod node;
pub mod objective;
pub mod splitter;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use data::{FeatureColumns, Matrix};
pub use exactsplitter::ExactSplitter;
pub use gradientbooster::GradientBooster;
