pub mod ids;
pub mod watermark;

pub use ids::*;
pub use watermark::Watermark;
