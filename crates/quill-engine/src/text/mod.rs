pub mod measure;
pub mod poem;
pub mod tokenize;

pub use measure::{FontMetrics, TileMeasure};
pub use poem::PoemManifest;
pub use tokenize::split_into_tiles;
