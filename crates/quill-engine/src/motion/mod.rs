pub mod paths;

pub use paths::{stanza_speed, PathLayout, WordPaths, LANES};
