pub mod autopilot;
pub mod game;

pub use autopilot::Autopilot;
pub use game::BlasterMini;
