pub mod channels;
pub mod error;
mod events;
pub mod model;
pub mod utils;

pub use events::*;
