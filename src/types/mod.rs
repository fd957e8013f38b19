//! Type definitions

pub mod order;
pub mod route;
pub mod time_window;
pub mod truck;

pub use order::*;
pub use route::*;
pub use time_window::*;
pub use truck::*;
