pub mod candidate;
pub mod config;
pub mod session;

pub use candidate::*;
pub use config::*;
pub use session::*;
