pub mod config;
pub mod quorum;
pub mod trust_level;
pub mod trusted_state;
pub mod verifier;

pub use config::*;
pub use quorum::*;
pub use trust_level::*;
pub use trusted_state::*;
pub use verifier::*;
