pub mod ai;
pub mod config;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatReply, MessagingClient, WellnessClient};
pub use config::Config;
pub use session::{Session, Settlement, Submission};
pub use state::{Message, Phase, Role, FALLBACK_REPLY};
