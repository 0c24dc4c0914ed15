// Program wide top-level error handling

mod format;
mod messages;

// Re-export all public symbols
pub use format::*;
pub use messages::generate_error_message;
