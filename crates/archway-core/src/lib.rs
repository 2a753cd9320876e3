pub mod constants;
pub mod error;
pub mod prompt;
pub mod types;

pub use constants::*;
pub use error::{ChainError, Step};
pub use prompt::Prompt;
pub use types::*;
