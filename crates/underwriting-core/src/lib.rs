mod checked;
pub mod error;
pub mod rounding;
pub mod time_value;
pub mod types;

#[cfg(feature = "real_assets")]
pub mod real_assets;

pub use error::UnderwritingError;
pub use types::*;

/// Standard result type for all underwriting operations
pub type UnderwritingResult<T> = Result<T, UnderwritingError>;
