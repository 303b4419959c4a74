pub mod error;
pub mod json;

pub use error::AppError;
pub use json::{ApiData, AppJson, AppPath, AppQuery};
