pub mod batch;
pub mod converter;
pub mod etl;
pub mod playground;
pub mod response;
pub mod session;

pub use crate::domain::model::{ConversionResult, Row};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
