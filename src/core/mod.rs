pub mod error;
pub mod value;

pub use error::{FetchError, Result};
pub use value::{coerce, PropertyType, PropertyValue, Value};
