use crate::error::EvotradeError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), EvotradeError>;
}

pub(crate) fn section_error(section: &str, message: &str) -> EvotradeError {
    EvotradeError::Configuration(format!("[{}] {}", section, message))
}
