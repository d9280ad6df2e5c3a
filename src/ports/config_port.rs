//! Configuration boundary.

use crate::domain::error::FundwatchError;

/// Typed access to sectioned configuration.
///
/// The `*_or` helpers return a default when the key is absent but still
/// fail on a present-but-malformed value.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Result<String, FundwatchError>;
    fn get_int(&self, section: &str, key: &str) -> Result<i64, FundwatchError>;
    fn get_float(&self, section: &str, key: &str) -> Result<f64, FundwatchError>;
    fn get_bool(&self, section: &str, key: &str) -> Result<bool, FundwatchError>;
    fn has(&self, section: &str, key: &str) -> bool;

    fn get_string_or(
        &self,
        section: &str,
        key: &str,
        default: &str,
    ) -> Result<String, FundwatchError> {
        if self.has(section, key) {
            self.get_string(section, key)
        } else {
            Ok(default.to_string())
        }
    }

    fn get_int_or(&self, section: &str, key: &str, default: i64) -> Result<i64, FundwatchError> {
        if self.has(section, key) {
            self.get_int(section, key)
        } else {
            Ok(default)
        }
    }

    fn get_float_or(&self, section: &str, key: &str, default: f64) -> Result<f64, FundwatchError> {
        if self.has(section, key) {
            self.get_float(section, key)
        } else {
            Ok(default)
        }
    }

    fn get_usize_or(
        &self,
        section: &str,
        key: &str,
        default: usize,
    ) -> Result<usize, FundwatchError> {
        let v = self.get_int_or(section, key, default as i64)?;
        usize::try_from(v).map_err(|_| FundwatchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("expected a non-negative integer, got {v}"),
        })
    }
}
