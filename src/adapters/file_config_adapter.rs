//! INI file configuration adapter.

use crate::domain::error::FundwatchError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FundwatchError> {
        let mut config = Ini::new();
        config
            .load(&path)
            .map_err(|e| FundwatchError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, FundwatchError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| FundwatchError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn missing(section: &str, key: &str) -> FundwatchError {
        FundwatchError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    fn invalid(section: &str, key: &str, reason: impl Into<String>) -> FundwatchError {
        FundwatchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Result<String, FundwatchError> {
        self.config
            .get(section, key)
            .ok_or_else(|| Self::missing(section, key))
    }

    fn get_int(&self, section: &str, key: &str) -> Result<i64, FundwatchError> {
        match self.config.getint(section, key) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(Self::missing(section, key)),
            Err(e) => Err(Self::invalid(section, key, e)),
        }
    }

    fn get_float(&self, section: &str, key: &str) -> Result<f64, FundwatchError> {
        match self.config.getfloat(section, key) {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(Self::missing(section, key)),
            Err(e) => Err(Self::invalid(section, key, e)),
        }
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<bool, FundwatchError> {
        let raw = self.get_string(section, key)?;
        match raw.to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(Self::invalid(
                section,
                key,
                format!("expected a boolean, got {other:?}"),
            )),
        }
    }

    fn has(&self, section: &str, key: &str) -> bool {
        self.config.get(section, key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[monitor]
data_dir = /var/lib/fundwatch
index_code = 000300
max_instruments = 10

[sync]
retry_attempts = 5
retry_delay_secs = 10

[backtest]
stop_loss_pct = 0.10
strategy = crossover
enabled = yes
"#;

    #[test]
    fn from_string_parses_sections() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_string("monitor", "data_dir").unwrap(),
            "/var/lib/fundwatch"
        );
        assert_eq!(adapter.get_int("sync", "retry_attempts").unwrap(), 5);
        assert_eq!(
            adapter.get_float("backtest", "stop_loss_pct").unwrap(),
            0.10
        );
        assert!(adapter.get_bool("backtest", "enabled").unwrap());
    }

    #[test]
    fn missing_key_is_config_missing() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        let err = adapter.get_string("monitor", "nope").unwrap_err();
        assert!(matches!(err, FundwatchError::ConfigMissing { .. }));
    }

    #[test]
    fn malformed_value_is_config_invalid() {
        let adapter =
            FileConfigAdapter::from_string("[sync]\nretry_attempts = lots\n").unwrap();
        let err = adapter.get_int("sync", "retry_attempts").unwrap_err();
        assert!(matches!(err, FundwatchError::ConfigInvalid { .. }));
    }

    #[test]
    fn malformed_bool_is_config_invalid() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nenabled = maybe\n").unwrap();
        assert!(adapter.get_bool("backtest", "enabled").is_err());
    }

    #[test]
    fn defaults_apply_only_when_absent() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(
            adapter.get_int_or("sync", "retry_attempts", 3).unwrap(),
            5
        );
        assert_eq!(adapter.get_int_or("sync", "page_size", 49).unwrap(), 49);
        assert_eq!(
            adapter
                .get_string_or("monitor", "report_path", "report.md")
                .unwrap(),
            "report.md"
        );
    }

    #[test]
    fn present_but_malformed_still_fails_with_default() {
        let adapter = FileConfigAdapter::from_string("[sync]\npage_size = many\n").unwrap();
        assert!(adapter.get_int_or("sync", "page_size", 49).is_err());
    }

    #[test]
    fn negative_usize_is_rejected() {
        let adapter = FileConfigAdapter::from_string("[sync]\npage_size = -3\n").unwrap();
        assert!(adapter.get_usize_or("sync", "page_size", 49).is_err());
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[monitor]\nindex_code = 000300\n").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(adapter.get_string("monitor", "index_code").unwrap(), "000300");
    }

    #[test]
    fn from_file_missing_path_is_parse_error() {
        let result = FileConfigAdapter::from_file("/nonexistent/fundwatch.ini");
        assert!(matches!(
            result.unwrap_err(),
            FundwatchError::ConfigParse { .. }
        ));
    }
}
