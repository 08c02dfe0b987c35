use crate::core::io::gro::{DEFAULT_PRECISION, PRECISION_RANGE};
use thiserror::Error;

pub const DEFAULT_INDEX_ORIGIN: usize = 1;
pub const DEFAULT_MOLECULE_NAME: &str = "MOL";
pub const DEFAULT_NREXCL: u32 = 3;
pub const DEFAULT_SYSTEM_NAME: &str = "System name";
pub const DEFAULT_TITLE: &str = "Generated by gmxport";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Options controlling how a model is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Decimals for `.gro` coordinates.
    pub precision: usize,
    /// Number given to the first particle; GROMACS files are 1-based.
    pub index_origin: usize,
    pub molecule_name: String,
    pub nrexcl: u32,
    pub system_name: String,
    /// Title line of the coordinate file.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            index_origin: DEFAULT_INDEX_ORIGIN,
            molecule_name: DEFAULT_MOLECULE_NAME.to_string(),
            nrexcl: DEFAULT_NREXCL,
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

#[derive(Default)]
pub struct ExportConfigBuilder {
    precision: Option<usize>,
    index_origin: Option<usize>,
    molecule_name: Option<String>,
    nrexcl: Option<u32>,
    system_name: Option<String>,
    title: Option<String>,
}

impl ExportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = Some(precision);
        self
    }
    pub fn index_origin(mut self, origin: usize) -> Self {
        self.index_origin = Some(origin);
        self
    }
    pub fn molecule_name(mut self, name: impl Into<String>) -> Self {
        self.molecule_name = Some(name.into());
        self
    }
    pub fn nrexcl(mut self, nrexcl: u32) -> Self {
        self.nrexcl = Some(nrexcl);
        self
    }
    pub fn system_name(mut self, name: impl Into<String>) -> Self {
        self.system_name = Some(name.into());
        self
    }
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn build(self) -> Result<ExportConfig, ConfigError> {
        let defaults = ExportConfig::default();

        let precision = self.precision.unwrap_or(defaults.precision);
        if !PRECISION_RANGE.contains(&precision) {
            return Err(ConfigError::InvalidParameter {
                name: "precision",
                reason: format!(
                    "{} is outside {}..={}",
                    precision,
                    PRECISION_RANGE.start(),
                    PRECISION_RANGE.end()
                ),
            });
        }

        let molecule_name = self.molecule_name.unwrap_or(defaults.molecule_name);
        if molecule_name.trim().is_empty() || molecule_name.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidParameter {
                name: "molecule_name",
                reason: "must be a single non-empty word".to_string(),
            });
        }

        let title = self.title.unwrap_or(defaults.title);
        if title.contains('\n') {
            return Err(ConfigError::InvalidParameter {
                name: "title",
                reason: "must fit on one line".to_string(),
            });
        }

        Ok(ExportConfig {
            precision,
            index_origin: self.index_origin.unwrap_or(defaults.index_origin),
            molecule_name,
            nrexcl: self.nrexcl.unwrap_or(defaults.nrexcl),
            system_name: self.system_name.unwrap_or(defaults.system_name),
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_with_no_overrides_uses_defaults() {
        let config = ExportConfigBuilder::new().build().unwrap();
        assert_eq!(config, ExportConfig::default());
        assert_eq!(config.precision, 3);
        assert_eq!(config.index_origin, 1);
        assert_eq!(config.molecule_name, "MOL");
        assert_eq!(config.nrexcl, 3);
        assert_eq!(config.system_name, "System name");
    }

    #[test]
    fn build_applies_overrides() {
        let config = ExportConfigBuilder::new()
            .precision(6)
            .index_origin(0)
            .molecule_name("SOL")
            .nrexcl(2)
            .system_name("Water box")
            .title("tip5p")
            .build()
            .unwrap();
        assert_eq!(config.precision, 6);
        assert_eq!(config.index_origin, 0);
        assert_eq!(config.molecule_name, "SOL");
        assert_eq!(config.nrexcl, 2);
        assert_eq!(config.system_name, "Water box");
        assert_eq!(config.title, "tip5p");
    }

    #[test]
    fn build_rejects_out_of_range_precision() {
        for precision in [0, 17] {
            let result = ExportConfigBuilder::new().precision(precision).build();
            assert!(matches!(
                result,
                Err(ConfigError::InvalidParameter {
                    name: "precision",
                    ..
                })
            ));
        }
    }

    #[test]
    fn build_rejects_molecule_name_with_whitespace() {
        let result = ExportConfigBuilder::new().molecule_name("my mol").build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "molecule_name",
                ..
            })
        ));
    }

    #[test]
    fn build_rejects_multiline_title() {
        let result = ExportConfigBuilder::new().title("a\nb").build();
        assert!(result.is_err());
    }
}
