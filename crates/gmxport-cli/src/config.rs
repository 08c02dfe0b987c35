use crate::cli::ExportArgs;
use crate::error::{CliError, Result};
use gmxport::engine::config::{ExportConfig, ExportConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialCoordinatesConfig {
    precision: Option<usize>,
    title: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTopologyConfig {
    #[serde(rename = "index-origin")]
    index_origin: Option<usize>,
    #[serde(rename = "molecule-name")]
    molecule_name: Option<String>,
    nrexcl: Option<u32>,
    #[serde(rename = "system-name")]
    system_name: Option<String>,
}

/// Export options as read from a config file; every field may be omitted.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialExportConfig {
    coordinates: Option<PartialCoordinatesConfig>,
    topology: Option<PartialTopologyConfig>,
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

impl PartialExportConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Combines file values with CLI arguments; CLI arguments win, and
    /// anything left unset falls back to the library defaults.
    pub fn merge_with_cli(mut self, args: &ExportArgs) -> Result<ExportConfig> {
        self.apply_set_values(&args.set_values)?;

        let coordinates = self.coordinates.take().unwrap_or_default();
        let topology = self.topology.take().unwrap_or_default();

        let mut builder = ExportConfigBuilder::new();
        if let Some(precision) = args.precision.or(coordinates.precision) {
            builder = builder.precision(precision);
        }
        if let Some(title) = args.title.clone().or(coordinates.title) {
            builder = builder.title(title);
        }
        if let Some(origin) = args.index_origin.or(topology.index_origin) {
            builder = builder.index_origin(origin);
        }
        if let Some(name) = args.molecule_name.clone().or(topology.molecule_name) {
            builder = builder.molecule_name(name);
        }
        if let Some(nrexcl) = args.nrexcl.or(topology.nrexcl) {
            builder = builder.nrexcl(nrexcl);
        }
        if let Some(name) = args.system_name.clone().or(topology.system_name) {
            builder = builder.system_name(name);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "coordinates.precision" => {
                    self.coordinates
                        .get_or_insert_with(Default::default)
                        .precision = Some(parse_value(key, value, "integer")?);
                }
                "coordinates.title" => {
                    self.coordinates.get_or_insert_with(Default::default).title =
                        Some(value.to_string());
                }
                "topology.index-origin" => {
                    self.topology
                        .get_or_insert_with(Default::default)
                        .index_origin = Some(parse_value(key, value, "integer")?);
                }
                "topology.molecule-name" => {
                    self.topology
                        .get_or_insert_with(Default::default)
                        .molecule_name = Some(value.to_string());
                }
                "topology.nrexcl" => {
                    self.topology.get_or_insert_with(Default::default).nrexcl =
                        Some(parse_value(key, value, "integer")?);
                }
                "topology.system-name" => {
                    self.topology
                        .get_or_insert_with(Default::default)
                        .system_name = Some(value.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
