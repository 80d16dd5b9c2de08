//! Study descriptors and the on-disk assembler.
//!
//! The assembler is the sole writer of the study's descriptor files. It
//! stages the whole tree under `<output>.tmp`, re-validates the manifest
//! invariants (every series reference resolves to a written file, every
//! connection endpoint names a mapped component) and atomically renames
//! the staged tree over the final path. A failed run leaves the final
//! path untouched; re-running with a clean output path is the recovery
//! path.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use psc_core::{PscError, PscResult, Scenario};

use crate::format::SeriesFormat;
use crate::mapper::{ComponentRecord, MappedSystem, ParamValue, PortConnection};

const MODEL_LIBRARY_YML: &str = include_str!("../resources/grid_models.yml");
const OPTIM_CONFIG_YML: &str = include_str!("../resources/optim-config.yml");

/// Solver and simulation parameters written to `parameters.yml`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StudyParameters {
    pub solver: String,
    pub solver_logs: bool,
    pub solver_parameters: String,
    pub no_output: bool,
    pub first_time_step: usize,
    pub last_time_step: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub scenario_weights: BTreeMap<String, f64>,
}

impl StudyParameters {
    pub fn new(snapshot_count: usize, scenarios: &[Scenario]) -> Self {
        Self {
            solver: "highs".to_string(),
            solver_logs: false,
            solver_parameters: "THREADS 1".to_string(),
            no_output: false,
            first_time_step: 0,
            last_time_step: snapshot_count.saturating_sub(1),
            scenario_weights: scenarios
                .iter()
                .map(|s| (s.id.clone(), s.weight))
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct SystemFile<'a> {
    system: SystemRecord<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct SystemRecord<'a> {
    id: &'a str,
    model_libraries: &'a str,
    components: &'a [ComponentRecord],
    connections: &'a [PortConnection],
    area_connections: Option<()>,
    nodes: &'a [ComponentRecord],
}

/// Stages and commits the study directory tree.
pub struct StudyAssembler {
    temp_root: PathBuf,
    final_root: PathBuf,
    system_name: String,
}

impl StudyAssembler {
    /// Create a staged study tree for `system_name` under `output`.
    ///
    /// Any stale temp directory left by a crashed previous run is removed
    /// first.
    pub fn new(output: impl AsRef<Path>, system_name: impl Into<String>) -> PscResult<Self> {
        let final_root = output.as_ref().to_path_buf();
        let temp_root = final_root.with_extension("tmp");
        let system_name = system_name.into();

        if temp_root.exists() {
            fs::remove_dir_all(&temp_root).map_err(|e| {
                PscError::io(format!("cleaning up stale {}", temp_root.display()), e)
            })?;
        }

        let assembler = Self {
            temp_root,
            final_root,
            system_name,
        };
        let input = assembler.input_dir();
        fs::create_dir_all(input.join("model-libraries"))
            .map_err(|e| PscError::io(format!("creating {}", input.display()), e))?;
        Ok(assembler)
    }

    /// Staged `systems/<system>/input` directory the pipeline writes into.
    pub fn input_dir(&self) -> PathBuf {
        self.temp_root
            .join("systems")
            .join(&self.system_name)
            .join("input")
    }

    /// Staged data-series directory for the time-series writer.
    pub fn series_dir(&self) -> PathBuf {
        self.input_dir().join("data-series")
    }

    /// Final `systems/<system>/input` directory after a commit.
    pub fn final_input_dir(&self) -> PathBuf {
        self.final_root
            .join("systems")
            .join(&self.system_name)
            .join("input")
    }

    /// Write every descriptor and atomically commit the study tree.
    pub fn assemble(
        &self,
        library: &str,
        mapped: &MappedSystem,
        parameters: &StudyParameters,
        format: SeriesFormat,
    ) -> PscResult<()> {
        self.check_integrity(mapped, format)?;

        let input = self.input_dir();
        write_file(
            input.join("model-libraries").join(format!("{library}.yml")),
            MODEL_LIBRARY_YML,
        )?;
        write_file(input.join("optim-config.yml"), OPTIM_CONFIG_YML)?;
        write_file(input.join("parameters.yml"), &to_yaml(parameters)?)?;

        let system = SystemFile {
            system: SystemRecord {
                id: &self.system_name,
                model_libraries: library,
                components: &mapped.components,
                connections: &mapped.connections,
                area_connections: None,
                nodes: &[],
            },
        };
        write_file(input.join("system.yml"), &to_yaml(&system)?)?;

        self.commit()
    }

    /// Re-validate the manifest invariants against the staged tree.
    fn check_integrity(&self, mapped: &MappedSystem, format: SeriesFormat) -> PscResult<()> {
        let mut ids: BTreeSet<&str> = BTreeSet::new();
        for component in &mapped.components {
            if !ids.insert(&component.id) {
                return Err(PscError::IntegrityError(format!(
                    "duplicate component id '{}' in the study manifest",
                    component.id
                )));
            }
        }

        let series_dir = self.series_dir();
        for component in &mapped.components {
            for parameter in &component.parameters {
                if let ParamValue::Series(name) = &parameter.value {
                    let path = series_dir.join(format!("{name}{}", format.extension()));
                    if !path.is_file() {
                        return Err(PscError::IntegrityError(format!(
                            "component '{}' references series '{name}' but {} was never written",
                            component.id,
                            path.display()
                        )));
                    }
                }
            }
        }

        for connection in &mapped.connections {
            for endpoint in [&connection.component1, &connection.component2] {
                if !ids.contains(endpoint.as_str()) {
                    return Err(PscError::IntegrityError(format!(
                        "connection {}:{} -> {}:{} references unknown component '{endpoint}'",
                        connection.component1,
                        connection.port1,
                        connection.component2,
                        connection.port2,
                    )));
                }
            }
        }
        Ok(())
    }

    /// Atomically replace the final tree with the staged one.
    fn commit(&self) -> PscResult<()> {
        if self.final_root.exists() {
            fs::remove_dir_all(&self.final_root).map_err(|e| {
                PscError::io(format!("removing existing {}", self.final_root.display()), e)
            })?;
        }
        fs::rename(&self.temp_root, &self.final_root).map_err(|e| {
            PscError::io(
                format!(
                    "renaming {} -> {}",
                    self.temp_root.display(),
                    self.final_root.display()
                ),
                e,
            )
        })
    }

    /// Remove the staged tree after a failed run.
    pub fn cleanup(&self) -> PscResult<()> {
        if self.temp_root.exists() {
            fs::remove_dir_all(&self.temp_root).map_err(|e| {
                PscError::io(format!("cleaning up {}", self.temp_root.display()), e)
            })?;
        }
        Ok(())
    }
}

fn to_yaml<T: Serialize>(value: &T) -> PscResult<String> {
    serde_yaml::to_string(value)
        .map_err(|e| PscError::Other(format!("serializing study descriptor: {e}")))
}

fn write_file(path: PathBuf, content: &str) -> PscResult<()> {
    fs::write(&path, content).map_err(|e| PscError::io(format!("writing {}", path.display()), e))
}
