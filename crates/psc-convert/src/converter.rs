//! The conversion pipeline entry point.
//!
//! Stages run strictly in dependency order: validate/normalize, classify,
//! write series, map components, translate constraints, assemble.
//! Each stage consumes the previous stage's complete output and
//! the first violation aborts the run; the staged study tree is cleaned
//! up so no partial study remains at the final path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use psc_core::{Network, PscResult};

use crate::classify::classify_network;
use crate::constraints::translate_global_constraints;
use crate::format::SeriesFormat;
use crate::mapper::map_components;
use crate::schema::MODEL_LIBRARY_ID;
use crate::series::{SeriesReference, SeriesWriter};
use crate::study::{StudyAssembler, StudyParameters};
use crate::validate::{normalize_ident, validate_and_normalize};

/// System name used when the source network has none.
const FALLBACK_SYSTEM_NAME: &str = "converted_study";

/// Conversion settings supplied by the caller.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Series file format (`.csv` or `.tsv`).
    pub format: SeriesFormat,
    /// Overrides the network name as the study's system id.
    pub system_name: Option<String>,
    /// Model library id referenced by every component record.
    pub library: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: SeriesFormat::default(),
            system_name: None,
            library: MODEL_LIBRARY_ID.to_string(),
        }
    }
}

/// What a successful conversion produced.
#[derive(Debug, Clone)]
pub struct StudySummary {
    /// Final `systems/<system>/input` directory.
    pub input_dir: PathBuf,
    pub system_name: String,
    pub num_components: usize,
    pub num_connections: usize,
    pub num_series_files: usize,
}

/// Converts one source network into one on-disk study.
pub struct StudyConverter<'a> {
    network: &'a Network,
    output: PathBuf,
    options: ConvertOptions,
}

impl<'a> StudyConverter<'a> {
    pub fn new(network: &'a Network, output: impl AsRef<Path>, options: ConvertOptions) -> Self {
        Self {
            network,
            output: output.as_ref().to_path_buf(),
            options,
        }
    }

    /// Run the full pipeline.
    pub fn convert(&self) -> PscResult<StudySummary> {
        info!("study conversion started");
        let result = self.run();
        if result.is_ok() {
            info!("study conversion completed");
        }
        result
    }

    fn run(&self) -> PscResult<StudySummary> {
        let net = validate_and_normalize(self.network)?;

        let system_name = self
            .options
            .system_name
            .as_deref()
            .map(normalize_ident)
            .filter(|name| !name.is_empty())
            .or_else(|| (!net.name.is_empty()).then(|| net.name.clone()))
            .unwrap_or_else(|| FALLBACK_SYSTEM_NAME.to_string());

        let assembler = StudyAssembler::new(&self.output, &system_name)?;
        let outcome = self.run_staged(&net, &system_name, &assembler);
        if outcome.is_err() {
            // Best effort: the run already failed, keep its error.
            let _ = assembler.cleanup();
        }
        outcome
    }

    fn run_staged(
        &self,
        net: &Network,
        system_name: &str,
        assembler: &StudyAssembler,
    ) -> PscResult<StudySummary> {
        // Classify every mapped kind up front; classification failures must
        // precede any file write.
        let classified = classify_network(net)?;

        let mut writer = SeriesWriter::new(assembler.series_dir(), self.options.format, system_name);
        let mut series_refs: BTreeMap<(String, String), SeriesReference> = BTreeMap::new();
        for kind_classified in classified.values() {
            for component in kind_classified {
                for (attribute, series) in &component.series {
                    let reference = writer.write(&component.name, attribute, series)?;
                    series_refs.insert((component.name.clone(), attribute.clone()), reference);
                }
            }
        }

        let mut mapped = map_components(net, &classified, &series_refs, &self.options.library)?;

        for record in translate_global_constraints(net)? {
            info!(constraint = record.name.as_str(), model = record.model_id, "translating global constraint");
            mapped.connections.extend(record.to_connections());
            mapped.components.push(record.to_component(&self.options.library));
        }

        let parameters = StudyParameters::new(net.snapshots.len(), &net.scenarios);
        assembler.assemble(&self.options.library, &mapped, &parameters, self.options.format)?;

        Ok(StudySummary {
            input_dir: assembler.final_input_dir(),
            system_name: system_name.to_string(),
            num_components: mapped.components.len(),
            num_connections: mapped.connections.len(),
            num_series_files: writer.len(),
        })
    }
}

/// Convenience wrapper around [`StudyConverter`].
pub fn convert_network_to_study(
    network: &Network,
    output: impl AsRef<Path>,
    options: ConvertOptions,
) -> PscResult<StudySummary> {
    StudyConverter::new(network, output, options).convert()
}
