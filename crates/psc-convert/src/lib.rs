//! # psc-convert: Network-to-Study Conversion Pipeline
//!
//! Converts an in-memory [`psc_core::Network`] into the directory-structured
//! study consumed by a downstream optimization engine.
//!
//! ## Pipeline
//!
//! 1. **Validate/Normalize** ([`validate`]): restriction checks against the
//!    per-kind schema tables, identifier normalization, carrier join,
//!    capacity pinning. Fails fast; the source network is never mutated.
//! 2. **Classify** ([`classify`]): split each component's schema attributes
//!    into constants and time-varying series.
//! 3. **Write series** ([`series`]): one headerless delimited file per
//!    series, rows in snapshot order, one column per scenario.
//! 4. **Map** ([`mapper`]): target component records with port wiring, in
//!    dependency order (buses first).
//! 5. **Translate constraints** ([`constraints`]): CO₂ primary-energy
//!    constraints to constraint components plus emission-port connections.
//! 6. **Assemble** ([`study`]): descriptors staged under `<output>.tmp`,
//!    integrity-checked and atomically committed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use psc_convert::{convert_network_to_study, ConvertOptions, SeriesFormat};
//! use psc_core::{Component, ComponentKind, Network};
//!
//! fn main() -> psc_core::PscResult<()> {
//!     let mut network = Network::with_snapshot_count("demo", 3);
//!     network.add(ComponentKind::Bus, Component::new("town"));
//!     network.add(
//!         ComponentKind::Load,
//!         Component::new("houses")
//!             .with("bus", "town")
//!             .with("p_set", vec![10.0, 20.0, 30.0]),
//!     );
//!     network.add(
//!         ComponentKind::Generator,
//!         Component::new("plant")
//!             .with("bus", "town")
//!             .with("p_nom", 100.0)
//!             .with("marginal_cost", 50.0),
//!     );
//!
//!     let options = ConvertOptions {
//!         format: SeriesFormat::Tsv,
//!         ..ConvertOptions::default()
//!     };
//!     let summary = convert_network_to_study(&network, "out/demo_study", options)?;
//!     println!("study written to {}", summary.input_dir.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All errors are [`psc_core::PscError`] and fatal to the run: the pipeline
//! has no retry or partial-success mode. The only non-fatal diagnostic is
//! the warning emitted for attributes absent from the target schema, which
//! are dropped.

pub mod classify;
pub mod constraints;
pub mod converter;
pub mod format;
pub mod mapper;
pub mod schema;
pub mod series;
pub mod study;
pub mod validate;

pub use converter::{convert_network_to_study, ConvertOptions, StudyConverter, StudySummary};
pub use format::SeriesFormat;
pub use mapper::{ComponentRecord, MappedSystem, ParamValue, ParameterRecord, PortConnection};
pub use schema::{schema_for, ModelSchema, MODEL_LIBRARY_ID};
pub use series::{SeriesReference, SeriesWriter};
pub use study::{StudyAssembler, StudyParameters};
pub use validate::{validate, validate_and_normalize};
