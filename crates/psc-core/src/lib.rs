//! # psc-core: Source Network Modeling Core
//!
//! Data structures for the in-memory power-system network model that the
//! conversion pipeline reads. A [`Network`] owns per-kind component
//! collections, a shared snapshot index and, in scenario mode, a set of
//! weighted scenarios.
//!
//! ## Design Philosophy
//!
//! Components are **attribute maps**, not fixed structs: each
//! [`Component`] carries a name plus a mapping from attribute name to an
//! [`AttrValue`], which is a scalar, a piece of text (bus or carrier
//! references), a snapshot-aligned series, or one series per scenario. The conversion
//! pipeline decides per attribute whether it is constant or time-varying;
//! keeping the source model schemaless mirrors how upstream network tools
//! expose their component tables.
//!
//! The network is read-only to the pipeline: normalization produces a
//! derived copy, the original is never mutated.
//!
//! ## Quick Start
//!
//! ```rust
//! use psc_core::{AttrValue, Component, ComponentKind, Network};
//!
//! let mut network = Network::with_snapshot_count("demo", 3);
//! network.add(
//!     ComponentKind::Bus,
//!     Component::new("town").with("v_nom", 1.0),
//! );
//! network.add(
//!     ComponentKind::Load,
//!     Component::new("houses")
//!         .with("bus", "town")
//!         .with("p_set", vec![10.0, 20.0, 30.0]),
//! );
//! network.add(
//!     ComponentKind::Generator,
//!     Component::new("plant")
//!         .with("bus", "town")
//!         .with("p_nom", 100.0)
//!         .with("marginal_cost", 50.0),
//! );
//!
//! assert_eq!(network.stats().num_loads, 1);
//! assert!(matches!(
//!     network.component(ComponentKind::Load, "houses").unwrap().get("p_set"),
//!     Some(AttrValue::Series(_))
//! ));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod error;

pub use error::{PscError, PscResult};

/// The component kinds a source network can hold.
///
/// `Line` and `Transformer` exist so that networks containing them can be
/// rejected explicitly instead of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Bus,
    Generator,
    Load,
    Link,
    StorageUnit,
    Store,
    Line,
    Transformer,
}

impl ComponentKind {
    /// Kinds the converter maps into the study, in dependency order:
    /// buses first, then bus-bound components, then links.
    pub const MAPPED: [ComponentKind; 6] = [
        ComponentKind::Bus,
        ComponentKind::Generator,
        ComponentKind::Load,
        ComponentKind::StorageUnit,
        ComponentKind::Store,
        ComponentKind::Link,
    ];

    /// Kinds that contribute emission terms to global constraints.
    pub const EMITTING: [ComponentKind; 3] = [
        ComponentKind::Generator,
        ComponentKind::StorageUnit,
        ComponentKind::Store,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Bus => "bus",
            ComponentKind::Generator => "generator",
            ComponentKind::Load => "load",
            ComponentKind::Link => "link",
            ComponentKind::StorageUnit => "storage_unit",
            ComponentKind::Store => "store",
            ComponentKind::Line => "line",
            ComponentKind::Transformer => "transformer",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attribute value: a constant, a reference to another component, a
/// snapshot-aligned series, or one series per scenario.
///
/// Scenario series keep the network's scenario order; each inner vector is
/// aligned to the snapshot index like a plain [`AttrValue::Series`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Scalar(f64),
    Text(String),
    Series(Vec<f64>),
    ScenarioSeries(Vec<(String, Vec<f64>)>),
}

impl AttrValue {
    /// Build a per-scenario series from (scenario id, values) pairs.
    pub fn scenario_series<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        AttrValue::ScenarioSeries(pairs.into_iter().map(|(id, v)| (id.into(), v)).collect())
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            AttrValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for series-shaped values (per snapshot, or per snapshot and
    /// scenario).
    pub fn is_time_varying(&self) -> bool {
        matches!(self, AttrValue::Series(_) | AttrValue::ScenarioSeries(_))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Scalar(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Scalar(v as f64)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Scalar(if v { 1.0 } else { 0.0 })
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::Series(v)
    }
}

/// One named entity of a given kind. Identity is (kind, name); names are
/// unique within a kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&AttrValue> {
        self.attributes.get(attribute)
    }

    /// Scalar value of `attribute`, or `default` when the attribute is
    /// absent. Series-shaped values yield `None` from [`AttrValue::as_scalar`]
    /// and fall back to the default as well.
    pub fn scalar_or(&self, attribute: &str, default: f64) -> f64 {
        self.get(attribute)
            .and_then(AttrValue::as_scalar)
            .unwrap_or(default)
    }

    pub fn text(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(AttrValue::as_text)
    }
}

/// One scenario of a stochastic study: an identifier and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub weight: f64,
}

impl Scenario {
    pub fn new(id: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            weight,
        }
    }
}

/// An energy carrier with its CO₂ accounting attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrier {
    pub name: String,
    #[serde(default)]
    pub co2_emissions: f64,
}

impl Carrier {
    pub fn new(name: impl Into<String>, co2_emissions: f64) -> Self {
        Self {
            name: name.into(),
            co2_emissions,
        }
    }
}

/// A model-level constraint spanning multiple components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConstraint {
    pub name: String,
    /// Constraint family, e.g. `primary_energy`.
    pub kind: String,
    /// Carrier attribute the constraint accounts, e.g. `co2_emissions`.
    pub carrier_attribute: String,
    /// Comparison sense: `<=` or `==`.
    pub sense: String,
    /// Right-hand-side bound.
    pub constant: f64,
}

/// The source network: component collections keyed by kind, the snapshot
/// index, carriers, global constraints and (optionally) scenarios.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub name: String,
    /// Ordered snapshot labels. Series values align to this index.
    pub snapshots: Vec<String>,
    /// Per-snapshot weightings; empty means uniform (all `1.0`).
    pub snapshot_weightings: Vec<f64>,
    /// Scenario set; empty means deterministic mode.
    pub scenarios: Vec<Scenario>,
    pub carriers: Vec<Carrier>,
    pub buses: Vec<Component>,
    pub generators: Vec<Component>,
    pub loads: Vec<Component>,
    pub links: Vec<Component>,
    pub storage_units: Vec<Component>,
    pub stores: Vec<Component>,
    pub lines: Vec<Component>,
    pub transformers: Vec<Component>,
    pub global_constraints: Vec<GlobalConstraint>,
}

impl Network {
    pub fn new(name: impl Into<String>, snapshots: Vec<String>) -> Self {
        Self {
            name: name.into(),
            snapshots,
            ..Self::default()
        }
    }

    /// Network with `count` integer-labelled snapshots (`"0"`, `"1"`, …).
    pub fn with_snapshot_count(name: impl Into<String>, count: usize) -> Self {
        Self::new(name, (0..count).map(|i| i.to_string()).collect())
    }

    pub fn add(&mut self, kind: ComponentKind, component: Component) {
        self.components_mut(kind).push(component);
    }

    pub fn components(&self, kind: ComponentKind) -> &[Component] {
        match kind {
            ComponentKind::Bus => &self.buses,
            ComponentKind::Generator => &self.generators,
            ComponentKind::Load => &self.loads,
            ComponentKind::Link => &self.links,
            ComponentKind::StorageUnit => &self.storage_units,
            ComponentKind::Store => &self.stores,
            ComponentKind::Line => &self.lines,
            ComponentKind::Transformer => &self.transformers,
        }
    }

    pub fn components_mut(&mut self, kind: ComponentKind) -> &mut Vec<Component> {
        match kind {
            ComponentKind::Bus => &mut self.buses,
            ComponentKind::Generator => &mut self.generators,
            ComponentKind::Load => &mut self.loads,
            ComponentKind::Link => &mut self.links,
            ComponentKind::StorageUnit => &mut self.storage_units,
            ComponentKind::Store => &mut self.stores,
            ComponentKind::Line => &mut self.lines,
            ComponentKind::Transformer => &mut self.transformers,
        }
    }

    pub fn component(&self, kind: ComponentKind, name: &str) -> Option<&Component> {
        self.components(kind).iter().find(|c| c.name == name)
    }

    pub fn carrier(&self, name: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.name == name)
    }

    /// True when the network carries an explicit scenario set.
    pub fn has_scenarios(&self) -> bool {
        !self.scenarios.is_empty()
    }

    pub fn scenario_ids(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.id.as_str()).collect()
    }

    /// Number of data columns a series file gets: one per scenario, one in
    /// deterministic mode.
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len().max(1)
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            num_buses: self.buses.len(),
            num_generators: self.generators.len(),
            num_loads: self.loads.len(),
            num_links: self.links.len(),
            num_storage_units: self.storage_units.len(),
            num_stores: self.stores.len(),
            num_global_constraints: self.global_constraints.len(),
            num_snapshots: self.snapshots.len(),
            num_scenarios: self.scenarios.len(),
        }
    }
}

/// Statistics about a network's size
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_generators: usize,
    pub num_loads: usize,
    pub num_links: usize,
    pub num_storage_units: usize,
    pub num_stores: usize,
    pub num_global_constraints: usize,
    pub num_snapshots: usize,
    pub num_scenarios: usize,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buses, {} generators, {} loads, {} links, {} storage units, {} stores, {} constraints over {} snapshots",
            self.num_buses,
            self.num_generators,
            self.num_loads,
            self.num_links,
            self.num_storage_units,
            self.num_stores,
            self.num_global_constraints,
            self.num_snapshots,
        )?;
        if self.num_scenarios > 0 {
            write!(f, " ({} scenarios)", self.num_scenarios)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_network() -> Network {
        let mut network = Network::with_snapshot_count("demo", 3);
        network.add(ComponentKind::Bus, Component::new("town").with("v_nom", 1.0));
        network.add(
            ComponentKind::Load,
            Component::new("houses")
                .with("bus", "town")
                .with("p_set", vec![10.0, 20.0, 30.0]),
        );
        network.add(
            ComponentKind::Generator,
            Component::new("plant")
                .with("bus", "town")
                .with("p_nom", 100.0)
                .with("marginal_cost", 50.0),
        );
        network
    }

    #[test]
    fn test_network_creation() {
        let network = demo_network();
        assert_eq!(network.snapshots.len(), 3);
        assert_eq!(network.buses.len(), 1);
        assert_eq!(
            network
                .component(ComponentKind::Generator, "plant")
                .unwrap()
                .scalar_or("p_nom", 0.0),
            100.0
        );
        assert!(network.component(ComponentKind::Generator, "nope").is_none());
    }

    #[test]
    fn test_attr_value_shapes() {
        let component = Component::new("c")
            .with("scalar", 2.5)
            .with("flag", true)
            .with("bus", "town")
            .with("series", vec![1.0, 2.0])
            .with(
                "scenario_series",
                AttrValue::scenario_series([("low", vec![1.0]), ("high", vec![2.0])]),
            );

        assert_eq!(component.scalar_or("scalar", 0.0), 2.5);
        assert_eq!(component.scalar_or("flag", 0.0), 1.0);
        assert_eq!(component.text("bus"), Some("town"));
        assert!(component.get("series").unwrap().is_time_varying());
        assert!(component.get("scenario_series").unwrap().is_time_varying());
        // Absent and series-shaped attributes fall back to the default.
        assert_eq!(component.scalar_or("missing", 7.0), 7.0);
        assert_eq!(component.scalar_or("series", 7.0), 7.0);
    }

    #[test]
    fn test_stats() {
        let stats = demo_network().stats();
        assert_eq!(stats.num_buses, 1);
        assert_eq!(stats.num_generators, 1);
        assert_eq!(stats.num_loads, 1);
        assert_eq!(stats.num_snapshots, 3);
        assert!(stats.to_string().contains("1 buses"));
    }

    #[test]
    fn test_scenario_mode() {
        let mut network = demo_network();
        assert!(!network.has_scenarios());
        assert_eq!(network.scenario_count(), 1);

        network.scenarios.push(Scenario::new("low", 0.5));
        network.scenarios.push(Scenario::new("high", 0.5));
        assert!(network.has_scenarios());
        assert_eq!(network.scenario_count(), 2);
        assert_eq!(network.scenario_ids(), vec!["low", "high"]);
    }

    #[test]
    fn test_serde_round_trip() {
        let network = demo_network();
        let json = serde_json::to_string(&network).unwrap();
        let back: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(back.stats(), network.stats());
        assert_eq!(
            back.component(ComponentKind::Load, "houses").unwrap().get("p_set"),
            Some(&AttrValue::Series(vec![10.0, 20.0, 30.0]))
        );
    }

    #[test]
    fn test_kind_round_trip_serde() {
        let json = serde_json::to_string(&ComponentKind::StorageUnit).unwrap();
        assert_eq!(json, "\"storage_unit\"");
        let kind: ComponentKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, ComponentKind::StorageUnit);
    }
}
