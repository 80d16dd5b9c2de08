//! Source component to target component record mapping.
//!
//! Consumes the classifier's output plus the series references produced by
//! the writer and emits one [`ComponentRecord`] per component, together
//! with the port connections that wire it to its bus. Kinds are processed
//! in dependency order, buses first, so every bus reference can be
//! resolved against the already-mapped bus set.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::warn;

use psc_core::{Component, ComponentKind, Network, PscError, PscResult};

use crate::classify::ClassifiedComponent;
use crate::schema::{schema_for, ModelSchema};
use crate::series::SeriesReference;

/// A parameter value: an inline scalar or the name of a written series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f64),
    Series(String),
}

/// One parameter of a target component record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParameterRecord {
    pub id: String,
    pub time_dependent: bool,
    pub scenario_dependent: bool,
    pub value: ParamValue,
}

/// The emitted representation of one source component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentRecord {
    pub id: String,
    pub model: String,
    pub parameters: Vec<ParameterRecord>,
}

/// A named connection between two component ports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortConnection {
    pub component1: String,
    pub port1: String,
    pub component2: String,
    pub port2: String,
}

/// All mapped components and their wiring, in mapping order.
#[derive(Debug, Clone, Default)]
pub struct MappedSystem {
    pub components: Vec<ComponentRecord>,
    pub connections: Vec<PortConnection>,
}

impl MappedSystem {
    pub fn component_ids(&self) -> BTreeSet<&str> {
        self.components.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Map every supported component of the (normalized) network.
///
/// `series_refs` is keyed by (component name, source attribute) and must
/// contain one entry per time-varying attribute the classifier produced.
pub fn map_components(
    network: &Network,
    classified: &BTreeMap<ComponentKind, Vec<ClassifiedComponent>>,
    series_refs: &BTreeMap<(String, String), SeriesReference>,
    library: &str,
) -> PscResult<MappedSystem> {
    let mut mapped = MappedSystem::default();
    let mut bus_ids: BTreeSet<String> = BTreeSet::new();

    for kind in ComponentKind::MAPPED {
        let schema = schema_for(kind).ok_or_else(|| {
            PscError::IntegrityError(format!("no schema registered for kind {kind}"))
        })?;
        let empty = Vec::new();
        let kind_classified = classified.get(&kind).unwrap_or(&empty);
        for (component, split) in network.components(kind).iter().zip(kind_classified) {
            warn_unknown_attributes(kind, component, schema);
            let record = build_record(kind, schema, split, series_refs, library)?;
            wire_ports(kind, component, schema, &bus_ids, &mut mapped.connections)?;
            if kind == ComponentKind::Bus {
                bus_ids.insert(record.id.clone());
            }
            mapped.components.push(record);
        }
    }
    Ok(mapped)
}

fn build_record(
    kind: ComponentKind,
    schema: &ModelSchema,
    split: &ClassifiedComponent,
    series_refs: &BTreeMap<(String, String), SeriesReference>,
    library: &str,
) -> PscResult<ComponentRecord> {
    let mut parameters = Vec::with_capacity(schema.params.len());
    for param in schema.params {
        let key = (split.name.clone(), param.source.to_string());
        let record = if let Some(series) = split.series.get(param.source) {
            let reference = series_refs.get(&key).ok_or_else(|| {
                PscError::IntegrityError(format!(
                    "no series was written for {kind} '{}' attribute '{}'",
                    split.name, param.source
                ))
            })?;
            ParameterRecord {
                id: param.target.to_string(),
                time_dependent: true,
                scenario_dependent: series.scenario_dependent,
                value: ParamValue::Series(reference.name.clone()),
            }
        } else {
            let value = split.constants.get(param.source).copied().ok_or_else(|| {
                PscError::IntegrityError(format!(
                    "{kind} '{}' attribute '{}' was not classified",
                    split.name, param.source
                ))
            })?;
            ParameterRecord {
                id: param.target.to_string(),
                time_dependent: false,
                scenario_dependent: false,
                value: ParamValue::Scalar(value),
            }
        };
        parameters.push(record);
    }

    Ok(ComponentRecord {
        id: split.name.clone(),
        model: format!("{library}.{}", schema.model_id),
        parameters,
    })
}

fn wire_ports(
    kind: ComponentKind,
    component: &Component,
    schema: &ModelSchema,
    bus_ids: &BTreeSet<String>,
    connections: &mut Vec<PortConnection>,
) -> PscResult<()> {
    for port in schema.ports {
        let bus = component.text(port.source).ok_or_else(|| PscError::unsupported(
            kind.as_str(),
            &component.name,
            port.source,
            component
                .get(port.source)
                .map(|v| format!("{v:?}"))
                .unwrap_or_else(|| "<missing>".to_string()),
            "a bus reference is required",
        ))?;
        if !bus_ids.contains(bus) {
            return Err(PscError::DanglingReference {
                kind: kind.as_str().to_string(),
                name: component.name.clone(),
                target_kind: "bus".to_string(),
                target: bus.to_string(),
            });
        }
        connections.push(PortConnection {
            component1: bus.to_string(),
            port1: port.bus_port.to_string(),
            component2: component.name.clone(),
            port2: port.component_port.to_string(),
        });
    }
    Ok(())
}

fn warn_unknown_attributes(kind: ComponentKind, component: &Component, schema: &ModelSchema) {
    for attribute in component.attributes.keys() {
        if !schema.knows(attribute) {
            warn!(
                kind = kind.as_str(),
                component = component.name.as_str(),
                attribute = attribute.as_str(),
                "dropping attribute not present in the target schema"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_and_normalize;
    use psc_core::{AttrValue, Network};
    use std::path::PathBuf;

    fn mapped_demo() -> MappedSystem {
        let mut network = Network::with_snapshot_count("demo", 3);
        network.add(ComponentKind::Bus, Component::new("town"));
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
        let net = validate_and_normalize(&network).unwrap();
        let classified = crate::classify::classify_network(&net).unwrap();
        let mut refs = BTreeMap::new();
        refs.insert(
            ("load_houses".to_string(), "p_set".to_string()),
            SeriesReference {
                name: "demo_load_houses_p_set".to_string(),
                path: PathBuf::from("demo_load_houses_p_set.tsv"),
            },
        );
        map_components(&net, &classified, &refs, "grid_models").unwrap()
    }

    #[test]
    fn maps_buses_before_dependants_and_wires_ports() {
        let mapped = mapped_demo();
        assert_eq!(mapped.components[0].model, "grid_models.bus");
        assert_eq!(mapped.components.len(), 3);

        assert_eq!(mapped.connections.len(), 2);
        for connection in &mapped.connections {
            assert_eq!(connection.component1, "town");
            assert_eq!(connection.port1, "p_balance_port");
        }
        let ids = mapped.component_ids();
        assert!(ids.contains("generator_plant"));
        assert!(ids.contains("load_houses"));
    }

    #[test]
    fn time_varying_parameters_reference_their_series() {
        let mapped = mapped_demo();
        let load = mapped.components.iter().find(|c| c.id == "load_houses").unwrap();
        let p_set = load.parameters.iter().find(|p| p.id == "p_set").unwrap();
        assert!(p_set.time_dependent);
        assert_eq!(p_set.value, ParamValue::Series("demo_load_houses_p_set".into()));
    }

    #[test]
    fn constant_parameters_are_inlined() {
        let mapped = mapped_demo();
        let generator = mapped
            .components
            .iter()
            .find(|c| c.id == "generator_plant")
            .unwrap();
        let marginal = generator.parameters.iter().find(|p| p.id == "marginal_cost").unwrap();
        assert!(!marginal.time_dependent);
        assert_eq!(marginal.value, ParamValue::Scalar(50.0));
        // Pinned capacity from the normalizer shows up as constants.
        let p_nom_max = generator.parameters.iter().find(|p| p.id == "p_nom_max").unwrap();
        assert_eq!(p_nom_max.value, ParamValue::Scalar(100.0));
        // No parameter of a constant-only component references a series.
        assert!(generator
            .parameters
            .iter()
            .all(|p| matches!(p.value, ParamValue::Scalar(_))));
    }

    #[test]
    fn unknown_bus_is_a_dangling_reference() {
        let mut network = Network::with_snapshot_count("demo", 1);
        network.add(ComponentKind::Bus, Component::new("town"));
        network.add(
            ComponentKind::Load,
            Component::new("houses").with("bus", "atlantis"),
        );
        let net = validate_and_normalize(&network).unwrap();
        let classified = crate::classify::classify_network(&net).unwrap();
        let err = map_components(&net, &classified, &BTreeMap::new(), "grid_models").unwrap_err();
        match err {
            PscError::DanglingReference { target, .. } => assert_eq!(target, "atlantis"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn link_gets_two_port_bindings() {
        let mut network = Network::with_snapshot_count("demo", 1);
        network.add(ComponentKind::Bus, Component::new("north"));
        network.add(ComponentKind::Bus, Component::new("south"));
        network.add(
            ComponentKind::Link,
            Component::new("cable")
                .with("bus0", "north")
                .with("bus1", "south")
                .with("p_nom", 300.0),
        );
        let net = validate_and_normalize(&network).unwrap();
        let classified = crate::classify::classify_network(&net).unwrap();
        let mapped = map_components(&net, &classified, &BTreeMap::new(), "grid_models").unwrap();

        let ports: Vec<_> = mapped.connections.iter().map(|c| c.port2.as_str()).collect();
        assert_eq!(ports, vec!["p0_port", "p1_port"]);
        assert_eq!(mapped.connections[0].component1, "north");
        assert_eq!(mapped.connections[1].component1, "south");
    }

    #[test]
    fn missing_series_reference_is_an_integrity_error() {
        let mut network = Network::with_snapshot_count("demo", 2);
        network.add(ComponentKind::Bus, Component::new("town"));
        network.add(
            ComponentKind::Load,
            Component::new("houses").with("bus", "town").with("p_set", vec![1.0, 2.0]),
        );
        let net = validate_and_normalize(&network).unwrap();
        let classified = crate::classify::classify_network(&net).unwrap();
        assert!(matches!(
            map_components(&net, &classified, &BTreeMap::new(), "grid_models"),
            Err(PscError::IntegrityError(_))
        ));
    }

    #[test]
    fn scenario_series_marks_parameter_scenario_dependent() {
        let mut network = Network::with_snapshot_count("demo", 2);
        network.scenarios = vec![
            psc_core::Scenario::new("low", 0.5),
            psc_core::Scenario::new("high", 0.5),
        ];
        network.add(ComponentKind::Bus, Component::new("town"));
        network.add(
            ComponentKind::Load,
            Component::new("houses").with("bus", "town").with(
                "p_set",
                AttrValue::scenario_series([("low", vec![1.0, 2.0]), ("high", vec![3.0, 4.0])]),
            ),
        );
        let net = validate_and_normalize(&network).unwrap();
        let classified = crate::classify::classify_network(&net).unwrap();
        let mut refs = BTreeMap::new();
        refs.insert(
            ("load_houses".to_string(), "p_set".to_string()),
            SeriesReference {
                name: "demo_load_houses_p_set".to_string(),
                path: PathBuf::from("x.csv"),
            },
        );
        let mapped = map_components(&net, &classified, &refs, "grid_models").unwrap();
        let load = mapped.components.iter().find(|c| c.id == "load_houses").unwrap();
        let p_set = load.parameters.iter().find(|p| p.id == "p_set").unwrap();
        assert!(p_set.scenario_dependent);
    }
}
