//! Constant vs. time-varying attribute classification.
//!
//! For each component the classifier walks its schema's parameter table and
//! splits the entries into constants (scalar, defaults applied, clamped)
//! and series. The policy for the ambiguous edge case is fixed: an
//! attribute stored as a series is ALWAYS time-varying, even when its
//! values never change; the pipeline does not collapse constant series.

use std::collections::BTreeMap;

use psc_core::{AttrValue, Component, ComponentKind, Network, PscError, PscResult};

use crate::schema::ModelSchema;

/// Magnitude bound applied to every constant forwarded into the study;
/// keeps unbounded source defaults representable in the descriptors.
pub const MAX_STUDY_VALUE: f64 = 1.0e11;

/// Clamp a value into the representable study range.
pub fn bounded(value: f64) -> f64 {
    value.clamp(-MAX_STUDY_VALUE, MAX_STUDY_VALUE)
}

/// The time-varying payload of one attribute: one column per scenario
/// (deterministic mode: a single column), rows aligned to the snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesColumns {
    pub scenario_dependent: bool,
    pub columns: Vec<Vec<f64>>,
}

/// One component split into constant and time-varying attribute groups,
/// both keyed by the SOURCE attribute name.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedComponent {
    pub name: String,
    pub constants: BTreeMap<String, f64>,
    pub series: BTreeMap<String, SeriesColumns>,
}

/// Classify every mapped kind of the network, keyed by kind.
pub fn classify_network(
    network: &Network,
) -> PscResult<BTreeMap<ComponentKind, Vec<ClassifiedComponent>>> {
    let mut classified = BTreeMap::new();
    for kind in ComponentKind::MAPPED {
        let schema = crate::schema::schema_for(kind).ok_or_else(|| {
            PscError::IntegrityError(format!("no schema registered for kind {kind}"))
        })?;
        classified.insert(kind, classify_components(network, kind, schema)?);
    }
    Ok(classified)
}

/// Classify every component of `kind` against its schema.
pub fn classify_components(
    network: &Network,
    kind: ComponentKind,
    schema: &ModelSchema,
) -> PscResult<Vec<ClassifiedComponent>> {
    network
        .components(kind)
        .iter()
        .map(|component| classify_component(network, kind, schema, component))
        .collect()
}

fn classify_component(
    network: &Network,
    kind: ComponentKind,
    schema: &ModelSchema,
    component: &Component,
) -> PscResult<ClassifiedComponent> {
    let mut classified = ClassifiedComponent {
        name: component.name.clone(),
        constants: BTreeMap::new(),
        series: BTreeMap::new(),
    };

    let snapshots = network.snapshots.len();
    for param in schema.params {
        match component.get(param.source) {
            None => {
                classified.constants.insert(param.source.to_string(), bounded(param.default));
            }
            Some(AttrValue::Scalar(value)) => {
                classified.constants.insert(param.source.to_string(), bounded(*value));
            }
            Some(AttrValue::Text(text)) => {
                return Err(PscError::unsupported(
                    kind.as_str(),
                    &component.name,
                    param.source,
                    text,
                    "expected a numeric value",
                ));
            }
            Some(AttrValue::Series(values)) => {
                check_series_len(kind, component, param.source, values.len(), snapshots)?;
                // In scenario mode a plain series applies to every scenario.
                let columns = vec![values.clone(); network.scenario_count()];
                classified
                    .series
                    .insert(param.source.to_string(), SeriesColumns { scenario_dependent: false, columns });
            }
            Some(AttrValue::ScenarioSeries(pairs)) => {
                let columns = scenario_columns(network, kind, component, param.source, pairs, snapshots)?;
                classified
                    .series
                    .insert(param.source.to_string(), SeriesColumns { scenario_dependent: true, columns });
            }
        }
    }
    Ok(classified)
}

fn check_series_len(
    kind: ComponentKind,
    component: &Component,
    attribute: &str,
    len: usize,
    snapshots: usize,
) -> PscResult<()> {
    if len != snapshots {
        return Err(PscError::unsupported(
            kind.as_str(),
            &component.name,
            attribute,
            format!("{len} values"),
            format!("series must cover all {snapshots} snapshots"),
        ));
    }
    Ok(())
}

/// Reorder per-scenario vectors into network scenario order, requiring an
/// exact cover of the scenario set.
fn scenario_columns(
    network: &Network,
    kind: ComponentKind,
    component: &Component,
    attribute: &str,
    pairs: &[(String, Vec<f64>)],
    snapshots: usize,
) -> PscResult<Vec<Vec<f64>>> {
    if !network.has_scenarios() {
        return Err(PscError::unsupported(
            kind.as_str(),
            &component.name,
            attribute,
            "scenario series",
            "the network defines no scenarios",
        ));
    }
    if pairs.len() != network.scenarios.len() {
        return Err(PscError::unsupported(
            kind.as_str(),
            &component.name,
            attribute,
            format!("{} scenario columns", pairs.len()),
            format!("expected one series per scenario ({})", network.scenarios.len()),
        ));
    }

    let mut columns = Vec::with_capacity(network.scenarios.len());
    for scenario in &network.scenarios {
        let values = pairs
            .iter()
            .find(|(id, _)| *id == scenario.id)
            .map(|(_, values)| values)
            .ok_or_else(|| {
                PscError::unsupported(
                    kind.as_str(),
                    &component.name,
                    attribute,
                    &scenario.id,
                    "missing series for scenario",
                )
            })?;
        check_series_len(kind, component, attribute, values.len(), snapshots)?;
        columns.push(values.clone());
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_for;
    use psc_core::Scenario;

    fn network_with_load(load: Component) -> Network {
        let mut network = Network::with_snapshot_count("demo", 3);
        network.add(ComponentKind::Bus, Component::new("town"));
        network.add(ComponentKind::Load, load);
        network
    }

    #[test]
    fn scalars_and_defaults_become_constants() {
        let network = network_with_load(Component::new("houses").with("bus", "town").with("p_set", 42.0));
        let schema = schema_for(ComponentKind::Load).unwrap();
        let classified = classify_components(&network, ComponentKind::Load, schema).unwrap();

        let load = &classified[0];
        assert!(load.series.is_empty());
        assert_eq!(load.constants["p_set"], 42.0);
        assert_eq!(load.constants["q_set"], 0.0); // default
        assert_eq!(load.constants["sign"], -1.0); // default
    }

    #[test]
    fn series_attributes_are_time_varying() {
        let network = network_with_load(
            Component::new("houses").with("bus", "town").with("p_set", vec![10.0, 20.0, 30.0]),
        );
        let schema = schema_for(ComponentKind::Load).unwrap();
        let classified = classify_components(&network, ComponentKind::Load, schema).unwrap();

        let series = &classified[0].series["p_set"];
        assert!(!series.scenario_dependent);
        assert_eq!(series.columns, vec![vec![10.0, 20.0, 30.0]]);
        assert!(!classified[0].constants.contains_key("p_set"));
    }

    #[test]
    fn constant_valued_series_stays_time_varying() {
        // Pinned policy: no collapsing of series whose values never change.
        let network = network_with_load(
            Component::new("houses").with("bus", "town").with("p_set", vec![5.0, 5.0, 5.0]),
        );
        let schema = schema_for(ComponentKind::Load).unwrap();
        let classified = classify_components(&network, ComponentKind::Load, schema).unwrap();
        assert!(classified[0].series.contains_key("p_set"));
    }

    #[test]
    fn unbounded_defaults_are_clamped() {
        let mut network = Network::with_snapshot_count("demo", 1);
        network.add(ComponentKind::Bus, Component::new("town"));
        network.add(ComponentKind::Generator, Component::new("plant").with("bus", "town"));
        let schema = schema_for(ComponentKind::Generator).unwrap();
        let classified = classify_components(&network, ComponentKind::Generator, schema).unwrap();

        assert_eq!(classified[0].constants["p_nom_max"], MAX_STUDY_VALUE);
        assert_eq!(classified[0].constants["e_sum_min"], -MAX_STUDY_VALUE);
    }

    #[test]
    fn wrong_series_length_is_rejected() {
        let network = network_with_load(
            Component::new("houses").with("bus", "town").with("p_set", vec![10.0, 20.0]),
        );
        let schema = schema_for(ComponentKind::Load).unwrap();
        assert!(matches!(
            classify_components(&network, ComponentKind::Load, schema),
            Err(PscError::UnsupportedConfiguration { .. })
        ));
    }

    #[test]
    fn scenario_series_follow_network_scenario_order() {
        let mut network = network_with_load(Component::new("houses").with("bus", "town").with(
            "p_set",
            AttrValue::scenario_series([("high", vec![4.0, 5.0, 6.0]), ("low", vec![1.0, 2.0, 3.0])]),
        ));
        network.scenarios = vec![Scenario::new("low", 0.5), Scenario::new("high", 0.5)];

        let schema = schema_for(ComponentKind::Load).unwrap();
        let classified = classify_components(&network, ComponentKind::Load, schema).unwrap();
        let series = &classified[0].series["p_set"];
        assert!(series.scenario_dependent);
        assert_eq!(series.columns, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn plain_series_is_replicated_across_scenarios() {
        let mut network = network_with_load(
            Component::new("houses").with("bus", "town").with("p_set", vec![1.0, 2.0, 3.0]),
        );
        network.scenarios = vec![Scenario::new("low", 0.5), Scenario::new("high", 0.5)];

        let schema = schema_for(ComponentKind::Load).unwrap();
        let classified = classify_components(&network, ComponentKind::Load, schema).unwrap();
        let series = &classified[0].series["p_set"];
        assert!(!series.scenario_dependent);
        assert_eq!(series.columns.len(), 2);
    }

    #[test]
    fn scenario_series_without_scenarios_is_rejected() {
        let network = network_with_load(Component::new("houses").with("bus", "town").with(
            "p_set",
            AttrValue::scenario_series([("only", vec![1.0, 2.0, 3.0])]),
        ));
        let schema = schema_for(ComponentKind::Load).unwrap();
        assert!(matches!(
            classify_components(&network, ComponentKind::Load, schema),
            Err(PscError::UnsupportedConfiguration { .. })
        ));
    }

    #[test]
    fn text_where_number_expected_is_rejected() {
        let network = network_with_load(
            Component::new("houses").with("bus", "town").with("p_set", "a lot"),
        );
        let schema = schema_for(ComponentKind::Load).unwrap();
        assert!(matches!(
            classify_components(&network, ComponentKind::Load, schema),
            Err(PscError::UnsupportedConfiguration { .. })
        ));
    }
}
