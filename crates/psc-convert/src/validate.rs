//! Source-model validation and normalization.
//!
//! Validation walks every component of every supported kind and checks the
//! schema's restriction table, failing fast on the first violation; a
//! network containing lines or transformers is rejected outright.
//! Normalization returns a derived [`Network`] whose identifiers are safe
//! for the flat study namespace: whitespace collapsed to underscores,
//! non-bus components prefixed with their kind, attribute names lowercased,
//! carriers defaulted and joined, and non-extendable capacities pinned.
//! The input network is never mutated.

use psc_core::{AttrValue, Carrier, Component, ComponentKind, Network, PscError, PscResult};

use crate::schema::schema_for;

/// Name of the fictitious carrier attached to components without one.
pub const NULL_CARRIER: &str = "null";

/// Check restrictions without producing a normalized copy.
pub fn validate(network: &Network) -> PscResult<()> {
    check_restrictions(&normalized_identifiers(network))
}

/// Validate and return the normalized derived network.
pub fn validate_and_normalize(network: &Network) -> PscResult<Network> {
    let mut net = normalized_identifiers(network);
    check_restrictions(&net)?;
    join_carriers(&mut net)?;
    pin_non_extendable_capacities(&mut net);
    Ok(net)
}

/// Collapse whitespace to underscores: `"bus 1"` becomes `"bus_1"`.
pub fn normalize_ident(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Pure renaming pass: identifiers, attribute names, bus references.
fn normalized_identifiers(network: &Network) -> Network {
    let mut net = network.clone();
    net.name = normalize_ident(&net.name);

    for kind in ComponentKind::MAPPED {
        let prefix = (kind != ComponentKind::Bus).then(|| kind.as_str());
        for component in net.components_mut(kind) {
            normalize_component(component, prefix);
        }
    }
    // Unsupported kinds keep their names; they only ever appear in errors.
    for constraint in &mut net.global_constraints {
        constraint.name = normalize_ident(&constraint.name);
    }
    net
}

fn normalize_component(component: &mut Component, prefix: Option<&str>) {
    let base = normalize_ident(&component.name);
    component.name = match prefix {
        Some(prefix) => format!("{prefix}_{base}"),
        None => base,
    };

    let attributes = std::mem::take(&mut component.attributes);
    for (key, mut value) in attributes {
        let key = key.trim().to_ascii_lowercase();
        // Bus references must match the renamed bus identifiers.
        if matches!(key.as_str(), "bus" | "bus0" | "bus1") {
            if let AttrValue::Text(name) = &value {
                value = AttrValue::Text(normalize_ident(name));
            }
        }
        if key == "carrier" {
            if let AttrValue::Text(name) = &value {
                value = AttrValue::Text(name.trim().to_string());
            }
        }
        component.attributes.insert(key, value);
    }
}

fn check_restrictions(net: &Network) -> PscResult<()> {
    if net.snapshots.is_empty() {
        return Err(PscError::unsupported(
            "network",
            &net.name,
            "snapshots",
            0,
            "at least one snapshot is required",
        ));
    }
    if !net.snapshot_weightings.is_empty() {
        if net.snapshot_weightings.len() != net.snapshots.len() {
            return Err(PscError::unsupported(
                "network",
                &net.name,
                "snapshot_weightings",
                net.snapshot_weightings.len(),
                "weightings must match the snapshot count",
            ));
        }
        if let Some(w) = net.snapshot_weightings.iter().find(|w| **w != 1.0) {
            return Err(PscError::unsupported(
                "network",
                &net.name,
                "snapshot_weightings",
                w,
                "only uniform time-step weights are supported",
            ));
        }
    }

    for (kind, collection) in [
        (ComponentKind::Line, &net.lines),
        (ComponentKind::Transformer, &net.transformers),
    ] {
        if let Some(component) = collection.first() {
            return Err(PscError::NotImplemented(format!(
                "the converter does not support {kind}s (found '{}')",
                component.name
            )));
        }
    }

    for kind in ComponentKind::MAPPED {
        let schema = schema_for(kind).ok_or_else(|| {
            PscError::IntegrityError(format!("no schema registered for kind {kind}"))
        })?;
        let mut seen = std::collections::BTreeSet::new();
        for component in net.components(kind) {
            if !seen.insert(component.name.as_str()) {
                return Err(PscError::IntegrityError(format!(
                    "duplicate {kind} name '{}'",
                    component.name
                )));
            }
            for restriction in schema.restrictions {
                let value = component.scalar_or(restriction.attribute, restriction.assumed);
                if value != restriction.required {
                    return Err(PscError::unsupported(
                        kind.as_str(),
                        &component.name,
                        restriction.attribute,
                        value,
                        restriction.reason,
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Attach the `null` carrier to carrier-less components and materialize the
/// carrier's CO₂ accounting onto the emitting kinds.
fn join_carriers(net: &mut Network) -> PscResult<()> {
    if net.carrier(NULL_CARRIER).is_none() {
        net.carriers.push(Carrier::new(NULL_CARRIER, 0.0));
    }

    let carriers = net.carriers.clone();
    for kind in ComponentKind::MAPPED {
        if kind == ComponentKind::Bus {
            continue;
        }
        let emitting = ComponentKind::EMITTING.contains(&kind);
        for component in net.components_mut(kind) {
            let carrier_name = match component.text("carrier") {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    component.set("carrier", NULL_CARRIER);
                    NULL_CARRIER.to_string()
                }
            };
            let carrier = carriers
                .iter()
                .find(|c| c.name == carrier_name)
                .ok_or_else(|| PscError::DanglingReference {
                    kind: kind.as_str().to_string(),
                    name: component.name.clone(),
                    target_kind: "carrier".to_string(),
                    target: carrier_name.clone(),
                })?;
            if emitting {
                component.set("co2_emissions", carrier.co2_emissions);
            }
        }
    }
    Ok(())
}

/// Pin `<capacity>_min`/`<capacity>_max` to the installed capacity and zero
/// `capital_cost` for components that cannot be extended.
fn pin_non_extendable_capacities(net: &mut Network) {
    for kind in ComponentKind::MAPPED {
        let Some(spec) = schema_for(kind).and_then(|s| s.capacity) else {
            continue;
        };
        for component in net.components_mut(kind) {
            if component.scalar_or(spec.extendable_attr, 0.0) != 0.0 {
                continue;
            }
            let installed = component.scalar_or(spec.capacity_attr, 0.0);
            component.set(format!("{}_min", spec.capacity_attr), installed);
            component.set(format!("{}_max", spec.capacity_attr), installed);
            component.set("capital_cost", 0.0);
        }
    }
}
