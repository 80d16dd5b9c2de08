//! Global constraint translation.
//!
//! Only `primary_energy` constraints accounting `co2_emissions` are
//! supported. A `<=` sense becomes the CO₂-cap model, `==` the CO₂-equality
//! model; the constraint's bound travels as the single `quota` parameter
//! and its contribution terms bind the emission port of every component
//! with a real (non-`null`) carrier.

use psc_core::{ComponentKind, Network, PscError, PscResult};

use crate::classify::bounded;
use crate::mapper::{ComponentRecord, ParamValue, ParameterRecord, PortConnection};
use crate::validate::NULL_CARRIER;

pub const EMISSION_PORT: &str = "emission_port";
pub const CO2_CAP_MODEL: &str = "global_constraint_co2_max";
pub const CO2_EQ_MODEL: &str = "global_constraint_co2_eq";

/// One contribution term: a component bound through one of its ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintTerm {
    pub component: String,
    pub port: String,
}

/// The emitted representation of one global constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRecord {
    pub name: String,
    pub model_id: &'static str,
    pub sense: String,
    pub bound: f64,
    pub terms: Vec<ConstraintTerm>,
}

impl ConstraintRecord {
    /// Render as a study component carrying the `quota` parameter.
    pub fn to_component(&self, library: &str) -> ComponentRecord {
        ComponentRecord {
            id: self.name.clone(),
            model: format!("{library}.{}", self.model_id),
            parameters: vec![ParameterRecord {
                id: "quota".to_string(),
                time_dependent: false,
                scenario_dependent: false,
                value: ParamValue::Scalar(self.bound),
            }],
        }
    }

    /// Render the contribution terms as port connections.
    pub fn to_connections(&self) -> Vec<PortConnection> {
        self.terms
            .iter()
            .map(|term| PortConnection {
                component1: self.name.clone(),
                port1: EMISSION_PORT.to_string(),
                component2: term.component.clone(),
                port2: term.port.to_string(),
            })
            .collect()
    }
}

/// Translate every global constraint of the (normalized) network.
pub fn translate_global_constraints(network: &Network) -> PscResult<Vec<ConstraintRecord>> {
    if network.global_constraints.is_empty() {
        return Ok(Vec::new());
    }

    let terms = emission_terms(network);
    network
        .global_constraints
        .iter()
        .map(|constraint| {
            if constraint.kind != "primary_energy" {
                return Err(PscError::NotImplemented(format!(
                    "global constraint '{}' has unsupported type '{}'",
                    constraint.name, constraint.kind
                )));
            }
            if constraint.carrier_attribute != "co2_emissions" {
                return Err(PscError::NotImplemented(format!(
                    "global constraint '{}' accounts unsupported carrier attribute '{}'",
                    constraint.name, constraint.carrier_attribute
                )));
            }
            let model_id = match constraint.sense.as_str() {
                "<=" => CO2_CAP_MODEL,
                "==" => CO2_EQ_MODEL,
                other => {
                    return Err(PscError::unsupported(
                        "global_constraint",
                        &constraint.name,
                        "sense",
                        other,
                        "supported senses are <= and ==",
                    ))
                }
            };
            Ok(ConstraintRecord {
                name: constraint.name.clone(),
                model_id,
                sense: constraint.sense.clone(),
                bound: bounded(constraint.constant),
                terms: terms.clone(),
            })
        })
        .collect()
}

/// Components contributing emissions: generators, storage units and stores
/// whose carrier is not the fictitious `null` carrier.
fn emission_terms(network: &Network) -> Vec<ConstraintTerm> {
    let mut terms = Vec::new();
    for kind in ComponentKind::EMITTING {
        for component in network.components(kind) {
            let has_carrier = component
                .text("carrier")
                .map(|c| c != NULL_CARRIER)
                .unwrap_or(false);
            if has_carrier {
                terms.push(ConstraintTerm {
                    component: component.name.clone(),
                    port: EMISSION_PORT.to_string(),
                });
            }
        }
    }
    terms
}
