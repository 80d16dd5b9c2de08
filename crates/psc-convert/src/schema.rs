//! Static per-kind attribute schemas.
//!
//! Each mapped component kind carries one [`ModelSchema`]: the target model
//! id, the ordered source-attribute → target-field parameter table with
//! per-attribute defaults, the port-wiring table, the supported-value
//! restrictions enforced by the validator, and the control attributes the
//! pipeline consumes without forwarding. Keeping the tables declarative
//! means adding a component kind never touches the mapper's control flow.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use psc_core::ComponentKind;

/// Identifier of the model library every component record references.
pub const MODEL_LIBRARY_ID: &str = "grid_models";

/// One parameter of a target model: where it comes from in the source
/// model, what it is called in the study, and the value assumed when the
/// source component does not set it.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub source: &'static str,
    pub target: &'static str,
    pub default: f64,
}

/// One port binding: the source attribute holding the bus reference and
/// the two port names the connection joins.
#[derive(Debug, Clone, Copy)]
pub struct PortSpec {
    pub source: &'static str,
    pub component_port: &'static str,
    pub bus_port: &'static str,
}

/// A supported-value restriction: the attribute must equal `required`
/// (with `assumed` standing in when the attribute is absent).
#[derive(Debug, Clone, Copy)]
pub struct Restriction {
    pub attribute: &'static str,
    pub required: f64,
    pub assumed: f64,
    pub reason: &'static str,
}

/// Capacity pinning rule for non-extendable components: when
/// `extendable_attr` is false, `<capacity_attr>_min`/`_max` are pinned to
/// the installed capacity and `capital_cost` is zeroed.
#[derive(Debug, Clone, Copy)]
pub struct CapacitySpec {
    pub extendable_attr: &'static str,
    pub capacity_attr: &'static str,
}

/// The full schema of one mapped component kind.
#[derive(Debug, Clone, Copy)]
pub struct ModelSchema {
    pub kind: ComponentKind,
    pub model_id: &'static str,
    pub params: &'static [ParamSpec],
    pub ports: &'static [PortSpec],
    pub restrictions: &'static [Restriction],
    pub capacity: Option<CapacitySpec>,
    /// Attributes the pipeline recognizes but never forwards.
    pub control: &'static [&'static str],
}

impl ModelSchema {
    /// True when `attribute` appears anywhere in the schema (parameter,
    /// port, restriction or control set). Anything else on a component is
    /// unknown and gets dropped with a warning.
    pub fn knows(&self, attribute: &str) -> bool {
        self.params.iter().any(|p| p.source == attribute)
            || self.ports.iter().any(|p| p.source == attribute)
            || self.restrictions.iter().any(|r| r.attribute == attribute)
            || self.control.contains(&attribute)
    }

    pub fn param(&self, source: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.source == source)
    }
}

const BUS_PARAMS: &[ParamSpec] = &[
    ParamSpec { source: "v_nom", target: "v_nom", default: 1.0 },
    ParamSpec { source: "x", target: "x", default: 0.0 },
    ParamSpec { source: "y", target: "y", default: 0.0 },
    ParamSpec { source: "v_mag_pu_set", target: "v_mag_pu_set", default: 1.0 },
    ParamSpec { source: "v_mag_pu_min", target: "v_mag_pu_min", default: 0.0 },
    ParamSpec { source: "v_mag_pu_max", target: "v_mag_pu_max", default: f64::INFINITY },
];

const GENERATOR_PARAMS: &[ParamSpec] = &[
    ParamSpec { source: "p_nom_min", target: "p_nom_min", default: 0.0 },
    ParamSpec { source: "p_nom_max", target: "p_nom_max", default: f64::INFINITY },
    ParamSpec { source: "p_min_pu", target: "p_min_pu", default: 0.0 },
    ParamSpec { source: "p_max_pu", target: "p_max_pu", default: 1.0 },
    ParamSpec { source: "marginal_cost", target: "marginal_cost", default: 0.0 },
    ParamSpec { source: "capital_cost", target: "capital_cost", default: 0.0 },
    ParamSpec { source: "e_sum_min", target: "e_sum_min", default: f64::NEG_INFINITY },
    ParamSpec { source: "e_sum_max", target: "e_sum_max", default: f64::INFINITY },
    ParamSpec { source: "sign", target: "sign", default: 1.0 },
    ParamSpec { source: "efficiency", target: "efficiency", default: 1.0 },
    ParamSpec { source: "co2_emissions", target: "emission_factor", default: 0.0 },
];

const LOAD_PARAMS: &[ParamSpec] = &[
    ParamSpec { source: "p_set", target: "p_set", default: 0.0 },
    ParamSpec { source: "q_set", target: "q_set", default: 0.0 },
    ParamSpec { source: "sign", target: "sign", default: -1.0 },
];

const LINK_PARAMS: &[ParamSpec] = &[
    ParamSpec { source: "efficiency", target: "efficiency", default: 1.0 },
    ParamSpec { source: "p_nom_min", target: "p_nom_min", default: 0.0 },
    ParamSpec { source: "p_nom_max", target: "p_nom_max", default: f64::INFINITY },
    ParamSpec { source: "p_min_pu", target: "p_min_pu", default: 0.0 },
    ParamSpec { source: "p_max_pu", target: "p_max_pu", default: 1.0 },
    ParamSpec { source: "marginal_cost", target: "marginal_cost", default: 0.0 },
    ParamSpec { source: "capital_cost", target: "capital_cost", default: 0.0 },
];

const STORAGE_UNIT_PARAMS: &[ParamSpec] = &[
    ParamSpec { source: "p_nom_min", target: "p_nom_min", default: 0.0 },
    ParamSpec { source: "p_nom_max", target: "p_nom_max", default: f64::INFINITY },
    ParamSpec { source: "p_min_pu", target: "p_min_pu", default: -1.0 },
    ParamSpec { source: "p_max_pu", target: "p_max_pu", default: 1.0 },
    ParamSpec { source: "sign", target: "sign", default: 1.0 },
    ParamSpec { source: "efficiency_store", target: "efficiency_store", default: 1.0 },
    ParamSpec { source: "efficiency_dispatch", target: "efficiency_dispatch", default: 1.0 },
    ParamSpec { source: "standing_loss", target: "standing_loss", default: 0.0 },
    ParamSpec { source: "max_hours", target: "max_hours", default: 1.0 },
    ParamSpec { source: "marginal_cost", target: "marginal_cost", default: 0.0 },
    ParamSpec { source: "capital_cost", target: "capital_cost", default: 0.0 },
    ParamSpec { source: "marginal_cost_storage", target: "marginal_cost_storage", default: 0.0 },
    ParamSpec { source: "spill_cost", target: "spill_cost", default: 0.0 },
    ParamSpec { source: "inflow", target: "inflow", default: 0.0 },
    ParamSpec { source: "co2_emissions", target: "emission_factor", default: 0.0 },
];

const STORE_PARAMS: &[ParamSpec] = &[
    ParamSpec { source: "sign", target: "sign", default: 1.0 },
    ParamSpec { source: "e_nom_min", target: "e_nom_min", default: 0.0 },
    ParamSpec { source: "e_nom_max", target: "e_nom_max", default: f64::INFINITY },
    ParamSpec { source: "e_min_pu", target: "e_min_pu", default: 0.0 },
    ParamSpec { source: "e_max_pu", target: "e_max_pu", default: 1.0 },
    ParamSpec { source: "standing_loss", target: "standing_loss", default: 0.0 },
    ParamSpec { source: "marginal_cost", target: "marginal_cost", default: 0.0 },
    ParamSpec { source: "capital_cost", target: "capital_cost", default: 0.0 },
    ParamSpec { source: "marginal_cost_storage", target: "marginal_cost_storage", default: 0.0 },
    ParamSpec { source: "co2_emissions", target: "emission_factor", default: 0.0 },
];

const BALANCE_PORT: &[PortSpec] = &[PortSpec {
    source: "bus",
    component_port: "p_balance_port",
    bus_port: "p_balance_port",
}];

const LINK_PORTS: &[PortSpec] = &[
    PortSpec { source: "bus0", component_port: "p0_port", bus_port: "p_balance_port" },
    PortSpec { source: "bus1", component_port: "p1_port", bus_port: "p_balance_port" },
];

const ACTIVE_ONLY: Restriction = Restriction {
    attribute: "active",
    required: 1.0,
    assumed: 1.0,
    reason: "only active components are supported",
};

const LINEAR_COST_ONLY: Restriction = Restriction {
    attribute: "marginal_cost_quadratic",
    required: 0.0,
    assumed: 0.0,
    reason: "only linear marginal costs are supported",
};

const GENERATOR_RESTRICTIONS: &[Restriction] = &[
    ACTIVE_ONLY,
    LINEAR_COST_ONLY,
    Restriction {
        attribute: "committable",
        required: 0.0,
        assumed: 0.0,
        reason: "unit commitment is not supported",
    },
];

const LOAD_RESTRICTIONS: &[Restriction] = &[ACTIVE_ONLY];

const LINK_RESTRICTIONS: &[Restriction] = &[ACTIVE_ONLY];

const STORAGE_UNIT_RESTRICTIONS: &[Restriction] = &[
    ACTIVE_ONLY,
    LINEAR_COST_ONLY,
    Restriction {
        attribute: "sign",
        required: 1.0,
        assumed: 1.0,
        reason: "only storage units with sign = 1 are supported",
    },
    Restriction {
        attribute: "cyclic_state_of_charge",
        required: 1.0,
        assumed: 0.0,
        reason: "only cyclic storage units are supported",
    },
];

const STORE_RESTRICTIONS: &[Restriction] = &[
    ACTIVE_ONLY,
    LINEAR_COST_ONLY,
    Restriction {
        attribute: "sign",
        required: 1.0,
        assumed: 1.0,
        reason: "only stores with sign = 1 are supported",
    },
    Restriction {
        attribute: "e_cyclic",
        required: 1.0,
        assumed: 0.0,
        reason: "only cyclic stores are supported",
    },
];

static BUS_SCHEMA: ModelSchema = ModelSchema {
    kind: ComponentKind::Bus,
    model_id: "bus",
    params: BUS_PARAMS,
    ports: &[],
    restrictions: &[],
    capacity: None,
    control: &["carrier"],
};

static GENERATOR_SCHEMA: ModelSchema = ModelSchema {
    kind: ComponentKind::Generator,
    model_id: "generator",
    params: GENERATOR_PARAMS,
    ports: BALANCE_PORT,
    restrictions: GENERATOR_RESTRICTIONS,
    capacity: Some(CapacitySpec { extendable_attr: "p_nom_extendable", capacity_attr: "p_nom" }),
    control: &["carrier", "control", "p_nom", "p_nom_extendable"],
};

static LOAD_SCHEMA: ModelSchema = ModelSchema {
    kind: ComponentKind::Load,
    model_id: "load",
    params: LOAD_PARAMS,
    ports: BALANCE_PORT,
    restrictions: LOAD_RESTRICTIONS,
    capacity: None,
    control: &["carrier"],
};

static LINK_SCHEMA: ModelSchema = ModelSchema {
    kind: ComponentKind::Link,
    model_id: "link",
    params: LINK_PARAMS,
    ports: LINK_PORTS,
    restrictions: LINK_RESTRICTIONS,
    capacity: Some(CapacitySpec { extendable_attr: "p_nom_extendable", capacity_attr: "p_nom" }),
    control: &["carrier", "p_nom", "p_nom_extendable"],
};

static STORAGE_UNIT_SCHEMA: ModelSchema = ModelSchema {
    kind: ComponentKind::StorageUnit,
    model_id: "storage_unit",
    params: STORAGE_UNIT_PARAMS,
    ports: BALANCE_PORT,
    restrictions: STORAGE_UNIT_RESTRICTIONS,
    capacity: Some(CapacitySpec { extendable_attr: "p_nom_extendable", capacity_attr: "p_nom" }),
    control: &["carrier", "p_nom", "p_nom_extendable"],
};

static STORE_SCHEMA: ModelSchema = ModelSchema {
    kind: ComponentKind::Store,
    model_id: "store",
    params: STORE_PARAMS,
    ports: BALANCE_PORT,
    restrictions: STORE_RESTRICTIONS,
    capacity: Some(CapacitySpec { extendable_attr: "e_nom_extendable", capacity_attr: "e_nom" }),
    control: &["carrier", "e_nom", "e_nom_extendable"],
};

static SCHEMAS: Lazy<BTreeMap<ComponentKind, &'static ModelSchema>> = Lazy::new(|| {
    BTreeMap::from([
        (ComponentKind::Bus, &BUS_SCHEMA),
        (ComponentKind::Generator, &GENERATOR_SCHEMA),
        (ComponentKind::Load, &LOAD_SCHEMA),
        (ComponentKind::Link, &LINK_SCHEMA),
        (ComponentKind::StorageUnit, &STORAGE_UNIT_SCHEMA),
        (ComponentKind::Store, &STORE_SCHEMA),
    ])
});

/// Schema for a mapped component kind; `None` for kinds the converter does
/// not translate (lines, transformers).
pub fn schema_for(kind: ComponentKind) -> Option<&'static ModelSchema> {
    SCHEMAS.get(&kind).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mapped_kind_has_a_schema() {
        for kind in ComponentKind::MAPPED {
            let schema = schema_for(kind).unwrap();
            assert_eq!(schema.kind, kind);
            assert!(!schema.model_id.is_empty());
        }
        assert!(schema_for(ComponentKind::Line).is_none());
        assert!(schema_for(ComponentKind::Transformer).is_none());
    }

    #[test]
    fn param_sources_are_unique_per_kind() {
        for kind in ComponentKind::MAPPED {
            let schema = schema_for(kind).unwrap();
            let mut seen = std::collections::BTreeSet::new();
            for param in schema.params {
                assert!(seen.insert(param.source), "{kind}: duplicate {}", param.source);
            }
        }
    }

    #[test]
    fn ports_reference_bus_attributes() {
        let link = schema_for(ComponentKind::Link).unwrap();
        assert_eq!(link.ports.len(), 2);
        assert_eq!(link.ports[0].source, "bus0");
        assert_eq!(link.ports[1].source, "bus1");
        assert!(schema_for(ComponentKind::Bus).unwrap().ports.is_empty());
    }

    #[test]
    fn knows_covers_all_schema_attribute_roles() {
        let gen = schema_for(ComponentKind::Generator).unwrap();
        assert!(gen.knows("marginal_cost")); // parameter
        assert!(gen.knows("bus")); // port
        assert!(gen.knows("committable")); // restriction
        assert!(gen.knows("p_nom_extendable")); // control
        assert!(!gen.knows("paint_color"));
    }

    #[test]
    fn emitting_kinds_carry_emission_factor() {
        for kind in ComponentKind::EMITTING {
            let schema = schema_for(kind).unwrap();
            let spec = schema.param("co2_emissions").unwrap();
            assert_eq!(spec.target, "emission_factor");
        }
        assert!(schema_for(ComponentKind::Load).unwrap().param("co2_emissions").is_none());
    }
}
