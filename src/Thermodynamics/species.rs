//! Species definition: name, element composition, thermodynamic model and
//! (stored only) gas transport parameters
use crate::Kinetics::molmass::molar_mass_of_composition;
use crate::Thermodynamics::thermo_models::thermo_api::{SpeciesThermo, SpeciesThermoCalculator, ThermoError};
use crate::units::UnitSystem;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeciesError {
    #[error("species block has no name")]
    MissingName,
    #[error("species '{name}': {source}")]
    Thermo {
        name: String,
        #[source]
        source: ThermoError,
    },
    #[error("species '{name}': {message}")]
    InvalidData { name: String, message: String },
}

/// Lennard-Jones and related parameters of the `transport:` block
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GasTransportData {
    #[serde(default = "gas_model")]
    pub model: String,
    pub geometry: String,
    /// Angstrom-Kelvin units as written in mechanism files: well depth in K, diameter in Angstrom
    #[serde(default)]
    pub well_depth: f64,
    #[serde(default)]
    pub diameter: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub dipole: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub polarizability: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotational_relaxation: f64,
}

fn gas_model() -> String {
    "gas".to_string()
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub name: String,
    pub composition: BTreeMap<String, f64>,
    pub thermo: SpeciesThermo,
    pub transport: Option<GasTransportData>,
    pub note: Option<String>,
    /// kg/kmol
    pub molecular_weight: f64,
}

impl Species {
    pub fn new(
        name: &str,
        composition: BTreeMap<String, f64>,
        thermo: SpeciesThermo,
    ) -> Result<Self, SpeciesError> {
        let molecular_weight =
            molar_mass_of_composition(&composition).map_err(|message| SpeciesError::InvalidData {
                name: name.to_string(),
                message,
            })?;
        Ok(Self {
            name: name.to_string(),
            composition,
            thermo,
            transport: None,
            note: None,
            molecular_weight,
        })
    }

    /// takes serde Value of one entry of the `species:` list and parse it into structure
    pub fn from_serde(data: &Value, units: &UnitSystem) -> Result<Self, SpeciesError> {
        let name = data
            .get("name")
            .and_then(Value::as_str)
            .ok_or(SpeciesError::MissingName)?;
        let invalid = |message: String| SpeciesError::InvalidData {
            name: name.to_string(),
            message,
        };
        let composition: BTreeMap<String, f64> = match data.get("composition") {
            Some(c) => serde_json::from_value(c.clone()).map_err(|e| invalid(e.to_string()))?,
            None => return Err(invalid("missing composition".to_string())),
        };
        if composition.values().any(|n| *n < 0.0) {
            return Err(invalid("negative atom count in composition".to_string()));
        }
        let thermo_block = data
            .get("thermo")
            .ok_or_else(|| invalid("missing thermo block".to_string()))?;
        let thermo = SpeciesThermo::from_serde(thermo_block, units).map_err(|source| SpeciesError::Thermo {
            name: name.to_string(),
            source,
        })?;
        thermo.validate(name).map_err(|source| SpeciesError::Thermo {
            name: name.to_string(),
            source,
        })?;
        let mut species = Species::new(name, composition, thermo)?;
        if let Some(transport) = data.get("transport") {
            let transport: GasTransportData =
                serde_json::from_value(transport.clone()).map_err(|e| invalid(e.to_string()))?;
            species.transport = Some(transport);
        }
        species.note = thermo_block
            .get("note")
            .or_else(|| data.get("note"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(species)
    }

    /// species block in internal units
    pub fn to_serde(&self) -> Value {
        let mut block = Map::new();
        block.insert("name".to_string(), json!(self.name));
        block.insert("composition".to_string(), json!(self.composition));
        let mut thermo = self.thermo.to_serde();
        if let Some(note) = &self.note {
            thermo["note"] = json!(note);
        }
        block.insert("thermo".to_string(), thermo);
        if let Some(transport) = &self.transport {
            block.insert("transport".to_string(), json!(transport));
        }
        Value::Object(block)
    }

    /// number of atoms of `element` in the molecule
    pub fn n_atoms(&self, element: &str) -> f64 {
        self.composition.get(element).copied().unwrap_or(0.0)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let composition: Vec<String> = self
            .composition
            .iter()
            .map(|(el, n)| format!("{}: {}", el, n))
            .collect();
        write!(
            f,
            "<Species {}> {{{}}}, M = {:.4} kg/kmol, thermo: {}",
            self.name,
            composition.join(", "),
            self.molecular_weight,
            self.thermo.model_name()
        )
    }
}
