//! # Ideal gas phase
//!
//! Holds the species of a gas mixture together with its thermodynamic state (T, P, mole fractions).
//! Standard-state properties of all species are kept in a cache which is rebuilt every time the
//! temperature changes or a species is replaced, so all properties read after `modify_species`
//! already reflect the new species data.
//!
//! Every change of state or of species data draws a new `state_number()` from a process-wide
//! counter, so two phases share a state number only if one is an unchanged clone of the other.
//! Objects depending on the phase (the kinetics manager) use it to decide whether their own
//! caches are stale.
use crate::Kinetics::molmass::create_elem_composition_matrix;
use crate::Thermodynamics::species::Species;
use crate::Thermodynamics::thermo_models::thermo_api::SpeciesThermoCalculator;
use crate::units::{GAS_CONSTANT, ONE_ATM, QuantityKind, UnitError, UnitSystem};
use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// mole fractions are clipped at this value inside logarithms
const SMALL_NUMBER: f64 = 1e-300;

static STATE_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_state_number() -> u64 {
    STATE_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("temperature must be positive, got {0}")]
    InvalidTemperature(f64),
    #[error("pressure must be positive, got {0}")]
    InvalidPressure(f64),
    #[error("invalid composition: {0}")]
    InvalidComposition(String),
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("species index {index} is out of range, phase has {n_species} species")]
    IndexOutOfRange { index: usize, n_species: usize },
    #[error("species '{species}' contains element '{element}' which is not declared in the phase")]
    UndeclaredElement { species: String, element: String },
    #[error("species '{0}' is defined more than once")]
    DuplicateSpecies(String),
    #[error("cannot replace species {index}: {reason}")]
    IncompatibleSpecies { index: usize, reason: String },
    #[error("invalid phase definition: {0}")]
    InvalidDefinition(String),
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// standard-state properties of all species at the temperature `T`
#[derive(Debug, Clone)]
struct StandardStateCache {
    T: f64,
    cp_R: DVector<f64>,
    h_RT: DVector<f64>,
    s_R: DVector<f64>,
}

#[derive(Debug, Clone)]
pub struct IdealGasPhase {
    pub name: String,
    elements: Vec<String>,
    species: Vec<Species>,
    species_map: HashMap<String, usize>,
    molecular_weights: DVector<f64>,
    T: f64,
    P: f64,
    X: DVector<f64>,
    /// reference pressure of the standard state, Pa
    P_ref: f64,
    cache: StandardStateCache,
    state_number: u64,
}

impl IdealGasPhase {
    /// creates phase at T = 300 K, P = 1 atm with the whole mixture made of the first species
    pub fn new(name: &str, elements: Vec<String>, species: Vec<Species>) -> Result<Self, PhaseError> {
        let mut species_map = HashMap::new();
        for (k, sp) in species.iter().enumerate() {
            if species_map.insert(sp.name.clone(), k).is_some() {
                return Err(PhaseError::DuplicateSpecies(sp.name.clone()));
            }
            if let Some(element) = sp.composition.keys().find(|el| !elements.contains(*el)) {
                return Err(PhaseError::UndeclaredElement {
                    species: sp.name.clone(),
                    element: element.clone(),
                });
            }
        }
        let n = species.len();
        let molecular_weights = DVector::from_iterator(n, species.iter().map(|s| s.molecular_weight));
        let P_ref = species
            .first()
            .map(|s| s.thermo.reference_pressure())
            .unwrap_or(ONE_ATM);
        let mut X = DVector::zeros(n);
        if n > 0 {
            X[0] = 1.0;
        }
        let mut phase = Self {
            name: name.to_string(),
            elements,
            species,
            species_map,
            molecular_weights,
            T: 300.0,
            P: ONE_ATM,
            X,
            P_ref,
            cache: StandardStateCache {
                T: 0.0,
                cp_R: DVector::zeros(n),
                h_RT: DVector::zeros(n),
                s_R: DVector::zeros(n),
            },
            state_number: next_state_number(),
        };
        phase.update_standard_state();
        Ok(phase)
    }

    /// builds a phase from an entry of the `phases:` list. `species_pool` holds all species of the
    /// mechanism, the phase takes the ones named in its `species:` field (or all of them).
    pub fn from_serde(
        phase_def: &Value,
        species_pool: &[Species],
        units: &UnitSystem,
    ) -> Result<Self, PhaseError> {
        let name = phase_def
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| PhaseError::InvalidDefinition("phase without name".to_string()))?;
        if let Some(thermo) = phase_def.get("thermo").and_then(Value::as_str) {
            if thermo != "ideal-gas" {
                return Err(PhaseError::InvalidDefinition(format!(
                    "phase '{}' has thermo model '{}', only ideal-gas is supported",
                    name, thermo
                )));
            }
        }
        let species: Vec<Species> = match phase_def.get("species") {
            None => species_pool.to_vec(),
            Some(Value::String(all)) if all == "all" => species_pool.to_vec(),
            Some(Value::Array(names)) => {
                let mut selected = Vec::with_capacity(names.len());
                for entry in names {
                    let species_name = entry.as_str().ok_or_else(|| {
                        PhaseError::InvalidDefinition(format!("bad species entry {}", entry))
                    })?;
                    let sp = species_pool
                        .iter()
                        .find(|s| s.name == species_name)
                        .ok_or_else(|| PhaseError::UnknownSpecies(species_name.to_string()))?;
                    selected.push(sp.clone());
                }
                selected
            }
            Some(other) => {
                return Err(PhaseError::InvalidDefinition(format!(
                    "unsupported species field {}",
                    other
                )));
            }
        };
        let elements: Vec<String> = match phase_def.get("elements").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => {
                // elements in order of first appearance
                let mut elements: Vec<String> = Vec::new();
                for sp in &species {
                    for el in sp.composition.keys() {
                        if !elements.contains(el) {
                            elements.push(el.clone());
                        }
                    }
                }
                elements
            }
        };
        let mut phase = IdealGasPhase::new(name, elements, species)?;
        if let Some(state) = phase_def.get("state") {
            phase.set_state_from_serde(state, units)?;
        }
        info!(
            "created ideal gas phase '{}' with {} species: {:?}",
            phase.name,
            phase.n_species(),
            phase.species_names()
        );
        Ok(phase)
    }

    /// reads the `state: {T, P, X or Y}` block
    fn set_state_from_serde(&mut self, state: &Value, units: &UnitSystem) -> Result<(), PhaseError> {
        let T = match state.get("T") {
            Some(t) => units.parse_quantity(t, QuantityKind::Temperature)?,
            None => self.T,
        };
        let P = match state.get("P") {
            Some(p) => units.parse_quantity(p, QuantityKind::Pressure)?,
            None => self.P,
        };
        self.set_TP(T, P)?;
        if let Some(X) = state.get("X") {
            let X = self.fractions_from_serde(X)?;
            self.set_mole_fractions(X.as_slice())?;
        } else if let Some(Y) = state.get("Y") {
            let Y = self.fractions_from_serde(Y)?;
            self.set_mass_fractions(Y.as_slice())?;
        }
        Ok(())
    }

    /// composition given either as "H2:1, O2:0.5" or as a map {H2: 1, O2: 0.5}
    fn fractions_from_serde(&self, value: &Value) -> Result<DVector<f64>, PhaseError> {
        match value {
            Value::String(text) => self.fractions_from_str(text),
            Value::Object(map) => {
                let mut fractions = DVector::zeros(self.n_species());
                for (name, amount) in map {
                    let k = self
                        .species_index(name)
                        .ok_or_else(|| PhaseError::UnknownSpecies(name.clone()))?;
                    fractions[k] = amount.as_f64().ok_or_else(|| {
                        PhaseError::InvalidComposition(format!("{}: {}", name, amount))
                    })?;
                }
                Ok(fractions)
            }
            other => Err(PhaseError::InvalidComposition(other.to_string())),
        }
    }

    fn fractions_from_str(&self, text: &str) -> Result<DVector<f64>, PhaseError> {
        let mut fractions = DVector::zeros(self.n_species());
        for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, amount) = item
                .split_once(':')
                .ok_or_else(|| PhaseError::InvalidComposition(item.to_string()))?;
            let name = name.trim();
            let k = self
                .species_index(name)
                .ok_or_else(|| PhaseError::UnknownSpecies(name.to_string()))?;
            fractions[k] = amount
                .trim()
                .parse::<f64>()
                .map_err(|_| PhaseError::InvalidComposition(item.to_string()))?;
        }
        Ok(fractions)
    }

    ////////////////////////////////////SPECIES///////////////////////////////////////////
    pub fn n_species(&self) -> usize {
        self.species.len()
    }
    pub fn species_names(&self) -> Vec<String> {
        self.species.iter().map(|s| s.name.clone()).collect()
    }
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species_map.get(name).copied()
    }
    pub fn species(&self, k: usize) -> Result<&Species, PhaseError> {
        self.species.get(k).ok_or(PhaseError::IndexOutOfRange {
            index: k,
            n_species: self.species.len(),
        })
    }
    pub fn species_by_name(&self, name: &str) -> Result<&Species, PhaseError> {
        let k = self
            .species_index(name)
            .ok_or_else(|| PhaseError::UnknownSpecies(name.to_string()))?;
        self.species(k)
    }
    pub fn all_species(&self) -> &[Species] {
        &self.species
    }
    pub fn elements(&self) -> &[String] {
        &self.elements
    }
    pub fn molecular_weights(&self) -> &DVector<f64> {
        &self.molecular_weights
    }
    /// number of atoms of each element (rows) in each species (columns)
    pub fn element_matrix(&self) -> DMatrix<f64> {
        let compositions: Vec<&BTreeMap<String, f64>> =
            self.species.iter().map(|s| &s.composition).collect();
        create_elem_composition_matrix(&compositions, &self.elements)
    }
    /// moles of each element per mole of mixture
    pub fn element_moles(&self) -> DVector<f64> {
        self.element_matrix() * &self.X
    }

    /// replaces the data of species `k`. The new species must keep the name, the composition
    /// and the kind of thermo model of the old one.
    pub fn modify_species(&mut self, k: usize, species: Species) -> Result<(), PhaseError> {
        let old = self.species(k)?;
        let incompatible = |reason: String| PhaseError::IncompatibleSpecies { index: k, reason };
        if old.name != species.name {
            return Err(incompatible(format!(
                "name '{}' differs from '{}'",
                species.name, old.name
            )));
        }
        if old.composition != species.composition {
            return Err(incompatible(format!(
                "composition of '{}' changed from {:?} to {:?}",
                old.name, old.composition, species.composition
            )));
        }
        if !old.thermo.same_model_type(&species.thermo) {
            return Err(incompatible(format!(
                "thermo model of '{}' changed type",
                old.name
            )));
        }
        info!("species '{}' modified", species.name);
        self.species[k] = species;
        self.update_standard_state();
        self.state_number = next_state_number();
        Ok(())
    }

    ////////////////////////////////////STATE///////////////////////////////////////////
    pub fn temperature(&self) -> f64 {
        self.T
    }
    pub fn pressure(&self) -> f64 {
        self.P
    }
    pub fn reference_pressure(&self) -> f64 {
        self.P_ref
    }
    /// identifies the current state and species data; changes on every mutation
    pub fn state_number(&self) -> u64 {
        self.state_number
    }
    pub fn set_temperature(&mut self, T: f64) -> Result<(), PhaseError> {
        if !(T > 0.0 && T.is_finite()) {
            return Err(PhaseError::InvalidTemperature(T));
        }
        self.T = T;
        self.update_standard_state();
        self.state_number = next_state_number();
        Ok(())
    }
    pub fn set_pressure(&mut self, P: f64) -> Result<(), PhaseError> {
        if !(P > 0.0 && P.is_finite()) {
            return Err(PhaseError::InvalidPressure(P));
        }
        self.P = P;
        self.state_number = next_state_number();
        Ok(())
    }
    pub fn set_TP(&mut self, T: f64, P: f64) -> Result<(), PhaseError> {
        if !(P > 0.0 && P.is_finite()) {
            return Err(PhaseError::InvalidPressure(P));
        }
        self.set_temperature(T)?;
        self.P = P;
        Ok(())
    }
    /// all three are validated before any of them is set
    pub fn set_TPX(&mut self, T: f64, P: f64, X: &[f64]) -> Result<(), PhaseError> {
        let X = self.normalized(X)?;
        if !(T > 0.0 && T.is_finite()) {
            return Err(PhaseError::InvalidTemperature(T));
        }
        self.set_TP(T, P)?;
        self.X = X;
        Ok(())
    }
    /// like `set_TPX` with the composition given as "H2:1, O2:0.5"
    pub fn set_TPX_by_name(&mut self, T: f64, P: f64, composition: &str) -> Result<(), PhaseError> {
        let X = self.fractions_from_str(composition)?;
        self.set_TPX(T, P, X.as_slice())
    }

    fn normalized(&self, fractions: &[f64]) -> Result<DVector<f64>, PhaseError> {
        if fractions.len() != self.n_species() {
            return Err(PhaseError::InvalidComposition(format!(
                "expected {} values, got {}",
                self.n_species(),
                fractions.len()
            )));
        }
        if let Some(bad) = fractions.iter().find(|x| !(**x >= 0.0 && x.is_finite())) {
            return Err(PhaseError::InvalidComposition(format!(
                "fractions must be non-negative, got {}",
                bad
            )));
        }
        let sum: f64 = fractions.iter().sum();
        if sum <= 0.0 {
            return Err(PhaseError::InvalidComposition(
                "sum of fractions is zero".to_string(),
            ));
        }
        if (sum - 1.0).abs() > 1e-8 {
            debug!("normalizing fractions of phase '{}' (sum = {})", self.name, sum);
        }
        Ok(DVector::from_iterator(
            fractions.len(),
            fractions.iter().map(|x| x / sum),
        ))
    }

    pub fn set_mole_fractions(&mut self, X: &[f64]) -> Result<(), PhaseError> {
        self.X = self.normalized(X)?;
        self.state_number = next_state_number();
        Ok(())
    }
    /// e.g. "H2:1, O2:0.5"; species not mentioned get zero
    pub fn set_mole_fractions_by_name(&mut self, composition: &str) -> Result<(), PhaseError> {
        let X = self.fractions_from_str(composition)?;
        self.set_mole_fractions(X.as_slice())
    }
    pub fn set_mass_fractions(&mut self, Y: &[f64]) -> Result<(), PhaseError> {
        let Y = self.normalized(Y)?;
        let moles = Y.component_div(&self.molecular_weights);
        self.X = self.normalized(moles.as_slice())?;
        self.state_number = next_state_number();
        Ok(())
    }
    pub fn mole_fractions(&self) -> &DVector<f64> {
        &self.X
    }
    pub fn mole_fraction(&self, name: &str) -> Result<f64, PhaseError> {
        let k = self
            .species_index(name)
            .ok_or_else(|| PhaseError::UnknownSpecies(name.to_string()))?;
        Ok(self.X[k])
    }
    pub fn mass_fractions(&self) -> DVector<f64> {
        self.X.component_mul(&self.molecular_weights) / self.mean_molecular_weight()
    }
    /// kg/kmol
    pub fn mean_molecular_weight(&self) -> f64 {
        self.X.dot(&self.molecular_weights)
    }
    /// kmol/m3
    pub fn molar_density(&self) -> f64 {
        self.P / (GAS_CONSTANT * self.T)
    }
    /// kg/m3
    pub fn density(&self) -> f64 {
        self.molar_density() * self.mean_molecular_weight()
    }
    /// kmol/m3
    pub fn concentrations(&self) -> DVector<f64> {
        &self.X * self.molar_density()
    }

    ////////////////////////////////////STANDARD STATE///////////////////////////////////////////
    fn update_standard_state(&mut self) {
        let T = self.T;
        for (k, sp) in self.species.iter().enumerate() {
            if sp.thermo.check_temperature(T).is_err() {
                warn!(
                    "T = {} K is outside the range of species '{}' ({} - {} K), extrapolating",
                    T,
                    sp.name,
                    sp.thermo.min_temp(),
                    sp.thermo.max_temp()
                );
            }
            self.cache.cp_R[k] = sp.thermo.cp_R(T);
            self.cache.h_RT[k] = sp.thermo.h_RT(T);
            self.cache.s_R[k] = sp.thermo.s_R(T);
        }
        self.cache.T = T;
        debug!("standard state of phase '{}' updated at T = {}", self.name, T);
    }
    pub fn standard_cp_R(&self) -> &DVector<f64> {
        &self.cache.cp_R
    }
    pub fn standard_enthalpies_RT(&self) -> &DVector<f64> {
        &self.cache.h_RT
    }
    pub fn standard_entropies_R(&self) -> &DVector<f64> {
        &self.cache.s_R
    }
    pub fn standard_gibbs_RT(&self) -> DVector<f64> {
        &self.cache.h_RT - &self.cache.s_R
    }

    ////////////////////////////////////PARTIAL MOLAR///////////////////////////////////////////
    /// J/kmol
    pub fn partial_molar_enthalpies(&self) -> DVector<f64> {
        &self.cache.h_RT * (GAS_CONSTANT * self.T)
    }
    /// J/kmol/K
    pub fn partial_molar_entropies(&self) -> DVector<f64> {
        let pressure_ratio = self.P / self.P_ref;
        DVector::from_iterator(
            self.n_species(),
            self.cache
                .s_R
                .iter()
                .zip(self.X.iter())
                .map(|(s, x)| GAS_CONSTANT * (s - (x.max(SMALL_NUMBER) * pressure_ratio).ln())),
        )
    }
    /// J/kmol
    pub fn partial_molar_gibbs(&self) -> DVector<f64> {
        self.partial_molar_enthalpies() - self.partial_molar_entropies() * self.T
    }
    /// J/kmol/K
    pub fn partial_molar_cp(&self) -> DVector<f64> {
        &self.cache.cp_R * GAS_CONSTANT
    }

    ////////////////////////////////////MIXTURE///////////////////////////////////////////
    /// J/kmol
    pub fn enthalpy_mole(&self) -> f64 {
        self.X.dot(&self.partial_molar_enthalpies())
    }
    /// J/kmol/K
    pub fn entropy_mole(&self) -> f64 {
        self.X.dot(&self.partial_molar_entropies())
    }
    /// J/kmol
    pub fn gibbs_mole(&self) -> f64 {
        self.enthalpy_mole() - self.T * self.entropy_mole()
    }
    /// J/kmol/K
    pub fn cp_mole(&self) -> f64 {
        self.X.dot(&self.cache.cp_R) * GAS_CONSTANT
    }
    /// J/kmol/K
    pub fn cv_mole(&self) -> f64 {
        self.cp_mole() - GAS_CONSTANT
    }
    /// J/kg
    pub fn enthalpy_mass(&self) -> f64 {
        self.enthalpy_mole() / self.mean_molecular_weight()
    }
    /// J/kg/K
    pub fn entropy_mass(&self) -> f64 {
        self.entropy_mole() / self.mean_molecular_weight()
    }
    /// J/kg
    pub fn gibbs_mass(&self) -> f64 {
        self.gibbs_mole() / self.mean_molecular_weight()
    }
    /// J/kg/K
    pub fn cp_mass(&self) -> f64 {
        self.cp_mole() / self.mean_molecular_weight()
    }
    /// J/kg/K
    pub fn cv_mass(&self) -> f64 {
        self.cv_mole() / self.mean_molecular_weight()
    }
}
