//! # Solution
//!
//! An ideal gas phase together with the kinetics of its reactions, built from a mechanism file.
//! This is the main entry point of the crate:
//! ```no_run
//! use KiGas::solution::Solution;
//! let mut gas = Solution::from_file("data/h2o2_small.yaml", None).unwrap();
//! gas.set_TP(1000.0, 101325.0).unwrap();
//! let kf = gas.forward_rate_constants().unwrap();
//! let (h_before, h_after) = gas.perturb_species_enthalpy("OH", 1e7).unwrap();
//! gas.pretty_print_reactions().unwrap();
//! ```
use crate::Kinetics::GasKinetics::{GasKinetics, KineticsError};
use crate::Kinetics::reaction::Reaction;
use crate::Thermodynamics::IdealGasPhase::{IdealGasPhase, PhaseError};
use crate::Thermodynamics::species::{Species, SpeciesError};
use crate::Thermodynamics::thermo_models::NASA7data::NasaPoly2;
use crate::Thermodynamics::thermo_models::thermo_api::{SpeciesThermo, SpeciesThermoCalculator, ThermoError};
use crate::Utils::load_from_file::{
    LoadError, load_mechanism_from_file, load_mechanism_from_str, validate_mechanism, write_mechanism_text,
};
use crate::library_manager::with_library_manager;
use crate::units::{GAS_CONSTANT, UnitError, UnitSystem};
use log::{info, warn};
use nalgebra::DVector;
use prettytable::{Table, row};
use serde_json::{Map, Value, json};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// temperature of the tabulated formation enthalpies, K
pub const T_STANDARD: f64 = 298.15;

#[derive(Debug, Error)]
pub enum SolutionError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Species(#[from] SpeciesError),
    #[error(transparent)]
    Thermo(#[from] ThermoError),
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error(transparent)]
    Kinetics(#[from] KineticsError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("phase '{name}' not found, available phases: {available:?}")]
    PhaseNotFound { name: String, available: Vec<String> },
    #[error("reaction section '{0}' not found")]
    SectionNotFound(String),
    #[error("species '{species}' is described by {model}, not by a two-range NASA polynomial")]
    NotNasaPolynomial { species: String, model: String },
    #[error("mechanism '{0}' not found in the data directories")]
    MechanismNotFound(String),
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub name: String,
    pub description: Option<String>,
    phase: IdealGasPhase,
    kinetics: GasKinetics,
}

/// reactions of a phase: the `reactions` field may be absent or "all" (the `reactions:` section),
/// "none", or a list of section names
fn reaction_entries(mech: &Value, phase_def: &Value) -> Result<Vec<Value>, SolutionError> {
    let section = |name: &str| -> Result<Vec<Value>, SolutionError> {
        match mech.get(name) {
            Some(Value::Array(list)) => Ok(list.clone()),
            Some(_) => Err(LoadError::Invalid(format!("'{}' must be a list", name)).into()),
            None => Err(SolutionError::SectionNotFound(name.to_string())),
        }
    };
    if phase_def.get("kinetics").is_none() && phase_def.get("reactions").is_none() {
        return Ok(Vec::new());
    }
    match phase_def.get("reactions") {
        None => Ok(mech
            .get("reactions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()),
        Some(Value::String(s)) if s == "all" => section("reactions"),
        Some(Value::String(s)) if s == "none" => Ok(Vec::new()),
        Some(Value::Array(names)) => {
            let mut entries = Vec::new();
            for name in names {
                let name = name.as_str().ok_or_else(|| {
                    LoadError::Invalid(format!("bad reaction section name {}", name))
                })?;
                entries.extend(section(name)?);
            }
            Ok(entries)
        }
        Some(other) => Err(LoadError::Invalid(format!("unsupported reactions field {}", other)).into()),
    }
}

impl Solution {
    ////////////////////////////////////CONSTRUCTION///////////////////////////////////////////
    /// builds the phase `phase_name` (the first phase if None) of a parsed mechanism
    pub fn from_value(mech: &Value, phase_name: Option<&str>) -> Result<Self, SolutionError> {
        validate_mechanism(mech)?;
        let units = match mech.get("units") {
            Some(block) => UnitSystem::from_serde(block)?,
            None => UnitSystem::default(),
        };
        let phases = mech
            .get("phases")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let phase_def = match phase_name {
            Some(name) => phases
                .iter()
                .find(|p| p.get("name").and_then(Value::as_str) == Some(name)),
            None => phases.first(),
        }
        .ok_or_else(|| SolutionError::PhaseNotFound {
            name: phase_name.unwrap_or("<first>").to_string(),
            available: phases
                .iter()
                .filter_map(|p| p.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
        })?;

        let species_pool = mech
            .get("species")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|s| Species::from_serde(s, &units))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();
        let phase = IdealGasPhase::from_serde(phase_def, &species_pool, &units)?;
        let entries = reaction_entries(mech, phase_def)?;
        let kinetics = GasKinetics::from_serde(&phase, &entries, &units)?;
        info!(
            "solution '{}': {} species, {} reactions",
            phase.name,
            phase.n_species(),
            kinetics.n_reactions()
        );
        Ok(Self {
            name: phase.name.clone(),
            description: mech
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            phase,
            kinetics,
        })
    }

    /// mechanism text (YAML or JSON)
    pub fn from_str(text: &str, phase_name: Option<&str>) -> Result<Self, SolutionError> {
        let mech = load_mechanism_from_str(text)?;
        Self::from_value(&mech, phase_name)
    }

    pub fn from_file<P: AsRef<Path>>(path: P, phase_name: Option<&str>) -> Result<Self, SolutionError> {
        let mech = load_mechanism_from_file(path.as_ref())?;
        Self::from_value(&mech, phase_name)
    }

    /// looks the mechanism up in the data directories of the library manager
    pub fn from_library(name: &str) -> Result<Self, SolutionError> {
        let path = with_library_manager(|manager| manager.find_mechanism(name))
            .ok_or_else(|| SolutionError::MechanismNotFound(name.to_string()))?;
        Self::from_file(path, None)
    }

    /// writes `text` to `path` and builds the solution from the written file
    pub fn from_text_via_file<P: AsRef<Path>>(
        text: &str,
        path: P,
        phase_name: Option<&str>,
    ) -> Result<Self, SolutionError> {
        write_mechanism_text(path.as_ref(), text)?;
        Self::from_file(path, phase_name)
    }

    ////////////////////////////////////ACCESS///////////////////////////////////////////
    pub fn phase(&self) -> &IdealGasPhase {
        &self.phase
    }
    /// kinetics caches follow the state number of the phase, so mutating the phase here is safe
    pub fn phase_mut(&mut self) -> &mut IdealGasPhase {
        &mut self.phase
    }
    pub fn kinetics(&self) -> &GasKinetics {
        &self.kinetics
    }
    pub fn n_species(&self) -> usize {
        self.phase.n_species()
    }
    pub fn species_names(&self) -> Vec<String> {
        self.phase.species_names()
    }
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.phase.species_index(name)
    }
    pub fn species(&self, k: usize) -> Result<&Species, SolutionError> {
        Ok(self.phase.species(k)?)
    }
    pub fn species_by_name(&self, name: &str) -> Result<&Species, SolutionError> {
        Ok(self.phase.species_by_name(name)?)
    }
    pub fn n_reactions(&self) -> usize {
        self.kinetics.n_reactions()
    }
    pub fn reaction(&self, i: usize) -> Result<&Reaction, SolutionError> {
        Ok(self.kinetics.reaction(i)?)
    }
    pub fn reactions(&self) -> &[Reaction] {
        self.kinetics.reactions()
    }
    pub fn reaction_equations(&self) -> Vec<String> {
        self.kinetics.reaction_equations()
    }

    ////////////////////////////////////STATE///////////////////////////////////////////
    pub fn temperature(&self) -> f64 {
        self.phase.temperature()
    }
    pub fn pressure(&self) -> f64 {
        self.phase.pressure()
    }
    pub fn set_TP(&mut self, T: f64, P: f64) -> Result<(), SolutionError> {
        Ok(self.phase.set_TP(T, P)?)
    }
    /// on error the state is left as it was
    pub fn set_TPX(&mut self, T: f64, P: f64, X: &str) -> Result<(), SolutionError> {
        Ok(self.phase.set_TPX_by_name(T, P, X)?)
    }
    pub fn mole_fractions(&self) -> &DVector<f64> {
        self.phase.mole_fractions()
    }
    /// enthalpy of one species at temperature T, J/kmol
    pub fn species_enthalpy(&self, name: &str, T: f64) -> Result<f64, SolutionError> {
        Ok(self.phase.species_by_name(name)?.thermo.h(T))
    }

    ////////////////////////////////////MODIFICATION///////////////////////////////////////////
    pub fn modify_species(&mut self, k: usize, species: Species) -> Result<(), SolutionError> {
        Ok(self.phase.modify_species(k, species)?)
    }
    pub fn modify_reaction(&mut self, i: usize, reaction: Reaction) -> Result<(), SolutionError> {
        Ok(self.kinetics.modify_reaction(i, reaction)?)
    }

    /// Adds `dH` (J/kmol) to the enthalpy of a species described by a two-range NASA polynomial,
    /// by editing the positional coefficient array: dH/R is added to the a5 coefficients of both
    /// ranges (positions 6 and 13). Returns the enthalpy at 298.15 K before and after.
    pub fn perturb_species_enthalpy(&mut self, name: &str, dH: f64) -> Result<(f64, f64), SolutionError> {
        let k = self
            .phase
            .species_index(name)
            .ok_or_else(|| PhaseError::UnknownSpecies(name.to_string()))?;
        let mut species = self.phase.species(k)?.clone();
        let SpeciesThermo::NasaPoly2(nasa) = &species.thermo else {
            return Err(SolutionError::NotNasaPolynomial {
                species: name.to_string(),
                model: species.thermo.model_name().to_string(),
            });
        };
        let h_before = species.thermo.h(T_STANDARD);
        let mut coeffs = nasa.coefficients();
        coeffs[6] += dH / GAS_CONSTANT;
        coeffs[13] += dH / GAS_CONSTANT;
        let perturbed = NasaPoly2::from_coeffs(nasa.T_min, nasa.T_max, nasa.P_ref, &coeffs)?;
        species.thermo = SpeciesThermo::NasaPoly2(perturbed);
        let h_after = species.thermo.h(T_STANDARD);
        self.phase.modify_species(k, species)?;
        info!(
            "enthalpy of '{}' at {} K changed from {:.6e} to {:.6e} J/kmol",
            name, T_STANDARD, h_before, h_after
        );
        Ok((h_before, h_after))
    }

    /// Adds `dH` (J/kmol) to the enthalpy of a species with any thermo model
    pub fn shift_species_enthalpy(&mut self, name: &str, dH: f64) -> Result<(f64, f64), SolutionError> {
        let k = self
            .phase
            .species_index(name)
            .ok_or_else(|| PhaseError::UnknownSpecies(name.to_string()))?;
        let mut species = self.phase.species(k)?.clone();
        let h_before = species.thermo.h(T_STANDARD);
        species.thermo.shift_enthalpy(dH);
        let h_after = species.thermo.h(T_STANDARD);
        self.phase.modify_species(k, species)?;
        Ok((h_before, h_after))
    }

    ////////////////////////////////////KINETICS///////////////////////////////////////////
    pub fn forward_rate_constants(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.forward_rate_constants(&self.phase)?)
    }
    pub fn reverse_rate_constants(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.reverse_rate_constants(&self.phase)?)
    }
    pub fn equilibrium_constants(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.equilibrium_constants(&self.phase)?)
    }
    pub fn forward_rates_of_progress(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.forward_rates_of_progress(&self.phase)?)
    }
    pub fn reverse_rates_of_progress(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.reverse_rates_of_progress(&self.phase)?)
    }
    pub fn net_rates_of_progress(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.net_rates_of_progress(&self.phase)?)
    }
    pub fn creation_rates(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.creation_rates(&self.phase)?)
    }
    pub fn destruction_rates(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.destruction_rates(&self.phase)?)
    }
    pub fn net_production_rates(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.net_production_rates(&self.phase)?)
    }
    pub fn delta_enthalpy(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.delta_enthalpy(&self.phase)?)
    }
    pub fn delta_entropy(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.delta_entropy(&self.phase)?)
    }
    pub fn delta_gibbs(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.delta_gibbs(&self.phase)?)
    }
    pub fn delta_standard_enthalpy(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.delta_standard_enthalpy(&self.phase)?)
    }
    pub fn delta_standard_entropy(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.delta_standard_entropy(&self.phase)?)
    }
    pub fn delta_standard_gibbs(&self) -> Result<DVector<f64>, SolutionError> {
        Ok(self.kinetics.delta_standard_gibbs(&self.phase)?)
    }

    /// forward rate constants at every temperature of `temperatures` (pressure and composition
    /// stay as they are); the initial temperature is restored afterwards
    pub fn rate_constants_vs_temperature(
        &mut self,
        temperatures: &[f64],
    ) -> Result<Vec<(f64, DVector<f64>)>, SolutionError> {
        let T0 = self.phase.temperature();
        let mut sweep = Vec::with_capacity(temperatures.len());
        for &T in temperatures {
            let kf = self
                .phase
                .set_temperature(T)
                .map_err(SolutionError::from)
                .and_then(|_| self.forward_rate_constants());
            match kf {
                Ok(kf) => sweep.push((T, kf)),
                Err(e) => {
                    self.phase.set_temperature(T0)?;
                    return Err(e);
                }
            }
        }
        self.phase.set_temperature(T0)?;
        Ok(sweep)
    }

    /// factor converting a rate constant of the given order from m, kmol to cm, mol units
    pub fn cgs_factor(order: f64) -> f64 {
        1e3f64.powf(order - 1.0)
    }

    ////////////////////////////////////OUTPUT///////////////////////////////////////////
    /// current mechanism (with all modifications) in SI-kmol units, in the schema it was read from
    pub fn to_mechanism_value(&self) -> Value {
        let phase = &self.phase;
        let mut X = Map::new();
        for (k, name) in phase.species_names().iter().enumerate() {
            let x = phase.mole_fractions()[k];
            if x > 0.0 {
                X.insert(name.clone(), json!(x));
            }
        }
        let mut mech = Map::new();
        if let Some(description) = &self.description {
            mech.insert("description".to_string(), json!(description));
        }
        mech.insert(
            "units".to_string(),
            json!({"length": "m", "time": "s", "quantity": "kmol", "energy": "J",
                   "activation-energy": "J/kmol", "pressure": "Pa"}),
        );
        mech.insert(
            "phases".to_string(),
            json!([{
                "name": phase.name,
                "thermo": "ideal-gas",
                "elements": phase.elements(),
                "species": phase.species_names(),
                "kinetics": "gas",
                "reactions": "all",
                "state": {"T": phase.temperature(), "P": phase.pressure(), "X": X},
            }]),
        );
        mech.insert(
            "species".to_string(),
            Value::Array(phase.all_species().iter().map(Species::to_serde).collect()),
        );
        mech.insert(
            "reactions".to_string(),
            Value::Array(self.reactions().iter().map(Reaction::to_serde).collect()),
        );
        Value::Object(mech)
    }

    /// saves the current mechanism as JSON, which reloads through `from_file`
    pub fn save_mechanism<P: AsRef<Path>>(&self, path: P) -> Result<(), SolutionError> {
        let text = serde_json::to_string_pretty(&self.to_mechanism_value())?;
        write_mechanism_text(path.as_ref(), &text)?;
        Ok(())
    }

    /// species with their enthalpy at 298.15 K and properties at the current temperature
    pub fn species_table(&self) -> Table {
        let T = self.temperature();
        let mut table = Table::new();
        table.add_row(row![
            "Species",
            "Composition",
            "M, kg/kmol",
            "H(298.15), J/kmol",
            format!("H({}), J/kmol", T),
            format!("Cp({}), J/kmol/K", T),
            format!("S({}), J/kmol/K", T),
            "X"
        ]);
        for (k, sp) in self.phase.all_species().iter().enumerate() {
            let composition: Vec<String> = sp
                .composition
                .iter()
                .map(|(el, n)| format!("{}:{}", el, n))
                .collect();
            table.add_row(row![
                sp.name,
                composition.join(" "),
                format!("{:.4}", sp.molecular_weight),
                format!("{:.6e}", sp.thermo.h(T_STANDARD)),
                format!("{:.6e}", sp.thermo.h(T)),
                format!("{:.4e}", sp.thermo.cp(T)),
                format!("{:.4e}", sp.thermo.s(T)),
                format!("{:.4}", self.phase.mole_fractions()[k])
            ]);
        }
        table
    }

    /// forward rate constants at the current state in SI units and in cm, mol units
    pub fn reactions_table(&self) -> Result<Table, SolutionError> {
        let kf = self.forward_rate_constants()?;
        let mut table = Table::new();
        table.add_row(row![
            "#",
            "Equation",
            "Type",
            "kf, m-kmol-s",
            "kf, cm-mol-s"
        ]);
        for (i, reaction) in self.reactions().iter().enumerate() {
            let factor = Self::cgs_factor(reaction.rate_constant_order());
            table.add_row(row![
                i,
                reaction.equation,
                reaction.reaction_type().name(),
                format!("{:.6e}", kf[i]),
                format!("{:.6e}", kf[i] * factor)
            ]);
        }
        Ok(table)
    }

    pub fn pretty_print_species(&self) {
        println!("\nSpecies of '{}' at T = {} K", self.name, self.temperature());
        self.species_table().printstd();
    }

    pub fn pretty_print_reactions(&self) -> Result<(), SolutionError> {
        let table = self.reactions_table()?;
        println!(
            "\nReactions of '{}' at T = {} K, P = {} Pa",
            self.name,
            self.temperature(),
            self.pressure()
        );
        table.printstd();
        if self.n_reactions() == 0 {
            warn!("solution '{}' has no reactions", self.name);
        }
        Ok(())
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} species, {} reactions, T = {} K, P = {} Pa",
            self.name,
            self.n_species(),
            self.n_reactions(),
            self.temperature(),
            self.pressure()
        )?;
        for reaction in self.reactions() {
            writeln!(f, "  {}", reaction)?;
        }
        Ok(())
    }
}
