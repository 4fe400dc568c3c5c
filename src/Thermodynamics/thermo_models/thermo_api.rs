use super::ConstCpData::ConstCpThermo;
use super::NASA7data::{NasaPoly1, NasaPoly2, parse_nasa7_input};
use crate::units::{GAS_CONSTANT, UnitError, UnitSystem};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use enum_dispatch::enum_dispatch;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThermoError {
    #[error("unsupported thermo model '{0}'")]
    UnsupportedModel(String),
    #[error("invalid coefficient data: {0}")]
    InvalidCoefficients(String),
    #[error("temperature {temperature} K is out of the valid range {range}")]
    OutOfRange { temperature: f64, range: String },
    #[error("failed to deserialize thermo data: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// standard-state thermodynamic properties of a single species.
/// Dimensionless forms are the primitives, dimensional ones (J/kmol based) are built on top of them
#[enum_dispatch]
pub trait SpeciesThermoCalculator {
    fn model_name(&self) -> &'static str;
    fn min_temp(&self) -> f64;
    fn max_temp(&self) -> f64;
    /// reference pressure of the standard state, Pa
    fn reference_pressure(&self) -> f64;
    fn cp_R(&self, T: f64) -> f64;
    fn h_RT(&self, T: f64) -> f64;
    fn s_R(&self, T: f64) -> f64;
    /// positional parameter array of the model
    fn coefficients(&self) -> Vec<f64>;
    /// add a constant dH (J/kmol) to the enthalpy at all temperatures
    fn shift_enthalpy(&mut self, dH: f64);
    /// check internal consistency of the parameterization
    fn validate(&self, name: &str) -> Result<(), ThermoError>;
    /// symbolic heat capacity, enthalpy and entropy (J/kmol based) of variable "T",
    /// for the temperature range containing T
    fn create_sym_Cp_dH_dS(&self, T: f64) -> (Expr, Expr, Expr);
    /// mechanism file representation in SI-kmol units
    fn to_serde(&self) -> Value;
}

#[derive(Debug, Clone, PartialEq)]
#[enum_dispatch(SpeciesThermoCalculator)]
pub enum SpeciesThermo {
    NasaPoly1(NasaPoly1),
    NasaPoly2(NasaPoly2),
    ConstCp(ConstCpThermo),
}

impl SpeciesThermo {
    /// takes the `thermo:` block of a species and creates the matching model
    pub fn from_serde(thermo: &Value, units: &UnitSystem) -> Result<Self, ThermoError> {
        let model = thermo
            .get("model")
            .and_then(Value::as_str)
            .ok_or_else(|| ThermoError::UnsupportedModel("<missing>".to_string()))?;
        match model {
            "NASA7" | "NASA" => {
                let (input, P_ref) = parse_nasa7_input(thermo, units)?;
                match input.temperature_ranges.len() {
                    2 => Ok(SpeciesThermo::NasaPoly1(NasaPoly1::from_input(&input, P_ref)?)),
                    3 => Ok(SpeciesThermo::NasaPoly2(NasaPoly2::from_input(&input, P_ref)?)),
                    n => Err(ThermoError::InvalidCoefficients(format!(
                        "NASA7 needs 2 or 3 temperature bounds, got {}",
                        n
                    ))),
                }
            }
            "constant-cp" => Ok(SpeciesThermo::ConstCp(ConstCpThermo::from_serde(thermo, units)?)),
            other => Err(ThermoError::UnsupportedModel(other.to_string())),
        }
    }
    /// heat capacity, J/kmol/K
    pub fn cp(&self, T: f64) -> f64 {
        self.cp_R(T) * GAS_CONSTANT
    }
    /// enthalpy, J/kmol
    pub fn h(&self, T: f64) -> f64 {
        self.h_RT(T) * GAS_CONSTANT * T
    }
    /// entropy, J/kmol/K
    pub fn s(&self, T: f64) -> f64 {
        self.s_R(T) * GAS_CONSTANT
    }
    /// Gibbs free energy, J/kmol
    pub fn g(&self, T: f64) -> f64 {
        (self.h_RT(T) - self.s_R(T)) * GAS_CONSTANT * T
    }
    /// the models evaluate outside their range by extrapolation; this is the explicit check
    pub fn check_temperature(&self, T: f64) -> Result<(), ThermoError> {
        if T < self.min_temp() || T > self.max_temp() {
            return Err(ThermoError::OutOfRange {
                temperature: T,
                range: format!("{} - {}", self.min_temp(), self.max_temp()),
            });
        }
        Ok(())
    }
    /// true if both are parameterized by the same kind of model
    pub fn same_model_type(&self, other: &SpeciesThermo) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
    /// create functions for heat capacity, enthalpy, and entropy
    #[allow(clippy::type_complexity)]
    pub fn create_closures_Cp_dH_dS(
        &self,
    ) -> (
        Box<dyn Fn(f64) -> f64>,
        Box<dyn Fn(f64) -> f64>,
        Box<dyn Fn(f64) -> f64>,
    ) {
        let (cp_model, h_model, s_model) = (self.clone(), self.clone(), self.clone());
        (
            Box::new(move |t| cp_model.cp(t)),
            Box::new(move |t| h_model.h(t)),
            Box::new(move |t| s_model.s(t)),
        )
    }
}
