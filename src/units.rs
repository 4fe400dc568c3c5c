//! # Units Module
//!
//! All quantities inside the crate live in one internal unit system (SI-kmol):
//! meters, seconds, kmol, Joules, Pascals and Kelvins. Energies per quantity are J/kmol.
//!
//! A mechanism file may declare its own units in a `units:` block, e.g.
//! ```yaml
//! units: {length: cm, time: s, quantity: mol, activation-energy: cal/mol}
//! ```
//! `UnitSystem` holds the conversion factor of each declared unit to the internal one
//! and converts rate coefficients, activation energies and dimensional strings
//! such as `"1 atm"` or `"9.22 kcal/mol"`.
use serde_json::Value;
use thiserror::Error;

/// universal gas constant, J/kmol/K
pub const GAS_CONSTANT: f64 = 8314.462618;
/// one standard atmosphere, Pa
pub const ONE_ATM: f64 = 101325.0;
/// Avogadro number, 1/kmol
pub const AVOGADRO: f64 = 6.02214076e26;
/// thermochemical calorie, J
pub const CAL: f64 = 4.184;
/// elementary charge, C
const ELECTRON_CHARGE: f64 = 1.602176634e-19;

#[derive(Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("unknown unit '{unit}' for {dimension}")]
    UnknownUnit { unit: String, dimension: String },
    #[error("unknown key '{0}' in units block")]
    UnknownKey(String),
    #[error("cannot parse quantity '{0}'")]
    InvalidQuantity(String),
}

/// kind of dimensional value expected by the caller; defines default units for bare numbers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityKind {
    Temperature,
    Pressure,
    ActivationEnergy,
    /// energy per quantity (enthalpy, Gibbs energy)
    MolarEnergy,
    /// energy per quantity per Kelvin (entropy, heat capacity)
    MolarEntropy,
}

/// conversion factors from the units of a mechanism file to the internal SI-kmol units
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSystem {
    /// m per length unit
    pub length: f64,
    /// kmol per quantity unit
    pub quantity: f64,
    /// s per time unit
    pub time: f64,
    /// J per energy unit
    pub energy: f64,
    /// Pa per pressure unit
    pub pressure: f64,
    /// J/kmol per activation-energy unit
    pub activation_energy: f64,
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self {
            length: 1.0,
            quantity: 1.0,
            time: 1.0,
            energy: 1.0,
            pressure: 1.0,
            activation_energy: 1.0,
        }
    }
}

fn length_factor(unit: &str) -> Result<f64, UnitError> {
    match unit {
        "m" => Ok(1.0),
        "cm" => Ok(0.01),
        "mm" => Ok(1e-3),
        "km" => Ok(1e3),
        "dm" => Ok(0.1),
        _ => Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
            dimension: "length".to_string(),
        }),
    }
}

fn quantity_factor(unit: &str) -> Result<f64, UnitError> {
    match unit {
        "kmol" => Ok(1.0),
        "mol" => Ok(1e-3),
        "molec" => Ok(1.0 / AVOGADRO),
        _ => Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
            dimension: "quantity".to_string(),
        }),
    }
}

fn time_factor(unit: &str) -> Result<f64, UnitError> {
    match unit {
        "s" => Ok(1.0),
        "ms" => Ok(1e-3),
        "us" => Ok(1e-6),
        "min" => Ok(60.0),
        "h" | "hr" => Ok(3600.0),
        _ => Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
            dimension: "time".to_string(),
        }),
    }
}

fn energy_factor(unit: &str) -> Result<f64, UnitError> {
    match unit {
        "J" => Ok(1.0),
        "kJ" => Ok(1e3),
        "MJ" => Ok(1e6),
        "cal" => Ok(CAL),
        "kcal" => Ok(1e3 * CAL),
        "eV" => Ok(ELECTRON_CHARGE),
        "erg" => Ok(1e-7),
        _ => Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
            dimension: "energy".to_string(),
        }),
    }
}

fn pressure_factor(unit: &str) -> Result<f64, UnitError> {
    match unit {
        "Pa" => Ok(1.0),
        "kPa" => Ok(1e3),
        "MPa" => Ok(1e6),
        "bar" => Ok(1e5),
        "atm" => Ok(ONE_ATM),
        "torr" | "Torr" => Ok(ONE_ATM / 760.0),
        "dyn/cm^2" => Ok(0.1),
        _ => Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
            dimension: "pressure".to_string(),
        }),
    }
}

/// energy per quantity: "cal/mol", "kJ/mol", "J/kmol" ... "K" (Ea/R) and "eV" (per molecule) are special cases
fn molar_energy_factor(unit: &str) -> Result<f64, UnitError> {
    match unit {
        "K" => return Ok(GAS_CONSTANT),
        "eV" => return Ok(ELECTRON_CHARGE * AVOGADRO),
        _ => {}
    }
    match unit.split_once('/') {
        Some((energy, quantity)) => Ok(energy_factor(energy.trim())? / quantity_factor(quantity.trim())?),
        None => Err(UnitError::UnknownUnit {
            unit: unit.to_string(),
            dimension: "activation-energy".to_string(),
        }),
    }
}

impl UnitSystem {
    pub fn new() -> Self {
        Self::default()
    }
    /// takes serde Value of `units:` block and parses it into structure
    pub fn from_serde(units: &Value) -> Result<Self, UnitError> {
        let mut system = UnitSystem::default();
        let mut activation_energy_given = false;
        let Some(map) = units.as_object() else {
            return Ok(system);
        };
        for (key, value) in map {
            let unit = value.as_str().unwrap_or_default().trim();
            match key.as_str() {
                "length" => system.length = length_factor(unit)?,
                "quantity" => system.quantity = quantity_factor(unit)?,
                "time" => system.time = time_factor(unit)?,
                "energy" => system.energy = energy_factor(unit)?,
                "pressure" => system.pressure = pressure_factor(unit)?,
                "activation-energy" => {
                    system.activation_energy = molar_energy_factor(unit)?;
                    activation_energy_given = true;
                }
                // temperature is always in Kelvins, mass only matters for non-gas phases
                "temperature" | "mass" => {}
                other => return Err(UnitError::UnknownKey(other.to_string())),
            }
        }
        if !activation_energy_given {
            system.activation_energy = system.energy / system.quantity;
        }
        Ok(system)
    }
    /// convert pre-exponential factor of a reaction with total order `order`
    /// A has units of concentration^(1-order)/time, concentration = quantity/length^3
    pub fn convert_rate_coeff(&self, A: f64, order: f64) -> f64 {
        let concentration = self.quantity / self.length.powi(3);
        A * concentration.powf(1.0 - order) / self.time
    }
    /// activation energy in J/kmol
    pub fn convert_activation_energy(&self, Ea: f64) -> f64 {
        Ea * self.activation_energy
    }
    /// energy per quantity in J/kmol
    pub fn convert_molar_energy(&self, value: f64) -> f64 {
        value * self.energy / self.quantity
    }
    pub fn convert_pressure(&self, P: f64) -> f64 {
        P * self.pressure
    }
    /// parse a value which is either a bare number in the default units of this system
    /// or a string "<number> <unit>"
    pub fn parse_quantity(&self, value: &Value, kind: QuantityKind) -> Result<f64, UnitError> {
        if let Some(number) = value.as_f64() {
            return Ok(match kind {
                QuantityKind::Temperature => number,
                QuantityKind::Pressure => self.convert_pressure(number),
                QuantityKind::ActivationEnergy => self.convert_activation_energy(number),
                QuantityKind::MolarEnergy | QuantityKind::MolarEntropy => {
                    self.convert_molar_energy(number)
                }
            });
        }
        let text = value
            .as_str()
            .ok_or_else(|| UnitError::InvalidQuantity(value.to_string()))?
            .trim();
        let (number, unit) = match text.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, unit.trim()),
            None => (text, ""),
        };
        let number: f64 = number
            .parse()
            .map_err(|_| UnitError::InvalidQuantity(text.to_string()))?;
        if unit.is_empty() {
            return self.parse_quantity(&Value::from(number), kind);
        }
        let factor = match kind {
            QuantityKind::Temperature => {
                if unit == "K" {
                    1.0
                } else {
                    return Err(UnitError::UnknownUnit {
                        unit: unit.to_string(),
                        dimension: "temperature".to_string(),
                    });
                }
            }
            QuantityKind::Pressure => pressure_factor(unit)?,
            QuantityKind::ActivationEnergy | QuantityKind::MolarEnergy => molar_energy_factor(unit)?,
            QuantityKind::MolarEntropy => {
                let unit = unit.strip_suffix("/K").unwrap_or(unit);
                molar_energy_factor(unit)?
            }
        };
        Ok(number * factor)
    }
}
