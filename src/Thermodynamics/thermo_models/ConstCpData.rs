use super::thermo_api::{SpeciesThermoCalculator, ThermoError};
use crate::units::{GAS_CONSTANT, ONE_ATM, QuantityKind, UnitSystem};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use serde::Deserialize;
use serde_json::{Value, json};

/// `model: constant-cp` block
#[derive(Debug, Deserialize, Clone)]
struct ConstCpInput {
    #[serde(rename = "T0", default)]
    T0: Option<Value>,
    #[serde(default)]
    h0: Option<Value>,
    #[serde(default)]
    s0: Option<Value>,
    #[serde(default)]
    cp0: Option<Value>,
    #[serde(rename = "T-min", default)]
    T_min: Option<Value>,
    #[serde(rename = "T-max", default)]
    T_max: Option<Value>,
    #[serde(rename = "reference-pressure", default)]
    reference_pressure: Option<Value>,
}

/// species with temperature independent heat capacity
/// h = h0 + cp0 (T - T0), s = s0 + cp0 ln(T/T0); all values in J/kmol units
#[derive(Debug, Clone, PartialEq)]
pub struct ConstCpThermo {
    pub T0: f64,
    pub h0: f64,
    pub s0: f64,
    pub cp0: f64,
    pub T_min: f64,
    pub T_max: f64,
    pub P_ref: f64,
}

impl ConstCpThermo {
    pub fn new(T0: f64, h0: f64, s0: f64, cp0: f64) -> Self {
        Self {
            T0,
            h0,
            s0,
            cp0,
            T_min: 0.0,
            T_max: f64::INFINITY,
            P_ref: ONE_ATM,
        }
    }

    pub fn from_serde(thermo: &Value, units: &UnitSystem) -> Result<Self, ThermoError> {
        let input: ConstCpInput = serde_json::from_value(thermo.clone())?;
        let parse = |value: &Option<Value>, kind: QuantityKind, default: f64| -> Result<f64, ThermoError> {
            match value {
                Some(v) => Ok(units.parse_quantity(v, kind)?),
                None => Ok(default),
            }
        };
        let mut model = Self::new(
            parse(&input.T0, QuantityKind::Temperature, 298.15)?,
            parse(&input.h0, QuantityKind::MolarEnergy, 0.0)?,
            parse(&input.s0, QuantityKind::MolarEntropy, 0.0)?,
            parse(&input.cp0, QuantityKind::MolarEntropy, 0.0)?,
        );
        model.T_min = parse(&input.T_min, QuantityKind::Temperature, 0.0)?;
        model.T_max = parse(&input.T_max, QuantityKind::Temperature, f64::INFINITY)?;
        model.P_ref = parse(&input.reference_pressure, QuantityKind::Pressure, ONE_ATM)?;
        if model.T0 <= 0.0 {
            return Err(ThermoError::InvalidCoefficients(format!(
                "constant-cp reference temperature must be positive, got {}",
                model.T0
            )));
        }
        Ok(model)
    }
}

impl SpeciesThermoCalculator for ConstCpThermo {
    fn model_name(&self) -> &'static str {
        "constant-cp"
    }
    fn min_temp(&self) -> f64 {
        self.T_min
    }
    fn max_temp(&self) -> f64 {
        self.T_max
    }
    fn reference_pressure(&self) -> f64 {
        self.P_ref
    }
    fn cp_R(&self, _T: f64) -> f64 {
        self.cp0 / GAS_CONSTANT
    }
    fn h_RT(&self, T: f64) -> f64 {
        (self.h0 + self.cp0 * (T - self.T0)) / (GAS_CONSTANT * T)
    }
    fn s_R(&self, T: f64) -> f64 {
        (self.s0 + self.cp0 * (T / self.T0).ln()) / GAS_CONSTANT
    }
    /// [T0, h0, s0, cp0]
    fn coefficients(&self) -> Vec<f64> {
        vec![self.T0, self.h0, self.s0, self.cp0]
    }
    fn shift_enthalpy(&mut self, dH: f64) {
        self.h0 += dH;
    }
    fn validate(&self, _name: &str) -> Result<(), ThermoError> {
        if self.T_min >= self.T_max {
            return Err(ThermoError::InvalidCoefficients(format!(
                "T-min {} must be below T-max {}",
                self.T_min, self.T_max
            )));
        }
        Ok(())
    }
    fn create_sym_Cp_dH_dS(&self, _T: f64) -> (Expr, Expr, Expr) {
        let t = Expr::Var("T".to_owned());
        let Cp = Expr::Const(self.cp0);
        let dh = Expr::Const(self.h0 - self.cp0 * self.T0) + Expr::Const(self.cp0) * t.clone();
        let ds = Expr::Const(self.s0 - self.cp0 * self.T0.ln()) + Expr::Const(self.cp0) * t.ln();
        (Cp, dh, ds)
    }
    fn to_serde(&self) -> Value {
        let mut block = json!({
            "model": "constant-cp",
            "T0": self.T0,
            "h0": self.h0,
            "s0": self.s0,
            "cp0": self.cp0,
            "T-min": self.T_min,
            "reference-pressure": self.P_ref,
        });
        if self.T_max.is_finite() {
            block["T-max"] = json!(self.T_max);
        }
        block
    }
}
