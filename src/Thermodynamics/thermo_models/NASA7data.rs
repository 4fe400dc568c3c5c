//! NASA 7-coefficient polynomials
//!
//! cp/R = a0 + a1 T + a2 T^2 + a3 T^3 + a4 T^4
//! h/RT = a0 + a1 T/2 + a2 T^2/3 + a3 T^3/4 + a4 T^4/5 + a5/T
//! s/R  = a0 ln(T) + a1 T + a2 T^2/2 + a3 T^3/3 + a4 T^4/4 + a6
//!
//! `NasaPoly1` covers a single temperature range, `NasaPoly2` the usual pair of ranges
//! joined at the midpoint temperature.
use super::thermo_api::{SpeciesThermoCalculator, ThermoError};
use crate::units::{GAS_CONSTANT, ONE_ATM, QuantityKind, UnitSystem};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[allow(non_upper_case_globals)]
const Rsym: Expr = Expr::Const(GAS_CONSTANT);
/// length of the positional coefficient array of a two-range polynomial: [Tmid, high a0..a6, low a0..a6]
pub const NASA_POLY2_COEFFS_LEN: usize = 15;

pub(crate) fn Cp(t: f64, a: &[f64; 7]) -> f64 {
    a[0] + a[1] * t + a[2] * t.powi(2) + a[3] * t.powi(3) + a[4] * t.powi(4)
}
pub(crate) fn dh(t: f64, a: &[f64; 7]) -> f64 {
    a[0] + a[1] * t / 2.0
        + a[2] * t.powi(2) / 3.0
        + a[3] * t.powi(3) / 4.0
        + a[4] * t.powi(4) / 5.0
        + a[5] / t
}
pub(crate) fn ds(t: f64, a: &[f64; 7]) -> f64 {
    a[0] * t.ln() + a[1] * t + a[2] * t.powi(2) / 2.0 + a[3] * t.powi(3) / 3.0 + a[4] * t.powi(4) / 4.0
        + a[6]
}
/// symbolic Cp, H, S in J/kmol units
fn Cp_dH_dS_sym(a: &[f64; 7]) -> (Expr, Expr, Expr) {
    let t = Expr::Var("T".to_owned());
    let c: Vec<Expr> = a.iter().map(|ai| Expr::Const(*ai)).collect();
    let Cp = Rsym
        * (c[0].clone()
            + c[1].clone() * t.clone()
            + c[2].clone() * t.clone().pow(Expr::Const(2.0))
            + c[3].clone() * t.clone().pow(Expr::Const(3.0))
            + c[4].clone() * t.clone().pow(Expr::Const(4.0)));
    let dh = Rsym
        * (c[0].clone() * t.clone()
            + c[1].clone() * t.clone().pow(Expr::Const(2.0)) / Expr::Const(2.0)
            + c[2].clone() * t.clone().pow(Expr::Const(3.0)) / Expr::Const(3.0)
            + c[3].clone() * t.clone().pow(Expr::Const(4.0)) / Expr::Const(4.0)
            + c[4].clone() * t.clone().pow(Expr::Const(5.0)) / Expr::Const(5.0)
            + c[5].clone());
    let ds = Rsym
        * (c[0].clone() * t.clone().ln()
            + c[1].clone() * t.clone()
            + c[2].clone() * t.clone().pow(Expr::Const(2.0)) / Expr::Const(2.0)
            + c[3].clone() * t.clone().pow(Expr::Const(3.0)) / Expr::Const(3.0)
            + c[4].clone() * t.pow(Expr::Const(4.0)) / Expr::Const(4.0)
            + c[6].clone());
    (Cp.symplify(), dh.symplify(), ds.symplify())
}

/// `thermo:` block of a species as written in mechanism files
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NASA7input {
    #[serde(rename = "temperature-ranges")]
    pub temperature_ranges: Vec<f64>,
    /// coefficients of each range, lowest temperature range first
    pub data: Vec<Vec<f64>>,
    #[serde(rename = "reference-pressure", default)]
    pub reference_pressure: Option<Value>,
}

/// takes serde Value and parse it into structure; returns the input and reference pressure in Pa
pub fn parse_nasa7_input(
    thermo: &Value,
    units: &UnitSystem,
) -> Result<(NASA7input, f64), ThermoError> {
    let input: NASA7input = serde_json::from_value(thermo.clone())?;
    let P_ref = match &input.reference_pressure {
        Some(p) => units.parse_quantity(p, QuantityKind::Pressure)?,
        None => ONE_ATM,
    };
    if input.data.len() + 1 != input.temperature_ranges.len() {
        return Err(ThermoError::InvalidCoefficients(format!(
            "{} temperature bounds need {} coefficient sets, got {}",
            input.temperature_ranges.len(),
            input.temperature_ranges.len().saturating_sub(1),
            input.data.len()
        )));
    }
    for window in input.temperature_ranges.windows(2) {
        if window[0] >= window[1] {
            return Err(ThermoError::InvalidCoefficients(format!(
                "temperature bounds must increase: {:?}",
                input.temperature_ranges
            )));
        }
    }
    Ok((input, P_ref))
}

fn to_seven(data: &[f64]) -> Result<[f64; 7], ThermoError> {
    data.try_into().map_err(|_| {
        ThermoError::InvalidCoefficients(format!("NASA7 range needs 7 coefficients, got {}", data.len()))
    })
}

/// single range NASA7 polynomial
#[derive(Debug, Clone, PartialEq)]
pub struct NasaPoly1 {
    pub T_min: f64,
    pub T_max: f64,
    pub P_ref: f64,
    pub coeffs: [f64; 7],
}

impl NasaPoly1 {
    pub fn new(T_min: f64, T_max: f64, P_ref: f64, coeffs: [f64; 7]) -> Self {
        Self {
            T_min,
            T_max,
            P_ref,
            coeffs,
        }
    }
    pub fn from_input(input: &NASA7input, P_ref: f64) -> Result<Self, ThermoError> {
        Ok(Self::new(
            input.temperature_ranges[0],
            input.temperature_ranges[1],
            P_ref,
            to_seven(&input.data[0])?,
        ))
    }
}

impl SpeciesThermoCalculator for NasaPoly1 {
    fn model_name(&self) -> &'static str {
        "NASA7"
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
    fn cp_R(&self, T: f64) -> f64 {
        Cp(T, &self.coeffs)
    }
    fn h_RT(&self, T: f64) -> f64 {
        dh(T, &self.coeffs)
    }
    fn s_R(&self, T: f64) -> f64 {
        ds(T, &self.coeffs)
    }
    fn coefficients(&self) -> Vec<f64> {
        self.coeffs.to_vec()
    }
    fn shift_enthalpy(&mut self, dH: f64) {
        self.coeffs[5] += dH / GAS_CONSTANT;
    }
    fn validate(&self, _name: &str) -> Result<(), ThermoError> {
        Ok(())
    }
    fn create_sym_Cp_dH_dS(&self, _T: f64) -> (Expr, Expr, Expr) {
        Cp_dH_dS_sym(&self.coeffs)
    }
    fn to_serde(&self) -> Value {
        json!({
            "model": "NASA7",
            "temperature-ranges": [self.T_min, self.T_max],
            "data": [self.coeffs.to_vec()],
            "reference-pressure": self.P_ref,
        })
    }
}

/// two range NASA7 polynomial, low range is used for T <= T_mid
#[derive(Debug, Clone, PartialEq)]
pub struct NasaPoly2 {
    pub T_min: f64,
    pub T_mid: f64,
    pub T_max: f64,
    pub P_ref: f64,
    pub low: [f64; 7],
    pub high: [f64; 7],
}

impl NasaPoly2 {
    pub fn new(T_min: f64, T_mid: f64, T_max: f64, P_ref: f64, low: [f64; 7], high: [f64; 7]) -> Self {
        Self {
            T_min,
            T_mid,
            T_max,
            P_ref,
            low,
            high,
        }
    }
    pub fn from_input(input: &NASA7input, P_ref: f64) -> Result<Self, ThermoError> {
        let t = &input.temperature_ranges;
        Ok(Self::new(
            t[0],
            t[1],
            t[2],
            P_ref,
            to_seven(&input.data[0])?,
            to_seven(&input.data[1])?,
        ))
    }
    /// rebuild the polynomial from the positional array [Tmid, high a0..a6, low a0..a6],
    /// e.g. after the array returned by `coefficients()` was edited by index
    pub fn from_coeffs(T_min: f64, T_max: f64, P_ref: f64, coeffs: &[f64]) -> Result<Self, ThermoError> {
        if coeffs.len() != NASA_POLY2_COEFFS_LEN {
            return Err(ThermoError::InvalidCoefficients(format!(
                "two-range NASA7 needs {} coefficients, got {}",
                NASA_POLY2_COEFFS_LEN,
                coeffs.len()
            )));
        }
        let T_mid = coeffs[0];
        if !(T_min < T_mid && T_mid < T_max) {
            return Err(ThermoError::InvalidCoefficients(format!(
                "midpoint temperature {} is outside {} - {}",
                T_mid, T_min, T_max
            )));
        }
        Ok(Self::new(
            T_min,
            T_mid,
            T_max,
            P_ref,
            to_seven(&coeffs[8..15])?,
            to_seven(&coeffs[1..8])?,
        ))
    }

    fn range(&self, T: f64) -> &[f64; 7] {
        if T <= self.T_mid { &self.low } else { &self.high }
    }
}

impl SpeciesThermoCalculator for NasaPoly2 {
    fn model_name(&self) -> &'static str {
        "NASA7"
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
    fn cp_R(&self, T: f64) -> f64 {
        Cp(T, self.range(T))
    }
    fn h_RT(&self, T: f64) -> f64 {
        dh(T, self.range(T))
    }
    fn s_R(&self, T: f64) -> f64 {
        ds(T, self.range(T))
    }
    fn coefficients(&self) -> Vec<f64> {
        let mut coeffs = Vec::with_capacity(NASA_POLY2_COEFFS_LEN);
        coeffs.push(self.T_mid);
        coeffs.extend_from_slice(&self.high);
        coeffs.extend_from_slice(&self.low);
        coeffs
    }
    fn shift_enthalpy(&mut self, dH: f64) {
        let shift = dH / GAS_CONSTANT;
        self.low[5] += shift;
        self.high[5] += shift;
    }
    /// discontinuities at the midpoint are reported as warnings, the same as mechanism
    /// libraries do, since many published mechanisms have small ones
    fn validate(&self, name: &str) -> Result<(), ThermoError> {
        let T = self.T_mid;
        let checks = [
            ("cp/R", Cp(T, &self.low), Cp(T, &self.high), 0.01),
            ("h/RT", dh(T, &self.low), dh(T, &self.high), 0.001),
            ("s/R", ds(T, &self.low), ds(T, &self.high), 0.001),
        ];
        for (property, low, high, tolerance) in checks {
            if (low - high).abs() / (low.abs() + 1e-4) > tolerance {
                warn!(
                    "species {}: discontinuity in {} at Tmid = {}: low range gives {}, high range gives {}",
                    name, property, T, low, high
                );
            }
        }
        Ok(())
    }
    fn create_sym_Cp_dH_dS(&self, T: f64) -> (Expr, Expr, Expr) {
        Cp_dH_dS_sym(self.range(T))
    }
    fn to_serde(&self) -> Value {
        json!({
            "model": "NASA7",
            "temperature-ranges": [self.T_min, self.T_mid, self.T_max],
            "data": [self.low.to_vec(), self.high.to_vec()],
            "reference-pressure": self.P_ref,
        })
    }
}
