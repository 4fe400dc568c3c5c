//! Rate constant parameterizations of gas-phase reactions.
//!
//! All parameters are stored in SI-kmol units (m, kmol, s, J/kmol); unit conversion happens
//! while parsing, using the total order of the reaction.
use crate::Kinetics::GasKinetics::KineticsError;
use crate::units::{GAS_CONSTANT, QuantityKind, UnitSystem};
use RustedSciThe::symbolic::symbolic_engine::Expr;
use enum_dispatch::enum_dispatch;
use log::warn;
use nalgebra::DVector;
use serde_json::{Value, json};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

#[allow(non_upper_case_globals)]
const Rsym: Expr = Expr::Const(GAS_CONSTANT);
const SMALL_NUMBER: f64 = 1e-300;

/// everything a rate expression may depend on, evaluated once per reaction and state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateContext {
    pub T: f64,
    pub logT: f64,
    pub recipT: f64,
    pub P: f64,
    pub log10P: f64,
    /// effective third-body concentration [M], kmol/m3
    pub third_body_concentration: f64,
    /// enthalpy change of the reaction, J/kmol
    pub delta_enthalpy: f64,
}

impl RateContext {
    pub fn new(T: f64, P: f64) -> Self {
        Self {
            T,
            logT: T.ln(),
            recipT: 1.0 / T,
            P,
            log10P: P.log10(),
            third_body_concentration: 0.0,
            delta_enthalpy: 0.0,
        }
    }
    pub fn with_third_body(mut self, concentration: f64) -> Self {
        self.third_body_concentration = concentration;
        self
    }
    pub fn with_delta_enthalpy(mut self, dH: f64) -> Self {
        self.delta_enthalpy = dH;
        self
    }
}

#[enum_dispatch]
pub trait RateCalculator {
    /// name of the parameterization as written in mechanism files
    fn rate_type(&self) -> &'static str;
    /// rate constant in SI-kmol units
    fn K_const(&self, ctx: &RateContext) -> f64;
    /// parameters of the rate as mechanism file entries (SI-kmol units)
    fn to_serde(&self) -> Value;
    /// true if the rate depends on the enthalpy change of its reaction
    fn uses_delta_enthalpy(&self) -> bool {
        false
    }
}

#[enum_dispatch(RateCalculator)]
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionRate {
    Arrhenius(ArrheniusRate),
    BlowersMasel(BlowersMaselRate),
    Falloff(FalloffRate),
    Plog(PlogRate),
}

impl fmt::Display for ReactionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionRate::Arrhenius(r) => write!(f, "{}", r),
            ReactionRate::BlowersMasel(r) => write!(
                f,
                "BlowersMaselRate(A={:.4e}, b={}, Ea0={:.6e} J/kmol, w0={:.6e} J/kmol)",
                r.A, r.b, r.Ea0, r.w0
            ),
            ReactionRate::Falloff(r) => {
                write!(f, "{}(low: {}, high: {})", r.falloff_name(), r.low, r.high)
            }
            ReactionRate::Plog(r) => write!(f, "PlogRate({} pressures)", r.rates.len()),
        }
    }
}

/// value of a rate parameter which is either a bare number or a string with units
fn number(block: &Value, key: &str, equation: &str) -> Result<f64, KineticsError> {
    let value = block.get(key).ok_or_else(|| KineticsError::MissingParameter {
        equation: equation.to_string(),
        parameter: key.to_string(),
    })?;
    value.as_f64().ok_or_else(|| KineticsError::InvalidParameter {
        equation: equation.to_string(),
        message: format!("'{}' must be a number, got {}", key, value),
    })
}

fn energy(block: &Value, key: &str, equation: &str, units: &UnitSystem) -> Result<f64, KineticsError> {
    let value = block.get(key).ok_or_else(|| KineticsError::MissingParameter {
        equation: equation.to_string(),
        parameter: key.to_string(),
    })?;
    Ok(units.parse_quantity(value, QuantityKind::ActivationEnergy)?)
}

/////////////////////////ARRHENIUS///////////////////////////////////////////////////////////////
/// modified Arrhenius expression k = A T^b exp(-Ea/RT)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrheniusRate {
    pub A: f64,
    pub b: f64,
    /// J/kmol
    pub Ea: f64,
}

impl ArrheniusRate {
    pub fn new(A: f64, b: f64, Ea: f64) -> Self {
        Self { A, b, Ea }
    }
    /// `{A, b, Ea}` block; `order` is the total order used to convert A
    pub fn from_serde(
        block: &Value,
        units: &UnitSystem,
        order: f64,
        equation: &str,
    ) -> Result<Self, KineticsError> {
        let A = number(block, "A", equation)?;
        let b = number(block, "b", equation)?;
        let Ea = energy(block, "Ea", equation, units)?;
        Ok(Self::new(units.convert_rate_coeff(A, order), b, Ea))
    }
    pub fn K(&self, T: f64) -> f64 {
        self.A * T.powf(self.b) * (-self.Ea / (GAS_CONSTANT * T)).exp()
    }
    fn K_ctx(&self, ctx: &RateContext) -> f64 {
        if self.A == 0.0 {
            return 0.0;
        }
        self.A * (self.b * ctx.logT - self.Ea * ctx.recipT / GAS_CONSTANT).exp()
    }
    /// symbolic rate constant as a function of temperature expression
    pub fn K_expr(&self, T: Expr) -> Expr {
        let A = Expr::Const(self.A);
        let b = Expr::Const(self.b);
        let E = Expr::Const(-self.Ea);
        let k0 = A * (T.clone()).pow(b);
        k0 * (E / (Rsym * T)).exp()
    }
    pub fn activation_energy(&self) -> f64 {
        self.Ea
    }
    fn to_block(&self) -> Value {
        json!({"A": self.A, "b": self.b, "Ea": self.Ea})
    }
}

impl fmt::Display for ArrheniusRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArrheniusRate(A={:.4e}, b={}, Ea={:.6e} J/kmol)",
            self.A, self.b, self.Ea
        )
    }
}

impl RateCalculator for ArrheniusRate {
    fn rate_type(&self) -> &'static str {
        "Arrhenius"
    }
    fn K_const(&self, ctx: &RateContext) -> f64 {
        self.K_ctx(ctx)
    }
    fn to_serde(&self) -> Value {
        json!({"rate-constant": self.to_block()})
    }
}

/////////////////////////BLOWERS-MASEL///////////////////////////////////////////////////////////////
/// Arrhenius form whose activation energy depends on the enthalpy change of the reaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlowersMaselRate {
    pub A: f64,
    pub b: f64,
    /// intrinsic activation energy (at zero enthalpy change), J/kmol
    pub Ea0: f64,
    /// average bond dissociation energy of the bond being formed and broken, J/kmol
    pub w0: f64,
}

impl BlowersMaselRate {
    pub fn new(A: f64, b: f64, Ea0: f64, w0: f64) -> Result<Self, KineticsError> {
        if w0 <= Ea0 {
            return Err(KineticsError::InvalidParameter {
                equation: String::new(),
                message: format!("Blowers-Masel w0 = {} must exceed Ea0 = {}", w0, Ea0),
            });
        }
        Ok(Self { A, b, Ea0, w0 })
    }
    pub fn from_serde(
        block: &Value,
        units: &UnitSystem,
        order: f64,
        equation: &str,
    ) -> Result<Self, KineticsError> {
        let A = number(block, "A", equation)?;
        let b = number(block, "b", equation)?;
        let Ea0 = energy(block, "Ea0", equation, units)?;
        let w0 = energy(block, "w0", equation, units)?;
        Self::new(units.convert_rate_coeff(A, order), b, Ea0, w0).map_err(|e| match e {
            KineticsError::InvalidParameter { message, .. } => KineticsError::InvalidParameter {
                equation: equation.to_string(),
                message,
            },
            other => other,
        })
    }
    /// effective activation energy at reaction enthalpy change dH, J/kmol
    pub fn effective_activation_energy(&self, dH: f64) -> f64 {
        let (Ea0, w0) = (self.Ea0, self.w0);
        if dH < -4.0 * Ea0 {
            0.0
        } else if dH > 4.0 * Ea0 {
            dH
        } else {
            let vp = 2.0 * w0 * (w0 + Ea0) / (w0 - Ea0);
            (w0 + dH / 2.0) * (vp - 2.0 * w0 + dH).powi(2)
                / (vp.powi(2) - 4.0 * w0.powi(2) + dH.powi(2))
        }
    }
}

impl RateCalculator for BlowersMaselRate {
    fn rate_type(&self) -> &'static str {
        "Blowers-Masel"
    }
    fn K_const(&self, ctx: &RateContext) -> f64 {
        let Ea = self.effective_activation_energy(ctx.delta_enthalpy);
        self.A * (self.b * ctx.logT - Ea * ctx.recipT / GAS_CONSTANT).exp()
    }
    fn to_serde(&self) -> Value {
        json!({
            "type": "Blowers-Masel",
            "rate-constant": {"A": self.A, "b": self.b, "Ea0": self.Ea0, "w0": self.w0}
        })
    }
    fn uses_delta_enthalpy(&self) -> bool {
        true
    }
}

/////////////////////////THIRD BODY///////////////////////////////////////////////////////////////
/// collision partner of three-body and falloff reactions
#[derive(Debug, Clone, PartialEq)]
pub struct ThirdBody {
    /// "M" for a generic collision partner or the name of the only species acting as one
    pub name: String,
    pub efficiencies: BTreeMap<String, f64>,
    pub default_efficiency: f64,
}

impl ThirdBody {
    pub fn generic(efficiencies: BTreeMap<String, f64>, default_efficiency: f64) -> Self {
        Self {
            name: "M".to_string(),
            efficiencies,
            default_efficiency,
        }
    }
    /// only `species` acts as a collision partner
    pub fn explicit(species: &str) -> Self {
        Self {
            name: species.to_string(),
            efficiencies: BTreeMap::from([(species.to_string(), 1.0)]),
            default_efficiency: 0.0,
        }
    }
    pub fn efficiency(&self, species: &str) -> f64 {
        self.efficiencies
            .get(species)
            .copied()
            .unwrap_or(self.default_efficiency)
    }
    /// efficiencies in the species order of a phase
    pub fn efficiency_vector(&self, species_names: &[String]) -> DVector<f64> {
        DVector::from_iterator(
            species_names.len(),
            species_names.iter().map(|name| self.efficiency(name)),
        )
    }
    /// [M] = sum eff_k C_k
    pub fn concentration(&self, species_names: &[String], concentrations: &DVector<f64>) -> f64 {
        self.efficiency_vector(species_names).dot(concentrations)
    }
}

/////////////////////////FALLOFF///////////////////////////////////////////////////////////////
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TroeParams {
    pub A: f64,
    pub T3: f64,
    pub T1: f64,
    pub T2: Option<f64>,
}

impl TroeParams {
    pub fn from_serde(block: &Value, equation: &str) -> Result<Self, KineticsError> {
        let A = number(block, "A", equation)?;
        let T3 = number(block, "T3", equation)?;
        let T1 = number(block, "T1", equation)?;
        let T2 = match block.get("T2") {
            Some(_) => Some(number(block, "T2", equation)?),
            None => None,
        };
        Ok(Self { A, T3, T1, T2 })
    }
    /// Fcent = (1-A) exp(-T/T3) + A exp(-T/T1) + exp(-T2/T); zero T3 or T1 removes its term
    pub fn F_cent(&self, T: f64) -> f64 {
        let term = |weight: f64, T_i: f64| {
            if T_i.abs() < SMALL_NUMBER {
                0.0
            } else {
                weight * (-T / T_i).exp()
            }
        };
        let mut F_c = term(1.0 - self.A, self.T3) + term(self.A, self.T1);
        if let Some(T2) = self.T2 {
            if T2 != 0.0 {
                F_c += (-T2 / T).exp();
            }
        }
        F_c
    }
    /// broadening factor F(T, Pr)
    pub fn F(&self, T: f64, Pr: f64) -> f64 {
        let log_F_cent = self.F_cent(T).max(SMALL_NUMBER).log10();
        let C = -0.4 - 0.67 * log_F_cent;
        let N = 0.75 - 1.27 * log_F_cent;
        let log_Pr = Pr.max(SMALL_NUMBER).log10() + C;
        let f_1 = log_Pr / (N - 0.14 * log_Pr);
        10f64.powf(log_F_cent / (1.0 + f_1 * f_1))
    }
    fn to_block(&self) -> Value {
        let mut block = json!({"A": self.A, "T3": self.T3, "T1": self.T1});
        if let Some(T2) = self.T2 {
            block["T2"] = json!(T2);
        }
        block
    }
}

/// Lindemann (no Troe parameters) or Troe falloff between the low and high pressure limits
#[derive(Debug, Clone, PartialEq)]
pub struct FalloffRate {
    pub low: ArrheniusRate,
    pub high: ArrheniusRate,
    pub troe: Option<TroeParams>,
}

impl FalloffRate {
    pub fn new(low: ArrheniusRate, high: ArrheniusRate, troe: Option<TroeParams>) -> Self {
        Self { low, high, troe }
    }
    /// `order` is the reactant order without the collision partner
    pub fn from_serde(
        data: &Value,
        units: &UnitSystem,
        order: f64,
        equation: &str,
    ) -> Result<Self, KineticsError> {
        let block = |key: &str| {
            data.get(key).ok_or_else(|| KineticsError::MissingParameter {
                equation: equation.to_string(),
                parameter: key.to_string(),
            })
        };
        let low = ArrheniusRate::from_serde(block("low-P-rate-constant")?, units, order + 1.0, equation)?;
        let high = ArrheniusRate::from_serde(block("high-P-rate-constant")?, units, order, equation)?;
        let troe = match data.get("Troe") {
            Some(t) => Some(TroeParams::from_serde(t, equation)?),
            None => None,
        };
        if data.get("SRI").is_some() {
            return Err(KineticsError::UnsupportedType(format!(
                "SRI falloff in reaction '{}'",
                equation
            )));
        }
        Ok(Self::new(low, high, troe))
    }
    fn falloff_name(&self) -> &'static str {
        if self.troe.is_some() { "Troe" } else { "Lindemann" }
    }
    /// reduced pressure Pr = k0 [M] / k_inf
    pub fn reduced_pressure(&self, T: f64, M: f64) -> f64 {
        let k_inf = self.high.K(T);
        if k_inf <= 0.0 {
            return f64::INFINITY;
        }
        self.low.K(T) * M / k_inf
    }
    /// symbolic rate constant of temperature and third body concentration expressions
    pub fn K_expr(&self, T: Expr, M: Expr) -> Expr {
        let K0 = self.low.K_expr(T.clone());
        let K_inf = self.high.K_expr(T.clone());
        let P_r = K0 * M / K_inf.clone();
        let k = K_inf * (P_r.clone() / (Expr::Const(1.0) + P_r.clone()));
        match &self.troe {
            None => k.symplify(),
            Some(troe) => {
                let A = Expr::Const(troe.A);
                let mut F_c = (Expr::Const(1.0) - A.clone()) * (-T.clone() / Expr::Const(troe.T3)).exp()
                    + A * (-T.clone() / Expr::Const(troe.T1)).exp();
                if let Some(T2) = troe.T2 {
                    F_c = F_c + (Expr::Const(-T2) / T).exp();
                }
                let C = Expr::Const(-0.4) - Expr::Const(0.67) * (F_c.clone()).log10();
                let N = Expr::Const(0.75) - Expr::Const(1.27) * (F_c.clone()).log10();
                let f_1 = ((P_r.clone()).log10() + C.clone())
                    / (N - Expr::Const(0.14) * ((P_r).log10() + C));
                let F = Expr::Const(10.0)
                    .pow((F_c).log10() / (Expr::Const(1.0) + f_1.pow(Expr::Const(2.0))));
                (k * F).symplify()
            }
        }
    }
}

impl RateCalculator for FalloffRate {
    fn rate_type(&self) -> &'static str {
        "falloff"
    }
    fn K_const(&self, ctx: &RateContext) -> f64 {
        let k_inf = self.high.K_ctx(ctx);
        let Pr = self.reduced_pressure(ctx.T, ctx.third_body_concentration);
        let reduced = if Pr.is_finite() { Pr / (1.0 + Pr) } else { 1.0 };
        let F = match &self.troe {
            Some(troe) => troe.F(ctx.T, Pr),
            None => 1.0,
        };
        k_inf * reduced * F
    }
    fn to_serde(&self) -> Value {
        let mut block = json!({
            "type": "falloff",
            "low-P-rate-constant": self.low.to_block(),
            "high-P-rate-constant": self.high.to_block(),
        });
        if let Some(troe) = &self.troe {
            block["Troe"] = troe.to_block();
        }
        block
    }
}

/////////////////////////PRESSURE DEPENDENT ARRHENIUS///////////////////////////////////////////////////////////////
/// Arrhenius expressions tabulated at several pressures; ln k is linear in ln P between them
#[derive(Debug, Clone, PartialEq)]
pub struct PlogRate {
    /// (pressure in Pa, expressions summed at that pressure), sorted by pressure
    pub rates: Vec<(f64, Vec<ArrheniusRate>)>,
    warned: Cell<bool>,
}

impl PlogRate {
    pub fn new(mut entries: Vec<(f64, ArrheniusRate)>) -> Result<Self, KineticsError> {
        if entries.is_empty() {
            return Err(KineticsError::InvalidParameter {
                equation: String::new(),
                message: "pressure-dependent Arrhenius rate needs at least one pressure".to_string(),
            });
        }
        if let Some((P, _)) = entries.iter().find(|(P, _)| !(*P > 0.0)) {
            return Err(KineticsError::InvalidParameter {
                equation: String::new(),
                message: format!("pressure must be positive, got {}", P),
            });
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut rates: Vec<(f64, Vec<ArrheniusRate>)> = Vec::new();
        for (P, rate) in entries {
            match rates.last_mut() {
                Some((last_P, group)) if *last_P == P => group.push(rate),
                _ => rates.push((P, vec![rate])),
            }
        }
        Ok(Self {
            rates,
            warned: Cell::new(false),
        })
    }
    pub fn from_serde(
        data: &Value,
        units: &UnitSystem,
        order: f64,
        equation: &str,
    ) -> Result<Self, KineticsError> {
        let list = data
            .get("rate-constants")
            .and_then(Value::as_array)
            .ok_or_else(|| KineticsError::MissingParameter {
                equation: equation.to_string(),
                parameter: "rate-constants".to_string(),
            })?;
        let mut entries = Vec::with_capacity(list.len());
        for block in list {
            let P_value = block.get("P").ok_or_else(|| KineticsError::MissingParameter {
                equation: equation.to_string(),
                parameter: "P".to_string(),
            })?;
            let P = units.parse_quantity(P_value, QuantityKind::Pressure)?;
            entries.push((P, ArrheniusRate::from_serde(block, units, order, equation)?));
        }
        Self::new(entries).map_err(|e| match e {
            KineticsError::InvalidParameter { message, .. } => KineticsError::InvalidParameter {
                equation: equation.to_string(),
                message,
            },
            other => other,
        })
    }
    fn K_at(&self, i: usize, ctx: &RateContext) -> f64 {
        self.rates[i].1.iter().map(|r| r.K_ctx(ctx)).sum()
    }
    fn warn_out_of_range(&self, P: f64) {
        if !self.warned.get() {
            let (P_min, P_max) = (self.rates[0].0, self.rates[self.rates.len() - 1].0);
            warn!(
                "pressure {} Pa is outside the PLOG table ({} - {} Pa), using the boundary rate",
                P, P_min, P_max
            );
            self.warned.set(true);
        }
    }
}

impl RateCalculator for PlogRate {
    fn rate_type(&self) -> &'static str {
        "pressure-dependent-Arrhenius"
    }
    fn K_const(&self, ctx: &RateContext) -> f64 {
        let P = ctx.P;
        let last = self.rates.len() - 1;
        if P <= self.rates[0].0 {
            if P < self.rates[0].0 {
                self.warn_out_of_range(P);
            }
            return self.K_at(0, ctx);
        }
        if P >= self.rates[last].0 {
            if P > self.rates[last].0 {
                self.warn_out_of_range(P);
            }
            return self.K_at(last, ctx);
        }
        // rates[i].0 < P < rates[i + 1].0
        let i = self.rates.partition_point(|(P_i, _)| *P_i <= P) - 1;
        let (P1, P2) = (self.rates[i].0, self.rates[i + 1].0);
        let (k1, k2) = (self.K_at(i, ctx), self.K_at(i + 1, ctx));
        let fraction = (P.ln() - P1.ln()) / (P2.ln() - P1.ln());
        if k1 > 0.0 && k2 > 0.0 {
            (k1.ln() + (k2.ln() - k1.ln()) * fraction).exp()
        } else {
            k1 + (k2 - k1) * fraction
        }
    }
    fn to_serde(&self) -> Value {
        let mut list = Vec::new();
        for (P, group) in &self.rates {
            for rate in group {
                let mut block = rate.to_block();
                block["P"] = json!(P);
                list.push(block);
            }
        }
        json!({"type": "pressure-dependent-Arrhenius", "rate-constants": list})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::ONE_ATM;
    use approx::assert_relative_eq;

    fn cgs() -> UnitSystem {
        UnitSystem::from_serde(&json!({
            "length": "cm", "time": "s", "quantity": "mol", "activation-energy": "cal/mol"
        }))
        .unwrap()
    }

    #[test]
    fn test_arrhenius_units_and_value() {
        let rate = ArrheniusRate::from_serde(
            &json!({"A": 3.87e4, "b": 2.7, "Ea": 6260.0}),
            &cgs(),
            2.0,
            "O + H2 <=> H + OH",
        )
        .unwrap();
        assert_relative_eq!(rate.A, 38.7, epsilon = 1e-9);
        assert_relative_eq!(rate.Ea, 6260.0 * 4184.0);
        let ctx = RateContext::new(300.0, ONE_ATM);
        assert_relative_eq!(rate.K_const(&ctx), 5195.447, max_relative = 1e-5);
        assert_relative_eq!(rate.K(300.0), rate.K_const(&ctx), max_relative = 1e-12);
        let k_sym = rate.K_expr(Expr::Var("T".to_owned())).lambdify1D();
        assert_relative_eq!(k_sym(300.0), rate.K(300.0), max_relative = 1e-8);
    }

    #[test]
    fn test_missing_parameter() {
        let result = ArrheniusRate::from_serde(&json!({"A": 1.0, "b": 0.0}), &cgs(), 2.0, "A <=> B");
        assert!(matches!(
            result,
            Err(KineticsError::MissingParameter { parameter, .. }) if parameter == "Ea"
        ));
    }

    #[test]
    fn test_blowers_masel_activation_energy() {
        let rate = BlowersMaselRate::new(1.0, 0.0, 4e7, 2e8).unwrap();
        assert_relative_eq!(rate.effective_activation_energy(0.0), 4e7, max_relative = 1e-12);
        assert_relative_eq!(
            rate.effective_activation_energy(1e7),
            45179910.044977516,
            max_relative = 1e-10
        );
        assert_eq!(rate.effective_activation_energy(-1.7e8), 0.0);
        assert_eq!(rate.effective_activation_energy(1.7e8), 1.7e8);
        // with w0 >> Ea0 the expression joins both limits continuously
        let Ea0 = 6260.0 * 4184.0;
        let rate = BlowersMaselRate::new(1.0, 0.0, Ea0, 1e9 * 4184.0).unwrap();
        let near_upper = rate.effective_activation_energy(4.0 * Ea0 * (1.0 - 1e-12));
        assert_relative_eq!(near_upper, 4.0 * Ea0, max_relative = 1e-9);
        let near_lower = rate.effective_activation_energy(-4.0 * Ea0 * (1.0 - 1e-12));
        assert!(near_lower.abs() < 1e-2);
    }

    #[test]
    fn test_blowers_masel_rate_constant() {
        let rate = BlowersMaselRate::from_serde(
            &json!({"A": 3.87e4, "b": 2.7, "Ea0": 6260.0, "w0": 1e9}),
            &cgs(),
            2.0,
            "O + H2 <=> H + OH",
        )
        .unwrap();
        let ctx = RateContext::new(300.0, ONE_ATM).with_delta_enthalpy(8170274.38);
        assert_relative_eq!(rate.K_const(&ctx), 947.58, max_relative = 1e-4);
        let ctx = ctx.with_delta_enthalpy(8170274.38 + 1e7);
        assert_relative_eq!(rate.K_const(&ctx), 99.224, max_relative = 1e-4);
        assert!(rate.uses_delta_enthalpy());
    }

    #[test]
    fn test_blowers_masel_requires_w0_above_ea0() {
        let result = BlowersMaselRate::from_serde(
            &json!({"A": 1.0, "b": 0.0, "Ea0": 100.0, "w0": 50.0}),
            &UnitSystem::default(),
            2.0,
            "A + B <=> C",
        );
        assert!(matches!(
            result,
            Err(KineticsError::InvalidParameter { equation, .. }) if equation == "A + B <=> C"
        ));
    }

    #[test]
    fn test_third_body_concentration() {
        let names: Vec<String> = ["H2", "O2", "AR"].iter().map(|s| s.to_string()).collect();
        let C = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let tb = ThirdBody::generic(BTreeMap::from([("AR".to_string(), 0.5)]), 1.0);
        assert_relative_eq!(tb.concentration(&names, &C), 1.0 + 2.0 + 1.5);
        let explicit = ThirdBody::explicit("O2");
        assert_relative_eq!(explicit.concentration(&names, &C), 2.0);
    }

    #[test]
    fn test_lindemann_limits() {
        let low = ArrheniusRate::new(1e6, 0.0, 0.0);
        let high = ArrheniusRate::new(1e3, 0.0, 0.0);
        let rate = FalloffRate::new(low, high, None);
        let ctx = RateContext::new(1000.0, ONE_ATM);
        // Pr = 1 gives half of the high pressure limit
        assert_relative_eq!(rate.K_const(&ctx.with_third_body(1e-3)), 500.0, max_relative = 1e-12);
        // high pressure limit
        assert_relative_eq!(rate.K_const(&ctx.with_third_body(1e6)), 1e3, max_relative = 1e-6);
        // low pressure limit: k = k0 [M]
        assert_relative_eq!(rate.K_const(&ctx.with_third_body(1e-9)), 1e-3, max_relative = 1e-5);
    }

    #[test]
    fn test_troe_falloff() {
        let troe = TroeParams {
            A: 0.7346,
            T3: 94.0,
            T1: 1756.0,
            T2: Some(5182.0),
        };
        let T: f64 = 1000.0;
        let F_c = (1.0 - 0.7346) * (-T / 94.0).exp() + 0.7346 * (-T / 1756.0).exp() + (-5182.0 / T).exp();
        assert_relative_eq!(troe.F_cent(T), F_c, max_relative = 1e-12);
        // at log10(Pr) = -C the broadening reaches Fcent
        let C = -0.4 - 0.67 * F_c.log10();
        assert_relative_eq!(troe.F(T, 10f64.powf(-C)), F_c, max_relative = 1e-10);
        let no_T3 = TroeParams {
            A: 0.5,
            T3: 0.0,
            T1: 100.0,
            T2: None,
        };
        assert_relative_eq!(no_T3.F_cent(T), 0.5 * (-10.0f64).exp(), max_relative = 1e-12);

        let rate = FalloffRate::new(
            ArrheniusRate::new(1e6, 0.0, 0.0),
            ArrheniusRate::new(1e3, 0.0, 0.0),
            Some(troe),
        );
        let ctx = RateContext::new(T, ONE_ATM).with_third_body(1e-3);
        let expected = 500.0 * troe.F(T, 1.0);
        assert_relative_eq!(rate.K_const(&ctx), expected, max_relative = 1e-12);
        let k_sym = rate
            .K_expr(Expr::Var("T".to_owned()), Expr::Const(1e-3))
            .lambdify1D();
        assert_relative_eq!(k_sym(T), expected, max_relative = 1e-8);
    }

    #[test]
    fn test_plog_interpolation() {
        let k1 = ArrheniusRate::new(1.0, 0.0, 0.0);
        let k2 = ArrheniusRate::new(100.0, 0.0, 0.0);
        let rate = PlogRate::new(vec![(1e5, k2), (1e3, k1)]).unwrap();
        assert_eq!(rate.rates[0].0, 1e3);
        let at = |P: f64| rate.K_const(&RateContext::new(500.0, P));
        assert_relative_eq!(at(1e3), 1.0);
        assert_relative_eq!(at(1e4), 10.0, max_relative = 1e-12);
        assert_relative_eq!(at(1e5), 100.0);
        // outside the table the boundary rate applies
        assert_relative_eq!(at(10.0), 1.0);
        assert_relative_eq!(at(1e7), 100.0);
    }

    #[test]
    fn test_plog_sums_rates_at_same_pressure() {
        let rate = PlogRate::new(vec![
            (1e5, ArrheniusRate::new(1.0, 0.0, 0.0)),
            (1e5, ArrheniusRate::new(2.0, 0.0, 0.0)),
        ])
        .unwrap();
        assert_eq!(rate.rates.len(), 1);
        assert_relative_eq!(rate.K_const(&RateContext::new(300.0, 1e5)), 3.0);
    }

    #[test]
    fn test_plog_from_serde() {
        let data = json!({
            "rate-constants": [
                {"P": "0.01 atm", "A": 1.2124e16, "b": -0.5779, "Ea": 1.08727e4},
                {"P": "1 atm", "A": 4.9108e31, "b": -4.8507, "Ea": 2.47728e4}
            ]
        });
        let rate = PlogRate::from_serde(&data, &cgs(), 2.0, "HO2 + H <=> 2 OH").unwrap();
        assert_relative_eq!(rate.rates[0].0, 0.01 * ONE_ATM);
        assert_relative_eq!(rate.rates[1].0, ONE_ATM);
        assert_relative_eq!(rate.rates[0].1[0].A, 1.2124e13, max_relative = 1e-12);
        let reloaded = PlogRate::from_serde(&rate.to_serde(), &UnitSystem::default(), 2.0, "x").unwrap();
        assert_eq!(rate, reloaded);
    }

    #[test]
    fn test_rate_enum_dispatch() {
        let rate: ReactionRate = ArrheniusRate::new(2.0, 1.0, 0.0).into();
        assert_eq!(rate.rate_type(), "Arrhenius");
        assert!(!rate.uses_delta_enthalpy());
        assert_relative_eq!(rate.K_const(&RateContext::new(10.0, ONE_ATM)), 20.0, max_relative = 1e-12);
        assert_eq!(rate.to_serde()["rate-constant"]["A"], json!(2.0));
    }
}
