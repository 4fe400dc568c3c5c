//! Reaction: participants, stoichiometry, reversibility and rate parameterization
use crate::Kinetics::GasKinetics::KineticsError;
use crate::Kinetics::rate_constants::{
    ArrheniusRate, BlowersMaselRate, FalloffRate, PlogRate, RateCalculator, ReactionRate, ThirdBody,
};
use crate::Kinetics::stoichiometry_analyzer::parse_equation;
use crate::units::UnitSystem;
use log::warn;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;

/// enum for types of reactions as they are written in mechanism files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionType {
    Elementary,
    ThreeBody,
    Falloff,
    Plog,
    BlowersMasel,
}

impl ReactionType {
    pub fn from_str(s: Option<&str>) -> Result<Self, KineticsError> {
        match s {
            None | Some("elementary") | Some("Arrhenius") => Ok(ReactionType::Elementary),
            Some("three-body") => Ok(ReactionType::ThreeBody),
            Some("falloff") => Ok(ReactionType::Falloff),
            Some("pressure-dependent-Arrhenius") => Ok(ReactionType::Plog),
            Some("Blowers-Masel") | Some("blowers-masel") => Ok(ReactionType::BlowersMasel),
            Some(other) => Err(KineticsError::UnsupportedType(other.to_string())),
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            ReactionType::Elementary => "elementary",
            ReactionType::ThreeBody => "three-body",
            ReactionType::Falloff => "falloff",
            ReactionType::Plog => "pressure-dependent-Arrhenius",
            ReactionType::BlowersMasel => "Blowers-Masel",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub equation: String,
    pub reactants: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    /// explicit reaction orders replacing reactant coefficients in the rate of progress
    pub orders: BTreeMap<String, f64>,
    pub reversible: bool,
    pub duplicate: bool,
    /// collision partner of three-body and falloff reactions
    pub third_body: Option<ThirdBody>,
    pub rate: ReactionRate,
    pub note: Option<String>,
}

impl Reaction {
    /// takes serde Value of one entry of a reaction list and parse it into structure.
    /// `species_names` are the species of the phase the reaction belongs to.
    pub fn from_serde(data: &Value, units: &UnitSystem, species_names: &[String]) -> Result<Self, KineticsError> {
        let equation = data
            .get("equation")
            .and_then(Value::as_str)
            .ok_or_else(|| KineticsError::MissingParameter {
                equation: data.to_string(),
                parameter: "equation".to_string(),
            })?
            .trim()
            .to_string();
        let parsed = parse_equation(&equation, species_names)?;
        let mut reaction_type = ReactionType::from_str(data.get("type").and_then(Value::as_str))?;
        // "+ M" without declared type is a three-body reaction
        if reaction_type == ReactionType::Elementary && parsed.third_body.is_some() && !parsed.falloff_partner {
            reaction_type = ReactionType::ThreeBody;
        }
        let invalid = |message: &str| KineticsError::InvalidEquation {
            equation: equation.clone(),
            message: message.to_string(),
        };
        match reaction_type {
            ReactionType::ThreeBody if parsed.third_body.is_none() || parsed.falloff_partner => {
                return Err(invalid("three-body reaction needs '+ M' on both sides"));
            }
            ReactionType::Falloff if !parsed.falloff_partner => {
                return Err(invalid("falloff reaction needs '(+M)' on both sides"));
            }
            ReactionType::Elementary | ReactionType::Plog | ReactionType::BlowersMasel
                if parsed.third_body.is_some() =>
            {
                return Err(invalid("collision partner in a reaction without third body"));
            }
            _ => {}
        }

        let mut orders = BTreeMap::new();
        if let Some(block) = data.get("orders") {
            let given: BTreeMap<String, f64> = serde_json::from_value(block.clone())?;
            for (name, order) in given {
                if !species_names.contains(&name) {
                    return Err(KineticsError::UnknownSpecies {
                        equation: equation.clone(),
                        species: name,
                    });
                }
                if order < 0.0 {
                    return Err(KineticsError::InvalidParameter {
                        equation: equation.clone(),
                        message: format!("negative order {} of '{}'", order, name),
                    });
                }
                orders.insert(name, order);
            }
        }
        let order: f64 = parsed
            .reactants
            .iter()
            .map(|(name, nu)| orders.get(name).copied().unwrap_or(*nu))
            .sum::<f64>()
            + orders
                .iter()
                .filter(|(name, _)| !parsed.reactants.contains_key(*name))
                .map(|(_, o)| *o)
                .sum::<f64>();

        let third_body = match &parsed.third_body {
            Some(name) if name == "M" => {
                let mut efficiencies = BTreeMap::new();
                if let Some(block) = data.get("efficiencies") {
                    let given: BTreeMap<String, f64> = serde_json::from_value(block.clone())?;
                    for (species, efficiency) in given {
                        if species_names.contains(&species) {
                            efficiencies.insert(species, efficiency);
                        } else {
                            warn!(
                                "reaction '{}': third body efficiency of undeclared species '{}' is ignored",
                                equation, species
                            );
                        }
                    }
                }
                let default_efficiency = data
                    .get("default-efficiency")
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0);
                Some(ThirdBody::generic(efficiencies, default_efficiency))
            }
            Some(name) => Some(ThirdBody::explicit(name)),
            None => None,
        };

        let rate_block = |key: &str| {
            data.get(key).ok_or_else(|| KineticsError::MissingParameter {
                equation: equation.clone(),
                parameter: key.to_string(),
            })
        };
        let rate: ReactionRate = match reaction_type {
            ReactionType::Elementary => {
                ArrheniusRate::from_serde(rate_block("rate-constant")?, units, order, &equation)?.into()
            }
            ReactionType::ThreeBody => {
                ArrheniusRate::from_serde(rate_block("rate-constant")?, units, order + 1.0, &equation)?.into()
            }
            ReactionType::BlowersMasel => {
                BlowersMaselRate::from_serde(rate_block("rate-constant")?, units, order, &equation)?.into()
            }
            ReactionType::Falloff => FalloffRate::from_serde(data, units, order, &equation)?.into(),
            ReactionType::Plog => PlogRate::from_serde(data, units, order, &equation)?.into(),
        };

        Ok(Self {
            equation,
            reactants: parsed.reactants,
            products: parsed.products,
            orders,
            reversible: parsed.reversible,
            duplicate: data.get("duplicate").and_then(Value::as_bool).unwrap_or(false),
            third_body,
            rate,
            note: data.get("note").and_then(Value::as_str).map(str::to_string),
        })
    }

    pub fn equation(&self) -> &str {
        &self.equation
    }

    pub fn reaction_type(&self) -> ReactionType {
        match (&self.rate, &self.third_body) {
            (ReactionRate::Arrhenius(_), Some(_)) => ReactionType::ThreeBody,
            (ReactionRate::Arrhenius(_), None) => ReactionType::Elementary,
            (ReactionRate::BlowersMasel(_), _) => ReactionType::BlowersMasel,
            (ReactionRate::Falloff(_), _) => ReactionType::Falloff,
            (ReactionRate::Plog(_), _) => ReactionType::Plog,
        }
    }

    /// sum of the concentration powers in the forward rate of progress (without third body)
    pub fn reactant_order(&self) -> f64 {
        let mut order: f64 = self
            .reactants
            .iter()
            .map(|(name, nu)| self.orders.get(name).copied().unwrap_or(*nu))
            .sum();
        order += self
            .orders
            .iter()
            .filter(|(name, _)| !self.reactants.contains_key(*name))
            .map(|(_, o)| *o)
            .sum::<f64>();
        order
    }

    /// order defining the units of the forward rate constant: three-body constants are
    /// multiplied by [M] in the rate of progress, so they count it
    pub fn rate_constant_order(&self) -> f64 {
        match self.reaction_type() {
            ReactionType::ThreeBody => self.reactant_order() + 1.0,
            _ => self.reactant_order(),
        }
    }

    /// "M", a species name for an explicit collision partner, or None
    pub fn collision_partner(&self) -> Option<&str> {
        self.third_body.as_ref().map(|tb| tb.name.as_str())
    }

    /// true if the participants of `other` are the same as of this reaction
    pub fn same_stoichiometry(&self, other: &Reaction) -> bool {
        self.reactants == other.reactants
            && self.products == other.products
            && self.reversible == other.reversible
            && self.collision_partner() == other.collision_partner()
    }

    /// reaction block in SI-kmol units
    pub fn to_serde(&self) -> Value {
        let mut block = Map::new();
        block.insert("equation".to_string(), json!(self.equation));
        if let Value::Object(rate) = self.rate.to_serde() {
            block.extend(rate);
        }
        if let Some(third_body) = &self.third_body {
            if third_body.name == "M" {
                if self.reaction_type() == ReactionType::ThreeBody {
                    block.insert("type".to_string(), json!("three-body"));
                }
                if !third_body.efficiencies.is_empty() {
                    block.insert("efficiencies".to_string(), json!(third_body.efficiencies));
                }
                if third_body.default_efficiency != 1.0 {
                    block.insert(
                        "default-efficiency".to_string(),
                        json!(third_body.default_efficiency),
                    );
                }
            }
        }
        if !self.orders.is_empty() {
            block.insert("orders".to_string(), json!(self.orders));
        }
        if self.duplicate {
            block.insert("duplicate".to_string(), json!(true));
        }
        if let Some(note) = &self.note {
            block.insert("note".to_string(), json!(note));
        }
        Value::Object(block)
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}    {}", self.equation, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names() -> Vec<String> {
        ["H2", "H", "O", "OH", "O2", "H2O", "HO2", "H2O2", "AR"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn cgs() -> UnitSystem {
        UnitSystem::from_serde(&json!({
            "length": "cm", "time": "s", "quantity": "mol", "activation-energy": "cal/mol"
        }))
        .unwrap()
    }

    #[test]
    fn test_elementary_reaction() {
        let data = json!({
            "equation": "O + H2 <=> H + OH",
            "duplicate": true,
            "rate-constant": {"A": 3.87e4, "b": 2.7, "Ea": 6260.0}
        });
        let reaction = Reaction::from_serde(&data, &cgs(), &names()).unwrap();
        assert_eq!(reaction.reaction_type(), ReactionType::Elementary);
        assert!(reaction.duplicate);
        assert!(reaction.reversible);
        assert_eq!(reaction.reactant_order(), 2.0);
        let ReactionRate::Arrhenius(rate) = &reaction.rate else {
            panic!("expected Arrhenius rate");
        };
        assert_relative_eq!(rate.A, 38.7, epsilon = 1e-9);
        assert!(reaction.to_string().starts_with("O + H2 <=> H + OH"));
    }

    #[test]
    fn test_three_body_reaction() {
        let data = json!({
            "equation": "2 O + M <=> O2 + M",
            "type": "three-body",
            "rate-constant": {"A": 1.2e17, "b": -1.0, "Ea": 0.0},
            "efficiencies": {"AR": 0.83, "H2": 2.4, "H2O": 15.4, "CO2": 3.6}
        });
        let reaction = Reaction::from_serde(&data, &cgs(), &names()).unwrap();
        assert_eq!(reaction.reaction_type(), ReactionType::ThreeBody);
        assert_eq!(reaction.rate_constant_order(), 3.0);
        let third_body = reaction.third_body.as_ref().unwrap();
        assert_eq!(third_body.efficiency("AR"), 0.83);
        assert_eq!(third_body.efficiency("O2"), 1.0);
        // CO2 is not in the phase
        assert!(!third_body.efficiencies.contains_key("CO2"));
        let ReactionRate::Arrhenius(rate) = &reaction.rate else {
            panic!("expected Arrhenius rate");
        };
        // cm6/mol2/s -> m6/kmol2/s
        assert_relative_eq!(rate.A, 1.2e11, max_relative = 1e-12);
    }

    #[test]
    fn test_implicit_three_body_type() {
        let data = json!({
            "equation": "O + H + M <=> OH + M",
            "rate-constant": {"A": 5.0e17, "b": -1.0, "Ea": 0.0}
        });
        let reaction = Reaction::from_serde(&data, &cgs(), &names()).unwrap();
        assert_eq!(reaction.reaction_type(), ReactionType::ThreeBody);
    }

    #[test]
    fn test_falloff_reaction() {
        let data = json!({
            "equation": "2 OH (+M) <=> H2O2 (+M)",
            "type": "falloff",
            "low-P-rate-constant": {"A": 2.3e18, "b": -0.9, "Ea": -1700.0},
            "high-P-rate-constant": {"A": 7.4e13, "b": -0.37, "Ea": 0.0},
            "Troe": {"A": 0.7346, "T3": 94.0, "T1": 1756.0, "T2": 5182.0},
            "efficiencies": {"AR": 0.7, "H2": 2.0, "H2O": 6.0}
        });
        let reaction = Reaction::from_serde(&data, &cgs(), &names()).unwrap();
        assert_eq!(reaction.reaction_type(), ReactionType::Falloff);
        let ReactionRate::Falloff(rate) = &reaction.rate else {
            panic!("expected falloff rate");
        };
        assert_relative_eq!(rate.low.A, 2.3e12, max_relative = 1e-12);
        assert_relative_eq!(rate.high.A, 7.4e10, max_relative = 1e-12);
        assert_eq!(rate.troe.unwrap().T2, Some(5182.0));
        let reloaded = Reaction::from_serde(&reaction.to_serde(), &UnitSystem::default(), &names()).unwrap();
        assert_eq!(reaction, reloaded);
    }

    #[test]
    fn test_blowers_masel_spellings() {
        for spelling in ["Blowers-Masel", "blowers-masel"] {
            let data = json!({
                "equation": "O + H2 <=> H + OH",
                "type": spelling,
                "rate-constant": {"A": 3.87e4, "b": 2.7, "Ea0": 6260.0, "w0": 1e9}
            });
            let reaction = Reaction::from_serde(&data, &cgs(), &names()).unwrap();
            assert_eq!(reaction.reaction_type(), ReactionType::BlowersMasel);
            assert!(reaction.rate.uses_delta_enthalpy());
        }
    }

    #[test]
    fn test_explicit_orders() {
        let data = json!({
            "equation": "H2 + O2 => H2O2",
            "rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0},
            "orders": {"H2": 0.5, "O2": 1.5}
        });
        let reaction = Reaction::from_serde(&data, &UnitSystem::default(), &names()).unwrap();
        assert!(!reaction.reversible);
        assert_eq!(reaction.reactant_order(), 2.0);
        assert_eq!(reaction.orders.get("H2"), Some(&0.5));
    }

    #[test]
    fn test_reaction_errors() {
        let units = UnitSystem::default();
        let unknown_type = json!({"equation": "O + H2 <=> H + OH", "type": "chemically-activated",
            "rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0}});
        assert!(matches!(
            Reaction::from_serde(&unknown_type, &units, &names()),
            Err(KineticsError::UnsupportedType(_))
        ));
        let missing_rate = json!({"equation": "O + H2 <=> H + OH"});
        assert!(matches!(
            Reaction::from_serde(&missing_rate, &units, &names()),
            Err(KineticsError::MissingParameter { parameter, .. }) if parameter == "rate-constant"
        ));
        let falloff_without_partner = json!({"equation": "2 OH <=> H2O2", "type": "falloff",
            "low-P-rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0},
            "high-P-rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0}});
        assert!(matches!(
            Reaction::from_serde(&falloff_without_partner, &units, &names()),
            Err(KineticsError::InvalidEquation { .. })
        ));
    }
}
