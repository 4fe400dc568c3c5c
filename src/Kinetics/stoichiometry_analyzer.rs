use crate::Kinetics::GasKinetics::KineticsError;
use crate::Kinetics::reaction::Reaction;
use crate::Thermodynamics::IdealGasPhase::IdealGasPhase;
use log::warn;
use nalgebra::{DMatrix, DVector};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// tolerance of element balance checks, relative to the number of atoms involved
const BALANCE_TOLERANCE: f64 = 1e-6;

/// reaction equation split into its parts
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEquation {
    pub reactants: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    pub reversible: bool,
    /// "M" or the name of the collision partner
    pub third_body: Option<String>,
    /// collision partner written in parentheses, "(+M)"
    pub falloff_partner: bool,
}

/// splits a term like "2 OH", "2OH" or "OH" into species name and coefficient
fn parse_term(term: &str, known_species: &[String], equation: &str) -> Result<(String, f64), KineticsError> {
    if known_species.iter().any(|s| s == term) {
        return Ok((term.to_string(), 1.0));
    }
    let split = term
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(term.len());
    let (number, name) = term.split_at(split);
    let name = name.trim();
    if !number.is_empty() {
        if let Ok(coefficient) = number.parse::<f64>() {
            if known_species.iter().any(|s| s == name) {
                return Ok((name.to_string(), coefficient));
            }
        }
    }
    Err(KineticsError::UnknownSpecies {
        equation: equation.to_string(),
        species: if name.is_empty() { term.to_string() } else { name.to_string() },
    })
}

/// parses "2 O + M <=> O2 + M", "2 OH (+M) <=> H2O2 (+M)", "A => B" ...
/// `known_species` are the species of the phase; every participant must be one of them
pub fn parse_equation(equation: &str, known_species: &[String]) -> Result<ParsedEquation, KineticsError> {
    let invalid = |message: &str| KineticsError::InvalidEquation {
        equation: equation.to_string(),
        message: message.to_string(),
    };
    let falloff_re = Regex::new(r"\(\s*\+\s*([^\s()]+)\s*\)").map_err(|e| invalid(&e.to_string()))?;
    let plus_re = Regex::new(r"\s+\+\s+").map_err(|e| invalid(&e.to_string()))?;

    let partners: Vec<String> = falloff_re
        .captures_iter(equation)
        .map(|cap| cap[1].to_string())
        .collect();
    let falloff_partner = !partners.is_empty();
    let stripped = falloff_re.replace_all(equation, " ").to_string();

    let (lhs, rhs, reversible) = if let Some((l, r)) = stripped.split_once("<=>") {
        (l, r, true)
    } else if let Some((l, r)) = stripped.split_once("=>") {
        (l, r, false)
    } else if let Some((l, r)) = stripped.split_once('=') {
        (l, r, true)
    } else {
        return Err(invalid("no '<=>', '=>' or '=' separator"));
    };

    let mut third_body_sides = 0;
    let mut parse_side = |side: &str| -> Result<BTreeMap<String, f64>, KineticsError> {
        let mut participants = BTreeMap::new();
        let mut has_third_body = false;
        for term in plus_re.split(side.trim()) {
            let term = term.trim();
            if term.is_empty() {
                return Err(invalid("empty term"));
            }
            if term == "M" {
                has_third_body = true;
                continue;
            }
            let (name, coefficient) = parse_term(term, known_species, equation)?;
            *participants.entry(name).or_insert(0.0) += coefficient;
        }
        if has_third_body {
            third_body_sides += 1;
        }
        Ok(participants)
    };
    let reactants = parse_side(lhs)?;
    let products = parse_side(rhs)?;
    if reactants.is_empty() || products.is_empty() {
        return Err(invalid("reaction needs reactants and products"));
    }

    let third_body = match (third_body_sides, partners.as_slice()) {
        (0, []) => None,
        (2, []) => Some("M".to_string()),
        (0, [left, right]) if left == right => {
            if left != "M" && !known_species.iter().any(|s| s == left) {
                return Err(KineticsError::UnknownSpecies {
                    equation: equation.to_string(),
                    species: left.clone(),
                });
            }
            Some(left.clone())
        }
        _ => return Err(invalid("collision partner must appear once on each side")),
    };

    Ok(ParsedEquation {
        reactants,
        products,
        reversible,
        third_body,
        falloff_partner,
    })
}

/// stoichiometric matrices of a set of reactions; rows are species, columns are reactions
#[derive(Debug, Clone)]
pub struct StoichAnalyzer {
    pub substances: Vec<String>,
    pub reactions: Vec<String>,
    /// reactant coefficients
    pub reactant_matrix: DMatrix<f64>,
    /// product coefficients
    pub product_matrix: DMatrix<f64>,
    /// net coefficients: products minus reactants
    pub stecheo_matrx: DMatrix<f64>,
    /// powers of concentrations in the forward rate of progress: reactant coefficients unless
    /// the reaction declares explicit orders
    pub G_matrix: DMatrix<f64>,
}

impl Default for StoichAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StoichAnalyzer {
    pub fn new() -> Self {
        Self {
            substances: Vec::new(),
            reactions: Vec::new(),
            reactant_matrix: DMatrix::zeros(0, 0),
            product_matrix: DMatrix::zeros(0, 0),
            stecheo_matrx: DMatrix::zeros(0, 0),
            G_matrix: DMatrix::zeros(0, 0),
        }
    }

    pub fn analyse_reactions(&mut self, substances: &[String], reactions: &[Reaction]) -> Result<(), KineticsError> {
        let (n_s, n_r) = (substances.len(), reactions.len());
        let index = |name: &str, equation: &str| {
            substances
                .iter()
                .position(|s| s == name)
                .ok_or_else(|| KineticsError::UnknownSpecies {
                    equation: equation.to_string(),
                    species: name.to_string(),
                })
        };
        let mut reactant_matrix = DMatrix::zeros(n_s, n_r);
        let mut product_matrix = DMatrix::zeros(n_s, n_r);
        let mut G_matrix = DMatrix::zeros(n_s, n_r);
        for (i, reaction) in reactions.iter().enumerate() {
            for (name, nu) in &reaction.reactants {
                let k = index(name, &reaction.equation)?;
                reactant_matrix[(k, i)] = *nu;
                G_matrix[(k, i)] = *nu;
            }
            for (name, nu) in &reaction.products {
                product_matrix[(index(name, &reaction.equation)?, i)] = *nu;
            }
            for (name, order) in &reaction.orders {
                G_matrix[(index(name, &reaction.equation)?, i)] = *order;
            }
        }
        self.substances = substances.to_vec();
        self.reactions = reactions.iter().map(|r| r.equation.clone()).collect();
        self.stecheo_matrx = &product_matrix - &reactant_matrix;
        self.reactant_matrix = reactant_matrix;
        self.product_matrix = product_matrix;
        self.G_matrix = G_matrix;
        Ok(())
    }

    /// change of the number of moles in each reaction
    pub fn delta_moles(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.stecheo_matrx.ncols(),
            self.stecheo_matrx.column_iter().map(|col| col.sum()),
        )
    }
}

/// checks conservation of every element in a reaction
pub fn check_balance(reaction: &Reaction, phase: &IdealGasPhase) -> Result<(), KineticsError> {
    let mut balance: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    let mut add = |participants: &BTreeMap<String, f64>, sign: f64| -> Result<(), KineticsError> {
        for (name, nu) in participants {
            let species = phase
                .species_by_name(name)
                .map_err(|_| KineticsError::UnknownSpecies {
                    equation: reaction.equation.clone(),
                    species: name.clone(),
                })?;
            for (element, n_atoms) in &species.composition {
                let entry = balance.entry(element.clone()).or_insert((0.0, 0.0));
                entry.0 += sign * nu * n_atoms;
                entry.1 += nu * n_atoms;
            }
        }
        Ok(())
    };
    add(&reaction.products, 1.0)?;
    add(&reaction.reactants, -1.0)?;
    for (element, (difference, total)) in balance {
        if difference.abs() > BALANCE_TOLERANCE * total.max(1.0) {
            return Err(KineticsError::Unbalanced {
                equation: reaction.equation.clone(),
                element,
                difference,
            });
        }
    }
    Ok(())
}

/// reactions with the same participants (and the same collision partner) must all be
/// declared as duplicates
pub fn check_duplicates(reactions: &[Reaction]) -> Result<(), KineticsError> {
    let mut matched = BTreeSet::new();
    for i in 0..reactions.len() {
        for j in (i + 1)..reactions.len() {
            let (a, b) = (&reactions[i], &reactions[j]);
            if a.collision_partner() != b.collision_partner() {
                continue;
            }
            let same_direction = a.reactants == b.reactants && a.products == b.products;
            let opposite_direction = a.reactants == b.products
                && a.products == b.reactants
                && (a.reversible || b.reversible);
            if !(same_direction || opposite_direction) {
                continue;
            }
            if !(a.duplicate && b.duplicate) {
                return Err(KineticsError::UndeclaredDuplicate {
                    first: i,
                    second: j,
                    equation: a.equation.clone(),
                });
            }
            matched.insert(i);
            matched.insert(j);
        }
    }
    for (i, reaction) in reactions.iter().enumerate() {
        if reaction.duplicate && !matched.contains(&i) {
            warn!(
                "reaction {} '{}' is declared duplicate but has no duplicate",
                i, reaction.equation
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn known() -> Vec<String> {
        species(&["H2", "H", "O", "OH", "O2", "H2O", "HO2", "H2O2", "AR"])
    }

    #[test]
    fn test_parse_simple_equation() {
        let parsed = parse_equation("O + H2 <=> H + OH", &known()).unwrap();
        assert_eq!(parsed.reactants, BTreeMap::from([("O".to_string(), 1.0), ("H2".to_string(), 1.0)]));
        assert_eq!(parsed.products, BTreeMap::from([("H".to_string(), 1.0), ("OH".to_string(), 1.0)]));
        assert!(parsed.reversible);
        assert_eq!(parsed.third_body, None);
        assert!(!parsed.falloff_partner);
    }

    #[test]
    fn test_parse_coefficients_and_separators() {
        let parsed = parse_equation("2 O + M <=> O2 + M", &known()).unwrap();
        assert_eq!(parsed.reactants, BTreeMap::from([("O".to_string(), 2.0)]));
        assert_eq!(parsed.third_body.as_deref(), Some("M"));
        assert!(!parsed.falloff_partner);

        let parsed = parse_equation("2OH => H2O2", &known()).unwrap();
        assert_eq!(parsed.reactants, BTreeMap::from([("OH".to_string(), 2.0)]));
        assert!(!parsed.reversible);

        let parsed = parse_equation("H + H = H2", &known()).unwrap();
        assert_eq!(parsed.reactants, BTreeMap::from([("H".to_string(), 2.0)]));
        assert!(parsed.reversible);
    }

    #[test]
    fn test_parse_falloff_partners() {
        let parsed = parse_equation("2 OH (+M) <=> H2O2 (+M)", &known()).unwrap();
        assert_eq!(parsed.third_body.as_deref(), Some("M"));
        assert!(parsed.falloff_partner);
        assert_eq!(parsed.products, BTreeMap::from([("H2O2".to_string(), 1.0)]));

        let parsed = parse_equation("H + O2 (+ AR) <=> HO2 (+ AR)", &known()).unwrap();
        assert_eq!(parsed.third_body.as_deref(), Some("AR"));
        assert!(parsed.falloff_partner);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_equation("O + XY <=> OH", &known()),
            Err(KineticsError::UnknownSpecies { species, .. }) if species == "XY"
        ));
        assert!(matches!(
            parse_equation("O + H2 -> H + OH", &known()),
            Err(KineticsError::InvalidEquation { .. })
        ));
        assert!(matches!(
            parse_equation("2 O + M <=> O2", &known()),
            Err(KineticsError::InvalidEquation { .. })
        ));
        assert!(matches!(
            parse_equation("2 OH (+M) <=> H2O2 (+AR)", &known()),
            Err(KineticsError::InvalidEquation { .. })
        ));
    }
}
