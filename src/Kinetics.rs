/// molar masses of elements and of species compositions
pub mod molmass;
/// eng
/// The module takes reaction equations and produces:
/// 1) the participants of every reaction with their stoichiometric coefficients, reversibility and
///    collision partner ("+ M", "(+M)", "(+ AR)")
/// 2) matrices of reactant, product and net stoichiometric coefficients (species x reactions)
/// 3) G_matrix: powers of concentrations in the kinetic function. As a rule they coincide with
///    the reactant coefficients, but for empirical reactions explicit orders replace them
///
/// It also checks conservation of elements and duplicate declarations.
pub mod stoichiometry_analyzer;
/// rate constant parameterizations: Arrhenius, Blowers-Masel, falloff (Lindemann and Troe) and
/// pressure-dependent Arrhenius (PLOG), plus third body efficiencies
#[allow(non_snake_case)]
pub mod rate_constants;
/// single reaction parsed from a mechanism file
/// # Examples
/// ```
/// use KiGas::Kinetics::reaction::{Reaction, ReactionType};
/// use KiGas::units::UnitSystem;
/// use serde_json::json;
/// let species: Vec<String> = ["H2", "H", "O", "OH"].iter().map(|s| s.to_string()).collect();
/// let units = UnitSystem::from_serde(&json!({"length": "cm", "quantity": "mol",
///     "activation-energy": "cal/mol"})).unwrap();
/// let data = json!({"equation": "O + H2 <=> H + OH",
///     "rate-constant": {"A": 3.87e4, "b": 2.7, "Ea": 6260.0}});
/// let reaction = Reaction::from_serde(&data, &units, &species).unwrap();
/// assert_eq!(reaction.reaction_type(), ReactionType::Elementary);
/// ```
pub mod reaction;
/// kinetics manager: rate constants, equilibrium constants, rates of progress and production
/// rates of all reactions of a phase, cached against the state of the phase
#[allow(non_snake_case)]
pub mod GasKinetics;
mod GasKinetics_tests;
