//! Kinetics manager of a gas phase.
//!
//! `GasKinetics` owns the reactions of a phase and their stoichiometry. Everything that depends
//! on the state of the phase (rate constants, equilibrium constants, third body concentrations)
//! is computed lazily and cached against `IdealGasPhase::state_number`, so repeated queries at
//! one state cost nothing and any change of T, P, composition or species data is picked up.
use crate::Kinetics::rate_constants::{RateCalculator, RateContext};
use crate::Kinetics::reaction::{Reaction, ReactionType};
use crate::Kinetics::stoichiometry_analyzer::{StoichAnalyzer, check_balance, check_duplicates};
use crate::Thermodynamics::IdealGasPhase::{IdealGasPhase, PhaseError};
use crate::units::{GAS_CONSTANT, UnitError, UnitSystem};
use log::{debug, info};
use nalgebra::DVector;
use serde_json::Value;
use std::cell::RefCell;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KineticsError {
    #[error("reaction '{equation}': unknown species '{species}'")]
    UnknownSpecies { equation: String, species: String },
    #[error("invalid equation '{equation}': {message}")]
    InvalidEquation { equation: String, message: String },
    #[error("reaction '{equation}': missing parameter '{parameter}'")]
    MissingParameter { equation: String, parameter: String },
    #[error("reaction '{equation}': {message}")]
    InvalidParameter { equation: String, message: String },
    #[error("unsupported reaction type: {0}")]
    UnsupportedType(String),
    #[error("reaction '{equation}' is not balanced in element '{element}' (difference {difference})")]
    Unbalanced {
        equation: String,
        element: String,
        difference: f64,
    },
    #[error("reactions {first} and {second} ('{equation}') are duplicates but not declared as such")]
    UndeclaredDuplicate {
        first: usize,
        second: usize,
        equation: String,
    },
    #[error("reaction index {index} is out of range, mechanism has {n_reactions} reactions")]
    IndexOutOfRange { index: usize, n_reactions: usize },
    #[error("cannot replace reaction {index}: {reason}")]
    IncompatibleReaction { index: usize, reason: String },
    #[error("phase has species {found:?}, kinetics was built for {expected:?}")]
    PhaseMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error(transparent)]
    Unit(#[from] UnitError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Phase(#[from] PhaseError),
}

/// state dependent quantities of all reactions
#[derive(Debug, Clone)]
struct RateCache {
    state_number: u64,
    /// forward rate constants
    kf: DVector<f64>,
    /// equilibrium constants in concentration units
    Kc: DVector<f64>,
    /// reverse rate constants
    kr: DVector<f64>,
    /// effective third body concentrations, zero for reactions without third body
    M: DVector<f64>,
}

#[derive(Debug, Clone)]
pub struct GasKinetics {
    species_names: Vec<String>,
    reactions: Vec<Reaction>,
    pub stoich: StoichAnalyzer,
    /// third body efficiencies in phase species order
    efficiencies: Vec<Option<DVector<f64>>>,
    cache: RefCell<Option<RateCache>>,
}

impl GasKinetics {
    /// checks element balance and duplicates of `reactions` against the species of `phase`
    pub fn new(phase: &IdealGasPhase, reactions: Vec<Reaction>) -> Result<Self, KineticsError> {
        for reaction in &reactions {
            check_balance(reaction, phase)?;
        }
        check_duplicates(&reactions)?;
        let species_names = phase.species_names();
        let mut stoich = StoichAnalyzer::new();
        stoich.analyse_reactions(&species_names, &reactions)?;
        let efficiencies = reactions
            .iter()
            .map(|r| r.third_body.as_ref().map(|tb| tb.efficiency_vector(&species_names)))
            .collect();
        info!(
            "kinetics of phase '{}': {} reactions",
            phase.name,
            reactions.len()
        );
        Ok(Self {
            species_names,
            reactions,
            stoich,
            efficiencies,
            cache: RefCell::new(None),
        })
    }

    /// parses a list of reaction entries of a mechanism file
    pub fn from_serde(
        phase: &IdealGasPhase,
        reaction_list: &[Value],
        units: &UnitSystem,
    ) -> Result<Self, KineticsError> {
        let species_names = phase.species_names();
        let reactions = reaction_list
            .iter()
            .map(|data| Reaction::from_serde(data, units, &species_names))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(phase, reactions)
    }

    ////////////////////////////////////REACTIONS///////////////////////////////////////////
    pub fn n_reactions(&self) -> usize {
        self.reactions.len()
    }
    pub fn reaction(&self, i: usize) -> Result<&Reaction, KineticsError> {
        self.reactions.get(i).ok_or(KineticsError::IndexOutOfRange {
            index: i,
            n_reactions: self.reactions.len(),
        })
    }
    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }
    pub fn reaction_equations(&self) -> Vec<String> {
        self.reactions.iter().map(|r| r.equation.clone()).collect()
    }
    pub fn species_names(&self) -> &[String] {
        &self.species_names
    }

    /// replaces the rate parameters of reaction `i`; participants and rate type must stay the same
    pub fn modify_reaction(&mut self, i: usize, reaction: Reaction) -> Result<(), KineticsError> {
        let old = self.reaction(i)?;
        let incompatible = |reason: String| KineticsError::IncompatibleReaction { index: i, reason };
        if !old.same_stoichiometry(&reaction) {
            return Err(incompatible(format!(
                "'{}' has different participants than '{}'",
                reaction.equation, old.equation
            )));
        }
        if old.reaction_type() != reaction.reaction_type() {
            return Err(incompatible(format!(
                "rate type changed from {} to {}",
                old.reaction_type().name(),
                reaction.reaction_type().name()
            )));
        }
        info!("reaction {} '{}' modified", i, reaction.equation);
        self.efficiencies[i] = reaction
            .third_body
            .as_ref()
            .map(|tb| tb.efficiency_vector(&self.species_names));
        self.reactions[i] = reaction;
        // orders may have changed
        self.stoich
            .analyse_reactions(&self.species_names, &self.reactions)?;
        self.cache.replace(None);
        Ok(())
    }

    ////////////////////////////////////THERMO CHANGES///////////////////////////////////////////
    fn delta(&self, per_species: &DVector<f64>) -> DVector<f64> {
        self.stoich.stecheo_matrx.tr_mul(per_species)
    }
    /// enthalpy change of each reaction, J/kmol
    pub fn delta_enthalpy(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.check_phase(phase)?;
        Ok(self.delta(&phase.partial_molar_enthalpies()))
    }
    /// J/kmol/K
    pub fn delta_entropy(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.check_phase(phase)?;
        Ok(self.delta(&phase.partial_molar_entropies()))
    }
    /// J/kmol
    pub fn delta_gibbs(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.check_phase(phase)?;
        Ok(self.delta(&phase.partial_molar_gibbs()))
    }
    pub fn delta_standard_enthalpy(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.check_phase(phase)?;
        let RT = GAS_CONSTANT * phase.temperature();
        Ok(self.delta(phase.standard_enthalpies_RT()) * RT)
    }
    pub fn delta_standard_entropy(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.check_phase(phase)?;
        Ok(self.delta(phase.standard_entropies_R()) * GAS_CONSTANT)
    }
    pub fn delta_standard_gibbs(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.check_phase(phase)?;
        let RT = GAS_CONSTANT * phase.temperature();
        Ok(self.delta(&phase.standard_gibbs_RT()) * RT)
    }

    ////////////////////////////////////RATE CONSTANTS///////////////////////////////////////////
    fn check_phase(&self, phase: &IdealGasPhase) -> Result<(), KineticsError> {
        let same = phase
            .all_species()
            .iter()
            .map(|s| &s.name)
            .eq(self.species_names.iter());
        if !same {
            return Err(KineticsError::PhaseMismatch {
                expected: self.species_names.clone(),
                found: phase.species_names(),
            });
        }
        Ok(())
    }

    /// recomputes the cached rate data if the phase changed since the last call
    fn update_rates(&self, phase: &IdealGasPhase) -> Result<(), KineticsError> {
        self.check_phase(phase)?;
        let state_number = phase.state_number();
        if let Some(cache) = self.cache.borrow().as_ref() {
            if cache.state_number == state_number {
                return Ok(());
            }
        }
        let (T, P) = (phase.temperature(), phase.pressure());
        let RT = GAS_CONSTANT * T;
        let C = phase.concentrations();
        let dH = self.delta(&phase.partial_molar_enthalpies());
        let dG0 = self.delta(&phase.standard_gibbs_RT()) * RT;
        let dn = self.stoich.delta_moles();
        let C_ref = phase.reference_pressure() / RT;

        let n = self.reactions.len();
        let mut kf = DVector::zeros(n);
        let mut Kc = DVector::zeros(n);
        let mut kr = DVector::zeros(n);
        let mut M = DVector::zeros(n);
        let base = RateContext::new(T, P);
        for (i, reaction) in self.reactions.iter().enumerate() {
            if let Some(eff) = &self.efficiencies[i] {
                M[i] = eff.dot(&C);
            }
            let ctx = base.with_third_body(M[i]).with_delta_enthalpy(dH[i]);
            kf[i] = reaction.rate.K_const(&ctx);
            Kc[i] = (-dG0[i] / RT).exp() * C_ref.powf(dn[i]);
            kr[i] = if reaction.reversible && Kc[i] > 0.0 {
                kf[i] / Kc[i]
            } else {
                0.0
            };
        }
        debug!(
            "rate constants of {} reactions recomputed at T = {} K, P = {} Pa",
            n, T, P
        );
        self.cache.replace(Some(RateCache {
            state_number,
            kf,
            Kc,
            kr,
            M,
        }));
        Ok(())
    }

    fn cached<F>(&self, phase: &IdealGasPhase, get: F) -> Result<DVector<f64>, KineticsError>
    where
        F: Fn(&RateCache) -> &DVector<f64>,
    {
        self.update_rates(phase)?;
        let cache = self.cache.borrow();
        match cache.as_ref() {
            Some(c) => Ok(get(c).clone()),
            None => Ok(DVector::zeros(self.reactions.len())),
        }
    }

    /// forward rate constants in SI-kmol units. Falloff constants include the falloff function,
    /// three-body constants do not include [M]
    pub fn forward_rate_constants(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.cached(phase, |c| &c.kf)
    }
    /// zero for irreversible reactions
    pub fn reverse_rate_constants(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.cached(phase, |c| &c.kr)
    }
    /// Kc = exp(-dG0/RT) (P0/RT)^dn
    pub fn equilibrium_constants(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.cached(phase, |c| &c.Kc)
    }
    /// effective third body concentrations, kmol/m3
    pub fn third_body_concentrations(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.cached(phase, |c| &c.M)
    }

    ////////////////////////////////////RATES OF PROGRESS///////////////////////////////////////////
    fn mass_action(&self, i: usize, C: &DVector<f64>, powers: &nalgebra::DMatrix<f64>) -> f64 {
        powers
            .column(i)
            .iter()
            .zip(C.iter())
            .filter(|(p, _)| **p != 0.0)
            .map(|(p, c)| c.max(0.0).powf(*p))
            .product()
    }

    /// kmol/m3/s
    pub fn forward_rates_of_progress(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.update_rates(phase)?;
        let C = phase.concentrations();
        let cache = self.cache.borrow();
        let Some(cache) = cache.as_ref() else {
            return Ok(DVector::zeros(self.reactions.len()));
        };
        Ok(DVector::from_iterator(
            self.reactions.len(),
            self.reactions.iter().enumerate().map(|(i, reaction)| {
                let rop = cache.kf[i] * self.mass_action(i, &C, &self.stoich.G_matrix);
                if reaction.reaction_type() == ReactionType::ThreeBody {
                    rop * cache.M[i]
                } else {
                    rop
                }
            }),
        ))
    }
    /// kmol/m3/s
    pub fn reverse_rates_of_progress(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        self.update_rates(phase)?;
        let C = phase.concentrations();
        let cache = self.cache.borrow();
        let Some(cache) = cache.as_ref() else {
            return Ok(DVector::zeros(self.reactions.len()));
        };
        Ok(DVector::from_iterator(
            self.reactions.len(),
            self.reactions.iter().enumerate().map(|(i, reaction)| {
                if cache.kr[i] == 0.0 {
                    return 0.0;
                }
                let rop = cache.kr[i] * self.mass_action(i, &C, &self.stoich.product_matrix);
                if reaction.reaction_type() == ReactionType::ThreeBody {
                    rop * cache.M[i]
                } else {
                    rop
                }
            }),
        ))
    }
    pub fn net_rates_of_progress(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        Ok(self.forward_rates_of_progress(phase)? - self.reverse_rates_of_progress(phase)?)
    }

    ////////////////////////////////////PRODUCTION RATES///////////////////////////////////////////
    /// kmol/m3/s for every species of the phase
    pub fn creation_rates(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        let ropf = self.forward_rates_of_progress(phase)?;
        let ropr = self.reverse_rates_of_progress(phase)?;
        Ok(&self.stoich.product_matrix * ropf + &self.stoich.reactant_matrix * ropr)
    }
    pub fn destruction_rates(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        let ropf = self.forward_rates_of_progress(phase)?;
        let ropr = self.reverse_rates_of_progress(phase)?;
        Ok(&self.stoich.reactant_matrix * ropf + &self.stoich.product_matrix * ropr)
    }
    pub fn net_production_rates(&self, phase: &IdealGasPhase) -> Result<DVector<f64>, KineticsError> {
        Ok(&self.stoich.stecheo_matrx * self.net_rates_of_progress(phase)?)
    }
}
