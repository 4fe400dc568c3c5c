/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Kinetics::GasKinetics::{GasKinetics, KineticsError};
    use crate::Kinetics::rate_constants::{ArrheniusRate, RateCalculator, RateContext, ReactionRate};
    use crate::Kinetics::reaction::Reaction;
    use crate::Thermodynamics::IdealGasPhase::IdealGasPhase;
    use crate::Thermodynamics::species::Species;
    use crate::Thermodynamics::thermo_models::thermo_api::SpeciesThermoCalculator;
    use crate::Utils::load_from_file::load_mechanism_from_str;
    use crate::units::{GAS_CONSTANT, ONE_ATM, UnitSystem};
    use approx::assert_relative_eq;
    use serde_json::{Value, json};

    fn mechanism() -> Value {
        load_mechanism_from_str(include_str!("../../data/h2o2_small.yaml")).unwrap()
    }

    fn species_pool(mech: &Value, units: &UnitSystem) -> Vec<Species> {
        mech["species"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| Species::from_serde(s, units).unwrap())
            .collect()
    }

    fn h2o2() -> (IdealGasPhase, GasKinetics) {
        let mech = mechanism();
        let units = UnitSystem::from_serde(&mech["units"]).unwrap();
        let pool = species_pool(&mech, &units);
        let phase = IdealGasPhase::from_serde(&mech["phases"][0], &pool, &units).unwrap();
        let kinetics =
            GasKinetics::from_serde(&phase, mech["reactions"].as_array().unwrap(), &units).unwrap();
        (phase, kinetics)
    }

    fn reacting_state(phase: &mut IdealGasPhase) {
        phase.set_TP(1500.0, ONE_ATM).unwrap();
        phase
            .set_mole_fractions_by_name(
                "H2:2, O2:1, H:0.1, O:0.1, OH:0.1, HO2:0.01, H2O2:0.01, H2O:0.5, AR:1",
            )
            .unwrap();
    }

    #[test]
    fn test_reactions_are_loaded() {
        let (_, kinetics) = h2o2();
        assert_eq!(kinetics.n_reactions(), 8);
        let equations = kinetics.reaction_equations();
        assert_eq!(equations[0], "2 O + M <=> O2 + M");
        assert_eq!(equations[6], "2 OH (+M) <=> H2O2 (+M)");
        assert_eq!(kinetics.reaction(3).unwrap().rate.rate_type(), "Blowers-Masel");
        assert!(matches!(
            kinetics.reaction(8),
            Err(KineticsError::IndexOutOfRange { index: 8, n_reactions: 8 })
        ));
        // species x reactions
        assert_eq!(kinetics.stoich.stecheo_matrx.shape(), (9, 8));
        assert_eq!(kinetics.stoich.delta_moles()[0], -1.0);
    }

    #[test]
    fn test_arrhenius_and_blowers_masel_constants() {
        let (phase, kinetics) = h2o2();
        assert_eq!(phase.temperature(), 300.0);
        let kf = kinetics.forward_rate_constants(&phase).unwrap();
        assert_relative_eq!(kf[2], 5195.447, max_relative = 1e-5);
        assert_relative_eq!(kf[3], 947.58, max_relative = 1e-4);
        let dH = kinetics.delta_enthalpy(&phase).unwrap();
        assert_relative_eq!(dH[2], 8170274.38, max_relative = 1e-6);
        // for an ideal gas partial molar and standard enthalpies coincide
        let dH0 = kinetics.delta_standard_enthalpy(&phase).unwrap();
        assert_relative_eq!(dH[2], dH0[2], max_relative = 1e-12);
    }

    #[test]
    fn test_species_modification_reaches_rate_constants() {
        let (mut phase, kinetics) = h2o2();
        let before = kinetics.forward_rate_constants(&phase).unwrap();
        let k = phase.species_index("OH").unwrap();
        let mut oh = phase.species(k).unwrap().clone();
        oh.thermo.shift_enthalpy(1e7);
        phase.modify_species(k, oh).unwrap();
        let after = kinetics.forward_rate_constants(&phase).unwrap();
        assert_eq!(before[2], after[2]);
        assert_relative_eq!(after[3], 99.224, max_relative = 1e-4);
        let dH = kinetics.delta_enthalpy(&phase).unwrap();
        assert_relative_eq!(dH[2], 8170274.38 + 1e7, max_relative = 1e-6);
    }

    #[test]
    fn test_equilibrium_and_reverse_constants() {
        let (mut phase, kinetics) = h2o2();
        reacting_state(&mut phase);
        let T = phase.temperature();
        let RT = GAS_CONSTANT * T;
        let kf = kinetics.forward_rate_constants(&phase).unwrap();
        let kr = kinetics.reverse_rate_constants(&phase).unwrap();
        let Kc = kinetics.equilibrium_constants(&phase).unwrap();
        let dG0 = kinetics.delta_standard_gibbs(&phase).unwrap();
        // 2 O + M <=> O2 + M loses one mole
        let expected = (-dG0[0] / RT).exp() * (phase.reference_pressure() / RT).powf(-1.0);
        assert_relative_eq!(Kc[0], expected, max_relative = 1e-12);
        // O + H2 <=> H + OH keeps the number of moles
        assert_relative_eq!(Kc[2], (-dG0[2] / RT).exp(), max_relative = 1e-12);
        for i in 0..kinetics.n_reactions() {
            assert_relative_eq!(kr[i], kf[i] / Kc[i], max_relative = 1e-12);
        }
        let dS0 = kinetics.delta_standard_entropy(&phase).unwrap();
        let dH0 = kinetics.delta_standard_enthalpy(&phase).unwrap();
        assert_relative_eq!(dG0[5], dH0[5] - T * dS0[5], max_relative = 1e-9);
    }

    #[test]
    fn test_three_body_rates_of_progress() {
        let (mut phase, kinetics) = h2o2();
        reacting_state(&mut phase);
        let C = phase.concentrations();
        let idx = |name: &str| phase.species_index(name).unwrap();
        let M = C[idx("H2")] * 2.4 + C[idx("H2O")] * 15.4 + C[idx("AR")] * 0.83
            + C[idx("H")]
            + C[idx("O")]
            + C[idx("OH")]
            + C[idx("O2")]
            + C[idx("HO2")]
            + C[idx("H2O2")];
        let third_body = kinetics.third_body_concentrations(&phase).unwrap();
        assert_relative_eq!(third_body[0], M, max_relative = 1e-12);
        assert_eq!(third_body[2], 0.0);

        let kf = kinetics.forward_rate_constants(&phase).unwrap();
        let kr = kinetics.reverse_rate_constants(&phase).unwrap();
        let ropf = kinetics.forward_rates_of_progress(&phase).unwrap();
        let ropr = kinetics.reverse_rates_of_progress(&phase).unwrap();
        assert_relative_eq!(ropf[0], kf[0] * C[idx("O")].powi(2) * M, max_relative = 1e-12);
        assert_relative_eq!(ropr[0], kr[0] * C[idx("O2")] * M, max_relative = 1e-12);
        // bimolecular reaction without third body
        assert_relative_eq!(ropf[4], kf[4] * C[idx("OH")] * C[idx("H2")], max_relative = 1e-12);
        let net = kinetics.net_rates_of_progress(&phase).unwrap();
        assert_relative_eq!(net[4], ropf[4] - ropr[4], max_relative = 1e-12);
    }

    #[test]
    fn test_falloff_and_plog_constants() {
        let (mut phase, kinetics) = h2o2();
        reacting_state(&mut phase);
        let (T, P) = (phase.temperature(), phase.pressure());
        let kf = kinetics.forward_rate_constants(&phase).unwrap();
        let M = kinetics.third_body_concentrations(&phase).unwrap();
        let ReactionRate::Falloff(falloff) = &kinetics.reaction(6).unwrap().rate else {
            panic!("reaction 7 must be falloff");
        };
        let ctx = RateContext::new(T, P).with_third_body(M[6]);
        assert_relative_eq!(kf[6], falloff.K_const(&ctx), max_relative = 1e-12);
        assert!(kf[6] < falloff.high.K(T));
        // falloff constant does not multiply the rate of progress by [M] again
        let C = phase.concentrations();
        let ropf = kinetics.forward_rates_of_progress(&phase).unwrap();
        let k_OH = phase.species_index("OH").unwrap();
        assert_relative_eq!(ropf[6], kf[6] * C[k_OH].powi(2), max_relative = 1e-12);

        // exactly at 1 atm the PLOG table entry applies; A converted from cm3/mol/s
        let at_1_atm = ArrheniusRate::new(4.9108e31 * 1e-3, -4.8507, 2.47728e4 * 4184.0);
        assert_relative_eq!(kf[7], at_1_atm.K(T), max_relative = 1e-9);
    }

    #[test]
    fn test_production_rates_conserve_elements() {
        let (mut phase, kinetics) = h2o2();
        reacting_state(&mut phase);
        let wdot = kinetics.net_production_rates(&phase).unwrap();
        let creation = kinetics.creation_rates(&phase).unwrap();
        let destruction = kinetics.destruction_rates(&phase).unwrap();
        for k in 0..phase.n_species() {
            assert_relative_eq!(
                wdot[k],
                creation[k] - destruction[k],
                epsilon = 1e-9 * creation[k].abs().max(destruction[k].abs()).max(1.0)
            );
        }
        let scale = creation.amax();
        for element in ["H", "O", "Ar"] {
            let total: f64 = (0..phase.n_species())
                .map(|k| phase.species(k).unwrap().n_atoms(element) * wdot[k])
                .sum();
            assert!(total.abs() < 1e-9 * scale, "{} is not conserved: {}", element, total);
        }
        // argon only acts as a collision partner
        assert_eq!(wdot[phase.species_index("AR").unwrap()], 0.0);
    }

    #[test]
    fn test_cache_follows_state() {
        let (mut phase, kinetics) = h2o2();
        let k300 = kinetics.forward_rate_constants(&phase).unwrap();
        assert_eq!(k300, kinetics.forward_rate_constants(&phase).unwrap());
        phase.set_temperature(1000.0).unwrap();
        let k1000 = kinetics.forward_rate_constants(&phase).unwrap();
        assert!(k1000[2] > k300[2]);
        phase.set_temperature(300.0).unwrap();
        assert_eq!(k300, kinetics.forward_rate_constants(&phase).unwrap());
    }

    #[test]
    fn test_cache_distinguishes_phases_with_equal_history() {
        let (phase, kinetics) = h2o2();
        // two clones, each changed once: one through its species data, one through its state
        let mut perturbed = phase.clone();
        let k = perturbed.species_index("OH").unwrap();
        let mut oh = perturbed.species(k).unwrap().clone();
        oh.thermo.shift_enthalpy(1e7);
        perturbed.modify_species(k, oh).unwrap();
        let mut reset = phase.clone();
        reset.set_temperature(300.0).unwrap();
        assert_ne!(perturbed.state_number(), reset.state_number());

        let kf_perturbed = kinetics.forward_rate_constants(&perturbed).unwrap();
        assert_relative_eq!(kf_perturbed[3], 99.224, max_relative = 1e-4);
        let kf_reset = kinetics.forward_rate_constants(&reset).unwrap();
        assert_relative_eq!(kf_reset[3], 947.58, max_relative = 1e-4);
        // an unchanged clone describes the same state and may share the cache
        let kf_clone = kinetics.forward_rate_constants(&reset.clone()).unwrap();
        assert_eq!(kf_clone, kf_reset);
    }

    #[test]
    fn test_modify_reaction() {
        let (phase, mut kinetics) = h2o2();
        let names = phase.species_names();
        let units = UnitSystem::default();
        let faster = Reaction::from_serde(
            &json!({"equation": "OH + H2 <=> H + H2O", "rate-constant": {"A": 1e9, "b": 0.0, "Ea": 0.0}}),
            &units,
            &names,
        )
        .unwrap();
        kinetics.modify_reaction(4, faster).unwrap();
        assert_relative_eq!(kinetics.forward_rate_constants(&phase).unwrap()[4], 1e9);

        let other = Reaction::from_serde(
            &json!({"equation": "H + O2 <=> O + OH", "rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0}}),
            &units,
            &names,
        )
        .unwrap();
        assert!(matches!(
            kinetics.modify_reaction(4, other),
            Err(KineticsError::IncompatibleReaction { index: 4, .. })
        ));
        let blowers_masel = Reaction::from_serde(
            &json!({"equation": "OH + H2 <=> H + H2O", "type": "Blowers-Masel",
                "rate-constant": {"A": 1.0, "b": 0.0, "Ea0": 1.0, "w0": 10.0}}),
            &units,
            &names,
        )
        .unwrap();
        assert!(kinetics.modify_reaction(4, blowers_masel).is_err());
    }

    #[test]
    fn test_mechanism_errors() {
        let (phase, _) = h2o2();
        let names = phase.species_names();
        let units = UnitSystem::default();
        let unbalanced = Reaction::from_serde(
            &json!({"equation": "O + H2 <=> H + H", "rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0}}),
            &units,
            &names,
        )
        .unwrap();
        assert!(matches!(
            GasKinetics::new(&phase, vec![unbalanced]),
            Err(KineticsError::Unbalanced { element, .. }) if element == "O"
        ));

        let entry = json!({"equation": "OH + H2 <=> H + H2O", "rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0}});
        let reverse = json!({"equation": "H + H2O => OH + H2", "rate-constant": {"A": 1.0, "b": 0.0, "Ea": 0.0}});
        let reactions = vec![
            Reaction::from_serde(&entry, &units, &names).unwrap(),
            Reaction::from_serde(&reverse, &units, &names).unwrap(),
        ];
        assert!(matches!(
            GasKinetics::new(&phase, reactions),
            Err(KineticsError::UndeclaredDuplicate { first: 0, second: 1, .. })
        ));
    }

    #[test]
    fn test_phase_mismatch() {
        let mech = mechanism();
        let units = UnitSystem::from_serde(&mech["units"]).unwrap();
        let pool = species_pool(&mech, &units);
        let (_, kinetics) = h2o2();
        let small = IdealGasPhase::from_serde(&mech["phases"][1], &pool, &units).unwrap();
        assert_eq!(small.n_species(), 4);
        assert!(matches!(
            kinetics.forward_rate_constants(&small),
            Err(KineticsError::PhaseMismatch { .. })
        ));
    }
}
