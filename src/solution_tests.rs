/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Kinetics::GasKinetics::KineticsError;
    use crate::Kinetics::rate_constants::ReactionRate;
    use crate::Thermodynamics::IdealGasPhase::PhaseError;
    use crate::Thermodynamics::thermo_models::ConstCpData::ConstCpThermo;
    use crate::Thermodynamics::thermo_models::thermo_api::SpeciesThermo;
    use crate::solution::{Solution, SolutionError, T_STANDARD};
    use crate::units::{GAS_CONSTANT, ONE_ATM};
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    const H2O2_SMALL: &str = include_str!("../data/h2o2_small.yaml");

    fn h2o2() -> Solution {
        Solution::from_str(H2O2_SMALL, None).unwrap()
    }

    #[test]
    fn test_solution_from_mechanism_text() {
        let gas = h2o2();
        assert_eq!(gas.name, "h2o2_small");
        assert!(gas.description.as_ref().unwrap().starts_with("Small hydrogen-oxygen"));
        assert_eq!(gas.n_species(), 9);
        assert_eq!(gas.n_reactions(), 8);
        assert_eq!(gas.species_index("OH"), Some(3));
        assert_eq!(gas.species_by_name("AR").unwrap().molecular_weight, 39.948);
        assert_eq!(gas.reaction(4).unwrap().equation, "OH + H2 <=> H + H2O");
        assert_eq!(gas.temperature(), 300.0);
        assert_eq!(gas.pressure(), ONE_ATM);
        assert!(gas.to_string().contains("O + H2 <=> H + OH"));
    }

    #[test]
    fn test_phase_with_reaction_section() {
        let gas = Solution::from_str(H2O2_SMALL, Some("ohmech")).unwrap();
        assert_eq!(gas.species_names(), vec!["H2", "H", "O", "OH"]);
        assert_eq!(gas.n_reactions(), 2);
        assert!(matches!(gas.reaction(1).unwrap().rate, ReactionRate::BlowersMasel(_)));
        let kf = gas.forward_rate_constants().unwrap();
        assert_relative_eq!(kf[0], 5195.447, max_relative = 1e-5);
        assert_relative_eq!(kf[1], 947.58, max_relative = 1e-4);
    }

    #[test]
    fn test_missing_phase_and_section() {
        match Solution::from_str(H2O2_SMALL, Some("nope")) {
            Err(SolutionError::PhaseNotFound { name, available }) => {
                assert_eq!(name, "nope");
                assert_eq!(available, vec!["h2o2_small", "ohmech"]);
            }
            other => panic!("expected PhaseNotFound, got {:?}", other.map(|s| s.name)),
        }
        let broken = H2O2_SMALL.replace("reactions: [ohmech-reactions]", "reactions: [missing]");
        assert!(matches!(
            Solution::from_str(&broken, Some("ohmech")),
            Err(SolutionError::SectionNotFound(name)) if name == "missing"
        ));
        let no_reactions = H2O2_SMALL.replace("reactions: [ohmech-reactions]", "reactions: none");
        let gas = Solution::from_str(&no_reactions, Some("ohmech")).unwrap();
        assert_eq!(gas.n_reactions(), 0);
        assert_eq!(gas.net_production_rates().unwrap().len(), 4);
    }

    #[test]
    fn test_perturb_species_enthalpy() {
        let mut gas = h2o2();
        let k_before = gas.forward_rate_constants().unwrap();
        let (h_before, h_after) = gas.perturb_species_enthalpy("OH", 1e7).unwrap();
        assert_relative_eq!(h_after - h_before, 1e7, max_relative = 1e-9);
        assert_relative_eq!(
            gas.species_enthalpy("OH", T_STANDARD).unwrap(),
            h_after,
            max_relative = 1e-12
        );
        let k_after = gas.forward_rate_constants().unwrap();
        // Arrhenius form does not see the enthalpy change, Blowers-Masel does
        assert_relative_eq!(k_after[2], k_before[2], max_relative = 1e-12);
        assert_relative_eq!(k_before[3], 947.58, max_relative = 1e-4);
        assert_relative_eq!(k_after[3], 99.224, max_relative = 1e-4);
        let dH = gas.delta_enthalpy().unwrap();
        assert_relative_eq!(dH[2], 8170274.38 + 1e7, max_relative = 1e-6);
    }

    #[test]
    fn test_perturb_needs_two_range_polynomial() {
        // argon with a single temperature range
        let single_range = H2O2_SMALL.replace(
            "    temperature-ranges: [300.0, 1000.0, 5000.0]\n    data:\n    - [2.5, 0.0, 0.0, 0.0, 0.0, -745.375, 4.366]\n",
            "    temperature-ranges: [300.0, 5000.0]\n    data:\n",
        );
        let mut gas = Solution::from_str(&single_range, None).unwrap();
        assert!(matches!(
            gas.species_by_name("AR").unwrap().thermo,
            SpeciesThermo::NasaPoly1(_)
        ));
        assert!(matches!(
            gas.perturb_species_enthalpy("AR", 1e6),
            Err(SolutionError::NotNasaPolynomial { species, .. }) if species == "AR"
        ));
        let k = gas.species_index("AR").unwrap();
        let mut ar = gas.species(k).unwrap().clone();
        ar.thermo = SpeciesThermo::ConstCp(ConstCpThermo::new(298.15, 0.0, 154845.0, 2.5 * GAS_CONSTANT));
        assert!(gas.modify_species(k, ar).is_err());
        assert!(matches!(
            gas.perturb_species_enthalpy("N2", 1.0),
            Err(SolutionError::Phase(_))
        ));
        // the general shift works for every model
        let (h0, h1) = gas.shift_species_enthalpy("AR", -5e6).unwrap();
        assert_relative_eq!(h1 - h0, -5e6, max_relative = 1e-9);
    }

    #[test]
    fn test_modify_reaction_through_solution() {
        let mut gas = h2o2();
        let mut faster = gas.reaction(4).unwrap().clone();
        if let ReactionRate::Arrhenius(rate) = &mut faster.rate {
            rate.A *= 2.0;
        }
        let k0 = gas.forward_rate_constants().unwrap()[4];
        gas.modify_reaction(4, faster).unwrap();
        assert_relative_eq!(gas.forward_rate_constants().unwrap()[4], 2.0 * k0, max_relative = 1e-12);
        let other = gas.reaction(5).unwrap().clone();
        assert!(matches!(
            gas.modify_reaction(4, other),
            Err(SolutionError::Kinetics(KineticsError::IncompatibleReaction { index: 4, .. }))
        ));
    }

    #[test]
    fn test_save_and_reload_mechanism() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("perturbed.json");
        let mut gas = h2o2();
        gas.set_TPX(1200.0, 2.0 * ONE_ATM, "H2:2, O2:1, OH:0.1").unwrap();
        gas.perturb_species_enthalpy("OH", 1e7).unwrap();
        gas.save_mechanism(&path).unwrap();

        let reloaded = Solution::from_file(&path, None).unwrap();
        assert_eq!(reloaded.name, gas.name);
        assert_eq!(reloaded.species_names(), gas.species_names());
        assert_eq!(reloaded.reaction_equations(), gas.reaction_equations());
        assert_eq!(reloaded.temperature(), 1200.0);
        assert_relative_eq!(reloaded.pressure(), 2.0 * ONE_ATM);
        assert_relative_eq!(
            reloaded.species_enthalpy("OH", T_STANDARD).unwrap(),
            gas.species_enthalpy("OH", T_STANDARD).unwrap(),
            max_relative = 1e-10
        );
        let kf = gas.forward_rate_constants().unwrap();
        let kf_reloaded = reloaded.forward_rate_constants().unwrap();
        for i in 0..gas.n_reactions() {
            assert_relative_eq!(kf_reloaded[i], kf[i], max_relative = 1e-9);
        }
        let wdot = gas.net_production_rates().unwrap();
        let wdot_reloaded = reloaded.net_production_rates().unwrap();
        for k in 0..gas.n_species() {
            assert_relative_eq!(wdot_reloaded[k], wdot[k], max_relative = 1e-8, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_from_library_and_text_via_file() {
        let gas = Solution::from_library("data/h2o2_small").unwrap();
        assert_eq!(gas.n_reactions(), 8);
        assert!(matches!(
            Solution::from_library("no_such_mechanism"),
            Err(SolutionError::MechanismNotFound(_))
        ));
        let dir = TempDir::new().unwrap();
        let gas = Solution::from_text_via_file(H2O2_SMALL, dir.path().join("mech.yaml"), Some("ohmech"))
            .unwrap();
        assert_eq!(gas.n_species(), 4);
    }

    #[test]
    fn test_rejected_state_leaves_solution_unchanged() {
        let mut gas = h2o2();
        let kf = gas.forward_rate_constants().unwrap();
        let X = gas.mole_fractions().clone();
        assert!(matches!(
            gas.set_TPX(1500.0, 3.0 * ONE_ATM, "H2:1, XX:2"),
            Err(SolutionError::Phase(PhaseError::UnknownSpecies(_)))
        ));
        assert!(gas.set_TPX(1500.0, 3.0 * ONE_ATM, "H2 1").is_err());
        assert!(gas.set_TPX(-1500.0, 3.0 * ONE_ATM, "H2:1").is_err());
        assert_eq!(gas.temperature(), 300.0);
        assert_eq!(gas.pressure(), ONE_ATM);
        assert_eq!(gas.mole_fractions(), &X);
        assert_eq!(gas.forward_rate_constants().unwrap(), kf);

        gas.set_TPX(1500.0, 3.0 * ONE_ATM, "H2:1, O2:2").unwrap();
        assert_eq!(gas.temperature(), 1500.0);
        assert_relative_eq!(gas.phase().mole_fraction("O2").unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn test_temperature_sweep_restores_state() {
        let mut gas = h2o2();
        gas.set_TP(800.0, ONE_ATM).unwrap();
        let sweep = gas.rate_constants_vs_temperature(&[500.0, 1000.0, 2000.0]).unwrap();
        assert_eq!(sweep.len(), 3);
        assert_eq!(gas.temperature(), 800.0);
        // O + H2 <=> H + OH has a positive activation energy
        assert!(sweep[0].1[2] < sweep[1].1[2] && sweep[1].1[2] < sweep[2].1[2]);
        assert!(matches!(
            gas.rate_constants_vs_temperature(&[1000.0, -1.0]),
            Err(SolutionError::Phase(PhaseError::InvalidTemperature(_)))
        ));
        assert_eq!(gas.temperature(), 800.0);
        assert_eq!(gas.pressure(), ONE_ATM);
    }

    #[test]
    fn test_tables() {
        let gas = h2o2();
        assert_eq!(gas.species_table().len(), 10);
        let reactions = gas.reactions_table().unwrap();
        assert_eq!(reactions.len(), 9);
        assert_eq!(Solution::cgs_factor(1.0), 1.0);
        assert_relative_eq!(Solution::cgs_factor(2.0), 1e3);
        assert_relative_eq!(Solution::cgs_factor(3.0), 1e6);
    }
}
