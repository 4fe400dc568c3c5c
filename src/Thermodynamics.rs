/// standard-state thermodynamic models of species: NASA 7-coefficient polynomials (one and two
/// temperature ranges) and constant heat capacity
#[allow(non_snake_case)]
pub mod thermo_models;
/// species: element composition, molecular weight, thermo model and transport data
pub mod species;
/// ideal gas mixture with cached standard-state properties
/// # Examples
/// ```
/// use KiGas::Thermodynamics::IdealGasPhase::IdealGasPhase;
/// use KiGas::Thermodynamics::species::Species;
/// use KiGas::units::UnitSystem;
/// use serde_json::json;
/// let units = UnitSystem::default();
/// let ar = Species::from_serde(&json!({
///     "name": "AR", "composition": {"Ar": 1},
///     "thermo": {"model": "NASA7", "temperature-ranges": [300.0, 5000.0],
///                "data": [[2.5, 0.0, 0.0, 0.0, 0.0, -745.375, 4.366]]}
/// }), &units).unwrap();
/// let mut phase = IdealGasPhase::new("argon", vec!["Ar".to_string()], vec![ar]).unwrap();
/// phase.set_TP(1000.0, 101325.0).unwrap();
/// assert!((phase.cp_mole() - 2.5 * 8314.462618).abs() < 1e-6);
/// ```
#[allow(non_snake_case)]
pub mod IdealGasPhase;
