/// constant heat capacity model
#[allow(non_snake_case)]
pub mod ConstCpData;
/// one and two range NASA 7-coefficient polynomials
#[allow(non_snake_case)]
pub mod NASA7data;
/// `SpeciesThermoCalculator` trait and the `SpeciesThermo` model enum
#[allow(non_snake_case)]
pub mod thermo_api;
