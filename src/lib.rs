#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Kinetics;
#[allow(non_snake_case)]
pub mod Thermodynamics;
#[allow(non_snake_case)]
pub mod Utils;
#[allow(non_snake_case)]
pub mod cli;
pub mod library_manager;
/// ideal gas phase together with its reactions: the main entry point of the crate
#[allow(non_snake_case)]
pub mod solution;
#[allow(non_snake_case)]
mod solution_tests;
/// unit systems of mechanism files and physical constants
#[allow(non_snake_case)]
pub mod units;
