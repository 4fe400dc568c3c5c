pub mod cli_examples;
/// interactive menu of the `KiGas` binary
pub mod cli_main;
