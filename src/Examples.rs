/// numbered kinetics tasks: enthalpy perturbation study, temperature sweep, stoichiometry
pub mod kinetics_examples;
