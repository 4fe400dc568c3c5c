use crate::solution::{Solution, SolutionError, T_STANDARD};
use crate::units::ONE_ATM;
use prettytable::{Table, row};

/// sample mechanism shipped with the crate
pub const H2O2_SMALL: &str = include_str!("../../data/h2o2_small.yaml");

pub fn kin_examples(kintask: usize) -> Result<(), SolutionError> {
    match kintask {
        0 => {
            // ENTHALPY PERTURBATION STUDY
            // the mechanism text is written to a file and read back, then the enthalpy of OH is
            // raised by 1e7 J/kmol (about 2.4 kcal/mol)
            let path = std::env::temp_dir().join("kigas_ohmech.yaml");
            let mut gas = Solution::from_text_via_file(H2O2_SMALL, &path, Some("ohmech"))?;
            gas.set_TP(300.0, ONE_ATM)?;
            gas.pretty_print_species();
            gas.pretty_print_reactions()?;

            let kf_before = gas.forward_rate_constants()?;
            let (h_before, h_after) = gas.perturb_species_enthalpy("OH", 1e7)?;
            println!(
                "H(OH, {} K): {:.6e} -> {:.6e} J/kmol",
                T_STANDARD, h_before, h_after
            );
            let kf_after = gas.forward_rate_constants()?;
            gas.pretty_print_reactions()?;

            let mut table = Table::new();
            table.add_row(row!["Equation", "Type", "kf before", "kf after", "ratio"]);
            for (i, reaction) in gas.reactions().iter().enumerate() {
                table.add_row(row![
                    reaction.equation,
                    reaction.reaction_type().name(),
                    format!("{:.6e}", kf_before[i]),
                    format!("{:.6e}", kf_after[i]),
                    format!("{:.4}", kf_after[i] / kf_before[i])
                ]);
            }
            table.printstd();
        }
        1 => {
            // TEMPERATURE SWEEP of forward rate constants
            let mut gas = Solution::from_str(H2O2_SMALL, None)?;
            gas.set_TPX(1000.0, ONE_ATM, "H2:2, O2:1, AR:5")?;
            let temperatures: Vec<f64> = (0..7).map(|i| 500.0 + 250.0 * i as f64).collect();
            let sweep = gas.rate_constants_vs_temperature(&temperatures)?;

            let mut table = Table::new();
            let mut header = row!["Equation"];
            for T in &temperatures {
                header.add_cell(prettytable::Cell::new(&format!("{} K", T)));
            }
            table.add_row(header);
            for (i, equation) in gas.reaction_equations().iter().enumerate() {
                let mut line = row![equation];
                for (_, kf) in &sweep {
                    line.add_cell(prettytable::Cell::new(&format!("{:.3e}", kf[i])));
                }
                table.add_row(line);
            }
            table.printstd();
        }
        2 => {
            // STOICHIOMETRY, element balance and production rates of a reacting mixture
            let mut gas = Solution::from_str(H2O2_SMALL, None)?;
            gas.set_TPX(1500.0, ONE_ATM, "H2:2, O2:1, H:0.1, O:0.1, OH:0.1, H2O:0.5, AR:1")?;
            let stoich = &gas.kinetics().stoich;
            println!("species: {:?}", stoich.substances);
            println!("net stoichiometric matrix (species x reactions) {}", stoich.stecheo_matrx);
            let element_matrix = gas.phase().element_matrix();
            println!("elements: {:?}", gas.phase().elements());
            // every column is an element balance of a reaction and must vanish
            println!("element change per reaction {}", element_matrix * &stoich.stecheo_matrx);
            let wdot = gas.net_production_rates()?;
            for (name, w) in gas.species_names().iter().zip(wdot.iter()) {
                println!("{:>6}: {:+.4e} kmol/m3/s", name, w);
            }
        }
        _ => {
            println!("Wrong task number");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_examples_run() {
        for task in 0..3 {
            kin_examples(task).unwrap();
        }
    }
}
