use super::cli_examples::examples_menu;
use crate::solution::{Solution, SolutionError};
use log::error;
use std::io::{self, Write};

pub fn run_interactive_menu(gas: &mut Solution) {
    loop {
        show_main_menu(gas);
        let choice = get_user_input();

        let result = match choice.trim() {
            "1" => {
                gas.pretty_print_species();
                Ok(())
            }
            "2" => gas.pretty_print_reactions(),
            "3" => set_state(gas),
            "4" => perturb_enthalpy(gas),
            "5" => rate_constants(gas),
            "6" => {
                examples_menu();
                Ok(())
            }
            "7" => save_mechanism(gas),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => {
                println!("Invalid choice. Please try again.");
                Ok(())
            }
        };
        if let Err(e) = result {
            error!("{}", e);
        }
    }
}
/* colors
Blue (\x1b[34m) - header
Yellow (\x1b[33m) - menu options
Cyan (\x1b[36m) - prompts
Reset (\x1b[0m)
*/
fn show_main_menu(gas: &Solution) {
    println!(
        "\x1b[34m\n KiGas: ideal gas thermodynamics and gas-phase kinetics\n
    mechanism '{}': {} species, {} reactions, T = {} K, P = {} Pa \n \x1b[0m",
        gas.name,
        gas.n_species(),
        gas.n_reactions(),
        gas.temperature(),
        gas.pressure()
    );
    println!("\x1b[33m1. List species\x1b[0m");
    println!("\x1b[33m2. List reactions\x1b[0m");
    println!("\x1b[33m3. Set temperature, pressure and composition\x1b[0m");
    println!("\x1b[33m4. Perturb species enthalpy\x1b[0m");
    println!("\x1b[33m5. Rate constants vs temperature\x1b[0m");
    println!("\x1b[33m6. Examples\x1b[0m");
    println!("\x1b[33m7. Save mechanism\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    prompt("Enter your choice: ");
}

fn prompt(message: &str) {
    print!("\x1b[36m{}\x1b[0m", message);
    let _ = io::stdout().flush();
}

/// one line of stdin; an unreadable stdin reads as an empty line
pub fn get_user_input() -> String {
    let mut input = String::new();
    if let Err(e) = io::stdin().read_line(&mut input) {
        error!("failed to read input: {}", e);
    }
    input
}

/// empty input keeps `current`
fn read_f64(message: &str, current: f64) -> Option<f64> {
    prompt(&format!("{} [{}]: ", message, current));
    let input = get_user_input();
    let input = input.trim();
    if input.is_empty() {
        return Some(current);
    }
    match input.parse::<f64>() {
        Ok(x) => Some(x),
        Err(_) => {
            println!("'{}' is not a number", input);
            None
        }
    }
}

fn set_state(gas: &mut Solution) -> Result<(), SolutionError> {
    let Some(T) = read_f64("Temperature, K", gas.temperature()) else {
        return Ok(());
    };
    let Some(P) = read_f64("Pressure, Pa", gas.pressure()) else {
        return Ok(());
    };
    gas.set_TP(T, P)?;
    prompt("Mole fractions, e.g. H2:2, O2:1 (empty keeps the current): ");
    let X = get_user_input();
    if !X.trim().is_empty() {
        gas.phase_mut().set_mole_fractions_by_name(X.trim())?;
    }
    Ok(())
}

fn perturb_enthalpy(gas: &mut Solution) -> Result<(), SolutionError> {
    prompt("Species: ");
    let name = get_user_input();
    let Some(dH) = read_f64("Enthalpy change, J/kmol", 1e7) else {
        return Ok(());
    };
    let (h_before, h_after) = gas.perturb_species_enthalpy(name.trim(), dH)?;
    println!(
        "H(298.15) of {}: {:.6e} -> {:.6e} J/kmol",
        name.trim(),
        h_before,
        h_after
    );
    gas.pretty_print_reactions()
}

fn rate_constants(gas: &mut Solution) -> Result<(), SolutionError> {
    prompt("Temperatures, K (space separated): ");
    let input = get_user_input();
    let temperatures: Vec<f64> = input
        .split_whitespace()
        .filter_map(|t| t.parse::<f64>().ok())
        .collect();
    if temperatures.is_empty() {
        return gas.pretty_print_reactions();
    }
    let equations = gas.reaction_equations();
    for (T, kf) in gas.rate_constants_vs_temperature(&temperatures)? {
        println!("\nT = {} K", T);
        for (equation, k) in equations.iter().zip(kf.iter()) {
            println!("  {:<32} {:.6e}", equation, k);
        }
    }
    Ok(())
}

fn save_mechanism(gas: &Solution) -> Result<(), SolutionError> {
    prompt("File name [mechanism.json]: ");
    let input = get_user_input();
    let path = match input.trim() {
        "" => "mechanism.json",
        other => other,
    };
    gas.save_mechanism(path)?;
    println!("saved to {}", path);
    Ok(())
}
