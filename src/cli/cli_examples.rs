use super::cli_main::get_user_input;
use crate::Examples::kinetics_examples::kin_examples;
use log::error;
use std::io::{self, Write};

pub fn examples_menu() {
    loop {
        println!("\n=== Examples ===");
        println!("1. Enthalpy perturbation study (OH, Blowers-Masel vs Arrhenius)");
        println!("2. Temperature sweep of rate constants");
        println!("3. Stoichiometry and production rates");
        println!("0. Back to main menu");
        print!("Enter your choice: ");
        let _ = io::stdout().flush();

        let choice = get_user_input();
        let task = match choice.trim() {
            "1" => 0,
            "2" => 1,
            "3" => 2,
            "0" => break,
            _ => {
                println!("Invalid choice. Please try again.");
                continue;
            }
        };
        if let Err(e) = kin_examples(task) {
            error!("example {} failed: {}", task, e);
        }
    }
}
