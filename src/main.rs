use KiGas::cli::cli_main::run_interactive_menu;
use KiGas::library_manager::with_library_manager;
use KiGas::solution::Solution;
use log::{LevelFilter, error, info};
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

fn init_logging(level: LevelFilter, log_file: Option<&str>) {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("cannot open log file '{}': {}", path, e),
        }
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("logger already initialized: {}", e);
    }
}

/// KiGas [mechanism] [report]
pub fn main() {
    let (level, log_file, default_mechanism) = with_library_manager(|manager| {
        (
            manager.log_level_filter(),
            manager.log_file().map(str::to_string),
            manager.default_mechanism().to_string(),
        )
    });
    init_logging(level, log_file.as_deref());

    let args: Vec<String> = std::env::args().collect();
    let mechanism = args.get(1).cloned().unwrap_or(default_mechanism);
    let report_only = args.get(2).map(|a| a == "report").unwrap_or(false);

    let mut gas = match Solution::from_library(&mechanism) {
        Ok(gas) => gas,
        Err(e) => {
            error!("cannot load mechanism '{}': {}", mechanism, e);
            std::process::exit(1);
        }
    };
    info!("{}", gas);
    if report_only {
        gas.pretty_print_species();
        if let Err(e) = gas.pretty_print_reactions() {
            error!("{}", e);
            std::process::exit(1);
        }
        return;
    }
    run_interactive_menu(&mut gas);
}
