use std::process::ExitCode;

use circuit_court_app::{Cli, Command, replay, window};
use clap::Parser;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    circuit_court_core::init();
    circuit_court_scene::init();
    circuit_court_app::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Play(args) => window::run(args),
        Command::Replay(args) => replay::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
