mod cli;
mod runner;

use std::process::ExitCode;

use priolog::{LogError, logging};

fn main() -> ExitCode {
    let app = cli::parse();
    logging::init(app.verbose);

    match runner::run(app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LogError>() {
                Some(LogError::Fatal { message }) => eprintln!("fatal: {message}"),
                _ => eprintln!("Error: {err:?}"),
            }
            ExitCode::FAILURE
        }
    }
}
