//! reposync binary entry point.

use std::process::ExitCode;

use reposync::ui::output;

fn main() -> ExitCode {
    match reposync::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
