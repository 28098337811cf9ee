use std::process::ExitCode;

fn main() -> ExitCode {
    match cmpr_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cmpr: {err:#}");
            ExitCode::FAILURE
        }
    }
}
