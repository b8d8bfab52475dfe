use std::process::ExitCode;

fn main() -> ExitCode {
    proforma_cli::run()
}
