use std::process::ExitCode;

fn main() -> ExitCode {
    unishop_cli::run()
}
