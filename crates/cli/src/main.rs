use std::process::ExitCode;

fn main() -> ExitCode {
    clusterpilot_cli::run()
}
