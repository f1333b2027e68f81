use std::io::Write;

fn main() {
    let exit_code = regress_cli::run_from_env();
    let _ = std::io::stdout().flush();
    std::process::exit(exit_code);
}
