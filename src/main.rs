//! minicc entry point.

fn main() {
    if let Err(e) = minicc::cli::run_cli() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
