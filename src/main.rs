//! CLI entry point. All simulation logic lives in the library crate; this binary only wires up
//! logging, calls `run()`, and translates the result into an exit code.

use coherence_sim::run;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(report) => {
            print!("{report}");
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
