//! Binary entry point for `mlk`.

use std::process;

fn main() {
    if let Err(err) = multilock::cli::run() {
        multilock::ui::output::error(format!("{:#}", err));
        process::exit(1);
    }
}
