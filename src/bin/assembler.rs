use std::env;

use decasm::logging;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file1> [file2 ...]", args[0]);
        std::process::exit(1);
    }

    let mut any_failed = false;

    for base_name in &args[1..] {
        match decasm::assemble_file(base_name) {
            Ok(()) => logging::summary(base_name, 0),
            Err(sink) => {
                any_failed = true;
                let errors = sink.into_vec();
                let n_errors = errors.len();
                logging::report_errors(&errors);
                logging::summary(base_name, n_errors);
            }
        }
    }

    if any_failed {
        std::process::exit(1);
    }
}
