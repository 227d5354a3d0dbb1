use std::{
    io::{self, BufWriter},
    process::ExitCode,
};

use order_stat_avl::harness;

fn main() -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();

    match harness::run(stdin.lock(), BufWriter::new(stdout.lock())) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("order-stat: {error}");
            ExitCode::FAILURE
        }
    }
}
