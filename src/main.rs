//! supercmd - demo tool for the supercmd command framework

mod demo;

use std::process::ExitCode;

use supercmd::storage::Config;
use supercmd::Context;

fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR {:#}", e);
            return ExitCode::from(2);
        }
    };

    let mut app = match demo::app(&config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("ERROR {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = match Context::default_context() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("ERROR cannot determine working directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = supercmd::main(&mut app, &mut ctx, std::env::args().skip(1));
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
