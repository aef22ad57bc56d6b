use clap::Parser;
use specforge_lib::commands::{self, Cli};

fn main() {
    let cli = Cli::parse();

    // Initialize logger (RUST_LOG controls the level)
    env_logger::init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    match runtime.block_on(commands::execute(cli)) {
        Ok(output) => print!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
