use clap::Parser;
use training::util::{run_generate, GenerateArgs};

fn main() -> anyhow::Result<()> {
    cli_support::init_tracing();
    let args = GenerateArgs::parse();
    run_generate(args)?;
    Ok(())
}
