use clap::Parser;
use training::util::{run_eval, EvalArgs};

fn main() -> anyhow::Result<()> {
    cli_support::init_tracing();
    let args = EvalArgs::parse();
    let avg = run_eval(args)?;
    println!("{avg:.4}");
    Ok(())
}
