use clap::Parser;
use iperfer_rs::common::{setup_tracing, Args};
use iperfer_rs::iperfer_blocking;

fn main() -> anyhow::Result<()> {
    setup_tracing();
    let config = Args::parse().into_config()?;

    let report = iperfer_blocking::run(&config)?;
    println!("{report}");
    Ok(())
}
