// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::Cli;

mod cli;
mod commands;
mod logging;
mod token;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    let args = Cli::parse();

    logging::init(if args.verbose { "debug" } else { "info" })?;

    if let Some(out) = commands::run_offline(&args.command) {
        println!("{out}");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let ctx = commands::Context::open(&args).await?;
        match commands::run_online(&ctx, args.command).await {
            Ok(out) => {
                println!("{out}");
                Ok(())
            }
            Err(Error::Client(e)) if e.is_auth() => {
                ctx.forget_token()?;
                log::warn!("session rejected; run `dpm login` again");
                Err(Error::Client(e))
            }
            Err(e) => Err(e),
        }
    })
}
