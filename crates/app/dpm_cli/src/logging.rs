pub mod formats;

use flexi_logger::Logger;

use crate::Error;

/// `RUST_LOG` wins over `default_spec`. Logs go to stderr so tables on stdout
/// stay pipeable.
pub fn init(default_spec: &str) -> Result<(), Error> {
    Logger::try_with_env_or_str(default_spec)?
        .format(formats::cli_format)
        .log_to_stderr()
        .start()?;

    Ok(())
}
