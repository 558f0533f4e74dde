use std::io::Write;

use flexi_logger::{DeferredNow, style};
use log::{Level, Record};

/// Plain message for `info`, a coloured level prefix for everything else.
pub fn cli_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    if level == Level::Info {
        return write!(w, "{}", record.args());
    }
    let prefix = format!("{}:", level.as_str().to_lowercase());
    write!(w, "{} {}", style(level).paint(prefix), record.args())
}
