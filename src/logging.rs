//! Process-wide structured logging init, using `log` + `simple_logger`
//! with the level selected by the caller instead of hardcoded.

use log::Level;

pub fn init(level: Level) {
    simple_logger::init_with_level(level).expect("logger must only be initialized once");
}
