use anyhow::{Context, Result};
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;

// Level tag, module, message. Goes to stderr so stdout stays machine-readable.
const LOG_PATTERN: &str = "{h({l})} {t} - {m}{n}";

pub fn init(level: LevelFilter) -> Result<()> {
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .context("Failed to build logging configuration.")?;
    log4rs::init_config(config).context("Failed to install logger.")?;
    Ok(())
}
