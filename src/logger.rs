use clap_verbosity_flag::{InfoLevel, Verbosity};
use tintlog::{
    ColorMode, Logger, Result, Severity, bridge, init_default, set_build_info, set_min_level,
};

/// Builds the default logger from the command line and routes `log` macros through it.
pub fn init(
    min_level: Option<&str>, verbose: &Verbosity<InfoLevel>, color: ColorMode, git: &str,
    build: &str,
) -> Result<&'static Logger> {
    set_build_info(git, build)?;
    let logger = init_default(Logger::builder().color(color))?;

    let min = match min_level {
        Some(name) => set_min_level(name),
        None => {
            let min = verbose.log_level().map_or(Severity::Fatal, bridge::severity_of);
            logger.threshold().set(min);
            min
        }
    };

    bridge::install(logger)?;
    debug!("Minimum level set to {min}");
    Ok(logger)
}
