#[macro_use] extern crate log;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tintlog::{
    Arg, ColorMode as LibColor, Field, Logger, LoggerWithDepth, Result, Role, Severity,
};
mod logger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Minimum severity to print, by name. Unknown names print everything.
    #[arg(long, global = true, env = "TINTLOG_LEVEL")]
    min_level: Option<String>,
    #[arg(long, global = true, value_enum, default_value_t = Color::Auto)]
    color: Color,
    /// Revision embedded in every line.
    #[arg(long, global = true, default_value = "")]
    git: String,
    /// Build label embedded in every line.
    #[arg(long, global = true, default_value = env!("CARGO_PKG_VERSION"))]
    build: String,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Writes one log line.
    Emit {
        #[arg(short, long, default_value_t = Severity::Info)]
        level: Severity,
        /// Format string filled by the leading arguments (`{}`, `%v`, `%s`, `%d`, `%q`).
        #[arg(short, long)]
        format: Option<String>,
        /// Structured context appended to the line.
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
        #[arg(value_name = "ARGS")]
        args: Vec<String>,
    },
    /// Lists the severities in priority order.
    Levels,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum Color {
    Auto,
    Never,
}

impl From<Color> for LibColor {
    fn from(value: Color) -> Self {
        match value {
            Color::Auto => Self::Auto,
            Color::Never => Self::Never,
        }
    }
}

fn parse_pair(pair: &str) -> Result<(String, String), String> {
    pair.split_once('=')
        .map(|(key, value)| (key.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{pair}`"))
}

fn main() {
    let args = Cli::parse();
    let logger = match logger::init(
        args.min_level.as_deref(),
        &args.verbose,
        args.color.into(),
        &args.git,
        &args.build,
    ) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("{err:#}");
            return;
        }
    };

    match args.command {
        Commands::Emit { level, format, fields, args } => {
            emit(logger, level, format.as_deref(), &args, fields);
        }
        Commands::Levels => levels(logger),
    }
}

/// Depth `2` attributes the line to this function, the caller of `logd`.
fn emit(
    logger: &Logger, level: Severity, format: Option<&str>, args: &[String],
    fields: Vec<(String, String)>,
) {
    let field = fields.into_iter().fold(Field::new(), |field, (key, value)| field.add(key, value));

    let mut list: Vec<Arg<'_>> = args.iter().map(Arg::from).collect();
    if !field.is_empty() {
        list.push(Arg::from(&field));
    }

    match format {
        Some(format) => logger.logdf(2, level, format, &list),
        None => logger.logd(2, level, &list),
    }
}

fn levels(logger: &Logger) {
    let palette = logger.palette();
    for severity in Severity::ALL {
        let name = palette.paint(Role::Level(severity), &format!("[{severity}]"));
        println!("{} {name}", severity.priority());
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use tintlog::{Logger, Severity, sink::MemorySink};

    use crate::{Cli, Commands, emit, parse_pair};

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn emit_arguments() {
        let cli = Cli::parse_from([
            "tintlog", "emit", "--level", "Warn", "--field", "id=7", "disk", "full",
        ]);

        let Commands::Emit { level, fields, args, format } = cli.command else {
            panic!("expected the emit command");
        };
        assert_eq!(level, tintlog::Severity::Warn);
        assert_eq!(fields, [("id".to_owned(), "7".to_owned())]);
        assert_eq!(args, ["disk", "full"]);
        assert!(format.is_none());
    }

    #[test]
    fn emit_writes_a_single_line() -> tintlog::Result<()> {
        let sink = MemorySink::new();
        let logger = Logger::builder().writer(sink.clone()).isolated(Severity::Debug).build()?;

        let args = ["disk".to_owned(), "full".to_owned()];
        emit(&logger, Severity::Warn, None, &args, vec![("id".to_owned(), "7".to_owned())]);

        let lines = sink.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        assert!(lines[0].starts_with("[Warn] Thread"), "{}", lines[0]);
        assert!(lines[0].contains(": disk, full, id(7) tintlog::emit():main.rs:"), "{}", lines[0]);
        Ok(())
    }

    #[test]
    fn rejects_unknown_levels_and_pairs() {
        assert!(Cli::try_parse_from(["tintlog", "emit", "--level", "loud"]).is_err());
        assert!(parse_pair("novalue").is_err());
        assert_eq!(parse_pair("a=b=c"), Ok(("a".to_owned(), "b=c".to_owned())));
    }
}
