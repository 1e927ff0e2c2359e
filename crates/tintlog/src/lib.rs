//! Leveled, colorized console logging with caller attribution.
//!
//! Every line has the same shape:
//!
//! ```text
//! [Error] Thread3: id=, abc123, user(ana) app::login():auth.rs:42 {git:3f2a9c1, build:1.4.0}
//! ```
//!
//! ```
//! use tintlog::{Logger, Severity, args, field, sink::MemorySink};
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder().writer(sink.clone()).isolated(Severity::Info).build()?;
//!
//! logger.error(args!["id=", "abc123", field! { "user" => "ana" }]);
//! logger.debug(args!["filtered out"]);
//!
//! assert!(sink.contents().starts_with("[Error] Thread"));
//! assert!(sink.contents().contains("id=, abc123, user(ana)"));
//! # Ok::<(), tintlog::anyhow::Error>(())
//! ```
pub mod bridge;
pub mod compose;
pub mod context;
pub mod field;
pub mod format;
pub mod level;
pub mod logger;
pub mod sink;
pub mod style;

pub use anyhow::{self, Result};
pub use compose::{Arg, sprint, sprintf};
pub use context::{CallerInfo, ExecutionContext, NativeContext};
pub use field::Field;
pub use format::{BuildInfo, build_info, set_build_info};
pub use level::{Severity, Threshold, global_threshold, set_min_level};
pub use logger::{
    DIRECT_DEPTH, Logger, LoggerBuilder, LoggerWithDepth, default_logger, init_default, new_logger,
};
pub use style::{ColorMode, Palette, Role};
