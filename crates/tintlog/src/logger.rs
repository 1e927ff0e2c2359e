use std::{
    fmt,
    fs::OpenOptions,
    io::{self, IsTerminal, Write},
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard, OnceLock, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::{Context, Result, bail};

use crate::{
    compose::{Arg, sprint, sprintf},
    context::{CallerInfo, ExecutionContext, NativeContext, keep_frame},
    format::{BuildInfo, Line, build_info},
    level::{Severity, Threshold, global_threshold},
    style::{ColorMode, Palette},
};

/// Skip count used by the per-level methods so lines name their direct caller.
///
/// Frames are counted from the logger internals: `0` is the emitting function,
/// `1` the `*d` method, `2` its caller. The plain methods add one frame of
/// their own, hence `3`. None of these frames end in a tail call, so the count
/// holds in optimized builds.
pub const DIRECT_DEPTH: usize = 3;

type Sink = Box<dyn Write + Send>;

struct Shared {
    sink: Mutex<Sink>,
    threshold: Arc<Threshold>,
    palette: Palette,
    build: Option<BuildInfo>,
    context: Box<dyn ExecutionContext>,
    dropped: AtomicU64,
}

/// A leveled console logger.
///
/// Clones share the sink, threshold and counters. Each line is written with a
/// single `write_all` under a lock, so concurrent callers never interleave.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level())
            .field("palette", &self.shared.palette)
            .field("build", self.build_info())
            .field("dropped", &self.dropped_lines())
            .finish_non_exhaustive()
    }
}

/// Creates a logger writing to stdout, filtered by the process-wide threshold.
pub fn new_logger() -> Result<Logger> {
    Logger::builder().build()
}

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

/// The process-wide logger, created by the first call.
///
/// Panics if the logger cannot be built: there is nothing sensible to fall
/// back to when logging itself is unavailable.
pub fn default_logger() -> &'static Logger {
    DEFAULT_LOGGER.get_or_init(|| {
        new_logger().unwrap_or_else(|err| panic!("Failed to create the default logger: {err:#}"))
    })
}

/// Builds the process-wide logger from `builder`.
///
/// Fails if the default logger is already in use.
pub fn init_default(builder: LoggerBuilder) -> Result<&'static Logger> {
    if DEFAULT_LOGGER.get().is_some() {
        bail!("The default logger is already initialized");
    }

    let logger = builder.build()?;
    if DEFAULT_LOGGER.set(logger).is_err() {
        bail!("The default logger is already initialized");
    }
    Ok(default_logger())
}

impl Logger {
    pub fn new() -> Result<Self> {
        new_logger()
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Replaces the sink. Lines being written finish on the old one.
    pub fn set_output(&self, sink: impl Write + Send + 'static) {
        *self.sink() = Box::new(sink);
    }

    /// Sets this logger's threshold by name. Unknown names log everything.
    ///
    /// Loggers built against the process-wide threshold change it for all of them.
    pub fn set_min_level(&self, name: &str) -> Severity {
        self.shared.threshold.set_by_name(name)
    }

    pub fn min_level(&self) -> Severity {
        self.shared.threshold.get()
    }

    pub fn threshold(&self) -> &Arc<Threshold> {
        &self.shared.threshold
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        self.shared.threshold.allows(severity)
    }

    pub fn palette(&self) -> Palette {
        self.shared.palette
    }

    pub fn build_info(&self) -> &BuildInfo {
        self.shared.build.as_ref().unwrap_or_else(|| build_info())
    }

    /// Lines lost to sink write failures.
    pub fn dropped_lines(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.sink().flush()
    }

    fn sink(&self) -> MutexGuard<'_, Sink> {
        self.shared.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline(never)]
    fn emit(&self, depth: usize, severity: Severity, compose: impl FnOnce(&Palette) -> String) {
        if !self.enabled(severity) {
            return;
        }

        let message = compose(&self.shared.palette);
        let caller = self.shared.context.resolve_caller(depth);
        self.write_line(severity, &message, &caller);
    }

    /// Writes a line whose caller is already known, skipping the threshold check.
    pub(crate) fn write_line(&self, severity: Severity, message: &str, caller: &CallerInfo) {
        let thread_id = self.shared.context.current_thread_id();
        let line = Line { severity, thread_id: &thread_id, message, caller, build: self.build_info() }
            .render(&self.shared.palette);

        let mut sink = self.sink();
        if sink.write_all(line.as_bytes()).and_then(|()| sink.flush()).is_err() {
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline(never)]
    pub fn log_at(&self, severity: Severity, args: &[Arg<'_>]) {
        self.logd(DIRECT_DEPTH, severity, args);
        keep_frame();
    }

    #[inline(never)]
    pub fn log_atf(&self, severity: Severity, format: &str, args: &[Arg<'_>]) {
        self.logdf(DIRECT_DEPTH, severity, format, args);
        keep_frame();
    }
}

macro_rules! level_methods {
    ($($severity:ident: $plain:ident, $formatted:ident, $depth:ident, $depth_formatted:ident;)+) => {
        impl Logger {
            $(
                #[doc = concat!("Logs at [`Severity::", stringify!($severity), "`].")]
                #[inline(never)]
                pub fn $plain(&self, args: &[Arg<'_>]) {
                    self.$depth(DIRECT_DEPTH, args);
                    keep_frame();
                }

                #[doc = concat!("Formatted [`Severity::", stringify!($severity), "`], see [`sprintf`].")]
                #[inline(never)]
                pub fn $formatted(&self, format: &str, args: &[Arg<'_>]) {
                    self.$depth_formatted(DIRECT_DEPTH, format, args);
                    keep_frame();
                }
            )+
        }

        impl LoggerWithDepth for Logger {
            #[inline(never)]
            fn logd(&self, depth: usize, severity: Severity, args: &[Arg<'_>]) {
                self.emit(depth, severity, |palette| sprint(args, palette));
                keep_frame();
            }

            #[inline(never)]
            fn logdf(&self, depth: usize, severity: Severity, format: &str, args: &[Arg<'_>]) {
                self.emit(depth, severity, |palette| sprintf(format, args, palette));
                keep_frame();
            }

            #[cfg(feature = "debug")]
            #[inline(never)]
            fn debugd(&self, depth: usize, args: &[Arg<'_>]) {
                self.emit(depth, Severity::Debug, |palette| sprint(args, palette));
                keep_frame();
            }

            #[cfg(feature = "debug")]
            #[inline(never)]
            fn debugdf(&self, depth: usize, format: &str, args: &[Arg<'_>]) {
                self.emit(depth, Severity::Debug, |palette| sprintf(format, args, palette));
                keep_frame();
            }

            #[cfg(not(feature = "debug"))]
            fn debugd(&self, _depth: usize, _args: &[Arg<'_>]) {}

            #[cfg(not(feature = "debug"))]
            fn debugdf(&self, _depth: usize, _format: &str, _args: &[Arg<'_>]) {}

            $(
                #[inline(never)]
                fn $depth(&self, depth: usize, args: &[Arg<'_>]) {
                    self.emit(depth, Severity::$severity, |palette| sprint(args, palette));
                    keep_frame();
                }

                #[inline(never)]
                fn $depth_formatted(&self, depth: usize, format: &str, args: &[Arg<'_>]) {
                    self.emit(depth, Severity::$severity, |palette| sprintf(format, args, palette));
                    keep_frame();
                }
            )+
        }
    };
}

level_methods! {
    Fatal: fatal, fatalf, fatald, fataldf;
    Error: error, errorf, errord, errordf;
    Warn: warn, warnf, warnd, warndf;
    Notice: notice, noticef, noticed, noticedf;
    Info: info, infof, infod, infodf;
}

#[cfg(feature = "debug")]
impl Logger {
    /// Logs at [`Severity::Debug`].
    #[inline(never)]
    pub fn debug(&self, args: &[Arg<'_>]) {
        self.debugd(DIRECT_DEPTH, args);
        keep_frame();
    }

    /// Formatted [`Severity::Debug`], see [`sprintf`].
    #[inline(never)]
    pub fn debugf(&self, format: &str, args: &[Arg<'_>]) {
        self.debugdf(DIRECT_DEPTH, format, args);
        keep_frame();
    }
}

/// Without the `debug` feature every debug entry point is a no-op.
#[cfg(not(feature = "debug"))]
impl Logger {
    pub fn debug(&self, _args: &[Arg<'_>]) {}

    pub fn debugf(&self, _format: &str, _args: &[Arg<'_>]) {}
}

/// Logging with an explicit caller depth, for building wrappers.
///
/// `depth` counts frames from the logger internals: `2` names the code calling
/// the method, `3` that code's caller, and so on. A wrapper that logs on behalf
/// of its own caller passes `3`.
///
/// The wrapper's frame has to be on the stack when the line is written. Mark it
/// `#[inline(never)]` and do not end it with the logging call when it only
/// forwards borrowed arguments: optimized builds turn such a call into a jump.
/// Following the call with `std::hint::black_box(())` keeps the frame.
pub trait LoggerWithDepth {
    fn logd(&self, depth: usize, severity: Severity, args: &[Arg<'_>]);
    fn logdf(&self, depth: usize, severity: Severity, format: &str, args: &[Arg<'_>]);

    fn fatald(&self, depth: usize, args: &[Arg<'_>]);
    fn fataldf(&self, depth: usize, format: &str, args: &[Arg<'_>]);
    fn errord(&self, depth: usize, args: &[Arg<'_>]);
    fn errordf(&self, depth: usize, format: &str, args: &[Arg<'_>]);
    fn warnd(&self, depth: usize, args: &[Arg<'_>]);
    fn warndf(&self, depth: usize, format: &str, args: &[Arg<'_>]);
    fn noticed(&self, depth: usize, args: &[Arg<'_>]);
    fn noticedf(&self, depth: usize, format: &str, args: &[Arg<'_>]);
    fn infod(&self, depth: usize, args: &[Arg<'_>]);
    fn infodf(&self, depth: usize, format: &str, args: &[Arg<'_>]);
    fn debugd(&self, depth: usize, args: &[Arg<'_>]);
    fn debugdf(&self, depth: usize, format: &str, args: &[Arg<'_>]);
}

enum SinkTarget {
    Stdout,
    Stderr,
    File(PathBuf),
    Writer(Sink),
}

/// Configures a [`Logger`].
///
/// Defaults: stdout, the process-wide threshold and build info, colors for
/// terminal sinks only, and native stack walking.
pub struct LoggerBuilder {
    target: SinkTarget,
    color: Option<ColorMode>,
    threshold: Option<Arc<Threshold>>,
    build: Option<BuildInfo>,
    context: Option<Box<dyn ExecutionContext>>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self { target: SinkTarget::Stdout, color: None, threshold: None, build: None, context: None }
    }
}

impl LoggerBuilder {
    pub fn stdout(mut self) -> Self {
        self.target = SinkTarget::Stdout;
        self
    }

    /// Writes to stderr. Without an explicit [`color`](Self::color), lines are
    /// styled only when stderr is a terminal.
    pub fn stderr(mut self) -> Self {
        self.target = SinkTarget::Stderr;
        self
    }

    /// Appends to the file at `path`, creating it when missing.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.target = SinkTarget::File(path.into());
        self
    }

    pub fn writer(mut self, sink: impl Write + Send + 'static) -> Self {
        self.target = SinkTarget::Writer(Box::new(sink));
        self
    }

    pub fn color(mut self, mode: ColorMode) -> Self {
        self.color = Some(mode);
        self
    }

    /// Shares `threshold` instead of the process-wide one.
    pub fn threshold(mut self, threshold: Arc<Threshold>) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Gives the logger a threshold of its own, starting at `min`.
    pub fn isolated(self, min: Severity) -> Self {
        self.threshold(Arc::new(Threshold::new(min)))
    }

    /// Overrides the process-wide build info for this logger.
    pub fn build_info(mut self, git: impl Into<String>, build: impl Into<String>) -> Self {
        self.build = Some(BuildInfo::new(git, build));
        self
    }

    pub fn context(mut self, context: impl ExecutionContext + 'static) -> Self {
        self.context = Some(Box::new(context));
        self
    }

    pub fn build(self) -> Result<Logger> {
        let (sink, terminal): (Sink, bool) = match self.target {
            SinkTarget::Stdout => (Box::new(io::stdout()), true),
            // `colored` only inspects stdout.
            SinkTarget::Stderr => (Box::new(io::stderr()), io::stderr().is_terminal()),
            SinkTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("Failed to open the log file: {}", path.display()))?;
                (Box::new(file), false)
            }
            SinkTarget::Writer(sink) => (sink, false),
        };

        let color = self.color.unwrap_or(if terminal { ColorMode::Auto } else { ColorMode::Never });

        Ok(Logger {
            shared: Arc::new(Shared {
                sink: Mutex::new(sink),
                threshold: self.threshold.unwrap_or_else(global_threshold),
                palette: Palette::new(color),
                build: self.build,
                context: self.context.unwrap_or_else(|| Box::new(NativeContext)),
                dropped: AtomicU64::new(0),
            }),
        })
    }
}
