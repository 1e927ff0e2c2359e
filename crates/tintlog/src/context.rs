//! Thread identity and caller attribution.
use std::{
    ffi::c_void,
    hint,
    path::Path,
    thread::{self, ThreadId},
};

use backtrace::Symbol;

/// Placeholder for a function or file that could not be resolved.
pub const UNKNOWN: &str = "???";

/// Placeholder for a thread id that could not be determined.
pub const UNKNOWN_THREAD: &str = "-1";

/// Where a log call came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    pub function: String,
    /// Base name of the source file.
    pub file: String,
    /// `-1` when unknown.
    pub line: i64,
}

impl CallerInfo {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: i64) -> Self {
        Self { function: function.into(), file: file.into(), line }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN, -1)
    }

    fn from_symbol(symbol: &Symbol) -> Self {
        Self {
            function: symbol.name().map_or_else(|| UNKNOWN.to_owned(), |name| format!("{name:#}")),
            file: symbol.filename().map_or_else(|| UNKNOWN.to_owned(), basename),
            line: symbol.lineno().map_or(-1, i64::from),
        }
    }
}

impl Default for CallerInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

pub(crate) fn basename(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
        .into_owned()
}

/// Runtime introspection used by a logger.
///
/// Neither operation fails: unknown values come back as the documented
/// placeholders ([`UNKNOWN`], [`UNKNOWN_THREAD`], line `-1`).
pub trait ExecutionContext: Send + Sync {
    fn current_thread_id(&self) -> String;

    /// Resolves a frame of the calling stack.
    ///
    /// `skip_frames` counts from the function invoking `resolve_caller`:
    /// `0` names that function, `1` its caller, and so on.
    fn resolve_caller(&self, skip_frames: usize) -> CallerInfo;
}

/// Walks the native stack with `backtrace`. Frames need debug info to resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeContext;

impl ExecutionContext for NativeContext {
    fn current_thread_id(&self) -> String {
        thread_number(thread::current().id())
    }

    #[inline(never)]
    fn resolve_caller(&self, skip_frames: usize) -> CallerInfo {
        // The anchor, this method, then the requested frame.
        let caller = walk_from_anchor(skip_frames + 2).unwrap_or_default();
        keep_frame();
        caller
    }
}

/// Ends a delegating function with an opaque operation.
///
/// Skip counts rely on every frame between the anchor and the caller staying
/// on the stack. A call in tail position compiles to a jump in optimized
/// builds and its frame disappears, so delegating calls are followed by this.
#[inline]
pub(crate) fn keep_frame() {
    hint::black_box(());
}

fn thread_number(id: ThreadId) -> String {
    let debug = format!("{id:?}");
    debug
        .strip_prefix("ThreadId(")
        .and_then(|rest| rest.strip_suffix(')'))
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .map_or_else(|| UNKNOWN_THREAD.to_owned(), str::to_owned)
}

/// Logical frames seen since the anchor; inlined calls count as frames.
struct FrameCursor {
    target: usize,
    depth: Option<usize>,
    found: Option<CallerInfo>,
}

impl FrameCursor {
    fn visit(&mut self, symbol: Option<&Symbol>, in_anchor_frame: bool) {
        if self.found.is_some() {
            return;
        }

        match self.depth {
            Some(ref mut depth) => {
                *depth += 1;
                if *depth == self.target {
                    self.found = Some(symbol.map_or_else(CallerInfo::unknown, CallerInfo::from_symbol));
                }
            }
            None => {
                let is_anchor = match symbol.and_then(Symbol::name) {
                    Some(name) => format!("{name:#}").ends_with("::walk_from_anchor"),
                    None => in_anchor_frame,
                };
                if is_anchor {
                    self.depth = Some(0);
                }
            }
        }
    }
}

#[inline(never)]
fn walk_from_anchor(target: usize) -> Option<CallerInfo> {
    #[allow(clippy::as_conversions, reason = "comparing code addresses")]
    let anchor = walk_from_anchor as *const () as *mut c_void;
    let mut cursor = FrameCursor { target, depth: None, found: None };

    backtrace::trace(|frame| {
        let in_anchor_frame = frame.symbol_address() == anchor;
        let mut resolved = false;

        backtrace::resolve_frame(frame, |symbol| {
            resolved = true;
            cursor.visit(Some(symbol), in_anchor_frame);
        });
        if !resolved {
            cursor.visit(None, in_anchor_frame);
        }

        cursor.found.is_none()
    });

    cursor.found
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::{CallerInfo, ExecutionContext, NativeContext, UNKNOWN_THREAD, keep_frame};

    macro_rules! function_name {
        () => {{
            fn f() {}
            fn type_name_of<T>(_: T) -> &'static str {
                std::any::type_name::<T>()
            }
            type_name_of(f).trim_end_matches("::f")
        }};
    }

    #[inline(never)]
    fn resolve_from_helper(skip_frames: usize) -> CallerInfo {
        let caller = NativeContext.resolve_caller(skip_frames);
        keep_frame();
        caller
    }

    #[test]
    fn resolves_the_invoking_function() {
        let line = i64::from(line!()) + 1;
        let caller = NativeContext.resolve_caller(0);

        assert_eq!(caller, CallerInfo::new(function_name!(), "context.rs", line));
    }

    #[test]
    fn skips_requested_frames() {
        let line = i64::from(line!()) + 1;
        let caller = resolve_from_helper(1);

        assert_eq!(caller.function, function_name!());
        assert_eq!(caller.line, line);
        assert!(resolve_from_helper(0).function.ends_with("::resolve_from_helper"));
    }

    #[test]
    fn too_deep_yields_placeholders() {
        assert_eq!(NativeContext.resolve_caller(100_000), CallerInfo::unknown());
    }

    #[test]
    fn thread_ids_are_numeric_and_distinct() {
        let here = NativeContext.current_thread_id();
        let there = thread::spawn(|| NativeContext.current_thread_id()).join().unwrap();

        for id in [&here, &there] {
            assert_ne!(id, UNKNOWN_THREAD);
            assert!(id.parse::<u64>().is_ok());
        }
        assert_ne!(here, there);
    }
}
