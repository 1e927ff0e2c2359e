use std::sync::OnceLock;

use anyhow::{Result, bail};

use crate::{
    context::CallerInfo,
    level::Severity,
    style::{Palette, Role},
};

/// Printed before the thread id.
pub const THREAD_TAG: &str = "Thread";

/// Build identity embedded in every line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub git: String,
    pub build: String,
}

impl BuildInfo {
    pub fn new(git: impl Into<String>, build: impl Into<String>) -> Self {
        Self { git: git.into(), build: build.into() }
    }
}

static BUILD_INFO: OnceLock<BuildInfo> = OnceLock::new();
static EMPTY_BUILD_INFO: BuildInfo = BuildInfo { git: String::new(), build: String::new() };

/// Sets the process-wide build identity. Only the first call succeeds.
pub fn set_build_info(git: impl Into<String>, build: impl Into<String>) -> Result<()> {
    if BUILD_INFO.set(BuildInfo::new(git, build)).is_err() {
        bail!("The build info was already set");
    }
    Ok(())
}

/// The process-wide build identity, empty until [`set_build_info`] runs.
pub fn build_info() -> &'static BuildInfo {
    BUILD_INFO.get().unwrap_or(&EMPTY_BUILD_INFO)
}

/// Everything a single output line is made of.
pub struct Line<'a> {
    pub severity: Severity,
    pub thread_id: &'a str,
    pub message: &'a str,
    pub caller: &'a CallerInfo,
    pub build: &'a BuildInfo,
}

impl Line<'_> {
    /// Renders the newline-terminated line:
    /// `[Level] Thread<id>: <message> <function>():<file>:<line> {git:<git>, build:<build>}`.
    pub fn render(&self, palette: &Palette) -> String {
        let Self { severity, thread_id, message, caller, build } = self;
        let level = format!("[{}]", severity.name());
        let function = format!("{}()", caller.function);
        let message = if message.is_empty() { String::new() } else { format!(" {message}") };

        format!(
            "{} {}{}:{message} {}:{}:{} {{git:{}, build:{}}}\n",
            palette.paint(Role::Level(*severity), &level),
            palette.paint(Role::ThreadTag, THREAD_TAG),
            palette.paint(Role::ThreadId, thread_id),
            palette.paint(Role::Function, &function),
            palette.paint(Role::File, &caller.file),
            palette.paint(Role::Line, &caller.line.to_string()),
            build.git,
            build.build,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildInfo, Line};
    use crate::{context::CallerInfo, level::Severity, style::Palette};

    fn render(message: &str, build: &BuildInfo) -> String {
        let caller = CallerInfo::new("app::run", "main.rs", 42);
        Line { severity: Severity::Notice, thread_id: "7", message, caller: &caller, build }
            .render(&Palette::plain())
    }

    #[test]
    fn line_shape() {
        let build = BuildInfo::new("3f2a9c1", "2024.06");
        assert_eq!(
            render("user, id(5)", &build),
            "[Notice] Thread7: user, id(5) app::run():main.rs:42 {git:3f2a9c1, build:2024.06}\n"
        );
    }

    #[test]
    fn empty_message_leaves_no_gap() {
        assert_eq!(
            render("", &BuildInfo::default()),
            "[Notice] Thread7: app::run():main.rs:42 {git:, build:}\n"
        );
    }

    #[test]
    fn placeholders_render_verbatim() {
        let caller = CallerInfo::unknown();
        let line = Line {
            severity: Severity::Fatal,
            thread_id: "-1",
            message: "x",
            caller: &caller,
            build: &BuildInfo::default(),
        }
        .render(&Palette::plain());

        assert!(line.starts_with("[Fatal] Thread-1: x ???():???:-1 "));
    }
}
