use colored::{ColoredString, Colorize};

use crate::level::Severity;

/// Whether lines are styled at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Styles lines unless `colored` detects a non-terminal output or `NO_COLOR`.
    #[default]
    Auto,
    Never,
}

/// Semantic part of a line. The style of a segment depends only on its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Level(Severity),
    ThreadTag,
    ThreadId,
    Function,
    File,
    Line,
    FieldKey,
}

impl Role {
    fn style(self, text: &str) -> ColoredString {
        match self {
            Self::Level(Severity::Fatal) => text.on_red(),
            Self::Level(Severity::Error) => text.bright_red(),
            Self::Level(Severity::Warn) => text.bright_yellow(),
            Self::Level(Severity::Notice) => text.bright_green(),
            Self::Level(Severity::Info) => text.bright_blue(),
            Self::Level(Severity::Debug) => text.bright_black(),
            Self::ThreadTag | Self::ThreadId => text.white(),
            Self::Function => text.cyan(),
            Self::File => text.bright_magenta(),
            Self::Line => text.yellow(),
            Self::FieldKey => text.green(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Palette {
    mode: ColorMode,
}

impl Palette {
    pub const fn new(mode: ColorMode) -> Self {
        Self { mode }
    }

    pub const fn plain() -> Self {
        Self::new(ColorMode::Never)
    }

    pub const fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn paint(&self, role: Role, text: &str) -> String {
        match self.mode {
            ColorMode::Auto => role.style(text).to_string(),
            ColorMode::Never => text.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorMode, Palette, Role};
    use crate::level::Severity;

    #[test]
    fn plain_palette_leaves_text_alone() {
        let palette = Palette::plain();
        for role in [Role::Level(Severity::Fatal), Role::Function, Role::FieldKey] {
            assert_eq!(palette.paint(role, "text"), "text");
        }
    }

    #[test]
    fn forced_colors_wrap_text() {
        colored::control::set_override(true);
        let painted = Palette::new(ColorMode::Auto).paint(Role::Level(Severity::Error), "[Error]");
        colored::control::unset_override();

        assert!(painted.starts_with("\x1b["));
        assert!(painted.contains("[Error]"));
        assert_ne!(painted, "[Error]");
    }
}
