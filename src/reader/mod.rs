//! Source reader (spec §2, C1).
//!
//! Turns a file path into UTF-8 text plus the handful of facts downstream
//! phases need about it: its display name (used in diagnostics and, via
//! the driver, as the stem of the generated `.c` file) and the raw source
//! text the lexer walks char-by-char. Byte offsets are not tracked
//! separately here — the lexer derives line/column directly while
//! scanning, exactly as `Span` records them (spec SPEC_FULL.md §3).
use std::{fmt, fs, io, path::Path};

/// A source file read into memory. Cheap to construct; owns its text so the
/// rest of the pipeline can borrow from it for the lifetime of a single
/// compilation.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    text: String,
}

impl SourceFile {
    /// Reads `path` as UTF-8, rejecting anything that isn't (spec §6: the
    /// source grammar is defined over Unicode code points, which requires
    /// valid UTF-8 up front).
    pub fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, text })
    }

    /// Builds a source file directly from in-memory text, for tests and for
    /// tooling that doesn't read from disk.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The file stem, used by the driver to name the generated `.c` file
    /// (`foo.pb` -> `foo.c`).
    pub fn stem(&self) -> &str {
        self.name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(&self.name)
    }

    /// The source line at 1-based `line`, used by diagnostics rendering.
    /// Returns an empty string for an out-of-range line rather than
    /// panicking, since a synthesized span (e.g. an EOF token) may point one
    /// past the last line.
    pub fn line(&self, line: usize) -> &str {
        self.text.lines().nth(line.saturating_sub(1)).unwrap_or("")
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_extension() {
        let src = SourceFile::from_text("main.pb", "pass\n");
        assert_eq!(src.stem(), "main");
    }

    #[test]
    fn line_is_one_based() {
        let src = SourceFile::from_text("main.pb", "a\nb\nc\n");
        assert_eq!(src.line(1), "a");
        assert_eq!(src.line(3), "c");
        assert_eq!(src.line(4), "");
    }
}
