use std::fmt;

use serde::Serialize;

/// Zero-based line/character pair. Characters count `char`s, matching scanner offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// Half-open character offset range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: end.max(start) }
    }

    pub fn at(offset: usize, len: usize) -> Self {
        Self::new(offset, offset + len)
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Inclusive of `end` so a cursor sitting right after a name still hits it.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub fn contains_range(&self, other: &TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One parser finding. Problems in source text are data, never `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            message: message.into(),
            offset,
            length,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, offset: usize, length: usize) -> Self {
        Self {
            message: message.into(),
            offset,
            length,
            severity: Severity::Warning,
        }
    }

    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, self.length)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", level, self.message, self.range())
    }
}

/// Maps character offsets to line/character positions and back.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut len = 0;
        for (i, ch) in text.chars().enumerate() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
            len = i + 1;
        }
        Self { line_starts, len }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line_of(&self, offset: usize) -> u32 {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(next) => next.saturating_sub(1) as u32,
        }
    }

    pub fn position_of(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_of(offset);
        let start = self.line_starts[line as usize];
        Position::new(line, (offset - start) as u32)
    }

    pub fn offset_of(&self, position: Position) -> usize {
        let Some(&start) = self.line_starts.get(position.line as usize) else {
            return self.len;
        };
        let next = self.line_starts.get(position.line as usize + 1).copied().unwrap_or(self.len + 1);
        (start + position.character as usize).min(next.saturating_sub(1)).min(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_roundtrip() {
        let index = LineIndex::new("ab\ncd\n\nxyz");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position_of(0), Position::new(0, 0));
        assert_eq!(index.position_of(4), Position::new(1, 1));
        assert_eq!(index.position_of(6), Position::new(2, 0));
        assert_eq!(index.position_of(9), Position::new(3, 2));
        assert_eq!(index.offset_of(Position::new(3, 1)), 8);
    }

    #[test]
    fn test_offset_of_clamps_to_line_end() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset_of(Position::new(0, 40)), 2);
        assert_eq!(index.offset_of(Position::new(9, 0)), 5);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::error("Missing closing )", 1, 1);
        assert_eq!(d.to_string(), "error: Missing closing ) at 1..2");
        assert_eq!(Diagnostic::warning("w", 0, 0).severity, Severity::Warning);
    }
}
