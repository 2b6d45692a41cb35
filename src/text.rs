//! Line-ending detection, normalization and line splitting.
//!
//! Instruction text is processed as a sequence of lines. The line ending of
//! the original file (CRLF if it contains any `\r\n`, LF otherwise) is
//! detected once and used when the lines are joined back together.

/// A line-ending convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// Detects the convention of `text`: CRLF if it contains any `\r\n`.
    pub fn detect(text: &str) -> Self {
        Self::detect_bytes(text.as_bytes())
    }

    /// Detects the convention of raw bytes.
    pub fn detect_bytes(data: &[u8]) -> Self {
        if data.windows(2).any(|w| w == b"\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    /// Returns the terminator.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Rewrites every line break in `text` to this convention.
    ///
    /// Lone carriage returns are left alone.
    pub fn normalize(self, text: &str) -> String {
        let unified = text.replace("\r\n", "\n");
        match self {
            LineEnding::Lf => unified,
            LineEnding::CrLf => unified.replace('\n', "\r\n"),
        }
    }

    /// Byte-level counterpart of [`normalize`](Self::normalize).
    pub fn normalize_bytes(self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + data.len() / 32);
        let mut i = 0;
        while i < data.len() {
            let byte = data[i];
            if byte == b'\r' && data.get(i + 1) == Some(&b'\n') {
                i += 1;
                continue;
            }
            if byte == b'\n' {
                out.extend_from_slice(self.as_str().as_bytes());
            } else {
                out.push(byte);
            }
            i += 1;
        }
        out
    }

    /// Joins `lines`, terminating every line (including the last).
    pub fn join<S: AsRef<str>>(self, lines: &[S]) -> String {
        let eol = self.as_str();
        let capacity = lines.iter().map(|l| l.as_ref().len() + eol.len()).sum();
        let mut out = String::with_capacity(capacity);
        for line in lines {
            out.push_str(line.as_ref());
            out.push_str(eol);
        }
        out
    }
}

impl std::fmt::Display for LineEnding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineEnding::Lf => write!(f, "LF"),
            LineEnding::CrLf => write!(f, "CRLF"),
        }
    }
}

/// Splits `text` into lines without their terminators.
///
/// Both `\n` and `\r\n` end a line. A final terminator does not produce an
/// empty trailing line, so `lines("a\nb\n")` and `lines("a\nb")` both yield
/// `["a", "b"]`.
pub fn lines(text: &str) -> Vec<&str> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\rb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }

    #[test]
    fn test_normalize_to_crlf_and_back() {
        let mixed = "G28\nG1 X1\r\nM400";
        assert_eq!(LineEnding::CrLf.normalize(mixed), "G28\r\nG1 X1\r\nM400");
        assert_eq!(LineEnding::Lf.normalize(mixed), "G28\nG1 X1\nM400");
        assert_eq!(
            LineEnding::CrLf.normalize_bytes(mixed.as_bytes()),
            b"G28\r\nG1 X1\r\nM400"
        );
        assert_eq!(
            LineEnding::Lf.normalize_bytes(mixed.as_bytes()),
            b"G28\nG1 X1\nM400"
        );
    }

    #[test]
    fn test_lone_carriage_return_is_kept() {
        assert_eq!(LineEnding::CrLf.normalize("a\rb"), "a\rb");
        assert_eq!(LineEnding::Lf.normalize_bytes(b"a\r"), b"a\r");
    }

    #[test]
    fn test_lines() {
        assert_eq!(lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(lines("a\n\nb\n\n"), vec!["a", "", "b", ""]);
        assert_eq!(lines("\n"), vec![""]);
        assert!(lines("").is_empty());
    }

    #[test]
    fn test_join_terminates_every_line() {
        assert_eq!(LineEnding::CrLf.join(&["a", "b"]), "a\r\nb\r\n");
        assert_eq!(LineEnding::Lf.join::<&str>(&[]), "");
        assert_eq!(LineEnding::CrLf.to_string(), "CRLF");
    }
}
