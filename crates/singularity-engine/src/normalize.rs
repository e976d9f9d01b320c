//! Source canonicalization used before pattern matching.
//!
//! Each function is total: any input, including the empty string, yields a
//! string. None of them reorder content; they only erase differences a
//! validator chooses not to care about.

/// Rewrites every `'` to `"` so one quote style can be matched.
#[must_use]
pub fn unify_quotes(source: &str) -> String {
    source.replace('\'', "\"")
}

/// Replaces every run of whitespace, newlines included, with a single space.
#[must_use]
pub fn collapse_whitespace(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_run = false;
    for ch in source.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

/// Removes every whitespace character.
#[must_use]
pub fn strip_whitespace(source: &str) -> String {
    source.chars().filter(|ch| !ch.is_whitespace()).collect()
}

// ============================================================================
// Submission
// ============================================================================

/// A canonicalized view of a submission.
///
/// Validators pick the view whose granularity suits each check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The text exactly as submitted.
    Raw,
    /// Quotes unified, whitespace preserved. Needed for indentation checks.
    Quoted,
    /// Quotes unified and whitespace runs collapsed to one space.
    Collapsed,
    /// Quotes unified and all whitespace removed.
    Stripped,
}

/// A submission with every view computed once.
#[derive(Debug, Clone)]
pub struct Submission {
    raw: String,
    quoted: String,
    collapsed: String,
    stripped: String,
}

impl Submission {
    /// Builds all views of `source`.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let quoted = unify_quotes(source);
        let collapsed = collapse_whitespace(&quoted);
        let stripped = strip_whitespace(&quoted);
        Self {
            raw: source.to_string(),
            quoted,
            collapsed,
            stripped,
        }
    }

    /// Returns the requested view.
    #[must_use]
    pub fn view(&self, view: View) -> &str {
        match view {
            View::Raw => &self.raw,
            View::Quoted => &self.quoted,
            View::Collapsed => &self.collapsed,
            View::Stripped => &self.stripped,
        }
    }

    /// Returns `true` if the trimmed submission is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify_quotes() {
        assert_eq!(unify_quotes("print('hi')"), "print(\"hi\")");
        assert_eq!(unify_quotes(""), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("for i in  range(5):\n\t print(i)"),
            "for i in range(5): print(i)"
        );
        assert_eq!(collapse_whitespace("\n\n"), " ");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("energy = 100\nprint( energy )"), "energy=100print(energy)");
        assert_eq!(strip_whitespace("   "), "");
    }

    #[test]
    fn test_submission_views() {
        let submission = Submission::new("if x == 'a':\n    print('b')");
        assert_eq!(submission.view(View::Raw), "if x == 'a':\n    print('b')");
        assert_eq!(submission.view(View::Quoted), "if x == \"a\":\n    print(\"b\")");
        assert_eq!(submission.view(View::Collapsed), "if x == \"a\": print(\"b\")");
        assert_eq!(submission.view(View::Stripped), "ifx==\"a\":print(\"b\")");
    }

    #[test]
    fn test_blank_detection() {
        assert!(Submission::new("").is_blank());
        assert!(Submission::new(" \n\t ").is_blank());
        assert!(!Submission::new("x").is_blank());
    }
}
