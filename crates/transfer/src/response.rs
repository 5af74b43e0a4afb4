//! Response accumulator.
//!
//! A [`Response`] carries captured output and a return code across any number
//! of operations. Merging concatenates the streams in call order and keeps the
//! first non-zero return code: a later success never masks an earlier failure.

use std::fmt::Write as _;

/// Return code of a fault that has no code of its own (connection failure,
/// broken recipe, usage error).
pub const FAILURE_CODE: i32 = -1;

/// Return code recorded for failures of the local mirror.
pub const LOCAL_FAILURE_CODE: i32 = 1;

/// Captured stdout/stderr and return code of one or more operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    stdout: String,
    stderr: String,
    return_code: i32,
}

impl Response {
    /// Empty, successful response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Response of a single command.
    pub fn from_output(
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        return_code: i32,
    ) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            return_code,
        }
    }

    /// Failed response with `message` on stderr.
    pub fn failure(return_code: i32, message: impl AsRef<str>) -> Self {
        let mut response = Self::new();
        response.err(message);
        response.return_code = return_code;
        response
    }

    /// Append a line to stdout.
    pub fn out(&mut self, line: impl AsRef<str>) -> &mut Self {
        let _ = writeln!(self.stdout, "{}", line.as_ref());
        self
    }

    /// Append a line to stderr.
    pub fn err(&mut self, line: impl AsRef<str>) -> &mut Self {
        let _ = writeln!(self.stderr, "{}", line.as_ref());
        self
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn return_code(&self) -> i32 {
        self.return_code
    }

    pub fn succeeded(&self) -> bool {
        self.return_code == 0
    }

    /// Overwrite the return code regardless of what was recorded before.
    pub fn force_return_code(&mut self, return_code: i32) -> &mut Self {
        self.return_code = return_code;
        self
    }

    /// Merge `other` into `self`.
    pub fn merge(&mut self, other: Response) -> &mut Self {
        self.stdout.push_str(&other.stdout);
        self.stderr.push_str(&other.stderr);
        if self.return_code == 0 {
            self.return_code = other.return_code;
        }
        self
    }

    /// Owned variant of [`merge`](Self::merge).
    pub fn merged(mut self, other: Response) -> Self {
        self.merge(other);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rc(code: i32) -> Response {
        Response::from_output("", "", code)
    }

    #[test]
    fn test_merge_keeps_first_failure() {
        assert_eq!(rc(2).merged(rc(0)).return_code(), 2);
        assert_eq!(rc(0).merged(rc(3)).return_code(), 3);
        assert_eq!(rc(0).merged(rc(0)).return_code(), 0);
        assert_eq!(rc(4).merged(rc(7)).return_code(), 4);
    }

    #[test]
    fn test_merge_is_associative() {
        let codes = [0, 2, 0, 5];
        for a in codes {
            for b in codes {
                for c in codes {
                    let left = rc(a).merged(rc(b)).merged(rc(c));
                    let right = rc(a).merged(rc(b).merged(rc(c)));
                    assert_eq!(left.return_code(), right.return_code());
                }
            }
        }
    }

    #[test]
    fn test_merge_concatenates_streams_in_order() {
        let mut response = Response::new();
        response.out("first");
        response.merge(Response::from_output("second\n", "oops\n", 1));
        response.merge(Response::failure(2, "later"));

        assert_eq!(response.stdout(), "first\nsecond\n");
        assert_eq!(response.stderr(), "oops\nlater\n");
        assert_eq!(response.return_code(), 1);
    }

    #[test]
    fn test_succeeded() {
        assert!(Response::new().succeeded());
        assert!(!Response::failure(FAILURE_CODE, "broken").succeeded());
    }

    #[test]
    fn test_force_return_code_overrides_sticky_code() {
        let mut response = rc(5);
        response.force_return_code(FAILURE_CODE);
        assert_eq!(response.return_code(), FAILURE_CODE);
    }
}
