use colored::Colorize;
use transfer::Response;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print the captured streams of a response, then a one-line verdict.
pub fn print_response(response: &Response, quiet: bool) {
    print!("{}", response.stdout());
    for line in response.stderr().lines() {
        eprintln!("{}", line.dimmed());
    }

    if response.succeeded() {
        if !quiet {
            success("Done");
        }
    } else {
        error(&verdict(response.return_code()));
    }
}

fn verdict(code: i32) -> String {
    format!("Failed with exit code {code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict() {
        assert_eq!(verdict(5), "Failed with exit code 5");
        assert_eq!(verdict(-1), "Failed with exit code -1");
    }
}
