//! Reader for the `key=value` properties format used by the mirror's
//! identity record.
//!
//! Follows the java `.properties` conventions that show up in practice:
//! `#`/`!` comments, `=`, `:` or whitespace separators, backslash escapes
//! (`https\://host` is common) and backslash line continuations.

use std::collections::BTreeMap;

/// Parse properties text into an ordered map.
///
/// Later definitions of the same key replace earlier ones.
pub fn parse(content: &str) -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();

    for line in logical_lines(content) {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        let (key, value) = split_entry(trimmed);
        properties.insert(unescape(key), unescape(value));
    }

    properties
}

/// Join physical lines ending in an odd number of backslashes with the
/// following line, dropping the continuation's leading whitespace.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in content.lines() {
        let part = if continuing { raw.trim_start() } else { raw };

        // Comments never continue onto the next line
        if !continuing && part.trim_start().starts_with(['#', '!']) {
            lines.push(part.to_string());
            continue;
        }

        let trailing = part.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.push_str(&part[..part.len() - 1]);
            continuing = true;
            continue;
        }

        current.push_str(part);
        lines.push(std::mem::take(&mut current));
        continuing = false;
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\x0c']);
    }

    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_entries() {
        let props = parse("name=staging\nurl = https://ci.example/\n");
        assert_eq!(props.get("name").map(String::as_str), Some("staging"));
        assert_eq!(
            props.get("url").map(String::as_str),
            Some("https://ci.example/")
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let props = parse("# stored by hand\n! legacy comment\n\n   \nname=prod\n");
        assert_eq!(props.len(), 1);
        assert_eq!(props.get("name").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_parse_escaped_colon_in_value() {
        let props = parse("url=https\\://ci.example\\:8443/\n");
        assert_eq!(
            props.get("url").map(String::as_str),
            Some("https://ci.example:8443/")
        );
    }

    #[test]
    fn test_parse_colon_and_whitespace_separators() {
        let props = parse("name: alpha\nurl https://a.example/\n");
        assert_eq!(props.get("name").map(String::as_str), Some("alpha"));
        assert_eq!(
            props.get("url").map(String::as_str),
            Some("https://a.example/")
        );
    }

    #[test]
    fn test_parse_line_continuation() {
        let props = parse("url=https://ci.example/\\\n    jenkins/\n");
        assert_eq!(
            props.get("url").map(String::as_str),
            Some("https://ci.example/jenkins/")
        );
    }

    #[test]
    fn test_parse_unicode_escape() {
        let props = parse("name=caf\\u00e9\n");
        assert_eq!(props.get("name").map(String::as_str), Some("café"));
    }

    #[test]
    fn test_parse_last_definition_wins() {
        let props = parse("name=a\nname=b\n");
        assert_eq!(props.get("name").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_parse_key_without_value() {
        let props = parse("empty\n");
        assert_eq!(props.get("empty").map(String::as_str), Some(""));
    }
}
