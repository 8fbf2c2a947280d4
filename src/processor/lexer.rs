//! Escape-aware field lexer for `;` separated map lines.
//!
//! A backslash makes the following character literal, so `a\;b` is one
//! field. Escapes are *not* removed: item data values are opaque to the
//! decoder and are kept exactly as written.
//
//  Lexical items (equivalent to finding every match of `(\\.|[^;\\])+`):
//
//      Field    ::= ( '\' ANY | [^;\] )+
//      Sep      ::= ';'
//
//  Empty fields (`;;`, leading or trailing `;`) produce no token. A lone
//  trailing backslash escapes nothing and is dropped.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone)]
pub struct FieldLexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> FieldLexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn read_field(&mut self) -> String {
        let mut field = String::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                ';' => break,
                '\\' => {
                    self.chars.next();
                    if let Some(escaped) = self.chars.next() {
                        field.push(c);
                        field.push(escaped);
                    }
                }
                _ => {
                    field.push(c);
                    self.chars.next();
                }
            }
        }
        field
    }
}

impl Iterator for FieldLexer<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        while self.chars.peek() == Some(&';') {
            self.chars.next();
        }
        self.chars.peek()?;
        // only a dangling `\` at the very end reads as empty
        let field = self.read_field();
        (!field.is_empty()).then_some(field)
    }
}

/// Split an item line into its escape-aware fields.
pub fn split_escaped(line: &str) -> Vec<String> {
    FieldLexer::new(line).collect()
}

mod tests {
    #[cfg(test)]
    use super::split_escaped;

    #[test]
    fn test_splitting() {
        let test_cases = vec![
            ("0;0;100;50", vec!["0", "0", "100", "50"]),
            (
                r#"0;0;100;50;"a\;b""#,
                vec!["0", "0", "100", "50", r#""a\;b""#],
            ),
            (r"1;2;3;4;x\\;y", vec!["1", "2", "3", "4", r"x\\", "y"]),
            ("1;;2;3;4;", vec!["1", "2", "3", "4"]),
            (r"1;2;3;4;end\", vec!["1", "2", "3", "4", "end"]),
            (r"1;2;3;4;\", vec!["1", "2", "3", "4"]),
            ("", vec![]),
        ];

        for (src, expected) in test_cases {
            assert_eq!(split_escaped(src), expected, "input {src:?}");
        }
    }

    #[test]
    fn test_escaped_delimiter_stays_in_field() {
        let fields = split_escaped(r"5;6;7;8;name=a\;b;value=c");
        assert_eq!(fields.len(), 6);
        assert_eq!(fields[4], r"name=a\;b");
        assert_eq!(fields[5], "value=c");
    }
}
