use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Location};
use crate::utils::quote;

lazy_static! {
    pub static ref TOKEN_REGEX: Regex = Regex::new(
        r#"(?x)
          (?P<skip>\s+ | //[^\n]* | /\*(?s:.*?)\*/)
        | \d+\.\d*(?:[eE][+-]?\d+)? | \.\d+(?:[eE][+-]?\d+)? | \d+[eE][+-]?\d+
        | 0[xX][0-9A-Fa-f]+ | \d+
        | [A-Za-z_][A-Za-z0-9_]*
        | "(?:[^"\\\n]|\\.)*" | '(?:[^'\\\n]|\\.)*'
        | [=;{}\[\]()<>,.:+\-]
        "#
    )
    .unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

impl Token {
    pub fn location(&self, path: &Path) -> Location {
        Location::new(path, self.line, self.column)
    }

    pub fn is_eof(&self) -> bool {
        self.text.is_empty()
    }
}

/// Splits schema text into tokens, dropping whitespace and comments.
///
/// The returned stream always ends with an empty EOF token carrying the
/// position just past the input.
pub fn tokenize_schema(text: &str, path: &Path) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut last_end = 0;

    for captures in TOKEN_REGEX.captures_iter(text) {
        let Some(mat) = captures.get(0) else { continue };
        if mat.start() > last_end {
            return Err(unexpected(&text[last_end..mat.start()], path, line, column));
        }

        let part = mat.as_str();
        if captures.name("skip").is_none() {
            tokens.push(Token { text: part.to_string(), line, column });
        }

        let newline_count = part.matches('\n').count();
        if newline_count > 0 {
            line += newline_count;
            if let Some(last_line_part) = part.rsplit('\n').next() {
                column = last_line_part.chars().count() + 1;
            }
        } else {
            column += part.chars().count();
        }

        last_end = mat.end();
    }

    if last_end != text.len() {
        return Err(unexpected(&text[last_end..], path, line, column));
    }

    tokens.push(Token { text: String::new(), line, column });
    Ok(tokens)
}

fn unexpected(rest: &str, path: &Path, line: usize, column: usize) -> Error {
    let message = if rest.starts_with('"') || rest.starts_with('\'') {
        "unterminated string literal".to_string()
    } else if rest.starts_with("/*") {
        "unterminated block comment".to_string()
    } else {
        let snippet: String = rest.chars().take_while(|c| !c.is_whitespace()).take(16).collect();
        format!("Syntax error: {}", quote(&snippet))
    };
    Error::schema_format(&Location::new(path, line, column), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
        tokenize_schema(input, Path::new("test.proto"))
    }

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).unwrap().into_iter().map(|token| token.text).collect()
    }

    #[test]
    fn test_tokenize_simple() {
        let input = "int32 x = 10;";
        let expected = vec![
            Token { text: "int32".into(), line: 1, column: 1 },
            Token { text: "x".into(),     line: 1, column: 7 },
            Token { text: "=".into(),     line: 1, column: 9 },
            Token { text: "10".into(),    line: 1, column: 11 },
            Token { text: ";".into(),     line: 1, column: 13 },
            Token { text: "".into(),      line: 1, column: 14 },
        ];
        assert_eq!(tokenize(input).unwrap(), expected);
    }

    #[test]
    fn test_tokenize_tracks_lines_across_comments() {
        let input = "// header\nmessage /* multi\nline */ A {}";
        let got = tokenize(input).unwrap();
        assert_eq!(got[0], Token { text: "message".into(), line: 2, column: 1 });
        assert_eq!(got[1], Token { text: "A".into(), line: 3, column: 9 });
        assert_eq!(got[2].text, "{");
        assert_eq!(got[3].text, "}");
        assert!(got[4].is_eof());
    }

    #[test]
    fn test_tokenize_literals() {
        assert_eq!(
            texts(r#"x = -0x1F 017 1.5e3 .5 "a\"b" 'c';"#),
            vec!["x", "=", "-", "0x1F", "017", "1.5e3", ".5", r#""a\"b""#, "'c'", ";", ""]
        );
    }

    #[test]
    fn test_tokenize_qualified_names_and_options() {
        assert_eq!(
            texts("repeated .pkg.Msg m = 1 [packed=true];"),
            vec!["repeated", ".", "pkg", ".", "Msg", "m", "=", "1", "[", "packed", "=", "true", "]", ";", ""]
        );
        assert_eq!(
            texts("map<string, int32>"),
            vec!["map", "<", "string", ",", "int32", ">", ""]
        );
    }

    #[test]
    fn test_tokenize_unexpected_text() {
        let err = tokenize("int32 x = 10 @").unwrap_err();
        assert!(
            matches!(err, Error::SchemaFormat { line: 1, column: 14, .. }),
            "expected a SchemaFormat error but got {:?}",
            err
        );
    }

    #[test]
    fn test_tokenize_unterminated() {
        let err = tokenize("option x = \"abc;\n").unwrap_err();
        assert!(err.to_string().contains("unterminated string literal"), "{}", err);

        let err = tokenize("message A {} /* open").unwrap_err();
        assert!(err.to_string().contains("unterminated block comment"), "{}", err);
    }
}
