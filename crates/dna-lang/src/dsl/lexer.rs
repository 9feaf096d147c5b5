//! Lexer for DNA-Lang source text
//!
//! Strips comments, then splits the remaining text into a flat token
//! sequence. Tokens are untyped text; the parser decides what they mean.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters that always form a token on their own.
pub const STRUCTURAL: [char; 8] = ['{', '}', '(', ')', ',', ':', '[', ']'];

/// A single lexical unit. Quoted strings keep their delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is(&self, literal: &str) -> bool {
        self.text == literal
    }

    /// True for a complete `"..."` token.
    pub fn is_quoted(&self) -> bool {
        self.text.len() >= 2 && self.text.starts_with('"') && self.text.ends_with('"')
    }

    /// The token text with surrounding quotes removed, if it had any.
    pub fn unquoted(&self) -> &str {
        if self.is_quoted() {
            &self.text[1..self.text.len() - 1]
        } else {
            &self.text
        }
    }

    pub fn is_structural(&self) -> bool {
        let mut chars = self.text.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if STRUCTURAL.contains(&c))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lexer for DNA-Lang
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    /// Create a lexer over `source`. Comments are removed up front.
    pub fn new(source: &str) -> Self {
        Self {
            input: strip_comments(source).chars().collect(),
            position: 0,
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    /// Get the next token, `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();

        let ch = self.current_char()?;
        let text = match ch {
            '"' => self.read_string(),
            c if STRUCTURAL.contains(&c) => {
                self.advance();
                c.to_string()
            }
            _ => self.read_word(),
        };

        if text.trim().is_empty() {
            return self.next_token();
        }
        Some(Token::new(text))
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Read through the closing quote inclusive. An unterminated string
    /// runs to the end of input.
    fn read_string(&mut self) -> String {
        let mut string = String::from('"');
        self.advance();

        while let Some(ch) = self.current_char() {
            string.push(ch);
            self.advance();
            if ch == '"' {
                break;
            }
        }

        string
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || STRUCTURAL.contains(&ch) {
                break;
            }
            word.push(ch);
            self.advance();
        }

        word
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }
}

/// Tokenize `source` in one call.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

/// Remove `/* */` block comments, then `//` and `#` line comments.
///
/// Purely textual: comment markers inside string literals are stripped too.
/// An unterminated block comment swallows the rest of the input.
pub fn strip_comments(source: &str) -> String {
    let mut without_blocks = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("/*") {
        without_blocks.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    without_blocks.push_str(rest);

    without_blocks
        .lines()
        .map(|line| {
            let cut = [line.find("//"), line.find('#')]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(line.len());
            &line[..cut]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(
            texts("ORGANISM X { a: [1, 2] (b) }"),
            vec!["ORGANISM", "X", "{", "a", ":", "[", "1", ",", "2", "]", "(", "b", ")", "}"]
        );
    }

    #[test]
    fn test_string_keeps_quotes_and_spaces() {
        let tokens = tokenize(r#"purpose: "heal the system""#);
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].text, "\"heal the system\"");
        assert!(tokens[2].is_quoted());
        assert_eq!(tokens[2].unquoted(), "heal the system");
    }

    #[test]
    fn test_string_with_structural_chars() {
        assert_eq!(texts(r#""a{b}:c""#), vec!["\"a{b}:c\""]);
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        let tokens = tokenize("name: \"open ended");
        assert_eq!(tokens.last().map(|t| t.text.as_str()), Some("\"open ended"));
        assert!(!tokens[2].is_quoted());
    }

    #[test]
    fn test_words_stop_at_structural() {
        assert_eq!(texts("0.75,true}"), vec!["0.75", ",", "true", "}"]);
        assert_eq!(texts("<= >= !="), vec!["<=", ">=", "!="]);
    }

    #[test]
    fn test_comments() {
        let source = "// header\nORGANISM X { # trailing\n /* block\n spanning */ }";
        assert_eq!(texts(source), vec!["ORGANISM", "X", "{", "}"]);
    }

    #[test]
    fn test_comment_markers_inside_strings_are_stripped() {
        assert_eq!(texts(r#"url: "http://host""#), vec!["url", ":", "\"http:"]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(texts("A /* never closed } B"), vec!["A"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t // only a comment").is_empty());
    }
}
