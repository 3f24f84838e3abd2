//! Tokenizer receives usda file as input and outputs tokens for
//! further analysis.
//!
//! It uses `logos` crate under the hood to provide efficient and
//! robust tokenization.

use std::ops::Range;

use anyhow::Result;
use logos::Logos;

use crate::error::{LexError, Position};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIs, strum::EnumTryAs)]
#[logos(skip r"[ \t\r\n\f]+")] // Skip whitespace
#[logos(skip r"#[^\n]*")] // Skip comments, including the `#usda 1.0` header
pub enum Token<'source> {
    #[token("def")]
    Def,
    #[token("class")]
    Class,
    #[token("over")]
    Over,
    #[token("uniform")]
    Uniform,
    #[token("custom")]
    Custom,
    #[token("prepend")]
    Prepend,
    #[token("true")]
    True,
    #[token("false")]
    False,

    /// Array type marker, also an empty array literal.
    /// Example: "float3[]"
    #[token("[]")]
    ArrayMarker,

    /// Double-quoted strings, no escapes and no line breaks.
    /// Example: "hello world" -> hello world
    #[regex(r#""[^"\n]*""#, |lex| trim_chars(lex.slice(), 1))]
    String(&'source str),

    /// Examples: "42", "3.14", "1.23e-4", "-42"
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'source str),

    /// Path references, brackets included.
    /// Example: "</World/Sphere.material:surface>"
    #[regex(r"<[^>]+>", |lex| lex.slice())]
    Reference(&'source str),

    #[regex(r"[=,(){}\[\]]", |lex| lex.slice().chars().next())]
    Punctuation(char),

    /// Identifiers, including namespaced and dotted ones.
    /// Examples: "Sphere", "inputs:diffuseColor", "outputs:surface.connect"
    #[regex(r"[A-Za-z_][A-Za-z_:.0-9]*", |lex| lex.slice())]
    Name(&'source str),
}

fn trim_chars(s: &str, n: usize) -> Option<&str> {
    if s.len() < 2 * n {
        None
    } else {
        Some(&s[n..s.len() - n])
    }
}

impl Token<'_> {
    /// Returns `true` for `def`, `class` and `over`.
    #[inline]
    pub fn is_specifier(&self) -> bool {
        matches!(self, Token::Def | Token::Class | Token::Over)
    }

    /// Returns `true` for `prepend`, `custom` and `uniform`.
    #[inline]
    pub fn is_qualifier(&self) -> bool {
        matches!(self, Token::Prepend | Token::Custom | Token::Uniform)
    }

    #[inline]
    pub fn is_pun(&self, ch: char) -> bool {
        *self == Token::Punctuation(ch)
    }
}

/// Token paired with its byte range in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'source> {
    pub token: Token<'source>,
    pub span: Range<usize>,
}

/// Runs the lexer over the whole input.
///
/// The first unrecognized character sequence aborts tokenization with [LexError].
pub fn tokenize(source: &str) -> Result<Vec<Spanned<'_>>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(next) = lexer.next() {
        let span = lexer.span();

        match next {
            Ok(token) => tokens.push(Spanned { token, span }),
            Err(()) => {
                return Err(LexError {
                    position: Position::locate(source, span.start),
                    text: lexer.slice().to_string(),
                }
                .into())
            }
        }
    }

    log::debug!("Tokenized {} bytes into {} tokens", source.len(), tokens.len());

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn tokens(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn empty_file() {
        assert!(tokens("").is_empty());
        assert!(tokens(" ").is_empty());
        assert!(tokens(
            "

            "
        )
        .is_empty());
        assert!(tokens("#usda 1.0\n# Just a comment").is_empty());
    }

    #[test]
    fn parse_world() {
        let f = fs::read_to_string("fixtures/world.usda").unwrap();

        let expected = [
            // def Xform "World" (
            Token::Def,
            Token::Name("Xform"),
            Token::String("World"),
            Token::Punctuation('('),
            // kind = "component"
            Token::Name("kind"),
            Token::Punctuation('='),
            Token::String("component"),
            Token::Punctuation(')'),
            Token::Punctuation('{'),
            // def Sphere "Ball" {
            Token::Def,
            Token::Name("Sphere"),
            Token::String("Ball"),
            Token::Punctuation('{'),
            // uniform double radius = 2.5
            Token::Uniform,
            Token::Name("double"),
            Token::Name("radius"),
            Token::Punctuation('='),
            Token::Number("2.5"),
            // rel material:binding = </World/Looks/Red>
            Token::Name("rel"),
            Token::Name("material:binding"),
            Token::Punctuation('='),
            Token::Reference("</World/Looks/Red>"),
            Token::Punctuation('}'),
            // float3[] extent = [(-1, -1, -1), (1, 1, 1)]
            Token::Name("float3"),
            Token::ArrayMarker,
            Token::Name("extent"),
            Token::Punctuation('='),
            Token::Punctuation('['),
            Token::Punctuation('('),
            Token::Number("-1"),
            Token::Punctuation(','),
            Token::Number("-1"),
            Token::Punctuation(','),
            Token::Number("-1"),
            Token::Punctuation(')'),
            Token::Punctuation(','),
            Token::Punctuation('('),
            Token::Number("1"),
            Token::Punctuation(','),
            Token::Number("1"),
            Token::Punctuation(','),
            Token::Number("1"),
            Token::Punctuation(')'),
            Token::Punctuation(']'),
            Token::Punctuation('}'),
        ];

        assert_eq!(tokens(&f), expected);
    }

    #[test]
    fn parse_keywords_and_names() {
        assert_eq!(
            tokens("prepend custom uniform true false definition overs"),
            [
                Token::Prepend,
                Token::Custom,
                Token::Uniform,
                Token::True,
                Token::False,
                Token::Name("definition"),
                Token::Name("overs"),
            ]
        );

        assert_eq!(
            tokens("outputs:surface.connect xformOp:translate _private9"),
            [
                Token::Name("outputs:surface.connect"),
                Token::Name("xformOp:translate"),
                Token::Name("_private9"),
            ]
        );
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(
            tokens("42 -42 3.14 1.23e-4 5E+10"),
            [
                Token::Number("42"),
                Token::Number("-42"),
                Token::Number("3.14"),
                Token::Number("1.23e-4"),
                Token::Number("5E+10"),
            ]
        );
    }

    #[test]
    fn parse_empty_array() {
        assert_eq!(tokens("[]"), [Token::ArrayMarker]);
        assert_eq!(tokens("[ ]"), [Token::Punctuation('['), Token::Punctuation(']')]);
    }

    #[test]
    fn parse_strings() {
        assert_eq!(
            tokens(r#""test string" "" "with # hash""#),
            [
                Token::String("test string"),
                Token::String(""),
                Token::String("with # hash"),
            ]
        );
    }

    #[test]
    fn trailing_comment() {
        assert_eq!(
            tokens("double radius = 1 # unit sphere\n"),
            [
                Token::Name("double"),
                Token::Name("radius"),
                Token::Punctuation('='),
                Token::Number("1"),
            ]
        );
    }

    #[test]
    fn spans() {
        let spanned = tokenize("def \"A\"").unwrap();
        assert_eq!(spanned[0].span, 0..3);
        assert_eq!(spanned[1].span, 4..7);
    }

    #[test]
    fn unrecognized_input() {
        let err = tokenize("def Xform \"World\" {\n  $bad\n}").unwrap_err();
        let err = err.downcast_ref::<LexError>().unwrap();

        assert_eq!(err.position, Position { line: 2, column: 3 });
        assert_eq!(err.text, "$");

        // Strings can't span lines.
        assert!(tokenize("\"unterminated\nstring\"").is_err());
    }

    #[test]
    fn token_helpers() {
        let token = Token::Punctuation('=');
        assert!(token.is_punctuation()); // EnumIs generated method
        assert!(token.is_pun('='));
        assert_eq!(token.try_as_punctuation(), Some('=')); // EnumTryAs generated method

        let token = Token::Name("test");
        assert!(token.is_name());
        assert_eq!(token.try_as_name(), Some("test"));
        assert_eq!(token.try_as_punctuation(), None);

        assert!(Token::Over.is_specifier());
        assert!(!Token::Uniform.is_specifier());
        assert!(Token::Prepend.is_qualifier());
        assert_eq!(Token::Def.to_string(), "Def");
    }
}
