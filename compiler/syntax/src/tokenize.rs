//! Convert a listing to a sequence of tokens.

use crate::{Error, Span};
use logos::Logos;
use serde::Serialize;
use strata_util::WithInfo;

/// A token in a listing.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Token<'src> {
    LeftParenthesis,
    RightParenthesis,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Assign,
    Dot,
    Ellipsis,
    Dollar,
    Keyword(Keyword),
    Name(&'src str),
    Number(i64),
    Text(String),
}

/// A reserved word.
#[allow(missing_docs)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, Serialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    Command,
    Pattern,
    Factory,
    Function,
    End,
    Address,
    Barrier,
    Catch,
    Exit,
    Leave,
    Redo,
    Raise,
    Nil,
    True,
    False,
}

#[derive(Debug, Logos)]
#[logos(skip r#"[\t\r\n ]+"#)]
#[logos(skip r#"#[^\n]*"#)]
enum RawToken<'src> {
    #[token("(")]
    LeftParenthesis,

    #[token(")")]
    RightParenthesis,

    #[token("[")]
    LeftBracket,

    #[token("]")]
    RightBracket,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(":=")]
    Assign,

    #[token(".")]
    Dot,

    #[token("...")]
    Ellipsis,

    #[token("$")]
    Dollar,

    #[token("command")]
    Command,

    #[token("pattern")]
    Pattern,

    #[token("factory")]
    Factory,

    #[token("function")]
    Function,

    #[token("end")]
    End,

    #[token("address")]
    Address,

    #[token("barrier")]
    Barrier,

    #[token("catch")]
    Catch,

    #[token("exit")]
    Exit,

    #[token("leave")]
    Leave,

    #[token("redo")]
    Redo,

    #[token("raise")]
    Raise,

    #[token("nil")]
    Nil,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[regex(r#"[A-Za-z_][A-Za-z0-9_]*"#, |lex| lex.slice())]
    Name(&'src str),

    #[regex(r#"-?[0-9]+"#, |lex| lex.slice().parse::<i64>().ok())]
    Number(i64),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Text(String),
}

fn unescape(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;

    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }

        text.push(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            '\\' => '\\',
            '"' => '"',
            _ => return None,
        });
    }

    Some(text)
}

/// Split `s` into tokens, stopping at the first unrecognized one.
pub fn tokenize(s: &str) -> Result<Vec<WithInfo<Span, Token<'_>>>, Error> {
    logos::Lexer::new(s)
        .spanned()
        .map(|(result, span)| {
            let raw_token = result.map_err(|()| Error::InvalidToken {
                offset: span.start,
                text: s[span.clone()].to_string(),
            })?;

            let token = match raw_token {
                RawToken::LeftParenthesis => Token::LeftParenthesis,
                RawToken::RightParenthesis => Token::RightParenthesis,
                RawToken::LeftBracket => Token::LeftBracket,
                RawToken::RightBracket => Token::RightBracket,
                RawToken::Comma => Token::Comma,
                RawToken::Semicolon => Token::Semicolon,
                RawToken::Colon => Token::Colon,
                RawToken::Assign => Token::Assign,
                RawToken::Dot => Token::Dot,
                RawToken::Ellipsis => Token::Ellipsis,
                RawToken::Dollar => Token::Dollar,
                RawToken::Command => Token::Keyword(Keyword::Command),
                RawToken::Pattern => Token::Keyword(Keyword::Pattern),
                RawToken::Factory => Token::Keyword(Keyword::Factory),
                RawToken::Function => Token::Keyword(Keyword::Function),
                RawToken::End => Token::Keyword(Keyword::End),
                RawToken::Address => Token::Keyword(Keyword::Address),
                RawToken::Barrier => Token::Keyword(Keyword::Barrier),
                RawToken::Catch => Token::Keyword(Keyword::Catch),
                RawToken::Exit => Token::Keyword(Keyword::Exit),
                RawToken::Leave => Token::Keyword(Keyword::Leave),
                RawToken::Redo => Token::Keyword(Keyword::Redo),
                RawToken::Raise => Token::Keyword(Keyword::Raise),
                RawToken::Nil => Token::Keyword(Keyword::Nil),
                RawToken::True => Token::Keyword(Keyword::True),
                RawToken::False => Token::Keyword(Keyword::False),
                RawToken::Name(name) => Token::Name(name),
                RawToken::Number(number) => Token::Number(number),
                RawToken::Text(text) => Token::Text(text),
            };

            Ok(WithInfo::new(span, token))
        })
        .collect()
}
