//! PDF lexer (tokenizer).
//!
//! Low-level tokenization of PDF byte streams with nom. Recognizes numbers,
//! literal and hex strings, names, delimiters and bare keywords.
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped
//! before every token.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, recognize, value},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

/// Token types recognized by the PDF lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),
    /// Real number (e.g., 3.14, -.5, 4.)
    Real(f64),
    /// Raw literal string contents, escapes not yet decoded
    LiteralString(&'a [u8]),
    /// Raw hex string contents, whitespace included
    HexString(&'a [u8]),
    /// Name with `#XX` escapes decoded
    Name(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `<<`
    DictStart,
    /// `>>`
    DictEnd,
    /// `obj`
    ObjStart,
    /// `endobj`
    ObjEnd,
    /// `stream`
    StreamStart,
    /// `endstream`
    StreamEnd,
    /// `R`
    R,
    /// Any other bare word (`xref`, `trailer`, `startxref`, content operators)
    Keyword(&'a [u8]),
}

/// PDF whitespace characters.
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters.
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments. Never fails.
pub fn skip_ws(mut input: &[u8]) -> &[u8] {
    loop {
        let start = input
            .iter()
            .position(|&c| !is_whitespace(c))
            .unwrap_or(input.len());
        input = &input[start..];
        match comment(input) {
            Ok((rest, _)) => input = rest,
            Err(_) => return input,
        }
    }
}

fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)?;

    // Numbers must end at a delimiter or whitespace ("12abc" is not a number).
    if rest.first().is_some_and(|&c| is_regular(c) && c != b'.') {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    }

    let err = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit));
    let s = std::str::from_utf8(text).map_err(|_| err())?;
    if s.contains('.') {
        let normalized = s.replace("-.", "-0.").replace("+.", "0.");
        let normalized = if normalized.starts_with('.') {
            format!("0{}", normalized)
        } else {
            normalized
        };
        let v: f64 = normalized.trim_end_matches('.').parse().map_err(|_| err())?;
        Ok((rest, Token::Real(v)))
    } else {
        match s.trim_start_matches('+').parse::<i64>() {
            Ok(v) => Ok((rest, Token::Integer(v))),
            // Overlong integers degrade to reals rather than failing the file.
            Err(_) => s
                .parse::<f64>()
                .map(|v| (rest, Token::Real(v)))
                .map_err(|_| err()),
        }
    }
}

/// Literal string with balanced parentheses; escapes are skipped over, not
/// decoded.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0;

    while pos < body.len() {
        match body[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[pos + 1..], Token::LiteralString(&body[..pos])));
                }
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)))
}

fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }
    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode `#XX` escapes in a raw name.
///
/// Each resulting byte maps to the char with the same code point, so names
/// with non-ASCII bytes survive a parse/serialize cycle unchanged. Malformed
/// escapes are kept literally.
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                result.push(byte as char);
                i += 3;
                continue;
            }
        }
        result.push(raw[i] as char);
        i += 1;
    }
    result
}

fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(take_while(is_regular), |raw: &[u8]| Token::Name(decode_name_escapes(raw))),
    )(input)
}

fn parse_delimiter(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
    ))(input)
}

fn parse_word(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    map(take_while1(is_regular), |word: &[u8]| match word {
        b"true" => Token::True,
        b"false" => Token::False,
        b"null" => Token::Null,
        b"obj" => Token::ObjStart,
        b"endobj" => Token::ObjEnd,
        b"stream" => Token::StreamStart,
        b"endstream" => Token::StreamEnd,
        b"R" => Token::R,
        other => Token::Keyword(other),
    })(input)
}

/// Parse a single PDF token after skipping whitespace and comments.
///
/// Order matters: `<<` before `<`, numbers before bare words.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let input = skip_ws(input);
    alt((
        parse_delimiter,
        parse_name,
        parse_number,
        parse_literal_string,
        parse_hex_string,
        parse_word,
    ))(input)
}
