use crate::error::{ExpressionError, ExpressionErrorKind as Kind};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Or,
    And,
    EqEq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
    Not,
    Number(f64),
    Str(String),
    True,
    False,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Tokenize the restricted boolean/comparison grammar (spec §4.1). Rejects
/// on sight anything outside `Or/And/Eq/Cmp/Unary/Primary/Literal` —
/// function-call syntax, object/array literals, assignment, bitwise
/// operators, and member access never produce a token; they produce an
/// error at the offending byte.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ExpressionError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Spanned { token: Token::LParen, offset: i });
                i += 1;
            }
            ')' => {
                tokens.push(Spanned { token: Token::RParen, offset: i });
                i += 1;
            }
            '|' => {
                if bytes.get(i + 1) == Some(&b'|') {
                    tokens.push(Spanned { token: Token::Or, offset: i });
                    i += 2;
                } else {
                    return Err(ExpressionError::new(
                        Kind::Forbidden("bitwise '|' operator".into()),
                        i,
                    ));
                }
            }
            '&' => {
                if bytes.get(i + 1) == Some(&b'&') {
                    tokens.push(Spanned { token: Token::And, offset: i });
                    i += 2;
                } else {
                    return Err(ExpressionError::new(
                        Kind::Forbidden("bitwise '&' operator".into()),
                        i,
                    ));
                }
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::EqEq, offset: i });
                    i += 2;
                } else {
                    return Err(ExpressionError::new(Kind::Forbidden("assignment '='".into()), i));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::NotEq, offset: i });
                    i += 2;
                } else {
                    tokens.push(Spanned { token: Token::Not, offset: i });
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    return Err(ExpressionError::new(
                        Kind::Forbidden("bitwise '>>' operator".into()),
                        i,
                    ));
                } else if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::Ge, offset: i });
                    i += 2;
                } else {
                    tokens.push(Spanned { token: Token::Gt, offset: i });
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'<') {
                    return Err(ExpressionError::new(
                        Kind::Forbidden("bitwise '<<' operator".into()),
                        i,
                    ));
                } else if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Spanned { token: Token::Le, offset: i });
                    i += 2;
                } else {
                    tokens.push(Spanned { token: Token::Lt, offset: i });
                    i += 1;
                }
            }
            '^' => {
                return Err(ExpressionError::new(Kind::Forbidden("bitwise '^' operator".into()), i));
            }
            '{' | '[' => {
                return Err(ExpressionError::new(
                    Kind::Forbidden("object/array literal".into()),
                    i,
                ));
            }
            '+' => {
                if bytes.get(i + 1) == Some(&b'+') {
                    return Err(ExpressionError::new(Kind::Forbidden("increment '++'".into()), i));
                }
                return Err(ExpressionError::new(Kind::Forbidden("arithmetic '+'".into()), i));
            }
            '"' => {
                let (s, end) = scan_string(input, i)?;
                tokens.push(Spanned { token: Token::Str(s), offset: i });
                i = end;
            }
            '0'..='9' => {
                let (n, end) = scan_number(input, i);
                tokens.push(Spanned { token: Token::Number(n), offset: i });
                i = end;
            }
            '-' if matches!(bytes.get(i + 1), Some(b'0'..=b'9')) => {
                let (n, end) = scan_number(input, i);
                tokens.push(Spanned { token: Token::Number(n), offset: i });
                i = end;
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let (word, end) = scan_ident(input, i);
                let token = match word.as_str() {
                    "true" => Token::True,
                    "false" => Token::False,
                    "null" => Token::Null,
                    other => {
                        return Err(ExpressionError::new(
                            Kind::Forbidden(format!("identifier '{other}' (bare variables are not permitted; use ${{...}} interpolation)")),
                            i,
                        ));
                    }
                };
                tokens.push(Spanned { token, offset: i });
                i = end;
            }
            '.' => {
                return Err(ExpressionError::new(
                    Kind::Forbidden("member access on a literal".into()),
                    i,
                ));
            }
            other => {
                return Err(ExpressionError::new(Kind::UnexpectedChar(other), i));
            }
        }
    }

    Ok(tokens)
}

fn scan_string(input: &str, start: usize) -> Result<(String, usize), ExpressionError> {
    let bytes = input.as_bytes();
    let mut i = start + 1;
    let mut out = String::new();
    loop {
        match bytes.get(i) {
            None => return Err(ExpressionError::new(Kind::UnterminatedString, start)),
            Some(b'"') => {
                i += 1;
                break;
            }
            Some(b'\\') => {
                match bytes.get(i + 1) {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    Some(&c) => out.push(c as char),
                    None => return Err(ExpressionError::new(Kind::UnterminatedString, start)),
                }
                i += 2;
            }
            Some(&c) => {
                out.push(c as char);
                i += 1;
            }
        }
    }
    Ok((out, i))
}

fn scan_number(input: &str, start: usize) -> (f64, usize) {
    let bytes = input.as_bytes();
    let mut i = start;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    while matches!(bytes.get(i), Some(b'0'..=b'9')) {
        i += 1;
    }
    if bytes.get(i) == Some(&b'.') && matches!(bytes.get(i + 1), Some(b'0'..=b'9')) {
        i += 1;
        while matches!(bytes.get(i), Some(b'0'..=b'9')) {
            i += 1;
        }
    }
    let text = &input[start..i];
    (text.parse().unwrap_or(0.0), i)
}

fn scan_ident(input: &str, start: usize) -> (String, usize) {
    let bytes = input.as_bytes();
    let mut i = start;
    while matches!(bytes.get(i), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
        i += 1;
    }
    (input[start..i].to_string(), i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokenizes_comparison() {
        let tokens = tokenize("1 == 2").unwrap();
        assert_eq!(
            tokens.iter().map(|s| s.token.clone()).collect::<Vec<_>>(),
            vec![Token::Number(1.0), Token::EqEq, Token::Number(2.0)]
        );
    }

    #[test]
    fn rejects_function_call_identifier() {
        let err = tokenize("foo(1)").unwrap_err();
        assert!(matches!(err.kind, ExpressionErrorKind::Forbidden(_)));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn rejects_object_literal() {
        let err = tokenize("{a: 1}").unwrap_err();
        assert!(matches!(err.kind, ExpressionErrorKind::Forbidden(_)));
    }

    #[test]
    fn rejects_bitwise_and_shift() {
        assert!(tokenize("1 & 2").is_err());
        assert!(tokenize("1 << 2").is_err());
        assert!(tokenize("1 ^ 2").is_err());
    }

    #[test]
    fn rejects_assignment() {
        assert!(tokenize("a = 1").is_err());
    }

    #[test]
    fn rejects_member_access_dot() {
        let err = tokenize("true.toString").unwrap_err();
        assert!(matches!(err.kind, ExpressionErrorKind::Forbidden(_)));
    }

    #[test]
    fn tokenizes_negative_number_literal() {
        let tokens = tokenize("-5 > -10").unwrap();
        assert_eq!(tokens[0].token, Token::Number(-5.0));
        assert_eq!(tokens[2].token, Token::Number(-10.0));
    }

    #[test]
    fn tokenizes_string_with_escapes() {
        let tokens = tokenize(r#""a\"b" == "a\"b""#).unwrap();
        assert_eq!(tokens[0].token, Token::Str("a\"b".to_string()));
    }
}
