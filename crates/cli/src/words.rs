//! Command-line spelling of formula tokens.
//!
//! | Word        | Token                                   |
//! |-------------|-----------------------------------------|
//! | `200`       | number, Value                           |
//! | `50%`       | number, Percentage                      |
//! | `5~`        | number, Growth                          |
//! | `@revenue`  | variable (also takes `%` / `~` suffix)  |
//! | `fn:SUM`    | function                                |
//! | `+ - * / ^ ( )` | operator                            |

use tagcalc_engine::{DisplayMode, NewToken, Operator, Token, TokenKind};

/// Parse one word into an insertion request.
pub fn parse_word(word: &str) -> Result<NewToken, String> {
    let word = word.trim();
    if word.is_empty() {
        return Err("empty token".to_string());
    }

    if let Some(op) = Operator::from_symbol(word) {
        return Ok(NewToken::operator(op));
    }

    if let Some(name) = word.strip_prefix("fn:") {
        if name.is_empty() {
            return Err("function token needs a name (fn:NAME)".to_string());
        }
        return Ok(NewToken::function(name));
    }

    let (body, mode) = split_mode(word);

    if let Some(name) = body.strip_prefix('@') {
        if name.is_empty() {
            return Err("variable token needs a name (@name)".to_string());
        }
        return Ok(NewToken::variable(name).with_mode(mode));
    }

    match body.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(NewToken::number(body).with_mode(mode)),
        _ => Err(format!("unrecognized token: {}", word)),
    }
}

pub fn parse_words<S: AsRef<str>>(words: &[S]) -> Result<Vec<NewToken>, String> {
    words.iter().map(|w| parse_word(w.as_ref())).collect()
}

fn split_mode(word: &str) -> (&str, DisplayMode) {
    if let Some(body) = word.strip_suffix('%') {
        (body, DisplayMode::Percentage)
    } else if let Some(body) = word.strip_suffix('~') {
        (body, DisplayMode::Growth)
    } else {
        (word, DisplayMode::Value)
    }
}

/// Render a stored token back in the same spelling.
pub fn render_token(token: &Token) -> String {
    let suffix = match token.mode() {
        DisplayMode::Value => "",
        DisplayMode::Percentage => "%",
        DisplayMode::Growth => "~",
    };
    match token.kind {
        TokenKind::Number => format!("{}{}", token.raw_value, suffix),
        TokenKind::Variable => format!("@{}{}", token.raw_value, suffix),
        TokenKind::Function => format!("fn:{}", token.raw_value),
        TokenKind::Operator => token.raw_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcalc_engine::TokenSequence;

    #[test]
    fn test_numbers_with_modes() {
        let t = parse_word("50%").unwrap();
        assert_eq!(t.kind, TokenKind::Number);
        assert_eq!(t.raw_value, "50");
        assert_eq!(t.display_mode, Some(DisplayMode::Percentage));

        assert_eq!(parse_word("5~").unwrap().display_mode, Some(DisplayMode::Growth));
        assert_eq!(parse_word("-2.5").unwrap().display_mode, Some(DisplayMode::Value));
    }

    #[test]
    fn test_minus_is_operator_not_number() {
        assert_eq!(parse_word("-").unwrap().kind, TokenKind::Operator);
    }

    #[test]
    fn test_variables_and_functions() {
        let v = parse_word("@revenue%").unwrap();
        assert_eq!(v.kind, TokenKind::Variable);
        assert_eq!(v.raw_value, "revenue");
        assert_eq!(v.display_mode, Some(DisplayMode::Percentage));

        let f = parse_word("fn:SUM").unwrap();
        assert_eq!(f.kind, TokenKind::Function);
        assert_eq!(f.raw_value, "SUM");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_word("abc").is_err());
        assert!(parse_word("@").is_err());
        assert!(parse_word("fn:").is_err());
        assert!(parse_word("%").is_err());
        assert!(parse_word("inf").is_err());
    }

    #[test]
    fn test_render_matches_spelling() {
        let words = ["50%", "@cost~", "*", "fn:AVG", "3"];
        let mut seq = TokenSequence::new();
        for t in parse_words(&words).unwrap() {
            seq.insert(t);
        }
        let rendered: Vec<String> = seq.tokens().iter().map(render_token).collect();
        assert_eq!(rendered, words);
    }
}
