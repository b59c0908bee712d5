// Token model - the typed tags a formula is composed of

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a token within one sequence. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(u64);

impl TokenId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Number,
    Variable,
    Operator,
    Function,
}

impl TokenKind {
    /// Number and variable tokens are the ones that carry a numeric operand.
    pub fn is_operand(self) -> bool {
        matches!(self, TokenKind::Number | TokenKind::Variable)
    }
}

/// How a number or variable is presented and, for `Percentage`, folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    #[default]
    Value,
    Percentage,
    Growth,
}

impl DisplayMode {
    /// Order used by the number-mode dropdown.
    pub const ALL: [DisplayMode; 3] = [DisplayMode::Value, DisplayMode::Percentage, DisplayMode::Growth];

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Value => "Value",
            DisplayMode::Percentage => "Percentage",
            DisplayMode::Growth => "Growth",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator symbols accepted at input time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    LParen,
    RParen,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Pow,
        Operator::LParen,
        Operator::RParen,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            '^' => Some(Operator::Pow),
            '(' => Some(Operator::LParen),
            ')' => Some(Operator::RParen),
            _ => None,
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "^",
            Operator::LParen => "(",
            Operator::RParen => ")",
        }
    }

    /// Whether the evaluator gives this operator arithmetic meaning.
    /// `^` and parentheses are accepted as tokens but never evaluated.
    pub fn is_evaluable(self) -> bool {
        matches!(self, Operator::Add | Operator::Sub | Operator::Mul | Operator::Div)
    }
}

/// A formula token as stored in a [`TokenSequence`](crate::sequence::TokenSequence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    pub kind: TokenKind,
    pub raw_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    /// Display-only cached value of a variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_variable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
}

impl Token {
    /// Display mode with the `Value` default applied.
    pub fn mode(&self) -> DisplayMode {
        self.display_mode.unwrap_or_default()
    }

    pub fn operator(&self) -> Option<Operator> {
        match self.kind {
            TokenKind::Operator => Operator::from_symbol(&self.raw_value),
            _ => None,
        }
    }
}

/// An insertion request: a token without its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToken {
    pub kind: TokenKind,
    pub raw_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_variable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
}

impl NewToken {
    pub fn new(kind: TokenKind, raw_value: impl Into<String>) -> Self {
        Self {
            kind,
            raw_value: raw_value.into(),
            display_mode: None,
            resolved_variable_value: None,
            inputs: None,
        }
    }

    pub fn number(raw_value: impl Into<String>) -> Self {
        Self::new(TokenKind::Number, raw_value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(TokenKind::Variable, name)
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(TokenKind::Function, name)
    }

    pub fn operator(op: Operator) -> Self {
        Self::new(TokenKind::Operator, op.symbol())
    }

    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.display_mode = Some(mode);
        self
    }

    pub fn with_resolved_value(mut self, value: impl Into<String>) -> Self {
        self.resolved_variable_value = Some(value.into());
        self
    }

    pub fn with_inputs(mut self, inputs: impl Into<String>) -> Self {
        self.inputs = Some(inputs.into());
        self
    }

    pub(crate) fn into_token(self, id: TokenId) -> Token {
        Token {
            id,
            kind: self.kind,
            raw_value: self.raw_value,
            display_mode: self.display_mode,
            resolved_variable_value: self.resolved_variable_value,
            inputs: self.inputs,
        }
    }
}

/// Partial update for an existing token. Identity and kind are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_mode: Option<DisplayMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_variable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
}

impl TokenPatch {
    pub fn display_mode(mode: DisplayMode) -> Self {
        Self { display_mode: Some(mode), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_value.is_none()
            && self.display_mode.is_none()
            && self.resolved_variable_value.is_none()
            && self.inputs.is_none()
    }

    pub(crate) fn apply(self, token: &mut Token) {
        if let Some(raw) = self.raw_value {
            token.raw_value = raw;
        }
        if let Some(mode) = self.display_mode {
            token.display_mode = Some(mode);
        }
        if let Some(value) = self.resolved_variable_value {
            token.resolved_variable_value = Some(value);
        }
        if let Some(inputs) = self.inputs {
            token.inputs = Some(inputs);
        }
    }
}
