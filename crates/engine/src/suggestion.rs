// Autocomplete suggestions as the editor sees them

use serde::{Deserialize, Serialize};

use crate::token::{DisplayMode, NewToken, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Function,
    Folder,
    #[default]
    Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub category: SuggestionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<String>,
}

impl Suggestion {
    pub fn variable(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: None,
            category: SuggestionCategory::Variable,
            inputs: None,
        }
    }

    /// Token inserted when this suggestion is picked. Functions become
    /// function tokens; folders and variables become variable tokens.
    pub fn to_new_token(&self) -> NewToken {
        let kind = match self.category {
            SuggestionCategory::Function => TokenKind::Function,
            SuggestionCategory::Folder | SuggestionCategory::Variable => TokenKind::Variable,
        };
        let mut token = NewToken::new(kind, self.name.clone()).with_mode(DisplayMode::Value);
        if kind == TokenKind::Variable {
            token.resolved_variable_value = self.value.clone();
            token.inputs = self.inputs.clone();
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_suggestion_inserts_function() {
        let s = Suggestion {
            category: SuggestionCategory::Function,
            ..Suggestion::variable("1", "SUM")
        };
        let token = s.to_new_token();
        assert_eq!(token.kind, TokenKind::Function);
        assert_eq!(token.raw_value, "SUM");
        assert_eq!(token.display_mode, Some(DisplayMode::Value));
    }

    #[test]
    fn test_folder_suggestion_inserts_variable() {
        let s = Suggestion {
            category: SuggestionCategory::Folder,
            value: Some("12".into()),
            ..Suggestion::variable("2", "costs")
        };
        let token = s.to_new_token();
        assert_eq!(token.kind, TokenKind::Variable);
        assert_eq!(token.resolved_variable_value.as_deref(), Some("12"));
    }
}
