// Token sequence store - ordered tokens plus an insertion cursor
//
// Cursor invariant: 0 <= cursor <= tokens.len() after every operation.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::token::{NewToken, Token, TokenId, TokenPatch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSequence")]
pub struct TokenSequence {
    tokens: Vec<Token>,
    cursor: usize,
    next_id: u64,
}

/// Unchecked wire form; loading goes through [`TokenSequence::try_from`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSequence {
    tokens: Vec<Token>,
    #[serde(default)]
    cursor: usize,
    #[serde(default)]
    next_id: u64,
}

impl TryFrom<RawSequence> for TokenSequence {
    type Error = String;

    /// Duplicate ids are refused. The cursor is clamped to the token count
    /// and the id counter raised past every id already in use.
    fn try_from(raw: RawSequence) -> Result<Self, Self::Error> {
        let mut seen = HashSet::with_capacity(raw.tokens.len());
        for token in &raw.tokens {
            if !seen.insert(token.id) {
                return Err(format!("duplicate token id {}", token.id));
            }
        }

        let max_id = raw.tokens.iter().map(|t| t.id.raw()).max().unwrap_or(0);
        let cursor = raw.cursor.min(raw.tokens.len());
        let next_id = raw.next_id.max(max_id + 1);
        if cursor != raw.cursor || next_id != raw.next_id {
            debug!("loaded sequence adjusted: cursor {} -> {}, next id {} -> {}", raw.cursor, cursor, raw.next_id, next_id);
        }

        Ok(Self { tokens: raw.tokens, cursor, next_id })
    }
}

impl Default for TokenSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSequence {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            cursor: 0,
            next_id: 1,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    /// The token immediately left of the cursor (the one Backspace removes).
    pub fn token_before_cursor(&self) -> Option<&Token> {
        self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// Insert at the cursor and advance it. Never fails; content is not validated.
    pub fn insert(&mut self, token: NewToken) -> TokenId {
        let id = TokenId::new(self.next_id);
        self.next_id += 1;

        debug!("insert {} {:?} {:?} at {}", id, token.kind, token.raw_value, self.cursor);
        self.tokens.insert(self.cursor, token.into_token(id));
        self.cursor += 1;
        id
    }

    /// Remove the token with `id`. The cursor steps back by one whichever
    /// token was removed. Unknown ids are ignored.
    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        let index = self.tokens.iter().position(|t| t.id == id)?;
        let removed = self.tokens.remove(index);
        self.cursor = self.cursor.saturating_sub(1);
        debug!("remove {} (cursor now {})", id, self.cursor);
        Some(removed)
    }

    /// Merge `patch` into the token with `id`. Returns false if no such token.
    pub fn update(&mut self, id: TokenId, patch: TokenPatch) -> bool {
        match self.tokens.iter_mut().find(|t| t.id == id) {
            Some(token) => {
                debug!("update {} {:?}", id, patch);
                patch.apply(token);
                true
            }
            None => false,
        }
    }

    pub fn move_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.tokens.len());
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.move_cursor(self.cursor + 1);
    }

    /// Drop every token. Identities keep counting so old ids stay dead.
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.cursor = 0;
    }
}
