// Tag-based formula model: tokens, the cursor-aware sequence that holds
// them, the two-pass evaluator, and the keyboard-driven editor on top.

pub mod editor;
pub mod eval;
pub mod sequence;
pub mod suggestion;
pub mod token;

pub use editor::{EditEvent, EditorOptions, FormulaEditor, Key};
pub use eval::{evaluate, evaluate_display, format_result, EvalError};
pub use sequence::TokenSequence;
pub use suggestion::{Suggestion, SuggestionCategory};
pub use token::{DisplayMode, NewToken, Operator, Token, TokenId, TokenKind, TokenPatch};
