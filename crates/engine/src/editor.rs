// Formula editor - keyboard-driven state machine around a token sequence
//
// Holds the pending text input and the autocomplete dropdown state.
// Rendering and fetching suggestions are the host's job: the host reads
// `query()` to fetch and feeds results back through `set_suggestions()`.

use log::debug;

use crate::eval::evaluate_display;
use crate::sequence::TokenSequence;
use crate::suggestion::Suggestion;
use crate::token::{DisplayMode, NewToken, Operator, TokenId};

/// Longest pending input accepted before keystrokes are dropped.
pub const DEFAULT_MAX_INPUT_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct EditorOptions {
    pub max_input_len: usize,
    /// Mode given to numbers committed with Enter/Space outside the dropdown
    pub default_number_mode: DisplayMode,
    /// Refuse operators the evaluator cannot evaluate (`^`, `(`, `)`)
    pub strict_operators: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            max_input_len: DEFAULT_MAX_INPUT_LEN,
            default_number_mode: DisplayMode::Percentage,
            strict_operators: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Tab,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    Inserted(TokenId),
    Removed(TokenId),
    CursorMoved(usize),
    InputChanged,
    SelectionChanged(usize),
    DropdownClosed,
    /// The key was understood but refused (input too long, unsupported operator)
    Rejected,
    Ignored,
}

#[derive(Debug, Clone)]
pub struct FormulaEditor {
    sequence: TokenSequence,
    input: String,
    suggestions: Vec<Suggestion>,
    selected: usize,
    dropdown_open: bool,
    options: EditorOptions,
}

impl Default for FormulaEditor {
    fn default() -> Self {
        Self::new(EditorOptions::default())
    }
}

fn is_numeric(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false)
}

impl FormulaEditor {
    pub fn new(options: EditorOptions) -> Self {
        Self::with_sequence(TokenSequence::new(), options)
    }

    pub fn with_sequence(sequence: TokenSequence, options: EditorOptions) -> Self {
        Self {
            sequence,
            input: String::new(),
            suggestions: Vec::new(),
            selected: 0,
            dropdown_open: false,
            options,
        }
    }

    pub fn sequence(&self) -> &TokenSequence {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut TokenSequence {
        &mut self.sequence
    }

    pub fn into_sequence(self) -> TokenSequence {
        self.sequence
    }

    /// Pending text; doubles as the autocomplete query.
    pub fn query(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_dropdown_open(&self) -> bool {
        self.dropdown_open
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Whether the pending input is a number, in which case the dropdown
    /// offers display modes instead of suggestions.
    pub fn input_is_numeric(&self) -> bool {
        is_numeric(&self.input)
    }

    /// Number of entries the dropdown currently cycles through.
    pub fn choice_count(&self) -> usize {
        if self.input_is_numeric() {
            DisplayMode::ALL.len()
        } else {
            self.suggestions.len()
        }
    }

    pub fn set_suggestions(&mut self, suggestions: Vec<Suggestion>) {
        self.suggestions = suggestions;
        self.selected = 0;
    }

    /// Formatted evaluation of the current tokens.
    pub fn result(&self) -> String {
        evaluate_display(self.sequence.tokens())
    }

    /// Replace the pending input wholesale (paste, IME commit). Inputs over
    /// the length limit are refused and the old input kept.
    pub fn set_input(&mut self, text: &str) -> EditEvent {
        if text.chars().count() > self.options.max_input_len {
            return EditEvent::Rejected;
        }
        self.input = text.to_string();
        self.dropdown_open = true;
        self.selected = 0;
        EditEvent::InputChanged
    }

    /// Paste truncates rather than refusing.
    pub fn paste(&mut self, text: &str) -> EditEvent {
        let truncated: String = text.chars().take(self.options.max_input_len).collect();
        self.set_input(&truncated)
    }

    /// Position the cursor from a click and reopen the dropdown.
    pub fn click_at(&mut self, position: usize) -> EditEvent {
        self.sequence.move_cursor(position);
        self.dropdown_open = true;
        EditEvent::CursorMoved(self.sequence.cursor())
    }

    pub fn select_suggestion(&mut self, suggestion: &Suggestion) -> EditEvent {
        let id = self.sequence.insert(suggestion.to_new_token());
        self.input.clear();
        self.dropdown_open = false;
        EditEvent::Inserted(id)
    }

    pub fn handle_key(&mut self, key: Key) -> EditEvent {
        if self.dropdown_open && self.choice_count() > 0 {
            if let Some(event) = self.handle_dropdown_key(key) {
                return event;
            }
        }

        match key {
            Key::Enter | Key::Char(' ') if self.input_is_numeric() => {
                let raw = self.input.trim().to_string();
                let id = self.sequence.insert(NewToken::number(raw).with_mode(self.options.default_number_mode));
                self.input.clear();
                self.dropdown_open = true;
                EditEvent::Inserted(id)
            }
            Key::Backspace if self.input.is_empty() => {
                let Some(id) = self.sequence.token_before_cursor().map(|t| t.id) else {
                    return EditEvent::Ignored;
                };
                self.sequence.remove(id);
                self.dropdown_open = true;
                EditEvent::Removed(id)
            }
            Key::Backspace => {
                self.input.pop();
                EditEvent::InputChanged
            }
            Key::Left if self.input.is_empty() => {
                self.sequence.move_left();
                EditEvent::CursorMoved(self.sequence.cursor())
            }
            Key::Right if self.input.is_empty() => {
                self.sequence.move_right();
                EditEvent::CursorMoved(self.sequence.cursor())
            }
            Key::Char(c) => match Operator::from_char(c) {
                Some(op) => self.insert_operator(op),
                None => self.type_char(c),
            },
            _ => EditEvent::Ignored,
        }
    }

    fn handle_dropdown_key(&mut self, key: Key) -> Option<EditEvent> {
        let count = self.choice_count();
        let event = match key {
            Key::Down => {
                self.selected = if self.selected + 1 < count { self.selected + 1 } else { 0 };
                EditEvent::SelectionChanged(self.selected)
            }
            Key::Up => {
                self.selected = if self.selected > 0 { self.selected - 1 } else { count - 1 };
                EditEvent::SelectionChanged(self.selected)
            }
            Key::Enter => {
                let event = if self.input_is_numeric() {
                    let mode = DisplayMode::ALL.get(self.selected).copied().unwrap_or_default();
                    let raw = self.input.trim().to_string();
                    EditEvent::Inserted(self.sequence.insert(NewToken::number(raw).with_mode(mode)))
                } else {
                    match self.suggestions.get(self.selected) {
                        Some(s) => EditEvent::Inserted(self.sequence.insert(s.to_new_token())),
                        None => EditEvent::Ignored,
                    }
                };
                self.input.clear();
                self.dropdown_open = false;
                event
            }
            Key::Escape => {
                self.dropdown_open = false;
                EditEvent::DropdownClosed
            }
            Key::Tab => {
                let first = self.suggestions.first().cloned()?;
                self.select_suggestion(&first)
            }
            _ => return None,
        };
        debug!("dropdown key {:?} -> {:?}", key, event);
        Some(event)
    }

    fn insert_operator(&mut self, op: Operator) -> EditEvent {
        if self.options.strict_operators && !op.is_evaluable() {
            debug!("refusing operator {}", op.symbol());
            return EditEvent::Rejected;
        }
        let id = self.sequence.insert(NewToken::operator(op));
        self.input.clear();
        self.dropdown_open = true;
        EditEvent::Inserted(id)
    }

    fn type_char(&mut self, c: char) -> EditEvent {
        if self.input.chars().count() >= self.options.max_input_len {
            return EditEvent::Rejected;
        }
        self.input.push(c);
        self.dropdown_open = true;
        self.selected = 0;
        EditEvent::InputChanged
    }
}
