//! `tagcalc repl` — line-driven formula editing session.
//!
//! Plain text on a line is typed into the editor one key at a time.
//! Lines starting with `:` send special keys or commands.

use std::io::{BufRead, Write};
use std::time::Duration;

use log::{debug, info};
use tagcalc_engine::{DisplayMode, EditEvent, FormulaEditor, Key, Suggestion, TokenPatch};
use tagcalc_suggest::{SuggestError, SuggestionFetcher, SuggestionSource};

use crate::words::render_token;

pub const HELP: &str = "\
type text to enter it; a space or :enter commits a number
keys:     :enter :back :left :right :up :down :tab :esc
commands: :mode Value|Percentage|Growth   set mode of token left of cursor
          :clear   :json   :help   :quit";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Keys(Vec<Key>),
    Mode(DisplayMode),
    Clear,
    Json,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<Command, String> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Keys(line.chars().map(Key::Char).collect()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let key = match name {
        "enter" => Key::Enter,
        "back" => Key::Backspace,
        "left" => Key::Left,
        "right" => Key::Right,
        "up" => Key::Up,
        "down" => Key::Down,
        "tab" => Key::Tab,
        "esc" => Key::Escape,
        "clear" => return Ok(Command::Clear),
        "json" => return Ok(Command::Json),
        "help" | "h" => return Ok(Command::Help),
        "quit" | "q" => return Ok(Command::Quit),
        "mode" => {
            let arg = parts.next().unwrap_or("");
            return DisplayMode::ALL
                .into_iter()
                .find(|m| m.label().eq_ignore_ascii_case(arg))
                .map(Command::Mode)
                .ok_or_else(|| format!("unknown mode: {:?}", arg));
        }
        other => return Err(format!("unknown command: :{}", other)),
    };
    Ok(Command::Keys(vec![key]))
}

pub struct Repl<S> {
    editor: FormulaEditor,
    fetcher: Option<SuggestionFetcher<S>>,
    fetch_timeout: Duration,
}

impl<S: SuggestionSource + Send + Sync + 'static> Repl<S> {
    pub fn new(editor: FormulaEditor, fetcher: Option<SuggestionFetcher<S>>, fetch_timeout: Duration) -> Self {
        Self { editor, fetcher, fetch_timeout }
    }

    pub fn editor(&self) -> &FormulaEditor {
        &self.editor
    }

    /// Run until `:quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", HELP)?;
        self.render(out)?;

        for line in input.lines() {
            let line = line?;
            match parse_line(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.apply(command, out)?,
                Err(e) => writeln!(out, "! {}", e)?,
            }
            self.render(out)?;
        }
        Ok(())
    }

    fn apply<W: Write>(&mut self, command: Command, out: &mut W) -> std::io::Result<()> {
        self.collect_arrived(out)?;
        match command {
            Command::Keys(keys) => {
                for key in keys {
                    let before = self.editor.query().to_string();
                    let event = self.editor.handle_key(key);
                    debug!("{:?} -> {:?}", key, event);
                    if event == EditEvent::Rejected {
                        writeln!(out, "! {:?} refused", key)?;
                    }
                    if self.editor.query() != before {
                        self.refresh_suggestions(out)?;
                    }
                }
            }
            Command::Mode(mode) => {
                match self.editor.sequence().token_before_cursor().map(|t| t.id) {
                    Some(id) => {
                        self.editor.sequence_mut().update(id, TokenPatch::display_mode(mode));
                    }
                    None => writeln!(out, "! no token left of cursor")?,
                }
            }
            Command::Clear => self.editor.sequence_mut().clear(),
            Command::Json => {
                let json = serde_json::to_string_pretty(self.editor.sequence())
                    .map_err(std::io::Error::other)?;
                writeln!(out, "{}", json)?;
            }
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => {}
        }
        Ok(())
    }

    fn refresh_suggestions<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let Some(fetcher) = self.fetcher.as_mut() else {
            return Ok(());
        };
        let query = self.editor.query().to_string();

        let result = match fetcher.request(&query) {
            Some(list) => Ok(list),
            None => match fetcher.wait(self.fetch_timeout) {
                Some(result) => result,
                None => {
                    info!("suggestions for {:?} still pending after {:?}", query, self.fetch_timeout);
                    // Nothing to offer until the latest query answers
                    self.editor.set_suggestions(Vec::new());
                    return Ok(());
                }
            },
        };
        self.show_suggestions(result, out)
    }

    /// Pick up a late answer to the latest query, if one has arrived.
    fn collect_arrived<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        let Some(result) = self.fetcher.as_mut().and_then(|f| f.poll()) else {
            return Ok(());
        };
        debug!("late suggestions for {:?}", self.editor.query());
        self.show_suggestions(result, out)
    }

    fn show_suggestions<W: Write>(
        &mut self,
        result: Result<Vec<Suggestion>, SuggestError>,
        out: &mut W,
    ) -> std::io::Result<()> {
        match result {
            Ok(list) => self.editor.set_suggestions(list),
            Err(e) => {
                writeln!(out, "! suggestions unavailable: {}", e)?;
                self.editor.set_suggestions(Vec::new());
            }
        }
        Ok(())
    }

    fn render<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let seq = self.editor.sequence();
        let mut parts: Vec<String> = seq.tokens().iter().map(render_token).collect();
        let caret = if self.editor.query().is_empty() {
            "|".to_string()
        } else {
            format!("[{}|]", self.editor.query())
        };
        parts.insert(seq.cursor(), caret);
        writeln!(out, "= {}", parts.join(" "))?;

        if self.editor.is_dropdown_open() {
            let choices: Vec<String> = if self.editor.input_is_numeric() {
                DisplayMode::ALL.iter().map(|m| m.label().to_string()).collect()
            } else {
                self.editor.suggestions().iter().map(|s| s.name.clone()).collect()
            };
            for (i, choice) in choices.iter().enumerate() {
                let marker = if i == self.editor.selected() { '>' } else { ' ' };
                writeln!(out, "  {} {}", marker, choice)?;
            }
        }

        writeln!(out, "  -> {}", self.editor.result())
    }
}
