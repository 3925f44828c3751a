//! Instruction classifier: turns one line of text into either a structured
//! [`Instruction`] or a passthrough marker.
//!
//! Only the commands the pipeline acts on are parsed. Everything else (other
//! G/M codes, sub-coded commands such as `G29.1`, comments, blank lines) is
//! passthrough and is never tokenized, so free-form parameters like
//! `M117 Printing...` cannot trip the strict word parser.

use super::block::{Word, WordValue};
use super::GcodeError;

/// The commands the pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `G0`: rapid positioning.
    Rapid,
    /// `G1`: linear move.
    Linear,
    /// `G2`: clockwise arc.
    ArcCw,
    /// `G3`: counter-clockwise arc.
    ArcCcw,
    /// `G28`: home axes.
    Home,
    /// `G90`: absolute X/Y/Z positioning.
    AbsolutePositioning,
    /// `G91`: relative X/Y/Z positioning.
    RelativePositioning,
    /// `G92`: set logical position.
    SetPosition,
    /// `M82`: absolute extrusion.
    AbsoluteExtrusion,
    /// `M83`: relative extrusion.
    RelativeExtrusion,
}

impl Command {
    fn from_code(letter: char, number: u32) -> Option<Self> {
        let cmd = match (letter, number) {
            ('G', 0) => Self::Rapid,
            ('G', 1) => Self::Linear,
            ('G', 2) => Self::ArcCw,
            ('G', 3) => Self::ArcCcw,
            ('G', 28) => Self::Home,
            ('G', 90) => Self::AbsolutePositioning,
            ('G', 91) => Self::RelativePositioning,
            ('G', 92) => Self::SetPosition,
            ('M', 82) => Self::AbsoluteExtrusion,
            ('M', 83) => Self::RelativeExtrusion,
            _ => return None,
        };
        Some(cmd)
    }

    /// `true` for G0/G1/G2/G3.
    pub fn is_motion(self) -> bool {
        matches!(self, Self::Rapid | Self::Linear | Self::ArcCw | Self::ArcCcw)
    }

    /// `true` for G2/G3.
    pub fn is_arc(self) -> bool {
        matches!(self, Self::ArcCw | Self::ArcCcw)
    }

    /// Bare letters (`G28 X Y`) are only meaningful for homing.
    fn accepts_flags(self) -> bool {
        matches!(self, Self::Home)
    }
}

/// A parsed instruction line.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub command: Command,
    /// The command token as written (`G1`, `G01`, `g1`).
    pub code: String,
    /// Leading `N` line-number word as written, if any.
    pub line_number: Option<String>,
    /// Parameter words in source order, letters upper-cased.
    pub words: Vec<Word>,
    /// Trailing comment including its leading `;`.
    pub comment: Option<String>,
}

impl Instruction {
    /// Numeric value of the first word with `letter`.
    pub fn get(&self, letter: char) -> Option<f64> {
        self.words
            .iter()
            .find(|w| w.letter == letter)
            .and_then(Word::as_number)
    }

    /// `true` when a word with `letter` is present (numeric or bare).
    pub fn has(&self, letter: char) -> bool {
        self.words.iter().any(|w| w.letter == letter)
    }
}

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Instruction(Instruction),
    Passthrough,
}

/// Splits `text` at the first `;` into `(code, comment)`.
pub fn split_comment(text: &str) -> (&str, Option<&str>) {
    match text.find(';') {
        Some(idx) => (&text[..idx], Some(&text[idx..])),
        None => (text, None),
    }
}

/// Classifies one line of G-code. `line` is the 1-based line number used in
/// error messages.
pub fn classify(line: usize, text: &str) -> Result<Line, GcodeError> {
    let (code, comment) = split_comment(text);
    let code = code.trim();
    if code.is_empty() {
        return Ok(Line::Passthrough);
    }

    let mut tokens = code;
    let mut line_number = None;
    let (first, rest) = split_token(tokens);
    if is_line_number(first) {
        line_number = Some(first.to_string());
        tokens = rest.trim_start();
    }

    let (cmd_token, params) = split_token(tokens);
    let Some(command) = parse_command(cmd_token) else {
        return Ok(Line::Passthrough);
    };

    let words = parse_words(line, params, command)?;

    Ok(Line::Instruction(Instruction {
        command,
        code: cmd_token.to_string(),
        line_number,
        words,
        comment: comment.map(|c| c.trim_end().to_string()),
    }))
}

/// Splits off the leading token: a letter plus everything up to the next
/// whitespace or letter.
fn split_token(s: &str) -> (&str, &str) {
    let mut chars = s.char_indices();
    if chars.next().is_none() {
        return ("", "");
    }
    for (i, ch) in chars {
        if ch.is_whitespace() || ch.is_ascii_alphabetic() {
            return (&s[..i], &s[i..]);
        }
    }
    (s, "")
}

fn is_line_number(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some('N' | 'n'))
        && !token[1..].is_empty()
        && token[1..].chars().all(|c| c.is_ascii_digit())
}

/// Maps a command token such as `G1` or `m83` to a [`Command`]. Sub-coded or
/// unknown commands return `None`.
fn parse_command(token: &str) -> Option<Command> {
    let mut chars = token.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let digits = chars.as_str();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number: u32 = digits.parse().ok()?;
    Command::from_code(letter, number)
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+')
}

/// Tokenizes the parameter part of a recognized instruction.
fn parse_words(line: usize, params: &str, command: Command) -> Result<Vec<Word>, GcodeError> {
    let mut words = Vec::new();
    let mut chars = params.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }
        if !ch.is_ascii_alphabetic() {
            return Err(GcodeError::UnexpectedCharacter { line, ch });
        }
        let letter = ch.to_ascii_uppercase();

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let mut raw = String::new();
        while let Some(&c) = chars.peek() {
            if !is_number_char(c) {
                break;
            }
            raw.push(c);
            chars.next();
        }

        if raw.is_empty() {
            if !command.accepts_flags() {
                return Err(GcodeError::MissingValue { line, letter });
            }
            words.push(Word::flag(letter));
            continue;
        }

        let value: f64 = raw.parse().map_err(|_| GcodeError::MalformedNumber {
            line,
            word: format!("{letter}{raw}"),
        })?;

        if let Some(&next) = chars.peek() {
            if !next.is_whitespace() && !next.is_ascii_alphabetic() {
                return Err(GcodeError::MalformedNumber {
                    line,
                    word: format!("{letter}{raw}{next}"),
                });
            }
        }

        words.push(Word {
            letter,
            value: WordValue::Number(value),
        });
    }

    Ok(words)
}
