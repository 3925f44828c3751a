use super::formatter::{format_word_value, Precision};

/// The value carried by a single G-code word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WordValue {
    Number(f64),
    /// A bare letter with no value, as in `G28 X Y`.
    Flag,
}

/// A single G-code word: a letter paired with a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Word {
    pub letter: char,
    pub value: WordValue,
}

impl Word {
    pub fn number(letter: char, value: f64) -> Self {
        Word {
            letter,
            value: WordValue::Number(value),
        }
    }

    pub fn flag(letter: char) -> Self {
        Word {
            letter,
            value: WordValue::Flag,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            WordValue::Number(v) => Some(v),
            WordValue::Flag => None,
        }
    }
}

/// Rank used to place inserted words: X Y Z E first, everything else after.
fn axis_rank(letter: char) -> u8 {
    match letter {
        'X' => 0,
        'Y' => 1,
        'Z' => 2,
        'E' => 3,
        _ => 4,
    }
}

/// One rewritten line of G-code: optional line number, the command as
/// written, its words in source order, and an optional trailing comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    line_number: Option<String>,
    code: String,
    words: Vec<Word>,
    comment: Option<String>,
}

impl Block {
    /// Starts an empty block for `code` (e.g. `"G1"`).
    pub fn new(code: &str) -> Self {
        Block {
            line_number: None,
            code: code.to_string(),
            words: Vec::new(),
            comment: None,
        }
    }

    /// Starts a block that reproduces an instruction's own words.
    pub fn with_words(code: &str, words: &[Word]) -> Self {
        Block {
            line_number: None,
            code: code.to_string(),
            words: words.to_vec(),
            comment: None,
        }
    }

    /// Sets the `N` line-number word (rendered before the command).
    pub fn line_number(mut self, text: Option<&str>) -> Self {
        self.line_number = text.map(str::to_string);
        self
    }

    /// Sets the trailing comment, including its leading `;`.
    pub fn comment(mut self, text: Option<&str>) -> Self {
        self.comment = text.map(str::to_string);
        self
    }

    /// Replaces the value of `letter`, or inserts a new word.
    ///
    /// Inserted words go right after the last word that ranks before them in
    /// X Y Z E order, or before the first word that ranks after them, so a
    /// missing `X` lands in front of an existing `Y` and a missing `Y` right
    /// behind `X`.
    pub fn set(&mut self, letter: char, value: f64) {
        let letter = letter.to_ascii_uppercase();
        if let Some(word) = self.words.iter_mut().find(|w| w.letter == letter) {
            word.value = WordValue::Number(value);
            return;
        }

        let rank = axis_rank(letter);
        let at = match self.words.iter().rposition(|w| axis_rank(w.letter) < rank) {
            Some(i) => i + 1,
            None => self
                .words
                .iter()
                .position(|w| axis_rank(w.letter) > rank)
                .unwrap_or(self.words.len()),
        };
        self.words.insert(at, Word::number(letter, value));
    }

    /// Renders the block to a single line of text (no line terminator).
    ///
    /// Numeric words are formatted with `precision`; words are separated by a
    /// single space and the comment follows the last word after one space.
    pub fn render(&self, precision: &Precision) -> String {
        let mut line = String::new();

        if let Some(n) = &self.line_number {
            line.push_str(n);
            line.push(' ');
        }
        line.push_str(&self.code);

        for word in &self.words {
            line.push(' ');
            line.push(word.letter);
            if let WordValue::Number(v) = word.value {
                line.push_str(&format_word_value(word.letter, v, precision));
            }
        }

        if let Some(text) = &self.comment {
            line.push(' ');
            line.push_str(text);
        }

        line
    }
}
