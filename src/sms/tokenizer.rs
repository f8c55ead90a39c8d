//! Splits an SMS source document into whitespace-delimited words. Spaces and tabs only
//! separate; a line ending is a token of its own because the language resets state at
//! newlines. The tokenizer counts lines and the word position within the current line,
//! which is what error messages report as the column.

use log::trace;

/// Words longer than this are split.
pub(crate) const WORD_MAX: usize = 253;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Scan {
    Word(String),
    Newline,
    End,
}

pub(crate) struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
    line: u32,
    line_word: u32,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            data: source.as_bytes(),
            pos: 0,
            line: 1,
            line_word: 0,
        }
    }

    /// The 1-based line the last word came from.
    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    /// The 1-based position of the last word within its line.
    pub(crate) fn line_word(&self) -> u32 {
        self.line_word
    }

    pub(crate) fn next(&mut self) -> Scan {
        while self.pos < self.data.len() {
            match self.data[self.pos] {
                b' ' | b'\t' => self.pos += 1,
                _ => break,
            }
        }
        if self.pos >= self.data.len() {
            return Scan::End;
        }
        let c = self.data[self.pos];
        if c == b'\r' || c == b'\n' {
            self.pos += 1;
            // CR immediately followed by LF is one line ending
            if c == b'\r' && self.data.get(self.pos) == Some(&b'\n') {
                self.pos += 1;
            }
            self.line += 1;
            self.line_word = 0;
            return Scan::Newline;
        }
        let start = self.pos;
        while self.pos < self.data.len() && self.pos - start < WORD_MAX {
            match self.data[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => break,
                _ => self.pos += 1,
            }
        }
        self.line_word += 1;
        let word = String::from_utf8_lossy(&self.data[start..self.pos]).into_owned();
        trace!("word {:?} at line {} position {}", word, self.line, self.line_word);
        Scan::Word(word)
    }
}

#[cfg(test)]
fn words(source: &str) -> Vec<Scan> {
    let mut tok = Tokenizer::new(source);
    let mut out = Vec::new();
    loop {
        let scan = tok.next();
        if scan == Scan::End {
            return out;
        }
        out.push(scan);
    }
}

#[test]
fn splits_on_blanks_and_tabs() {
    assert_eq!(
        vec![
            Scan::Word("c5/4".into()),
            Scan::Word("d".into()),
            Scan::Word("|".into()),
        ],
        words("c5/4 \t d  |")
    );
}

#[test]
fn newlines_are_tokens() {
    assert_eq!(
        vec![
            Scan::Word("a".into()),
            Scan::Newline,
            Scan::Word("b".into()),
            Scan::Newline,
        ],
        words("a\nb\n")
    );
}

#[test]
fn crlf_is_one_newline() {
    assert_eq!(vec![Scan::Word("a".into()), Scan::Newline], words("a\r\n"));
    assert_eq!(vec![Scan::Newline, Scan::Newline], words("\r\r"));
}

#[test]
fn line_and_word_counters() {
    let mut tok = Tokenizer::new("H: song\nc d\n");
    tok.next(); // H:
    assert_eq!((1, 1), (tok.line(), tok.line_word()));
    tok.next(); // song
    assert_eq!((1, 2), (tok.line(), tok.line_word()));
    tok.next(); // newline
    tok.next(); // c
    assert_eq!((2, 1), (tok.line(), tok.line_word()));
    tok.next(); // d
    assert_eq!((2, 2), (tok.line(), tok.line_word()));
}

#[test]
fn trailing_blanks_reach_end() {
    assert_eq!(vec![Scan::Word("c".into())], words("c  \t "));
}

#[test]
fn overlong_words_are_split() {
    let long = "x".repeat(WORD_MAX + 10);
    let scans = words(&long);
    assert_eq!(
        vec![
            Scan::Word("x".repeat(WORD_MAX)),
            Scan::Word("x".repeat(10))
        ],
        scans
    );
}
