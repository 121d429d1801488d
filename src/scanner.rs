//! Incremental feature-boundary scanner.
//!
//! [`BoundaryScanner`] walks a line-oriented text stream and yields one
//! [`RawSlice`] per object in the document's `features` array without parsing
//! the document as a whole. Only the current line and the object being
//! gathered are held in memory.
//!
//! # Scanning rules
//!
//! 1. Header: lines are discarded until one contains the marker
//!    `"features"` `:` `[` (whitespace allowed around the colon). The search
//!    stops after `max_header_lines`; a missing marker is
//!    [`SplitError::StartMarkerNotFound`]. Text after the marker on the same
//!    line belongs to the body.
//! 2. Body, between objects: whitespace and the `,` separator are skipped,
//!    `]` closes the array and ends the scan, `{` opens a slice.
//! 3. Body, inside an object: characters accumulate and `{`/`}` adjust the
//!    nesting depth. When the depth returns to zero the slice is yielded.
//! 4. Any other text between objects is gathered into a stray slice that ends
//!    at the next `,`, `]` or `{`. It is yielded like an object so the decoder
//!    can reject it and the run can count it.
//! 5. End of input with an open object is [`SplitError::UnterminatedObject`].
//!    End of input between objects (no closing `]`) ends the scan cleanly.
//!
//! # Limitation of [`BoundaryMode::Naive`]
//!
//! Naive mode counts every brace in the raw text. Braces inside string values
//! are indistinguishable from structural ones, so a value such as `"a } b"`
//! closes its object early and produces a truncated slice (which then fails to
//! decode). [`BoundaryMode::StringAware`] tracks string literals and escapes
//! and does not have this problem.

use crate::error::SplitError;
use anyhow::{Context, Result};
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

/// Default bound on the leading lines searched for the array marker.
pub const DEFAULT_MAX_HEADER_LINES: usize = 100;

static FEATURES_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""features"\s*:\s*\["#).expect("static pattern"));

/// How object delimiters are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Count every `{` and `}` in the raw text, including those inside strings.
    #[default]
    Naive,
    /// Ignore delimiters inside JSON string literals, honouring `\` escapes.
    StringAware,
}

/// Text believed to hold exactly one object of the `features` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlice {
    pub text: String,
    /// 1-based line on which the slice starts.
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Body,
    Done,
}

/// Iterator over the raw object slices of a `FeatureCollection` stream.
///
/// Fatal conditions are yielded once as `Err` and end the iteration.
pub struct BoundaryScanner<R> {
    reader: R,
    mode: BoundaryMode,
    max_header_lines: usize,
    state: State,
    line: String,
    pos: usize,
    line_no: usize,
    pending: String,
    pending_line: usize,
    depth: usize,
    stray: bool,
    in_string: bool,
    escaped: bool,
}

impl<R: BufRead> BoundaryScanner<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, BoundaryMode::default(), DEFAULT_MAX_HEADER_LINES)
    }

    pub fn with_options(reader: R, mode: BoundaryMode, max_header_lines: usize) -> Self {
        Self {
            reader,
            mode,
            max_header_lines,
            state: State::Header,
            line: String::new(),
            pos: 0,
            line_no: 0,
            pending: String::new(),
            pending_line: 0,
            depth: 0,
            stray: false,
            in_string: false,
            escaped: false,
        }
    }

    /// Read the next line into the line buffer. Returns `false` at end of input.
    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        self.pos = 0;
        let n = self
            .reader
            .read_line(&mut self.line)
            .with_context(|| format!("read line {}", self.line_no + 1))?;
        if n == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        Ok(true)
    }

    fn seek_marker(&mut self) -> Result<()> {
        while self.line_no < self.max_header_lines {
            if !self.read_line()? {
                break;
            }
            if let Some(m) = FEATURES_MARKER.find(&self.line) {
                self.pos = m.end();
                return Ok(());
            }
        }
        Err(SplitError::StartMarkerNotFound {
            lines: self.line_no,
        }
        .into())
    }

    fn take_pending(&mut self) -> RawSlice {
        self.stray = false;
        RawSlice {
            text: std::mem::take(&mut self.pending),
            line: self.pending_line,
        }
    }

    fn open_object(&mut self) {
        self.pending.push('{');
        self.pending_line = self.line_no;
        self.depth = 1;
        self.in_string = false;
        self.escaped = false;
    }

    /// Update nesting state for a character inside an object.
    /// Returns `true` when the object just closed.
    fn track(&mut self, c: char) -> bool {
        match self.mode {
            BoundaryMode::Naive => match c {
                '{' => self.depth += 1,
                '}' => self.depth -= 1,
                _ => {}
            },
            BoundaryMode::StringAware => {
                if self.in_string {
                    if self.escaped {
                        self.escaped = false;
                    } else if c == '\\' {
                        self.escaped = true;
                    } else if c == '"' {
                        self.in_string = false;
                    }
                } else {
                    match c {
                        '"' => self.in_string = true,
                        '{' => self.depth += 1,
                        '}' => self.depth -= 1,
                        _ => {}
                    }
                }
            }
        }
        self.depth == 0
    }

    /// Scan the rest of the current line. Returns a slice as soon as one is
    /// complete; `None` means the line is exhausted or the array closed.
    fn advance(&mut self) -> Option<RawSlice> {
        while let Some(c) = self.line[self.pos..].chars().next() {
            self.pos += c.len_utf8();

            if self.depth > 0 {
                self.pending.push(c);
                if self.track(c) {
                    return Some(self.take_pending());
                }
                continue;
            }

            match c {
                '{' => {
                    let stray = self.stray.then(|| self.take_pending());
                    self.open_object();
                    if stray.is_some() {
                        return stray;
                    }
                }
                ',' if self.stray => return Some(self.take_pending()),
                ',' => {}
                ']' => {
                    self.state = State::Done;
                    return self.stray.then(|| self.take_pending());
                }
                c if self.stray => self.pending.push(c),
                c if c.is_whitespace() => {}
                c => {
                    self.stray = true;
                    self.pending_line = self.line_no;
                    self.pending.push(c);
                }
            }
        }
        None
    }

    fn finish(&mut self) -> Option<Result<RawSlice>> {
        self.state = State::Done;
        if self.depth > 0 {
            return Some(Err(SplitError::UnterminatedObject {
                line: self.pending_line,
            }
            .into()));
        }
        if self.stray {
            return Some(Ok(self.take_pending()));
        }
        log::debug!("input ended after line {} without closing ']'", self.line_no);
        None
    }
}

impl<R: BufRead> Iterator for BoundaryScanner<R> {
    type Item = Result<RawSlice>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                State::Done => return None,
                State::Header => {
                    if let Err(e) = self.seek_marker() {
                        self.state = State::Done;
                        return Some(Err(e));
                    }
                    self.state = State::Body;
                }
                State::Body => {
                    if self.pos >= self.line.len() {
                        match self.read_line() {
                            Ok(true) => {}
                            Ok(false) => return self.finish(),
                            Err(e) => {
                                self.state = State::Done;
                                return Some(Err(e));
                            }
                        }
                    }
                    if let Some(slice) = self.advance() {
                        return Some(Ok(slice));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(text: &str, mode: BoundaryMode) -> Vec<Result<RawSlice>> {
        BoundaryScanner::with_options(Cursor::new(text.to_string()), mode, 10).collect()
    }

    fn texts(text: &str) -> Vec<String> {
        scan(text, BoundaryMode::Naive)
            .into_iter()
            .map(|r| r.unwrap().text)
            .collect()
    }

    #[test]
    fn pretty_multi_line_objects() {
        let doc = "{\n\"type\": \"FeatureCollection\",\n\"features\": [\n{\n  \"a\": {\"b\": 1}\n}\n,\n{\"c\": 2}\n]\n}\n";
        let out = texts(doc);
        assert_eq!(out, vec!["{\n  \"a\": {\"b\": 1}\n}", "{\"c\": 2}"]);
    }

    #[test]
    fn minified_single_line() {
        let doc = r#"{"type":"FeatureCollection","features":[{"a":1},{"b":{"c":2}}]}"#;
        assert_eq!(texts(doc), vec![r#"{"a":1}"#, r#"{"b":{"c":2}}"#]);
    }

    #[test]
    fn default_scanner_reads_past_a_long_header() {
        let mut doc = String::from("{\n");
        for i in 0..50 {
            doc.push_str(&format!("\"meta{i}\": {i},\n"));
        }
        doc.push_str("\"features\": [{\"a\": 1}]}\n");
        let out: Vec<String> = BoundaryScanner::new(Cursor::new(doc))
            .map(|r| r.unwrap().text)
            .collect();
        assert_eq!(out, vec![r#"{"a": 1}"#]);
    }

    #[test]
    fn slice_records_its_start_line() {
        let doc = "{\"features\": [\n{\"a\": 1},\n{\n\"b\": 2\n}\n]}";
        let lines: Vec<usize> = scan(doc, BoundaryMode::Naive)
            .into_iter()
            .map(|r| r.unwrap().line)
            .collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn closing_bracket_stops_the_scan() {
        let doc = "{\"features\": [\n{\"a\": 1}\n  ]  \n{\"ignored\": true}\n";
        assert_eq!(texts(doc), vec![r#"{"a": 1}"#]);
    }

    #[test]
    fn empty_array() {
        assert!(texts("{\"features\": []}").is_empty());
    }

    #[test]
    fn marker_not_found_within_bound() {
        let mut doc = String::new();
        for i in 0..20 {
            doc.push_str(&format!("line {i}\n"));
        }
        doc.push_str("\"features\": [{}]\n");
        let out = scan(&doc, BoundaryMode::Naive);
        assert_eq!(out.len(), 1);
        let err = out.into_iter().next().unwrap().unwrap_err();
        match err.downcast_ref::<SplitError>() {
            Some(SplitError::StartMarkerNotFound { lines }) => assert_eq!(*lines, 10),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unterminated_object_is_an_error() {
        let doc = "{\"features\": [\n{\"a\": 1},\n{\"b\": {\n";
        let out = scan(doc, BoundaryMode::Naive);
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        let err = out[1].as_ref().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::UnterminatedObject { line: 3 })
        ));
    }

    #[test]
    fn stray_text_becomes_its_own_slice() {
        let doc = "{\"features\": [\n{\"a\": 1},\nnot json,\n{\"b\": 2}\n]}";
        assert_eq!(texts(doc), vec![r#"{"a": 1}"#, "not json", r#"{"b": 2}"#]);
    }

    #[test]
    fn naive_mode_is_fooled_by_braces_in_strings() {
        let doc = r#"{"features": [{"name": "a } b", "x": 1},{"y": 2}]}"#;
        let out = texts(doc);
        assert_eq!(out[0], r#"{"name": "a }"#);
        assert_eq!(out.last().unwrap(), r#"{"y": 2}"#);
        assert!(out.len() > 2);
    }

    #[test]
    fn string_aware_mode_handles_braces_and_escapes() {
        let doc = r#"{"features": [{"name": "a } \" { b", "x": 1},{"y": 2}]}"#;
        let out: Vec<String> = scan(doc, BoundaryMode::StringAware)
            .into_iter()
            .map(|r| r.unwrap().text)
            .collect();
        assert_eq!(out, vec![r#"{"name": "a } \" { b", "x": 1}"#, r#"{"y": 2}"#]);
    }
}
