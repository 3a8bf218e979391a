//! Per-call parse state
//!
//! A [`ParsingData`] owns a view of the formula text (the whole formula, or
//! the interior of a group / function argument during a recursive parse) and
//! the tokens claimed over it so far. Claims are tracked in a slot per byte of
//! the covered range, so each recognizer pass is a linear scan that checks
//! slots instead of walking a token graph.

use crate::error::{ParseError, ParseErrorKind};
use crate::token::{Span, Token};

pub struct ParsingData<'a> {
    text: &'a str,
    range: Span,
    tokens: Vec<Token>,
    /// Token index owning each byte of `range`
    slots: Vec<Option<usize>>,
    first_error: Option<ParseError>,
}

impl<'a> ParsingData<'a> {
    /// Parse state covering the whole text
    pub fn new(text: &'a str) -> Self {
        Self::for_span(text, Span::new(0, text.len()))
    }

    /// Parse state covering `range` of `text`
    pub fn for_span(text: &'a str, range: Span) -> Self {
        Self {
            text,
            range,
            tokens: Vec::new(),
            slots: vec![None; range.len()],
            first_error: None,
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn range(&self) -> Span {
        self.range
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn token_mut(&mut self, index: usize) -> &mut Token {
        &mut self.tokens[index]
    }

    /// The earliest recorded error, if any
    pub fn first_error(&self) -> Option<&ParseError> {
        self.first_error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.first_error.is_some()
    }

    pub(crate) fn take_error(&mut self) -> Option<ParseError> {
        self.first_error.take()
    }

    /// Index of the token covering `pos`
    pub fn claimed_by(&self, pos: usize) -> Option<usize> {
        if !self.range.contains(pos) {
            return None;
        }
        self.slots[pos - self.range.start]
    }

    pub fn is_claimed(&self, pos: usize) -> bool {
        self.claimed_by(pos).is_some()
    }

    /// End of the token covering `pos`, or `None` if `pos` is free
    pub fn claimed_end(&self, pos: usize) -> Option<usize> {
        self.claimed_by(pos).map(|index| self.tokens[index].span.end)
    }

    /// Claim the token's span and return its index
    ///
    /// # Panics
    ///
    /// If any byte of the span lies outside the range or is already claimed.
    /// Recognizers only ever claim spans they found free.
    pub fn register(&mut self, token: Token) -> usize {
        let span = token.span;
        assert!(
            span.start >= self.range.start && span.end <= self.range.end,
            "token {span} outside parse range {}",
            self.range
        );
        let index = self.tokens.len();
        let base = self.range.start;
        for slot in &mut self.slots[span.start - base..span.end - base] {
            assert!(slot.is_none(), "token {span} overlaps an existing claim");
            *slot = Some(index);
        }
        self.tokens.push(token);
        index
    }

    /// Record an error against a token
    ///
    /// The token keeps its own error kind; the parse-wide first error is only
    /// written once.
    pub fn set_error(&mut self, token: usize, kind: ParseErrorKind, message: impl Into<String>) {
        let span = self.tokens[token].span;
        self.record(token, ParseError::new(kind, span, message));
    }

    /// Record an error located anywhere (e.g. inside a nested parse) against a token
    pub(crate) fn record(&mut self, token: usize, error: ParseError) {
        let slot = &mut self.tokens[token].error;
        if slot.is_none() {
            *slot = Some(error.kind);
        }
        self.keep_first(error);
    }

    /// Record an error against whichever token covers its start, if any
    pub(crate) fn fail(&mut self, error: ParseError) {
        match self.claimed_by(error.span.start) {
            Some(token) => self.record(token, error),
            None => self.keep_first(error),
        }
    }

    fn keep_first(&mut self, error: ParseError) {
        if self.first_error.is_none() {
            log::debug!("parse error: {error}");
            self.first_error = Some(error);
        } else {
            log::debug!("parse error discarded, an earlier one was recorded: {error}");
        }
    }

    /// Maximal runs of bytes no token covers yet, in source order
    pub fn unclaimed_spans(&self) -> Vec<Span> {
        let base = self.range.start;
        let mut spans = Vec::new();
        let mut run_start: Option<usize> = None;
        for (offset, slot) in self.slots.iter().enumerate() {
            match (slot, run_start) {
                (None, None) => run_start = Some(base + offset),
                (Some(_), Some(start)) => {
                    spans.push(Span::new(start, base + offset));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            spans.push(Span::new(start, self.range.end));
        }
        spans
    }

    /// Token indices ordered by position in the source
    pub fn source_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.tokens.len()).collect();
        order.sort_by_key(|&index| self.tokens[index].span.start);
        order
    }
}
