use super::Segment;
use crate::{
    catalogue::AUTOMATIC_MARKER,
    error::{AutofeaError, SyntaxErrorKind},
    features::{BlockBody, FeatureBlock, LookupSummary, Provenance},
};
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)] // Safe because the regex is valid
static OT_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,4}$").unwrap());

/// Split feature file text into top-level segments
///
/// Every byte of the input ends up in exactly one segment, so rendering the
/// segments again reproduces the input.
pub(crate) fn parse(src: &str) -> Result<Vec<Segment>, AutofeaError> {
    let mut parser = Parser::new(src);
    let mut segments = vec![];
    while !parser.at_end() {
        segments.push(parser.segment()?);
    }
    log::debug!("Parsed {} segments", segments.len());
    Ok(segments)
}

/// A feature block counts as automatic when the first line of its body is
/// the marker comment
fn is_automatic(body: &str) -> bool {
    body.trim_start()
        .lines()
        .next()
        .is_some_and(|line| line.trim_end() == AUTOMATIC_MARKER)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '\\')
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser {
            src,
            pos: 0,
            end: src.len(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..self.end]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.end
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, offset: usize, kind: SyntaxErrorKind) -> AutofeaError {
        let before = &self.src[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map(|l| l.chars().count())
            .unwrap_or(0)
            + 1;
        AutofeaError::Syntax { line, column, kind }
    }

    fn current_line_is_blank(&self) -> bool {
        self.rest()
            .split('\n')
            .next()
            .is_some_and(|line| line.trim().is_empty())
    }

    /// Move past the next newline, or to the end
    fn skip_line(&mut self) {
        match self.rest().find('\n') {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.end,
        }
    }

    /// Move to the end of a `#` comment, leaving the newline in place
    fn skip_comment(&mut self) {
        match self.rest().find('\n') {
            Some(offset) => self.pos += offset,
            None => self.pos = self.end,
        }
    }

    fn skip_horizontal_space(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn skip_space_and_comments(&mut self) {
        loop {
            self.skip_space();
            if self.peek() == Some('#') {
                self.skip_comment();
            } else {
                return;
            }
        }
    }

    fn skip_string(&mut self) -> Result<(), AutofeaError> {
        let quote = self.pos;
        self.bump();
        match self.rest().find('"') {
            Some(offset) => {
                self.pos += offset + 1;
                Ok(())
            }
            None => Err(self.error(quote, SyntaxErrorKind::UnterminatedString)),
        }
    }

    fn peek_word(&self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !is_word_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..len]
    }

    /// A block name, which unlike a word may hold any character that
    /// cannot end a statement (`table OS/2`)
    fn name(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() || matches!(c, '{' | '}' | ';' | '#'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn word(&mut self) -> &'a str {
        let word = self.peek_word();
        self.pos += word.len();
        word
    }

    /// Whitespace, an optional comment, and the newline after a statement
    fn trailing(&mut self) {
        self.skip_horizontal_space();
        if self.peek() == Some('#') {
            self.skip_comment();
        }
        if self.peek() == Some('\n') {
            self.bump();
        }
    }

    /// Move past the `;` ending the statement at the current position,
    /// stepping over any braced groups inside it
    fn statement_end(&mut self, start: usize) -> Result<(), AutofeaError> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '"' => {
                    self.skip_string()?;
                    continue;
                }
                '{' => depth += 1,
                '}' if depth == 0 => {
                    return Err(self.error(self.pos, SyntaxErrorKind::UnbalancedBraces))
                }
                '}' => depth -= 1,
                ';' if depth == 0 => {
                    self.bump();
                    return Ok(());
                }
                _ => {}
            }
            self.bump();
        }
        let kind = if depth > 0 {
            SyntaxErrorKind::UnbalancedBraces
        } else {
            SyntaxErrorKind::UnterminatedStatement
        };
        Err(self.error(start, kind))
    }

    /// Find the `}` matching an already consumed `{`, returning its offset
    fn block_end(&mut self, opened_at: usize, tag: &str) -> Result<usize, AutofeaError> {
        let mut depth = 1usize;
        while let Some(c) = self.peek() {
            match c {
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '"' => {
                    self.skip_string()?;
                    continue;
                }
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let close = self.pos;
                        self.bump();
                        return Ok(close);
                    }
                }
                _ => {}
            }
            self.bump();
        }
        Err(self.error(
            opened_at,
            SyntaxErrorKind::UnclosedBlock { tag: tag.into() },
        ))
    }

    /// The `tag;` after a block's closing brace
    fn close_tag(&mut self, tag: &str) -> Result<(), AutofeaError> {
        self.skip_space();
        let at = self.pos;
        let found = self.name();
        if found.is_empty() {
            return Err(self.error(at, SyntaxErrorKind::MissingClosingTag { tag: tag.into() }));
        }
        if found != tag {
            return Err(self.error(
                at,
                SyntaxErrorKind::MismatchedClosingTag {
                    expected: tag.into(),
                    found: found.into(),
                },
            ));
        }
        self.skip_horizontal_space();
        if self.peek() != Some(';') {
            return Err(self.error(
                self.pos,
                SyntaxErrorKind::MissingClosingTag { tag: tag.into() },
            ));
        }
        self.bump();
        Ok(())
    }

    fn segment(&mut self) -> Result<Segment, AutofeaError> {
        let start = self.pos;
        if self.current_line_is_blank() {
            while !self.at_end() && self.current_line_is_blank() {
                self.skip_line();
            }
            return Ok(Segment::Blank(self.src[start..self.pos].to_string()));
        }
        self.skip_horizontal_space();
        if self.peek() == Some('#') {
            self.skip_line();
            return Ok(Segment::Comment(self.src[start..self.pos].to_string()));
        }
        let keyword = self.pos;
        match self.word() {
            "feature" => self.feature_block(start, keyword),
            "languagesystem" => self.languagesystem(start, keyword),
            "lookup" | "table" | "anon" | "anonymous" => self.named_block(start, keyword),
            _ => {
                self.pos = keyword;
                self.statement_end(keyword)?;
                self.trailing();
                Ok(Segment::Verbatim(self.src[start..self.pos].to_string()))
            }
        }
    }

    fn languagesystem(&mut self, start: usize, keyword: usize) -> Result<Segment, AutofeaError> {
        self.statement_end(keyword)?;
        let statement = self.src[keyword..self.pos].trim_end_matches(';');
        let parts: Vec<&str> = statement.split_whitespace().collect();
        match parts.as_slice() {
            [_, script, language] if OT_TAG.is_match(script) && OT_TAG.is_match(language) => {
                let (script, language) = ((*script).into(), (*language).into());
                self.trailing();
                Ok(Segment::Languagesystem {
                    script,
                    language,
                    text: self.src[start..self.pos].to_string(),
                })
            }
            _ => Err(self.error(keyword, SyntaxErrorKind::MalformedLanguagesystem)),
        }
    }

    /// A top-level `lookup`, `table` or anonymous block, kept as it is
    fn named_block(&mut self, start: usize, keyword: usize) -> Result<Segment, AutofeaError> {
        self.skip_space();
        let name_at = self.pos;
        let name = self.name();
        if name.is_empty() {
            return Err(self.error(name_at, SyntaxErrorKind::Expected("a block name")));
        }
        self.skip_space();
        if self.peek_word() == "useExtension" {
            self.word();
            self.skip_space();
        }
        if self.peek() == Some('{') {
            self.bump();
            self.block_end(keyword, name)?;
            self.close_tag(name)?;
        } else {
            self.pos = keyword;
            self.statement_end(keyword)?;
        }
        log::debug!("Found top-level block {}", name);
        self.trailing();
        Ok(Segment::Verbatim(self.src[start..self.pos].to_string()))
    }

    fn feature_block(&mut self, start: usize, keyword: usize) -> Result<Segment, AutofeaError> {
        self.skip_space();
        let tag_at = self.pos;
        let tag = self.word();
        if tag.is_empty() {
            return Err(self.error(tag_at, SyntaxErrorKind::Expected("a feature tag")));
        }
        self.skip_space();
        let use_extension = self.peek_word() == "useExtension";
        if use_extension {
            self.word();
            self.skip_space();
        }
        if self.peek() != Some('{') {
            return Err(self.error(self.pos, SyntaxErrorKind::Expected("`{`")));
        }
        self.bump();
        let body_start = self.pos;
        let body_end = self.block_end(keyword, tag)?;
        self.close_tag(tag)?;
        let text_end = self.pos;
        self.trailing();

        let body = &self.src[body_start..body_end];
        let provenance = if is_automatic(body) {
            Provenance::Automatic
        } else {
            Provenance::Manual
        };
        let lookups = Parser {
            src: self.src,
            pos: body_start,
            end: body_end,
        }
        .lookups()?;
        log::debug!(
            "Found {:?} feature block {} with {} lookups",
            provenance,
            tag,
            lookups.len()
        );

        Ok(Segment::FeatureBlock(FeatureBlock {
            tag: tag.into(),
            provenance,
            use_extension,
            body: BlockBody::Source {
                text: self.src[keyword..text_end].to_string(),
                lookups,
            },
            leading: self.src[start..keyword].to_string(),
            trailing: self.src[text_end..self.pos].to_string(),
        }))
    }

    /// Walk the statements of a feature block body, checking nested lookup
    /// blocks and noting which lookups appear under which script
    fn lookups(mut self) -> Result<Vec<LookupSummary>, AutofeaError> {
        let mut script = None;
        let mut lookups = vec![];
        loop {
            self.skip_space_and_comments();
            if self.at_end() {
                break;
            }
            let start = self.pos;
            match self.word() {
                "script" => {
                    self.skip_space();
                    script = Some(self.word().into());
                    self.pos = start;
                    self.statement_end(start)?;
                }
                "lookup" => {
                    self.skip_space();
                    let name_at = self.pos;
                    let name = self.word();
                    if name.is_empty() {
                        return Err(self.error(name_at, SyntaxErrorKind::Expected("a lookup name")));
                    }
                    self.skip_space();
                    if self.peek_word() == "useExtension" {
                        self.word();
                        self.skip_space();
                    }
                    let defined = self.peek() == Some('{');
                    if defined {
                        self.bump();
                        self.block_end(start, name)?;
                        self.close_tag(name)?;
                    } else {
                        self.pos = start;
                        self.statement_end(start)?;
                    }
                    lookups.push(LookupSummary {
                        name: name.into(),
                        script: script.clone(),
                        defined,
                    });
                }
                _ => {
                    self.pos = start;
                    self.statement_end(start)?;
                }
            }
        }
        Ok(lookups)
    }
}
