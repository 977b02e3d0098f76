//! WKT motif parsing.
//!
//! A motif file is a sequence of WKT records, one geometry each:
//!
//! ```text
//! POLYGON ((0 0, 0 20000, 20000 20000, 20000 0, 0 0))
//! POLYGON ((0 10000, 10000 10000, 10000 0, 0 10000))
//! LINESTRING (0 0, 10000 10000)
//! ```
//!
//! `LINESTRING`/`MULTILINESTRING` records become open polylines,
//! `POLYGON`/`MULTIPOLYGON` rings become closed polygons (a polygon's holes
//! follow its outline as separate rings). `GEOMETRYCOLLECTION` wrappers
//! are flattened. Coordinates are rounded to integer units and any Z/M
//! ordinates are ignored.

use std::fmt;

use crate::content::Content;
use crate::geometry::{MAX_COORD, Point, Polygon, Polyline};

/// Parse failure with the 1-based line it happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct WktError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for WktError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for WktError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(w) => write!(f, "'{}'", w),
            Token::Number(n) => write!(f, "number {}", n),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

/// Split WKT text into tokens, each tagged with its line number.
fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, WktError> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() || c == ';' => {
                chars.next();
            }
            '(' => {
                tokens.push((Token::LParen, line));
                chars.next();
            }
            ')' => {
                tokens.push((Token::RParen, line));
                chars.next();
            }
            ',' => {
                tokens.push((Token::Comma, line));
                chars.next();
            }
            c if c.is_ascii_alphabetic() => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !(c.is_ascii_alphanumeric() || c == '_') {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push((Token::Word(text[start..end].to_ascii_uppercase()), line));
            }
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let raw = &text[start..end];
                let value: f64 = raw.parse().map_err(|_| WktError {
                    line,
                    message: format!("invalid number '{}'", raw),
                })?;
                tokens.push((Token::Number(value), line));
            }
            other => {
                return Err(WktError {
                    line,
                    message: format!("unexpected character '{}'", other),
                });
            }
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token stream.
struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |(_, line)| *line)
    }

    fn error(&self, message: impl Into<String>) -> WktError {
        WktError { line: self.line(), message: message.into() }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), WktError> {
        match self.peek() {
            Some(t) if *t == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(self.error(format!("expected {}, found {}", expected, t))),
            None => Err(self.error(format!("expected {}, found end of input", expected))),
        }
    }

    /// Consume a `,` if present; `Ok(true)` means another item follows.
    fn list_continues(&mut self) -> Result<bool, WktError> {
        match self.peek() {
            Some(Token::Comma) => {
                self.pos += 1;
                Ok(true)
            }
            Some(Token::RParen) => {
                self.pos += 1;
                Ok(false)
            }
            Some(t) => Err(self.error(format!("expected ',' or ')', found {}", t))),
            None => Err(self.error("unterminated list")),
        }
    }

    /// `EMPTY` right after a tag means a geometry with no coordinates.
    fn take_empty(&mut self) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == "EMPTY") {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn geometry(&mut self, content: &mut Content) -> Result<(), WktError> {
        let tag = match self.next() {
            Some(Token::Word(tag)) => tag,
            Some(t) => {
                self.pos -= 1;
                return Err(self.error(format!("expected geometry type, found {}", t)));
            }
            None => return Err(self.error("expected geometry type")),
        };

        // Dimension markers: POLYGON Z (...), LINESTRING ZM (...)
        if matches!(self.peek(), Some(Token::Word(w)) if matches!(w.as_str(), "Z" | "M" | "ZM")) {
            self.pos += 1;
        }
        if self.take_empty() {
            return Ok(());
        }

        match tag.as_str() {
            "LINESTRING" => {
                let line = self.linestring_body()?;
                content.lines.push(line);
            }
            "POLYGON" => {
                let rings = self.polygon_body()?;
                content.polygons.extend(rings);
            }
            "MULTILINESTRING" => {
                self.expect(Token::LParen)?;
                loop {
                    if !self.take_empty() {
                        let line = self.linestring_body()?;
                        content.lines.push(line);
                    }
                    if !self.list_continues()? {
                        break;
                    }
                }
            }
            "MULTIPOLYGON" => {
                self.expect(Token::LParen)?;
                loop {
                    if !self.take_empty() {
                        let rings = self.polygon_body()?;
                        content.polygons.extend(rings);
                    }
                    if !self.list_continues()? {
                        break;
                    }
                }
            }
            "GEOMETRYCOLLECTION" => {
                self.expect(Token::LParen)?;
                loop {
                    self.geometry(content)?;
                    if !self.list_continues()? {
                        break;
                    }
                }
            }
            other => {
                self.pos -= 1;
                return Err(self.error(format!("unsupported geometry type {}", other)));
            }
        }
        Ok(())
    }

    fn coordinate(&mut self) -> Result<i64, WktError> {
        match self.next() {
            Some(Token::Number(v)) if v.is_finite() && v.round().abs() <= MAX_COORD as f64 => {
                Ok(v.round() as i64)
            }
            Some(Token::Number(v)) => {
                self.pos -= 1;
                Err(self.error(format!("coordinate {} out of range", v)))
            }
            Some(t) => {
                self.pos -= 1;
                Err(self.error(format!("expected coordinate, found {}", t)))
            }
            None => Err(self.error("expected coordinate, found end of input")),
        }
    }

    /// `(x y, x y, ...)`
    fn point_list(&mut self) -> Result<Vec<Point>, WktError> {
        self.expect(Token::LParen)?;
        let mut points = Vec::new();
        loop {
            let x = self.coordinate()?;
            let y = self.coordinate()?;
            // Z and M ordinates
            while matches!(self.peek(), Some(Token::Number(_))) {
                self.pos += 1;
            }
            points.push(Point::new(x, y));
            if !self.list_continues()? {
                break;
            }
        }
        Ok(points)
    }

    fn linestring_body(&mut self) -> Result<Polyline, WktError> {
        let points = self.point_list()?;
        if points.len() < 2 {
            return Err(self.error(format!(
                "linestring needs at least 2 points, found {}",
                points.len()
            )));
        }
        Ok(Polyline::new(points))
    }

    /// `((outline), (hole), ...)`, each ring becoming one polygon.
    fn polygon_body(&mut self) -> Result<Vec<Polygon>, WktError> {
        self.expect(Token::LParen)?;
        let mut rings = Vec::new();
        loop {
            let mut points = self.point_list()?;
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            if points.len() < 3 {
                return Err(self.error(format!(
                    "polygon ring needs at least 3 distinct points, found {}",
                    points.len()
                )));
            }
            rings.push(Polygon::new(points));
            if !self.list_continues()? {
                break;
            }
        }
        Ok(rings)
    }
}

/// Parse every WKT record in `text` into one motif.
pub fn parse_wkt(text: &str) -> Result<Content, WktError> {
    let mut parser = Parser { tokens: tokenize(text)?, pos: 0 };
    let mut content = Content::default();

    while parser.peek().is_some() {
        parser.geometry(&mut content)?;
    }

    Ok(content)
}

// ============================================================================
// WRITING
// ============================================================================

fn write_points(out: &mut String, points: &[Point], close: bool) {
    out.push('(');
    let closing = close.then(|| points.first()).flatten();
    for (i, p) in points.iter().chain(closing).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{} {}", p.x, p.y));
    }
    out.push(')');
}

/// Serialize a motif as one WKT record per line, polygons first.
///
/// Rings are written closed. Holes are not nested back into their outline:
/// every polygon becomes its own `POLYGON` record, which [`parse_wkt`]
/// reads back in the same order.
pub fn write_wkt(content: &Content) -> String {
    let mut out = String::new();
    for polygon in &content.polygons {
        out.push_str("POLYGON (");
        write_points(&mut out, &polygon.points, true);
        out.push_str(")\n");
    }
    for line in &content.lines {
        out.push_str("LINESTRING ");
        write_points(&mut out, &line.points, false);
        out.push('\n');
    }
    out
}
