//! A1-style sheet ranges (`'Adult Inventory'!F7`, `Locations!$A$2:$A`, `Inventory`)
//!
//! Columns are **0-indexed** (`0` is column `A`), rows are **1-indexed** like the sheet UI,
//! so row 1 is the header row.

use std::fmt;

/// One corner of a range. A missing column or row means "unbounded" on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bound {
    pub col: Option<usize>,
    pub row: Option<u32>,
}

impl Bound {
    pub const fn cell(col: usize, row: u32) -> Self {
        Self {
            col: Some(col),
            row: Some(row),
        }
    }

    pub const fn column(col: usize) -> Self {
        Self {
            col: Some(col),
            row: None,
        }
    }

    fn is_unbounded(&self) -> bool {
        self.col.is_none() && self.row.is_none()
    }

    fn parse(s: &str) -> Result<Self, RangeParseError> {
        let s: String = s.chars().filter(|c| *c != '$').collect();
        if s.is_empty() {
            return Err(RangeParseError::EmptyBound);
        }

        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);

        let col = if letters.is_empty() {
            None
        } else {
            Some(letters_to_column(letters)?)
        };

        let row = if digits.is_empty() {
            None
        } else {
            let row: u32 = digits
                .parse()
                .map_err(|_| RangeParseError::InvalidRow(digits.to_string()))?;
            if row == 0 {
                return Err(RangeParseError::InvalidRow(digits.to_string()));
            }
            Some(row)
        };

        Ok(Self { col, row })
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = self.col {
            f.write_str(&column_to_letters(col))?;
        }
        if let Some(row) = self.row {
            write!(f, "{}", row)?;
        }
        Ok(())
    }
}

/// A rectangular region of a named tab
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub start: Bound,
    pub end: Bound,
}

impl SheetRange {
    /// The whole used area of a tab
    pub fn whole(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            start: Bound::default(),
            end: Bound::default(),
        }
    }

    pub fn cell(sheet: impl Into<String>, col: usize, row: u32) -> Self {
        let corner = Bound::cell(col, row);
        Self {
            sheet: sheet.into(),
            start: corner,
            end: corner,
        }
    }

    /// Every row of a single column, e.g. `Inventory!F:F`
    pub fn column(sheet: impl Into<String>, col: usize) -> Self {
        Self {
            sheet: sheet.into(),
            start: Bound::column(col),
            end: Bound::column(col),
        }
    }

    /// Columns `first..=last`, every row, e.g. `Inventory!A:K`
    pub fn columns(sheet: impl Into<String>, first: usize, last: usize) -> Self {
        Self {
            sheet: sheet.into(),
            start: Bound::column(first),
            end: Bound::column(last),
        }
    }

    pub fn is_whole_sheet(&self) -> bool {
        self.start.is_unbounded() && self.end.is_unbounded()
    }

    /// Parse an A1 reference such as `Locations!A2:A` or `'My Tab'!$B$1`.
    ///
    /// A bare name without `!` is taken as a whole-tab reference.
    pub fn parse(input: &str) -> Result<Self, RangeParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(RangeParseError::Empty);
        }

        let (sheet, reference) = if let Some(rest) = input.strip_prefix('\'') {
            let (sheet, after) = split_quoted(rest)?;
            match after {
                "" => (sheet, None),
                other => match other.strip_prefix('!') {
                    Some(r) => (sheet, Some(r)),
                    None => return Err(RangeParseError::MissingSeparator),
                },
            }
        } else {
            match input.rsplit_once('!') {
                Some((sheet, r)) => (sheet.to_string(), Some(r)),
                None => (input.to_string(), None),
            }
        };

        if sheet.is_empty() {
            return Err(RangeParseError::MissingSheet);
        }

        let Some(reference) = reference else {
            return Ok(Self::whole(sheet));
        };

        let (start, end) = match reference.split_once(':') {
            Some((a, b)) => (Bound::parse(a)?, Bound::parse(b)?),
            None => {
                let b = Bound::parse(reference)?;
                (b, b)
            }
        };

        Ok(Self { sheet, start, end })
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.sheet.replace('\'', "''"))?;
        if self.is_whole_sheet() {
            return Ok(());
        }
        if self.start == self.end && self.start.col.is_some() && self.start.row.is_some() {
            return write!(f, "!{}", self.start);
        }
        write!(f, "!{}:{}", self.start, self.end)
    }
}

/// Target of a `ONE_OF_RANGE` validation formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeReference {
    /// An A1 range; unqualified spans are placed on the validated tab
    Range(SheetRange),
    /// A spreadsheet-level named range, sent to the backend as written
    Named(String),
}

impl RangeReference {
    /// Parse formula text such as `=Locations!A2:A`, `=$M$2:$M` or `=LocationList`.
    ///
    /// `current_sheet` is the tab holding the rule.
    pub fn parse(formula: &str, current_sheet: &str) -> Result<Self, RangeParseError> {
        let reference = formula.trim().trim_start_matches('=').trim();
        if reference.is_empty() {
            return Err(RangeParseError::Empty);
        }
        if reference.starts_with('\'') || reference.contains('!') {
            return SheetRange::parse(reference).map(Self::Range);
        }
        match unqualified_span(reference) {
            Some((start, end)) => Ok(Self::Range(SheetRange {
                sheet: current_sheet.to_string(),
                start,
                end,
            })),
            None => Ok(Self::Named(reference.to_string())),
        }
    }
}

/// `B2`, `$M$2:$M` or `A:A`. A lone bound must name both column and row.
fn unqualified_span(reference: &str) -> Option<(Bound, Bound)> {
    match reference.split_once(':') {
        Some((a, b)) => Some((Bound::parse(a).ok()?, Bound::parse(b).ok()?)),
        None => {
            let b = Bound::parse(reference).ok()?;
            (b.col.is_some() && b.row.is_some()).then_some((b, b))
        }
    }
}

/// Splits `My ''quoted'' tab'!A1` (leading quote already removed) into the unescaped
/// name and whatever follows the closing quote.
fn split_quoted(rest: &str) -> Result<(String, &str), RangeParseError> {
    let mut name = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '\'' {
            if let Some((_, '\'')) = chars.peek() {
                name.push('\'');
                chars.next();
                continue;
            }
            return Ok((name, &rest[idx + 1..]));
        }
        name.push(c);
    }
    Err(RangeParseError::UnterminatedQuote)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    Empty,
    EmptyBound,
    MissingSheet,
    MissingSeparator,
    UnterminatedQuote,
    InvalidColumn(String),
    InvalidRow(String),
}

impl fmt::Display for RangeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeParseError::Empty => write!(f, "empty range reference"),
            RangeParseError::EmptyBound => write!(f, "empty cell reference in range"),
            RangeParseError::MissingSheet => write!(f, "missing sheet name"),
            RangeParseError::MissingSeparator => write!(f, "expected '!' after quoted sheet name"),
            RangeParseError::UnterminatedQuote => write!(f, "unterminated quoted sheet name"),
            RangeParseError::InvalidColumn(c) => write!(f, "invalid column '{}'", c),
            RangeParseError::InvalidRow(r) => write!(f, "invalid row '{}'", r),
        }
    }
}

impl std::error::Error for RangeParseError {}

/// `0 -> "A"`, `25 -> "Z"`, `26 -> "AA"`
pub fn column_to_letters(col: usize) -> String {
    let mut n = col + 1;
    let mut out = Vec::<char>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Inverse of [`column_to_letters`]; case-insensitive.
pub fn letters_to_column(s: &str) -> Result<usize, RangeParseError> {
    let mut col: usize = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(RangeParseError::InvalidColumn(s.to_string()));
        }
        let v = (b.to_ascii_uppercase() - b'A') as usize + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(v))
            .ok_or_else(|| RangeParseError::InvalidColumn(s.to_string()))?;
    }
    if col == 0 {
        return Err(RangeParseError::InvalidColumn(s.to_string()));
    }
    Ok(col - 1)
}
