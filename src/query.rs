// src/query.rs
//! Query parser: `<shortname>[, <university>]`.

use std::fmt;

pub const QUERY_SEPARATOR: char = ',';

/// A parsed course query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseQuery {
    /// Used verbatim (case-sensitive) as the lookup key.
    pub shortname: String,
    /// Upper-cased and trimmed qualifier; `None` when not given or blank.
    pub university: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    TooManyParts(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty course name"),
            ParseError::TooManyParts(n) => write!(f, "expected at most 2 parts, got {n}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// What an inbound text asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Help,
    Lookup(CourseQuery),
}

pub fn parse_query(text: &str) -> Result<CourseQuery, ParseError> {
    let parts: Vec<&str> = text.split(QUERY_SEPARATOR).collect();
    let (name, uni) = match parts.as_slice() {
        [name] => (*name, None),
        [name, uni] => (*name, Some(*uni)),
        _ => return Err(ParseError::TooManyParts(parts.len())),
    };

    if name.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let university = uni
        .map(|u| u.trim().to_uppercase())
        .filter(|u| !u.is_empty());

    Ok(CourseQuery {
        shortname: name.to_string(),
        university,
    })
}

pub fn parse_command(text: &str) -> Result<Command, ParseError> {
    // "/help@SomeBot" is how group chats address a specific bot
    let head = text.trim().split('@').next().unwrap_or_default();
    if head.eq_ignore_ascii_case("/start") || head.eq_ignore_ascii_case("/help") {
        return Ok(Command::Help);
    }
    parse_query(text).map(Command::Lookup)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_only_has_no_university() {
        let q = parse_query("Analysis I").unwrap();
        assert_eq!(q.shortname, "Analysis I");
        assert_eq!(q.university, None);
    }

    #[test]
    fn qualifier_is_uppercased_and_trimmed() {
        let q = parse_query("Analysis I, eth ").unwrap();
        assert_eq!(q.shortname, "Analysis I");
        assert_eq!(q.university.as_deref(), Some("ETH"));

        let q = parse_query("X,  Uzh").unwrap();
        assert_eq!(q.university.as_deref(), Some("UZH"));
    }

    #[test]
    fn shortname_is_verbatim() {
        let q = parse_query("cs101 ,ETH").unwrap();
        assert_eq!(q.shortname, "cs101 ");
    }

    #[test]
    fn blank_qualifier_is_dropped() {
        let q = parse_query("CS101,   ").unwrap();
        assert_eq!(q.university, None);
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(parse_query("a,b,c"), Err(ParseError::TooManyParts(3)));
        assert_eq!(parse_query("   "), Err(ParseError::Empty));
        assert_eq!(parse_query(", ETH"), Err(ParseError::Empty));
    }

    #[test]
    fn help_commands() {
        assert_eq!(parse_command("/start"), Ok(Command::Help));
        assert_eq!(parse_command(" /HELP "), Ok(Command::Help));
        assert_eq!(parse_command("/help@ReviewBot"), Ok(Command::Help));
        assert!(matches!(parse_command("CS101"), Ok(Command::Lookup(_))));
    }
}
