use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Audit names are ASCII letters and hyphens only.
const ASSERTION_PATTERN: &str = r"^([A-Za-z-]+)\s*([=<>])\s*([0-9]+(\.[0-9]+)?)$";

/// Comparison operator of an audit assertion.
///
/// `Greater` and `Lower` are inclusive: a score equal to the bound satisfies
/// both of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Lower,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Greater => ">",
            Self::Lower => "<",
        }
    }

    /// Returns true when `actual` satisfies this operator against `expected`.
    pub fn holds(self, actual: f64, expected: f64) -> bool {
        match self {
            Self::Equal => actual == expected,
            Self::Greater => actual >= expected,
            Self::Lower => actual <= expected,
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Equal),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Lower),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    #[error("Audit assertion string is null or empty.")]
    Empty,

    #[error("Audit assertion \"{input}\" is malformed.")]
    Malformed { input: String },
}

/// One parsed line of the assertion language, e.g. `first-contentful-paint > 0.9`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assertion {
    pub audit_name: String,
    pub operator: Operator,
    pub score: f64,
}

impl Assertion {
    pub fn parse(input: &str) -> Result<Self, AssertionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AssertionError::Empty);
        }

        let malformed = || AssertionError::Malformed {
            input: input.to_string(),
        };
        let captures = assertion_regex().captures(input).ok_or_else(malformed)?;

        let operator = Operator::from_symbol(&captures[2]).ok_or_else(malformed)?;
        let score = captures[3].parse::<f64>().map_err(|_| malformed())?;

        Ok(Self {
            audit_name: captures[1].to_string(),
            operator,
            score,
        })
    }
}

impl FromStr for Assertion {
    type Err = AssertionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.audit_name, self.operator, self.score)
    }
}

fn assertion_regex() -> &'static Regex {
    static ASSERTION_RE: OnceLock<Regex> = OnceLock::new();
    ASSERTION_RE.get_or_init(|| {
        Regex::new(ASSERTION_PATTERN).unwrap_or_else(|err| panic!("invalid assertion regex: {err}"))
    })
}
