use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrackError;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
/// ASCII punctuation, in code point order.
const SYMBOLS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// The fixed set of alphabets a brute-force or hybrid attack can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Charset {
    Lower,
    Upper,
    Digits,
    Symbols,
    Letters,
    Alphanumeric,
    All,
}

impl Charset {
    pub const ALL_SETS: [Charset; 7] = [
        Charset::Lower,
        Charset::Upper,
        Charset::Digits,
        Charset::Symbols,
        Charset::Letters,
        Charset::Alphanumeric,
        Charset::All,
    ];

    /// The characters of this set, in enumeration order.
    pub fn chars(self) -> Vec<char> {
        let parts: &[&str] = match self {
            Charset::Lower => &[LOWERCASE],
            Charset::Upper => &[UPPERCASE],
            Charset::Digits => &[DIGITS],
            Charset::Symbols => &[SYMBOLS],
            Charset::Letters => &[LOWERCASE, UPPERCASE],
            Charset::Alphanumeric => &[LOWERCASE, UPPERCASE, DIGITS],
            Charset::All => &[LOWERCASE, UPPERCASE, DIGITS, SYMBOLS],
        };
        parts.iter().flat_map(|part| part.chars()).collect()
    }

    pub fn len(self) -> usize {
        self.chars().len()
    }

    pub fn name(self) -> &'static str {
        match self {
            Charset::Lower => "lower",
            Charset::Upper => "upper",
            Charset::Digits => "digits",
            Charset::Symbols => "symbols",
            Charset::Letters => "letters",
            Charset::Alphanumeric => "alphanumeric",
            Charset::All => "all",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = CrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lower" | "lowercase" => Ok(Charset::Lower),
            "upper" | "uppercase" => Ok(Charset::Upper),
            "digits" | "digit" => Ok(Charset::Digits),
            "symbols" | "symbol" | "punctuation" => Ok(Charset::Symbols),
            "letters" => Ok(Charset::Letters),
            "alphanumeric" | "alnum" => Ok(Charset::Alphanumeric),
            "all" | "printable" | "all-printable" => Ok(Charset::All),
            other => Err(CrackError::config(format!("unknown charset '{other}'"))),
        }
    }
}

impl TryFrom<String> for Charset {
    type Error = CrackError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}
