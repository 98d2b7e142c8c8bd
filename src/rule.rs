use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, SimpleResult};

/// Parsed form of a firing rule `requires/consumes->produces;delay`, where the
/// first three groups are runs of the spike symbol `a` and `delay` is a
/// non-negative decimal number of ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub requires: u32,
    pub consumes: u32,
    pub produces: u32,
    pub delay: u32,
}

const SPIKE_SYMBOL: u8 = b'a';

struct Cursor<'a> {
    text: &'a str,
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn error(&self, what: &str) -> SimpleError {
        SimpleError::new(format!(
            "invalid rule '{}': {} at position {}",
            self.text,
            what,
            self.text.len() - self.rest.len()
        ))
    }

    fn take_spike_run(&mut self, group: &str) -> SimpleResult<u32> {
        let len = self
            .rest
            .bytes()
            .take_while(|byte| *byte == SPIKE_SYMBOL)
            .count();

        if len == 0 {
            return Err(self.error(&format!("expected at least one 'a' for {}", group)));
        }

        let count = u32::try_from(len).map_err(|_| self.error(&format!("{} too large", group)))?;
        self.rest = &self.rest[len..];
        Ok(count)
    }

    fn expect(&mut self, separator: &str) -> SimpleResult<()> {
        match self.rest.strip_prefix(separator) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(self.error(&format!("expected '{}'", separator))),
        }
    }

    fn take_delay(&mut self) -> SimpleResult<u32> {
        let len = self
            .rest
            .bytes()
            .take_while(|byte| byte.is_ascii_digit())
            .count();

        if len == 0 {
            return Err(self.error("expected a decimal delay"));
        }

        let delay = self.rest[..len]
            .parse::<u32>()
            .map_err(|_| self.error("delay out of range"))?;
        self.rest = &self.rest[len..];
        Ok(delay)
    }
}

/// Parses rule text. Any deviation from the grammar, including surrounding
/// whitespace, yields an error; a partially matching rule is never returned.
pub fn parse(text: &str) -> SimpleResult<Rule> {
    let mut cursor = Cursor { text, rest: text };

    let requires = cursor.take_spike_run("requires")?;
    cursor.expect("/")?;
    let consumes = cursor.take_spike_run("consumes")?;
    cursor.expect("->")?;
    let produces = cursor.take_spike_run("produces")?;
    cursor.expect(";")?;
    let delay = cursor.take_delay()?;

    if !cursor.rest.is_empty() {
        return Err(cursor.error("unexpected trailing characters"));
    }

    Ok(Rule {
        requires,
        consumes,
        produces,
        delay,
    })
}

/// True only if every rule in the list parses. An empty list is valid.
pub fn validate_all<S: AsRef<str>>(rules: &[S]) -> bool {
    rules.iter().all(|rule| parse(rule.as_ref()).is_ok())
}

impl FromStr for Rule {
    type Err = SimpleError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse(text)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spikes = |count: u32| "a".repeat(count as usize);
        write!(
            f,
            "{}/{}->{};{}",
            spikes(self.requires),
            spikes(self.consumes),
            spikes(self.produces),
            self.delay
        )
    }
}
