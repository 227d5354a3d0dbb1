//! A line-oriented driver answering order-statistic queries.
//!
//! The input is a command count `N` followed by `N` commands, each a pair of integers
//! `value rank`. A positive `value` inserts it into the tree; any other value removes its
//! magnitude, if present. After each command the key at `rank` in the resulting tree is written on
//! its own line.
//!
//! ```
//! let input = "5\n40 0\n10 1\n4 1\n-10 0\n50 2\n";
//! let mut output = Vec::new();
//!
//! order_stat_avl::harness::run(input.as_bytes(), &mut output).unwrap();
//! assert_eq!(output, b"40\n40\n10\n4\n50\n");
//! ```

use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use crate::{error::HarnessError, AvlTree};

/// Runs every command read from `input`, writing one selected key per command to `output`.
///
/// Stops at the first malformed command or out-of-range rank. Output already produced by earlier
/// commands is kept.
pub fn run<R, W>(input: R, mut output: W) -> Result<(), HarnessError>
where
    R: BufRead,
    W: Write,
{
    let mut tokens = Tokens::new(input);

    let count: usize = parse(&tokens.next()?.ok_or(HarnessError::MissingCount)?)?;
    let mut tree = AvlTree::new();

    for command in 0..count {
        let value: i64 = parse(&tokens.expect(command, "value")?)?;
        let rank: usize = parse(&tokens.expect(command, "rank")?)?;

        if value > 0 {
            tree.insert(value.unsigned_abs());
        } else {
            tree.remove(&value.unsigned_abs());
        }

        tracing::debug!(command, value, rank, len = tree.len(), "applied command");

        let key = tree
            .select(rank)
            .map_err(|source| HarnessError::Select { command, source })?;
        writeln!(output, "{key}")?;
    }

    output.flush()?;

    Ok(())
}

fn parse<T: FromStr>(token: &str) -> Result<T, HarnessError> {
    token.parse().map_err(|_| HarnessError::InvalidToken {
        token: token.to_owned(),
    })
}

// Whitespace-separated tokens, read one line at a time.
struct Tokens<R> {
    input: R,
    line: String,
    pending: Vec<String>,
}

impl<R: BufRead> Tokens<R> {
    fn new(input: R) -> Self {
        Tokens {
            input,
            line: String::new(),
            pending: Vec::new(),
        }
    }

    fn next(&mut self) -> Result<Option<String>, HarnessError> {
        while self.pending.is_empty() {
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }

            // Reversed so that `pop` yields tokens in order.
            self.pending = self
                .line
                .split_whitespace()
                .rev()
                .map(str::to_owned)
                .collect();
        }

        Ok(self.pending.pop())
    }

    fn expect(&mut self, command: usize, what: &'static str) -> Result<String, HarnessError> {
        self.next()?
            .ok_or(HarnessError::MissingToken { command, what })
    }
}
