//! Traces of allocation requests.
//!
//! The textual format is the one of the malloc-lab traces:
//!
//! ```text
//! 20000       <- suggested heap size, ignored
//! 2           <- number of ids
//! 5           <- number of operations
//! 1           <- weight, ignored
//! a 0 512     <- allocate 512 bytes, as block 0
//! a 1 128
//! r 0 640     <- reallocate block 0 to 640 bytes
//! f 1         <- release block 1
//! f 0
//! ```
//!
//! The header is optional; blank lines, and lines starting with `#`, are skipped.

use std::{error, fmt, str::FromStr};

/// A single allocation request, with blocks identified by an arbitrary id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    /// Allocates `size` bytes, as block `id`.
    Allocate {
        /// Id of the block.
        id: usize,
        /// Number of bytes requested.
        size: usize,
    },
    /// Releases block `id`.
    Release {
        /// Id of the block.
        id: usize,
    },
    /// Reallocates block `id` to `size` bytes.
    Reallocate {
        /// Id of the block.
        id: usize,
        /// Number of bytes requested.
        size: usize,
    },
}

impl Operation {
    /// Returns the id of the block this operation applies to.
    pub fn id(&self) -> usize {
        match *self {
            Operation::Allocate { id, .. } | Operation::Release { id } | Operation::Reallocate { id, .. } => id,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Operation::Allocate { id, size } => write!(f, "a {} {}", id, size),
            Operation::Release { id } => write!(f, "f {}", id),
            Operation::Reallocate { id, size } => write!(f, "r {} {}", id, size),
        }
    }
}

/// A sequence of operations.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Trace {
    operations: Vec<Operation>,
}

impl Trace {
    /// Returns the operations, in order.
    pub fn operations(&self) -> &[Operation] { &self.operations }

    /// Returns the number of distinct ids which may be used, that is one more than the largest id.
    pub fn ids(&self) -> usize { self.operations.iter().map(|op| op.id() + 1).max().unwrap_or(0) }

    /// Returns the number of operations.
    pub fn len(&self) -> usize { self.operations.len() }

    /// Returns whether there is no operation.
    pub fn is_empty(&self) -> bool { self.operations.is_empty() }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for operation in &self.operations {
            writeln!(f, "{}", operation)?;
        }

        Ok(())
    }
}

impl FromStr for Trace {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut lines = text.lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .peekable();

        //  The header, if any, is made of 4 lone numbers.
        let mut expected = None;

        if let Some((_, first)) = lines.peek() {
            if first.parse::<usize>().is_ok() {
                let mut header = [0usize; 4];

                for value in header.iter_mut() {
                    let (line, text) = lines.next().ok_or(ParseError::TruncatedHeader)?;
                    *value = text.parse().map_err(|_| ParseError::InvalidHeader { line })?;
                }

                expected = Some(header[2]);
            }
        }

        let mut builder = TraceBuilder::new();

        for (line, text) in lines {
            builder.push(parse_operation(line, text)?);
        }

        let trace = builder.build();

        match expected {
            Some(expected) if expected != trace.len() =>
                Err(ParseError::CountMismatch { expected, actual: trace.len() }),
            _ => Ok(trace),
        }
    }
}

/// Builder of `Trace`.
///
/// ```
/// use nfmalloc_test::{Operation, TraceBuilder};
///
/// let trace = TraceBuilder::new().allocate(0, 100).reallocate(0, 200).release(0).build();
///
/// assert_eq!(3, trace.len());
/// assert_eq!(Operation::Release { id: 0 }, trace.operations()[2]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TraceBuilder {
    operations: Vec<Operation>,
}

impl TraceBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self { Self::default() }

    /// Appends an allocation.
    pub fn allocate(&mut self, id: usize, size: usize) -> &mut Self { self.push(Operation::Allocate { id, size }) }

    /// Appends a release.
    pub fn release(&mut self, id: usize) -> &mut Self { self.push(Operation::Release { id }) }

    /// Appends a reallocation.
    pub fn reallocate(&mut self, id: usize, size: usize) -> &mut Self { self.push(Operation::Reallocate { id, size }) }

    /// Appends an arbitrary operation.
    pub fn push(&mut self, operation: Operation) -> &mut Self {
        self.operations.push(operation);
        self
    }

    /// Creates the trace, leaving the builder empty.
    pub fn build(&mut self) -> Trace { Trace { operations: std::mem::take(&mut self.operations) } }
}

/// Error while parsing a `Trace`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The header has fewer than 4 lines.
    TruncatedHeader,
    /// A header line is not a number.
    InvalidHeader {
        /// Line number, starting from 1.
        line: usize,
    },
    /// An operation line is malformed.
    InvalidOperation {
        /// Line number, starting from 1.
        line: usize,
    },
    /// The header announced a different number of operations.
    CountMismatch {
        /// Number of operations announced.
        expected: usize,
        /// Number of operations found.
        actual: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::TruncatedHeader => write!(f, "truncated header"),
            ParseError::InvalidHeader { line } => write!(f, "invalid header at line {}", line),
            ParseError::InvalidOperation { line } => write!(f, "invalid operation at line {}", line),
            ParseError::CountMismatch { expected, actual } =>
                write!(f, "expected {} operations, found {}", expected, actual),
        }
    }
}

impl error::Error for ParseError {}

//  Parses a single "a id size", "f id", or "r id size" line.
fn parse_operation(line: usize, text: &str) -> Result<Operation, ParseError> {
    let invalid = || ParseError::InvalidOperation { line };

    let mut words = text.split_whitespace();

    let kind = words.next().ok_or_else(invalid)?;
    let mut number = || -> Result<usize, ParseError> {
        words.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())
    };

    let operation = match kind {
        "a" => Operation::Allocate { id: number()?, size: number()? },
        "f" => Operation::Release { id: number()? },
        "r" => Operation::Reallocate { id: number()?, size: number()? },
        _ => return Err(invalid()),
    };

    if words.next().is_some() {
        return Err(invalid());
    }

    Ok(operation)
}
