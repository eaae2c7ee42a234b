use std::fmt::Display;

/// Broad classes of failure reported by the engine.
///
/// None of them is fatal: the caller keeps its previous structure and shows
/// the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Grammar or regex text does not match the supported syntax
    Syntax,
    /// Well-formed text that breaks a grammar rule (misplaced epsilon, ...)
    Semantic,
    /// A transition cell edit that is not a destination-state list
    IllFormedEdit,
    /// An operation was requested on an operand it does not accept
    Precondition,
}

pub trait ErrorType: Display + PartialEq {
    fn kind(&self) -> ErrorKind;
}

/// Where in the source text an error was found. Zero means "the whole input".
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn line(line: usize) -> Self {
        Location { line, column: 0 }
    }

    pub fn column(column: usize) -> Self {
        Location { line: 0, column }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column) {
            (0, 0) => write!(f, "input"),
            (line, 0) => write!(f, "line {}", line),
            (0, column) => write!(f, "column {}", column),
            (line, column) => write!(f, "{}:{}", line, column),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T,
}

impl<T: ErrorType> Error<T> {
    pub fn new(error: T) -> Self {
        Error {
            location: Location::default(),
            error,
        }
    }

    pub fn at(location: Location, error: T) -> Self {
        Error { location, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.location, self.error)
    }
}

impl<T: ErrorType + std::fmt::Debug> std::error::Error for Error<T> {}
