use crate::token::{Span, TokenKind};

pub type CompileResult<T> = Result<T, CompileError>;

/// A fatal compilation error. The first one raised aborts the pipeline;
/// there is no recovery and there are no warnings.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Span of the offending token; `None` when no token context exists
    /// (e.g. an I/O failure before lexing).
    pub span: Option<Span>,
}

#[derive(Debug, Clone)]
pub enum ErrorKind {
    UnexpectedCharacter(char),
    TokenExpected(TokenKind),
    PrimaryExpected,
    UndeclaredIdentifier(String),
    Redefinition(String),
    NotAssignable,
    IndirectionRequiresPointer,
    InvalidBinaryOperands,
    TooManyArguments,
    Io(String),
}

impl ErrorKind {
    fn message(&self) -> String {
        match self {
            ErrorKind::UnexpectedCharacter(c) => format!("unexpected character '{}'", c),
            ErrorKind::TokenExpected(kind) => format!("{} was expected", kind.describe()),
            ErrorKind::PrimaryExpected => "primary-expression was expected".to_string(),
            ErrorKind::UndeclaredIdentifier(name) => {
                format!("use of undeclared identifier '{}'", name)
            }
            ErrorKind::Redefinition(name) => format!("redefinition of '{}'", name),
            ErrorKind::NotAssignable => "expression is not assignable".to_string(),
            ErrorKind::IndirectionRequiresPointer => {
                "indirection requires pointer operand".to_string()
            }
            ErrorKind::InvalidBinaryOperands => {
                "invalid operands to binary expression".to_string()
            }
            ErrorKind::TooManyArguments => "too many arguments".to_string(),
            ErrorKind::Io(msg) => msg.clone(),
        }
    }
}

impl CompileError {
    pub fn at(kind: ErrorKind, span: Span) -> Self {
        CompileError { kind, span: Some(span) }
    }

    pub fn bare(kind: ErrorKind) -> Self {
        CompileError { kind, span: None }
    }

    /// Renders the diagnostic in the driver's stderr format:
    /// `<row>:<col>:<<lexeme>> Error: <text>.` with token context,
    /// `Error: <text>.` without.
    pub fn display_with_source(&self, source: &str) -> String {
        match self.span {
            Some(span) => {
                let (row, col) = position(source, span.start);
                let end = span.end.min(source.len());
                let lexeme = source.get(span.start..end).unwrap_or("");
                format!("{}:{}:<{}> Error: {}.", row, col, lexeme, self.kind.message())
            }
            None => format!("Error: {}.", self.kind.message()),
        }
    }
}

/// 1-based row and column of a byte offset.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let mut row = 1;
    let mut line_start = 0;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            row += 1;
            line_start = i + 1;
        }
    }
    (row, offset - line_start + 1)
}
