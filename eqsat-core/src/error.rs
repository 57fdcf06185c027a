/*!

Error types returned at the boundaries of the engine (signature declaration, parsing/external
construction, type checking). Internal invariant violations — a contract the rest of this crate
is responsible for upholding, such as an out-of-range index — use [`invariant!`] and panic instead,
matching the teacher's `debug_assert!`-heavy style: a caller can't recover from a broken invariant,
so we don't pretend to with a `Result`.

*/

use std::fmt;
use eqsat_abs::IString;

use crate::types::TypeId;

/// A source location attached to a [`EngineError::Syntax`] error. `file` is `None` for input that
/// did not come from a named file (a REPL line, a generated term).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
  pub line:   u32,
  pub column: u32,
  pub file:   Option<IString>,
}

impl fmt::Display for SourcePosition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.file {
      Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
      None => write!(f, "{}:{}", self.line, self.column),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
  /// A symbol was declared with an arity or type that conflicts with a prior declaration of the
  /// same name.
  SignatureConflict {
    name:             IString,
    existing_arity:   u32,
    requested_arity:  u32,
  },

  /// A term was built from pieces whose types don't compose: an application of a non-function
  /// type, or an argument whose type doesn't match the corresponding parameter.
  TypeMismatch {
    expected: TypeId,
    found:    TypeId,
    context:  &'static str,
  },

  /// A name was referenced (as a symbol, sort, or variable) that hasn't been declared.
  UndeclaredName { name: IString },

  /// Malformed external input (e.g. from a parser this crate doesn't itself provide).
  Syntax {
    message:  String,
    position: Option<SourcePosition>,
  },
}

impl fmt::Display for EngineError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {

      EngineError::SignatureConflict { name, existing_arity, requested_arity } => {
        write!(
          f,
          "symbol `{}` already declared with arity {}, cannot redeclare with arity {}",
          name, existing_arity, requested_arity
        )
      }

      EngineError::TypeMismatch { expected, found, context } => {
        write!(f, "type mismatch in {}: expected {:?}, found {:?}", context, expected, found)
      }

      EngineError::UndeclaredName { name } => {
        write!(f, "undeclared name `{}`", name)
      }

      EngineError::Syntax { message, position } => {
        match position {
          Some(pos) => write!(f, "{}: {}", pos, message),
          None => write!(f, "{}", message),
        }
      }

    }
  }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;

/// Panics with a message identifying an internal invariant violation, mirroring the teacher's use
/// of `debug_assert!`/`unreachable!` for conditions that indicate a bug in this crate rather than
/// bad input from a caller.
macro_rules! invariant {
  ($cond:expr, $($arg:tt)+) => {
    if !$cond {
      panic!("internal invariant violated: {}", format!($($arg)+));
    }
  };
}

pub(crate) use invariant;
