//! SMT solvers under evaluation.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Unknown solver name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown solver '{0}' (expected cvc5 or z3)")]
pub struct UnknownSolver(pub String);

/// SMT solver under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solver {
    /// cvc5, whose tests are registered with ctest.
    Cvc5,
    /// Z3, whose tests live in the z3test repository.
    Z3,
}

impl Solver {
    /// Lowercase name used in object keys and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cvc5 => "cvc5",
            Self::Z3 => "z3",
        }
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Solver {
    type Err = UnknownSolver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cvc5" => Ok(Self::Cvc5),
            "z3" => Ok(Self::Z3),
            other => Err(UnknownSolver(other.to_string())),
        }
    }
}
