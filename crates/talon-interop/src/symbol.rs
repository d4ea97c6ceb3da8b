//! Declarative symbol tables
//!
//! A `SymbolTable` is the single source of truth for the native library's
//! callable surface: every adapter binds exactly the functions declared here
//! and nothing else. Adding, removing, or retyping a native function means
//! editing the table, never an adapter.

use crate::error::InteropError;
use crate::value::CType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One exported function: name, parameter types, return type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub name: String,
    pub args: Vec<CType>,
    pub returns: CType,
}

impl SymbolSpec {
    pub fn new(name: impl Into<String>, args: Vec<CType>, returns: CType) -> Self {
        Self {
            name: name.into(),
            args,
            returns,
        }
    }
}

impl fmt::Display for SymbolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.returns, self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Ordered, immutable set of symbol declarations
///
/// Built once and shared across adapters and library loads. Construction
/// rejects duplicate names and `void` parameters; after that the table never
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SymbolSpec>", into = "Vec<SymbolSpec>")]
pub struct SymbolTable {
    specs: Vec<SymbolSpec>,
}

impl SymbolTable {
    pub fn new(specs: Vec<SymbolSpec>) -> Result<Self, InteropError> {
        let mut seen = std::collections::HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.name.as_str()) {
                return Err(InteropError::DuplicateSymbol(spec.name.clone()));
            }
            if spec.args.contains(&CType::Void) {
                return Err(InteropError::InvalidArgument(format!(
                    "symbol '{}' declares a void parameter",
                    spec.name
                )));
            }
        }
        Ok(Self { specs })
    }

    pub fn get(&self, name: &str) -> Option<&SymbolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl TryFrom<Vec<SymbolSpec>> for SymbolTable {
    type Error = InteropError;

    fn try_from(specs: Vec<SymbolSpec>) -> Result<Self, Self::Error> {
        SymbolTable::new(specs)
    }
}

impl From<SymbolTable> for Vec<SymbolSpec> {
    fn from(table: SymbolTable) -> Self {
        table.specs
    }
}
