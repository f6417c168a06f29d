use std::str::FromStr;

use serde::Deserialize;

use crate::error::ShadowError;
use crate::value::Value;

/// Supported SQL dialects.
///
/// `SqlServer` is the reference output. `Postgres` exists so translated
/// queries can run through the bundled sqlx backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    SqlServer,
    Postgres,
}

impl Dialect {
    /// Placeholder text for a parameter. `position` is 1-based.
    pub fn placeholder(&self, name: &str, position: usize) -> String {
        match self {
            Dialect::SqlServer => name.to_string(),
            Dialect::Postgres => format!("${}", position),
        }
    }

    /// Whether `SELECT TOP n` is available.
    pub fn supports_top(&self) -> bool {
        matches!(self, Dialect::SqlServer)
    }

    /// Parameter value for a boolean comparison. SQL Server compares `bit`
    /// columns against 1/0; Postgres needs a real boolean.
    pub fn bool_value(&self, value: bool) -> Value {
        match self {
            Dialect::SqlServer => Value::Int32(i32::from(value)),
            Dialect::Postgres => Value::Bool(value),
        }
    }

    /// Whether `EXEC` batches with return codes are available.
    pub fn supports_stored_procedures(&self) -> bool {
        matches!(self, Dialect::SqlServer)
    }
}

impl FromStr for Dialect {
    type Err = ShadowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(ShadowError::Config(format!("unknown dialect '{}'", other))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::SqlServer => write!(f, "sqlserver"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}
