//! Predicate expressions.

use crate::value::Value;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// The operator that selects exactly the complementary rows.
    pub fn negate(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
        }
    }

    /// Equality operators accept `NULL` and strings; the rest need ordered values.
    pub fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }

    pub fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql())
    }
}

/// String pattern operator, lowered to `LIKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    Contains,
    StartsWith,
    EndsWith,
}

impl StringMatch {
    /// Wrap a literal in the `%` wildcards for this match kind.
    pub fn pattern(self, literal: &str) -> String {
        match self {
            StringMatch::Contains => format!("%{}%", literal),
            StringMatch::StartsWith => format!("{}%", literal),
            StringMatch::EndsWith => format!("%{}", literal),
        }
    }
}

/// Boolean condition over row members and constants.
///
/// Leaves are only [`Predicate::Member`] and [`Predicate::Literal`].
/// A comparison relates one member to one constant; two members are never
/// compared with each other.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A column of the queried source.
    Member(String),
    /// A constant, always bound as a parameter.
    Literal(Value),
    Not(Box<Predicate>),
    /// Grouped conjunction, rendered `(left AND right)`.
    And(Box<Predicate>, Box<Predicate>),
    /// Grouped disjunction, rendered `(left OR right)`.
    Or(Box<Predicate>, Box<Predicate>),
    /// Ungrouped conjunction, rendered `left AND right`.
    BitAnd(Box<Predicate>, Box<Predicate>),
    /// Ungrouped disjunction, rendered `left OR right`.
    BitOr(Box<Predicate>, Box<Predicate>),
    Compare {
        op: CompareOp,
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    StringOp {
        kind: StringMatch,
        member: String,
        literal: String,
    },
    InSet {
        member: String,
        values: Vec<Value>,
    },
    /// Boolean column test; `None` tests for `NULL`.
    BoolEquals {
        member: String,
        value: Option<bool>,
    },
}

impl Predicate {
    pub fn member(name: impl Into<String>) -> Self {
        Predicate::Member(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Predicate::Literal(value.into())
    }

    pub fn compare(op: CompareOp, left: Predicate, right: Predicate) -> Self {
        Predicate::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn bit_and(self, other: Predicate) -> Self {
        Predicate::BitAnd(Box::new(self), Box::new(other))
    }

    pub fn bit_or(self, other: Predicate) -> Self {
        Predicate::BitOr(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// The member name if this is a `Member` leaf.
    pub fn as_member(&self) -> Option<&str> {
        match self {
            Predicate::Member(name) => Some(name),
            _ => None,
        }
    }
}
