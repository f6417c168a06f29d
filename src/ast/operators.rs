use crate::ast::predicate::Predicate;

/// Sort direction of an ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// Operators that trigger execution instead of extending the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    ToList,
    /// `COUNT(*)`, optionally with an extra predicate.
    Count(Option<Predicate>),
    First(Option<Predicate>),
    FirstOrDefault(Option<Predicate>),
}

impl Terminal {
    /// The predicate passed directly to the terminal, if any.
    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Terminal::ToList => None,
            Terminal::Count(p) | Terminal::First(p) | Terminal::FirstOrDefault(p) => p.as_ref(),
        }
    }

    pub fn is_first(&self) -> bool {
        matches!(self, Terminal::First(_) | Terminal::FirstOrDefault(_))
    }
}

/// One step of a query pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// Narrow the result set. Repeated filters are AND-ed.
    Filter(Predicate),
    /// Start a new ordering, discarding earlier keys.
    OrderBy {
        key: Predicate,
        direction: OrderDirection,
    },
    /// Add a secondary key to the current ordering.
    ThenBy {
        key: Predicate,
        direction: OrderDirection,
    },
    Skip(u64),
    Take(u64),
    /// Restrict the selected columns. The last one in a chain wins.
    SelectOnly(Vec<String>),
    Terminal(Terminal),
}

/// Flat discriminant of [`Operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Filter,
    OrderBy,
    OrderByDescending,
    ThenBy,
    ThenByDescending,
    Skip,
    Take,
    SelectOnly,
    Count,
    First,
    FirstOrDefault,
    ToList,
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Filter(_) => OperatorKind::Filter,
            Operator::OrderBy {
                direction: OrderDirection::Asc,
                ..
            } => OperatorKind::OrderBy,
            Operator::OrderBy {
                direction: OrderDirection::Desc,
                ..
            } => OperatorKind::OrderByDescending,
            Operator::ThenBy {
                direction: OrderDirection::Asc,
                ..
            } => OperatorKind::ThenBy,
            Operator::ThenBy {
                direction: OrderDirection::Desc,
                ..
            } => OperatorKind::ThenByDescending,
            Operator::Skip(_) => OperatorKind::Skip,
            Operator::Take(_) => OperatorKind::Take,
            Operator::SelectOnly(_) => OperatorKind::SelectOnly,
            Operator::Terminal(Terminal::Count(_)) => OperatorKind::Count,
            Operator::Terminal(Terminal::First(_)) => OperatorKind::First,
            Operator::Terminal(Terminal::FirstOrDefault(_)) => OperatorKind::FirstOrDefault,
            Operator::Terminal(Terminal::ToList) => OperatorKind::ToList,
        }
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperatorKind::Filter => "Where",
            OperatorKind::OrderBy => "OrderBy",
            OperatorKind::OrderByDescending => "OrderByDescending",
            OperatorKind::ThenBy => "ThenBy",
            OperatorKind::ThenByDescending => "ThenByDescending",
            OperatorKind::Skip => "Skip",
            OperatorKind::Take => "Take",
            OperatorKind::SelectOnly => "SelectOnly",
            OperatorKind::Count => "Count",
            OperatorKind::First => "First",
            OperatorKind::FirstOrDefault => "FirstOrDefault",
            OperatorKind::ToList => "ToList",
        };
        write!(f, "{}", name)
    }
}
