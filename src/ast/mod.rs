pub mod builders;
pub mod operators;
pub mod predicate;
pub mod query;

pub use self::operators::{Operator, OperatorKind, OrderDirection, Terminal};
pub use self::predicate::{CompareOp, Predicate, StringMatch};
pub use self::query::{QueryDescription, Source};
