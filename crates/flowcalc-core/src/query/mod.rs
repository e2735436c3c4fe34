//! SELECT assembly for DataFlow formulas and the async executor seam.

mod builder;
mod executor;

pub use builder::{NamedFormula, QueryBuilder, QueryOptions};
pub use executor::{ExecutorError, QueryExecutor, Row};
