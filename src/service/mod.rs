//! TableService: generic table operations using the safe SQL builder.

mod table;
pub use table::{MutationSummary, TableService};
