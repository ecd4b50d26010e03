//! Route tables: the table-access API and the common service routes.

mod common;
mod table;
pub use common::{common_routes, common_routes_with_ready};
pub use table::api_routes;
