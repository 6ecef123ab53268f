pub mod config;
pub mod load;
pub mod output;
pub mod process;
pub mod queries;
pub mod schema;
pub mod table;

pub use queries::{QueryConfig, QueryResult, SalesPipeline};
pub use schema::{SalesColumn, SchemaMode};
pub use table::Table;
