use clap::Parser;
use std::path::PathBuf;

use crate::queries::QueryConfig;
use crate::schema::SchemaMode;

#[derive(Parser, Debug, Clone)]
#[command(name = "salescrunch")]
#[command(about = "Clean a retail sales CSV and print the standard sales report")]
pub struct Args {
    /// Sales CSV file (header row required)
    #[arg(short, long, env = "SALES_CSV")]
    pub input: PathBuf,

    /// Load every column as text instead of inferring types
    #[arg(long)]
    pub all_text: bool,

    /// Rows kept by the top/bottom rankings
    #[arg(long, default_value_t = 5)]
    pub top_n: usize,

    /// Rows shown in the post-load preview
    #[arg(long, default_value_t = 20)]
    pub preview_rows: usize,

    /// Also write every result as <name>.parquet into this directory
    #[arg(short, long, env = "SALES_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Allowed |calculated_sales - Total Sales| before a row is reported
    #[arg(long, default_value_t = 0.01)]
    pub tolerance: f64,

    #[arg(long, default_value = "Northeast")]
    pub region: String,

    #[arg(long, default_value = "Online")]
    pub sales_method: String,

    /// Units Sold threshold (strictly greater than)
    #[arg(long, default_value_t = 1000)]
    pub min_units: i64,

    /// LIKE pattern matched against Product
    #[arg(long, default_value = "%Footwear%")]
    pub product_pattern: String,

    #[arg(long, default_value_t = 2021)]
    pub year: i64,
}

impl Args {
    pub fn schema_mode(&self) -> SchemaMode {
        if self.all_text {
            SchemaMode::AllText
        } else {
            SchemaMode::Inferred
        }
    }

    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            region: self.region.clone(),
            sales_method: self.sales_method.clone(),
            min_units: self.min_units,
            product_pattern: self.product_pattern.clone(),
            year: self.year,
            top_n: self.top_n,
        }
    }
}
