// src/queries/mod.rs
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::load::load_sales_csv;
use crate::process::{clean_sales, derive};
use crate::schema::{SalesColumn, SchemaMode};
use crate::table::{Aggregate, Predicate, SortKey, Table};

/// Parameters of the query set; defaults reproduce the stock report.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    pub region: String,
    pub sales_method: String,
    pub min_units: i64,
    pub product_pattern: String,
    pub year: i64,
    pub top_n: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            region: "Northeast".into(),
            sales_method: "Online".into(),
            min_units: 1000,
            product_pattern: "%Footwear%".into(),
            year: 2021,
            top_n: 5,
        }
    }
}

/// A named query output, ready for a sink.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub name: &'static str,
    pub table: Table,
}

/// The sales report: one cleaned, derived table and the queries over it.
#[derive(Debug, Clone)]
pub struct SalesPipeline {
    table: Table,
}

impl SalesPipeline {
    /// Clean and derive a freshly loaded table.
    pub fn prepare(raw: &Table) -> Result<Self> {
        let cleaned = clean_sales(raw).context("cleaning sales columns")?;
        let table = derive::derive_all(&cleaned).context("deriving sales columns")?;
        debug!(rows = table.num_rows(), "pipeline prepared");
        Ok(Self { table })
    }

    /// Load `path` and prepare it.
    pub fn from_path<P: AsRef<Path>>(path: P, mode: SchemaMode) -> Result<Self> {
        let raw = load_sales_csv(path, mode)?;
        Self::prepare(&raw)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    // ─── filters ─────────────────────────────────────────────────────

    pub fn by_region(&self, region: &str) -> Result<Table> {
        self.table
            .filter(&Predicate::eq(SalesColumn::Region.name(), region))
    }

    pub fn by_sales_method(&self, method: &str) -> Result<Table> {
        self.table
            .filter(&Predicate::eq(SalesColumn::SalesMethod.name(), method))
    }

    pub fn units_above(&self, min_units: i64) -> Result<Table> {
        self.table
            .filter(&Predicate::gt(SalesColumn::UnitsSold.name(), min_units))
    }

    pub fn product_like(&self, pattern: &str) -> Result<Table> {
        self.table
            .filter(&Predicate::like(SalesColumn::Product.name(), pattern))
    }

    pub fn invoiced_in(&self, year: i64) -> Result<Table> {
        self.table
            .filter(&Predicate::eq(SalesColumn::YearOfInvoice.name(), year))
    }

    // ─── aggregations ────────────────────────────────────────────────

    fn grouped(&self, key: SalesColumn, agg: Aggregate) -> Result<Table> {
        self.table.group_by(key.name())?.agg(&[agg])
    }

    pub fn total_sales_by_region(&self) -> Result<Table> {
        self.grouped(
            SalesColumn::Region,
            Aggregate::sum(SalesColumn::TotalSales.name(), "total_sales_by_region"),
        )
    }

    pub fn total_sales_by_retailer(&self) -> Result<Table> {
        self.grouped(
            SalesColumn::Retailer,
            Aggregate::sum(SalesColumn::TotalSales.name(), "total_sales_by_retailer"),
        )
    }

    pub fn average_profit_by_product(&self) -> Result<Table> {
        self.grouped(
            SalesColumn::Product,
            Aggregate::avg(
                SalesColumn::OperatingProfit.name(),
                "average_profit_by_product",
            ),
        )
    }

    pub fn total_units_by_sales_method(&self) -> Result<Table> {
        self.grouped(
            SalesColumn::SalesMethod,
            Aggregate::sum(SalesColumn::UnitsSold.name(), "total_units_by_sales_method"),
        )
    }

    pub fn transactions_by_state(&self) -> Result<Table> {
        self.grouped(SalesColumn::State, Aggregate::count_all("total_txn"))
    }

    // ─── rankings ────────────────────────────────────────────────────

    pub fn top_sales(&self, n: usize) -> Result<Table> {
        self.table
            .top_n(&[SortKey::desc(SalesColumn::TotalSales.name())], n)
    }

    pub fn bottom_profit(&self, n: usize) -> Result<Table> {
        self.table
            .top_n(&[SortKey::asc(SalesColumn::OperatingProfit.name())], n)
    }

    pub fn by_year_then_sales(&self) -> Result<Table> {
        self.table.order_by(&[
            SortKey::asc(SalesColumn::YearOfInvoice.name()),
            SortKey::desc(SalesColumn::TotalSales.name()),
        ])
    }

    // ─── business questions ──────────────────────────────────────────

    /// Group by `key`, sum `value` into `alias`, keep the single largest group.
    pub fn top_group(&self, key: SalesColumn, value: SalesColumn, alias: &str) -> Result<Table> {
        self.table
            .group_by(key.name())?
            .agg(&[Aggregate::sum(value.name(), alias)])?
            .top_n(&[SortKey::desc(alias)], 1)
    }

    pub fn top_retailer_by_sales(&self) -> Result<Table> {
        self.top_group(SalesColumn::Retailer, SalesColumn::TotalSales, "total_sales")
    }

    pub fn top_product_by_units(&self) -> Result<Table> {
        self.top_group(SalesColumn::Product, SalesColumn::UnitsSold, "total_units")
    }

    pub fn top_region_by_profit(&self) -> Result<Table> {
        self.top_group(SalesColumn::Region, SalesColumn::OperatingProfit, "profit")
    }

    pub fn top_sales_method_by_sales(&self) -> Result<Table> {
        self.top_group(SalesColumn::SalesMethod, SalesColumn::TotalSales, "total_sales")
    }

    /// Every query of the report, in presentation order.
    pub fn run_all(&self, cfg: &QueryConfig) -> Result<Vec<QueryResult>> {
        let mut results = Vec::new();
        let mut push = |name: &'static str, table: Result<Table>| -> Result<()> {
            let table = table.with_context(|| format!("running query {}", name))?;
            debug!(query = name, rows = table.num_rows(), "query done");
            results.push(QueryResult { name, table });
            Ok(())
        };

        push("region_filter", self.by_region(&cfg.region))?;
        push("sales_method_filter", self.by_sales_method(&cfg.sales_method))?;
        push("units_sold_filter", self.units_above(cfg.min_units))?;
        push("product_filter", self.product_like(&cfg.product_pattern))?;
        push("invoice_year_filter", self.invoiced_in(cfg.year))?;

        push("total_sales_by_region", self.total_sales_by_region())?;
        push("total_sales_by_retailer", self.total_sales_by_retailer())?;
        push("average_profit_by_product", self.average_profit_by_product())?;
        push("total_units_by_sales_method", self.total_units_by_sales_method())?;
        push("transactions_by_state", self.transactions_by_state())?;

        push("top_total_sales", self.top_sales(cfg.top_n))?;
        push("bottom_operating_profit", self.bottom_profit(cfg.top_n))?;
        push("by_year_then_sales", self.by_year_then_sales())?;

        push("top_retailer", self.top_retailer_by_sales())?;
        push("top_product", self.top_product_by_units())?;
        push("top_region", self.top_region_by_profit())?;
        push("top_sales_method", self.top_sales_method_by_sales())?;

        info!(queries = results.len(), "report complete");
        Ok(results)
    }
}
