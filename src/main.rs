use anyhow::{Context, Result};
use clap::Parser;
use salescrunch::{
    config::Args,
    load::load_sales_csv,
    output,
    process::derive::sales_discrepancies,
    schema::describe_schema,
    SalesPipeline,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr) // stdout carries the report
        .init();

    let args = Args::parse();
    let mode = args.schema_mode();
    let cfg = args.query_config();
    info!(input = %args.input.display(), ?mode, "startup");

    // ─── 2) load + schema ────────────────────────────────────────────
    let raw = load_sales_csv(&args.input, mode)?;
    println!("{}", describe_schema(&raw.schema()));
    println!("{}", output::render(&raw.limit(args.preview_rows))?);

    // ─── 3) clean + derive ───────────────────────────────────────────
    let pipeline = SalesPipeline::prepare(&raw)?;
    println!("{}", describe_schema(&pipeline.table().schema()));

    let mismatches = sales_discrepancies(pipeline.table(), args.tolerance)?;
    if mismatches.num_rows() > 0 {
        warn!(
            rows = mismatches.num_rows(),
            tolerance = args.tolerance,
            "calculated_sales differs from Total Sales"
        );
    }

    // ─── 4) queries ──────────────────────────────────────────────────
    let results = pipeline.run_all(&cfg)?;
    for result in &results {
        println!("== {} ({} rows)", result.name, result.table.num_rows());
        println!("{}", output::render(&result.table)?);

        if let Some(dir) = &args.out_dir {
            let path = output::write_parquet(&result.table, dir, result.name)
                .with_context(|| format!("saving {}", result.name))?;
            info!(query = result.name, path = %path.display(), "saved");
        }
    }

    info!(queries = results.len(), "all done");
    Ok(())
}
