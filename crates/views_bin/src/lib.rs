//! Command line access to the views scanner.
pub mod args;

use std::io::Write;

use anyhow::{Context, Result, anyhow};
use args::{Arguments, OutputFormat};
use schema_views::{Batch, PollPull, Projections, ScanConfig, ScanRequest, SchemaViewsScanner};
use serde::Serialize;
use serde::ser::SerializeMap;
use tracing::info;
use viewcatalog::{CatalogClient, MemoryCatalog};

impl Arguments {
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            db_pattern: self.db.clone(),
            view_pattern: self.wild.clone(),
            current_user_ident: self.current_user.clone(),
            user: self.user.clone(),
            user_ip: self.user_ip.clone(),
        }
    }
}

/// Load the catalog named by the arguments and write all matching rows.
pub fn run(args: &Arguments, out: &mut impl Write) -> Result<()> {
    let catalog = MemoryCatalog::from_json_file(&args.catalog)
        .with_context(|| format!("failed to load catalog from {}", args.catalog.display()))?;
    scan_to_writer(catalog, args, out)
}

pub fn scan_to_writer<C: CatalogClient>(
    client: C,
    args: &Arguments,
    out: &mut impl Write,
) -> Result<()> {
    let mut scanner = SchemaViewsScanner::try_new(
        client,
        ScanConfig {
            batch_size: args.batch_size,
        },
    )?;
    scanner.initialize(&args.scan_request())?;

    let projections = if args.columns.is_empty() {
        Projections::all(scanner.schema())
    } else {
        Projections::try_from_names(scanner.schema(), &args.columns)?
    };
    let names: Vec<String> = projections
        .indices()
        .iter()
        .map(|&idx| scanner.schema().fields[idx].name.clone())
        .collect();

    let mut batch = Batch::new(projections, args.batch_size);
    let mut rows: Vec<Vec<String>> = Vec::new();

    while scanner.produce_batch(&mut batch)? == PollPull::HasMore {
        for row_idx in 0..batch.num_rows() {
            let row = batch
                .row(row_idx)
                .ok_or_else(|| anyhow!("missing row {row_idx}"))?;
            rows.push(
                row.into_iter()
                    .map(|v| v.unwrap_or_default().to_string())
                    .collect(),
            );
        }
    }

    info!(num_rows = rows.len(), "scan complete");

    match args.format {
        OutputFormat::Text => write_text(out, &names, &rows)?,
        OutputFormat::Json => write_json(out, &names, &rows)?,
    }
    out.flush()?;

    Ok(())
}

fn write_text(out: &mut impl Write, names: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = names.iter().map(|n| n.len()).collect();
    for row in rows {
        for (width, value) in widths.iter_mut().zip(row) {
            *width = usize::max(*width, value.len());
        }
    }

    write_line(out, names, &widths)?;
    let sep: Vec<_> = widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", sep.join("-+-"))?;
    for row in rows {
        write_line(out, row, &widths)?;
    }

    Ok(())
}

fn write_line(out: &mut impl Write, values: &[String], widths: &[usize]) -> std::io::Result<()> {
    let line: Vec<_> = values
        .iter()
        .zip(widths)
        .map(|(v, &w)| format!("{v:<w$}"))
        .collect();
    writeln!(out, "{}", line.join(" | ").trim_end())
}

/// A row serialized as a json object with keys in output column order.
struct JsonRow<'a> {
    names: &'a [String],
    values: &'a [String],
}

impl Serialize for JsonRow<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, value) in self.names.iter().zip(self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

fn write_json(out: &mut impl Write, names: &[String], rows: &[Vec<String>]) -> Result<()> {
    for row in rows {
        serde_json::to_writer(&mut *out, &JsonRow { names, values: row })?;
        writeln!(out)?;
    }
    Ok(())
}
