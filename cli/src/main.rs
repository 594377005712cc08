mod item;

use anyhow::{Context, Result};
use clap::Parser;
use item::DispensingItem;
use medsearch_core::{
    Combine, CriteriaDocument, CriterionSpec, Error, SearchCriteria, SearchOptions,
};
use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::PathBuf,
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Filter JSON-lines dispensing records with search criteria"
)]
struct Cli {
    /// Input JSON-lines file (use '-' for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Output JSON-lines file (use '-' for stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Criterion as field:operator:value, may be repeated
    #[arg(short, long = "filter", value_name = "FIELD:OP:VALUE")]
    filters: Vec<CriterionSpec>,

    /// JSON criteria document
    #[arg(short, long)]
    criteria: Option<PathBuf>,

    /// Match records satisfying any criterion instead of all of them
    #[arg(long)]
    any: bool,

    /// Print the SQL WHERE fragment to stderr
    #[arg(long)]
    sql: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn get_reader(input: &str) -> Result<Box<dyn Read>> {
    match input {
        "-" => Ok(Box::new(io::stdin())),
        path => Ok(Box::new(
            File::open(path).with_context(|| format!("failed to open {path}"))?,
        )),
    }
}

fn get_writer(output: &str) -> Result<Box<dyn Write>> {
    match output {
        "-" => Ok(Box::new(io::stdout())),
        path => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to create {path}"))?,
        )),
    }
}

fn build_criteria(cli: &Cli) -> Result<(SearchCriteria<DispensingItem>, SearchOptions)> {
    let schema = item::schema();
    let mut specs = cli.filters.clone();
    let mut combine = Combine::All;

    if let Some(path) = &cli.criteria {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let document = CriteriaDocument::from_json(&json)
            .with_context(|| format!("invalid criteria document {}", path.display()))?;
        combine = document.combine;
        specs.extend(document.criteria);
    }
    if cli.any {
        combine = Combine::Any;
    }

    let criteria = schema.criteria(&specs).map_err(|err| match err {
        Error::UnknownField(_) => {
            let known = schema.field_names().collect::<Vec<_>>().join(", ");
            anyhow::Error::new(err).context(format!("known fields: {known}"))
        }
        err => err.into(),
    })?;
    Ok((criteria, SearchOptions { combine }))
}

fn search(cli: &Cli) -> Result<usize> {
    let (criteria, options) = build_criteria(cli)?;
    let predicate = criteria.predicate(options)?;

    if cli.sql {
        match &predicate {
            Some(predicate) => eprintln!("WHERE {predicate}"),
            None => eprintln!("-- no criteria"),
        }
    }

    let reader = BufReader::new(get_reader(&cli.input)?);
    let mut writer = BufWriter::new(get_writer(&cli.output)?);
    let mut matched = 0;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let item: DispensingItem = serde_json::from_str(&line)
            .with_context(|| format!("invalid record on line {}", line_no + 1))?;
        if predicate.as_ref().map_or(true, |p| p.matches(&item)) {
            serde_json::to_writer(&mut writer, &item)?;
            writeln!(writer)?;
            matched += 1;
        }
    }
    writer.flush()?;

    log::debug!("{matched} records matched");
    Ok(matched)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let matched = search(&cli)?;
    if cli.output != "-" {
        eprintln!("Wrote {matched} matching records to {}", cli.output);
    } else {
        eprintln!("{matched} matching records");
    }
    Ok(())
}
