use crate::cli::{Args, Command, DatasetArgs};
use anyhow::{bail, Context};
use clap::Parser;
use rdf_spatial_compose::{compose_from_input, ComposeInput};
use rdf_spatial_convert::gtfs::{GtfsFeed, GtfsOptions};
use rdf_spatial_convert::kml::{extract_kmz, KmlDataset};
use rdf_spatial_convert::{
    ColumnMapping, ConvertError, CsvDataset, Dataset, DatasetSource, Election, ValueKind,
    ValueMapping, ValueRule, ValuesMapping,
};
use rdf_spatial_model::{
    create_aux_geo_file, create_bz2_file, finish_bz2_file, IdGenerator, PrefixRegistry, Term,
    TripleSink, TurtleWriter,
};
use rdf_spatial_web::ServerConfig;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Csv2rdf {
            dataset: args,
            separator,
            quote,
            primary_col,
            column_mapping,
            values_mapping,
            additional_prefixes,
        } => {
            let mut prefixes = primary_prefixes(&args)?;
            if let Some(additional) = additional_prefixes {
                let additional: BTreeMap<String, String> = serde_json::from_str(&additional)
                    .context("--additional-prefixes must be a JSON object of strings")?;
                for (prefix, iri) in additional {
                    prefixes.declare(&prefix, &iri)?;
                }
            }
            let column_mapping: ColumnMapping = match column_mapping {
                Some(json) => serde_json::from_str(&json)
                    .context("--column-mapping must be a JSON object of strings or null")?,
                None => ColumnMapping::new(),
            };
            let values_mapping = match values_mapping {
                Some(json) => parse_values_mapping(&json)?,
                None => ValuesMapping::new(),
            };

            let mut dataset = CsvDataset::new(dataset_source(&args)?)
                .with_separator(single_byte("--separator", &separator)?)
                .with_quote(single_byte("--quote", &quote)?)
                .with_column_mapping(column_mapping)
                .with_primary_col(primary_col)
                .with_values_mapping(values_mapping);
            convert_dataset(&mut dataset, &prefixes, &args.output, None)
        }
        Command::Kml2rdf {
            dataset: mut args,
            aux_geo,
            kmz,
        } => {
            let prefixes = primary_prefixes(&args)?;
            if kmz {
                args.input = extract_kmz(&args.input)?;
            } else if args.input.extension().is_some_and(|e| e == "kmz") {
                warn!("Input filename ends with .kmz, but option --kmz is not given. Treating as KML.");
            }
            let mut dataset = KmlDataset::new(dataset_source(&args)?);
            convert_dataset(&mut dataset, &prefixes, &args.output, aux_geo.as_deref())
        }
        Command::Gtfs2rdf {
            feed,
            input,
            output,
            output_aux_geo,
            exclude,
            add_linestrings,
            skip_prefixes,
            workdir,
        } => {
            fs::create_dir_all(&workdir)
                .with_context(|| format!("Cannot create work directory {}", workdir.display()))?;
            let options = GtfsOptions {
                excludes: exclude,
                add_linestrings,
                workdir,
            };
            let mut gtfs = GtfsFeed::new(&feed, input, options)?;
            gtfs.get_all_data()?;

            let prefixes = if skip_prefixes {
                PrefixRegistry::empty()
            } else {
                let mut prefixes = PrefixRegistry::new();
                GtfsFeed::register_prefixes(&mut prefixes)?;
                prefixes
            };
            let ids = IdGenerator::new();
            write_turtle(&output, output_aux_geo.as_deref(), &prefixes, |sink| {
                gtfs.rdf(&ids, sink).map(|_| ())
            })
        }
        Command::Election2rdf {
            config,
            output,
            warn_missing_col_mapping,
            output_aux_geo,
        } => {
            let mut prefixes = PrefixRegistry::new();
            let ids = IdGenerator::new();
            let mut election =
                Election::load_from_config(&config, &mut prefixes, &ids, warn_missing_col_mapping)
                    .with_context(|| format!("Invalid election configuration {}", config.display()))?;

            info!("Downloading datasets...");
            election.get_all_data()?;
            write_turtle(&output, output_aux_geo.as_deref(), &prefixes, |sink| {
                election.rdf(&ids, sink)
            })
        }
        Command::Compose {
            input,
            main_config,
            output,
            serve,
            pages,
            cors,
        } => {
            let input = ComposeInput::open(input)?;
            if let Some(serve_config) = serve {
                return rdf_spatial_web::serve(ServerConfig {
                    input,
                    main_config,
                    serve_config,
                    pages,
                    cors,
                })
                .await;
            }
            let query = compose_from_input(&input, &main_config)?;
            if let Some(output) = output {
                fs::write(&output, query)
                    .with_context(|| format!("Cannot write {}", output.display()))?;
            } else {
                let mut stdout = io::stdout().lock();
                stdout.write_all(query.as_bytes())?;
                stdout.flush()?;
            }
            Ok(())
        }
    }
}

/// The default prefixes plus the primary prefix given by `--prefix` and `--iri`.
fn primary_prefixes(args: &DatasetArgs) -> anyhow::Result<PrefixRegistry> {
    let Some((prefix, _)) = args.prefix.split_once(':') else {
        bail!(
            "The prefix must have the short form 'prefix:', '{}' given",
            args.prefix
        )
    };
    let mut prefixes = PrefixRegistry::new();
    prefixes.declare(prefix, &args.iri)?;
    Ok(prefixes)
}

fn dataset_source(args: &DatasetArgs) -> anyhow::Result<DatasetSource> {
    let mut source = DatasetSource::new(
        args.dataset.as_str(),
        None,
        args.input.as_path(),
        args.prefix.as_str(),
    )?;
    source.set_parent(args.parent.as_deref().map(Term::name));
    Ok(source)
}

fn single_byte(option: &str, value: &str) -> anyhow::Result<u8> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => bail!("{option} must be a single byte character, '{value}' given"),
    }
}

/// Parses `{"col": [[["search", "replacement"], ...], "lit" | "iri"]}`.
fn parse_values_mapping(json: &str) -> anyhow::Result<ValuesMapping> {
    let raw: HashMap<String, (Vec<(String, String)>, String)> = serde_json::from_str(json)
        .context("--values-mapping must have the shape {\"col\": [[[\"search\", \"replacement\"]], \"lit\"]}")?;
    let mut mapping = ValuesMapping::new();
    for (column, (rules, kind)) in raw {
        let kind = match kind.as_str() {
            "lit" => ValueKind::Literal,
            "iri" => ValueKind::Iri,
            _ => bail!("The value kind of column '{column}' must be 'lit' or 'iri', '{kind}' given"),
        };
        let rules = rules
            .iter()
            .map(|(search, replacement)| ValueRule::new(search, replacement.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid value rule for column '{column}'"))?;
        mapping.insert(column, ValueMapping::new(rules, kind));
    }
    Ok(mapping)
}

fn convert_dataset(
    dataset: &mut dyn Dataset,
    prefixes: &PrefixRegistry,
    output: &Path,
    aux_geo: Option<&Path>,
) -> anyhow::Result<()> {
    dataset.get_data(&[])?;
    let ids = IdGenerator::new();
    write_turtle(output, aux_geo, prefixes, |sink| dataset.rdf(&ids, sink))
}

/// Writes the prefix declarations and everything `emit` produces to a bzip2 compressed Turtle
/// file and the geometries to the optional aux-geo file.
fn write_turtle(
    output: &Path,
    aux_geo: Option<&Path>,
    prefixes: &PrefixRegistry,
    emit: impl FnOnce(&mut dyn TripleSink) -> Result<(), ConvertError>,
) -> anyhow::Result<()> {
    let file = create_bz2_file(output)
        .with_context(|| format!("Cannot create output file {}", output.display()))?;
    let mut writer = TurtleWriter::new(file);
    if let Some(path) = aux_geo {
        writer = writer.with_aux_geo(
            create_aux_geo_file(path)
                .with_context(|| format!("Cannot create aux-geo file {}", path.display()))?,
        );
    }
    writer.write_prefixes(prefixes)?;
    emit(&mut writer)?;
    info!(
        "Emitted {} triples and {} aux geo entries",
        writer.triple_count(),
        writer.geometry_count()
    );
    finish_bz2_file(writer.finish()?)?;
    Ok(())
}
