mod tables;

use crate::dataset::encode_non_word;
use crate::{ConvertError, CsvDataset, CsvRow, Dataset, DatasetSource};
use rdf_spatial_model::vocab::{datatype, predicate};
use rdf_spatial_model::{IdGenerator, ModelError, PrefixRegistry, Term, Triple, TripleSink};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tables::{table_configs, Extra};
use tracing::{info, warn};
use zip::ZipArchive;

const PROGRESS_INTERVAL: u64 = 100_000;
const SHAPES_TABLE: &str = "shapes.txt";

/// Prefixes of the Linked GTFS vocabulary used in the output.
pub const GTFS_PREFIXES: [(&str, &str); 5] = [
    ("gtfs", "http://vocab.gtfs.org/terms#"),
    ("dct", "http://purl.org/dc/terms/"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("schema", "http://schema.org/"),
];

/// Options of a GTFS conversion.
#[derive(Debug, Clone)]
pub struct GtfsOptions {
    /// Member files of the feed that are not converted.
    pub excludes: Vec<String>,
    /// Also emit every shape as `LINESTRING`. All shape points are kept in memory.
    pub add_linestrings: bool,
    /// The directory the member files are extracted to.
    pub workdir: PathBuf,
}

impl Default for GtfsOptions {
    fn default() -> Self {
        Self {
            excludes: Vec::new(),
            add_linestrings: false,
            workdir: PathBuf::from("."),
        }
    }
}

struct GtfsTable {
    table: &'static str,
    dataset: CsvDataset,
    extra: Extra,
}

/// A GTFS zip file, converted to Linked GTFS with additional GeoSPARQL geometries.
pub struct GtfsFeed {
    feed: String,
    filename: PathBuf,
    options: GtfsOptions,
    tables: Vec<GtfsTable>,
}

impl GtfsFeed {
    /// Reads the member list of `filename` and prepares one dataset per supported table.
    ///
    /// `feed` makes the generated IRIs unique, so that several feeds can be joined.
    pub fn new(
        feed: &str,
        filename: impl Into<PathBuf>,
        options: GtfsOptions,
    ) -> Result<Self, ConvertError> {
        if feed.is_empty() || !feed.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(ConvertError::InvalidGtfs(format!(
                "feed name must be alphanumeric, '{feed}' given"
            )));
        }
        let filename = filename.into();

        info!("Reading input file's list of members: {}", filename.display());
        let archive = ZipArchive::new(File::open(&filename)?)?;
        let members = archive
            .file_names()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        info!("Input file contains: {}", members.join(", "));

        let configs = table_configs(feed)?;
        let unsupported = members
            .iter()
            .filter(|m| !configs.iter().any(|c| c.table == m.as_str()))
            .map(String::as_str)
            .collect::<Vec<_>>();
        if !unsupported.is_empty() {
            warn!(
                "Additional files were found in the input zip that are currently not supported: {}",
                unsupported.join(", ")
            );
        }

        let parent = Term::name(format!("gtfs:feed_{feed}"));
        let mut tables = Vec::new();
        for config in configs {
            if options.excludes.iter().any(|e| e == config.table) {
                info!("Skipping {} because it is excluded", config.table);
                continue;
            }
            if !members.iter().any(|m| m == config.table) {
                info!(
                    "Skipping {} because it is not present in input zip",
                    config.table
                );
                continue;
            }
            let mut source = DatasetSource::new(
                config.dataset,
                None,
                options.workdir.join(config.table),
                config.primary_prefix,
            )?;
            source.set_parent(Some(parent.clone()));
            let dataset = CsvDataset::new(source)
                .with_column_mapping(config.column_mapping)
                .with_primary_col(config.primary_col.map(str::to_owned))
                .with_values_mapping(config.values_mapping);
            tables.push(GtfsTable {
                table: config.table,
                dataset,
                extra: config.extra,
            });
        }
        if tables.is_empty() {
            return Err(ConvertError::InvalidGtfs(
                "no supported files found in input zip".to_owned(),
            ));
        }

        Ok(Self {
            feed: feed.to_owned(),
            filename,
            options,
            tables,
        })
    }

    /// Declares the Linked GTFS prefixes.
    pub fn register_prefixes(prefixes: &mut PrefixRegistry) -> Result<(), ConvertError> {
        for (prefix, iri) in GTFS_PREFIXES {
            prefixes.declare(prefix, iri)?;
        }
        Ok(())
    }

    pub fn feed(&self) -> &str {
        &self.feed
    }

    /// The tables that will be converted, in order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.table)
    }

    /// Extracts all tables to be converted into the working directory.
    pub fn get_all_data(&mut self) -> Result<(), ConvertError> {
        info!("Extracting data from {}...", self.filename.display());
        let mut archive = ZipArchive::new(File::open(&self.filename)?)?;
        for table in &mut self.tables {
            let target = table.dataset.source().store_filename().to_owned();
            info!("Extracting {}", target.display());
            let mut member = archive.by_name(table.table)?;
            io::copy(&mut member, &mut File::create(&target)?)?;
            table.dataset.get_data(&[])?;
        }
        Ok(())
    }

    /// Emits the triples of all tables, then the shape line strings if requested.
    ///
    /// Returns the number of emitted triples.
    pub fn rdf(&mut self, ids: &IdGenerator, sink: &mut dyn TripleSink) -> Result<u64, ConvertError> {
        let mut progress = ProgressSink {
            inner: sink,
            count: 0,
            current: String::new(),
        };
        let mut shapes = ShapeCache::default();
        let feed = self.feed.as_str();
        let add_linestrings = self.options.add_linestrings;

        for table in &mut self.tables {
            info!("Emitting triples for {}", table.dataset.source().dataset());
            progress.current = table.dataset.source().dataset().to_owned();
            let extra = table.extra;
            let name = table.table;
            let mut cache = add_linestrings.then_some(&mut shapes);
            table
                .dataset
                .rdf_with_hook(ids, &mut progress, &mut |subject, row, sink| {
                    extra_triples(extra, name, feed, cache.as_deref_mut(), subject, row, sink)
                })?;
        }

        let shapes_excluded = self.options.excludes.iter().any(|e| e == SHAPES_TABLE);
        if add_linestrings && !shapes_excluded {
            info!("Emitting geometry triples for shapes");
            progress.current = "Shapes to LineStrings".to_owned();
            for (subject, mut points) in shapes.into_shapes() {
                points.sort();
                let coords = points
                    .iter()
                    .map(|(_, lon, lat)| format!("{lon} {lat}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                let wkt = format!("LINESTRING({coords})");
                let geometry = subject.with_suffix("_geo");
                progress.push(Triple::new(
                    subject.clone(),
                    predicate::HAS_GEOMETRY,
                    geometry.clone(),
                ))?;
                progress.push(Triple::new(
                    geometry,
                    predicate::AS_WKT,
                    Term::typed_literal(wkt.clone(), datatype::WKT_LITERAL),
                ))?;
                progress.push_geometry(&subject, &wkt)?;
            }
        } else if add_linestrings {
            warn!("'add_linestrings' is set but '{SHAPES_TABLE}' is excluded.");
        }

        info!("Complete. {} triples emitted.", progress.count);
        Ok(progress.count)
    }
}

/// Counts the triples and logs the progress regularly.
struct ProgressSink<'a> {
    inner: &'a mut dyn TripleSink,
    count: u64,
    current: String,
}

impl TripleSink for ProgressSink<'_> {
    fn push(&mut self, triple: Triple) -> Result<(), ModelError> {
        self.inner.push(triple)?;
        self.count += 1;
        if self.count % PROGRESS_INTERVAL == 0 {
            info!(
                "{} triples emitted in total, currently processing {}",
                self.count, self.current
            );
        }
        Ok(())
    }

    fn push_geometry(&mut self, subject: &Term, wkt: &str) -> Result<(), ModelError> {
        self.inner.push_geometry(subject, wkt)
    }
}

/// The points of every shape, in order of first appearance.
#[derive(Default)]
struct ShapeCache {
    order: Vec<String>,
    points: HashMap<String, Vec<(i64, String, String)>>,
}

impl ShapeCache {
    fn add(&mut self, shape: &str, sequence: i64, lon: &str, lat: &str) {
        let points = self.points.entry(shape.to_owned()).or_insert_with(|| {
            self.order.push(shape.to_owned());
            Vec::new()
        });
        points.push((sequence, lon.to_owned(), lat.to_owned()));
    }

    fn into_shapes(mut self) -> impl Iterator<Item = (Term, Vec<(i64, String, String)>)> {
        self.order.into_iter().map(move |shape| {
            let points = self.points.remove(&shape).unwrap_or_default();
            (Term::name(shape), points)
        })
    }
}

fn extra_triples(
    extra: Extra,
    table: &str,
    feed: &str,
    shapes: Option<&mut ShapeCache>,
    subject: &Term,
    row: &CsvRow<'_>,
    sink: &mut dyn TripleSink,
) -> Result<(), ConvertError> {
    match extra {
        Extra::None => {}
        Extra::Calendar => temporal(
            subject,
            row.require(table, "start_date")?,
            row.require(table, "end_date")?,
            sink,
        )?,
        Extra::FeedInfo => {
            sink.push(Triple::new(subject.clone(), predicate::TYPE, "dcat:Dataset"))?;
            temporal(
                subject,
                row.require(table, "feed_start_date")?,
                row.require(table, "feed_end_date")?,
                sink,
            )?;
        }
        Extra::Shapes => {
            let shape_id = row.require(table, "shape_id")?;
            let shape = format!("gtfs:shape_{feed}_{}", encode_non_word(shape_id));
            sink.push(Triple::new(shape.as_str(), predicate::TYPE, "gtfs:Shape"))?;
            sink.push(Triple::new(
                shape.as_str(),
                "gtfs:shapePoint",
                subject.clone(),
            ))?;
            let lon = row.require(table, "shape_pt_lon")?;
            let lat = row.require(table, "shape_pt_lat")?;
            point(subject, lon, lat, sink)?;
            if let Some(shapes) = shapes {
                let sequence = row.require(table, "shape_pt_sequence")?;
                let sequence = sequence.trim().parse().map_err(|_| {
                    ConvertError::InvalidGtfs(format!(
                        "shape_pt_sequence '{sequence}' is not an integer"
                    ))
                })?;
                shapes.add(&shape, sequence, lon, lat);
            }
        }
        Extra::Stops => {
            point(
                subject,
                row.require(table, "stop_lon")?,
                row.require(table, "stop_lat")?,
                sink,
            )?;
            if let Some(parent) = row.get("parent_station").filter(|p| !p.is_empty()) {
                sink.push(Triple::new(
                    format!("gtfs:station_{feed}_{}", encode_non_word(parent)).as_str(),
                    predicate::TYPE,
                    "gtfs:Station",
                ))?;
            }
        }
    }
    Ok(())
}

fn point(subject: &Term, lon: &str, lat: &str, sink: &mut dyn TripleSink) -> Result<(), ConvertError> {
    let geometry = subject.with_suffix("_geo");
    let wkt = format!("POINT({lon} {lat})");
    sink.push(Triple::new(
        subject.clone(),
        predicate::HAS_GEOMETRY,
        geometry.clone(),
    ))?;
    sink.push(Triple::new(
        subject.clone(),
        predicate::HAS_CENTROID,
        geometry.clone(),
    ))?;
    sink.push(Triple::new(
        geometry,
        predicate::AS_WKT,
        Term::typed_literal(wkt.clone(), datatype::WKT_LITERAL),
    ))?;
    sink.push_geometry(subject, &wkt)?;
    Ok(())
}

fn temporal(subject: &Term, start: &str, end: &str, sink: &mut dyn TripleSink) -> Result<(), ConvertError> {
    let temporal = subject.with_suffix("_temporal");
    sink.push(Triple::new(subject.clone(), "dct:temporal", temporal.clone()))?;
    sink.push(Triple::new(temporal.clone(), "schema:startDate", date(start)))?;
    sink.push(Triple::new(temporal, "schema:endDate", date(end)))?;
    Ok(())
}

/// `YYYYMMDD` as `xsd:date`, anything else as plain string.
fn date(value: &str) -> Term {
    match (value.get(0..4), value.get(4..6), value.get(6..8)) {
        (Some(year), Some(month), Some(day)) if value.len() == 8 => {
            Term::typed_literal(format!("{year}/{month}/{day}"), datatype::DATE)
        }
        _ => Term::simple_literal(value),
    }
}
