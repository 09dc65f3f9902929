use clap::{Args as ClapArgs, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "rdf-spatial")]
/// Converters of geographic datasets to RDF and the spatial search query composer
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// The options shared by the single dataset converters.
#[derive(ClapArgs)]
pub struct DatasetArgs {
    /// Input file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub input: PathBuf,
    /// Alphanumeric dataset name for entity ids (e.g. "mydata")
    #[arg(short, long)]
    pub dataset: String,
    /// Compressed output Turtle file (e.g. "mydata.ttl.bz2")
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,
    /// Primary prefix for the produced entities, in short form (e.g. "ex:")
    #[arg(short, long)]
    pub prefix: String,
    /// The full IRI of the primary prefix (e.g. "http://example.com/schema#")
    #[arg(short = 'r', long, value_hint = ValueHint::Url)]
    pub iri: String,
    /// Every produced entity is declared a `rdfs:member` of this entity
    #[arg(short = 'e', long)]
    pub parent: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a CSV file to RDF, one subject per row
    Csv2rdf {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Separator character
        #[arg(long, default_value = ",")]
        separator: String,
        /// Quote character
        #[arg(long, default_value = "\"")]
        quote: String,
        /// A column that contains the "primary key" used for entity IRIs
        #[arg(short = 'c', long)]
        primary_col: Option<String>,
        /// JSON object mapping column names to predicates, `null` drops a column
        ///
        /// Columns without a mapping use the column name with the primary prefix.
        #[arg(long)]
        column_mapping: Option<String>,
        /// JSON object mapping column names to cell value rules
        ///
        /// The shape is `{"col": [[["search", "replacement"], ...], "lit" | "iri"]}`. The rules
        /// are regular expression replacements applied in order, `$1` or `${name}` refer to
        /// capture groups. With "iri" the result is written verbatim as an IRI or prefixed name.
        #[arg(long)]
        values_mapping: Option<String>,
        /// JSON object mapping further prefixes to their IRIs
        #[arg(short, long)]
        additional_prefixes: Option<String>,
    },
    /// Convert the placemarks of a KML or KMZ file to RDF with GeoSPARQL geometries
    Kml2rdf {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Tab separated file of (subject, WKT) pairs for osm2rdf
        #[arg(short = 'x', long, value_hint = ValueHint::FilePath)]
        aux_geo: Option<PathBuf>,
        /// The input is a KMZ file
        ///
        /// Its KML member is extracted next to the input before the conversion.
        #[arg(short = 'z', long)]
        kmz: bool,
    },
    /// Convert a GTFS feed to Linked GTFS with GeoSPARQL geometries
    Gtfs2rdf {
        /// Alphanumeric name of the feed, it makes the entity ids unique (e.g. "vag")
        #[arg(short, long)]
        feed: String,
        /// The GTFS zip file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Compressed output Turtle file (e.g. "vag.ttl.bz2")
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
        /// Tab separated file of (subject, WKT) pairs for osm2rdf
        #[arg(short = 'x', long, value_hint = ValueHint::FilePath)]
        output_aux_geo: Option<PathBuf>,
        /// Member files of the feed to skip (e.g. "stop_times.txt")
        #[arg(long, num_args = 1..)]
        exclude: Vec<String>,
        /// Also produce a `LINESTRING` per shape
        ///
        /// All shape points are held in memory until the end of the conversion.
        #[arg(long)]
        add_linestrings: bool,
        /// Do not write the prefix declarations
        #[arg(long)]
        skip_prefixes: bool,
        /// Directory the member files are extracted to
        #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
        workdir: PathBuf,
    },
    /// Convert the datasets of an election configuration to one RDF graph
    Election2rdf {
        /// The election configuration JSON file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Compressed output Turtle file (e.g. "election.ttl.bz2")
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
        /// Log a warning for every CSV column without a column mapping
        #[arg(long)]
        warn_missing_col_mapping: bool,
        /// Tab separated file of (subject, WKT) pairs for osm2rdf
        #[arg(short = 'x', long, value_hint = ValueHint::FilePath)]
        output_aux_geo: Option<PathBuf>,
    },
    /// Compose a SPARQL query with spatial searches or serve the interactive composer
    Compose {
        /// Directory or ZIP archive with compose configurations, templates and query shards
        #[arg(value_hint = ValueHint::AnyPath)]
        input: PathBuf,
        /// The compose configuration inside the input
        #[arg(short = 'c', long)]
        main_config: String,
        /// File to write the query to
        ///
        /// If no file is given, stdout is written.
        #[arg(short, long, value_hint = ValueHint::FilePath, conflicts_with = "serve")]
        output: Option<PathBuf>,
        /// Start the HTTP server with this serve configuration from the input
        #[arg(short, long)]
        serve: Option<String>,
        /// Directory with the pages of the web app
        #[arg(long, requires = "serve", value_hint = ValueHint::DirPath)]
        pages: Option<PathBuf>,
        /// Allows cross-origin requests
        #[arg(long, requires = "serve")]
        cors: bool,
    },
}
