use crate::kml::KmlDataset;
use crate::{ColumnMapping, ConvertError, CsvDataset, Dataset, DatasetSource};
use rdf_spatial_model::vocab::predicate;
use rdf_spatial_model::{typed_term, IdGenerator, PrefixRegistry, Term, Triple, TripleSink};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// The prefix of all election entities. Its declaration must be part of the configuration.
pub const ELECTION: &str = "election";

/// Prefixes declared for the links of an election.
pub const ELECTION_PREFIXES: [(&str, &str); 2] = [
    ("wd", "http://www.wikidata.org/entity/"),
    ("osmrel", "https://www.openstreetmap.org/relation/"),
];

/// The configuration file of an election conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectionConfig {
    pub prefixes: Vec<PrefixConfig>,
    pub election: ElectionMetadata,
    #[serde(default)]
    pub csv: Vec<CsvConfig>,
    #[serde(default)]
    pub kml: Vec<KmlConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrefixConfig {
    pub prefix: String,
    pub iri: String,
}

/// Metadata of an election.
#[derive(Debug, Clone, Deserialize)]
pub struct ElectionMetadata {
    /// A human-readable name, usually the elected body and the year.
    pub label: String,
    /// Prepended to the ids of all produced entities, so that several elections can be joined.
    pub id_prefix: String,
    #[serde(default)]
    pub countryname: Option<String>,
    /// A Wikidata entity like `Q1234`.
    #[serde(default)]
    pub wikidata: Option<Identifier>,
    /// An OpenStreetMap relation id.
    #[serde(default)]
    pub osm: Option<Identifier>,
    #[serde(default)]
    pub year: Option<i64>,
    /// `YYYY/MM/DD`
    #[serde(default)]
    pub date: Option<String>,
}

/// An identifier given as string or number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CsvConfig {
    pub dataset: String,
    #[serde(default)]
    pub command: Option<String>,
    pub store_filename: String,
    pub primary_prefix: String,
    #[serde(default = "default_separator")]
    pub csv_separator: String,
    #[serde(default = "default_quote")]
    pub csv_quote: String,
    #[serde(default)]
    pub column_mapping: ColumnMapping,
    #[serde(default)]
    pub primary_col: Option<String>,
}

fn default_separator() -> String {
    ",".to_owned()
}

fn default_quote() -> String {
    "\"".to_owned()
}

#[derive(Debug, Clone, Deserialize)]
pub struct KmlConfig {
    pub dataset: String,
    #[serde(default)]
    pub command: Option<String>,
    pub store_filename: String,
    pub primary_prefix: String,
}

/// The datasets of one election, converted into one combined output.
pub struct Election {
    metadata: ElectionMetadata,
    datasets: Vec<Box<dyn Dataset>>,
    subject: Term,
}

impl Election {
    pub fn new(
        metadata: ElectionMetadata,
        datasets: Vec<Box<dyn Dataset>>,
        ids: &IdGenerator,
    ) -> Result<Self, ConvertError> {
        if metadata.label.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "the election label must not be empty".to_owned(),
            ));
        }
        let subject = Term::name(format!(
            "{ELECTION}:{}{}",
            metadata.id_prefix,
            ids.next_id()
        ));
        Ok(Self {
            metadata,
            datasets,
            subject,
        })
    }

    /// Reads a configuration file and declares its prefixes in `prefixes`.
    ///
    /// The id prefix of the election is appended to the primary prefix of every dataset.
    pub fn load_from_config(
        path: &Path,
        prefixes: &mut PrefixRegistry,
        ids: &IdGenerator,
        warn_missing_column_mapping: bool,
    ) -> Result<Self, ConvertError> {
        let config: ElectionConfig = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Self::from_config(config, prefixes, ids, warn_missing_column_mapping)
    }

    pub fn from_config(
        config: ElectionConfig,
        prefixes: &mut PrefixRegistry,
        ids: &IdGenerator,
        warn_missing_column_mapping: bool,
    ) -> Result<Self, ConvertError> {
        for (prefix, iri) in ELECTION_PREFIXES {
            prefixes.declare(prefix, iri)?;
        }
        for prefix in &config.prefixes {
            prefixes.declare(&prefix.prefix, &prefix.iri)?;
        }
        if !config.prefixes.iter().any(|p| p.prefix == ELECTION) {
            return Err(ConvertError::InvalidConfig(format!(
                "a prefix definition for '{ELECTION}' is mandatory"
            )));
        }

        let id_prefix = &config.election.id_prefix;
        let mut datasets: Vec<Box<dyn Dataset>> = Vec::new();
        for csv in config.csv {
            let source = DatasetSource::new(
                csv.dataset,
                csv.command,
                csv.store_filename,
                format!("{}{id_prefix}", csv.primary_prefix),
            )?;
            let dataset = CsvDataset::new(source)
                .with_separator(single_byte("csv_separator", &csv.csv_separator)?)
                .with_quote(single_byte("csv_quote", &csv.csv_quote)?)
                .with_column_mapping(csv.column_mapping)
                .with_primary_col(csv.primary_col)
                .with_warn_missing_column_mapping(warn_missing_column_mapping);
            datasets.push(Box::new(dataset));
        }
        for kml in config.kml {
            let source = DatasetSource::new(
                kml.dataset,
                kml.command,
                kml.store_filename,
                format!("{}{id_prefix}", kml.primary_prefix),
            )?;
            datasets.push(Box::new(KmlDataset::new(source)));
        }
        Self::new(config.election, datasets, ids)
    }

    pub fn subject(&self) -> &Term {
        &self.subject
    }

    pub fn metadata(&self) -> &ElectionMetadata {
        &self.metadata
    }

    /// Fetches all datasets. The commands see the variables `ELECTION_LABEL`,
    /// `ELECTION_COUNTRY` and `ELECTION_DATE`.
    pub fn get_all_data(&mut self) -> Result<(), ConvertError> {
        let env = [
            ("ELECTION_LABEL".to_owned(), self.metadata.label.clone()),
            (
                "ELECTION_COUNTRY".to_owned(),
                self.metadata.countryname.clone().unwrap_or_default(),
            ),
            (
                "ELECTION_DATE".to_owned(),
                self.metadata.date.clone().unwrap_or_default(),
            ),
        ];
        for dataset in &mut self.datasets {
            dataset.get_data(&env)?;
        }
        Ok(())
    }

    /// Emits the election metadata followed by all datasets. Every converted entity becomes a
    /// member of the election.
    pub fn rdf(&mut self, ids: &IdGenerator, sink: &mut dyn TripleSink) -> Result<(), ConvertError> {
        info!("Emitting general info");
        let subject = &self.subject;
        let metadata = &self.metadata;
        let property = |name: &str| Term::name(format!("{ELECTION}:{name}"));

        sink.push(Triple::new(
            subject.clone(),
            predicate::TYPE,
            property("election"),
        ))?;
        sink.push(Triple::new(
            subject.clone(),
            predicate::LABEL,
            typed_term(&metadata.label),
        ))?;
        if let Some(wikidata) = &metadata.wikidata {
            sink.push(Triple::new(
                subject.clone(),
                property("wikidata"),
                Term::name(format!("wd:{wikidata}")),
            ))?;
        }
        if let Some(osm) = &metadata.osm {
            sink.push(Triple::new(
                subject.clone(),
                property("osm"),
                Term::name(format!("osmrel:{osm}")),
            ))?;
        }
        if let Some(countryname) = metadata.countryname.as_deref().filter(|c| !c.is_empty()) {
            sink.push(Triple::new(
                subject.clone(),
                property("countryname"),
                typed_term(countryname),
            ))?;
        }
        if let Some(date) = metadata.date.as_deref().filter(|d| !d.is_empty()) {
            sink.push(Triple::new(subject.clone(), property("date"), typed_term(date)))?;
        }
        if let Some(year) = metadata.year {
            sink.push(Triple::new(
                subject.clone(),
                property("year"),
                typed_term(&year.to_string()),
            ))?;
        }

        info!("Emitting datasets...");
        for dataset in &mut self.datasets {
            info!("Emitting {}", dataset.source().dataset());
            dataset.set_parent(Some(subject.clone()));
            dataset.rdf(ids, sink)?;
        }
        Ok(())
    }
}

fn single_byte(field: &str, value: &str) -> Result<u8, ConvertError> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(ConvertError::InvalidConfig(format!(
            "{field} must be a single ASCII character, '{value}' given"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use insta::assert_snapshot;

    fn config(dir: &TempDir) -> String {
        let csv = dir.child("districts.csv");
        let kml = dir.child("areas.kml");
        kml.write_str(
            r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Placemark><name>Mitte</name><Point><coordinates>13.4,52.5</coordinates></Point></Placemark></kml>"#,
        )
        .unwrap();
        format!(
            r#"{{
                "prefixes": [{{"prefix": "election", "iri": "https://example.com/election/"}}],
                "election": {{
                    "label": "Wahl 2021", "id_prefix": "bt21_", "countryname": "Germany",
                    "wikidata": "Q1", "osm": 51477, "year": 2021, "date": "2021/09/26"
                }},
                "csv": [{{
                    "dataset": "district", "command": "printf 'Nr;Name\n1;%s\n' \"$ELECTION_COUNTRY\"",
                    "store_filename": "{}", "primary_prefix": "election:district_",
                    "csv_separator": ";", "csv_quote": "\"",
                    "column_mapping": {{"Nr": "id", "Name": "rdfs:label"}}, "primary_col": "Nr"
                }}],
                "kml": [{{
                    "dataset": "area", "command": null, "store_filename": "{}",
                    "primary_prefix": "election:area_"
                }}]
            }}"#,
            csv.path().display(),
            kml.path().display()
        )
    }

    #[test]
    fn converts_configured_election() {
        let dir = TempDir::new().unwrap();
        let file = dir.child("election.json");
        file.write_str(&config(&dir)).unwrap();

        let ids = IdGenerator::new();
        let mut prefixes = PrefixRegistry::new();
        let mut election =
            Election::load_from_config(file.path(), &mut prefixes, &ids, false).unwrap();
        assert!(prefixes.contains("wd"));
        assert!(prefixes.contains("election"));
        election.get_all_data().unwrap();

        let mut triples = Vec::new();
        election.rdf(&ids, &mut triples).unwrap();
        let output = triples.iter().map(|t| format!("{t}\n")).collect::<String>();
        assert_snapshot!(output, @r#"
        election:bt21_1 a election:election .
        election:bt21_1 rdfs:label "Wahl 2021" .
        election:bt21_1 election:wikidata wd:Q1 .
        election:bt21_1 election:osm osmrel:51477 .
        election:bt21_1 election:countryname "Germany" .
        election:bt21_1 election:date "2021/09/26"^^xsd:date .
        election:bt21_1 election:year "2021"^^xsd:integer .
        election:district_bt21_1 a election:district .
        election:district_bt21_1 rdfs:member election:bt21_1 .
        election:district_bt21_1 election:id "1"^^xsd:integer .
        election:district_bt21_1 rdfs:label "Germany" .
        election:area_bt21_2 a election:area .
        election:area_bt21_2 rdfs:member election:bt21_1 .
        election:area_bt21_2 rdfs:label "Mitte" .
        election:area_bt21_2 geo:hasGeometry election:area_bt21_2_geo .
        election:area_bt21_2_geo geo:asWKT "POINT(13.4 52.5)"^^geo:wktLiteral .
        "#);
    }

    #[test]
    fn requires_election_prefix() {
        let config: ElectionConfig = serde_json::from_str(
            r#"{"prefixes": [], "election": {"label": "x", "id_prefix": ""}, "csv": [], "kml": []}"#,
        )
        .unwrap();
        let result = Election::from_config(config, &mut PrefixRegistry::new(), &IdGenerator::new(), false);
        assert!(matches!(result, Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_multi_char_separator() {
        assert!(single_byte("csv_separator", ";").is_ok());
        assert!(single_byte("csv_separator", ";;").is_err());
        assert!(single_byte("csv_separator", "").is_err());
    }
}
