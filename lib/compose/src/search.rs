use crate::config::required;
use crate::error::invalid;
use crate::{
    clean_name, ComposeError, FilesCache, GroupTemplateDocument, ProvidedValuesDocument,
    RightShardDocument, SpatialSearchConfigDocument, SpatialSearchDocument,
};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SPARQL_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\?\w+$").expect("valid regex"));

/// The prefix of the spatial search service and its configuration predicates.
pub const SPATIAL_SEARCH: &str = "spatialSearch:";
/// Payload that makes the spatial search return every variable of the right side.
pub const SPATIAL_SEARCH_ALL: &str = "spatialSearch:all";

/// The algorithm the SPARQL engine uses to evaluate a spatial search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpatialAlgorithm {
    Baseline,
    #[default]
    S2,
    BoundingBox,
}

impl SpatialAlgorithm {
    pub const ALL: [Self; 3] = [Self::Baseline, Self::S2, Self::BoundingBox];

    /// The local name of the algorithm's IRI in the `spatialSearch:` namespace.
    pub fn name(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::S2 => "s2",
            Self::BoundingBox => "boundingBox",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Baseline => "Nested-Loop Baseline Algorithm",
            Self::S2 => "Fast S2-PointIndex-Based Algorithm",
            Self::BoundingBox => "Rtree-Index-Based Algorithm",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ComposeError> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == name)
            .ok_or_else(|| invalid(format!("Unsupported spatial search algorithm '{name}'")))
    }
}

/// The template every group of queries is inserted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTemplate {
    filename: String,
    queries_pattern: String,
    select_pattern: String,
}

impl GroupTemplate {
    pub fn new(
        filename: impl Into<String>,
        queries_pattern: impl Into<String>,
        select_pattern: impl Into<String>,
    ) -> Result<Self, ComposeError> {
        let (filename, queries_pattern, select_pattern) =
            (filename.into(), queries_pattern.into(), select_pattern.into());
        if filename.is_empty() {
            return Err(invalid("Group template needs a file"));
        }
        if queries_pattern.is_empty() {
            return Err(invalid("Group template needs a queries pattern"));
        }
        if select_pattern.is_empty() {
            return Err(invalid("Group template needs a select pattern"));
        }
        if queries_pattern == select_pattern {
            return Err(invalid("Group template patterns need to be different"));
        }
        Ok(Self {
            filename,
            queries_pattern,
            select_pattern,
        })
    }

    pub fn from_document(document: GroupTemplateDocument) -> Result<Self, ComposeError> {
        let patterns = required(document.patterns, "group_template.patterns")?;
        Self::new(
            required(document.filename, "group_template.filename")?,
            required(patterns.queries, "group_template.patterns.queries")?,
            required(patterns.select, "group_template.patterns.select")?,
        )
    }

    /// Fills the template with the named `queries` and the distinct `select` expressions.
    pub fn compose(
        &self,
        files: &FilesCache,
        queries: &[(String, String)],
        select: &[String],
    ) -> Result<String, ComposeError> {
        let template = files
            .get(&self.filename)
            .ok_or_else(|| ComposeError::MissingFile(self.filename.clone()))?;

        let mut distinct: Vec<&str> = Vec::new();
        for s in select {
            let s = s.trim();
            if !distinct.contains(&s) {
                distinct.push(s);
            }
        }

        let mut queries_str = String::new();
        for (name, query) in queries {
            queries_str.push_str(&format!(
                "\n# --- Begin of `{name}`\n{query}\n# --- End of `{name}`\n"
            ));
        }
        Ok(template
            .replace(&self.queries_pattern, &queries_str)
            .replace(&self.select_pattern, &distinct.join("\n")))
    }
}

/// Values for a variable that are declared inside each query using it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvidedValues {
    variable: String,
    values: Vec<String>,
}

impl ProvidedValues {
    pub fn new(variable: impl Into<String>, values: Vec<String>) -> Result<Self, ComposeError> {
        let variable = variable.into();
        if !SPARQL_VARIABLE.is_match(&variable) {
            return Err(invalid(format!(
                "Variable for values must begin with '?' and contain only alphanumeric chars and underscores, but '{variable}' given"
            )));
        }
        if values.is_empty() {
            return Err(invalid("Provided values needs at least one value"));
        }
        Ok(Self { variable, values })
    }

    pub fn from_document(document: ProvidedValuesDocument) -> Result<Self, ComposeError> {
        Self::new(
            required(document.variable, "provided_values.variable")?,
            document.values.unwrap_or_default(),
        )
    }

    /// Renames the variable to `?<var_prefix>_<variable>_` and declares the values in front of
    /// the query. Queries that do not use the variable are returned unchanged.
    pub fn compose(&self, query: &str, var_prefix: &str) -> String {
        if !query.contains(&self.variable) {
            return query.to_owned();
        }
        let renamed = format!("?{var_prefix}_{}_", &self.variable[1..]);
        format!(
            "\n# This VALUES list must be declared each time for technical reasons\nVALUES {renamed} {{\n{}\n}}\n\n{}\n",
            self.values.join("\n"),
            query.replace(&self.variable, &renamed)
        )
    }
}

/// The parameters of the spatial search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialSearchConfig {
    algorithm: SpatialAlgorithm,
    max_distance: Option<u64>,
    num_nearest_neighbors: Option<u64>,
}

impl SpatialSearchConfig {
    /// At least one limit is required and limits must be positive.
    pub fn new(
        algorithm: SpatialAlgorithm,
        max_distance: Option<i64>,
        num_nearest_neighbors: Option<i64>,
    ) -> Result<Self, ComposeError> {
        if max_distance.is_none() && num_nearest_neighbors.is_none() {
            return Err(invalid(
                "At least one of both (maxDistance or numNearestNeighbors) must be provided for spatial search config.",
            ));
        }
        let positive = |value: Option<i64>, name: &str| {
            value
                .map(|v| {
                    u64::try_from(v)
                        .ok()
                        .filter(|v| *v > 0)
                        .ok_or_else(|| invalid(format!("{name} must be > 0 if given")))
                })
                .transpose()
        };
        Ok(Self {
            algorithm,
            max_distance: positive(max_distance, "maxDistance")?,
            num_nearest_neighbors: positive(num_nearest_neighbors, "numNearestNeighbors")?,
        })
    }

    pub fn from_document(document: SpatialSearchConfigDocument) -> Result<Self, ComposeError> {
        let algorithm = match document.algorithm.as_deref() {
            None => SpatialAlgorithm::default(),
            Some(name) => SpatialAlgorithm::from_name(name)?,
        };
        let max_distance = match &document.max_distance {
            Some(value) => value.to_optional("maxDistance")?,
            None => None,
        };
        let num_nearest_neighbors = match &document.num_nearest_neighbors {
            Some(value) => value.to_optional("numNearestNeighbors")?,
            None => None,
        };
        Self::new(algorithm, max_distance, num_nearest_neighbors)
    }

    pub fn algorithm(&self) -> SpatialAlgorithm {
        self.algorithm
    }

    /// Wraps `body` into a spatial search service call joining `left` and `right`.
    pub fn compose(
        &self,
        left: &str,
        right: &str,
        bind: &str,
        payload: &[String],
        body: &str,
    ) -> Result<String, ComposeError> {
        for variable in [left, right, bind] {
            if !variable.starts_with('?') {
                return Err(invalid(format!(
                    "Variables must begin with '?' but '{variable}' given"
                )));
            }
        }

        let mut config = vec![
            ("algorithm", format!("{SPATIAL_SEARCH}{}", self.algorithm.name())),
            ("left", left.to_owned()),
            ("right", right.to_owned()),
        ];
        if let Some(k) = self.num_nearest_neighbors {
            config.push(("numNearestNeighbors", k.to_string()));
        }
        if let Some(d) = self.max_distance {
            config.push(("maxDistance", d.to_string()));
        }
        if !payload.is_empty() {
            config.push(("payload", payload.join(", ")));
        }
        config.push(("bindDistance", bind.to_owned()));

        let pairs = config
            .iter()
            .map(|(key, value)| format!("{SPATIAL_SEARCH}{key} {value}"))
            .collect::<Vec<_>>()
            .join(" ;\n");
        Ok(format!(
            "\nSERVICE {SPATIAL_SEARCH} {{\n_:config {pairs} .\n{{\n{body}\n}}\n}}\n"
        ))
    }
}

impl fmt::Display for SpatialSearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(k) = self.num_nearest_neighbors {
            write!(f, "numNearestNeighbors{k}")?;
            if self.max_distance.is_some() {
                f.write_str("_")?;
            }
        }
        if let Some(d) = self.max_distance {
            write!(f, "maxDist{d}")?;
        }
        Ok(())
    }
}

/// A query shard on the right side of a spatial search, with the variables it passes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightShard {
    filename: String,
    payload: Vec<String>,
}

impl RightShard {
    /// Any `<all>` or `spatialSearch:all` entry reduces the payload to `spatialSearch:all`.
    pub fn new(filename: impl Into<String>, payload: Vec<String>) -> Result<Self, ComposeError> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(invalid("Filename of right shard may not be empty"));
        }
        let mut all = false;
        for p in &payload {
            if p.is_empty() {
                return Err(invalid("No empty payload values may be given"));
            }
            if p == "<all>" || p == SPATIAL_SEARCH_ALL {
                all = true;
            } else if !SPARQL_VARIABLE.is_match(p) {
                return Err(invalid(format!(
                    "Invalid payload value '{p}' ('<all>', '{SPATIAL_SEARCH_ALL}' or a variable expected)"
                )));
            }
        }
        let payload = if all {
            vec![SPATIAL_SEARCH_ALL.to_owned()]
        } else {
            payload
        };
        Ok(Self { filename, payload })
    }

    pub fn from_document(document: RightShardDocument) -> Result<Self, ComposeError> {
        Self::new(
            required(document.filename, "right.filename")?,
            document.payload.unwrap_or_default(),
        )
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn payload(&self) -> &[String] {
        &self.payload
    }

    pub fn includes_variable(&self, variable: &str) -> bool {
        self.payload.iter().any(|p| p == variable || p == SPATIAL_SEARCH_ALL)
    }
}

/// Patterns that are replaced inside the selectors of a spatial search.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPatterns {
    dist: String,
    count: String,
    centroid: String,
}

/// Patterns of the name template that yields the name of each left/right combination.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NameTemplate {
    template: String,
    kind: String,
    left: String,
    right: String,
}

/// Spatial searches between every left shard and every right shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialSearch {
    config: SpatialSearchConfig,
    left: Vec<String>,
    right: Vec<RightShard>,
    template_pattern: String,
    group_template: GroupTemplate,
    group_size: Option<usize>,
    selectors: Vec<String>,
    selector_patterns: SelectorPatterns,
    provided_values: Vec<ProvidedValues>,
    name_template: NameTemplate,
}

impl SpatialSearch {
    pub fn from_document(document: SpatialSearchDocument) -> Result<Self, ComposeError> {
        let config = SpatialSearchConfig::from_document(required(document.config, "config")?)?;
        let left = required(document.left, "left")?;
        let right = required(document.right, "right")?
            .into_iter()
            .map(RightShard::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        let group_template =
            GroupTemplate::from_document(required(document.group_template, "group_template")?)?;
        let template_pattern = required(document.template_pattern, "template_pattern")?;
        let group_size = match &document.group_size {
            Some(size) => size
                .to_optional("group_size")?
                .map(|size| {
                    usize::try_from(size)
                        .map_err(|_| invalid(format!("group_size must be > 0, but {size} given")))
                })
                .transpose()?,
            None => None,
        };
        let provided_values = document
            .provided_values
            .unwrap_or_default()
            .into_iter()
            .map(ProvidedValues::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        let name = required(document.name_template, "name_template")?;
        let name_patterns = required(name.patterns, "name_template.patterns")?;
        let name_template = NameTemplate {
            template: required(name.template, "name_template.template")?,
            kind: name_patterns.kind.unwrap_or_default(),
            left: name_patterns.left.unwrap_or_default(),
            right: name_patterns.right.unwrap_or_default(),
        };

        let add_selectors = required(document.add_selectors, "add_selectors")?;
        let selectors = required(add_selectors.selectors, "add_selectors.selectors")?;
        let patterns = required(add_selectors.patterns, "add_selectors.patterns")?;
        let selector_patterns = SelectorPatterns {
            dist: required(patterns.dist, "add_selectors.patterns.dist")?,
            count: required(patterns.count, "add_selectors.patterns.count")?,
            centroid: required(patterns.centroid, "add_selectors.patterns.centroid")?,
        };

        if right.is_empty() {
            return Err(invalid("At least one right query is required"));
        }
        if left.is_empty() {
            return Err(invalid("At least one left query is required"));
        }
        if selectors.is_empty() {
            return Err(invalid("At least one selector is required"));
        }
        if let Some(selector) = selectors.iter().find(|s| s.trim().is_empty()) {
            return Err(invalid(format!("Invalid or empty user selector '{selector}'")));
        }

        Ok(Self {
            config,
            left,
            right,
            template_pattern,
            group_template,
            group_size,
            selectors,
            selector_patterns,
            provided_values,
            name_template,
        })
    }

    /// The name of the query joining `left` and `right`, without leading or trailing `_`.
    pub fn apply_name_template(&self, left: &str, right: &str) -> String {
        let n = &self.name_template;
        let name = replace_nonempty(&n.template, &n.kind, &self.config.to_string());
        let name = replace_nonempty(&name, &n.left, left);
        let name = replace_nonempty(&name, &n.right, right);
        name.trim_matches('_').to_owned()
    }

    /// The spatial search between `left` and `right`: its name, query and select expressions.
    pub fn compose_single(
        &self,
        files: &FilesCache,
        left: &str,
        right: &RightShard,
    ) -> Result<(String, String, String), ComposeError> {
        let left_name = clean_name(left);
        let right_name = clean_name(&right.filename);
        let name = self.apply_name_template(left_name, right_name);
        let original = file(files, &right.filename)?;

        if !original.contains(&format!("?{right_name}")) {
            return Err(ComposeError::InvalidShard(format!(
                "Right variable ?{right_name} is not defined"
            )));
        }
        if original.contains(&format!("?{left_name}_centroid")) {
            return Err(ComposeError::InvalidShard(format!(
                "Centroid ?{left_name}_centroid is defined, but should not be"
            )));
        }

        let mut query = original.to_owned();
        for values in &self.provided_values {
            query = values.compose(&query, &name);
        }

        let right_centroid = format!("?{right_name}_centroid");
        if !original.contains(&right_centroid) {
            query = format!(
                "{query}\n\n?{right_name} geo:hasCentroid/geo:asWKT {right_centroid} .\n"
            );
        }

        let count = format!("?count_{right_name}");
        if !original.contains(&count) && right.includes_variable(&count) {
            query = format!("{query}\nBIND(COUNT(*) AS {count})\n");
        }

        // The spatial search must wrap the shard, not be part of it
        let dist = format!("?dist_{name}");
        let query = self.config.compose(
            &format!("?{left_name}_centroid"),
            &right_centroid,
            &dist,
            &right.payload,
            &query,
        )?;

        let p = &self.selector_patterns;
        let mut select = format!("\n# Select expressions for `{name}`:\n");
        for selector in &self.selectors {
            let selector = replace_nonempty(selector, &p.dist, &dist);
            let selector = replace_nonempty(&selector, &p.count, &count);
            let selector = replace_nonempty(&selector, &p.centroid, &right_centroid);
            select.push_str(&selector);
            select.push('\n');
        }

        Ok((name, query, select))
    }

    /// The left shard with its centroid and count. Its name is `<left>_`.
    pub fn compose_left(
        &self,
        files: &FilesCache,
        left: &str,
    ) -> Result<(String, String), ComposeError> {
        let left_name = clean_name(left);
        let query = format!(
            "\n{{\n{}\n\n?{left_name} geo:hasCentroid/geo:asWKT ?{left_name}_centroid .\nBIND(COUNT(*) AS ?count_{left_name})\n}}\n",
            file(files, left)?
        );
        Ok((format!("{left_name}_"), query))
    }

    /// Composes one group per left shard and chunk of at most `group_size` right shards.
    ///
    /// Returns the pattern of the main template to replace and the groups.
    pub fn compose(&self, files: &FilesCache) -> Result<(String, String), ComposeError> {
        let chunk_size = self.group_size.unwrap_or(self.right.len()).max(1);
        let mut groups = Vec::new();
        for left in &self.left {
            for chunk in self.right.chunks(chunk_size) {
                let mut queries = vec![self.compose_left(files, left)?];
                let mut select = Vec::new();
                for right in chunk {
                    let (name, query, s) = self.compose_single(files, left, right)?;
                    queries.push((name, query));
                    select.push(s);
                }
                let group = self.group_template.compose(files, &queries, &select)?;
                groups.push(format!("\n{{\n{group}\n}}\n"));
            }
        }
        Ok((self.template_pattern.clone(), groups.join("\n")))
    }
}

fn replace_nonempty(text: &str, pattern: &str, value: &str) -> String {
    if pattern.is_empty() {
        text.to_owned()
    } else {
        text.replace(pattern, value)
    }
}

fn file<'a>(files: &'a FilesCache, name: &str) -> Result<&'a str, ComposeError> {
    files
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ComposeError::MissingFile(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indent;
    use insta::assert_snapshot;

    fn files(entries: &[(&str, &str)]) -> FilesCache {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn search(group_size: Option<i64>) -> SpatialSearch {
        let mut document: SpatialSearchDocument = serde_json::from_str(
            r#"{
                "config": {"algorithm": "s2", "maxDistance": "700", "numNearestNeighbors": 2},
                "left": ["station.rq"],
                "right": [{"filename": "restaurant.rq", "payload": ["?restaurant_name"]}],
                "group_template": {
                    "filename": "group_template.rq",
                    "patterns": {"queries": "%QUERIES%", "select": "%SELECT%"}
                },
                "template_pattern": "%SPATIALSEARCH%",
                "provided_values": [],
                "name_template": {
                    "template": "%LEFT%_%RIGHT%",
                    "patterns": {"type": "%TYPE%", "left": "%LEFT%", "right": "%RIGHT%"}
                },
                "add_selectors": {
                    "selectors": ["%CENTROID%", "%DIST%"],
                    "patterns": {"dist": "%DIST%", "count": "%COUNT%", "centroid": "%CENTROID%"}
                }
            }"#,
        )
        .unwrap();
        document.group_size = group_size.map(crate::IntOrString::Int);
        SpatialSearch::from_document(document).unwrap()
    }

    #[test]
    fn spatial_search_config() {
        assert!(SpatialAlgorithm::from_name("abc").is_err());
        assert!(SpatialSearchConfig::new(SpatialAlgorithm::S2, None, None).is_err());
        assert!(SpatialSearchConfig::new(SpatialAlgorithm::S2, Some(-2), None).is_err());
        assert!(SpatialSearchConfig::new(SpatialAlgorithm::S2, None, Some(-1)).is_err());

        let config = |d, k| SpatialSearchConfig::new(SpatialAlgorithm::S2, d, k).unwrap();
        assert_eq!(config(Some(100), None).to_string(), "maxDist100");
        assert_eq!(
            config(Some(100), Some(5)).to_string(),
            "numNearestNeighbors5_maxDist100"
        );
        assert_eq!(config(None, Some(5)).to_string(), "numNearestNeighbors5");

        let zero: SpatialSearchConfigDocument =
            serde_json::from_str(r#"{"maxDistance": 0, "numNearestNeighbors": ""}"#).unwrap();
        assert!(SpatialSearchConfig::from_document(zero).is_err());

        let out = config(Some(100), Some(5))
            .compose(
                "?left",
                "?right",
                "?dist",
                &["?payloada".to_owned(), "?payloadb".to_owned()],
                "BODY",
            )
            .unwrap();
        assert_snapshot!(indent(&out), @r"
        SERVICE spatialSearch: {
          _:config spatialSearch:algorithm spatialSearch:s2 ;
                   spatialSearch:left ?left ;
                   spatialSearch:right ?right ;
                   spatialSearch:numNearestNeighbors 5 ;
                   spatialSearch:maxDistance 100 ;
                   spatialSearch:payload ?payloada, ?payloadb ;
                   spatialSearch:bindDistance ?dist .
          {
            BODY
          }
        }
        ");
        assert!(config(Some(1), None)
            .compose("left", "?right", "?dist", &[], "")
            .is_err());
    }

    #[test]
    fn right_shard_payload() {
        assert!(RightShard::new("", vec!["?x".to_owned()]).is_err());
        assert!(RightShard::new("x", vec![String::new()]).is_err());
        assert!(RightShard::new("x", vec!["?x".to_owned(), "z".to_owned()]).is_err());

        let all = RightShard::new("xyz.rq", vec!["?x".to_owned(), "<all>".to_owned()]).unwrap();
        assert_eq!(all.payload(), [SPATIAL_SEARCH_ALL]);
        assert!(all.includes_variable("?a"));

        let some = RightShard::new("xyz.rq", vec!["?x".to_owned(), "?y".to_owned()]).unwrap();
        assert!(some.includes_variable("?y"));
        assert!(!some.includes_variable("?a"));
    }

    #[test]
    fn provided_values() {
        assert!(ProvidedValues::new("xyz", vec!["q:abc".to_owned()]).is_err());
        assert!(ProvidedValues::new("?xy13*", vec!["q:abc".to_owned()]).is_err());
        assert!(ProvidedValues::new("?xyz", Vec::new()).is_err());

        let values =
            ProvidedValues::new("?xyz", vec!["q:abc".to_owned(), "q:xyz".to_owned()]).unwrap();
        let out = values.compose("?a <pred> ?b .\n?b <pred2> ?xyz .", "pref");
        assert_snapshot!(indent(&out), @r"
        # This VALUES list must be declared each time for technical reasons
        VALUES ?pref_xyz_ {
          q:abc
          q:xyz
        }

        ?a <pred> ?b .
        ?b <pred2> ?pref_xyz_ .
        ");
        let unrelated = "?a <pred> ?xz .";
        assert_eq!(values.compose(unrelated, "pref"), unrelated);
    }

    #[test]
    fn group_template() {
        assert!(GroupTemplate::new("", "abc", "xyz").is_err());
        assert!(GroupTemplate::new("abc", "", "xyz").is_err());
        assert!(GroupTemplate::new("abc", "abc", "abc").is_err());

        let template = GroupTemplate::new("gt.rq", "%QUERIES%", "%SELECT%").unwrap();
        let queries = [
            ("abc".to_owned(), "q:abc".to_owned()),
            ("xyz".to_owned(), "q:xyz".to_owned()),
        ];
        let select = ["?abc".to_owned(), " ?abc\n".to_owned(), "?xyz".to_owned()];
        assert!(matches!(
            template.compose(&FilesCache::new(), &queries, &select),
            Err(ComposeError::MissingFile(_))
        ));

        let files = files(&[("gt.rq", "SELECT %SELECT% WHERE {\n%QUERIES%\n}")]);
        assert_snapshot!(template.compose(&files, &queries, &select).unwrap(), @r"
        SELECT ?abc
        ?xyz WHERE {

        # --- Begin of `abc`
        q:abc
        # --- End of `abc`

        # --- Begin of `xyz`
        q:xyz
        # --- End of `xyz`

        }
        ");
    }

    #[test]
    fn single_and_left_queries() {
        let search = search(Some(10));
        assert_eq!(search.apply_name_template("left", "right"), "left_right");

        let files = files(&[
            ("left.rq", "?left <p> <o> ."),
            ("right.rq", "?right <p> <o> ."),
        ]);
        let right = RightShard::new("right.rq", vec!["?count_right".to_owned()]).unwrap();
        let (name, query, select) = search.compose_single(&files, "left.rq", &right).unwrap();
        assert_eq!(name, "left_right");
        assert_snapshot!(select.trim(), @r"
        # Select expressions for `left_right`:
        ?right_centroid
        ?dist_left_right
        ");
        assert_snapshot!(indent(&query), @r"
        SERVICE spatialSearch: {
          _:config spatialSearch:algorithm spatialSearch:s2 ;
                   spatialSearch:left ?left_centroid ;
                   spatialSearch:right ?right_centroid ;
                   spatialSearch:numNearestNeighbors 2 ;
                   spatialSearch:maxDistance 700 ;
                   spatialSearch:payload ?count_right ;
                   spatialSearch:bindDistance ?dist_left_right .
          {
            ?right <p> <o> .

            ?right geo:hasCentroid/geo:asWKT ?right_centroid .

            BIND(COUNT(*) AS ?count_right)

          }
        }
        ");

        let (name, query) = search.compose_left(&files, "left.rq").unwrap();
        assert_eq!(name, "left_");
        assert_snapshot!(indent(&query), @r"
        {
          ?left <p> <o> .

          ?left geo:hasCentroid/geo:asWKT ?left_centroid .
          BIND(COUNT(*) AS ?count_left)
        }
        ");
    }

    #[test]
    fn invalid_shards() {
        let search = search(None);
        let right = RightShard::new("right.rq", Vec::new()).unwrap();
        let undefined = files(&[("right.rq", "?other <p> <o> .")]);
        assert!(matches!(
            search.compose_single(&undefined, "left.rq", &right),
            Err(ComposeError::InvalidShard(_))
        ));
        let left_centroid = files(&[("right.rq", "?right <p> ?left_centroid .")]);
        assert!(matches!(
            search.compose_single(&left_centroid, "left.rq", &right),
            Err(ComposeError::InvalidShard(_))
        ));
    }

    #[test]
    fn groups_by_size() {
        let files = files(&[
            ("station.rq", "?station <p> <o> ."),
            ("restaurant.rq", "?restaurant <p> <o> ."),
            ("group_template.rq", "{\nSELECT\n%SELECT%\nWHERE {\n%QUERIES%\n}\n}"),
        ]);
        let mut search = search(Some(1));
        search.right.push(RightShard::new("restaurant.rq", Vec::new()).unwrap());

        let (pattern, groups) = search.compose(&files).unwrap();
        assert_eq!(pattern, "%SPATIALSEARCH%");
        assert_eq!(groups.matches("# --- Begin of `station_`").count(), 2);

        search.group_size = None;
        let (_, groups) = search.compose(&files).unwrap();
        assert_eq!(groups.matches("# --- Begin of `station_`").count(), 1);
        assert_eq!(
            groups.matches("# --- Begin of `station_restaurant`").count(),
            2
        );
        // Both right shards share their select expressions
        assert_eq!(groups.matches("?dist_station_restaurant\n").count(), 1);
    }

    #[test]
    fn mandatory_fields() {
        let document: SpatialSearchDocument =
            serde_json::from_str(r#"{"left": ["a.rq"]}"#).unwrap();
        assert!(matches!(
            SpatialSearch::from_document(document),
            Err(ComposeError::MissingField(field)) if field == "config"
        ));
    }
}
