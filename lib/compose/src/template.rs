use crate::config::required;
use crate::error::invalid;
use crate::{
    ComposeError, FilesCache, QueryConfigDocument, ReplaceRuleDocument, SpatialSearch,
    TemplateDocument,
};
use regex::{NoExpand, Regex};
use tracing::debug;

/// Replace rules are applied at most this many rounds.
pub const MAX_REPLACE_DEPTH: usize = 100;

#[derive(Debug, Clone)]
enum Replacement {
    /// Replacement text in which `$1` or `${name}` refer to capture groups.
    Text(String),
    /// An input file whose content is inserted as is.
    File(String),
}

/// Replaces all matches of a regular expression in the composed query.
#[derive(Debug, Clone)]
pub struct ReplaceRule {
    search: Regex,
    replacement: Replacement,
}

impl ReplaceRule {
    /// Exactly one of `replace` and `replace_file` must be given and not empty.
    pub fn new(
        search: &str,
        replace: Option<String>,
        replace_file: Option<String>,
    ) -> Result<Self, ComposeError> {
        if search.is_empty() {
            return Err(invalid("Search pattern must not be empty"));
        }
        let replacement = match (
            replace.filter(|r| !r.is_empty()),
            replace_file.filter(|f| !f.is_empty()),
        ) {
            (Some(text), None) => Replacement::Text(text),
            (None, Some(file)) => Replacement::File(file),
            _ => {
                return Err(invalid(
                    "You must provide 'replace' or 'replace_file' to a replace rule, not none or both",
                ))
            }
        };
        Ok(Self {
            search: Regex::new(search)?,
            replacement,
        })
    }

    pub fn from_document(document: ReplaceRuleDocument) -> Result<Self, ComposeError> {
        Self::new(
            &required(document.search, "replace.search")?,
            document.replace,
            document.replace_file,
        )
    }

    pub fn can_be_replaced(&self, text: &str) -> bool {
        self.search.is_match(text)
    }

    /// Replaces every match once, without applying the rule to its own output.
    pub fn apply(&self, files: &FilesCache, text: &str) -> Result<String, ComposeError> {
        Ok(match &self.replacement {
            Replacement::Text(replace) => self.search.replace_all(text, replace.as_str()),
            Replacement::File(name) => {
                let content = files
                    .get(name)
                    .ok_or_else(|| ComposeError::MissingFile(name.clone()))?;
                self.search.replace_all(text, NoExpand(content.as_str()))
            }
        }
        .into_owned())
    }
}

/// The main query template.
#[derive(Debug, Clone)]
pub struct Template {
    filename: String,
    replace_rules: Vec<ReplaceRule>,
}

impl Template {
    pub fn new(
        filename: impl Into<String>,
        replace_rules: Vec<ReplaceRule>,
    ) -> Result<Self, ComposeError> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(invalid("Template needs a source file"));
        }
        Ok(Self {
            filename,
            replace_rules,
        })
    }

    pub fn from_document(document: TemplateDocument) -> Result<Self, ComposeError> {
        let replace_rules = document
            .replace
            .unwrap_or_default()
            .into_iter()
            .map(ReplaceRule::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(
            required(document.filename, "template.filename")?,
            replace_rules,
        )
    }

    /// Inserts the `groups` at their patterns, then applies the replace rules until none
    /// matches anymore.
    ///
    /// Groups for the same pattern are joined by newlines. A configuration whose rules still
    /// match after [`MAX_REPLACE_DEPTH`] rounds is rejected.
    pub fn compose(
        &self,
        files: &FilesCache,
        groups: &[(String, String)],
    ) -> Result<String, ComposeError> {
        let mut result = files
            .get(&self.filename)
            .ok_or_else(|| ComposeError::MissingFile(self.filename.clone()))?
            .clone();

        let mut by_pattern: Vec<(&str, Vec<&str>)> = Vec::new();
        for (pattern, value) in groups {
            match by_pattern.iter_mut().find(|(p, _)| *p == pattern.as_str()) {
                Some((_, values)) => values.push(value.as_str()),
                None => by_pattern.push((pattern.as_str(), vec![value.as_str()])),
            }
        }
        for (pattern, values) in by_pattern {
            result = result.replace(pattern, &values.join("\n"));
        }

        for round in 0..MAX_REPLACE_DEPTH {
            let mut replaced = false;
            for rule in &self.replace_rules {
                if rule.can_be_replaced(&result) {
                    replaced = true;
                    result = rule.apply(files, &result)?;
                }
            }
            if !replaced {
                debug!("Replace rules applied in {round} rounds");
                return Ok(result);
            }
        }
        Err(ComposeError::ReplaceDepthExceeded)
    }
}

/// A validated compose configuration.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    template: Template,
    spatial_searches: Vec<SpatialSearch>,
}

impl QueryConfig {
    pub fn new(
        template: Template,
        spatial_searches: Vec<SpatialSearch>,
    ) -> Result<Self, ComposeError> {
        if spatial_searches.is_empty() {
            return Err(invalid("At least one spatial search is required"));
        }
        Ok(Self {
            template,
            spatial_searches,
        })
    }

    pub fn from_document(document: QueryConfigDocument) -> Result<Self, ComposeError> {
        let template = Template::from_document(required(document.template, "template")?)?;
        let spatial_searches = required(document.spatial_searches, "spatial_searches")?
            .into_iter()
            .map(SpatialSearch::from_document)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(template, spatial_searches)
    }

    /// The query, not yet indented.
    pub fn compose(&self, files: &FilesCache) -> Result<String, ComposeError> {
        let groups = self
            .spatial_searches
            .iter()
            .map(|s| s.compose(files))
            .collect::<Result<Vec<_>, _>>()?;
        let mut query = self.template.compose(files, &groups)?;
        query.push('\n');
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose;
    use insta::assert_snapshot;

    fn files(entries: &[(&str, &str)]) -> FilesCache {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn text(search: &str, replace: &str) -> ReplaceRule {
        ReplaceRule::new(search, Some(replace.to_owned()), None).unwrap()
    }

    #[test]
    fn replace_rules() {
        assert!(ReplaceRule::new("", Some("x".to_owned()), None).is_err());
        assert!(ReplaceRule::new("xyz", None, None).is_err());
        assert!(ReplaceRule::new("xyz", Some("x".to_owned()), Some("y".to_owned())).is_err());
        assert!(matches!(
            ReplaceRule::new("(", Some("x".to_owned()), None),
            Err(ComposeError::Regex(_))
        ));

        let rule = text(r"%(\w+)%", "Something");
        assert!(rule.can_be_replaced("xyz%SEARCH%xyz"));
        assert!(!rule.can_be_replaced("xyz%%xyz"));
        let no_files = FilesCache::new();
        assert_eq!(rule.apply(&no_files, "xyz%xyz%xyz").unwrap(), "xyzSomethingxyz");
        assert_eq!(
            text(r"%(\w+)%", "Something${1}")
                .apply(&no_files, "xyz%xyz%xyz")
                .unwrap(),
            "xyzSomethingxyzxyz"
        );

        let from_file = ReplaceRule::new(r"%(\w+)%", None, Some("replace.rq".to_owned())).unwrap();
        let files = files(&[("replace.rq", "Something$1.")]);
        assert_eq!(
            from_file.apply(&files, "xyz%xyz%xyz").unwrap(),
            "xyzSomething$1.xyz"
        );
    }

    #[test]
    fn template_groups_and_replacements() {
        let files = files(&[
            (
                "example.rq",
                "SELECT * WHERE {\n?x <pred> \"%SEARCH1%\" .\n{\n%GROUPA%\n}\n{\n%GROUPB%\n}\n}",
            ),
            ("replace.rq", "Search2ReplaceFile"),
        ]);
        let template = Template::new(
            "example.rq",
            vec![
                text("%SEARCH1%", "Something:%SEARCH2%"),
                ReplaceRule::new("%SEARCH2%", None, Some("replace.rq".to_owned())).unwrap(),
            ],
        )
        .unwrap();
        let groups = [
            ("%GROUPA%".to_owned(), "{ ?a ?b ?c . }".to_owned()),
            ("%GROUPA%".to_owned(), "{ ?x ?y ?z . }".to_owned()),
            ("%GROUPB%".to_owned(), "{ ?a <b> \"%SEARCH2%\" . }".to_owned()),
        ];
        assert_snapshot!(template.compose(&files, &groups).unwrap(), @r#"
        SELECT * WHERE {
        ?x <pred> "Something:Search2ReplaceFile" .
        {
        { ?a ?b ?c . }
        { ?x ?y ?z . }
        }
        {
        { ?a <b> "Search2ReplaceFile" . }
        }
        }
        "#);

        let cyclic = Template::new("example.rq", vec![text("%SEARCH1%", "%SEARCH1%")]).unwrap();
        assert!(matches!(
            cyclic.compose(&files, &groups),
            Err(ComposeError::ReplaceDepthExceeded)
        ));
        assert!(Template::new("", Vec::new()).is_err());
    }

    #[test]
    fn composes_a_full_query() {
        let document: QueryConfigDocument = serde_json::from_str(
            r#"{
                "template": {
                    "filename": "template.rq",
                    "replace": [{"search": "%PREFIXES%", "replace_file": "prefixes.rq"}]
                },
                "spatial_searches": [{
                    "config": {"algorithm": "boundingBox", "maxDistance": 500},
                    "left": ["station.rq"],
                    "right": [{"filename": "shards/bar.rq", "payload": ["?count_bar"]}],
                    "group_template": {
                        "filename": "group_template.rq",
                        "patterns": {"queries": "%QUERIES%", "select": "%SELECT%"}
                    },
                    "template_pattern": "%SPATIALSEARCH%",
                    "group_size": "",
                    "name_template": {
                        "template": "_%LEFT%_%RIGHT%_%TYPE%",
                        "patterns": {"type": "%TYPE%", "left": "%LEFT%", "right": "%RIGHT%"}
                    },
                    "add_selectors": {
                        "selectors": ["(MIN(%DIST%) AS %DIST%_min)", "%COUNT%"],
                        "patterns": {"dist": "%DIST%", "count": "%COUNT%", "centroid": "%CENTROID%"}
                    }
                }]
            }"#,
        )
        .unwrap();
        let files = files(&[
            ("template.rq", "%PREFIXES%\nSELECT * WHERE {\n%SPATIALSEARCH%\n}"),
            ("prefixes.rq", "PREFIX geo: <http://www.opengis.net/ont/geosparql#>"),
            ("station.rq", "?station a ex:Station ."),
            ("shards/bar.rq", "?bar a ex:Bar ;\nex:name ?bar_name ."),
            ("group_template.rq", "{\nSELECT ?station\n%SELECT%\nWHERE {\n%QUERIES%\n}\nGROUP BY ?station\n}"),
        ]);
        assert_snapshot!(compose(document, &files).unwrap(), @r"
        PREFIX geo: <http://www.opengis.net/ont/geosparql#>
        SELECT * WHERE {

          {
            {
              SELECT ?station
                      # Select expressions for `station_bar_maxDist500`:
                      (MIN(?dist_station_bar_maxDist500) AS ?dist_station_bar_maxDist500_min)
                      ?count_bar
              WHERE {

                # --- Begin of `station_`

                {
                  ?station a ex:Station .

                  ?station geo:hasCentroid/geo:asWKT ?station_centroid .
                  BIND(COUNT(*) AS ?count_station)
                }

                # --- End of `station_`

                # --- Begin of `station_bar_maxDist500`

                SERVICE spatialSearch: {
                  _:config spatialSearch:algorithm spatialSearch:boundingBox ;
                           spatialSearch:left ?station_centroid ;
                           spatialSearch:right ?bar_centroid ;
                           spatialSearch:maxDistance 500 ;
                           spatialSearch:payload ?count_bar ;
                           spatialSearch:bindDistance ?dist_station_bar_maxDist500 .
                  {
                    ?bar a ex:Bar ;
                         ex:name ?bar_name .

                    ?bar geo:hasCentroid/geo:asWKT ?bar_centroid .

                    BIND(COUNT(*) AS ?count_bar)

                  }
                }

                # --- End of `station_bar_maxDist500`

              }
              GROUP BY ?station
            }
          }

        }
        ");
    }

    #[test]
    fn mandatory_sections() {
        let missing: QueryConfigDocument =
            serde_json::from_str(r#"{"template": {"filename": "t.rq"}}"#).unwrap();
        assert!(matches!(
            QueryConfig::from_document(missing),
            Err(ComposeError::MissingField(field)) if field == "spatial_searches"
        ));
        let empty: QueryConfigDocument =
            serde_json::from_str(r#"{"template": {"filename": "t.rq"}, "spatial_searches": []}"#)
                .unwrap();
        assert!(matches!(
            QueryConfig::from_document(empty),
            Err(ComposeError::InvalidConfig(_))
        ));
    }
}
