//! Prefixes, predicates and datatypes that are shared by all converters.

use crate::Prefix;

pub const RDFS: &str = "rdfs";
pub const RDFS_IRI: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const GEO: &str = "geo";
pub const GEO_IRI: &str = "http://www.opengis.net/ont/geosparql#";
pub const XSD: &str = "xsd";
pub const XSD_IRI: &str = "http://www.w3.org/2001/XMLSchema#";
pub const DCT: &str = "dct";
pub const DCT_IRI: &str = "http://purl.org/dc/terms/";

pub(crate) fn default_prefixes() -> [Prefix; 4] {
    [
        Prefix::new_unchecked(RDFS, RDFS_IRI),
        Prefix::new_unchecked(GEO, GEO_IRI),
        Prefix::new_unchecked(XSD, XSD_IRI),
        Prefix::new_unchecked(DCT, DCT_IRI),
    ]
}

pub mod predicate {
    pub const TYPE: &str = "a";
    pub const MEMBER: &str = "rdfs:member";
    pub const LABEL: &str = "rdfs:label";
    pub const COMMENT: &str = "rdfs:comment";
    pub const HAS_GEOMETRY: &str = "geo:hasGeometry";
    pub const HAS_CENTROID: &str = "geo:hasCentroid";
    pub const AS_WKT: &str = "geo:asWKT";
    pub const IDENTIFIER: &str = "dct:identifier";
}

pub mod datatype {
    pub const INTEGER: &str = "xsd:integer";
    pub const DECIMAL: &str = "xsd:decimal";
    pub const DATE: &str = "xsd:date";
    pub const DATE_TIME: &str = "xsd:dateTime";
    pub const BOOLEAN: &str = "xsd:boolean";
    pub const WKT_LITERAL: &str = "geo:wktLiteral";
}
