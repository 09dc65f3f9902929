use crate::{ModelError, PrefixRegistry, Term, Triple};
use std::io::Write;

/// A consumer of the triples produced by a converter.
///
/// Besides triples, converters report every geometry they emit as an aux-geo entry: the subject
/// and the raw well-known text. These entries can be fed into osm2rdf. Sinks that are not
/// interested in them can rely on the default implementation.
pub trait TripleSink {
    /// Consumes a single triple.
    fn push(&mut self, triple: Triple) -> Result<(), ModelError>;

    /// Consumes an aux-geo entry.
    fn push_geometry(&mut self, _subject: &Term, _wkt: &str) -> Result<(), ModelError> {
        Ok(())
    }
}

impl TripleSink for Vec<Triple> {
    fn push(&mut self, triple: Triple) -> Result<(), ModelError> {
        Vec::push(self, triple);
        Ok(())
    }
}

impl<S: TripleSink + ?Sized> TripleSink for &mut S {
    fn push(&mut self, triple: Triple) -> Result<(), ModelError> {
        (**self).push(triple)
    }

    fn push_geometry(&mut self, subject: &Term, wkt: &str) -> Result<(), ModelError> {
        (**self).push_geometry(subject, wkt)
    }
}

/// Writes triples as Turtle, one triple per line, and optionally an aux-geo TSV file.
pub struct TurtleWriter<W: Write> {
    writer: W,
    aux_geo: Option<Box<dyn Write>>,
    triple_count: u64,
    geometry_count: u64,
}

impl<W: Write> TurtleWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            aux_geo: None,
            triple_count: 0,
            geometry_count: 0,
        }
    }

    /// Writes every aux-geo entry as `subject\twkt` line to `aux_geo`.
    #[must_use]
    pub fn with_aux_geo(mut self, aux_geo: Box<dyn Write>) -> Self {
        self.aux_geo = Some(aux_geo);
        self
    }

    /// Writes the `@prefix` declarations. Should be called before the first triple.
    pub fn write_prefixes(&mut self, prefixes: &PrefixRegistry) -> Result<(), ModelError> {
        for declaration in prefixes.declarations() {
            self.writer.write_all(declaration.as_bytes())?;
        }
        Ok(())
    }

    /// The number of triples written so far (prefix declarations are not counted).
    pub fn triple_count(&self) -> u64 {
        self.triple_count
    }

    /// The number of aux-geo entries written so far.
    pub fn geometry_count(&self) -> u64 {
        self.geometry_count
    }

    /// Flushes all outputs and returns the inner Turtle writer.
    pub fn finish(mut self) -> Result<W, ModelError> {
        if let Some(aux_geo) = &mut self.aux_geo {
            aux_geo.flush()?;
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> TripleSink for TurtleWriter<W> {
    fn push(&mut self, triple: Triple) -> Result<(), ModelError> {
        writeln!(self.writer, "{triple}")?;
        self.triple_count += 1;
        Ok(())
    }

    fn push_geometry(&mut self, subject: &Term, wkt: &str) -> Result<(), ModelError> {
        if let Some(aux_geo) = &mut self.aux_geo {
            writeln!(aux_geo, "{subject}\t{wkt}")?;
            self.geometry_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{typed_term, vocab::predicate};
    use insta::assert_snapshot;
    use oxttl::TurtleParser;

    fn sample_output() -> Vec<u8> {
        let mut writer = TurtleWriter::new(Vec::new());
        writer.write_prefixes(&PrefixRegistry::new()).unwrap();
        writer
            .push(Triple::new("rdfs:x", predicate::LABEL, typed_term("Zug \"1\"")))
            .unwrap();
        writer
            .push(Triple::new("rdfs:x", predicate::IDENTIFIER, typed_term("42")))
            .unwrap();
        assert_eq!(writer.triple_count(), 2);
        writer.finish().unwrap()
    }

    #[test]
    fn writes_turtle() {
        let output = String::from_utf8(sample_output()).unwrap();
        assert_snapshot!(output, @r#"
        @prefix dct: <http://purl.org/dc/terms/> .
        @prefix geo: <http://www.opengis.net/ont/geosparql#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
        rdfs:x rdfs:label "Zug \"1\"" .
        rdfs:x dct:identifier "42"^^xsd:integer .
        "#);
    }

    #[test]
    fn output_is_valid_turtle() {
        let output = sample_output();
        let triples = TurtleParser::new()
            .for_reader(output.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(triples.len(), 2);
    }

    #[test]
    fn aux_geo_is_optional() {
        let mut writer = TurtleWriter::new(Vec::new());
        writer
            .push_geometry(&Term::name("ex:1"), "POINT(1.0 2.0)")
            .unwrap();
        assert_eq!(writer.geometry_count(), 0);
        assert!(writer.finish().unwrap().is_empty());
    }
}
