use oxrdf::LiteralRef;
use std::fmt::{Display, Formatter};

/// A literal with an optional datatype that is given as a prefixed name (e.g. `xsd:integer`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    value: String,
    datatype: Option<String>,
}

impl Literal {
    /// Creates a plain string literal.
    pub fn new_simple(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
        }
    }

    /// Creates a literal with a datatype.
    pub fn new_typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> Option<&str> {
        self.datatype.as_deref()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Oxigraph escapes the lexical form exactly as N-Triples and Turtle require it.
        Display::fmt(&LiteralRef::new_simple_literal(&self.value), f)?;
        if let Some(datatype) = &self.datatype {
            write!(f, "^^{datatype}")?;
        }
        Ok(())
    }
}

/// A single term of a Turtle triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    /// A prefixed name like `geo:asWKT` or the keyword `a`.
    Name(String),
    /// A literal that is escaped on output.
    Literal(Literal),
    /// A fragment that is already valid Turtle, for example the result of a value mapping rule
    /// that produces `"true"^^xsd:boolean`.
    Raw(String),
}

impl Term {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn raw(raw: impl Into<String>) -> Self {
        Self::Raw(raw.into())
    }

    pub fn simple_literal(value: impl Into<String>) -> Self {
        Self::Literal(Literal::new_simple(value))
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal(Literal::new_typed(value, datatype))
    }

    /// Returns a new name by appending `suffix`, e.g. `ex:1` becomes `ex:1_geo`.
    ///
    /// Literals are not names and are returned unchanged.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        match self {
            Self::Name(name) => Self::Name(format!("{name}{suffix}")),
            Self::Raw(raw) => Self::Raw(format!("{raw}{suffix}")),
            Self::Literal(_) => self.clone(),
        }
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Literal(literal) => Display::fmt(literal, f),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

/// A triple that is written as one line of Turtle: `subject predicate object .`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: impl Into<Term>, predicate: impl Into<Term>, object: impl Into<Term>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
