//! Turtle and N-Triples support on top of rio

use super::{ParseError, ParseResult, SerializeError, SerializeResult};
use crate::rdf::namespace::vocab;
use crate::rdf::{BlankNode, Literal, NamedNode, Subject, Term, Triple};
use rio_api::formatter::TriplesFormatter;
use rio_api::model;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleFormatter, TurtleParser};
use std::io::BufRead;

/// Parse Turtle text into triples
pub(super) fn parse_turtle(reader: impl BufRead) -> ParseResult<Vec<Triple>> {
    collect(TurtleParser::new(reader, None))
}

/// Parse N-Triples text into triples
pub(super) fn parse_ntriples(reader: impl BufRead) -> ParseResult<Vec<Triple>> {
    collect(NTriplesParser::new(reader))
}

fn collect<P>(mut parser: P) -> ParseResult<Vec<Triple>>
where
    P: TriplesParser,
    ParseError: From<P::Error>,
{
    let mut triples = Vec::new();
    parser.parse_all(&mut |t| -> ParseResult<()> {
        triples.push(Triple {
            subject: convert_subject(t.subject)?,
            predicate: NamedNode::new(t.predicate.iri)?,
            object: convert_object(t.object)?,
        });
        Ok(())
    })?;
    Ok(triples)
}

/// Serialize triples to Turtle
pub(super) fn serialize_turtle(triples: &[Triple]) -> SerializeResult<String> {
    let mut formatter = TurtleFormatter::new(Vec::new());

    for triple in triples {
        let subject = match &triple.subject {
            Subject::NamedNode(n) => model::Subject::NamedNode(model::NamedNode { iri: n.as_str() }),
            Subject::BlankNode(b) => model::Subject::BlankNode(model::BlankNode { id: b.as_str() }),
        };
        let datatype;
        let object = match &triple.object {
            Term::NamedNode(n) => model::Term::NamedNode(model::NamedNode { iri: n.as_str() }),
            Term::BlankNode(b) => model::Term::BlankNode(model::BlankNode { id: b.as_str() }),
            Term::Literal(l) => model::Term::Literal(match l.language() {
                Some(language) => model::Literal::LanguageTaggedString {
                    value: l.value(),
                    language,
                },
                None => {
                    datatype = l.datatype();
                    if datatype.as_str() == vocab::XSD_STRING {
                        model::Literal::Simple { value: l.value() }
                    } else {
                        model::Literal::Typed {
                            value: l.value(),
                            datatype: model::NamedNode {
                                iri: datatype.as_str(),
                            },
                        }
                    }
                }
            }),
        };

        formatter
            .format(&model::Triple {
                subject,
                predicate: model::NamedNode {
                    iri: triple.predicate.as_str(),
                },
                object,
            })
            .map_err(|e| SerializeError::Serialize(e.to_string()))?;
    }

    let output = formatter.finish()?;
    String::from_utf8(output).map_err(|e| SerializeError::Serialize(e.to_string()))
}

fn convert_subject(s: model::Subject<'_>) -> ParseResult<Subject> {
    match s {
        model::Subject::NamedNode(n) => Ok(Subject::NamedNode(NamedNode::new(n.iri)?)),
        model::Subject::BlankNode(b) => Ok(Subject::BlankNode(BlankNode::with_id(b.id)?)),
        _ => Err(ParseError::Parse("Unsupported subject type".to_string())),
    }
}

fn convert_object(o: model::Term<'_>) -> ParseResult<Term> {
    match o {
        model::Term::NamedNode(n) => Ok(Term::NamedNode(NamedNode::new(n.iri)?)),
        model::Term::BlankNode(b) => Ok(Term::BlankNode(BlankNode::with_id(b.id)?)),
        model::Term::Literal(model::Literal::Simple { value }) => {
            Ok(Term::Literal(Literal::new_simple_literal(value)))
        }
        model::Term::Literal(model::Literal::LanguageTaggedString { value, language }) => Ok(
            Term::Literal(Literal::new_language_tagged_literal(value, language)?),
        ),
        model::Term::Literal(model::Literal::Typed { value, datatype }) => Ok(Term::Literal(
            Literal::new_typed_literal(value, NamedNode::new(datatype.iri)?)?,
        )),
        _ => Err(ParseError::Parse("Unsupported object type".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turtle_roundtrip() {
        let input = r#"<http://example.org/a> <http://example.org/b> "c" , "d"@de , 5 ."#;
        let triples = parse_turtle(input.as_bytes()).unwrap();
        assert_eq!(triples.len(), 3);

        let output = serialize_turtle(&triples).unwrap();
        let reparsed = parse_turtle(output.as_bytes()).unwrap();
        assert_eq!(reparsed, triples);
    }

    #[test]
    fn test_blank_node_subjects() {
        let input = "_:n1 <http://example.org/p> <http://example.org/o> .\n";
        let triples = parse_ntriples(input.as_bytes()).unwrap();
        assert_eq!(triples[0].subject.to_string(), "_:n1");
    }
}
