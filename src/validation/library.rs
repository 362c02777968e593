//! Stock validation functions
//!
//! Native versions of the functions SHACL-JS test suites ship with. They
//! are registered by [`FunctionRegistry::with_builtins`](super::FunctionRegistry::with_builtins).

use super::function::{FunctionFault, FunctionResult, Invocation, NativeFunction};
use super::report::Violation;
use crate::rdf::{vocab, Term, Triple};

/// Predicate used by [`find_born_in`]
pub const BORN_IN: &str = "http://datashapes.org/sh/tests/js/target/jsTargetType-001.test#bornIn";

/// Predicate checked by [`validate_german_label`]
pub const GERMAN_LABEL: &str = "http://example.com/ex#germanLabel";

/// Namespace of the rectangle properties used by [`compute_area`]
pub const RECTANGLE_NS: &str = "http://datashapes.org/js/tests/rules/rectangle.test#";

/// Every stock function
pub fn builtins() -> Vec<NativeFunction> {
    vec![
        find_things(),
        find_born_in(),
        has_max_count(),
        has_max_length(),
        validate_german_label(),
        compute_area(),
    ]
}

/// Target: subjects typed `owl:Thing`
pub fn find_things() -> NativeFunction {
    NativeFunction::target("findThings", |inv| {
        let rdf_type = inv.factory.named_node(vocab::RDF_TYPE)?;
        let thing = inv.factory.named_node(vocab::OWL_THING)?;
        Ok(inv.find(None, Some(&rdf_type), Some(&thing)).subjects())
    })
}

/// Target: subjects born in `$country`
pub fn find_born_in() -> NativeFunction {
    NativeFunction::target("findBornIn", |inv| {
        let born_in = inv.factory.named_node(BORN_IN)?;
        let country = inv.param("country")?;
        Ok(inv.find(None, Some(&born_in), Some(country)).subjects())
    })
    .with_parameter("country")
}

/// Constraint: `$this` has at most `$maxCount` values for `$path`.
///
/// Invoked once per focus node. `$path` is the shape path unless bound
/// explicitly.
pub fn has_max_count() -> NativeFunction {
    NativeFunction::constraint("hasMaxCount", |inv| {
        let this = inv.this()?;
        let path = inv.param("path")?;
        let max: usize = inv.numeric_param("maxCount")?;

        let mut cursor = inv.find(Some(this), Some(path), None);
        let mut count = 0;
        while cursor.next_triple()?.is_some() {
            count += 1;
            if count > max {
                cursor.close();
                return Ok(false);
            }
        }
        Ok(true)
    })
    .per_focus()
    .with_optional_parameter("path")
    .with_parameter("maxCount")
    .with_message("{$this} has more than {$maxCount} values for {$path}")
}

/// Constraint: the lexical form or IRI of `$value` is at most
/// `$maxLength` characters. Blank nodes never satisfy it.
pub fn has_max_length() -> NativeFunction {
    NativeFunction::constraint("hasMaxLength", |inv| {
        let max: usize = inv.numeric_param("maxLength")?;
        let length = match inv.value()? {
            Term::Literal(l) => l.value().chars().count(),
            Term::NamedNode(n) => n.as_str().chars().count(),
            Term::BlankNode(_) => return Ok(false),
        };
        Ok(length <= max)
    })
    .with_parameter("maxLength")
    .with_message("{$value} is longer than {$maxLength} characters")
}

/// Validator: every `ex:germanLabel` of `$this` is a literal tagged `de`
pub fn validate_german_label() -> NativeFunction {
    NativeFunction::validator("validateGermanLabel", |inv| {
        let this = inv.this()?;
        let label = inv.factory.named_node(GERMAN_LABEL)?;

        let mut violations = Vec::new();
        let mut cursor = inv.find(Some(this), Some(&label), None);
        while let Some(triple) = cursor.next_triple()? {
            let german = triple
                .object
                .language()
                .is_some_and(|tag| tag.to_ascii_lowercase().starts_with("de"));
            if !german {
                violations.push(Violation::new(triple.object).with_path(label.clone()));
            }
        }
        Ok(violations)
    })
    .with_message("{$this} has a non-German label")
}

/// Rule: `$this area (width * height)`, typed like the width
pub fn compute_area() -> NativeFunction {
    NativeFunction::rule("computeArea", |inv| {
        let this = inv.this()?;
        let width = rectangle_property(inv, this, "width")?;
        let height = rectangle_property(inv, this, "height")?;

        let area = multiply(&width, &height)?;
        let area = inv.factory.literal(area, width.datatype().as_ref(), None)?;
        let area_property = inv.factory.named_node(format!("{}area", RECTANGLE_NS))?;

        Ok(vec![Triple::from_terms(this.clone(), area_property, area)?])
    })
}

/// First value of a rectangle property
fn rectangle_property(inv: &Invocation<'_>, this: &Term, name: &str) -> FunctionResult<Term> {
    let property = inv.factory.named_node(format!("{}{}", RECTANGLE_NS, name))?;
    let mut cursor = inv.find(Some(this), Some(&property), None);
    let first = cursor.next_triple()?;
    cursor.close();
    first
        .map(|t| t.object)
        .ok_or_else(|| FunctionFault::new(format!("{} has no {}", this, name)))
}

fn multiply(a: &Term, b: &Term) -> FunctionResult<String> {
    let (a, b) = (lexical(a)?, lexical(b)?);
    if let (Ok(x), Ok(y)) = (a.parse::<i64>(), b.parse::<i64>()) {
        return x
            .checked_mul(y)
            .map(|v| v.to_string())
            .ok_or_else(|| FunctionFault::new("area overflows"));
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => Ok((x * y).to_string()),
        _ => Err(FunctionFault::new(format!("cannot multiply {} by {}", a, b))),
    }
}

fn lexical(term: &Term) -> FunctionResult<&str> {
    term.lex()
        .map(str::trim)
        .ok_or_else(|| FunctionFault::new(format!("{} is not a literal", term)))
}
