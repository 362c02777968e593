//! End-to-end validation: stock functions, plans, rules and reports

use shapecheck::rdf::{vocab, Literal, NamedNode, RdfFormat, RdfParser, Term, Triple, TripleStore};
use shapecheck::validation::library::{BORN_IN, GERMAN_LABEL, RECTANGLE_NS};
use shapecheck::validation::{
    EngineConfig, FunctionBinding, FunctionRegistry, Invocation, NativeFunction, Outcome, Shape,
    ValidationEngine, ValidationFunction, ValidationPlan,
};

fn ex(s: &str) -> NamedNode {
    NamedNode::new(format!("http://example.org/{}", s)).unwrap()
}

fn rdf_type() -> NamedNode {
    NamedNode::new(vocab::RDF_TYPE).unwrap()
}

fn registry() -> FunctionRegistry {
    FunctionRegistry::with_builtins()
}

fn binding(name: &str) -> FunctionBinding {
    FunctionBinding::new(registry().get(name).unwrap())
}

fn engine() -> ValidationEngine {
    ValidationEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_find_things_selects_owl_things_only() {
    let store = TripleStore::from_triples(vec![
        Triple::new(ex("Alice"), rdf_type(), NamedNode::new(vocab::OWL_THING).unwrap()),
        Triple::new(ex("Bob"), rdf_type(), ex("Person")),
    ]);
    let shape = Shape::new("Things").with_target_function(binding("findThings"));
    assert_eq!(
        engine().focus_nodes(&store, &shape).unwrap(),
        vec![Term::from(ex("Alice"))]
    );
}

#[test]
fn test_has_max_count_boundary() {
    let store = TripleStore::from_triples(vec![
        Triple::new(ex("Alice"), ex("knows"), ex("Bob")),
        Triple::new(ex("Alice"), ex("knows"), ex("Carol")),
    ]);
    let shape = Shape::new("Friends").with_target_node(ex("Alice")).with_constraint(
        binding("hasMaxCount")
            .with_param("path", ex("knows"))
            .with_param("maxCount", Literal::new_simple_literal("2")),
    );

    assert!(engine().validate_shape(&store, &shape).unwrap().conforms);

    store.insert(Triple::new(ex("Alice"), ex("knows"), ex("Dave"))).unwrap();
    let report = engine().validate_shape(&store, &shape).unwrap();
    assert!(!report.conforms);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].focus_node, Term::from(ex("Alice")));
    assert_eq!(
        report.results[0].messages,
        vec!["http://example.org/Alice has more than 2 values for http://example.org/knows"]
    );
}

#[test]
fn test_has_max_count_on_property_shape() {
    let store = TripleStore::from_triples(vec![
        Triple::new(ex("Alice"), ex("knows"), ex("Bob")),
        Triple::new(ex("Alice"), ex("knows"), ex("Carol")),
        Triple::new(ex("Alice"), ex("knows"), ex("Dave")),
        Triple::new(ex("Bob"), ex("name"), Literal::new_simple_literal("Bob")),
    ]);
    let shape = Shape::new("Friends")
        .with_target_node(ex("Alice"))
        .with_target_node(ex("Bob"))
        .with_path(ex("knows"))
        .with_constraint(binding("hasMaxCount").with_param("maxCount", Literal::new_simple_literal("2")));

    let report = engine().validate_shape(&store, &shape).unwrap();
    assert!(!report.conforms);
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.focus_node, Term::from(ex("Alice")));
    assert_eq!(result.value, Term::from(ex("Alice")));
    assert_eq!(result.path, Some(Term::from(ex("knows"))));
    assert_eq!(
        result.messages,
        vec!["http://example.org/Alice has more than 2 values for http://example.org/knows"]
    );
}

#[test]
fn test_per_focus_constraint_sees_focus_without_values() {
    let store = TripleStore::from_triples(vec![Triple::new(ex("Alice"), ex("knows"), ex("Bob"))]);
    let knows_someone = NativeFunction::constraint("knowsSomeone", |inv| {
        let mut cursor = inv.find(Some(inv.this()?), Some(inv.param("path")?), None);
        Ok(cursor.next_triple()?.is_some())
    })
    .per_focus()
    .with_optional_parameter("path");
    let shape = Shape::new("Sociable")
        .with_target_node(ex("Alice"))
        .with_target_node(ex("Bob"))
        .with_path(ex("knows"))
        .with_constraint(FunctionBinding::new(knows_someone.into_shared()));

    let report = engine().validate_shape(&store, &shape).unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].focus_node, Term::from(ex("Bob")));
    assert!(report.faults.is_empty());
}

#[test]
fn test_has_max_length_direct_calls() {
    let store = TripleStore::new();
    let factory = shapecheck::rdf::TermFactory::new();
    let function = registry().get("hasMaxLength").unwrap();
    let mut params = shapecheck::validation::Bindings::new();
    params.insert("maxLength".to_string(), Term::from(Literal::new_simple_literal("3")));

    let call = |value: &Term| {
        function
            .call(&Invocation {
                this: Some(value),
                value: Some(value),
                path: None,
                params: &params,
                data: &store,
                factory: &factory,
            })
            .unwrap()
    };

    let hello = Term::from(Literal::new_simple_literal("hello"));
    assert_eq!(call(&hello), Outcome::Boolean(false));
    assert_eq!(call(&factory.blank_node()), Outcome::Boolean(false));
}

#[test]
fn test_compute_area_rule() {
    let int = NamedNode::new(vocab::XSD_INTEGER).unwrap();
    let prop = |name: &str| NamedNode::new(format!("{}{}", RECTANGLE_NS, name)).unwrap();
    let store = TripleStore::from_triples(vec![
        Triple::new(ex("rect"), prop("width"), Literal::new_typed_literal("4", int.clone()).unwrap()),
        Triple::new(ex("rect"), prop("height"), Literal::new_typed_literal("5", int.clone()).unwrap()),
    ]);
    let shape = Shape::new("Rectangle")
        .with_target_node(ex("rect"))
        .with_rule(binding("computeArea"));

    let report = engine().apply_rules(&store, &shape).unwrap();
    assert_eq!(report.inferred, 1);

    let rect = Term::from(ex("rect"));
    let area = store.find(Some(&rect), Some(&Term::from(prop("area"))), None).objects();
    assert_eq!(
        area,
        vec![Term::from(Literal::new_typed_literal("20", int).unwrap())]
    );
}

#[test]
fn test_german_labels_with_born_in_targets() {
    let born_in = NamedNode::new(BORN_IN).unwrap();
    let label = NamedNode::new(GERMAN_LABEL).unwrap();
    let store = TripleStore::from_triples(vec![
        Triple::new(ex("hans"), born_in.clone(), ex("Germany")),
        Triple::new(ex("greta"), born_in.clone(), ex("Germany")),
        Triple::new(ex("john"), born_in, ex("USA")),
        Triple::new(ex("hans"), label.clone(), Literal::new_language_tagged_literal("Hans", "de").unwrap()),
        Triple::new(ex("greta"), label.clone(), Literal::new_language_tagged_literal("Greta", "en").unwrap()),
        Triple::new(ex("john"), label, Literal::new_simple_literal("John")),
    ]);
    let shape = Shape::new("GermanLabels")
        .with_target_function(binding("findBornIn").with_param("country", ex("Germany")))
        .with_constraint(binding("validateGermanLabel"));

    let report = engine().validate_shape(&store, &shape).unwrap();
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.focus_node, Term::from(ex("greta")));
    assert_eq!(result.value.language(), Some("en"));
    assert_eq!(result.path, Some(Term::from(NamedNode::new(GERMAN_LABEL).unwrap())));
}

#[test]
fn test_identical_violations_are_kept() {
    let always_false = NativeFunction::constraint("alwaysFalse", |_| Ok(false));
    let shape = Shape::new("S")
        .with_target_node(ex("a"))
        .with_target_node(ex("b"))
        .with_constraint(FunctionBinding::new(always_false.into_shared()).with_message("nope"));

    let report = engine().validate_shape(&TripleStore::new(), &shape).unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].messages, report.results[1].messages);
    assert_ne!(report.results[0].focus_node, report.results[1].focus_node);
}

#[test]
fn test_plan_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    let data = dir.path().join("data.ttl");
    std::fs::write(
        &data,
        r#"
        @prefix ex: <http://example.org/> .
        @prefix owl: <http://www.w3.org/2002/07/owl#> .
        @prefix rect: <http://datashapes.org/js/tests/rules/rectangle.test#> .

        ex:alice a owl:Thing ; ex:knows ex:bob , ex:carol , ex:dave .
        ex:bob a owl:Thing ; ex:knows ex:alice .
        ex:square rect:width 3 ; rect:height 3 .
        "#,
    )
    .unwrap();

    let plan = dir.path().join("plan.yaml");
    std::fs::write(
        &plan,
        r#"
prefixes:
  ex: http://example.org/
  rect: http://datashapes.org/js/tests/rules/rectangle.test#
shapes:
  - name: Sociable
    targets:
      - function: findThings
    constraints:
      - function: hasMaxCount
        params:
          path: ex:knows
          maxCount: 2
  - name: Square
    targets:
      - node: ex:square
    rules:
      - function: computeArea
"#,
    )
    .unwrap();

    let store = TripleStore::new();
    RdfParser::load_file(&store, &data, RdfFormat::Turtle).unwrap();
    let shapes = ValidationPlan::from_file(&plan).unwrap().shapes(&registry()).unwrap();

    let engine = engine();
    let rules = engine.apply_all_rules(&store, &shapes).unwrap();
    assert_eq!(rules.inferred, 1);
    let square = Term::from(ex("square"));
    let area = NamedNode::new(format!("{}area", RECTANGLE_NS)).unwrap();
    let values = store.find(Some(&square), Some(&Term::from(area)), None).objects();
    assert_eq!(values[0].lex(), Some("9"));

    let report = engine.validate(&store, &shapes).unwrap();
    assert!(!report.conforms);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].shape, "Sociable");
    assert_eq!(report.results[0].focus_node, Term::from(ex("alice")));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["results"][0]["source"], "hasMaxCount");
    assert_eq!(json["results"][0]["focusNode"], "<http://example.org/alice>");
}

#[test]
fn test_panicking_function_does_not_abort_pass() {
    let store = TripleStore::from_triples(
        (0..50).map(|i| Triple::new(ex(&format!("n{}", i)), rdf_type(), NamedNode::new(vocab::OWL_THING).unwrap())),
    );
    let fragile = NativeFunction::constraint("fragile", |inv| {
        let this = inv.this()?;
        if this.uri().is_some_and(|u| u.ends_with('7')) {
            panic!("unlucky number");
        }
        Ok(true)
    });
    let shape = Shape::new("S")
        .with_target_function(binding("findThings"))
        .with_constraint(FunctionBinding::new(fragile.into_shared()));

    let report = engine().validate_shape(&store, &shape).unwrap();
    assert!(report.results.is_empty());
    // n7, n17, n27, n37, n47
    assert_eq!(report.faults.len(), 5);
    assert!(!report.conforms);
}
