//! Triple store and cursor behavior through the public API
//!
//! Covers:
//! - exact-match lookups for every inserted triple
//! - wildcard queries against a filtered full scan
//! - cursor exhaustion, close and lock release
//! - mutation conflicts leaving the store untouched

use shapecheck::rdf::{Literal, NamedNode, RdfFormat, RdfParser, StoreError, Term, Triple, TripleStore};
use std::collections::HashMap;

fn ex(s: &str) -> NamedNode {
    NamedNode::new(format!("http://example.org/{}", s)).unwrap()
}

fn sample() -> Vec<Triple> {
    let mut triples = Vec::new();
    for i in 0..30 {
        let person = ex(&format!("person{}", i));
        triples.push(Triple::new(person.clone(), ex("age"), Literal::new_simple_literal((20 + i % 5).to_string())));
        triples.push(Triple::new(person.clone(), ex("knows"), ex(&format!("person{}", (i + 1) % 30))));
        if i % 3 == 0 {
            triples.push(Triple::new(person.clone(), ex("knows"), ex(&format!("person{}", (i + 7) % 30))));
            triples.push(Triple::new(
                person,
                ex("label"),
                Literal::new_language_tagged_literal(format!("Person {}", i), "en").unwrap(),
            ));
        }
    }
    triples
}

fn multiset(triples: impl IntoIterator<Item = Triple>) -> HashMap<Triple, usize> {
    let mut counts = HashMap::new();
    for t in triples {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_every_inserted_triple_is_found_exactly_once() {
    let triples = sample();
    let store = TripleStore::from_triples(triples.clone());

    for t in &triples {
        let s = Term::from(t.subject.clone());
        let p = Term::from(t.predicate.clone());
        let found = store.find(Some(&s), Some(&p), Some(&t.object)).collect_triples();
        assert_eq!(found, vec![t.clone()]);
    }
}

#[test]
fn test_wildcards_match_filtered_full_scan() {
    let store = TripleStore::from_triples(sample());
    let all = store.find(None, None, None).collect_triples();
    assert_eq!(all.len(), store.len());

    for predicate in ["age", "knows", "label", "missing"] {
        let p = Term::from(ex(predicate));
        let indexed = store.find(None, Some(&p), None).collect_triples();
        let scanned = all.iter().filter(|t| Term::from(t.predicate.clone()) == p).cloned();
        assert_eq!(multiset(indexed), multiset(scanned), "predicate {}", predicate);
    }

    let target = Term::from(ex("person1"));
    let indexed = store.find(None, None, Some(&target)).collect_triples();
    let scanned = all.iter().filter(|t| t.object == target).cloned();
    assert_eq!(multiset(indexed), multiset(scanned));

    let s = Term::from(ex("person0"));
    let indexed = store.find(Some(&s), None, Some(&Term::from(ex("person7")))).collect_triples();
    assert_eq!(indexed.len(), 1);
}

#[test]
fn test_language_tags_compare_case_insensitively() {
    let store = TripleStore::new();
    let upper = Literal::new_language_tagged_literal("Haus", "DE").unwrap();
    let lower = Literal::new_language_tagged_literal("Haus", "de").unwrap();
    assert!(store.insert(Triple::new(ex("a"), ex("label"), upper)).unwrap());
    assert!(!store.insert(Triple::new(ex("a"), ex("label"), lower.clone())).unwrap());

    let found = store.find(None, None, Some(&Term::from(lower))).collect_triples();
    assert_eq!(found.len(), 1);
}

#[test]
fn test_cursor_lifecycle() {
    let store = TripleStore::from_triples(sample());
    let knows = Term::from(ex("knows"));

    let mut cursor = store.find(None, Some(&knows), None);
    let mut seen = 0;
    while cursor.next_triple().unwrap().is_some() {
        seen += 1;
    }
    assert_eq!(seen, 40);
    assert_eq!(cursor.next_triple().unwrap(), None);
    assert_eq!(cursor.next_triple().unwrap(), None);

    let mut early = store.find(None, Some(&knows), None);
    early.next_triple().unwrap();
    early.close();
    early.close();
    assert_eq!(early.next_triple(), Err(StoreError::CursorClosed));
}

#[test]
fn test_mutation_conflict_preserves_store() {
    let store = TripleStore::from_triples(sample());
    let before = store.triples();

    {
        let mut cursor = store.find(None, None, None);
        cursor.next_triple().unwrap();

        let batch = vec![
            Triple::new(ex("new1"), ex("p"), ex("o")),
            Triple::new(ex("new2"), ex("p"), ex("o")),
        ];
        assert_eq!(store.insert_all(&batch), Err(StoreError::MutationConflict));
        assert_eq!(
            store.remove(&before[0]),
            Err(StoreError::MutationConflict)
        );
    }

    assert_eq!(store.triples(), before);
    assert!(store.insert(Triple::new(ex("new1"), ex("p"), ex("o"))).unwrap());
}

#[test]
fn test_cursors_on_many_threads() {
    let store = TripleStore::from_triples(sample());
    let knows = Term::from(ex("knows"));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let found = store.find(None, Some(&knows), None).collect_triples();
                assert_eq!(found.len(), 40);
            });
        }
    });
}

#[test]
fn test_load_turtle_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.ttl");
    std::fs::write(
        &path,
        r#"
        @prefix ex: <http://example.org/> .
        ex:alice ex:knows ex:bob , ex:carol ;
                 ex:age 30 .
        "#,
    )
    .unwrap();

    let store = TripleStore::new();
    assert_eq!(RdfParser::load_file(&store, &path, RdfFormat::Turtle).unwrap(), 3);
    let alice = Term::from(ex("alice"));
    assert_eq!(store.find(Some(&alice), Some(&Term::from(ex("knows"))), None).objects().len(), 2);
}
