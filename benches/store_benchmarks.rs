use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use shapecheck::rdf::{Literal, NamedNode, Term, Triple, TripleStore};
use shapecheck::validation::{EngineConfig, FunctionBinding, FunctionRegistry, Shape, ValidationEngine};

fn ex(s: &str) -> NamedNode {
    NamedNode::new(format!("http://example.org/{}", s)).unwrap()
}

/// People with a name, an age and a few acquaintances each
fn build_store(size: usize) -> TripleStore {
    let mut triples = Vec::with_capacity(size * 5);
    for i in 0..size {
        let person = ex(&format!("person{}", i));
        triples.push(Triple::new(person.clone(), ex("name"), Literal::new_simple_literal(format!("Person{}", i))));
        triples.push(Triple::new(person.clone(), ex("age"), Literal::new_simple_literal((i % 100).to_string())));
        for k in 1..=3 {
            triples.push(Triple::new(person.clone(), ex("knows"), ex(&format!("person{}", (i + k * 17) % size))));
        }
    }
    TripleStore::from_triples(triples)
}

/// Benchmark triple insertion throughput
fn bench_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("insertion");

    for size in [100, 1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| build_store(size));
        });
    }
    group.finish();
}

/// Benchmark a bound-predicate lookup against filtering a full scan
fn bench_find_by_predicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_by_predicate");

    for size in [100, 1000, 10_000].iter() {
        let store = build_store(*size);
        let age = Term::from(ex("age"));

        group.bench_with_input(BenchmarkId::new("indexed", size), size, |b, _| {
            b.iter(|| store.find(None, Some(&age), None).collect_triples().len());
        });
        group.bench_with_input(BenchmarkId::new("full_scan", size), size, |b, _| {
            b.iter(|| {
                store
                    .find(None, None, None)
                    .collect_triples()
                    .into_iter()
                    .filter(|t| t.predicate.as_str() == "http://example.org/age")
                    .count()
            });
        });
    }
    group.finish();
}

/// Benchmark hasMaxCount over every person, sequential and parallel
fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    let registry = FunctionRegistry::with_builtins();

    for size in [1000, 10_000].iter() {
        let store = build_store(*size);
        let mut shape = Shape::new("Acquaintances").with_path(ex("knows")).with_constraint(
            FunctionBinding::new(registry.get("hasMaxCount").unwrap())
                .with_param("maxCount", Literal::new_simple_literal("2")),
        );
        for i in 0..*size {
            shape = shape.with_target_node(ex(&format!("person{}", i)));
        }

        for (label, config) in [("sequential", EngineConfig::sequential()), ("parallel", EngineConfig::default())] {
            let engine = ValidationEngine::new(config).unwrap();
            group.bench_with_input(BenchmarkId::new(label, size), size, |b, _| {
                b.iter(|| engine.validate_shape(&store, &shape).unwrap().results.len());
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insertion,
    bench_find_by_predicate,
    bench_validation
);
criterion_main!(benches);
