//! Benchmarks the full grounding pipeline over a small synthetic theory:
//! one binary "Friends" predicate, one unary "Smokes"/"Cancer" pair, and
//! the textbook `Smokes(x) ^ Friends(x,y) => Smokes(y)` clause.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use rustc_hash::FxHashMap;

use mln_core::config::GroundingConfig;
use mln_ground::clause::{AtomTemplate, Clause, Literal, Term};
use mln_ground::evidence::{EvidenceDb, EvidenceDbBuilder};
use mln_ground::identity::AtomIdentityFunction;
use mln_ground::predicate_space::PredicateSpace;
use mln_ground::schema::{AtomSignature, Schema};
use mln_ground::{ConstantsSet, GroundingBuilder, Mln};

fn build_theory(n_people: usize) -> Mln {
    let people = Arc::new(ConstantsSet::new((0..n_people).map(|i| format!("p{i}"))));

    let smokes_sig = AtomSignature::new("Smokes", 1);
    let cancer_sig = AtomSignature::new("Cancer", 1);
    let friends_sig = AtomSignature::new("Friends", 2);

    let smokes_id = AtomIdentityFunction::new(smokes_sig.clone(), vec![people.clone()], 1);
    let cancer_id = AtomIdentityFunction::new(cancer_sig.clone(), vec![people.clone()], 1);
    let friends_id = AtomIdentityFunction::new(friends_sig.clone(), vec![people.clone(), people.clone()], 1);

    let space = PredicateSpace::build(vec![cancer_id], vec![], vec![smokes_id, friends_id]);

    let mut schema = Schema::new();
    schema.predicate_schema.insert(smokes_sig.clone(), vec!["Person".into()]);
    schema.predicate_schema.insert(cancer_sig.clone(), vec!["Person".into()]);
    schema
        .predicate_schema
        .insert(friends_sig.clone(), vec!["Person".into(), "Person".into()]);

    let mut constants = FxHashMap::default();
    constants.insert("Person".to_string(), people);

    let friends_id = space.identity_of(&friends_sig).unwrap();
    let smokes_id_fn = space.identity_of(&smokes_sig).unwrap();

    let mut evidence_builder = EvidenceDbBuilder::new();
    evidence_builder.mark_closed_world(friends_sig.clone());
    evidence_builder.mark_closed_world(smokes_sig.clone());
    for i in 0..n_people {
        if i + 1 < n_people {
            let a = format!("p{i}");
            let b = format!("p{}", i + 1);
            let atom = friends_id.encode_symbols(&[&a, &b]).unwrap();
            evidence_builder.assert_true(friends_sig.clone(), atom).unwrap();
        }
        if i % 3 == 0 {
            let atom = smokes_id_fn.encode_symbols(&[&format!("p{i}")]).unwrap();
            evidence_builder.assert_true(smokes_sig.clone(), atom).unwrap();
        }
    }
    let evidence: EvidenceDb = evidence_builder.build();

    let clause = Clause::new(
        0,
        1.5,
        vec![
            Literal::negative(AtomTemplate::new(smokes_sig.clone(), vec![Term::Var(0)])),
            Literal::negative(AtomTemplate::new(friends_sig, vec![Term::Var(0), Term::Var(1)])),
            Literal::positive(AtomTemplate::new(smokes_sig.clone(), vec![Term::Var(1)])),
        ],
    );

    Mln {
        schema,
        constants,
        clauses: vec![clause],
        space,
        evidence,
    }
}

fn bench_grounding(c: &mut Criterion) {
    let mln = build_theory(30);
    c.bench_function("ground_smokes_friends_30_people", |b| {
        b.iter(|| {
            let config = GroundingConfig::default();
            GroundingBuilder::new(&mln, config).build().unwrap()
        })
    });
}

criterion_group!(benches, bench_grounding);
criterion_main!(benches);
