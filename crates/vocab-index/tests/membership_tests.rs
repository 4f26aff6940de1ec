//! Integration tests for membership evaluation.
//!
//! Fixture assignments:
//!
//! | Holder | Items |
//! |--------|-------|
//! | 1 | 1, 3 |
//! | 2 | 2, 3 |
//! | 3 | 1, 3, 6 |
//! | 4 | (none) |

use vocab_index::{HolderId, ItemId, MembershipEvaluator, MemoryStore, Operator, VocabError};

fn holder_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for (holder, items) in [(1, vec![1, 3]), (2, vec![2, 3]), (3, vec![1, 3, 6])] {
        for item in items {
            store.assign(holder, item);
        }
    }
    store.add_holder(4);
    store
}

fn eval(store: &MemoryStore, operator: Operator, values: &[ItemId]) -> Vec<HolderId> {
    MembershipEvaluator::new(store)
        .evaluate(operator, values)
        .expect("evaluate")
        .to_vec()
}

#[test]
fn test_requires_any() {
    let store = holder_store();
    assert_eq!(eval(&store, Operator::RequiresAny, &[3]), vec![1, 2, 3]);
    assert_eq!(eval(&store, Operator::RequiresAny, &[2, 6]), vec![2, 3]);
}

#[test]
fn test_requires_all() {
    let store = holder_store();
    assert_eq!(eval(&store, Operator::RequiresAll, &[1, 3]), vec![1, 3]);
    assert_eq!(eval(&store, Operator::RequiresAll, &[1, 2]), Vec::<HolderId>::new());
}

#[test]
fn test_excludes_all() {
    let store = holder_store();
    // Holders assigned neither 1 nor 5.
    assert_eq!(eval(&store, Operator::ExcludesAll, &[1, 5]), vec![2, 4]);
}

#[test]
fn test_excludes_any() {
    let store = holder_store();
    // Nobody holds both 1 and 2, so everybody is missing one of them.
    assert_eq!(eval(&store, Operator::ExcludesAny, &[1, 2]), vec![1, 2, 3, 4]);
    // Holder 2 is the only one lacking 1 or 3 (besides holder 4).
    assert_eq!(eval(&store, Operator::ExcludesAny, &[1, 3]), vec![2, 4]);
}

#[test]
fn test_only_checks_total_assignment_count() {
    let store = holder_store();
    // Holder 3 has 1 and 6 but also 3, so it does not qualify.
    assert!(eval(&store, Operator::Only, &[1, 6]).is_empty());
    assert_eq!(eval(&store, Operator::Only, &[1, 3]), vec![1]);
    assert_eq!(eval(&store, Operator::Only, &[1, 3, 6]), vec![3]);
}

#[test]
fn test_only_after_extra_item_removed() {
    let mut store = holder_store();
    store.unassign(3, 3);
    assert_eq!(eval(&store, Operator::Only, &[1, 6]), vec![3]);
}

#[test]
fn test_named_operators() {
    let store = holder_store();
    let evaluator = MembershipEvaluator::new(&store);

    let cases: [(&str, Vec<ItemId>, Vec<HolderId>); 5] = [
        ("in", vec![3], vec![1, 2, 3]),
        ("all", vec![1, 3], vec![1, 3]),
        ("-in", vec![1, 3], vec![2, 4]),
        ("-all", vec![1, 5], vec![2, 4]),
        ("only", vec![1, 3], vec![1]),
    ];

    for (name, values, expected) in cases {
        let result = evaluator.evaluate_named(name, &values).unwrap();
        assert_eq!(result.to_vec(), expected, "operator {name}");
    }
}

#[test]
fn test_errors_return_no_partial_result() {
    let store = holder_store();
    let evaluator = MembershipEvaluator::new(&store);

    assert!(matches!(
        evaluator.evaluate_named("none", &[1]),
        Err(VocabError::InvalidOperator(name)) if name == "none"
    ));
    assert!(matches!(
        evaluator.evaluate_named("only", &[]),
        Err(VocabError::EmptyValueSet)
    ));
}

#[test]
fn test_result_reflects_store_at_query_time() {
    let mut store = holder_store();
    assert_eq!(eval(&store, Operator::RequiresAny, &[9]), Vec::<HolderId>::new());

    store.assign(4, 9);
    assert_eq!(eval(&store, Operator::RequiresAny, &[9]), vec![4]);
}

#[test]
fn test_stats() {
    let store = holder_store();
    let result = MembershipEvaluator::new(&store)
        .evaluate(Operator::ExcludesAll, &[1, 5, 5])
        .unwrap();

    assert_eq!(result.stats.value_count, 2);
    assert_eq!(result.stats.holders_aggregated, 2);
    assert_eq!(result.stats.universe_size, Some(4));
}
