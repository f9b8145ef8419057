use packgraph_engine::{
    compile_rules, enumerate_rules, solve_instance, Budget, Catalog, Instance, PackGraph,
    SolveOutcome, State, Track,
};
use packgraph_structs::{
    config::{EnumerationScope, SolveConfig},
    core::{Pack, Solution, Stage, Status},
};
use serde_json::json;
use std::collections::HashMap;

fn instance(value: serde_json::Value) -> Instance {
    serde_json::from_value(value).unwrap()
}

fn sequential() -> SolveConfig {
    SolveConfig {
        parallel: false,
        ..SolveConfig::default()
    }
}

fn packed(outcome: SolveOutcome) -> Solution {
    match outcome {
        SolveOutcome::Packed(solution) => solution,
        other => panic!("Expected a solution, got {:?}", other),
    }
}

// Fewest edges summing to `state`, by exhaustive memoised recursion.
fn fewest_packs(
    state: &State,
    edges: &[State],
    memo: &mut HashMap<State, Option<usize>>,
) -> Option<usize> {
    if state.is_zero() {
        return Some(0);
    }
    if let Some(known) = memo.get(state) {
        return *known;
    }
    let best = edges
        .iter()
        .filter(|edge| state.feasible(edge))
        .filter_map(|edge| fewest_packs(&state.move_by(edge), edges, memo))
        .min()
        .map(|n| n + 1);
    memo.insert(state.clone(), best);
    best
}

#[test]
fn test_two_packs_of_two() {
    let instance = instance(json!({
        "items": [{"id": 0, "cid": 0, "num": 4, "w": 1, "p": 1}],
        "pack-rules": [{"cids": [0], "Ws": [], "Ps": [], "Ns": [{"subcids": [0], "N": 2}]}]
    }));
    let report = solve_instance(&instance, &SolveConfig::default()).unwrap();
    assert_eq!(report.num_edges, 1);
    let pack = Pack {
        rule: 0,
        items: [(0, 2)].into_iter().collect(),
    };
    assert_eq!(
        packed(report.outcome),
        Solution {
            packs: vec![pack.clone(), pack]
        }
    );
}

#[test]
fn test_uncovered_category_is_infeasible() {
    let instance = instance(json!({
        "items": [{"id": 0, "cid": 1, "num": 3, "w": 1, "p": 1}],
        "pack-rules": [{"cids": [0], "Ns": [{"subcids": [0], "N": 2}]}]
    }));
    let report = solve_instance(&instance, &sequential()).unwrap();
    assert_eq!(report.num_edges, 0);
    assert_eq!(report.outcome, SolveOutcome::Infeasible);
    assert_eq!(report.to_output_data().status, Status::Infeasible);
}

#[test]
fn test_empty_inventory_needs_no_packs() {
    let instance = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 0, "w": 1, "p": 1},
            {"id": 1, "cid": 1, "num": 0, "w": 1, "p": 1}
        ],
        "pack-rules": []
    }));
    let report = solve_instance(&instance, &sequential()).unwrap();
    assert_eq!(report.outcome, SolveOutcome::Packed(Solution::new()));
}

#[test]
fn test_maximal_packs_can_leave_remainders() {
    // Maximal packs are (2,0), (1,1) and (0,2). (3,1) splits into two of them, (3,2) cannot be
    // covered exactly.
    let rules = json!([{"cids": [0], "Ws": [{"subcids": [0], "W": 3.0}]}]);
    let coverable = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 3, "w": 1.5, "p": 0},
            {"id": 1, "cid": 0, "num": 1, "w": 1.0, "p": 0}
        ],
        "pack-rules": rules.clone()
    }));
    let solution = packed(solve_instance(&coverable, &sequential()).unwrap().outcome);
    assert_eq!(solution.num_packs(), 2);
    coverable.verify_solution(&solution).unwrap();

    let uncoverable = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 3, "w": 1.5, "p": 0},
            {"id": 1, "cid": 0, "num": 2, "w": 1.0, "p": 0}
        ],
        "pack-rules": rules
    }));
    assert_eq!(
        solve_instance(&uncoverable, &sequential()).unwrap().outcome,
        SolveOutcome::Infeasible
    );
}

#[test]
fn test_generated_solutions_are_valid_and_optimal() {
    let track = Track {
        num_items: 4,
        num_categories: 2,
        max_count: 2,
        num_rules: 2,
    };
    for seed in 0..24u8 {
        let instance = Instance::generate_instance(&[seed; 32], &track).unwrap();
        let catalog = Catalog::new(&instance.items).unwrap();
        let mut rules =
            compile_rules(&instance, &catalog, EnumerationScope::RuleCategories).unwrap();
        assert!(enumerate_rules(&mut rules, &catalog, &Budget::unlimited(), false));
        let graph = PackGraph::new(&catalog, &rules);
        assert!(graph.edges().iter().all(|edge| !edge.is_zero()));

        let solution = packed(graph.solve(&Budget::unlimited()));
        instance.verify_solution(&solution).unwrap();

        // Prefix sums stay within the inventory and the total matches it
        let source = graph.source();
        let mut prefix = State::zeros(catalog.len());
        for pack in solution.packs.iter() {
            prefix = prefix.add(&catalog.state_from_items(&pack.items).unwrap());
            assert!(source.feasible(&prefix));
        }
        assert_eq!(prefix, source);

        let fewest = fewest_packs(&source, graph.edges(), &mut HashMap::new());
        assert_eq!(Some(solution.num_packs()), fewest);
    }
}

#[test]
fn test_parallel_matches_sequential() {
    for seed in 0..8u8 {
        let instance = Instance::generate_instance(&[seed; 32], &Track::default()).unwrap();
        let parallel = solve_instance(&instance, &SolveConfig::default()).unwrap();
        let serial = solve_instance(&instance, &sequential()).unwrap();
        assert_eq!(parallel.outcome, serial.outcome);
        assert_eq!(parallel.num_edges, serial.num_edges);
    }
}

#[test]
fn test_full_catalog_scope_is_infeasible_across_categories() {
    let instance = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 2, "w": 1, "p": 1},
            {"id": 1, "cid": 1, "num": 1, "w": 1, "p": 1}
        ],
        "pack-rules": [
            {"cids": [0], "Ns": [{"subcids": [0], "N": 2}]},
            {"cids": [1], "Ns": [{"subcids": [1], "N": 1}]}
        ]
    }));
    let solution = packed(solve_instance(&instance, &sequential()).unwrap().outcome);
    assert_eq!(solution.num_packs(), 2);
    assert_eq!(solution.packs[0].rule, 0);
    assert_eq!(solution.packs[1].rule, 1);

    let config = SolveConfig {
        scope: EnumerationScope::FullCatalog,
        ..sequential()
    };
    assert_eq!(
        solve_instance(&instance, &config).unwrap().outcome,
        SolveOutcome::Infeasible
    );
}

#[test]
fn test_template_reaches_other_category() {
    let instance = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 1, "w": 1, "p": 1},
            {"id": 1, "cid": 1, "num": 1, "w": 1, "p": 1}
        ],
        "pack-rules": [{"cids": [0], "Ns": [{"subcids": [0, 1], "N": 2}]}]
    }));
    let expected = Solution {
        packs: vec![Pack {
            rule: 0,
            items: [(0, 1), (1, 1)].into_iter().collect(),
        }],
    };
    for scope in [EnumerationScope::RuleCategories, EnumerationScope::FullCatalog] {
        let config = SolveConfig {
            scope,
            ..sequential()
        };
        let report = solve_instance(&instance, &config).unwrap();
        assert_eq!(report.num_edges, 1);
        let solution = packed(report.outcome);
        assert_eq!(solution, expected);
        instance.verify_solution(&solution).unwrap();
    }
}

#[test]
fn test_enumeration_abort() {
    let instance = Instance::generate_instance(&[4; 32], &Track::default()).unwrap();
    let config = SolveConfig {
        max_steps: Some(1),
        ..sequential()
    };
    let report = solve_instance(&instance, &config).unwrap();
    assert_eq!(
        report.outcome,
        SolveOutcome::Aborted {
            stage: Stage::Enumeration,
            steps: 1
        }
    );
    let output_data = report.to_output_data();
    assert_eq!(output_data.status, Status::Aborted);
    assert_eq!(output_data.aborted_stage(), Some(&Stage::Enumeration));
    assert!(output_data.solution().is_none());
}

#[test]
fn test_enumerate_rules_reports_incomplete_edges() {
    let instance = Instance::generate_instance(&[4; 32], &Track::default()).unwrap();
    let catalog = Catalog::new(&instance.items).unwrap();
    for parallel in [false, true] {
        let mut rules =
            compile_rules(&instance, &catalog, EnumerationScope::RuleCategories).unwrap();
        let budget = Budget::new(Some(1), None);
        assert!(!enumerate_rules(&mut rules, &catalog, &budget, parallel));
        assert!(budget.is_exhausted());
    }
}

#[test]
fn test_search_abort() {
    let instance = instance(json!({
        "items": [{"id": 0, "cid": 0, "num": 4, "w": 1, "p": 1}],
        "pack-rules": [{"cids": [0], "Ns": [{"subcids": [0], "N": 2}]}]
    }));
    let catalog = Catalog::new(&instance.items).unwrap();
    let mut rules = compile_rules(&instance, &catalog, EnumerationScope::RuleCategories).unwrap();
    assert!(enumerate_rules(&mut rules, &catalog, &Budget::unlimited(), false));
    let graph = PackGraph::new(&catalog, &rules);
    assert_eq!(
        graph.solve(&Budget::new(Some(1), None)),
        SolveOutcome::Aborted {
            stage: Stage::Search,
            steps: 1
        }
    );
}

#[test]
fn test_short_key_input_format() {
    let instance = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 2, "w": 1.0, "p": 30},
            {"id": 1, "cid": 0, "num": 1, "w": 2.5, "p": 80},
            {"id": 2, "cid": 1, "num": 3, "w": 0.5, "p": 5}
        ],
        "pack-rules": [
            {
                "cids": [0, 1],
                "Ws": [{"subcids": [0, 1], "W": 6.0}],
                "Ps": [{"subcids": [0, 1], "P": 160}],
                "Ns": [{"subcids": [0, 1], "N": 6}, {"subcids": [1], "N": 3}]
            }
        ]
    }));
    assert_eq!(instance.items[1].weight, 2.5);
    assert_eq!(instance.pack_rules[0].count_rules[1].bound, 3.0);

    // Everything fits in a single pack
    let solution = packed(solve_instance(&instance, &sequential()).unwrap().outcome);
    instance.verify_solution(&solution).unwrap();
    assert_eq!(solution.num_packs(), 1);
    assert_eq!(solution.totals().values().sum::<u64>(), 6);
}

#[test]
fn test_long_form_input_keys() {
    let instance = instance(json!({
        "items": [{"id": 3, "category": 0, "count": 2, "weight": 1, "price": 1}],
        "pack_rules": [{"categories": [0], "count_rules": [{"subset": [0], "bound": 1}]}]
    }));
    let solution = packed(solve_instance(&instance, &sequential()).unwrap().outcome);
    assert_eq!(solution.num_packs(), 2);
    assert_eq!(solution.packs[0].items.get(&3), Some(&1));
}

#[test]
fn test_malformed_input() {
    let duplicate = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 1, "w": 1, "p": 1},
            {"id": 0, "cid": 1, "num": 1, "w": 1, "p": 1}
        ]
    }));
    assert_eq!(
        solve_instance(&duplicate, &sequential()).unwrap_err().to_string(),
        "Duplicate item id (0)"
    );

    let negative = instance(json!({
        "items": [{"id": 0, "cid": 0, "num": 1, "w": -1, "p": 1}]
    }));
    assert!(solve_instance(&negative, &sequential()).is_err());
}

#[test]
fn test_verify_solution_rejects_bad_packs() {
    let instance = instance(json!({
        "items": [
            {"id": 0, "cid": 0, "num": 4, "w": 1, "p": 1},
            {"id": 1, "cid": 1, "num": 1, "w": 1, "p": 1}
        ],
        "pack-rules": [
            {"cids": [0], "Ns": [{"subcids": [0], "N": 2}]},
            {"cids": [1], "Ns": [{"subcids": [1], "N": 1}]}
        ]
    }));
    let pack = |rule: usize, items: &[(usize, u32)]| Pack {
        rule,
        items: items.iter().cloned().collect(),
    };
    let valid = Solution {
        packs: vec![pack(0, &[(0, 2)]), pack(1, &[(1, 1)]), pack(0, &[(0, 2)])],
    };
    instance.verify_solution(&valid).unwrap();

    // Non-maximal packs are still legal
    let small = Solution {
        packs: vec![
            pack(0, &[(0, 1)]),
            pack(0, &[(0, 1)]),
            pack(0, &[(0, 2)]),
            pack(1, &[(1, 1)]),
        ],
    };
    instance.verify_solution(&small).unwrap();

    let over_bound = Solution {
        packs: vec![pack(0, &[(0, 3)]), pack(0, &[(0, 1)]), pack(1, &[(1, 1)])],
    };
    assert!(instance.verify_solution(&over_bound).is_err());

    let unconstrained_item = Solution {
        packs: vec![pack(0, &[(0, 2)]), pack(0, &[(0, 1), (1, 1)]), pack(0, &[(0, 1)])],
    };
    assert!(instance.verify_solution(&unconstrained_item).is_err());

    let missing_rule = Solution {
        packs: vec![pack(5, &[(0, 2)])],
    };
    assert!(instance.verify_solution(&missing_rule).is_err());

    let unknown_item = Solution {
        packs: vec![pack(0, &[(7, 1)])],
    };
    assert!(instance.verify_solution(&unknown_item).is_err());

    let incomplete = Solution {
        packs: vec![pack(0, &[(0, 2)])],
    };
    assert!(instance.verify_solution(&incomplete).is_err());

    let too_many = Solution {
        packs: vec![
            pack(0, &[(0, 2)]),
            pack(0, &[(0, 2)]),
            pack(0, &[(0, 2)]),
            pack(1, &[(1, 1)]),
        ],
    };
    assert!(instance.verify_solution(&too_many).is_err());
}
