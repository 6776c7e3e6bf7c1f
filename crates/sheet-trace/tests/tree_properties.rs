//! Property tests for dependency tree construction over random column graphs

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use sheet_trace::prelude::*;

const WIDTH: usize = 5;

/// For each column, the columns its formula reads; no references means a
/// static value
fn graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    proptest::collection::vec(proptest::collection::vec(0..WIDTH, 0..=3), WIDTH)
}

/// Drop every reference pointing left or at itself
fn acyclic(graph: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    graph
        .into_iter()
        .enumerate()
        .map(|(i, refs)| refs.into_iter().filter(|&r| r > i).collect())
        .collect()
}

fn letters(i: usize) -> String {
    ColumnId::new(i as u16).unwrap().letters()
}

fn workbook(graph: &[Vec<usize>]) -> Workbook {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(0).unwrap();
    for (i, refs) in graph.iter().enumerate() {
        let col = i as u16;
        sheet.set_cell_value_at(0, col, format!("Col{}", i)).unwrap();
        if refs.is_empty() {
            sheet.set_cell_value_at(1, col, i as f64).unwrap();
        } else {
            let terms: Vec<String> = refs.iter().map(|&r| format!("{}2", letters(r))).collect();
            sheet.set_cell_formula_at(1, col, &terms.join("+")).unwrap();
        }
    }
    wb
}

/// Formula-order references with repeats removed
fn expected_children(graph: &[Vec<usize>], column: usize) -> Vec<ColumnId> {
    let mut seen = Vec::new();
    for &r in &graph[column] {
        let id = ColumnId::new(r as u16).unwrap();
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn check(
    graph: &[Vec<usize>],
    node: &DependencyNode,
    path: &mut Vec<ColumnId>,
) -> Result<(), TestCaseError> {
    let repeated = path.contains(&node.column);
    prop_assert_eq!(node.terminal == Terminal::Cyclic, repeated);
    prop_assert_ne!(node.terminal, Terminal::DepthLimited);

    if repeated {
        prop_assert!(node.is_leaf());
        return Ok(());
    }

    let index = node.column.index() as usize;
    let children: Vec<ColumnId> = node.children.iter().map(|c| c.column).collect();
    prop_assert_eq!(children, expected_children(graph, index));

    path.push(node.column);
    for child in &node.children {
        check(graph, child, path)?;
    }
    path.pop();
    Ok(())
}

fn trace(wb: &Workbook, root: usize) -> DependencyNode {
    let resolver = ColumnResolver::new(wb);
    let options = TraceOptions {
        max_depth: WIDTH + 1,
        ..TraceOptions::default()
    };
    TreeBuilder::new(&resolver, options)
        .build("Sheet1", ColumnId::new(root as u16).unwrap())
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cyclic_exactly_when_an_ancestor_repeats(g in graph(), root in 0..WIDTH) {
        let wb = workbook(&g);
        let tree = trace(&wb, root);
        check(&g, &tree, &mut Vec::new())?;
        // No path can be longer than the number of columns plus the closing repeat
        prop_assert!(tree.depth() <= WIDTH);
    }

    #[test]
    fn acyclic_graphs_have_no_cycles(g in graph().prop_map(acyclic), root in 0..WIDTH) {
        let wb = workbook(&g);
        let tree = trace(&wb, root);
        prop_assert!(tree.walk().all(|n| n.terminal == Terminal::Normal));
        prop_assert!(tree.walk().all(|n| !n.is_leaf() || n.formula().is_none()));
    }

    #[test]
    fn building_twice_gives_the_same_tree(g in graph(), root in 0..WIDTH) {
        let wb = workbook(&g);
        prop_assert_eq!(trace(&wb, root), trace(&wb, root));
    }
}
