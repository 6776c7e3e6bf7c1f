//! Dependency tree construction
//!
//! Expands a root column into the tree of columns its formula reads from,
//! transitively. Expansion is depth-first and carries the chain of ancestors
//! explicitly, so a column reached along two different paths is expanded
//! twice (a diamond) while a column that reappears among its own ancestors
//! ends the branch as a cycle.
//!
//! # Example
//!
//! ```rust
//! use sheet_trace::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "Qty").unwrap();
//! sheet.set_cell_value("B1", "Total").unwrap();
//! sheet.set_cell_value("A2", 3.0).unwrap();
//! sheet.set_cell_formula("B2", "=A2*2").unwrap();
//!
//! let resolver = ColumnResolver::new(&workbook);
//! let builder = TreeBuilder::new(&resolver, TraceOptions::default());
//! let tree = builder.build("Sheet1", ColumnSelector::header("Total")).unwrap();
//!
//! assert_eq!(tree.children.len(), 1);
//! assert_eq!(tree.readable_formula.as_deref(), Some("=Qty*2"));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use sheet_trace_core::{ColumnId, SheetSource};
use sheet_trace_formula::{dedup, render, scan, LookupRole, Reference, ReferenceKind};
use tracing::{debug, warn};

use crate::error::{TraceError, TraceResult};
use crate::resolver::{ColumnInfo, ColumnResolver, RowConfig};

/// Default limit on how many levels below the root are expanded
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Which lookup-value references count as dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupValueRows {
    /// Track the lookup value whatever row it names
    #[default]
    AnyRow,
    /// Track it only when it names the formula row, or no row at all
    FormulaRowOnly,
}

/// Options for building a dependency tree
#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Header and formula rows
    pub rows: RowConfig,
    /// Formula columns deeper than this become [`Terminal::DepthLimited`]
    pub max_depth: usize,
    pub lookup_value_rows: LookupValueRows,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            rows: RowConfig::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            lookup_value_rows: LookupValueRows::default(),
        }
    }
}

/// Cooperative cancellation flag, checked before each node is expanded
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every trace holding a clone of this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How the root column is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Letter(ColumnId),
    /// Header text, matched as in [`ColumnResolver::find_column`]
    Header(String),
}

impl ColumnSelector {
    /// Select by header text
    pub fn header<S: Into<String>>(header: S) -> Self {
        ColumnSelector::Header(header.into())
    }
}

impl From<ColumnId> for ColumnSelector {
    fn from(column: ColumnId) -> Self {
        ColumnSelector::Letter(column)
    }
}

/// Why a node has no children (or `Normal` when it may have some)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Normal,
    /// The column already appears among this node's ancestors
    Cyclic,
    /// Expansion stopped at the depth limit
    DepthLimited,
    /// The referenced sheet does not exist
    MissingSheet,
}

/// How a child was reached from its parent's formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Plain reference
    Direct,
    /// The value a lookup searches for
    LookupValue,
    /// A column scanned by a lookup
    LookupTable,
    /// The table column a lookup returns
    LookupResult,
}

/// One column in a dependency tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyNode {
    pub sheet: String,
    pub column: ColumnId,
    pub info: ColumnInfo,
    /// `None` for the root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<Edge>,
    /// The formula with references replaced by header labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable_formula: Option<String>,
    pub terminal: Terminal,
    /// In the order the references appear in the formula
    pub children: Vec<DependencyNode>,
}

impl DependencyNode {
    /// Header of this node's column
    pub fn header(&self) -> &str {
        &self.info.header
    }

    /// Formula text, if the column holds one
    pub fn formula(&self) -> Option<&str> {
        self.info.formula()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order iterator over this node and all its descendants
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Number of nodes in the tree, this one included
    pub fn count(&self) -> usize {
        self.walk().count()
    }

    /// Edges on the longest path from this node down to a leaf
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Every node for `(sheet, column)`, in pre-order
    pub fn find_all(&self, sheet: &str, column: ColumnId) -> Vec<&DependencyNode> {
        self.walk()
            .filter(|node| node.sheet == sheet && node.column == column)
            .collect()
    }
}

/// Pre-order traversal returned by [`DependencyNode::walk`]
pub struct Walk<'a> {
    stack: Vec<&'a DependencyNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a DependencyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// The chain of columns from the root down to the node being expanded
struct Ancestry<'a> {
    sheet: &'a str,
    column: ColumnId,
    parent: Option<&'a Ancestry<'a>>,
}

impl Ancestry<'_> {
    fn contains(&self, sheet: &str, column: ColumnId) -> bool {
        let mut current = Some(self);
        while let Some(link) = current {
            if link.sheet == sheet && link.column == column {
                return true;
            }
            current = link.parent;
        }
        false
    }
}

/// Builds dependency trees against a shared [`ColumnResolver`].
///
/// A builder holds no per-trace state; several threads may build trees from
/// the same builder or resolver at once.
pub struct TreeBuilder<'r, 'a, S: SheetSource + ?Sized> {
    resolver: &'r ColumnResolver<'a, S>,
    options: TraceOptions,
    cancel: Option<CancellationToken>,
}

impl<'r, 'a, S: SheetSource + ?Sized> TreeBuilder<'r, 'a, S> {
    pub fn new(resolver: &'r ColumnResolver<'a, S>, options: TraceOptions) -> Self {
        Self {
            resolver,
            options,
            cancel: None,
        }
    }

    /// Attach a cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// Build the tree rooted at `selector` on `sheet`.
    ///
    /// Fails only when the root cannot be resolved or the trace is cancelled.
    /// Problems below the root become terminal nodes.
    pub fn build(
        &self,
        sheet: &str,
        selector: impl Into<ColumnSelector>,
    ) -> TraceResult<DependencyNode> {
        if !self.resolver.has_sheet(sheet) {
            return Err(TraceError::SheetNotFound(sheet.to_string()));
        }

        let column = match selector.into() {
            ColumnSelector::Letter(column) => column,
            ColumnSelector::Header(header) => {
                self.resolver
                    .find_column(sheet, &header, self.options.rows)?
            }
        };

        debug!(sheet, column = %column, max_depth = self.options.max_depth, "building dependency tree");
        self.expand(sheet, column, None, None, 0)
    }

    fn expand(
        &self,
        sheet: &str,
        column: ColumnId,
        edge: Option<Edge>,
        parent: Option<&Ancestry<'_>>,
        depth: usize,
    ) -> TraceResult<DependencyNode> {
        if self.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(TraceError::Cancelled);
        }

        let rows = self.options.rows;
        let info = self.resolver.resolve(sheet, column, rows)?;
        let readable_formula = info.formula().map(|formula| {
            render(formula, sheet, |target, col| {
                self.resolver.header_label(target, col, rows).ok().flatten()
            })
        });

        let mut node = DependencyNode {
            sheet: sheet.to_string(),
            column,
            info,
            edge,
            readable_formula,
            terminal: Terminal::Normal,
            children: Vec::new(),
        };

        if parent.is_some_and(|p| p.contains(sheet, column)) {
            debug!(sheet, column = %column, "cycle closed");
            node.terminal = Terminal::Cyclic;
            return Ok(node);
        }

        let Some(formula) = node.info.formula().map(str::to_owned) else {
            return Ok(node);
        };

        if depth > self.options.max_depth {
            debug!(sheet, column = %column, depth, "depth limit reached");
            node.terminal = Terminal::DepthLimited;
            return Ok(node);
        }

        // Filter before de-duplicating so a skipped occurrence cannot hide a
        // tracked one of the same column
        let tracked = scan(&formula)
            .into_iter()
            .filter(|reference| {
                let keep = self.tracks(reference);
                if !keep {
                    debug!(sheet, column = %column, row = ?reference.row, "lookup value off the formula row skipped");
                }
                keep
            })
            .collect();
        let references = dedup(tracked, sheet);
        let here = Ancestry {
            sheet,
            column,
            parent,
        };

        let mut children = Vec::new();
        for reference in &references {
            let target = reference.target_sheet(sheet);
            let edge = match reference.role {
                LookupRole::None => Edge::Direct,
                LookupRole::LookupValue => Edge::LookupValue,
                LookupRole::LookupTable { .. } => Edge::LookupTable,
            };

            if !self.resolver.has_sheet(target) {
                warn!(sheet, column = %column, target, "reference to missing sheet");
                let first = reference.first_column();
                children.push(DependencyNode {
                    sheet: target.to_string(),
                    column: first,
                    info: ColumnInfo::blank(first),
                    edge: Some(edge),
                    readable_formula: None,
                    terminal: Terminal::MissingSheet,
                    children: Vec::new(),
                });
                continue;
            }

            if reference.kind == ReferenceKind::Cell && reference.row.is_none() {
                let width = self.resolver.sheet_columns(target, rows)?.len();
                if usize::from(reference.first_column().index()) >= width {
                    debug!(sheet, column = %column, target, word = %reference.first_column(), "bare word past used columns");
                }
            }

            for &col in &reference.columns {
                children.push(self.expand(target, col, Some(edge), Some(&here), depth + 1)?);
            }
            if let Some(result) = reference.result_column() {
                children.push(self.expand(
                    target,
                    result,
                    Some(Edge::LookupResult),
                    Some(&here),
                    depth + 1,
                )?);
            }
        }

        node.children = children;
        Ok(node)
    }

    fn tracks(&self, reference: &Reference) -> bool {
        match (reference.role, self.options.lookup_value_rows) {
            (LookupRole::LookupValue, LookupValueRows::FormulaRowOnly) => reference
                .row
                .map_or(true, |row| row == self.options.rows.formula_row()),
            _ => true,
        }
    }
}

/// Build a tree with default lookup handling and no cancellation
pub fn build_tree<S: SheetSource + ?Sized>(
    resolver: &ColumnResolver<'_, S>,
    sheet: &str,
    column: ColumnId,
    rows: RowConfig,
    max_depth: usize,
) -> TraceResult<DependencyNode> {
    let options = TraceOptions {
        rows,
        max_depth,
        ..TraceOptions::default()
    };
    TreeBuilder::new(resolver, options).build(sheet, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ColumnContent;
    use pretty_assertions::assert_eq;

    fn col(s: &str) -> ColumnId {
        ColumnId::parse(s).unwrap()
    }

    fn leaf(sheet: &str, column: &str, children: Vec<DependencyNode>) -> DependencyNode {
        DependencyNode {
            sheet: sheet.into(),
            column: col(column),
            info: ColumnInfo::blank(col(column)),
            edge: None,
            readable_formula: None,
            terminal: Terminal::Normal,
            children,
        }
    }

    #[test]
    fn test_ancestry_contains() {
        let root = Ancestry {
            sheet: "S",
            column: col("A"),
            parent: None,
        };
        let child = Ancestry {
            sheet: "T",
            column: col("B"),
            parent: Some(&root),
        };
        assert!(child.contains("S", col("A")));
        assert!(child.contains("T", col("B")));
        assert!(!child.contains("T", col("A")));
        assert!(!root.contains("T", col("B")));
    }

    #[test]
    fn test_walk_is_pre_order() {
        let tree = leaf(
            "S",
            "D",
            vec![
                leaf("S", "B", vec![leaf("S", "A", vec![])]),
                leaf("S", "C", vec![leaf("S", "A", vec![])]),
            ],
        );

        let order: Vec<String> = tree.walk().map(|n| n.column.letters()).collect();
        assert_eq!(order, vec!["D", "B", "A", "C", "A"]);
        assert_eq!(tree.count(), 5);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.find_all("S", col("A")).len(), 2);
        assert!(tree.find_all("T", col("A")).is_empty());
    }

    #[test]
    fn test_cancellation_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_default_options() {
        let options = TraceOptions::default();
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(options.lookup_value_rows, LookupValueRows::AnyRow);
        assert_eq!(options.rows, RowConfig::default());
        assert_eq!(ColumnInfo::blank(col("C")).content, ColumnContent::Empty);
    }
}
