//! In-memory tree of a layer's `__init__.py` aggregators.
//!
//! Nodes live in an arena and are addressed by [`ScopePath`]; the root is the
//! layer directory itself. The tree is loaded once per command, mutated in
//! memory, and callers flush only the nodes reported by [`AggregatorTree::changes`].

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::{DomainError, ImportBlock, ImportLine, ImportOutcome, ScopePath};

pub const AGGREGATOR_FILE: &str = "__init__.py";

type NodeId = usize;

#[derive(Debug, Clone)]
struct AggregatorNode {
    scope: ScopePath,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    block: ImportBlock,
    /// Source modules (`*.py` minus the aggregator) in this directory.
    sources: BTreeSet<String>,
    dir_exists: bool,
    init_exists: bool,
    /// The directory holds files or folders that are not part of the tree.
    keep_dir: bool,
    dirty: bool,
    removed: bool,
}

impl AggregatorNode {
    fn new(scope: ScopePath, parent: Option<NodeId>) -> Self {
        Self {
            scope,
            parent,
            children: Vec::new(),
            block: ImportBlock::default(),
            sources: BTreeSet::new(),
            dir_exists: false,
            init_exists: false,
            keep_dir: false,
            dirty: false,
            removed: false,
        }
    }
}

/// A pending write for one aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorWrite {
    pub scope: ScopePath,
    pub dir: PathBuf,
    pub path: PathBuf,
    pub content: String,
    /// The directory does not exist yet.
    pub create_dir: bool,
    /// The aggregator file does not exist yet.
    pub create_file: bool,
}

/// Everything a flush has to do, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeChanges {
    /// Shallowest first, so parents are created before children.
    pub writes: Vec<AggregatorWrite>,
    /// Deepest first.
    pub removed_dirs: Vec<(ScopePath, PathBuf)>,
}

impl TreeChanges {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.removed_dirs.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AggregatorTree {
    layer_dir: PathBuf,
    nodes: Vec<AggregatorNode>,
    index: HashMap<ScopePath, NodeId>,
}

impl AggregatorTree {
    /// A tree holding only the layer root.
    pub fn new(layer_dir: impl Into<PathBuf>) -> Self {
        let mut root = AggregatorNode::new(ScopePath::root(), None);
        root.dir_exists = true;
        let mut index = HashMap::new();
        index.insert(ScopePath::root(), 0);
        Self {
            layer_dir: layer_dir.into(),
            nodes: vec![root],
            index,
        }
    }

    pub fn layer_dir(&self) -> &Path {
        &self.layer_dir
    }

    /// Record a scope as found on disk. Parents must be loaded first.
    pub fn load_scope(
        &mut self,
        scope: ScopePath,
        aggregator: Option<&str>,
        sources: impl IntoIterator<Item = String>,
    ) -> Result<(), DomainError> {
        let id = match self.index.get(&scope) {
            Some(&id) => id,
            None => {
                let parent_scope = scope.parent().ok_or_else(|| DomainError::ScopeNotFound {
                    scope: scope.to_string(),
                })?;
                let parent = *self.index.get(&parent_scope).ok_or_else(|| DomainError::ScopeNotFound {
                    scope: parent_scope.to_string(),
                })?;
                self.insert(scope, parent)
            }
        };
        let node = &mut self.nodes[id];
        node.dir_exists = true;
        node.init_exists = aggregator.is_some();
        node.block = aggregator.map(ImportBlock::parse).unwrap_or_default();
        node.sources = sources.into_iter().collect();
        Ok(())
    }

    /// Mark `scope` as holding content the tree does not own, so cleanup
    /// detaches it from its parent but never deletes the directory.
    pub fn retain_dir(&mut self, scope: &ScopePath) -> Result<(), DomainError> {
        let id = self.require(scope)?;
        self.nodes[id].keep_dir = true;
        Ok(())
    }

    fn insert(&mut self, scope: ScopePath, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(AggregatorNode::new(scope.clone(), Some(parent)));
        self.nodes[parent].children.push(id);
        self.index.insert(scope, id);
        id
    }

    fn live(&self, scope: &ScopePath) -> Option<NodeId> {
        self.index
            .get(scope)
            .copied()
            .filter(|&id| !self.nodes[id].removed)
    }

    fn require(&self, scope: &ScopePath) -> Result<NodeId, DomainError> {
        self.live(scope).ok_or_else(|| DomainError::ScopeNotFound {
            scope: scope.to_string(),
        })
    }

    pub fn contains(&self, scope: &ScopePath) -> bool {
        self.live(scope).is_some()
    }

    /// Create every missing node down to `scope` and register the
    /// `from .<child> import *` forwarding line in each parent.
    pub fn ensure_scope(&mut self, scope: &ScopePath) -> Result<(), DomainError> {
        for step in scope.ancestry().into_iter().skip(1) {
            let parent_scope = step.parent().unwrap_or_default();
            let parent = self.require(&parent_scope)?;
            let leaf = step.leaf().unwrap_or_default().to_string();

            if self.live(&step).is_none() {
                match self.index.get(&step).copied() {
                    // resurrect a node cleaned earlier in the same run
                    Some(id) => {
                        let node = &mut self.nodes[id];
                        node.removed = false;
                        node.dirty = true;
                        self.nodes[parent].children.push(id);
                    }
                    None => {
                        let id = self.insert(step.clone(), parent);
                        self.nodes[id].dirty = true;
                    }
                }
            }

            self.add_import(&parent_scope, ImportLine::forward(&leaf)?, None)?;
        }
        Ok(())
    }

    pub fn block(&self, scope: &ScopePath) -> Result<&ImportBlock, DomainError> {
        Ok(&self.nodes[self.require(scope)?].block)
    }

    /// Relative path of the aggregator for `scope`, for messages.
    pub fn aggregator_path(&self, scope: &ScopePath) -> PathBuf {
        scope.resolve(&self.layer_dir).join(AGGREGATOR_FILE)
    }

    pub fn add_import(
        &mut self,
        scope: &ScopePath,
        line: ImportLine,
        comment: Option<&str>,
    ) -> Result<ImportOutcome, DomainError> {
        let id = self.require(scope)?;
        let outcome = self.nodes[id].block.add(line, comment)?;
        self.touch(id, outcome.is_change());
        Ok(outcome)
    }

    pub fn remove_import(&mut self, scope: &ScopePath, line: &ImportLine) -> Result<bool, DomainError> {
        let id = self.require(scope)?;
        let removed = self.nodes[id].block.remove(line);
        self.touch(id, removed);
        Ok(removed)
    }

    pub fn disable_import(&mut self, scope: &ScopePath, line: &ImportLine) -> Result<ImportOutcome, DomainError> {
        let id = self.require(scope)?;
        let label = self.aggregator_path(scope).display().to_string();
        let outcome = self.nodes[id].block.disable(line, &label)?;
        self.touch(id, outcome.is_change());
        Ok(outcome)
    }

    pub fn enable_import(&mut self, scope: &ScopePath, line: &ImportLine) -> Result<ImportOutcome, DomainError> {
        let id = self.require(scope)?;
        let label = self.aggregator_path(scope).display().to_string();
        let outcome = self.nodes[id].block.enable(line, &label)?;
        self.touch(id, outcome.is_change());
        Ok(outcome)
    }

    fn touch(&mut self, id: NodeId, changed: bool) {
        if changed {
            self.nodes[id].dirty = true;
        }
    }

    pub fn sources(&self, scope: &ScopePath) -> Result<impl Iterator<Item = &str>, DomainError> {
        Ok(self.nodes[self.require(scope)?].sources.iter().map(String::as_str))
    }

    pub fn add_source(&mut self, scope: &ScopePath, module: &str) -> Result<(), DomainError> {
        let id = self.require(scope)?;
        self.nodes[id].sources.insert(module.to_string());
        Ok(())
    }

    pub fn remove_source(&mut self, scope: &ScopePath, module: &str) -> Result<bool, DomainError> {
        let id = self.require(scope)?;
        Ok(self.nodes[id].sources.remove(module))
    }

    /// Live scopes, shallowest first.
    pub fn scopes(&self) -> Vec<ScopePath> {
        let mut scopes: Vec<ScopePath> = self
            .nodes
            .iter()
            .filter(|n| !n.removed)
            .map(|n| n.scope.clone())
            .collect();
        scopes.sort_by_key(|s| (s.depth(), s.clone()));
        scopes
    }

    /// Remove scopes with neither source modules nor child scopes, bottom-up,
    /// dropping each one's forwarding import from its parent. The layer root
    /// is never removed. A retained scope is only detached: its directory
    /// stays, and so do its ancestors' directories. Returns the scopes whose
    /// directories are deleted.
    pub fn cleanup_empty_scopes(&mut self) -> Vec<ScopePath> {
        let mut order: Vec<NodeId> = (1..self.nodes.len()).collect();
        order.sort_by_key(|&id| std::cmp::Reverse(self.nodes[id].scope.depth()));

        let mut removed = Vec::new();
        for id in order {
            let node = &self.nodes[id];
            if node.removed || !node.sources.is_empty() {
                continue;
            }
            if node.children.iter().any(|&c| !self.nodes[c].removed) {
                continue;
            }

            let Some(parent) = node.parent else { continue };
            let scope = node.scope.clone();
            if let Some(leaf) = scope.leaf()
                && let Ok(forward) = ImportLine::forward(leaf)
                && self.nodes[parent].block.remove(&forward)
            {
                self.nodes[parent].dirty = true;
            }
            self.nodes[parent].children.retain(|&c| c != id);
            self.nodes[id].removed = true;
            if self.nodes[id].keep_dir {
                self.nodes[parent].keep_dir = true;
            } else {
                removed.push(scope);
            }
        }
        removed
    }

    /// Writes and removals needed to bring the disk in line with the tree.
    pub fn changes(&self) -> TreeChanges {
        let mut writes: Vec<AggregatorWrite> = self
            .nodes
            .iter()
            .filter(|n| (!n.removed || n.keep_dir) && (n.dirty || !n.dir_exists))
            .map(|n| {
                let dir = n.scope.resolve(&self.layer_dir);
                AggregatorWrite {
                    scope: n.scope.clone(),
                    path: dir.join(AGGREGATOR_FILE),
                    dir,
                    content: n.block.render(),
                    create_dir: !n.dir_exists,
                    create_file: !n.init_exists,
                }
            })
            .collect();
        writes.sort_by_key(|w| w.scope.depth());

        let mut removed_dirs: Vec<(ScopePath, PathBuf)> = self
            .nodes
            .iter()
            .filter(|n| n.removed && n.dir_exists && !n.keep_dir)
            .map(|n| (n.scope.clone(), n.scope.resolve(&self.layer_dir)))
            .collect();
        removed_dirs.sort_by_key(|(s, _)| std::cmp::Reverse(s.depth()));

        TreeChanges {
            writes,
            removed_dirs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope(s: &str) -> ScopePath {
        ScopePath::parse(s).unwrap()
    }

    #[test]
    fn ensure_scope_builds_forwarding_chain() {
        let mut tree = AggregatorTree::new("shop/controllers");
        tree.ensure_scope(&scope("user/profile")).unwrap();

        assert_eq!(
            tree.block(&ScopePath::root()).unwrap().render(),
            "from .user import *\n"
        );
        assert_eq!(
            tree.block(&scope("user")).unwrap().render(),
            "from .profile import *\n"
        );

        let changes = tree.changes();
        let dirs: Vec<(String, bool)> = changes
            .writes
            .iter()
            .map(|w| (w.dir.display().to_string(), w.create_dir))
            .collect();
        assert_eq!(
            dirs,
            vec![
                ("shop/controllers".to_string(), false),
                ("shop/controllers/user".to_string(), true),
                ("shop/controllers/user/profile".to_string(), true),
            ]
        );
    }

    #[test]
    fn clean_tree_has_no_changes() {
        let mut tree = AggregatorTree::new("layer");
        tree.load_scope(ScopePath::root(), Some("from .a import *\n"), ["a".to_string()])
            .unwrap();
        assert!(tree.changes().is_empty());
        tree.ensure_scope(&ScopePath::root()).unwrap();
        assert!(tree.changes().is_empty());
    }

    #[test]
    fn load_requires_parent_first() {
        let mut tree = AggregatorTree::new("layer");
        let err = tree.load_scope(scope("a/b"), None, []).unwrap_err();
        assert!(matches!(err, DomainError::ScopeNotFound { .. }));
    }

    #[test]
    fn cleanup_cascades_and_is_idempotent() {
        let mut tree = AggregatorTree::new("layer");
        tree.load_scope(ScopePath::root(), Some("from .a import *\nfrom .keep import *\n"), [])
            .unwrap();
        tree.load_scope(scope("a"), Some("from .b import *\n"), []).unwrap();
        tree.load_scope(scope("a/b"), Some(""), []).unwrap();
        tree.load_scope(scope("keep"), Some("from .x import *\n"), ["x".to_string()])
            .unwrap();

        let removed = tree.cleanup_empty_scopes();
        assert_eq!(removed, vec![scope("a/b"), scope("a")]);
        assert_eq!(
            tree.block(&ScopePath::root()).unwrap().render(),
            "from .keep import *\n"
        );

        let changes = tree.changes();
        assert_eq!(
            changes.removed_dirs,
            vec![
                (scope("a/b"), PathBuf::from("layer/a/b")),
                (scope("a"), PathBuf::from("layer/a")),
            ]
        );
        assert_eq!(changes.writes.len(), 1);

        assert!(tree.cleanup_empty_scopes().is_empty());
        assert_eq!(tree.changes(), changes);
    }

    #[test]
    fn retained_scope_is_detached_but_kept() {
        let mut tree = AggregatorTree::new("layer");
        tree.load_scope(ScopePath::root(), Some("from .a import *\n"), []).unwrap();
        tree.load_scope(scope("a"), Some("from .b import *\n"), []).unwrap();
        tree.load_scope(scope("a/b"), Some("from .old import *\n"), []).unwrap();
        tree.retain_dir(&scope("a/b")).unwrap();
        tree.remove_import(&scope("a/b"), &ImportLine::forward("old").unwrap())
            .unwrap();

        assert!(tree.cleanup_empty_scopes().is_empty());
        assert!(!tree.contains(&scope("a")));
        assert_eq!(tree.block(&ScopePath::root()).unwrap().render(), "");

        let changes = tree.changes();
        assert!(changes.removed_dirs.is_empty());
        let written: Vec<String> = changes
            .writes
            .iter()
            .map(|w| w.path.display().to_string())
            .collect();
        assert_eq!(
            written,
            vec![
                "layer/__init__.py".to_string(),
                "layer/a/__init__.py".to_string(),
                "layer/a/b/__init__.py".to_string(),
            ]
        );
    }

    #[test]
    fn removed_scope_can_be_recreated() {
        let mut tree = AggregatorTree::new("layer");
        tree.load_scope(ScopePath::root(), Some("from .a import *\n"), []).unwrap();
        tree.load_scope(scope("a"), Some(""), []).unwrap();
        tree.cleanup_empty_scopes();
        assert!(!tree.contains(&scope("a")));

        tree.ensure_scope(&scope("a")).unwrap();
        assert!(tree.contains(&scope("a")));
        assert_eq!(tree.block(&ScopePath::root()).unwrap().render(), "from .a import *\n");
    }

    #[test]
    fn toggles_mark_node_dirty() {
        let mut tree = AggregatorTree::new("layer");
        tree.load_scope(ScopePath::root(), Some("from .review import *\n"), ["review".to_string()])
            .unwrap();
        let line = ImportLine::forward("review").unwrap();

        assert_eq!(tree.disable_import(&ScopePath::root(), &line).unwrap(), ImportOutcome::Disabled);
        let changes = tree.changes();
        assert_eq!(changes.writes[0].content, "# from .review import *\n");
        assert!(!changes.writes[0].create_file);
    }

    #[test]
    fn operations_on_missing_scope_fail() {
        let mut tree = AggregatorTree::new("layer");
        let err = tree
            .add_import(&scope("ghost"), ImportLine::forward("x").unwrap(), None)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::ScopeNotFound {
                scope: "ghost".into()
            }
        );
    }
}
