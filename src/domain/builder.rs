//! Tree builder: links flat company and relation records into one rooted hierarchy.

use std::collections::{BTreeMap, HashMap, HashSet};

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, warn};

use crate::domain::arena::{CompanyNode, CompanyTree};
use crate::domain::entities::{CompanyRecord, RelationRecord};
use crate::domain::error::{DomainResult, HierarchyDefect};

/// Constructs a [`CompanyTree`] from flat records.
///
/// Any defect in the relation set (zero or several roots, unknown codes,
/// double parents, cycles, unreachable companies) aborts the build; no
/// partial tree is ever returned.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    arena: Arena<CompanyNode>,
    index_by_code: HashMap<String, Index>,
    parent_of: HashMap<String, String>,
    root_candidates: Vec<String>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the hierarchy. Children keep the order of their relation records.
    #[instrument(level = "debug", skip_all, fields(companies = companies.len(), relations = relations.len()))]
    pub fn build(
        mut self,
        companies: &BTreeMap<String, CompanyRecord>,
        relations: &[RelationRecord],
    ) -> DomainResult<CompanyTree> {
        // One node per company, no links yet
        for (code, record) in companies {
            let idx = self.arena.insert(CompanyNode::new(record.clone()));
            self.index_by_code.insert(code.clone(), idx);
        }

        for relation in relations {
            self.link(relation)?;
        }

        let root = self.single_root()?;
        self.ensure_connected(root)?;

        let tree = CompanyTree::from_parts(self.arena, root);
        debug!("built hierarchy: {} companies, depth {}", tree.len(), tree.depth());

        let mismatches = tree.level_mismatches();
        if !mismatches.is_empty() {
            warn!(
                "{} companies have a stored level different from their depth; stored level is used",
                mismatches.len()
            );
        }
        Ok(tree)
    }

    fn link(&mut self, relation: &RelationRecord) -> DomainResult<()> {
        let child_idx = *self
            .index_by_code
            .get(&relation.code)
            .ok_or_else(|| HierarchyDefect::UnknownCode(relation.code.clone()))?;

        let Some(parent_code) = relation.parent_code.as_deref() else {
            if self.root_candidates.contains(&relation.code) {
                return Err(HierarchyDefect::DuplicateRelation(relation.code.clone()).into());
            }
            self.root_candidates.push(relation.code.clone());
            return Ok(());
        };

        let parent_idx = *self.index_by_code.get(parent_code).ok_or_else(|| {
            HierarchyDefect::UnknownParent {
                code: relation.code.clone(),
                parent: parent_code.to_string(),
            }
        })?;

        if let Some(first) = self.parent_of.get(&relation.code) {
            if first == parent_code {
                return Err(HierarchyDefect::DuplicateRelation(relation.code.clone()).into());
            }
            return Err(HierarchyDefect::DoubleParented {
                code: relation.code.clone(),
                first: first.clone(),
                second: parent_code.to_string(),
            }
            .into());
        }
        self.parent_of
            .insert(relation.code.clone(), parent_code.to_string());

        if let Some(parent) = self.arena.get_mut(parent_idx) {
            parent.children.push(child_idx);
        }
        if let Some(child) = self.arena.get_mut(child_idx) {
            child.parent = Some(parent_idx);
        }
        Ok(())
    }

    fn single_root(&self) -> DomainResult<Index> {
        match self.root_candidates.as_slice() {
            [] => Err(HierarchyDefect::NoRoot.into()),
            [code] => Ok(self.index_by_code[code]),
            codes => Err(HierarchyDefect::MultipleRoots {
                count: codes.len(),
                codes: codes.to_vec(),
            }
            .into()),
        }
    }

    /// Every company must be reached from the root exactly once.
    fn ensure_connected(&self, root: Index) -> DomainResult<()> {
        let mut visited: HashSet<Index> = HashSet::with_capacity(self.arena.len());
        let mut stack = vec![root];

        while let Some(idx) = stack.pop() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            if !visited.insert(idx) {
                return Err(HierarchyDefect::Cycle(node.data.code.clone()).into());
            }
            stack.extend(node.children.iter().copied());
        }

        if visited.len() != self.arena.len() {
            let mut codes: Vec<String> = self
                .arena
                .iter()
                .filter(|(idx, _)| !visited.contains(idx))
                .map(|(_, node)| node.data.code.clone())
                .collect();
            codes.sort();
            return Err(HierarchyDefect::Orphaned {
                root: self.arena[root].data.code.clone(),
                codes,
            }
            .into());
        }
        Ok(())
    }
}

/// Convenience wrapper around [`HierarchyBuilder::build`].
pub fn build(
    companies: &BTreeMap<String, CompanyRecord>,
    relations: &[RelationRecord],
) -> DomainResult<CompanyTree> {
    HierarchyBuilder::new().build(companies, relations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    fn company(code: &str, level: u8) -> CompanyRecord {
        CompanyRecord {
            code: code.into(),
            name: format!("{code} Corp"),
            level,
            country: "US".into(),
            city: "Austin".into(),
            founded_year: 2000,
            annual_revenue: 1_000_000.0,
            employees: 100,
        }
    }

    fn companies(codes: &[&str]) -> BTreeMap<String, CompanyRecord> {
        codes
            .iter()
            .map(|c| (c.to_string(), company(c, 1)))
            .collect()
    }

    fn defect(result: DomainResult<CompanyTree>) -> HierarchyDefect {
        match result {
            Err(DomainError::MalformedHierarchy(d)) => d,
            other => panic!("expected malformed hierarchy, got {other:?}"),
        }
    }

    #[test]
    fn given_child_declared_before_parent_when_building_then_links_anyway() {
        let relations = vec![
            RelationRecord::child("C", "B"),
            RelationRecord::child("B", "A"),
            RelationRecord::root("A"),
        ];
        let tree = build(&companies(&["A", "B", "C"]), &relations).unwrap();
        assert_eq!(tree.root_node().code(), "A");
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn given_self_parent_and_separate_root_when_building_then_reports_unreachable() {
        let relations = vec![RelationRecord::root("A"), RelationRecord::child("B", "B")];
        // B is its own parent: not reachable from A
        assert!(matches!(
            defect(build(&companies(&["A", "B"]), &relations)),
            HierarchyDefect::Orphaned { .. }
        ));
    }

    #[test]
    fn given_root_that_also_has_parent_when_building_then_detects_cycle() {
        let relations = vec![
            RelationRecord::root("A"),
            RelationRecord::child("B", "A"),
            RelationRecord::child("A", "B"),
        ];
        assert_eq!(
            defect(build(&companies(&["A", "B"]), &relations)),
            HierarchyDefect::Cycle("A".into())
        );
    }

    #[test]
    fn given_root_declared_twice_when_building_then_reports_duplicate_relation() {
        let relations = vec![
            RelationRecord::root("A"),
            RelationRecord::child("B", "A"),
            RelationRecord::root("A"),
        ];
        assert_eq!(
            defect(build(&companies(&["A", "B"]), &relations)),
            HierarchyDefect::DuplicateRelation("A".into())
        );
    }

    #[test]
    fn given_same_edge_twice_when_building_then_reports_duplicate_relation() {
        let relations = vec![
            RelationRecord::root("A"),
            RelationRecord::child("B", "A"),
            RelationRecord::child("B", "A"),
        ];
        assert_eq!(
            defect(build(&companies(&["A", "B"]), &relations)),
            HierarchyDefect::DuplicateRelation("B".into())
        );
    }

    #[test]
    fn given_company_without_relation_when_building_then_reports_orphan() {
        let relations = vec![RelationRecord::root("A")];
        assert_eq!(
            defect(build(&companies(&["A", "Z"]), &relations)),
            HierarchyDefect::Orphaned {
                root: "A".into(),
                codes: vec!["Z".into()]
            }
        );
    }

    #[test]
    fn given_level_matching_depth_when_checking_then_no_mismatch() {
        let mut records = companies(&["A"]);
        records.insert("B".into(), company("B", 2));
        let relations = vec![RelationRecord::root("A"), RelationRecord::child("B", "A")];
        let tree = build(&records, &relations).unwrap();
        assert!(tree.level_mismatches().is_empty());
    }

    #[test]
    fn given_level_differing_from_depth_when_checking_then_reports_it() {
        let relations = vec![RelationRecord::root("A"), RelationRecord::child("B", "A")];
        let tree = build(&companies(&["A", "B"]), &relations).unwrap();
        let mismatches = tree.level_mismatches();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].code, "B");
        assert_eq!(mismatches[0].stored, 1);
        assert_eq!(mismatches[0].depth, 2);
    }
}
