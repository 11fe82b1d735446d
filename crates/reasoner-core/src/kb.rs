//! Knowledge base: facts, rules, declared relational properties, mutual
//! exclusion groups, and the indexes used to make symbolic lookups fast.

use std::collections::HashMap;

use tracing::debug;

use crate::algebra::{HdcStrategy, Vector};
use crate::error::{ReasonerError, Result};
use crate::statement::{
    AtomId, Fact, FactId, MutualExclusionGroup, Polarity, RelationProperty, Rule, RuleId, Statement,
};

/// Index over facts by `(operator, argument atoms)` for O(1) duplicate
/// detection, independent of the order facts were learned in.
type FactKey = (AtomId, Vec<AtomId>);

/// Component index used by the symbolic engine to avoid scanning every
/// fact for every query: facts grouped by operator, and by the atom bound
/// at a given argument position.
#[derive(Debug, Default)]
pub struct ComponentIndex {
    pub by_operator: HashMap<AtomId, Vec<FactId>>,
    pub by_arg_at_position: HashMap<(usize, AtomId), Vec<FactId>>,
}

impl ComponentIndex {
    fn add(&mut self, fact: &Fact) {
        self.by_operator.entry(fact.statement.operator).or_default().push(fact.id);
        for (position, term) in fact.statement.args.iter().enumerate() {
            if let crate::statement::Term::Const(atom) = term {
                self.by_arg_at_position.entry((position, *atom)).or_default().push(fact.id);
            }
        }
    }
}

/// A restore point captured before a multi-statement `learn` batch, so the
/// whole batch can be rolled back atomically if any statement in it is
/// rejected (see the "Contradiction transactionality" property in the
/// crate's test suite).
#[derive(Debug)]
pub struct Checkpoint {
    fact_count: usize,
    rule_count: usize,
    kb_bundle: Option<Vector>,
    transitive_count: usize,
    symmetric_count: usize,
    inheritable_count: usize,
    mutual_exclusion_count: usize,
}

/// The knowledge base owned by a [`crate::session::Session`].
#[derive(Debug)]
pub struct KnowledgeBase {
    facts: Vec<Fact>,
    rules: Vec<Rule>,
    fact_index: HashMap<FactKey, FactId>,
    component_index: ComponentIndex,
    kb_bundle: Option<Vector>,
    transitive_relations: Vec<AtomId>,
    symmetric_relations: Vec<AtomId>,
    inheritable_properties: Vec<AtomId>,
    mutual_exclusions: Vec<MutualExclusionGroup>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self {
            facts: Vec::new(),
            rules: Vec::new(),
            fact_index: HashMap::new(),
            component_index: ComponentIndex::default(),
            kb_bundle: None,
            transitive_relations: Vec::new(),
            symmetric_relations: Vec::new(),
            inheritable_properties: Vec::new(),
            mutual_exclusions: Vec::new(),
        }
    }
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get_fact(&self, id: FactId) -> Option<&Fact> {
        self.facts.get(id.0 as usize)
    }

    pub fn component_index(&self) -> &ComponentIndex {
        &self.component_index
    }

    pub fn kb_bundle(&self) -> Option<&Vector> {
        self.kb_bundle.as_ref()
    }

    pub fn is_transitive(&self, operator: AtomId) -> bool {
        self.transitive_relations.contains(&operator)
    }

    pub fn is_symmetric(&self, operator: AtomId) -> bool {
        self.symmetric_relations.contains(&operator)
    }

    pub fn is_inheritable(&self, operator: AtomId) -> bool {
        self.inheritable_properties.contains(&operator)
    }

    pub fn transitive_relation_count(&self) -> usize {
        self.transitive_relations.len()
    }

    pub fn symmetric_relation_count(&self) -> usize {
        self.symmetric_relations.len()
    }

    pub fn inheritable_property_count(&self) -> usize {
        self.inheritable_properties.len()
    }

    pub fn mutual_exclusions(&self) -> &[MutualExclusionGroup] {
        &self.mutual_exclusions
    }

    pub fn declare_property(&mut self, operator: AtomId, property: RelationProperty) {
        let target = match property {
            RelationProperty::Transitive => &mut self.transitive_relations,
            RelationProperty::Symmetric => &mut self.symmetric_relations,
            RelationProperty::Inheritable => &mut self.inheritable_properties,
        };
        if !target.contains(&operator) {
            target.push(operator);
        }
    }

    pub fn add_mutual_exclusion(&mut self, group: MutualExclusionGroup) {
        self.mutual_exclusions.push(group);
    }

    fn fact_key(statement: &Statement) -> FactKey {
        let args = statement
            .args
            .iter()
            .map(|t| match t {
                crate::statement::Term::Const(a) => *a,
                crate::statement::Term::Var(_) => {
                    unreachable!("facts must be ground before indexing")
                }
            })
            .collect();
        (statement.operator, args)
    }

    /// Returns the existing fact matching `statement` exactly, if any.
    pub fn find_exact(&self, statement: &Statement) -> Option<&Fact> {
        if !statement.is_ground() {
            return None;
        }
        let key = Self::fact_key(statement);
        self.fact_index.get(&key).and_then(|id| self.get_fact(*id))
    }

    /// Inserts a new ground fact, updating all indexes and the bundle.
    /// Callers (the contradiction detector and [`crate::session::Session`])
    /// are responsible for rejecting contradictory facts before this is
    /// called; this method itself only de-duplicates exact repeats.
    pub fn add_fact(
        &mut self,
        strategy: &dyn HdcStrategy,
        statement: Statement,
        polarity: Polarity,
        vector: Vector,
    ) -> Result<FactId> {
        if !statement.is_ground() {
            return Err(ReasonerError::InvalidArity {
                got: statement.arity(),
                max: statement.arity(),
            });
        }
        let key = Self::fact_key(&statement);
        if let Some(existing) = self.fact_index.get(&key) {
            debug!(fact_id = existing.0, "duplicate fact, skipping insert");
            return Ok(*existing);
        }
        let id = FactId(self.facts.len() as u32);
        let fact = Fact {
            id,
            statement,
            polarity,
            vector: vector.clone(),
        };
        self.component_index.add(&fact);
        self.fact_index.insert(key, id);
        self.facts.push(fact);
        self.kb_bundle = Some(match &self.kb_bundle {
            Some(existing) => strategy.bundle(&[existing.clone(), vector])?,
            None => vector,
        });
        Ok(id)
    }

    /// Captures the current size of every append-only structure this KB
    /// owns, so a failed statement later in the same `learn` batch can
    /// undo everything committed since.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            fact_count: self.facts.len(),
            rule_count: self.rules.len(),
            kb_bundle: self.kb_bundle.clone(),
            transitive_count: self.transitive_relations.len(),
            symmetric_count: self.symmetric_relations.len(),
            inheritable_count: self.inheritable_properties.len(),
            mutual_exclusion_count: self.mutual_exclusions.len(),
        }
    }

    /// Restores the KB to a previously captured [`Checkpoint`], discarding
    /// every fact, rule and declaration added since. Facts and rules are
    /// append-only and referenced by their position, so truncating the
    /// vectors and rebuilding the two indexes from what remains is exact.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        self.facts.truncate(checkpoint.fact_count);
        self.rules.truncate(checkpoint.rule_count);
        self.kb_bundle = checkpoint.kb_bundle;
        self.transitive_relations.truncate(checkpoint.transitive_count);
        self.symmetric_relations.truncate(checkpoint.symmetric_count);
        self.inheritable_properties.truncate(checkpoint.inheritable_count);
        self.mutual_exclusions.truncate(checkpoint.mutual_exclusion_count);

        self.fact_index.clear();
        self.component_index = ComponentIndex::default();
        for fact in &self.facts {
            let key = Self::fact_key(&fact.statement);
            self.fact_index.insert(key, fact.id);
            self.component_index.add(fact);
        }
    }

    pub fn add_rule(&mut self, premises: Vec<Statement>, conclusion: Statement, confidence: f64) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule {
            id,
            premises,
            conclusion,
            confidence,
        });
        id
    }

    /// Rules whose conclusion operator matches `operator`, the common case
    /// when deriving new statements for a given predicate.
    pub fn rules_concluding(&self, operator: AtomId) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.conclusion.operator == operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::DenseBipolarStrategy;
    use crate::statement::Term;

    #[test]
    fn duplicate_facts_are_deduplicated() {
        let strategy = DenseBipolarStrategy::default();
        let mut kb = KnowledgeBase::new();
        let op = AtomId(0);
        let a = AtomId(1);
        let stmt = Statement::new(op, vec![Term::Const(a)]);
        let v1 = strategy.create_from_name("t", "f1", 256);
        let v2 = strategy.create_from_name("t", "f1", 256);
        let id1 = kb.add_fact(&strategy, stmt.clone(), Polarity::Asserted, v1).unwrap();
        let id2 = kb.add_fact(&strategy, stmt, Polarity::Asserted, v2).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(kb.facts().len(), 1);
    }

    #[test]
    fn rollback_undoes_every_fact_added_after_the_checkpoint() {
        let strategy = DenseBipolarStrategy::default();
        let mut kb = KnowledgeBase::new();
        let op = AtomId(0);
        let a = AtomId(1);
        let b = AtomId(2);
        let v1 = strategy.create_from_name("t", "f1", 256);
        kb.add_fact(&strategy, Statement::new(op, vec![Term::Const(a)]), Polarity::Asserted, v1)
            .unwrap();

        let checkpoint = kb.checkpoint();
        let v2 = strategy.create_from_name("t", "f2", 256);
        kb.add_fact(&strategy, Statement::new(op, vec![Term::Const(b)]), Polarity::Asserted, v2)
            .unwrap();
        assert_eq!(kb.facts().len(), 2);

        kb.rollback(checkpoint);
        assert_eq!(kb.facts().len(), 1);
        assert!(kb.component_index().by_arg_at_position.get(&(0, b)).is_none());
        assert!(kb.find_exact(&Statement::new(op, vec![Term::Const(a)])).is_some());
    }

    #[test]
    fn component_index_groups_by_operator_and_position() {
        let strategy = DenseBipolarStrategy::default();
        let mut kb = KnowledgeBase::new();
        let op = AtomId(0);
        let a = AtomId(1);
        let b = AtomId(2);
        let stmt = Statement::new(op, vec![Term::Const(a), Term::Const(b)]);
        let v = strategy.create_from_name("t", "f1", 256);
        let id = kb.add_fact(&strategy, stmt, Polarity::Asserted, v).unwrap();
        assert_eq!(kb.component_index().by_operator[&op], vec![id]);
        assert_eq!(kb.component_index().by_arg_at_position[&(0, a)], vec![id]);
        assert_eq!(kb.component_index().by_arg_at_position[&(1, b)], vec![id]);
    }
}
