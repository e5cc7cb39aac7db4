//! Joins and foreign-key join inference.

use tracing::trace;

use crate::ast::{Expr, ForeignKey, JoinKind, Operator, Source};
use crate::error::{QuarryError, QuarryResult};

/// A join definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub target: Source,
    pub kind: JoinKind,
    /// Join predicate; `None` only for CROSS joins
    pub on: Option<Expr>,
    /// The foreign key this join follows, when known
    pub relation: Option<Relation>,
}

/// A foreign-key relationship between two sources of a query.
///
/// `child` holds `foreign_key.column`, which references a field of `parent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub parent: Source,
    pub child: Source,
    pub foreign_key: ForeignKey,
}

impl Relation {
    /// Name used for the nested value when materializing objects:
    /// the foreign key's explicit name, or the other side's table name.
    pub fn name_from(&self, owner: &Source) -> String {
        if owner == &self.parent {
            self.child.alias().unwrap_or(self.child.name()).to_string()
        } else {
            self.foreign_key
                .name
                .clone()
                .unwrap_or_else(|| self.parent.alias().unwrap_or(self.parent.name()).to_string())
        }
    }

    /// Equality predicate `from.x = to.y` for this relation, with `from`'s
    /// column on the left.
    pub fn predicate(&self, from: &Source) -> QuarryResult<Expr> {
        let fk = &self.foreign_key;
        if from == &self.parent {
            self.parent
                .col(&fk.referenced_column)
                .eq(self.child.col(&fk.column))
        } else {
            self.child
                .col(&fk.column)
                .eq(self.parent.col(&fk.referenced_column))
        }
    }

    /// All foreign keys declared between `a` and `b`, in either direction.
    pub fn candidates(a: &Source, b: &Source) -> Vec<Relation> {
        let mut found = Vec::new();
        for fk in b.foreign_keys().iter().filter(|fk| fk.references == a.name()) {
            found.push(Relation {
                parent: a.clone(),
                child: b.clone(),
                foreign_key: fk.clone(),
            });
        }
        for fk in a.foreign_keys().iter().filter(|fk| fk.references == b.name()) {
            found.push(Relation {
                parent: b.clone(),
                child: a.clone(),
                foreign_key: fk.clone(),
            });
        }
        found
    }

    /// Resolve the single relation between `from` and `to`.
    ///
    /// Zero or several candidates is an error; inference never guesses.
    pub fn infer(from: &Source, to: &Source) -> QuarryResult<Relation> {
        let mut found = Self::candidates(from, to);
        if found.len() != 1 {
            return Err(QuarryError::JoinResolution {
                from: from.name().to_string(),
                to: to.name().to_string(),
                candidates: found.len(),
            });
        }
        let relation = found.remove(0);
        trace!(
            parent = relation.parent.name(),
            child = relation.child.name(),
            column = %relation.foreign_key.column,
            "inferred join"
        );
        Ok(relation)
    }

    /// Recognize a declared foreign key in an explicit `a.x = b.y` predicate.
    pub fn from_predicate(on: &Expr) -> Option<Relation> {
        let Expr::Binary {
            left,
            op: Operator::Eq,
            right,
            ..
        } = on
        else {
            return None;
        };
        let (Expr::Column(l), Expr::Column(r)) = (left.as_ref(), right.as_ref()) else {
            return None;
        };
        if l.source == r.source {
            return None;
        }
        let matches = |child: &crate::ast::ColumnRef, parent: &crate::ast::ColumnRef| {
            child
                .source
                .foreign_keys()
                .iter()
                .find(|fk| {
                    fk.column == child.name
                        && fk.references == parent.source.name()
                        && fk.referenced_column == parent.name
                })
                .map(|fk| Relation {
                    parent: parent.source.clone(),
                    child: child.source.clone(),
                    foreign_key: fk.clone(),
                })
        };
        matches(r, l).or_else(|| matches(l, r))
    }
}

impl Join {
    /// Join `target` from `context`, inferring the predicate from the one
    /// foreign key connecting them.
    pub fn inferred(context: &Source, target: &Source, kind: JoinKind) -> QuarryResult<Join> {
        let relation = Relation::infer(context, target)?;
        Ok(Join {
            target: target.clone(),
            kind,
            on: Some(relation.predicate(context)?),
            relation: Some(relation),
        })
    }

    /// Join with an explicit predicate.
    pub fn on(target: &Source, kind: JoinKind, on: Expr) -> Join {
        Join {
            target: target.clone(),
            kind,
            relation: Relation::from_predicate(&on),
            on: Some(on),
        }
    }

    pub fn cross(target: &Source) -> Join {
        Join {
            target: target.clone(),
            kind: JoinKind::Cross,
            on: None,
            relation: None,
        }
    }
}
