use crate::ast::{OrderTerm, Query, SetOp};

/// Two queries combined with UNION / INTERSECT / EXCEPT.
///
/// Parameters of `lhs` always precede those of `rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelect {
    pub op: SetOp,
    pub lhs: Box<Query>,
    pub rhs: Box<Query>,
    pub order_by: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl CompoundSelect {
    pub fn new(op: SetOp, lhs: impl Into<Query>, rhs: impl Into<Query>) -> Self {
        Self {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }

    /// `(a EXCEPT b) UNION (b EXCEPT a)`
    pub fn symmetric_difference(a: impl Into<Query>, b: impl Into<Query>) -> Self {
        let a = a.into();
        let b = b.into();
        let left = CompoundSelect::new(SetOp::Except, a.clone(), b.clone());
        let right = CompoundSelect::new(SetOp::Except, b, a);
        CompoundSelect::new(SetOp::Union, left, right)
    }

    pub fn union(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::Union, self, other)
    }

    pub fn union_all(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::UnionAll, self, other)
    }

    pub fn intersect(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::Intersect, self, other)
    }

    pub fn except_(self, other: impl Into<Query>) -> CompoundSelect {
        CompoundSelect::new(SetOp::Except, self, other)
    }

    /// Order the combined result. Columns are referenced by output name.
    pub fn order_by(mut self, term: impl Into<OrderTerm>) -> Self {
        self.order_by.push(term.into());
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Output names come from the left-most member.
    pub fn output_names(&self) -> Vec<String> {
        self.lhs.output_names()
    }
}
