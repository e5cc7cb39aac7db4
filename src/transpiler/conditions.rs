//! Expression rendering: operators, precedence-driven parenthesization and
//! dialect operator fallbacks.

use crate::ast::{Expr, Function, Operator, Query, UnaryOp};
use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::context::{AliasMode, Compiler};
use crate::transpiler::dialect::{BitwiseStyle, ConcatStyle, UpsertStyle};

impl Compiler<'_> {
    /// Render an expression.
    pub(crate) fn expr(&mut self, e: &Expr, mode: AliasMode) -> QuarryResult<()> {
        match e {
            Expr::Column(c) => {
                self.qualify(&c.source)?;
                self.quoted(&c.name);
            }
            Expr::Value { value, .. } => self.param(value.clone()),
            Expr::Raw { sql, params } => self.raw(sql, params)?,
            Expr::Function(f) => self.function(f)?,
            Expr::Binary {
                left,
                op,
                right,
                flat,
            } => self.binary(left, *op, right, *flat)?,
            Expr::Unary { op, operand } => {
                self.push_str(match op {
                    UnaryOp::Not => "NOT ",
                    UnaryOp::Neg => "-",
                });
                self.operand(operand, !operand.is_atom())?;
            }
            Expr::Clause {
                items,
                separator,
                parens,
            } => {
                if *parens {
                    self.push('(');
                }
                self.list(items, separator, AliasMode::Inline)?;
                if *parens {
                    self.push(')');
                }
            }
            Expr::Alias { expr, name } => match mode {
                AliasMode::Define => {
                    self.expr(expr, AliasMode::Inline)?;
                    self.push_str(" AS ");
                    self.quoted(name);
                }
                AliasMode::Reference => self.quoted(name),
                AliasMode::Inline => self.expr(expr, AliasMode::Inline)?,
            },
            Expr::Star(None) => self.push('*'),
            Expr::Star(Some(source)) => {
                self.qualify(source)?;
                self.push('*');
            }
            Expr::Case {
                operand,
                whens,
                else_,
            } => {
                if whens.is_empty() {
                    return Err(QuarryError::malformed("CASE needs at least one WHEN"));
                }
                self.push_str("CASE");
                if let Some(operand) = operand {
                    self.push(' ');
                    self.expr(operand, AliasMode::Inline)?;
                }
                for (when, then) in whens {
                    self.push_str(" WHEN ");
                    self.expr(when, AliasMode::Inline)?;
                    self.push_str(" THEN ");
                    self.expr(then, AliasMode::Inline)?;
                }
                if let Some(e) = else_ {
                    self.push_str(" ELSE ");
                    self.expr(e, AliasMode::Inline)?;
                }
                self.push_str(" END");
            }
            Expr::Cast { expr, target } => {
                self.push_str("CAST(");
                self.expr(expr, AliasMode::Inline)?;
                self.push_str(" AS ");
                self.push_str(target);
                self.push(')');
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let p = Operator::Eq.precedence();
                self.operand(expr, expr.precedence() <= p)?;
                self.push_str(if *negated {
                    " NOT BETWEEN "
                } else {
                    " BETWEEN "
                });
                self.operand(low, low.precedence() <= p)?;
                self.push_str(" AND ");
                self.operand(high, high.precedence() <= p)?;
            }
            Expr::Subquery(query) => self.subquery(query)?,
            Expr::Exists { query, negated } => {
                self.push_str(if *negated { "NOT EXISTS " } else { "EXISTS " });
                self.subquery(query)?;
            }
            Expr::Excluded(column) => match self.dialect.upsert {
                UpsertStyle::OnConflict => {
                    self.push_str("EXCLUDED.");
                    self.quoted(column);
                }
                UpsertStyle::OnDuplicateKey => {
                    self.push_str("VALUES(");
                    self.quoted(column);
                    self.push(')');
                }
                UpsertStyle::Unsupported => return Err(self.unsupported("upsert")),
            },
        }
        Ok(())
    }

    /// A WHERE / ON / HAVING root: parenthesized unless atomic.
    pub(crate) fn predicate(&mut self, e: &Expr) -> QuarryResult<()> {
        let wrap = !e.is_atom();
        self.operand(e, wrap)
    }

    pub(crate) fn list(
        &mut self,
        items: &[Expr],
        separator: &str,
        mode: AliasMode,
    ) -> QuarryResult<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push_str(separator);
            }
            self.expr(item, mode)?;
        }
        Ok(())
    }

    fn operand(&mut self, e: &Expr, parens: bool) -> QuarryResult<()> {
        if parens {
            self.push('(');
        }
        self.expr(e, AliasMode::Inline)?;
        if parens {
            self.push(')');
        }
        Ok(())
    }

    /// `(SELECT ..)` correlated with the enclosing scopes.
    fn subquery(&mut self, query: &Query) -> QuarryResult<()> {
        self.push('(');
        let bare = self.set_bare_columns(false);
        self.query(query)?;
        self.set_bare_columns(bare);
        self.push(')');
        Ok(())
    }

    fn raw(&mut self, sql: &str, params: &[crate::ast::Value]) -> QuarryResult<()> {
        if params.is_empty() {
            self.push_str(sql);
            return Ok(());
        }
        let markers = sql.matches('?').count();
        if markers != params.len() {
            return Err(QuarryError::malformed(format!(
                "raw SQL has {} '?' markers for {} parameters",
                markers,
                params.len()
            )));
        }
        let mut values = params.iter();
        for (i, chunk) in sql.split('?').enumerate() {
            if i > 0 {
                if let Some(v) = values.next() {
                    self.param(v.clone());
                }
            }
            self.push_str(chunk);
        }
        Ok(())
    }

    fn function(&mut self, f: &Function) -> QuarryResult<()> {
        self.push_str(&f.name);
        self.push('(');
        if f.distinct {
            self.push_str("DISTINCT ");
        }
        self.list(&f.args, ", ", AliasMode::Inline)?;
        self.push(')');
        if let Some(window) = &f.over {
            self.push_str(" OVER ");
            self.window(window)?;
        }
        Ok(())
    }

    fn binary(&mut self, left: &Expr, op: Operator, right: &Expr, flat: bool) -> QuarryResult<()> {
        match op {
            Operator::In | Operator::NotIn => self.membership(left, op, right),
            Operator::Is | Operator::IsNot => {
                if !right.is_null_literal() {
                    return Err(QuarryError::malformed(format!(
                        "{} requires NULL on its right side",
                        op
                    )));
                }
                self.null_test(left, op == Operator::IsNot)
            }
            // Hand-built nodes skip the builder's NULL checks
            Operator::Eq | Operator::Ne if left.is_null_literal() || right.is_null_literal() => {
                let subject = if right.is_null_literal() { left } else { right };
                self.null_test(subject, op == Operator::Ne)
            }
            _ if op.is_comparison() && (left.is_null_literal() || right.is_null_literal()) => {
                Err(QuarryError::malformed(format!(
                    "comparison '{}' against NULL is never true",
                    op
                )))
            }
            Operator::Like | Operator::NotLike | Operator::ILike | Operator::NotILike => {
                self.pattern(left, op, right)
            }
            Operator::Concat => match &self.dialect.concat {
                ConcatStyle::Operator { symbol } => {
                    let symbol = symbol.clone();
                    self.infix(left, op, right, &symbol)
                }
                ConcatStyle::Function { name } => {
                    let name = name.clone();
                    let mut parts = Vec::new();
                    collect_chain(left, Operator::Concat, &mut parts);
                    collect_chain(right, Operator::Concat, &mut parts);
                    self.push_str(&name);
                    self.push('(');
                    for (i, part) in parts.iter().enumerate() {
                        if i > 0 {
                            self.push_str(", ");
                        }
                        self.expr(part, AliasMode::Inline)?;
                    }
                    self.push(')');
                    Ok(())
                }
            },
            Operator::BitAnd | Operator::BitOr => match &self.dialect.bitwise {
                BitwiseStyle::Native => self.infix(left, op, right, op.sql_symbol()),
                BitwiseStyle::Function { and, or } => {
                    let name = if op == Operator::BitAnd {
                        and.clone()
                    } else {
                        or.clone()
                    };
                    self.push_str(&name);
                    self.push('(');
                    self.expr(left, AliasMode::Inline)?;
                    self.push_str(", ");
                    self.expr(right, AliasMode::Inline)?;
                    self.push(')');
                    Ok(())
                }
            },
            Operator::And | Operator::Or if flat => {
                let mut parts = Vec::new();
                collect_chain(left, op, &mut parts);
                collect_chain(right, op, &mut parts);
                let separator = if op == Operator::And { " AND " } else { " OR " };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        self.push_str(separator);
                    }
                    self.operand(part, part.precedence() <= op.precedence())?;
                }
                Ok(())
            }
            _ => self.infix(left, op, right, op.sql_symbol()),
        }
    }

    /// `left op right` with the parentheses that keep the tree's shape.
    fn infix(&mut self, left: &Expr, op: Operator, right: &Expr, symbol: &str) -> QuarryResult<()> {
        let p = op.precedence();
        let left_op = top_operator(left);
        let lp = left.precedence();
        let strict = op.is_strict();
        let left_parens = if strict {
            !left.is_atom() && left_op != Some(op)
        } else {
            lp < p
                || (lp == p && (left_op != Some(op) || !op.is_left_associative()))
                || left_op.is_some_and(|o| o.is_strict())
        };
        let right_parens = if strict {
            !right.is_atom()
        } else {
            right.precedence() <= p || top_operator(right).is_some_and(|o| o.is_strict())
        };
        self.operand(left, left_parens)?;
        self.push(' ');
        self.push_str(symbol);
        self.push(' ');
        self.operand(right, right_parens)
    }

    fn null_test(&mut self, subject: &Expr, negated: bool) -> QuarryResult<()> {
        self.operand(subject, subject.precedence() <= Operator::Is.precedence())?;
        self.push_str(if negated { " IS NOT NULL" } else { " IS NULL" });
        Ok(())
    }

    fn membership(&mut self, left: &Expr, op: Operator, right: &Expr) -> QuarryResult<()> {
        if let Expr::Clause { items, .. } = right {
            if items.is_empty() {
                // x IN () matches nothing; x NOT IN () matches everything
                let literal = self.dialect.bool_literal(op == Operator::NotIn).to_string();
                self.push_str(&literal);
                return Ok(());
            }
        }
        self.operand(left, left.precedence() <= op.precedence())?;
        self.push_str(if op == Operator::In { " IN " } else { " NOT IN " });
        match right {
            Expr::Clause { items, .. } => {
                self.push('(');
                self.list(items, ", ", AliasMode::Inline)?;
                self.push(')');
            }
            Expr::Subquery(query) => self.subquery(query)?,
            Expr::Raw { sql, params } => {
                let wrap = !sql.trim_start().starts_with('(');
                if wrap {
                    self.push('(');
                }
                self.raw(sql, params)?;
                if wrap {
                    self.push(')');
                }
            }
            other => {
                return Err(QuarryError::malformed(format!(
                    "{} expects a list or subquery, got {:?}",
                    op, other
                )));
            }
        }
        Ok(())
    }

    fn pattern(&mut self, left: &Expr, op: Operator, right: &Expr) -> QuarryResult<()> {
        let negated = matches!(op, Operator::NotLike | Operator::NotILike);
        let case_insensitive = matches!(op, Operator::ILike | Operator::NotILike);
        let p = op.precedence();
        let operator = if case_insensitive {
            self.dialect.ilike_operator.clone()
        } else {
            Some(self.dialect.like_operator.clone())
        };
        let not = if negated { "NOT " } else { "" };
        match operator {
            Some(operator) => {
                self.operand(left, left.precedence() <= p)?;
                self.push_str(&format!(" {}{} ", not, operator));
                self.operand(right, right.precedence() <= p)
            }
            None => {
                self.push_str("LOWER(");
                self.expr(left, AliasMode::Inline)?;
                self.push_str(&format!(") {}LIKE LOWER(", not));
                self.expr(right, AliasMode::Inline)?;
                self.push(')');
                Ok(())
            }
        }
    }
}

fn top_operator(e: &Expr) -> Option<Operator> {
    match e {
        Expr::Binary { op, .. } => Some(*op),
        Expr::Alias { expr, .. } => top_operator(expr),
        _ => None,
    }
}

/// Flatten a left/right chain of flat `op` nodes into its operands.
fn collect_chain<'e>(e: &'e Expr, op: Operator, out: &mut Vec<&'e Expr>) {
    match e {
        Expr::Binary {
            left,
            op: child_op,
            right,
            flat,
        } if *child_op == op && (*flat || op == Operator::Concat) => {
            collect_chain(left, op, out);
            collect_chain(right, op, out);
        }
        other => out.push(other),
    }
}
