//! State threaded through one compilation: output buffer, parameter
//! accumulator, alias table and the stack of visible sources.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::ast::{Source, SourceKind, Value};
use crate::error::{QuarryError, QuarryResult};
use crate::transpiler::dialect::DialectConfig;

/// How a source's columns are qualified.
#[derive(Debug, Clone, PartialEq)]
enum Qualifier {
    /// Generated `tN`, unquoted
    Auto(String),
    /// Caller-chosen alias, quoted
    Explicit(String),
    /// DML target: the quoted table name itself
    Table(String),
}

/// Stable source → alias mapping for a whole statement, nested queries included.
#[derive(Debug, Default)]
pub(crate) struct AliasTable {
    names: HashMap<u64, Qualifier>,
    used: HashSet<String>,
    counter: usize,
}

impl AliasTable {
    /// Assign an alias on first encounter; later calls are no-ops.
    fn register(&mut self, source: &Source) {
        if self.names.contains_key(&source.id()) {
            return;
        }
        let qualifier = match source.alias() {
            Some(alias) => {
                self.used.insert(alias.to_string());
                Qualifier::Explicit(alias.to_string())
            }
            None => Qualifier::Auto(self.next_auto()),
        };
        trace!(source = source.name(), alias = ?qualifier, "assigned alias");
        self.names.insert(source.id(), qualifier);
    }

    fn register_table(&mut self, source: &Source, rendered: String) {
        self.names.insert(source.id(), Qualifier::Table(rendered));
    }

    /// Next unused `tN`.
    fn next_auto(&mut self) -> String {
        loop {
            self.counter += 1;
            let name = format!("t{}", self.counter);
            if self.used.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// How an [`crate::ast::Expr::Alias`] node renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AliasMode {
    /// In a projection: `expr AS "name"`
    Define,
    /// In ORDER BY / GROUP BY: `"name"`
    Reference,
    /// Anywhere else: just `expr`
    Inline,
}

/// One compilation pass.
pub struct Compiler<'d> {
    pub(crate) dialect: &'d DialectConfig,
    sql: String,
    params: Vec<Value>,
    aliases: AliasTable,
    /// Frames of source ids visible to column references
    scopes: Vec<Vec<u64>>,
    /// CTE ids already declared by an enclosing WITH
    ctes_in_scope: Vec<u64>,
    /// Render columns unqualified (compound ORDER BY, RETURNING)
    bare_columns: bool,
}

impl<'d> Compiler<'d> {
    pub fn new(dialect: &'d DialectConfig) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
            aliases: AliasTable::default(),
            scopes: Vec::new(),
            ctes_in_scope: Vec::new(),
            bare_columns: false,
        }
    }

    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub(crate) fn push_str(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub(crate) fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    pub(crate) fn quoted(&mut self, name: &str) {
        let q = self.dialect.quote_identifier(name);
        self.sql.push_str(&q);
    }

    /// Append a bound parameter and write its placeholder.
    pub(crate) fn param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    pub(crate) fn unsupported(&self, feature: &'static str) -> QuarryError {
        QuarryError::unsupported(&self.dialect.name, feature)
    }

    pub(crate) fn register(&mut self, source: &Source) {
        self.aliases.register(source);
    }

    /// Register a DML target whose columns are qualified by table name.
    pub(crate) fn register_table(&mut self, source: &Source) -> QuarryResult<()> {
        let rendered = self.table_name(source)?;
        self.aliases.register_table(source, rendered);
        Ok(())
    }

    /// A fresh generated alias not tied to any source (derived compound members).
    pub(crate) fn anonymous_alias(&mut self) -> String {
        self.aliases.next_auto()
    }

    /// `"schema"."table"`, or a CTE's name. Subqueries have no name.
    pub(crate) fn table_name(&self, source: &Source) -> QuarryResult<String> {
        match source.kind() {
            SourceKind::Table(def) => Ok(match &def.schema {
                Some(schema) => format!(
                    "{}.{}",
                    self.dialect.quote_identifier(schema),
                    self.dialect.quote_identifier(&def.name)
                ),
                None => self.dialect.quote_identifier(&def.name),
            }),
            SourceKind::Cte(cte) => Ok(self.dialect.quote_identifier(&cte.name)),
            SourceKind::Subquery(_) => Err(QuarryError::malformed(
                "a subquery cannot be the target of a data-modifying statement",
            )),
        }
    }

    /// The qualifier text for a registered source (`t1`, `"mgr"`, `"user"`).
    pub(crate) fn qualifier(&mut self, source: &Source) -> String {
        self.aliases.register(source);
        match self.aliases.names.get(&source.id()) {
            Some(Qualifier::Auto(name)) => name.clone(),
            Some(Qualifier::Explicit(name)) => self.dialect.quote_identifier(name),
            Some(Qualifier::Table(rendered)) => rendered.clone(),
            None => String::new(),
        }
    }

    /// Write the qualifier followed by a dot, unless columns render bare.
    pub(crate) fn qualify(&mut self, source: &Source) -> QuarryResult<()> {
        if !self.in_scope(source) {
            return Err(QuarryError::UnboundSource(source.name().to_string()));
        }
        if self.bare_columns {
            return Ok(());
        }
        let q = self.qualifier(source);
        self.sql.push_str(&q);
        self.sql.push('.');
        Ok(())
    }

    fn in_scope(&self, source: &Source) -> bool {
        self.scopes
            .iter()
            .any(|frame| frame.contains(&source.id()))
    }

    pub(crate) fn push_scope<'s>(&mut self, sources: impl IntoIterator<Item = &'s Source>) {
        self.scopes
            .push(sources.into_iter().map(Source::id).collect());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Hide all enclosing scopes (FROM subqueries and CTE bodies are not
    /// correlated). Returns the hidden stack for [`Compiler::restore_scopes`].
    pub(crate) fn isolate_scopes(&mut self) -> Vec<Vec<u64>> {
        std::mem::take(&mut self.scopes)
    }

    pub(crate) fn restore_scopes(&mut self, saved: Vec<Vec<u64>>) {
        self.scopes = saved;
    }

    /// Set the bare-column flag, returning the previous value.
    pub(crate) fn set_bare_columns(&mut self, bare: bool) -> bool {
        std::mem::replace(&mut self.bare_columns, bare)
    }

    pub(crate) fn cte_declared(&self, source: &Source) -> bool {
        self.ctes_in_scope.contains(&source.id())
    }

    pub(crate) fn declare_cte(&mut self, source: &Source) {
        self.ctes_in_scope.push(source.id());
    }

    pub(crate) fn cte_mark(&self) -> usize {
        self.ctes_in_scope.len()
    }

    pub(crate) fn release_ctes(&mut self, mark: usize) {
        self.ctes_in_scope.truncate(mark);
    }
}
