//! Filter expression parser using nom.
//!
//! Parses a compact, SQL-like condition into an [`Expr`] over known sources,
//! so filters can come from a command line or a config file.
//!
//! # Syntax Overview
//!
//! ```text
//! active = true and (name ~ 'a%' or email is null) and id in (1, 2, 3)
//! ──┬─── ┬ ──┬─ ─┬─           ┬
//!   │    │   │   │            └── `~` LIKE, `~*` ILIKE, `!~` NOT LIKE
//!   │    │   │   └── and / or / not, parentheses group
//!   │    │   └── 'string', 42, 1.5, true, false, null
//!   │    └── = != <> < <= > >=
//!   └── field, or source.field when several sources are in scope
//! ```
//!
//! Also: `x is [not] null`, `x [not] in (..)`, `x [not] between a and b`.
//! Keywords are case-insensitive. `x = null` becomes `x IS NULL`.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
};

use crate::ast::{Expr, Operator, Source, Value};
use crate::error::{QuarryError, QuarryResult};

/// Parse a filter over a single source.
///
/// # Example
///
/// ```
/// use quarry::ast::{Source, SqlType, TableDef};
/// use quarry::parser::parse_filter;
///
/// let user = Source::table(
///     TableDef::new("user")
///         .field("active", SqlType::Boolean)
///         .field("age", SqlType::Integer),
/// );
/// let filter = parse_filter(&user, "active = true and age > 30").unwrap();
/// ```
pub fn parse_filter(source: &Source, input: &str) -> QuarryResult<Expr> {
    parse_filter_in(std::slice::from_ref(source), input)
}

/// Parse a filter whose fields may belong to any of `sources`.
///
/// Unqualified fields must be declared by exactly one source; `name.field`
/// picks the source by alias or table name.
pub fn parse_filter_in(sources: &[Source], input: &str) -> QuarryResult<Expr> {
    if input.trim().is_empty() {
        return Err(QuarryError::parse(0, "expected a condition"));
    }
    let (rest, node) = match parse_or(input) {
        Ok(ok) => ok,
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            return Err(QuarryError::parse(
                input.len() - e.input.len(),
                format!("unexpected input '{}'", snippet(e.input)),
            ));
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(QuarryError::parse(input.len(), "unexpected end of input"));
        }
    };
    let rest = rest.trim_start();
    if !rest.is_empty() {
        return Err(QuarryError::parse(
            input.len() - rest.len(),
            format!("unexpected trailing content '{}'", snippet(rest)),
        ));
    }
    Resolver { sources, input }.expr(node)
}

fn snippet(s: &str) -> &str {
    match s.char_indices().nth(16) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

// ============================================================================
// Syntax tree
// ============================================================================

/// Parsed condition before its fields are bound to sources. Offsets are
/// stored as the length of the remaining input.
#[derive(Debug, Clone, PartialEq)]
enum Node<'a> {
    Or(Vec<Node<'a>>),
    And(Vec<Node<'a>>),
    Not(Box<Node<'a>>),
    Test(Operand<'a>, Test<'a>),
}

#[derive(Debug, Clone, PartialEq)]
enum Operand<'a> {
    Field {
        qualifier: Option<&'a str>,
        name: &'a str,
        rest: usize,
    },
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Test<'a> {
    Compare(Operator, Operand<'a>),
    Null { negated: bool },
    In { items: Vec<Operand<'a>>, negated: bool },
    Like {
        pattern: Operand<'a>,
        negated: bool,
        case_insensitive: bool,
    },
    Between {
        low: Operand<'a>,
        high: Operand<'a>,
        negated: bool,
    },
}

// ============================================================================
// Grammar
// ============================================================================

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    preceded(multispace0, inner)
}

/// A case-insensitive keyword not followed by an identifier character.
fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        let (rest, matched) = tag_no_case::<_, _, NomError<&'a str>>(kw)(input)?;
        if rest.starts_with(is_ident_char) {
            return Err(nom::Err::Error(NomError::new(input, ErrorKind::Tag)));
        }
        Ok((rest, matched))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Parse an identifier (source or field name).
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    take_while1(is_ident_char)(input)
}

fn parse_or(input: &str) -> IResult<&str, Node<'_>> {
    let (input, first) = parse_and(input)?;
    let (input, rest) = many0(preceded(ws(keyword("or")), parse_and))(input)?;
    Ok((input, fold(first, rest, Node::Or)))
}

fn parse_and(input: &str) -> IResult<&str, Node<'_>> {
    let (input, first) = parse_not(input)?;
    let (input, rest) = many0(preceded(ws(keyword("and")), parse_not))(input)?;
    Ok((input, fold(first, rest, Node::And)))
}

fn fold<'a>(first: Node<'a>, rest: Vec<Node<'a>>, chain: fn(Vec<Node<'a>>) -> Node<'a>) -> Node<'a> {
    if rest.is_empty() {
        return first;
    }
    let mut all = vec![first];
    all.extend(rest);
    chain(all)
}

fn parse_not(input: &str) -> IResult<&str, Node<'_>> {
    alt((
        map(preceded(ws(keyword("not")), parse_not), |n| {
            Node::Not(Box::new(n))
        }),
        parse_primary,
    ))(input)
}

fn parse_primary(input: &str) -> IResult<&str, Node<'_>> {
    alt((
        delimited(ws(char('(')), parse_or, ws(char(')'))),
        parse_test,
    ))(input)
}

fn parse_test(input: &str) -> IResult<&str, Node<'_>> {
    let (input, left) = parse_operand(input)?;
    let (input, test) = alt((
        parse_null_test,
        parse_in_test,
        parse_between_test,
        parse_like_test,
        map(pair(ws(parse_comparison), parse_operand), |(op, rhs)| {
            Test::Compare(op, rhs)
        }),
    ))(input)?;
    Ok((input, Node::Test(left, test)))
}

fn parse_comparison(input: &str) -> IResult<&str, Operator> {
    alt((
        value(Operator::Ne, tag("!=")),
        value(Operator::Ne, tag("<>")),
        value(Operator::Le, tag("<=")),
        value(Operator::Ge, tag(">=")),
        value(Operator::Lt, char('<')),
        value(Operator::Gt, char('>')),
        value(Operator::Eq, char('=')),
    ))(input)
}

fn parse_null_test(input: &str) -> IResult<&str, Test<'_>> {
    let (input, _) = ws(keyword("is"))(input)?;
    let (input, not) = opt(ws(keyword("not")))(input)?;
    let (input, _) = ws(keyword("null"))(input)?;
    Ok((
        input,
        Test::Null {
            negated: not.is_some(),
        },
    ))
}

fn parse_in_test(input: &str) -> IResult<&str, Test<'_>> {
    let (input, not) = opt(ws(keyword("not")))(input)?;
    let (input, _) = ws(keyword("in"))(input)?;
    let (input, items) = delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), parse_operand),
        ws(char(')')),
    )(input)?;
    Ok((
        input,
        Test::In {
            items,
            negated: not.is_some(),
        },
    ))
}

fn parse_between_test(input: &str) -> IResult<&str, Test<'_>> {
    let (input, not) = opt(ws(keyword("not")))(input)?;
    let (input, _) = ws(keyword("between"))(input)?;
    let (input, low) = parse_operand(input)?;
    let (input, _) = ws(keyword("and"))(input)?;
    let (input, high) = parse_operand(input)?;
    Ok((
        input,
        Test::Between {
            low,
            high,
            negated: not.is_some(),
        },
    ))
}

fn parse_like_test(input: &str) -> IResult<&str, Test<'_>> {
    let (input, (negated, case_insensitive)) = ws(alt((
        value((true, true), tag("!~*")),
        value((true, false), tag("!~")),
        value((false, true), tag("~*")),
        value((false, false), tag("~")),
    )))(input)?;
    let (input, pattern) = parse_operand(input)?;
    Ok((
        input,
        Test::Like {
            pattern,
            negated,
            case_insensitive,
        },
    ))
}

fn parse_operand(input: &str) -> IResult<&str, Operand<'_>> {
    ws(alt((map(parse_literal, Operand::Literal), parse_field)))(input)
}

fn parse_literal(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), keyword("true")),
        value(Value::Bool(false), keyword("false")),
        value(Value::Null, keyword("null")),
        parse_number,
        parse_quoted_string,
    ))(input)
}

/// Parse a number (integer or float).
fn parse_number(input: &str) -> IResult<&str, Value> {
    let number = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )));
    map_res(number, |s: &str| {
        if s.contains('.') {
            s.parse::<f64>().map(Value::Float).map_err(|_| ())
        } else {
            s.parse::<i64>().map(Value::Int).map_err(|_| ())
        }
    })(input)
}

/// Parse a single-quoted string; `''` stands for one quote.
fn parse_quoted_string(input: &str) -> IResult<&str, Value> {
    let (input, parts) = delimited(
        char('\''),
        many0(alt((value("'", tag("''")), is_not("'")))),
        char('\''),
    )(input)?;
    Ok((input, Value::String(parts.concat())))
}

fn parse_field(input: &str) -> IResult<&str, Operand<'_>> {
    let rest = input.len();
    let (input, first) = parse_identifier(input)?;
    let (input, second) = opt(preceded(char('.'), parse_identifier))(input)?;
    let (qualifier, name) = match second {
        Some(name) => (Some(first), name),
        None => (None, first),
    };
    Ok((
        input,
        Operand::Field {
            qualifier,
            name,
            rest,
        },
    ))
}

// ============================================================================
// Binding to sources
// ============================================================================

struct Resolver<'s> {
    sources: &'s [Source],
    input: &'s str,
}

impl Resolver<'_> {
    fn expr(&self, node: Node<'_>) -> QuarryResult<Expr> {
        match node {
            Node::Or(nodes) => self.chain(nodes, Expr::or),
            Node::And(nodes) => self.chain(nodes, Expr::and),
            Node::Not(inner) => Ok(self.expr(*inner)?.not()),
            Node::Test(left, test) => self.test(left, test),
        }
    }

    fn chain(&self, nodes: Vec<Node<'_>>, join: fn(Expr, Expr) -> Expr) -> QuarryResult<Expr> {
        let mut exprs = nodes.into_iter().map(|n| self.expr(n));
        let first = exprs
            .next()
            .ok_or_else(|| QuarryError::parse(0, "empty condition list"))??;
        exprs.try_fold(first, |acc, e| Ok(join(acc, e?)))
    }

    fn test(&self, left: Operand<'_>, test: Test<'_>) -> QuarryResult<Expr> {
        let lhs = self.operand(left)?;
        match test {
            Test::Compare(op, rhs) => lhs.compare(op, self.operand(rhs)?),
            Test::Null { negated: false } => Ok(lhs.is_null()),
            Test::Null { negated: true } => Ok(lhs.is_not_null()),
            Test::In { items, negated } => {
                let items = items
                    .into_iter()
                    .map(|i| self.operand(i))
                    .collect::<QuarryResult<Vec<_>>>()?;
                Ok(if negated {
                    lhs.not_in(items)
                } else {
                    lhs.is_in(items)
                })
            }
            Test::Like {
                pattern,
                negated,
                case_insensitive,
            } => {
                let pattern = self.operand(pattern)?;
                match (negated, case_insensitive) {
                    (false, false) => lhs.like(pattern),
                    (true, false) => lhs.not_like(pattern),
                    (false, true) => lhs.ilike(pattern),
                    (true, true) => lhs.not_ilike(pattern),
                }
            }
            Test::Between { low, high, negated } => {
                let (low, high) = (self.operand(low)?, self.operand(high)?);
                Ok(if negated {
                    lhs.not_between(low, high)
                } else {
                    lhs.between(low, high)
                })
            }
        }
    }

    fn operand(&self, operand: Operand<'_>) -> QuarryResult<Expr> {
        match operand {
            Operand::Literal(v) => Ok(Expr::value(v)),
            Operand::Field {
                qualifier,
                name,
                rest,
            } => {
                let at = self.input.len() - rest;
                let source = self.source_of(qualifier, name, at)?;
                Ok(source.col(name))
            }
        }
    }

    fn source_of(&self, qualifier: Option<&str>, name: &str, at: usize) -> QuarryResult<&Source> {
        let declares = |s: &Source| {
            let fields = s.field_names();
            fields.is_empty() || fields.iter().any(|f| f == name)
        };
        let source = match qualifier {
            Some(q) => self
                .sources
                .iter()
                .find(|s| s.alias() == Some(q))
                .or_else(|| self.sources.iter().find(|s| s.name() == q))
                .ok_or_else(|| QuarryError::parse(at, format!("unknown source '{}'", q)))?,
            None => {
                let matches: Vec<&Source> = self.sources.iter().filter(|s| declares(s)).collect();
                match matches.as_slice() {
                    [one] => *one,
                    [] => {
                        return Err(QuarryError::parse(at, format!("unknown field '{}'", name)));
                    }
                    _ => {
                        return Err(QuarryError::parse(
                            at,
                            format!("field '{}' is ambiguous; qualify it", name),
                        ));
                    }
                }
            }
        };
        if !declares(source) {
            return Err(QuarryError::parse(
                at,
                format!("'{}' has no field '{}'", source.name(), name),
            ));
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Query, SqlType, TableDef};
    use crate::transpiler::ToSql;
    use pretty_assertions::assert_eq;

    fn user() -> Source {
        Source::table(
            TableDef::new("user")
                .field("id", SqlType::Integer)
                .field("name", SqlType::Text)
                .field("email", SqlType::Text)
                .field("active", SqlType::Boolean)
                .primary_key(["id"]),
        )
    }

    fn where_sql(source: &Source, filter: &str) -> String {
        let expr = parse_filter(source, filter).unwrap();
        let sql = Query::select([source.col("id")])
            .from(source)
            .filter(expr)
            .to_sql()
            .unwrap()
            .sql;
        sql.split(" WHERE ").nth(1).unwrap_or_default().to_string()
    }

    #[test]
    fn test_simple_comparison() {
        let u = user();
        let expr = parse_filter(&u, "active = true").unwrap();
        assert_eq!(expr, u.col("active").eq(true).unwrap());
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let u = user();
        assert_eq!(
            where_sql(&u, "id > 1 and name ~ 'a%' or email is null"),
            "(t1.\"id\" > $1 AND t1.\"name\" LIKE $2 OR t1.\"email\" IS NULL)"
        );
    }

    #[test]
    fn test_parentheses_and_not() {
        let u = user();
        assert_eq!(
            where_sql(&u, "NOT (id = 1 OR id = 2)"),
            "(NOT (t1.\"id\" = $1 OR t1.\"id\" = $2))"
        );
    }

    #[test]
    fn test_null_equality_becomes_is_null() {
        let u = user();
        assert_eq!(
            parse_filter(&u, "email = null").unwrap(),
            u.col("email").is_null()
        );
        assert_eq!(
            parse_filter(&u, "email is not null").unwrap(),
            u.col("email").is_not_null()
        );
    }

    #[test]
    fn test_in_between_and_strings() {
        let u = user();
        assert_eq!(
            parse_filter(&u, "id not in (1, 2, 3)").unwrap(),
            u.col("id").not_in([1, 2, 3])
        );
        assert_eq!(
            parse_filter(&u, "id between 1 and 10").unwrap(),
            u.col("id").between(1, 10)
        );
        assert_eq!(
            parse_filter(&u, "name = 'o''brien'").unwrap(),
            u.col("name").eq("o'brien").unwrap()
        );
        assert_eq!(
            parse_filter(&u, "name !~* 'X%'").unwrap(),
            u.col("name").not_ilike("X%").unwrap()
        );
    }

    #[test]
    fn test_keyword_prefix_is_not_a_keyword() {
        let orders = Source::table(
            TableDef::new("orders")
                .field("ordinal", SqlType::Integer)
                .field("notes", SqlType::Text),
        );
        let expr = parse_filter(&orders, "ordinal = 1 and notes is null").unwrap();
        assert_eq!(
            expr,
            orders
                .col("ordinal")
                .eq(1)
                .unwrap()
                .and(orders.col("notes").is_null())
        );
    }

    #[test]
    fn test_qualified_fields_across_sources() {
        let u = user();
        let tweet = Source::table(
            TableDef::new("tweet")
                .field("id", SqlType::Integer)
                .field("body", SqlType::Text),
        );
        let sources = [u.clone(), tweet.clone()];
        let expr = parse_filter_in(&sources, "user.id = tweet.id and body ~ 'x'").unwrap();
        assert_eq!(
            expr,
            u.col("id")
                .eq(tweet.col("id"))
                .unwrap()
                .and(tweet.col("body").like("x").unwrap())
        );

        let err = parse_filter_in(&sources, "id = 1").unwrap_err();
        assert!(matches!(err, QuarryError::Parse { position: 0, .. }));
    }

    #[test]
    fn test_unknown_field_reports_position() {
        let u = user();
        let err = parse_filter(&u, "active = true and nickname = 'x'").unwrap_err();
        assert!(matches!(err, QuarryError::Parse { position: 18, .. }));
    }

    #[test]
    fn test_trailing_garbage_reports_position() {
        let u = user();
        let err = parse_filter(&u, "active = true banana").unwrap_err();
        assert!(matches!(err, QuarryError::Parse { position: 14, .. }));
    }

    #[test]
    fn test_malformed_input() {
        let u = user();
        assert!(matches!(
            parse_filter(&u, "").unwrap_err(),
            QuarryError::Parse { position: 0, .. }
        ));
        assert!(matches!(
            parse_filter(&u, "(id = 1").unwrap_err(),
            QuarryError::Parse { .. }
        ));
        // ordering against NULL is a construction error, not a syntax error
        assert!(matches!(
            parse_filter(&u, "id > null").unwrap_err(),
            QuarryError::MalformedExpression(_)
        ));
    }
}
