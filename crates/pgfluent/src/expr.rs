//! WHERE predicate fragments for joined queries.
//!
//! Predicates and their parameters are accumulated in lockstep: every `Expr` owns the values
//! for its own placeholders, and [`ExprGroup::build`] assigns `$n` indices left to right, so
//! rendered SQL and the bound parameter list can never drift apart.

use crate::param::{Param, ParamList};

/// Predicate node for building WHERE clauses.
#[derive(Clone, Debug)]
pub enum Expr {
    /// Equality comparison: `field = $n`
    Eq { field: String, value: Param },

    /// IN list: `field IN ($1, $2, ...)`
    InList { field: String, values: Vec<Param> },

    /// Never true; used for an empty IN list. Renders `field <> field`.
    Never { field: String },

    /// Expression with `?` placeholders, bound in order. `??` renders a literal `?`
    /// (jsonb `?`, `?|`, `?&` operators or a `?` inside a string literal).
    /// Example: `Template { sql: "a = ? OR b = ?", params: [1, 2] }` -> `a = $1 OR b = $2`
    Template { sql: String, params: Vec<Param> },

    /// Raw SQL fragment without parameters.
    Raw(String),
}

impl Expr {
    /// Create an equality condition: field = value
    pub fn eq(field: impl Into<String>, value: Param) -> Self {
        Expr::Eq {
            field: field.into(),
            value,
        }
    }

    /// Create an IN condition. An empty list never matches.
    pub fn in_list(field: impl Into<String>, values: Vec<Param>) -> Self {
        let field = field.into();
        if values.is_empty() {
            return Expr::Never { field };
        }
        Expr::InList { field, values }
    }

    /// Create a template expression with `?` placeholders.
    pub fn template(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Expr::Template {
            sql: sql.into(),
            params,
        }
    }

    /// Number of `?` placeholders in a template string (`??` is not one).
    pub(crate) fn placeholder_count(sql: &str) -> usize {
        let mut count = 0;
        let mut chars = sql.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '?' {
                if chars.peek() == Some(&'?') {
                    chars.next();
                } else {
                    count += 1;
                }
            }
        }
        count
    }

    /// Render the SQL fragment, pushing parameters onto `params`.
    pub fn build(&self, params: &mut ParamList) -> String {
        match self {
            Expr::Eq { field, value } => {
                let idx = params.push_param(value.clone());
                format!("{} = ${}", field, idx)
            }
            Expr::InList { field, values } => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| format!("${}", params.push_param(v.clone())))
                    .collect();
                format!("{} IN ({})", field, placeholders.join(", "))
            }
            Expr::Never { field } => format!("{} <> {}", field, field),
            Expr::Template {
                sql,
                params: template_params,
            } => {
                let mut result = String::with_capacity(sql.len() + 4);
                let mut bound = template_params.iter();
                let mut chars = sql.chars().peekable();
                while let Some(ch) = chars.next() {
                    if ch == '?' && chars.peek() == Some(&'?') {
                        chars.next();
                        result.push('?');
                    } else if ch == '?' {
                        match bound.next() {
                            Some(p) => {
                                let idx = params.push_param(p.clone());
                                result.push('$');
                                result.push_str(&idx.to_string());
                            }
                            None => result.push(ch),
                        }
                    } else {
                        result.push(ch);
                    }
                }
                result
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }
}

/// Predicates ANDed together into one WHERE clause.
#[derive(Clone, Debug, Default)]
pub struct ExprGroup {
    exprs: Vec<Expr>,
}

impl ExprGroup {
    /// Create a new empty expression group.
    pub fn new() -> Self {
        Self { exprs: Vec::new() }
    }

    /// Check if the group is empty.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Add an expression to be ANDed.
    pub fn push(&mut self, expr: Expr) {
        self.exprs.push(expr);
    }

    /// Render the WHERE clause content (without the keyword) into `params`.
    ///
    /// OR-containing templates are parenthesized so AND binds as written.
    pub fn build_into(&self, params: &mut ParamList) -> String {
        let parts: Vec<String> = self
            .exprs
            .iter()
            .map(|e| {
                let sql = e.build(params);
                if self.exprs.len() > 1 && needs_parens(e) {
                    format!("({})", sql)
                } else {
                    sql
                }
            })
            .collect();
        parts.join(" AND ")
    }

    /// Render the WHERE clause content with a fresh parameter list.
    pub fn build(&self) -> (String, ParamList) {
        let mut params = ParamList::new();
        let sql = self.build_into(&mut params);
        (sql, params)
    }
}

fn needs_parens(expr: &Expr) -> bool {
    match expr {
        Expr::Template { sql, .. } | Expr::Raw(sql) => {
            let upper = sql.to_ascii_uppercase();
            upper.contains(" OR ")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_renders_numbered_placeholder() {
        let mut params = ParamList::new();
        let sql = Expr::eq("p.name", Param::new("alice")).build(&mut params);
        assert_eq!(sql, "p.name = $1");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn in_list_binds_each_value() {
        let mut params = ParamList::new();
        let values = vec![Param::new(1i64), Param::new(2i64), Param::new(3i64)];
        let sql = Expr::in_list("o.id", values).build(&mut params);
        assert_eq!(sql, "o.id IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn empty_in_list_never_matches() {
        let mut params = ParamList::new();
        let sql = Expr::in_list("o.id", Vec::new()).build(&mut params);
        assert_eq!(sql, "o.id <> o.id");
        assert!(params.is_empty());
    }

    #[test]
    fn template_replaces_question_marks_in_order() {
        let mut params = ParamList::new();
        let expr = Expr::template(
            "p.age BETWEEN ? AND ?",
            vec![Param::new(18i32), Param::new(65i32)],
        );
        assert_eq!(expr.build(&mut params), "p.age BETWEEN $1 AND $2");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn group_numbers_across_predicates() {
        let mut group = ExprGroup::new();
        group.push(Expr::eq("p.name", Param::new("alice")));
        group.push(Expr::template("lower(o.name) = ?", vec![Param::new("acme")]));
        group.push(Expr::in_list("m.role", vec![Param::new("admin"), Param::new("owner")]));

        let (sql, params) = group.build();
        assert_eq!(
            sql,
            "p.name = $1 AND lower(o.name) = $2 AND m.role IN ($3, $4)"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn or_template_is_parenthesized_in_group() {
        let mut group = ExprGroup::new();
        group.push(Expr::eq("p.active", Param::new(true)));
        group.push(Expr::template(
            "p.name = ? or p.email = ?",
            vec![Param::new("a"), Param::new("b")],
        ));
        let (sql, _) = group.build();
        assert_eq!(sql, "p.active = $1 AND (p.name = $2 or p.email = $3)");
    }

    #[test]
    fn placeholder_count_counts_question_marks() {
        assert_eq!(Expr::placeholder_count("a = ? AND b = ?"), 2);
        assert_eq!(Expr::placeholder_count("a IS NULL"), 0);
        assert_eq!(Expr::placeholder_count("p.tags ?? 'vip' AND p.id = ?"), 1);
        assert_eq!(Expr::placeholder_count("p.tags ??| array['a'] AND p.tags ??& ?"), 1);
    }

    #[test]
    fn doubled_question_mark_renders_literal() {
        let mut params = ParamList::new();
        let expr = Expr::template("p.data ?? 'k' AND p.id = ?", vec![Param::new(7i64)]);
        assert_eq!(expr.build(&mut params), "p.data ? 'k' AND p.id = $1");
        assert_eq!(params.len(), 1);
    }
}
