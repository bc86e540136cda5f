use super::*;
use crate::table::Table;

fn tables() -> (TableAlias, TableAlias, TableAlias) {
    (
        Table::new("persons").alias("p"),
        Table::new("organizations").alias("o"),
        Table::new("memberships").alias("m"),
    )
}

#[test]
fn base_only_selects_star() {
    let (p, _, _) = tables();
    assert_eq!(p.query().to_sql(), "SELECT * FROM persons p");
}

#[test]
fn joins_render_in_call_order() {
    let (p, o, m) = tables();
    let q = m
        .join(&m.column("person_id"), &p.column("id"))
        .join(&m.column("organization_id"), &o.column("id"));

    assert_eq!(
        q.to_sql(),
        "SELECT * FROM memberships m \
         INNER JOIN persons p ON m.person_id = p.id \
         INNER JOIN organizations o ON m.organization_id = o.id"
    );
}

#[test]
fn aliases_follow_from_order() {
    let (p, o, m) = tables();
    let q = m
        .join(&m.column("person_id"), &p.column("id"))
        .left_join(&m.column("organization_id"), &o.column("id"));

    let names: Vec<String> = q.aliases().iter().map(|a| a.alias().to_string()).collect();
    assert_eq!(names, ["m", "p", "o"]);
    assert_eq!(q.left_join_keys(), vec![o.column("id")]);
}

#[test]
fn left_join_renders_keyword() {
    let p = Table::new("persons").alias("p");
    let a = Table::new("addresses").alias("a");
    let sql = p.left_join(&p.column("id"), &a.column("person_id")).to_sql();
    assert_eq!(
        sql,
        "SELECT * FROM persons p LEFT JOIN addresses a ON p.id = a.person_id"
    );
}

#[test]
fn where_clauses_are_anded_with_numbered_params() {
    let (p, o, m) = tables();
    let q = m
        .join(&m.column("person_id"), &p.column("id"))
        .join(&m.column("organization_id"), &o.column("id"))
        .where_eq(o.column("name"), "Acme")
        .where_in(p.column("id"), vec![1_i64, 2])
        .where_expr("p.active");

    let (sql, params) = q.build_sql(false);
    assert!(
        sql.ends_with(" WHERE o.name = $1 AND p.id IN ($2, $3) AND p.active"),
        "{sql}"
    );
    assert_eq!(params.len(), 3);
}

#[test]
fn empty_where_in_never_matches() {
    let (p, _, _) = tables();
    let (sql, params) = p.where_in(p.column("id"), Vec::<i64>::new()).build_sql(false);
    assert_eq!(sql, "SELECT * FROM persons p WHERE p.id <> p.id");
    assert!(params.is_empty());
}

#[test]
fn where_optional_skips_none() {
    let (p, _, _) = tables();
    let q = p
        .query()
        .where_optional(p.column("name"), None::<String>)
        .where_optional(p.column("id"), Some(7_i64));
    assert_eq!(q.to_sql(), "SELECT * FROM persons p WHERE p.id = $1");
}

#[test]
fn where_expr_with_binds_question_marks() {
    let (p, _, _) = tables();
    let q = p
        .where_eq("p.id", 1_i64)
        .where_expr_with_params(
            "p.name = ? OR p.name = ?",
            vec![Param::new("a"), Param::new("b")],
        );
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM persons p WHERE p.id = $1 AND (p.name = $2 OR p.name = $3)"
    );
}

#[test]
fn where_expr_with_keeps_escaped_jsonb_operator() {
    let (p, _, _) = tables();
    let q = p.query().where_expr_with("p.data ?? 'k' AND p.id = ?", 1_i64);
    assert!(q.validate().is_ok());
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM persons p WHERE p.data ? 'k' AND p.id = $1"
    );
}

#[test]
fn where_expr_with_wrong_arity_fails_validation() {
    let (p, _, _) = tables();
    let q = p.query().where_expr_with("p.id = ? AND p.id = ?", 1_i64);
    assert!(matches!(q.validate(), Err(FluentError::Validation(_))));
}

#[test]
fn where_all_pairs_fields_and_values() {
    let (p, _, _) = tables();
    let q = p.query().where_all(
        [p.column("name"), p.column("active")],
        [Param::new("Ann"), Param::new(true)],
    );
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM persons p WHERE p.name = $1 AND p.active = $2"
    );
    assert!(q.validate().is_ok());
}

#[test]
fn where_all_length_mismatch_fails_validation() {
    let (p, _, _) = tables();
    let q = p
        .query()
        .where_all([p.column("name"), p.column("active")], [Param::new("Ann")]);
    let err = q.validate().unwrap_err();
    assert!(err.is_programming_error());
}

#[test]
fn order_by_items_render_in_call_order() {
    let (p, o, m) = tables();
    let q = m
        .join(&m.column("person_id"), &p.column("id"))
        .join(&m.column("organization_id"), &o.column("id"))
        .order_by(o.column("name"))
        .order_by(p.column("name").desc())
        .order_by("m.id");
    assert!(
        q.to_sql().ends_with(" ORDER BY o.name, p.name DESC, m.id"),
        "{}",
        q.to_sql()
    );
}

#[test]
fn limit_offset_paging() {
    let (p, _, _) = tables();
    let q = p.order_by(p.column("id")).skip_and_limit(20, 10);
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM persons p ORDER BY p.id LIMIT 10 OFFSET 20"
    );
}

#[test]
fn fetch_first_paging() {
    let (p, _, _) = tables();
    let q = p
        .order_by(p.column("id"))
        .paging(PagingStyle::FetchFirst)
        .offset(5)
        .limit(10);
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM persons p ORDER BY p.id OFFSET 5 ROWS FETCH FIRST 10 ROWS ONLY"
    );
}

#[test]
fn count_ignores_order_and_paging() {
    let (p, o, m) = tables();
    let q = m
        .join(&m.column("person_id"), &p.column("id"))
        .join(&m.column("organization_id"), &o.column("id"))
        .where_eq(o.column("name"), "Acme")
        .order_by(p.column("name"))
        .limit(1);
    assert_eq!(
        q.to_count_sql(),
        "SELECT count(*) FROM memberships m \
         INNER JOIN persons p ON m.person_id = p.id \
         INNER JOIN organizations o ON m.organization_id = o.id \
         WHERE o.name = $1"
    );
}

#[test]
fn builder_is_reusable_via_clone() {
    let (p, _, _) = tables();
    let base = p.where_eq(p.column("active"), true);
    let first = base.clone().limit(1);
    let all = base.order_by(p.column("id"));
    assert!(first.to_sql().ends_with("LIMIT 1"));
    assert!(!all.to_sql().contains("LIMIT"));
}

#[test]
fn duplicate_alias_fails_validation() {
    let p = Table::new("persons").alias("x");
    let o = Table::new("organizations").alias("X");
    let q = p.join(&p.column("org_id"), &o.column("id"));
    assert!(matches!(q.validate(), Err(FluentError::Validation(_))));
}

#[test]
fn self_join_with_distinct_aliases_is_valid() {
    let employee = Table::new("persons").alias("employee");
    let manager = Table::new("persons").alias("manager");
    let q = employee.left_join(&employee.column("manager_id"), &manager.column("id"));
    assert!(q.validate().is_ok());
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM persons employee \
         LEFT JOIN persons manager ON employee.manager_id = manager.id"
    );
}

#[test]
fn malformed_identifiers_fail_validation() {
    let bad_table = Table::new("persons; DROP TABLE x").alias("p");
    assert!(bad_table.query().validate().is_err());

    let qualified_alias = Table::new("persons").alias("public.p");
    assert!(qualified_alias.query().validate().is_err());

    let p = Table::new("persons").alias("p");
    let o = Table::new("organizations").alias("o");
    let bad_column = p.join(&p.column("org id"), &o.column("id"));
    assert!(bad_column.validate().is_err());
}

#[test]
fn schema_qualified_table_is_valid() {
    let p = Table::new("public.persons").alias("p");
    assert!(p.query().validate().is_ok());
    assert_eq!(p.query().to_sql(), "SELECT * FROM public.persons p");
}

#[test]
fn first_build_error_wins() {
    let (p, _, _) = tables();
    let q = p
        .query()
        .where_all([p.column("a")], Vec::<Param>::new())
        .where_expr_with("p.id = ?", 1_i64)
        .where_expr_with_params("?", vec![]);
    match q.validate() {
        Err(FluentError::Validation(msg)) => assert!(msg.contains("where_all"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}
