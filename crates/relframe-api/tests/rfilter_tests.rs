mod common;

use common::{column, user_ids, ShopFixture};
use relframe::{
    Error, FilterConfig, RowId, Table, TableProvider, UnqualifiedPolicy, Value, Workspace,
};

#[test]
fn test_related_column_existential() {
    let shop = ShopFixture::new();
    let result = shop.customers.rfilter("orders.amount > 500").unwrap();

    assert_eq!(user_ids(&result), vec![3, 4]);
    // Original columns, no relation columns leak in
    assert_eq!(result.columns(), shop.customers.data().unwrap().columns());
    assert_eq!(result.row_ids(), &[RowId(2), RowId(3)]);
}

#[test]
fn test_project_filtered_result() {
    let shop = ShopFixture::new();
    let result = shop
        .customers
        .rfilter("orders.amount > 500")
        .unwrap()
        .project(&["age", "user_id"])
        .unwrap();

    assert_eq!(result.columns(), &["age".to_string(), "user_id".to_string()]);
    assert_eq!(column(&result, "age"), vec![Value::from(45), Value::from(60)]);
    assert_eq!(result.row_ids(), &[RowId(2), RowId(3)]);
}

#[test]
fn test_long_flat_chain() {
    let shop = ShopFixture::new();
    let expr = vec!["age > 30"; 40_000].join(" & ");
    assert_eq!(user_ids(&shop.customers.rfilter(&expr).unwrap()), vec![2, 3, 4]);

    let expr = vec!["orders.amount == 700"; 40_000].join(" | ");
    assert_eq!(user_ids(&shop.customers.rfilter(&expr).unwrap()), vec![3]);
}

#[test]
fn test_cross_table_and() {
    let shop = ShopFixture::new();
    let result = shop.customers.rfilter("amount > 500 & age > 50").unwrap();
    assert_eq!(user_ids(&result), vec![4]);
    assert_eq!(column(&result, "age"), vec![Value::from(60)]);
}

#[test]
fn test_home_only_equals_plain_filter() {
    let shop = ShopFixture::new();
    let result = shop.customers.rfilter("age > 30 & name != 'Carol'").unwrap();
    assert_eq!(user_ids(&result), vec![2, 4]);
    assert!(shop.customers.explain("age > 30").unwrap().is_empty());
}

#[test]
fn test_unqualified_equals_self_qualified() {
    let shop = ShopFixture::new();
    let bare = shop.customers.rfilter("age > 50").unwrap();
    let qualified = shop.customers.rfilter("self.age > 50").unwrap();
    let by_name = shop.customers.rfilter("customers.age > 50").unwrap();
    assert_eq!(bare, qualified);
    assert_eq!(bare, by_name);
}

#[test]
fn test_home_wins_for_shared_column() {
    let shop = ShopFixture::new();
    // user_id lives on both tables
    let result = shop.customers.rfilter("user_id == 2").unwrap();
    assert_eq!(user_ids(&result), vec![2]);
    assert!(shop.customers.explain("user_id == 2").unwrap().is_empty());

    // Qualifying reaches the related table instead; customer 2 has no orders
    let result = shop.customers.rfilter("orders.user_id == 2").unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_strict_policy() {
    let ws = Workspace::with_config(
        FilterConfig::default().with_unqualified(UnqualifiedPolicy::Strict),
    );
    let shop = ShopFixture::with_workspace(ws);

    match shop.customers.rfilter("user_id == 2").unwrap_err() {
        Error::AmbiguousColumn { column, candidates } => {
            assert_eq!(column, "user_id");
            assert_eq!(candidates, vec!["customers", "orders"]);
        }
        other => panic!("Expected AmbiguousColumn, got {:?}", other),
    }
    assert!(shop.customers.rfilter("self.user_id == 2").is_ok());
    // Names only on home are unaffected
    assert!(shop.customers.rfilter("age > 1").is_ok());
}

#[test]
fn test_ambiguous_between_related_tables() {
    let shop = ShopFixture::new();
    let refunds = shop
        .workspace
        .add_table(
            "refunds",
            Table::new(
                &["user_id", "amount"],
                vec![vec![Value::from(1), 900.into()]],
            )
            .unwrap(),
        )
        .unwrap();
    shop.customers
        .relate("refunds", &refunds, "user_id", "user_id")
        .unwrap();

    let err = shop.customers.rfilter("amount > 500").unwrap_err();
    assert_eq!(
        err,
        Error::AmbiguousColumn {
            column: "amount".to_string(),
            candidates: vec!["orders".to_string(), "refunds".to_string()],
        }
    );
    assert!(err.to_string().contains("orders, refunds"));

    let result = shop.customers.rfilter("refunds.amount > 500").unwrap();
    assert_eq!(user_ids(&result), vec![1]);
}

#[test]
fn test_idempotent_refilter() {
    let shop = ShopFixture::new();
    let once = shop.customers.rfilter("orders.amount > 100").unwrap();

    let ws = Workspace::new();
    let again = ws.add_table("customers", once.clone()).unwrap();
    let twice = again.rfilter("user_id >= 0").unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_result_rows_subset_of_home() {
    let shop = ShopFixture::new();
    let home = shop.customers.data().unwrap();
    for expr in [
        "amount > 0",
        "amount < 100 | age < 30",
        "~(orders.amount > 500)",
        "orders.amount == None",
    ] {
        let result = shop.customers.rfilter(expr).unwrap();
        assert!(result.len() <= home.len(), "{}", expr);
        for id in result.row_ids() {
            assert!(home.row_ids().contains(id), "{}", expr);
        }
        // Each home row appears at most once
        let mut ids = result.row_ids().to_vec();
        ids.dedup();
        assert_eq!(ids.len(), result.len(), "{}", expr);
    }
}

#[test]
fn test_left_join_nulls() {
    let shop = ShopFixture::new();
    // Customer 2 has no orders, so the joined amount is null
    let result = shop.customers.rfilter("orders.amount == None").unwrap();
    assert_eq!(user_ids(&result), vec![2]);

    let result = shop.customers.rfilter("orders.amount != None").unwrap();
    assert_eq!(user_ids(&result), vec![1, 3, 4]);

    // A null satisfies no ordering comparison
    let result = shop.customers.rfilter("orders.amount < 1000000").unwrap();
    assert_eq!(user_ids(&result), vec![1, 3, 4]);
}

#[test]
fn test_negation_is_per_joined_row() {
    let shop = ShopFixture::new();
    // Customer 4 has one small and one large order, so it matches both ways
    let result = shop.customers.rfilter("~(amount > 500)").unwrap();
    assert_eq!(user_ids(&result), vec![1, 2, 4]);
}

#[test]
fn test_or_and_precedence() {
    let shop = ShopFixture::new();
    let result = shop
        .customers
        .rfilter("age < 30 | age > 50 & amount > 500")
        .unwrap();
    assert_eq!(user_ids(&result), vec![1, 4]);

    let result = shop
        .customers
        .rfilter("(age < 30 | age > 50) & amount > 500")
        .unwrap();
    assert_eq!(user_ids(&result), vec![4]);
}

#[test]
fn test_literal_on_left() {
    let shop = ShopFixture::new();
    let a = shop.customers.rfilter("500 < amount").unwrap();
    let b = shop.customers.rfilter("amount > 500").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_string_and_float_literals() {
    let shop = ShopFixture::new();
    let result = shop.customers.rfilter("name == \"Bob\" | name == 'Dave'").unwrap();
    assert_eq!(user_ids(&result), vec![2, 4]);

    let result = shop.customers.rfilter("amount >= 699.5").unwrap();
    assert_eq!(user_ids(&result), vec![3, 4]);
}

#[test]
fn test_multi_hop() {
    let shop = ShopFixture::new();
    shop.add_products();

    // Unqualified, reached through orders
    let result = shop.customers.rfilter("price > 100").unwrap();
    assert_eq!(user_ids(&result), vec![1, 4]);

    // Explicit chain
    let result = shop.customers.rfilter("orders.product.title == 'Chair'").unwrap();
    assert_eq!(user_ids(&result), vec![3]);

    // Single segment naming a deeper relation
    let result = shop.customers.rfilter("product.in_stock == false").unwrap();
    assert_eq!(user_ids(&result), vec![1, 4]);

    let plan = shop.customers.explain("price > 100").unwrap();
    let relations: Vec<_> = plan.steps.iter().map(|s| s.relation.as_str()).collect();
    assert_eq!(relations, vec!["orders", "product"]);
}

#[test]
fn test_multi_hop_combines_with_home() {
    let shop = ShopFixture::new();
    shop.add_products();
    // Same order must be expensive and for an in-stock product
    let result = shop
        .customers
        .rfilter("amount > 500 & in_stock == true & age < 50")
        .unwrap();
    assert_eq!(user_ids(&result), vec![3]);
}

#[test]
fn test_cycle_in_relations() {
    let shop = ShopFixture::new();
    shop.orders
        .relate("customer", &shop.customers, "user_id", "user_id")
        .unwrap();

    let result = shop.customers.rfilter("amount > 500").unwrap();
    assert_eq!(user_ids(&result), vec![3, 4]);

    // From orders, customer columns are reachable
    let result = shop.orders.rfilter("age > 50").unwrap();
    assert_eq!(column(&result, "order_id"), vec![Value::from(104), Value::from(105)]);
}

#[test]
fn test_many_to_many() {
    let ws = Workspace::new();
    let tags = ws
        .add_table(
            "tags",
            Table::new(
                &["group", "tag"],
                vec![
                    vec![Value::from(1), "a".into()],
                    vec![Value::from(1), "b".into()],
                    vec![Value::from(2), "c".into()],
                ],
            )
            .unwrap(),
        )
        .unwrap();
    let posts = ws
        .add_table(
            "posts",
            Table::new(
                &["group", "title"],
                vec![
                    vec![Value::from(1), "x".into()],
                    vec![Value::from(1), "y".into()],
                    vec![Value::from(2), "z".into()],
                ],
            )
            .unwrap(),
        )
        .unwrap();
    posts.relate("tags", &tags, "group", "group").unwrap();

    let result = posts.rfilter("tag == 'b' | tag == 'c'").unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.row_ids(), posts.data().unwrap().row_ids());

    let result = posts.rfilter("tag == 'a' & tag == 'b'").unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_errors() {
    let shop = ShopFixture::new();

    assert!(matches!(
        shop.customers.rfilter("age >"),
        Err(Error::SyntaxError { position: 5, .. })
    ));
    assert!(matches!(
        shop.customers.rfilter("(age > 1"),
        Err(Error::SyntaxError { .. })
    ));
    assert_eq!(
        shop.customers.rfilter("height > 1").unwrap_err(),
        Error::UnknownColumn {
            column: "height".to_string(),
            table: "customers, orders".to_string(),
        }
    );
    assert_eq!(
        shop.customers.rfilter("invoices.total > 1").unwrap_err(),
        Error::UnknownRelation {
            relation: "invoices".to_string(),
            table: "customers".to_string(),
        }
    );
    assert_eq!(
        shop.customers.rfilter("orders.age > 1").unwrap_err(),
        Error::UnknownColumn {
            column: "age".to_string(),
            table: "orders".to_string(),
        }
    );
    // Relations are directed
    assert!(matches!(
        shop.orders.rfilter("age > 1"),
        Err(Error::UnknownColumn { .. })
    ));
}

#[test]
fn test_frame_limit() {
    let ws = Workspace::with_config(FilterConfig::default().with_max_frame_rows(5));
    let shop = ShopFixture::with_workspace(ws);

    // 2 + 1 + 1 + 2 rows, customer 2 keeps a null slot
    assert!(matches!(
        shop.customers.rfilter("amount > 0"),
        Err(Error::FrameTooLarge { rows: 6, limit: 5 })
    ));
    assert!(shop.customers.rfilter("age > 0").is_ok());
}

#[test]
fn test_concurrent_rfilter() {
    let shop = ShopFixture::new();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let customers = shop.customers.clone();
            std::thread::spawn(move || {
                let expr = if i % 2 == 0 {
                    "orders.amount > 500"
                } else {
                    "amount > 500 & age > 50"
                };
                user_ids(&customers.rfilter(expr).unwrap())
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let ids = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(ids, vec![3, 4]);
        } else {
            assert_eq!(ids, vec![4]);
        }
    }
}

#[test]
fn test_source_tables_unchanged() {
    let shop = ShopFixture::new();
    let before = shop.customers.data().unwrap();
    shop.customers.rfilter("amount > 500").unwrap();
    assert_eq!(shop.customers.data().unwrap(), before);
    assert_eq!(before.row_count(), 4);
}
