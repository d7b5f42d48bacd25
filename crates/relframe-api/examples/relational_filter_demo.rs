/// Example demonstrating relational filters across customers, orders and products
use relframe::logging::LogConfig;
use relframe::{Table, TableProvider, Value, Workspace};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=relframe_core=trace shows every join step
    let _guard = LogConfig::info().init()?;

    println!("relframe Relational Filter Demo");
    println!("===============================\n");

    let ws = Workspace::new();

    let customers = ws.add_table(
        "customers",
        Table::new(
            &["user_id", "name", "age"],
            vec![
                vec![Value::from(1), "Alice".into(), 25.into()],
                vec![Value::from(2), "Bob".into(), 35.into()],
                vec![Value::from(3), "Carol".into(), 45.into()],
                vec![Value::from(4), "Dave".into(), 60.into()],
            ],
        )?,
    )?;
    let orders = ws.add_table(
        "orders",
        Table::new(
            &["order_id", "user_id", "product_id", "amount"],
            vec![
                vec![Value::from(101), 1.into(), 10.into(), 200.into()],
                vec![Value::from(102), 1.into(), 11.into(), 150.into()],
                vec![Value::from(103), 3.into(), 12.into(), 700.into()],
                vec![Value::from(104), 4.into(), 10.into(), 900.into()],
                vec![Value::from(105), 4.into(), 11.into(), 50.into()],
            ],
        )?,
    )?;
    let products = ws.add_table(
        "products",
        Table::new(
            &["product_id", "title", "price"],
            vec![
                vec![Value::from(10), "Desk".into(), 199.5.into()],
                vec![Value::from(11), "Lamp".into(), 25.0.into()],
                vec![Value::from(12), "Chair".into(), 89.9.into()],
            ],
        )?,
    )?;

    customers.relate("orders", &orders, "user_id", "user_id")?;
    orders.relate("product", &products, "product_id", "product_id")?;

    let queries = [
        // 1. Only the home table
        "age > 30",
        // 2. A related column, qualified
        "orders.amount > 500",
        // 3. Unqualified columns from two tables
        "amount > 500 & age > 50",
        // 4. Two hops away
        "orders.product.title == 'Lamp'",
        // 5. Customers without any order
        "~(orders.amount != None)",
    ];

    for (i, expr) in queries.iter().enumerate() {
        println!("{}. customers.rfilter(\"{}\")", i + 1, expr);
        println!("   Plan: {}\n", customers.explain(expr)?);
        print_table(&customers.rfilter(expr)?);
        println!();
    }

    // Errors carry enough context to fix the expression
    println!("Errors:");
    for expr in ["amount >", "invoices.total > 1", "height > 1"] {
        match customers.rfilter(expr) {
            Ok(_) => println!("   {} -> unexpectedly succeeded", expr),
            Err(e) => println!("   {} -> {}", expr, e),
        }
    }

    Ok(())
}

fn print_table(table: &Table) {
    if table.is_empty() {
        println!("   (no rows)");
        return;
    }

    println!("   {}", table.columns().join(" | "));
    for i in 0..table.row_count() {
        if let Some(row) = table.row(i) {
            let values: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            println!("   {}", values.join(" | "));
        }
    }
}
