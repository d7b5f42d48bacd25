// Common fixtures for relframe integration tests

use relframe::{RelationalTable, Table, Value, Workspace};

/// Workspace with the customers/orders sample:
///
/// - customers 1..=4, only customer 4 is older than 50
/// - customers 3 and 4 each have an order above 500, customer 4 also a small one
/// - customer 2 has no orders
pub struct ShopFixture {
    pub workspace: Workspace,
    pub customers: RelationalTable,
    pub orders: RelationalTable,
}

impl ShopFixture {
    pub fn new() -> Self {
        Self::with_workspace(Workspace::new())
    }

    pub fn with_workspace(workspace: Workspace) -> Self {
        let customers = workspace
            .add_table("customers", customers())
            .expect("Failed to add customers");
        let orders = workspace
            .add_table("orders", orders())
            .expect("Failed to add orders");
        customers
            .relate("orders", &orders, "user_id", "user_id")
            .expect("Failed to relate orders");

        Self {
            workspace,
            customers,
            orders,
        }
    }

    #[allow(dead_code)]
    pub fn add_products(&self) -> RelationalTable {
        let products = self
            .workspace
            .add_table("products", products())
            .expect("Failed to add products");
        self.orders
            .relate("product", &products, "product_id", "product_id")
            .expect("Failed to relate products");
        products
    }
}

impl Default for ShopFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn customers() -> Table {
    Table::new(
        &["user_id", "name", "age"],
        vec![
            vec![Value::from(1), "Alice".into(), 25.into()],
            vec![Value::from(2), "Bob".into(), 35.into()],
            vec![Value::from(3), "Carol".into(), 45.into()],
            vec![Value::from(4), "Dave".into(), 60.into()],
        ],
    )
    .expect("Failed to build customers")
}

pub fn orders() -> Table {
    Table::new(
        &["order_id", "user_id", "product_id", "amount"],
        vec![
            vec![Value::from(101), 1.into(), 10.into(), 200.into()],
            vec![Value::from(102), 1.into(), 11.into(), 150.into()],
            vec![Value::from(103), 3.into(), 12.into(), 700.into()],
            vec![Value::from(104), 4.into(), 10.into(), 900.into()],
            vec![Value::from(105), 4.into(), 11.into(), 50.into()],
        ],
    )
    .expect("Failed to build orders")
}

#[allow(dead_code)]
pub fn products() -> Table {
    Table::new(
        &["product_id", "title", "price", "in_stock"],
        vec![
            vec![Value::from(10), "Desk".into(), 199.5.into(), true.into()],
            vec![Value::from(11), "Lamp".into(), 25.0.into(), false.into()],
            vec![Value::from(12), "Chair".into(), 89.9.into(), true.into()],
        ],
    )
    .expect("Failed to build products")
}

/// Values of `column` in `table`, in row order
#[allow(dead_code)]
pub fn column(table: &Table, column: &str) -> Vec<Value> {
    table
        .column(column)
        .expect("Missing column")
        .to_vec()
}

/// `user_id`s of a filtered customers table
#[allow(dead_code)]
pub fn user_ids(table: &Table) -> Vec<i64> {
    column(table, "user_id")
        .into_iter()
        .map(|v| match v {
            Value::Integer(i) => i,
            other => panic!("Unexpected user_id {:?}", other),
        })
        .collect()
}
