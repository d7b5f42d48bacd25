#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use relframe::{FilterConfig, Table, Value, Workspace};

#[derive(Arbitrary, Debug)]
enum Op {
    Relate {
        from: u8,
        to: u8,
        name: String,
        on_left: u8,
        on_right: u8,
    },
    Filter {
        home: u8,
        expr: String,
    },
}

const COLUMNS: [&str; 3] = ["k", "v", "w"];

fn table(seed: i64) -> Table {
    let rows: Vec<Vec<Value>> = (0..4)
        .map(|i| {
            vec![
                Value::from((i + seed) % 3),
                Value::from(i * seed),
                if i % 2 == 0 { Value::Null } else { Value::from("x") },
            ]
        })
        .collect();
    Table::new(&COLUMNS, rows).unwrap()
}

fuzz_target!(|ops: Vec<Op>| {
    let ws = Workspace::with_config(FilterConfig::default().with_max_frame_rows(10_000));
    let tables: Vec<_> = ["a", "b", "c"]
        .iter()
        .zip(1..)
        .map(|(name, seed)| ws.add_table(name, table(seed)).unwrap())
        .collect();

    for op in ops.iter().take(50) {
        match op {
            Op::Relate {
                from,
                to,
                name,
                on_left,
                on_right,
            } => {
                let from = &tables[*from as usize % tables.len()];
                let to = &tables[*to as usize % tables.len()];
                let _ = from.relate(
                    name,
                    to,
                    COLUMNS[*on_left as usize % COLUMNS.len()],
                    COLUMNS[*on_right as usize % COLUMNS.len()],
                );
            }
            Op::Filter { home, expr } => {
                if expr.len() <= 1024 {
                    let home = &tables[*home as usize % tables.len()];
                    if let Ok(result) = home.rfilter(expr) {
                        assert!(result.len() <= 4);
                    }
                }
            }
        }
    }
});
