#![allow(missing_docs)]
#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use jsonbind::{Kind, Schema};

pub const ORDER: &str = r#"
{
    "_": "fixture shared by the integration tests",
    "id": 1042,
    "customer": {
        "name": "Ada",
        "?vip": true
    },
    "lines": [
        {
            "sku": "A-1",
            "qty": 2,
            "price": 9.5
        },
        {
            "sku": "B-7",
            "qty": 1,
            "price": 20,
            "gift?": {
                "wrap": "red",
                "card": ["happy", "birthday"]
            }
        }
    ],
    "discounts": [-1, 5],
    "notes?": ["checked", {"by": "Bob"}, null],
    "meta": {
        "channel": 3,
        "_": "ignored",
        "priority": 1
    }
}
"#;

#[derive(Debug, Default, PartialEq)]
pub struct Order {
    pub id: u32,
    pub customer: Customer,
    pub lines: Vec<Line>,
    pub discounts: Vec<u8>,
    pub meta: BTreeMap<String, u8>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Customer {
    pub name: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct Line {
    pub sku: String,
    pub qty: u16,
    pub price: f64,
}

pub fn order_schema() -> Schema<Order> {
    let customer = Schema::<Customer>::builder()
        .string("name", |c| &mut c.name)
        .build();
    let line = Schema::<Line>::builder()
        .string("sku", |l| &mut l.sku)
        .unsigned("qty", |l| &mut l.qty)
        .float("price", |l| &mut l.price)
        .build();
    Schema::<Order>::builder()
        .unsigned("id", |o| &mut o.id)
        .object("customer", |o| &mut o.customer, Arc::new(customer))
        .objects("lines", |o| &mut o.lines, Arc::new(line))
        .array("discounts", Kind::unsigned(), |o| &mut o.discounts)
        .map("meta", Kind::unsigned(), |o| &mut o.meta)
        .build()
}
