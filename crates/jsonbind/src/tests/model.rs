//! A target type exercising every binding shape, shared by the import tests.

use alloc::{
    collections::BTreeMap,
    format,
    string::String,
    sync::Arc,
    vec::Vec,
};

use quickcheck::{Arbitrary, Gen};
use serde::{Deserialize, Serialize};

use crate::{Event, Kind, Mismatch, Schema};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Library {
    pub name: String,
    pub open: bool,
    pub founded: i32,
    pub shelves: u16,
    pub rating: f64,
    pub tags: Vec<String>,
    pub address: Address,
    pub books: Vec<Book>,
    pub grid: Vec<Vec<i64>>,
    pub counts: BTreeMap<String, u32>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Address {
    pub street: String,
    pub zip: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Book {
    pub title: String,
    pub pages: u32,
    pub isbn: u64,
}

pub(crate) fn library_schema() -> Schema<Library> {
    let address = Schema::<Address>::builder()
        .string("street", |a| &mut a.street)
        .unsigned("zip", |a| &mut a.zip)
        .build();
    let book = Schema::<Book>::builder()
        .string("title", |b| &mut b.title)
        .unsigned("pages", |b| &mut b.pages)
        .unsigned("isbn", |b| &mut b.isbn)
        .build();
    Schema::<Library>::builder()
        .string("name", |l| &mut l.name)
        .boolean("open", |l| &mut l.open)
        .signed("founded", |l| &mut l.founded)
        .unsigned("shelves", |l| &mut l.shelves)
        .float("rating", |l| &mut l.rating)
        .array("tags", Kind::string(), |l| &mut l.tags)
        .object("address", |l| &mut l.address, Arc::new(address))
        .objects("books", |l| &mut l.books, Arc::new(book))
        .arrays("grid", Kind::signed(), |l| &mut l.grid)
        .map("counts", Kind::unsigned(), |l| &mut l.counts)
        .build()
}

impl Arbitrary for Address {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            street: String::arbitrary(g),
            zip: u32::arbitrary(g),
        }
    }
}

impl Arbitrary for Book {
    fn arbitrary(g: &mut Gen) -> Self {
        Self {
            title: String::arbitrary(g),
            pages: u32::arbitrary(g),
            isbn: u64::arbitrary(g),
        }
    }
}

impl Arbitrary for Library {
    fn arbitrary(g: &mut Gen) -> Self {
        // Keys drawn from a small alphabet can never look like comments.
        let counts = Vec::<(u8, u32)>::arbitrary(g)
            .into_iter()
            .map(|(k, v)| (format!("k{k}"), v))
            .collect();
        Self {
            name: String::arbitrary(g),
            open: bool::arbitrary(g),
            founded: i32::arbitrary(g),
            shelves: u16::arbitrary(g),
            // Quarters survive a trip through decimal text exactly.
            rating: f64::from(i32::arbitrary(g)) / 4.0,
            tags: Vec::arbitrary(g),
            address: Address::arbitrary(g),
            books: Vec::arbitrary(g),
            grid: Vec::arbitrary(g),
            counts,
        }
    }
}

/// An arbitrary JSON value used as the payload of comment keys.
#[derive(Debug, Clone)]
pub(crate) struct Comment(pub serde_json::Value);

impl Arbitrary for Comment {
    fn arbitrary(g: &mut Gen) -> Self {
        Comment(comment_value(g, 3))
    }
}

fn comment_value(g: &mut Gen, depth: usize) -> serde_json::Value {
    use serde_json::Value;

    let choice = u8::arbitrary(g) % if depth == 0 { 5 } else { 7 };
    match choice {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => Value::from(i64::arbitrary(g)),
        3 => Value::from(f64::from(i16::arbitrary(g)) / 8.0),
        4 => Value::String(String::arbitrary(g)),
        5 => {
            let len = usize::arbitrary(g) % 4;
            Value::Array((0..len).map(|_| comment_value(g, depth - 1)).collect())
        }
        _ => {
            let len = usize::arbitrary(g) % 4;
            Value::Object(
                (0..len)
                    .map(|i| (format!("{}{i}", String::arbitrary(g)), comment_value(g, depth - 1)))
                    .collect(),
            )
        }
    }
}

/// A value stored through a custom capture, written as `"YYYY-MM-DD"`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

pub(crate) fn capture_date(date: &mut Date, event: &Event<'_>) -> Result<bool, Mismatch> {
    let Event::String(text) = *event else {
        return Ok(false);
    };
    let malformed = || Mismatch::UnexpectedEvent(format!("date {text:?}"));
    let text = core::str::from_utf8(text).map_err(|_| Mismatch::InvalidUtf8)?;
    let mut parts = text.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    *date = Date {
        year: year.parse().map_err(|_| malformed())?,
        month: month.parse().map_err(|_| malformed())?,
        day: day.parse().map_err(|_| malformed())?,
    };
    if !(1..=12).contains(&date.month) || !(1..=31).contains(&date.day) {
        return Err(malformed());
    }
    Ok(true)
}
