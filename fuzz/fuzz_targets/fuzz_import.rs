#![no_main]
use std::{
    cell::RefCell,
    collections::BTreeMap,
    sync::{Arc, LazyLock},
};

use arbitrary::Arbitrary;
use jsonbind::{ImportError, ImportOptions, Kind, Schema, Sentinel, import_with};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 1; // option flags

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

#[derive(Debug, Default)]
#[allow(dead_code)]
struct Doc {
    name: String,
    count: u16,
    flag: bool,
    ratio: f64,
    tags: Vec<String>,
    rows: Vec<Vec<i32>>,
    items: Vec<Item>,
    attrs: BTreeMap<String, u8>,
    child: Item,
}

#[derive(Debug, Default)]
#[allow(dead_code)]
struct Item {
    id: u64,
    label: String,
}

static SCHEMA: LazyLock<Schema<Doc>> = LazyLock::new(|| {
    let item = Arc::new(
        Schema::<Item>::builder()
            .unsigned("id", |i| &mut i.id)
            .string("label", |i| &mut i.label)
            .build(),
    );
    Schema::<Doc>::builder()
        .string("name", |d| &mut d.name)
        .unsigned("count", |d| &mut d.count)
        .boolean("flag", |d| &mut d.flag)
        .float("ratio", |d| &mut d.ratio)
        .array("tags", Kind::string(), |d| &mut d.tags)
        .arrays("rows", Kind::signed(), |d| &mut d.rows)
        .objects("items", |d| &mut d.items, Arc::clone(&item))
        .map("attrs", Kind::unsigned(), |d| &mut d.attrs)
        .object("child", |d| &mut d.child, item)
        .build()
});

/// Keys the generated objects draw from: every bound field, some comments and
/// a stranger.
static KEYS: &[&str] = &[
    "name", "count", "flag", "ratio", "tags", "rows", "items", "attrs", "child", "id", "label",
    "_", "?note", "note?", "extra",
];

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8 & 0x0F);
        let limit = max_size - HEADER;
        HEADER + append_document(&mut data[HEADER..], size, limit)
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_document(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2 + 1).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ShapedValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = serde_json::to_vec(&value.0).expect("Failed to serialize arbitrary value");
    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// A JSON value whose object keys mostly come from the schema.
#[derive(Debug)]
struct ShapedValue(Value);

impl<'a> Arbitrary<'a> for ShapedValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(16)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => Value::from(u.arbitrary::<i64>()?),
            3 => Value::from(u.arbitrary::<u64>()?),
            4 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            5..=7 => Value::String(u.arbitrary()?),
            8..=10 => {
                let elems: Vec<ShapedValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let members: Vec<(u8, ShapedValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(members.into_iter().map(|(k, v)| {
                    (KEYS[usize::from(k) % KEYS.len()].to_string(), v.0)
                })))
            }
        };
        Ok(ShapedValue(value))
    }
}

fn options(flags: u8) -> ImportOptions {
    ImportOptions {
        sentinel: match flags & 3 {
            0 => Sentinel::default(),
            1 => Sentinel::disabled(),
            2 => Sentinel {
                marker: Some("//".to_string()),
                marker_char: None,
            },
            _ => Sentinel {
                marker: None,
                marker_char: Some('é'),
            },
        },
        minus_one_sentinel: flags & 4 != 0,
        bool_from_unsigned: flags & 8 != 0,
    }
}

fn import(data: &[u8]) {
    let Some((&flags, document)) = data.split_first() else {
        return;
    };
    let mut doc = Doc::default();
    match import_with(document, &mut doc, &SCHEMA, &options(flags)) {
        Ok(()) => {}
        Err(ImportError::Lexical(err)) => assert!(err.position().offset <= document.len()),
        Err(ImportError::Schema(err)) => assert!(!err.role().is_empty()),
    }
}

fuzz_target!(|data: &[u8]| import(data));
