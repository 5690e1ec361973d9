//! Conversion performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map, Value};
use wirec::*;
use tempfile::TempDir;

fn screen(index: usize, controls: usize) -> Value {
    let control: Vec<Value> = (0..controls)
        .map(|i| {
            json!({
                "ID": i.to_string(),
                "typeID": if i % 3 == 0 { "Button" } else if i % 3 == 1 { "TextInput" } else { "HSlider" },
                "x": (i * 10).to_string(),
                "y": (i * 25).to_string(),
                "measuredW": "120",
                "measuredH": "24",
                "properties": {"text": format!("\\u0428\\u0430\\u0433 {}", i)}
            })
        })
        .collect();
    json!({"mockup": {
        "attributes": {"name": format!("Screen {}", index)},
        "controls": {"control": control},
        "mockupW": "1024",
        "mockupH": "768"
    }})
}

fn sample_document(screens: usize, controls: usize) -> CanonicalDocument {
    let resources = (0..screens)
        .map(|i| {
            let mut attributes = Map::new();
            attributes.insert("name".to_string(), json!(format!("Screen {}", i)));
            Resource {
                id: format!("r{}", i),
                branch_id: "Master".to_string(),
                attributes,
                data: screen(i, controls),
            }
        })
        .collect();
    CanonicalDocument {
        branches: vec![Branch {
            id: "Master".to_string(),
            attributes: Map::new(),
        }],
        resources,
        ..Default::default()
    }
}

fn bench_read_store(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let store_path = temp_dir.path().join("bench.bmpr");
    store_upsert(&sample_document(20, 40), &store_path).unwrap();

    c.bench_function("read_store", |b| {
        b.iter(|| read_store(black_box(&store_path)).unwrap())
    });
}

fn bench_build_forms(c: &mut Criterion) {
    let document = sample_document(50, 100);
    let options = ConverterOptions::default();

    c.bench_function("build_forms", |b| {
        b.iter(|| build_forms(black_box(&document), &options))
    });
}

fn bench_encoding_repair(c: &mut Criterion) {
    let repair = EncodingRepair::new();
    let escaped = "\\u0413\\u043b\\u0430\\u0432\\u043d\\u0430\\u044f \\u0441\\u0442\\u0440\\u0430\\u043d\\u0438\\u0446\\u0430";

    c.bench_function("encoding_repair", |b| {
        b.iter(|| repair.repair(black_box(escaped)))
    });
}

fn bench_write_markup(c: &mut Criterion) {
    let document = sample_document(1, 200);
    let forms = build_forms(&document, &ConverterOptions::default()).forms;

    c.bench_function("write_markup", |b| {
        b.iter(|| write_markup(black_box(&forms[0].tree)))
    });
}

criterion_group!(
    benches,
    bench_read_store,
    bench_build_forms,
    bench_encoding_repair,
    bench_write_markup
);
criterion_main!(benches);
