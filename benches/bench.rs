//! Criterion benchmarks for Bazaar.
//!
//! Covers the catalog pipeline (filter, facets, sort, page) and feed
//! merging with cursor pagination.

use std::hint::black_box;

use bazaar::catalog::{CatalogItem, CatalogSnapshot, NamedParameter, NoDisplayData, SizeStock, VariantFacet};
use bazaar::config::EngineConfig;
use bazaar::feed::{Answer, FeedEngine, FeedQuery, Review, ReviewComment};
use bazaar::query::{FilterSpec, TextMatcher};
use bazaar::search::{CatalogQuery, CatalogQueryEngine, Cursor};
use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const WORDS: [&str; 16] = [
    "rain", "jacket", "wool", "scarf", "leather", "boots", "cotton", "shirt", "denim", "jeans",
    "linen", "dress", "silk", "tie", "canvas", "sneakers",
];
const COLORS: [&str; 5] = ["Red", "Blue", "Black", "Green", "White"];
const SIZES: [&str; 6] = ["XS", "small", "M", "large", "XL", "42"];

/// Generate a catalog with deterministic, varied rows.
fn generate_snapshot(count: usize) -> CatalogSnapshot {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut items = Vec::with_capacity(count);
    let mut parameters = Vec::new();
    let mut variants = Vec::new();
    let mut sizes = Vec::new();

    for i in 0..count {
        let id = i as u64 + 1;
        let title = format!(
            "{} {} {}",
            WORDS[(i * 7) % WORDS.len()],
            WORDS[(i * 13 + 1) % WORDS.len()],
            id
        );
        let group = id / 3 + 1;
        items.push(
            CatalogItem::new(id, title, 5.0 + (i % 300) as f64, base + Duration::minutes(i as i64))
                .with_category((i % 8) as u64, format!("Category {}", i % 8))
                .with_vendor((i % 20) as u64, format!("Vendor {}", i % 20))
                .with_group(group)
                .with_stock((i % 4) as u32)
                .with_stars(1.0 + (i % 40) as f64 / 10.0, (i % 50) as u32),
        );
        parameters.push(NamedParameter::new(id, "Material", WORDS[i % 5 + 6]));
        parameters.push(NamedParameter::new(id, "Fit", if i % 2 == 0 { "Slim" } else { "Regular" }));
        sizes.push(SizeStock::new(id, SIZES[i % SIZES.len()], (i % 3) as u32));
        if i % 3 == 0 {
            variants.push(VariantFacet::new(group, "Color", COLORS[i % COLORS.len()]));
        }
    }

    CatalogSnapshot::new(items, parameters, variants, sizes)
}

/// Generate review, answer and comment tables.
fn generate_activity(count: usize) -> (Vec<Review>, Vec<Answer>, Vec<ReviewComment>) {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut reviews = Vec::new();
    let mut answers = Vec::new();
    let mut comments = Vec::new();
    for i in 0..count {
        let id = i as u64 + 1;
        let created_at = base + Duration::minutes(((i * 37) % count) as i64);
        match i % 3 {
            0 => reviews.push(Review {
                review_id: Some(id),
                item_id: id % 100,
                author_id: id % 17,
                stars: (i % 5 + 1) as u8,
                body: String::new(),
                created_at,
            }),
            1 => answers.push(Answer {
                answer_id: Some(id),
                question_id: id % 50,
                author_id: id % 17,
                body: String::new(),
                created_at,
            }),
            _ => comments.push(ReviewComment {
                comment_id: Some(id),
                review_id: id % 100,
                author_id: id % 17,
                body: String::new(),
                created_at,
            }),
        }
    }
    (reviews, answers, comments)
}

fn bench_text_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_matcher");
    let snapshot = generate_snapshot(1000);
    let matcher = TextMatcher::new(&EngineConfig::default().matcher);

    group.throughput(Throughput::Elements(snapshot.len() as u64));
    group.bench_function("match_indices", |b| {
        b.iter(|| black_box(matcher.match_indices(snapshot.items(), black_box("lether boots"))))
    });
    group.bench_function("match_spans", |b| {
        b.iter(|| black_box(matcher.match_spans(snapshot.items(), black_box("jacket"))))
    });

    group.finish();
}

fn bench_catalog_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_search");
    group.sample_size(20);
    let engine = CatalogQueryEngine::new(EngineConfig::default()).unwrap();

    for count in [1_000, 5_000] {
        let snapshot = generate_snapshot(count);
        let query = CatalogQuery::new(
            FilterSpec::new()
                .query("jacket")
                .color("Red")
                .parameter("Fit", "Slim")
                .price_range(None, Some(150.0)),
        )
        .sort("price_asc");

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("filtered", count), &snapshot, |b, snapshot| {
            b.iter(|| black_box(engine.search(snapshot, &query, &NoDisplayData).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("unfiltered", count), &snapshot, |b, snapshot| {
            b.iter(|| {
                black_box(
                    engine
                        .search(snapshot, &CatalogQuery::default(), &NoDisplayData)
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

fn bench_feed(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed");
    let engine = FeedEngine::new(&EngineConfig::default()).unwrap();
    let (reviews, answers, comments) = generate_activity(3000);
    let merged = FeedEngine::merge(reviews, answers, comments);

    group.throughput(Throughput::Elements(merged.len() as u64));
    group.bench_function("first_page", |b| {
        b.iter(|| black_box(engine.paginate(&merged, &FeedQuery::new()).unwrap()))
    });

    let cursor = Cursor::new(1501, "Review");
    group.bench_function("page_after_cursor", |b| {
        b.iter(|| {
            black_box(
                engine
                    .paginate(&merged, &FeedQuery::new().after(cursor.clone()))
                    .unwrap(),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_text_matcher, bench_catalog_search, bench_feed);

criterion_main!(benches);
