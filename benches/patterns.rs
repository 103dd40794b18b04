//! Benchmarks for matching, encoding and batch tagging.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use candlesage::prelude::*;

/// Deterministic daily series for one symbol
fn generate_raws(symbol: &str, n: usize) -> Vec<RawBar> {
  let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
  let mut raws = Vec::with_capacity(n);
  let mut price = 100.0;

  for i in 0..n {
    let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

    let o: f64 = price;
    let c = price + change;
    let h = o.max(c) + volatility * 0.5;
    let l = o.min(c) - volatility * 0.5;
    let date = start + chrono::Days::new(i as u64);

    raws.push(RawBar::new(
      symbol,
      &date.format("%Y-%m-%d").to_string(),
      &o.to_string(),
      &h.to_string(),
      &l.to_string(),
      &c.to_string(),
      "10000",
    ));
    price = c;
  }

  raws
}

fn generate_bars(n: usize) -> Vec<Bar> {
  generate_raws("BENCH", n).iter().map(|r| normalize(r).unwrap()).collect()
}

fn bench_normalize(c: &mut Criterion) {
  let raws = generate_raws("BENCH", 1000);

  c.bench_function("normalize_1000_records", |b| {
    b.iter(|| {
      for raw in &raws {
        let _ = black_box(normalize(black_box(raw)));
      }
    })
  });
}

fn bench_match_bar(c: &mut Criterion) {
  let bars = generate_bars(100);
  let matcher = Matcher::global();

  c.bench_function("match_bar_all_rules", |b| {
    b.iter(|| {
      let _ = black_box(matcher.match_value(black_box(&bars[50]), black_box(&bars[47..50])));
    })
  });
}

fn bench_single_rule(c: &mut Criterion) {
  let bars = generate_bars(1000);
  let matcher = MatcherBuilder::new().only_tags([PatternTag::Doji]).build().unwrap();

  c.bench_function("tag_series_doji_1000_bars", |b| {
    b.iter(|| {
      let _ = black_box(tag_series(&matcher, black_box(&bars)));
    })
  });
}

fn bench_encode_decode(c: &mut Criterion) {
  let set: PatternSet = PatternTag::ALL.iter().copied().step_by(3).collect();
  let value = u64::from(encode(&set));

  c.bench_function("encode", |b| b.iter(|| black_box(encode(black_box(&set)))));
  c.bench_function("decode", |b| b.iter(|| black_box(decode(black_box(value)))));
}

fn bench_scaling(c: &mut Criterion) {
  let matcher = Matcher::global();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 500, 1000, 5000].iter() {
    let bars = generate_bars(*size);

    group.bench_with_input(BenchmarkId::new("tag_series", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(tag_series(matcher, black_box(&bars)));
      })
    });
  }

  group.finish();
}

fn bench_tag_records(c: &mut Criterion) {
  let raws: Vec<RawBar> = ["SYM1", "SYM2", "SYM3", "SYM4"]
    .iter()
    .flat_map(|s| generate_raws(s, 1000))
    .collect();

  c.bench_function("tag_records_4_symbols", |b| {
    b.iter(|| {
      let _ = black_box(tag_records(Matcher::global(), black_box(&raws)));
    })
  });
}

criterion_group!(
  benches,
  bench_normalize,
  bench_match_bar,
  bench_single_rule,
  bench_encode_decode,
  bench_scaling,
  bench_tag_records,
);

criterion_main!(benches);
