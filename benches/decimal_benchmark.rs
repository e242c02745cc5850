use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use quelldb::decimal::Decimal;

fn random_decimals(count: usize) -> Vec<Decimal> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let integer: u64 = rng.gen_range(0..1_000_000_000_000);
            let fraction: u32 = rng.gen_range(0..1_000_000);
            let sign = if rng.gen_bool(0.5) { "-" } else { "" };
            Decimal::from_string(&format!("{}{}.{:06}", sign, integer, fraction)).unwrap()
        })
        .collect()
}

fn bench_arithmetic(c: &mut Criterion) {
    let values = random_decimals(1000);

    c.bench_function("decimal_add_1k", |b| {
        b.iter(|| {
            let mut total = values[0].clone();
            for value in &values[1..] {
                total = total.add(black_box(value)).unwrap();
            }
            black_box(total)
        });
    });

    c.bench_function("decimal_mul_pairs", |b| {
        b.iter(|| {
            let mut last = None;
            for pair in values.chunks(2) {
                if let [x, y] = pair {
                    last = Some(x.mul(black_box(y)).unwrap());
                }
            }
            black_box(last)
        });
    });

    c.bench_function("decimal_div_pairs", |b| {
        let divisor = Decimal::from_string("3.7").unwrap();
        b.iter(|| {
            let mut last = None;
            for value in &values {
                last = Some(value.div(black_box(&divisor)).unwrap());
            }
            black_box(last)
        });
    });
}

fn bench_compare(c: &mut Criterion) {
    let values = random_decimals(1000);
    c.bench_function("decimal_compare_all_pairs", |b| {
        b.iter(|| {
            let mut less = 0usize;
            for x in &values {
                for y in &values {
                    if x.compare(y) == std::cmp::Ordering::Less {
                        less += 1;
                    }
                }
            }
            black_box(less)
        });
    });
}

fn bench_dump(c: &mut Criterion) {
    let mut values = Vec::new();
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let mut value = Decimal::new(18, 6);
        value
            .cast_from_i64(rng.gen_range(-1_000_000_000_000i64..1_000_000_000_000), true)
            .unwrap();
        values.push(value);
    }

    c.bench_function("decimal_dump_1k", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for value in &values {
                bytes += value.dump_value().len();
            }
            black_box(bytes)
        });
    });

    let dumps: Vec<Vec<u8>> = values.iter().map(|v| v.dump_value()).collect();
    c.bench_function("decimal_set_dumped_1k", |b| {
        b.iter(|| {
            let mut loaded = Decimal::new(18, 6);
            for dump in &dumps {
                loaded.set_dumped_value(black_box(dump)).unwrap();
            }
            black_box(loaded)
        });
    });
}

fn bench_string_cast(c: &mut Criterion) {
    c.bench_function("decimal_from_string", |b| {
        b.iter(|| {
            let value = Decimal::from_string(black_box("123456789.00012345")).unwrap();
            black_box(value)
        });
    });
}

criterion_group!(benches, bench_arithmetic, bench_compare, bench_dump, bench_string_cast);
criterion_main!(benches);
