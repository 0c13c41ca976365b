use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::time::{Duration, Instant};
use uniserial::config::{translate, ConfigRequest, ReadStep};

pub fn bench_translate(c: &mut Criterion) {
    let standard = ConfigRequest::new("/dev/ttyUSB0").with_baud_rate(115_200);
    let custom = ConfigRequest::new("/dev/ttyUSB0")
        .with_baud_rate(250_000)
        .with_minimum_read_size(16)
        .with_inter_character_timeout_ms(300);

    c.bench_function("translate_standard", |b| {
        b.iter(|| translate(black_box(&standard)))
    });
    c.bench_function("translate_two_phase", |b| {
        b.iter(|| translate(black_box(&custom)))
    });
}

pub fn bench_read_schedule(c: &mut Criterion) {
    let descriptor = translate(
        &ConfigRequest::new("/dev/ttyUSB0")
            .with_minimum_read_size(64)
            .with_inter_character_timeout_ms(200),
    )
    .unwrap();

    c.bench_function("read_schedule_byte_by_byte", |b| {
        b.iter(|| {
            let start = Instant::now();
            let mut schedule = descriptor.read_schedule(black_box(256), start);
            let mut tick = 0u64;
            while let ReadStep::Wait(_) = schedule.next_step(start + Duration::from_micros(tick)) {
                tick += 1;
                schedule.record(1, start + Duration::from_micros(tick));
            }
            black_box(schedule.filled())
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_millis(300))
        .measurement_time(Duration::from_secs(2));
    targets = bench_translate, bench_read_schedule
}
criterion_main!(benches);
