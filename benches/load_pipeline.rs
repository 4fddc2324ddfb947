use std::fmt::Write as _;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use siniestros::{
    cache::{DatasetCache, Fingerprint},
    charts::{self, ChartKind},
    config::SourceOptions,
    filter::YearFilter,
    pipeline::Dataset,
};

fn generate_persons(rows: usize) -> Vec<u8> {
    const DEPARTMENTS: [&str; 5] = ["LIMA", "JUNÍN", "CUSCO", "PIURA", "ÁNCASH"];
    const SEVERITIES: [&str; 4] = ["FALLECIDO", "LESIONADO", "ILESO", "NO SE CONOCE"];
    let mut text = String::from("meta\nmeta\nmeta\n");
    text.push_str(
        "CÓDIGO SINIESTRO,AÑO,GRAVEDAD,SEXO,EDAD,VEHÍCULO,CLASE DE SINIESTRO,DEPARTAMENTO\n",
    );
    for i in 0..rows {
        let age = if i % 17 == 0 {
            "NO INDICA".to_string()
        } else {
            (i % 95).to_string()
        };
        let vehicle = if i % 41 == 0 { "" } else { "CAMIÓN" };
        writeln!(
            text,
            "S{},{},{},MASCULINO,{},{},CAÍDA DE PASAJERO,{}",
            i / 3,
            2019 + i % 5,
            SEVERITIES[i % 4],
            age,
            vehicle,
            DEPARTMENTS[i % 5]
        )
        .expect("row");
    }
    text.into_bytes()
}

fn bench_pipeline(c: &mut Criterion) {
    let bytes = generate_persons(20_000);
    let options = SourceOptions::legacy();

    let mut group = c.benchmark_group("load_pipeline");
    group.sample_size(20);
    group.bench_function("from_bytes", |b| {
        b.iter(|| {
            Dataset::from_bytes(&bytes, &options, Fingerprint::of(&bytes, &options))
                .expect("load")
        })
    });
    group.bench_function("cache_hit", |b| {
        b.iter_batched(
            || {
                let mut cache = DatasetCache::new();
                cache.get_or_load_bytes(&bytes, &options).expect("warm");
                cache
            },
            |mut cache| cache.get_or_load_bytes(&bytes, &options).expect("hit"),
            BatchSize::SmallInput,
        )
    });

    let dataset = Dataset::from_bytes(&bytes, &options, Fingerprint::of(&bytes, &options))
        .expect("load");
    let view = YearFilter::All.apply(dataset.fatalities());
    group.bench_function("age_sex_chart", |b| {
        b.iter(|| charts::build(ChartKind::AgeSex, &dataset, &view, 10))
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
