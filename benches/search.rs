use criterion::*;
use tes::{
    blackbody::radiance, single_window_search, windowed_search, Metric, Spectrum, WindowSweep,
};

// Sample and downwelling radiance on a 0.02 um grid over 7-15 um.
fn synthetic() -> (Spectrum, Spectrum) {
    let w: Vec<f64> = (0..=400).map(|i| 7. + 0.02 * i as f64).collect();
    let down: Vec<f64> = w.iter().map(|x| 1.5 + 0.3 * (x - 7.).sin()).collect();
    let bb = radiance(297.4, &w);
    let sam = w
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let e = 0.95 + 0.01 * (2. * x).cos();
            bb[i] * e + (1. - e) * down[i]
        })
        .collect();
    (
        Spectrum::try_new("sam", w.clone(), sam).expect("sample"),
        Spectrum::try_new("dwr", w, down).expect("downwelling"),
    )
}

fn search(c: &mut Criterion) {
    let (sam, dwr) = synthetic();

    c.bench_function("single_window", |b| {
        b.iter(|| single_window_search(&sam, Some(&dwr), 280., 320., 8., 14.).unwrap())
    });

    c.bench_function("variable_moving_window", |b| {
        let sweep = WindowSweep {
            lower: 0.5,
            upper: 2.,
            steps: 4,
            count: 1,
        };
        b.iter(|| {
            windowed_search(&sam, Some(&dwr), 290., 305., 8., 14., sweep, Metric::Dispersion)
                .unwrap()
        })
    });

    c.bench_function("multiple_moving_window", |b| {
        let sweep = WindowSweep {
            lower: 0.5,
            upper: 1.,
            steps: 3,
            count: 3,
        };
        b.iter(|| {
            windowed_search(&sam, Some(&dwr), 290., 305., 8., 14., sweep, Metric::Smoothness)
                .unwrap()
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = search
}

criterion_main!(benches);
