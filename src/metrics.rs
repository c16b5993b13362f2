use std::sync::LazyLock;

use prometheus::*;

static METRIC_SEARCH_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("face_search_count", "count of the face to search", &["population"])
        .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "face_search_duration",
        "duration of the per-face search in seconds",
        &["population"]
    )
    .unwrap()
});

static METRIC_SEARCH_MATCHES: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "face_search_matches",
        "number of matches returned by the per-face search",
        &["population"],
        vec![0., 1., 2., 5., 10., 20., 50.]
    )
    .unwrap()
});

static METRIC_REGISTERED_FACES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("face_registered_count", "count of the registered face", &["population"])
        .unwrap()
});

pub fn inc_search(population: &str, duration: f32, matches: usize) {
    METRIC_SEARCH_COUNT.with_label_values(&[population]).inc();
    METRIC_SEARCH_DURATION.with_label_values(&[population]).observe(duration as f64);
    METRIC_SEARCH_MATCHES.with_label_values(&[population]).observe(matches as f64);
}

pub fn inc_registered(population: &str, count: usize) {
    METRIC_REGISTERED_FACES.with_label_values(&[population]).inc_by(count as u64);
}
