//! Grid sampler behaviour against a recording elevation provider
//!
//! Verifies that:
//! 1. Rows are split into ceil(N/M) lookups using the cap-based decrement
//! 2. Lookups are issued strictly one after another, in row order
//! 3. Progress is non-decreasing and ends at 100
//! 4. A failing lookup aborts the run with the original error

use async_trait::async_trait;
use relief_map::elevation::ElevationResult;
use relief_map::{
    BoundingBox, ElevationError, ElevationProvider, ElevationSample, GeoCoord, GridSampler,
    SampleError, SamplerConfig,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records every call; answers `call_index * 1000 + sample_index`
#[derive(Default)]
struct RecordingProvider {
    calls: Mutex<Vec<([GeoCoord; 2], usize)>>,
    fail_on_call: Option<usize>,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
}

impl RecordingProvider {
    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<([GeoCoord; 2], usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ElevationProvider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn elevation_along_path(
        &self,
        path: [GeoCoord; 2],
        samples: usize,
    ) -> ElevationResult<Vec<ElevationSample>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((path, samples));
            calls.len() - 1
        };
        self.in_flight.store(false, Ordering::SeqCst);

        if self.fail_on_call == Some(index) {
            return Err(ElevationError::Rejected {
                status: "INJECTED".to_string(),
                message: format!("failure on call {index}"),
            });
        }

        Ok((0..samples)
            .map(|i| ElevationSample::new((index * 1000 + i) as f64))
            .collect())
    }
}

/// Returns one sample too few on every call
struct ShortProvider;

#[async_trait]
impl ElevationProvider for ShortProvider {
    fn name(&self) -> &str {
        "short"
    }

    async fn elevation_along_path(
        &self,
        _path: [GeoCoord; 2],
        samples: usize,
    ) -> ElevationResult<Vec<ElevationSample>> {
        Ok(vec![ElevationSample::new(0.0); samples.saturating_sub(1)])
    }
}

fn reference_box() -> BoundingBox {
    BoundingBox::from_bounds(GeoCoord::new(0.0, 0.0), GeoCoord::new(1.0, 0.1))
}

fn sampler(max_batch_samples: usize) -> GridSampler {
    GridSampler::new(
        SamplerConfig::default()
            .with_spacing_km(0.5)
            .with_max_batch_samples(max_batch_samples)
            .with_pacing(Duration::from_secs(1)),
    )
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_single_batch_per_row() {
    let provider = RecordingProvider::default();
    let matrix = sampler(500)
        .sample(&provider, &reference_box(), |_| {})
        .await
        .unwrap();

    let calls = provider.calls();
    assert_eq!(matrix.height(), 223);
    assert_eq!(calls.len(), 223);
    assert!(calls.iter().all(|(_, samples)| *samples == 22));

    // Every row spans the full top-row width, one spacing further south each time
    let (first_path, _) = calls[0];
    assert_eq!(first_path[0], GeoCoord::new(1.0, 0.0));
    assert_eq!(first_path[1], GeoCoord::new(1.0, 0.1));
    let (second_path, _) = calls[1];
    assert!(second_path[0].lat < 1.0);
    assert_eq!(second_path[0].lat, second_path[1].lat);
}

#[tokio::test(start_paused = true)]
async fn test_rows_split_into_capped_batches() {
    let provider = RecordingProvider::default();
    let matrix = sampler(5)
        .sample(&provider, &reference_box(), |_| {})
        .await
        .unwrap();

    // 22 samples with a cap of 5: 5 + 5 + 5 + 5 + 2
    let calls = provider.calls();
    assert_eq!(calls.len(), 223 * 5);
    let first_row: Vec<usize> = calls[..5].iter().map(|(_, n)| *n).collect();
    assert_eq!(first_row, vec![5, 5, 5, 5, 2]);

    assert_eq!(matrix.width(), 22);
    assert!(matrix.is_rectangular());
    assert!(!provider.overlapped.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_batch_paths_within_a_row() {
    let provider = RecordingProvider::default();
    sampler(10)
        .sample(&provider, &reference_box(), |_| {})
        .await
        .unwrap();

    let calls = provider.calls();
    let row: Vec<[GeoCoord; 2]> = calls[..3].iter().map(|(p, _)| *p).collect();
    let east = GeoCoord::new(1.0, 0.1);

    // Intermediate endpoints step west of the cursor; the last batch ends on the east edge
    assert_eq!(row[0][0], GeoCoord::new(1.0, 0.0));
    assert!(row[0][1].lng < row[0][0].lng);
    assert_eq!(row[1][0], row[0][1]);
    assert!(row[1][1].lng < row[1][0].lng);
    assert_eq!(row[2][0], row[1][1]);
    assert_eq!(row[2][1], east);
}

#[tokio::test(start_paused = true)]
async fn test_values_keep_lookup_order() {
    let provider = RecordingProvider::default();
    let matrix = sampler(10)
        .sample(&provider, &reference_box(), |_| {})
        .await
        .unwrap();

    let first_row = &matrix.rows()[0];
    assert_eq!(first_row[0], 0.0);
    assert_eq!(first_row[9], 9.0);
    assert_eq!(first_row[10], 1000.0);
    assert_eq!(first_row[21], 2001.0);
    assert_eq!(matrix.rows()[1][0], 3000.0);
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_and_complete() {
    let provider = RecordingProvider::default();
    let mut progress = Vec::new();
    let matrix = sampler(500)
        .sample(&provider, &reference_box(), |p| progress.push(p))
        .await
        .unwrap();

    assert_eq!(progress.len(), matrix.height());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|p| (0.0..=100.0).contains(p)));
    assert!((progress.last().unwrap() - 100.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_failure_aborts_run_with_original_error() {
    // Three batches per row: the second batch of the second row is call 4
    let provider = RecordingProvider::failing_on(4);
    let mut progress = Vec::new();
    let result = sampler(10)
        .sample(&provider, &reference_box(), |p| progress.push(p))
        .await;

    match result {
        Err(SampleError::Lookup(ElevationError::Rejected { status, message })) => {
            assert_eq!(status, "INJECTED");
            assert_eq!(message, "failure on call 4");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(provider.calls().len(), 5);
    assert_eq!(progress.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_short_batch_is_rejected() {
    let result = sampler(500)
        .sample(&ShortProvider, &reference_box(), |_| {})
        .await;

    assert!(matches!(
        result,
        Err(SampleError::BatchLength {
            expected: 22,
            actual: 21
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_swapped_corners_sample_like_ordered_box() {
    let ordered = reference_box();
    let swapped = BoundingBox {
        south_west: ordered.south_east,
        north_east: ordered.north_west,
        south_east: ordered.south_west,
        north_west: ordered.north_east,
    };

    let a = RecordingProvider::default();
    let b = RecordingProvider::default();
    let left = sampler(500).sample(&a, &ordered, |_| {}).await.unwrap();
    let right = sampler(500).sample(&b, &swapped, |_| {}).await.unwrap();

    assert_eq!(left, right);
    assert_eq!(a.calls(), b.calls());
}
