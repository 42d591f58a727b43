//! Scheduling properties checked with an in-process dispatcher.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_harness::client::Payload;
use catalog_harness::load::{
    Dispatcher, LoadHarness, LoadPlan, OutcomeBody, RequestJob, RequestOutcome, Schedule,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use rstest::rstest;

/// Tracks how many dispatches overlap and how many had finished when each
/// job started.
#[derive(Default)]
struct Probe {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
    started_after: Mutex<Vec<(usize, usize)>>,
    fail_every: Option<usize>,
}

struct ProbeDispatcher(Arc<Probe>);

#[async_trait]
impl Dispatcher for ProbeDispatcher {
    async fn dispatch(&self, job: &RequestJob) -> RequestOutcome {
        let probe = &self.0;
        let now = probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        probe.peak.fetch_max(now, Ordering::SeqCst);
        probe.started_after
            .lock()
            .push((job.seq, probe.finished.load(Ordering::SeqCst)));

        // Uneven latencies so the pool refills out of order.
        tokio::time::sleep(Duration::from_millis(2 + (job.seq % 4) as u64 * 3)).await;

        probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        probe.finished.fetch_add(1, Ordering::SeqCst);

        let status = match probe.fail_every {
            Some(n) if job.seq % n == 0 => 503,
            _ => 200,
        };
        RequestOutcome::response(job.seq, status, 0.002, OutcomeBody::Text(String::new()))
    }
}

fn plan(total: usize, width: usize, schedule: Schedule) -> LoadPlan {
    LoadPlan::new("http://catalog.invalid/products", Payload::Empty)
        .with_requests(total, width)
        .with_schedule(schedule)
}

#[rstest]
#[case(Schedule::Wave)]
#[case(Schedule::Pool)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_never_exceeds_width(#[case] schedule: Schedule) {
    let probe = Arc::new(Probe::default());
    let harness = LoadHarness::new(ProbeDispatcher(Arc::clone(&probe)));

    let run = harness.run(&plan(37, 6, schedule)).await.unwrap();

    assert_eq!(run.outcomes.len(), 37);
    let peak = probe.peak.load(Ordering::SeqCst);
    assert!(peak <= 6, "peak in-flight {peak} exceeded width");
    assert!(peak >= 2, "jobs never overlapped");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_waves_wait_for_previous_wave() {
    let probe = Arc::new(Probe::default());
    let harness = LoadHarness::new(ProbeDispatcher(Arc::clone(&probe)));

    harness.run(&plan(10, 4, Schedule::Wave)).await.unwrap();

    let started = probe.started_after.lock().clone();
    assert_eq!(started.len(), 10);
    for (seq, finished_before) in started {
        let previous_waves = (seq / 4) * 4;
        assert!(
            finished_before >= previous_waves,
            "job {seq} started with only {finished_before} jobs finished"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failures_counted_once() {
    let probe = Arc::new(Probe {
        fail_every: Some(5),
        ..Probe::default()
    });
    let harness = LoadHarness::new(ProbeDispatcher(Arc::clone(&probe)));

    let run = harness
        .run(&plan(20, 5, Schedule::Pool).with_min_success_ratio(0.8))
        .await
        .unwrap();

    assert_eq!(run.verdict.failure_count, 4);
    assert_eq!(run.verdict.success_count, 16);
    assert!(run.verdict.passed);
    assert_eq!(run.summary.status_counts.get("503"), Some(&4));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_every_job_has_one_outcome(
        total in 1usize..60,
        width_seed in 0usize..60,
        wave in any::<bool>(),
    ) {
        let width = 1 + width_seed % total;
        let schedule = if wave { Schedule::Wave } else { Schedule::Pool };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        let probe = Arc::new(Probe::default());
        let harness = LoadHarness::new(ProbeDispatcher(Arc::clone(&probe)));
        let run = runtime.block_on(harness.run(&plan(total, width, schedule))).unwrap();

        let mut seqs: Vec<_> = run.outcomes.iter().map(|o| o.seq).collect();
        seqs.sort_unstable();
        prop_assert_eq!(seqs, (0..total).collect::<Vec<_>>());
        prop_assert_eq!(run.verdict.success_count + run.verdict.failure_count, total);
        prop_assert!(probe.peak.load(Ordering::SeqCst) <= width);
    }
}
