//! Integration tests for the monitor
//!
//! These tests use wiremock to stand in for Trace.axd endpoints and exercise
//! listing, detail fetching and the poll loop end-to-end.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use trace_watch::config::Config;
use trace_watch::extract::{FullEntry, TraceAxdExtractor};
use trace_watch::monitor::{
    build_http_client, fetch_body, CountedTicker, DetailFetcher, EntryLister, JobRange, Poller, TickOutcome,
    Watermark,
};
use trace_watch::output::{ArtifactStore, JsonArtifactStore, WATERMARK_FILE};
use trace_watch::TraceWatchError;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without a query string (index page requests)
struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// Matches detail page requests (`?id=N`)
struct DetailRequest;

impl Match for DetailRequest {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, _)| key == "id")
    }
}

fn index_page(ids: &[u64]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                "<tr><td>{}</td><td>16/10/2026 10:00:{:02}</td><td>/page.aspx</td><td>200</td><td>GET</td></tr>",
                id,
                id % 60
            )
        })
        .collect();
    format!(
        "<html><body><table><tr><th>No.</th><th>Time of Request</th><th>File</th></tr>{}</table></body></html>",
        rows
    )
}

fn detail_page(session: &str) -> String {
    format!(
        r#"<html><body>
        <table>
            <tr><th colspan="4"><h3><b>Request Details</b></h3></th></tr>
            <tr><th>Session Id:</th><td>{}</td><th>Request Type:</th><td>GET</td></tr>
            <tr><th>Time of Request:</th><td>16/10/2026 10:00:00</td><th>Status Code:</th><td>200</td></tr>
        </table>
        <table>
            <tr><th colspan="2"><h3><b>Headers Collection</b></h3></th></tr>
            <tr><th>Name</th><th>Value</th></tr>
            <tr><td>Host</td><td>a.test</td></tr>
        </table>
        </body></html>"#,
        session
    )
}

fn source_of(server: &MockServer) -> Url {
    Url::parse(&format!("{}/Trace.axd", server.uri())).expect("valid mock URL")
}

async fn mount_index(server: &MockServer, ids: &[u64]) {
    Mock::given(method("GET"))
        .and(path("/Trace.axd"))
        .and(NoQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(ids)))
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/Trace.axd"))
        .and(DetailRequest)
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("s")))
        .mount(server)
        .await;
}

/// Zero-based `id` query values the server received, in arrival order
async fn requested_detail_indexes(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "id")
                .map(|(_, value)| value.into_owned())
        })
        .collect()
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.http.timeout_secs = 5;
    config
}

fn lister() -> EntryLister {
    let client = build_http_client(&test_config().http).expect("client");
    EntryLister::new(client, Arc::new(TraceAxdExtractor))
}

fn fetcher(workers: usize) -> DetailFetcher {
    let client = build_http_client(&test_config().http).expect("client");
    DetailFetcher::new(client, Arc::new(TraceAxdExtractor), workers)
}

/// Client whose requests give up after one second
fn impatient_client() -> reqwest::Client {
    let mut config = test_config();
    config.http.timeout_secs = 1;
    build_http_client(&config.http).expect("client")
}

fn sorted_ids(entries: &[FullEntry]) -> Vec<u64> {
    let mut ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_lister_merges_sources_and_skips_failures() {
    let healthy = MockServer::start().await;
    mount_index(&healthy, &[5, 7, 3]).await;

    let other = MockServer::start().await;
    mount_index(&other, &[11, 12]).await;

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let unreachable = Url::parse("http://127.0.0.1:1/Trace.axd").unwrap();

    let listing = lister()
        .list(&[
            source_of(&healthy),
            source_of(&broken),
            unreachable,
            source_of(&other),
        ])
        .await;

    assert_eq!(listing.entries.len(), 5);
    assert_eq!(listing.sources_ok, 2);
    assert_eq!(listing.sources_failed, 2);

    let ids: BTreeSet<u64> = listing.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, BTreeSet::from([3, 5, 7, 11, 12]));
}

#[tokio::test]
async fn test_fetcher_requests_zero_based_index_and_tags_one_based_id() {
    let server = MockServer::start().await;
    mount_details(&server).await;

    let batch = fetcher(5)
        .fetch(&[source_of(&server)], JobRange::new(3, 7))
        .await;

    assert_eq!(batch.dispatched, 4);
    assert_eq!(batch.failed(), 0);
    assert_eq!(sorted_ids(&batch.entries), vec![4, 5, 6, 7]);
    assert!(batch
        .entries
        .iter()
        .all(|e| e.session_id.as_deref() == Some("s") && e.source.is_some()));

    let requested: BTreeSet<String> = requested_detail_indexes(&server).await.into_iter().collect();
    let expected: BTreeSet<String> = ["3", "4", "5", "6"].iter().map(|s| s.to_string()).collect();
    assert_eq!(requested, expected);
}

#[tokio::test]
async fn test_fetcher_failed_jobs_leave_gaps() {
    let server = MockServer::start().await;

    for index in 0..6u64 {
        let response = if index == 2 {
            ResponseTemplate::new(500)
        } else if index == 4 {
            ResponseTemplate::new(200).set_body_string("<html><body>Trace disabled</body></html>")
        } else {
            ResponseTemplate::new(200).set_body_string(detail_page("s"))
        };
        Mock::given(method("GET"))
            .and(path("/Trace.axd"))
            .and(query_param("id", index.to_string()))
            .respond_with(response)
            .mount(&server)
            .await;
    }

    let batch = fetcher(2)
        .fetch(&[source_of(&server)], JobRange::new(0, 6))
        .await;

    assert_eq!(batch.dispatched, 6);
    assert_eq!(batch.failed(), 2);
    assert_eq!(sorted_ids(&batch.entries), vec![1, 2, 4, 6]);
}

#[tokio::test]
async fn test_fetcher_dispatches_full_range_per_source() {
    let first = MockServer::start().await;
    mount_details(&first).await;
    let second = MockServer::start().await;
    mount_details(&second).await;

    let sources = [source_of(&first), source_of(&second)];
    let batch = fetcher(3).fetch(&sources, JobRange::new(10, 13)).await;

    assert_eq!(batch.dispatched, 2 * 3);
    assert_eq!(batch.entries.len(), 6);
    // Duplicate ids across sources are kept, one entry per source
    assert_eq!(sorted_ids(&batch.entries), vec![11, 11, 12, 12, 13, 13]);
    assert_eq!(requested_detail_indexes(&first).await.len(), 3);
    assert_eq!(requested_detail_indexes(&second).await.len(), 3);
}

#[tokio::test]
async fn test_tick_advances_and_writes_range_artifact() {
    let server = MockServer::start().await;
    mount_index(&server, &[5, 7, 3]).await;
    mount_details(&server).await;

    let dir = TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path(), "cache");
    let poller = Poller::from_config(&test_config(), vec![source_of(&server)], store).unwrap();

    let start = Watermark {
        id: 3,
        ..Watermark::default()
    };
    let (watermark, outcome) = poller.tick(start).await;

    assert_eq!(watermark.id, 7);
    match outcome {
        TickOutcome::Advanced {
            range,
            fetched,
            failed,
            artifact,
        } => {
            assert_eq!(range, JobRange::new(3, 7));
            assert_eq!(fetched, 4);
            assert_eq!(failed, 0);
            assert_eq!(artifact, dir.path().join("log_update_4_7.json"));
        }
        other => panic!("expected an advance, got {:?}", other),
    }

    let text = std::fs::read_to_string(dir.path().join("log_update_4_7.json")).unwrap();
    let entries: Vec<FullEntry> = serde_json::from_str(&text).unwrap();
    assert_eq!(sorted_ids(&entries), vec![4, 5, 6, 7]);

    let persisted = poller.store().load_watermark().unwrap().unwrap();
    assert_eq!(persisted.id, 7);
}

#[tokio::test]
async fn test_repeated_tick_with_same_maximum_does_nothing() {
    let server = MockServer::start().await;
    mount_index(&server, &[40, 42, 41]).await;
    Mock::given(method("GET"))
        .and(DetailRequest)
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("s")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path(), "cache");
    let poller = Poller::from_config(&test_config(), vec![source_of(&server)], store).unwrap();

    let mut watermark = Watermark {
        id: 42,
        ..Watermark::default()
    };
    for _ in 0..2 {
        let (next, outcome) = poller.tick(watermark).await;
        assert_eq!(outcome, TickOutcome::Unchanged { current: 42 });
        assert_eq!(next, watermark);
        watermark = next;
    }

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_tick_without_entries_keeps_watermark() {
    let server = MockServer::start().await;
    mount_index(&server, &[]).await;

    let dir = TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path(), "cache");
    let poller = Poller::from_config(&test_config(), vec![source_of(&server)], store).unwrap();

    let start = Watermark {
        id: 9,
        ..Watermark::default()
    };
    let (watermark, outcome) = poller.tick(start).await;
    assert_eq!(outcome, TickOutcome::NoEntries);
    assert_eq!(watermark, start);
}

#[tokio::test]
async fn test_bootstrap_without_entries_is_fatal() {
    let server = MockServer::start().await;
    mount_index(&server, &[]).await;

    let dir = TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path(), "cache");
    let poller = Poller::from_config(&test_config(), vec![source_of(&server)], store).unwrap();

    let result = poller.run(CountedTicker::new(3)).await;
    assert!(matches!(result, Err(TraceWatchError::NoEntriesFound)));
}

#[tokio::test]
async fn test_run_bootstraps_then_ticks() {
    let server = MockServer::start().await;
    // Bootstrap sees ids up to 2, every later listing up to 4
    Mock::given(method("GET"))
        .and(path("/Trace.axd"))
        .and(NoQuery)
        .respond_with(ResponseTemplate::new(200).set_body_string(index_page(&[1, 2])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_index(&server, &[1, 2, 3, 4]).await;
    mount_details(&server).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("log_update_1_1.json"), "[]").unwrap();

    let store = JsonArtifactStore::new(dir.path(), "cache");
    let poller = Poller::from_config(&test_config(), vec![source_of(&server)], store).unwrap();

    let watermark = poller.run(CountedTicker::new(2)).await.unwrap();
    assert_eq!(watermark.id, 4);

    // Old artifact rotated away, bootstrap batch and one range batch written
    assert!(!dir.path().join("log_update_1_1.json").exists());
    assert_eq!(
        std::fs::read_dir(dir.path().join("cache")).unwrap().count(),
        1
    );
    assert!(dir.path().join("log_update_3_4.json").exists());
    assert!(dir.path().join(WATERMARK_FILE).exists());

    let batches: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("log_update_"))
        .collect();
    assert_eq!(batches.len(), 2);

    let mut requested = requested_detail_indexes(&server).await;
    requested.sort();
    assert_eq!(requested, vec!["0", "1", "2", "3"]);
}

#[tokio::test]
async fn test_resume_starts_from_persisted_watermark() {
    let server = MockServer::start().await;
    mount_index(&server, &[5, 6, 7]).await;
    mount_details(&server).await;

    let dir = TempDir::new().unwrap();
    let store = JsonArtifactStore::new(dir.path(), "cache");
    store
        .write_watermark(&Watermark {
            id: 5,
            ..Watermark::default()
        })
        .unwrap();

    let poller = Poller::from_config(&test_config(), vec![source_of(&server)], store)
        .unwrap()
        .with_resume(true);

    let watermark = poller.bootstrap().await.unwrap();
    assert_eq!(watermark.id, 7);

    let mut requested = requested_detail_indexes(&server).await;
    requested.sort();
    assert_eq!(requested, vec!["5", "6"]);
}

#[tokio::test]
async fn test_fetcher_never_exceeds_worker_count() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(300);
    Mock::given(method("GET"))
        .and(path("/Trace.axd"))
        .and(DetailRequest)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("s"))
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    let started = Instant::now();
    let batch = fetcher(5)
        .fetch(&[source_of(&server)], JobRange::new(0, 10))
        .await;
    let elapsed = started.elapsed();

    assert_eq!(batch.dispatched, 10);
    assert_eq!(batch.failed(), 0);
    // Ten jobs over five workers need at least two rounds of the delay
    assert!(
        elapsed >= delay * 2,
        "10 jobs on 5 workers finished in {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_single_worker_runs_jobs_one_at_a_time() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(200);
    Mock::given(method("GET"))
        .and(DetailRequest)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("s"))
                .set_delay(delay),
        )
        .mount(&server)
        .await;

    let started = Instant::now();
    let batch = fetcher(1)
        .fetch(&[source_of(&server)], JobRange::new(0, 3))
        .await;

    assert_eq!(sorted_ids(&batch.entries), vec![1, 2, 3]);
    assert!(started.elapsed() >= delay * 3);
}

#[tokio::test]
async fn test_fetch_body_reports_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let url = source_of(&server);
    let err = fetch_body(&impatient_client(), url.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, TraceWatchError::Timeout { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_fetcher_timed_out_job_does_not_cancel_others() {
    let server = MockServer::start().await;
    // Zero-based index 1 is id 2
    Mock::given(method("GET"))
        .and(path("/Trace.axd"))
        .and(query_param("id", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail_page("slow"))
                .set_delay(Duration::from_secs(2)),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_details(&server).await;

    let fetcher = DetailFetcher::new(impatient_client(), Arc::new(TraceAxdExtractor), 5);
    let batch = fetcher
        .fetch(&[source_of(&server)], JobRange::new(0, 4))
        .await;

    assert_eq!(batch.dispatched, 4);
    assert_eq!(batch.failed(), 1);
    assert_eq!(sorted_ids(&batch.entries), vec![1, 3, 4]);
}

#[tokio::test]
async fn test_lister_skips_slow_source() {
    let fast = MockServer::start().await;
    mount_index(&fast, &[1, 2, 3]).await;

    let slow = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(index_page(&[50]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&slow)
        .await;

    let lister = EntryLister::new(impatient_client(), Arc::new(TraceAxdExtractor));
    let listing = lister.list(&[source_of(&slow), source_of(&fast)]).await;

    assert_eq!(listing.sources_ok, 1);
    assert_eq!(listing.sources_failed, 1);
    let ids: BTreeSet<u64> = listing.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, BTreeSet::from([1, 2, 3]));
}
