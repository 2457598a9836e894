//! End-to-end pipeline runs: dataset in, PDFs and failure log out, with
//! the search and download endpoints served by a mock server.

use std::path::Path;
use std::time::Duration;

use citefetch_core::{PipelineConfig, ThrottlePolicy, prepare};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn result_page(pdf_path: &str) -> String {
    format!(
        r#"<html><body><ol class="breathe-horizontal">
             <li class="arxiv-result"><p class="list-title">
               <a href="/abs/x">abs</a> <span>[<a href="{pdf_path}">pdf</a>]</span>
             </p></li>
           </ol></body></html>"#
    )
}

const EMPTY_PAGE: &str = "<html><body><p>Sorry, your query returned no results</p></body></html>";

async fn mount_search(server: &MockServer, query: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_pdf(server: &MockServer, pdf_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(pdf_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

fn write_dataset(dir: &Path, rows: &[&str]) -> std::path::PathBuf {
    let dataset = dir.join("batch_1.csv");
    let mut writer = csv::Writer::from_path(&dataset).expect("create dataset");
    writer
        .write_record(["Title", "IntroRefer"])
        .expect("write header");
    for (i, row) in rows.iter().enumerate() {
        writer
            .write_record([format!("paper {i}").as_str(), row])
            .expect("write row");
    }
    writer.flush().expect("flush dataset");
    dataset
}

fn config_for(server: &MockServer, temp: &TempDir, dataset: &Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(
        dataset,
        temp.path().join("downloads"),
        temp.path().join("failed.log"),
    );
    config.search_url = format!("{}/search/", server.uri());
    config.pause_min = Duration::ZERO;
    config.pause_max = Duration::ZERO;
    config.throttle = ThrottlePolicy::new(Duration::from_millis(10), Duration::ZERO);
    config
}

fn failed_lines(temp: &TempDir) -> Vec<String> {
    let mut lines: Vec<String> = std::fs::read_to_string(temp.path().join("failed.log"))
        .expect("read failure log")
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

#[tokio::test]
async fn test_run_stores_found_titles_and_logs_the_rest() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        "attention is all you need",
        result_page("/pdf/1706.03762v7"),
    )
    .await;
    mount_search(
        &server,
        "deep residual learning",
        result_page("/pdf/1512.03385v1"),
    )
    .await;
    mount_search(&server, "unknown paper", EMPTY_PAGE.to_string()).await;
    mount_search(&server, "broken download", result_page("/pdf/9999.00001v1")).await;
    mount_pdf(&server, "/pdf/1706.03762v7", b"%PDF attention").await;
    mount_pdf(&server, "/pdf/1512.03385v1", b"%PDF resnet").await;
    Mock::given(method("GET"))
        .and(path("/pdf/9999.00001v1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let temp = TempDir::new().expect("temp dir");
    let dataset = write_dataset(
        temp.path(),
        &[
            "[1] Attention Is All You Need\n[2] Unknown Paper",
            "[1] Deep Residual Learning\nnot a citation line\n[2] Broken Download",
        ],
    );
    let config = config_for(&server, &temp, &dataset);

    let run = prepare(&config).expect("prepare run");
    assert_eq!(run.titles().len(), 4);
    let stats = run.execute().await.expect("run completes");

    assert_eq!(stats.stored(), 2);
    assert_eq!(stats.failed(), 2);
    assert_eq!(stats.total(), 4);

    let downloads = temp.path().join("downloads");
    assert_eq!(
        std::fs::read(downloads.join("1706_03762v7.pdf")).expect("first pdf"),
        b"%PDF attention"
    );
    assert_eq!(
        std::fs::read(downloads.join("1512_03385v1.pdf")).expect("second pdf"),
        b"%PDF resnet"
    );
    assert!(!downloads.join("9999_00001v1.pdf").exists());
    assert_eq!(failed_lines(&temp), vec!["broken download", "unknown paper"]);
}

#[tokio::test]
async fn test_later_titles_in_a_block_are_processed_after_a_success() {
    let server = MockServer::start().await;
    mount_search(&server, "first", result_page("/pdf/1000.00001v1")).await;
    mount_search(&server, "second", result_page("/pdf/1000.00002v1")).await;
    mount_pdf(&server, "/pdf/1000.00001v1", b"one").await;
    mount_pdf(&server, "/pdf/1000.00002v1", b"two").await;

    let temp = TempDir::new().expect("temp dir");
    let dataset = write_dataset(temp.path(), &["[1] First\n[2] Second"]);
    let config = config_for(&server, &temp, &dataset);

    let stats = prepare(&config)
        .expect("prepare run")
        .execute()
        .await
        .expect("run completes");

    assert_eq!(stats.stored(), 2);
    assert!(temp.path().join("downloads/1000_00002v1.pdf").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_titles_each_end_with_exactly_one_outcome() {
    let server = MockServer::start().await;
    let content: Vec<u8> = (0..8 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    mount_search(&server, "attention", result_page("/pdf/1706.03762v7")).await;
    mount_pdf(&server, "/pdf/1706.03762v7", &content).await;

    let temp = TempDir::new().expect("temp dir");
    let dataset = write_dataset(
        temp.path(),
        &["[1] Attention\n[2] Attention\n[3] Attention\n[4] Attention"],
    );
    let mut config = config_for(&server, &temp, &dataset);
    config.concurrency = 4;

    let stats = prepare(&config)
        .expect("prepare run")
        .execute()
        .await
        .expect("run completes");

    assert_eq!(stats.total(), 4);
    assert_eq!(stats.failed(), 0);
    assert_eq!(stats.stored() + stats.already_present(), 4);
    assert!(stats.stored() >= 1);
    assert!(failed_lines(&temp).is_empty());

    let downloads = temp.path().join("downloads");
    assert_eq!(
        std::fs::read(downloads.join("1706_03762v7.pdf")).expect("pdf"),
        content
    );
    let leftovers = std::fs::read_dir(&downloads)
        .expect("read downloads")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part"))
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_rerun_finds_existing_artifacts_without_downloading() {
    let server = MockServer::start().await;
    mount_search(&server, "cached paper", result_page("/pdf/2000.00001v2")).await;
    Mock::given(method("GET"))
        .and(path("/pdf/2000.00001v2"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().expect("temp dir");
    let dataset = write_dataset(temp.path(), &["[1] Cached Paper"]);
    let config = config_for(&server, &temp, &dataset);

    let first = prepare(&config).expect("prepare").execute().await.expect("run");
    assert_eq!(first.stored(), 1);

    let second = prepare(&config).expect("prepare").execute().await.expect("run");
    assert_eq!(second.stored(), 0);
    assert_eq!(second.already_present(), 1);
    assert_eq!(second.failed(), 0);
}

#[tokio::test]
async fn test_start_offset_skips_rows() {
    let server = MockServer::start().await;
    mount_search(&server, "skipped", result_page("/pdf/3000.00001v1")).await;
    mount_search(&server, "kept", EMPTY_PAGE.to_string()).await;

    let temp = TempDir::new().expect("temp dir");
    let dataset = write_dataset(temp.path(), &["[1] Skipped", "[1] Kept"]);
    let mut config = config_for(&server, &temp, &dataset);
    config.start = 1;

    let run = prepare(&config).expect("prepare run");
    assert_eq!(run.titles(), ["Kept".to_string()]);
    let stats = run.execute().await.expect("run completes");

    assert_eq!(stats.failed(), 1);
    assert_eq!(failed_lines(&temp), vec!["kept"]);
}

#[tokio::test]
async fn test_failure_log_appends_across_runs() {
    let server = MockServer::start().await;
    mount_search(&server, "missing", EMPTY_PAGE.to_string()).await;

    let temp = TempDir::new().expect("temp dir");
    std::fs::write(temp.path().join("failed.log"), "earlier title\n").expect("seed log");
    let dataset = write_dataset(temp.path(), &["[1] Missing"]);
    let config = config_for(&server, &temp, &dataset);

    prepare(&config).expect("prepare").execute().await.expect("run");

    assert_eq!(failed_lines(&temp), vec!["earlier title", "missing"]);
}
