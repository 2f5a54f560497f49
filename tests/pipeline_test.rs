//! End-to-end tests for the download pipeline

#[path = "common/mod.rs"]
mod common;

use common::*;
use dump_fetch::errors::AppError;
use dump_fetch::models::{ChecksumAlgorithm, FilterSpec, RunRequest};
use dump_fetch::orchestrator;
use std::future::{pending, ready};
use std::time::Duration;

fn request(env: &TestEnv, filter: FilterSpec) -> RunRequest {
    RunRequest::new(
        "samplewiki",
        "20200101",
        filter,
        ChecksumAlgorithm::default(),
        &env.config.output_base,
    )
    .unwrap()
}

#[tokio::test]
async fn test_run_selects_and_submits_matching_files() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST);
    let req = request(&env, FilterSpec::Literal("pages-meta-history".into()));

    let summary = orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap();

    assert_eq!(
        fake.fetched_urls(),
        vec!["https://host/samplewiki/20200101/samplewiki-20200101-md5sums.txt"]
    );

    let batches = fake.batch_calls();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.concurrency, 1);
    assert_eq!(
        batch.dest_dir,
        env.config.output_base.join("samplewiki").join("20200101")
    );
    assert_eq!(
        batch.urls,
        vec![
            "https://host/samplewiki/20200101/samplewiki-20200101-pages-meta-history1.xml-p1p1000.bz2",
            "https://host/samplewiki/20200101/samplewiki-20200101-pages-meta-history2.xml-p1001p2000.bz2",
        ]
    );
    assert!(batch.url_list.starts_with(env.scratch_dir()));

    assert_eq!(summary.urls, batch.urls);
    assert_eq!(summary.manifest_entries, 4);
    assert!(summary.manifest_path.is_file());
    assert!(summary.output_dir.is_dir());
    assert_eq!(env.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_run_uses_sha1_manifest_when_requested() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST);
    let req = RunRequest::new(
        "samplewiki",
        "latest",
        FilterSpec::Regex(r"abstract\.xml".into()),
        ChecksumAlgorithm::Sha1,
        &env.config.output_base,
    )
    .unwrap();

    let summary = orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap();

    assert_eq!(
        fake.fetched_urls(),
        vec!["https://host/samplewiki/latest/samplewiki-latest-sha1sums.txt"]
    );
    assert_eq!(
        summary.urls,
        vec!["https://host/samplewiki/latest/samplewiki-20200101-abstract.xml.gz"]
    );
}

#[tokio::test]
async fn test_run_honours_concurrency_setting() {
    let mut env = TestEnv::new();
    env.config.concurrency = 4;
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST);
    let req = request(&env, FilterSpec::Fixed(".bz2".into()));

    orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap();

    let batches = fake.batch_calls();
    assert_eq!(batches[0].concurrency, 4);
    assert_eq!(batches[0].urls.len(), 3);
}

#[tokio::test]
async fn test_empty_selection_skips_download() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST);
    let req = request(&env, FilterSpec::Fixed("does-not-exist".into()));

    let summary = orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap();

    assert!(summary.urls.is_empty());
    assert!(fake.batch_calls().is_empty());
    assert!(summary.output_dir.is_dir());
    assert_eq!(env.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_manifest_fetch_failure_cleans_up() {
    let env = TestEnv::new();
    let fake = FakeDownloader::failing_manifest();
    let req = request(&env, FilterSpec::Literal("pages".into()));

    let err = orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ManifestFetch { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(fake.batch_calls().is_empty());
    assert_eq!(env.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_download_failure_propagates_status_and_cleans_up() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST).with_batch(BatchBehavior::Fail(7));
    let req = request(&env, FilterSpec::Literal("pages".into()));

    let err = orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Download { .. }));
    assert_eq!(err.exit_code(), 7);
    assert_eq!(env.leftover_workspaces(), 0);
    // The manifest is an artifact and stays behind
    assert!(env
        .config
        .output_base
        .join("samplewiki/20200101/samplewiki-20200101-md5sums.txt")
        .is_file());
}

#[tokio::test]
async fn test_invalid_regex_fails_after_fetch_and_cleans_up() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST);
    let req = request(&env, FilterSpec::Regex("(unclosed".into()));

    let err = orchestrator::run(&req, &env.config, &fake, pending())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidFilterType(_)));
    assert!(fake.batch_calls().is_empty());
    assert_eq!(env.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_interrupt_during_download_releases_workspace() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST).with_batch(BatchBehavior::Hang);
    let req = request(&env, FilterSpec::Literal("pages".into()));

    let err = orchestrator::run(
        &req,
        &env.config,
        &fake,
        tokio::time::sleep(Duration::from_millis(50)),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Interrupted));
    assert_eq!(err.exit_code(), 130);
    assert_eq!(fake.batch_calls().len(), 1);
    assert!(!fake.batch_calls()[0].url_list.exists());
    assert_eq!(env.leftover_workspaces(), 0);
}

#[tokio::test]
async fn test_interrupt_before_start_releases_workspace() {
    let env = TestEnv::new();
    let fake = FakeDownloader::serving(SAMPLE_MANIFEST);
    let req = request(&env, FilterSpec::Literal("pages".into()));

    let err = orchestrator::run(&req, &env.config, &fake, ready(()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Interrupted));
    assert!(fake.fetched_urls().is_empty());
    assert_eq!(env.leftover_workspaces(), 0);
}

#[test]
fn test_invalid_date_fails_before_any_fetch() {
    let env = TestEnv::new();
    let err = RunRequest::new(
        "samplewiki",
        "20201332",
        FilterSpec::Literal("pages".into()),
        ChecksumAlgorithm::default(),
        &env.config.output_base,
    )
    .unwrap_err();

    assert!(matches!(err, AppError::InvalidDateFormat(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(!env.config.output_base.exists());
    assert_eq!(env.leftover_workspaces(), 0);
}
