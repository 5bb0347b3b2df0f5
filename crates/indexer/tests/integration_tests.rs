//! Integration tests for the wheel indexer
//!
//! Tests the full pipeline: bucket listing -> parsing -> grouping -> rendering -> publishing

use std::sync::Arc;

use futures::stream;
use wheelhouse_indexer::{
    IndexBuilder, IndexerConfig, IndexerConfigBuilder, IndexerError, LocalDestination,
    MemoryStorage, ObjectStoreBackend, PublishOutcome, StorageBackend, WheelIndexer, parse,
};

fn config() -> IndexerConfigBuilder {
    IndexerConfigBuilder::new().bucket("vllm-wheels").dry_run(false)
}

fn build(builder: IndexerConfigBuilder) -> IndexerConfig {
    builder.build().unwrap()
}

/// Resolves a relative href against the page directory the way a browser would.
fn resolve(page_dir: &str, href: &str) -> String {
    let mut segments: Vec<&str> = page_dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in href.split('#').next().unwrap().split('/') {
        match part {
            ".." => {
                segments.pop();
            }
            "" | "." => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn hrefs(page: &str) -> Vec<String> {
    page.split("href=\"")
        .skip(1)
        .map(|rest| rest.split('"').next().unwrap().to_owned())
        .collect()
}

fn page(storage: &MemoryStorage, key: &str) -> String {
    String::from_utf8(storage.object(key).unwrap().to_vec()).unwrap()
}

/// Two wheels under a directory prefix -> one package page linking both keys
#[tokio::test]
async fn test_two_wheels_one_package() {
    let storage = Arc::new(MemoryStorage::with_keys([
        "pkg/foo-1.0.0-py3-none-any.whl",
        "pkg/foo-1.2.0-py3-none-any.whl",
    ]));
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let summary = indexer.run().await.unwrap();
    assert!(summary.is_success());

    let root = page(&storage, "simple/index.html");
    assert_eq!(hrefs(&root), vec!["foo/"]);

    let foo = page(&storage, "simple/foo/index.html");
    assert!(foo.contains(">foo-1.0.0-py3-none-any.whl</a>"));
    assert!(foo.contains(">foo-1.2.0-py3-none-any.whl</a>"));
    let resolved: Vec<_> = hrefs(&foo)
        .iter()
        .map(|h| resolve("simple/foo", h))
        .collect();
    assert_eq!(
        resolved,
        vec![
            "pkg/foo-1.0.0-py3-none-any.whl",
            "pkg/foo-1.2.0-py3-none-any.whl"
        ]
    );
}

/// A non-artifact key is skipped; the sdist name is normalized
#[tokio::test]
async fn test_sdist_and_non_artifact() {
    let storage = Arc::new(MemoryStorage::with_keys(["bar_thing-0.1.tar.gz", "notes.txt"]));
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let summary = indexer.run().await.unwrap();

    assert_eq!(summary.packages, 1);
    assert_eq!(summary.artifacts, 1);
    let bar = page(&storage, "simple/bar-thing/index.html");
    assert_eq!(hrefs(&bar).len(), 1);
    assert!(!page(&storage, "simple/index.html").contains("notes"));
}

/// Keys with `.` or `..` segments are not linked
#[tokio::test]
async fn test_dot_segment_keys_skipped() {
    let storage = Arc::new(MemoryStorage::with_keys([
        "x/../foo-1.0.tar.gz",
        "pkg/foo-1.0-py3-none-any.whl",
    ]));
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let summary = indexer.run().await.unwrap();

    assert_eq!(summary.artifacts, 1);
    let foo = page(&storage, "simple/foo/index.html");
    assert_eq!(hrefs(&foo), vec!["../../pkg/foo-1.0-py3-none-any.whl"]);
}

/// An empty bucket still produces a valid root page
#[tokio::test]
async fn test_empty_bucket() {
    let storage = Arc::new(MemoryStorage::new());
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let summary = indexer.run().await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.packages, 0);
    assert_eq!(storage.keys(), vec!["simple/index.html"]);
    let root = page(&storage, "simple/index.html");
    assert!(root.starts_with("<!DOCTYPE html>"));
    assert!(hrefs(&root).is_empty());
}

/// A listing failure aborts the run before anything is written
#[tokio::test]
async fn test_listing_failure_aborts() {
    let storage = Arc::new(
        MemoryStorage::with_keys(["foo-1.0.tar.gz"]).with_list_failure("InvalidAccessKeyId"),
    );
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let err = indexer.run().await.unwrap_err();

    assert!(err.is_listing_failure());
    assert!(err.to_string().contains("listing failed"));
    assert!(err.to_string().contains("InvalidAccessKeyId"));
    assert_eq!(storage.put_count(), 0);
}

/// Two runs over an unchanged bucket produce byte-identical pages
#[tokio::test]
async fn test_rerun_is_idempotent() {
    let storage = Arc::new(MemoryStorage::with_keys([
        "nightly/vllm-1.0.0.dev-cp38-abi3-manylinux1_x86_64.whl",
        "0a1b2c/vllm-0.9.0-cp38-abi3-manylinux1_x86_64.whl",
        "zope.interface-6.0.tar.gz",
    ]));
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    indexer.run().await.unwrap();
    let first: Vec<_> = storage
        .keys()
        .into_iter()
        .filter(|k| k.starts_with("simple/"))
        .map(|k| (k.clone(), storage.object(&k).unwrap()))
        .collect();

    indexer.run().await.unwrap();
    let second: Vec<_> = storage
        .keys()
        .into_iter()
        .filter(|k| k.starts_with("simple/"))
        .map(|k| (k.clone(), storage.object(&k).unwrap()))
        .collect();

    assert_eq!(first, second);
}

/// Dry run writes nothing and reports exactly the paths a real run writes
#[tokio::test]
async fn test_dry_run_is_pure() {
    let keys = [
        "pkg/foo-1.0.0-py3-none-any.whl",
        "pkg/bar-2.0.tar.gz",
        "README.md",
    ];

    let dry_storage = Arc::new(MemoryStorage::with_keys(keys));
    let dry = WheelIndexer::with_storage(build(config().dry_run(true)), Arc::clone(&dry_storage))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(dry_storage.put_count(), 0);
    assert_eq!(dry_storage.len(), keys.len());
    assert!(dry.report.dry_run);
    assert!(
        dry.report
            .entries
            .iter()
            .all(|e| e.outcome == PublishOutcome::Skipped)
    );

    let real_storage = Arc::new(MemoryStorage::with_keys(keys));
    let real = WheelIndexer::with_storage(build(config()), Arc::clone(&real_storage))
        .unwrap()
        .run()
        .await
        .unwrap();

    let skipped: Vec<_> = dry.report.skipped().map(|e| &e.path).collect();
    let written: Vec<_> = real.report.written().map(|e| &e.path).collect();
    assert_eq!(skipped, written);
}

/// The default configuration never writes
#[tokio::test]
async fn test_dry_run_is_default() {
    let storage = Arc::new(MemoryStorage::with_keys(["foo-1.0.tar.gz"]));
    let config = IndexerConfigBuilder::new().bucket("b").build().unwrap();
    assert!(config.dry_run);

    WheelIndexer::with_storage(config, Arc::clone(&storage))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(storage.put_count(), 0);
}

/// Repeated keys contribute a single link
#[tokio::test]
async fn test_duplicate_keys_deduplicated() {
    let key = "pkg/foo-1.0.0-py3-none-any.whl";
    let items = vec![
        Ok(parse(key).unwrap()),
        Ok(parse("pkg/foo-1.1.0-py3-none-any.whl").unwrap()),
        Ok(parse(key).unwrap()),
    ];
    let index = IndexBuilder::new()
        .collect(stream::iter(items))
        .await
        .unwrap();

    assert_eq!(index.artifact_count(), 2);
    assert_eq!(index.get("foo").unwrap().artifacts().len(), 2);
}

/// Listing is drained across many small pages
#[tokio::test]
async fn test_multi_page_listing() {
    let keys: Vec<String> = (0..57)
        .map(|i| format!("pkg/pkg{}-1.0.{i}-py3-none-any.whl", i % 5))
        .collect();
    let storage = Arc::new(MemoryStorage::with_keys(keys).with_page_size(10));
    let indexer = WheelIndexer::with_storage(build(config().prefix("pkg/")), Arc::clone(&storage))
        .unwrap();

    let summary = indexer.run().await.unwrap();

    assert_eq!(summary.artifacts, 57);
    assert_eq!(summary.packages, 5);
    assert_eq!(summary.pages, 6);
    assert_eq!(storage.list_count(), 6);
}

/// A stalled continuation token is a fatal listing error
#[tokio::test]
async fn test_stalled_pagination_aborts() {
    let storage = Arc::new(
        MemoryStorage::with_keys(["a-1.0.zip", "b-1.0.zip", "c-1.0.zip"])
            .with_page_size(1)
            .with_stalled_pagination(),
    );
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let err = indexer.run().await.unwrap_err();
    assert!(matches!(err, IndexerError::StalledPagination { .. }));
    assert_eq!(storage.put_count(), 0);
}

/// One failed page write is reported; the rest are still written
#[tokio::test]
async fn test_partial_publish_failure() {
    let storage = Arc::new(
        MemoryStorage::with_keys(["foo-1.0.tar.gz", "bar-1.0.tar.gz"])
            .with_failing_write("simple/bar/index.html"),
    );
    let indexer = WheelIndexer::with_storage(build(config()), Arc::clone(&storage)).unwrap();

    let summary = indexer.run().await.unwrap();

    assert!(!summary.is_success());
    let failed: Vec<_> = summary.report.failed().map(|e| e.path.as_str()).collect();
    assert_eq!(failed, vec!["simple/bar/index.html"]);
    assert_eq!(summary.report.written().count(), 2);
    assert!(storage.object("simple/foo/index.html").is_some());
    assert!(storage.object("simple/index.html").is_some());
}

/// Per-ref subtrees index only that ref's artifacts
#[tokio::test]
async fn test_ref_indexes() {
    let storage = Arc::new(MemoryStorage::with_keys([
        "nightly/vllm-1.0.0.dev-cp38-abi3-manylinux1_x86_64.whl",
        "0a1b2c/vllm-0.9.0-cp38-abi3-manylinux1_x86_64.whl",
        "vllm/vllm-0.8.0-cp38-abi3-manylinux1_x86_64.whl",
    ]));
    let indexer =
        WheelIndexer::with_storage(build(config().ref_indexes(true)), Arc::clone(&storage))
            .unwrap();

    let summary = indexer.run().await.unwrap();

    assert_eq!(summary.skipped_refs, vec!["vllm"]);
    let nightly = page(&storage, "simple/nightly/vllm/index.html");
    let links = hrefs(&nightly);
    assert_eq!(links.len(), 1);
    assert_eq!(
        resolve("simple/nightly/vllm", &links[0]),
        "nightly/vllm-1.0.0.dev-cp38-abi3-manylinux1_x86_64.whl"
    );
    assert!(storage.object("simple/0a1b2c/index.html").is_some());
    assert!(storage.object("simple/vllm/vllm/index.html").is_none());

    let main = page(&storage, "simple/vllm/index.html");
    assert_eq!(hrefs(&main).len(), 3);
}

/// Published sidecar digests become `#sha256=` fragments
#[tokio::test]
async fn test_digests_linked() {
    let digest = "3b200e5e581ab8da6bb4810c1277a30b361dfdbb2c109080a3b7a1f121bbcb06";
    let storage = Arc::new(
        MemoryStorage::new()
            .with_object("foo-1.0-py3-none-any.whl", "wheel")
            .with_object(
                "foo-1.0-py3-none-any.whl.sha256",
                format!("{digest}  foo-1.0-py3-none-any.whl\n"),
            )
            .with_object("foo-1.1-py3-none-any.whl", "wheel"),
    );
    let indexer =
        WheelIndexer::with_storage(build(config().with_digests(true)), Arc::clone(&storage))
            .unwrap();

    let summary = indexer.run().await.unwrap();

    let digests = summary.digests.unwrap();
    assert_eq!(digests.attached, 1);
    assert_eq!(digests.missing, 1);
    let foo = page(&storage, "simple/foo/index.html");
    assert!(foo.contains(&format!("foo-1.0-py3-none-any.whl#sha256={digest}\"")));
    assert!(foo.contains("foo-1.1-py3-none-any.whl\""));
}

/// Local directory as bucket and as output, with absolute links
#[tokio::test]
async fn test_local_directory_roundtrip() {
    let bucket = tempfile::tempdir().unwrap();
    let wheels = bucket.path().join("pkg");
    std::fs::create_dir_all(&wheels).unwrap();
    std::fs::write(wheels.join("foo-1.0.0-py3-none-any.whl"), b"wheel").unwrap();
    std::fs::write(wheels.join("notes.txt"), b"text").unwrap();

    let out = tempfile::tempdir().unwrap();
    let config = build(
        config()
            .backend(StorageBackend::Local)
            .bucket(bucket.path().to_string_lossy())
            .base_url("https://vllm-wheels.s3.us-west-2.amazonaws.com")
            .local_dir(out.path().join("index_test")),
    );

    let source = Arc::new(ObjectStoreBackend::open_source(&config).unwrap());
    let destination = Arc::new(ObjectStoreBackend::open_local_destination(&config).unwrap());
    let summary = WheelIndexer::new(config, source, destination)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(summary.is_success());
    let written = out.path().join("index_test/simple/foo/index.html");
    let html = std::fs::read_to_string(written).unwrap();
    assert!(html.contains(
        "href=\"https://vllm-wheels.s3.us-west-2.amazonaws.com/pkg/foo-1.0.0-py3-none-any.whl\""
    ));
    assert!(!bucket.path().join("simple").exists());
}

/// A local output directory is not created by a dry run or an aborted run
#[tokio::test]
async fn test_local_directory_untouched_without_writes() {
    let out = tempfile::tempdir().unwrap();
    let target = out.path().join("index_test");

    let source = Arc::new(MemoryStorage::with_keys(["foo-1.0.tar.gz"]));
    let destination = Arc::new(LocalDestination::new(&target));
    let config = build(config().dry_run(true).local_dir(&target));
    let summary = WheelIndexer::new(config, source, destination)
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.report.skipped().count(), 2);
    assert!(!target.exists());

    let failing = Arc::new(
        MemoryStorage::with_keys(["foo-1.0.tar.gz"]).with_list_failure("InvalidAccessKeyId"),
    );
    let destination = Arc::new(LocalDestination::new(&target));
    let err = WheelIndexer::new(build(crate::config().local_dir(&target)), failing, destination)
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(err.is_listing_failure());
    assert!(!target.exists());
}
