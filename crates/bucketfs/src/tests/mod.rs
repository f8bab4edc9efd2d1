// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0


use crate::*;
use fakes::{CountingBucket, FailingBucket, ListingStore, StallingBucket};
use object_store::PutPayload;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::ObjectStore as _;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ROOT_CONTENT: &str = "This file is in the root directory.\n";

async fn store_with(files: &[(&str, &str)]) -> Arc<InMemory> {
    let store = InMemory::new();
    for (key, content) in files {
        _ = store
            .put(&Path::from(*key), PutPayload::from(content.as_bytes().to_vec()))
            .await
            .unwrap();
    }
    Arc::new(store)
}

async fn fixture_store() -> Arc<InMemory> {
    store_with(&[
        ("test.txt", ROOT_CONTENT),
        ("subdir/a.txt", "This is file A.\n"),
        ("subdir/b.txt", "This is file B.\n"),
    ])
    .await
}

async fn fixture_fs() -> BucketFs {
    BucketFs::from_object_store(fixture_store().await)
}

fn names(entries: &[Metadata]) -> Vec<&str> {
    entries.iter().map(Metadata::name).collect()
}

#[tokio::test]
async fn test_read_root_file() -> Result<()> {
    let fs = fixture_fs().await;
    assert_eq!(fs.read_file("test.txt").await?, ROOT_CONTENT.as_bytes());
    Ok(())
}

#[tokio::test]
async fn test_open_file_and_read() -> Result<()> {
    let fs = fixture_fs().await;
    let mut handle = fs.open("subdir/a.txt").await?;
    assert!(!handle.is_dir());

    let mut buf = [0u8; 64];
    let n = handle.read(&mut buf).await?;
    assert_eq!(&buf[..n], b"This is file A.\n");

    let meta = handle.stat();
    assert_eq!(meta.name(), "a.txt");
    assert_eq!(meta.size(), 16);
    handle.close()
}

#[tokio::test]
async fn test_open_directory() -> Result<()> {
    let fs = fixture_fs().await;
    let mut handle = fs.open("subdir").await?;
    assert!(handle.is_dir());
    assert_eq!(handle.stat().name(), "subdir");

    let entries = handle.read_dir(None).await?;
    assert_eq!(names(&entries), vec!["a.txt", "b.txt"]);
    assert!(entries.iter().all(Metadata::is_file));
    Ok(())
}

#[tokio::test]
async fn test_read_dir_root() -> Result<()> {
    let fs = fixture_fs().await;
    let entries = fs.read_dir(".").await?;

    assert_eq!(names(&entries), vec!["subdir", "test.txt"]);
    assert!(entries[0].is_dir());
    assert_eq!(entries[0].size(), 0);
    assert!(entries[1].is_file());
    assert_eq!(entries[1].size(), ROOT_CONTENT.len() as u64);
    Ok(())
}

#[tokio::test]
async fn test_root_spellings_are_equivalent() -> Result<()> {
    let fs = fixture_fs().await;
    let dot = fs.read_dir(".").await?;
    assert_eq!(fs.read_dir("").await?, dot);
    assert_eq!(fs.read_dir("/").await?, dot);

    assert!(fs.stat(".").await?.is_dir());
    assert!(fs.stat("/").await?.is_dir());
    assert!(fs.open("").await?.is_dir());
    Ok(())
}

#[tokio::test]
async fn test_read_dir_accepts_slashes() -> Result<()> {
    let fs = fixture_fs().await;
    assert_eq!(fs.read_dir("/subdir/").await?, fs.read_dir("subdir").await?);
    Ok(())
}

#[tokio::test]
async fn test_nested_directories() -> Result<()> {
    let fs = BucketFs::from_object_store(
        store_with(&[("a/b/c.txt", "c"), ("a/d.txt", "d"), ("a/b/e/f.txt", "f")]).await,
    );

    let entries = fs.read_dir("a").await?;
    assert_eq!(names(&entries), vec!["b", "d.txt"]);
    assert!(entries[0].is_dir());

    assert_eq!(names(&fs.read_dir("a/b").await?), vec!["c.txt", "e"]);
    assert!(fs.is_dir("a/b/e").await?);
    assert!(!fs.is_dir("a/b/c.txt").await?);
    Ok(())
}

#[tokio::test]
async fn test_missing_paths() {
    let fs = fixture_fs().await;

    let err = fs.open("404.txt").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref p) if p == "404.txt"));

    let err = fs.stat("subdir/404.txt").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref p) if p == "subdir/404.txt"));

    let err = fs.read_dir("nowhere").await.unwrap_err();
    assert!(err.is_not_found());

    let err = fs.read_file("nowhere/x.txt").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_invalid_paths_never_reach_bucket() {
    let counting = Arc::new(CountingBucket::new(ObjectStoreBucket::new(
        fixture_store().await,
    )));
    let fs = BucketFs::new(counting.clone());

    for path in ["/test.txt", "subdir/", "a//b", "./test.txt", "subdir/../test.txt", ".."] {
        let err = fs.open(path).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)), "{path}: {err}");
        assert!(err.is_not_found());

        assert!(fs.read_file(path).await.is_err());
        assert!(fs.is_dir(path).await.is_err());
        assert!(fs.sub(path).is_err());
    }

    let err = fs.stat("a/../b").await.unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
    let err = fs.read_dir("a//b").await.unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));

    assert_eq!(counting.calls(), 0);
}

#[tokio::test]
async fn test_root_open_needs_no_listing() -> Result<()> {
    let counting = Arc::new(CountingBucket::new(ObjectStoreBucket::new(
        fixture_store().await,
    )));
    let fs = BucketFs::new(counting.clone()).sub("subdir")?;

    let handle = fs.open(".").await?;
    assert!(handle.is_dir());
    // Only the listing backing the handle, never polled so far
    assert_eq!(counting.lists(), 1);
    assert_eq!(counting.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_read_dir_on_file() -> Result<()> {
    let fs = fixture_fs().await;

    let err = fs.read_dir("test.txt").await.unwrap_err();
    assert!(matches!(err, Error::NotADirectory(ref p) if p == "test.txt"));

    let mut handle = fs.open("test.txt").await?;
    let err = handle.read_dir(None).await.unwrap_err();
    assert!(matches!(err, Error::NotADirectory(_)));
    Ok(())
}

#[tokio::test]
async fn test_read_file_on_directory() {
    let fs = fixture_fs().await;
    let err = fs.read_file("subdir").await.unwrap_err();
    assert!(matches!(err, Error::IsADirectory(ref p) if p == "subdir"));
}

#[tokio::test]
async fn test_read_file_is_repeatable() -> Result<()> {
    let fs = fixture_fs().await;
    let first = fs.read_file("subdir/b.txt").await?;
    let second = fs.read_file("subdir/b.txt").await?;
    assert_eq!(first, second);
    assert_eq!(first, b"This is file B.\n");
    Ok(())
}

#[tokio::test]
async fn test_sub_chaining() -> Result<()> {
    let fs = BucketFs::from_object_store(
        store_with(&[
            ("a/b/c.txt", "deep"),
            ("a/b/d.txt", "d"),
            ("a/b/e/f.txt", "f"),
            ("a/b/e/g/h.txt", "h"),
            ("a/x.txt", "x"),
            ("ab/c.txt", "not below a/b"),
        ])
        .await,
    );

    let chained = fs.sub("a")?.sub("b")?;
    let direct = fs.sub("a/b")?;
    assert_eq!(chained.prefix(), "a/b");
    assert_eq!(direct.prefix(), "a/b");

    for dir in [".", "e", "e/g"] {
        let listed = chained.read_dir(dir).await?;
        assert_eq!(listed, direct.read_dir(dir).await?, "{dir}");
        let full = path::join("a/b", dir);
        assert_eq!(listed, fs.read_dir(&full).await?, "{dir}");
    }
    assert_eq!(names(&chained.read_dir(".").await?), vec!["c.txt", "d.txt", "e"]);

    assert_eq!(chained.read_file("c.txt").await?, b"deep");
    assert_eq!(direct.read_file("c.txt").await?, fs.read_file("a/b/c.txt").await?);
    assert_eq!(fs.sub(".")?.prefix(), "");
    Ok(())
}

#[tokio::test]
async fn test_sub_view_stat_and_list() -> Result<()> {
    let fs = fixture_fs().await.sub("subdir")?;

    assert_eq!(names(&fs.read_dir(".").await?), vec!["a.txt", "b.txt"]);
    assert!(fs.stat("a.txt").await?.is_file());
    assert!(fs.open("test.txt").await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_bounded_directory_reads() -> Result<()> {
    let fs = fixture_fs().await;
    let mut dir = fs.open(".").await?.into_dir()?;

    assert_eq!(names(&dir.read_dir(Some(1)).await?), vec!["subdir"]);
    assert_eq!(names(&dir.read_dir(Some(1)).await?), vec!["test.txt"]);
    let err = dir.read_dir(Some(1)).await.unwrap_err();
    assert!(matches!(err, Error::EndOfDirectory));
    assert!(dir.read_dir(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_bounded_then_unbounded() -> Result<()> {
    let fs = fixture_fs().await;
    let mut dir = fs.open("subdir").await?.into_dir()?;

    assert_eq!(names(&dir.read_dir(Some(1)).await?), vec!["a.txt"]);
    assert_eq!(names(&dir.read_dir(None).await?), vec!["b.txt"]);
    Ok(())
}

#[tokio::test]
async fn test_paged_reads_match_one_unbounded_read() -> Result<()> {
    let fs = BucketFs::from_object_store(
        store_with(&[
            ("logs/a.txt", "a"),
            ("logs/b.txt", "b"),
            ("logs/c/1.txt", "1"),
            ("logs/d.txt", "d"),
            ("logs/e/f/2.txt", "2"),
            ("logs/g.txt", "g"),
            ("logs/h/3.txt", "3"),
        ])
        .await,
    );
    let whole = fs.read_dir("logs").await?;
    assert_eq!(whole.len(), 7);

    for page in [1, 2, 3, 7, 10] {
        let mut dir = fs.open("logs").await?.into_dir()?;
        let mut paged = Vec::new();
        loop {
            match dir.read_dir(Some(page)).await {
                Ok(entries) => {
                    assert!(!entries.is_empty() && entries.len() <= page);
                    paged.extend(entries);
                }
                Err(Error::EndOfDirectory) => break,
                Err(err) => return Err(err),
            }
        }
        assert_eq!(paged, whole, "page size {page}");
    }
    Ok(())
}

#[tokio::test]
async fn test_listing_does_not_read_nested_objects() -> Result<()> {
    let store = Arc::new(ListingStore::new());
    store.put_str("test.txt", ROOT_CONTENT).await;
    for day in 0..50 {
        for hour in 0..10 {
            store.put_str(&format!("logs/2024/{day:02}/{hour:02}.log"), "x").await;
        }
    }
    let fs = BucketFs::from_object_store(store.clone());

    assert_eq!(names(&fs.read_dir(".").await?), vec!["logs", "test.txt"]);
    assert_eq!(store.requests(), 1);
    assert_eq!(store.listed(), 2);

    // The directory check stops at the first nested object
    assert!(fs.is_dir("logs").await?);
    assert!(store.listed() <= 3);

    assert_eq!(names(&fs.read_dir("logs/2024").await?).len(), 50);
    assert!(store.listed() <= 3 + 1 + 50);
    Ok(())
}

#[tokio::test]
async fn test_folder_markers_are_not_files() -> Result<()> {
    let store = Arc::new(ListingStore::new().with_marker("subdir").with_marker("empty"));
    store.put_str("test.txt", ROOT_CONTENT).await;
    store.put_str("subdir/a.txt", "a").await;
    let fs = BucketFs::from_object_store(store);

    let root = fs.read_dir(".").await?;
    assert_eq!(names(&root), vec!["empty", "subdir", "test.txt"]);
    assert!(root[0].is_dir() && root[1].is_dir());

    assert_eq!(names(&fs.read_dir("subdir").await?), vec!["a.txt"]);
    assert!(fs.is_dir("subdir").await?);

    // Nothing is stored below the marker
    assert!(!fs.is_dir("empty").await?);
    Ok(())
}

#[tokio::test]
async fn test_open_range() -> Result<()> {
    let counting = Arc::new(CountingBucket::new(ObjectStoreBucket::new(
        fixture_store().await,
    )));
    let fs = BucketFs::new(counting.clone());

    let mut file = fs.open_range("test.txt", 5..9).await?;
    assert_eq!(file.read_to_end().await?, b"file");
    assert_eq!(file.stat().size(), ROOT_CONTENT.len() as u64);
    assert_eq!(counting.gets(), 1);

    let err = fs.open_range("subdir", 0..1).await.unwrap_err();
    assert!(matches!(err, Error::IsADirectory(_)));
    let err = fs.open_range("404.txt", 0..1).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(ref p) if p == "404.txt"));
    Ok(())
}

#[tokio::test]
async fn test_directory_wins_over_object() -> Result<()> {
    let fs = BucketFs::from_object_store(
        store_with(&[("foo", "plain object"), ("foo/bar.txt", "nested")]).await,
    );

    let handle = fs.open("foo").await?;
    assert!(handle.is_dir());
    assert!(fs.stat("foo").await?.is_dir());
    assert!(fs.read_file("foo").await.unwrap_err().to_string().contains("foo"));

    // The object stays visible through its parent listing
    let entries = fs.read_dir(".").await?;
    assert_eq!(names(&entries), vec!["foo", "foo"]);
    assert!(entries[0].is_file());
    assert!(entries[1].is_dir());
    Ok(())
}

#[tokio::test]
async fn test_stat_metadata() -> Result<()> {
    let fs = fixture_fs().await;

    let file = fs.stat("test.txt").await?;
    assert_eq!(file.name(), "test.txt");
    assert_eq!(file.size(), ROOT_CONTENT.len() as u64);
    assert_eq!(file.entry_type(), EntryType::File);
    assert_eq!(file.mode(), 0o644);

    let dir = fs.stat("subdir").await?;
    assert_eq!(dir.name(), "subdir");
    assert_eq!(dir.entry_type(), EntryType::Directory);
    assert_eq!(dir.modified(), chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
    assert_eq!(dir.mode(), 0o755);
    Ok(())
}

#[tokio::test]
async fn test_listed_and_opened_metadata_agree() -> Result<()> {
    let fs = fixture_fs().await;
    let listed = fs.read_dir("subdir").await?;
    let opened = fs.open("subdir/a.txt").await?.stat();
    assert_eq!(listed[0], opened);
    assert_eq!(fs.stat("subdir/a.txt").await?, opened);
    Ok(())
}

#[tokio::test]
async fn test_store_errors_pass_through() {
    let fs = BucketFs::new(Arc::new(FailingBucket));

    let err = fs.open("test.txt").await.unwrap_err();
    assert!(matches!(err, Error::ObjectStore(_)), "{err}");
    assert!(!err.is_not_found());

    let err = fs.stat("test.txt").await.unwrap_err();
    assert!(matches!(err, Error::ObjectStore(_)));
}

#[tokio::test]
async fn test_cancel_stalled_open() {
    let token = CancellationToken::new();
    let fs = BucketFs::new(Arc::new(StallingBucket)).with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let err = fs.open("test.txt").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(!err.is_not_found());
    canceller.await.unwrap();

    // Already cancelled: fails without waiting
    let err = fs.read_dir("subdir").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_deadline_on_stalled_calls() {
    let fs = BucketFs::new(Arc::new(StallingBucket)).with_timeout(Duration::from_millis(20));

    let err = fs.stat("test.txt").await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_stalled_root_listing_is_cancellable() -> Result<()> {
    let fs = BucketFs::new(Arc::new(StallingBucket)).with_timeout(Duration::from_millis(20));

    // The root opens without touching the bucket
    let mut dir = fs.open(".").await?.into_dir()?;
    let err = dir.read_dir(None).await.unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded));
    Ok(())
}

#[tokio::test]
async fn test_open_handle_after_cancel() -> Result<()> {
    let token = CancellationToken::new();
    let fs = fixture_fs().await.with_cancellation(token.clone());
    let mut handle = fs.open("test.txt").await?;

    token.cancel();

    assert_eq!(handle.stat().name(), "test.txt");
    let mut buf = [0u8; 8];
    let err = handle.read(&mut buf).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    Ok(())
}

#[tokio::test]
async fn test_views_share_context() {
    let token = CancellationToken::new();
    let fs = fixture_fs().await.with_cancellation(token.clone());
    let child = fs.sub("subdir").unwrap();

    token.cancel();
    let err = child.read_file("a.txt").await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_file_backed_store() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    std::fs::create_dir_all(tmp.path().join("subdir"))?;
    std::fs::write(tmp.path().join("subdir/a.txt"), "local")?;

    let store = object_store::local::LocalFileSystem::new_with_prefix(tmp.path())
        .map_err(|err| Error::from_store(err, "."))?;
    let fs = BucketFs::from_object_store(Arc::new(store));

    assert_eq!(fs.read_file("subdir/a.txt").await?, b"local");
    assert!(fs.is_dir("subdir").await?);
    assert!(fs.open("missing").await.unwrap_err().is_not_found());
    Ok(())
}
