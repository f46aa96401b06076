use bytes::Bytes;

use debrief::application::ports::{StagingStore, StagingStoreError};
use debrief::domain::{RecordingId, StoragePath};
use debrief::infrastructure::storage::LocalStagingStore;

fn create_test_store() -> (tempfile::TempDir, LocalStagingStore) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = LocalStagingStore::new(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn given_audio_bytes_when_storing_then_reported_size_matches() {
    let (_dir, store) = create_test_store();
    let path = StoragePath::for_recording(&RecordingId::new(), "interview.wav");

    let size = store
        .store(&path, Bytes::from_static(b"hello world"))
        .await
        .unwrap();

    assert_eq!(size, 11);
}

#[tokio::test]
async fn given_stored_recording_when_fetching_then_bytes_match_original() {
    let (_dir, store) = create_test_store();
    let path = StoragePath::for_recording(&RecordingId::new(), "interview.wav");
    let content = b"pcm-ish bytes";

    store
        .store(&path, Bytes::from_static(content))
        .await
        .unwrap();
    let fetched = store.fetch(&path).await.unwrap();

    assert_eq!(fetched, content);
}

#[tokio::test]
async fn given_stored_recording_when_deleting_then_fetch_returns_not_found() {
    let (_dir, store) = create_test_store();
    let path = StoragePath::for_recording(&RecordingId::new(), "interview.wav");

    store
        .store(&path, Bytes::from_static(b"data"))
        .await
        .unwrap();
    store.delete(&path).await.unwrap();

    let result = store.fetch(&path).await;
    assert!(matches!(result, Err(StagingStoreError::NotFound(_))));
}

#[tokio::test]
async fn given_two_recordings_with_same_filename_when_storing_then_paths_do_not_collide() {
    let (_dir, store) = create_test_store();
    let first = StoragePath::for_recording(&RecordingId::new(), "interview.wav");
    let second = StoragePath::for_recording(&RecordingId::new(), "interview.wav");

    store
        .store(&first, Bytes::from_static(b"first"))
        .await
        .unwrap();
    store
        .store(&second, Bytes::from_static(b"second"))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(store.fetch(&first).await.unwrap(), b"first");
    assert_eq!(store.fetch(&second).await.unwrap(), b"second");
}

#[test]
fn given_filename_with_path_components_when_building_path_then_only_basename_is_kept() {
    let id = RecordingId::new();
    let path = StoragePath::for_recording(&id, "../../etc/passwd");

    assert!(!path.as_str().contains(".."));
    assert!(path.as_str().ends_with("/passwd"));
}

#[test]
fn given_empty_filename_when_building_path_then_fallback_name_is_used() {
    let id = RecordingId::new();
    let path = StoragePath::for_recording(&id, "");

    assert!(path.as_str().ends_with("/recording"));
}
