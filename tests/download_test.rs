mod common;

use actix_web::rt::System;
use common::mock_asset_host::MockAssetHost;
use seedance_gateway::GenerationError;
use seedance_gateway::asset_store::AssetStore;
use seedance_gateway::download::Downloader;
use std::time::Duration;

const MAX_BYTES: u64 = 1024;

fn entries(store: &AssetStore) -> usize {
    std::fs::read_dir(store.root()).unwrap().count()
}

#[test]
fn test_declared_length_over_cap_is_rejected() {
    System::new().block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path().join("uploads")).unwrap();
        let host = MockAssetHost::start(vec![1u8; 4096]).await;
        let downloader = Downloader::new(Duration::from_secs(5), MAX_BYTES).unwrap();

        let err = downloader
            .persist(&host.url("/video.mp4"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Download(_)), "{:?}", err);
        assert_eq!(entries(&store), 0);

        host.stop().await;
    });
}

#[test]
fn test_streamed_body_over_cap_is_rejected() {
    System::new().block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path().join("uploads")).unwrap();
        let host = MockAssetHost::start(vec![1u8; 4096]).await;
        let downloader = Downloader::new(Duration::from_secs(5), MAX_BYTES).unwrap();

        let err = downloader
            .persist(&host.url("/chunked.mp4"), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Download(_)), "{:?}", err);
        assert_eq!(entries(&store), 0);

        host.stop().await;
    });
}

#[test]
fn test_body_within_cap_is_stored() {
    System::new().block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::open(dir.path().join("uploads")).unwrap();
        let host = MockAssetHost::start(vec![9u8; 1000]).await;
        let downloader = Downloader::new(Duration::from_secs(5), MAX_BYTES).unwrap();

        let id = downloader
            .persist(&host.url("/chunked.mp4"), &store)
            .await
            .unwrap();
        let path = store.get_path(&id).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![9u8; 1000]);

        host.stop().await;
    });
}
