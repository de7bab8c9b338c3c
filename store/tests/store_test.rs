//! Integration tests for sysconf-store against in-memory SQLite.

use sysconf_config::{CodecError, ConfigValue, SystemConfig, SystemConfigKey};
use sysconf_store::{ConfigStore, RowProblem, StoreError, SystemConfigRow, SystemConfigService};

async fn create_test_store() -> ConfigStore {
    let store = ConfigStore::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    store
}

async fn create_test_service() -> SystemConfigService {
    SystemConfigService::new(create_test_store().await).unwrap()
}

fn row(key: &str, value: Option<&str>) -> SystemConfigRow {
    SystemConfigRow {
        key: key.to_string(),
        value: value.map(str::to_string),
    }
}

#[tokio::test]
async fn test_row_crud() {
    let store = create_test_store().await;

    store.upsert(&row("trash.days", Some("10"))).await.unwrap();
    store.upsert(&row("ffmpeg.crf", Some("30"))).await.unwrap();

    let fetched = store.get("trash.days").await.unwrap().unwrap();
    assert_eq!(fetched.value.as_deref(), Some("10"));

    // Upsert replaces in place
    store.upsert(&row("trash.days", Some("12"))).await.unwrap();
    let fetched = store.get("trash.days").await.unwrap().unwrap();
    assert_eq!(fetched.value.as_deref(), Some("12"));

    let rows = store.list().await.unwrap();
    let keys: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["ffmpeg.crf", "trash.days"]);

    assert!(store.delete("trash.days").await.unwrap());
    assert!(!store.delete("trash.days").await.unwrap());
    assert!(store.get("trash.days").await.unwrap().is_none());
}

#[tokio::test]
async fn test_null_row_is_kept_apart_from_missing_row() {
    let store = create_test_store().await;

    store.upsert(&row("oauth.defaultStorageQuota", None)).await.unwrap();

    let fetched = store.get("oauth.defaultStorageQuota").await.unwrap().unwrap();
    assert_eq!(fetched.value, None);
    assert!(store.get("oauth.scope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_many() {
    let store = create_test_store().await;
    for key in ["a.one", "a.two", "b.three"] {
        store.upsert(&row(key, Some("1"))).await.unwrap();
    }

    assert_eq!(store.delete_many(&[]).await.unwrap(), 0);
    let deleted = store
        .delete_many(&["a.one".to_string(), "b.three".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let rows = store.list().await.unwrap();
    assert_eq!(rows, vec![row("a.two", Some("1"))]);
}

#[tokio::test]
async fn test_unsupported_dsn() {
    let result = ConfigStore::connect("mysql://localhost/db").await;
    assert!(matches!(result, Err(StoreError::Config(_))));
}

#[tokio::test]
async fn test_number_override_round_trip() {
    let service = create_test_service().await;

    service
        .set(SystemConfigKey::TrashDays, Some(ConfigValue::from(3)))
        .await
        .unwrap();

    let stored = service.store().get("trash.days").await.unwrap().unwrap();
    assert_eq!(stored.value.as_deref(), Some("3"));

    let value = service.get(SystemConfigKey::TrashDays).await.unwrap();
    assert_eq!(value, Some(ConfigValue::from(3)));

    let config = service.load().await.unwrap();
    assert_eq!(config.trash.days, 3);
    assert!(config.trash.enabled);
}

#[tokio::test]
async fn test_list_override_keeps_order() {
    let service = create_test_service().await;

    service
        .set(
            SystemConfigKey::FfmpegAcceptedVideoCodecs,
            Some(ConfigValue::from(vec!["hevc", "h264"])),
        )
        .await
        .unwrap();

    let value = service
        .get(SystemConfigKey::FfmpegAcceptedVideoCodecs)
        .await
        .unwrap();
    assert_eq!(value, Some(ConfigValue::from(vec!["hevc", "h264"])));

    let config = service.load().await.unwrap();
    assert_eq!(config.ffmpeg.accepted_video_codecs, ["hevc", "h264"]);
}

#[tokio::test]
async fn test_get_without_override_returns_base() {
    let service = create_test_service().await;

    let crf = service.get(SystemConfigKey::FfmpegCrf).await.unwrap();
    assert_eq!(crf, Some(ConfigValue::from(23)));

    let quota = service
        .get(SystemConfigKey::OauthDefaultStorageQuota)
        .await
        .unwrap();
    assert_eq!(quota, None);
}

#[tokio::test]
async fn test_malformed_row_falls_back_to_base() {
    let service = create_test_service().await;
    service
        .store()
        .upsert(&row("trash.days", Some("not-json")))
        .await
        .unwrap();
    service
        .set(SystemConfigKey::FfmpegCrf, Some(ConfigValue::from(28)))
        .await
        .unwrap();

    let config = service.load().await.unwrap();
    assert_eq!(config.trash.days, 30);
    assert_eq!(config.ffmpeg.crf, 28);

    let value = service.get(SystemConfigKey::TrashDays).await.unwrap();
    assert_eq!(value, Some(ConfigValue::from(30)));

    let overrides = service.overrides().await.unwrap();
    assert_eq!(overrides.entries.len(), 1);
    assert_eq!(overrides.rejected.len(), 1);
    assert_eq!(overrides.rejected[0].row.key, "trash.days");
    assert!(matches!(
        overrides.rejected[0].problem,
        RowProblem::Codec(CodecError::Malformed { .. })
    ));
}

#[tokio::test]
async fn test_wrong_kind_row_falls_back_to_base() {
    let service = create_test_service().await;
    service
        .store()
        .upsert(&row("trash.days", Some("\"thirty\"")))
        .await
        .unwrap();
    service
        .store()
        .upsert(&row("trash.enabled", None))
        .await
        .unwrap();

    let config = service.load().await.unwrap();
    assert_eq!(config.trash, SystemConfig::default().trash);

    let overrides = service.overrides().await.unwrap();
    assert!(overrides.entries.is_empty());
    let problems: Vec<_> = overrides.rejected.iter().map(|r| r.problem.clone()).collect();
    assert!(matches!(
        problems[0],
        RowProblem::Codec(CodecError::KindMismatch { .. })
    ));
    assert!(matches!(
        problems[1],
        RowProblem::Codec(CodecError::NullNotAllowed { .. })
    ));
}

#[tokio::test]
async fn test_value_rejected_by_typed_config_is_skipped() {
    let service = create_test_service().await;
    service
        .store()
        .upsert(&row("trash.days", Some("-5")))
        .await
        .unwrap();
    service
        .store()
        .upsert(&row("ffmpeg.crf", Some("1.5")))
        .await
        .unwrap();
    service
        .set(SystemConfigKey::FfmpegThreads, Some(ConfigValue::from(4)))
        .await
        .unwrap();

    let config = service.load().await.unwrap();
    assert_eq!(config.trash.days, 30);
    assert_eq!(config.ffmpeg.crf, 23);
    assert_eq!(config.ffmpeg.threads, 4);

    // get follows the same fallback as load
    assert_eq!(
        service.get(SystemConfigKey::TrashDays).await.unwrap(),
        Some(ConfigValue::from(30))
    );
    assert_eq!(
        service.get(SystemConfigKey::FfmpegCrf).await.unwrap(),
        Some(ConfigValue::from(23))
    );

    let overrides = service.overrides().await.unwrap();
    assert_eq!(overrides.entries.len(), 1);
    assert_eq!(overrides.entries[0].key, "ffmpeg.threads");
    let rejected: Vec<_> = overrides.rejected.iter().map(|r| r.row.key.as_str()).collect();
    assert_eq!(rejected, ["ffmpeg.crf", "trash.days"]);
    assert!(overrides
        .rejected
        .iter()
        .all(|r| matches!(r.problem, RowProblem::Invalid(_))));
}

#[tokio::test]
async fn test_set_rejects_value_the_config_type_cannot_hold() {
    let service = create_test_service().await;

    let err = service
        .set(SystemConfigKey::TrashDays, Some(ConfigValue::from(-5)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
    assert!(err.to_string().contains("trash.days"));

    let err = service
        .set(SystemConfigKey::FfmpegCrf, ConfigValue::from_f64(1.5))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));

    assert!(service.store().list().await.unwrap().is_empty());
    assert_eq!(service.load().await.unwrap(), SystemConfig::default());
}

#[tokio::test]
async fn test_explicit_null_override() {
    let mut base = SystemConfig::default();
    base.oauth.default_storage_quota = Some(50);
    let service = SystemConfigService::with_base(create_test_store().await, base).unwrap();

    assert_eq!(
        service
            .get(SystemConfigKey::OauthDefaultStorageQuota)
            .await
            .unwrap(),
        Some(ConfigValue::from(50))
    );

    service
        .set(SystemConfigKey::OauthDefaultStorageQuota, None)
        .await
        .unwrap();

    let stored = service
        .store()
        .get("oauth.defaultStorageQuota")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.value, None);

    assert_eq!(
        service
            .get(SystemConfigKey::OauthDefaultStorageQuota)
            .await
            .unwrap(),
        None
    );
    let config = service.load().await.unwrap();
    assert_eq!(config.oauth.default_storage_quota, None);
}

#[tokio::test]
async fn test_set_rejects_wrong_kind_and_null() {
    let service = create_test_service().await;

    let err = service
        .set(SystemConfigKey::TrashDays, Some(ConfigValue::from("thirty")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Codec {
            source: CodecError::KindMismatch { .. },
            ..
        }
    ));

    let err = service
        .set(SystemConfigKey::TrashEnabled, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Codec {
            source: CodecError::NullNotAllowed { .. },
            ..
        }
    ));

    assert!(service.store().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_to_base_value_removes_override() {
    let service = create_test_service().await;

    service
        .set(SystemConfigKey::TrashDays, Some(ConfigValue::from(10)))
        .await
        .unwrap();
    assert!(service.store().get("trash.days").await.unwrap().is_some());

    service
        .set(SystemConfigKey::TrashDays, Some(ConfigValue::from(30)))
        .await
        .unwrap();
    assert!(service.store().get("trash.days").await.unwrap().is_none());
}

#[tokio::test]
async fn test_reset() {
    let service = create_test_service().await;

    service
        .set(SystemConfigKey::OauthScope, Some(ConfigValue::from("openid")))
        .await
        .unwrap();
    assert_eq!(service.load().await.unwrap().oauth.scope, "openid");

    assert!(service.reset(SystemConfigKey::OauthScope).await.unwrap());
    assert!(!service.reset(SystemConfigKey::OauthScope).await.unwrap());
    assert_eq!(
        service.load().await.unwrap().oauth.scope,
        SystemConfig::default().oauth.scope
    );
}

#[tokio::test]
async fn test_prune_stale() {
    let service = create_test_service().await;
    service
        .store()
        .upsert(&row("legacy.removedSetting", Some("1")))
        .await
        .unwrap();
    service
        .store()
        .upsert(&row("library.watch.usePolling", Some("true")))
        .await
        .unwrap();
    service
        .set(SystemConfigKey::TrashDays, Some(ConfigValue::from(7)))
        .await
        .unwrap();

    let overrides = service.overrides().await.unwrap();
    assert_eq!(overrides.rejected.len(), 2);
    assert!(overrides
        .rejected
        .iter()
        .all(|r| r.problem == RowProblem::UnknownKey));

    let pruned = service.prune_stale().await.unwrap();
    assert_eq!(pruned, ["legacy.removedSetting", "library.watch.usePolling"]);

    let rows = service.store().list().await.unwrap();
    assert_eq!(rows, vec![row("trash.days", Some("7"))]);
    assert!(service.prune_stale().await.unwrap().is_empty());
}
