//! Lookup contract tests shared by every configuration source.
//!
//! Each source is backed by an in-memory store holding the single pair
//! `[s] a = 1`, and the same assertions run against all four kinds:
//! - case insensitivity
//! - absence vs. found, with and without `must_exist`
//! - `only_these_keys` short-circuit (no backend call)
//! - missing backend resource
//! - cache stability (one remote fetch per identity)
//!
//! These tests do not need cloud credentials.

use config_sources::backends::{
    MemoryObjectStore, MemoryParameterStore, MemoryRowStore, MemorySecretStore,
};
use config_sources::{
    ConfigKey, ConfigSource, ConfigSourceError, IniObjectConfig, IniObjectSource,
    ParameterStoreConfig, ParameterStoreSource, RowStoreConfig, RowStoreSource, SecretBlobConfig,
    SecretBlobSource, SourceOptions,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// =============================================================================
// FIXTURES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    IniObject,
    RowStore,
    SecretBlob,
    ParameterStore,
    ParameterStorePreloaded,
}

const ALL_KINDS: [Kind; 5] = [
    Kind::IniObject,
    Kind::RowStore,
    Kind::SecretBlob,
    Kind::ParameterStore,
    Kind::ParameterStorePreloaded,
];

/// A source plus a way to read how many remote fetches its backend served.
struct Fixture {
    source: Arc<dyn ConfigSource>,
    fetches: Box<dyn Fn() -> usize + Send + Sync>,
}

impl Fixture {
    fn fetches(&self) -> usize {
        (self.fetches)()
    }
}

/// Source logs show up with `RUST_LOG=config_sources=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn fixture(
    kind: Kind,
    options: SourceOptions,
    populated: bool,
) -> Result<Fixture, ConfigSourceError> {
    init_tracing();
    match kind {
        Kind::IniObject => {
            let mut store = MemoryObjectStore::new();
            if populated {
                store = store.with_object("test-bucket", "test-key", "\n[s]\na = 1\n");
            }
            let store = Arc::new(store);
            let config = IniObjectConfig::new("test-bucket", "test-key").with_options(options);
            let source = IniObjectSource::new(store.as_ref(), config).await?;
            Ok(Fixture {
                source: Arc::new(source),
                fetches: Box::new(move || store.calls()),
            })
        }
        Kind::RowStore => {
            let mut store = MemoryRowStore::new();
            if populated {
                store = store.with_row("test-table", "s", "a", "1");
            }
            let store = Arc::new(store);
            let config = RowStoreConfig::new("test-table")
                .with_attributes("section", "key", "value")
                .with_options(options);
            let source = RowStoreSource::new(store.clone(), config).await?;
            Ok(Fixture {
                source: Arc::new(source),
                fetches: Box::new(move || store.calls()),
            })
        }
        Kind::SecretBlob => {
            let mut store = MemorySecretStore::new();
            if populated {
                store = store.with_fields("test-prefix/s", [("a", "1")]);
            }
            let store = Arc::new(store);
            let config = SecretBlobConfig::new("test-prefix").with_options(options);
            let source = SecretBlobSource::new(store.clone(), config).await?;
            Ok(Fixture {
                source: Arc::new(source),
                fetches: Box::new(move || store.calls()),
            })
        }
        Kind::ParameterStore | Kind::ParameterStorePreloaded => {
            let mut store = MemoryParameterStore::new();
            if populated {
                store = store.with_parameter("/test-prefix/s/a", "1");
            }
            let store = Arc::new(store);
            let config = ParameterStoreConfig::new("/test-prefix")
                .batch_preload(kind == Kind::ParameterStorePreloaded)
                .with_options(options);
            let source = ParameterStoreSource::new(store.clone(), config).await?;
            let baseline = store.total_calls();
            Ok(Fixture {
                source: Arc::new(source),
                fetches: Box::new(move || store.total_calls() - baseline),
            })
        }
    }
}

async fn populated(kind: Kind, options: SourceOptions) -> Fixture {
    fixture(kind, options, true)
        .await
        .unwrap_or_else(|e| panic!("{kind:?}: construction failed: {e}"))
}

// =============================================================================
// LOOKUP CONTRACT
// =============================================================================

#[tokio::test]
async fn test_found_and_absent() {
    for kind in ALL_KINDS {
        let fixture = populated(kind, SourceOptions::new()).await;
        let source = &fixture.source;

        let value = source.get_config_value("s", "a").await.unwrap();
        assert_eq!(value.as_deref(), Some("1"), "{kind:?}");
        assert!(source.get_config_value("t", "a").await.unwrap().is_none(), "{kind:?}");
        assert!(source.get_config_value("s", "c").await.unwrap().is_none(), "{kind:?}");
    }
}

#[tokio::test]
async fn test_case_insensitive() {
    for kind in ALL_KINDS {
        let fixture = populated(kind, SourceOptions::new()).await;
        let source = &fixture.source;

        let upper = source.get_config_value("S", "A").await.unwrap();
        let lower = source.get_config_value("s", "a").await.unwrap();
        let mixed = source.get_config_value("S", "a").await.unwrap();
        assert_eq!(upper, lower, "{kind:?}");
        assert_eq!(mixed, lower, "{kind:?}");
    }
}

#[tokio::test]
async fn test_must_exist_enforced_at_lookup() {
    for kind in ALL_KINDS {
        let fixture = populated(kind, SourceOptions::new().must_exist(true)).await;
        let source = &fixture.source;

        let value = source.get_config_value("s", "a").await.unwrap();
        assert_eq!(value.as_deref(), Some("1"), "{kind:?}");
        for (section, key) in [("t", "a"), ("s", "c")] {
            let err = source.get_config_value(section, key).await.unwrap_err();
            assert!(err.is_key_not_found(), "{kind:?}: {err}");
        }
    }
}

#[tokio::test]
async fn test_filter_short_circuits_without_fetch() {
    for kind in ALL_KINDS {
        let strict = populated(
            kind,
            SourceOptions::new().must_exist(true).only_these_keys([("s", "a")]),
        )
        .await;
        let before = strict.fetches();
        let err = strict.source.get_config_value("s", "b").await.unwrap_err();
        assert!(err.is_key_not_found(), "{kind:?}: {err}");
        assert_eq!(strict.fetches(), before, "{kind:?} contacted the backend");

        let lenient = populated(kind, SourceOptions::new().only_these_keys([("s", "a")])).await;
        let before = lenient.fetches();
        assert!(lenient.source.get_config_value("s", "b").await.unwrap().is_none(), "{kind:?}");
        assert_eq!(lenient.fetches(), before, "{kind:?} contacted the backend");

        // The allowed key still resolves.
        assert_eq!(
            lenient.source.get_config_value("S", "A").await.unwrap().as_deref(),
            Some("1"),
            "{kind:?}"
        );
    }
}

#[tokio::test]
async fn test_filter_entries_in_any_case() {
    for kind in ALL_KINDS {
        let fixture = populated(kind, SourceOptions::new().only_these_keys([("S", "A")])).await;
        assert_eq!(
            fixture.source.get_config_value("s", "a").await.unwrap().as_deref(),
            Some("1"),
            "{kind:?}"
        );
    }
}

#[tokio::test]
async fn test_empty_filter_hides_everything() {
    for kind in ALL_KINDS {
        let lenient = populated(
            kind,
            SourceOptions::new().only_these_keys(Vec::<ConfigKey>::new()),
        )
        .await;
        assert!(lenient.source.get_config_value("s", "a").await.unwrap().is_none(), "{kind:?}");

        let strict = populated(
            kind,
            SourceOptions::new()
                .must_exist(true)
                .only_these_keys(Vec::<ConfigKey>::new()),
        )
        .await;
        let err = strict.source.get_config_value("s", "a").await.unwrap_err();
        assert!(err.is_key_not_found(), "{kind:?}: {err}");
    }
}

// =============================================================================
// LOCATOR VALIDATION
// =============================================================================

#[tokio::test]
async fn test_missing_locator_with_must_exist_fails_construction() {
    for kind in ALL_KINDS {
        let result = fixture(kind, SourceOptions::new().must_exist(true), false).await;
        match result {
            Err(err) => assert!(err.is_locator_unavailable(), "{kind:?}: {err}"),
            Ok(_) => panic!("{kind:?}: construction should fail"),
        }
    }
}

#[tokio::test]
async fn test_missing_locator_without_must_exist_returns_absent() {
    for kind in ALL_KINDS {
        let fixture = fixture(kind, SourceOptions::new(), false)
            .await
            .unwrap_or_else(|e| panic!("{kind:?}: {e}"));
        assert!(fixture.source.get_config_value("s", "a").await.unwrap().is_none(), "{kind:?}");
    }
}

// =============================================================================
// CACHING
// =============================================================================

#[tokio::test]
async fn test_repeated_lookups_fetch_once() {
    for kind in ALL_KINDS {
        let fixture = populated(kind, SourceOptions::new()).await;
        let source = &fixture.source;

        let first = source.get_config_value("s", "a").await.unwrap();
        let after_first = fixture.fetches();
        for _ in 0..10 {
            assert_eq!(source.get_config_value("S", "A").await.unwrap(), first, "{kind:?}");
        }
        assert_eq!(fixture.fetches(), after_first, "{kind:?} fetched again");
        assert!(after_first <= 1, "{kind:?} fetched {after_first} times");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_lookups_agree() {
    for kind in ALL_KINDS {
        let fixture = populated(kind, SourceOptions::new()).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let source = Arc::clone(&fixture.source);
            handles.push(tokio::spawn(async move {
                let section = if i % 2 == 0 { "s" } else { "S" };
                source.get_config_value(section, "a").await
            }));
        }

        for handle in handles {
            let value = handle.await.unwrap().unwrap();
            assert_eq!(value.as_deref(), Some("1"), "{kind:?}");
        }

        // Racing misses may each fetch, but the answer is cached afterwards.
        let settled = fixture.fetches();
        fixture.source.get_config_value("s", "a").await.unwrap();
        assert_eq!(fixture.fetches(), settled, "{kind:?}");
    }
}
