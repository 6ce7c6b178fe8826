use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use scatter::{Config, ExecuteError, OverridableConfig, Shards, WorkQueue};

fn load_config(yaml: &str) -> (tempfile::TempDir, Config) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("config.yml"), yaml).unwrap();
    let config = Config::from_path(dir.path()).unwrap();
    (dir, config)
}

#[derive(Debug, PartialEq)]
struct RowCountError(&'static str);

impl std::fmt::Display for RowCountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "shard {} is unavailable", self.0)
    }
}

impl std::error::Error for RowCountError {}

#[test]
fn test_fan_out_over_configured_shards() {
    let (_dir, config) = load_config(
        r#"
shards:
  aliases: [eu, us, ap]
executor:
  max_workers: 2
  thread_name: shard
logging:
  level: trace
  format: simplified
"#,
    );

    scatter::init(&config);
    scatter::dump_config_infos(&config);

    let rows: HashMap<&str, u64> = [("eu", 10), ("us", 32), ("ap", 7)].into_iter().collect();
    let shards = Shards::from_config(&config);

    let mut counts = shards
        .dispatch(|alias, rows| Ok::<_, RowCountError>(rows[alias]), &rows)
        .unwrap();

    counts.sort_unstable();
    assert_eq!(counts, [7, 10, 32]);
}

#[test]
fn test_override_shards_and_fail_one() {
    let (_dir, mut config) = load_config("shards:\n  aliases: [default]\n");
    config
        .apply_override(OverridableConfig {
            shards: Some("default,replica,archive".to_owned()),
            max_workers: Some("1".to_owned()),
            log_level: None,
        })
        .unwrap();

    let shards = Shards::from_config(&config);
    assert_eq!(shards.len(), 3);

    let result = shards.dispatch(
        |alias, _: &()| match alias {
            "archive" => Err(RowCountError("archive")),
            _ => Ok(()),
        },
        &(),
    );

    match result {
        Err(ExecuteError::Worker(error)) => {
            assert_eq!(error, RowCountError("archive"));
            assert_eq!(error.to_string(), "shard archive is unavailable");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_execute_many_items_with_capped_workers() {
    let counter = AtomicUsize::new(0);
    let processed = Mutex::new(vec![0u8; 1000]);
    let queue = WorkQueue::new(0..1000usize);

    let results = scatter::execute(
        |id| {
            counter.fetch_add(1, Ordering::SeqCst);
            processed.lock()[id] += 1;
            Ok::<_, RowCountError>(id)
        },
        &queue,
        Some(4),
    )
    .unwrap();

    assert_eq!(results.len(), 1000);
    assert_eq!(counter.load(Ordering::SeqCst), 1000);
    assert!(processed.into_inner().iter().all(|&n| n == 1));
    assert_eq!(queue.taken(), queue.enqueued());
}
