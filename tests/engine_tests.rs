//! Engine Tests
//!
//! Covers:
//! - Command execution and replies
//! - Which commands reach the log
//! - Rebuilding state by replaying the log on open

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use respkv::{Config, Engine, KvError, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_aof() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let aof_path = temp_dir.path().join("appendonly.aof");
    (temp_dir, aof_path)
}

fn open_engine(path: &Path) -> Engine {
    Engine::open_path(path).unwrap()
}

fn exec(engine: &Engine, parts: &[&str]) -> Value {
    engine.execute(&Value::command(parts.iter().map(|p| p.to_string())))
}

fn assert_error_starts_with(reply: &Value, prefix: &str) {
    match reply {
        Value::Error(msg) => assert!(
            msg.starts_with(prefix.as_bytes()),
            "unexpected error text: {}",
            String::from_utf8_lossy(msg)
        ),
        other => panic!("Expected error reply, got {:?}", other),
    }
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_set_and_get() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_eq!(exec(&engine, &["SET", "foo", "bar"]), Value::ok());
    assert_eq!(exec(&engine, &["GET", "foo"]), Value::bulk("bar"));
    assert_eq!(exec(&engine, &["GET", "missing"]), Value::Null);
}

#[test]
fn test_del_exists_dbsize() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    exec(&engine, &["SET", "a", "1"]);
    exec(&engine, &["SET", "b", "2"]);

    assert_eq!(exec(&engine, &["EXISTS", "a", "b", "c"]), Value::Integer(2));
    assert_eq!(exec(&engine, &["DBSIZE"]), Value::Integer(2));
    assert_eq!(exec(&engine, &["DEL", "a", "c"]), Value::Integer(1));
    assert_eq!(exec(&engine, &["EXISTS", "a"]), Value::Integer(0));
    assert_eq!(exec(&engine, &["DBSIZE"]), Value::Integer(1));
}

#[test]
fn test_ping_and_echo() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_eq!(exec(&engine, &["PING"]), Value::simple("PONG"));
    assert_eq!(exec(&engine, &["ping", "hi"]), Value::bulk("hi"));
    assert_eq!(exec(&engine, &["ECHO", "hello world"]), Value::bulk("hello world"));
}

#[test]
fn test_command_names_ignore_case() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_eq!(exec(&engine, &["set", "k", "v"]), Value::ok());
    assert_eq!(exec(&engine, &["GeT", "k"]), Value::bulk("v"));
}

#[test]
fn test_binary_safe_values() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    let value = b"line1\r\nline2\x00\xff".to_vec();
    let reply = engine.execute(&Value::array(vec![
        Value::bulk("SET"),
        Value::bulk("bin"),
        Value::bulk(value.clone()),
    ]));
    assert_eq!(reply, Value::ok());
    assert_eq!(exec(&engine, &["GET", "bin"]), Value::bulk(value));
}

#[test]
fn test_shutdown_sets_flag_without_logging() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);
    let stats = engine.aof_stats().unwrap();

    assert!(!engine.shutdown_requested());
    assert_eq!(exec(&engine, &["PING"]), Value::simple("PONG"));
    assert!(!engine.shutdown_requested());

    assert_eq!(exec(&engine, &["shutdown"]), Value::ok());
    assert!(engine.shutdown_requested());
    assert_eq!(stats.appends(), 0);
}

#[test]
fn test_shutdown_with_args_is_rejected() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_error_starts_with(&exec(&engine, &["SHUTDOWN", "NOSAVE"]), "ERR wrong number");
    assert!(!engine.shutdown_requested());
}

// =============================================================================
// Error Replies
// =============================================================================

#[test]
fn test_unknown_command() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_error_starts_with(&exec(&engine, &["FLUSHALL"]), "ERR unknown command");
}

#[test]
fn test_wrong_arg_count() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_error_starts_with(
        &exec(&engine, &["SET", "only-key"]),
        "ERR wrong number of arguments for 'set'",
    );
    assert_error_starts_with(&exec(&engine, &["GET"]), "ERR wrong number");
}

#[test]
fn test_non_array_request() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    assert_error_starts_with(&engine.execute(&Value::Integer(1)), "ERR invalid request");
}

// =============================================================================
// Logging Behaviour
// =============================================================================

#[test]
fn test_only_valid_writes_are_logged() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);
    let stats = engine.aof_stats().unwrap();

    exec(&engine, &["GET", "k"]);
    exec(&engine, &["PING"]);
    exec(&engine, &["SET", "k"]);
    exec(&engine, &["NOPE"]);
    assert_eq!(stats.appends(), 0);

    exec(&engine, &["SET", "k", "v"]);
    exec(&engine, &["DEL", "k"]);
    assert_eq!(stats.appends(), 2);
}

#[test]
fn test_log_holds_canonical_commands() {
    let (_temp, aof_path) = setup_temp_aof();
    let engine = open_engine(&aof_path);

    engine.execute(&Value::array(vec![
        Value::simple("set"),
        Value::bulk("foo"),
        Value::bulk("bar"),
    ]));
    engine.close().unwrap();

    assert_eq!(
        fs::read(&aof_path).unwrap(),
        b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n"
    );
}

#[test]
fn test_appendonly_disabled() {
    let (_temp, aof_path) = setup_temp_aof();
    let config = Config::builder()
        .aof_path(&aof_path)
        .appendonly(false)
        .build();
    let engine = Engine::open(config).unwrap();

    assert_eq!(exec(&engine, &["SET", "k", "v"]), Value::ok());
    assert!(engine.aof_stats().is_none());
    engine.close().unwrap();

    assert!(!aof_path.exists());
}

// =============================================================================
// Replay on Open
// =============================================================================

#[test]
fn test_last_write_wins_after_restart() {
    let (_temp, aof_path) = setup_temp_aof();

    {
        let engine = open_engine(&aof_path);
        exec(&engine, &["SET", "foo", "bar"]);
        exec(&engine, &["SET", "foo", "baz"]);
        engine.close().unwrap();
    }

    let engine = open_engine(&aof_path);
    assert_eq!(exec(&engine, &["GET", "foo"]), Value::bulk("baz"));
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn test_deletes_are_replayed() {
    let (_temp, aof_path) = setup_temp_aof();

    {
        let engine = open_engine(&aof_path);
        exec(&engine, &["SET", "a", "1"]);
        exec(&engine, &["SET", "b", "2"]);
        exec(&engine, &["DEL", "a"]);
        engine.close().unwrap();
    }

    let engine = open_engine(&aof_path);
    assert_eq!(exec(&engine, &["GET", "a"]), Value::Null);
    assert_eq!(exec(&engine, &["GET", "b"]), Value::bulk("2"));
}

#[test]
fn test_replay_is_deterministic() {
    let (temp, aof_path) = setup_temp_aof();

    {
        let engine = open_engine(&aof_path);
        for i in 0..100 {
            exec(&engine, &["SET", &format!("k{}", i % 17), &i.to_string()]);
            if i % 5 == 0 {
                exec(&engine, &["DEL", &format!("k{}", i % 13)]);
            }
        }
        engine.close().unwrap();
    }

    let copy_path = temp.path().join("copy.aof");
    fs::copy(&aof_path, &copy_path).unwrap();

    let first = open_engine(&aof_path);
    let second = open_engine(&copy_path);
    assert_eq!(first.store().snapshot(), second.store().snapshot());
    assert!(!first.store().is_empty());
}

#[test]
fn test_restart_keeps_appending() {
    let (_temp, aof_path) = setup_temp_aof();

    for round in 0..3 {
        let engine = open_engine(&aof_path);
        assert_eq!(engine.store().len(), round);
        exec(&engine, &["SET", &format!("key{}", round), "v"]);
        engine.close().unwrap();
    }

    let engine = open_engine(&aof_path);
    assert_eq!(engine.store().len(), 3);
}

#[test]
fn test_read_commands_in_log_are_not_executed() {
    let (_temp, aof_path) = setup_temp_aof();
    fs::write(
        &aof_path,
        b"*3\r\n$3\r\nset\r\n$1\r\nk\r\n$1\r\nv\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n*1\r\n$4\r\nPING\r\n",
    )
    .unwrap();

    let engine = open_engine(&aof_path);
    assert_eq!(exec(&engine, &["GET", "k"]), Value::bulk("v"));
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn test_truncated_log_fails_open() {
    let (_temp, aof_path) = setup_temp_aof();
    fs::write(&aof_path, b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$10\r\nshort").unwrap();

    let result = Engine::open_path(&aof_path);
    assert!(matches!(result, Err(KvError::Protocol { .. })));
}

#[test]
fn test_non_command_record_fails_open() {
    let (_temp, aof_path) = setup_temp_aof();
    fs::write(&aof_path, b":42\r\n").unwrap();

    let result = Engine::open_path(&aof_path);
    assert!(matches!(result, Err(KvError::AofCorruption(_))));
}

#[test]
fn test_unknown_command_in_log_fails_open() {
    let (_temp, aof_path) = setup_temp_aof();
    fs::write(&aof_path, b"*1\r\n$8\r\nFLUSHALL\r\n").unwrap();

    let result = Engine::open_path(&aof_path);
    assert!(matches!(result, Err(KvError::AofCorruption(_))));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_zero_sync_interval_rejected() {
    let (_temp, aof_path) = setup_temp_aof();
    let config = Config::builder()
        .aof_path(&aof_path)
        .sync_interval(Duration::ZERO)
        .build();

    assert!(matches!(Engine::open(config), Err(KvError::Config(_))));
}

#[test]
fn test_creates_parent_directory() {
    let (temp, _) = setup_temp_aof();
    let aof_path = temp.path().join("nested/dir/appendonly.aof");

    let engine = open_engine(&aof_path);
    exec(&engine, &["SET", "k", "v"]);
    engine.sync().unwrap();

    assert!(aof_path.exists());
    assert!(fs::metadata(&aof_path).unwrap().len() > 0);
}
