//! Tests for Engine
//!
//! These tests verify:
//! - Command execution and the responses it produces
//! - SET/GET/DEL semantics (no overwrite, NOTFOUND, repeat DEL)
//! - Storage root bootstrap on open and per request
//! - Storage failures stay scoped to one request
//! - Concurrent SETs of one key produce exactly one winner

use std::fs;
use std::sync::Arc;
use std::thread;

use dirkv::config::Config;
use dirkv::engine::Engine;
use dirkv::protocol::{Command, Response, Status, INTERNAL_ERROR};
use dirkv::storage::Key;
use dirkv::DirKvError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_root(temp_dir.path().join("db"))
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn set(engine: &Engine, key: &str, value: &'static str) -> Response {
    engine.execute(Command::set(key, value).unwrap())
}

fn get(engine: &Engine, key: &str) -> Response {
    engine.execute(Command::get(key).unwrap())
}

fn del(engine: &Engine, key: &str) -> Response {
    engine.execute(Command::del(key).unwrap())
}

fn key(s: &str) -> Key {
    Key::parse(s.as_bytes()).unwrap()
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_open_creates_storage_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("mydb");

    let config = Config::builder().storage_root(&root).build();
    let engine = Engine::open(config).unwrap();

    assert!(root.is_dir());
    assert_eq!(engine.storage_root(), root.as_path());
    assert_eq!(engine.record_count().unwrap(), 0);
}

#[test]
fn test_engine_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .storage_root(temp_dir.path())
        .max_value_len(200)
        .max_message_len(128)
        .build();

    assert!(matches!(Engine::open(config), Err(DirKvError::Config(_))));
}

#[test]
fn test_engine_open_path() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(&temp_dir.path().join("db")).unwrap();

    assert_eq!(engine.max_value_len(), 100);
}

#[test]
fn test_engine_reopen_sees_records() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("db");

    {
        let engine = Engine::open_path(&root).unwrap();
        assert_eq!(set(&engine, "manzana", "apple"), Response::ok(None));
    }

    let engine = Engine::open_path(&root).unwrap();
    assert_eq!(engine.record_count().unwrap(), 1);
    assert_eq!(get(&engine, "manzana"), Response::ok(Some("apple".into())));
}

#[test]
fn test_storage_root_recreated_per_request() {
    let (_temp, engine) = setup_temp_engine();
    fs::remove_dir_all(engine.storage_root()).unwrap();

    assert_eq!(set(&engine, "perro", "dog"), Response::ok(None));
    assert!(engine.storage_root().join("perro").is_file());
}

// =============================================================================
// Command Semantics
// =============================================================================

#[test]
fn test_set_then_get() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(set(&engine, "perro", "dog"), Response::ok(None));
    assert_eq!(get(&engine, "perro"), Response::ok(Some("dog".into())));
}

#[test]
fn test_set_existing_is_already_set() {
    let (_temp, engine) = setup_temp_engine();
    set(&engine, "perro", "dog");

    assert_eq!(set(&engine, "perro", "cat"), Response::already_set());
    assert_eq!(get(&engine, "perro"), Response::ok(Some("dog".into())));
}

#[test]
fn test_get_missing_is_not_found() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(get(&engine, "casa"), Response::not_found());
}

#[test]
fn test_del_then_get() {
    let (_temp, engine) = setup_temp_engine();
    set(&engine, "perro", "dog");

    assert_eq!(del(&engine, "perro"), Response::ok(None));
    assert_eq!(get(&engine, "perro"), Response::not_found());
}

#[test]
fn test_del_missing_is_not_found() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(del(&engine, "casa"), Response::not_found());
}

#[test]
fn test_repeated_del() {
    let (_temp, engine) = setup_temp_engine();
    set(&engine, "perro", "dog");

    assert_eq!(del(&engine, "perro"), Response::ok(None));
    assert_eq!(del(&engine, "perro"), Response::not_found());
    assert_eq!(del(&engine, "perro"), Response::not_found());
}

#[test]
fn test_scenario() {
    let (_temp, engine) = setup_temp_engine();

    assert_eq!(set(&engine, "manzana", "apple"), Response::ok(None));
    assert_eq!(set(&engine, "perro", "dog"), Response::ok(None));
    assert_eq!(get(&engine, "perro"), Response::ok(Some("dog".into())));
    assert_eq!(get(&engine, "casa"), Response::not_found());
    assert_eq!(del(&engine, "perro"), Response::ok(None));
    assert_eq!(get(&engine, "perro"), Response::not_found());
    assert_eq!(get(&engine, "manzana"), Response::ok(Some("apple".into())));
}

#[test]
fn test_typed_api() {
    let (_temp, engine) = setup_temp_engine();

    engine.set(&key("hola"), b"hello").unwrap();
    assert!(matches!(
        engine.set(&key("hola"), b"again"),
        Err(DirKvError::KeyExists)
    ));
    assert_eq!(engine.get(&key("hola")).unwrap().as_ref(), b"hello");
    engine.delete(&key("hola")).unwrap();
    assert!(matches!(engine.get(&key("hola")), Err(DirKvError::KeyNotFound)));
    assert!(matches!(engine.delete(&key("hola")), Err(DirKvError::KeyNotFound)));
}

// =============================================================================
// Failure Handling
// =============================================================================

#[test]
fn test_oversized_record_reports_error() {
    let (_temp, engine) = setup_temp_engine();
    fs::write(engine.storage_root().join("huge"), vec![b'z'; 1000]).unwrap();

    let response = get(&engine, "huge");

    assert_eq!(response, Response::error("value too large."));
}

#[test]
fn test_unreadable_record_is_internal_error() {
    let (_temp, engine) = setup_temp_engine();
    // A directory where a record file should be: exists, but cannot be read
    fs::create_dir(engine.storage_root().join("weird")).unwrap();

    let response = get(&engine, "weird");

    assert_eq!(response.status, Status::Error);
    assert_eq!(response.payload.as_deref(), Some(INTERNAL_ERROR.as_bytes()));

    // The engine keeps serving
    assert_eq!(set(&engine, "fine", "ok"), Response::ok(None));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_set_same_key_single_winner() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let value = format!("v{}", i);
                engine.execute(Command::set("contended", value).unwrap())
            })
        })
        .collect();

    let responses: Vec<Response> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = responses.iter().filter(|r| r.status == Status::Ok).count();
    let losers = responses
        .iter()
        .filter(|r| r.status == Status::AlreadySet)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(losers, 15);
    assert_eq!(engine.record_count().unwrap(), 1);
}

#[test]
fn test_concurrent_distinct_keys() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for j in 0..10 {
                    let k = format!("k{}_{}", i, j);
                    let response = engine.execute(Command::set(&k, format!("{}", j)).unwrap());
                    assert_eq!(response, Response::ok(None));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.record_count().unwrap(), 80);
}
