//! Integration tests for scoped working directory and environment changes.
//!
//! Every test here changes the process working directory or environment,
//! so all of them run with `#[serial]`.

mod common;

use std::env;
use std::fs;
use std::panic::{self, AssertUnwindSafe};

use common::{no_keywords, Tree};
use serde_json::json;
use serial_test::serial;
use workdir::{Error, ProcessContext, Recursion, WorkDir};

// ============================================================================
// Working directory
// ============================================================================

#[test]
#[serial]
fn test_nested_handles_restore_in_order() {
    let tree = Tree::new();
    let a = WorkDir::new(tree.dir("a")).unwrap();
    let b = WorkDir::new(tree.dir("b")).unwrap();
    let original = env::current_dir().unwrap();

    let outer = a.enter().unwrap();
    assert_eq!(env::current_dir().unwrap(), a.path());

    let inner = b.enter().unwrap();
    assert_eq!(env::current_dir().unwrap(), b.path());
    assert_eq!(ProcessContext::depth(), 2);

    inner.exit().unwrap();
    assert_eq!(env::current_dir().unwrap(), a.path());

    outer.exit().unwrap();
    assert_eq!(env::current_dir().unwrap(), original);
    assert_eq!(ProcessContext::depth(), 0);
}

#[test]
#[serial]
fn test_same_handle_nested() {
    let tree = Tree::new();
    let wd = WorkDir::new(tree.path()).unwrap();
    let original = env::current_dir().unwrap();

    let outer = wd.enter().unwrap();
    {
        let _inner = wd.enter().unwrap();
        assert_eq!(env::current_dir().unwrap(), wd.path());
    }
    assert_eq!(env::current_dir().unwrap(), wd.path());
    outer.exit().unwrap();

    assert_eq!(env::current_dir().unwrap(), original);
}

#[test]
#[serial]
fn test_relative_paths_resolve_inside_scope() {
    let tree = Tree::new();
    let wd = WorkDir::new(tree.path()).unwrap();

    wd.scoped(|_| Ok::<_, Error>(fs::write("created.txt", "inside")?))
        .unwrap();

    assert_eq!(fs::read_to_string(wd.join("created.txt")).unwrap(), "inside");
}

#[test]
#[serial]
fn test_panic_inside_scope_restores() {
    let tree = Tree::new();
    let wd = WorkDir::new(tree.path()).unwrap();
    let original = env::current_dir().unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = wd.enter().unwrap();
        panic!("boom");
    }));

    assert!(result.is_err());
    assert_eq!(env::current_dir().unwrap(), original);
    assert_eq!(ProcessContext::depth(), 0);
}

#[test]
#[serial]
fn test_construction_leaves_process_state_alone() {
    env::remove_var("WORKDIR_TEST_BUILD");
    let tree = Tree::new();
    tree.write("workdir.yml", "environment:\n  WORKDIR_TEST_BUILD: yes-please\n");
    tree.write(
        "workdir.js",
        "export function stage(workdir) { return workdir.environment.WORKDIR_TEST_BUILD; }\n",
    );
    let original = env::current_dir().unwrap();

    let wd = WorkDir::builder(tree.path())
        .script_recursion(Recursion::Levels(0))
        .config_recursion(Recursion::Levels(0))
        .build()
        .unwrap();

    assert_eq!(env::current_dir().unwrap(), original);
    assert!(env::var("WORKDIR_TEST_BUILD").is_err());
    assert_eq!(ProcessContext::depth(), 0);
    assert_eq!(wd.environment()["WORKDIR_TEST_BUILD"], "yes-please");
}

#[test]
#[serial]
fn test_len_returns_after_create_and_delete() {
    let tree = Tree::new();
    let wd = WorkDir::new(tree.path()).unwrap();
    let before = wd.len().unwrap();

    fs::write(&wd / "scratch.txt", "tmp").unwrap();
    assert_eq!(wd.len().unwrap(), before + 1);

    fs::remove_file(&wd / "scratch.txt").unwrap();
    assert_eq!(wd.len().unwrap(), before);
}

#[test]
#[serial]
fn test_unsettable_config_environment_fails_construction() {
    let tree = Tree::new();
    tree.write("workdir.yml", "environment:\n  \"A=B\": x\n");
    let original = env::current_dir().unwrap();

    let err = WorkDir::builder(tree.path())
        .config_recursion(Recursion::Levels(0))
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::ConfigParse { .. }));
    assert_eq!(env::current_dir().unwrap(), original);
    assert_eq!(ProcessContext::depth(), 0);
}

// ============================================================================
// Environment overlay
// ============================================================================

#[test]
#[serial]
fn test_env_overlay_previously_absent() {
    env::remove_var("WORKDIR_TEST_FOO");
    let tree = Tree::new();
    let wd = WorkDir::builder(tree.path())
        .env("WORKDIR_TEST_FOO", "BAR")
        .build()
        .unwrap();

    let inside = wd
        .scoped(|_| Ok::<_, Error>(env::var("WORKDIR_TEST_FOO").ok()))
        .unwrap();

    assert_eq!(inside.as_deref(), Some("BAR"));
    assert!(env::var("WORKDIR_TEST_FOO").is_err());
}

#[test]
#[serial]
fn test_env_overlay_previously_present() {
    env::set_var("WORKDIR_TEST_FOO", "OLD");
    let tree = Tree::new();
    let wd = WorkDir::builder(tree.path())
        .env("WORKDIR_TEST_FOO", "BAR")
        .build()
        .unwrap();

    {
        let _scope = wd.enter().unwrap();
        assert_eq!(env::var("WORKDIR_TEST_FOO").unwrap(), "BAR");
    }

    assert_eq!(env::var("WORKDIR_TEST_FOO").unwrap(), "OLD");
    env::remove_var("WORKDIR_TEST_FOO");
}

#[test]
#[serial]
fn test_config_environment_is_stringified() {
    let tree = Tree::new();
    tree.write(
        "workdir.yml",
        "environment:\n  WORKDIR_TEST_NUM: 5\n  WORKDIR_TEST_FLAG: true\n",
    );
    let wd = WorkDir::builder(tree.path())
        .config_recursion(Recursion::Levels(0))
        .build()
        .unwrap();

    let scope = wd.enter().unwrap();
    assert_eq!(env::var("WORKDIR_TEST_NUM").unwrap(), "5");
    assert_eq!(env::var("WORKDIR_TEST_FLAG").unwrap(), "true");
    scope.exit().unwrap();

    assert!(env::var("WORKDIR_TEST_NUM").is_err());
}

#[test]
#[serial]
fn test_script_sees_overlay_only_inside_scope() {
    env::remove_var("WORKDIR_TEST_MODE");
    let tree = Tree::new();
    tree.write(
        "workdir.js",
        "export function mode() { return getenv('WORKDIR_TEST_MODE') ?? null; }\n",
    );
    let wd = WorkDir::builder(tree.path())
        .script_recursion(Recursion::Levels(0))
        .env("WORKDIR_TEST_MODE", "ci")
        .build()
        .unwrap();

    let inside = wd
        .scoped(|wd| wd.call("mode", vec![], no_keywords()))
        .unwrap();
    assert_eq!(inside, json!("ci"));

    let outside = wd.call("mode", vec![], no_keywords()).unwrap();
    assert_eq!(outside, json!(null));
}

// ============================================================================
// Errors inside a scope
// ============================================================================

#[test]
#[serial]
fn test_scoped_error_is_returned_unchanged_and_logged() {
    let tree = Tree::new();
    let wd = WorkDir::builder(tree.path())
        .console_level(log::LevelFilter::Off)
        .build()
        .unwrap();
    let original = env::current_dir().unwrap();

    // Opens the log sink.
    wd.log("starting", log::Level::Info).unwrap();

    let err = wd
        .scoped(|wd| wd.call("does_not_exist", vec![], no_keywords()))
        .unwrap_err();

    assert!(matches!(err, Error::MemberNotFound { ref name } if name == "does_not_exist"));
    assert_eq!(env::current_dir().unwrap(), original);

    let log = fs::read_to_string(wd.log_file()).unwrap();
    assert!(log.contains(" - ERROR - no member named 'does_not_exist'"));
}

#[test]
#[serial]
fn test_scoped_error_without_sink_creates_no_log() {
    let tree = Tree::new();
    let wd = WorkDir::new(tree.path()).unwrap();

    let result = wd.scoped(|wd| wd.call("missing", vec![], no_keywords()));

    assert!(result.is_err());
    assert!(!wd.log_file().exists());
}
