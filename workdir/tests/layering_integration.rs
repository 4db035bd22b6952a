//! Integration tests for layered discovery.
//!
//! A handle for `parent/child` sees customization files in both
//! directories. Definitions closer to the handle override those further
//! up, and the registry records the file each surviving definition came
//! from.

mod common;

use common::{no_keywords, Tree};
use serde_json::json;
use workdir::{Recursion, WorkDir};

fn parent_and_child() -> Tree {
    let tree = Tree::new();
    tree.write(
        "parent/workdir.yml",
        "attributes:\n  only_parent: p\n  shared: parent\n\
         environment:\n  LAYER: parent\n  PARENT_ONLY: true\n\
         commands:\n  hello: echo parent // From parent\n  bye: echo bye\n",
    );
    tree.write(
        "parent/child/workdir.yml",
        "attributes:\n  shared: child\n\
         environment:\n  LAYER: child\n\
         commands:\n  hello: echo child // From child\n",
    );
    tree
}

#[test]
fn test_child_overrides_parent() {
    let tree = parent_and_child();
    let wd = WorkDir::builder(tree.path().join("parent/child"))
        .config_recursion(Recursion::Levels(1))
        .build()
        .unwrap();

    assert_eq!(wd.value("shared"), Some(&json!("child")));
    assert_eq!(wd.value("only_parent"), Some(&json!("p")));

    let attributes = wd.attributes();
    assert_eq!(
        attributes.source_of("shared"),
        Some(tree.path().join("parent/child/workdir.yml").as_path())
    );
    assert_eq!(
        attributes.source_of("only_parent"),
        Some(tree.path().join("parent/workdir.yml").as_path())
    );
}

#[test]
fn test_environment_and_commands_layer() {
    let tree = parent_and_child();
    let wd = WorkDir::builder(tree.path().join("parent/child"))
        .config_recursion(Recursion::Levels(1))
        .build()
        .unwrap();

    assert_eq!(wd.environment()["LAYER"], "child");
    assert_eq!(wd.environment()["PARENT_ONLY"], "true");

    let hello = &wd.commands()["hello"];
    assert_eq!(hello.command(), "echo child");
    assert_eq!(hello.description(), "From child");
    assert_eq!(wd.commands()["bye"].description(), "");
}

#[test]
fn test_recursion_zero_ignores_parent() {
    let tree = parent_and_child();
    let wd = WorkDir::builder(tree.path().join("parent/child"))
        .config_recursion(Recursion::Levels(0))
        .build()
        .unwrap();

    assert_eq!(wd.value("shared"), Some(&json!("child")));
    assert!(wd.member("only_parent").is_none());
    assert_eq!(wd.config_files().len(), 1);
}

#[test]
fn test_one_level_stops_below_grandparent() {
    let tree = Tree::new();
    for (dir, layer) in [("top", "top"), ("top/mid", "mid"), ("top/mid/leaf", "leaf")] {
        tree.write(
            &format!("{dir}/workdir.yml"),
            &format!("attributes:\n  from_{layer}: {layer}\n"),
        );
        tree.write(
            &format!("{dir}/workdir.js"),
            &format!("export function {layer}_fn() {{ return '{layer}'; }}\n"),
        );
    }

    let wd = WorkDir::builder(tree.path().join("top/mid/leaf"))
        .script_recursion(Recursion::Levels(1))
        .config_recursion(Recursion::Levels(1))
        .build()
        .unwrap();

    assert_eq!(wd.script_files().len(), 2);
    assert_eq!(wd.config_files().len(), 2);
    assert_eq!(wd.value("from_leaf"), Some(&json!("leaf")));
    assert_eq!(wd.value("from_mid"), Some(&json!("mid")));
    assert!(wd.member("from_top").is_none());
    assert!(wd.is_callable("mid_fn"));
    assert!(wd.member("top_fn").is_none());
    let top = tree.path().join("top");
    assert!(wd
        .attributes()
        .iter()
        .all(|(_, source)| source.parent() != Some(top.as_path())));
}

#[test]
fn test_unbounded_recursion_reaches_parent() {
    let tree = parent_and_child();
    let wd = WorkDir::builder(tree.path().join("parent/child"))
        .config_recursion(Recursion::from(-1))
        .build()
        .unwrap();

    assert_eq!(wd.value("only_parent"), Some(&json!("p")));
    assert_eq!(
        wd.config_files().last().unwrap(),
        &wd.join("workdir.yml")
    );
    assert!(wd.config_files().len() > 2);
}

#[test]
fn test_config_overrides_script_of_same_name() {
    let tree = Tree::new();
    tree.write("workdir.js", "export const setting = 'script';\n");
    tree.write("workdir.yml", "attributes:\n  setting: config\n");

    let wd = WorkDir::builder(tree.path())
        .script_recursion(Recursion::Levels(0))
        .config_recursion(Recursion::Levels(0))
        .build()
        .unwrap();

    assert_eq!(wd.value("setting"), Some(&json!("config")));
    assert_eq!(
        wd.attributes().source_of("setting"),
        Some(wd.join("workdir.yml").as_path())
    );
}

#[test]
fn test_child_script_overrides_parent_function() {
    let tree = Tree::new();
    tree.write("workdir.js", "export function greet() { return 'parent'; }\n");
    tree.write(
        "child/workdir.js",
        "export function greet() { return 'child'; }\n",
    );

    let parent = WorkDir::builder(tree.path())
        .script_recursion(Recursion::Levels(0))
        .build()
        .unwrap();
    let child = WorkDir::builder(tree.path().join("child"))
        .script_recursion(Recursion::Levels(1))
        .build()
        .unwrap();

    assert_eq!(parent.call("greet", vec![], no_keywords()).unwrap(), json!("parent"));
    assert_eq!(child.call("greet", vec![], no_keywords()).unwrap(), json!("child"));
    assert_eq!(
        child.attributes().source_of("greet"),
        Some(tree.path().join("child/workdir.js").as_path())
    );
}

#[test]
fn test_here_is_defining_directory() {
    let tree = Tree::new();
    tree.write(
        "workdir.js",
        "export function where(here) { return here; }\n",
    );
    tree.dir("child");

    let wd = WorkDir::builder(tree.path().join("child"))
        .script_recursion(Recursion::Levels(1))
        .build()
        .unwrap();

    let here = wd.call("where", vec![], no_keywords()).unwrap();
    assert_eq!(here, json!(tree.path().display().to_string()));
}

#[test]
fn test_custom_file_names() {
    let tree = Tree::new();
    tree.write("tasks.yml", "attributes:\n  from_tasks: 1\n");
    tree.write("workdir.yml", "attributes:\n  from_default: 1\n");

    let wd = WorkDir::builder(tree.path())
        .config_files(["tasks.yml"])
        .config_recursion(Recursion::Levels(0))
        .build()
        .unwrap();

    assert!(wd.member("from_tasks").is_some());
    assert!(wd.member("from_default").is_none());
}
