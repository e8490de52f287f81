#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn rigging(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rigging").unwrap();
    cmd.current_dir(dir.path()).env("RIGGING_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    rigging(dir).arg("init").assert().success();
}

fn write_blueprint(dir: &TempDir, body: &str) -> PathBuf {
    let bp = dir.path().join("blueprint");
    std::fs::create_dir_all(&bp).unwrap();
    std::fs::write(bp.join("blueprint.yaml"), body).unwrap();
    bp
}

fn empty_blueprint(dir: &TempDir) -> PathBuf {
    write_blueprint(
        dir,
        "apiVersion: landscaper.gardener.cloud/v1alpha1\nkind: Blueprint\n",
    )
}

fn data_object_files(root: &Path, namespace: &str) -> usize {
    std::fs::read_dir(root.join(".rigging/dataobjects").join(namespace))
        .map(|d| d.count())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// rigging init / config
// ---------------------------------------------------------------------------

#[test]
fn init_creates_layout() {
    let dir = TempDir::new().unwrap();
    rigging(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .rigging/config.yaml"));

    assert!(dir.path().join(".rigging/config.yaml").exists());
    assert!(dir.path().join(".rigging/executions").is_dir());
    assert!(dir.path().join(".rigging/dataobjects").is_dir());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    rigging(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:"));
}

#[test]
fn config_validate_requires_init() {
    let dir = TempDir::new().unwrap();
    rigging(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));

    init_project(&dir);
    rigging(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_bad_namespace() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".rigging/config.yaml"),
        "project:\n  name: demo\nnamespace: Bad Namespace\n",
    )
    .unwrap();
    rigging(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] namespace"));
}

// ---------------------------------------------------------------------------
// rigging blueprint add-deployitem
// ---------------------------------------------------------------------------

#[test]
fn add_deployitem_then_render() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let bp = empty_blueprint(&dir);
    std::fs::write(
        dir.path().join("nginx.yaml"),
        "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: web\n",
    )
    .unwrap();

    rigging(&dir)
        .args(["blueprint", "add-deployitem", "nginx", "--blueprint"])
        .arg(&bp)
        .args(["--cluster-param", "cluster", "--import-param", "replicas:integer"])
        .args(["--manifest-file", "nginx.yaml"])
        .assert()
        .success();

    assert!(bp.join("deploy-execution-nginx.yaml").exists());
    let blueprint = std::fs::read_to_string(bp.join("blueprint.yaml")).unwrap();
    assert!(blueprint.contains("deployExecutions"));
    assert!(blueprint.contains("name: replicas"));
    assert!(blueprint.contains("targetType: landscaper.gardener.cloud/kubernetes-cluster"));

    rigging(&dir)
        .args(["render", "--stage", "deployitems", "--blueprint"])
        .arg(&bp)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: nginx"))
        .stdout(predicate::str::contains("kind: ProviderConfiguration"))
        .stdout(predicate::str::contains("policy: manage"));
}

#[test]
fn add_deployitem_refuses_duplicates_and_bad_names() {
    let dir = TempDir::new().unwrap();
    let bp = empty_blueprint(&dir);
    let add = |name: &str| {
        let mut cmd = rigging(&dir);
        cmd.args(["blueprint", "add-deployitem", name, "--blueprint"])
            .arg(&bp)
            .args(["--cluster-param", "cluster"]);
        cmd
    };

    add("web").assert().success();
    add("web")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already added"));
    add("Web!")
        .assert()
        .failure()
        .stderr(predicate::str::contains("lower case alphanumeric"));
}

#[test]
fn add_deployitem_rejects_names_render_would_refuse() {
    let dir = TempDir::new().unwrap();
    let bp = empty_blueprint(&dir);

    rigging(&dir)
        .args(["blueprint", "add-deployitem", "my_item", "--blueprint"])
        .arg(&bp)
        .args(["--cluster-param", "cluster"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid deploy item name 'my_item'"));

    rigging(&dir)
        .args(["blueprint", "add-deployitem", "nginx", "--blueprint"])
        .arg(&bp)
        .args(["--cluster-param", "targetCluster"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--target-name"));

    assert!(!bp.join("deploy-execution-my_item.yaml").exists());
    assert!(!bp.join("deploy-execution-nginx.yaml").exists());
    let blueprint = std::fs::read_to_string(bp.join("blueprint.yaml")).unwrap();
    assert!(!blueprint.contains("deployExecutions"));
}

#[test]
fn add_deployitem_with_target_name_renders() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let bp = empty_blueprint(&dir);

    rigging(&dir)
        .args(["blueprint", "add-deployitem", "nginx", "--blueprint"])
        .arg(&bp)
        .args(["--cluster-param", "targetCluster", "--target-name", "prod-cluster"])
        .assert()
        .success();

    let blueprint = std::fs::read_to_string(bp.join("blueprint.yaml")).unwrap();
    assert!(blueprint.contains("name: targetCluster"));

    rigging(&dir)
        .args(["render", "--stage", "deployitems", "--blueprint"])
        .arg(&bp)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: prod-cluster"))
        .stdout(predicate::str::contains("namespace: default"));
}

// ---------------------------------------------------------------------------
// rigging render
// ---------------------------------------------------------------------------

#[test]
fn render_empty_blueprint() {
    let dir = TempDir::new().unwrap();
    let bp = empty_blueprint(&dir);
    let out = rigging(&dir)
        .args(["--json", "render", "--blueprint"])
        .arg(&bp)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_yaml::Value = serde_yaml::from_slice(&out).unwrap();
    assert_eq!(v["deployItems"], serde_yaml::Value::Sequence(vec![]));
    assert_eq!(v["subinstallations"], serde_yaml::Value::Sequence(vec![]));
}

#[test]
fn render_unknown_type_fails() {
    let dir = TempDir::new().unwrap();
    let bp = write_blueprint(
        &dir,
        r#"
deployExecutions:
  - name: web
    type: Jinja
    template: "deployItems: []"
"#,
    );
    rigging(&dir)
        .args(["render", "--blueprint"])
        .arg(&bp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown template type Jinja"))
        .stderr(predicate::str::contains("'web'"));
}

#[test]
fn render_reports_every_violation() {
    let dir = TempDir::new().unwrap();
    let bp = write_blueprint(
        &dir,
        r#"
deployExecutions:
  - name: first
    type: Literal
    template: |
      deployItems:
        - name: dup
          type: landscaper.gardener.cloud/kubernetes-manifest
          config: {}
  - name: second
    type: Literal
    template: |
      deployItems:
        - name: dup
          type: landscaper.gardener.cloud/kubernetes-manifest
          config: {}
        - name: other
          type: landscaper.gardener.cloud/kubernetes-manifest
"#,
    );
    rigging(&dir)
        .args(["render", "--stage", "deployitems", "--blueprint"])
        .arg(&bp)
        .assert()
        .failure()
        .stderr(predicate::str::contains("deployExecutions[1].name"))
        .stderr(predicate::str::contains("deployExecutions[2].config"));
}

#[test]
fn render_exports_last_executor_wins() {
    let dir = TempDir::new().unwrap();
    let bp = write_blueprint(
        &dir,
        r#"
exportExecutions:
  - name: a
    type: Literal
    template: "exports: {replicas: 3}"
  - name: b
    type: Literal
    template: "exports: {replicas: 5, name: x}"
"#,
    );
    rigging(&dir)
        .args(["render", "--stage", "exports", "--blueprint"])
        .arg(&bp)
        .assert()
        .success()
        .stdout(predicate::str::contains("replicas: 5"))
        .stdout(predicate::str::contains("name: x"))
        .stdout(predicate::str::contains("deployItems").not());
}

// ---------------------------------------------------------------------------
// rigging execution
// ---------------------------------------------------------------------------

#[test]
fn execution_status_and_publish() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(dir.path().join("values.yaml"), "replicas: 3\n").unwrap();

    rigging(&dir)
        .args(["execution", "create", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default/web"));

    rigging(&dir)
        .args(["execution", "status", "web", "--phase", "progressing"])
        .args(["--condition", "Ready=False:Rendering"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progressing"));

    for _ in 0..2 {
        rigging(&dir)
            .args(["execution", "publish", "web", "--values", "values.yaml"])
            .assert()
            .success();
    }
    assert_eq!(data_object_files(dir.path(), "default"), 1);

    rigging(&dir)
        .args(["execution", "show", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Phase:     Progressing"))
        .stdout(predicate::str::contains("Exports:   default/"))
        .stdout(predicate::str::contains("Rendering"));
}

#[test]
fn execution_errors() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    rigging(&dir)
        .args(["execution", "status", "ghost", "--phase", "Failed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("execution not found: default/ghost"));

    rigging(&dir)
        .args(["execution", "create", "web"])
        .assert()
        .success();
    rigging(&dir)
        .args(["execution", "create", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    rigging(&dir)
        .args(["execution", "status", "web", "--phase", "Exploded"])
        .assert()
        .failure();
}
