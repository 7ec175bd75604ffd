use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PARENT: &str = "<template><Child/></template>\n<script>\nimport Child from './Child.vue';\nexport default {\n  name: 'Parent',\n  components: { Child },\n  props: ['title'],\n  methods: { go() {} },\n}\n</script>\n";
const CHILD: &str = "<script lang=\"ts\">\nexport default { props: ['label'] }\n</script>\n";

fn workspace() -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("tsconfig.json"), "{\n  // comments are allowed\n  \"compilerOptions\": { \"target\": \"es2017\" },\n}\n").unwrap();
  fs::create_dir_all(dir.path().join("src")).unwrap();
  fs::write(dir.path().join("src/Parent.vue"), PARENT).unwrap();
  fs::write(dir.path().join("src/Child.vue"), CHILD).unwrap();
  dir
}

fn inspect(dir: &Path) -> Command {
  let mut cmd = Command::cargo_bin("vue-host-cli").unwrap();
  cmd.args(["inspect", "--workspace"]).arg(dir.as_os_str());
  cmd
}

#[test]
fn reports_component_and_unopened_child_dialect() {
  let dir = workspace();
  inspect(dir.path())
    .arg(dir.path().join("src/Parent.vue"))
    .assert()
    .success()
    .stdout(contains("component Parent"))
    .stdout(contains("props: title"))
    .stdout(contains("methods: go"))
    .stdout(contains("Child.vue (ts)"))
    .stdout(contains("import vue-editor-bridge -> vue-host:/vue-editor-bridge.ts (ts)"));
}

#[test]
fn json_report_is_parseable() {
  let dir = workspace();
  let output = inspect(dir.path())
    .arg(dir.path().join("src/Parent.vue"))
    .arg("--json")
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();
  let report: Value = serde_json::from_slice(&output).unwrap();
  let file = &report["files"][0];
  assert_eq!(file["version"], 1);
  assert_eq!(file["dialect"], "js");
  assert_eq!(file["parse_kind"], "full");
  assert_eq!(file["patched"], true);
  let component = &report["components"][0];
  assert_eq!(component["name"], "Parent");
  assert_eq!(component["components"][0]["dialect"], "ts");
  let files = report["program"]["files"].as_array().unwrap();
  assert!(files.iter().any(|file| file == "vue-host:/vue-editor-bridge.ts"));
}

#[test]
fn syntax_errors_fail_the_run() {
  let dir = workspace();
  fs::write(dir.path().join("src/Broken.vue"), "<script>\nexport default {\n</script>\n").unwrap();
  inspect(dir.path())
    .arg(dir.path().join("src/Broken.vue"))
    .assert()
    .failure()
    .stdout(contains("syntax error"));
}

#[test]
fn missing_file_is_reported() {
  let dir = workspace();
  inspect(dir.path())
    .arg(dir.path().join("src/Nope.vue"))
    .assert()
    .code(2)
    .stderr(contains("failed to read"));
}
