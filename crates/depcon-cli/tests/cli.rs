use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const SERVICE: &str = r#"class Service
{
    private readonly IRepo _repo;
}
"#;

const SERVICE_WITH_CTOR: &str = r#"class Service
{
    private readonly IRepo _repo;

    public Service(IRepo repo)
    {
        _repo = repo;
    }
}
"#;

const JOBS: &str = r#"using System.Threading.Tasks;

class Jobs
{
    public async Task<int> Load()
    {
        return 1;
    }

    public void Run()
    {
    }
}

class Other
{
    public void Run()
    {
    }
}
"#;

/// Runs `depcon` inside `dir` with a clean environment.
fn depcon(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("depcon"));
    cmd.current_dir(dir.path())
        .env_remove("DEPCON_CONFIG_PATH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_mentions_core_commands() {
    let temp = TempDir::new().unwrap();
    depcon(&temp).arg("--help").assert().success().stdout(
        predicate::str::contains("ctor")
            .and(predicate::str::contains("convert"))
            .and(predicate::str::contains("actions"))
            .and(predicate::str::contains("check")),
    );
}

#[test]
fn ctor_prints_rewritten_file() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE).unwrap();

    depcon(&temp)
        .args(["ctor", "Service.cs"])
        .assert()
        .success()
        .stdout(SERVICE_WITH_CTOR);

    temp.child("Service.cs").assert(SERVICE);
}

#[test]
fn ctor_in_place_rewrites_the_file() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE).unwrap();

    depcon(&temp)
        .args(["ctor", "Service.cs", "--class", "Service", "--in-place"])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated Service.cs"));

    temp.child("Service.cs").assert(SERVICE_WITH_CTOR);
}

#[test]
fn ctor_diff_shows_added_lines() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE).unwrap();

    depcon(&temp)
        .args(["ctor", "Service.cs", "--diff"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--- a/Service.cs")
                .and(predicate::str::contains("+    public Service(IRepo repo)"))
                .and(predicate::str::contains("+        _repo = repo;")),
        );
}

#[test]
fn ctor_json_emits_preview() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE).unwrap();

    let output = depcon(&temp)
        .args(["ctor", "Service.cs", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["total_files"].as_u64().unwrap(), 1);
    assert_eq!(v["files"][0]["file"].as_str().unwrap(), "Service.cs");
    assert_eq!(v["files"][0]["modified"].as_str().unwrap(), SERVICE_WITH_CTOR);
}

#[test]
fn ctor_on_complete_class_changes_nothing() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE_WITH_CTOR).unwrap();

    depcon(&temp)
        .args(["ctor", "Service.cs", "--in-place"])
        .assert()
        .success()
        .stderr(predicate::str::contains("nothing to change"));

    temp.child("Service.cs").assert(SERVICE_WITH_CTOR);
}

#[test]
fn convert_by_method_name() {
    let temp = TempDir::new().unwrap();
    temp.child("Jobs.cs").write_str(JOBS).unwrap();

    depcon(&temp)
        .args(["convert", "Jobs.cs", "--method", "Load", "--to", "sync"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("    public int Load()\n")
                .and(predicate::str::contains("        return 1;\n")),
        );
}

#[test]
fn convert_by_cursor_position() {
    let temp = TempDir::new().unwrap();
    temp.child("Jobs.cs").write_str(JOBS).unwrap();

    // Line 10 is `    public void Run()` inside `Jobs`.
    depcon(&temp)
        .args(["convert", "Jobs.cs", "--line", "10", "--column", "17", "--to", "async"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    public async Task Run()\n"));
}

#[test]
fn ambiguous_method_name_is_an_error() {
    let temp = TempDir::new().unwrap();
    temp.child("Jobs.cs").write_str(JOBS).unwrap();

    depcon(&temp)
        .args(["convert", "Jobs.cs", "--method", "Run", "--to", "async"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ambiguous"));

    depcon(&temp)
        .args([
            "convert", "Jobs.cs", "--method", "Run", "--class", "Other", "--to", "async",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("class Other\n{\n    public async Task Run()"));
}

#[test]
fn unknown_mode_is_rejected() {
    let temp = TempDir::new().unwrap();
    temp.child("Jobs.cs").write_str(JOBS).unwrap();

    depcon(&temp)
        .args(["convert", "Jobs.cs", "--method", "Load", "--to", "later"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("later"));
}

#[test]
fn actions_lists_refactorings_at_cursor() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE).unwrap();

    depcon(&temp)
        .args(["actions", "Service.cs", "--line", "1", "--column", "7"])
        .assert()
        .success()
        .stdout("Resolve unassigned dependencies: Service\n");

    let output = depcon(&temp)
        .args(["actions", "Service.cs", "--offset", "6", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v[0]["kind"].as_str().unwrap(), "resolve_unassigned_dependencies");
    assert_eq!(v[0]["target"].as_str().unwrap(), "Service");
}

#[test]
fn check_fails_when_fields_are_not_injected() {
    let temp = TempDir::new().unwrap();
    temp.child("src/Service.cs").write_str(SERVICE).unwrap();
    temp.child("src/Done.cs")
        .write_str(&SERVICE_WITH_CTOR.replace("Service", "Done"))
        .unwrap();

    depcon(&temp)
        .arg("check")
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains(
                "src/Service.cs:1: class Service: no constructor injects its read-only fields",
            )
            .and(predicate::str::contains("checked 2 files (2 classes): 1 needs")),
        );
}

#[test]
fn check_json_and_clean_exit() {
    let temp = TempDir::new().unwrap();
    temp.child("Service.cs").write_str(SERVICE_WITH_CTOR).unwrap();

    let output = depcon(&temp).args(["check", "--json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["files_scanned"].as_u64().unwrap(), 1);
    assert!(v["findings"].as_array().unwrap().is_empty());
}

#[test]
fn config_file_excludes_paths_from_check() {
    let temp = TempDir::new().unwrap();
    temp.child("Generated/Client.cs").write_str(SERVICE).unwrap();
    temp.child("depcon.toml")
        .write_str("[check]\nexclude = [\"Generated/**\"]\n")
        .unwrap();

    depcon(&temp)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("checked 0 files"));

    // An explicit --config wins over discovery.
    temp.child("other.toml").write_str("").unwrap();
    depcon(&temp)
        .args(["check", "--config", "other.toml"])
        .assert()
        .code(1);
}

#[test]
fn invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    temp.child("depcon.toml")
        .write_str("[preview]\ncontext_radius = \"wide\"\n")
        .unwrap();

    depcon(&temp)
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse toml config"));
}
