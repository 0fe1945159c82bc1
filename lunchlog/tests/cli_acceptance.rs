use lunchlog_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Fixture history ends on 2024-01-15; this puts ids 1-7 inside the window.
const FIXTURE_NOW: &str = "2024-01-16T00:00:00Z";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("lunchlog/lunchlog.db")
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("lunchlog");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("lunchlog"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("LUNCHLOG_API_BASE_URL")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute lunchlog: {e}"))
}

fn render_args(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "lunchlog {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        render_args(args),
        output.status,
        stdout,
        stderr
    );
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_err(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert!(
        !output.status.success(),
        "lunchlog {} should have failed, stdout:\n{}",
        render_args(args),
        String::from_utf8_lossy(&output.stdout)
    );
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn history_json_reports_window_stats_and_arcs() {
    let env = CliTestEnv::new();
    let args = [
        "--source", "fixture", "history", "--now", FIXTURE_NOW, "--format", "json",
    ];
    let stdout = run_ok(&env, &args);

    let report: serde_json::Value =
        serde_json::from_str(&stdout).expect("history --format json should print JSON");

    let records = report["records"].as_array().expect("records array");
    assert_eq!(records.len(), 7);
    assert_eq!(records[0]["id"], 1);
    assert_eq!(records[6]["restaurantCategory"], "샐러드");

    let stats = report["stats"].as_array().expect("stats array");
    let categories: Vec<&str> = stats
        .iter()
        .map(|s| s["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["한식", "일식", "양식", "중식", "분식", "샐러드"]);
    assert_eq!(stats[0]["count"], 2);
    assert_eq!(stats[0]["percentage"], 29);
    assert!(stats[1..].iter().all(|s| s["percentage"] == 14));

    let arcs = report["arcs"].as_array().expect("arcs array");
    assert_eq!(arcs.len(), 6);
    assert_eq!(arcs[0]["start_angle_deg"].as_f64(), Some(0.0));
    let first_end = arcs[0]["end_angle_deg"].as_f64().unwrap();
    assert!((first_end - 104.4).abs() < 1e-9);
    // 29 + 5 * 14 = 99 percent, so the pie stops short of a full turn
    let last_end = arcs[5]["end_angle_deg"].as_f64().unwrap();
    assert!((last_end - 356.4).abs() < 1e-9);
}

#[test]
fn history_text_and_svg() {
    let env = CliTestEnv::new();
    let svg_path = env.home.join("charts/week.svg");
    let svg_arg = svg_path.to_string_lossy().into_owned();
    let args = [
        "--source", "fixture", "history", "--now", FIXTURE_NOW, "--svg", &svg_arg,
    ];
    let stdout = run_ok(&env, &args);

    assert!(stdout.contains("Categories"), "got:\n{stdout}");
    assert!(stdout.contains("29%"), "got:\n{stdout}");
    assert!(stdout.contains("맛있는 한식당"));
    // Outside the window
    assert!(!stdout.contains("카페모카"));

    let svg = fs::read_to_string(&svg_path).expect("svg should be written");
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches("<path").count(), 6);
}

#[test]
fn history_outside_window_is_empty() {
    let env = CliTestEnv::new();
    let args = [
        "--source", "fixture", "history", "--now", "2025-06-01T00:00:00Z", "--format", "json",
    ];
    let stdout = run_ok(&env, &args);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["records"].as_array().unwrap().len(), 0);
    assert_eq!(report["stats"].as_array().unwrap().len(), 0);
    assert_eq!(report["arcs"].as_array().unwrap().len(), 0);

    let stdout = run_ok(
        &env,
        &["--source", "fixture", "history", "--now", "2025-06-01T00:00:00Z"],
    );
    assert!(stdout.contains("No lunches in the last 7 days."));
}

#[test]
fn history_rejects_bad_now() {
    let env = CliTestEnv::new();
    let stderr = run_err(
        &env,
        &["--source", "fixture", "history", "--now", "last tuesday"],
    );
    assert!(stderr.contains("invalid timestamp"), "got:\n{stderr}");
}

#[test]
fn local_source_persists_selection_until_forgotten() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["--source", "local", "select", "3"]);
    assert!(stdout.contains("Saved lunch #1"), "got:\n{stdout}");

    let db_path = env.db_path();
    assert!(
        db_path.exists(),
        "database file should exist at {}",
        db_path.display()
    );
    let db = Database::open(&db_path).expect("failed to open db");
    db.migrate().expect("failed to migrate db");
    let history = db.list_history().expect("failed to list history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].restaurant_name, "스시로");
    assert_eq!(db.restaurant_count().unwrap(), 8);
    drop(db);

    // A second process sees the record in the current window
    let stdout = run_ok(&env, &["--source", "local", "history", "--format", "json"]);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["stats"][0]["category"], "일식");
    assert_eq!(report["stats"][0]["percentage"], 100);
    assert_eq!(report["arcs"][0]["end_angle_deg"].as_f64(), Some(360.0));

    let stdout = run_ok(&env, &["--source", "local", "forget", "1"]);
    assert!(stdout.contains("Deleted history record #1"));

    let stderr = run_err(&env, &["--source", "local", "forget", "1"]);
    assert!(stderr.contains("history record not found"), "got:\n{stderr}");
}

#[test]
fn select_unknown_restaurant_fails() {
    let env = CliTestEnv::new();
    let stderr = run_err(&env, &["--source", "local", "select", "999"]);
    assert!(stderr.contains("restaurant not found: 999"), "got:\n{stderr}");
}

#[test]
fn nearby_search_and_show() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["--source", "fixture", "nearby", "--limit", "3"]);
    let rows: Vec<&str> = stdout.lines().filter(|l| l.starts_with('#')).collect();
    assert_eq!(rows.len(), 3, "got:\n{stdout}");
    // Default position is restaurant 1's doorstep
    assert!(rows[0].starts_with("#1 "));
    assert!(rows[0].contains("0m"));

    let stdout = run_ok(
        &env,
        &["--source", "fixture", "nearby", "--category", "일식"],
    );
    assert!(stdout.contains("스시로"));
    assert!(!stdout.contains("맛있는 한식당"));

    let stdout = run_ok(&env, &["--source", "fixture", "search", "피자"]);
    assert!(stdout.contains("이탈리안 피자"));

    let stdout = run_ok(&env, &["--source", "fixture", "show", "1"]);
    assert!(stdout.contains("맛있는 한식당 (한식)"));
    assert!(stdout.contains("Menu"));
    assert!(stdout.contains("불고기"));
    assert!(stdout.contains("Last eaten here"));
}

#[test]
fn pick_recommends_within_reach() {
    let env = CliTestEnv::new();
    let stdout = run_ok(&env, &["--source", "local", "pick"]);
    assert!(stdout.contains("Picked from 8 restaurant(s)"), "got:\n{stdout}");
    assert_eq!(stdout.lines().filter(|l| l.contains(". #")).count(), 5);

    // Far from every restaurant
    let stdout = run_ok(
        &env,
        &["--source", "local", "--lat", "35.1796", "--lng", "129.0756", "pick"],
    );
    assert!(stdout.contains("Nothing to recommend"), "got:\n{stdout}");
}

#[test]
fn rate_validates_range() {
    let env = CliTestEnv::new();
    let stdout = run_ok(&env, &["--source", "local", "rate", "2", "4.5", "--comment", "좋아요"]);
    assert!(stdout.contains("Rated restaurant 2"));

    let db = Database::open(&env.db_path()).expect("failed to open db");
    let pref = db.get_preference(2).unwrap().expect("preference stored");
    assert_eq!(pref.rating, 4.5);
    assert_eq!(pref.comment.as_deref(), Some("좋아요"));
    drop(db);

    let stderr = run_err(&env, &["--source", "local", "rate", "2", "7"]);
    assert!(stderr.contains("invalid input"), "got:\n{stderr}");
}

#[test]
fn config_file_selects_source() {
    let env = CliTestEnv::new();
    env.write_config("[source]\nkind = \"fixture\"\n\n[location]\nlatitude = 37.5\nlongitude = 127.0\n");

    let stdout = run_ok(&env, &["status"]);
    assert!(stdout.contains("Source:          fixture"), "got:\n{stdout}");
    assert!(stdout.contains("Location:        37.5000, 127.0000"));
    assert!(stdout.contains("Lunches logged:  10"));

    let stdout = run_ok(&env, &["categories"]);
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.contains("한식"));
}

#[test]
fn status_reports_the_log_file_being_written() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["--source", "fixture", "status"]);
    let log_line = stdout
        .lines()
        .find_map(|line| line.strip_prefix("Log:"))
        .unwrap_or_else(|| panic!("no Log line in:\n{stdout}"));
    let log_path = PathBuf::from(log_line.trim());

    assert!(log_path.starts_with(env.xdg_state.join("lunchlog")), "got {}", log_path.display());
    let name = log_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("lunchlog.log."), "got {name}");
    assert!(log_path.is_file(), "{} was not written", log_path.display());
}

#[test]
fn unreachable_remote_fails_with_context() {
    let env = CliTestEnv::new();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    env.write_config(&format!(
        "[source]\nkind = \"remote\"\n\n[api]\nbase_url = \"http://127.0.0.1:{port}\"\ntimeout_secs = 2\nmax_retries = 0\n"
    ));

    let stderr = run_err(&env, &["history"]);
    assert!(stderr.contains("failed to load history"), "got:\n{stderr}");
    assert!(stderr.contains("network error"), "got:\n{stderr}");
}
