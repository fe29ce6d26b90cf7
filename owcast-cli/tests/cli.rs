use assert_cmd::Command;
use predicates::prelude::*;
use std::{
    io::{Read, Write},
    net::TcpListener,
    path::Path,
    thread::{self, JoinHandle},
};

const CURRENT_BODY: &str = r#"{
    "weather": [{"description": "clear sky"}],
    "main": {"temp": 70.7, "feels_like": 69.6, "pressure": 1018, "humidity": 40},
    "visibility": 9700,
    "wind": {"speed": 8.1},
    "sys": {"country": "ES", "sunrise": 1717992000, "sunset": 1718045700},
    "timezone": 7200,
    "name": "Madrid"
}"#;

/// Command isolated from the user's real config and environment.
fn owcast(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("owcast").unwrap();
    cmd.env("OWCAST_CONFIG", config_dir.join("config.toml"))
        .env_remove("OPENWEATHER_API_KEY")
        .env_remove("OWCAST_BASE_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Serve one HTTP response on a local port; the thread yields the request head.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}/data/2.5", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&head).into_owned()
    });

    (base_url, handle)
}

#[test]
fn help_lists_commands() {
    let temp_dir = tempfile::tempdir().unwrap();

    owcast(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("weather"))
        .stdout(predicate::str::contains("forecast"))
        .stdout(predicate::str::contains("configure"));
}

#[test]
fn unknown_units_is_a_usage_error() {
    let temp_dir = tempfile::tempdir().unwrap();

    owcast(temp_dir.path())
        .args(["weather", "Madrid", "--units", "kelvin"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown units"));
}

#[test]
fn missing_api_key_without_terminal_fails_with_hint() {
    let temp_dir = tempfile::tempdir().unwrap();

    owcast(temp_dir.path())
        .args(["weather", "Madrid"])
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No OpenWeatherMap API key configured"))
        .stderr(predicate::str::contains("owcast configure"));

    assert!(!temp_dir.path().join("config.toml").exists());
}

#[test]
fn unreachable_service_exits_with_connectivity_code() {
    let temp_dir = tempfile::tempdir().unwrap();

    owcast(temp_dir.path())
        .env("OPENWEATHER_API_KEY", "SECRET-KEY")
        .env("OWCAST_BASE_URL", "http://127.0.0.1:1/data/2.5")
        .args(["forecast", "Madrid"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Connection error"))
        .stderr(predicate::str::contains("SECRET-KEY").not());
}

#[test]
fn stored_key_and_base_url_are_read_from_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "api_key = \"FROM-FILE\"\nunits = \"imperial\"\nbase_url = \"http://127.0.0.1:1\"\n",
    )
    .unwrap();

    owcast(temp_dir.path())
        .args(["weather", "Madrid"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Could not connect"));
}

#[test]
fn broken_config_file_is_reported() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(temp_dir.path().join("config.toml"), "units = [").unwrap();

    owcast(temp_dir.path())
        .args(["forecast", "Madrid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn invalid_base_url_is_a_configuration_error() {
    let temp_dir = tempfile::tempdir().unwrap();

    owcast(temp_dir.path())
        .env("OPENWEATHER_API_KEY", "SECRET-KEY")
        .env("OWCAST_BASE_URL", "not a url")
        .args(["weather", "Madrid"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("not a url"))
        .stderr(predicate::str::contains("SECRET-KEY").not());
}

#[test]
fn environment_overrides_config_file_and_config_units_apply() {
    let temp_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "api_key = \"FROM-FILE\"\nunits = \"imperial\"\nbase_url = \"http://127.0.0.1:1\"\n",
    )
    .unwrap();
    let (base_url, server) = serve_once("200 OK", CURRENT_BODY);

    owcast(temp_dir.path())
        .env("OPENWEATHER_API_KEY", "FROM-ENV")
        .env("OWCAST_BASE_URL", &base_url)
        .args(["weather", "Madrid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Madrid, ES"))
        .stdout(predicate::str::contains("70.7°F"))
        .stdout(predicate::str::contains("8.1 mph"));

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /data/2.5/weather?"), "{request}");
    assert!(request.contains("appid=FROM-ENV"), "{request}");
    assert!(request.contains("units=imperial"), "{request}");
    assert!(!request.contains("FROM-FILE"), "{request}");
}

#[test]
fn rejected_key_exits_with_authentication_code() {
    let temp_dir = tempfile::tempdir().unwrap();
    let (base_url, server) =
        serve_once("401 Unauthorized", r#"{"cod":401,"message":"Invalid API key."}"#);

    owcast(temp_dir.path())
        .env("OPENWEATHER_API_KEY", "BAD-KEY")
        .env("OWCAST_BASE_URL", &base_url)
        .args(["forecast", "Madrid"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Authentication error"));

    server.join().unwrap();
}
