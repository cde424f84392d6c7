use std::process::{Command, Output};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn run_studio(args: &[&str]) -> Output {
    run_studio_with_env(args, Vec::new())
}

fn run_studio_with_env(args: &[&str], env_vars: Vec<(&str, &str)>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_studio"));
    cmd.args(args).env_remove("STUDIO_GATEWAY_URL");
    for (key, value) in env_vars {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to execute studio command")
}

fn output_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_to_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn run_async(args: Vec<String>, env_vars: Vec<(String, String)>) -> Output {
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let env_vars: Vec<(&str, &str)> = env_vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        run_studio_with_env(&args, env_vars)
    })
    .await
    .unwrap()
}

mod version_command_tests {
    use super::*;

    #[test]
    fn test_version_command_basic() {
        let output = run_studio(&["version"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success(), "version command should succeed");
        assert!(stdout.contains("studio"));
        assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_version_command_detailed() {
        let output = run_studio(&["version", "--detailed"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        assert!(stdout.contains("Version"));
        assert!(stdout.contains("Apache-2.0"));
        assert!(stdout.contains("LinkedIn"));
        assert!(stdout.contains("marketing_mails"));
    }
}

mod help_tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let output = run_studio(&["--help"]);
        let stdout = output_to_string(&output);

        assert!(output.status.success());
        for command in ["serve", "wizard", "ideas", "draft", "publish", "analyze", "sponsor"] {
            assert!(stdout.contains(command), "help should mention '{}'", command);
        }
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        let output = run_studio(&["frobnicate"]);
        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("frobnicate"));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_invalid_platform_rejected_locally() {
        let output = run_studio(&[
            "--gateway",
            "http://127.0.0.1:9",
            "ideas",
            "Fitness",
            "--platform",
            "myspace",
        ]);
        let stderr = stderr_to_string(&output);

        assert!(!output.status.success());
        assert!(stderr.contains("Error"));
        assert!(stderr.contains("myspace"));
    }

    #[test]
    fn test_unreachable_gateway() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let output = run_studio(&["--gateway", &url, "health"]);
        assert!(!output.status.success());
        assert!(stderr_to_string(&output).contains("Could not reach the gateway"));
    }
}

mod gateway_command_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "healthy",
                "service": "Creator Studio API",
                "version": "0.1.0",
                "timestamp": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let output = run_async(
            vec!["health".into(), "--format".into(), "json".into()],
            vec![("STUDIO_GATEWAY_URL".into(), server.uri())],
        )
        .await;

        assert!(output.status.success(), "{}", stderr_to_string(&output));
        let body: serde_json::Value = serde_json::from_str(&output_to_string(&output)).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_sponsor_reports_gateway_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sponsorship/send"))
            .respond_with(ResponseTemplate::new(502).set_body_json(json!({
                "detail": "[E2009] Email delivery failed: relay refused",
                "error_code": "E2009",
                "kind": "upstream"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = run_async(
            vec!["--gateway".into(), server.uri(), "sponsor".into(), "tech".into()],
            Vec::new(),
        )
        .await;

        assert!(!output.status.success());
        let stderr = stderr_to_string(&output);
        assert!(stderr.contains("502"));
        assert!(stderr.contains("relay refused"));
    }
}
