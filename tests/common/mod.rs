//! Shared test harness: spawns the compiled server binary once per test
//! process and hands out a base URL.

use std::process::{Child, Command};
use std::sync::OnceLock;
use std::time::Duration;

pub struct TestServer {
    pub base_url: String,
    _child: ChildGuard,
}

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub async fn server() -> &'static TestServer {
    if SERVER.get().is_none() {
        let server = spawn().await;
        let _ = SERVER.set(server);
    }
    SERVER.get().expect("test server initialized")
}

async fn spawn() -> TestServer {
    let port = portpicker::pick_unused_port().expect("no free port");
    let binary = binary_path();

    let child = Command::new(&binary)
        .env("GYM_API_PORT", port.to_string())
        .env("APP_ENV", "development")
        .env("RUST_LOG", "error")
        // The suite asserts against the default prefix.
        .env_remove("API_ROUTE_PREFIX")
        .spawn()
        .unwrap_or_else(|e| panic!("failed to spawn {}: {}", binary, e));

    let base_url = format!("http://127.0.0.1:{}", port);
    wait_ready(&base_url).await;

    TestServer {
        base_url,
        _child: ChildGuard(child),
    }
}

fn binary_path() -> String {
    // cargo places integration test binaries in target/debug/deps; the server
    // binary sits one level up.
    let exe = std::env::current_exe().expect("test binary path");
    let debug_dir = exe
        .parent()
        .and_then(|p| p.parent())
        .expect("target/debug directory");
    debug_dir.join("gym-api").to_string_lossy().into_owned()
}

/// Poll /health until the server answers. A degraded response (no database)
/// still counts as up; these tests exercise routing and auth, not storage.
async fn wait_ready(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(format!("{}/health", base_url)).send().await {
            if resp.status() == reqwest::StatusCode::OK
                || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE
            {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become ready at {}", base_url);
}

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}
