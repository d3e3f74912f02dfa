//! Reference development server for the Gantry client shell.
//!
//! Serves a development manifest at `GET /manifest` and the current bundle
//! bytes at `GET /bundle`, the two routes the development-mode fetch path
//! needs. The bundle can be swapped at runtime, which is what makes
//! force-reload during a development session useful.
//!
//! The [`TestServer`] helper starts a server on a random port for
//! integration testing.

use std::sync::{Arc, RwLock};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, info};

/// One served project: its identity and the current bundle bytes.
pub struct DevProject {
    scope_key: String,
    base_url: String,
    project_root: Option<String>,
    bundle: RwLock<Vec<u8>>,
}

impl DevProject {
    pub fn new(scope_key: impl Into<String>, base_url: impl Into<String>, bundle: Vec<u8>) -> Self {
        Self {
            scope_key: scope_key.into(),
            base_url: base_url.into(),
            project_root: None,
            bundle: RwLock::new(bundle),
        }
    }

    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<String>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }

    /// Replace the served bundle, as a rebuild of the project would.
    pub fn set_bundle(&self, bundle: Vec<u8>) {
        *self.bundle.write().expect("bundle lock poisoned") = bundle;
    }

    pub fn bundle(&self) -> Vec<u8> {
        self.bundle.read().expect("bundle lock poisoned").clone()
    }

    /// The development manifest advertised for this project. Always carries
    /// a `developer` section so clients pick the development-mode fetch
    /// strategy.
    pub fn manifest_json(&self) -> String {
        let mut manifest = serde_json::json!({
            "scope_key": self.scope_key,
            "bundle_url": format!("{}/bundle", self.base_url),
            "sdk_version": "UNVERSIONED",
            "developer": { "tool": "gantry-devserver" },
        });
        if let Some(root) = &self.project_root {
            manifest["developer"]["project_root"] = serde_json::Value::String(root.clone());
        }
        manifest.to_string()
    }
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    let _ = req.respond(Response::from_string(msg).with_status_code(StatusCode(code)));
}

fn respond_json(req: tiny_http::Request, json: String) {
    let header = Header::from_bytes("Content-Type", "application/json").expect("valid header");
    let _ = req.respond(Response::from_data(json.into_bytes()).with_header(header));
}

fn respond_bundle(req: tiny_http::Request, data: Vec<u8>) {
    let header =
        Header::from_bytes("Content-Type", "application/javascript").expect("valid header");
    let _ = req.respond(Response::from_data(data).with_header(header));
}

/// Handle a single HTTP request, dispatching to the appropriate route.
pub fn handle_request(project: &DevProject, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    if method != Method::Get {
        respond_err(req, 405, "method not allowed");
        return;
    }

    match url.as_str() {
        "/manifest" => respond_json(req, project.manifest_json()),
        "/bundle" => {
            let bundle = project.bundle();
            info!("serving bundle: {} bytes", bundle.len());
            respond_bundle(req, bundle);
        }
        "/health" => {
            let _ = req.respond(Response::from_string(r#"{"status":"ok"}"#));
        }
        _ => respond_err(req, 404, "not found"),
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(server: &Server, project: &Arc<DevProject>) {
    for request in server.incoming_requests() {
        handle_request(project, request);
    }
}

/// A test helper that starts a development server on a random port in a
/// background thread.
pub struct TestServer {
    base: String,
    project: Arc<DevProject>,
    _server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    /// Bind to `127.0.0.1:0` (random port) and serve the given bundle.
    pub fn start(scope_key: &str, bundle: Vec<u8>) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let base = format!("http://127.0.0.1:{port}");

        let project = Arc::new(DevProject::new(scope_key, &base, bundle));
        let srv = Arc::clone(&server);
        let proj = Arc::clone(&project);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&proj, request);
            }
        });

        Self {
            base,
            project,
            _server: server,
            _handle: handle,
        }
    }

    pub fn base_url(&self) -> String {
        self.base.clone()
    }

    pub fn manifest_url(&self) -> String {
        format!("{}/manifest", self.base)
    }

    pub fn bundle_url(&self) -> String {
        format!("{}/bundle", self.base)
    }

    pub fn set_bundle(&self, bundle: Vec<u8>) {
        self.project.set_bundle(bundle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn get(url: &str) -> Result<(u16, Vec<u8>), ureq::Error> {
        let resp = ureq::get(url).call()?;
        let status = resp.status().as_u16();
        let mut body = Vec::new();
        resp.into_body().into_reader().read_to_end(&mut body)?;
        Ok((status, body))
    }

    #[test]
    fn manifest_route_serves_development_manifest() {
        let server = TestServer::start("@dev/app", b"bundle".to_vec());
        let (status, body) = get(&server.manifest_url()).unwrap();
        assert_eq!(status, 200);

        let manifest = gantry_schema::parse_manifest_slice(&body).unwrap();
        assert_eq!(manifest.scope_key.as_str(), "@dev/app");
        assert!(manifest.is_development_mode());
        assert_eq!(manifest.bundle_url, server.bundle_url());
        assert_eq!(manifest.sdk_version.as_str(), "UNVERSIONED");
    }

    #[test]
    fn bundle_route_serves_current_bytes() {
        let server = TestServer::start("@dev/app", b"original".to_vec());
        let (_, body) = get(&server.bundle_url()).unwrap();
        assert_eq!(body, b"original");

        server.set_bundle(b"rebuilt".to_vec());
        let (_, body) = get(&server.bundle_url()).unwrap();
        assert_eq!(body, b"rebuilt");
    }

    #[test]
    fn unknown_route_is_404() {
        let server = TestServer::start("@dev/app", b"b".to_vec());
        let result = get(&format!("{}/nope", server.base_url()));
        assert!(matches!(result, Err(ureq::Error::StatusCode(404))));
    }

    #[test]
    fn non_get_is_rejected() {
        let server = TestServer::start("@dev/app", b"b".to_vec());
        let result = ureq::post(&server.bundle_url()).send(&b"data"[..]);
        assert!(matches!(result, Err(ureq::Error::StatusCode(405))));
    }

    #[test]
    fn health_route_responds() {
        let server = TestServer::start("@dev/app", b"b".to_vec());
        let (status, body) = get(&format!("{}/health", server.base_url())).unwrap();
        assert_eq!(status, 200);
        assert_eq!(body, br#"{"status":"ok"}"#);
    }

    #[test]
    fn project_root_appears_in_manifest() {
        let project = DevProject::new("@dev/app", "http://localhost:8081", b"b".to_vec())
            .with_project_root("/home/me/app");
        let manifest = gantry_schema::parse_manifest_str(&project.manifest_json()).unwrap();
        assert_eq!(
            manifest.developer.unwrap().project_root.as_deref(),
            Some("/home/me/app")
        );
    }
}
