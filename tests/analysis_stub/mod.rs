use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone)]
pub struct AnalysisStubConfig {
    /// Categories returned by structure analysis, in order.
    pub categories: Vec<(String, Vec<u32>)>,
    pub structure_status: u16,
    pub structure_body: Option<String>,
    /// Extraction for this category answers 500.
    pub fail_category: Option<String>,
}

impl Default for AnalysisStubConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                ("Summary".to_owned(), vec![2]),
                ("Terms".to_owned(), vec![3, 1, 3]),
            ],
            structure_status: 200,
            structure_body: None,
            fail_category: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: Value,
}

pub struct AnalysisStub {
    pub base_url: String,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl AnalysisStub {
    pub fn spawn(config: AnalysisStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start analysis stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/api");

        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }
                let parsed: Value = match serde_json::from_str(&body) {
                    Ok(value) => value,
                    Err(_) => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid json").with_status_code(400),
                        );
                        continue;
                    }
                };
                recorded.lock().unwrap().push(RecordedCall {
                    path: path.clone(),
                    body: parsed.clone(),
                });

                let (status, text) = match path.as_str() {
                    "/api/analyze_document_structure" => structure_response(&config),
                    "/api/extraction_category" => extraction_response(&config, &parsed),
                    _ => (404, "not found".to_owned()),
                };

                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(text)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            calls,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Drop for AnalysisStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn structure_response(config: &AnalysisStubConfig) -> (u16, String) {
    if config.structure_status != 200 {
        return (
            config.structure_status,
            serde_json::json!({ "error": "structure unavailable" }).to_string(),
        );
    }
    if let Some(body) = &config.structure_body {
        return (200, body.clone());
    }

    let categories = config
        .categories
        .iter()
        .map(|(name, pages)| serde_json::json!({ "category": name, "page_numbers": pages }))
        .collect::<Vec<_>>();
    let body = serde_json::json!({
        "categories": categories,
        "content_markdown": "# Contract\n\nBody text.",
        "pages": [
            { "page_number": 1, "width": 8.5, "height": 11.0, "lines": [{ "content": "one" }] },
            { "page_number": 2, "width": 8.5, "height": 11.0, "lines": [{ "content": "two" }] },
            { "page_number": 3, "width": 8.5, "height": 11.0, "lines": [{ "content": "three" }] },
        ],
    });
    (200, body.to_string())
}

fn extraction_response(config: &AnalysisStubConfig, request: &Value) -> (u16, String) {
    let Some(target) = request.get("target_category") else {
        return (400, "missing target_category".to_owned());
    };
    let name = target
        .get("category")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned();
    if config.fail_category.as_deref() == Some(name.as_str()) {
        return (500, format!("extraction failed for {name}"));
    }

    let pages = target
        .get("page_numbers")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|n| serde_json::json!({ "pageNumber": n, "saveAsImage": true }))
        .collect::<Vec<_>>();
    let body = serde_json::json!({
        "category": name,
        "pages": pages,
        "content": format!("content for {name}"),
    });
    (200, body.to_string())
}
