use actix_web::{http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body was not JSON")
    }
}

struct CannedResponse {
    status: StatusCode,
    body: String,
    delay: Duration,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Answers every request with the same canned JSON response and records
/// what it received
pub struct StubServer {
    pub base_url: Url,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub async fn start(status: u16, body: &str) -> Self {
        Self::start_delayed(status, body, Duration::from_secs(0)).await
    }

    pub async fn start_delayed(status: u16, body: &str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let canned = web::Data::new(CannedResponse {
            status: StatusCode::from_u16(status).expect("invalid status code"),
            body: body.to_string(),
            delay,
            requests: requests.clone(),
        });
        let server = HttpServer::new(move || {
            App::new()
                .app_data(canned.clone())
                .default_service(web::to(respond))
        })
        .workers(1)
        .listen(listener)
        .expect("failed to bind address")
        .run();
        let _ = tokio::spawn(server);

        Self {
            base_url: Url::parse(&format!("http://127.0.0.1:{}/api/", port)).unwrap(),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("stub server received no requests")
    }
}

async fn respond(
    request: HttpRequest,
    body: web::Bytes,
    canned: web::Data<CannedResponse>,
) -> HttpResponse {
    let headers = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_lowercase(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    canned.requests.lock().unwrap().push(RecordedRequest {
        method: request.method().to_string(),
        path: request.path().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    tokio::time::sleep(canned.delay).await;
    HttpResponse::build(canned.status)
        .content_type("application/json")
        .body(canned.body.clone())
}
