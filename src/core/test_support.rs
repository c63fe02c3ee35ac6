/// Test helpers: a configuration pointing at a local mock, and an in-process
/// actix server standing in for the downstream services.

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, http::StatusCode, web};
use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use crate::core::config::{
    GatewayConfig, ImageCredential, ServerSettings, TranslateCredential, TtsCredential,
};

pub const TTS_TOKEN: &str = "tts-token";
pub const IMAGE_KEY: &str = "image-key";

/// Config whose downstream URLs are `{base}/tts`, `{base}/image` and
/// `{base}/translate`.
pub fn test_config(hub_secret: &str, base: &str) -> GatewayConfig {
    GatewayConfig {
        server: ServerSettings {
            name: "media-tool-hub-test".into(),
            version: "0.0.0".into(),
            host: "127.0.0.1".into(),
            port: 0,
            workers: 1,
        },
        hub_secret: hub_secret.into(),
        tts: TtsCredential {
            url: format!("{base}/tts"),
            token: TTS_TOKEN.into(),
        },
        image: ImageCredential {
            url: format!("{base}/image"),
            api_key: IMAGE_KEY.into(),
        },
        translate: TranslateCredential {
            url: format!("{base}/translate"),
        },
    }
}

/// Client that never routes loopback traffic through an environment proxy.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("build test client")
}

/// One request as seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

struct MockState {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    seen: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn record(req: HttpRequest, body: web::Bytes, state: web::Data<MockState>) -> HttpResponse {
    let headers = req
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let query = web::Query::<HashMap<String, String>>::from_query(req.query_string())
        .map(web::Query::into_inner)
        .unwrap_or_default();
    state.seen.lock().unwrap().push(RecordedRequest {
        method: req.method().to_string(),
        path: req.path().to_string(),
        query,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    HttpResponse::build(state.status)
        .content_type(state.content_type)
        .body(state.body.clone())
}

/// Downstream stand-in answering every request with one canned response.
pub struct MockDownstream {
    pub base_url: String,
    seen: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockDownstream {
    /// Must be called from within an actix system (e.g. `#[actix_web::test]`).
    pub fn start(status: u16, content_type: &'static str, body: &str) -> MockDownstream {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock listener");
        let addr = listener.local_addr().expect("mock address");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = web::Data::new(MockState {
            status: StatusCode::from_u16(status).expect("valid status"),
            content_type,
            body: body.to_string(),
            seen: seen.clone(),
        });

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .default_service(web::to(record))
        })
        .workers(1)
        .disable_signals()
        .listen(listener)
        .expect("listen on mock listener")
        .run();
        actix_web::rt::spawn(server);

        MockDownstream {
            base_url: format!("http://{addr}"),
            seen,
        }
    }

    pub fn json(status: u16, body: serde_json::Value) -> MockDownstream {
        Self::start(status, "application/json", &body.to_string())
    }

    pub fn text(status: u16, body: &str) -> MockDownstream {
        Self::start(status, "text/plain", body)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.seen.lock().unwrap().clone()
    }
}
