use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct HostState {
    payload: Bytes,
    hits: Arc<AtomicUsize>,
}

async fn video(state: web::Data<HostState>) -> HttpResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    HttpResponse::Ok()
        .content_type("video/mp4")
        .body(state.payload.clone())
}

// Chunked transfer, no Content-Length.
async fn chunked(state: web::Data<HostState>) -> HttpResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let chunks: Vec<Result<Bytes, actix_web::Error>> = state
        .payload
        .chunks(512)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    HttpResponse::Ok()
        .content_type("video/mp4")
        .streaming(futures::stream::iter(chunks))
}

async fn unavailable(state: web::Data<HostState>) -> HttpResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    HttpResponse::ServiceUnavailable().body("try later")
}

async fn slow(state: web::Data<HostState>) -> HttpResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    actix_web::rt::time::sleep(Duration::from_secs(5)).await;
    HttpResponse::Ok().body(state.payload.clone())
}

/// CDN stand-in serving `/video.mp4`, `/chunked.mp4`, `/unavailable` (503)
/// and `/slow.mp4`.
pub struct MockAssetHost {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
    handle: ServerHandle,
}

impl MockAssetHost {
    pub async fn start(payload: impl Into<Bytes>) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = web::Data::new(HostState {
            payload: payload.into(),
            hits: hits.clone(),
        });

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .route("/video.mp4", web::get().to(video))
                .route("/chunked.mp4", web::get().to(chunked))
                .route("/unavailable", web::get().to(unavailable))
                .route("/slow.mp4", web::get().to(slow))
        })
        .workers(2)
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            hits,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}
