use crate::app_state::AppState;
use crate::config::ServerConfig;
use crate::error::GenerationError;
use crate::io_struct::{GenerateForm, HealthResponse};
use actix_files::{Files, NamedFile};
use actix_web::{HttpRequest, HttpResponse, HttpServer, Responder, error, get, mime, post, web};
use std::io::Write;
use std::path::PathBuf;

#[get("/health")]
pub async fn health(_req: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        api_key_configured: app_state.config.credential().is_some(),
    })
}

#[post("/generate-video")]
pub async fn generate_video(
    _req: HttpRequest,
    form: web::Form<GenerateForm>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GenerationError> {
    let form = form.into_inner();
    log::info!(
        "Received video generation request ({} chars)",
        form.prompt.as_deref().map_or(0, |p| p.chars().count())
    );
    match app_state.generate(&form).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(resp)),
        Err(e) => {
            log::error!("Error generating video: {:?}", e);
            Err(e)
        }
    }
}

#[get("/video/{filename}")]
pub async fn get_video(
    req: HttpRequest,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GenerationError> {
    let filename = path.into_inner();
    let video_path = app_state.store.get_path(&filename).await?;
    let file = NamedFile::open_async(&video_path)
        .await
        .map_err(|e| not_found_or_storage(e, "Video"))?
        .set_content_type(
            "video/mp4"
                .parse()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        );
    Ok(file.into_response(&req))
}

#[get("/")]
pub async fn index(
    req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, GenerationError> {
    let page = app_state.config.static_dir.join("index.html");
    let file = NamedFile::open_async(&page)
        .await
        .map_err(|e| not_found_or_storage(e, "Front-end"))?;
    Ok(file.into_response(&req))
}

fn not_found_or_storage(e: std::io::Error, what: &str) -> GenerationError {
    if e.kind() == std::io::ErrorKind::NotFound {
        GenerationError::NotFound(what.to_string())
    } else {
        GenerationError::Storage(e)
    }
}

// Malformed form bodies are reported like an empty prompt.
fn form_error_handler(err: error::UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    log::warn!("Invalid form payload: {}", err);
    GenerationError::Validation(format!("Prompt is required ({})", err)).into()
}

/// Registers every route; shared by `startup` and the tests.
///
/// `/static` is only mounted when `static_dir` exists.
pub fn configure(static_dir: PathBuf) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::FormConfig::default().error_handler(form_error_handler))
            .service(index)
            .service(health)
            .service(generate_video)
            .service(get_video);
        if static_dir.is_dir() {
            cfg.service(Files::new("/static", static_dir));
        } else {
            log::warn!("Static directory {} not found", static_dir.display());
        }
    }
}

/// Log builder honouring `RUST_LOG`-style directives, e.g. `seedance_gateway=debug`.
fn logger_builder(level: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        // default level is info
        .filter(None, log::LevelFilter::Info)
        .parse_filters(level);
    builder
}

pub fn init_logging(level: &str) {
    let _ = logger_builder(level).try_init();
}

pub async fn startup(config: ServerConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    log::info!("Starting server at {}:{}", config.host, config.port);
    log::info!("Serving videos from {}", app_state.store.root().display());

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure(app_state.config.static_dir.clone()))
    })
    .bind((config.host, config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
