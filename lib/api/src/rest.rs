use actix_cors::Cors;
use actix_web::{error, web, App, HttpResponse, HttpServer, Result as ActixResult};
use greenmatch_core::{
    enrich, Error, Ingestor, JobId, JobRecord, JobStore, LanguageTag, MatchConfig, MatchContext,
    MatchEngine, NarrativeService, SkillQuery, SkillStore, SuggestionCatalog,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything the handlers need, shared across workers
pub struct AppState {
    pub engine: MatchEngine,
    pub ingestor: Ingestor,
    pub narrative: NarrativeService,
    pub jobs: Arc<dyn JobStore>,
    pub catalog: SuggestionCatalog,
}

impl AppState {
    pub fn new(
        ctx: Arc<MatchContext>,
        jobs: Arc<dyn JobStore>,
        skills: Arc<dyn SkillStore>,
        config: MatchConfig,
        catalog: SuggestionCatalog,
    ) -> greenmatch_core::Result<Self> {
        Ok(Self {
            engine: MatchEngine::new(ctx.clone(), jobs.clone(), config)?,
            ingestor: Ingestor::new(ctx.clone(), jobs.clone(), skills),
            narrative: NarrativeService::new(ctx),
            jobs,
            catalog,
        })
    }
}

#[derive(Deserialize)]
struct AddSkillRequest {
    text: String,
    #[serde(default)]
    lang: LanguageTag,
}

#[derive(Deserialize)]
struct AddJobRequest {
    title: String,
    description: String,
    #[serde(default)]
    lang: LanguageTag,
}

#[derive(Deserialize)]
struct MatchRequest {
    #[serde(alias = "phrases")]
    skills: Vec<String>,
    #[serde(default)]
    lang: LanguageTag,
}

impl MatchRequest {
    fn into_query(self) -> SkillQuery {
        SkillQuery::new(self.skills, self.lang)
    }
}

#[derive(Serialize)]
struct CreatedResponse {
    id: u64,
}

/// Job as listed by the API; vectors stay server side
#[derive(Serialize)]
struct JobView {
    id: u64,
    title: String,
    description: String,
    lang: LanguageTag,
    version: u64,
    embedded: bool,
}

impl From<JobRecord> for JobView {
    fn from(job: JobRecord) -> Self {
        Self {
            id: job.id.map(|id| id.0).unwrap_or_default(),
            embedded: job.has_embedding(),
            title: job.title,
            description: job.description,
            lang: job.lang,
            version: job.version,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    jobs: usize,
    needs_reembed: bool,
}

#[derive(Serialize)]
struct NarrativeResponse {
    narrative: String,
}

/// Map a core error to an HTTP response with an `{"error": ...}` body
fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::InvalidQuery(_)
        | Error::InvalidInput(_)
        | Error::InvalidDimension { .. }
        | Error::UnsupportedLanguage(_) => HttpResponse::BadRequest().json(body),
        Error::JobNotFound(_) | Error::SkillNotFound(_) => HttpResponse::NotFound().json(body),
        Error::EmbeddingUnavailable(_) | Error::Generation(_) => {
            HttpResponse::ServiceUnavailable().json(body)
        }
        _ => {
            warn!(error = %e, "Request failed");
            HttpResponse::InternalServerError().json(body)
        }
    }
}

/// Register every route and the JSON error handler
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "error": err.to_string() });
        error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    });

    cfg.app_data(json_config)
        .route("/health", web::get().to(health))
        .route("/skills", web::post().to(add_skill))
        .route("/jobs", web::post().to(add_job))
        .route("/jobs", web::get().to(list_jobs))
        .route("/jobs/reembed", web::post().to(reembed_jobs))
        .route("/jobs/{id}", web::get().to(get_job))
        .route("/jobs/{id}", web::delete().to(delete_job))
        .route("/match", web::post().to(match_skills))
        .route("/narrative", web::post().to(narrative));
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: web::Data<AppState>, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(state.clone())
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.jobs.count() {
        Ok(jobs) => Ok(HttpResponse::Ok().json(HealthResponse {
            status: "ok",
            jobs,
            needs_reembed: state.jobs.needs_reembed(),
        })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn add_skill(
    state: web::Data<AppState>,
    req: web::Json<AddSkillRequest>,
) -> ActixResult<HttpResponse> {
    match state.ingestor.add_skill(&req.text, req.lang) {
        Ok(id) => Ok(HttpResponse::Created().json(CreatedResponse { id: id.0 })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn add_job(
    state: web::Data<AppState>,
    req: web::Json<AddJobRequest>,
) -> ActixResult<HttpResponse> {
    match state.ingestor.add_job(&req.title, &req.description, req.lang) {
        Ok(id) => Ok(HttpResponse::Created().json(CreatedResponse { id: id.0 })),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_jobs(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    match state.jobs.list_all() {
        Ok(jobs) => {
            let views: Vec<JobView> = jobs.into_iter().map(JobView::from).collect();
            Ok(HttpResponse::Ok().json(views))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_job(state: web::Data<AppState>, path: web::Path<u64>) -> ActixResult<HttpResponse> {
    match state.jobs.get(JobId(path.into_inner())) {
        Ok(job) => Ok(HttpResponse::Ok().json(JobView::from(job))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn delete_job(state: web::Data<AppState>, path: web::Path<u64>) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match state.jobs.delete(JobId(id)) {
        Ok(()) => {
            debug!(job_id = id, "Job deleted");
            Ok(HttpResponse::Ok().json(serde_json::json!({ "deleted": id })))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

async fn reembed_jobs(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let result = web::block(move || state.ingestor.reembed_all()).await?;
    match result {
        Ok(report) => Ok(HttpResponse::Ok().json(report)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn match_skills(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
) -> ActixResult<HttpResponse> {
    let query = req.into_inner().into_query();
    let response = state
        .engine
        .match_query(&query)
        .and_then(|outcome| enrich(&outcome, state.jobs.as_ref(), &state.catalog));

    match response {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn narrative(
    state: web::Data<AppState>,
    req: web::Json<MatchRequest>,
) -> ActixResult<HttpResponse> {
    let query = req.into_inner().into_query();
    match state.narrative.generate(&query) {
        Ok(narrative) => Ok(HttpResponse::Ok().json(NarrativeResponse { narrative })),
        Err(e) => Ok(error_response(&e)),
    }
}
