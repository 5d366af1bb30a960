//! Single binary web server: HTML from templates/, static from /static, API via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, DATA_DIR (snapshot directory, default "data").

use actix_files::Files;
use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{self, Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use dart_scheduler_web::{
    adjust_match_score, all_standings, champion, clear_match_score, create_knockout_stage, generate_tournament,
    knockout_rounds, read_team_names, record_knockout_score, record_match_score, schedule_csv, team_schedule,
    Competition, CompetitionId, FileStore, KnockoutRound, MatchId, Phase, Settings, Slot, Standing,
    SnapshotWriter, TournamentError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-competition entry: competition data + last activity time (for auto-cleanup).
struct CompetitionEntry {
    competition: Competition,
    last_activity: Instant,
}

impl CompetitionEntry {
    fn new(competition: Competition) -> Self {
        Self {
            competition,
            last_activity: Instant::now(),
        }
    }
}

/// In-memory working set keyed by id. Idle entries are evicted and reloaded from disk on demand.
type AppState = Data<RwLock<HashMap<CompetitionId, CompetitionEntry>>>;
type Store = Data<SnapshotWriter>;

/// Inactivity threshold: competitions not accessed for this long leave memory.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

/// Session key holding the caller's current competition id.
const SESSION_COMPETITION: &str = "competition_id";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Competition plus everything derived from it, as the client renders it.
#[derive(Serialize)]
struct CompetitionView<'a> {
    #[serde(flatten)]
    competition: &'a Competition,
    phase: Phase,
    standings: Vec<Vec<Standing>>,
    knockout_rounds: Vec<KnockoutRound>,
    champion: Option<&'a str>,
}

impl<'a> CompetitionView<'a> {
    fn new(competition: &'a Competition) -> Self {
        Self {
            competition,
            phase: competition.phase(),
            standings: competition.tournament.as_ref().map(all_standings).unwrap_or_default(),
            knockout_rounds: knockout_rounds(&competition.knockout_matches),
            champion: champion(&competition.knockout_matches),
        }
    }
}

#[derive(Deserialize)]
struct TeamNamesBody {
    team_names: Vec<String>,
}

#[derive(Deserialize)]
struct NumTeamsBody {
    num_teams: u32,
}

#[derive(Deserialize)]
struct RenameTeamBody {
    old_name: String,
    new_name: String,
}

#[derive(Deserialize)]
struct ScoreBody {
    score1: u32,
    score2: u32,
}

#[derive(Deserialize)]
struct AdjustScoreBody {
    team: Slot,
    change: i32,
}

/// Path segment: competition id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: CompetitionId,
}

/// Path segments: competition id and match id
#[derive(Deserialize)]
struct MatchPath {
    id: CompetitionId,
    match_id: MatchId,
}

/// Path segments: competition id and team name
#[derive(Deserialize)]
struct TeamPath {
    id: CompetitionId,
    name: String,
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

fn bad_request(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Make sure `id` is in memory, reading its snapshot if it was evicted.
async fn ensure_loaded(state: &AppState, store: &Store, id: CompetitionId) -> Result<(), HttpResponse> {
    let present = state.read().map_err(|_| lock_error())?.contains_key(&id);
    if present {
        return Ok(());
    }
    match store.files().load(id).await {
        Ok(Some(competition)) => {
            log::info!("Reloaded tournament {} from disk", id);
            state
                .write()
                .map_err(|_| lock_error())?
                .entry(id)
                .or_insert_with(|| CompetitionEntry::new(competition));
            Ok(())
        }
        Ok(None) => Err(not_found()),
        Err(e) => {
            log::error!("Could not load tournament {}: {}", id, e);
            Err(HttpResponse::InternalServerError().body("storage error"))
        }
    }
}

/// Apply `f` to one competition. On success a snapshot is queued and the new view returned;
/// on error nothing changed and the error is reported as 400.
async fn update<F>(state: &AppState, store: &Store, id: CompetitionId, f: F) -> HttpResponse
where
    F: FnOnce(&mut Competition) -> Result<(), TournamentError>,
{
    if let Err(resp) = ensure_loaded(state, store, id).await {
        return resp;
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let entry = match g.get_mut(&id) {
        Some(e) => e,
        None => return not_found(),
    };
    entry.last_activity = Instant::now();
    match f(&mut entry.competition) {
        Ok(()) => {
            store.save(entry.competition.clone());
            HttpResponse::Ok().json(CompetitionView::new(&entry.competition))
        }
        Err(e) => bad_request(e),
    }
}

/// Read-only access to one competition. Touching it refreshes last_activity.
async fn inspect<F>(state: &AppState, store: &Store, id: CompetitionId, f: F) -> HttpResponse
where
    F: FnOnce(&Competition) -> HttpResponse,
{
    if let Err(resp) = ensure_loaded(state, store, id).await {
        return resp;
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get_mut(&id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            f(&entry.competition)
        }
        None => not_found(),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "dart-scheduler-web",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a competition (optional settings body). Its id is remembered in the session.
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    store: Store,
    session: Session,
    body: Option<Json<Settings>>,
) -> HttpResponse {
    let settings = body.map(Json::into_inner).unwrap_or_default();
    if let Err(e) = settings.validate() {
        return bad_request(e);
    }
    let competition = Competition::new(settings);
    let id = competition.id;
    if let Err(e) = session.insert(SESSION_COMPETITION, id) {
        log::warn!("Could not store tournament id in session: {}", e);
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    store.save(competition.clone());
    let entry = g.entry(id).or_insert_with(|| CompetitionEntry::new(competition));
    log::info!("Created tournament {}", id);
    HttpResponse::Ok().json(CompetitionView::new(&entry.competition))
}

/// Id of the competition this browser session created last.
#[get("/api/session/tournament")]
async fn api_session_tournament(session: Session) -> HttpResponse {
    match session.get::<CompetitionId>(SESSION_COMPETITION) {
        Ok(Some(id)) => HttpResponse::Ok().json(serde_json::json!({ "id": id })),
        Ok(None) => not_found(),
        Err(e) => bad_request(e),
    }
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    inspect(&state, &store, path.id, |c| HttpResponse::Ok().json(CompetitionView::new(c))).await
}

/// Delete a competition from memory and disk.
#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    // Evicted competitions only exist on disk.
    if let Err(resp) = ensure_loaded(&state, &store, path.id).await {
        return resp;
    }
    match state.write() {
        Ok(mut g) => g.remove(&path.id),
        Err(_) => return lock_error(),
    };
    if let Err(e) = store.remove(path.id).await {
        log::warn!("Could not delete snapshot of {}: {}", path.id, e);
        return HttpResponse::InternalServerError().body("storage error");
    }
    log::info!("Deleted tournament {}", path.id);
    HttpResponse::NoContent().finish()
}

#[put("/api/tournaments/{id}/settings")]
async fn api_set_settings(
    state: AppState,
    store: Store,
    path: Path<TournamentPath>,
    body: Json<Settings>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| c.set_settings(body.into_inner())).await
}

#[post("/api/tournaments/{id}/settings/reset")]
async fn api_reset_settings(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    update(&state, &store, path.id, |c| {
        c.reset_settings();
        Ok(())
    })
    .await
}

/// Replace the roster (Setup only).
#[put("/api/tournaments/{id}/teams")]
async fn api_set_teams(
    state: AppState,
    store: Store,
    path: Path<TournamentPath>,
    body: Json<TeamNamesBody>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| c.set_team_names(&body.team_names)).await
}

/// Reset the roster to N default names (Setup only).
#[post("/api/tournaments/{id}/teams/default")]
async fn api_default_teams(
    state: AppState,
    store: Store,
    path: Path<TournamentPath>,
    body: Json<NumTeamsBody>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| c.initialize_team_names(body.num_teams)).await
}

/// Replace the roster from a CSV body (first column).
#[post("/api/tournaments/{id}/teams/import")]
async fn api_import_teams(state: AppState, store: Store, path: Path<TournamentPath>, body: String) -> HttpResponse {
    let names = match read_team_names(body.as_bytes()) {
        Ok(names) => names,
        Err(e) => return bad_request(e),
    };
    update(&state, &store, path.id, |c| c.set_team_names(&names)).await
}

/// Rename a team everywhere it appears.
#[put("/api/tournaments/{id}/teams/rename")]
async fn api_rename_team(
    state: AppState,
    store: Store,
    path: Path<TournamentPath>,
    body: Json<RenameTeamBody>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| c.rename_team(&body.old_name, &body.new_name)).await
}

/// One team's group matches in playing order.
#[get("/api/tournaments/{id}/teams/{name}/schedule")]
async fn api_team_schedule(state: AppState, store: Store, path: Path<TeamPath>) -> HttpResponse {
    inspect(&state, &store, path.id, |c| match &c.tournament {
        Some(t) if t.contains_team(&path.name) => HttpResponse::Ok().json(team_schedule(t, &path.name)),
        Some(_) => bad_request(TournamentError::TeamNotFound(path.name.clone())),
        None => HttpResponse::Ok().json(Vec::<()>::new()),
    })
    .await
}

/// Draw groups and schedule the group stage (replaces any existing one).
#[post("/api/tournaments/{id}/generate")]
async fn api_generate(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    update(&state, &store, path.id, generate_tournament).await
}

#[put("/api/tournaments/{id}/matches/{match_id}/score")]
async fn api_set_match_score(
    state: AppState,
    store: Store,
    path: Path<MatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| {
        record_match_score(c.tournament_mut()?, path.match_id, body.score1, body.score2)
    })
    .await
}

/// +/- one side's score of a group match.
#[post("/api/tournaments/{id}/matches/{match_id}/adjust")]
async fn api_adjust_match_score(
    state: AppState,
    store: Store,
    path: Path<MatchPath>,
    body: Json<AdjustScoreBody>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| {
        adjust_match_score(c.tournament_mut()?, path.match_id, body.team, body.change)
    })
    .await
}

#[delete("/api/tournaments/{id}/matches/{match_id}/score")]
async fn api_clear_match_score(state: AppState, store: Store, path: Path<MatchPath>) -> HttpResponse {
    update(&state, &store, path.id, |c| clear_match_score(c.tournament_mut()?, path.match_id)).await
}

/// Build (or rebuild) the knockout bracket from current standings.
#[post("/api/tournaments/{id}/knockout")]
async fn api_create_knockout(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    update(&state, &store, path.id, create_knockout_stage).await
}

#[delete("/api/tournaments/{id}/knockout")]
async fn api_reset_knockout(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    update(&state, &store, path.id, |c| {
        c.reset_knockout();
        Ok(())
    })
    .await
}

#[put("/api/tournaments/{id}/knockout/{match_id}/score")]
async fn api_set_knockout_score(
    state: AppState,
    store: Store,
    path: Path<MatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    update(&state, &store, path.id, |c| {
        record_knockout_score(c, path.match_id, body.score1, body.score2)
    })
    .await
}

/// Group and knockout matches as CSV.
#[get("/api/tournaments/{id}/schedule.csv")]
async fn api_schedule_csv(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    inspect(&state, &store, path.id, |c| {
        let mut matches = c.tournament.as_ref().map(|t| t.matches.clone()).unwrap_or_default();
        matches.extend(c.knockout_matches.iter().cloned());
        match schedule_csv(&matches) {
            Ok(body) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(body),
            Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
        }
    })
    .await
}

/// Discard the group stage and bracket; keep settings and roster.
#[post("/api/tournaments/{id}/reset")]
async fn api_reset_tournament(state: AppState, store: Store, path: Path<TournamentPath>) -> HttpResponse {
    update(&state, &store, path.id, |c| {
        c.reset();
        Ok(())
    })
    .await
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| default_data_dir());
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let files = FileStore::new(data_dir);
    let mut competitions = HashMap::new();
    match files.load_all().await {
        Ok(stored) => {
            for c in stored {
                competitions.insert(c.id, CompetitionEntry::new(c));
            }
        }
        Err(e) => log::warn!("Could not read stored tournaments: {}", e),
    }
    log::info!(
        "Loaded {} stored tournament(s) from {}",
        competitions.len(),
        files.dir().display()
    );

    let state = Data::new(RwLock::new(competitions));
    let store = Data::new(SnapshotWriter::spawn(files));
    let session_key = Key::generate();

    // Background task: every 30 minutes, evict tournaments inactive for 12+ hours (snapshots stay on disk)
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Evicted {} inactive tournament(s) from memory (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(state.clone())
            .app_data(store.clone())
            .route("/", web::get().to(serve_index_async))
            .service(api_health)
            .service(favicon)
            .service(api_create_tournament)
            .service(api_session_tournament)
            .service(api_get_tournament)
            .service(api_delete_tournament)
            .service(api_set_settings)
            .service(api_reset_settings)
            .service(api_set_teams)
            .service(api_default_teams)
            .service(api_import_teams)
            .service(api_rename_team)
            .service(api_team_schedule)
            .service(api_generate)
            .service(api_set_match_score)
            .service(api_adjust_match_score)
            .service(api_clear_match_score)
            .service(api_create_knockout)
            .service(api_reset_knockout)
            .service(api_set_knockout_score)
            .service(api_schedule_csv)
            .service(api_reset_tournament)
            .service(Files::new("/static", "static"))
    })
    .bind(bind)?
    .run()
    .await
}

async fn serve_index_async() -> HttpResponse {
    let html = include_str!("../../templates/index.html");
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html)
}
