//! API route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::ai::predictor::{driver_analysis_error, strategy_error};
use crate::ai::{ModelFactory, RaceForecast, RacePredictor};
use crate::config::AppConfig;
use crate::ergast::{
    CareerStats, Circuit, ConstructorStanding, DriverStanding, ErgastClient, Lap, Race,
};
use crate::pages::{self, Templates};
use crate::storage::{
    ApiCredentials, CredentialProvider, NewPrediction, NewRace, Repository, StoredPrediction,
    StoredRace,
};
use crate::telemetry::TelemetrySnapshot;
use crate::types::{ErrorResponse, HealthResponse, LapQuery};

/// Application state shared across handlers.
pub struct AppState {
    pub ergast: ErgastClient,
    pub models: ModelFactory,
    pub repository: Arc<Repository>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub templates: Templates,
}

impl AppState {
    /// State whose credentials come from the settings table.
    pub fn new(config: AppConfig, repository: Arc<Repository>) -> anyhow::Result<Self> {
        Ok(Self {
            ergast: ErgastClient::new(&config.ergast)?,
            models: ModelFactory::new(&config)?,
            credentials: repository.clone(),
            repository,
            templates: Templates::new()?,
        })
    }
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

const KEYS_NOT_CONFIGURED: &str = "API keys not configured";

/// All page and API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/analytics", get(pages::analytics))
        .route("/settings", get(pages::settings_page).post(pages::save_settings))
        .route("/health", get(health))
        .route("/api/race-data/{season}/{round}", get(race_data))
        .route("/api/races", get(list_races))
        .route("/api/predictions/{race_id}", get(predictions))
        .route("/api/predictions/{race_id}/history", get(prediction_history))
        .route("/api/driver-analysis/{driver_name}", get(driver_analysis))
        .route("/api/strategy", post(strategy))
        .route("/api/telemetry-data", get(telemetry_data))
        .route("/api/season/{season}", get(season))
        .route("/api/standings/drivers/{season}", get(driver_standings))
        .route("/api/standings/constructors/{season}", get(constructor_standings))
        .route("/api/qualifying/{season}/{round}", get(qualifying))
        .route("/api/circuits/{circuit_id}", get(circuit))
        .route("/api/drivers/{driver_id}/career", get(driver_career))
        .route("/api/laps/{season}/{round}", get(lap_times))
        .with_state(state)
}

/// Credentials with a usable primary key, or the 400 error.
fn require_credentials(state: &AppState) -> Result<ApiCredentials, ApiError> {
    let credentials = state.credentials.credentials().map_err(|e| {
        error!("Error reading settings: {}", e);
        ApiError::internal(format!("Failed to read settings: {}", e))
    })?;

    credentials
        .filter(|c| c.primary().is_some())
        .ok_or_else(|| ApiError::bad_request(KEYS_NOT_CONFIGURED))
}

fn predictor_for(state: &AppState) -> Result<RacePredictor, ApiError> {
    let credentials = require_credentials(state)?;
    state
        .models
        .predictor(&credentials)
        .map_err(|_| ApiError::bad_request(KEYS_NOT_CONFIGURED))
}

/// Race used for predictions when the requested race is not stored.
pub fn sample_race_data() -> Value {
    json!({
        "raceName": "Sample Grand Prix",
        "Circuit": {
            "circuitName": "Sample Circuit",
            "Location": {
                "locality": "Sample City",
                "country": "Sample Country"
            }
        },
        "date": "2025-01-01",
        "drivers": [
            {"driverId": "verstappen", "code": "VER", "givenName": "Max", "familyName": "Verstappen"},
            {"driverId": "hamilton", "code": "HAM", "givenName": "Lewis", "familyName": "Hamilton"},
            {"driverId": "leclerc", "code": "LEC", "givenName": "Charles", "familyName": "Leclerc"},
            {"driverId": "russell", "code": "RUS", "givenName": "George", "familyName": "Russell"},
            {"driverId": "sainz", "code": "SAI", "givenName": "Carlos", "familyName": "Sainz"}
        ]
    })
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Race results for one round. The race is cached the first time it is seen.
pub async fn race_data(
    State(state): State<Arc<AppState>>,
    Path((season, round)): Path<(i32, u32)>,
) -> Json<Option<Race>> {
    let race = state.ergast.race_results(season, round).await;

    if let Some(race) = &race {
        if let Err(e) = cache_race(&state.repository, season, round, race) {
            warn!("Failed to cache race {}/{}: {}", season, round, e);
        }
    }

    Json(race)
}

fn cache_race(
    repository: &Repository,
    season: i32,
    round: u32,
    race: &Race,
) -> anyhow::Result<()> {
    if repository.find_race(season, round)?.is_some() {
        return Ok(());
    }
    let id = repository.insert_race(&NewRace::try_from(race)?)?;
    debug!("Cached {} as race {}", race.race_name, id);
    Ok(())
}

pub async fn list_races(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredRace>>, ApiError> {
    state
        .repository
        .list_races()
        .map(Json)
        .map_err(|e| ApiError::internal(format!("Failed to list races: {}", e)))
}

/// AI predictions for a stored race, or for the sample race if it is unknown.
pub async fn predictions(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let predictor = predictor_for(&state)?;

    let stored = state
        .repository
        .get_race(race_id)
        .map_err(|e| ApiError::internal(format!("Failed to generate predictions: {}", e)))?;

    let (race_data, persist) = prediction_input(race_id, stored.as_ref());
    let forecast = predictor.generate_race_predictions(&race_data).await;

    if persist {
        store_forecast(&state.repository, race_id, &forecast);
    }

    Ok(Json(forecast.into_payload()))
}

/// Race JSON to predict, and whether the result belongs to the stored race.
///
/// A missing race, or one whose stored JSON is unusable, is replaced by the
/// sample race and its predictions are not persisted.
fn prediction_input(race_id: i64, stored: Option<&StoredRace>) -> (Value, bool) {
    match stored.and_then(StoredRace::race_data) {
        Some(data) => (data, true),
        None => {
            debug!("Race {} has no usable data, predicting the sample race", race_id);
            (sample_race_data(), false)
        }
    }
}

/// Persist one row per predicted driver. Fallback forecasts are not stored.
fn store_forecast(repository: &Repository, race_id: i64, forecast: &RaceForecast) {
    if let Some(reason) = forecast.fallback_reason() {
        debug!("Not storing fallback forecast for race {}: {}", race_id, reason);
        return;
    }

    let mut stored = 0;
    for prediction in forecast.driver_predictions() {
        let row = NewPrediction {
            race_id,
            driver_name: prediction.driver.clone(),
            predicted_position: prediction.position,
            confidence_score: prediction.confidence,
            prediction_data: serde_json::to_value(&prediction).unwrap_or(Value::Null),
        };
        match repository.insert_prediction(&row) {
            Ok(_) => stored += 1,
            Err(e) => warn!("Failed to store prediction for {}: {}", row.driver_name, e),
        }
    }
    info!("Stored {} predictions for race {}", stored, race_id);
}

pub async fn prediction_history(
    State(state): State<Arc<AppState>>,
    Path(race_id): Path<i64>,
) -> Result<Json<Vec<StoredPrediction>>, ApiError> {
    state
        .repository
        .get_predictions(race_id)
        .map(Json)
        .map_err(|e| ApiError::internal(format!("Failed to load predictions: {}", e)))
}

pub async fn driver_analysis(
    State(state): State<Arc<AppState>>,
    Path(driver_name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let predictor = predictor_for(&state)?;

    let body = match predictor.analyze_driver_performance(&driver_name).await {
        Ok(analysis) => analysis,
        Err(e) => json!({ "error": driver_analysis_error(&e) }),
    };
    Ok(Json(body))
}

pub async fn strategy(
    State(state): State<Arc<AppState>>,
    Json(race_conditions): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let predictor = predictor_for(&state)?;

    let body = match predictor
        .generate_strategy_recommendations(&race_conditions)
        .await
    {
        Ok(recommendations) => recommendations,
        Err(e) => json!({ "error": strategy_error(&e) }),
    };
    Ok(Json(body))
}

pub async fn telemetry_data() -> Json<TelemetrySnapshot> {
    Json(TelemetrySnapshot::dashboard())
}

pub async fn season(
    State(state): State<Arc<AppState>>,
    Path(season): Path<i32>,
) -> Json<Vec<Race>> {
    Json(state.ergast.season_schedule(season).await)
}

pub async fn driver_standings(
    State(state): State<Arc<AppState>>,
    Path(season): Path<i32>,
) -> Json<Vec<DriverStanding>> {
    Json(state.ergast.driver_standings(Some(season)).await)
}

pub async fn constructor_standings(
    State(state): State<Arc<AppState>>,
    Path(season): Path<i32>,
) -> Json<Vec<ConstructorStanding>> {
    Json(state.ergast.constructor_standings(Some(season)).await)
}

pub async fn qualifying(
    State(state): State<Arc<AppState>>,
    Path((season, round)): Path<(i32, u32)>,
) -> Json<Option<Race>> {
    Json(state.ergast.qualifying_results(season, round).await)
}

pub async fn circuit(
    State(state): State<Arc<AppState>>,
    Path(circuit_id): Path<String>,
) -> Json<Option<Circuit>> {
    Json(state.ergast.circuit_info(&circuit_id).await)
}

pub async fn driver_career(
    State(state): State<Arc<AppState>>,
    Path(driver_id): Path<String>,
) -> Json<Option<CareerStats>> {
    Json(state.ergast.driver_career_stats(&driver_id).await)
}

pub async fn lap_times(
    State(state): State<Arc<AppState>>,
    Path((season, round)): Path<(i32, u32)>,
    Query(query): Query<LapQuery>,
) -> Json<Vec<Lap>> {
    Json(state.ergast.lap_times(season, round, query.lap).await)
}
