//! Server-rendered HTML pages.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::ergast::{DriverStanding, Race};
use crate::routes::AppState;
use crate::storage::repository::StoredSettings;
use crate::types::SettingsForm;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("analytics.html", include_str!("../templates/analytics.html")),
    ("settings.html", include_str!("../templates/settings.html")),
];

/// Compiled page templates. `.html` templates are auto-escaped.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }

    /// Render a page, or a 500 if the template fails.
    fn page<S: Serialize>(&self, status: StatusCode, name: &str, ctx: S) -> Response {
        match self.render(name, ctx) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!("Error rendering {}: {}", name, e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Show only the last four characters of a stored key.
fn mask(key: Option<&str>) -> String {
    match key {
        Some(k) if k.chars().count() > 4 => {
            let tail: String = k.chars().skip(k.chars().count() - 4).collect();
            format!("••••{}", tail)
        }
        Some(_) => "••••".to_string(),
        None => "not set".to_string(),
    }
}

#[derive(Serialize)]
struct RaceRow<'a> {
    round: &'a str,
    name: &'a str,
    circuit: &'a str,
    date: Option<&'a str>,
}

impl<'a> From<&'a Race> for RaceRow<'a> {
    fn from(race: &'a Race) -> Self {
        Self {
            round: &race.round,
            name: &race.race_name,
            circuit: &race.circuit.circuit_name,
            date: race.date.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct StandingRow<'a> {
    position: &'a str,
    driver: String,
    team: &'a str,
    points: &'a str,
    wins: &'a str,
}

impl<'a> From<&'a DriverStanding> for StandingRow<'a> {
    fn from(standing: &'a DriverStanding) -> Self {
        Self {
            position: standing.display_position(),
            driver: standing.driver.full_name(),
            team: standing
                .constructors
                .first()
                .map(|c| c.name.as_str())
                .unwrap_or(""),
            points: &standing.points,
            wins: &standing.wins,
        }
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    state.templates.page(StatusCode::OK, "index.html", context! {})
}

pub async fn analytics(State(state): State<Arc<AppState>>) -> Response {
    let races = state.ergast.current_season().await;
    let standings = state.ergast.driver_standings(None).await;

    let races: Vec<RaceRow> = races.iter().map(RaceRow::from).collect();
    let standings: Vec<StandingRow> = standings.iter().map(StandingRow::from).collect();

    state.templates.page(
        StatusCode::OK,
        "analytics.html",
        context! { races, standings },
    )
}

fn settings_context(
    settings: Option<&StoredSettings>,
    message: Option<&str>,
) -> minijinja::Value {
    let credentials = settings.map(|s| s.credentials.clone()).unwrap_or_default();
    context! {
        gemini => mask(credentials.primary()),
        groq => mask(credentials.secondary()),
        created_at => settings.map(|s| s.created_at.as_str()),
        updated_at => settings.map(|s| s.updated_at.as_str()),
        message,
    }
}

pub async fn settings_page(State(state): State<Arc<AppState>>) -> Response {
    match state.repository.get_settings() {
        Ok(settings) => state.templates.page(
            StatusCode::OK,
            "settings.html",
            settings_context(settings.as_ref(), None),
        ),
        Err(e) => {
            error!("Error loading settings: {}", e);
            state.templates.page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "settings.html",
                settings_context(None, Some("Failed to load settings.")),
            )
        }
    }
}

pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SettingsForm>,
) -> Response {
    let gemini = form.gemini_api_key.trim();
    let groq = form.groq_api_key.trim();

    match state.repository.save_settings(gemini, groq) {
        Ok(()) => Redirect::to("/settings").into_response(),
        Err(e) => {
            error!("Error saving settings: {}", e);
            state.templates.page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "settings.html",
                settings_context(None, Some("Failed to save settings. Please try again.")),
            )
        }
    }
}
