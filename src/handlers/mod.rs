use askama::Template;
use axum::{
  extract::{Query, State},
  http::header,
  response::{Html, IntoResponse, Redirect},
  Form,
};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::fmt::Write;
use uuid::Uuid;

use crate::auth::Authorized;
use crate::db;
use crate::domain::{number_and_unit, Deed, DeedView, PeriodUnit};
use crate::error::AppError;
use crate::state::AppState;

/// Font sizes covered by the generated stylesheet, in px
const FONT_SIZES: std::ops::RangeInclusive<u32> = 14..=64;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
  pub deeds: Vec<DeedView>,
}

#[derive(Template)]
#[template(path = "deed.html")]
pub struct DeedTemplate {
  pub deed: DeedView,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
  /// Empty for a new deed
  pub id: String,
  pub name: String,
  pub period_number: i64,
  pub units: Vec<UnitOption>,
}

pub struct UnitOption {
  pub code: &'static str,
  pub label: &'static str,
  pub selected: bool,
}

#[derive(Template)]
#[template(path = "warning.html")]
pub struct WarningTemplate {
  pub text: String,
}

#[derive(Deserialize)]
pub struct IdQuery {
  #[serde(default)]
  pub id: String,
}

#[derive(Deserialize)]
pub struct WarningQuery {
  #[serde(default)]
  pub text: String,
}

#[derive(Deserialize)]
pub struct DeedForm {
  #[serde(default)]
  pub name: String,
  /// Number of `dim` units
  #[serde(default)]
  pub period: String,
  /// Unit code: s, m, h, d or w
  #[serde(default)]
  pub dim: String,
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
  Uuid::parse_str(id).map_err(|_| AppError::InvalidId(id.to_string()))
}

/// Empty id means "new deed"
fn parse_optional_id(id: &str) -> Result<Option<Uuid>, AppError> {
  if id.is_empty() {
    Ok(None)
  } else {
    parse_id(id).map(Some)
  }
}

fn parse_period(form: &DeedForm) -> Result<Duration, AppError> {
  let count: i64 = form
    .period
    .trim()
    .parse()
    .ok()
    .filter(|n| *n >= 0)
    .ok_or_else(|| AppError::InvalidPeriod(form.period.clone()))?;
  let unit =
    PeriodUnit::from_str(form.dim.trim()).ok_or_else(|| AppError::InvalidUnit(form.dim.clone()))?;

  count
    .checked_mul(unit.seconds())
    .and_then(Duration::try_seconds)
    .ok_or_else(|| AppError::InvalidPeriod(form.period.clone()))
}

/// GET / - All deeds ordered by name
pub async fn index(
  State(state): State<AppState>,
  _auth: Authorized,
) -> Result<Html<String>, AppError> {
  let deeds = {
    let conn = db::try_lock(&state.db)?;
    db::list_deeds(&conn)?
  };

  let now = Utc::now();
  let template = IndexTemplate {
    deeds: deeds.iter().map(|deed| deed.view_at(now)).collect(),
  };
  Ok(Html(template.render()?))
}

/// GET /deed?id= - Single deed
pub async fn deed(
  State(state): State<AppState>,
  _auth: Authorized,
  Query(query): Query<IdQuery>,
) -> Result<Html<String>, AppError> {
  let id = parse_id(&query.id)?;
  let deed = {
    let conn = db::try_lock(&state.db)?;
    db::get_deed(&conn, &id)?.ok_or(AppError::NotFound(query.id))?
  };

  let template = DeedTemplate {
    deed: deed.view_at(Utc::now()),
  };
  Ok(Html(template.render()?))
}

/// GET /edit[?id=] - Edit form, blank for a new deed
pub async fn edit(
  State(state): State<AppState>,
  _auth: Authorized,
  Query(query): Query<IdQuery>,
) -> Result<Html<String>, AppError> {
  let existing = match parse_optional_id(&query.id)? {
    Some(id) => {
      let conn = db::try_lock(&state.db)?;
      Some(db::get_deed(&conn, &id)?.ok_or(AppError::NotFound(query.id.clone()))?)
    }
    None => None,
  };

  let (id, name, period) = match existing {
    Some(deed) => (deed.id.to_string(), deed.name, deed.period),
    None => (String::new(), String::new(), PeriodUnit::Day.duration()),
  };
  let (period_number, period_unit) = number_and_unit(period);

  let template = EditTemplate {
    id,
    name,
    period_number,
    units: PeriodUnit::ALL
      .iter()
      .rev()
      .map(|unit| UnitOption {
        code: unit.as_str(),
        label: unit.label(),
        selected: *unit == period_unit,
      })
      .collect(),
  };
  Ok(Html(template.render()?))
}

/// POST /add[?id=] - Create a deed, or update name and period of an existing one
pub async fn add(
  State(state): State<AppState>,
  _auth: Authorized,
  Query(query): Query<IdQuery>,
  Form(form): Form<DeedForm>,
) -> Result<Redirect, AppError> {
  let id = parse_optional_id(&query.id)?;
  let name = form.name.trim();
  if name.is_empty() {
    return Err(AppError::MissingName);
  }
  let period = parse_period(&form)?;

  let conn = db::try_lock(&state.db)?;
  let deed = match id {
    Some(id) => {
      let mut deed = db::get_deed(&conn, &id)?.ok_or(AppError::NotFound(query.id))?;
      deed.name = name.to_string();
      deed.period = period;
      deed
    }
    None => Deed::new(name.to_string(), period),
  };
  db::upsert_deed(&conn, &deed)?;
  tracing::info!(deed = %deed.id, name = %deed.name, "Saved deed");

  Ok(Redirect::to("/"))
}

/// GET /update?id= - Mark a deed as done now
pub async fn update(
  State(state): State<AppState>,
  _auth: Authorized,
  Query(query): Query<IdQuery>,
) -> Result<Redirect, AppError> {
  let id = parse_id(&query.id)?;
  let conn = db::try_lock(&state.db)?;
  db::touch_deed(&conn, &id)?.ok_or(AppError::NotFound(query.id))?;
  Ok(Redirect::to("/"))
}

/// GET /delete?id=
pub async fn delete(
  State(state): State<AppState>,
  _auth: Authorized,
  Query(query): Query<IdQuery>,
) -> Result<Redirect, AppError> {
  let id = parse_id(&query.id)?;
  let conn = db::try_lock(&state.db)?;
  if !db::delete_deed(&conn, &id)? {
    return Err(AppError::NotFound(query.id));
  }
  tracing::info!(deed = %id, "Deleted deed");
  Ok(Redirect::to("/"))
}

/// GET /logout - End the session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
  (state.sessions.end(jar), Redirect::to("/"))
}

/// GET /warning?text=
pub async fn warning(Query(query): Query<WarningQuery>) -> Result<Html<String>, AppError> {
  let template = WarningTemplate { text: query.text };
  Ok(Html(template.render()?))
}

/// GET /fontsizes.css - Font size scaled to the viewport width
pub async fn font_sizes() -> impl IntoResponse {
  ([(header::CONTENT_TYPE, "text/css")], font_sizes_css())
}

fn font_sizes_css() -> String {
  let mut css = String::new();
  for size in FONT_SIZES {
    let _ = write!(
      css,
      "@media screen and (min-width: {}px) {{\n  * {{\n    font-size: {}px;\n  }}\n}}\n\n",
      size * 10,
      size
    );
  }
  css
}
