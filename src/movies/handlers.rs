use axum::{
    extract::{rejection::FormRejection, Query, State},
    routing::get,
    Form, Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    movies::{
        dto::{DetailForm, MovieCard, MovieDetails, SearchForm, SearchResponse},
        repo_types::Movie,
    },
    state::AppState,
};

const NO_RESULTS: &str = "Sorry, no results found.";

pub fn movie_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movies).post(movie_detail))
        .route("/search", get(search_query).post(search_form))
}

/// Refresh the catalog from the provider, then list everything cached. A
/// provider outage only means the list may be stale.
#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn list_movies(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<MovieCard>>> {
    if let Err(e) = state.catalog.refresh().await {
        warn!(error = %e, "catalog refresh failed; serving cached movies");
    }
    let movies = Movie::list_all(&state.db).await?;
    Ok(Json(movies.into_iter().map(MovieCard::from).collect()))
}

#[instrument(skip_all, fields(user_id = user.user_id, movie_id = tracing::field::Empty))]
pub async fn movie_detail(
    State(state): State<AppState>,
    user: AuthUser,
    form: Result<Form<DetailForm>, FormRejection>,
) -> AppResult<Json<MovieDetails>> {
    let Form(form) = form.map_err(|e| AppError::Validation(format!("invalid movie id: {e}")))?;
    tracing::Span::current().record("movie_id", form.movie_id);
    let movie = Movie::get(&state.db, form.movie_id).await?;
    let trailer_url = match state.trailers.resolve_trailer(&movie.title).await {
        Ok(link) => Some(link.into_string()),
        Err(e) => {
            warn!(error = %e, movie_id = movie.id, "trailer unavailable");
            None
        }
    };
    Ok(Json(MovieDetails::new(movie, trailer_url)))
}

#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn search_query(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SearchForm>,
) -> AppResult<Json<SearchResponse>> {
    run_search(&state, params.search).await
}

#[instrument(skip_all, fields(user_id = user.user_id))]
pub async fn search_form(
    State(state): State<AppState>,
    user: AuthUser,
    Form(form): Form<SearchForm>,
) -> AppResult<Json<SearchResponse>> {
    run_search(&state, form.search).await
}

async fn run_search(state: &AppState, term: Option<String>) -> AppResult<Json<SearchResponse>> {
    let query = term.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(AppError::Validation("No search term entered".into()));
    }
    let results: Vec<MovieCard> = Movie::search(&state.db, &query)
        .await?
        .into_iter()
        .map(MovieCard::from)
        .collect();
    let message = results.is_empty().then_some(NO_RESULTS);
    Ok(Json(SearchResponse {
        query,
        results,
        message,
    }))
}
