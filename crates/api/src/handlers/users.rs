use crate::error::ApiResult;
use crate::validation::ValidatedQuery;
use crate::AppState;
use axum::{extract::State, Json};
use nexusqr_database::UserRepository;
use nexusqr_models::{Page, PageOptions, UserProfile};
use std::sync::Arc;

/// List users, paginated
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(PageOptions),
    responses(
        (status = 200, description = "One page of users", body = Page<UserProfile>),
        (status = 400, description = "Invalid page options", body = crate::error::ErrorBody)
    ),
    security(("access-token" = []))
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(options): ValidatedQuery<PageOptions>,
) -> ApiResult<Json<Page<UserProfile>>> {
    let repository = UserRepository::new(state.database.pool().clone());

    let item_count = repository.count().await?;
    let users = repository.list(options).await?;

    let base_link = format!(
        "{}{}/users",
        state.config.app_url.trim_end_matches('/'),
        state.config.api_prefix
    );
    let data = users.into_iter().map(UserProfile::from).collect();

    Ok(Json(Page::new(data, options, item_count, &base_link)))
}
