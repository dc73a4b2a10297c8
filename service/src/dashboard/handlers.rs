use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use honor_engine::{accrual, leaderboard, window, AccountStore, WipeConfirmation};
use honor_types::{ActionOutcome, CoinSide, ImportReport, UserAccount};

use super::error::{ApiError, ApiResult};
use super::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub accounts: usize,
    pub uptime_secs: i64,
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let now = Utc::now();
    let accounts = state.engine.store().count().await.map_err(|e| {
        ApiError::Unavailable(e.to_string())
    })?;
    Ok(Json(HealthResponse {
        status: "healthy",
        accounts,
        uptime_secs: now.signed_duration_since(state.started_at).num_seconds(),
    }))
}

#[derive(Serialize)]
pub struct AccountSummary {
    pub id: String,
    pub display_name: String,
    pub balance: u64,
    pub monthly_earned: u64,
    pub checkin_streak: u32,
}

pub async fn list_accounts(State(state): State<AppState>) -> ApiResult<Json<Vec<AccountSummary>>> {
    let now = Utc::now();
    let accounts = state
        .engine
        .store()
        .all()
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?;
    Ok(Json(
        accounts
            .into_iter()
            .map(|a| AccountSummary {
                monthly_earned: accrual::monthly_earned(&a, now),
                id: a.id,
                display_name: a.display_name,
                balance: a.balance,
                checkin_streak: a.checkin_streak,
            })
            .collect(),
    ))
}

#[derive(Serialize)]
pub struct AccountDetail {
    pub id: String,
    pub display_name: String,
    pub balance: u64,
    pub rank: usize,
    pub monthly_earned: u64,
    pub checkin_streak: u32,
    pub checkin_claimed_today: bool,
    pub next_checkin_reset: DateTime<Utc>,
    pub messages_today: u32,
    pub message_cooldown_remaining_secs: i64,
    pub wager_plays_today: u32,
    pub created_at: DateTime<Utc>,
}

pub async fn account_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountDetail>> {
    let now = Utc::now();
    let account = state
        .engine
        .account(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound(format!("account {id}")))?;
    let rank = leaderboard::rank_of(state.engine.store(), &id)
        .await
        .map_err(|e| ApiError::Unavailable(e.to_string()))?
        .unwrap_or(0);
    Ok(Json(detail(&account, rank, now, state.engine.config().message_cooldown_secs)))
}

fn detail(account: &UserAccount, rank: usize, now: DateTime<Utc>, cooldown_secs: i64) -> AccountDetail {
    let cooldown_remaining = if window::is_within_cooldown(now, account.last_reward_at, cooldown_secs)
    {
        cooldown_secs - now.signed_duration_since(account.last_reward_at).num_seconds()
    } else {
        0
    };
    // Counters are reported as the lazy reset would leave them.
    let messages_today = if window::is_new_utc_day(now, account.daily_window_started_at) {
        0
    } else {
        account.daily_reward_count
    };
    let wager_plays_today = if window::is_new_utc_day(now, account.last_wager_at) {
        0
    } else {
        account.daily_wager_count
    };

    AccountDetail {
        id: account.id.clone(),
        display_name: account.display_name.clone(),
        balance: account.balance,
        rank,
        monthly_earned: accrual::monthly_earned(account, now),
        checkin_streak: account.checkin_streak,
        checkin_claimed_today: window::is_same_utc_day(now, account.last_checkin_at),
        next_checkin_reset: window::next_utc_midnight(now),
        messages_today,
        message_cooldown_remaining_secs: cooldown_remaining.max(0),
        wager_plays_today,
        created_at: account.created_at,
    }
}

#[derive(Serialize)]
pub struct LeaderboardResponse {
    pub updated_at: Option<DateTime<Utc>>,
    pub entries: Vec<leaderboard::LeaderboardEntry>,
}

/// Latest rendering published by the leaderboard job.
pub async fn top_leaderboard(State(state): State<AppState>) -> Json<LeaderboardResponse> {
    let published = state.published.read().await;
    Json(LeaderboardResponse {
        updated_at: published.updated_at,
        entries: published.top.clone(),
    })
}

pub async fn monthly_leaderboard(State(state): State<AppState>) -> Json<LeaderboardResponse> {
    let published = state.published.read().await;
    Json(LeaderboardResponse {
        updated_at: published.updated_at,
        entries: published.monthly.clone(),
    })
}

#[derive(Deserialize)]
pub struct ActionRequest {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    pub event_id: Option<String>,
}

pub async fn checkin(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Json<ActionOutcome>> {
    let outcome = state
        .engine
        .checkin(&request.user_id, &request.display_name, Utc::now())
        .await?;
    Ok(Json(outcome))
}

pub async fn message_activity(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> ApiResult<Json<ActionOutcome>> {
    let outcome = state
        .engine
        .message_activity(
            &request.user_id,
            &request.display_name,
            request.event_id.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct WagerRequest {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Ignored by the fixed-odds rules.
    #[serde(default)]
    pub stake: u64,
    /// Ignored by the fixed-odds rules.
    #[serde(default = "default_choice")]
    pub choice: CoinSide,
}

fn default_choice() -> CoinSide {
    CoinSide::Heads
}

pub async fn wager(
    State(state): State<AppState>,
    Json(request): Json<WagerRequest>,
) -> ApiResult<Json<ActionOutcome>> {
    let outcome = state
        .engine
        .place_wager(
            &request.user_id,
            &request.display_name,
            request.stake,
            request.choice,
            Utc::now(),
        )
        .await?;
    Ok(Json(outcome))
}

#[derive(Deserialize)]
pub struct SetBalanceRequest {
    pub user_id: String,
    pub balance: u64,
}

#[derive(Serialize)]
pub struct SetBalanceResponse {
    pub user_id: String,
    pub balance: u64,
}

pub async fn set_balance(
    State(state): State<AppState>,
    Json(request): Json<SetBalanceRequest>,
) -> ApiResult<Json<SetBalanceResponse>> {
    let balance = state
        .engine
        .set_balance(&request.user_id, request.balance)
        .await?;
    Ok(Json(SetBalanceResponse {
        user_id: request.user_id,
        balance,
    }))
}

#[derive(Deserialize)]
pub struct UserRequest {
    pub user_id: String,
}

pub async fn reset_streak(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> ApiResult<StatusCode> {
    state.engine.reset_streak(&request.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResetCheckinRequest {
    /// Omit to reset every account.
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct TouchedResponse {
    pub touched: usize,
}

pub async fn reset_checkin(
    State(state): State<AppState>,
    Json(request): Json<ResetCheckinRequest>,
) -> ApiResult<Json<TouchedResponse>> {
    let touched = state
        .engine
        .reset_checkin(request.user_id.as_deref())
        .await?;
    Ok(Json(TouchedResponse { touched }))
}

pub async fn begin_wipe(State(state): State<AppState>) -> Json<WipeConfirmation> {
    Json(state.engine.begin_wipe(Utc::now()))
}

#[derive(Deserialize)]
pub struct ConfirmWipeRequest {
    pub token: u64,
}

#[derive(Serialize)]
pub struct WipeResponse {
    pub removed: usize,
}

pub async fn confirm_wipe(
    State(state): State<AppState>,
    Json(request): Json<ConfirmWipeRequest>,
) -> ApiResult<Json<WipeResponse>> {
    let removed = state.engine.confirm_wipe(request.token, Utc::now()).await?;
    Ok(Json(WipeResponse { removed }))
}

pub async fn export(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let json = state.engine.export_all().await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json,
    ))
}

pub async fn import(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<Json<ImportReport>> {
    let report = state.engine.import_all(&body, Utc::now()).await?;
    Ok(Json(report))
}
