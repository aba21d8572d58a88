use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{balances, households, members, ownership, permissions, transactions, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(auth_header.username()))
        .filter(user::Column::Password.eq(auth_header.password()))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = if let Some(user) = user {
        user
    } else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route(
            "/households",
            post(households::create).get(households::list),
        )
        .route(
            "/households/{household_id}",
            get(households::get).patch(households::rename),
        )
        .route(
            "/households/{household_id}/join",
            post(members::request_join),
        )
        .route("/households/{household_id}/claim", post(members::claim))
        .route(
            "/households/{household_id}/members",
            get(members::list).post(members::create_managed),
        )
        .route(
            "/households/{household_id}/members/{member_id}",
            delete(members::remove),
        )
        .route(
            "/households/{household_id}/members/{member_id}/approve",
            post(members::approve),
        )
        .route(
            "/households/{household_id}/members/{member_id}/reactivate",
            post(members::reactivate),
        )
        .route(
            "/households/{household_id}/members/{member_id}/permissions",
            get(permissions::get_permissions).put(permissions::set_permissions),
        )
        .route(
            "/households/{household_id}/expenses",
            post(transactions::expense_new),
        )
        .route(
            "/households/{household_id}/expenses/{transaction_id}",
            patch(transactions::expense_update),
        )
        .route(
            "/households/{household_id}/incomes",
            post(transactions::income_new),
        )
        .route(
            "/households/{household_id}/settlements",
            post(transactions::settlement_new),
        )
        .route(
            "/households/{household_id}/reimbursements",
            post(transactions::reimbursement_new),
        )
        .route(
            "/households/{household_id}/transactions",
            get(transactions::list),
        )
        .route(
            "/households/{household_id}/transactions/{transaction_id}",
            get(transactions::get_detail).delete(transactions::delete_tx),
        )
        .route("/households/{household_id}/balances", get(balances::list))
        .route(
            "/households/{household_id}/balances/health",
            get(balances::health),
        )
        .route(
            "/households/{household_id}/integrity",
            get(balances::integrity),
        )
        .route(
            "/households/{household_id}/ownership",
            post(ownership::initiate).delete(ownership::revoke),
        )
        .route(
            "/households/{household_id}/ownership/accept",
            post(ownership::accept),
        )
        .route(
            "/households/{household_id}/ownership/decline",
            post(ownership::decline),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
