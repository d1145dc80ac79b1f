//! Per-connection login handler: authenticate, list worlds, select a server.
//!
//! Each accepted connection gets its own task running this handler. The
//! connection's [`LoginSession`] lives on that task's stack and is dropped
//! with it.

use std::sync::Arc;

use mirage_protocol::{command, join_params, Packet, SERVER_FAILURE};
use mirage_session::{LoginSession, SessionError};
use mirage_store::{AccountStore, WorldDirectory, WorldServer};
use mirage_transport::{Connection, TcpConnection};

use super::ServerState;
use crate::blocking::run_blocking;
use crate::MirageError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S>(
    conn: TcpConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), MirageError>
where
    S: AccountStore + WorldDirectory,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling login connection");

    let mut session = LoginSession::new(state.max_login_attempts);

    loop {
        let packet = match conn.recv().await {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed by peer");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if session.is_terminal() {
            tracing::debug!(%conn_id, %packet, "packet after server selection");
            break;
        }

        let should_close = match packet.command() {
            command::CM_IDPASSWORD => {
                authenticate(&conn, &state, &mut session, &packet).await?
            }
            command::CM_SELECTSERVER => {
                select_server(&conn, &state, &mut session, &packet).await?
            }
            _ => {
                tracing::debug!(%conn_id, %packet, "ignoring unexpected command");
                false
            }
        };
        if should_close {
            break;
        }
    }

    let _ = conn.close().await;
    Ok(())
}

/// Handles `CM_IDPASSWORD`. Returns `true` if the connection should close.
async fn authenticate<S>(
    conn: &TcpConnection,
    state: &Arc<ServerState<S>>,
    session: &mut LoginSession,
    packet: &Packet,
) -> Result<bool, MirageError>
where
    S: AccountStore + WorldDirectory,
{
    let conn_id = conn.id();
    let (name, password) = match packet.params().as_slice() {
        &[name, password] => (name.to_string(), password.to_string()),
        _ => (String::new(), String::new()),
    };

    let found = if name.is_empty() {
        None
    } else {
        let lookup = name.clone();
        match run_blocking(&state.store, move |s| s.find_account(&lookup)).await? {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "account lookup failed");
                session.revoke();
                send_failure(conn, command::SM_PASSWD_FAIL, SERVER_FAILURE).await?;
                return Ok(false);
            }
        }
    };

    let account = match session.authenticate(found, &password) {
        Ok(account) => account.name.clone(),
        Err(e) => {
            tracing::debug!(%conn_id, account = %name, error = %e, "authentication rejected");
            return reject(conn, command::SM_PASSWD_FAIL, &e).await;
        }
    };
    tracing::info!(%conn_id, %account, "account authenticated");

    let worlds = match run_blocking(&state.store, |s| s.list_worlds()).await? {
        Ok(worlds) => worlds,
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "world directory unavailable");
            // The client sees a failed login, so it must not be able to select.
            session.revoke();
            send_failure(conn, command::SM_PASSWD_FAIL, SERVER_FAILURE).await?;
            return Ok(false);
        }
    };

    let count = u16::try_from(worlds.len()).unwrap_or(u16::MAX);
    let body = join_params(worlds.iter().flat_map(|w| [w.name.clone(), w.id.to_string()]));
    conn.send(&Packet::with_count(command::SM_PASSOK_SELECTSERVER, count, body))
        .await?;
    Ok(false)
}

/// Handles `CM_SELECTSERVER`. Returns `true` if the connection should close.
async fn select_server<S>(
    conn: &TcpConnection,
    state: &Arc<ServerState<S>>,
    session: &mut LoginSession,
    packet: &Packet,
) -> Result<bool, MirageError>
where
    S: AccountStore + WorldDirectory,
{
    let conn_id = conn.id();
    let account = match session.authenticated_account() {
        Ok(account) => account.clone(),
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "server selection rejected");
            return reject(conn, command::SM_STARTFAIL, &e).await;
        }
    };

    let requested = packet.params().first().copied().unwrap_or_default().to_string();
    let lookup = requested.clone();
    let world = match run_blocking(&state.store, move |s| find_world(s, &lookup)).await? {
        Ok(Some(world)) => world,
        Ok(None) => {
            let e = SessionError::UnknownWorld(requested);
            tracing::debug!(%conn_id, account = %account.name, error = %e, "server selection rejected");
            return reject(conn, command::SM_STARTFAIL, &e).await;
        }
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "world directory unavailable");
            send_failure(conn, command::SM_STARTFAIL, SERVER_FAILURE).await?;
            return Ok(false);
        }
    };

    let authority = state.authority.clone();
    let issued_for = account.clone();
    let world_id = world.id;
    let credential = match run_blocking(&state.store, move |s| {
        authority.issue(s, &issued_for, world_id)
    })
    .await?
    {
        Ok(credential) => credential,
        Err(e) => {
            tracing::warn!(%conn_id, account = %account.name, error = %e, "credential issue failed");
            return reject(conn, command::SM_STARTFAIL, &e).await;
        }
    };

    session.select_server(&world)?;
    tracing::info!(%conn_id, account = %account.name, world = world.id, "server selected");

    let body = join_params([
        world.game_addr.ip().to_string(),
        world.game_addr.port().to_string(),
        credential.to_string(),
    ]);
    conn.send(&Packet::new(command::SM_SELECTSERVER_OK, body)).await?;
    Ok(false)
}

/// Looks a world up by name, then by numeric id.
fn find_world<S: WorldDirectory + ?Sized>(
    store: &S,
    requested: &str,
) -> Result<Option<WorldServer>, mirage_store::StoreError> {
    if let Some(world) = store.find_world(requested)? {
        return Ok(Some(world));
    }
    match requested.parse::<u32>() {
        Ok(id) => store.find_world_by_id(id),
        Err(_) => Ok(None),
    }
}

/// Answers a session error with its result code, or asks for the
/// connection to be closed when it has none. Lockout answers and closes.
async fn reject(
    conn: &TcpConnection,
    response: u16,
    err: &SessionError,
) -> Result<bool, MirageError> {
    let Some(code) = err.result_code() else {
        return Ok(true);
    };
    send_failure(conn, response, code).await?;
    Ok(matches!(err, SessionError::TooManyAttempts(_)))
}

async fn send_failure(
    conn: &TcpConnection,
    response: u16,
    code: i32,
) -> Result<(), MirageError> {
    conn.send(&Packet::failure(response, code)).await?;
    Ok(())
}
