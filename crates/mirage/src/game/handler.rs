//! Per-connection game handler: credential validation and character
//! commands.
//!
//! The connection's [`GameContext`] is threaded through every command.
//! Queries validate and (re)bind it; creates and deletes require it to be
//! bound, and a connection that tries one unbound is dropped without an
//! answer.

use std::sync::Arc;

use mirage_character::{CharacterError, CreateRequest};
use mirage_protocol::{command, Packet};
use mirage_session::GameContext;
use mirage_store::{AccountStore, CharacterStore};
use mirage_transport::{Connection, ConnectionId, TcpConnection};

use super::ServerState;
use crate::blocking::run_blocking;
use crate::MirageError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S>(
    conn: TcpConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), MirageError>
where
    S: AccountStore + CharacterStore,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling game connection");

    let mut ctx = GameContext::default();

    loop {
        let packet = match conn.recv().await {
            Ok(Some(packet)) => packet,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed by peer");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        let should_close = match packet.command() {
            command::CM_QUERYCHR => {
                query_characters(&conn, &state, &mut ctx, &packet).await?
            }
            command::CM_NEWCHR => {
                create_character(&conn, &state, &ctx, &packet).await?
            }
            command::CM_DELCHR => {
                delete_character(&conn, &state, &ctx, &packet).await?
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

/// Handles `CM_QUERYCHR`: validate `account/credential`, then list the
/// roster. Returns `true` if the connection should close.
async fn query_characters<S>(
    conn: &TcpConnection,
    state: &Arc<ServerState<S>>,
    ctx: &mut GameContext,
    packet: &Packet,
) -> Result<bool, MirageError>
where
    S: AccountStore + CharacterStore,
{
    let conn_id = conn.id();
    let fields: Vec<String> = packet.params().into_iter().map(String::from).collect();
    let validator = state.validator.clone();
    let validated = run_blocking(&state.store, move |s| {
        let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
        validator.validate(s, &fields)
    })
    .await?;

    let account = match validated {
        Ok(account) => account.name,
        Err(e) => {
            ctx.demote();
            tracing::debug!(%conn_id, error = %e, "credential rejected");
            conn.send(&Packet::failure(command::SM_QUERYCHR_FAIL, e.result_code()))
                .await?;
            return Ok(false);
        }
    };
    if ctx.account() != Some(account.as_str()) {
        tracing::info!(%conn_id, %account, "session validated");
    }
    ctx.promote(account.clone());

    let manager = state.characters;
    let roster = run_blocking(&state.store, move |s| manager.query(s, &account)).await?;
    match roster {
        Ok(roster) => {
            conn.send(&Packet::with_count(
                command::SM_QUERYCHR,
                roster.count(),
                roster.to_body(),
            ))
            .await?;
        }
        Err(e) => reply_error(conn_id, conn, command::SM_QUERYCHR_FAIL, &e).await?,
    }
    Ok(false)
}

/// Handles `CM_NEWCHR` (`account/name/class/gender/slot/`). Returns `true`
/// if the connection should close.
async fn create_character<S>(
    conn: &TcpConnection,
    state: &Arc<ServerState<S>>,
    ctx: &GameContext,
    packet: &Packet,
) -> Result<bool, MirageError>
where
    S: AccountStore + CharacterStore,
{
    let conn_id = conn.id();
    let Some(account) = ctx.account() else {
        tracing::debug!(%conn_id, "character create on unvalidated connection");
        return Ok(true);
    };

    let request = match CreateRequest::parse(&packet.params()) {
        Ok(request) => request,
        Err(e) => {
            reply_error(conn_id, conn, command::SM_NEWCHR_FAIL, &e).await?;
            return Ok(false);
        }
    };
    if request.account != account {
        tracing::debug!(
            %conn_id, %account, requested = %request.account,
            "character create for another account"
        );
        return Ok(true);
    }

    let manager = state.characters;
    let owner = account.to_string();
    let created = run_blocking(&state.store, move |s| manager.create(s, &owner, &request)).await?;
    match created {
        Ok(_) => conn.send(&Packet::new(command::SM_NEWCHR_SUCCESS, "")).await?,
        Err(e) => reply_error(conn_id, conn, command::SM_NEWCHR_FAIL, &e).await?,
    }
    Ok(false)
}

/// Handles `CM_DELCHR` (`name`). Returns `true` if the connection should
/// close.
async fn delete_character<S>(
    conn: &TcpConnection,
    state: &Arc<ServerState<S>>,
    ctx: &GameContext,
    packet: &Packet,
) -> Result<bool, MirageError>
where
    S: AccountStore + CharacterStore,
{
    let conn_id = conn.id();
    let Some(account) = ctx.account() else {
        tracing::debug!(%conn_id, "character delete on unvalidated connection");
        return Ok(true);
    };

    let name = packet.params().first().copied().unwrap_or_default().to_string();
    let manager = state.characters;
    let owner = account.to_string();
    let deleted = run_blocking(&state.store, move |s| manager.delete(s, &owner, &name)).await?;
    match deleted {
        Ok(()) => conn.send(&Packet::new(command::SM_DELCHR_SUCCESS, "")).await?,
        Err(e) => reply_error(conn_id, conn, command::SM_DELCHR_FAIL, &e).await?,
    }
    Ok(false)
}

async fn reply_error(
    conn_id: ConnectionId,
    conn: &TcpConnection,
    response: u16,
    err: &CharacterError,
) -> Result<(), MirageError> {
    match err {
        CharacterError::Store(_) => tracing::warn!(%conn_id, error = %err, "store failure"),
        _ => tracing::debug!(%conn_id, error = %err, "character request rejected"),
    }
    conn.send(&Packet::failure(response, err.result_code())).await?;
    Ok(())
}
