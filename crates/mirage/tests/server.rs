//! Integration tests for the login and game servers over real TCP.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mirage::prelude::*;
use mirage_store::{
    Account, AccountStore, Character, CharacterStore, StoreError, WorldDirectory,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const SECRET: &str = "integration-secret";

// =========================================================================
// Helpers
// =========================================================================

fn world(id: u32, name: &str, game: &str) -> WorldServer {
    WorldServer {
        id,
        name: name.into(),
        game_addr: game.parse().expect("game addr"),
        login_addr: "127.0.0.1:7000".parse().expect("login addr"),
    }
}

/// A store with the two accounts and two worlds most tests use.
fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_account("pangliang", "pwd").expect("account");
    store.add_account("11", "11").expect("account");
    store.add_world(world(1, "test1", "127.0.0.1:7400")).expect("world");
    store.add_world(world(2, "test2", "192.168.0.166:7400")).expect("world");
    Arc::new(store)
}

async fn start_login<S: AccountStore + mirage_store::WorldDirectory>(
    store: Arc<S>,
    max_attempts: u32,
) -> String {
    let server = LoginServerBuilder::new()
        .bind("127.0.0.1:0")
        .max_login_attempts(max_attempts)
        .secret(SECRET)
        .build(store)
        .await
        .expect("login server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn start_game<S: AccountStore + CharacterStore>(store: Arc<S>, world_id: u32) -> String {
    let server = GameServerBuilder::new()
        .bind("127.0.0.1:0")
        .world_id(world_id)
        .secret(SECRET)
        .build(store)
        .await
        .expect("game server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

async fn connect(addr: &str) -> TcpConnection {
    TcpConnection::connect(addr).await.expect("should connect")
}

async fn recv(conn: &TcpConnection) -> Packet {
    tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("timed out waiting for a packet")
        .expect("recv failed")
        .expect("connection closed unexpectedly")
}

async fn request(conn: &TcpConnection, command: u16, body: &str) -> Packet {
    conn.send(&Packet::new(command, body)).await.expect("send");
    recv(conn).await
}

/// Sends a request and asserts the server hangs up without answering.
async fn request_expecting_close(conn: &TcpConnection, command: u16, body: &str) {
    conn.send(&Packet::new(command, body)).await.expect("send");
    let next = tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("timed out waiting for close");
    assert!(
        matches!(next, Ok(None)),
        "expected end-of-stream, got {next:?}"
    );
}

/// Logs in, selects `world`, and returns the credential from the reply.
async fn obtain_credential(login: &str, account: &str, password: &str, world: &str) -> String {
    let conn = connect(login).await;
    let auth = request(&conn, command::CM_IDPASSWORD, &format!("{account}/{password}")).await;
    assert_eq!(auth.result(), 0, "login failed for {account}");
    let selected = request(&conn, command::CM_SELECTSERVER, world).await;
    assert_eq!(selected.command(), command::SM_SELECTSERVER_OK);
    selected.params()[2].to_string()
}

/// Opens a game connection already validated as `account`.
async fn validated_game_conn(game: &str, account: &str, credential: &str) -> TcpConnection {
    let conn = connect(game).await;
    let reply = request(&conn, command::CM_QUERYCHR, &format!("{account}/{credential}")).await;
    assert_eq!(reply.command(), command::SM_QUERYCHR, "validation failed: {reply}");
    conn
}

// =========================================================================
// Login server
// =========================================================================

#[tokio::test]
async fn test_authenticate_lists_worlds() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;

    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;
    assert_eq!(reply.command(), command::SM_PASSOK_SELECTSERVER);
    assert_eq!(reply.result(), 0);
    assert_eq!(reply.header.param_count, 2);
    assert_eq!(reply.body, "test1/1/test2/2/");
}

#[tokio::test]
async fn test_select_server_returns_address_and_credential() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;
    request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;

    let reply = request(&conn, command::CM_SELECTSERVER, "test1").await;
    assert_eq!(reply.command(), command::SM_SELECTSERVER_OK);
    assert_eq!(reply.result(), 0);
    let params = reply.params();
    assert_eq!(params.len(), 3);
    assert_eq!(&params[..2], &["127.0.0.1", "7400"]);
    params[2].parse::<u32>().expect("credential is a u32");
}

#[tokio::test]
async fn test_select_server_by_id() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;
    request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;

    let reply = request(&conn, command::CM_SELECTSERVER, "2").await;
    assert_eq!(&reply.params()[..2], &["192.168.0.166", "7400"]);
}

#[tokio::test]
async fn test_wrong_password_keeps_connection_open() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;

    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/wrong").await;
    assert_eq!(reply.command(), command::SM_PASSWD_FAIL);
    assert_eq!(reply.result(), 1);
    assert!(reply.body.is_empty());

    let reply = request(&conn, command::CM_IDPASSWORD, "nobody/pwd").await;
    assert_eq!(reply.result(), 1);

    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;
    assert_eq!(reply.result(), 0);
}

#[tokio::test]
async fn test_failed_reauthentication_blocks_selection() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;
    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;
    assert_eq!(reply.result(), 0);

    let reply = request(&conn, command::CM_IDPASSWORD, "11/wrong").await;
    assert_eq!(reply.result(), 1);

    // The earlier login no longer stands.
    let reply = request(&conn, command::CM_SELECTSERVER, "test1").await;
    assert_eq!(reply.command(), command::SM_STARTFAIL);
    assert_eq!(reply.result(), 2);
}

#[tokio::test]
async fn test_malformed_login_counts_as_failure() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;

    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang").await;
    assert_eq!(reply.command(), command::SM_PASSWD_FAIL);
    assert_eq!(reply.result(), 1);
}

#[tokio::test]
async fn test_too_many_attempts_closes_connection() {
    let login = start_login(seeded_store(), 2).await;
    let conn = connect(&login).await;

    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/a").await;
    assert_eq!(reply.result(), 1);
    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/b").await;
    assert_eq!(reply.result(), 2);

    let next = tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("timed out");
    assert!(matches!(next, Ok(None)), "got {next:?}");
}

#[tokio::test]
async fn test_select_before_authenticate_fails() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;

    let reply = request(&conn, command::CM_SELECTSERVER, "test1").await;
    assert_eq!(reply.command(), command::SM_STARTFAIL);
    assert_eq!(reply.result(), 2);
}

#[tokio::test]
async fn test_select_unknown_world_fails() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;
    request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;

    let reply = request(&conn, command::CM_SELECTSERVER, "test3").await;
    assert_eq!(reply.command(), command::SM_STARTFAIL);
    assert_eq!(reply.result(), 1);

    // Still authenticated, so a valid world works afterwards.
    let reply = request(&conn, command::CM_SELECTSERVER, "test1").await;
    assert_eq!(reply.result(), 0);
}

#[tokio::test]
async fn test_packet_after_selection_closes_connection() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;
    request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;
    request(&conn, command::CM_SELECTSERVER, "test1").await;

    request_expecting_close(&conn, command::CM_SELECTSERVER, "test2").await;
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let login = start_login(seeded_store(), 3).await;
    let conn = connect(&login).await;

    conn.send(&Packet::new(9999, "noise")).await.expect("send");
    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;
    assert_eq!(reply.command(), command::SM_PASSOK_SELECTSERVER);
}

#[tokio::test]
async fn test_framing_error_closes_silently() {
    let login = start_login(seeded_store(), 3).await;
    let mut stream = tokio::net::TcpStream::connect(&login).await.expect("connect");

    // A frame length shorter than the header.
    stream.write_all(&2u32.to_le_bytes()).await.expect("write");
    stream.write_all(&[0, 0]).await.expect("write");

    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("timed out");
    // Either a clean FIN or a reset; never a response.
    assert!(matches!(read, Ok(0) | Err(_)), "got {read:?}");
}

#[tokio::test]
async fn test_empty_secret_is_rejected_at_build() {
    let result = LoginServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(seeded_store())
        .await;
    assert!(matches!(result, Err(MirageError::Session(_))));
}

// =========================================================================
// Game server: validation
// =========================================================================

#[tokio::test]
async fn test_full_handoff_yields_empty_roster() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;

    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = connect(&game).await;
    let reply = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{credential}")).await;
    assert_eq!(reply.command(), command::SM_QUERYCHR);
    assert_eq!(reply.result(), 0);
    assert_eq!(reply.header.param_count, 0);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_query_without_credential_is_code_1() {
    let game = start_game(seeded_store(), 1).await;
    let conn = connect(&game).await;

    let reply = request(&conn, command::CM_QUERYCHR, "pangliang").await;
    assert_eq!(reply.command(), command::SM_QUERYCHR_FAIL);
    assert_eq!(reply.result(), 1);
}

#[tokio::test]
async fn test_query_unknown_account_is_code_2() {
    let game = start_game(seeded_store(), 1).await;
    let conn = connect(&game).await;

    let reply = request(&conn, command::CM_QUERYCHR, "pangliang1/1000").await;
    assert_eq!(reply.result(), 2);
}

#[tokio::test]
async fn test_query_wrong_credential_is_code_3() {
    let game = start_game(seeded_store(), 1).await;
    let conn = connect(&game).await;

    let reply = request(&conn, command::CM_QUERYCHR, "pangliang/1000").await;
    assert_eq!(reply.result(), 3);

    // The connection survives a validation failure.
    let reply = request(&conn, command::CM_QUERYCHR, "pangliang").await;
    assert_eq!(reply.result(), 1);
}

#[tokio::test]
async fn test_credential_never_validates_for_another_account() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;

    let theirs = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    // Give the other account a current credential of its own too.
    let _mine = obtain_credential(&login, "11", "11", "test1").await;

    let conn = connect(&game).await;
    let reply = request(&conn, command::CM_QUERYCHR, &format!("11/{theirs}")).await;
    assert_eq!(reply.result(), 3);
}

#[tokio::test]
async fn test_new_login_supersedes_old_credential() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;

    let old = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let new = obtain_credential(&login, "pangliang", "pwd", "test1").await;

    let conn = connect(&game).await;
    let reply = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{new}")).await;
    assert_eq!(reply.result(), 0);
    if old != new {
        let reply = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{old}")).await;
        assert_eq!(reply.result(), 3);
    }
}

#[tokio::test]
async fn test_credential_is_bound_to_its_world() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let world2 = start_game(store, 2).await;

    let for_world1 = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = connect(&world2).await;
    let reply = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{for_world1}")).await;
    assert_eq!(reply.result(), 3);
}

// =========================================================================
// Game server: character lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_then_duplicate_name() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;

    let reply = request(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;
    assert_eq!(reply.command(), command::SM_NEWCHR_SUCCESS);
    assert_eq!(reply.result(), 0);

    let reply = request(&conn, command::CM_NEWCHR, "pangliang/player1/1/1/1/").await;
    assert_eq!(reply.command(), command::SM_NEWCHR_FAIL);
    assert_eq!(reply.result(), 2);
}

#[tokio::test]
async fn test_roster_echoes_created_attributes() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;

    request(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;
    request(&conn, command::CM_NEWCHR, "pangliang/player2/1/1/2/").await;

    let reply = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{credential}")).await;
    assert_eq!(reply.header.param_count, 2);
    assert_eq!(reply.body, "player1/2/3/1/1/player2/1/1/1/2/");
}

#[tokio::test]
async fn test_create_rule_codes() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;

    request(&conn, command::CM_NEWCHR, "pangliang/player1/0/1/1/").await;

    let occupied = request(&conn, command::CM_NEWCHR, "pangliang/player2/0/1/1/").await;
    assert_eq!(occupied.result(), 2);
    let out_of_range = request(&conn, command::CM_NEWCHR, "pangliang/player2/0/1/4/").await;
    assert_eq!(out_of_range.result(), 3);
    let bad_name = request(&conn, command::CM_NEWCHR, "pangliang/bad name/0/1/2/").await;
    assert_eq!(bad_name.result(), 1);
    let malformed = request(&conn, command::CM_NEWCHR, "pangliang/player2/0/1/").await;
    assert_eq!(malformed.result(), 1);
}

#[tokio::test]
async fn test_delete_twice() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;
    request(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;

    let reply = request(&conn, command::CM_DELCHR, "player1").await;
    assert_eq!(reply.command(), command::SM_DELCHR_SUCCESS);
    assert_eq!(reply.result(), 0);

    let reply = request(&conn, command::CM_DELCHR, "player1").await;
    assert_eq!(reply.command(), command::SM_DELCHR_FAIL);
    assert_eq!(reply.result(), 2);

    let roster = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{credential}")).await;
    assert_eq!(roster.header.param_count, 0);
}

#[tokio::test]
async fn test_delete_of_other_accounts_character_fails() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;

    let owner_cred = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let owner = validated_game_conn(&game, "pangliang", &owner_cred).await;
    request(&owner, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;

    let other_cred = obtain_credential(&login, "11", "11", "test1").await;
    let other = validated_game_conn(&game, "11", &other_cred).await;
    let reply = request(&other, command::CM_DELCHR, "player1").await;
    assert_eq!(reply.result(), 2);

    let roster = request(&owner, command::CM_QUERYCHR, &format!("pangliang/{owner_cred}")).await;
    assert_eq!(roster.body, "player1/2/3/1/1/");
}

#[tokio::test]
async fn test_create_without_validation_closes_connection() {
    let game = start_game(seeded_store(), 1).await;
    let conn = connect(&game).await;
    request_expecting_close(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;
}

#[tokio::test]
async fn test_delete_without_validation_closes_connection() {
    let game = start_game(seeded_store(), 1).await;
    let conn = connect(&game).await;
    request_expecting_close(&conn, command::CM_DELCHR, "player1").await;
}

#[tokio::test]
async fn test_failed_validation_revokes_session() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;

    let reply = request(&conn, command::CM_QUERYCHR, "pangliang/1").await;
    assert_eq!(reply.result(), 3);
    request_expecting_close(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;
}

#[tokio::test]
async fn test_create_for_another_account_closes_connection() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;

    request_expecting_close(&conn, command::CM_NEWCHR, "11/player1/3/2/1/").await;
}

#[tokio::test]
async fn test_concurrent_creates_of_one_name_have_one_winner() {
    let store = MemoryStore::new();
    store.add_world(world(1, "test1", "127.0.0.1:7400")).expect("world");
    for i in 0..8 {
        store.add_account(&format!("acct{i}"), "pwd").expect("account");
    }
    let store = Arc::new(store);
    let login = start_login(Arc::clone(&store), 3).await;
    let game = start_game(store, 1).await;

    let wins = Arc::new(AtomicUsize::new(0));
    let mut tasks = Vec::new();
    for i in 0..8 {
        let (login, game, wins) = (login.clone(), game.clone(), Arc::clone(&wins));
        tasks.push(tokio::spawn(async move {
            let account = format!("acct{i}");
            let credential = obtain_credential(&login, &account, "pwd", "test1").await;
            let conn = validated_game_conn(&game, &account, &credential).await;
            let reply =
                request(&conn, command::CM_NEWCHR, &format!("{account}/contested/0/1/1/")).await;
            match reply.result() {
                0 => {
                    wins.fetch_add(1, Ordering::SeqCst);
                }
                code => assert_eq!(code, 2),
            }
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    assert_eq!(wins.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Shared SQLite database and store failures
// =========================================================================

#[tokio::test]
async fn test_servers_share_only_the_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mir.db");

    let login_store = SqliteStore::open(&path).expect("open");
    login_store.add_account("pangliang", "pwd").expect("account");
    login_store.add_world(&world(1, "test1", "127.0.0.1:7400")).expect("world");
    let game_store = SqliteStore::open(&path).expect("open");

    let login = start_login(Arc::new(login_store), 3).await;
    let game = start_game(Arc::new(game_store), 1).await;

    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;
    let conn = validated_game_conn(&game, "pangliang", &credential).await;
    let reply = request(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;
    assert_eq!(reply.result(), 0);
}

/// Accounts work; every character call fails.
struct BrokenCharacters {
    inner: MemoryStore,
}

impl AccountStore for BrokenCharacters {
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError> {
        self.inner.find_account(name)
    }
    fn set_login_nonce(&self, name: &str, nonce: u64) -> Result<(), StoreError> {
        self.inner.set_login_nonce(name, nonce)
    }
}

impl CharacterStore for BrokenCharacters {
    fn list_characters(&self, _: &str) -> Result<Vec<Character>, StoreError> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    fn character_exists(&self, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    fn insert_character(&self, _: &Character) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
    fn delete_character(&self, _: &str, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("disk on fire".into()))
    }
}

#[tokio::test]
async fn test_store_failure_is_generic_code() {
    let store = seeded_store();
    let login = start_login(Arc::clone(&store), 3).await;
    let credential = obtain_credential(&login, "pangliang", "pwd", "test1").await;

    let inner = MemoryStore::new();
    let account = store.find_account("pangliang").expect("find").expect("exists");
    inner.add_account("pangliang", "pwd").expect("account");
    inner
        .set_login_nonce("pangliang", account.login_nonce.expect("nonce"))
        .expect("nonce");
    // Same name, nonce and id (both stores hand out id 1 first), so the
    // credential validates against the broken store too.
    let game = start_game(Arc::new(BrokenCharacters { inner }), 1).await;

    let conn = connect(&game).await;
    let reply = request(&conn, command::CM_QUERYCHR, &format!("pangliang/{credential}")).await;
    assert_eq!(reply.command(), command::SM_QUERYCHR_FAIL);
    assert_eq!(reply.result(), 4);

    // Validation still bound the session, so mutations are answered.
    let reply = request(&conn, command::CM_NEWCHR, "pangliang/player1/3/2/1/").await;
    assert_eq!(reply.result(), 4);
    let reply = request(&conn, command::CM_DELCHR, "player1").await;
    assert_eq!(reply.result(), 4);
}

/// Serves accounts normally but cannot read the world directory.
struct BrokenDirectory {
    inner: Arc<MemoryStore>,
}

impl AccountStore for BrokenDirectory {
    fn find_account(&self, name: &str) -> Result<Option<Account>, StoreError> {
        self.inner.find_account(name)
    }
    fn set_login_nonce(&self, name: &str, nonce: u64) -> Result<(), StoreError> {
        self.inner.set_login_nonce(name, nonce)
    }
}

impl WorldDirectory for BrokenDirectory {
    fn list_worlds(&self) -> Result<Vec<WorldServer>, StoreError> {
        Err(StoreError::Unavailable("directory offline".into()))
    }
}

#[tokio::test]
async fn test_directory_failure_leaves_connection_unauthenticated() {
    let store = seeded_store();
    let login = start_login(Arc::new(BrokenDirectory { inner: Arc::clone(&store) }), 3).await;
    let conn = connect(&login).await;

    let reply = request(&conn, command::CM_IDPASSWORD, "pangliang/pwd").await;
    assert_eq!(reply.command(), command::SM_PASSWD_FAIL);
    assert_eq!(reply.result(), 4);

    let reply = request(&conn, command::CM_SELECTSERVER, "test1").await;
    assert_eq!(reply.command(), command::SM_STARTFAIL);
    assert_eq!(reply.result(), 2);

    // No credential was issued.
    let account = store.find_account("pangliang").expect("find").expect("exists");
    assert!(account.login_nonce.is_none());
}
