use crate::{
    game::GameError,
    room::{session::Participant, ConnectionId, Outbound, RoomHandle},
    websocket::messages::{ClientMessage, ServerMessage},
    AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use uuid::Uuid;

/// WebSocket upgrade handler
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// What one socket is currently attached to.
///
/// The room lives in a watch channel so the connection can still detach from
/// it when the receive task is aborted.
struct Session {
    connection: ConnectionId,
    room: watch::Sender<Option<RoomHandle>>,
    tx: Outbound,
}

impl Session {
    fn new(connection: ConnectionId, tx: Outbound) -> (Self, watch::Receiver<Option<RoomHandle>>) {
        let (room, current_room) = watch::channel(None);
        (
            Self {
                connection,
                room,
                tx,
            },
            current_room,
        )
    }

    fn room(&self) -> Result<RoomHandle, GameError> {
        self.room.borrow().clone().ok_or(GameError::NotInRoom)
    }

    fn take_room(&self) -> Option<RoomHandle> {
        self.room.send_replace(None)
    }

    /// Enter `room`, leaving the previous one if it is a different room
    async fn switch_room(&self, room: RoomHandle) {
        if let Some(previous) = self.room.send_replace(Some(room.clone())) {
            if previous.room_id() != room.room_id() {
                leave(&previous, self.connection).await;
            }
        }
    }

    async fn leave_room(&self) {
        if let Some(room) = self.take_room() {
            leave(&room, self.connection).await;
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let connection = Uuid::new_v4();
    let (session, current_room) = Session::new(connection, tx.clone());

    tracing::info!("WebSocket connection established: {}", connection);
    state.rooms.subscribe_lobby(connection, tx);

    // Spawn a task to send messages to the client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from the client
    let state_for_recv = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        if let Err(e) =
                            handle_client_message(client_msg, &state_for_recv, &session).await
                        {
                            tracing::debug!("Error handling message from {}: {}", connection, e);
                            let _ = session.tx.send(ServerMessage::Error {
                                message: e.to_string(),
                            });
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse message: {}", e);
                        let _ = session.tx.send(ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        });
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Client disconnected: {}", connection);
                    break;
                }
                _ => {}
            }
        }
    });

    let room = wait_for_close(send_task, recv_task, current_room).await;
    state.rooms.unsubscribe_lobby(connection);

    // The room keeps the seat for a while in case the player comes back
    if let Some(room) = room {
        let _ = room.detach(connection).await;
    }

    tracing::info!("WebSocket connection closed: {}", connection);
}

/// Wait for either half of the socket to stop, then return the room the
/// connection was in
async fn wait_for_close(
    mut send_task: JoinHandle<()>,
    mut recv_task: JoinHandle<()>,
    current_room: watch::Receiver<Option<RoomHandle>>,
) -> Option<RoomHandle> {
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }
    let room = current_room.borrow().clone();
    room
}

/// Handle individual client messages
async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    session: &Session,
) -> Result<(), GameError> {
    let connection = session.connection;

    match msg {
        ClientMessage::CreateRoom { player_name, mode } => {
            session.leave_room().await;
            tracing::info!("{} creating {:?} room", player_name, mode);

            let room = state.rooms.create_room(participant(session, player_name), mode);
            let _ = session.tx.send(ServerMessage::RoomCreated {
                room_id: room.room_id(),
            });
            session.room.send_replace(Some(room));
        }
        ClientMessage::CreateSoloRoom {
            player_name,
            mode,
            difficulty,
        } => {
            session.leave_room().await;
            tracing::info!("{} creating {:?} solo room ({:?})", player_name, mode, difficulty);

            let room = state
                .rooms
                .create_solo_room(participant(session, player_name), mode, difficulty);
            let _ = session.tx.send(ServerMessage::RoomCreated {
                room_id: room.room_id(),
            });
            session.room.send_replace(Some(room));
        }
        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            let room = state.rooms.get(room_id)?;
            room.join(connection, player_name, session.tx.clone()).await?;
            session.switch_room(room).await;
        }
        ClientMessage::Rejoin {
            room_id,
            player_name,
        } => {
            let room = state.rooms.get(room_id)?;
            room.rejoin(connection, player_name, session.tx.clone()).await?;
            session.switch_room(room).await;
        }
        ClientMessage::RespondToJoin { accept } => {
            session.room()?.respond(connection, accept).await?;
        }
        ClientMessage::CancelRoom => {
            if let Some(room) = session.take_room() {
                room.cancel(connection).await?;
            }
        }
        ClientMessage::Command { text } => {
            session.room()?.play(connection, text).await?;
        }
        ClientMessage::Chat { text } => {
            session.room()?.chat(connection, text).await?;
        }
        ClientMessage::Surrender => {
            if let Some(room) = session.take_room() {
                room.surrender(connection).await?;
            }
        }
        ClientMessage::LeaveRoom => session.leave_room().await,
        ClientMessage::ListRooms => {
            let _ = session.tx.send(ServerMessage::RoomList {
                rooms: state.rooms.listings(),
            });
        }
    }

    Ok(())
}

fn participant(session: &Session, name: String) -> Participant {
    Participant {
        connection: session.connection,
        name,
        outbound: session.tx.clone(),
    }
}

async fn leave(room: &RoomHandle, connection: ConnectionId) {
    if let Err(e) = room.leave(connection).await {
        tracing::debug!("Room {} already gone: {}", room.room_id(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GameConfig, db::testing::MemoryRecorder, dictionary::Dictionary,
        models::GameMode, room::RoomManager,
    };
    use tokio::sync::oneshot;

    fn state() -> AppState {
        let recorder = Arc::new(MemoryRecorder::default());
        let rooms = Arc::new(RoomManager::new(
            Arc::new(GameConfig::default()),
            Arc::new(Dictionary::from_words(["CON"])),
            recorder.clone(),
        ));
        AppState { rooms, recorder }
    }

    fn session() -> (
        Session,
        watch::Receiver<Option<RoomHandle>>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (session, current_room) = Session::new(Uuid::new_v4(), tx);
        (session, current_room, rx)
    }

    async fn create_room(state: &AppState, session: &Session, name: &str) -> RoomHandle {
        let create = ClientMessage::CreateRoom {
            player_name: name.to_string(),
            mode: GameMode::Classic,
        };
        tokio_test::assert_ok!(handle_client_message(create, state, session).await);
        session.room().unwrap()
    }

    #[tokio::test]
    async fn test_room_is_known_when_send_side_stops_first() {
        let state = state();
        let (session, current_room, _rx) = session();
        let room = create_room(&state, &session, "Alice").await;

        // The outgoing half fails while the incoming half is still reading
        let (joined_tx, joined_rx) = oneshot::channel();
        let send_task = tokio::spawn(async move {
            let _ = joined_rx.await;
        });
        let recv_task = tokio::spawn(async move {
            let _session = session;
            let _ = joined_tx.send(());
            std::future::pending::<()>().await
        });

        let closed = wait_for_close(send_task, recv_task, current_room).await;
        assert_eq!(closed.map(|r| r.room_id()), Some(room.room_id()));
    }

    #[tokio::test]
    async fn test_failed_join_keeps_own_room() {
        let state = state();
        let (alice, _alice_room, _alice_rx) = session();
        let own_room = create_room(&state, &alice, "Alice").await;

        // Bob's room already has a pending joiner, so it refuses Alice
        let (bob, _bob_room, _bob_rx) = session();
        let busy_room = create_room(&state, &bob, "Bob").await;
        let (carol, _carol_room, _carol_rx) = session();
        let join = ClientMessage::JoinRoom {
            room_id: busy_room.room_id(),
            player_name: "Carol".to_string(),
        };
        tokio_test::assert_ok!(handle_client_message(join, &state, &carol).await);

        let join = ClientMessage::JoinRoom {
            room_id: busy_room.room_id(),
            player_name: "Alice".to_string(),
        };
        let result = handle_client_message(join, &state, &alice).await;
        assert_eq!(result, Err(GameError::RoomUnavailable));
        assert_eq!(alice.room().map(|r| r.room_id()), Ok(own_room.room_id()));

        // Alice's room is still open for joiners
        let (dave, _dave_room, _dave_rx) = session();
        let join = ClientMessage::JoinRoom {
            room_id: own_room.room_id(),
            player_name: "Dave".to_string(),
        };
        tokio_test::assert_ok!(handle_client_message(join, &state, &dave).await);
    }

    #[tokio::test]
    async fn test_joining_another_room_leaves_the_previous_one() {
        let state = state();
        let (alice, _alice_room, _alice_rx) = session();
        let own_room = create_room(&state, &alice, "Alice").await;
        let (bob, _bob_room, _bob_rx) = session();
        let other_room = create_room(&state, &bob, "Bob").await;

        let join = ClientMessage::JoinRoom {
            room_id: other_room.room_id(),
            player_name: "Alice".to_string(),
        };
        tokio_test::assert_ok!(handle_client_message(join, &state, &alice).await);
        assert_eq!(alice.room().map(|r| r.room_id()), Ok(other_room.room_id()));

        for _ in 0..100 {
            if state.rooms.get(own_room.room_id()).is_err() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("The room Alice hosted should have closed");
    }

    #[tokio::test]
    async fn test_commands_need_a_room() {
        let state = state();
        let (session, _current_room, _rx) = session();
        let command = ClientMessage::Command {
            text: "!skip".to_string(),
        };
        let result = handle_client_message(command, &state, &session).await;
        assert_eq!(result, Err(GameError::NotInRoom));
    }
}
