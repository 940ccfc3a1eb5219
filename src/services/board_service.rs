//! Saved boards, persisted in the `boards` store.
//!
//! Avatar URLs usually point at the local proxy, whose port changes between
//! runs. They are stored with a placeholder in place of the proxy base URL
//! and expanded again on the way out.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use super::views::{BoardRoomView, BoardView};
use crate::proxy::ProxyServer;
use crate::store::Store;

pub const BOARD_STORE_NAME: &str = "boards";
const PROXY_PLACEHOLDER: &str = "(proxyUrl)";

#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn Store<Vec<BoardView>>>,
    proxy: Arc<ProxyServer>,
    // serializes read-modify-write cycles
    write_lock: Arc<Mutex<()>>,
}

impl BoardService {
    pub fn new(store: Arc<dyn Store<Vec<BoardView>>>, proxy: Arc<ProxyServer>) -> Self {
        Self {
            store,
            proxy,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Proxy base URL as it appears at the start of stored avatar URLs.
    fn proxy_prefix(&self) -> Option<String> {
        self.proxy
            .base_url()
            .map(|u| u.as_str().trim_end_matches('/').to_string())
    }

    fn clean(&self, mut board: BoardView) -> BoardView {
        if let Some(prefix) = self.proxy_prefix() {
            for room in &mut board.rooms {
                replace_prefix(room, &prefix, PROXY_PLACEHOLDER);
            }
        }
        board
    }

    fn restore(&self, mut board: BoardView) -> BoardView {
        if let Some(prefix) = self.proxy_prefix() {
            for room in &mut board.rooms {
                replace_prefix(room, PROXY_PLACEHOLDER, &prefix);
            }
        }
        board
    }

    async fn load(&self) -> Option<Vec<BoardView>> {
        self.store
            .read()
            .await
            .inspect_err(|e| warn!(error = %e, "Error getting boards"))
            .ok()
    }

    async fn save(&self, boards: &Vec<BoardView>) -> Option<()> {
        self.store
            .write(boards)
            .await
            .inspect_err(|e| warn!(error = %e, "Error writing boards"))
            .ok()
    }

    /// All boards; empty when the store cannot be read.
    pub async fn get_boards(&self) -> Vec<BoardView> {
        let boards: Vec<_> = self
            .load()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|b| self.restore(b))
            .collect();
        info!(count = boards.len(), "Get boards");
        boards
    }

    pub async fn get_board(&self, board_id: &str) -> Option<BoardView> {
        self.load()
            .await?
            .into_iter()
            .find(|b| b.id == board_id)
            .map(|b| self.restore(b))
    }

    /// Appends `board` and returns it as stored.
    pub async fn add_board(&self, board: BoardView) -> Option<BoardView> {
        let _guard = self.write_lock.lock().await;
        let mut boards = self.load().await?;
        let board = self.clean(board);
        boards.push(board.clone());
        self.save(&boards).await?;
        info!(board_id = %board.id, "Board added");
        Some(board)
    }

    /// Removes the board and returns it, or `None` when no board has that id.
    pub async fn remove_board(&self, board_id: &str) -> Option<BoardView> {
        let _guard = self.write_lock.lock().await;
        let mut boards = self.load().await?;
        let Some(index) = boards.iter().position(|b| b.id == board_id) else {
            warn!(board_id, "Error removing board: board not found");
            return None;
        };
        let removed = boards.remove(index);
        self.save(&boards).await?;
        info!(board_id, "Board removed");
        Some(self.restore(removed))
    }

    /// Replaces the board with the same id and returns the caller's board.
    pub async fn update_board(&self, board: BoardView) -> Option<BoardView> {
        let _guard = self.write_lock.lock().await;
        let mut boards = self.load().await?;
        let Some(slot) = boards.iter_mut().find(|b| b.id == board.id) else {
            warn!(board_id = %board.id, "Error updating board: board not found");
            return None;
        };
        *slot = self.clean(board.clone());
        self.save(&boards).await?;
        info!(board_id = %board.id, "Board updated");
        Some(board)
    }
}

fn replace_prefix(room: &mut BoardRoomView, from: &str, to: &str) {
    if let Some(rest) = room.avatar_url.strip_prefix(from) {
        room.avatar_url = format!("{to}{rest}");
    }
}
