// Session registry: one decision engine per game, shared by its clients

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::ai::{AiProfile, DecisionEngine};

/// Engines are locked per game: decisions for one game serialize, decisions
/// for different games run independently.
pub type SharedEngine = Arc<Mutex<DecisionEngine>>;

#[derive(Default)]
struct RegistryInner {
    /// game_id -> engine
    games: HashMap<String, SharedEngine>,
    /// client_id -> game_id (many clients may share a game)
    clients: HashMap<String, String>,
}

/// Owns the game and client maps behind a single registry-wide lock.
///
/// Every connection task goes through here; the combined operations
/// ([`create_and_bind`](Self::create_and_bind),
/// [`engine_for_frame`](Self::engine_for_frame)) hold the write lock across
/// create+bind so a concurrent disconnect's reap can never remove a session
/// that is about to get its first binding.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `game_id` (generated when absent). Creation is
    /// idempotent: an existing session is returned untouched, accumulated
    /// state intact.
    pub async fn create_game(&self, game_id: Option<String>, profile: AiProfile) -> String {
        let mut inner = self.inner.write().await;
        create_locked(&mut inner, game_id, profile)
    }

    /// Create (or reuse) a session and bind the client to it in one step.
    pub async fn create_and_bind(
        &self,
        client_id: &str,
        game_id: Option<String>,
        profile: AiProfile,
    ) -> String {
        let mut inner = self.inner.write().await;
        let game_id = create_locked(&mut inner, game_id, profile);
        inner.clients.insert(client_id.to_string(), game_id.clone());
        game_id
    }

    /// Bind a client to an existing session. Fails if the game is unknown.
    pub async fn bind_client(&self, client_id: &str, game_id: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.games.contains_key(game_id) {
            bail!("Game {game_id} not found");
        }
        inner
            .clients
            .insert(client_id.to_string(), game_id.to_string());
        debug!("Client {} -> game {}", client_id, game_id);
        Ok(())
    }

    /// Look up the game a client is bound to, if any
    pub async fn resolve(&self, client_id: &str) -> Option<String> {
        self.inner.read().await.clients.get(client_id).cloned()
    }

    /// Engine for the client's bound game, if any
    pub async fn get_engine(&self, client_id: &str) -> Option<SharedEngine> {
        let inner = self.inner.read().await;
        let game_id = inner.clients.get(client_id)?;
        inner.games.get(game_id).cloned()
    }

    pub async fn get_engine_by_game(&self, game_id: &str) -> Option<SharedEngine> {
        self.inner.read().await.games.get(game_id).cloned()
    }

    /// Resolve the engine for a decision request, provisioning a session
    /// with `default_profile` when the game (or the client's binding) does
    /// not exist yet. Returns the effective game id alongside the engine.
    pub async fn engine_for_frame(
        &self,
        client_id: &str,
        game_id: Option<&str>,
        default_profile: AiProfile,
    ) -> (String, SharedEngine) {
        let mut inner = self.inner.write().await;

        let game_id = match game_id {
            Some(id) => {
                if !inner.games.contains_key(id) {
                    info!("Auto-provisioning game {} for client {}", id, client_id);
                }
                create_locked(&mut inner, Some(id.to_string()), default_profile)
            }
            None => match inner.clients.get(client_id).cloned() {
                Some(bound) if inner.games.contains_key(&bound) => bound,
                _ => {
                    let id = create_locked(&mut inner, None, default_profile);
                    info!("Auto-provisioning game {} for client {}", id, client_id);
                    id
                }
            },
        };

        inner
            .clients
            .insert(client_id.to_string(), game_id.clone());

        let engine = inner
            .games
            .get(&game_id)
            .cloned()
            .expect("session created under the same lock");
        (game_id, engine)
    }

    /// Remove a client's binding; the session itself is untouched.
    pub async fn unbind_client(&self, client_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(game_id) = inner.clients.remove(client_id) {
            debug!("Client {} left game {}", client_id, game_id);
        }
    }

    /// Drop every session no remaining binding references. Returns how many
    /// sessions were reclaimed.
    pub async fn reap_orphans(&self) -> usize {
        let mut inner = self.inner.write().await;
        let before = inner.games.len();

        let RegistryInner { games, clients } = &mut *inner;
        games.retain(|game_id, _| clients.values().any(|bound| bound == game_id));

        let reaped = before - inner.games.len();
        if reaped > 0 {
            info!("Reaped {} orphaned game(s)", reaped);
        }
        reaped
    }

    pub async fn game_count(&self) -> usize {
        self.inner.read().await.games.len()
    }
}

fn create_locked(
    inner: &mut RegistryInner,
    game_id: Option<String>,
    profile: AiProfile,
) -> String {
    let game_id = game_id.unwrap_or_else(generate_game_id);

    if inner.games.contains_key(&game_id) {
        debug!("Game {} already exists, reusing its engine", game_id);
        return game_id;
    }

    info!(
        "Created game {} with {} difficulty",
        game_id,
        profile.difficulty.label()
    );
    inner.games.insert(
        game_id.clone(),
        Arc::new(Mutex::new(DecisionEngine::new(profile))),
    );
    game_id
}

/// Short opaque game identifier (8 hex chars)
fn generate_game_id() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Difficulty;

    fn medium() -> AiProfile {
        AiProfile::preset(Difficulty::Medium)
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let registry = SessionRegistry::new();
        let id = registry
            .create_game(Some("g1".into()), AiProfile::preset(Difficulty::Hard))
            .await;
        assert_eq!(id, "g1");

        // Accumulate some state on the original engine
        let engine = registry.get_engine_by_game("g1").await.unwrap();
        engine.lock().await.record_hit(true);

        // Re-creating with a different profile must not reset anything
        let id = registry
            .create_game(Some("g1".into()), AiProfile::preset(Difficulty::Easy))
            .await;
        assert_eq!(id, "g1");

        let engine = registry.get_engine_by_game("g1").await.unwrap();
        let engine = engine.lock().await;
        assert_eq!(engine.profile().difficulty, Difficulty::Hard);
        assert_eq!(engine.state().hits, 1);
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique_enough() {
        let registry = SessionRegistry::new();
        let a = registry.create_game(None, medium()).await;
        let b = registry.create_game(None, medium()).await;
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
        assert_eq!(registry.game_count().await, 2);
    }

    #[tokio::test]
    async fn test_bind_unknown_game_fails() {
        let registry = SessionRegistry::new();
        assert!(registry.bind_client("c1", "nope").await.is_err());
        assert_eq!(registry.resolve("c1").await, None);
    }

    #[tokio::test]
    async fn test_unbind_and_reap() {
        let registry = SessionRegistry::new();
        registry.create_and_bind("c1", Some("g2".into()), medium()).await;
        assert_eq!(registry.resolve("c1").await.as_deref(), Some("g2"));

        registry.unbind_client("c1").await;
        assert_eq!(registry.reap_orphans().await, 1);
        assert!(registry.get_engine_by_game("g2").await.is_none());
    }

    #[tokio::test]
    async fn test_reap_spares_games_with_remaining_clients() {
        let registry = SessionRegistry::new();
        registry.create_and_bind("c1", Some("g2".into()), medium()).await;
        registry.bind_client("c2", "g2").await.unwrap();

        registry.unbind_client("c1").await;
        assert_eq!(registry.reap_orphans().await, 0);
        assert!(registry.get_engine_by_game("g2").await.is_some());

        registry.unbind_client("c2").await;
        assert_eq!(registry.reap_orphans().await, 1);
    }

    #[tokio::test]
    async fn test_engine_for_frame_auto_provisions() {
        let registry = SessionRegistry::new();

        // Unknown explicit game id: created and bound silently
        let (game_id, _) = registry.engine_for_frame("c1", Some("g9"), medium()).await;
        assert_eq!(game_id, "g9");
        assert_eq!(registry.resolve("c1").await.as_deref(), Some("g9"));

        // Known game id: reused, not recreated
        let (game_id, engine) = registry.engine_for_frame("c2", Some("g9"), medium()).await;
        assert_eq!(game_id, "g9");
        engine.lock().await.record_hit(true);

        // No game id at all: falls back to the client's binding
        let (game_id, engine) = registry.engine_for_frame("c2", None, medium()).await;
        assert_eq!(game_id, "g9");
        assert_eq!(engine.lock().await.state().hits, 1);

        // No game id and no binding: a fresh game appears
        let (game_id, _) = registry.engine_for_frame("c3", None, medium()).await;
        assert_ne!(game_id, "g9");
        assert_eq!(registry.resolve("c3").await, Some(game_id));
    }

    #[tokio::test]
    async fn test_get_engine_via_client() {
        let registry = SessionRegistry::new();
        assert!(registry.get_engine("c1").await.is_none());

        registry.create_and_bind("c1", Some("g3".into()), medium()).await;
        assert!(registry.get_engine("c1").await.is_some());
    }
}
