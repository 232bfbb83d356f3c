use axum::extract::FromRef;

use crate::ledger::ReactionService;
use crate::provider::{IdentityProvider, MetadataProvider};
use crate::user::UserStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedReactionService = Arc<ReactionService>;
pub type GuardedUserStore = Arc<dyn UserStore>;
pub type GuardedIdentityProvider = Arc<dyn IdentityProvider>;
pub type GuardedMetadataProvider = Arc<dyn MetadataProvider>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub reactions: GuardedReactionService,
    pub user_store: GuardedUserStore,
    pub identity: GuardedIdentityProvider,
    pub metadata: GuardedMetadataProvider,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedReactionService {
    fn from_ref(input: &ServerState) -> Self {
        input.reactions.clone()
    }
}

impl FromRef<ServerState> for GuardedUserStore {
    fn from_ref(input: &ServerState) -> Self {
        input.user_store.clone()
    }
}

impl FromRef<ServerState> for GuardedIdentityProvider {
    fn from_ref(input: &ServerState) -> Self {
        input.identity.clone()
    }
}

impl FromRef<ServerState> for GuardedMetadataProvider {
    fn from_ref(input: &ServerState) -> Self {
        input.metadata.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
