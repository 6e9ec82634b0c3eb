use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::rngs::StdRng;

use cf_fight_core::Pick;

use crate::config::Config;
use crate::judge::Judge;
use crate::store::SessionStore;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub judge: Arc<dyn Judge>,
    pub store: SessionStore,
    /// Draws problems inside a band. Only held for the synchronous selection.
    pub picker: Mutex<Box<dyn Pick + Send>>,
}

impl AppState {
    pub fn new(config: Config, judge: Arc<dyn Judge>) -> Self {
        let picker = StdRng::seed_from_u64(rand::random());
        Self::with_picker(config, judge, Box::new(picker))
    }

    pub fn with_picker(config: Config, judge: Arc<dyn Judge>, picker: Box<dyn Pick + Send>) -> Self {
        AppState {
            config,
            judge,
            store: SessionStore::new(),
            picker: Mutex::new(picker),
        }
    }
}

/// Generate a random 6-character uppercase alphanumeric room code.
pub fn generate_room_code() -> String {
    use rand::RngExt;
    let mut rng = rand::rng();
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..6)
        .map(|_| {
            let idx = rng.random_range(0..CHARS.len());
            CHARS[idx] as char
        })
        .collect()
}

/// Room codes and session ids are matched case-insensitively.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
