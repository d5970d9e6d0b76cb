//! Game (group) table: fresh ids for legacy games and their memberships.

use std::collections::HashMap;
use tracing::debug;

use crate::classify::Bucket;
use crate::documents::{Game, GameUser, NO_GAME};
use crate::error::{Error, Result};
use crate::identity::{IdGenerator, IdentityResolver};
use crate::record::{str_field, LegacyKey};

/// Games of one run keyed by legacy key, plus the "No game" sentinel.
#[derive(Debug, Clone)]
pub struct GameTable {
    by_key: HashMap<LegacyKey, Game>,
    order: Vec<LegacyKey>,
    sentinel: Game,
    memberships: Vec<GameUser>,
}

impl GameTable {
    /// Builds the table from the games bucket.
    ///
    /// Members whose legacy id has no username are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a game has no name, or if the resolver fails for a
    /// reason other than an unknown user.
    pub fn build(
        games: &Bucket,
        resolver: &dyn IdentityResolver,
        ids: &dyn IdGenerator,
    ) -> Result<Self> {
        let mut order: Vec<LegacyKey> = games.keys().cloned().collect();
        order.sort();

        let mut by_key = HashMap::with_capacity(order.len());
        let mut memberships = Vec::new();

        for key in &order {
            let fields = &games[key];
            let name = str_field(fields, "name").ok_or_else(|| Error::MissingField {
                key: key.clone(),
                field: "name",
            })?;
            let game = Game {
                id: ids.next_id(),
                name: name.to_string(),
            };

            let members = fields
                .get("users")
                .and_then(|v| v.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default();
            for member in members.iter().filter_map(LegacyKey::from_value) {
                match resolver.resolve_user(&member) {
                    Ok(user) => memberships.push(GameUser {
                        user,
                        game: game.id.clone(),
                    }),
                    Err(Error::UnknownUser(_)) => {
                        debug!("Game {}: skipping unmapped member {}", key, member);
                    }
                    Err(e) => return Err(e),
                }
            }

            by_key.insert(key.clone(), game);
        }

        let sentinel = Game {
            id: ids.next_id(),
            name: NO_GAME.to_string(),
        };

        Ok(Self {
            by_key,
            order,
            sentinel,
            memberships,
        })
    }

    /// Returns the id of the game for `key`, the sentinel for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownGame`] if `key` is not in the table.
    pub fn resolve(&self, key: Option<&LegacyKey>) -> Result<&str> {
        match key {
            None => Ok(&self.sentinel.id),
            Some(key) => self
                .by_key
                .get(key)
                .map(|g| g.id.as_str())
                .ok_or_else(|| Error::UnknownGame(key.clone())),
        }
    }

    /// The "No game" placeholder.
    #[must_use]
    pub fn sentinel(&self) -> &Game {
        &self.sentinel
    }

    /// All games in legacy key order, sentinel last.
    #[must_use]
    pub fn games(&self) -> Vec<Game> {
        self.order
            .iter()
            .filter_map(|k| self.by_key.get(k))
            .chain(std::iter::once(&self.sentinel))
            .cloned()
            .collect()
    }

    /// Resolved membership edges.
    #[must_use]
    pub fn memberships(&self) -> &[GameUser] {
        &self.memberships
    }
}
