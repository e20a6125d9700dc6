use crate::{BotDb, ReadWriteTree};
use color_eyre::eyre::Result;
use poise::serenity_prelude::{GuildId, UserId};
use serde::{Deserialize, Serialize};
use sled::Tree;

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
pub struct UserLevel {
    pub xp: u64,
}

impl UserLevel {
    pub fn progress(&self) -> LevelProgress {
        LevelProgress::from_xp(self.xp)
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct XpChange {
    amount: i64,
}

/// Experience needed to go from `level` to `level + 1`.
pub const fn xp_for_level_up(level: u64) -> u64 {
    5 * level * level + 50 * level + 100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u64,
    pub xp_into_level: u64,
    pub xp_for_next_level: u64,
}

impl LevelProgress {
    pub fn from_xp(xp: u64) -> Self {
        let mut level = 0;
        let mut remaining = xp;

        while remaining >= xp_for_level_up(level) {
            remaining -= xp_for_level_up(level);
            level += 1;
        }

        Self {
            level,
            xp_into_level: remaining,
            xp_for_next_level: xp_for_level_up(level),
        }
    }
}

pub struct LevelsDb(Tree);

impl LevelsDb {
    pub fn new(db: &BotDb) -> Result<Self> {
        let tree = db.open_tree("user_levels")?;

        fn add_xp(_key: &[u8], old_value: Option<&[u8]>, merged_bytes: &[u8]) -> Option<Vec<u8>> {
            BotDb::create_update_with_deserialization::<UserLevel>(
                old_value,
                |mut level| {
                    let Ok(change) = bincode::deserialize::<XpChange>(merged_bytes) else {
                        tracing::error!("Failed to deserialize xp change, {:?}", merged_bytes);
                        return level;
                    };

                    level.xp = level.xp.saturating_add_signed(change.amount);
                    level
                },
                Default::default,
            )
        }

        tree.set_merge_operator(add_xp);

        Ok(LevelsDb(tree))
    }

    pub fn get(&self, guild_id: GuildId, user_id: UserId) -> Result<UserLevel> {
        self.0
            .typed_get_or_default::<(u64, u64), UserLevel>(&key(guild_id, user_id))
    }

    /// Atomically adds (or, with a negative amount, removes) experience and
    /// returns the new total. Experience never drops below zero.
    pub fn add_experience(&self, guild_id: GuildId, user_id: UserId, amount: i64) -> Result<UserLevel> {
        let key = key(guild_id, user_id);

        self.0
            .typed_merge::<(u64, u64), XpChange>(&key, &XpChange { amount })?;

        self.0.typed_get_or_default::<(u64, u64), UserLevel>(&key)
    }
}

fn key(guild_id: GuildId, user_id: UserId) -> (u64, u64) {
    (guild_id.get(), user_id.get())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn level_curve() {
        assert_eq!(
            LevelProgress::from_xp(0),
            LevelProgress { level: 0, xp_into_level: 0, xp_for_next_level: 100 }
        );
        assert_eq!(
            LevelProgress::from_xp(100),
            LevelProgress { level: 1, xp_into_level: 0, xp_for_next_level: 155 }
        );
        assert_eq!(LevelProgress::from_xp(254).level, 1);
        assert_eq!(
            LevelProgress::from_xp(255),
            LevelProgress { level: 2, xp_into_level: 0, xp_for_next_level: 220 }
        );
    }

    #[test]
    fn experience_accumulates_per_guild() {
        let db = BotDb::temporary().unwrap();
        let levels = LevelsDb::new(&db).unwrap();
        let (guild, other_guild, user) = (GuildId::new(1), GuildId::new(2), UserId::new(3));

        assert_eq!(levels.get(guild, user).unwrap().xp, 0);
        assert_eq!(levels.add_experience(guild, user, 60).unwrap().xp, 60);
        assert_eq!(levels.add_experience(guild, user, 60).unwrap().xp, 120);
        assert_eq!(levels.get(guild, user).unwrap().progress().level, 1);
        assert_eq!(levels.get(other_guild, user).unwrap().xp, 0);
    }

    #[test]
    fn experience_never_goes_negative() {
        let db = BotDb::temporary().unwrap();
        let levels = LevelsDb::new(&db).unwrap();
        let (guild, user) = (GuildId::new(1), UserId::new(3));

        levels.add_experience(guild, user, 10).unwrap();

        assert_eq!(levels.add_experience(guild, user, -50).unwrap().xp, 0);
    }
}
