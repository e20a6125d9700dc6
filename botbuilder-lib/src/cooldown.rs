use ahash::AHashMap;
use parking_lot::Mutex;
use poise::serenity_prelude::UserId;
use std::time::{Duration, Instant};

/// When each user last started an assistant run.
#[derive(Default)]
pub struct Cooldowns(Mutex<AHashMap<UserId, Instant>>);

impl Cooldowns {
    /// Starts a new window for the user, or returns how long they still have
    /// to wait if the previous one hasn't passed yet.
    pub fn try_start(&self, user_id: UserId, cooldown: Duration) -> Result<(), Duration> {
        self.try_start_at(user_id, cooldown, Instant::now())
    }

    fn try_start_at(&self, user_id: UserId, cooldown: Duration, now: Instant) -> Result<(), Duration> {
        let mut last_runs = self.0.lock();

        if let Some(last_run) = last_runs.get(&user_id) {
            let elapsed = now.saturating_duration_since(*last_run);
            if elapsed < cooldown {
                return Err(cooldown - elapsed);
            }
        }

        last_runs.insert(user_id, now);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn users_wait_out_their_own_cooldown() {
        let cooldowns = Cooldowns::default();
        let (alice, bob) = (UserId::new(1), UserId::new(2));
        let cooldown = Duration::from_secs(10);
        let start = Instant::now();

        assert!(cooldowns.try_start_at(alice, cooldown, start).is_ok());
        assert_eq!(
            cooldowns.try_start_at(alice, cooldown, start + Duration::from_secs(4)),
            Err(Duration::from_secs(6))
        );
        assert!(cooldowns.try_start_at(bob, cooldown, start).is_ok());
        assert!(cooldowns.try_start_at(alice, cooldown, start + cooldown).is_ok());
    }

    #[test]
    fn refused_attempts_do_not_extend_the_window() {
        let cooldowns = Cooldowns::default();
        let user = UserId::new(1);
        let cooldown = Duration::from_secs(10);
        let start = Instant::now();

        cooldowns.try_start_at(user, cooldown, start).unwrap();
        cooldowns
            .try_start_at(user, cooldown, start + Duration::from_secs(9))
            .unwrap_err();

        assert!(cooldowns.try_start_at(user, cooldown, start + Duration::from_secs(10)).is_ok());
    }
}
