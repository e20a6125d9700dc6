use crate::{BotDb, ReadWriteTree};
use color_eyre::eyre::Result;
use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use serde::{Deserialize, Serialize};
use sled::Tree;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub user_id: u64,
    pub subject: String,
    /// Unix timestamp, seconds.
    pub created_at: i64,
    pub open: bool,
}

/// Support tickets, keyed by their channel.
pub struct TicketsDb {
    db: BotDb,
    tree: Tree,
}

impl TicketsDb {
    pub fn new(db: &BotDb) -> Result<Self> {
        Ok(Self {
            tree: db.open_tree("tickets")?,
            db: db.clone(),
        })
    }

    pub fn next_id(&self) -> Result<u64> {
        self.db.generate_id()
    }

    pub fn open(&self, ticket: &Ticket) -> Result<()> {
        self.tree.typed_insert::<u64, Ticket>(&ticket.channel_id, ticket)
    }

    pub fn get(&self, channel_id: ChannelId) -> Result<Option<Ticket>> {
        self.tree.typed_get::<u64, Ticket>(&channel_id.get())
    }

    /// The ticket the user currently has open in the guild, if any.
    pub fn open_for_user(&self, guild_id: GuildId, user_id: UserId) -> Result<Option<Ticket>> {
        Ok(self
            .tree
            .typed_values::<Ticket>()?
            .into_iter()
            .find(|ticket| {
                ticket.open && ticket.guild_id == guild_id.get() && ticket.user_id == user_id.get()
            }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ticket(tickets: &TicketsDb, channel_id: u64) -> Ticket {
        Ticket {
            id: tickets.next_id().unwrap(),
            guild_id: 1,
            channel_id,
            user_id: 7,
            subject: "I can't see the rules channel".to_owned(),
            created_at: 1_700_000_000,
            open: true,
        }
    }

    #[test]
    fn only_open_tickets_count_for_a_user() {
        let db = BotDb::temporary().unwrap();
        let tickets = TicketsDb::new(&db).unwrap();
        let first = ticket(&tickets, 100);

        tickets.open(&first).unwrap();

        assert_eq!(tickets.get(ChannelId::new(100)).unwrap(), Some(first.clone()));
        assert_eq!(
            tickets.open_for_user(GuildId::new(1), UserId::new(7)).unwrap(),
            Some(first.clone())
        );

        let closed = Ticket {
            open: false,
            ..first
        };
        tickets.open(&closed).unwrap();

        assert_eq!(tickets.open_for_user(GuildId::new(1), UserId::new(7)).unwrap(), None);
        assert_eq!(tickets.get(ChannelId::new(200)).unwrap(), None);
    }

    #[test]
    fn ids_are_unique() {
        let db = BotDb::temporary().unwrap();
        let tickets = TicketsDb::new(&db).unwrap();

        assert_ne!(ticket(&tickets, 1).id, ticket(&tickets, 2).id);
    }
}
