//! Accounts, channels and resolved remote actors

use super::ids::{AccountId, ChannelId};
use serde::{Deserialize, Serialize};

/// Account known locally, identified by its actor URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub url: String,
    pub display_name: String,
}

/// Data for creating an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub url: String,
    pub display_name: String,
}

/// Channel known locally; always belongs to one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub url: String,
    pub display_name: String,
    pub account_id: AccountId,
}

/// Data for creating a channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChannel {
    pub url: String,
    pub display_name: String,
    pub account_id: AccountId,
}

/// Channel half of a resolved actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub account_id: AccountId,
}

/// Result of resolving a remote actor identifier
///
/// An actor is either a plain account (`channel` is `None`) or a channel,
/// in which case `account_id` is the account owning that channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedActor {
    pub url: String,
    pub account_id: AccountId,
    pub channel: Option<ChannelRef>,
}

impl From<&Account> for ResolvedActor {
    fn from(account: &Account) -> Self {
        Self {
            url: account.url.clone(),
            account_id: account.id,
            channel: None,
        }
    }
}

impl From<&Channel> for ResolvedActor {
    fn from(channel: &Channel) -> Self {
        Self {
            url: channel.url.clone(),
            account_id: channel.account_id,
            channel: Some(ChannelRef {
                id: channel.id,
                account_id: channel.account_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_resolves_to_owning_account() {
        let channel = Channel {
            id: 7,
            url: "https://remote.example/video-channels/cooking".to_string(),
            display_name: "Cooking".to_string(),
            account_id: 3,
        };

        let actor = ResolvedActor::from(&channel);
        assert_eq!(actor.account_id, 3);
        assert_eq!(actor.channel, Some(ChannelRef { id: 7, account_id: 3 }));
    }

    #[test]
    fn account_resolves_without_channel() {
        let account = Account {
            id: 3,
            url: "https://remote.example/accounts/alice".to_string(),
            display_name: "Alice".to_string(),
        };

        assert!(ResolvedActor::from(&account).channel.is_none());
    }
}
