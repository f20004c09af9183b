//! Handler for the `account` command group.

use tabled::Tabled;

use super::command::AccountCommand;
use super::output;
use super::run::Journal;
use crate::domain::{TradingAccount, UserId};
use crate::port::JournalStore;
use crate::response::Envelope;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&TradingAccount> for AccountRow {
    fn from(account: &TradingAccount) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            created: account.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub async fn execute<S: JournalStore>(
    journal: &Journal<S>,
    user: &UserId,
    command: AccountCommand,
) -> bool {
    match command {
        AccountCommand::Create { name } => {
            let result = journal.accounts.create_account(user, &name).await;
            let envelope = Envelope::from_result(result, 201, "Account created");
            output::emit(&envelope, |account| {
                output::field("id", account.id);
                output::field("name", &account.name);
            })
        }
        AccountCommand::List => {
            let result = journal.accounts.list_accounts(user).await;
            let envelope = Envelope::from_result(result, 200, "Accounts listed");
            output::emit(&envelope, |accounts| {
                output::table(
                    accounts.iter().map(AccountRow::from).collect(),
                    "no accounts",
                );
            })
        }
        AccountCommand::Delete { account_id } => {
            let result = journal.accounts.delete_account(account_id).await;
            let envelope = Envelope::from_result(result, 200, "Account deleted");
            output::emit(&envelope, |account| {
                output::field("id", account.id);
                output::field("deleted at", output::opt(account.deleted_at));
            })
        }
    }
}
