//! Handler for the `group` command group.

use tabled::Tabled;

use super::command::GroupCommand;
use super::output;
use super::run::Journal;
use crate::application::GroupView;
use crate::domain::{GroupTrade, UserId};
use crate::port::JournalStore;
use crate::response::Envelope;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Broker")]
    broker: String,
    #[tabled(rename = "Qty")]
    quantity: String,
    #[tabled(rename = "Value")]
    price: String,
    #[tabled(rename = "Trades")]
    members: usize,
    #[tabled(rename = "Net P&L")]
    net: String,
}

impl From<&GroupView> for GroupRow {
    fn from(view: &GroupView) -> Self {
        let group = &view.group;
        let net: rust_decimal::Decimal = view.members.iter().map(|t| t.net_profit()).sum();
        Self {
            id: group.id.to_string(),
            name: group.name.clone(),
            market: group.market.clone(),
            broker: group.broker.clone(),
            quantity: group.quantity.normalize().to_string(),
            price: group.price.normalize().to_string(),
            members: group.trade_ids.len(),
            net: net.normalize().to_string(),
        }
    }
}

fn render_group(group: &GroupTrade) {
    output::field("id", group.id);
    output::field("name", &group.name);
    output::field("market", &group.market);
    output::field("broker", &group.broker);
    output::field("quantity", group.quantity.normalize());
    output::field("value", group.price.normalize());
    output::field("trades", group.trade_ids.len());
    if group.is_deleted {
        output::field("state", output::muted("dissolved"));
    }
}

pub async fn execute<S: JournalStore>(
    journal: &Journal<S>,
    user: &UserId,
    command: GroupCommand,
) -> bool {
    match command {
        GroupCommand::Create { name, trades } => {
            let result = journal.groups.create_group(user, &name, &trades).await;
            let envelope = Envelope::from_result(result, 201, "Group created");
            output::emit(&envelope, render_group)
        }
        GroupCommand::Add {
            group_id,
            trades,
            name,
        } => {
            let result = journal
                .groups
                .add_to_group(group_id, &trades, name.as_deref())
                .await;
            let envelope = Envelope::from_result(result, 200, "Trades added to group");
            output::emit(&envelope, render_group)
        }
        GroupCommand::Remove { group_id, trades } => {
            let result = journal.groups.remove_from_group(group_id, &trades).await;
            let envelope = Envelope::from_result(result, 200, "Trades removed from group");
            output::emit(&envelope, render_group)
        }
        GroupCommand::Delete { group_id } => {
            let result = journal.groups.delete_group(group_id).await;
            let envelope = Envelope::from_result(result, 200, "Group deleted");
            output::emit(&envelope, render_group)
        }
        GroupCommand::List => {
            let result = journal.groups.list_groups(user).await;
            let envelope = Envelope::from_result(result, 200, "Groups listed");
            output::emit(&envelope, |groups| {
                output::table(groups.iter().map(GroupRow::from).collect(), "no groups");
            })
        }
    }
}
