//! Broker, channel, and subscription mutations.

use kntree_core::CommandExecutor;

use super::Session;
use crate::cli::{
    BrokerArgs, ChannelArgs, CreateDeleteCommand, SubscriptionArgs, SubscriptionCommand,
};
use crate::error::CliError;
use crate::output;

pub async fn handle_broker<E: CommandExecutor>(
    args: BrokerArgs,
    session: &Session<E>,
) -> Result<(), CliError> {
    let eventing = &session.eventing;
    let message = match args.command {
        CreateDeleteCommand::Create { name } => {
            eventing.create_broker(&name).await?;
            format!("Broker '{name}' created")
        }
        CreateDeleteCommand::Delete { name } => {
            eventing.delete_broker(&name).await?;
            format!("Broker '{name}' deleted")
        }
    };
    output::print_output(&output::done(&message, session.color));
    Ok(())
}

pub async fn handle_channel<E: CommandExecutor>(
    args: ChannelArgs,
    session: &Session<E>,
) -> Result<(), CliError> {
    let eventing = &session.eventing;
    let message = match args.command {
        CreateDeleteCommand::Create { name } => {
            eventing.create_channel(&name).await?;
            format!("Channel '{name}' created")
        }
        CreateDeleteCommand::Delete { name } => {
            eventing.delete_channel(&name).await?;
            format!("Channel '{name}' deleted")
        }
    };
    output::print_output(&output::done(&message, session.color));
    Ok(())
}

pub async fn handle_subscription<E: CommandExecutor>(
    args: SubscriptionArgs,
    session: &Session<E>,
) -> Result<(), CliError> {
    let SubscriptionCommand::Delete { name } = args.command;
    session.eventing.delete_subscription(&name).await?;
    output::print_output(&output::done(&format!("Subscription '{name}' deleted"), session.color));
    Ok(())
}
