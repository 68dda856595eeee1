//! Service and revision mutations.

use kntree_core::CommandExecutor;

use super::Session;
use crate::cli::{RevisionArgs, RevisionCommand, ServiceArgs, ServiceCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle_service<E: CommandExecutor>(
    args: ServiceArgs,
    session: &Session<E>,
) -> Result<(), CliError> {
    let message = match args.command {
        ServiceCommand::Create { name, image } => {
            session.serving.create_service(&name, &image).await?;
            format!("Service '{name}' created and ready")
        }
        ServiceCommand::Delete { name } => {
            session.serving.delete_service(&name).await?;
            format!("Service '{name}' deleted")
        }
    };
    output::print_output(&output::done(&message, session.color));
    Ok(())
}

pub async fn handle_revision<E: CommandExecutor>(
    args: RevisionArgs,
    session: &Session<E>,
) -> Result<(), CliError> {
    let RevisionCommand::Delete { name } = args.command;
    session.serving.delete_revision(&name).await?;
    output::print_output(&output::done(&format!("Revision '{name}' deleted"), session.color));
    Ok(())
}
