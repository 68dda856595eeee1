//! `kntree describe`: print a resource manifest as `kn` reports it.

use kntree_core::{CommandExecutor, ResourceKind};

use super::Session;
use crate::cli::{DescribeArgs, DescribeKind};
use crate::error::CliError;
use crate::output;

impl DescribeKind {
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Service => ResourceKind::Service,
            Self::Revision => ResourceKind::Revision,
            Self::Broker => ResourceKind::Broker,
            Self::Channel => ResourceKind::Channel,
            Self::Subscription => ResourceKind::Subscription,
        }
    }
}

pub async fn handle<E: CommandExecutor>(args: &DescribeArgs, session: &Session<E>) -> Result<(), CliError> {
    let kind = args.kind.resource_kind();
    let yaml = match args.kind {
        DescribeKind::Service | DescribeKind::Revision => {
            session.serving.describe(kind, &args.name).await?
        }
        DescribeKind::Broker | DescribeKind::Channel | DescribeKind::Subscription => {
            session.eventing.describe(kind, &args.name).await?
        }
    };
    output::print_output(yaml.trim_end());
    Ok(())
}
