//! API client command handlers.

use tabled::Tabled;

use rxlink_core::{ApiClient, ByIdArgs, NoArgs};

use crate::cli::{ClientsArgs, ClientsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::session::Connection;

use super::util;

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    app_type: String,
}

impl From<&ApiClient> for ClientRow {
    fn from(c: &ApiClient) -> Self {
        Self {
            id: c.id.clone(),
            name: output::or_dash(c.name.as_deref()),
            app_type: output::or_dash(c.app_type.as_deref()),
        }
    }
}

/// Secrets are shown once, right after rotation.
fn detail(c: &ApiClient) -> String {
    [
        format!("ID:      {}", c.id),
        format!("Name:    {}", output::or_dash(c.name.as_deref())),
        format!("Type:    {}", output::or_dash(c.app_type.as_deref())),
        format!("Secret:  {}", output::or_dash(c.secret.as_deref())),
    ]
    .join("\n")
}

pub async fn handle(
    conn: &Connection,
    args: ClientsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = &conn.provider;
    match args.command {
        ClientsCommand::List => {
            let store = provider.clients_store();
            if let Some(err) = store.fetch(NoArgs::default()).await {
                return Err(err.into());
            }
            let clients = store.slot().value;
            let out =
                output::render_list(&global.output, &clients, |c| ClientRow::from(c), |c| c.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ClientsCommand::RotateSecret { id, refetch } => {
            let rotate = provider.rotate_secret(util::refetch_options(&refetch));
            let client = util::finish_mutation(rotate.invoke(ByIdArgs::new(id)).await, global.quiet)?;
            let out = output::render_single(&global.output, &client, detail, |c| {
                c.secret.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
