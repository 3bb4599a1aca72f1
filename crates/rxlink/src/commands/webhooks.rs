//! Webhook command handlers.

use tabled::Tabled;

use rxlink_core::{ByIdArgs, CreateWebhookRequest, NoArgs, WebhookConfig};

use crate::cli::{GlobalOpts, WebhooksArgs, WebhooksCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Connection;

use super::util;

#[derive(Tabled)]
struct WebhookRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Events")]
    filters: String,
}

fn filters_label(w: &WebhookConfig) -> String {
    if w.filters.is_empty() {
        "all".into()
    } else {
        w.filters.join(", ")
    }
}

impl From<&WebhookConfig> for WebhookRow {
    fn from(w: &WebhookConfig) -> Self {
        Self {
            id: w.id.clone(),
            name: output::or_dash(w.name.as_deref()),
            url: output::or_dash(w.url.as_deref()),
            filters: filters_label(w),
        }
    }
}

fn detail(w: &WebhookConfig) -> String {
    [
        format!("ID:      {}", w.id),
        format!("Name:    {}", output::or_dash(w.name.as_deref())),
        format!("URL:     {}", output::or_dash(w.url.as_deref())),
        format!("Events:  {}", filters_label(w)),
    ]
    .join("\n")
}

pub async fn handle(
    conn: &Connection,
    args: WebhooksArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = &conn.provider;
    match args.command {
        WebhooksCommand::List => {
            let store = provider.webhooks_store();
            if let Some(err) = store.fetch(NoArgs::default()).await {
                return Err(err.into());
            }
            let hooks = store.slot().value;
            let out = output::render_list(&global.output, &hooks, |w| WebhookRow::from(w), |w| w.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WebhooksCommand::Create {
            url,
            name,
            shared_secret,
            filters,
            refetch,
        } => {
            url::Url::parse(&url).map_err(|e| CliError::Validation {
                field: "url".into(),
                reason: e.to_string(),
            })?;
            let request = CreateWebhookRequest {
                url,
                name,
                shared_secret,
                filters: (!filters.is_empty()).then_some(filters),
            };

            let create = provider.create_webhook(util::refetch_options(&refetch));
            let hook = util::finish_mutation(create.invoke(request).await, global.quiet)?;
            let out = output::render_single(&global.output, &hook, detail, |w| w.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WebhooksCommand::Delete { id, refetch } => {
            let delete = provider.delete_webhook(util::refetch_options(&refetch));
            let deleted =
                util::finish_mutation(delete.invoke(ByIdArgs::new(id.clone())).await, global.quiet)?;
            if !deleted {
                return Err(CliError::NotFound {
                    resource_type: "webhook".into(),
                    identifier: id,
                    list_command: "webhooks list".into(),
                });
            }
            output::print_status(&output::ok(&format!("Deleted webhook {id}")), global.quiet);
            Ok(())
        }
    }
}
