//! Order command handlers.

use tabled::Tabled;

use rxlink_core::{
    CreateOrderRequest, Name, Order, OrderFilter, OrderState, OrdersArgs as ListVars,
};

use crate::cli::{GlobalOpts, OrdersArgs, OrdersCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Connection;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct OrderRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Fills")]
    fills: usize,
    #[tabled(rename = "Created")]
    created: String,
}

fn patient_label(o: &Order) -> String {
    o.patient.as_ref().map_or_else(
        || "-".into(),
        |p| p.name.as_ref().map_or_else(|| p.id.clone(), Name::display),
    )
}

impl From<&Order> for OrderRow {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id.clone(),
            state: output::enum_label(&o.state),
            patient: patient_label(o),
            fills: o.fills.len(),
            created: o
                .created_at
                .map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

fn detail(o: &Order) -> String {
    let mut lines = vec![
        format!("ID:        {}", o.id),
        format!("State:     {}", output::enum_label(&o.state)),
        format!("Patient:   {}", patient_label(o)),
        format!(
            "Pharmacy:  {}",
            o.pharmacy
                .as_ref()
                .map_or_else(|| "-".into(), |p| p.name.clone().unwrap_or_else(|| p.id.clone()))
        ),
    ];
    if let Some(created) = o.created_at {
        lines.push(format!("Created:   {}", created.to_rfc3339()));
    }
    if let Some(ext) = &o.external_id {
        lines.push(format!("External:  {ext}"));
    }
    for fill in &o.fills {
        let treatment = fill
            .treatment
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or("-");
        lines.push(format!(
            "Fill:      {} {} {treatment}",
            fill.id,
            output::enum_label(&fill.state)
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    conn: &Connection,
    args: OrdersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = &conn.provider;
    match args.command {
        OrdersCommand::List {
            page,
            patient_id,
            patient_name,
            state,
        } => {
            let state: Option<OrderState> = state
                .map(|s| util::parse_enum("state", &s))
                .transpose()?;
            let filter = (patient_id.is_some() || patient_name.is_some() || state.is_some())
                .then(|| OrderFilter {
                    patient_id,
                    patient_name,
                    state,
                });
            let vars = ListVars {
                after: page.after,
                first: page.first,
                filter,
            };

            let store = provider.orders_store();
            if let Some(err) = store.fetch(vars).await {
                return Err(err.into());
            }
            let orders = store.slot().value;
            let out = output::render_list(&global.output, &orders, |o| OrderRow::from(o), |o| o.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::Get { id } => {
            let slot = provider.order(id.clone()).settled().await.unwrap_or_default();
            if let Some(err) = slot.error {
                return Err(err.into());
            }
            let order = slot.value.ok_or_else(|| CliError::NotFound {
                resource_type: "order".into(),
                identifier: id,
                list_command: "orders list".into(),
            })?;
            let out = output::render_single(&global.output, &order, detail, |o| o.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        OrdersCommand::Create { from_file, refetch } => {
            let request: CreateOrderRequest = util::read_json_file(&from_file)?;
            if request.fills.is_empty() {
                return Err(CliError::Validation {
                    field: "fills".into(),
                    reason: "an order needs at least one fill".into(),
                });
            }

            let create = provider.create_order(util::refetch_options(&refetch));
            let order = util::finish_mutation(create.invoke(request).await, global.quiet)?;
            let out = output::render_single(&global.output, &order, detail, |o| o.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
