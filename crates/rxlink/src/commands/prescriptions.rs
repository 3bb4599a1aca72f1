//! Prescription command handlers.

use tabled::Tabled;

use rxlink_core::{
    CreatePrescriptionRequest, Name, Prescription, PrescriptionFilter, PrescriptionState,
    PrescriptionsArgs as ListVars,
};

use crate::cli::{GlobalOpts, PrescriptionsArgs, PrescriptionsCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Connection;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PrescriptionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Medication")]
    medication: String,
    #[tabled(rename = "Patient")]
    patient: String,
    #[tabled(rename = "Refills")]
    refills: String,
}

fn medication_label(rx: &Prescription) -> String {
    rx.medication.as_ref().map_or_else(
        || "-".into(),
        |m| m.name.clone().unwrap_or_else(|| m.id.clone()),
    )
}

fn patient_label(rx: &Prescription) -> String {
    rx.patient.as_ref().map_or_else(
        || "-".into(),
        |p| p.name.as_ref().map_or_else(|| p.id.clone(), Name::display),
    )
}

fn refills_label(rx: &Prescription) -> String {
    match (rx.refills_remaining, rx.refills_allowed) {
        (Some(left), Some(allowed)) => format!("{left}/{allowed}"),
        (None, Some(allowed)) => format!("?/{allowed}"),
        _ => "-".into(),
    }
}

impl From<&Prescription> for PrescriptionRow {
    fn from(rx: &Prescription) -> Self {
        Self {
            id: rx.id.clone(),
            state: output::enum_label(&rx.state),
            medication: medication_label(rx),
            patient: patient_label(rx),
            refills: refills_label(rx),
        }
    }
}

fn detail(rx: &Prescription) -> String {
    let quantity = match (rx.dispense_quantity, rx.dispense_unit.as_deref()) {
        (Some(q), Some(unit)) => format!("{q} {unit}"),
        (Some(q), None) => q.to_string(),
        _ => "-".into(),
    };
    let mut lines = vec![
        format!("ID:           {}", rx.id),
        format!("State:        {}", output::enum_label(&rx.state)),
        format!("Medication:   {}", medication_label(rx)),
        format!("Patient:      {}", patient_label(rx)),
        format!(
            "Prescriber:   {}",
            rx.prescriber
                .as_ref()
                .map_or_else(|| "-".into(), |p| p.name.clone().unwrap_or_else(|| p.id.clone()))
        ),
        format!("Dispense:     {quantity}"),
        format!("Refills:      {}", refills_label(rx)),
        format!(
            "Days supply:  {}",
            rx.days_supply.map_or_else(|| "-".into(), |d| d.to_string())
        ),
        format!("Instructions: {}", output::or_dash(rx.instructions.as_deref())),
    ];
    if let Some(notes) = &rx.notes {
        lines.push(format!("Notes:        {notes}"));
    }
    if let Some(expires) = &rx.expiration_date {
        lines.push(format!("Expires:      {expires}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    conn: &Connection,
    args: PrescriptionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = &conn.provider;
    match args.command {
        PrescriptionsCommand::List {
            page,
            patient_id,
            prescriber_id,
            state,
        } => {
            let state: Option<PrescriptionState> = state
                .map(|s| util::parse_enum("state", &s))
                .transpose()?;
            let filter = (patient_id.is_some() || prescriber_id.is_some() || state.is_some())
                .then(|| PrescriptionFilter {
                    patient_id,
                    prescriber_id,
                    state,
                    ..PrescriptionFilter::default()
                });
            let vars = ListVars {
                after: page.after,
                first: page.first,
                filter,
            };

            let store = provider.prescriptions_store();
            if let Some(err) = store.fetch(vars).await {
                return Err(err.into());
            }
            let prescriptions = store.slot().value;
            let out = output::render_list(
                &global.output,
                &prescriptions,
                |rx| PrescriptionRow::from(rx),
                |rx| rx.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PrescriptionsCommand::Get { id } => {
            let slot = provider
                .prescription(id.clone())
                .settled()
                .await
                .unwrap_or_default();
            if let Some(err) = slot.error {
                return Err(err.into());
            }
            let rx = slot.value.ok_or_else(|| CliError::NotFound {
                resource_type: "prescription".into(),
                identifier: id,
                list_command: "prescriptions list".into(),
            })?;
            let out = output::render_single(&global.output, &rx, detail, |rx| rx.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PrescriptionsCommand::Create { from_file, refetch } => {
            let request: CreatePrescriptionRequest = util::read_json_file(&from_file)?;

            let create = provider.create_prescription(util::refetch_options(&refetch));
            let rx = util::finish_mutation(create.invoke(request).await, global.quiet)?;
            let out = output::render_single(&global.output, &rx, detail, |rx| rx.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
