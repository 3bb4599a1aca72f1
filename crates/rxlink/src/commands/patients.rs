//! Patient command handlers.

use tabled::Tabled;

use rxlink_core::{
    CreatePatientRequest, NameInput, Patient, PatientFilter, PatientsArgs as ListVars, SexType,
    UpdatePatientRequest,
};

use crate::cli::{GlobalOpts, PatientsArgs, PatientsCommand};
use crate::error::CliError;
use crate::output;
use crate::session::Connection;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PatientRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Born")]
    dob: String,
    #[tabled(rename = "Sex")]
    sex: String,
    #[tabled(rename = "Phone")]
    phone: String,
}

impl From<&Patient> for PatientRow {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.display(),
            dob: output::or_dash(p.date_of_birth.as_deref()),
            sex: p.sex.as_ref().map_or_else(|| "-".into(), output::enum_label),
            phone: output::or_dash(p.phone.as_deref()),
        }
    }
}

fn detail(p: &Patient) -> String {
    let mut lines = vec![
        format!("ID:          {}", p.id),
        format!("Name:        {}", p.name.display()),
        format!("Born:        {}", output::or_dash(p.date_of_birth.as_deref())),
        format!(
            "Sex:         {}",
            p.sex.as_ref().map_or_else(|| "-".into(), output::enum_label)
        ),
        format!("Phone:       {}", output::or_dash(p.phone.as_deref())),
        format!("Email:       {}", output::or_dash(p.email.as_deref())),
    ];
    if let Some(ext) = &p.external_id {
        lines.push(format!("External ID: {ext}"));
    }
    if let Some(a) = &p.address {
        lines.push(format!(
            "Address:     {}, {} {} {}, {}",
            a.street1, a.city, a.state, a.postal_code, a.country
        ));
    }
    lines.join("\n")
}

fn print_patient(p: &Patient, global: &GlobalOpts) {
    let out = output::render_single(&global.output, p, detail, |p| p.id.clone());
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    conn: &Connection,
    args: PatientsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let provider = &conn.provider;
    match args.command {
        PatientsCommand::List { page, name } => {
            let vars = ListVars {
                after: page.after,
                first: page.first,
                filter: name.map(|name| PatientFilter { name: Some(name) }),
            };
            let store = provider.patients_store();
            if let Some(err) = store.fetch(vars).await {
                return Err(err.into());
            }
            let patients = store.slot().value;
            let out = output::render_list(&global.output, &patients, |p| PatientRow::from(p), |p| {
                p.id.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PatientsCommand::Get { id } => {
            let slot = provider
                .patient(id.clone())
                .settled()
                .await
                .unwrap_or_default();
            if let Some(err) = slot.error {
                return Err(err.into());
            }
            let patient = slot.value.ok_or_else(|| CliError::NotFound {
                resource_type: "patient".into(),
                identifier: id,
                list_command: "patients list".into(),
            })?;
            print_patient(&patient, global);
            Ok(())
        }

        PatientsCommand::Create {
            first,
            last,
            dob,
            sex,
            phone,
            email,
            external_id,
            from_file,
            refetch,
        } => {
            let request = if let Some(path) = from_file {
                util::read_json_file::<CreatePatientRequest>(&path)?
            } else {
                let sex: SexType = util::parse_enum("sex", sex.as_deref().unwrap_or_default())?;
                CreatePatientRequest {
                    name: NameInput {
                        first: first.unwrap_or_default(),
                        last: last.unwrap_or_default(),
                        middle: None,
                        title: None,
                    },
                    date_of_birth: dob.unwrap_or_default(),
                    sex,
                    phone: phone.unwrap_or_default(),
                    email,
                    gender: None,
                    external_id,
                    address: None,
                }
            };

            let create = provider.create_patient(util::refetch_options(&refetch));
            let outcome = create.invoke(request).await;
            let patient = util::finish_mutation(outcome, global.quiet)?;
            print_patient(&patient, global);
            Ok(())
        }

        PatientsCommand::Update {
            id,
            first,
            last,
            email,
            phone,
            external_id,
            refetch,
        } => {
            let name = match (first, last) {
                (Some(first), Some(last)) => Some(NameInput {
                    first,
                    last,
                    middle: None,
                    title: None,
                }),
                _ => None,
            };
            let request = UpdatePatientRequest {
                id,
                name,
                email,
                phone,
                external_id,
                ..UpdatePatientRequest::default()
            };

            let update = provider.update_patient(util::refetch_options(&refetch));
            let outcome = update.invoke(request).await;
            let patient = util::finish_mutation(outcome, global.quiet)?;
            print_patient(&patient, global);
            Ok(())
        }
    }
}
