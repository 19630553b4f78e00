use crate::{
    api::{self, types::Specialty},
    cli::globals::GlobalArgs,
};
use anyhow::{Context, Result};
use std::fmt::Write;

#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub globals: GlobalArgs,
    pub mine: bool,
}

/// List the specialty catalogue, or only the signed-in user's specialties.
/// # Errors
/// Returns an error if the request fails.
pub async fn execute(args: Args) -> Result<()> {
    let client = args.globals.client()?;

    let specialties = if args.mine {
        api::specialties::mine(&client).await
    } else {
        api::specialties::all(&client).await
    }
    .context("failed to list specialties")?;

    print!("{}", render(&specialties));

    Ok(())
}

fn render(specialties: &[Specialty]) -> String {
    if specialties.is_empty() {
        return "no specialties\n".to_string();
    }

    let width = specialties
        .iter()
        .map(|specialty| specialty.id.to_string().len())
        .max()
        .unwrap_or(0);

    specialties.iter().fold(String::new(), |mut out, specialty| {
        let _ = write!(out, "{:<width$}  {}", specialty.id.to_string(), specialty.name);
        if let Some(description) = specialty.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(out, " - {description}");
        }
        out.push('\n');
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::SpecialtyId;

    #[test]
    fn render_aligns_ids() {
        let specialties = vec![
            Specialty {
                id: SpecialtyId::Number(7),
                name: "Radiologia".to_string(),
                description: Some("Imaging".to_string()),
            },
            Specialty {
                id: SpecialtyId::Text("cardio".to_string()),
                name: "Cardiologia".to_string(),
                description: None,
            },
        ];

        assert_eq!(
            render(&specialties),
            "7       Radiologia - Imaging\ncardio  Cardiologia\n"
        );
    }

    #[test]
    fn render_empty_list() {
        assert_eq!(render(&[]), "no specialties\n");
    }
}
