//! Text rendering of a decoded profile for terminal output.

use cardlink_decoder::{Age, Profile};
use std::fmt::Write;

/// Render a profile as an operator-facing card summary.
pub fn render_text(profile: &Profile) -> String {
    let mut out = String::new();

    // Infallible: writing to a String.
    let _ = write_profile(&mut out, profile);
    out
}

fn write_profile(out: &mut String, profile: &Profile) -> std::fmt::Result {
    let age = match profile.age() {
        Age::Years(years) => format!("{years} ans"),
        Age::NotComputable => Age::NotComputable.to_string(),
    };

    writeln!(out, "{}", profile.full_name())?;
    writeln!(out, "ID: {} • {} • {}", profile.id_number(), age, profile.sex())?;
    writeln!(out)?;

    writeln!(out, "Informations personnelles")?;
    writeln!(out, "  Naissance:      {}", profile.birth_date())?;
    writeln!(out, "  Résidence:      {}", profile.residence())?;
    writeln!(out, "  Ville:          {}", profile.city())?;
    writeln!(out, "  Pays:           {}", profile.country_display())?;
    writeln!(out, "  Code postal:    {}", profile.postal_code())?;
    writeln!(out)?;

    writeln!(out, "Informations administratives")?;
    writeln!(out, "  Commune:        {}", profile.municipality())?;
    writeln!(out, "  Arrondissement: {}", profile.district())?;
    writeln!(out, "  Émission:       {}", profile.issue_date())?;
    writeln!(out, "  Document:       {}", profile.document_number())?;

    if !profile.family().is_empty() {
        writeln!(out)?;
        writeln!(out, "Informations familiales")?;
        for member in profile.family() {
            writeln!(
                out,
                "  {} ({} • {})",
                member.name,
                member.sex_initial(),
                member.birth_date
            )?;
        }
    }

    writeln!(out)?;
    if profile.avatar().is_some() {
        writeln!(out, "Photo disponible")?;
    }
    write!(out, "Données récupérées en {}", profile.elapsed())
}
