//! Interactive prompts using dialoguer

use anyhow::Result;
use chrono::NaiveDate;
use console::style;
use dialoguer::{Confirm, Input, Select};

use crate::registry::{
    FormSubmission, SchemaVariant, INTERPRETATION_OPTIONS, PLAN_OPTIONS, SEX_OPTIONS,
};

const YES_NO_OPTIONS: &[&str] = &["Yes", "No", "Unknown"];

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Collect a full form submission for the given registry
pub fn prompt_form(variant: SchemaVariant, today: NaiveDate) -> Result<FormSubmission> {
    let mut form = FormSubmission::new();
    let today = today.format("%Y-%m-%d").to_string();

    match variant {
        SchemaVariant::Avs => {
            section("Patient");
            text(&mut form, "patient_code", "Patient code (de-identified)", None)?;
            text(&mut form, "age_years", "Age (years)", Some("52"))?;
            choice(&mut form, "sex", "Sex", SEX_OPTIONS)?;
            text(&mut form, "bmi_kg_m2", "BMI (kg/m2, blank if unknown)", Some(""))?;

            section("Procedure");
            text(&mut form, "procedure_date", "Procedure date", Some(&today))?;
            text(&mut form, "operator_name", "Operator", None)?;
            text(&mut form, "referring_service", "Referring service", Some("Endocrinology"))?;

            section("Measurements (blank if not taken)");
            for (key, label) in [
                ("aldo_ivc", "Aldosterone IVC (ng/dL)"),
                ("cort_ivc", "Cortisol IVC (ug/dL)"),
                ("aldo_r", "Aldosterone right (ng/dL)"),
                ("cort_r", "Cortisol right (ug/dL)"),
                ("aldo_l", "Aldosterone left (ng/dL)"),
                ("cort_l", "Cortisol left (ug/dL)"),
                ("si_r", "Selectivity index right"),
                ("si_l", "Selectivity index left"),
                ("li", "Lateralization index"),
            ] {
                text(&mut form, key, label, Some(""))?;
            }

            section("Outcome");
            choice(&mut form, "contralateral_suppression", "Contralateral suppression", YES_NO_OPTIONS)?;
            choice(&mut form, "final_interpretation", "Final interpretation", INTERPRETATION_OPTIONS)?;
            choice(&mut form, "management_plan", "Management plan", PLAN_OPTIONS)?;
            choice(&mut form, "bp_improved_3m", "BP improved at 3 months", YES_NO_OPTIONS)?;
            choice(&mut form, "k_normalized_3m", "Potassium normalized at 3 months", YES_NO_OPTIONS)?;
            choice(&mut form, "complication", "Complication", YES_NO_OPTIONS)?;
            text(&mut form, "notes", "Notes", Some(""))?;
        }
        SchemaVariant::Template => {
            section("Record");
            text(&mut form, "subject_code", "Subject code", None)?;
            text(&mut form, "visit_date", "Visit date", Some(&today))?;
            text(&mut form, "category", "Category", Some(""))?;
            text(&mut form, "outcome", "Outcome", Some(""))?;
            text(&mut form, "notes", "Notes", Some(""))?;
        }
    }

    Ok(form)
}

fn section(title: &str) {
    println!();
    println!("    {}", style(title).cyan().bold());
}

fn text(form: &mut FormSubmission, key: &str, prompt: &str, default: Option<&str>) -> Result<()> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    match default {
        Some(value) => {
            input = input
                .default(value.to_string())
                .show_default(!value.is_empty())
                .allow_empty(true);
        }
        None => {
            input = input.allow_empty(true);
        }
    }
    let value = input.interact_text()?;
    form.insert(key.to_string(), value);
    Ok(())
}

fn choice(form: &mut FormSubmission, key: &str, prompt: &str, options: &[&str]) -> Result<()> {
    let idx = Select::new()
        .with_prompt(prompt)
        .items(options)
        .default(0)
        .interact()?;
    form.insert(key.to_string(), options[idx].to_string());
    Ok(())
}
