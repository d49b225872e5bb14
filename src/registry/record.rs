//! Statically declared registry records and form-submission parsing
//!
//! A form submission is a plain mapping of field name to raw text. Each
//! registry variant parses it into its own record type, collecting every
//! problem it finds instead of stopping at the first one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};
use crate::pipeline::cell::{format_number, parse_date_lenient, parse_number_lenient};
use crate::registry::schema::SchemaVariant;

/// Raw field name -> value mapping handed over by a data-entry surface
pub type FormSubmission = BTreeMap<String, String>;

pub const SEX_OPTIONS: &[&str] = &["Female", "Male", "Other"];

pub const INTERPRETATION_OPTIONS: &[&str] = &[
    "Unilateral right",
    "Unilateral left",
    "Bilateral hypersecretion",
    "Non-diagnostic",
    "Indeterminate",
];

pub const PLAN_OPTIONS: &[&str] = &[
    "Right adrenalectomy",
    "Left adrenalectomy",
    "Medical therapy",
    "Repeat AVS",
    "Pending MDT decision",
];

/// Plans acceptable for a non-diagnostic sampling
pub const NON_DIAGNOSTIC_PLANS: &[&str] = &["Repeat AVS", "Pending MDT decision"];

pub const MIN_AGE_YEARS: i64 = 18;
pub const MAX_AGE_YEARS: i64 = 100;
pub const MIN_BMI: f64 = 10.0;
pub const MAX_BMI: f64 = 80.0;

/// A record type that can be appended to a registry file
pub trait RegistryRecord: Sized {
    /// The registry this record belongs to
    const VARIANT: SchemaVariant;

    /// Parse and validate a submission, assigning id and entry timestamp
    fn from_form(form: &FormSubmission, now: NaiveDateTime) -> RegistryResult<Self>;

    fn record_id(&self) -> &str;

    /// Values in schema column order; `None` is written as an empty field
    fn to_row(&self) -> Vec<Option<String>>;
}

/// Tri-state answer stored as `Yes` / `No` / `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YesNo {
    Yes,
    No,
    #[default]
    Unknown,
}

impl YesNo {
    /// Lenient parse: yes/true/y/1 and no/false/n/0, anything else is unknown
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "yes" | "true" | "y" | "1" => YesNo::Yes,
            "no" | "false" | "n" | "0" => YesNo::No,
            _ => YesNo::Unknown,
        }
    }
}

impl fmt::Display for YesNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YesNo::Yes => write!(f, "Yes"),
            YesNo::No => write!(f, "No"),
            YesNo::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One adrenal vein sampling case
#[derive(Debug, Clone, PartialEq)]
pub struct AvsRecord {
    pub record_id: String,
    pub entry_timestamp: String,
    pub patient_code: String,
    pub age_years: i64,
    pub sex: String,
    pub bmi_kg_m2: Option<f64>,
    pub procedure_date: NaiveDate,
    pub operator_name: String,
    pub referring_service: String,
    pub aldosterone_ng_dl_ivc: Option<f64>,
    pub cortisol_ug_dl_ivc: Option<f64>,
    pub aldosterone_ng_dl_right: Option<f64>,
    pub cortisol_ug_dl_right: Option<f64>,
    pub aldosterone_ng_dl_left: Option<f64>,
    pub cortisol_ug_dl_left: Option<f64>,
    pub selectivity_index_right: Option<f64>,
    pub selectivity_index_left: Option<f64>,
    pub lateralization_index: Option<f64>,
    pub contralateral_suppression: YesNo,
    pub final_interpretation: String,
    pub management_plan: String,
    pub bp_improved_3m: YesNo,
    pub k_normalized_3m: YesNo,
    pub complication: YesNo,
    pub notes: String,
}

/// Measurement fields: (column, short form key, label used in messages)
const AVS_MEASUREMENTS: &[(&str, &str, &str)] = &[
    ("aldosterone_ng_dl_ivc", "aldo_ivc", "Aldosterone IVC"),
    ("cortisol_ug_dl_ivc", "cort_ivc", "Cortisol IVC"),
    ("aldosterone_ng_dl_right", "aldo_r", "Aldosterone right"),
    ("cortisol_ug_dl_right", "cort_r", "Cortisol right"),
    ("aldosterone_ng_dl_left", "aldo_l", "Aldosterone left"),
    ("cortisol_ug_dl_left", "cort_l", "Cortisol left"),
    ("selectivity_index_right", "si_r", "Selectivity index right"),
    ("selectivity_index_left", "si_l", "Selectivity index left"),
    ("lateralization_index", "li", "Lateralization index"),
];

impl RegistryRecord for AvsRecord {
    const VARIANT: SchemaVariant = SchemaVariant::Avs;

    fn from_form(form: &FormSubmission, now: NaiveDateTime) -> RegistryResult<Self> {
        let mut errors = Vec::new();
        let today = now.date();

        let patient_code = field(form, &["patient_code"]);
        if patient_code.is_empty() {
            errors.push("Patient code is required (use a de-identified study ID).".to_string());
        }

        let age_raw = field(form, &["age_years", "age"]);
        let age_years = match parse_whole_number(&age_raw) {
            Some(age) => {
                if !(MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&age) {
                    errors.push(format!(
                        "Age should be between {} and {} years for adult AVS workflow.",
                        MIN_AGE_YEARS, MAX_AGE_YEARS
                    ));
                }
                age
            }
            None => {
                errors.push("Age is required and must be a whole number of years.".to_string());
                0
            }
        };

        let sex = field(form, &["sex"]);
        if !SEX_OPTIONS.contains(&sex.as_str()) {
            errors.push(format!("Sex must be one of: {}.", SEX_OPTIONS.join(", ")));
        }

        let bmi_kg_m2 = optional_number(form, &["bmi_kg_m2", "bmi"], "BMI", &mut errors);
        if let Some(bmi) = bmi_kg_m2 {
            if !(MIN_BMI..=MAX_BMI).contains(&bmi) {
                errors.push(format!(
                    "BMI should be between {} and {} kg/m2.",
                    MIN_BMI, MAX_BMI
                ));
            }
        }

        let procedure_date = required_date(
            form,
            &["procedure_date"],
            "Procedure date",
            today,
            &mut errors,
        );

        let operator_name = field(form, &["operator_name", "operator"]);
        if operator_name.is_empty() {
            errors.push("Operator name is required.".to_string());
        }

        let mut measurements = [None; 9];
        for (slot, (column, short, label)) in measurements.iter_mut().zip(AVS_MEASUREMENTS) {
            *slot = optional_number(form, &[*column, *short], label, &mut errors);
        }

        let final_interpretation = field(form, &["final_interpretation", "interpretation"]);
        if !INTERPRETATION_OPTIONS.contains(&final_interpretation.as_str()) {
            errors.push(format!(
                "Final interpretation must be one of: {}.",
                INTERPRETATION_OPTIONS.join(", ")
            ));
        }

        let management_plan = field(form, &["management_plan", "plan"]);
        if !PLAN_OPTIONS.contains(&management_plan.as_str()) {
            errors.push(format!(
                "Management plan must be one of: {}.",
                PLAN_OPTIONS.join(", ")
            ));
        }

        if final_interpretation == "Non-diagnostic"
            && !NON_DIAGNOSTIC_PLANS.contains(&management_plan.as_str())
        {
            errors.push(
                "For non-diagnostic cases, management plan should usually be Repeat AVS or Pending MDT decision."
                    .to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(RegistryError::Validation(errors));
        }

        let [aldo_ivc, cort_ivc, aldo_r, cort_r, aldo_l, cort_l, si_r, si_l, li] = measurements;

        Ok(Self {
            record_id: format!("avs_{}_{}", now.format("%Y%m%d"), short_uuid()),
            entry_timestamp: timestamp(now),
            patient_code,
            age_years,
            sex,
            bmi_kg_m2,
            // validated above
            procedure_date: procedure_date.unwrap_or(today),
            operator_name,
            referring_service: field(form, &["referring_service"]),
            aldosterone_ng_dl_ivc: aldo_ivc,
            cortisol_ug_dl_ivc: cort_ivc,
            aldosterone_ng_dl_right: aldo_r,
            cortisol_ug_dl_right: cort_r,
            aldosterone_ng_dl_left: aldo_l,
            cortisol_ug_dl_left: cort_l,
            selectivity_index_right: si_r,
            selectivity_index_left: si_l,
            lateralization_index: li,
            contralateral_suppression: YesNo::parse(&field(form, &["contralateral_suppression"])),
            final_interpretation,
            management_plan,
            bp_improved_3m: YesNo::parse(&field(form, &["bp_improved_3m"])),
            k_normalized_3m: YesNo::parse(&field(form, &["k_normalized_3m"])),
            complication: YesNo::parse(&field(form, &["complication"])),
            notes: field(form, &["notes"]),
        })
    }

    fn record_id(&self) -> &str {
        &self.record_id
    }

    fn to_row(&self) -> Vec<Option<String>> {
        let num = |v: Option<f64>| v.map(format_number);
        vec![
            non_empty(&self.record_id),
            non_empty(&self.entry_timestamp),
            non_empty(&self.patient_code),
            Some(self.age_years.to_string()),
            non_empty(&self.sex),
            num(self.bmi_kg_m2),
            Some(self.procedure_date.format("%Y-%m-%d").to_string()),
            non_empty(&self.operator_name),
            non_empty(&self.referring_service),
            num(self.aldosterone_ng_dl_ivc),
            num(self.cortisol_ug_dl_ivc),
            num(self.aldosterone_ng_dl_right),
            num(self.cortisol_ug_dl_right),
            num(self.aldosterone_ng_dl_left),
            num(self.cortisol_ug_dl_left),
            num(self.selectivity_index_right),
            num(self.selectivity_index_left),
            num(self.lateralization_index),
            Some(self.contralateral_suppression.to_string()),
            non_empty(&self.final_interpretation),
            non_empty(&self.management_plan),
            Some(self.bp_improved_3m.to_string()),
            Some(self.k_normalized_3m.to_string()),
            Some(self.complication.to_string()),
            non_empty(&self.notes),
        ]
    }
}

/// One record of the generic study template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRecord {
    pub record_id: String,
    pub entry_timestamp: String,
    pub subject_code: String,
    pub visit_date: NaiveDate,
    pub category: String,
    pub outcome: String,
    pub notes: String,
}

impl RegistryRecord for TemplateRecord {
    const VARIANT: SchemaVariant = SchemaVariant::Template;

    fn from_form(form: &FormSubmission, now: NaiveDateTime) -> RegistryResult<Self> {
        let mut errors = Vec::new();

        let subject_code = field(form, &["subject_code"]);
        if subject_code.is_empty() {
            errors.push("Subject Code is required.".to_string());
        }

        // An omitted visit date means today
        let visit_raw = field(form, &["visit_date"]);
        let visit_date = if visit_raw.is_empty() {
            Some(now.date())
        } else {
            let parsed = parse_date_lenient(&visit_raw);
            if parsed.is_none() {
                errors.push(format!(
                    "Visit date '{}' is not a valid date (expected YYYY-MM-DD).",
                    visit_raw
                ));
            }
            parsed
        };

        if !errors.is_empty() {
            return Err(RegistryError::Validation(errors));
        }

        Ok(Self {
            record_id: format!("rec_{}", now.format("%Y%m%d_%H%M%S")),
            entry_timestamp: timestamp(now),
            subject_code,
            visit_date: visit_date.unwrap_or_else(|| now.date()),
            category: field(form, &["category"]),
            outcome: field(form, &["outcome"]),
            notes: field(form, &["notes"]),
        })
    }

    fn record_id(&self) -> &str {
        &self.record_id
    }

    fn to_row(&self) -> Vec<Option<String>> {
        vec![
            non_empty(&self.record_id),
            non_empty(&self.entry_timestamp),
            non_empty(&self.subject_code),
            Some(self.visit_date.format("%Y-%m-%d").to_string()),
            non_empty(&self.category),
            non_empty(&self.outcome),
            non_empty(&self.notes),
        ]
    }
}

/// Convert a JSON object into a form submission
///
/// Strings are taken as-is, numbers and booleans are stringified and nulls
/// are skipped. Anything other than an object is rejected.
pub fn form_from_json(value: &serde_json::Value) -> Result<FormSubmission, String> {
    let object = value
        .as_object()
        .ok_or_else(|| "Form JSON must be an object of field -> value".to_string())?;

    let mut form = FormSubmission::new();
    for (key, v) in object {
        let text = match v {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => return Err(format!("Field '{}' has unsupported value {}", key, other)),
        };
        form.insert(key.clone(), text);
    }
    Ok(form)
}

/// First non-empty trimmed value among the given keys
fn field(form: &FormSubmission, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|k| form.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or("")
        .to_string()
}

fn optional_number(
    form: &FormSubmission,
    keys: &[&str],
    label: &str,
    errors: &mut Vec<String>,
) -> Option<f64> {
    let raw = field(form, keys);
    if raw.is_empty() {
        return None;
    }
    match parse_number_lenient(&raw) {
        Some(v) if v >= 0.0 => Some(v),
        _ => {
            errors.push(format!("{} must be a non-negative number (got '{}').", label, raw));
            None
        }
    }
}

fn required_date(
    form: &FormSubmission,
    keys: &[&str],
    label: &str,
    today: NaiveDate,
    errors: &mut Vec<String>,
) -> Option<NaiveDate> {
    let raw = field(form, keys);
    if raw.is_empty() {
        errors.push(format!("{} is required (YYYY-MM-DD).", label));
        return None;
    }
    match parse_date_lenient(&raw) {
        Some(date) if date > today => {
            errors.push(format!("{} cannot be in the future.", label));
            Some(date)
        }
        Some(date) => Some(date),
        None => {
            errors.push(format!(
                "{} '{}' is not a valid date (expected YYYY-MM-DD).",
                label, raw
            ));
            None
        }
    }
}

fn parse_whole_number(raw: &str) -> Option<i64> {
    let value = parse_number_lenient(raw)?;
    if value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn timestamp(now: NaiveDateTime) -> String {
    now.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn short_uuid() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn valid_avs_form() -> FormSubmission {
        [
            ("patient_code", " AVS_0001 "),
            ("age_years", "52"),
            ("sex", "Female"),
            ("bmi_kg_m2", "26.5"),
            ("procedure_date", "2024-05-20"),
            ("operator_name", "Dr Smith"),
            ("si_r", "3.1"),
            ("selectivity_index_left", "2.0"),
            ("final_interpretation", "Unilateral left"),
            ("management_plan", "Left adrenalectomy"),
            ("complication", "no"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_valid_avs_form_parses() {
        let record = AvsRecord::from_form(&valid_avs_form(), now()).unwrap();

        assert_eq!(record.patient_code, "AVS_0001");
        assert_eq!(record.age_years, 52);
        assert_eq!(record.selectivity_index_right, Some(3.1));
        assert_eq!(record.selectivity_index_left, Some(2.0));
        assert_eq!(record.complication, YesNo::No);
        assert_eq!(record.bp_improved_3m, YesNo::Unknown);
        assert!(record.record_id.starts_with("avs_20240601_"));
        assert_eq!(record.record_id.len(), "avs_20240601_".len() + 8);
        assert_eq!(record.entry_timestamp, "2024-06-01T09:30:00");
    }

    #[test]
    fn test_avs_row_matches_schema_width() {
        let record = AvsRecord::from_form(&valid_avs_form(), now()).unwrap();
        let row = record.to_row();

        assert_eq!(row.len(), SchemaVariant::Avs.column_names().len());
        assert_eq!(row[3].as_deref(), Some("52"));
        assert_eq!(row[5].as_deref(), Some("26.5"));
        assert_eq!(row[6].as_deref(), Some("2024-05-20"));
        assert_eq!(row[8], None);
        assert_eq!(row[23].as_deref(), Some("No"));
    }

    #[test]
    fn test_all_validation_errors_collected() {
        let mut form = FormSubmission::new();
        form.insert("age_years".into(), "12".into());
        form.insert("procedure_date".into(), "2030-01-01".into());
        form.insert("final_interpretation".into(), "Non-diagnostic".into());
        form.insert("management_plan".into(), "Medical therapy".into());

        let err = AvsRecord::from_form(&form, now()).unwrap_err();
        let errors = err.validation_errors();

        assert!(errors.iter().any(|e| e.contains("Patient code is required")));
        assert!(errors.iter().any(|e| e.contains("Age should be between 18 and 100")));
        assert!(errors.iter().any(|e| e.contains("Operator name is required")));
        assert!(errors.iter().any(|e| e.contains("cannot be in the future")));
        assert!(errors.iter().any(|e| e.contains("non-diagnostic cases")));
        assert!(errors.iter().any(|e| e.contains("Sex must be one of")));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_bad_measurement_is_reported() {
        let mut form = valid_avs_form();
        form.insert("li".into(), "-1".into());
        form.insert("cort_ivc".into(), "abc".into());

        let err = AvsRecord::from_form(&form, now()).unwrap_err();
        let errors = err.validation_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Cortisol IVC"));
        assert!(errors[1].contains("Lateralization index"));
    }

    #[test]
    fn test_template_defaults_visit_date_to_today() {
        let mut form = FormSubmission::new();
        form.insert("subject_code".into(), "S-01".into());
        form.insert("category".into(), "  control ".into());

        let record = TemplateRecord::from_form(&form, now()).unwrap();
        assert_eq!(record.record_id, "rec_20240601_093000");
        assert_eq!(record.visit_date, now().date());
        assert_eq!(record.category, "control");
        assert_eq!(record.to_row().len(), 7);
    }

    #[test]
    fn test_template_requires_subject_code() {
        let err = TemplateRecord::from_form(&FormSubmission::new(), now()).unwrap_err();
        assert_eq!(err.validation_errors(), ["Subject Code is required.".to_string()]);
    }

    #[test]
    fn test_yes_no_parse() {
        assert_eq!(YesNo::parse("Yes"), YesNo::Yes);
        assert_eq!(YesNo::parse("TRUE"), YesNo::Yes);
        assert_eq!(YesNo::parse("0"), YesNo::No);
        assert_eq!(YesNo::parse(""), YesNo::Unknown);
        assert_eq!(YesNo::parse("maybe"), YesNo::Unknown);
    }

    #[test]
    fn test_form_from_json() {
        let value = serde_json::json!({
            "patient_code": "AVS_9",
            "age_years": 61,
            "complication": true,
            "notes": null
        });
        let form = form_from_json(&value).unwrap();
        assert_eq!(form.get("age_years").map(String::as_str), Some("61"));
        assert_eq!(form.get("complication").map(String::as_str), Some("true"));
        assert!(!form.contains_key("notes"));

        assert!(form_from_json(&serde_json::json!([1, 2])).is_err());
    }
}
