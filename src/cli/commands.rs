//! Subcommand handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use console::style;

use crate::cli::args::{Cli, Commands, RegistryArgs};
use crate::cli::prompts::{confirm_step, prompt_form};
use crate::config::AppConfig;
use crate::error::RegistryError;
use crate::pipeline::groups::{
    group_by_month, group_by_year, interpretation_distribution, management_distribution,
};
use crate::pipeline::summary::summarize;
use crate::pipeline::typed::{type_frame, TypedView};
use crate::registry::{
    default_export_path, export_registry, form_from_json, initialize_registry, load_registry,
    submit_form, FormSubmission, RegistryConfig,
};
use crate::report::{
    bundle_report_run, display_distribution, display_paths, display_review, display_runs,
    display_summary, generate_descriptive_report, recent_report_runs, run_artifact_paths,
};
use crate::utils::{
    file_spinner, finish_with_records, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_errors, print_info, print_step_header, print_success,
};

/// Dispatch a parsed command line
pub fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::resolve(cli.config.as_deref())?;

    match &cli.command {
        Commands::Init { registry, yes } => run_init(&config, registry, *yes),
        Commands::Add {
            registry,
            fields,
            json,
            interactive,
        } => run_add(&config, registry, fields, json.as_deref(), *interactive),
        Commands::Review { registry, limit } => run_review(&config, registry, *limit),
        Commands::Export { registry, output } => run_export(&config, registry, output.as_deref()),
        Commands::Dashboard {
            registry,
            start,
            end,
        } => run_dashboard(&config, registry, *start, *end),
        Commands::Report {
            input,
            output,
            variant,
        } => run_report(&config, input.as_deref(), output.as_deref(), *variant),
        Commands::History {
            output,
            run,
            limit,
            bundle,
        } => run_history(&config, output.as_deref(), run.as_deref(), *limit, bundle.as_deref()),
    }
}

fn registry_config(config: &AppConfig, args: &RegistryArgs) -> RegistryConfig {
    config.registry_config(args.data.as_deref(), args.variant)
}

fn load_view(registry: &RegistryConfig) -> Result<TypedView> {
    let spinner = file_spinner("Loading", &registry.data_path);
    let df = load_registry(registry)
        .with_context(|| format!("Failed to load registry: {}", registry.data_path.display()))?;
    let view = type_frame(&df, registry.variant)?;
    finish_with_records(&spinner, "Loaded", view.height());
    Ok(view)
}

fn run_init(config: &AppConfig, args: &RegistryArgs, yes: bool) -> Result<()> {
    let registry = registry_config(config, args);
    let path = &registry.data_path;

    if path.exists()
        && !yes
        && !confirm_step(&format!(
            "{} already exists. Replace it with an empty registry?",
            path.display()
        ))?
    {
        println!("Cancelled by user.");
        return Ok(());
    }

    initialize_registry(path, registry.variant)?;
    print_success(&format!(
        "Initialized empty {} registry at {}",
        registry.variant,
        path.display()
    ));
    Ok(())
}

fn run_add(
    config: &AppConfig,
    args: &RegistryArgs,
    fields: &[(String, String)],
    json: Option<&Path>,
    interactive: bool,
) -> Result<()> {
    let registry = registry_config(config, args);
    let now = Local::now().naive_local();

    let mut form = FormSubmission::new();
    if interactive {
        form = prompt_form(registry.variant, now.date())?;
    }
    if let Some(json_path) = json {
        let content = std::fs::read_to_string(json_path)
            .with_context(|| format!("Failed to read form JSON: {}", json_path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse form JSON: {}", json_path.display()))?;
        form.extend(form_from_json(&value).map_err(anyhow::Error::msg)?);
    }
    for (key, value) in fields {
        form.insert(key.clone(), value.clone());
    }

    if form.is_empty() {
        bail!("No fields given. Use --field key=value, --json FILE or --interactive.");
    }

    match submit_form(&registry, &form, now) {
        Ok(record_id) => {
            print_success(&format!("Saved record {}", record_id));
            print_info(&format!("Registry: {}", registry.data_path.display()));
            Ok(())
        }
        Err(RegistryError::Validation(errors)) => {
            print_errors("Record was not saved", &errors);
            bail!("{} validation error(s); nothing was saved", errors.len())
        }
        Err(e) => Err(e.into()),
    }
}

fn run_review(config: &AppConfig, args: &RegistryArgs, limit: usize) -> Result<()> {
    let registry = registry_config(config, args);
    let view = load_view(&registry)?;
    display_review(&view, limit);
    Ok(())
}

fn run_export(config: &AppConfig, args: &RegistryArgs, output: Option<&Path>) -> Result<()> {
    let registry = registry_config(config, args);
    let output_path: PathBuf = output.map(Path::to_path_buf).unwrap_or_else(|| {
        default_export_path(
            &registry.data_path,
            registry.variant,
            Local::now().naive_local(),
        )
    });

    let spinner = file_spinner("Exporting", &registry.data_path);
    let mut df = load_registry(&registry)?;
    export_registry(&mut df, &output_path)?;
    finish_with_records(&spinner, "Exported", df.height());
    print_info(&format!("Output: {}", output_path.display()));
    Ok(())
}

fn run_dashboard(
    config: &AppConfig,
    args: &RegistryArgs,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            bail!("--start ({}) is after --end ({})", s, e);
        }
    }

    let registry = registry_config(config, args);
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&registry.data_path, &registry.variant.to_string(), None);

    let view = load_view(&registry)?;
    if let Some((first, last)) = view.date_bounds() {
        print_info(&format!("Dates on file: {} to {}", first, last));
    }

    let filtered = view.filter_date_range(start, end);
    if start.is_some() || end.is_some() {
        print_info(&format!(
            "{} of {} records within the selected range",
            filtered.height(),
            view.height()
        ));
    }

    display_summary(&summarize(&filtered));
    display_distribution("CASES BY YEAR", group_by_year(&filtered).as_ref());
    display_distribution("CASES BY MONTH", group_by_month(&filtered).as_ref());
    display_distribution(
        "INTERPRETATION DISTRIBUTION",
        interpretation_distribution(&filtered).as_ref(),
    );
    display_distribution(
        "MANAGEMENT DISTRIBUTION",
        management_distribution(&filtered).as_ref(),
    );
    println!();
    Ok(())
}

fn run_report(
    config: &AppConfig,
    input: Option<&Path>,
    output: Option<&Path>,
    variant: Option<crate::registry::SchemaVariant>,
) -> Result<()> {
    let report = config.report_config(input, output, variant);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &report.input_csv,
        &report.variant.to_string(),
        Some(&report.output_root),
    );

    print_step_header(1, "Generate Descriptive Report");
    let spinner = file_spinner("Summarizing", &report.input_csv);
    let artifacts = match generate_descriptive_report(&report) {
        Ok(artifacts) => artifacts,
        Err(e) => {
            finish_with_warning(&spinner, "Report generation failed");
            return Err(e.into());
        }
    };
    finish_with_success(&spinner, "Report written");

    display_paths("GENERATED FILES", &artifacts.files());
    print_completion("Descriptive report complete!");
    Ok(())
}

fn run_history(
    config: &AppConfig,
    output: Option<&Path>,
    run: Option<&str>,
    limit: usize,
    bundle: Option<&Path>,
) -> Result<()> {
    let root = config.report_root(output);

    let run_dir = match run {
        Some(name) => {
            let dir = root.join(name);
            if !dir.is_dir() {
                bail!("Report run not found: {}", dir.display());
            }
            Some(dir)
        }
        None => {
            let runs = recent_report_runs(&root, &config.report_prefix, limit)?;
            if bundle.is_none() {
                display_runs(&runs);
                return Ok(());
            }
            runs.into_iter().next().map(|r| r.path)
        }
    };

    let Some(run_dir) = run_dir else {
        bail!("No report runs found under {}", root.display());
    };

    let artifacts = run_artifact_paths(&run_dir, &config.report_name)?;
    let paths: Vec<&Path> = artifacts.iter().map(PathBuf::as_path).collect();
    let title = run_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "ARTIFACTS".to_string());
    display_paths(&title, &paths);

    if let Some(zip_path) = bundle {
        let added = bundle_report_run(&run_dir, &config.report_name, zip_path)?;
        println!();
        print_success(&format!(
            "Bundled {} file(s) into {}",
            added,
            style(zip_path.display()).cyan()
        ));
    }
    Ok(())
}
