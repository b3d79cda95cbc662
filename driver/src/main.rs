use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use generator::scan::{write_day, DayPlan};
use qvpcore::processing::RunProvenance;
use qvpcore::registry::{FieldRegistry, MomentCatalog};
use qvpcore::render::QuicklookRenderer;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Quasi vertical profile workflow driver")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Accumulate scan files into a daily QVP dataset and draw configured quicklooks
    Run {
        /// Load a workflow config from YAML
        #[arg(long)]
        workflow: Option<PathBuf>,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        elevation: Option<f64>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        image_dir: Option<PathBuf>,
        /// Scan files, processed in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Write a day of synthetic scan descriptors
    Synthesize {
        /// Day to generate, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value_t = 24)]
        scans: usize,
        #[arg(long, default_value_t = 60)]
        interval_minutes: i64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Leave radar_echo_classification out of the generated files
        #[arg(long, default_value_t = false)]
        no_classification: bool,
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Draw a one- or four-panel quicklook from a stored dataset
    Quicklook {
        /// Workflow config supplying the site, its sites_file and the image directory
        #[arg(long)]
        workflow: Option<PathBuf>,
        #[arg(long)]
        dataset: PathBuf,
        #[arg(long)]
        site: Option<String>,
        /// One moment, or four comma-separated moments top to bottom
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
        #[arg(long)]
        image_dir: Option<PathBuf>,
    },
    /// Print the site registry as JSON
    Sites,
    /// Print the field parameter registry and moment catalogue as JSON
    Fields,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Run {
            workflow,
            site,
            elevation,
            data_dir,
            image_dir,
            files,
        } => {
            let mut config = WorkflowConfig::load_or_default(workflow.as_deref())?;
            if let Some(site) = site {
                config.site = site;
            }
            if let Some(elevation) = elevation {
                config.elevation_deg = elevation;
            }
            config.data_dir = data_dir.or(config.data_dir);
            config.image_dir = image_dir.or(config.image_dir);

            let runner = Runner::new(config)?;
            let result = runner.execute(&files, &RunProvenance::capture())?;
            println!(
                "Run -> {} profiles ({} skipped), dataset {}, images {}",
                result.processed,
                result.skipped,
                result.dataset.display(),
                result.images.len()
            );
        }
        Command::Synthesize {
            date,
            scans,
            interval_minutes,
            seed,
            no_classification,
            out_dir,
        } => {
            let plan = DayPlan {
                scans,
                interval_minutes,
                seed,
                classification: !no_classification,
                ..Default::default()
            };
            let paths = write_day(&out_dir, date, &plan)?;
            println!("Wrote {} scan descriptors to {}", paths.len(), out_dir.display());
        }
        Command::Quicklook {
            workflow,
            dataset,
            site,
            fields,
            image_dir,
        } => {
            let config = WorkflowConfig::load_or_default(workflow.as_deref())?;
            let site = site.unwrap_or(config.site.clone());
            let sites = config.site_registry()?;
            let registry = FieldRegistry::builtin();
            let renderer = QuicklookRenderer::new(&sites, &registry);
            let image_dir =
                qvpcore::store::resolve_directory(image_dir.or(config.image_dir).as_deref())?;
            let image = match fields.as_slice() {
                [field] => renderer.render_one_panel(&dataset, field, &site, &image_dir)?,
                [a, b, c, d] => renderer.render_four_panel(
                    &dataset,
                    [a.as_str(), b.as_str(), c.as_str(), d.as_str()],
                    &site,
                    &image_dir,
                )?,
                other => bail!("expected one or four fields, got {}", other.len()),
            };
            println!("Quicklook -> {}", image.display());
        }
        Command::Sites => {
            let sites = WorkflowConfig::default().site_registry()?;
            let body = serde_json::to_string_pretty(&sites).context("encoding sites")?;
            println!("{}", body);
        }
        Command::Fields => {
            let listing = serde_json::json!({
                "fields": FieldRegistry::builtin(),
                "moments": MomentCatalog::builtin(),
            });
            let body = serde_json::to_string_pretty(&listing).context("encoding fields")?;
            println!("{}", body);
        }
    }

    Ok(())
}
