use anyhow::{bail, Context};
use chrono::Utc;
use clap::{ArgGroup, Parser, Subcommand};
use kindling_core::constants::DEFAULT_LOG_FILTER;
use kindling_core::validator::{validate_file, validate_value};
use kindling_core::{Generator, GeneratorConfig, PersonaLoader, ResourceFilter, TransportMode};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Parser)]
#[command(name = "kindling")]
#[command(about = "Synthetic FHIR clinical record generator")]
struct Cli {
    /// Directory of extra persona files (overrides built-ins with the same name)
    #[arg(long, global = true, env = "KINDLING_PERSONA_DIR")]
    persona_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bundles from a profile or a persona
    #[command(group(ArgGroup::new("source").required(true).args(["profile", "persona"])))]
    Generate {
        /// Profile file (.yaml, .yml or .json)
        #[arg(long)]
        profile: Option<PathBuf>,
        /// Built-in or persona-dir persona name
        #[arg(long)]
        persona: Option<String>,
        /// Number of subjects in cohort mode
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// transaction or collection (defaults to the profile's output mode)
        #[arg(long)]
        bundle_type: Option<String>,
        /// Maximum entries per bundle (defaults to the profile's bundle size)
        #[arg(long)]
        bundle_size: Option<usize>,
        /// Seed for reproducible output
        #[arg(long, env = "KINDLING_SEED")]
        seed: Option<u64>,
        /// Output file or directory (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Validate every bundle before writing it
        #[arg(long)]
        validate: bool,
        /// Comma-separated resource types to keep, e.g. Patient,Condition
        #[arg(long)]
        resources: Option<String>,
        /// POST, PUT or CONDITIONAL
        #[arg(long, default_value = "POST")]
        request_method: String,
    },
    /// List available personas
    ListPersonas,
    /// Validate a bundle JSON file
    Validate {
        /// Bundle file to check
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER))?,
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Generate {
            profile,
            persona,
            count,
            bundle_type,
            bundle_size,
            seed,
            output: destination,
            validate,
            resources,
            request_method,
        }) => {
            let config = GeneratorConfig::new(Utc::now(), seed, cli.persona_dir);
            let mut generator =
                Generator::from_selection(profile.as_deref(), persona.as_deref(), config)?;
            if let Some(resources) = resources {
                let filter: ResourceFilter = resources.parse()?;
                generator = generator.with_resource_filter(filter);
            }

            let mut options = generator.options_with_bundle_type(bundle_type.as_deref())?;
            options.count = count;
            options.transport_mode = request_method.parse::<TransportMode>()?;
            if let Some(bundle_size) = bundle_size {
                options.max_size = bundle_size;
            }

            let bundles = generator.generate(&options)?.into_bundles();
            let entries: usize = bundles.iter().map(|bundle| bundle.len()).sum();
            let rendered = output::render(&bundles)?;

            if validate {
                let mut failed = 0;
                for (index, bundle) in rendered.iter().enumerate() {
                    let report = validate_value(bundle);
                    eprintln!("Bundle {index}: {report}");
                    if !report.is_valid() {
                        failed += 1;
                    }
                }
                if failed > 0 {
                    bail!("{failed} of {} bundles failed validation", rendered.len());
                }
            }

            match &destination {
                Some(path) => {
                    let written = output::write(&rendered, path)?;
                    eprintln!(
                        "Generated {} bundle(s) with {entries} resources: {}",
                        rendered.len(),
                        written.display()
                    );
                }
                None => println!("{}", output::to_pretty_json(&rendered)?),
            }
        }
        Some(Commands::ListPersonas) => {
            let mut loader = PersonaLoader::new(cli.persona_dir);
            for name in loader.list()? {
                let description = loader
                    .load(&name)
                    .with_context(|| format!("loading persona '{name}'"))?
                    .description
                    .clone()
                    .unwrap_or_default();
                if description.is_empty() {
                    println!("{name}");
                } else {
                    println!("{name} - {description}");
                }
            }
        }
        Some(Commands::Validate { file }) => {
            let report = validate_file(&file)?;
            println!("{report}");
            if !report.is_valid() {
                bail!("{} is not a valid bundle", file.display());
            }
        }
        None => {
            println!("Use 'kindling --help' for commands");
        }
    }

    Ok(())
}
