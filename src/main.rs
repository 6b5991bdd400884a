//! exprkey - canonical cache keys for predicate expressions

mod samples;

use anyhow::{anyhow, Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use exprkey::expression::Lambda;
use exprkey::transform::{self, PurityPolicy};
use exprkey::{Canonicalizer, CanonicalizerConfig};
use samples::Sample;

/// Render sample predicates to canonical cache keys
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Treat a method as side-effect free (repeatable)
    #[arg(long = "allow-pure", value_name = "METHOD")]
    allow_pure: Vec<String>,

    /// Start from an empty allow-list instead of the builtin methods
    #[arg(long)]
    no_default_pure: bool,

    /// Keep local collection membership tests as calls
    #[arg(long)]
    no_expand: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the bundled sample predicates
    List,

    /// Print the raw rendering and canonical key of samples (all if none given)
    Show { names: Vec<String> },

    /// Compose two samples and print the canonical key of the result
    Compose {
        first: String,
        second: String,

        #[arg(long, value_enum, default_value_t = Combinator::AndAlso)]
        op: Combinator,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Combinator {
    And,
    AndAlso,
    Or,
    OrElse,
}

impl Args {
    fn config(&self) -> CanonicalizerConfig {
        let base = if self.no_default_pure {
            PurityPolicy::empty()
        } else {
            PurityPolicy::default()
        };
        let purity = self
            .allow_pure
            .iter()
            .fold(base, |policy, name| policy.allow(name.clone()));
        CanonicalizerConfig::default()
            .with_purity(purity)
            .expand_local_collections(!self.no_expand)
    }
}

fn find<'a>(samples: &'a [Sample], name: &str) -> Result<&'a Sample> {
    samples
        .iter()
        .find(|sample| sample.name == name)
        .ok_or_else(|| anyhow!("Unknown sample '{}' (see `exprkey list`)", name))
}

fn show(canonicalizer: &Canonicalizer, name: &str, lambda: &Lambda) -> Result<()> {
    let key = canonicalizer
        .canonicalize(lambda)
        .with_context(|| format!("Failed to canonicalize sample '{}'", name))?;
    println!("{}", name);
    println!("  raw: {}", lambda);
    println!("  key: {}", key);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = args.config();
    log::debug!(
        "Pure methods: {:?}",
        config.purity.pure_methods().collect::<Vec<_>>()
    );
    let canonicalizer = Canonicalizer::new(config);
    let samples = samples::all();

    match &args.command {
        Command::List => {
            for sample in &samples {
                println!("{:<14} {}", sample.name, sample.description);
            }
        }

        Command::Show { names } => {
            if names.is_empty() {
                for sample in &samples {
                    show(&canonicalizer, sample.name, &sample.lambda)?;
                }
            } else {
                for name in names {
                    let sample = find(&samples, name)?;
                    show(&canonicalizer, sample.name, &sample.lambda)?;
                }
            }
        }

        Command::Compose { first, second, op } => {
            let a = &find(&samples, first)?.lambda;
            let b = &find(&samples, second)?.lambda;
            let composed = match op {
                Combinator::And => transform::and(a, b),
                Combinator::AndAlso => transform::and_also(a, b),
                Combinator::Or => transform::or(a, b),
                Combinator::OrElse => transform::or_else(a, b),
            }
            .with_context(|| format!("Failed to compose '{}' with '{}'", first, second))?;
            show(&canonicalizer, &format!("{} {:?} {}", first, op, second), &composed)?;
        }
    }

    Ok(())
}
