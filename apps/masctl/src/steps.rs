use anyhow::{Result, bail};
use clap::Subcommand;
use microanalytic_score::{MicroAnalyticScoreClient, ModuleRef, StepArgs};
use serde_json::Value;

use crate::print_json;

#[derive(Subcommand)]
pub enum StepsCommand {
    /// Print the call signature of every step of a module
    List { module: String },
    /// Call a step; arguments are `name=value` or positional values
    Call {
        module: String,
        step: String,
        /// Values are read as JSON when they parse, else as strings
        args: Vec<String>,
        /// Print all outputs by name instead of the declared shape
        #[arg(long)]
        raw: bool,
    },
}

impl StepsCommand {
    pub async fn run(self, client: &dyn MicroAnalyticScoreClient) -> Result<()> {
        match self {
            Self::List { module } => {
                let steps = client.define_steps(&ModuleRef::from(module)).await?;
                for step in &steps {
                    println!("{step}");
                }
                Ok(())
            }
            Self::Call {
                module,
                step,
                args,
                raw,
            } => {
                let steps = client.define_steps(&ModuleRef::from(module)).await?;
                let Some(bound) = steps.get(&step) else {
                    bail!(
                        "step '{step}' not found; available: {}",
                        steps.ids().collect::<Vec<_>>().join(", ")
                    );
                };
                let args = parse_args(&args);
                if raw {
                    print_json(&bound.call_raw(args).await?)
                } else {
                    print_json(&bound.call(args).await?)
                }
            }
        }
    }
}

fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::from(text))
}

/// `name=value` pairs bind by name, anything else by position.
fn parse_args(args: &[String]) -> StepArgs {
    args.iter().fold(StepArgs::new(), |acc, arg| {
        match arg.split_once('=') {
            Some((name, value)) if is_identifier(name) => acc.named(name, parse_value(value)),
            _ => acc.arg(parse_value(arg)),
        }
    })
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
