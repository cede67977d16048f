use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use microanalytic_score::{
    CreateModuleRequest, MicroAnalyticScoreClient, ModuleRef, SourceLanguage,
};

use crate::print_json;

#[derive(Subcommand)]
pub enum ModulesCommand {
    /// List modules
    List {
        /// Server-side filter expression, e.g. `eq(name, "scoring")`
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show one module by id or name
    Get { module: String },
    /// Compile and publish a module from a source file
    Create {
        #[arg(long)]
        source_file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// `python` or `ds2`
        #[arg(long, default_value = "python")]
        language: SourceLanguage,
        /// Explicit source media type
        #[arg(long = "type")]
        media_type: Option<String>,
        #[arg(long)]
        scope: Option<String>,
    },
    /// Delete a module; a missing module is skipped
    Delete { module: String },
}

impl ModulesCommand {
    pub async fn run(self, client: &dyn MicroAnalyticScoreClient) -> Result<()> {
        match self {
            Self::List { filter } => {
                let modules = client.list_modules(filter.as_deref()).await?;
                let raw: Vec<_> = modules.iter().map(|m| m.raw()).collect();
                print_json(&raw)
            }
            Self::Get { module } => {
                let Some(found) = client.get_module(&ModuleRef::from(module.as_str())).await?
                else {
                    bail!("module not found: {module}");
                };
                print_json(found.raw())
            }
            Self::Create {
                source_file,
                name,
                description,
                language,
                media_type,
                scope,
            } => {
                let source = std::fs::read_to_string(&source_file)
                    .with_context(|| format!("read {}", source_file.display()))?;
                let mut request = CreateModuleRequest::new(source).with_language(language);
                request.name = name;
                request.description = description;
                request.source_type = media_type;
                request.scope = scope;

                let created = client.create_module(&request).await?;
                print_json(&created)
            }
            Self::Delete { module } => {
                client.delete_module(&ModuleRef::from(module)).await?;
                Ok(())
            }
        }
    }
}
