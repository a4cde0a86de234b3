// twin/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "twin")]
#[command(about = "Turns a Keboola project export into a navigable twin directory", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LineageFormat {
    Mermaid,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🏗️ Generates the twin directory (scan + lineage + API data)
    Generate {
        /// Project directory (the export root, containing the branch directory)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Output directory relative to the project (overrides twin.yaml)
        #[arg(long)]
        output_dir: Option<String>,

        /// Skip the Storage API (no metadata, jobs or samples)
        #[arg(long)]
        offline: bool,
    },

    /// 🔗 Prints the lineage graph of the local export
    Lineage {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = LineageFormat::Mermaid)]
        format: LineageFormat,
    },

    /// 🧹 Removes the generated twin directory
    Clean {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_generate_defaults() -> Result<()> {
        let args = Cli::parse_from(["twin", "generate"]);
        match args.command {
            Commands::Generate {
                project_dir,
                output_dir,
                offline,
            } => {
                assert_eq!(project_dir.to_string_lossy(), ".");
                assert_eq!(output_dir, None);
                assert!(!offline);
                Ok(())
            }
            _ => bail!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parse_generate_offline() -> Result<()> {
        let args = Cli::parse_from([
            "twin",
            "generate",
            "--offline",
            "--project-dir",
            "/tmp/export",
            "--output-dir",
            "out",
        ]);
        match args.command {
            Commands::Generate {
                project_dir,
                output_dir,
                offline,
            } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp/export");
                assert_eq!(output_dir.as_deref(), Some("out"));
                assert!(offline);
                Ok(())
            }
            _ => bail!("Expected Generate command"),
        }
    }

    #[test]
    fn test_cli_parse_lineage_format() -> Result<()> {
        let args = Cli::parse_from(["twin", "lineage", "--format", "json"]);
        match args.command {
            Commands::Lineage { format, .. } => {
                assert_eq!(format, LineageFormat::Json);
                Ok(())
            }
            _ => bail!("Expected Lineage command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["twin", "lineage", "--format", "dot"]).is_err());
    }

    #[test]
    fn test_cli_parse_clean() -> Result<()> {
        let args = Cli::parse_from(["twin", "clean", "--project-dir", "/tmp"]);
        match args.command {
            Commands::Clean { project_dir } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp");
                Ok(())
            }
            _ => bail!("Expected Clean command"),
        }
    }
}
