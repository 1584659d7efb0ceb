use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tri-additives-to-sqlite")]
#[command(version, about = "Load EPA TRI plastic additive data into a SQLite database")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform the TRI files of a reporting year into the database
    Run {
        /// TRI reporting year
        year: u16,

        /// Pipeline configuration
        #[arg(short, long, default_value = "config/main.yaml")]
        config: PathBuf,

        /// SQLite database path
        #[arg(long, default_value = "tri_additives.sqlite")]
        db: PathBuf,

        /// Directory with the extracted US_<type>_<year>.txt files.
        /// Without it the files are downloaded into the cache.
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Only process these files (comma-separated, e.g. 1b,1a)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these files (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,

        /// Custom cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Download and extract the TRI files of a reporting year
    Download {
        /// TRI reporting year
        year: u16,

        /// Pipeline configuration
        #[arg(short, long, default_value = "config/main.yaml")]
        config: PathBuf,

        /// Only download these files (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip these files (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Force re-download even if cached
        #[arg(short, long)]
        force: bool,

        /// Custom cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Create the database tables
    InitDb {
        /// SQLite database path
        #[arg(long, default_value = "tri_additives.sqlite")]
        db: PathBuf,
    },

    /// Insert the configured additives and chemical activity hierarchy
    Seed {
        /// Pipeline configuration
        #[arg(short, long, default_value = "config/main.yaml")]
        config: PathBuf,

        /// SQLite database path
        #[arg(long, default_value = "tri_additives.sqlite")]
        db: PathBuf,
    },

    /// List all table names in creation order
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "tri-additives-to-sqlite",
            "run",
            "2022",
            "--db",
            "out.sqlite",
            "--include",
            "1b,1a",
        ])
        .unwrap();

        let Commands::Run {
            year, db, include, ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(year, 2022);
        assert_eq!(db, PathBuf::from("out.sqlite"));
        assert_eq!(include, Some(vec!["1b".to_string(), "1a".to_string()]));
    }
}
