//! CLI module for coursekit-migrate.
//!
//! Subcommands:
//! - `migrate`: Run the data migrations (default when no subcommand is given)
//! - `preview`: Show the merged progress for one user and course
//! - `list`: List registered migrations
//! - `init`: Create the document table in PostgreSQL

mod init;
mod list;
mod migrate;
mod preview;

use clap::{Parser, Subcommand};

/// coursekit-migrate - Course progress data migrations
#[derive(Parser)]
#[command(name = "coursekit-migrate")]
#[command(about = "Migrate legacy course progress into the flattened progress schema")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run pending data migrations
    Migrate {
        /// Compute merged records without writing them
        #[arg(long)]
        dry_run: bool,

        /// Run a single migration by id
        #[arg(long)]
        only: Option<String>,
    },

    /// Print the merged progress record for one user and course without writing it
    Preview {
        /// User id
        #[arg(long)]
        user: String,

        /// Course id
        #[arg(long)]
        course: String,
    },

    /// List registered migrations
    List,

    /// Create the document table and indexes
    Init,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            None => self.run_migrate(false, None).await,
            Some(Command::Migrate { dry_run, ref only }) => {
                self.run_migrate(dry_run, only.clone()).await
            }
            Some(Command::Preview {
                ref user,
                ref course,
            }) => self.run_preview(user, course).await,
            Some(Command::List) => self.run_list(),
            Some(Command::Init) => self.run_init().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_defaults_to_migrate() {
        let app = App::try_parse_from(["coursekit-migrate"]).unwrap();
        assert!(app.command.is_none());
        assert!(!app.verbose);
    }

    #[test]
    fn test_migrate_flags() {
        let app = App::try_parse_from([
            "coursekit-migrate",
            "migrate",
            "--dry-run",
            "--only",
            "m001_user_course_progress",
            "-v",
        ])
        .unwrap();

        assert!(app.verbose);
        match app.command {
            Some(Command::Migrate { dry_run, only }) => {
                assert!(dry_run);
                assert_eq!(only.as_deref(), Some("m001_user_course_progress"));
            }
            _ => panic!("expected migrate command"),
        }
    }

    #[test]
    fn test_preview_requires_user_and_course() {
        assert!(App::try_parse_from(["coursekit-migrate", "preview", "--user", "u1"]).is_err());
        assert!(
            App::try_parse_from(["coursekit-migrate", "preview", "--user", "u1", "--course", "c1"])
                .is_ok()
        );
    }
}
