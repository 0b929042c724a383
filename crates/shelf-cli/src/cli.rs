use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shelf", about = "Shelf: book catalog with reviews and reader collections", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file; missing files mean defaults.
    #[arg(short, long, global = true, default_value = "shelf.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the database and the first administrator
    Init(InitArgs),
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage genres
    Genre {
        #[command(subcommand)]
        action: GenreAction,
    },
    /// Manage books
    Book {
        #[command(subcommand)]
        action: BookAction,
    },
    /// List the catalog, newest first
    Books(BooksArgs),
    /// Remove cover files no database row refers to
    Sweep(SweepArgs),
    /// Start the HTTP server
    Serve(ServeArgs),
}

/// Credentials of the account performing a change.
#[derive(Args, Debug)]
pub struct SignIn {
    /// Login to act as
    #[arg(long = "as", value_name = "LOGIN", default_value = "admin")]
    pub user: String,
    /// Password; falls back to $SHELF_PASSWORD
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct PersonArgs {
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub middle_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Administrator login
    #[arg(long, default_value = "admin")]
    pub login: String,
    /// Administrator password; falls back to $SHELF_PASSWORD
    #[arg(long)]
    pub password: Option<String>,
    #[command(flatten)]
    pub person: PersonArgs,
    /// Also write a config file with the defaults if none exists
    #[arg(long)]
    pub write_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register an account
    Add {
        login: String,
        /// Password for the new account
        #[arg(long)]
        new_password: String,
        #[arg(long, default_value = "Reader")]
        role: String,
        #[command(flatten)]
        person: PersonArgs,
        #[command(flatten)]
        sign_in: SignIn,
    },
}

#[derive(Subcommand, Debug)]
pub enum GenreAction {
    /// Add a genre
    Add {
        name: String,
        #[command(flatten)]
        sign_in: SignIn,
    },
    /// List genres
    List,
}

#[derive(Subcommand, Debug)]
pub enum BookAction {
    /// Add a book
    Add(BookAddArgs),
}

#[derive(Args, Debug)]
pub struct BookAddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: String,
    #[arg(long)]
    pub publisher: String,
    #[arg(long)]
    pub year: i32,
    #[arg(long)]
    pub pages: i32,
    /// Description; limited markup is kept
    #[arg(long)]
    pub description: String,
    /// Genre id; repeatable
    #[arg(long = "genre")]
    pub genres: Vec<i64>,
    /// Cover image (jpg, jpeg, png, gif)
    #[arg(long)]
    pub cover: Option<PathBuf>,
    #[command(flatten)]
    pub sign_in: SignIn,
}

#[derive(Args, Debug)]
pub struct BooksArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Defaults to the configured page size
    #[arg(long)]
    pub per_page: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub sign_in: SignIn,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<std::net::SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::try_parse_from([
            "shelf", "init", "--password", "pw", "--last-name", "Root", "--first-name", "Ada",
        ])
        .unwrap();
        if let Command::Init(args) = cli.command {
            assert_eq!(args.login, "admin");
            assert_eq!(args.password, Some("pw".into()));
            assert_eq!(args.person.middle_name, None);
            assert!(!args.write_config);
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.config, PathBuf::from("shelf.toml"));
    }

    #[test]
    fn parse_user_add() {
        let cli = Cli::try_parse_from([
            "shelf", "user", "add", "rita", "--new-password", "s3cret", "--last-name", "Ivanova",
            "--first-name", "Rita", "--as", "root",
        ])
        .unwrap();
        match cli.command {
            Command::User {
                action: UserAction::Add { login, role, sign_in, .. },
            } => {
                assert_eq!(login, "rita");
                assert_eq!(role, "Reader");
                assert_eq!(sign_in.user, "root");
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parse_book_add_with_genres() {
        let cli = Cli::try_parse_from([
            "shelf", "book", "add", "--title", "Dune", "--author", "Frank Herbert",
            "--publisher", "Chilton", "--year", "1965", "--pages", "412", "--description",
            "<p>Spice</p>", "--genre", "1",
            "--genre", "3", "--cover", "dune.png",
        ])
        .unwrap();
        match cli.command {
            Command::Book { action: BookAction::Add(args) } => {
                assert_eq!(args.genres, vec![1, 3]);
                assert_eq!(args.cover, Some(PathBuf::from("dune.png")));
                assert_eq!(args.description, "<p>Spice</p>");
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn parse_books_json() {
        let cli =
            Cli::try_parse_from(["shelf", "--format", "json", "books", "--page", "2"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        if let Command::Books(args) = cli.command {
            assert_eq!(args.page, 2);
            assert_eq!(args.per_page, None);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_bind() {
        let cli = Cli::try_parse_from(["shelf", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.unwrap().port(), 9000);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn unknown_command_fails() {
        assert!(Cli::try_parse_from(["shelf", "checkout"]).is_err());
    }
}
