use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use shelf_sdk::{
    BookFields, BookSummary, CoverUpload, GenreId, Library, NewUser, Page, Principal,
};
use shelf_server::ShelfServer;

use crate::cli::*;
use crate::config::ShelfConfig;

const PASSWORD_ENV: &str = "SHELF_PASSWORD";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ShelfConfig::load(&cli.config)?;
    match cli.command {
        Command::Init(args) => cmd_init(&cli.config, &config, args),
        Command::User {
            action:
                UserAction::Add {
                    login,
                    new_password,
                    role,
                    person,
                    sign_in,
                },
        } => cmd_user_add(&config, login, new_password, &role, person, sign_in),
        Command::Genre { action } => cmd_genre(&config, action, &cli.format),
        Command::Book {
            action: BookAction::Add(args),
        } => cmd_book_add(&config, args),
        Command::Books(args) => cmd_books(&config, args, &cli.format),
        Command::Sweep(args) => cmd_sweep(&config, args),
        Command::Serve(args) => cmd_serve(config, args),
    }
}

fn password(flag: Option<String>) -> anyhow::Result<String> {
    flag.or_else(|| std::env::var(PASSWORD_ENV).ok())
        .with_context(|| format!("no password given; pass --password or set {PASSWORD_ENV}"))
}

fn sign_in(library: &Library, args: SignIn) -> anyhow::Result<Principal> {
    let password = password(args.password)?;
    library
        .authenticate(&args.user, &password)?
        .with_context(|| format!("wrong login or password for {}", args.user))
}

fn open(config: &ShelfConfig) -> anyhow::Result<Library> {
    Library::open(config.library.clone()).with_context(|| {
        format!("opening catalog at {}", config.library.database.display())
    })
}

fn new_user(login: String, password: String, person: PersonArgs) -> NewUser {
    NewUser {
        login,
        password,
        last_name: person.last_name,
        first_name: person.first_name,
        middle_name: person.middle_name,
    }
}

fn cmd_init(config_path: &Path, config: &ShelfConfig, args: InitArgs) -> anyhow::Result<()> {
    if args.write_config && !config_path.exists() {
        std::fs::write(config_path, ShelfConfig::default().to_toml()?)
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("  Config: {}", config_path.display().to_string().bold());
    }
    let mut library = open(config)?;
    let admin = new_user(args.login, password(args.password)?, args.person);
    let id = library.bootstrap_admin(&admin)?;
    println!(
        "{} Initialized catalog in {}",
        "✓".green().bold(),
        config.library.database.display().to_string().bold()
    );
    println!("  Administrator: {} ({})", admin.login.yellow(), id);
    Ok(())
}

fn cmd_user_add(
    config: &ShelfConfig,
    login: String,
    new_password: String,
    role: &str,
    person: PersonArgs,
    sign_in_args: SignIn,
) -> anyhow::Result<()> {
    let mut library = open(config)?;
    let actor = sign_in(&library, sign_in_args)?;
    let user = new_user(login, new_password, person);
    let id = library.create_user(Some(&actor), &user, role)?;
    println!("{} Added {} {} as {}", "✓".green(), user.login.yellow(), id, role.cyan());
    Ok(())
}

fn cmd_genre(config: &ShelfConfig, action: GenreAction, format: &OutputFormat) -> anyhow::Result<()> {
    let mut library = open(config)?;
    match action {
        GenreAction::Add { name, sign_in: args } => {
            let actor = sign_in(&library, args)?;
            let id = library.create_genre(Some(&actor), &name)?;
            println!("{} Added genre {} ({})", "✓".green(), name.yellow(), id);
        }
        GenreAction::List => {
            let genres = library.list_genres()?;
            if *format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&genres)?);
            } else if genres.is_empty() {
                println!("No genres.");
            } else {
                for genre in genres {
                    println!("{:>4}  {}", genre.id.get().to_string().dimmed(), genre.name);
                }
            }
        }
    }
    Ok(())
}

fn cover_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn read_cover(path: &Path) -> anyhow::Result<CoverUpload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(CoverUpload::new(bytes, filename, cover_mime(path)))
}

fn cmd_book_add(config: &ShelfConfig, args: BookAddArgs) -> anyhow::Result<()> {
    let mut library = open(config)?;
    let actor = sign_in(&library, args.sign_in)?;
    let cover = args.cover.as_deref().map(read_cover).transpose()?;
    let fields = BookFields {
        title: args.title,
        description: args.description,
        year: args.year,
        publisher: args.publisher,
        author: args.author,
        pages: args.pages,
    };
    let genres: Vec<GenreId> = args.genres.into_iter().map(GenreId::new).collect();
    let id = library.create_book(Some(&actor), &fields, &genres, cover)?;
    println!("{} Added {} ({})", "✓".green(), fields.title.yellow(), id);
    Ok(())
}

fn print_books(page: &Page<BookSummary>) {
    if page.items.is_empty() {
        println!("No books on page {}.", page.page);
        return;
    }
    for summary in &page.items {
        let book = &summary.book;
        let rating = match summary.average_rating {
            Some(avg) => format!("★ {avg:.1} ({} reviews)", summary.review_count),
            None => "no reviews".to_string(),
        };
        let genres: Vec<&str> = summary.genres.iter().map(|g| g.name.as_str()).collect();
        println!(
            "{:>4}  {} ({}) by {}  {}",
            book.id.get().to_string().dimmed(),
            book.title.bold(),
            book.year,
            book.author,
            rating.cyan()
        );
        if !genres.is_empty() {
            println!("      {}", genres.join(", ").dimmed());
        }
    }
    println!(
        "Page {} of {} ({} books)",
        page.page,
        page.page_count().max(1),
        page.total
    );
}

fn cmd_books(config: &ShelfConfig, args: BooksArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let library = open(config)?;
    let per_page = args.per_page.unwrap_or(config.library.books_per_page);
    let page = library.list_books(args.page, per_page)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => print_books(&page),
    }
    Ok(())
}

fn cmd_sweep(config: &ShelfConfig, args: SweepArgs) -> anyhow::Result<()> {
    let mut library = open(config)?;
    let actor = sign_in(&library, args.sign_in)?;
    let removed = library.sweep_orphan_covers(Some(&actor))?;
    for name in &removed {
        println!("  {} {}", "removed:".red(), name.as_str());
    }
    println!("{} Sweep: {} orphaned covers removed.", "✓".green(), removed.len());
    Ok(())
}

fn cmd_serve(config: ShelfConfig, args: ServeArgs) -> anyhow::Result<()> {
    let mut server_config = config.server.clone();
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind;
    }
    let library = open(&config)?;
    println!("Shelf server on {}", server_config.bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(ShelfServer::new(server_config, library).serve())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_sdk::LibraryConfig;

    fn config_in(dir: &Path) -> ShelfConfig {
        ShelfConfig {
            library: LibraryConfig::default().rooted_at(dir),
            ..ShelfConfig::default()
        }
    }

    fn person() -> PersonArgs {
        PersonArgs {
            last_name: "Root".into(),
            first_name: "Ada".into(),
            middle_name: None,
        }
    }

    fn as_admin() -> SignIn {
        SignIn {
            user: "admin".into(),
            password: Some("pw".into()),
        }
    }

    fn init(dir: &Path) -> ShelfConfig {
        let config = config_in(dir);
        cmd_init(
            &dir.join("shelf.toml"),
            &config,
            InitArgs {
                login: "admin".into(),
                password: Some("pw".into()),
                person: person(),
                write_config: true,
            },
        )
        .unwrap();
        config
    }

    #[test]
    fn cover_mime_by_extension() {
        assert_eq!(cover_mime(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(cover_mime(Path::new("a.png")), "image/png");
        assert_eq!(cover_mime(Path::new("a.gif")), "image/gif");
        assert_eq!(cover_mime(Path::new("a.bmp")), "application/octet-stream");
    }

    #[test]
    fn explicit_password_wins() {
        assert_eq!(password(Some("flag".into())).unwrap(), "flag");
    }

    #[test]
    fn init_bootstraps_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = init(dir.path());
        assert!(dir.path().join("shelf.toml").exists());
        assert!(config.library.database.exists());

        let again = cmd_init(
            &dir.path().join("shelf.toml"),
            &config,
            InitArgs {
                login: "second".into(),
                password: Some("pw".into()),
                person: person(),
                write_config: false,
            },
        );
        assert!(again.is_err());
    }

    #[test]
    fn catalog_commands_against_one_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = init(dir.path());

        cmd_genre(
            &config,
            GenreAction::Add {
                name: "Science Fiction".into(),
                sign_in: as_admin(),
            },
            &OutputFormat::Text,
        )
        .unwrap();
        let cover = dir.path().join("dune.png");
        std::fs::write(&cover, b"\x89PNG fake image").unwrap();
        cmd_book_add(
            &config,
            BookAddArgs {
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                publisher: "Chilton".into(),
                year: 1965,
                pages: 412,
                description: "<p>Spice</p>".into(),
                genres: vec![1],
                cover: Some(cover),
                sign_in: as_admin(),
            },
        )
        .unwrap();
        cmd_books(&config, BooksArgs { page: 1, per_page: None }, &OutputFormat::Json).unwrap();

        let library = open(&config).unwrap();
        let page = library.list_books(1, 10).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].genres[0].name, "Science Fiction");
        let detail = library.get_book(None, page.items[0].book.id).unwrap();
        assert_eq!(detail.covers.len(), 1);
        assert_eq!(detail.covers[0].mime_type, "image/png");
        drop(library);

        cmd_sweep(&config, SweepArgs { sign_in: as_admin() }).unwrap();
        assert!(config.library.covers_dir.join(&detail.covers[0].filename).exists());
    }

    #[test]
    fn wrong_password_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = init(dir.path());
        let err = cmd_user_add(
            &config,
            "rita".into(),
            "rita-pw".into(),
            "Reader",
            person(),
            SignIn {
                user: "admin".into(),
                password: Some("wrong".into()),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("wrong login or password"));
    }

    #[test]
    fn admin_adds_reader() {
        let dir = tempfile::tempdir().unwrap();
        let config = init(dir.path());
        cmd_user_add(&config, "rita".into(), "rita-pw".into(), "Reader", person(), as_admin())
            .unwrap();
        let library = open(&config).unwrap();
        let rita = library.authenticate("rita", "rita-pw").unwrap().unwrap();
        assert_eq!(rita.role, "Reader");
    }
}
