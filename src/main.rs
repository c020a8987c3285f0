use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use colored::Colorize;
use is_terminal::IsTerminal;
use minigit::areas::repository::Repository;
use minigit::artifacts::objects::codec;
use minigit::artifacts::objects::commit::Commit;
use minigit::artifacts::objects::object_id::ObjectId;
use minigit::artifacts::objects::object_type::ObjectType;
use minigit::artifacts::refs::ref_name::SymRefName;
use minigit::commands::porcelain::add::AddMode;
use minigit::config::Config;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "minigit",
    version,
    about = "A small content-addressed version control tool",
    long_about = "A minimal git: objects, index, refs, revisions and history. \
    The on-disk layout is compatible with git for the parts it implements.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "init", about = "Create an empty repository or reinitialise an existing one")]
    Init {
        #[arg(index = 1, help = "Directory to initialise, the current one by default")]
        path: Option<PathBuf>,
    },
    #[command(name = "hash-object", about = "Compute the blob id of a file")]
    HashObject {
        #[arg(short, long, help = "Also write the blob to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Show the type, size or content of an object",
        group(ArgGroup::new("mode").required(true))
    )]
    CatFile {
        #[arg(short = 't', group = "mode", help = "Show the object type")]
        show_type: bool,
        #[arg(short = 's', group = "mode", help = "Show the object size")]
        show_size: bool,
        #[arg(short = 'p', group = "mode", help = "Pretty-print the object content")]
        pretty: bool,
        #[arg(index = 1, help = "Any revision expression")]
        object: String,
    },
    #[command(name = "add", about = "Stage working tree files")]
    Add {
        #[arg(short = 'u', long = "update", conflicts_with = "all", help = "Only stage tracked files")]
        update: bool,
        #[arg(short = 'A', long = "all", help = "Stage every change, the whole tree without paths")]
        all: bool,
        paths: Vec<PathBuf>,
    },
    #[command(name = "rm", about = "Remove paths from the index")]
    Rm {
        #[arg(long, required = true, help = "Only unstage, keep working tree files")]
        cached: bool,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    #[command(name = "write-tree", about = "Write the index as a tree object")]
    WriteTree,
    #[command(name = "commit-tree", about = "Create a commit object from a tree")]
    CommitTree {
        #[arg(index = 1)]
        tree: String,
        #[arg(short = 'p', help = "Parent commit, may be repeated")]
        parents: Vec<String>,
        #[arg(short, long)]
        message: String,
    },
    #[command(name = "commit", about = "Record the index as a new commit")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
        #[arg(long, help = "Allow a commit with the same tree as its parent")]
        allow_empty: bool,
    },
    #[command(name = "update-ref", about = "Point a ref at an object, or delete it")]
    UpdateRef {
        #[arg(short = 'd', help = "Delete the ref")]
        delete: bool,
        #[arg(index = 1, help = "HEAD or a full refs/... path")]
        name: String,
        #[arg(index = 2, required_unless_present = "delete")]
        value: Option<String>,
    },
    #[command(name = "symbolic-ref", about = "Read or set what HEAD points to")]
    SymbolicRef {
        #[arg(index = 1, value_parser = ["HEAD"])]
        name: String,
        #[arg(index = 2)]
        target: Option<String>,
    },
    #[command(name = "branch", about = "List, create or delete branches")]
    Branch {
        #[arg(short = 'd', long = "delete", requires = "name")]
        delete: bool,
        #[arg(index = 1)]
        name: Option<String>,
        #[arg(index = 2, conflicts_with = "delete", help = "Start point, HEAD by default")]
        start: Option<String>,
    },
    #[command(name = "tag", about = "List, create or delete tags")]
    Tag {
        #[arg(short = 'a', requires = "message", help = "Make an annotated tag")]
        annotate: bool,
        #[arg(short, long, requires = "name", help = "Tag message (implies -a)")]
        message: Option<String>,
        #[arg(short = 'd', long = "delete", requires = "name", conflicts_with = "message")]
        delete: bool,
        #[arg(index = 1)]
        name: Option<String>,
        #[arg(index = 2, conflicts_with = "delete")]
        target: Option<String>,
    },
    #[command(name = "rev-parse", about = "Resolve revision expressions to object ids")]
    RevParse {
        #[arg(required = true)]
        revisions: Vec<String>,
    },
    #[command(name = "log", about = "Show commit history")]
    Log {
        #[arg(short = 'n', long = "max-count", help = "Show at most this many commits")]
        max_count: Option<usize>,
        #[arg(long, help = "One line per commit")]
        oneline: bool,
        revisions: Vec<String>,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree")]
    LsTree {
        #[arg(short = 'r', help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(index = 1)]
        tree: String,
    },
    #[command(name = "ls-files", about = "List staged files")]
    LsFiles {
        #[arg(short = 's', long = "stage", help = "Show mode and object id")]
        stage: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn current_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.canonicalize()?)
}

fn open_repository() -> Result<Repository> {
    Ok(Repository::discover(&current_dir()?, Config::from_env())?)
}

/// Paths on the command line are relative to the current directory
fn absolute_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let cwd = current_dir()?;
    Ok(paths.iter().map(|path| cwd.join(path)).collect())
}

fn run(command: Commands) -> Result<()> {
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Init { path } => {
            let root = match path {
                Some(path) => current_dir()?.join(path),
                None => current_dir()?,
            };
            let config = Config::from_env();
            let existed = root.join(&config.repository_dir).is_dir();
            let repository = Repository::init(&root, config)?;

            let verb = if existed { "Reinitialized existing" } else { "Initialized empty" };
            writeln!(out, "{verb} Git repository in {}/", repository.git_dir().display())?;
        }
        Commands::HashObject { write, file } => {
            let file = current_dir()?.join(file);
            let oid = if write {
                open_repository()?.hash_object(&file, true)?
            } else {
                let content = std::fs::read(&file)
                    .map_err(|err| anyhow::anyhow!("unable to read {}: {err}", file.display()))?;
                codec::hash(ObjectType::Blob, &content)
            };
            writeln!(out, "{oid}")?;
        }
        Commands::CatFile {
            show_type,
            show_size,
            pretty: _,
            object,
        } => {
            let object = open_repository()?.cat_file(&object)?;
            if show_type {
                writeln!(out, "{}", object.kind)?;
            } else if show_size {
                writeln!(out, "{}", object.size())?;
            } else {
                out.write_all(&object.pretty())?;
            }
        }
        Commands::Add { update, all, paths } => {
            let mode = match (update, all) {
                (true, _) => AddMode::Tracked,
                (_, true) => AddMode::All,
                _ => AddMode::Paths,
            };
            if paths.is_empty() && mode == AddMode::Paths {
                eprintln!("Nothing specified, nothing added.");
                return Ok(());
            }

            let outcome = open_repository()?.add(&absolute_paths(&paths)?, mode)?;
            for ignored in &outcome.ignored {
                eprintln!("warning: pathspec '{ignored}' did not match any files");
            }
        }
        Commands::Rm { cached: _, paths } => {
            for path in open_repository()?.rm_cached(&absolute_paths(&paths)?)? {
                writeln!(out, "rm '{path}'")?;
            }
        }
        Commands::WriteTree => {
            writeln!(out, "{}", open_repository()?.write_tree()?)?;
        }
        Commands::CommitTree {
            tree,
            parents,
            message,
        } => {
            writeln!(out, "{}", open_repository()?.commit_tree(&tree, &parents, &message)?)?;
        }
        Commands::Commit {
            message,
            allow_empty,
        } => {
            let repository = open_repository()?;
            let outcome = repository.commit(&message, allow_empty)?;

            let branch = outcome.branch.as_deref().unwrap_or("detached HEAD");
            let root = if outcome.root { " (root-commit)" } else { "" };
            let short = outcome.oid.abbreviate(repository.config().abbrev_len);
            writeln!(out, "[{branch}{root} {short}] {}", outcome.summary)?;
        }
        Commands::UpdateRef {
            delete,
            name,
            value,
        } => {
            let repository = open_repository()?;
            match (delete, value) {
                (true, _) => {
                    repository.delete_ref(&name)?;
                }
                (false, Some(value)) => {
                    repository.update_ref(&name, &value)?;
                }
                (false, None) => anyhow::bail!("update-ref needs a new value"),
            }
        }
        Commands::SymbolicRef { name, target } => {
            let repository = open_repository()?;
            match target {
                Some(target) => {
                    repository.set_symbolic_ref(&target)?;
                }
                None => match repository.read_symbolic_ref()? {
                    Some(target) => writeln!(out, "{target}")?,
                    None => anyhow::bail!("ref {name} is not a symbolic ref"),
                },
            }
        }
        Commands::Branch {
            delete,
            name,
            start,
        } => {
            let repository = open_repository()?;
            match name {
                Some(name) if delete => {
                    let oid = repository.branch_delete(&name)?;
                    let short = oid.abbreviate(repository.config().abbrev_len);
                    writeln!(out, "Deleted branch {name} (was {short}).")?;
                }
                Some(name) => {
                    repository.branch_create(&name, start.as_deref())?;
                }
                None => {
                    for branch in repository.branch_list()? {
                        if branch.current {
                            writeln!(out, "* {}", branch.name.green())?;
                        } else {
                            writeln!(out, "  {}", branch.name)?;
                        }
                    }
                }
            }
        }
        Commands::Tag {
            annotate: _,
            message,
            delete,
            name,
            target,
        } => {
            let repository = open_repository()?;
            match name {
                Some(name) if delete => {
                    let oid = repository.tag_delete(&name)?;
                    let short = oid.abbreviate(repository.config().abbrev_len);
                    writeln!(out, "Deleted tag '{name}' (was {short})")?;
                }
                Some(name) => {
                    repository.tag_create(&name, target.as_deref(), message.as_deref())?;
                }
                None => {
                    for tag in repository.tag_list()? {
                        writeln!(out, "{tag}")?;
                    }
                }
            }
        }
        Commands::RevParse { revisions } => {
            let repository = open_repository()?;
            for revision in revisions {
                writeln!(out, "{}", repository.rev_parse(&revision)?)?;
            }
        }
        Commands::Log {
            max_count,
            oneline,
            revisions,
        } => {
            let repository = open_repository()?;
            let history = repository.log(&revisions, max_count)?;
            let decorations = repository.decorations()?;
            let head = repository.read_symbolic_ref()?;
            let abbrev_len = repository.config().abbrev_len;

            for (index, (oid, commit)) in history.commits.iter().enumerate() {
                let decoration = decorate(oid, &decorations, head.as_ref(), &repository)?;
                if oneline {
                    let short = oid.abbreviate(abbrev_len);
                    writeln!(out, "{}{decoration} {}", short.yellow(), commit.short_message())?;
                } else {
                    if index > 0 {
                        writeln!(out)?;
                    }
                    write_medium(&mut out, oid, commit, &decoration)?;
                }
            }
        }
        Commands::LsTree { recursive, tree } => {
            for listing in open_repository()?.ls_tree(&tree, recursive)? {
                writeln!(out, "{listing}")?;
            }
        }
        Commands::LsFiles { stage } => {
            for entry in open_repository()?.ls_files()? {
                if stage {
                    writeln!(out, "{} {} 0\t{}", entry.mode().as_str(), entry.oid, entry.name)?;
                } else {
                    writeln!(out, "{}", entry.name)?;
                }
            }
        }
    }

    Ok(())
}

/// ` (HEAD -> master, tag: v1)` style suffix, empty when nothing points here
fn decorate(
    oid: &ObjectId,
    decorations: &HashMap<ObjectId, Vec<SymRefName>>,
    head: Option<&SymRefName>,
    repository: &Repository,
) -> Result<String> {
    let mut names = Vec::new();

    let detached_here = head.is_none() && repository.refs().resolve_head()?.as_ref() == Some(oid);
    if detached_here {
        names.push("HEAD".cyan().bold().to_string());
    }

    for name in decorations.get(oid).into_iter().flatten() {
        let label = if let Some(tag) = name.tag_name() {
            format!("tag: {tag}").yellow().bold().to_string()
        } else {
            name.short_name().green().bold().to_string()
        };

        if head == Some(name) {
            names.push(format!("{} -> {label}", "HEAD".cyan().bold()));
        } else {
            names.push(label);
        }
    }

    if names.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" ({})", names.join(", ")))
    }
}

fn write_medium(out: &mut impl Write, oid: &ObjectId, commit: &Commit, decoration: &str) -> Result<()> {
    writeln!(out, "{}{decoration}", format!("commit {oid}").yellow())?;
    if commit.parents().len() > 1 {
        let parents: Vec<String> = commit.parents().iter().map(|p| p.to_short_oid()).collect();
        writeln!(out, "Merge: {}", parents.join(" "))?;
    }
    writeln!(out, "Author: {}", commit.author().display_name())?;
    writeln!(out, "Date:   {}", commit.author().readable_timestamp())?;
    writeln!(out)?;
    for line in commit.message().lines() {
        writeln!(out, "    {line}")?;
    }

    Ok(())
}
