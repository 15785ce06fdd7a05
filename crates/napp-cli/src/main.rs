use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use regex::Regex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use napp_core::config::Config;
use napp_core::napp::manager::search_napps;
use napp_core::napp::publisher::{self, MetadataOptions};
use napp_core::scaffold::{create_napp, ScaffoldOptions};
use napp_core::{
    HostControl, KytosApi, LinkingHost, NappError, NappId, NappRef, NappRoots, NappsManager,
    RegistryClient, Result,
};

mod args;
use args::{Cli, Commands, ConfigAction, Shell};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let ctx = Context {
        base_dir: resolve_base_dir(cli.base_dir),
        roots: cli.installed_path.zip(cli.enabled_path),
    };

    let result = match cli.command {
        Some(Commands::Install { napps }) => handle_install(&ctx, &napps),
        Some(Commands::Uninstall { napps }) => handle_uninstall(&ctx, &napps),
        Some(Commands::Enable { napps }) => handle_enable(&ctx, &napps),
        Some(Commands::Disable { napps }) => handle_disable(&ctx, &napps),
        Some(Commands::List) => handle_list(&ctx),
        Some(Commands::Search { query, regex }) => handle_search(&ctx, &query, regex),
        Some(Commands::Reload { napps }) => handle_reload(&ctx, &napps),
        Some(Commands::Upload { user, password }) => handle_upload(&ctx, user, password),
        Some(Commands::Delete {
            napps,
            user,
            password,
        }) => handle_delete(&ctx, &napps, user, password),
        Some(Commands::Create {
            username,
            name,
            description,
            meta,
        }) => handle_create(username, name, description, meta),
        Some(Commands::Config { action }) => handle_config(action, &ctx.base_dir),
        Some(Commands::Completions { shell }) => {
            handle_completions(shell);
            Ok(())
        }
        None => {
            Cli::command().print_help().ok();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` shows debug and `-q` only errors
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::ERROR
    } else {
        LevelFilter::WARN
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn handle_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let shell = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
        Shell::Elvish => clap_complete::Shell::Elvish,
    };
    generate(shell, &mut cmd, "napp", &mut io::stdout());
}

fn resolve_base_dir(cli_base: Option<PathBuf>) -> PathBuf {
    if let Some(base) = cli_base {
        return base;
    }

    if let Ok(base) = std::env::var("NAPP_BASE") {
        return PathBuf::from(base);
    }

    dirs::home_dir()
        .map(|h| h.join(".napp"))
        .unwrap_or_else(|| PathBuf::from(".napp"))
}

/// Global options shared by the handlers
struct Context {
    base_dir: PathBuf,
    /// Roots given on the command line
    roots: Option<(PathBuf, PathBuf)>,
}

impl Context {
    fn config(&self) -> Result<Config> {
        Config::load(&self.base_dir)
    }

    fn registry(&self, config: &Config) -> Result<RegistryClient> {
        Ok(RegistryClient::new(&config.napps.api, &config.napps.repo)?
            .with_token(config.napps.token.clone()))
    }

    /// Manager over explicit roots (filesystem host) or roots reported by a
    /// running controller
    fn manager(&self) -> Result<NappsManager> {
        let config = self.config()?;
        let registry = self.registry(&config)?;

        let host: Box<dyn HostControl> = match self.roots.clone().or_else(|| config.roots()) {
            Some((installed, enabled)) => {
                Box::new(LinkingHost::new(NappRoots::new(installed, enabled)))
            }
            None => Box::new(KytosApi::new(&config.kytos.api)?),
        };
        let roots = NappRoots::discover(host.as_ref())?;

        tracing::debug!(
            installed = %roots.installed.display(),
            enabled = %roots.enabled.display(),
            "using NApp roots"
        );
        Ok(NappsManager::new(roots, registry, host))
    }
}

fn parse_ids(napps: &[String]) -> Result<Vec<NappId>> {
    napps.iter().map(|s| s.parse()).collect()
}

fn handle_install(ctx: &Context, napps: &[String]) -> Result<()> {
    let refs: Vec<NappRef> = napps.iter().map(|s| s.parse()).collect::<Result<_>>()?;
    let manager = ctx.manager()?;

    for napp in &refs {
        let id = &napp.id;
        println!("{} {}", "NApp".bold(), id.to_string().cyan());

        if manager.is_installed(id) {
            println!("  {}", "Already installed.".dimmed());
        } else {
            match manager.install_local(id) {
                Ok(_) => println!("  {} from local directory", "Installed".green()),
                Err(NappError::NappNotFound { .. }) => {
                    print!("  Downloading from NApps Server... ");
                    io::stdout().flush()?;
                    manager.install_remote(napp)?;
                    println!("{}", "installed".green());
                }
                Err(e) => return Err(e),
            }
        }

        if manager.is_enabled(id) {
            println!("  {}", "Already enabled.".dimmed());
        } else {
            manager.enable(id)?;
            println!("  {}", "Enabled".green());
        }

        println!("  {} {}", "Version:".dimmed(), manager.roots().version(id));

        let dependencies = manager.roots().dependencies(id);
        if !dependencies.is_empty() {
            let names: Vec<String> = dependencies.iter().map(|d| d.to_string()).collect();
            println!("  {} {}", "Depends on:".yellow(), names.join(", "));
        }
    }

    Ok(())
}

fn handle_uninstall(ctx: &Context, napps: &[String]) -> Result<()> {
    let ids = parse_ids(napps)?;
    let manager = ctx.manager()?;

    for id in &ids {
        if !manager.is_installed(id) {
            // Clears a link left dangling by a removed source tree
            manager.uninstall(id)?;
            println!("{} {} is not installed.", "Skipped:".yellow(), id);
            continue;
        }

        if manager.is_enabled(id) {
            manager.disable(id)?;
        }
        manager.uninstall(id)?;
        println!("{} {}", "Uninstalled:".red(), id);
    }

    Ok(())
}

fn handle_enable(ctx: &Context, napps: &[String]) -> Result<()> {
    let ids = parse_ids(napps)?;
    let manager = ctx.manager()?;

    for id in &ids {
        if manager.is_enabled(id) {
            println!("{} {} is already enabled.", "Skipped:".yellow(), id);
            continue;
        }
        manager.enable(id)?;
        println!("{} {}", "Enabled:".green(), id);
    }

    Ok(())
}

fn handle_disable(ctx: &Context, napps: &[String]) -> Result<()> {
    let ids = parse_ids(napps)?;
    let manager = ctx.manager()?;

    for id in &ids {
        if !manager.is_enabled(id) {
            println!("{} {} is not enabled.", "Skipped:".yellow(), id);
            continue;
        }
        manager.disable(id)?;
        println!("{} {}", "Disabled:".green(), id);
    }

    Ok(())
}

fn handle_list(ctx: &Context) -> Result<()> {
    let manager = ctx.manager()?;

    let mut rows: Vec<(NappId, bool)> = manager
        .get_enabled()
        .into_iter()
        .map(|id| (id, true))
        .chain(manager.get_disabled().into_iter().map(|id| (id, false)))
        .collect();
    rows.sort();

    if rows.is_empty() {
        println!("No NApps installed.");
        return Ok(());
    }

    let width = rows
        .iter()
        .map(|(id, _)| id.to_string().len())
        .max()
        .unwrap_or(0)
        .max("NApp".len());

    println!();
    println!("{:^6} {:<width$} {}", "Status", "NApp", "Description");
    println!("{} {} {}", "=".repeat(6), "=".repeat(width), "=".repeat(11));
    for (id, enabled) in &rows {
        let status = if *enabled {
            format!("{:^6}", "[ie]").green()
        } else {
            format!("{:^6}", "[i-]").yellow()
        };
        let description = manager.roots().description(id);
        println!(
            "{} {:<width$} {}",
            status,
            id.to_string(),
            description.dimmed()
        );
    }
    println!();
    println!("{}", "Status: (i)nstalled, (e)nabled".dimmed());
    println!();

    Ok(())
}

fn handle_search(ctx: &Context, query: &str, regex: bool) -> Result<()> {
    let pattern = if regex {
        format!("^(?:{})", query)
    } else {
        format!("(?i)^.*{}", regex::escape(query))
    };
    let regex = Regex::new(&pattern)?;

    let config = ctx.config()?;
    let napps = search_napps(ctx.registry(&config)?.get_napps()?, &regex);

    if napps.is_empty() {
        println!("No NApps found.");
        return Ok(());
    }

    println!("{}", "Search Results:".cyan().bold());
    println!();
    for napp in &napps {
        let name = napp
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| napp.name.clone());
        println!("  {}", name.bold());
        if !napp.description.is_empty() {
            println!("    {}", napp.description);
        }
        if !napp.tags.is_empty() {
            println!("    {}", napp.tags.join(", ").dimmed());
        }
    }
    println!();
    println!("{}", "To install: napp install <owner>/<name>".dimmed());

    Ok(())
}

fn handle_reload(ctx: &Context, napps: &[String]) -> Result<()> {
    let ids = parse_ids(napps)?;
    let manager = ctx.manager()?;

    if ids.is_empty() {
        manager.reload(None)?;
        println!("{} all NApps", "Reloaded:".green());
    } else {
        manager.reload(Some(&ids))?;
        for id in &ids {
            println!("{} {}", "Reloaded:".green(), id);
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Reuse the stored token unless a password was given; otherwise log in and
/// store the new token in the config.
fn authenticate(
    base_dir: &Path,
    config: &mut Config,
    registry: &mut RegistryClient,
    user: Option<String>,
    password: Option<String>,
) -> Result<()> {
    if password.is_none() && registry.token().is_some() {
        return Ok(());
    }

    let user = match user.or_else(|| config.napps.user.clone()) {
        Some(user) => user,
        None => prompt("Username: ")?,
    };
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };

    let token = registry.request_token(&user, &password)?;
    config.napps.user = Some(user);
    config.napps.token = Some(token);
    config.save(base_dir)?;
    Ok(())
}

fn handle_upload(ctx: &Context, user: Option<String>, password: Option<String>) -> Result<()> {
    let work_dir = std::env::current_dir()?;
    let name = upload_dir(ctx, &work_dir, user, password)?;
    println!("{} {}", "Uploaded:".green(), name.cyan());
    Ok(())
}

/// Read the NApp in `dir` before asking for credentials, so a directory
/// without `kytos.json` fails without a login
fn upload_dir(
    ctx: &Context,
    dir: &Path,
    user: Option<String>,
    password: Option<String>,
) -> Result<String> {
    let metadata = publisher::create_metadata(dir, &MetadataOptions::default())?;

    let mut config = ctx.config()?;
    let mut registry = ctx.registry(&config)?;
    authenticate(&ctx.base_dir, &mut config, &mut registry, user, password)?;

    publisher::publish(&registry, dir, metadata)
}

fn handle_delete(
    ctx: &Context,
    napps: &[String],
    user: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let ids = parse_ids(napps)?;
    let mut config = ctx.config()?;
    let mut registry = ctx.registry(&config)?;
    authenticate(&ctx.base_dir, &mut config, &mut registry, user, password)?;

    for id in &ids {
        registry.delete(id)?;
        println!("{} {}", "Deleted:".red(), id);
    }
    Ok(())
}

fn handle_create(
    username: Option<String>,
    name: Option<String>,
    description: Option<String>,
    meta: bool,
) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt("Please insert your NApps Server username: ")?,
    };
    let napp = match name {
        Some(name) => name,
        None => prompt("Please insert your NApp name: ")?,
    };
    let description = match description {
        Some(description) => description,
        None => prompt("Please insert a brief description for your NApp [optional]: ")?,
    };

    let options = ScaffoldOptions {
        username,
        napp,
        description,
        meta_package: meta,
    };
    let work_dir = std::env::current_dir()?;
    let result = create_napp(&work_dir, &options)?;

    println!("{} {}", "Created:".green(), result.napp_dir.display());
    for file in &result.files {
        if let Ok(rel) = file.strip_prefix(&work_dir) {
            println!("  {}", rel.display().to_string().dimmed());
        }
    }
    println!();
    println!(
        "Edit {} before uploading.",
        Path::new(&options.username)
            .join(&options.napp)
            .join("kytos.json")
            .display()
    );
    Ok(())
}

fn handle_config(action: ConfigAction, base_dir: &Path) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load(base_dir)?;
            match config.get(&key) {
                Some(value) => {
                    println!("{}", value);
                }
                None => {
                    return Err(NappError::ConfigKeyNotFound { key });
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(base_dir)?;
            config.set(&key, &value)?;
            config.save(base_dir)?;
            println!("{} {} = {}", "Set:".green(), key, value);
        }
        ConfigAction::List => {
            let config = Config::load(base_dir)?;
            println!();
            for (key, value) in config.list() {
                println!("{} = {}", key.cyan(), value);
            }
            println!();
        }
        ConfigAction::Path => {
            let path = Config::path(base_dir);
            println!("{}", path.display());
        }
        ConfigAction::Init => {
            let path = Config::init(base_dir)?;
            println!("{} {}", "Initialized:".green(), path.display());
        }
    }

    Ok(())
}
