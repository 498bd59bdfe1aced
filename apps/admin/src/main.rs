use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use client_core::{
    execute,
    form::{RegistrationEdit, SessionEdit},
    load_settings,
    registration_view::{RegistrationEffect, RegistrationMessage, RegistrationView},
    sessions_view::SessionsView,
    AuthContext, ClientSettings, EventEngineApi, EventEngineClient,
};
use shared::domain::{InstanceType, SessionColumn};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eventengine-admin", about = "Manage event sessions and registrations")]
struct Cli {
    /// Overrides `api_url` from eventengine.toml / the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    app_url: Option<String>,
    /// OAuth proxy cookie, e.g. `_oauth2_proxy=...`.
    #[arg(long, global = true, env = "EVENTENGINE_AUTH_COOKIE", hide_env_values = true)]
    cookie: Option<String>,
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in administrator.
    Whoami,
    #[command(subcommand)]
    Sessions(SessionsCommand),
    /// Register an attendee for a session.
    Register {
        session: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        company: String,
    },
    /// Print the URL that ends the OAuth proxy session.
    SignOutUrl,
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    List {
        #[arg(long, value_parser = parse_column)]
        sort: Option<SessionColumn>,
        #[arg(long)]
        desc: bool,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    DefaultInstance,
    Add {
        name: String,
        #[command(flatten)]
        fields: SessionFieldArgs,
    },
    Edit {
        name: String,
        #[command(flatten)]
        fields: SessionFieldArgs,
    },
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Public registration link for a session.
    Link {
        name: String,
    },
}

#[derive(Args, Debug, Default)]
struct SessionFieldArgs {
    #[arg(long = "type", value_parser = parse_instance_type)]
    instance_type: Option<InstanceType>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    sub_account: Option<String>,
    #[arg(long)]
    access_key_id: Option<String>,
    #[arg(long)]
    secret_key: Option<String>,
    #[arg(long)]
    user_group: Option<String>,
    /// Expiry date, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    expires: Option<DateTime<Utc>>,
}

impl SessionFieldArgs {
    /// Type first, so endpoint fields are accepted when switching to CUSTOM.
    fn into_edits(self) -> Vec<SessionEdit> {
        let mut edits = Vec::new();
        if let Some(v) = self.instance_type {
            edits.push(SessionEdit::InstanceType(v));
        }
        if let Some(v) = self.url {
            edits.push(SessionEdit::Url(v));
        }
        if let Some(v) = self.sub_account {
            edits.push(SessionEdit::SubAccount(v));
        }
        if let Some(v) = self.access_key_id {
            edits.push(SessionEdit::AccessKeyId(v));
        }
        if let Some(v) = self.secret_key {
            edits.push(SessionEdit::SecretKey(v));
        }
        if let Some(v) = self.user_group {
            edits.push(SessionEdit::UserGroup(v));
        }
        if let Some(v) = self.expires {
            edits.push(SessionEdit::ExpiresAt(v));
        }
        edits
    }
}

fn parse_column(value: &str) -> Result<SessionColumn, String> {
    SessionColumn::from_key(value).ok_or_else(|| {
        let keys: Vec<&str> = SessionColumn::ALL.iter().map(|c| c.key()).collect();
        format!("unknown column '{value}', expected one of: {}", keys.join(", "))
    })
}

fn parse_instance_type(value: &str) -> Result<InstanceType, String> {
    InstanceType::parse(value).ok_or_else(|| format!("'{value}' is not DEFAULT or CUSTOM"))
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("'{value}' is not a YYYY-MM-DD date: {err}"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{value}' has no midnight"))
}

/// Drops repeated names, keeping first occurrences in order. Toggling a name twice
/// would deselect it.
fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}

fn resolve_settings(cli: &Cli) -> Result<ClientSettings> {
    let mut settings = load_settings().context("loading client settings")?;
    if let Some(url) = &cli.api_url {
        settings.api_url = url.clone();
    }
    if let Some(url) = &cli.app_url {
        settings.app_url = url.clone();
    }
    if let Some(cookie) = &cli.cookie {
        settings.auth_cookie = Some(cookie.clone());
    }
    Ok(settings.validated()?)
}

async fn signed_in(client: &EventEngineClient) -> AuthContext {
    let mut auth = AuthContext::new();
    auth.refresh(client).await;
    if !auth.is_authenticated() {
        warn!("not signed in; changes will not carry an author");
    }
    auth
}

async fn loaded_view(client: &EventEngineClient, settings: &ClientSettings) -> Result<SessionsView> {
    let mut view = SessionsView::new(settings.page_size, Utc::now())?;
    let load = view.load();
    view.apply(execute(client, load).await);
    if let Some(status) = view.status() {
        bail!("{status}");
    }
    Ok(view)
}

fn apply_edits(view: &mut SessionsView, edits: Vec<SessionEdit>) -> Result<()> {
    for edit in edits {
        view.edit_form(edit)?;
    }
    for issue in view.form().issues() {
        warn!("{issue}");
    }
    Ok(())
}

/// Sends the open dialog and reports the server's verdict.
async fn submit(client: &EventEngineClient, view: &mut SessionsView, auth: &AuthContext) -> Result<()> {
    let command = view
        .confirm(auth)
        .ok_or_else(|| anyhow!("no pending change to submit"))?;
    view.apply(execute(client, command).await);
    if let Some(modal) = view.error() {
        bail!("{}", modal.message);
    }
    if let Some(status) = view.status() {
        println!("{status}");
    }
    Ok(())
}

fn print_table(view: &SessionsView, json: bool) -> Result<()> {
    let rows = view.table().visible_rows();
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            SessionColumn::ALL
                .iter()
                .map(|column| view.cell(row, *column))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = SessionColumn::ALL
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain([column.label().len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = SessionColumn::ALL
        .iter()
        .zip(widths.iter().copied())
        .map(|(column, width)| format!("{:<width$}", column.label()))
        .collect();
    println!("{}", header.join("  "));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", line.join("  "));
    }

    let table = view.table();
    let selected = table.selection().len();
    println!(
        "page {} of {} ({} sessions, sorted by {} {}{})",
        table.pagination().page() + 1,
        table.page_count().max(1),
        table.rows().len(),
        table.sort().column.key(),
        table.sort().direction.label(),
        if selected > 0 {
            format!(", {selected} selected")
        } else {
            String::new()
        }
    );
    Ok(())
}

async fn run_sessions(
    command: SessionsCommand,
    client: &EventEngineClient,
    settings: &ClientSettings,
    json: bool,
) -> Result<()> {
    match command {
        SessionsCommand::List {
            sort,
            desc,
            page,
            page_size,
        } => {
            let mut view = loaded_view(client, settings).await?;
            if let Some(size) = page_size {
                view.set_page_size(size)?;
            }
            let column = sort.unwrap_or(SessionColumn::Name);
            if view.table().sort().column != column {
                view.request_sort(column);
            }
            if desc {
                view.request_sort(column);
            }
            view.set_page(page.saturating_sub(1));
            print_table(&view, json)?;
        }
        SessionsCommand::DefaultInstance => match client.default_instance().await? {
            Some(url) if json => println!("{}", serde_json::json!({ "defaultInstance": url })),
            Some(url) => println!("{url}"),
            None => println!("no default instance configured"),
        },
        SessionsCommand::Add { name, fields } => {
            let auth = signed_in(client).await;
            let mut view = SessionsView::new(settings.page_size, Utc::now())?;
            view.launch_add(Utc::now());
            let mut edits = vec![SessionEdit::Name(name)];
            edits.extend(fields.into_edits());
            apply_edits(&mut view, edits)?;
            submit(client, &mut view, &auth).await?;
        }
        SessionsCommand::Edit { name, fields } => {
            let auth = signed_in(client).await;
            let mut view = loaded_view(client, settings).await?;
            view.toggle_row(&name);
            if !view.launch_edit() {
                bail!("no session named '{name}'");
            }
            apply_edits(&mut view, fields.into_edits())?;
            submit(client, &mut view, &auth).await?;
        }
        SessionsCommand::Delete { names } => {
            let auth = signed_in(client).await;
            let mut view = loaded_view(client, settings).await?;
            for name in &unique_names(names) {
                if view.table().find(name).is_none() {
                    bail!("no session named '{name}'");
                }
                view.toggle_row(name);
            }
            view.launch_delete();
            submit(client, &mut view, &auth).await?;
        }
        SessionsCommand::Link { name } => {
            let link = settings.event_link(&name);
            if json {
                println!("{}", serde_json::json!({ "name": name, "link": link }));
            } else {
                println!("{link}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;
    let client = EventEngineClient::new(&settings)?;

    match cli.command {
        Command::Whoami => {
            let auth = signed_in(&client).await;
            match auth.user() {
                Some(user) if cli.json => println!("{}", serde_json::to_string(user)?),
                Some(user) => println!("{} ({})", user.display_name(), user.email),
                None => println!("not signed in"),
            }
        }
        Command::Sessions(command) => run_sessions(command, &client, &settings, cli.json).await?,
        Command::Register {
            session,
            email,
            first_name,
            last_name,
            company,
        } => {
            let mut view = RegistrationView::new(session);
            view.edit(RegistrationEdit::Email(email));
            view.edit(RegistrationEdit::FirstName(first_name));
            view.edit(RegistrationEdit::LastName(last_name));
            view.edit(RegistrationEdit::Company(company));
            for issue in view.issues() {
                warn!("{issue}");
            }
            let command = view
                .submit()
                .ok_or_else(|| anyhow!("registration already submitted"))?;
            view.apply(execute(&client, command).await);
            match view.message().cloned() {
                Some(RegistrationMessage::Success(text)) => {
                    println!("{text}");
                    if let Some(RegistrationEffect::RedirectTo(url)) =
                        view.dismiss(&settings.docs_url)
                    {
                        println!("Documentation: {url}");
                    }
                }
                Some(RegistrationMessage::Failure(text)) => bail!("{text}"),
                None => bail!("registration did not complete"),
            }
        }
        Command::SignOutUrl => println!("{}", settings.sign_out_url()?),
    }

    Ok(())
}
