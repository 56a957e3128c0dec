//! Screenshot admin console
//!
//! Command-line front end over the admin backend. Every command goes through the
//! access gate first, exactly as a navigation in the web dashboard would.

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screenshot_admin::config::Config;
use screenshot_admin::errors::ClientResult;
use screenshot_admin::gate::{Decision, Route};
use screenshot_admin::models::{MaccmsSetting, MediaFilter, MediaStatus, MediaType, Role};
use screenshot_admin::validation::{parse_tags, EpisodeForm, MediaForm, UserForm};
use screenshot_admin::views::{
    DashboardSummary, ExpandOutcome, ListSource, ListView, MaccmsFilter, Notice, Severity, Table,
    UserFilter,
};
use screenshot_admin::{ClientError, Console};

#[derive(Parser)]
#[command(name = "screenshot-admin", about = "Admin console for the screenshot backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the signed-in profile
    Whoami,
    /// Show where the gate sends a path
    Open { path: String },
    /// Counts and most recent media
    Dashboard,
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    Media {
        #[command(subcommand)]
        action: MediaAction,
    },
    Episodes {
        #[command(subcommand)]
        action: EpisodeAction,
    },
    Maccms {
        #[command(subcommand)]
        action: MaccmsAction,
    },
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "user")]
        role: String,
    },
    Update {
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    Delete {
        id: String,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct MediaFields {
    #[arg(long = "type")]
    media_type: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    episodes: Option<i64>,
    #[arg(long)]
    duration: Option<u32>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    ongoing: Option<bool>,
    /// Comma-separated tags
    #[arg(long)]
    tags: Option<String>,
}

impl MediaFields {
    fn apply(self, form: &mut MediaForm) {
        if let Some(v) = self.media_type {
            form.media_type = v;
        }
        if let Some(v) = self.title {
            form.title = v;
        }
        if let Some(v) = self.year {
            form.year = v;
        }
        if let Some(v) = self.episodes {
            form.episodes = v;
        }
        if let Some(v) = self.duration {
            form.duration = v;
        }
        if let Some(v) = self.status {
            form.status = v;
        }
        if let Some(v) = self.ongoing {
            form.ongoing = v;
        }
        if let Some(v) = self.tags {
            form.tags_input = v;
        }
    }
}

#[derive(Subcommand)]
enum MediaAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "type")]
        media_type: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        ongoing: Option<bool>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        sort: Option<String>,
    },
    Show {
        id: String,
    },
    Create {
        #[command(flatten)]
        fields: MediaFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: MediaFields,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Load the assets of one or more episodes
    Expand {
        id: String,
        #[arg(required = true)]
        episodes: Vec<String>,
    },
}

#[derive(Subcommand)]
enum EpisodeAction {
    Add {
        media: String,
        #[arg(long)]
        label: String,
        #[arg(long, default_value = "")]
        video: String,
        #[arg(long = "screenshot")]
        screenshots: Vec<String>,
    },
    Update {
        media: String,
        episode: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        video: Option<String>,
        /// Replaces the screenshot list when given
        #[arg(long = "screenshot")]
        screenshots: Vec<String>,
    },
    Delete {
        media: String,
        episode: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct MaccmsFields {
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    geturl: Option<String>,
    #[arg(long)]
    delcategory: Option<String>,
    #[arg(long)]
    open: Option<bool>,
    #[arg(long)]
    m3u8: Option<bool>,
    #[arg(long)]
    date: Option<i64>,
    #[arg(long)]
    cron: Option<i64>,
    #[arg(long)]
    cjnum: Option<i64>,
}

impl MaccmsFields {
    fn apply(self, setting: &mut MaccmsSetting) {
        if let Some(v) = self.url {
            setting.source_url = v;
        }
        if let Some(v) = self.geturl {
            setting.fetch_url = v;
        }
        if let Some(v) = self.delcategory {
            setting.delete_category = v;
        }
        if let Some(v) = self.open {
            setting.active = v;
        }
        if let Some(v) = self.m3u8 {
            setting.is_m3u8 = v;
        }
        if let Some(v) = self.date {
            setting.schedule_date = v;
        }
        if let Some(v) = self.cron {
            setting.cron_interval = v;
        }
        if let Some(v) = self.cjnum {
            setting.item_quota = v;
        }
    }
}

#[derive(Subcommand)]
enum MaccmsAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        active: Option<bool>,
    },
    Create {
        #[command(flatten)]
        fields: MaccmsFields,
    },
    Update {
        id: String,
        #[command(flatten)]
        fields: MaccmsFields,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Apply defaults across every source
    Setting {
        #[command(flatten)]
        fields: MaccmsFields,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        dark_mode: Option<bool>,
        #[arg(long)]
        auto_refresh: Option<bool>,
        #[arg(long)]
        refresh_interval: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::debug!("Data path: {:?}", config.data_path);

    let mut console = Console::open(config).await?;
    let result = run(&mut console, cli.command).await;

    if let Err(e) = &result {
        if let Some(decision) = console.handle_error(e).await {
            println!("Session ended, redirected to {}", decision.target_path());
        }
        eprintln!("Error: {}", e.user_message());
    }
    console.close().await;

    result.map_err(Into::into)
}

/// Run the gate for `path`; `false` means the command must not proceed.
async fn enter(console: &mut Console, path: &str) -> bool {
    match console.open_route(path).await {
        Decision::Render(_) => true,
        redirect => {
            println!("Redirected to {}", redirect.target_path());
            false
        }
    }
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.severity {
            Severity::Success => println!("{}", notice.message),
            Severity::Error => eprintln!("{}", notice.message),
        }
    }
}

fn footer<S: ListSource>(view: &ListView<S>) {
    println!(
        "Page {} of {} ({} total)",
        view.page(),
        view.total_pages(),
        view.total()
    );
}

fn parse_enum<T>(value: Option<String>, parse: fn(&str) -> Option<T>, what: &str) -> ClientResult<Option<T>> {
    value
        .map(|v| parse(&v).ok_or_else(|| ClientError::Validation(format!("Invalid {}: {}", what, v))))
        .transpose()
}

/// Delete only with `--yes`; otherwise report what would be deleted.
fn confirmed(yes: bool, what: &str) -> bool {
    if !yes {
        println!("Would delete {}. Re-run with --yes to confirm.", what);
    }
    yes
}

async fn run(console: &mut Console, command: Command) -> ClientResult<()> {
    match command {
        Command::Login { username, password } => {
            let decision = console.login(&username, &password).await?;
            if let Some(session) = console.current_session().await {
                println!(
                    "Signed in as {} ({}), session valid until {}",
                    session.profile.username, session.profile.role, session.expires_at
                );
            }
            println!("-> {}", decision.target_path());
        }
        Command::Logout => {
            let decision = console.logout().await;
            println!("Signed out -> {}", decision.target_path());
        }
        Command::Whoami => match console.current_session().await {
            Some(session) => println!(
                "{} <{}> role={} expires={}",
                session.profile.username,
                session.profile.email,
                session.profile.role,
                session.expires_at
            ),
            None => println!("Not signed in"),
        },
        Command::Open { path } => {
            let decision = console.open_route(&path).await;
            println!("{}", decision.target_path());
        }
        Command::Dashboard => {
            if !enter(console, &Route::Dashboard.path()).await {
                return Ok(());
            }
            print_dashboard(&console.dashboard().await?);
        }
        Command::Users { action } => {
            if enter(console, &Route::Users.path()).await {
                users(console, action).await?;
            }
        }
        Command::Media { action } => {
            let path = match &action {
                MediaAction::Show { id } | MediaAction::Expand { id, .. } => {
                    Route::MediaDetail(id.clone()).path()
                }
                _ => Route::Media.path(),
            };
            if enter(console, &path).await {
                media(console, action).await?;
            }
        }
        Command::Episodes { action } => {
            let media_id = match &action {
                EpisodeAction::Add { media, .. }
                | EpisodeAction::Update { media, .. }
                | EpisodeAction::Delete { media, .. } => media.clone(),
            };
            if enter(console, &Route::MediaDetail(media_id).path()).await {
                episodes(console, action).await?;
            }
        }
        Command::Maccms { action } => {
            if enter(console, &Route::Maccms.path()).await {
                maccms(console, action).await?;
            }
        }
        Command::Settings { action } => {
            if enter(console, &Route::Settings.path()).await {
                settings(console, action).await?;
            }
        }
    }
    Ok(())
}

fn print_dashboard(summary: &DashboardSummary) {
    println!("Users:          {}", summary.users);
    println!("Media:          {}", summary.media_total);
    println!("Maccms sources: {}", summary.maccms_sources);
    println!("Recent views:   {}", summary.recent_views);
    println!(
        "Recent status:  {} pending, {} approved, {} hidden",
        summary.pending, summary.approved, summary.hidden
    );
    let mut table = Table::new(["ID", "Title", "Type", "Status", "Views"]);
    for m in &summary.recent {
        table.row([
            m.id.clone(),
            m.title.clone(),
            m.media_type.as_str().to_string(),
            m.status.as_str().to_string(),
            m.view_count.to_string(),
        ]);
    }
    println!("{}", table.render());
}

async fn users(console: &mut Console, action: UserAction) -> ClientResult<()> {
    let mut view = console.users_view();
    match action {
        UserAction::List { page, role, active } => {
            let filter = UserFilter {
                role: parse_enum(role, Role::parse, "role")?,
                active,
            };
            view.set_filter(filter).await?;
            if page > 1 {
                view.set_page(page).await?;
            }
            let mut table = Table::new(["ID", "Username", "Email", "Role", "Active", "Created"]);
            for u in view.items() {
                table.row([
                    u.id.clone(),
                    u.username.clone(),
                    u.email.clone(),
                    u.role.to_string(),
                    u.is_active.to_string(),
                    u.created_at.clone(),
                ]);
            }
            println!("{}", table.render());
            footer(&view);
        }
        UserAction::Create {
            username,
            email,
            password,
            role,
        } => {
            let form = UserForm {
                username,
                email,
                password,
                role,
            };
            let user = view.create(&form).await?;
            println!("Created {}", user.id);
        }
        UserAction::Update {
            id,
            username,
            email,
            password,
            role,
        } => {
            let current = console.api().get_user(&id).await?;
            let mut form = UserForm::from(&current);
            form.username = username.unwrap_or(form.username);
            form.email = email.unwrap_or(form.email);
            form.password = password.unwrap_or_default();
            form.role = role.unwrap_or(form.role);
            view.update(&id, &form).await?;
        }
        UserAction::Delete { id, yes } => {
            if confirmed(yes, &format!("user {}", id)) {
                view.request_delete(&id);
                view.confirm_delete().await?;
            }
        }
    }
    print_notices(view.notices().drain());
    Ok(())
}

async fn media(console: &mut Console, action: MediaAction) -> ClientResult<()> {
    match action {
        MediaAction::Show { id } => {
            let detail = console.media_detail(&id);
            detail.load().await?;
            if let Some(m) = detail.media() {
                println!("{} ({}, {})", m.title, m.media_type.as_str(), m.year);
                println!(
                    "Status: {}  Ongoing: {}  Episodes: {}  Views: {}  Rating: {:.1}",
                    m.status.as_str(),
                    m.ongoing,
                    m.episode_count,
                    m.view_count,
                    m.rating
                );
                if !m.tags.is_empty() {
                    println!("Tags: {}", m.tags.join(", "));
                }
                let mut table = Table::new(["ID", "Episode", "Loaded"]);
                for e in &m.episodes {
                    table.row([e.id(), e.label(), if e.is_detail() { "yes" } else { "no" }]);
                }
                println!("{}", table.render());
            }
            print_notices(detail.take_notices());
            return Ok(());
        }
        MediaAction::Expand { id, episodes } => {
            let detail = console.media_detail(&id);
            detail.load().await?;
            let expansions = episodes.iter().map(|e| detail.expand(e));
            let results = futures::future::join_all(expansions).await;
            for (episode_id, result) in episodes.iter().zip(results) {
                if let Ok(ExpandOutcome::Expanded(_)) = result {
                    if let Some(e) = detail.media().and_then(|m| m.episode(episode_id).cloned()) {
                        let assets = e.assets().unwrap_or_default();
                        println!("{} {}", e.id(), e.label());
                        println!("  video: {}", assets.video.as_deref().unwrap_or("-"));
                        for s in assets.screenshots {
                            println!("  screenshot: {}", s);
                        }
                    }
                }
            }
            print_notices(detail.take_notices());
            return Ok(());
        }
        _ => {}
    }

    let mut view = console.media_view();
    match action {
        MediaAction::List {
            page,
            media_type,
            status,
            ongoing,
            tags,
            sort,
        } => {
            let defaults = MediaFilter::default();
            let filter = MediaFilter {
                media_type: parse_enum(media_type, MediaType::parse, "media type")?,
                status: parse_enum(status, MediaStatus::parse, "status")?,
                ongoing,
                tags: tags.as_deref().map(parse_tags).unwrap_or_default(),
                sort: sort.or(defaults.sort),
                limit: defaults.limit,
            };
            view.set_filter(filter).await?;
            if page > 1 {
                view.set_page(page).await?;
            }
            let mut table = Table::new(["ID", "Title", "Type", "Year", "Status", "Episodes", "Views"]);
            for m in view.items() {
                table.row([
                    m.id.clone(),
                    m.title.clone(),
                    m.media_type.as_str().to_string(),
                    m.year.to_string(),
                    m.status.as_str().to_string(),
                    m.episode_count.to_string(),
                    m.view_count.to_string(),
                ]);
            }
            println!("{}", table.render());
            footer(&view);
        }
        MediaAction::Create { fields } => {
            let mut form = MediaForm::default();
            fields.apply(&mut form);
            let created = view.create(&form).await?;
            println!("Created {}", created.id);
        }
        MediaAction::Update { id, fields } => {
            let current = console.api().get_media(&id).await?;
            let mut form = MediaForm::from(&current);
            fields.apply(&mut form);
            view.update(&id, &form).await?;
        }
        MediaAction::Delete { id, yes } => {
            if confirmed(yes, &format!("media {}", id)) {
                view.request_delete(&id);
                view.confirm_delete().await?;
            }
        }
        MediaAction::Show { .. } | MediaAction::Expand { .. } => {}
    }
    print_notices(view.notices().drain());
    Ok(())
}

async fn episodes(console: &mut Console, action: EpisodeAction) -> ClientResult<()> {
    match action {
        EpisodeAction::Add {
            media,
            label,
            video,
            screenshots,
        } => {
            let detail = console.media_detail(&media);
            let mut form = EpisodeForm {
                label,
                video,
                screenshots: Vec::new(),
            };
            for s in &screenshots {
                form.add_screenshot(s);
            }
            let result = detail.add_episode(&form).await;
            print_notices(detail.take_notices());
            result
        }
        EpisodeAction::Update {
            media,
            episode,
            label,
            video,
            screenshots,
        } => {
            let detail = console.media_detail(&media);
            detail.load().await?;
            let mut form = detail.episode_form(&episode).await?;
            if let Some(label) = label {
                form.label = label;
            }
            if let Some(video) = video {
                form.video = video;
            }
            if !screenshots.is_empty() {
                form.screenshots.clear();
                for s in &screenshots {
                    form.add_screenshot(s);
                }
            }
            let result = detail.update_episode(&episode, &form).await;
            print_notices(detail.take_notices());
            result
        }
        EpisodeAction::Delete {
            media,
            episode,
            yes,
        } => {
            if !confirmed(yes, &format!("episode {} of {}", episode, media)) {
                return Ok(());
            }
            let detail = console.media_detail(&media);
            detail.request_delete(&episode);
            let result = detail.confirm_delete().await.map(|_| ());
            print_notices(detail.take_notices());
            result
        }
    }
}

async fn maccms(console: &mut Console, action: MaccmsAction) -> ClientResult<()> {
    let mut view = console.maccms_view();
    match action {
        MaccmsAction::List { page, active } => {
            view.set_filter(MaccmsFilter { active }).await?;
            if page > 1 {
                view.set_page(page).await?;
            }
            let mut table = Table::new(["ID", "URL", "Open", "M3U8", "Cron", "Quota", "Updated"]);
            for c in view.items() {
                table.row([
                    c.id.clone(),
                    c.source_url.clone(),
                    c.active.to_string(),
                    c.is_m3u8.to_string(),
                    c.cron_interval.to_string(),
                    c.item_quota.to_string(),
                    c.updated_at().to_string(),
                ]);
            }
            println!("{}", table.render());
            footer(&view);
        }
        MaccmsAction::Create { fields } => {
            let mut setting = MaccmsSetting::default();
            fields.apply(&mut setting);
            let created = view.create(&setting).await?;
            println!("Created {}", created.id);
        }
        MaccmsAction::Update { id, fields } => {
            let current = console.api().get_maccms(&id).await?;
            let mut setting = MaccmsSetting::from(&current);
            fields.apply(&mut setting);
            view.update(&id, &setting).await?;
        }
        MaccmsAction::Delete { id, yes } => {
            if confirmed(yes, &format!("Maccms source {}", id)) {
                view.request_delete(&id);
                view.confirm_delete().await?;
            }
        }
        MaccmsAction::Setting { fields } => {
            let mut setting = MaccmsSetting::default();
            fields.apply(&mut setting);
            view.configure_setting(&setting).await?;
        }
    }
    print_notices(view.notices().drain());
    Ok(())
}

async fn settings(console: &mut Console, action: SettingsAction) -> ClientResult<()> {
    match action {
        SettingsAction::Show => {
            let p = console.preferences();
            println!("apiUrl:             {}", p.api_url);
            println!("screenshotsPerPage: {}", p.page_size);
            println!("defaultLanguage:    {}", p.language);
            println!("darkMode:           {}", p.dark_mode);
            println!("autoRefresh:        {}", p.auto_refresh);
            println!("refreshInterval:    {}", p.refresh_interval);
        }
        SettingsAction::Set {
            api_url,
            page_size,
            language,
            dark_mode,
            auto_refresh,
            refresh_interval,
        } => {
            let mut prefs = console.preferences().clone();
            if let Some(v) = api_url {
                prefs.api_url = v;
            }
            if let Some(v) = page_size {
                prefs.page_size = v;
            }
            if let Some(v) = language {
                prefs.language = v;
            }
            if let Some(v) = dark_mode {
                prefs.dark_mode = v;
            }
            if let Some(v) = auto_refresh {
                prefs.auto_refresh = v;
            }
            if let Some(v) = refresh_interval {
                prefs.refresh_interval = v;
            }
            console.save_preferences(&prefs).await?;
            println!("Settings saved successfully");
        }
    }
    Ok(())
}
